//! Specimen model: support grid, crystal lattice, sample population and stage

pub mod crystal;
pub mod grid;
pub mod sample;
pub mod stage;

pub use crystal::{Crystal, CrystalModel, UnitCell};
pub use grid::{GridConfig, MeshGrid, SupportGrid};
pub use sample::Sample;
pub use stage::{Stage, StageConfig, SUPPORT_OFFSET};
