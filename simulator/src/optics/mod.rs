//! Electron-optical column
//!
//! Every element of the column transforms a [`Beam`] into a new one. The
//! column is split into [`OpticalChain`]s before and after the specimen; the
//! gun seeds the pre-sample chain through [`Illumination`].

pub mod aperture;
pub mod beam;
pub mod chain;
pub mod deflector;
pub mod gun;
pub mod illumination;
pub mod lens;

pub use aperture::Aperture;
pub use beam::{Beam, PlanePoint};
pub use chain::{ApertureId, DeflectorId, LensId, OpticalChain};
pub use deflector::Deflector;
pub use gun::Gun;
pub use illumination::Illumination;
pub use lens::Lens;

/// An element the beam passes through
pub trait OpticalComponent {
    /// Beam leaving this component, given the beam entering it
    ///
    /// Implementations read their own settings only and never alter `beam`.
    fn propagate_beam(&self, beam: &Beam) -> Beam;
}
