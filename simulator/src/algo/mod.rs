//! Numerical building blocks for the specimen and raster models
//!
//! Rotation conventions, ray/plane intersection and raster sampling helpers.

pub mod misc;
pub mod rotation;

pub use misc::{linspace, meshgrid};
pub use rotation::{euler_zxz, intersect_axial_ray, intrinsic_zxy_degrees};
