//! Rotation matrices and plane geometry for specimen orientation
//!
//! Two Euler conventions meet in the simulator: crystal orientations use the
//! Bunge-style Z-X-Z passive convention (radians), while the stage goniometer
//! composes intrinsic Z-X-Y rotations given in degrees.

use nalgebra::{Matrix3, Rotation3, Vector3};

/// Passive rotation about Z by `angle` radians
fn passive_z(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Passive rotation about X by `angle` radians
fn passive_x(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c)
}

/// Orientation matrix from Z-X-Z Euler angles in radians
///
/// Computed as `R = Rz(phi1) · Rx(psi) · Rz(phi2)` with passive elementary
/// rotations.
pub fn euler_zxz(phi1: f64, psi: f64, phi2: f64) -> Matrix3<f64> {
    passive_z(phi1) * passive_x(psi) * passive_z(phi2)
}

/// Rotation matrix from intrinsic Z-X-Y Euler angles in degrees
///
/// Rotates first about Z by `z_deg`, then about the new X by `x_deg`, then
/// about the new Y by `y_deg`: `R = Rz · Rx · Ry` with active rotations.
pub fn intrinsic_zxy_degrees(z_deg: f64, x_deg: f64, y_deg: f64) -> Matrix3<f64> {
    let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), z_deg.to_radians());
    let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), x_deg.to_radians());
    let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), y_deg.to_radians());
    (rz * rx * ry).into_inner()
}

/// Intersect the ray `l0 + t·(0, 0, 1)` with the plane through `p0` with normal `n`
///
/// Uses `p = l0 + l · dot(p0 - l0, n) / dot(l, n)`. A plane parallel to the
/// ray (`n.z == 0`) is not special-cased: the result carries Inf or NaN.
pub fn intersect_axial_ray(l0: &Vector3<f64>, p0: &Vector3<f64>, n: &Vector3<f64>) -> Vector3<f64> {
    let d = (p0 - l0).dot(n) / n.z;
    Vector3::new(l0.x, l0.y, l0.z + d)
}
