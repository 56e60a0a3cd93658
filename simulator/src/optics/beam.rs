//! Elliptical beam footprint at an optical plane
//!
//! The beam is an axis-general ellipse with semi-axes `a` and `b`, rotated by
//! `t` radians and centred on `(x0, y0)`. Its implicit conic form
//!
//! ```text
//! A·x² + B·x·y + C·y² + D·x + E·y + F = 0
//! ```
//!
//! is computed once at construction; the interior is where the left-hand side
//! is negative. Containment is evaluated on offsets from the centre, where the
//! same form reduces to `A·dx² + B·dx·dy + C·dy² < a²·b²` and stays accurate
//! for beams far off the optical axis.

use serde::{Deserialize, Serialize};

/// A point in the plane of a beam, `(x, y)`
pub type PlanePoint = (f64, f64);

/// Elliptical cross-section of the electron beam.
///
/// Beams are values: every optical component returns a new beam rather than
/// modifying the one it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BeamShape", into = "BeamShape")]
pub struct Beam {
    a: f64,
    b: f64,
    t: f64,
    x0: f64,
    y0: f64,
    conic: Conic,
}

/// Implicit conic coefficients of the ellipse boundary
#[derive(Debug, Clone, Copy, PartialEq)]
struct Conic {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    /// `a²·b²`, the right-hand side of the centred form
    k: f64,
}

impl Conic {
    fn from_ellipse(a: f64, b: f64, t: f64, x0: f64, y0: f64) -> Self {
        let (st, ct) = t.sin_cos();
        let a2 = a * a;
        let b2 = b * b;

        let ca = a2 * st * st + b2 * ct * ct;
        let cb = 2.0 * (b2 - a2) * st * ct;
        let cc = a2 * ct * ct + b2 * st * st;
        Self {
            a: ca,
            b: cb,
            c: cc,
            d: -2.0 * ca * x0 - cb * y0,
            e: -cb * x0 - 2.0 * cc * y0,
            f: ca * x0 * x0 + cb * x0 * y0 + cc * y0 * y0 - a2 * b2,
            k: a2 * b2,
        }
    }

    /// Coefficients `(A, B, C, D, E, F)` of the absolute form
    fn coefficients(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

/// Serialized form: the defining parameters only
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct BeamShape {
    a: f64,
    b: f64,
    t: f64,
    x0: f64,
    y0: f64,
}

impl From<BeamShape> for Beam {
    fn from(shape: BeamShape) -> Self {
        Beam::new(shape.a, shape.b, shape.t, shape.x0, shape.y0)
    }
}

impl From<Beam> for BeamShape {
    fn from(beam: Beam) -> Self {
        BeamShape {
            a: beam.a,
            b: beam.b,
            t: beam.t,
            x0: beam.x0,
            y0: beam.y0,
        }
    }
}

impl Beam {
    /// Create a beam with semi-axes `a`, `b` (> 0), rotation `t` and centre `(x0, y0)`
    pub fn new(a: f64, b: f64, t: f64, x0: f64, y0: f64) -> Self {
        debug_assert!(a > 0.0 && b > 0.0, "beam semi-axes must be positive");
        Self {
            a,
            b,
            t,
            x0,
            y0,
            conic: Conic::from_ellipse(a, b, t, x0, y0),
        }
    }

    /// Circular beam of radius `r` centred on `(x0, y0)`
    pub fn circular(r: f64, x0: f64, y0: f64) -> Self {
        Self::new(r, r, 0.0, x0, y0)
    }

    /// Semi-axis along the beam's own x direction
    pub fn a(&self) -> f64 {
        self.a
    }

    /// Semi-axis along the beam's own y direction
    pub fn b(&self) -> f64 {
        self.b
    }

    /// Rotation of the ellipse in radians
    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn center(&self) -> PlanePoint {
        (self.x0, self.y0)
    }

    /// Same ellipse moved to a new centre
    pub fn with_center(&self, x0: f64, y0: f64) -> Self {
        Self::new(self.a, self.b, self.t, x0, y0)
    }

    /// Value copy with identical parameters
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Implicit conic coefficients `[A, B, C, D, E, F]` of the boundary
    pub fn conic_coefficients(&self) -> [f64; 6] {
        self.conic.coefficients()
    }

    pub fn is_point_in_beam(&self, x: f64, y: f64) -> bool {
        let c = &self.conic;
        let (dx, dy) = (x - self.x0, y - self.y0);
        c.a * dx * dx + c.b * dx * dy + c.c * dy * dy < c.k
    }

    /// Four corners of a box inside the beam, counterclockwise
    ///
    /// Points lie on the ellipse at polar angles π/4, 3π/4, 5π/4, 7π/4 in the
    /// ellipse's own frame, pulled towards the centre so that they stay
    /// strictly inside once added to the centre coordinates.
    pub fn get_rectangular_internal_box(&self) -> [PlanePoint; 4] {
        const QUARTER: f64 = std::f64::consts::FRAC_PI_4;
        let shrink = 1.0 - self.internal_margin();
        [1.0, 3.0, 5.0, 7.0].map(|k| {
            let (dx, dy) = self.edge_offset(k * QUARTER);
            (self.x0 + dx * shrink, self.y0 + dy * shrink)
        })
    }

    /// Relative pull-in of edge points: at least [`MIN_INTERNAL_MARGIN`], and
    /// a few ulps of the centre coordinates measured in minor semi-axes
    fn internal_margin(&self) -> f64 {
        let magnitude = self.x0.abs().max(self.y0.abs()) + self.a.max(self.b);
        let rounding = 4.0 * f64::EPSILON * magnitude / self.a.min(self.b);
        rounding.max(MIN_INTERNAL_MARGIN).min(1.0)
    }

    /// Four corners of a parallelogram enclosing the beam, counterclockwise
    ///
    /// Built from the major-axis vector (θ = 0) and the minor-axis vector
    /// (θ = π/2), starting at `centre + major + minor`.
    pub fn get_rectangular_external_box(&self) -> [PlanePoint; 4] {
        let (mx, my) = self.edge_offset(0.0);
        let (nx, ny) = self.edge_offset(std::f64::consts::FRAC_PI_2);

        [
            (self.x0 + mx + nx, self.y0 + my + ny),
            (self.x0 - mx + nx, self.y0 - my + ny),
            (self.x0 - mx - nx, self.y0 - my - ny),
            (self.x0 + mx - nx, self.y0 + my - ny),
        ]
    }

    /// Axis-aligned extent `(x_min, x_max, y_min, y_max)` of the external box
    pub fn external_extent(&self) -> (f64, f64, f64, f64) {
        let corners = self.get_rectangular_external_box();
        corners.iter().fold(
            (
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::INFINITY,
                f64::NEG_INFINITY,
            ),
            |(x_min, x_max, y_min, y_max), &(x, y)| {
                (x_min.min(x), x_max.max(x), y_min.min(y), y_max.max(y))
            },
        )
    }

    /// Offset from the centre to the ellipse edge at polar angle `theta` in
    /// the ellipse frame
    ///
    /// `r(θ) = a·b / sqrt((a·sinθ)² + (b·cosθ)²)`, placed at absolute angle `θ + t`.
    fn edge_offset(&self, theta: f64) -> PlanePoint {
        let (s, c) = theta.sin_cos();
        let r = self.a * self.b / ((self.a * s).powi(2) + (self.b * c).powi(2)).sqrt();
        let (st, ct) = (theta + self.t).sin_cos();
        (r * ct, r * st)
    }
}

/// Edge points sit exactly on the boundary; this keeps them inside
const MIN_INTERNAL_MARGIN: f64 = 1e-6;

impl Default for Beam {
    /// Unit circle on the optical axis
    fn default() -> Self {
        Self::circular(1.0, 0.0, 0.0)
    }
}
