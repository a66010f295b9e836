mod cone;
mod cylinder;
mod plane;
mod sphere;

use std::fmt;

pub use cone::{Cone, ConeSheet};
pub use cylinder::Cylinder;
pub use plane::Plane;
pub use sphere::Sphere;

use crate::math::Point3;

/// A surface that splits space into a negative and a positive half-space.
pub trait HalfSpace {
    /// Signed distance-like value at `point`: negative on the inside
    /// (behind a plane), positive on the outside, zero on the surface.
    fn side_value(&self, point: &Point3) -> f64;

    /// Returns `1` or `-1` for the half-space holding `point`, or `0` when
    /// the point lies on the surface within `tol`.
    fn side(&self, point: &Point3, tol: f64) -> i32 {
        let value = self.side_value(point);
        if value > tol {
            1
        } else if value < -tol {
            -1
        } else {
            0
        }
    }
}

/// Concrete half-space primitive stored in the surface registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    /// A plane.
    Plane(Plane),
    /// An infinite cylinder about an arbitrary axis.
    Cylinder(Cylinder),
    /// A cone, optionally restricted to one sheet.
    Cone(Cone),
    /// A sphere.
    Sphere(Sphere),
}

impl Surface {
    /// Short kind name used by deck writers.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Plane(_) => "plane",
            Self::Cylinder(_) => "cylinder",
            Self::Cone(_) => "cone",
            Self::Sphere(_) => "sphere",
        }
    }

    /// Tests whether two primitives describe the same surface within `tol`.
    ///
    /// Returns `Some(1)` if they are identical, `Some(-1)` if they are the same
    /// surface with opposite sense (only possible for planes), and `None`
    /// otherwise.
    #[must_use]
    pub fn equivalent(&self, other: &Surface, tol: f64) -> Option<i32> {
        match (self, other) {
            (Self::Plane(a), Self::Plane(b)) => a.equivalent(b, tol),
            (Self::Cylinder(a), Self::Cylinder(b)) => a.equivalent(b, tol).then_some(1),
            (Self::Cone(a), Self::Cone(b)) => a.equivalent(b, tol).then_some(1),
            (Self::Sphere(a), Self::Sphere(b)) => a.equivalent(b, tol).then_some(1),
            _ => None,
        }
    }
}

impl HalfSpace for Surface {
    fn side_value(&self, point: &Point3) -> f64 {
        match self {
            Self::Plane(s) => s.side_value(point),
            Self::Cylinder(s) => s.side_value(point),
            Self::Cone(s) => s.side_value(point),
            Self::Sphere(s) => s.side_value(point),
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plane(s) => {
                let n = s.normal();
                write!(f, "p {} {} {} {}", n.x, n.y, n.z, s.distance())
            }
            Self::Cylinder(s) => {
                let (c, a) = (s.centre(), s.axis());
                write!(
                    f,
                    "cyl {} {} {} {} {} {} {}",
                    c.x,
                    c.y,
                    c.z,
                    a.x,
                    a.y,
                    a.z,
                    s.radius()
                )
            }
            Self::Cone(s) => {
                let (c, a) = (s.apex(), s.axis());
                write!(
                    f,
                    "cone {} {} {} {} {} {} {} {}",
                    c.x,
                    c.y,
                    c.z,
                    a.x,
                    a.y,
                    a.z,
                    s.half_angle().to_degrees(),
                    s.sheet().as_i32()
                )
            }
            Self::Sphere(s) => {
                let c = s.centre();
                write!(f, "s {} {} {} {}", c.x, c.y, c.z, s.radius())
            }
        }
    }
}
