use crate::error::Result;
use crate::math::{finite_point, positive_length, Point3};

use super::HalfSpace;

/// A sphere. The negative half-space is the inside.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    centre: Point3,
    radius: f64,
}

impl Sphere {
    /// Creates a new sphere.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive or any input is not finite.
    pub fn new(centre: Point3, radius: f64) -> Result<Self> {
        let radius = positive_length(radius, "sphere radius")?;
        finite_point(&centre, "sphere centre")?;
        Ok(Self { centre, radius })
    }

    /// Returns the centre of the sphere.
    #[must_use]
    pub fn centre(&self) -> &Point3 {
        &self.centre
    }

    /// Returns the radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[must_use]
    pub fn equivalent(&self, other: &Sphere, tol: f64) -> bool {
        (self.radius - other.radius).abs() < tol && (self.centre - other.centre).norm() < tol
    }
}

impl HalfSpace for Sphere {
    fn side_value(&self, point: &Point3) -> f64 {
        (point - self.centre).norm() - self.radius
    }
}
