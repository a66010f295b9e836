use crate::error::Result;
use crate::math::{finite_point, is_parallel, positive_length, unit_direction, Point3, Vector3};

use super::HalfSpace;

/// An infinite cylinder about an arbitrary axis.
///
/// The negative half-space is the inside of the cylinder.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    centre: Point3,
    axis: Vector3,
    radius: f64,
}

impl Cylinder {
    /// Creates a new cylinder.
    ///
    /// # Arguments
    ///
    /// * `centre` - A point on the cylinder axis
    /// * `axis` - Axis direction (will be normalized)
    /// * `radius` - Radius (must be positive)
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive, the axis is
    /// zero-length, or any input is not finite.
    pub fn new(centre: Point3, axis: Vector3, radius: f64) -> Result<Self> {
        let radius = positive_length(radius, "cylinder radius")?;
        finite_point(&centre, "cylinder centre")?;
        Ok(Self {
            centre,
            axis: unit_direction(&axis, "cylinder axis")?,
            radius,
        })
    }

    /// Returns the point on the axis the cylinder was built from.
    #[must_use]
    pub fn centre(&self) -> &Point3 {
        &self.centre
    }

    /// Returns the axis direction (unit vector).
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// Returns the radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Perpendicular distance from `point` to the axis.
    #[must_use]
    pub fn axis_distance(&self, point: &Point3) -> f64 {
        let dp = point - self.centre;
        (dp - self.axis * dp.dot(&self.axis)).norm()
    }

    /// Returns `true` if `other` is the same cylinder. Axis sign and the
    /// choice of centre along the axis do not matter.
    #[must_use]
    pub fn equivalent(&self, other: &Cylinder, tol: f64) -> bool {
        (self.radius - other.radius).abs() < tol
            && is_parallel(&self.axis, &other.axis, tol)
            && self.axis_distance(&other.centre) < tol
    }
}

impl HalfSpace for Cylinder {
    fn side_value(&self, point: &Point3) -> f64 {
        self.axis_distance(point) - self.radius
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn y_cylinder(radius: f64) -> Cylinder {
        Cylinder::new(Point3::origin(), Vector3::y(), radius).unwrap()
    }

    #[test]
    fn inside_is_negative() {
        let c = y_cylinder(5.0);
        assert_eq!(c.side(&Point3::new(1.0, 100.0, 1.0), 1e-9), -1);
        assert_eq!(c.side(&Point3::new(6.0, -3.0, 0.0), 1e-9), 1);
        assert_eq!(c.side(&Point3::new(0.0, 2.0, 5.0), 1e-9), 0);
    }

    #[test]
    fn centre_slides_along_axis() {
        let a = y_cylinder(5.0);
        let b = Cylinder::new(Point3::new(0.0, 40.0, 0.0), -Vector3::y(), 5.0).unwrap();
        assert!(a.equivalent(&b, 1e-6));
    }

    #[test]
    fn offset_axis_is_distinct() {
        let a = y_cylinder(5.0);
        let b = Cylinder::new(Point3::new(1.0, 0.0, 0.0), Vector3::y(), 5.0).unwrap();
        let c = y_cylinder(5.5);
        assert!(!a.equivalent(&b, 1e-6));
        assert!(!a.equivalent(&c, 1e-6));
    }

    #[test]
    fn invalid_radius() {
        assert!(Cylinder::new(Point3::origin(), Vector3::z(), f64::NAN).is_err());
        assert!(Cylinder::new(Point3::origin(), Vector3::z(), f64::INFINITY).is_err());
        assert!(Cylinder::new(Point3::new(0.0, f64::NAN, 0.0), Vector3::z(), 1.0).is_err());
        assert!(Cylinder::new(Point3::origin(), Vector3::z(), 0.0).is_err());
        assert!(Cylinder::new(Point3::origin(), Vector3::z(), -1.0).is_err());
    }

    #[test]
    fn invalid_axis() {
        assert!(Cylinder::new(Point3::origin(), Vector3::zeros(), 1.0).is_err());
    }
}
