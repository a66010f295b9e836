use crate::error::{GeometryError, Result};
use crate::math::{finite_point, unit_direction, Point3, Vector3, TOLERANCE};

use super::HalfSpace;

/// An infinite plane `normal . p = distance`.
///
/// The positive half-space is the side the normal points into.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    normal: Vector3,
    distance: f64,
}

impl Plane {
    /// Creates a plane through `point` with the given normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length or any input is
    /// not finite.
    pub fn new(point: Point3, normal: Vector3) -> Result<Self> {
        finite_point(&point, "plane point")?;
        let normal = unit_direction(&normal, "plane normal")?;
        let distance = normal.dot(&point.coords);
        Ok(Self { normal, distance })
    }

    /// Creates a plane through three points, with the normal following the
    /// right-hand rule `(b - a) x (c - a)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the points are collinear.
    pub fn from_points(a: Point3, b: Point3, c: Point3) -> Result<Self> {
        let normal = (b - a).cross(&(c - a));
        if normal.norm() < TOLERANCE {
            return Err(GeometryError::Degenerate("plane points are collinear".into()).into());
        }
        Self::new(a, normal)
    }

    /// Returns the unit normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the signed distance of the plane from the origin.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Returns `Some(1)` for the same plane, `Some(-1)` for the same plane
    /// with a reversed normal, `None` otherwise.
    #[must_use]
    pub fn equivalent(&self, other: &Plane, tol: f64) -> Option<i32> {
        if (self.normal - other.normal).norm() < tol && (self.distance - other.distance).abs() < tol {
            Some(1)
        } else if (self.normal + other.normal).norm() < tol
            && (self.distance + other.distance).abs() < tol
        {
            Some(-1)
        } else {
            None
        }
    }
}

impl HalfSpace for Plane {
    fn side_value(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) - self.distance
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn distance_from_point_and_normal() {
        let p = Plane::new(Point3::new(0.0, 3.0, 7.0), Vector3::new(0.0, 2.0, 0.0)).unwrap();
        assert!((p.distance() - 3.0).abs() < TOLERANCE);
        assert!((p.normal() - Vector3::y()).norm() < TOLERANCE);
    }

    #[test]
    fn side_follows_normal() {
        let p = Plane::new(Point3::origin(), Vector3::y()).unwrap();
        assert_eq!(p.side(&Point3::new(0.0, 1.0, 0.0), 1e-9), 1);
        assert_eq!(p.side(&Point3::new(5.0, -1.0, 0.0), 1e-9), -1);
        assert_eq!(p.side(&Point3::new(5.0, 0.0, 2.0), 1e-9), 0);
    }

    #[test]
    fn reversed_plane_is_negative_equivalent() {
        let a = Plane::new(Point3::new(0.0, 2.0, 0.0), Vector3::y()).unwrap();
        let b = Plane::new(Point3::new(4.0, 2.0, 1.0), -Vector3::y()).unwrap();
        assert_eq!(a.equivalent(&a.clone(), 1e-6), Some(1));
        assert_eq!(a.equivalent(&b, 1e-6), Some(-1));
    }

    #[test]
    fn shifted_plane_is_distinct() {
        let a = Plane::new(Point3::origin(), Vector3::y()).unwrap();
        let b = Plane::new(Point3::new(0.0, 1.0, 0.0), Vector3::y()).unwrap();
        assert_eq!(a.equivalent(&b, 1e-6), None);
    }

    #[test]
    fn non_finite_input() {
        assert!(Plane::new(Point3::new(f64::NAN, 0.0, 0.0), Vector3::y()).is_err());
        assert!(Plane::new(Point3::origin(), Vector3::new(0.0, f64::INFINITY, 0.0)).is_err());
    }

    #[test]
    fn zero_normal() {
        assert!(Plane::new(Point3::origin(), Vector3::zeros()).is_err());
    }

    #[test]
    fn three_points() {
        let p = Plane::from_points(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert!((p.normal() - Vector3::z()).norm() < TOLERANCE);
        assert!(Plane::from_points(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0)
        )
        .is_err());
    }
}
