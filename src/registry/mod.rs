//! Process-wide surface store.
//!
//! Every primitive built by any component lands here. Equivalent surfaces
//! are stored once: a second request for the same plane (or the same plane
//! with a reversed normal) returns the existing number, signed to match.
//! Components address their surfaces through logical numbers
//! (`block base + local offset`), which the registry maps onto the canonical
//! signed surface number.

use std::collections::{BTreeMap, HashMap};

use tracing::{trace, warn};

use crate::error::{GeometryError, Result, RuleError};
use crate::geometry::{Cone, ConeSheet, Cylinder, Plane, Sphere, Surface};
use crate::math::{Point3, Vector3};

/// Store of all surfaces in one model build.
#[derive(Debug)]
pub struct SurfaceRegistry {
    surfaces: BTreeMap<i32, Surface>,
    logical: HashMap<i32, i32>,
    next_id: i32,
    tolerance: f64,
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::new(1, 1e-6)
    }
}

impl SurfaceRegistry {
    /// Creates an empty registry that numbers surfaces from `first_id`.
    #[must_use]
    pub fn new(first_id: i32, tolerance: f64) -> Self {
        Self {
            surfaces: BTreeMap::new(),
            logical: HashMap::new(),
            next_id: first_id,
            tolerance,
        }
    }

    /// Registers `surface` under the logical number `logical` and returns the
    /// signed canonical surface number.
    ///
    /// If an equivalent surface already exists its number is reused; a plane
    /// with reversed normal yields the negated number.
    pub fn register(&mut self, logical: i32, surface: Surface) -> i32 {
        let signed = match self.find_equivalent(&surface) {
            Some(found) => {
                trace!(logical, surface = found, "reusing equivalent surface");
                found
            }
            None => {
                let id = self.next_id;
                self.next_id += 1;
                trace!(logical, surface = id, kind = surface.kind(), "new surface");
                self.surfaces.insert(id, surface);
                id
            }
        };
        if let Some(previous) = self.logical.insert(logical, signed) {
            if previous != signed {
                warn!(logical, previous, signed, "logical surface number rebound");
            }
        }
        signed
    }

    /// Searches for a stored surface equivalent to `surface`.
    #[must_use]
    pub fn find_equivalent(&self, surface: &Surface) -> Option<i32> {
        self.surfaces
            .iter()
            .find_map(|(&id, stored)| stored.equivalent(surface, self.tolerance).map(|sign| sign * id))
    }

    /// Builds a plane through `point` with the given normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero-length.
    pub fn build_plane(&mut self, logical: i32, point: Point3, normal: Vector3) -> Result<i32> {
        let plane = Plane::new(point, normal)?;
        Ok(self.register(logical, Surface::Plane(plane)))
    }

    /// Builds a plane through three points.
    ///
    /// # Errors
    ///
    /// Returns an error if the points are collinear.
    pub fn build_plane_three_points(
        &mut self,
        logical: i32,
        a: Point3,
        b: Point3,
        c: Point3,
    ) -> Result<i32> {
        let plane = Plane::from_points(a, b, c)?;
        Ok(self.register(logical, Surface::Plane(plane)))
    }

    /// Builds a plane parallel to an existing plane, moved `shift` along the
    /// existing (signed) plane's normal.
    ///
    /// # Errors
    ///
    /// Returns an error if `reference` is not a registered plane.
    pub fn build_shifted_plane(&mut self, logical: i32, reference: i32, shift: f64) -> Result<i32> {
        let Some(Surface::Plane(plane)) = self.surfaces.get(&reference.abs()) else {
            return Err(GeometryError::Degenerate(format!("surface {reference} is not a plane")).into());
        };
        let normal = if reference < 0 {
            -plane.normal()
        } else {
            *plane.normal()
        };
        let on_plane = Point3::from(plane.normal() * plane.distance());
        self.build_plane(logical, on_plane + normal * shift, normal)
    }

    /// Builds an infinite cylinder.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is zero-length or the radius non-positive.
    pub fn build_cylinder(
        &mut self,
        logical: i32,
        centre: Point3,
        axis: Vector3,
        radius: f64,
    ) -> Result<i32> {
        let cylinder = Cylinder::new(centre, axis, radius)?;
        Ok(self.register(logical, Surface::Cylinder(cylinder)))
    }

    /// Builds a cone. `half_angle` is given in degrees.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is zero-length or the angle is outside `(0, 90)`.
    pub fn build_cone(
        &mut self,
        logical: i32,
        apex: Point3,
        axis: Vector3,
        half_angle: f64,
        sheet: ConeSheet,
    ) -> Result<i32> {
        let cone = Cone::new(apex, axis, half_angle.to_radians(), sheet)?;
        Ok(self.register(logical, Surface::Cone(cone)))
    }

    /// Builds a sphere.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive.
    pub fn build_sphere(&mut self, logical: i32, centre: Point3, radius: f64) -> Result<i32> {
        let sphere = Sphere::new(centre, radius)?;
        Ok(self.register(logical, Surface::Sphere(sphere)))
    }

    /// Returns the signed surface number bound to a logical number.
    #[must_use]
    pub fn realise(&self, logical: i32) -> Option<i32> {
        self.logical.get(&logical).copied()
    }

    /// Resolves a signed logical number, e.g. `-(base + 4)`, into a signed
    /// surface number.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing was built at that logical number.
    pub fn real_surf(&self, signed_logical: i32) -> Result<i32> {
        let id = self
            .realise(signed_logical.abs())
            .ok_or(RuleError::UnknownSurface(signed_logical.abs()))?;
        Ok(if signed_logical < 0 { -id } else { id })
    }

    /// Returns the surface stored under `id` (sign ignored).
    #[must_use]
    pub fn surface(&self, id: i32) -> Option<&Surface> {
        self.surfaces.get(&id.abs())
    }

    /// Iterates over all surfaces in number order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &Surface)> {
        self.surfaces.iter().map(|(&id, s)| (id, s))
    }

    /// Number of distinct surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Returns `true` if no surface has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn identical_plane_reuses_number() {
        let mut reg = SurfaceRegistry::default();
        let a = reg.build_plane(101, Point3::origin(), Vector3::y()).unwrap();
        let b = reg.build_plane(10_101, Point3::new(3.0, 0.0, 2.0), Vector3::y() * 2.0).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn reversed_plane_is_negated() {
        let mut reg = SurfaceRegistry::default();
        let a = reg.build_plane(101, Point3::origin(), Vector3::y()).unwrap();
        let b = reg.build_plane(102, Point3::origin(), -Vector3::y()).unwrap();
        assert_eq!(b, -a);
        assert_eq!(reg.realise(102), Some(-1));
        assert_eq!(reg.real_surf(-102).unwrap(), 1);
    }

    #[test]
    fn different_kinds_never_merge() {
        let mut reg = SurfaceRegistry::default();
        let p = reg.build_plane(1, Point3::origin(), Vector3::y()).unwrap();
        let c = reg.build_cylinder(2, Point3::origin(), Vector3::y(), 5.0).unwrap();
        let s = reg.build_sphere(3, Point3::origin(), 5.0).unwrap();
        let k = reg
            .build_cone(4, Point3::origin(), Vector3::y(), 30.0, ConeSheet::Both)
            .unwrap();
        assert_eq!((p, c, s, k), (1, 2, 3, 4));
    }

    #[test]
    fn degenerate_input_fails_without_allocating() {
        let mut reg = SurfaceRegistry::default();
        assert!(reg.build_cylinder(1, Point3::origin(), Vector3::zeros(), 1.0).is_err());
        assert!(reg.build_sphere(2, Point3::origin(), -1.0).is_err());
        assert!(reg.is_empty());
        assert_eq!(reg.realise(1), None);
    }

    #[test]
    fn non_finite_input_never_registers() {
        let mut reg = SurfaceRegistry::default();
        let nan = Point3::new(f64::NAN, 0.0, 0.0);
        assert!(reg.build_plane(1, nan, Vector3::y()).is_err());
        assert!(reg.build_cylinder(2, Point3::origin(), Vector3::y(), f64::NAN).is_err());
        assert!(reg.build_sphere(3, Point3::origin(), f64::INFINITY).is_err());
        assert!(reg
            .build_cone(4, Point3::origin(), Vector3::y(), f64::NAN, ConeSheet::Both)
            .is_err());
        let front = reg.build_plane(5, Point3::origin(), Vector3::y()).unwrap();
        assert!(reg.build_shifted_plane(6, front, f64::INFINITY).is_err());
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.realise(2), None);
    }

    #[test]
    fn shifted_plane_follows_signed_normal() {
        let mut reg = SurfaceRegistry::default();
        let front = reg.build_plane(1, Point3::new(0.0, 2.0, 0.0), Vector3::y()).unwrap();
        let fwd = reg.build_shifted_plane(2, front, 3.0).unwrap();
        let back = reg.build_shifted_plane(3, -front, 3.0).unwrap();
        let Some(Surface::Plane(p)) = reg.surface(fwd) else {
            panic!("expected plane");
        };
        assert!((p.distance() - 5.0).abs() < 1e-9);
        let Some(Surface::Plane(q)) = reg.surface(back) else {
            panic!("expected plane");
        };
        assert!((q.distance() - 1.0).abs() < 1e-9);
        assert!((q.normal() + Vector3::y()).norm() < 1e-9);
        assert!(reg.build_shifted_plane(4, 99, 1.0).is_err());
    }

    #[test]
    fn unknown_logical_number() {
        let reg = SurfaceRegistry::default();
        assert!(reg.real_surf(5).is_err());
    }
}
