use nalgebra::{Rotation3, Unit};

use crate::error::{GeometryError, Result};

use super::{perpendicular_dir, Point3, Vector3, TOLERANCE};

/// A local right-handed coordinate frame.
///
/// Components place themselves with a frame: `y` is the beam direction,
/// `z` is "up" and `x = y x z` completes the triad.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    origin: Point3,
    x: Vector3,
    y: Vector3,
    z: Vector3,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            origin: Point3::origin(),
            x: Vector3::x(),
            y: Vector3::y(),
            z: Vector3::z(),
        }
    }
}

impl Frame {
    /// Builds a frame whose `y` axis follows `axis`, keeping `reference_z`
    /// as close to `z` as orthogonality allows.
    ///
    /// # Errors
    ///
    /// Returns an error if `axis` is zero-length.
    pub fn from_link(point: Point3, axis: Vector3, reference_z: &Vector3) -> Result<Self> {
        let len = axis.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let y = axis / len;

        let mut z = reference_z - y * reference_z.dot(&y);
        if z.norm() < TOLERANCE {
            z = perpendicular_dir(&y);
        }
        let z = z.normalize();
        let x = y.cross(&z);

        Ok(Self { origin: point, x, y, z })
    }

    /// Returns the origin.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the X axis.
    #[must_use]
    pub fn x(&self) -> &Vector3 {
        &self.x
    }

    /// Returns the Y (beam) axis.
    #[must_use]
    pub fn y(&self) -> &Vector3 {
        &self.y
    }

    /// Returns the Z axis.
    #[must_use]
    pub fn z(&self) -> &Vector3 {
        &self.z
    }

    /// Moves the origin by a step expressed in the local axes.
    pub fn apply_shift(&mut self, x_step: f64, y_step: f64, z_step: f64) {
        self.origin += self.x * x_step + self.y * y_step + self.z * z_step;
    }

    /// Rotates the frame about its Z axis by `xy_angle` and then about the
    /// new X axis by `z_angle`. Angles are in degrees.
    pub fn apply_angle_rotate(&mut self, xy_angle: f64, z_angle: f64) {
        let about_z = Rotation3::from_axis_angle(&Unit::new_normalize(self.z), xy_angle.to_radians());
        self.x = about_z * self.x;
        self.y = about_z * self.y;

        let about_x = Rotation3::from_axis_angle(&Unit::new_normalize(self.x), z_angle.to_radians());
        self.y = about_x * self.y;
        self.z = about_x * self.z;
    }

    /// Flips the beam direction, keeping the frame right-handed.
    pub fn reverse_y(&mut self) {
        self.y = -self.y;
        self.x = -self.x;
    }

    /// Converts a point given in local coordinates into model coordinates.
    #[must_use]
    pub fn real_pt(&self, local: &Vector3) -> Point3 {
        self.origin + self.real_axis(local)
    }

    /// Converts a direction given in local coordinates into model coordinates.
    #[must_use]
    pub fn real_axis(&self, local: &Vector3) -> Vector3 {
        self.x * local.x + self.y * local.y + self.z * local.z
    }
}
