use std::f64::consts::FRAC_PI_2;

use crate::error::{GeometryError, Result};
use crate::math::{finite_point, unit_direction, Point3, Vector3, TOLERANCE};

use super::HalfSpace;

/// Which nappe(s) of a cone take part in the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConeSheet {
    /// Both nappes (the full double cone).
    Both,
    /// Only the nappe opening along `+axis`.
    Forward,
    /// Only the nappe opening along `-axis`.
    Backward,
}

impl ConeSheet {
    /// Maps the deck convention `0 / 1 / -1` onto a sheet.
    ///
    /// # Errors
    ///
    /// Returns an error for any other value.
    pub fn from_i32(sheet: i32) -> Result<Self> {
        match sheet {
            0 => Ok(Self::Both),
            1 => Ok(Self::Forward),
            -1 => Ok(Self::Backward),
            _ => Err(GeometryError::ParameterOutOfRange {
                parameter: "sheet",
                value: f64::from(sheet),
                min: -1.0,
                max: 1.0,
            }
            .into()),
        }
    }

    /// Returns the deck convention `0 / 1 / -1`.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Both => 0,
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    #[must_use]
    fn reversed(self) -> Self {
        match self {
            Self::Both => Self::Both,
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// A cone with apex, axis and half-angle.
///
/// The negative half-space is the region within `half_angle` of the axis
/// (on the selected sheet).
#[derive(Debug, Clone, PartialEq)]
pub struct Cone {
    apex: Point3,
    axis: Vector3,
    half_angle: f64,
    sheet: ConeSheet,
}

impl Cone {
    /// Creates a new cone.
    ///
    /// # Arguments
    ///
    /// * `apex` - The apex (tip) of the cone
    /// * `axis` - Axis direction (will be normalized)
    /// * `half_angle` - Half-angle in radians (must be in `(0, pi/2)`)
    /// * `sheet` - Nappe selection
    ///
    /// # Errors
    ///
    /// Returns an error if the half-angle is out of range (NaN included), the
    /// axis is zero-length, or any input is not finite.
    pub fn new(apex: Point3, axis: Vector3, half_angle: f64, sheet: ConeSheet) -> Result<Self> {
        let in_range = half_angle > TOLERANCE && half_angle < FRAC_PI_2 - TOLERANCE;
        if !in_range {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "half_angle",
                value: half_angle,
                min: 0.0,
                max: FRAC_PI_2,
            }
            .into());
        }
        finite_point(&apex, "cone apex")?;
        Ok(Self {
            apex,
            axis: unit_direction(&axis, "cone axis")?,
            half_angle,
            sheet,
        })
    }

    /// Returns the apex point.
    #[must_use]
    pub fn apex(&self) -> &Point3 {
        &self.apex
    }

    /// Returns the axis direction (unit vector).
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// Returns the half-angle in radians.
    #[must_use]
    pub fn half_angle(&self) -> f64 {
        self.half_angle
    }

    /// Returns the sheet selection.
    #[must_use]
    pub fn sheet(&self) -> ConeSheet {
        self.sheet
    }

    /// Returns `true` if `other` is the same cone. A reversed axis matches
    /// when the sheet selection is reversed with it.
    #[must_use]
    pub fn equivalent(&self, other: &Cone, tol: f64) -> bool {
        if (self.apex - other.apex).norm() >= tol || (self.half_angle - other.half_angle).abs() >= tol {
            return false;
        }
        if (self.axis - other.axis).norm() < tol {
            self.sheet == other.sheet
        } else if (self.axis + other.axis).norm() < tol {
            self.sheet == other.sheet.reversed()
        } else {
            false
        }
    }
}

impl HalfSpace for Cone {
    fn side_value(&self, point: &Point3) -> f64 {
        let dp = point - self.apex;
        let h = dp.dot(&self.axis);
        let radial = (dp - self.axis * h).norm();
        let along = match self.sheet {
            ConeSheet::Both => h.abs(),
            ConeSheet::Forward => h,
            ConeSheet::Backward => -h,
        };
        radial * self.half_angle.cos() - along * self.half_angle.sin()
    }
}
