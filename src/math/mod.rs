mod frame;

pub use frame::Frame;

use crate::error::{GeometryError, Result};

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Tolerance below which a length or dot product is treated as zero.
pub const TOLERANCE: f64 = 1e-10;

/// Finds a unit direction perpendicular to the given unit vector.
#[must_use]
pub fn perpendicular_dir(axis: &Vector3) -> Vector3 {
    let candidate = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    axis.cross(&candidate).normalize()
}

/// Returns `true` if two unit vectors point the same way or exactly opposite.
#[must_use]
pub fn is_parallel(a: &Vector3, b: &Vector3, tol: f64) -> bool {
    a.cross(b).norm() < tol
}

/// Normalises a direction, rejecting zero-length and non-finite input.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroVector`] for a zero-length vector and
/// [`GeometryError::Degenerate`] for NaN or infinite components.
pub fn unit_direction(v: &Vector3, parameter: &'static str) -> Result<Vector3> {
    if !v.iter().all(|c| c.is_finite()) {
        return Err(GeometryError::Degenerate(format!("{parameter} is not finite")).into());
    }
    let len = v.norm();
    if len < TOLERANCE {
        return Err(GeometryError::ZeroVector.into());
    }
    Ok(v / len)
}

/// Rejects points with NaN or infinite coordinates.
///
/// # Errors
///
/// Returns [`GeometryError::Degenerate`] naming `parameter`.
pub fn finite_point(p: &Point3, parameter: &'static str) -> Result<()> {
    if p.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(GeometryError::Degenerate(format!("{parameter} is not finite")).into())
    }
}

/// Accepts a finite length of at least [`TOLERANCE`].
///
/// # Errors
///
/// Returns [`GeometryError::ParameterOutOfRange`] otherwise, NaN included.
pub fn positive_length(value: f64, parameter: &'static str) -> Result<f64> {
    if value.is_finite() && value >= TOLERANCE {
        Ok(value)
    } else {
        Err(GeometryError::ParameterOutOfRange {
            parameter,
            value,
            min: TOLERANCE,
            max: f64::INFINITY,
        }
        .into())
    }
}
