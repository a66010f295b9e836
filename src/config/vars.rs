use std::collections::HashMap;

use crate::error::{LookupError, Result};
use crate::math::Vector3;

/// A value held by the variable store.
#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    Float(f64),
    Int(i64),
    Text(String),
    Vector(Vector3),
}

impl From<f64> for VarValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for VarValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for VarValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for VarValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for VarValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vector3> for VarValue {
    fn from(v: Vector3) -> Self {
        Self::Vector(v)
    }
}

/// Conversion out of a stored [`VarValue`].
pub trait FromVar: Sized {
    /// Name used in type-mismatch errors.
    const EXPECTED: &'static str;

    /// Converts the value, or returns `None` on a type mismatch.
    fn from_var(value: &VarValue) -> Option<Self>;
}

impl FromVar for f64 {
    const EXPECTED: &'static str = "number";

    #[allow(clippy::cast_precision_loss)]
    fn from_var(value: &VarValue) -> Option<Self> {
        match value {
            VarValue::Float(v) => Some(*v),
            VarValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl FromVar for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_var(value: &VarValue) -> Option<Self> {
        match value {
            VarValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromVar for i32 {
    const EXPECTED: &'static str = "integer";

    fn from_var(value: &VarValue) -> Option<Self> {
        match value {
            VarValue::Int(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromVar for usize {
    const EXPECTED: &'static str = "count";

    fn from_var(value: &VarValue) -> Option<Self> {
        match value {
            VarValue::Int(v) => usize::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromVar for String {
    const EXPECTED: &'static str = "string";

    fn from_var(value: &VarValue) -> Option<Self> {
        match value {
            VarValue::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromVar for Vector3 {
    const EXPECTED: &'static str = "vector";

    fn from_var(value: &VarValue) -> Option<Self> {
        match value {
            VarValue::Vector(v) => Some(*v),
            _ => None,
        }
    }
}

/// Keyed parameter store read by components during `populate`.
///
/// Material names are resolved through a separate table so cells store
/// plain integer material ids.
#[derive(Debug, Clone, Default)]
pub struct FuncDataBase {
    vars: HashMap<String, VarValue>,
    materials: HashMap<String, i32>,
}

impl FuncDataBase {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a variable.
    pub fn add_variable(&mut self, key: &str, value: impl Into<VarValue>) {
        self.vars.insert(key.to_owned(), value.into());
    }

    /// Registers a material name.
    pub fn add_material(&mut self, name: &str, id: i32) {
        self.materials.insert(name.to_owned(), id);
    }

    /// Returns `true` if the variable exists.
    #[must_use]
    pub fn has_variable(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Reads a required variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or holds another type.
    pub fn eval_var<T: FromVar>(&self, key: &str) -> Result<T> {
        let value = self
            .vars
            .get(key)
            .ok_or_else(|| LookupError::VariableNotFound(key.to_owned()))?;
        T::from_var(value).ok_or_else(|| {
            LookupError::VariableType {
                key: key.to_owned(),
                expected: T::EXPECTED,
            }
            .into()
        })
    }

    /// Reads a variable, falling back to `default` when absent or mistyped.
    #[must_use]
    pub fn eval_def_var<T: FromVar>(&self, key: &str, default: T) -> T {
        self.vars.get(key).and_then(T::from_var).unwrap_or(default)
    }

    /// Reads `primary`, or `fallback` if `primary` is not set. Components use
    /// this for per-instance overrides of a shared default (`pipeA` vs `pipe`).
    ///
    /// # Errors
    ///
    /// Returns an error if neither key holds a value of the right type.
    pub fn eval_pair<T: FromVar>(&self, primary: &str, fallback: &str) -> Result<T> {
        if self.vars.contains_key(primary) {
            self.eval_var(primary)
        } else {
            self.eval_var(fallback)
        }
    }

    /// Resolves a material variable: an integer id, or a material name
    /// registered with [`add_material`](Self::add_material).
    ///
    /// # Errors
    ///
    /// Returns an error if the key or the named material is unknown.
    pub fn eval_mat(&self, key: &str) -> Result<i32> {
        match self.vars.get(key) {
            Some(VarValue::Int(_)) => self.eval_var::<i32>(key),
            Some(VarValue::Text(name)) => self.material(name),
            Some(_) => Err(LookupError::VariableType {
                key: key.to_owned(),
                expected: "material",
            }
            .into()),
            None => Err(LookupError::VariableNotFound(key.to_owned()).into()),
        }
    }

    /// Looks up a material id by name. `"Void"` is always material 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the material was never registered.
    pub fn material(&self, name: &str) -> Result<i32> {
        if name == "Void" {
            return Ok(0);
        }
        self.materials.get(name).copied().ok_or_else(|| {
            LookupError::NameNotFound {
                owner: "materials".into(),
                name: name.to_owned(),
            }
            .into()
        })
    }
}
