use thiserror::Error;

/// Top-level error type for the model construction engine.
#[derive(Debug, Error)]
pub enum BeamgeomError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// An error annotated with the component and build stage that raised it.
    #[error("component '{component}' failed in {stage}: {source}")]
    Component {
        component: String,
        stage: &'static str,
        #[source]
        source: Box<BeamgeomError>,
    },
}

impl BeamgeomError {
    /// Returns the innermost error, skipping any component breadcrumbs.
    #[must_use]
    pub fn root_cause(&self) -> &BeamgeomError {
        match self {
            Self::Component { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns the component/stage trail, outermost first.
    #[must_use]
    pub fn breadcrumbs(&self) -> Vec<(&str, &'static str)> {
        let mut trail = Vec::new();
        let mut current = self;
        while let Self::Component {
            component,
            stage,
            source,
        } = current
        {
            trail.push((component.as_str(), *stage));
            current = source;
        }
        trail
    }
}

/// Errors raised while building surface primitives.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors raised while composing or evaluating half-space rules.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("unresolved surface offset {offset} against base {base}")]
    UnresolvedSurface { offset: i32, base: i32 },

    #[error("surface {0} is not in the registry")]
    UnknownSurface(i32),

    #[error("surface {0} has not been bound to a primitive")]
    UnboundSurface(i32),

    #[error("rule parse error at {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("no index base supplied for selector '{0}'")]
    MissingBase(char),
}

/// Errors raised by name, index and cell lookups.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{owner}: no entry named '{name}'")]
    NameNotFound { owner: String, name: String },

    #[error("{owner}: index {index} out of range for '{name}' (size {len})")]
    IndexOutOfRange {
        owner: String,
        name: String,
        index: i64,
        len: usize,
    },

    #[error("{owner}: link {index} has not been set")]
    LinkNotSet { owner: String, index: i32 },

    #[error("host cell {0} not found for insertion")]
    HostCellNotFound(i32),

    #[error("cell {0} not found")]
    CellNotFound(i32),

    #[error("cell {0} already exists")]
    DuplicateCell(i32),

    #[error("component '{0}' is already registered")]
    DuplicateComponent(String),

    #[error("index range exhausted reserving a block for '{0}'")]
    AllocatorExhausted(String),

    #[error("variable '{0}' not found")]
    VariableNotFound(String),

    #[error("variable '{key}' is not a {expected}")]
    VariableType { key: String, expected: &'static str },
}

/// Convenience type alias for results using [`BeamgeomError`].
pub type Result<T> = std::result::Result<T, BeamgeomError>;

/// Attaches component breadcrumbs to a failing result.
pub trait ResultExt<T> {
    /// Wraps the error with the component name and the stage that was active.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped in [`BeamgeomError::Component`].
    fn in_stage(self, component: &str, stage: &'static str) -> Result<T>;
}

impl<T, E: Into<BeamgeomError>> ResultExt<T> for std::result::Result<T, E> {
    fn in_stage(self, component: &str, stage: &'static str) -> Result<T> {
        self.map_err(|e| BeamgeomError::Component {
            component: component.to_owned(),
            stage,
            source: Box::new(e.into()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn breadcrumbs_are_outermost_first() {
        let inner: Result<()> = Err(LookupError::HostCellNotFound(99_999).into());
        let err = inner
            .in_stage("pipe", "insertObjects")
            .in_stage("bunker", "createAll")
            .unwrap_err();
        assert_eq!(
            err.breadcrumbs(),
            vec![("bunker", "createAll"), ("pipe", "insertObjects")]
        );
        assert!(matches!(
            err.root_cause(),
            BeamgeomError::Lookup(LookupError::HostCellNotFound(99_999))
        ));
    }

    #[test]
    fn message_names_component_and_stage() {
        let err = Err::<(), _>(RuleError::UnresolvedSurface { offset: 7, base: 10_100 })
            .in_stage("pipeA", "createObjects")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "component 'pipeA' failed in createObjects: unresolved surface offset 7 against base 10100"
        );
    }
}
