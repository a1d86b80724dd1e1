//! Evaluation errors.
//!
//! Errors carry enough plain data (the path, the failing part index, the
//! low-level cause) to be matched on programmatically; the rendered trace
//! is attached separately as a snapshot so the error stays cheap to clone
//! and compare.

use std::fmt;

use thiserror::Error;

use crate::path::Path;
use crate::trace::TraceSnapshot;

/// A path access failed partway through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not access {segment}, part {part} of {path}, got error: {cause:?}")]
pub struct PathAccessError {
    /// Rendered summary of the failing operation.
    pub segment: String,
    /// Zero-based index of the failing operation within `path`.
    pub part: usize,
    /// The full path being replayed.
    pub path: Path,
    /// The low-level cause reported by the handler or access helper.
    pub cause: String,
}

impl PathAccessError {
    pub fn new(path: Path, part: usize, cause: impl Into<String>) -> Self {
        let segment = path.part(part).unwrap_or_else(|| "?".to_owned());
        PathAccessError { segment, part, path, cause: cause.into() }
    }
}

/// A path assignment failed at its final operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not assign {name} on object at {path}, got error: {cause:?}")]
pub struct PathAssignError {
    /// Rendered summary of the assignment destination.
    pub name: String,
    /// The path leading to the assignment destination.
    pub path: Path,
    /// The low-level cause.
    pub cause: String,
}

/// No handler was registered for a target type and operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "target type '{type_name}' not registered for operation '{op}', \
     expected one of: {expected}"
)]
pub struct UnregisteredTarget {
    /// The operation that was requested.
    pub op: String,
    /// The target value's type name.
    pub type_name: String,
    /// Comma-joined names of the types that do support the operation.
    pub expected: String,
    /// Where in the spec the dispatch happened.
    pub path: Path,
}

/// The closed set of evaluation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GleanErrorKind {
    #[error(transparent)]
    Access(#[from] PathAccessError),
    #[error(transparent)]
    Assign(#[from] PathAssignError),
    #[error("malformed specification: {0}")]
    Malformed(String),
    #[error(transparent)]
    Unregistered(#[from] UnregisteredTarget),
    /// A handler or callable reported an error of its own.
    #[error("error from {origin}: {message}")]
    Wrapped { origin: String, message: String },
}

impl GleanErrorKind {
    /// Short label used in the rendered trace footer.
    pub fn label(&self) -> &'static str {
        match self {
            GleanErrorKind::Access(_) => "PathAccessError",
            GleanErrorKind::Assign(_) => "PathAssignError",
            GleanErrorKind::Malformed(_) => "MalformedSpec",
            GleanErrorKind::Unregistered(_) => "UnregisteredTarget",
            GleanErrorKind::Wrapped { .. } => "WrappedError",
        }
    }
}

/// An evaluation failure, optionally annotated with the branch-aware
/// trace captured at the top level.
#[derive(Debug, Clone, PartialEq)]
pub struct GleanError {
    kind: GleanErrorKind,
    trace: Option<Box<TraceSnapshot>>,
}

impl GleanError {
    pub fn new(kind: GleanErrorKind) -> Self {
        GleanError { kind, trace: None }
    }

    pub fn access(path: Path, part: usize, cause: impl Into<String>) -> Self {
        GleanError::new(PathAccessError::new(path, part, cause).into())
    }

    pub fn assign(name: impl Into<String>, path: Path, cause: impl Into<String>) -> Self {
        GleanError::new(
            PathAssignError { name: name.into(), path, cause: cause.into() }.into(),
        )
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        GleanError::new(GleanErrorKind::Malformed(message.into()))
    }

    pub fn unregistered(
        op: impl Into<String>,
        type_name: impl Into<String>,
        expected: String,
        path: Path,
    ) -> Self {
        GleanError::new(
            UnregisteredTarget {
                op: op.into(),
                type_name: type_name.into(),
                expected,
                path,
            }
            .into(),
        )
    }

    pub fn wrapped(origin: impl Into<String>, message: impl Into<String>) -> Self {
        GleanError::new(GleanErrorKind::Wrapped {
            origin: origin.into(),
            message: message.into(),
        })
    }

    pub fn kind(&self) -> &GleanErrorKind {
        &self.kind
    }

    /// Attach the rendered trace captured at the evaluation root.
    pub fn with_trace(mut self, trace: TraceSnapshot) -> Self {
        self.trace = Some(Box::new(trace));
        self
    }

    pub fn trace(&self) -> Option<&TraceSnapshot> {
        self.trace.as_deref()
    }
}

impl From<GleanErrorKind> for GleanError {
    fn from(kind: GleanErrorKind) -> Self {
        GleanError::new(kind)
    }
}

impl fmt::Display for GleanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.trace {
            Some(trace) => {
                write!(f, "{trace}")?;
                write!(f, "glean.{}: {}", self.kind.label(), self.kind)
            }
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for GleanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glean_value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn access_error_names_part_and_cause() {
        let path = Path::new(vec![Value::string("a"), Value::string("b")]);
        let err = GleanError::access(path, 1, "key not found: 'b'");
        assert_eq!(
            err.to_string(),
            "could not access 'b', part 1 of Path('a', 'b'), \
             got error: \"key not found: 'b'\""
        );
    }

    #[test]
    fn unregistered_error_lists_expected_types() {
        let err = GleanError::unregistered(
            "iterate",
            "int",
            "list, map, set, str, tuple".to_owned(),
            Path::new(vec![]),
        );
        assert_eq!(
            err.to_string(),
            "target type 'int' not registered for operation 'iterate', \
             expected one of: list, map, set, str, tuple"
        );
    }
}
