//! Handler factory errors.

use axum::BoxError;
use thiserror::Error;

/// The route table could not be turned into handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("route #{index} has no name")]
    MissingName { index: usize },

    #[error("route '{0}' is declared more than once")]
    DuplicateRoute(String),

    #[error("route '{route}' has invalid path '{path}'")]
    InvalidPath { route: String, path: String },

    #[error("route '{route}' path conflicts with route '{other}'")]
    ConflictingPath { route: String, other: String },
}

/// An invocation failed. The wrapped error is the collaborator's own,
/// displayed verbatim; the variant only records which phase produced it.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("{0}")]
    BeforeStart(BoxError),

    #[error("{0}")]
    Initialize(BoxError),

    #[error("{0}")]
    Register(BoxError),

    #[error("{0}")]
    Dispatch(BoxError),
}

impl InvocationError {
    /// Name of the failing phase, for logs and metrics.
    pub fn phase(&self) -> &'static str {
        match self {
            Self::BeforeStart(_) => "before_start",
            Self::Initialize(_) => "initialize",
            Self::Register(_) => "register",
            Self::Dispatch(_) => "dispatch",
        }
    }

    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match self {
            Self::BeforeStart(e) | Self::Initialize(e) | Self::Register(e) | Self::Dispatch(e) => {
                e.as_ref()
            }
        }
    }

    /// The original error, unchanged.
    pub fn into_inner(self) -> BoxError {
        match self {
            Self::BeforeStart(e) | Self::Initialize(e) | Self::Register(e) | Self::Dispatch(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("table locked")]
    struct Locked;

    #[test]
    fn test_display_is_verbatim() {
        let err = InvocationError::Register(Box::new(Locked));
        assert_eq!(err.to_string(), "table locked");
        assert_eq!(err.phase(), "register");
    }

    #[test]
    fn test_into_inner_preserves_type() {
        let err = InvocationError::Dispatch(Box::new(Locked));
        assert!(err.inner().is::<Locked>());
        assert!(err.into_inner().downcast::<Locked>().is_ok());
    }
}
