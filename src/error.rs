//! Error types for the dependency injection container.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error raised by user factories and lifecycle hooks.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Dependency injection errors
///
/// Represents the failures that can occur while binding providers, resolving
/// tokens, or wiring modules together.
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::DiError;
///
/// let not_found = DiError::NoProvider { token: "Database", required_by: Some("UserService") };
/// let circular = DiError::Circular(vec!["A", "B", "A"]);
///
/// assert_eq!(circular.to_string(), "Circular dependency: A -> B -> A");
/// assert_eq!(not_found.to_string(), "No provider for Database (required by UserService)");
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Token has no binding anywhere in the injector chain
    #[error("No provider for {token}{}", required_by_suffix(.required_by))]
    NoProvider {
        token: &'static str,
        required_by: Option<&'static str>,
    },
    /// Circular dependency detected (includes the full chain)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Non-multi token bound twice outside of root auto-registration
    #[error("Duplicate provider for token {0}")]
    DuplicateProvider(&'static str),
    /// Token registered both as a multi provider and as a single provider
    #[error("Token {0} mixes multi and single providers")]
    MixedMultiProvider(&'static str),
    /// Event lifetime binding resolved without an active context injector
    #[error("{0} has an event lifetime and can only be resolved inside a context injector")]
    InvalidScope(&'static str),
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Dependency list accessed past its end
    #[error("Dependency index {index} out of range (len {len})")]
    DependencyOutOfRange { index: usize, len: usize },
    /// Maximum resolution depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// A factory or hook returned an error
    #[error("Factory for {token} failed: {source}")]
    Factory {
        token: &'static str,
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },
    /// Scope names a module that has not been registered
    #[error("Unknown module: {0}")]
    UnknownModule(&'static str),
    /// Module exports a token it neither provides nor imports
    #[error("Module {module} exports {token} which it does not provide")]
    UnknownExport {
        module: &'static str,
        token: &'static str,
    },
    /// Modules import each other in a cycle
    #[error("Circular module import: {}", .0.join(" -> "))]
    CircularImport(Vec<&'static str>),
    /// A configuration value is malformed or out of range
    #[error("Configuration error: {0}")]
    Config(String),
}

fn required_by_suffix(required_by: &Option<&'static str>) -> String {
    match required_by {
        Some(name) => format!(" (required by {})", name),
        None => String::new(),
    }
}

impl DiError {
    /// Wraps an arbitrary error raised while producing `token`.
    pub fn factory(token: &'static str, source: impl Into<BoxError>) -> Self {
        DiError::Factory {
            token,
            source: Arc::from(source.into()),
        }
    }
}

/// Result type for DI operations
///
/// A convenience alias for `Result<T, DiError>` used throughout the crate.
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::{DiResult, DiError};
///
/// fn failing_operation() -> DiResult<()> {
///     Err(DiError::DuplicateProvider("Config"))
/// }
///
/// assert!(failing_operation().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
