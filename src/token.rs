//! Injection tokens used to look up bindings.

use std::any::TypeId;
use std::fmt;

/// Identity used to look up a value in an [`Injector`](crate::Injector).
///
/// A token is either a Rust type, identified by its `TypeId`, or an explicit
/// injection key. Explicit keys can be declared as constants, which is how
/// values without a dedicated type (configuration strings, plugin lists,
/// trait objects) are usually addressed.
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::Token;
///
/// struct Database;
/// const DATABASE_URL: Token = Token::named("DATABASE_URL");
///
/// let by_type = Token::of::<Database>();
/// assert!(by_type.display_name().ends_with("Database"));
/// assert_eq!(DATABASE_URL.display_name(), "DATABASE_URL");
/// assert_ne!(by_type, DATABASE_URL);
/// ```
#[derive(Debug, Clone, Copy)]
pub enum Token {
    /// Concrete type token with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// Explicit injection key
    Named(&'static str),
}

impl Token {
    /// Token for the Rust type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Token::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Token for an explicit injection key.
    pub const fn named(name: &'static str) -> Self {
        Token::Named(name)
    }

    /// Human-readable name for errors and logs.
    pub fn display_name(&self) -> &'static str {
        match self {
            Token::Type(_, name) => name,
            Token::Named(name) => name,
        }
    }

    /// True for explicit injection keys.
    pub fn is_named(&self) -> bool {
        matches!(self, Token::Named(_))
    }
}

// Type tokens compare by TypeId only; the name is diagnostic.
impl PartialEq for Token {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::Type(a, _), Token::Type(b, _)) => a == b,
            (Token::Named(a), Token::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Token {}

impl std::hash::Hash for Token {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Token::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Token::Named(name) => {
                1u8.hash(state);
                name.hash(state);
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
