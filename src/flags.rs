//! Per-dependency traversal modifiers.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::Token;

/// Traversal modifiers attached at the call site of a dependency.
///
/// Flags combine with `|`:
///
/// ```rust
/// use ferrous_injector::InjectFlags;
///
/// let flags = InjectFlags::SELF | InjectFlags::OPTIONAL;
/// assert!(flags.contains(InjectFlags::SELF));
/// assert!(flags.is_optional());
/// assert!(!flags.is_lazy());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InjectFlags(u8);

impl InjectFlags {
    /// Default lookup: local injector, then ancestors
    pub const NONE: InjectFlags = InjectFlags(0);
    /// Missing dependency resolves to `None` instead of an error
    pub const OPTIONAL: InjectFlags = InjectFlags(1 << 0);
    /// Only consult the local injector
    pub const SELF: InjectFlags = InjectFlags(1 << 1);
    /// Start the lookup at the parent injector
    pub const SKIP_SELF: InjectFlags = InjectFlags(1 << 2);
    /// Restart the lookup at the nearest enclosing module injector
    pub const HOST: InjectFlags = InjectFlags(1 << 3);
    /// Defer resolution behind a [`Lazy`](crate::Lazy) handle
    pub const LAZY: InjectFlags = InjectFlags(1 << 4);

    pub const fn empty() -> Self {
        Self::NONE
    }

    pub const fn contains(self, other: InjectFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: InjectFlags) -> Self {
        InjectFlags(self.0 | other.0)
    }

    pub const fn without(self, other: InjectFlags) -> Self {
        InjectFlags(self.0 & !other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn is_optional(self) -> bool {
        self.contains(Self::OPTIONAL)
    }

    pub const fn is_lazy(self) -> bool {
        self.contains(Self::LAZY)
    }
}

impl BitOr for InjectFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for InjectFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl fmt::Debug for InjectFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(InjectFlags, &str); 5] = [
            (InjectFlags::OPTIONAL, "OPTIONAL"),
            (InjectFlags::SELF, "SELF"),
            (InjectFlags::SKIP_SELF, "SKIP_SELF"),
            (InjectFlags::HOST, "HOST"),
            (InjectFlags::LAZY, "LAZY"),
        ];
        if self.is_empty() {
            return f.write_str("InjectFlags(NONE)");
        }
        let set: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "InjectFlags({})", set.join(" | "))
    }
}

/// One entry of a binding's ordered dependency list.
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::{Dependency, InjectFlags, Token};
///
/// struct Cache;
///
/// let dep = Dependency::of::<Cache>().optional().skip_self();
/// assert_eq!(dep.token, Token::of::<Cache>());
/// assert!(dep.flags.contains(InjectFlags::OPTIONAL | InjectFlags::SKIP_SELF));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub token: Token,
    pub flags: InjectFlags,
}

impl Dependency {
    pub fn new(token: Token) -> Self {
        Self {
            token,
            flags: InjectFlags::NONE,
        }
    }

    /// Dependency on the Rust type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(Token::of::<T>())
    }

    pub fn with_flags(mut self, flags: InjectFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn optional(self) -> Self {
        self.with_flags(InjectFlags::OPTIONAL)
    }

    pub fn self_only(self) -> Self {
        self.with_flags(InjectFlags::SELF)
    }

    pub fn skip_self(self) -> Self {
        self.with_flags(InjectFlags::SKIP_SELF)
    }

    pub fn host(self) -> Self {
        self.with_flags(InjectFlags::HOST)
    }

    pub fn lazy(self) -> Self {
        self.with_flags(InjectFlags::LAZY)
    }
}

impl From<Token> for Dependency {
    fn from(token: Token) -> Self {
        Dependency::new(token)
    }
}
