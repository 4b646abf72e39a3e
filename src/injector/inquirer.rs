//! Who is asking for a dependency.

use crate::{Injector, InjectorKind, Token};

/// The requester of a resolution: the binding whose dependency list is being
/// resolved, and the injector that owns it.
///
/// `token` is `None` for top-level requests made directly through an injector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inquirer {
    token: Option<Token>,
    injector: &'static str,
    kind: InjectorKind,
}

impl Inquirer {
    pub(crate) fn root(injector: &Injector) -> Self {
        Self {
            token: None,
            injector: injector.label(),
            kind: injector.kind(),
        }
    }

    pub(crate) fn binding(token: Token, injector: &Injector) -> Self {
        Self {
            token: Some(token),
            injector: injector.label(),
            kind: injector.kind(),
        }
    }

    /// The binding asking, if any.
    pub fn token(&self) -> Option<Token> {
        self.token
    }

    /// Label of the injector that owns the asking binding.
    pub fn injector_label(&self) -> &'static str {
        self.injector
    }

    pub fn injector_kind(&self) -> InjectorKind {
        self.kind
    }

    pub(crate) fn token_name(&self) -> Option<&'static str> {
        self.token.map(|t| t.display_name())
    }
}
