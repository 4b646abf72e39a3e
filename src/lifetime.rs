//! Binding lifetimes, provider scopes and the out-of-band options registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::Token;

/// Lifetimes controlling instance caching behavior
///
/// # Lifetime Characteristics
///
/// - **Singleton**: one instance per injector hierarchy root
/// - **Scoped**: one instance per owning injector, or per context when resolved
///   through a [`ContextInjector`](crate::ContextInjector)
/// - **Transient**: never cached
/// - **Event**: one instance per context; resolving it without a context is an error
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::Lifetime;
///
/// assert_eq!(Lifetime::default(), Lifetime::Singleton);
/// assert!(Lifetime::Transient.is_transient());
/// assert!(Lifetime::Event.requires_context());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// Single instance per root injector, cached forever
    #[default]
    Singleton,
    /// New instance per resolution, never cached
    Transient,
    /// Single instance per owning injector, or per context when one is active
    Scoped,
    /// Single instance per context injector
    ///
    /// Models "one instance per external invocation". Resolving an event
    /// binding from a root or module injector directly fails with
    /// [`DiError::InvalidScope`](crate::DiError::InvalidScope).
    Event,
}

impl Lifetime {
    pub fn is_transient(&self) -> bool {
        matches!(self, Lifetime::Transient)
    }

    pub fn requires_context(&self) -> bool {
        matches!(self, Lifetime::Event)
    }
}

/// Where a provider is bound.
///
/// Scope decides which standing injector receives the binding when a module or
/// component definition is registered. See
/// [`ModuleContainer::register`](crate::ModuleContainer::register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProviderScope {
    /// Bound into the root injector and visible application-wide
    #[default]
    Root,
    /// Bound into the declaring module's injector
    Module,
    /// Bound into the declaring component's injector
    Component,
    /// Never bound into a standing injector; handed to each context injector
    Context,
    /// Bound into the module whose metatype is the given token
    Explicit(Token),
}

/// Capability record attached to a token: its declared lifetime and scope.
///
/// Either field may be left unset, in which case the global default applies
/// (Singleton / Root).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InjectableOptions {
    pub lifetime: Option<Lifetime>,
    pub scope: Option<ProviderScope>,
}

impl InjectableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    pub fn scope(mut self, scope: ProviderScope) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Frozen mapping from token to its declared [`InjectableOptions`].
///
/// Populated once by the registration pass and shared by every injector of a
/// hierarchy. It is never mutated after it has been built.
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::{InjectableRegistry, InjectableOptions, Lifetime, ProviderScope, Token};
///
/// struct RequestLog;
///
/// let registry = InjectableRegistry::builder()
///     .register(
///         Token::of::<RequestLog>(),
///         InjectableOptions::new().lifetime(Lifetime::Event).scope(ProviderScope::Context),
///     )
///     .build();
///
/// let opts = registry.options(&Token::of::<RequestLog>());
/// assert_eq!(opts.lifetime, Some(Lifetime::Event));
/// assert!(registry.options(&Token::named("missing")).lifetime.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InjectableRegistry {
    entries: Arc<HashMap<Token, InjectableOptions>>,
}

impl InjectableRegistry {
    /// An empty registry; every token gets the global default.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> InjectableRegistryBuilder {
        InjectableRegistryBuilder::default()
    }

    /// Declared options for `token`, or empty options when none were declared.
    pub fn options(&self, token: &Token) -> InjectableOptions {
        self.entries.get(token).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for [`InjectableRegistry`].
#[derive(Debug, Default)]
pub struct InjectableRegistryBuilder {
    entries: HashMap<Token, InjectableOptions>,
}

impl InjectableRegistryBuilder {
    /// Declares options for `token`. A later declaration for the same token wins.
    pub fn register(mut self, token: Token, options: InjectableOptions) -> Self {
        self.entries.insert(token, options);
        self
    }

    pub fn build(self) -> InjectableRegistry {
        InjectableRegistry {
            entries: Arc::new(self.entries),
        }
    }
}
