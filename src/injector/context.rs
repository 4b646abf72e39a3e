//! Per-event injectors.

use std::ops::Deref;

use tracing::debug;

use super::{GetOptions, Injector, InjectorKind};
use crate::traits::ResolverCore;
use crate::{DiResult, Provider, Resolved, Token};

/// Short-lived injector created for one external event.
///
/// Event lifetime bindings may only be resolved through a context, and Scoped
/// bindings resolved through one get an instance per context. Dropping the
/// last handle evicts every cache entry keyed by this context.
///
/// Contexts are usually created by
/// [`ModuleRef::create_context`](crate::ModuleRef::create_context) or
/// [`ComponentRef::create_context`](crate::ComponentRef::create_context).
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::{ContextInjector, Injector, Lifetime, Provider, Resolver, Token};
///
/// struct RequestId(u64);
/// const REQUEST: Token = Token::named("REQUEST");
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ferrous_injector::DiResult<()> {
/// let root = Injector::create(vec![], None, None)?;
/// let context = ContextInjector::create(&root, vec![Provider::value(REQUEST, RequestId(7))])?;
///
/// let id = context.get::<RequestId>(REQUEST).await?;
/// assert_eq!(id.0, 7);
/// assert!(root.get_optional::<RequestId>(REQUEST).await?.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ContextInjector {
    injector: Injector,
}

impl ContextInjector {
    /// Creates a context under `parent`, binding `providers` into it.
    pub fn create(parent: &Injector, providers: Vec<Provider>) -> DiResult<Self> {
        let injector = parent.child(InjectorKind::Context, None);
        injector.bind_all(providers)?;
        debug!(
            context = injector.id(),
            parent = parent.label(),
            bindings = injector.tokens().len(),
            "Created context injector"
        );
        Ok(Self { injector })
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }
}

impl Deref for ContextInjector {
    type Target = Injector;

    fn deref(&self) -> &Injector {
        &self.injector
    }
}

impl std::fmt::Debug for ContextInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ContextInjector").field(&self.injector).finish()
    }
}

#[async_trait::async_trait]
impl ResolverCore for ContextInjector {
    async fn resolve(&self, token: Token, options: GetOptions) -> DiResult<Resolved> {
        self.injector.get_any(token, options).await
    }
}
