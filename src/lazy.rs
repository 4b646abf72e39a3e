//! Deferred resolution handles.
//!
//! A dependency declared with [`InjectFlags::LAZY`](crate::InjectFlags::LAZY) is
//! not resolved while its dependent is being built. The dependent receives a
//! handle instead and resolves it on first access, which is what lets two
//! bindings refer to each other without forming an eager cycle.

use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::trace;

use crate::injector::{Inquirer, ResolveCtx, WeakInjector};
use crate::internal::current_graph;
use crate::{Dependency, DiError, DiResult, InjectFlags, Injector, InjectorKind, Resolved, Token};

/// Untyped lazy handle stored in [`Resolved::Lazy`].
#[derive(Clone)]
pub struct LazyRef {
    inner: Arc<LazyInner>,
}

struct LazyInner {
    owner: WeakInjector,
    // Keeps standing injectors alive; context injectors are only referenced
    // weakly so a cached instance holding the handle cannot pin its context.
    _keep_alive: Option<Injector>,
    dependency: Dependency,
    context: Option<WeakInjector>,
    cell: OnceCell<Resolved>,
}

impl LazyRef {
    pub(crate) fn new(injector: Injector, dependency: Dependency, context: Option<&Injector>) -> Self {
        Self {
            inner: Arc::new(LazyInner {
                owner: injector.downgrade(),
                _keep_alive: (injector.kind() != InjectorKind::Context).then_some(injector),
                dependency: Dependency {
                    token: dependency.token,
                    flags: dependency.flags.without(InjectFlags::LAZY),
                },
                context: context.map(Injector::downgrade),
                cell: OnceCell::new(),
            }),
        }
    }

    pub fn token(&self) -> Token {
        self.inner.dependency.token
    }

    /// Resolves on first call; later calls return the cached value.
    ///
    /// Called from inside a running factory or hook, the resolution extends
    /// that binding's dependency chain, so closing a cycle fails with
    /// [`DiError::Circular`] instead of waiting on itself.
    pub async fn resolve(&self) -> DiResult<&Resolved> {
        self.inner
            .cell
            .get_or_try_init(|| async {
                let inner = &self.inner;
                let owner = inner
                    .owner
                    .upgrade()
                    .ok_or(DiError::InvalidScope(inner.dependency.token.display_name()))?;
                // An ended context only matters to targets that need one; those
                // fail with `InvalidScope` when the key is computed.
                let context = inner.context.as_ref().and_then(WeakInjector::upgrade);
                trace!(
                    token = %inner.dependency.token,
                    in_context = context.is_some(),
                    "Resolving lazy dependency"
                );
                let ctx = ResolveCtx {
                    context,
                    graph: current_graph().unwrap_or_default(),
                    inquirer: Inquirer::root(&owner),
                };
                owner.resolve_dependency(inner.dependency, ctx).await
            })
            .await
    }

    /// The cached value, without resolving.
    pub fn try_resolved(&self) -> Option<&Resolved> {
        self.inner.cell.get()
    }
}

/// Typed view over a [`LazyRef`].
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::{Dependency, Injector, Lazy, Provider, Resolver, Token};
///
/// struct Clock;
/// struct Scheduler { clock: Lazy<Clock> }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ferrous_injector::DiResult<()> {
/// let injector = Injector::create(
///     vec![
///         Provider::value(Token::of::<Clock>(), Clock),
///         Provider::factory(Token::of::<Scheduler>(), |deps| async move {
///             Ok(Scheduler { clock: deps.lazy::<Clock>(0)? })
///         })
///         .deps([Dependency::of::<Clock>().lazy()]),
///     ],
///     None,
///     None,
/// )?;
///
/// let scheduler = injector.get_type::<Scheduler>().await?;
/// assert!(scheduler.clock.try_get().is_none());
/// scheduler.clock.get().await?;
/// assert!(scheduler.clock.try_get().is_some());
/// # Ok(())
/// # }
/// ```
pub struct Lazy<T: ?Sized> {
    handle: LazyRef,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Lazy<T> {
    pub(crate) fn new(handle: LazyRef) -> Self {
        Self {
            handle,
            _marker: PhantomData,
        }
    }

    pub fn token(&self) -> Token {
        self.handle.token()
    }

    pub fn is_resolved(&self) -> bool {
        self.handle.try_resolved().is_some()
    }

    pub fn handle(&self) -> &LazyRef {
        &self.handle
    }
}

impl<T: Send + Sync + 'static> Lazy<T> {
    pub async fn get(&self) -> DiResult<Arc<T>> {
        match self.handle.resolve().await? {
            Resolved::Missing => Err(DiError::NoProvider {
                token: self.token().display_name(),
                required_by: None,
            }),
            resolved => resolved.one(),
        }
    }

    /// `None` when the dependency was optional and had no provider.
    pub async fn get_optional(&self) -> DiResult<Option<Arc<T>>> {
        match self.handle.resolve().await? {
            Resolved::Missing => Ok(None),
            resolved => resolved.one().map(Some),
        }
    }

    /// The value if it has already been resolved.
    pub fn try_get(&self) -> Option<Arc<T>> {
        self.handle.try_resolved().and_then(|r| r.one().ok())
    }
}

impl<T: ?Sized> std::fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lazy")
            .field("token", &self.token())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
