//! Declarative provider descriptors consumed by [`Injector::create`](crate::Injector::create).

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::binding::{downcast_instance, Instance};
use crate::injector::Inquirer;
use crate::traits::Injectable;
use crate::{Dependencies, Dependency, DiResult, Injector, Lifetime, ProviderScope, Token};

pub(crate) type FactoryFn =
    Arc<dyn Fn(Dependencies) -> BoxFuture<'static, DiResult<Instance>> + Send + Sync>;
pub(crate) type BeforeHook = Arc<
    dyn Fn(Injector, Dependencies, Inquirer) -> BoxFuture<'static, DiResult<Dependencies>>
        + Send
        + Sync,
>;
pub(crate) type AfterHook =
    Arc<dyn Fn(Instance, Injector) -> BoxFuture<'static, DiResult<()>> + Send + Sync>;

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a provider declaration; clones share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ProviderId(u64);

impl ProviderId {
    fn next() -> Self {
        ProviderId(NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone)]
pub(crate) enum ProviderKind {
    Value(Instance),
    Class(FactoryFn),
    Factory(FactoryFn),
    Alias(Token),
    /// Re-export of `token` from another module's injector.
    Forward(Injector),
}

impl ProviderKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            ProviderKind::Value(_) => "value",
            ProviderKind::Class(_) => "class",
            ProviderKind::Factory(_) => "factory",
            ProviderKind::Alias(_) => "alias",
            ProviderKind::Forward(_) => "forward",
        }
    }
}

/// How to produce a value for one token.
///
/// A provider is one of four kinds:
///
/// - **value**: an already-built instance
/// - **class**: a type implementing [`Injectable`]
/// - **factory**: an async closure over the resolved [`Dependencies`]
/// - **alias**: re-resolves another token through the owning injector
///
/// Lifetime and scope left unset fall back to the injector's
/// [`InjectableRegistry`](crate::InjectableRegistry), then to Singleton / Root.
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::{Injector, Provider, Resolver, Token, Lifetime};
///
/// struct Config { url: String }
/// struct Database { url: String }
///
/// const PRIMARY: Token = Token::named("PRIMARY_DB");
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ferrous_injector::DiResult<()> {
/// let injector = Injector::create(
///     vec![
///         Provider::value(Token::of::<Config>(), Config { url: "postgres://localhost".into() }),
///         Provider::factory(Token::of::<Database>(), |deps| async move {
///             let config = deps.get::<Config>(0)?;
///             Ok(Database { url: config.url.clone() })
///         })
///         .deps([Token::of::<Config>()])
///         .lifetime(Lifetime::Singleton),
///         Provider::alias(PRIMARY, Token::of::<Database>()),
///     ],
///     None,
///     None,
/// )?;
///
/// let db = injector.get::<Database>(PRIMARY).await?;
/// assert_eq!(db.url, "postgres://localhost");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Provider {
    pub(crate) id: ProviderId,
    pub(crate) token: Token,
    pub(crate) kind: ProviderKind,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) multi: bool,
    pub(crate) lifetime: Option<Lifetime>,
    pub(crate) scope: Option<ProviderScope>,
    pub(crate) before: Option<BeforeHook>,
    pub(crate) after: Option<AfterHook>,
}

impl Provider {
    fn with_kind(token: Token, kind: ProviderKind) -> Self {
        Self {
            id: ProviderId::next(),
            token,
            kind,
            dependencies: Vec::new(),
            multi: false,
            lifetime: None,
            scope: None,
            before: None,
            after: None,
        }
    }

    /// Provides an already-built value.
    pub fn value<T: Send + Sync + 'static>(token: Token, value: T) -> Self {
        Self::with_kind(token, ProviderKind::Value(Arc::new(value)))
    }

    /// Provides a shared trait object, resolvable with
    /// [`Resolver::get_trait`](crate::Resolver::get_trait).
    pub fn value_trait<T: ?Sized + Send + Sync + 'static>(token: Token, value: Arc<T>) -> Self {
        Self::with_kind(token, ProviderKind::Value(Arc::new(value)))
    }

    /// Provides `T` under its own type token, built by [`Injectable::construct`].
    pub fn class<T: Injectable>() -> Self {
        Self::use_class::<T>(Token::of::<T>())
    }

    /// Provides `T` under an arbitrary token.
    pub fn use_class<T: Injectable>(token: Token) -> Self {
        let factory: FactoryFn = Arc::new(|deps: Dependencies| {
            async move { T::construct(deps).await.map(|v| Arc::new(v) as Instance) }.boxed()
        });
        let before: BeforeHook = Arc::new(|injector, deps, inquirer| {
            async move { T::before_resolution(injector, deps, inquirer).await }.boxed()
        });
        let after: AfterHook = Arc::new(|instance: Instance, injector: Injector| {
            async move {
                let typed = downcast_instance::<T>(instance)?;
                typed.after_resolution(&injector).await
            }
            .boxed()
        });

        let mut provider = Self::with_kind(token, ProviderKind::Class(factory));
        provider.dependencies = T::dependencies();
        provider.before = Some(before);
        provider.after = Some(after);
        provider
    }

    /// Provides the value produced by an async factory over the declared dependencies.
    pub fn factory<T, F, Fut>(token: Token, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Dependencies) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        let factory: FactoryFn = Arc::new(move |deps: Dependencies| {
            let fut = factory(deps);
            async move { fut.await.map(|v| Arc::new(v) as Instance) }.boxed()
        });
        Self::with_kind(token, ProviderKind::Factory(factory))
    }

    /// Provides a trait object produced by an async factory.
    pub fn factory_trait<T, F, Fut>(token: Token, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Dependencies) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<Arc<T>>> + Send + 'static,
    {
        Self::factory::<Arc<T>, _, _>(token, factory)
    }

    /// Makes `token` resolve to whatever `target` resolves to.
    ///
    /// Aliases are Transient unless declared otherwise, so the target's own
    /// lifetime governs sharing.
    pub fn alias(token: Token, target: Token) -> Self {
        let mut provider = Self::with_kind(token, ProviderKind::Alias(target));
        provider.lifetime = Some(Lifetime::Transient);
        provider
    }

    pub(crate) fn forward(token: Token, exporter: Injector) -> Self {
        let mut provider = Self::with_kind(token, ProviderKind::Forward(exporter));
        provider.lifetime = Some(Lifetime::Transient);
        provider.scope = Some(ProviderScope::Module);
        provider
    }

    /// Sets the ordered dependency list.
    pub fn deps<I, D>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Dependency>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Appends one dependency.
    pub fn dep(mut self, dep: impl Into<Dependency>) -> Self {
        self.dependencies.push(dep.into());
        self
    }

    /// Marks the token as a multi provider.
    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    pub fn scope(mut self, scope: ProviderScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Runs before the factory with the resolved dependencies; may substitute them.
    pub fn before_resolution<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Injector, Dependencies, Inquirer) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<Dependencies>> + Send + 'static,
    {
        self.before = Some(Arc::new(move |injector, deps, inquirer| {
            hook(injector, deps, inquirer).boxed()
        }));
        self
    }

    /// Runs once the instance exists, with the injector that produced it.
    pub fn after_resolution<T, F, Fut>(mut self, hook: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, Injector) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<()>> + Send + 'static,
    {
        let hook = Arc::new(hook);
        self.after = Some(Arc::new(move |instance: Instance, injector: Injector| {
            let hook = hook.clone();
            async move {
                let typed = downcast_instance::<T>(instance)?;
                hook(typed, injector).await
            }
            .boxed()
        }));
        self
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn declared_lifetime(&self) -> Option<Lifetime> {
        self.lifetime
    }

    pub fn declared_scope(&self) -> Option<ProviderScope> {
        self.scope
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("token", &self.token)
            .field("kind", &self.kind.name())
            .field("dependencies", &self.dependencies)
            .field("multi", &self.multi)
            .field("lifetime", &self.lifetime)
            .field("scope", &self.scope)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity() {
        let a = Provider::value(Token::named("A"), 1u8);
        let b = a.clone();
        let c = Provider::value(Token::named("A"), 1u8);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn alias_defaults_to_transient() {
        let p = Provider::alias(Token::named("B"), Token::named("A"));
        assert_eq!(p.declared_lifetime(), Some(Lifetime::Transient));
        assert_eq!(p.declared_scope(), None);
    }

    #[test]
    fn builder_records_metadata() {
        let p = Provider::value(Token::named("P"), ())
            .deps([Token::named("X")])
            .dep(Dependency::new(Token::named("Y")).optional())
            .multi()
            .scope(ProviderScope::Module);
        assert!(p.is_multi());
        assert_eq!(p.dependencies().len(), 2);
        assert!(p.dependencies()[1].flags.is_optional());
        assert_eq!(p.declared_scope(), Some(ProviderScope::Module));
    }
}
