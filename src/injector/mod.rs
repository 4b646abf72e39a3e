//! Injector module for dependency injection.
//!
//! This module contains the [`Injector`] type, the recursive async resolution
//! engine shared by root, module, component and context injectors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::binding::{Binding, BindingKind, CacheKey, Instance, InjectorId, Record};
use crate::internal::{current_graph, with_graph, DependencyGraph};
use crate::traits::ResolverCore;
use crate::{
    Dependencies, Dependency, DiError, DiResult, InjectFlags, InjectableRegistry, InjectorConfig,
    Lifetime, LazyRef, Provider, ProviderScope, Resolved, Token,
};

mod context;
mod inquirer;

pub use context::ContextInjector;
pub use inquirer::Inquirer;

static NEXT_INJECTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Role of an injector in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectorKind {
    Root,
    Module,
    Component,
    Context,
}

/// Registry and settings shared by every injector created from one root.
#[derive(Debug, Default)]
pub(crate) struct InjectorShared {
    pub(crate) registry: InjectableRegistry,
    pub(crate) config: InjectorConfig,
}

/// Options for [`Injector::get_any`].
///
/// ```rust
/// use ferrous_injector::{GetOptions, InjectFlags};
///
/// let opts = GetOptions::new().flags(InjectFlags::SKIP_SELF).not_found(0u32);
/// assert!(opts.flags.contains(InjectFlags::SKIP_SELF));
/// ```
#[derive(Clone, Default)]
pub struct GetOptions {
    pub flags: InjectFlags,
    /// Returned instead of failing when no provider exists
    pub not_found: Option<Instance>,
    /// Context the resolution runs in
    pub context: Option<Injector>,
}

impl GetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(mut self, flags: InjectFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn not_found<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.not_found = Some(Arc::new(value));
        self
    }

    pub fn not_found_instance(mut self, value: Instance) -> Self {
        self.not_found = Some(value);
        self
    }

    pub fn context(mut self, context: &ContextInjector) -> Self {
        self.context = Some(context.injector().clone());
        self
    }
}

impl std::fmt::Debug for GetOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetOptions")
            .field("flags", &self.flags)
            .field("not_found", &self.not_found.is_some())
            .field("context", &self.context.as_ref().map(|c| c.id()))
            .finish()
    }
}

/// State of one resolution frame.
#[derive(Clone)]
pub(crate) struct ResolveCtx {
    pub(crate) context: Option<Injector>,
    pub(crate) graph: DependencyGraph,
    pub(crate) inquirer: Inquirer,
}

/// Hierarchical dependency injector.
///
/// Each injector owns the bindings created from its provider list and
/// delegates unknown tokens to its parent. Cloning is cheap; clones share the
/// same bindings and caches.
///
/// # Resolution
///
/// For each request the injector:
///
/// 1. rejects tokens already pending on the current dependency chain
/// 2. finds the nearest injector holding a record for the token, honoring
///    [`InjectFlags`]
/// 3. returns the cached instance for the binding's lifetime, or resolves the
///    binding's dependencies from its owning injector, runs the
///    `before_resolution` hook, the factory and the `after_resolution` hook,
///    then caches the result
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use ferrous_injector::{Injector, Lifetime, Provider, Resolver, Token};
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ferrous_injector::DiResult<()> {
/// let root = Injector::create(
///     vec![Provider::value(Token::of::<Database>(), Database { url: "postgres://localhost".into() })],
///     None,
///     None,
/// )?;
/// let child = Injector::create(
///     vec![Provider::factory(Token::of::<UserService>(), |deps| async move {
///         Ok(UserService { db: deps.get::<Database>(0)? })
///     })
///     .deps([Token::of::<Database>()])
///     .lifetime(Lifetime::Transient)],
///     Some(&root),
///     None,
/// )?;
///
/// let users = child.get_type::<UserService>().await?;
/// assert_eq!(users.db.url, "postgres://localhost");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

pub(crate) struct InjectorInner {
    id: InjectorId,
    kind: InjectorKind,
    label: &'static str,
    scope_identity: Option<Token>,
    parent: Option<Injector>,
    records: RwLock<HashMap<Token, Record>>,
    shared: Arc<InjectorShared>,
    // Bindings holding a cache entry keyed by this injector as a context.
    evictions: Mutex<Vec<Weak<Binding>>>,
}

/// Non-owning reference to an [`Injector`].
#[derive(Clone)]
pub struct WeakInjector(Weak<InjectorInner>);

impl WeakInjector {
    pub fn upgrade(&self) -> Option<Injector> {
        self.0.upgrade().map(|inner| Injector { inner })
    }
}

impl Injector {
    /// Creates an injector binding `providers`.
    ///
    /// Without a parent this is a root injector with an empty
    /// [`InjectableRegistry`] and default [`InjectorConfig`]. With a parent, the
    /// new injector shares the parent's registry and configuration.
    pub fn create(
        providers: Vec<Provider>,
        parent: Option<&Injector>,
        scope_identity: Option<Token>,
    ) -> DiResult<Injector> {
        let injector = match parent {
            Some(parent) => parent.child(InjectorKind::Module, scope_identity),
            None => Injector::new(
                InjectorKind::Root,
                scope_identity,
                None,
                Arc::new(InjectorShared::default()),
            ),
        };
        injector.bind_all(providers)?;
        Ok(injector)
    }

    /// Creates a root injector with an explicit registry and configuration.
    pub fn create_root(
        providers: Vec<Provider>,
        registry: InjectableRegistry,
        config: InjectorConfig,
    ) -> DiResult<Injector> {
        let injector = Injector::new(
            InjectorKind::Root,
            None,
            None,
            Arc::new(InjectorShared { registry, config }),
        );
        injector.bind_all(providers)?;
        Ok(injector)
    }

    fn new(
        kind: InjectorKind,
        scope_identity: Option<Token>,
        parent: Option<Injector>,
        shared: Arc<InjectorShared>,
    ) -> Injector {
        let label = match (kind, scope_identity) {
            (_, Some(token)) => token.display_name(),
            (InjectorKind::Root, None) => "root",
            (InjectorKind::Context, None) => "context",
            _ => "injector",
        };
        Injector {
            inner: Arc::new(InjectorInner {
                id: NEXT_INJECTOR_ID.fetch_add(1, Ordering::Relaxed),
                kind,
                label,
                scope_identity,
                parent,
                records: RwLock::new(HashMap::new()),
                shared,
                evictions: Mutex::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn child(&self, kind: InjectorKind, scope_identity: Option<Token>) -> Injector {
        Injector::new(
            kind,
            scope_identity,
            Some(self.clone()),
            self.inner.shared.clone(),
        )
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn kind(&self) -> InjectorKind {
        self.inner.kind
    }

    pub fn label(&self) -> &'static str {
        self.inner.label
    }

    /// Token identifying the module or component this injector belongs to.
    pub fn scope_identity(&self) -> Option<Token> {
        self.inner.scope_identity
    }

    pub fn parent(&self) -> Option<&Injector> {
        self.inner.parent.as_ref()
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.inner.shared.config
    }

    pub fn registry(&self) -> &InjectableRegistry {
        &self.inner.shared.registry
    }

    /// Topmost ancestor.
    pub fn root(&self) -> Injector {
        let mut current = self.clone();
        while let Some(parent) = current.inner.parent.clone() {
            current = parent;
        }
        current
    }

    /// Nearest module or root injector, starting with this one.
    pub fn host(&self) -> Injector {
        let mut current = self.clone();
        loop {
            if matches!(current.kind(), InjectorKind::Module | InjectorKind::Root) {
                return current;
            }
            match current.inner.parent.clone() {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    pub fn downgrade(&self) -> WeakInjector {
        WeakInjector(Arc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &Injector) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// True when this injector itself holds a record for `token`.
    pub fn has_local(&self, token: &Token) -> bool {
        self.inner.records.read().contains_key(token)
    }

    /// True when `token` is provided here or by an ancestor.
    pub fn has(&self, token: &Token) -> bool {
        self.lookup(&Dependency::new(*token)).is_some()
    }

    /// Tokens bound directly into this injector.
    pub fn tokens(&self) -> Vec<Token> {
        self.inner.records.read().keys().copied().collect()
    }

    /// Number of cached instances held by this injector's own bindings.
    pub fn cached_instances(&self) -> usize {
        self.inner
            .records
            .read()
            .values()
            .flat_map(|record| record.bindings().iter())
            .map(|binding| binding.cached_len())
            .sum()
    }

    /// Number of cache slots held by this injector's own bindings, counting
    /// slots whose construction is pending or failed.
    pub fn cache_slots(&self) -> usize {
        self.inner
            .records
            .read()
            .values()
            .flat_map(|record| record.bindings().iter())
            .map(|binding| binding.slot_count())
            .sum()
    }

    pub(crate) fn records(&self) -> Vec<(Token, Record)> {
        self.inner
            .records
            .read()
            .iter()
            .map(|(token, record)| (*token, record.clone()))
            .collect()
    }

    pub(crate) fn bind_all(&self, providers: Vec<Provider>) -> DiResult<()> {
        providers.into_iter().try_for_each(|p| self.bind(p))
    }

    pub(crate) fn bind(&self, provider: Provider) -> DiResult<()> {
        self.bind_tracked(provider).map(drop)
    }

    /// Like `bind`, returning the binding when one was added; ignored
    /// duplicates yield `None`.
    pub(crate) fn bind_tracked(&self, provider: Provider) -> DiResult<Option<Arc<Binding>>> {
        let binding = Arc::new(Binding::from_provider(provider, &self.inner.shared.registry));
        let token = binding.token;
        let mut records = self.inner.records.write();

        match records.get_mut(&token) {
            None => {
                debug!(
                    token = %token,
                    injector = self.label(),
                    lifetime = ?binding.lifetime,
                    multi = binding.multi,
                    "Binding provider"
                );
                let record = if binding.multi {
                    Record::Multi(vec![binding.clone()])
                } else {
                    Record::Single(binding.clone())
                };
                records.insert(token, record);
                Ok(Some(binding))
            }
            Some(Record::Single(_)) if binding.multi => {
                Err(DiError::MixedMultiProvider(token.display_name()))
            }
            Some(Record::Single(_)) if binding.scope == ProviderScope::Root => {
                debug!(token = %token, injector = self.label(), "Ignoring duplicate root provider");
                Ok(None)
            }
            Some(Record::Single(_)) => Err(DiError::DuplicateProvider(token.display_name())),
            Some(Record::Multi(_)) if !binding.multi => {
                Err(DiError::MixedMultiProvider(token.display_name()))
            }
            Some(Record::Multi(bindings)) => {
                let seen = bindings.iter().any(|b| b.provider_id == binding.provider_id);
                if seen && binding.scope == ProviderScope::Root {
                    debug!(token = %token, injector = self.label(), "Ignoring repeated multi provider");
                    Ok(None)
                } else {
                    debug!(token = %token, injector = self.label(), index = bindings.len(), "Binding multi provider");
                    bindings.push(binding.clone());
                    Ok(Some(binding))
                }
            }
        }
    }

    /// Removes `binding` if it is still bound here.
    pub(crate) fn unbind(&self, binding: &Arc<Binding>) {
        let mut records = self.inner.records.write();
        let emptied = match records.get_mut(&binding.token) {
            Some(Record::Single(bound)) => Arc::ptr_eq(bound, binding),
            Some(Record::Multi(bound)) => {
                bound.retain(|b| !Arc::ptr_eq(b, binding));
                bound.is_empty()
            }
            None => false,
        };
        // Removed records are dropped after the lock is released.
        let _removed = emptied.then(|| records.remove(&binding.token));
        drop(records);
        debug!(token = %binding.token, injector = self.label(), "Unbound provider");
    }

    /// Resolves `token` to its raw, type-erased form.
    ///
    /// Prefer the typed helpers on [`Resolver`](crate::Resolver).
    pub async fn get_any(&self, token: Token, options: GetOptions) -> DiResult<Resolved> {
        let context = options
            .context
            .or_else(|| (self.kind() == InjectorKind::Context).then(|| self.clone()));
        let ctx = ResolveCtx {
            context,
            graph: current_graph().unwrap_or_default(),
            inquirer: Inquirer::root(self),
        };
        let dep = Dependency {
            token,
            flags: options.flags,
        };
        if dep.flags.is_lazy() {
            return self.resolve_dependency(dep, ctx).await;
        }

        match self.resolve_token(dep, &ctx).await? {
            Some(resolved) => Ok(resolved),
            None => match options.not_found {
                Some(default) => Ok(Resolved::One(default)),
                None if dep.flags.is_optional() => Ok(Resolved::Missing),
                None => Err(DiError::NoProvider {
                    token: token.display_name(),
                    required_by: None,
                }),
            },
        }
    }

    /// Nearest injector holding a record for `dep`, following its flags.
    pub(crate) fn lookup(&self, dep: &Dependency) -> Option<(Injector, Record)> {
        let flags = dep.flags;
        let mut current = if flags.contains(InjectFlags::HOST) {
            Some(self.host())
        } else {
            Some(self.clone())
        };
        if flags.contains(InjectFlags::SKIP_SELF) {
            current = current.and_then(|start| start.inner.parent.clone());
        }

        while let Some(injector) = current {
            let found = injector.inner.records.read().get(&dep.token).cloned();
            if let Some(record) = found {
                return Some((injector, record));
            }
            if flags.contains(InjectFlags::SELF) {
                return None;
            }
            current = injector.inner.parent.clone();
        }
        None
    }

    /// Resolves one declared dependency, applying `OPTIONAL` and `LAZY`.
    pub(crate) fn resolve_dependency(
        &self,
        dep: Dependency,
        ctx: ResolveCtx,
    ) -> BoxFuture<'_, DiResult<Resolved>> {
        async move {
            if dep.flags.is_lazy() {
                trace!(token = %dep.token, "Deferring lazy dependency");
                let handle = LazyRef::new(self.clone(), dep, ctx.context.as_ref());
                return Ok(Resolved::Lazy(handle));
            }
            match self.resolve_token(dep, &ctx).await? {
                Some(resolved) => Ok(resolved),
                None if dep.flags.is_optional() => Ok(Resolved::Missing),
                None => Err(DiError::NoProvider {
                    token: dep.token.display_name(),
                    required_by: ctx.inquirer.token_name(),
                }),
            }
        }
        .boxed()
    }

    /// `Ok(None)` when no injector on the search path provides the token.
    async fn resolve_token(&self, dep: Dependency, ctx: &ResolveCtx) -> DiResult<Option<Resolved>> {
        ctx.graph.check(dep.token)?;

        let Some((owner, record)) = self.lookup(&dep) else {
            trace!(token = %dep.token, injector = self.label(), "No provider on search path");
            return Ok(None);
        };
        trace!(token = %dep.token, owner = owner.label(), "Resolving");

        let resolved = match record {
            Record::Single(binding) => owner.instantiate(binding, ctx).await?,
            Record::Multi(bindings) => {
                let mut instances = Vec::with_capacity(bindings.len());
                for binding in bindings {
                    match owner.instantiate(binding, ctx).await? {
                        Resolved::One(instance) => instances.push(instance),
                        Resolved::Many(more) => instances.extend(more),
                        Resolved::Lazy(_) | Resolved::Missing => {}
                    }
                }
                Resolved::Many(instances)
            }
        };
        Ok(Some(resolved))
    }

    fn instantiate<'a>(
        &'a self,
        binding: Arc<Binding>,
        ctx: &'a ResolveCtx,
    ) -> BoxFuture<'a, DiResult<Resolved>> {
        async move {
            match &binding.kind {
                BindingKind::Value(value) => return Ok(Resolved::One(value.clone())),
                BindingKind::Forward(exporter) => return exporter.forward(binding.token, ctx).await,
                BindingKind::Factory(_) | BindingKind::Alias(_) => {}
            }

            let Some(key) = self.cache_key(&binding, ctx)? else {
                return self.construct(&binding, ctx).await;
            };
            if let Some(hit) = binding.cached(key) {
                trace!(token = %binding.token, "Cache hit");
                return Ok(Resolved::One(hit));
            }

            // Slots keyed by the current context are released when it drops.
            let context = ctx
                .context
                .as_ref()
                .filter(|context| key == CacheKey::Injector(context.id()));

            let instance = if self.inner.shared.config.coalesce_in_flight {
                let (slot, created) = binding.slot(key);
                // Tracked before construction so a failed init is evicted too.
                if let (true, Some(context)) = (created, context) {
                    context.track_eviction(&binding);
                }
                slot.get_or_try_init(|| async {
                    let resolved = self.construct(&binding, ctx).await?;
                    single_instance(resolved, binding.token)
                })
                .await?
                .clone()
            } else {
                let resolved = self.construct(&binding, ctx).await?;
                let instance = single_instance(resolved, binding.token)?;
                if binding.store(key, instance.clone()) {
                    if let Some(context) = context {
                        context.track_eviction(&binding);
                    }
                }
                instance
            };
            Ok(Resolved::One(instance))
        }
        .boxed()
    }

    fn cache_key(&self, binding: &Binding, ctx: &ResolveCtx) -> DiResult<Option<CacheKey>> {
        let key = match binding.lifetime {
            Lifetime::Transient => None,
            Lifetime::Singleton => Some(CacheKey::Global),
            Lifetime::Scoped => {
                let owner = ctx.context.as_ref().map_or(self.id(), |c| c.id());
                Some(CacheKey::Injector(owner))
            }
            Lifetime::Event => match &ctx.context {
                Some(context) => Some(CacheKey::Injector(context.id())),
                None => return Err(DiError::InvalidScope(binding.token.display_name())),
            },
        };
        Ok(key)
    }

    async fn construct(&self, binding: &Arc<Binding>, ctx: &ResolveCtx) -> DiResult<Resolved> {
        let graph = ctx
            .graph
            .push(binding.token, self.inner.shared.config.max_depth)?;
        let frame = ResolveCtx {
            context: ctx.context.clone(),
            graph,
            inquirer: Inquirer::binding(binding.token, self),
        };

        let factory = match &binding.kind {
            BindingKind::Factory(factory) => factory,
            BindingKind::Alias(target) => {
                trace!(token = %binding.token, target = %target, "Following alias");
                return self.resolve_dependency(Dependency::new(*target), frame).await;
            }
            BindingKind::Value(value) => return Ok(Resolved::One(value.clone())),
            BindingKind::Forward(exporter) => return exporter.forward(binding.token, ctx).await,
        };

        let mut entries = Vec::with_capacity(binding.dependencies.len());
        for dep in &binding.dependencies {
            let resolved = self.resolve_dependency(*dep, frame.clone()).await?;
            entries.push((*dep, resolved));
        }
        let deps = Dependencies::new(entries);

        let hook_injector = ctx.context.clone().unwrap_or_else(|| self.clone());
        let inquirer = ctx.inquirer;
        let depth = frame.graph.depth();
        let instance = with_graph(frame.graph, async {
            let deps = match &binding.before {
                Some(hook) => hook(hook_injector.clone(), deps, inquirer).await?,
                None => deps,
            };
            let instance = factory(deps).await?;
            if let Some(hook) = &binding.after {
                hook(instance.clone(), hook_injector).await?;
            }
            Ok::<_, DiError>(instance)
        })
        .await?;

        trace!(
            token = %binding.token,
            injector = self.label(),
            depth,
            "Constructed instance"
        );
        Ok(Resolved::One(instance))
    }

    /// Resolves a re-exported token through this (exporting) injector.
    async fn forward(&self, token: Token, ctx: &ResolveCtx) -> DiResult<Resolved> {
        self.resolve_token(Dependency::new(token), ctx)
            .await?
            .ok_or(DiError::NoProvider {
                token: token.display_name(),
                required_by: ctx.inquirer.token_name(),
            })
    }

    fn track_eviction(&self, binding: &Arc<Binding>) {
        self.inner.evictions.lock().push(Arc::downgrade(binding));
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Injector Debug ===\n");
        let mut current = Some(self.clone());
        while let Some(injector) = current {
            s.push_str(&format!("{:?} {} (#{}):\n", injector.kind(), injector.label(), injector.id()));
            for (token, record) in injector.records() {
                for binding in record.bindings() {
                    s.push_str(&format!(
                        "  {}: {} {:?}{}\n",
                        token,
                        binding.kind_name,
                        binding.lifetime,
                        if binding.multi { " (multi)" } else { "" }
                    ));
                }
            }
            current = injector.inner.parent.clone();
        }
        s
    }
}

fn single_instance(resolved: Resolved, token: Token) -> DiResult<Instance> {
    match resolved {
        Resolved::One(instance) => Ok(instance),
        _ => Err(DiError::TypeMismatch(token.display_name())),
    }
}

impl Drop for InjectorInner {
    fn drop(&mut self) {
        if self.kind != InjectorKind::Context {
            return;
        }
        let key = CacheKey::Injector(self.id);
        let evicted = self
            .evictions
            .get_mut()
            .drain(..)
            .filter_map(|weak| weak.upgrade())
            .filter(|binding| binding.evict(key))
            .count();
        debug!(context = self.id, evicted, "Context injector dropped");
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("label", &self.label())
            .field("bindings", &self.inner.records.read().len())
            .field("parent", &self.parent().map(|p| p.id()))
            .finish()
    }
}

#[async_trait::async_trait]
impl ResolverCore for Injector {
    async fn resolve(&self, token: Token, options: GetOptions) -> DiResult<Resolved> {
        self.get_any(token, options).await
    }
}
