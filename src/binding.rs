//! Bindings: the immutable recipe an injector keeps per token, plus its cache.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::provider::{AfterHook, BeforeHook, FactoryFn, Provider, ProviderId, ProviderKind};
use crate::{
    DiError, DiResult, Dependency, InjectableRegistry, Injector, Lifetime, ProviderScope, Token,
};

/// Type-erased shared instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) fn downcast_instance<T: Send + Sync + 'static>(instance: Instance) -> DiResult<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

// Trait objects are stored as Arc<Arc<dyn Trait>>.
pub(crate) fn downcast_trait<T: ?Sized + Send + Sync + 'static>(
    instance: Instance,
) -> DiResult<Arc<T>> {
    instance
        .downcast::<Arc<T>>()
        .map(|outer| (*outer).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

/// Unique id of an injector within the process.
pub(crate) type InjectorId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CacheKey {
    Global,
    Injector(InjectorId),
}

pub(crate) enum BindingKind {
    Value(Instance),
    Factory(FactoryFn),
    Alias(Token),
    Forward(Injector),
}

type Slot = Arc<OnceCell<Instance>>;

/// A provider after binding: lifetime and scope resolved, cache attached.
pub(crate) struct Binding {
    pub(crate) token: Token,
    pub(crate) kind: BindingKind,
    pub(crate) kind_name: &'static str,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) lifetime: Lifetime,
    pub(crate) scope: ProviderScope,
    pub(crate) multi: bool,
    pub(crate) provider_id: ProviderId,
    pub(crate) before: Option<BeforeHook>,
    pub(crate) after: Option<AfterHook>,
    cache: Mutex<HashMap<CacheKey, Slot>>,
}

impl Binding {
    pub(crate) fn from_provider(provider: Provider, registry: &InjectableRegistry) -> Self {
        let declared = registry.options(&provider.token);
        let kind_name = provider.kind.name();
        // Values are always shared.
        let lifetime = match provider.kind {
            ProviderKind::Value(_) => Lifetime::Singleton,
            _ => provider.lifetime.or(declared.lifetime).unwrap_or_default(),
        };
        let kind = match provider.kind {
            ProviderKind::Value(value) => BindingKind::Value(value),
            ProviderKind::Class(f) | ProviderKind::Factory(f) => BindingKind::Factory(f),
            ProviderKind::Alias(target) => BindingKind::Alias(target),
            ProviderKind::Forward(exporter) => BindingKind::Forward(exporter),
        };

        Self {
            token: provider.token,
            kind,
            kind_name,
            dependencies: provider.dependencies,
            lifetime,
            scope: effective_scope(provider.scope, &provider.token, registry),
            multi: provider.multi,
            provider_id: provider.id,
            before: provider.before,
            after: provider.after,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn cached(&self, key: CacheKey) -> Option<Instance> {
        self.cache.lock().get(&key).and_then(|slot| slot.get().cloned())
    }

    /// Shared slot for `key`, created empty on first use. The flag is set
    /// when this call created it.
    pub(crate) fn slot(&self, key: CacheKey) -> (Slot, bool) {
        let mut cache = self.cache.lock();
        if let Some(slot) = cache.get(&key) {
            return (slot.clone(), false);
        }
        let slot: Slot = Arc::new(OnceCell::new());
        cache.insert(key, slot.clone());
        (slot, true)
    }

    /// Overwrites the slot for `key`; the last writer wins. Returns `true`
    /// when no slot existed for `key` before.
    pub(crate) fn store(&self, key: CacheKey, instance: Instance) -> bool {
        let slot = Arc::new(OnceCell::new_with(Some(instance)));
        // Replaced instances are dropped after the lock is released.
        let previous = self.cache.lock().insert(key, slot);
        previous.is_none()
    }

    pub(crate) fn evict(&self, key: CacheKey) -> bool {
        let removed = self.cache.lock().remove(&key);
        removed.is_some()
    }

    /// Slots held for any key, initialized or not.
    pub(crate) fn slot_count(&self) -> usize {
        self.cache.lock().len()
    }

    pub(crate) fn cached_len(&self) -> usize {
        self.cache
            .lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }
}

/// Scope after falling back to the registry, then the global default.
pub(crate) fn effective_scope(
    declared: Option<ProviderScope>,
    token: &Token,
    registry: &InjectableRegistry,
) -> ProviderScope {
    declared
        .or_else(|| registry.options(token).scope)
        .unwrap_or_default()
}

/// What an injector holds for one token.
#[derive(Clone)]
pub(crate) enum Record {
    Single(Arc<Binding>),
    Multi(Vec<Arc<Binding>>),
}

impl Record {
    pub(crate) fn bindings(&self) -> &[Arc<Binding>] {
        match self {
            Record::Single(binding) => std::slice::from_ref(binding),
            Record::Multi(bindings) => bindings,
        }
    }
}
