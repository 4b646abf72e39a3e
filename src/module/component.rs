//! Components: nested scopes inside a module.

use std::sync::Arc;

use super::{with_extra, Router};
use crate::injector::{GetOptions, InjectorKind};
use crate::traits::ResolverCore;
use crate::{ContextInjector, DiResult, Injector, Provider, Resolved, Token};

/// Declarative description of a component.
#[derive(Clone, Debug)]
pub struct ComponentDefinition {
    pub metatype: Token,
    pub providers: Vec<Provider>,
    pub components: Vec<ComponentDefinition>,
}

impl ComponentDefinition {
    pub fn new(metatype: Token) -> Self {
        Self {
            metatype,
            providers: Vec::new(),
            components: Vec::new(),
        }
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers.extend(providers);
        self
    }

    pub fn component(mut self, component: ComponentDefinition) -> Self {
        self.components.push(component);
        self
    }
}

/// A component's injector, a child of its module's (or enclosing
/// component's) injector.
///
/// Tokens bound here are invisible to the module and to sibling components.
#[derive(Clone)]
pub struct ComponentRef {
    inner: Arc<ComponentRefInner>,
}

struct ComponentRefInner {
    metatype: Token,
    module: Token,
    injector: Injector,
    components: Vec<ComponentRef>,
    context_providers: Vec<Provider>,
}

impl ComponentRef {
    pub(crate) fn build(
        definition: ComponentDefinition,
        parent: &Injector,
        router: &Router<'_>,
        inherited_context: &[Provider],
    ) -> DiResult<ComponentRef> {
        let injector = parent.child(InjectorKind::Component, Some(definition.metatype));
        let mut context_providers = inherited_context.to_vec();
        for provider in definition.providers {
            router.route(provider, Some(&injector), &mut context_providers)?;
        }

        let components = definition
            .components
            .into_iter()
            .map(|nested| ComponentRef::build(nested, &injector, router, &context_providers))
            .collect::<DiResult<Vec<_>>>()?;

        Ok(ComponentRef {
            inner: Arc::new(ComponentRefInner {
                metatype: definition.metatype,
                module: router.metatype,
                injector,
                components,
                context_providers,
            }),
        })
    }

    pub fn metatype(&self) -> Token {
        self.inner.metatype
    }

    /// Metatype of the owning module.
    pub fn module(&self) -> Token {
        self.inner.module
    }

    pub fn injector(&self) -> &Injector {
        &self.inner.injector
    }

    pub fn components(&self) -> &[ComponentRef] {
        &self.inner.components
    }

    /// Context-scoped providers collected along the module/component chain.
    pub fn context_providers(&self) -> &[Provider] {
        &self.inner.context_providers
    }

    pub(crate) fn find(&self, metatype: Token) -> Option<ComponentRef> {
        if self.inner.metatype == metatype {
            return Some(self.clone());
        }
        self.inner
            .components
            .iter()
            .find_map(|nested| nested.find(metatype))
    }

    /// Creates a context for one inbound event handled by this component.
    pub fn create_context(&self, extra: Vec<Provider>) -> DiResult<ContextInjector> {
        let providers = with_extra(&self.inner.context_providers, extra);
        ContextInjector::create(&self.inner.injector, providers)
    }
}

impl std::fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRef")
            .field("metatype", &self.inner.metatype)
            .field("module", &self.inner.module)
            .field("components", &self.inner.components.len())
            .finish()
    }
}

#[async_trait::async_trait]
impl ResolverCore for ComponentRef {
    async fn resolve(&self, token: Token, options: GetOptions) -> DiResult<Resolved> {
        self.inner.injector.get_any(token, options).await
    }
}
