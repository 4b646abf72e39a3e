//! Module system: scope wrappers over injectors.
//!
//! A module groups providers behind its own [`Injector`], whose parent is the
//! root. Providers are routed by their scope: root-scoped ones land in the
//! root injector, module-scoped ones in the module injector, and
//! context-scoped ones are kept aside for the [`ContextInjector`]s the module
//! creates. Imports only make a module's *exported* tokens visible.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::binding::effective_scope;
use crate::injector::{GetOptions, InjectorKind};
use crate::traits::ResolverCore;
use crate::validation::{format_error, format_warning};
use crate::{
    ContextInjector, DiError, DiResult, InjectableRegistry, Injector, InjectorConfig, Provider,
    ProviderScope, Resolved, Token, ValidationResult,
};

mod component;

pub use component::{ComponentDefinition, ComponentRef};

/// Declarative description of a module.
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::{ModuleDefinition, Provider, ProviderScope, Token};
///
/// struct Pool;
/// struct DatabaseModule;
///
/// let module = ModuleDefinition::new(Token::of::<DatabaseModule>())
///     .provider(Provider::value(Token::of::<Pool>(), Pool).scope(ProviderScope::Module))
///     .export(Token::of::<Pool>());
/// assert_eq!(module.exports.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct ModuleDefinition {
    pub metatype: Token,
    pub imports: Vec<ModuleDefinition>,
    pub providers: Vec<Provider>,
    pub components: Vec<ComponentDefinition>,
    pub exports: Vec<Token>,
}

impl ModuleDefinition {
    pub fn new(metatype: Token) -> Self {
        Self {
            metatype,
            imports: Vec::new(),
            providers: Vec::new(),
            components: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub fn import(mut self, module: ModuleDefinition) -> Self {
        self.imports.push(module);
        self
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

    pub fn export(mut self, token: Token) -> Self {
        self.exports.push(token);
        self
    }
}

/// A registered module: its injector plus what it exposes.
#[derive(Clone)]
pub struct ModuleRef {
    inner: Arc<ModuleRefInner>,
}

struct ModuleRefInner {
    metatype: Token,
    injector: Injector,
    imports: Vec<Token>,
    exports: Vec<Token>,
    components: Vec<ComponentRef>,
    context_providers: Vec<Provider>,
}

impl ModuleRef {
    pub fn metatype(&self) -> Token {
        self.inner.metatype
    }

    pub fn injector(&self) -> &Injector {
        &self.inner.injector
    }

    pub fn imports(&self) -> &[Token] {
        &self.inner.imports
    }

    pub fn exports(&self) -> &[Token] {
        &self.inner.exports
    }

    pub fn components(&self) -> &[ComponentRef] {
        &self.inner.components
    }

    /// Finds a component by metatype, searching nested components too.
    pub fn component(&self, metatype: Token) -> Option<ComponentRef> {
        self.inner
            .components
            .iter()
            .find_map(|component| component.find(metatype))
    }

    /// Context-scoped providers declared by this module.
    pub fn context_providers(&self) -> &[Provider] {
        &self.inner.context_providers
    }

    /// Creates a context for one inbound event.
    ///
    /// The context binds this module's context-scoped providers followed by
    /// `extra`, typically the event payload as a value provider.
    pub fn create_context(&self, extra: Vec<Provider>) -> DiResult<ContextInjector> {
        let providers = with_extra(&self.inner.context_providers, extra);
        ContextInjector::create(&self.inner.injector, providers)
    }
}

/// Context providers followed by `extra`; a single `extra` provider replaces
/// a declared one with the same token.
pub(crate) fn with_extra(declared: &[Provider], extra: Vec<Provider>) -> Vec<Provider> {
    let mut providers: Vec<Provider> = declared
        .iter()
        .filter(|p| !extra.iter().any(|e| !e.multi && e.token == p.token))
        .cloned()
        .collect();
    providers.extend(extra);
    providers
}

impl std::fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRef")
            .field("metatype", &self.inner.metatype)
            .field("imports", &self.inner.imports)
            .field("exports", &self.inner.exports)
            .field("components", &self.inner.components.len())
            .finish()
    }
}

#[async_trait::async_trait]
impl ResolverCore for ModuleRef {
    async fn resolve(&self, token: Token, options: GetOptions) -> DiResult<Resolved> {
        self.inner.injector.get_any(token, options).await
    }
}

/// Owns the root injector and every registered module.
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::{
///     InjectableRegistry, InjectorConfig, ModuleContainer, ModuleDefinition, Provider,
///     ProviderScope, Resolver, Token,
/// };
///
/// struct Pool(&'static str);
/// struct DatabaseModule;
/// struct AppModule;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ferrous_injector::DiResult<()> {
/// let container = ModuleContainer::new(vec![], InjectableRegistry::empty(), InjectorConfig::default())?;
///
/// let database = ModuleDefinition::new(Token::of::<DatabaseModule>())
///     .provider(Provider::value(Token::of::<Pool>(), Pool("main")).scope(ProviderScope::Module))
///     .export(Token::of::<Pool>());
/// let app = container.register(ModuleDefinition::new(Token::of::<AppModule>()).import(database))?;
///
/// assert_eq!(app.get_type::<Pool>().await?.0, "main");
/// assert!(container.root().get_optional::<Pool>(Token::of::<Pool>()).await?.is_none());
/// # Ok(())
/// # }
/// ```
pub struct ModuleContainer {
    root: Injector,
    modules: RwLock<HashMap<Token, ModuleRef>>,
    order: RwLock<Vec<Token>>,
}

impl ModuleContainer {
    /// Builds the root injector from the explicit root registration pass.
    pub fn new(
        root_providers: Vec<Provider>,
        registry: InjectableRegistry,
        config: InjectorConfig,
    ) -> DiResult<Self> {
        Ok(Self {
            root: Injector::create_root(root_providers, registry, config)?,
            modules: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
        })
    }

    pub fn root(&self) -> &Injector {
        &self.root
    }

    pub fn module(&self, metatype: Token) -> Option<ModuleRef> {
        self.modules.read().get(&metatype).cloned()
    }

    /// Registered modules in registration order.
    pub fn modules(&self) -> Vec<ModuleRef> {
        let modules = self.modules.read();
        self.order
            .read()
            .iter()
            .filter_map(|token| modules.get(token).cloned())
            .collect()
    }

    /// Registers `definition` and, first, everything it imports.
    ///
    /// Each metatype is instantiated once; registering it again returns the
    /// existing [`ModuleRef`].
    pub fn register(&self, definition: ModuleDefinition) -> DiResult<ModuleRef> {
        self.register_with_stack(definition, &mut Vec::new())
    }

    fn register_with_stack(
        &self,
        definition: ModuleDefinition,
        stack: &mut Vec<Token>,
    ) -> DiResult<ModuleRef> {
        let metatype = definition.metatype;
        if let Some(existing) = self.module(metatype) {
            return Ok(existing);
        }
        if stack.contains(&metatype) {
            let mut chain: Vec<&'static str> = stack.iter().map(|t| t.display_name()).collect();
            chain.push(metatype.display_name());
            return Err(DiError::CircularImport(chain));
        }

        stack.push(metatype);
        let imported = definition
            .imports
            .into_iter()
            .map(|import| self.register_with_stack(import, stack))
            .collect::<DiResult<Vec<_>>>()?;
        stack.pop();

        let injector = self.root.child(InjectorKind::Module, Some(metatype));
        let router = Router {
            container: self,
            metatype,
            module: &injector,
            shared: Mutex::new(Vec::new()),
        };
        let mut context_providers = Vec::new();
        let mut provided = Vec::new();
        for provider in definition.providers {
            if router.scope_of(&provider) != ProviderScope::Context {
                provided.push(provider.token);
            }
            router.route(provider, None, &mut context_providers)?;
        }

        // Own providers win over imported ones.
        for module in &imported {
            for token in module.exports() {
                if !injector.has_local(token) {
                    injector.bind(Provider::forward(*token, module.injector().clone()))?;
                }
            }
        }

        for token in &definition.exports {
            if !injector.has_local(token) && !provided.contains(token) {
                return Err(DiError::UnknownExport {
                    module: metatype.display_name(),
                    token: token.display_name(),
                });
            }
        }

        let components = definition
            .components
            .into_iter()
            .map(|component| ComponentRef::build(component, &injector, &router, &context_providers))
            .collect::<DiResult<Vec<_>>>()?;
        router.commit()?;

        let module_ref = ModuleRef {
            inner: Arc::new(ModuleRefInner {
                metatype,
                injector,
                imports: imported.iter().map(|m| m.metatype()).collect(),
                exports: definition.exports,
                components,
                context_providers,
            }),
        };

        debug!(
            module = metatype.display_name(),
            imports = module_ref.imports().len(),
            exports = module_ref.exports().len(),
            components = module_ref.components().len(),
            "Registered module"
        );
        self.modules.write().insert(metatype, module_ref.clone());
        self.order.write().push(metatype);
        Ok(module_ref)
    }

    /// Validates the root, every module and every component injector.
    ///
    /// Problems are also logged at `warn` level.
    pub fn validate(&self) -> ValidationResult {
        let mut result = self.root.validate();
        for module in self.modules() {
            result.merge(module.injector().validate());
            let mut pending: Vec<ComponentRef> = module.components().to_vec();
            while let Some(component) = pending.pop() {
                result.merge(component.injector().validate());
                pending.extend(component.components().iter().cloned());
            }
        }

        for error in &result.errors {
            warn!("{}", format_error(error));
        }
        for warning in &result.warnings {
            warn!("{}", format_warning(warning));
        }
        result
    }
}

impl std::fmt::Debug for ModuleContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContainer")
            .field("root", &self.root)
            .field("modules", &self.order.read())
            .finish()
    }
}

/// Sends providers declared inside one module to the injector their scope names.
pub(crate) struct Router<'a> {
    container: &'a ModuleContainer,
    metatype: Token,
    module: &'a Injector,
    // Bindings into the root or other modules, held back until the
    // registering module has passed every check.
    shared: Mutex<Vec<(Injector, Provider)>>,
}

impl Router<'_> {
    pub(crate) fn scope_of(&self, provider: &Provider) -> ProviderScope {
        effective_scope(provider.scope, &provider.token, self.container.root.registry())
    }

    /// Binds `provider` where its scope says, or collects it for contexts.
    ///
    /// `component` is the declaring component's injector, if any.
    pub(crate) fn route(
        &self,
        provider: Provider,
        component: Option<&Injector>,
        context: &mut Vec<Provider>,
    ) -> DiResult<()> {
        match self.scope_of(&provider) {
            ProviderScope::Root => {
                self.shared.lock().push((self.container.root.clone(), provider));
                Ok(())
            }
            ProviderScope::Module => self.module.bind(provider),
            ProviderScope::Component => component.unwrap_or(self.module).bind(provider),
            ProviderScope::Context => {
                // a later declaration overrides an inherited single provider
                if !provider.multi {
                    context.retain(|p| p.token != provider.token);
                }
                context.push(provider);
                Ok(())
            }
            ProviderScope::Explicit(target) if target == self.metatype => self.module.bind(provider),
            ProviderScope::Explicit(target) => {
                let module = self
                    .container
                    .module(target)
                    .ok_or(DiError::UnknownModule(target.display_name()))?;
                self.shared.lock().push((module.injector().clone(), provider));
                Ok(())
            }
        }
    }

    /// Binds the held-back providers; on failure the ones already bound are
    /// removed again.
    fn commit(&self) -> DiResult<()> {
        let shared = std::mem::take(&mut *self.shared.lock());
        let mut bound = Vec::with_capacity(shared.len());
        for (injector, provider) in shared {
            match injector.bind_tracked(provider) {
                Ok(Some(binding)) => bound.push((injector, binding)),
                Ok(None) => {}
                Err(err) => {
                    for (injector, binding) in bound.iter().rev() {
                        injector.unbind(binding);
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}
