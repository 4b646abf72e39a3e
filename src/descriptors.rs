//! Binding descriptors for introspection and diagnostics.

use crate::{Dependency, Injector, Lifetime, ProviderScope, Token};

/// Binding descriptor for introspection and diagnostics
///
/// Describes one binding held by an injector: what it provides, how it is
/// cached and what it needs. Multi tokens produce one descriptor per binding,
/// in registration order.
///
/// # Use Cases
///
/// - **Debugging**: Inspect what is bound where, and with which lifetime
/// - **Validation**: Feed static checks such as [`Injector::validate`]
/// - **Health checks**: Verify container configuration at startup
///
/// # Examples
///
/// ```rust
/// use ferrous_injector::{Dependency, Injector, Lifetime, Provider, Token};
///
/// struct Database;
/// struct Repository;
/// const MAX_CONNECTIONS: Token = Token::named("MAX_CONNECTIONS");
///
/// let injector = Injector::create(
///     vec![
///         Provider::value(Token::of::<Database>(), Database),
///         Provider::factory(Token::of::<Repository>(), |_| async { Ok(Repository) })
///             .deps([Dependency::of::<Database>()])
///             .lifetime(Lifetime::Scoped),
///         Provider::value(MAX_CONNECTIONS, 100u32),
///     ],
///     None,
///     None,
/// )
/// .unwrap();
///
/// let descriptors = injector.descriptors();
/// assert_eq!(descriptors.len(), 3);
///
/// let repo = descriptors.iter().find(|d| d.type_name().contains("Repository")).unwrap();
/// assert_eq!(repo.lifetime, Lifetime::Scoped);
/// assert_eq!(repo.kind, "factory");
/// assert_eq!(repo.dependencies.len(), 1);
///
/// let limit = descriptors.iter().find(|d| d.is_named()).unwrap();
/// assert_eq!(limit.type_name(), "MAX_CONNECTIONS");
/// ```
#[derive(Debug, Clone)]
pub struct BindingDescriptor {
    pub token: Token,
    /// Provider kind: "value", "class", "factory", "alias" or "forward"
    pub kind: &'static str,
    pub lifetime: Lifetime,
    pub scope: ProviderScope,
    pub multi: bool,
    pub dependencies: Vec<Dependency>,
    /// Label of the injector holding the binding
    pub injector: &'static str,
}

impl BindingDescriptor {
    /// Human-readable token name.
    pub fn type_name(&self) -> &'static str {
        self.token.display_name()
    }

    /// True for bindings under an explicit injection key.
    pub fn is_named(&self) -> bool {
        self.token.is_named()
    }
}

impl Injector {
    /// Descriptors for the bindings held directly by this injector.
    ///
    /// Sorted by token name so output is stable across runs.
    pub fn descriptors(&self) -> Vec<BindingDescriptor> {
        let mut descriptors: Vec<BindingDescriptor> = self
            .records()
            .into_iter()
            .flat_map(|(token, record)| {
                record
                    .bindings()
                    .iter()
                    .map(|binding| BindingDescriptor {
                        token,
                        kind: binding.kind_name,
                        lifetime: binding.lifetime,
                        scope: binding.scope,
                        multi: binding.multi,
                        dependencies: binding.dependencies.clone(),
                        injector: self.label(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        descriptors.sort_by_key(|d| d.token.display_name());
        descriptors
    }
}
