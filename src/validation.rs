//! Static validation of injector bindings.
//!
//! Validation walks the bindings of an injector and the dependency edges they
//! declare, without constructing anything, to catch configuration errors
//! before the first request does.

use std::collections::HashSet;
use std::sync::Arc;

use crate::binding::{Binding, BindingKind};
use crate::{Dependency, Injector, Lifetime};

const MAX_ALIAS_HOPS: usize = 32;

/// Result of validating one or more injectors.
///
/// # Validation Rules
///
/// - **Singleton → Scoped/Event**: Error - the singleton would capture one context's instance
/// - **Singleton → Transient**: Warning - Singleton will hold the same transient instance forever
/// - **Missing Dependencies**: Error - non-optional dependency with no provider on the search path
/// - **Circular Dependencies**: Error - eager dependency edges forming a cycle (lazy edges are skipped)
///
/// # Examples
///
/// ```
/// use ferrous_injector::{Dependency, Injector, Lifetime, Provider, Token};
///
/// const SERVICE: Token = Token::named("SERVICE");
/// const REQUEST: Token = Token::named("REQUEST");
///
/// let injector = Injector::create(
///     vec![
///         Provider::factory(SERVICE, |_| async { Ok(()) }).deps([REQUEST]),
///         Provider::factory(REQUEST, |_| async { Ok(()) }).lifetime(Lifetime::Scoped),
///     ],
///     None,
///     None,
/// )
/// .unwrap();
///
/// let result = injector.validate();
/// assert!(!result.is_valid());
/// assert!(result.format_issues().contains("cannot depend on scoped"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Errors that will fail resolution or break lifetime guarantees
    pub errors: Vec<ValidationError>,
    /// Warnings about potentially problematic configurations
    pub warnings: Vec<ValidationWarning>,
}

/// A validation error that prevents safe DI configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Singleton binding depends on a Scoped or Event binding
    SingletonDependsOnScoped {
        singleton: &'static str,
        scoped: &'static str,
        lifetime: Lifetime,
    },
    /// Required dependency is not provided
    MissingDependency {
        service: &'static str,
        dependency: &'static str,
    },
    /// Circular dependency detected
    CircularDependency { cycle: Vec<&'static str> },
}

/// A validation warning about potentially problematic configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Singleton depends on transient (will always get same instance)
    SingletonDependsOnTransient {
        singleton: &'static str,
        transient: &'static str,
    },
}

/// Runtime validation helpers for development and testing.
impl ValidationResult {
    /// Returns true if validation passed without errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if there are warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Folds `other` into this result, skipping issues already reported.
    pub fn merge(&mut self, other: ValidationResult) {
        for error in other.errors {
            if !self.errors.contains(&error) {
                self.errors.push(error);
            }
        }
        for warning in other.warnings {
            if !self.warnings.contains(&warning) {
                self.warnings.push(warning);
            }
        }
    }

    /// Formats errors and warnings for display.
    pub fn format_issues(&self) -> String {
        let mut output = String::new();

        if !self.errors.is_empty() {
            output.push_str("Validation Errors:\n");
            for error in &self.errors {
                output.push_str(&format!("  - {}\n", format_error(error)));
            }
        }

        if !self.warnings.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str("Validation Warnings:\n");
            for warning in &self.warnings {
                output.push_str(&format!("  - {}\n", format_warning(warning)));
            }
        }

        output
    }
}

pub(crate) fn format_error(error: &ValidationError) -> String {
    match error {
        ValidationError::SingletonDependsOnScoped {
            singleton,
            scoped,
            lifetime,
        } => {
            let kind = match lifetime {
                Lifetime::Event => "event",
                _ => "scoped",
            };
            format!(
                "Singleton '{}' cannot depend on {} binding '{}'",
                singleton, kind, scoped
            )
        }
        ValidationError::MissingDependency {
            service,
            dependency,
        } => {
            format!("'{}' depends on '{}' which has no provider", service, dependency)
        }
        ValidationError::CircularDependency { cycle } => {
            format!("Circular dependency detected: {}", cycle.join(" -> "))
        }
    }
}

pub(crate) fn format_warning(warning: &ValidationWarning) -> String {
    match warning {
        ValidationWarning::SingletonDependsOnTransient {
            singleton,
            transient,
        } => format!(
            "Singleton '{}' depends on transient '{}' - will always get same instance",
            singleton, transient
        ),
    }
}

/// An edge from a binding to the bindings one of its dependencies resolves to.
struct Edge {
    dependency: Dependency,
    targets: Option<Vec<(Injector, Arc<Binding>)>>,
}

fn edges(owner: &Injector, binding: &Binding) -> Vec<Edge> {
    let declared: Vec<(Injector, Dependency)> = match &binding.kind {
        BindingKind::Value(_) => Vec::new(),
        BindingKind::Factory(_) => binding
            .dependencies
            .iter()
            .map(|dep| (owner.clone(), *dep))
            .collect(),
        BindingKind::Alias(target) => vec![(owner.clone(), Dependency::new(*target))],
        BindingKind::Forward(exporter) => vec![(exporter.clone(), Dependency::new(binding.token))],
    };

    declared
        .into_iter()
        .map(|(from, dependency)| Edge {
            dependency,
            targets: from.lookup(&dependency).map(|(target_owner, record)| {
                record
                    .bindings()
                    .iter()
                    .map(|b| (target_owner.clone(), b.clone()))
                    .collect()
            }),
        })
        .collect()
}

/// Lifetimes a dependency really has once transient aliases and forwards are followed.
fn effective_lifetimes(owner: &Injector, binding: &Arc<Binding>, hops: usize) -> Vec<(&'static str, Lifetime)> {
    let passthrough = matches!(binding.kind, BindingKind::Alias(_) | BindingKind::Forward(_))
        && binding.lifetime == Lifetime::Transient;
    if !passthrough || hops >= MAX_ALIAS_HOPS {
        return vec![(binding.token.display_name(), binding.lifetime)];
    }
    edges(owner, binding)
        .into_iter()
        .filter_map(|edge| edge.targets)
        .flatten()
        .flat_map(|(target_owner, target)| effective_lifetimes(&target_owner, &target, hops + 1))
        .collect()
}

#[derive(Default)]
struct CycleSearch {
    done: HashSet<usize>,
    path: Vec<(usize, &'static str)>,
    cycles: Vec<Vec<&'static str>>,
}

impl CycleSearch {
    fn visit(&mut self, owner: &Injector, binding: &Arc<Binding>) {
        let id = Arc::as_ptr(binding) as usize;
        if let Some(start) = self.path.iter().position(|(node, _)| *node == id) {
            let mut cycle: Vec<&'static str> = self.path[start..].iter().map(|(_, name)| *name).collect();
            cycle.push(binding.token.display_name());
            self.cycles.push(cycle);
            return;
        }
        if self.done.contains(&id) {
            return;
        }

        self.path.push((id, binding.token.display_name()));
        for edge in edges(owner, binding) {
            // lazy edges cannot form an eager cycle
            if edge.dependency.flags.is_lazy() {
                continue;
            }
            for (target_owner, target) in edge.targets.into_iter().flatten() {
                self.visit(&target_owner, &target);
            }
        }
        self.path.pop();
        self.done.insert(id);
    }
}

impl Injector {
    /// Validates the bindings held directly by this injector.
    ///
    /// Dependencies are looked up the way resolution would, from this
    /// injector and its ancestors, honoring each dependency's flags.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        let mut search = CycleSearch::default();

        for (_, record) in self.records() {
            for binding in record.bindings() {
                let service = binding.token.display_name();
                for edge in edges(self, binding) {
                    let Some(targets) = &edge.targets else {
                        if !edge.dependency.flags.is_optional() {
                            result.errors.push(ValidationError::MissingDependency {
                                service,
                                dependency: edge.dependency.token.display_name(),
                            });
                        }
                        continue;
                    };
                    if binding.lifetime != Lifetime::Singleton || edge.dependency.flags.is_lazy() {
                        continue;
                    }
                    let lifetimes = targets
                        .iter()
                        .flat_map(|(owner, target)| effective_lifetimes(owner, target, 0));
                    for (dependency, lifetime) in lifetimes {
                        match lifetime {
                            Lifetime::Scoped | Lifetime::Event => {
                                result.errors.push(ValidationError::SingletonDependsOnScoped {
                                    singleton: service,
                                    scoped: dependency,
                                    lifetime,
                                })
                            }
                            Lifetime::Transient => {
                                result.warnings.push(ValidationWarning::SingletonDependsOnTransient {
                                    singleton: service,
                                    transient: dependency,
                                })
                            }
                            Lifetime::Singleton => {}
                        }
                    }
                }
                search.visit(self, binding);
            }
        }

        for cycle in search.cycles {
            result.merge(ValidationResult {
                errors: vec![ValidationError::CircularDependency { cycle }],
                warnings: Vec::new(),
            });
        }
        result
    }
}
