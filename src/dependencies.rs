//! Resolved dependency values handed to factories and hooks.

use std::sync::Arc;

use crate::binding::{downcast_instance, downcast_trait, Instance};
use crate::{Dependency, DiError, DiResult, Lazy, LazyRef};

/// Outcome of resolving one dependency.
#[derive(Clone)]
pub enum Resolved {
    /// A single instance
    One(Instance),
    /// Every binding of a multi token, in registration order
    Many(Vec<Instance>),
    /// Deferred handle produced by [`InjectFlags::LAZY`](crate::InjectFlags::LAZY)
    Lazy(LazyRef),
    /// Optional dependency with no provider
    Missing,
}

impl Resolved {
    pub fn is_missing(&self) -> bool {
        matches!(self, Resolved::Missing)
    }

    /// The single instance, downcast to `T`.
    pub fn one<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        match self {
            Resolved::One(instance) => downcast_instance(instance.clone()),
            _ => Err(DiError::TypeMismatch(std::any::type_name::<T>())),
        }
    }

    pub fn one_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        match self {
            Resolved::One(instance) => downcast_trait(instance.clone()),
            _ => Err(DiError::TypeMismatch(std::any::type_name::<T>())),
        }
    }

    /// All instances; a single instance yields a one-element list.
    pub fn many<T: Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.instances::<T>()?
            .into_iter()
            .map(downcast_instance)
            .collect()
    }

    pub fn many_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.instances::<T>()?
            .into_iter()
            .map(downcast_trait)
            .collect()
    }

    fn instances<T: ?Sized>(&self) -> DiResult<Vec<Instance>> {
        match self {
            Resolved::One(instance) => Ok(vec![instance.clone()]),
            Resolved::Many(instances) => Ok(instances.clone()),
            Resolved::Missing => Ok(Vec::new()),
            Resolved::Lazy(_) => Err(DiError::TypeMismatch(std::any::type_name::<T>())),
        }
    }
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolved::One(_) => f.write_str("One(..)"),
            Resolved::Many(items) => write!(f, "Many({} items)", items.len()),
            Resolved::Lazy(lazy) => write!(f, "Lazy({})", lazy.token()),
            Resolved::Missing => f.write_str("Missing"),
        }
    }
}

/// Ordered dependency values, matching a binding's declared dependency list.
///
/// Accessors are indexed by declaration position and check the stored type.
///
/// ```rust
/// use ferrous_injector::{Dependencies, Dependency, Token};
///
/// let mut deps = Dependencies::default();
/// deps.push_value(Dependency::new(Token::named("PORT")), 8080u16);
///
/// assert_eq!(*deps.get::<u16>(0).unwrap(), 8080);
/// assert!(deps.get::<u16>(1).is_err());
/// ```
#[derive(Clone, Default, Debug)]
pub struct Dependencies {
    entries: Vec<(Dependency, Resolved)>,
}

impl Dependencies {
    pub(crate) fn new(entries: Vec<(Dependency, Resolved)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The declaration for position `index`.
    pub fn dependency(&self, index: usize) -> DiResult<&Dependency> {
        self.entry(index).map(|(dep, _)| dep)
    }

    /// The raw resolved value at `index`.
    pub fn resolved(&self, index: usize) -> DiResult<&Resolved> {
        self.entry(index).map(|(_, resolved)| resolved)
    }

    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        let (dep, resolved) = self.entry(index)?;
        match resolved {
            Resolved::Missing => Err(DiError::NoProvider {
                token: dep.token.display_name(),
                required_by: None,
            }),
            other => other.one(),
        }
    }

    pub fn get_trait<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        let (dep, resolved) = self.entry(index)?;
        match resolved {
            Resolved::Missing => Err(DiError::NoProvider {
                token: dep.token.display_name(),
                required_by: None,
            }),
            other => other.one_trait(),
        }
    }

    /// `None` when an optional dependency had no provider.
    pub fn optional<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Option<Arc<T>>> {
        match self.resolved(index)? {
            Resolved::Missing => Ok(None),
            other => other.one().map(Some),
        }
    }

    /// Every instance of a multi dependency, in registration order.
    pub fn all<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Vec<Arc<T>>> {
        self.resolved(index)?.many()
    }

    pub fn all_trait<T: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> DiResult<Vec<Arc<T>>> {
        self.resolved(index)?.many_trait()
    }

    /// Typed handle for a dependency declared with `InjectFlags::LAZY`.
    pub fn lazy<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Lazy<T>> {
        match self.resolved(index)? {
            Resolved::Lazy(handle) => Ok(Lazy::new(handle.clone())),
            _ => Err(DiError::TypeMismatch(std::any::type_name::<Lazy<T>>())),
        }
    }

    /// Substitutes the value at `index`, keeping its declaration.
    pub fn replace(&mut self, index: usize, resolved: Resolved) -> DiResult<Resolved> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(DiError::DependencyOutOfRange { index, len })?;
        Ok(std::mem::replace(&mut entry.1, resolved))
    }

    pub fn set_value<T: Send + Sync + 'static>(&mut self, index: usize, value: T) -> DiResult<()> {
        self.replace(index, Resolved::One(Arc::new(value))).map(|_| ())
    }

    /// Appends a value; useful when building dependencies by hand in tests.
    pub fn push_value<T: Send + Sync + 'static>(&mut self, dependency: Dependency, value: T) {
        self.entries
            .push((dependency, Resolved::One(Arc::new(value))));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Dependency, &Resolved)> {
        self.entries.iter().map(|(dep, resolved)| (dep, resolved))
    }

    fn entry(&self, index: usize) -> DiResult<&(Dependency, Resolved)> {
        self.entries.get(index).ok_or(DiError::DependencyOutOfRange {
            index,
            len: self.entries.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Token;

    fn sample() -> Dependencies {
        Dependencies::new(vec![
            (
                Dependency::new(Token::named("NAME")),
                Resolved::One(Arc::new(String::from("svc"))),
            ),
            (
                Dependency::new(Token::named("PLUGINS")),
                Resolved::Many(vec![Arc::new(1u8) as Instance, Arc::new(2u8)]),
            ),
            (Dependency::new(Token::named("CACHE")).optional(), Resolved::Missing),
        ])
    }

    #[test]
    fn typed_access_by_position() {
        let deps = sample();
        assert_eq!(deps.get::<String>(0).unwrap().as_str(), "svc");
        let plugins: Vec<u8> = deps.all::<u8>(1).unwrap().iter().map(|p| **p).collect();
        assert_eq!(plugins, vec![1, 2]);
        assert!(deps.optional::<u32>(2).unwrap().is_none());
        assert!(deps.all::<u32>(2).unwrap().is_empty());
    }

    #[test]
    fn errors_are_precise() {
        let deps = sample();
        assert!(matches!(deps.get::<u32>(0), Err(DiError::TypeMismatch(_))));
        assert!(matches!(
            deps.get::<u32>(2),
            Err(DiError::NoProvider { token: "CACHE", .. })
        ));
        assert!(matches!(
            deps.get::<u32>(9),
            Err(DiError::DependencyOutOfRange { index: 9, len: 3 })
        ));
        assert!(matches!(deps.lazy::<String>(0), Err(DiError::TypeMismatch(_))));
    }

    #[test]
    fn substitution_keeps_declaration() {
        let mut deps = sample();
        deps.set_value(0, String::from("override")).unwrap();
        assert_eq!(deps.get::<String>(0).unwrap().as_str(), "override");
        assert_eq!(deps.dependency(0).unwrap().token, Token::named("NAME"));
        assert!(deps.set_value(5, 0u8).is_err());
    }
}
