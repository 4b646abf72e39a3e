//! Resolver traits for token resolution.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{DiError, DiResult};
use crate::injector::{ContextInjector, GetOptions};
use crate::{InjectFlags, Resolved, Token};

/// Core resolver trait for object-safe resolution.
///
/// This trait provides the fundamental resolution capability that is object
/// safe (it can be used as a trait object). Implementations return the raw
/// [`Resolved`] value; cycle detection, flag handling and caching all happen
/// in the injector behind it.
///
/// Most users should use the [`Resolver`] trait instead, which provides more
/// ergonomic generic methods built on top of this trait.
#[async_trait]
pub trait ResolverCore: Send + Sync {
    /// Resolves `token` with the given options.
    ///
    /// # Returns
    ///
    /// * `Ok(Resolved)` - The resolved value, or `Resolved::Missing` for an
    ///   optional token without a provider
    /// * `Err(DiError)` - Resolution error (not found, circular, invalid scope, etc.)
    async fn resolve(&self, token: Token, options: GetOptions) -> DiResult<Resolved>;
}

/// High-level resolver interface with generic methods for type-safe resolution.
///
/// This trait builds on [`ResolverCore`] to offer typed methods that handle
/// type erasure and downcasting internally. [`Injector`](crate::Injector),
/// [`ContextInjector`], [`ModuleRef`](crate::ModuleRef) and
/// [`ComponentRef`](crate::ComponentRef) all implement it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ferrous_injector::{Injector, Provider, Resolver, Token};
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String {
///         format!("LOG: {}", msg)
///     }
/// }
///
/// const LOGGER: Token = Token::named("LOGGER");
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ferrous_injector::DiResult<()> {
/// let injector = Injector::create(
///     vec![
///         Provider::value(Token::of::<usize>(), 42usize),
///         Provider::value_trait(LOGGER, Arc::new(ConsoleLogger) as Arc<dyn Logger>),
///     ],
///     None,
///     None,
/// )?;
///
/// // Resolve concrete types
/// let number = injector.get_type::<usize>().await?;
/// assert_eq!(*number, 42);
///
/// // Resolve trait objects
/// let logger = injector.get_trait::<dyn Logger>(LOGGER).await?;
/// assert_eq!(logger.log("resolved"), "LOG: resolved");
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Resolver: ResolverCore {
    /// Resolves `token` to a concrete type.
    ///
    /// # Type Parameters
    ///
    /// * `T` - The type stored under `token`
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<T>)` - The resolved instance
    /// * `Err(DiError)` - Resolution error, or `TypeMismatch` when `token`
    ///   holds a different type or is a multi token
    async fn get<T: Send + Sync + 'static>(&self, token: Token) -> DiResult<Arc<T>> {
        self.resolve(token, GetOptions::new()).await?.one()
    }

    /// Resolves the type token of `T`.
    ///
    /// Shorthand for `get::<T>(Token::of::<T>())`.
    async fn get_type<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get::<T>(Token::of::<T>()).await
    }

    /// Resolves `token`, returning `None` when nothing provides it.
    ///
    /// Only a missing provider for `token` itself becomes `None`; a missing
    /// dependency further down is still an error.
    async fn get_optional<T: Send + Sync + 'static>(&self, token: Token) -> DiResult<Option<Arc<T>>> {
        match self
            .resolve(token, GetOptions::new().flags(InjectFlags::OPTIONAL))
            .await?
        {
            Resolved::Missing => Ok(None),
            resolved => resolved.one().map(Some),
        }
    }

    /// Resolves `token`, falling back to `default` when nothing provides it.
    async fn get_or<T: Send + Sync + 'static>(&self, token: Token, default: Arc<T>) -> DiResult<Arc<T>> {
        self.resolve(token, GetOptions::new().not_found_instance(default))
            .await?
            .one()
    }

    /// Resolves every binding of a multi token, in registration order.
    ///
    /// A token with a single binding yields one element; a token with no
    /// provider yields an empty list.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_injector::{Injector, Provider, Resolver, Token};
    ///
    /// const PLUGINS: Token = Token::named("PLUGINS");
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> ferrous_injector::DiResult<()> {
    /// let injector = Injector::create(
    ///     vec![
    ///         Provider::value(PLUGINS, "auth").multi(),
    ///         Provider::value(PLUGINS, "cache").multi(),
    ///     ],
    ///     None,
    ///     None,
    /// )?;
    ///
    /// let names: Vec<&str> = injector.get_all::<&str>(PLUGINS).await?.iter().map(|n| **n).collect();
    /// assert_eq!(names, vec!["auth", "cache"]);
    /// # Ok(())
    /// # }
    /// ```
    async fn get_all<T: Send + Sync + 'static>(&self, token: Token) -> DiResult<Vec<Arc<T>>> {
        self.resolve(token, GetOptions::new().flags(InjectFlags::OPTIONAL))
            .await?
            .many()
    }

    /// Resolves a trait object stored with
    /// [`Provider::value_trait`](crate::Provider::value_trait) or
    /// [`Provider::factory_trait`](crate::Provider::factory_trait).
    async fn get_trait<T: ?Sized + Send + Sync + 'static>(&self, token: Token) -> DiResult<Arc<T>> {
        self.resolve(token, GetOptions::new()).await?.one_trait()
    }

    /// Resolves every trait object bound under a multi token.
    async fn get_all_trait<T: ?Sized + Send + Sync + 'static>(
        &self,
        token: Token,
    ) -> DiResult<Vec<Arc<T>>> {
        self.resolve(token, GetOptions::new().flags(InjectFlags::OPTIONAL))
            .await?
            .many_trait()
    }

    /// Resolves `token` with explicit traversal flags.
    ///
    /// Returns `None` when `flags` contains `OPTIONAL` and nothing provides
    /// the token on the restricted search path.
    async fn get_with_flags<T: Send + Sync + 'static>(
        &self,
        token: Token,
        flags: InjectFlags,
    ) -> DiResult<Option<Arc<T>>> {
        if flags.is_lazy() {
            return Err(DiError::TypeMismatch("lazy flag on a direct request"));
        }
        match self.resolve(token, GetOptions::new().flags(flags)).await? {
            Resolved::Missing => Ok(None),
            resolved => resolved.one().map(Some),
        }
    }

    /// Resolves `token` through this resolver while `context` is active.
    ///
    /// Scoped bindings get the context's instance and Event bindings become
    /// resolvable, even when they live in an ancestor of the context.
    async fn get_in_context<T: Send + Sync + 'static>(
        &self,
        token: Token,
        context: &ContextInjector,
    ) -> DiResult<Arc<T>> {
        self.resolve(token, GetOptions::new().context(context))
            .await?
            .one()
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
