//! Types that know how to build themselves from resolved dependencies.

use async_trait::async_trait;

use crate::injector::Inquirer;
use crate::{Dependencies, Dependency, DiResult, Injector};

/// A type the container can construct, registered with
/// [`Provider::class`](crate::Provider::class).
///
/// `dependencies` lists what `construct` receives, in order. The two hooks
/// default to no-ops.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use ferrous_injector::{Dependencies, Dependency, DiResult, Injectable, Injector, Provider, Resolver, Token};
///
/// struct Settings { greeting: &'static str }
/// struct Greeter { settings: Arc<Settings> }
///
/// #[async_trait]
/// impl Injectable for Greeter {
///     fn dependencies() -> Vec<Dependency> {
///         vec![Dependency::of::<Settings>()]
///     }
///
///     async fn construct(deps: Dependencies) -> DiResult<Self> {
///         Ok(Greeter { settings: deps.get(0)? })
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> DiResult<()> {
/// let injector = Injector::create(
///     vec![
///         Provider::value(Token::of::<Settings>(), Settings { greeting: "hi" }),
///         Provider::class::<Greeter>(),
///     ],
///     None,
///     None,
/// )?;
/// assert_eq!(injector.get_type::<Greeter>().await?.settings.greeting, "hi");
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Injectable: Sized + Send + Sync + 'static {
    fn dependencies() -> Vec<Dependency> {
        Vec::new()
    }

    async fn construct(deps: Dependencies) -> DiResult<Self>;

    /// Runs before `construct`; the returned list is what `construct` receives.
    ///
    /// `inquirer` identifies the binding that asked for this one.
    async fn before_resolution(
        injector: Injector,
        deps: Dependencies,
        inquirer: Inquirer,
    ) -> DiResult<Dependencies> {
        let _ = (injector, inquirer);
        Ok(deps)
    }

    /// Runs once the instance exists and before it is cached.
    async fn after_resolution(&self, injector: &Injector) -> DiResult<()> {
        let _ = injector;
        Ok(())
    }
}
