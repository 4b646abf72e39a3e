//! # ferrous-injector
//!
//! Hierarchical, async dependency injection for Rust, in the style of
//! Angular's module injectors.
//!
//! ## Features
//!
//! - **Hierarchical injectors**: root, module, component and per-event context injectors
//! - **Four lifetimes**: Singleton, Scoped, Transient and Event
//! - **Async factories** with `before_resolution` / `after_resolution` hooks
//! - **Inject flags**: Optional, Self, SkipSelf, Host and Lazy
//! - **Circular dependency detection**: eager cycles fail with the full path; lazy edges are allowed
//! - **Module visibility**: imports see only what a module exports
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use ferrous_injector::{Injector, Lifetime, Provider, Resolver, Token};
//!
//! // Define your services
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ferrous_injector::DiResult<()> {
//! // Declare providers
//! let injector = Injector::create(
//!     vec![
//!         Provider::value(
//!             Token::of::<Database>(),
//!             Database { connection_string: "postgres://localhost".to_string() },
//!         ),
//!         Provider::factory(Token::of::<UserService>(), |deps| async move {
//!             Ok(UserService { db: deps.get::<Database>(0)? })
//!         })
//!         .deps([Token::of::<Database>()])
//!         .lifetime(Lifetime::Transient),
//!     ],
//!     None,
//!     None,
//! )?;
//!
//! // Resolve
//! let user_service = injector.get_type::<UserService>().await?;
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! # Ok(())
//! # }
//! ```
//!
//! ## Lifetimes
//!
//! - **Singleton**: Created once and shared across the injector hierarchy
//! - **Scoped**: Created once per owning injector, or once per context when resolved through one
//! - **Transient**: Created fresh on every resolution
//! - **Event**: Created once per [`ContextInjector`]; unavailable outside of one
//!
//! ## Modules and Contexts
//!
//! ```rust
//! use ferrous_injector::{
//!     InjectableRegistry, InjectorConfig, Lifetime, ModuleContainer, ModuleDefinition, Provider,
//!     ProviderScope, Resolver, Token,
//! };
//!
//! struct ChatModule;
//! struct Message(String);
//! struct Reply(String);
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ferrous_injector::DiResult<()> {
//! let container = ModuleContainer::new(vec![], InjectableRegistry::empty(), InjectorConfig::default())?;
//! let chat = container.register(
//!     ModuleDefinition::new(Token::of::<ChatModule>()).provider(
//!         Provider::factory(Token::of::<Reply>(), |deps| async move {
//!             let message = deps.get::<Message>(0)?;
//!             Ok(Reply(format!("echo: {}", message.0)))
//!         })
//!         .deps([Token::of::<Message>()])
//!         .lifetime(Lifetime::Event)
//!         .scope(ProviderScope::Context),
//!     ),
//! )?;
//!
//! // One context per inbound event
//! let context = chat.create_context(vec![Provider::value(Token::of::<Message>(), Message("hi".into()))])?;
//! let reply = context.get_type::<Reply>().await?;
//! assert_eq!(reply.0, "echo: hi");
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod config;
pub mod descriptors;
pub mod error;
pub mod flags;
pub mod injector;
pub mod lifetime;
pub mod module;
pub mod token;
pub mod traits;
pub mod validation;

mod binding;
mod dependencies;
mod internal;
mod lazy;
mod provider;

// Re-exports
pub use binding::Instance;
pub use config::{ConfigSource, ConfigValue, EnvironmentConfigSource, InjectorConfig, MapConfigSource};
pub use dependencies::{Dependencies, Resolved};
pub use descriptors::BindingDescriptor;
pub use error::{BoxError, DiError, DiResult};
pub use flags::{Dependency, InjectFlags};
pub use injector::{ContextInjector, GetOptions, Injector, InjectorKind, Inquirer, WeakInjector};
pub use lazy::{Lazy, LazyRef};
pub use lifetime::{InjectableOptions, InjectableRegistry, InjectableRegistryBuilder, Lifetime, ProviderScope};
pub use module::{ComponentDefinition, ComponentRef, ModuleContainer, ModuleDefinition, ModuleRef};
pub use provider::Provider;
pub use token::Token;
pub use traits::{Injectable, Resolver, ResolverCore};
pub use validation::{ValidationError, ValidationResult, ValidationWarning};
