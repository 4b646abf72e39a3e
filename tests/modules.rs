use ferrous_injector::{
    ComponentDefinition, DiError, InjectableOptions, InjectableRegistry, InjectorConfig, Lifetime,
    ModuleContainer, ModuleDefinition, Provider, ProviderScope, Resolver, Token,
};
use std::sync::Arc;

// ===== Test Services =====

struct DatabaseModule;
struct AppModule;
struct ChatModule;

struct Pool {
    url: &'static str,
}

struct Secret;

struct Handler;
struct Sidebar;

const REQUEST: Token = Token::named("REQUEST");
const GREETING: Token = Token::named("GREETING");
const WIDGET_STATE: Token = Token::named("WIDGET_STATE");

fn container() -> ModuleContainer {
    ModuleContainer::new(vec![], InjectableRegistry::empty(), InjectorConfig::default()).unwrap()
}

fn database_module() -> ModuleDefinition {
    ModuleDefinition::new(Token::of::<DatabaseModule>())
        .provider(
            Provider::factory(Token::of::<Pool>(), |_| async {
                Ok(Pool {
                    url: "postgres://localhost",
                })
            })
            .scope(ProviderScope::Module),
        )
        .provider(Provider::value(Token::of::<Secret>(), Secret).scope(ProviderScope::Module))
        .export(Token::of::<Pool>())
}

// ===== Visibility =====

#[tokio::test]
async fn imports_see_only_exports() {
    let container = container();
    let app = container
        .register(ModuleDefinition::new(Token::of::<AppModule>()).import(database_module()))
        .unwrap();
    let database = container.module(Token::of::<DatabaseModule>()).unwrap();

    let from_app = app.get_type::<Pool>().await.unwrap();
    let from_database = database.get_type::<Pool>().await.unwrap();
    assert_eq!(from_app.url, "postgres://localhost");
    assert!(Arc::ptr_eq(&from_app, &from_database));

    assert!(app.get_optional::<Secret>(Token::of::<Secret>()).await.unwrap().is_none());
    assert!(database.get_optional::<Secret>(Token::of::<Secret>()).await.unwrap().is_some());
    assert!(container.root().get_optional::<Pool>(Token::of::<Pool>()).await.unwrap().is_none());
}

#[tokio::test]
async fn local_provider_wins_over_import() {
    let container = container();
    let app = container
        .register(
            ModuleDefinition::new(Token::of::<AppModule>())
                .import(database_module())
                .provider(
                    Provider::value(Token::of::<Pool>(), Pool { url: "sqlite::memory:" })
                        .scope(ProviderScope::Module),
                ),
        )
        .unwrap();

    assert_eq!(app.get_type::<Pool>().await.unwrap().url, "sqlite::memory:");
}

#[tokio::test]
async fn root_scoped_providers_are_application_wide() {
    let container = container();
    container
        .register(
            ModuleDefinition::new(Token::of::<ChatModule>())
                .provider(Provider::value(GREETING, "hello")),
        )
        .unwrap();

    assert_eq!(*container.root().get::<&str>(GREETING).await.unwrap(), "hello");
}

#[tokio::test]
async fn registry_supplies_default_scope() {
    let registry = InjectableRegistry::builder()
        .register(
            Token::of::<Pool>(),
            InjectableOptions::new().scope(ProviderScope::Module),
        )
        .build();
    let container = ModuleContainer::new(vec![], registry, InjectorConfig::default()).unwrap();
    let database = container
        .register(ModuleDefinition::new(Token::of::<DatabaseModule>()).provider(
            Provider::value(Token::of::<Pool>(), Pool { url: "registry" }),
        ))
        .unwrap();

    assert!(database.injector().has_local(&Token::of::<Pool>()));
    assert!(!container.root().has(&Token::of::<Pool>()));
}

#[tokio::test]
async fn explicit_scope_targets_named_module() {
    let container = container();
    let database = container.register(database_module()).unwrap();
    container
        .register(
            ModuleDefinition::new(Token::of::<AppModule>()).provider(
                Provider::value(GREETING, "from app")
                    .scope(ProviderScope::Explicit(Token::of::<DatabaseModule>())),
            ),
        )
        .unwrap();

    assert_eq!(*database.get::<&str>(GREETING).await.unwrap(), "from app");
}

// ===== Registration errors =====

#[test]
fn unknown_explicit_module_is_rejected() {
    let err = container()
        .register(
            ModuleDefinition::new(Token::of::<AppModule>()).provider(
                Provider::value(GREETING, "hi").scope(ProviderScope::Explicit(Token::named("Nope"))),
            ),
        )
        .unwrap_err();
    assert!(matches!(err, DiError::UnknownModule("Nope")));
}

#[test]
fn exporting_unprovided_token_is_rejected() {
    let err = container()
        .register(ModuleDefinition::new(Token::named("Broken")).export(GREETING))
        .unwrap_err();
    assert!(matches!(
        err,
        DiError::UnknownExport {
            module: "Broken",
            token: "GREETING"
        }
    ));
}

#[test]
fn circular_imports_are_rejected() {
    let a = Token::named("ModuleA");
    let b = Token::named("ModuleB");
    let definition = ModuleDefinition::new(a).import(ModuleDefinition::new(b).import(ModuleDefinition::new(a)));

    match container().register(definition) {
        Err(DiError::CircularImport(chain)) => assert_eq!(chain, vec!["ModuleA", "ModuleB", "ModuleA"]),
        other => panic!("Expected CircularImport, got {:?}", other.map(|m| m.metatype())),
    }
}

#[test]
fn failed_registration_binds_nothing_and_can_be_retried() {
    const CACHE: Token = Token::named("CACHE");
    let container = container();
    let database = container.register(database_module()).unwrap();

    let app = || {
        ModuleDefinition::new(Token::of::<AppModule>())
            .provider(
                Provider::value(CACHE, "lru").scope(ProviderScope::Explicit(Token::of::<DatabaseModule>())),
            )
            .provider(Provider::value(GREETING, "hi"))
    };

    let err = container.register(app().export(REQUEST)).unwrap_err();
    assert!(matches!(err, DiError::UnknownExport { token: "REQUEST", .. }));
    assert!(!database.injector().has_local(&CACHE));
    assert!(!container.root().has_local(&GREETING));
    assert!(container.module(Token::of::<AppModule>()).is_none());

    container.register(app()).unwrap();
    assert!(database.injector().has_local(&CACHE));
    assert!(container.root().has_local(&GREETING));
}

#[test]
fn conflicting_shared_binding_rolls_back_earlier_ones() {
    const CACHE: Token = Token::named("CACHE");
    let container = ModuleContainer::new(
        vec![Provider::value(GREETING, "root")],
        InjectableRegistry::empty(),
        InjectorConfig::default(),
    )
    .unwrap();
    let database = container.register(database_module()).unwrap();

    let err = container
        .register(
            ModuleDefinition::new(Token::of::<AppModule>())
                .provider(
                    Provider::value(CACHE, "lru").scope(ProviderScope::Explicit(Token::of::<DatabaseModule>())),
                )
                .provider(Provider::value(GREETING, "hi").multi()),
        )
        .unwrap_err();

    assert!(matches!(err, DiError::MixedMultiProvider("GREETING")));
    assert!(!database.injector().has_local(&CACHE));
    assert_eq!(container.modules().len(), 1);
}

#[test]
fn modules_register_once_in_import_order() {
    let container = container();
    let first = container.register(database_module()).unwrap();
    container
        .register(ModuleDefinition::new(Token::of::<AppModule>()).import(database_module()))
        .unwrap();
    let again = container.register(database_module()).unwrap();

    assert!(first.injector().ptr_eq(again.injector()));
    let order: Vec<Token> = container.modules().iter().map(|m| m.metatype()).collect();
    assert_eq!(order, vec![Token::of::<DatabaseModule>(), Token::of::<AppModule>()]);
}

// ===== Components and contexts =====

fn chat_module() -> ModuleDefinition {
    ModuleDefinition::new(Token::of::<ChatModule>())
        .provider(
            Provider::factory(Token::of::<Handler>(), |_| async { Ok(Handler) })
                .lifetime(Lifetime::Event)
                .scope(ProviderScope::Context),
        )
        .component(
            ComponentDefinition::new(Token::of::<Sidebar>())
                .provider(Provider::value(WIDGET_STATE, 1u32).scope(ProviderScope::Component))
                .provider(Provider::value(GREETING, "component").scope(ProviderScope::Context)),
        )
        .component(ComponentDefinition::new(Token::named("Footer")))
}

#[tokio::test]
async fn component_tokens_stay_private() {
    let container = container();
    let chat = container.register(chat_module()).unwrap();
    let sidebar = chat.component(Token::of::<Sidebar>()).unwrap();
    let footer = chat.component(Token::named("Footer")).unwrap();

    assert_eq!(*sidebar.get::<u32>(WIDGET_STATE).await.unwrap(), 1);
    assert!(chat.get_optional::<u32>(WIDGET_STATE).await.unwrap().is_none());
    assert!(footer.get_optional::<u32>(WIDGET_STATE).await.unwrap().is_none());
    assert_eq!(sidebar.module(), Token::of::<ChatModule>());
}

#[tokio::test]
async fn context_providers_are_bound_per_context() {
    let container = container();
    let chat = container.register(chat_module()).unwrap();

    // context-scoped providers never land in a standing injector
    assert!(!chat.injector().has(&Token::of::<Handler>()));
    assert_eq!(chat.context_providers().len(), 1);

    let first = chat
        .create_context(vec![Provider::value(REQUEST, 1u64)])
        .unwrap();
    let second = chat
        .create_context(vec![Provider::value(REQUEST, 2u64)])
        .unwrap();

    let h1 = first.get_type::<Handler>().await.unwrap();
    let h1_again = first.get_type::<Handler>().await.unwrap();
    let h2 = second.get_type::<Handler>().await.unwrap();
    assert!(Arc::ptr_eq(&h1, &h1_again));
    assert!(!Arc::ptr_eq(&h1, &h2));
    assert_eq!(*first.get::<u64>(REQUEST).await.unwrap(), 1);
    assert_eq!(*second.get::<u64>(REQUEST).await.unwrap(), 2);
}

#[tokio::test]
async fn component_context_inherits_module_providers() {
    let container = container();
    let chat = container.register(chat_module()).unwrap();
    let sidebar = chat.component(Token::of::<Sidebar>()).unwrap();
    assert_eq!(sidebar.context_providers().len(), 2);

    let context = sidebar.create_context(vec![]).unwrap();
    assert!(context.get_type::<Handler>().await.is_ok());
    assert_eq!(*context.get::<&str>(GREETING).await.unwrap(), "component");
    assert_eq!(*context.get::<u32>(WIDGET_STATE).await.unwrap(), 1);

    // extra providers replace declared ones
    let overridden = sidebar
        .create_context(vec![Provider::value(GREETING, "override")])
        .unwrap();
    assert_eq!(*overridden.get::<&str>(GREETING).await.unwrap(), "override");
}

#[tokio::test]
async fn container_validation_covers_modules() {
    let container = container();
    container
        .register(
            ModuleDefinition::new(Token::of::<AppModule>()).provider(
                Provider::factory(GREETING, |_| async { Ok("hi") })
                    .deps([Token::named("MISSING")])
                    .scope(ProviderScope::Module),
            ),
        )
        .unwrap();

    let result = container.validate();
    assert!(!result.is_valid());
    assert!(result.format_issues().contains("'GREETING' depends on 'MISSING'"));
}
