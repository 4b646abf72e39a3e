use ferrous_injector::{
    Dependency, InjectableRegistry, Injector, InjectorConfig, Lifetime, ModuleContainer,
    ModuleDefinition, Provider, ProviderScope, Token, ValidationError,
};

const CONFIG: Token = Token::named("CONFIG");
const REPOSITORY: Token = Token::named("REPOSITORY");
const REQUEST: Token = Token::named("REQUEST");
const HANDLERS: Token = Token::named("HANDLERS");

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn descriptors_describe_multi_bindings_in_order() {
    let injector = Injector::create(
        vec![
            Provider::value(HANDLERS, "first").multi(),
            Provider::factory(HANDLERS, |_| async { Ok("second") })
                .multi()
                .lifetime(Lifetime::Transient),
            Provider::value(CONFIG, 1u8),
        ],
        None,
        None,
    )
    .unwrap();

    let descriptors = injector.descriptors();
    let kinds: Vec<(&str, &str)> = descriptors.iter().map(|d| (d.type_name(), d.kind)).collect();
    assert_eq!(
        kinds,
        vec![("CONFIG", "value"), ("HANDLERS", "value"), ("HANDLERS", "factory")]
    );
    assert!(descriptors[1].multi);
    assert_eq!(descriptors[2].lifetime, Lifetime::Transient);
    assert!(descriptors.iter().all(|d| d.injector == "root"));
}

#[test]
fn re_exports_show_up_as_forward_bindings() {
    init_tracing();
    let container =
        ModuleContainer::new(vec![], InjectableRegistry::empty(), InjectorConfig::default()).unwrap();
    let shared = ModuleDefinition::new(Token::named("SharedModule"))
        .provider(Provider::value(CONFIG, 1u8).scope(ProviderScope::Module))
        .export(CONFIG);
    let app = container
        .register(ModuleDefinition::new(Token::named("AppModule")).import(shared))
        .unwrap();

    let descriptors = app.injector().descriptors();
    assert_eq!(descriptors.len(), 1);
    assert_eq!(descriptors[0].kind, "forward");
    assert_eq!(descriptors[0].injector, "AppModule");
    assert!(container.validate().is_valid());
}

#[test]
fn singleton_capturing_scoped_dependency_is_an_error() {
    init_tracing();
    let injector = Injector::create(
        vec![
            Provider::factory(REPOSITORY, |_| async { Ok(()) }).deps([REQUEST]),
            Provider::factory(REQUEST, |_| async { Ok(()) }).lifetime(Lifetime::Scoped),
        ],
        None,
        None,
    )
    .unwrap();

    let result = injector.validate();
    assert_eq!(
        result.errors,
        vec![ValidationError::SingletonDependsOnScoped {
            singleton: "REPOSITORY",
            scoped: "REQUEST",
            lifetime: Lifetime::Scoped,
        }]
    );
}

#[test]
fn lazy_dependency_on_scoped_is_allowed() {
    let injector = Injector::create(
        vec![
            Provider::factory(REPOSITORY, |_| async { Ok(()) })
                .deps([Dependency::new(REQUEST).lazy()]),
            Provider::factory(REQUEST, |_| async { Ok(()) }).lifetime(Lifetime::Event),
        ],
        None,
        None,
    )
    .unwrap();

    assert!(injector.validate().is_valid());
}

#[test]
fn validation_looks_through_parents() {
    let root = Injector::create(vec![Provider::value(CONFIG, 1u8)], None, None).unwrap();
    let child = Injector::create(
        vec![
            Provider::factory(REPOSITORY, |_| async { Ok(()) }).deps([CONFIG]),
            Provider::factory(REQUEST, |_| async { Ok(()) }).deps([Dependency::new(CONFIG).self_only()]),
        ],
        Some(&root),
        None,
    )
    .unwrap();

    assert_eq!(
        child.validate().errors,
        vec![ValidationError::MissingDependency {
            service: "REQUEST",
            dependency: "CONFIG",
        }]
    );
}

#[cfg(feature = "config")]
#[test]
fn config_round_trips_through_json() {
    let config: InjectorConfig = serde_json::from_str(r#"{"max_depth": 16}"#).unwrap();
    assert_eq!(config.max_depth, 16);
    assert!(config.coalesce_in_flight);

    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["coalesce_in_flight"], serde_json::Value::Bool(true));
}
