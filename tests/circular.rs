use ferrous_injector::{
    ContextInjector, Dependency, DiError, InjectableRegistry, Injector, InjectorConfig, Lazy,
    Lifetime, Provider, Resolver, Token,
};
use std::sync::Arc;

const A: Token = Token::named("A");
const B: Token = Token::named("B");
const C: Token = Token::named("C");

struct NodeA {
    b: Lazy<NodeB>,
}

struct NodeB {
    a: Arc<NodeA>,
}

#[tokio::test]
async fn eager_cycle_reports_full_path() {
    let injector = Injector::create(
        vec![
            Provider::factory(A, |_| async { Ok(()) }).deps([B]),
            Provider::factory(B, |_| async { Ok(()) }).deps([A]),
        ],
        None,
        None,
    )
    .unwrap();

    match injector.get::<()>(A).await {
        Err(DiError::Circular(path)) => assert_eq!(path, vec!["A", "B", "A"]),
        other => panic!("Expected Circular error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn self_dependency_is_circular() {
    let injector = Injector::create(
        vec![Provider::factory(A, |_| async { Ok(()) })
            .deps([A])
            .lifetime(Lifetime::Transient)],
        None,
        None,
    )
    .unwrap();

    assert!(matches!(
        injector.get::<()>(A).await,
        Err(DiError::Circular(path)) if path == vec!["A", "A"]
    ));
}

fn lazy_pair() -> Vec<Provider> {
    vec![
        Provider::factory(A, |deps| async move {
            Ok(NodeA {
                b: deps.lazy::<NodeB>(0)?,
            })
        })
        .deps([Dependency::new(B).lazy()]),
        Provider::factory(B, |deps| async move {
            Ok(NodeB {
                a: deps.get::<NodeA>(0)?,
            })
        })
        .deps([A]),
    ]
}

#[tokio::test]
async fn lazy_edge_allows_mutual_references() {
    let injector = Injector::create(lazy_pair(), None, None).unwrap();

    let a = injector.get::<NodeA>(A).await.unwrap();
    assert!(!a.b.is_resolved());

    let b = a.b.get().await.unwrap();
    assert!(Arc::ptr_eq(&b.a, &a));
    assert!(a.b.is_resolved());

    // second access hits the handle's cache
    let again = a.b.get().await.unwrap();
    assert!(Arc::ptr_eq(&b, &again));
}

#[tokio::test]
async fn lazy_handle_outlives_the_context_it_was_created_in() {
    let root = Injector::create(lazy_pair(), None, None).unwrap();
    let context = ContextInjector::create(&root, vec![]).unwrap();
    let a = context.get::<NodeA>(A).await.unwrap();
    drop(context);

    let b = a.b.get().await.unwrap();
    assert!(Arc::ptr_eq(&b.a, &a));
    assert!(Arc::ptr_eq(&root.get::<NodeA>(A).await.unwrap(), &a));
}

#[tokio::test]
async fn lazy_event_target_needs_a_live_context() {
    const EVENT: Token = Token::named("EVENT");

    struct Listener {
        event: Lazy<u32>,
    }

    let root = Injector::create(
        vec![
            Provider::factory(A, |deps| async move {
                Ok(Listener {
                    event: deps.lazy::<u32>(0)?,
                })
            })
            .deps([Dependency::new(EVENT).lazy()])
            .lifetime(Lifetime::Transient),
            Provider::factory(EVENT, |_| async { Ok(7u32) }).lifetime(Lifetime::Event),
        ],
        None,
        None,
    )
    .unwrap();

    let context = ContextInjector::create(&root, vec![]).unwrap();
    let live = context.get::<Listener>(A).await.unwrap();
    assert_eq!(*live.event.get().await.unwrap(), 7);

    let stale = context.get::<Listener>(A).await.unwrap();
    drop(context);
    assert!(matches!(stale.event.get().await, Err(DiError::InvalidScope("EVENT"))));
}

#[tokio::test]
async fn forcing_lazy_inside_factory_closes_the_cycle() {
    let injector = Injector::create(
        vec![
            Provider::factory(A, |deps| async move {
                let b = deps.lazy::<NodeB>(0)?;
                b.get().await?;
                Ok(NodeA { b })
            })
            .deps([Dependency::new(B).lazy()]),
            Provider::factory(B, |deps| async move {
                Ok(NodeB {
                    a: deps.get::<NodeA>(0)?,
                })
            })
            .deps([A]),
        ],
        None,
        None,
    )
    .unwrap();

    match injector.get::<NodeA>(A).await {
        Err(DiError::Circular(path)) => assert_eq!(path, vec!["A", "B", "A"]),
        other => panic!("Expected Circular error, got ok={}", other.is_ok()),
    }
}

#[tokio::test]
async fn top_level_get_inside_hook_extends_the_chain() {
    let injector = Injector::create(
        vec![Provider::factory(A, |_| async { Ok(()) }).before_resolution(
            |injector, deps, _inquirer| async move {
                injector.get::<()>(A).await?;
                Ok(deps)
            },
        )],
        None,
        None,
    )
    .unwrap();

    assert!(matches!(
        injector.get::<()>(A).await,
        Err(DiError::Circular(path)) if path == vec!["A", "A"]
    ));
}

#[tokio::test]
async fn depth_limit_is_enforced() {
    let config = InjectorConfig::default().with_max_depth(2);
    let injector = Injector::create_root(
        vec![
            Provider::factory(A, |_| async { Ok(()) }).deps([B]),
            Provider::factory(B, |_| async { Ok(()) }).deps([C]),
            Provider::factory(C, |_| async { Ok(()) }),
        ],
        InjectableRegistry::empty(),
        config,
    )
    .unwrap();

    assert!(matches!(
        injector.get::<()>(A).await,
        Err(DiError::DepthExceeded(2))
    ));
    // a shorter chain still fits
    assert!(injector.get::<()>(B).await.is_ok());
}

#[tokio::test]
async fn concurrent_resolutions_do_not_share_chains() {
    let injector = Injector::create(
        vec![
            Provider::factory(A, |_| async {
                tokio::task::yield_now().await;
                Ok(())
            })
            .lifetime(Lifetime::Transient),
            Provider::factory(B, |_| async { Ok(()) })
                .deps([A])
                .lifetime(Lifetime::Transient),
        ],
        None,
        None,
    )
    .unwrap();

    let (a, b) = tokio::join!(injector.get::<()>(A), injector.get::<()>(B));
    assert!(a.is_ok());
    assert!(b.is_ok());
}
