//! Concurrent access tests
//!
//! These verify that first resolutions racing on one cache slot are
//! coalesced into a single factory run, and that the behavior can be
//! switched off through `InjectorConfig`.

use ferrous_injector::{
    ContextInjector, InjectableRegistry, Injector, InjectorConfig, Lifetime, Provider, Resolver,
    Token,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const SLOW: Token = Token::named("SLOW");

fn slow_provider(lifetime: Lifetime, calls: &Arc<AtomicUsize>) -> Provider {
    let calls = calls.clone();
    Provider::factory(SLOW, move |_| {
        let calls = calls.clone();
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(n)
        }
    })
    .lifetime(lifetime)
}

#[tokio::test]
async fn concurrent_first_resolutions_share_one_factory_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let injector = Injector::create(vec![slow_provider(Lifetime::Singleton, &calls)], None, None).unwrap();

    let (a, b, c) = tokio::join!(
        injector.get::<usize>(SLOW),
        injector.get::<usize>(SLOW),
        injector.get::<usize>(SLOW)
    );

    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn without_coalescing_each_racer_constructs() {
    let calls = Arc::new(AtomicUsize::new(0));
    let injector = Injector::create_root(
        vec![slow_provider(Lifetime::Singleton, &calls)],
        InjectableRegistry::empty(),
        InjectorConfig::default().with_coalesce_in_flight(false),
    )
    .unwrap();

    let (a, b) = tokio::join!(injector.get::<usize>(SLOW), injector.get::<usize>(SLOW));
    a.unwrap();
    b.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // the last stored instance is served afterwards
    let cached = injector.get::<usize>(SLOW).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(*cached < 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn singleton_is_consistent_across_tasks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let injector = Injector::create(vec![slow_provider(Lifetime::Singleton, &calls)], None, None).unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let injector = injector.clone();
            tokio::spawn(async move { injector.get::<usize>(SLOW).await })
        })
        .collect();

    let mut instances = Vec::new();
    for handle in handles {
        instances.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|i| Arc::ptr_eq(i, &instances[0])));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn contexts_are_isolated_across_tasks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let root = Injector::create(vec![slow_provider(Lifetime::Event, &calls)], None, None).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let root = root.clone();
            tokio::spawn(async move {
                let context = ContextInjector::create(&root, vec![])?;
                let (a, b) = tokio::join!(context.get::<usize>(SLOW), context.get::<usize>(SLOW));
                let (a, b) = (a?, b?);
                assert!(Arc::ptr_eq(&a, &b));
                Ok::<_, ferrous_injector::DiError>(*a)
            })
        })
        .collect();

    let mut seen = Vec::new();
    for handle in handles {
        seen.push(handle.await.unwrap().unwrap());
    }
    seen.sort_unstable();
    seen.dedup();

    assert_eq!(seen.len(), 8);
    assert_eq!(calls.load(Ordering::SeqCst), 8);
    // every context was dropped inside its task
    assert_eq!(root.cached_instances(), 0);
}
