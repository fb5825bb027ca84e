use courier_core::Event;
use courier_dispatch::{Dispatcher, ListenerRegistry};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn bench_registry(c: &mut Criterion) {
    let registry = ListenerRegistry::new();

    // Spread 1,000 listeners over 100 targets and 10 event names.
    for i in 0..1_000 {
        registry.add_listener(
            format!("win{}", i % 100),
            format!("event{}", i % 10),
            Arc::new(|_: &Event| false),
        );
    }

    let mut group = c.benchmark_group("Listener Registry");

    group.bench_function("Lookup (populated bucket)", |b| {
        b.iter(|| black_box(registry.lookup("win42", "event2").len()));
    });

    group.bench_function("Lookup (unknown pair)", |b| {
        b.iter(|| black_box(registry.lookup("missing", "event2").len()));
    });

    group.bench_function("Add + Remove", |b| {
        b.iter(|| {
            let id = registry.add_listener("bench", "tick", Arc::new(|_: &Event| false));
            black_box(registry.remove_listener("bench", "tick", id));
        });
    });

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let dispatcher = Dispatcher::default();
    let delivered = Arc::new(AtomicU64::new(0));
    for _ in 0..4 {
        let delivered = Arc::clone(&delivered);
        dispatcher.add_listener("win1", "tick", move |_| {
            delivered.fetch_add(1, Ordering::Relaxed);
            false
        });
    }
    dispatcher
        .start()
        .expect("dispatch thread should spawn for the benchmark");

    let mut group = c.benchmark_group("Dispatcher");

    group.bench_function("Rendezvous dispatch (4 listeners)", |b| {
        b.iter(|| dispatcher.dispatch(Event::new("win1", "tick")));
    });

    group.bench_function("Rendezvous dispatch (no listeners)", |b| {
        b.iter(|| dispatcher.dispatch(Event::new("win2", "tick")));
    });

    group.finish();
    dispatcher.close();
    black_box(delivered.load(Ordering::Relaxed));
}

criterion_group!(benches, bench_registry, bench_dispatch);
criterion_main!(benches);
