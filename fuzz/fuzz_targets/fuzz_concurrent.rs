#![no_main]

//! Fuzz target for concurrent container operations
//!
//! Threads race on resolving the same identifiers; every singleton must be
//! built once and shared by all of them.

use arbitrary::Arbitrary;
use component_container::{Container, Factory, Options, Resolved};
use libfuzzer_sys::fuzz_target;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const IDS: [&str; 4] = ["db:main", "cache:main", "service:users", "service:orders"];

/// Thread operation
#[derive(Debug, Clone, Arbitrary)]
enum ThreadOp {
    Resolve(u8),
    FactoryFor(u8),
    Contains(u8),
}

/// Concurrent test scenario
#[derive(Debug, Arbitrary)]
struct ConcurrentScenario {
    // Which identifiers are transient
    transient: [bool; 4],
    // Which identifiers use extendable factories
    extendable: [bool; 4],
    // Number of threads (clamped to 2-8)
    thread_count: u8,
    // Operations per thread (clamped)
    ops_per_thread: Vec<ThreadOp>,
}

fuzz_target!(|scenario: ConcurrentScenario| {
    let calls: Arc<[AtomicUsize; 4]> = Arc::new(Default::default());
    let container = Container::new();

    for (i, id) in IDS.iter().enumerate() {
        let counter = Arc::clone(&calls);
        let build = move |props: &component_container::Properties| {
            counter[i].fetch_add(1, Ordering::SeqCst);
            props.len()
        };
        let factory = if scenario.extendable[i] {
            Factory::extendable(move |props, _| build(props))
        } else {
            Factory::constructor(move |props, _| build(props))
        };
        let options = if scenario.transient[i] {
            Options::transient()
        } else {
            Options::new()
        };
        container.register_with(id, factory, options);
    }

    // Acyclic: services depend on the db and the cache
    container.inject("service", "db", "db:main");
    container.inject("service:users", "cache", "cache:main");

    let thread_count = (scenario.thread_count % 7 + 2) as usize;
    let ops: Vec<ThreadOp> = scenario.ops_per_thread.into_iter().take(50).collect();
    let barrier = Arc::new(Barrier::new(thread_count));

    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let container = container.clone();
            let barrier = Arc::clone(&barrier);
            let ops = ops.clone();

            thread::spawn(move || {
                barrier.wait();
                let mut seen: Vec<(usize, Resolved)> = Vec::new();
                for op in ops {
                    match op {
                        ThreadOp::Resolve(i) => {
                            let i = i as usize % IDS.len();
                            let resolved = container
                                .resolve(IDS[i])
                                .expect("acyclic injections resolve")
                                .expect("registered");
                            seen.push((i, resolved));
                        }
                        ThreadOp::FactoryFor(i) => {
                            let factory = container.factory_for(IDS[i as usize % IDS.len()]);
                            assert!(factory.expect("acyclic injections resolve").is_some());
                        }
                        ThreadOp::Contains(i) => {
                            assert!(container.contains(IDS[i as usize % IDS.len()]));
                        }
                    }
                }
                seen
            })
        })
        .collect();

    let results: Vec<Vec<(usize, Resolved)>> = handles
        .into_iter()
        .map(|h| h.join().expect("no panics in worker"))
        .collect();

    // Every singleton was built at most once and shared by every caller
    for (i, id) in IDS.iter().enumerate() {
        if scenario.transient[i] {
            continue;
        }
        assert!(calls[i].load(Ordering::SeqCst) <= 1, "{id} built more than once");

        if let Some(cached) = results.iter().flatten().find(|(j, _)| *j == i) {
            for (_, other) in results.iter().flatten().filter(|(j, _)| *j == i) {
                assert!(cached.1.ptr_eq(other));
            }
        }
    }
});
