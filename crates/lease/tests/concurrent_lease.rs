//! Concurrent leasing tests
//!
//! Allocators on different threads that share a pool must never push it past
//! its capacity.

use std::sync::Barrier;
use std::thread;

use pretty_assertions::assert_eq;
use valet_lease::{Allocator, Error, Pool};

const THREADS: usize = 8;
const ROUNDS: usize = 500;

#[test]
fn racing_allocators_never_oversubscribe_a_shared_pool() {
    for _ in 0..ROUNDS {
        let shared: Pool<usize> = Pool::new(1).unwrap();
        let barrier = Barrier::new(THREADS);

        let outcomes: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|n| {
                    let allocator = Allocator::sequential([shared.clone()]);
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        allocator.lease(n)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let leased = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(leased, 1);
        assert!(
            outcomes
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|err| *err == Error::CapacityExhausted)
        );
        assert_eq!(shared.occupied_count(), 1);
    }
}

#[test]
fn racing_allocators_fill_larger_pools_exactly() {
    let pools: Vec<Pool<usize>> = vec![Pool::new(3).unwrap(), Pool::new(2).unwrap()];
    let barrier = Barrier::new(THREADS);

    let leased: usize = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|n| {
                let allocator = Allocator::most_available(pools.clone());
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    (0..4).filter(|i| allocator.lease(n * 4 + i).is_ok()).count()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(leased, 5);
    assert!(pools.iter().all(|pool| pool.occupied_count() == pool.capacity()));
}
