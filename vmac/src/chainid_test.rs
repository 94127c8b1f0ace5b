// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Tests for the chain id allocator

concurrency::with_std! {
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::chainid::{ChainId, ChainIdAllocator, ChainUuid};
    use crate::errors::{InvalidParameter, VmacError};
    use crate::layout::VmacLayout;
    use concurrency::sync::Arc;
    use concurrency::thread;
    use std::collections::HashSet;
    use tracing_test::traced_test;

    #[test]
    fn get_or_allocate_is_idempotent() {
        let allocator = ChainIdAllocator::default();
        let chain = ChainUuid::new();
        let id = allocator.get_or_allocate(chain).unwrap();
        assert_eq!(allocator.get_or_allocate(chain).unwrap(), id);
        assert_eq!(allocator.available(), 255);
        assert_eq!(allocator.lookup(chain), Some(id));
    }

    #[test]
    fn distinct_chains_get_distinct_ids() {
        let allocator = ChainIdAllocator::default();
        let ids: HashSet<ChainId> = (0..100)
            .map(|_| allocator.get_or_allocate(ChainUuid::new()).unwrap())
            .collect();
        assert_eq!(ids.len(), 100);
        assert!(ids.iter().all(|id| allocator.is_in_use(*id)));
    }

    #[test]
    fn lowest_id_first() {
        let allocator = ChainIdAllocator::default();
        assert_eq!(
            allocator.get_or_allocate(ChainUuid::new()).unwrap(),
            ChainId::new(0)
        );
        assert_eq!(
            allocator.get_or_allocate(ChainUuid::new()).unwrap(),
            ChainId::new(1)
        );
    }

    #[test]
    #[traced_test]
    fn exhaustion() {
        let allocator = ChainIdAllocator::new(&VmacLayout::V1);
        for _ in 0..256 {
            allocator.get_or_allocate(ChainUuid::new()).unwrap();
        }
        assert_eq!(allocator.available(), 0);
        assert_eq!(
            allocator.get_or_allocate(ChainUuid::new()),
            Err(VmacError::ExhaustedPool(256))
        );
        assert!(logs_contain("No chain id left"));
        // nothing changed
        assert_eq!(allocator.available(), 0);
    }

    #[test]
    fn exhausted_pool_still_serves_bound_chains() {
        let allocator = ChainIdAllocator::with_capacity(1);
        let chain = ChainUuid::new();
        let id = allocator.get_or_allocate(chain).unwrap();
        assert!(allocator.get_or_allocate(ChainUuid::new()).is_err());
        assert_eq!(allocator.get_or_allocate(chain).unwrap(), id);
    }

    #[test]
    #[traced_test]
    fn double_release() {
        let allocator = ChainIdAllocator::default();
        let id = allocator.get_or_allocate(ChainUuid::new()).unwrap();
        allocator.release(id).unwrap();
        assert_eq!(allocator.release(id), Err(VmacError::DoubleRelease(id)));
        assert!(logs_contain("is not in use"));
        assert_eq!(allocator.available(), 256);
    }

    #[test]
    fn release_never_allocated() {
        let allocator = ChainIdAllocator::default();
        assert_eq!(
            allocator.release(ChainId::new(17)),
            Err(VmacError::DoubleRelease(ChainId::new(17)))
        );
    }

    #[test]
    fn release_out_of_range() {
        let allocator = ChainIdAllocator::default();
        assert_eq!(
            allocator.release(ChainId::new(256)),
            Err(VmacError::InvalidParameter(InvalidParameter::ChainId {
                id: ChainId::new(256),
                capacity: 256
            }))
        );
        assert_eq!(allocator.available(), 256);
    }

    #[test]
    fn released_ids_are_recycled() {
        let allocator = ChainIdAllocator::with_capacity(2);
        let a = allocator.get_or_allocate(ChainUuid::new()).unwrap();
        let b = allocator.get_or_allocate(ChainUuid::new()).unwrap();
        assert!(allocator.get_or_allocate(ChainUuid::new()).is_err());
        allocator.release(a).unwrap();
        assert!(!allocator.is_in_use(a));
        assert!(allocator.is_in_use(b));
        assert_eq!(allocator.get_or_allocate(ChainUuid::new()).unwrap(), a);
    }

    #[test]
    fn release_keeps_binding() {
        let allocator = ChainIdAllocator::default();
        let first = ChainUuid::new();
        let id = allocator.get_or_allocate(first).unwrap();
        allocator.release(id).unwrap();

        // the binding survives the release: same id, not taken from the pool
        assert_eq!(allocator.get_or_allocate(first).unwrap(), id);
        assert!(!allocator.is_in_use(id));
        assert_eq!(allocator.lookup(first), Some(id));

        // and the pool hands the very same id to another chain
        let second = ChainUuid::new();
        assert_eq!(allocator.get_or_allocate(second).unwrap(), id);
        assert_eq!(allocator.get_or_allocate(first).unwrap(), id);
        assert!(allocator.is_in_use(id));
    }

    #[test]
    fn release_chain_unbinds() {
        let allocator = ChainIdAllocator::default();
        let chain = ChainUuid::new();
        let id = allocator.get_or_allocate(chain).unwrap();
        assert_eq!(allocator.release_chain(chain), Ok(Some(id)));
        assert_eq!(allocator.lookup(chain), None);
        assert!(!allocator.is_in_use(id));
        assert_eq!(allocator.release_chain(chain), Ok(None));
    }

    #[test]
    fn release_chain_after_release() {
        let allocator = ChainIdAllocator::default();
        let first = ChainUuid::new();
        let id = allocator.get_or_allocate(first).unwrap();
        allocator.release(id).unwrap();
        let available = allocator.available();
        assert_eq!(allocator.release_chain(first), Err(VmacError::DoubleRelease(id)));
        // failed calls change nothing
        assert_eq!(allocator.lookup(first), Some(id));
        assert_eq!(allocator.available(), available);
        assert!(!allocator.is_in_use(id));

        // once the id is handed out again, unbinding leaves it to its new owner
        let second = ChainUuid::new();
        assert_eq!(allocator.get_or_allocate(second).unwrap(), id);
        assert_eq!(allocator.release_chain(first), Ok(Some(id)));
        assert_eq!(allocator.lookup(first), None);
        assert!(allocator.is_in_use(id));
    }

    #[test]
    fn release_chain_spares_new_owner() {
        let allocator = ChainIdAllocator::default();
        let first = ChainUuid::new();
        let id = allocator.get_or_allocate(first).unwrap();
        allocator.release(id).unwrap();
        let second = ChainUuid::new();
        assert_eq!(allocator.get_or_allocate(second).unwrap(), id);

        assert_eq!(allocator.release_chain(first), Ok(Some(id)));
        assert!(allocator.is_in_use(id));
        assert_eq!(allocator.lookup(second), Some(id));
    }

    #[test]
    fn racing_requests_for_one_chain() {
        let allocator = Arc::new(ChainIdAllocator::default());
        let chain = ChainUuid::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let allocator = allocator.clone();
                thread::spawn(move || allocator.get_or_allocate(chain).unwrap())
            })
            .collect();
        let ids: HashSet<ChainId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(allocator.available(), 255);
    }

    #[test]
    fn racing_requests_for_many_chains() {
        let allocator = Arc::new(ChainIdAllocator::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let allocator = allocator.clone();
                thread::spawn(move || {
                    (0..32)
                        .map(|_| allocator.get_or_allocate(ChainUuid::new()).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let ids: HashSet<ChainId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 256);
        assert_eq!(allocator.available(), 0);
    }
}
}

concurrency::with_shuttle! {
#[allow(clippy::unwrap_used)]
mod tests_shuttle {
    use crate::chainid::{ChainIdAllocator, ChainUuid};
    use crate::errors::VmacError;
    use concurrency::sync::Arc;
    use concurrency::thread;

    #[test]
    fn same_chain_same_id() {
        shuttle::check_random(
            || {
                let allocator = Arc::new(ChainIdAllocator::with_capacity(4));
                let chain = ChainUuid::new();
                let other = allocator.clone();
                let handle = thread::spawn(move || other.get_or_allocate(chain).unwrap());
                let mine = allocator.get_or_allocate(chain).unwrap();
                assert_eq!(handle.join().unwrap(), mine);
                assert_eq!(allocator.available(), 3);
            },
            1000,
        );
    }

    #[test]
    fn allocate_and_release_keep_pool_consistent() {
        shuttle::check_random(
            || {
                let allocator = Arc::new(ChainIdAllocator::with_capacity(2));
                let id = allocator.get_or_allocate(ChainUuid::new()).unwrap();

                let releaser = allocator.clone();
                let release = thread::spawn(move || releaser.release(id));
                let allocator2 = allocator.clone();
                let allocate =
                    thread::spawn(move || allocator2.get_or_allocate(ChainUuid::new()));

                assert_eq!(release.join().unwrap(), Ok(()));
                let second = allocate.join().unwrap().unwrap();
                // capacity 2: the second chain got either the other id or the released one
                assert!(allocator.is_in_use(second));
                assert_eq!(allocator.available(), 1);
                assert_eq!(allocator.release(id).is_ok(), id == second);
            },
            1000,
        );
    }

    #[test]
    fn double_release_race() {
        shuttle::check_random(
            || {
                let allocator = Arc::new(ChainIdAllocator::with_capacity(1));
                let id = allocator.get_or_allocate(ChainUuid::new()).unwrap();
                let other = allocator.clone();
                let handle = thread::spawn(move || other.release(id));
                let mine = allocator.release(id);
                let theirs = handle.join().unwrap();
                assert!(mine.is_ok() ^ theirs.is_ok());
                assert!(
                    mine == Err(VmacError::DoubleRelease(id))
                        || theirs == Err(VmacError::DoubleRelease(id))
                );
                assert_eq!(allocator.available(), 1);
            },
            1000,
        );
    }
}
}
