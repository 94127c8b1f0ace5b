// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Allocation of chain ids.
//!
//! A chain id is the small integer placed in the CHAIN-ID field of a virtual MAC. Each service
//! chain (identified by a [`ChainUuid`]) is bound to one chain id, drawn from a fixed-size pool
//! whose size is set by the width of the CHAIN-ID field.
//!
//! The [`ChainIdAllocator`] keeps two independent critical sections:
//!
//! * the pool (free stack plus in-use bitmap), locked for the duration of a single pop or push;
//! * the chain bindings, locked across the whole lookup-allocate-record sequence of
//!   [`ChainIdAllocator::get_or_allocate`], so that racing callers asking for the same chain
//!   always get the same id.
//!
//! When both are needed, the bindings are always locked before the pool.

use crate::errors::{InvalidParameter, VmacError, VmacResult};
use crate::layout::VmacLayout;
use ahash::RandomState;
use concurrency::sync::{Mutex, MutexGuard};
use id::Id;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::PoisonError;
use tracectl::trace_target;
use tracing::{debug, warn};

trace_target!("chain-id", LevelFilter::INFO, &["vmac"]);

/// Marker type for service chain identities
#[derive(Debug)]
pub enum ServiceChain {}

/// Identity of a service chain
pub type ChainUuid = Id<ServiceChain>;

/// A chain id, as carried in the CHAIN-ID field of a virtual MAC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(u16);

impl ChainId {
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
    fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl From<u16> for ChainId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free ids and in-use bitmap. Every id in `[0, capacity)` is either in `free` or marked in
/// `in_use`, never both.
#[derive(Debug)]
struct ChainIdPool {
    free: Vec<ChainId>,
    in_use: Vec<bool>,
}

impl ChainIdPool {
    fn new(capacity: usize) -> Self {
        // lowest ids are handed out first
        let free = (0..capacity)
            .rev()
            .filter_map(|id| u16::try_from(id).ok())
            .map(ChainId)
            .collect();
        Self {
            free,
            in_use: vec![false; capacity],
        }
    }

    fn pop(&mut self) -> Option<ChainId> {
        let id = self.free.pop()?;
        self.in_use[id.index()] = true;
        Some(id)
    }

    fn push(&mut self, id: ChainId) -> VmacResult<()> {
        match self.in_use.get_mut(id.index()) {
            Some(used) if *used => {
                *used = false;
                self.free.push(id);
                Ok(())
            }
            Some(_) => Err(VmacError::DoubleRelease(id)),
            None => Err(InvalidParameter::ChainId {
                id,
                capacity: self.in_use.len(),
            }
            .into()),
        }
    }
}

/// Largest pool a 16-bit [`ChainId`] can index
pub const MAX_CAPACITY: usize = 1 << 16;

/// A bounded pool of chain ids bound to service chains
#[derive(Debug)]
pub struct ChainIdAllocator {
    capacity: usize,
    pool: Mutex<ChainIdPool>,
    bindings: Mutex<HashMap<ChainUuid, ChainId, RandomState>>,
}

// Critical sections never panic, so a poisoned lock still guards consistent state.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChainIdAllocator {
    /// Create an allocator with one id per value of the layout's CHAIN-ID field.
    #[must_use]
    pub fn new(layout: &VmacLayout) -> Self {
        Self::with_capacity(layout.chain_id_capacity())
    }

    /// Create an allocator handing out ids in `[0, capacity)`, capacity being capped to what
    /// a 16-bit chain id can express.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_CAPACITY);
        Self {
            capacity,
            pool: Mutex::new(ChainIdPool::new(capacity)),
            bindings: Mutex::new(HashMap::with_hasher(RandomState::with_seed(0))),
        }
    }

    /// Number of ids this allocator manages
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of ids currently free
    #[must_use]
    pub fn available(&self) -> usize {
        lock(&self.pool).free.len()
    }

    /// Returns true iff `id` is currently handed out
    #[must_use]
    pub fn is_in_use(&self, id: ChainId) -> bool {
        lock(&self.pool)
            .in_use
            .get(id.index())
            .copied()
            .unwrap_or(false)
    }

    /// The id recorded for `chain`, if any. See [`ChainIdAllocator::release`] for why the
    /// recorded id may have been released since.
    #[must_use]
    pub fn lookup(&self, chain: ChainUuid) -> Option<ChainId> {
        lock(&self.bindings).get(&chain).copied()
    }

    /// Get the id bound to `chain`, allocating one if the chain has none yet.
    ///
    /// # Errors
    ///
    /// Returns [`VmacError::ExhaustedPool`] if the chain has no id and none is free.
    pub fn get_or_allocate(&self, chain: ChainUuid) -> VmacResult<ChainId> {
        let mut bindings = lock(&self.bindings);
        if let Some(id) = bindings.get(&chain) {
            return Ok(*id);
        }
        let Some(id) = lock(&self.pool).pop() else {
            warn!("No chain id left for chain {chain}: all {} in use", self.capacity);
            return Err(VmacError::ExhaustedPool(self.capacity));
        };
        bindings.insert(chain, id);
        debug!("Allocated chain id {id} to chain {chain}");
        Ok(id)
    }

    /// Return `id` to the pool.
    ///
    /// The binding of the chain which owned `id` is left in place: until that chain is
    /// released with [`ChainIdAllocator::release_chain`], [`ChainIdAllocator::get_or_allocate`]
    /// keeps returning `id` for it, even after `id` has been handed out to another chain.
    ///
    /// # Errors
    ///
    /// Returns [`VmacError::InvalidParameter`] if `id` is outside the pool and
    /// [`VmacError::DoubleRelease`] if `id` is not in use.
    pub fn release(&self, id: ChainId) -> VmacResult<()> {
        if id.index() >= self.capacity {
            return Err(InvalidParameter::ChainId {
                id,
                capacity: self.capacity,
            }
            .into());
        }
        lock(&self.pool).push(id).inspect_err(|e| warn!("{e}"))?;
        debug!("Released chain id {id}");
        Ok(())
    }

    /// Unbind `chain` and release its id. Returns the id the chain was bound to, or `None` if
    /// it had no binding.
    ///
    /// If the id was released with [`ChainIdAllocator::release`] and has since been handed to
    /// another chain, only the binding is removed and the id stays in use.
    ///
    /// # Errors
    ///
    /// Returns [`VmacError::DoubleRelease`] if the id bound to `chain` had already been released
    /// and is still free. Nothing changes then: the chain keeps its (stale) binding.
    pub fn release_chain(&self, chain: ChainUuid) -> VmacResult<Option<ChainId>> {
        let mut bindings = lock(&self.bindings);
        let Some(id) = bindings.get(&chain).copied() else {
            return Ok(None);
        };
        let shared = bindings
            .iter()
            .any(|(other, other_id)| *other != chain && *other_id == id);
        if !shared {
            lock(&self.pool).push(id).inspect_err(|e| warn!("{e}"))?;
        }
        bindings.remove(&chain);
        if shared {
            debug!("Unbound chain {chain}: chain id {id} is now used by another chain");
        } else {
            debug!("Released chain id {id} of chain {chain}");
        }
        Ok(Some(id))
    }
}

impl Default for ChainIdAllocator {
    fn default() -> Self {
        Self::new(&VmacLayout::V1)
    }
}
