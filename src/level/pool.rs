// src/level/pool.rs
//! Keyed object pools: FIFO reuse, fixed pre-warm, unbounded growth.
//!
//! Pooling is a performance tool, not a capacity limit. `acquire` on a
//! registered key always hands something back: a recycled instance when the
//! free queue has one, otherwise a fresh one from the key's factory.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use bevy::log::{debug, trace};

/// Builds a new instance; the argument is a pool-unique serial.
pub type Factory<T> = Box<dyn Fn(u64) -> T + Send + Sync>;

/// What happens to instances handed back through `release`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retention {
    /// Queue for reuse; `prewarm` instances are built at registration.
    Recycle { prewarm: usize },
    /// Drop on release (pooling disabled for this key).
    Discard,
}

struct PoolSlot<T> {
    free: VecDeque<T>,
    factory: Factory<T>,
    retention: Retention,
    active: usize,
    created: usize,
}

impl<T> PoolSlot<T> {
    fn new(retention: Retention, factory: Factory<T>, next_serial: &mut u64) -> Self {
        let mut slot = Self { free: VecDeque::new(), factory, retention, active: 0, created: 0 };
        if let Retention::Recycle { prewarm } = retention {
            slot.free.reserve(prewarm);
            for _ in 0..prewarm {
                let item = slot.instantiate(next_serial);
                slot.free.push_back(item);
            }
        }
        slot
    }

    fn instantiate(&mut self, next_serial: &mut u64) -> T {
        let serial = *next_serial;
        *next_serial += 1;
        self.created += 1;
        (self.factory)(serial)
    }

    fn take(&mut self, next_serial: &mut u64) -> T {
        let item = match self.free.pop_front() {
            Some(item) => item,
            None => self.instantiate(next_serial),
        };
        self.active += 1;
        item
    }
}

/// One pool per (subsystem, key type). `label` only shows up in logs.
pub struct Pool<K, T> {
    label: &'static str,
    slots: HashMap<K, PoolSlot<T>>,
    next_serial: u64,
}

impl<K, T> Pool<K, T>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(label: &'static str) -> Self {
        Self { label, slots: HashMap::new(), next_serial: 0 }
    }

    pub fn is_registered(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Register `key` and pre-warm it. Returns false (and changes nothing)
    /// when the key is already registered.
    pub fn register<F>(&mut self, key: K, retention: Retention, factory: F) -> bool
    where
        F: Fn(u64) -> T + Send + Sync + 'static,
    {
        match self.slots.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(e) => {
                debug!("{}: registering {:?} ({:?})", self.label, e.key(), retention);
                e.insert(PoolSlot::new(retention, Box::new(factory), &mut self.next_serial));
                true
            }
        }
    }

    /// Take an instance for `key`. `None` only when the key was never registered.
    pub fn acquire(&mut self, key: &K) -> Option<T> {
        let slot = self.slots.get_mut(key)?;
        if slot.free.is_empty() && matches!(slot.retention, Retention::Recycle { .. }) {
            debug!("{}: free queue for {:?} is empty, instantiating", self.label, key);
        }
        Some(slot.take(&mut self.next_serial))
    }

    /// Like `acquire`, registering the key first on its first reference.
    pub fn acquire_or_register<F>(
        &mut self,
        key: &K,
        retention: Retention,
        factory: impl FnOnce() -> F,
    ) -> T
    where
        F: Fn(u64) -> T + Send + Sync + 'static,
    {
        let slot = match self.slots.entry(key.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                debug!("{}: first reference to {:?}, registering ({:?})", self.label, key, retention);
                e.insert(PoolSlot::new(retention, Box::new(factory()), &mut self.next_serial))
            }
        };
        slot.take(&mut self.next_serial)
    }

    /// Hand an instance back. The caller resets it to canonical state first.
    /// Returns false when the instance was dropped instead of queued.
    pub fn release(&mut self, key: &K, item: T) -> bool {
        let Some(slot) = self.slots.get_mut(key) else {
            trace!("{}: release for unknown key {:?}, dropping", self.label, key);
            return false;
        };
        slot.active = slot.active.saturating_sub(1);
        match slot.retention {
            Retention::Recycle { .. } => {
                slot.free.push_back(item);
                true
            }
            Retention::Discard => false,
        }
    }

    pub fn free_count(&self, key: &K) -> usize {
        self.slots.get(key).map_or(0, |s| s.free.len())
    }

    pub fn active_count(&self, key: &K) -> usize {
        self.slots.get(key).map_or(0, |s| s.active)
    }

    /// Instances ever built for `key` (pre-warm included).
    pub fn created_count(&self, key: &K) -> usize {
        self.slots.get(key).map_or(0, |s| s.created)
    }

    /// Teardown: drop every pooled instance and forget all keys.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
