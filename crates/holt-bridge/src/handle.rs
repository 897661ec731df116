//! Store handles
//!
//! A handle is what script code holds instead of a store. It packs a slot
//! index and that slot's generation into a `u64`:
//!
//! ```text
//!  63            32 31             0
//! +----------------+----------------+
//! |   generation   |   index + 1    |
//! +----------------+----------------+
//! ```
//!
//! Releasing a slot bumps its generation, so a handle kept past release no
//! longer resolves even after the slot is reused. Zero is never issued.

use holt_store::StoreInstance;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StoreHandle(u64);

impl StoreHandle {
    pub const NULL: StoreHandle = StoreHandle(0);

    fn new(index: u32, generation: u32) -> Self {
        StoreHandle((u64::from(generation) << 32) | (u64::from(index) + 1))
    }

    pub fn from_raw(raw: u64) -> Self {
        StoreHandle(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    fn index(self) -> Option<usize> {
        (self.0 as u32).checked_sub(1).map(|i| i as usize)
    }

    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

struct Slot {
    generation: u32,
    store: Option<Arc<dyn StoreInstance>>,
}

#[derive(Default)]
struct Slots {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

/// Generation-checked table of live store instances
#[derive(Default)]
pub struct HandleTable {
    inner: RwLock<Slots>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `store` and return its handle. A store that is already
    /// registered keeps its existing handle.
    pub fn register(&self, store: Arc<dyn StoreInstance>) -> StoreHandle {
        let mut inner = self.inner.write();

        for (index, slot) in inner.slots.iter().enumerate() {
            if let Some(existing) = &slot.store
                && Arc::ptr_eq(existing, &store)
            {
                return StoreHandle::new(index as u32, slot.generation);
            }
        }

        if let Some(index) = inner.free.pop() {
            let slot = &mut inner.slots[index as usize];
            slot.store = Some(store);
            let handle = StoreHandle::new(index, slot.generation);
            debug!(handle = handle.raw(), "Reused store slot");
            return handle;
        }

        let index = inner.slots.len();
        if index >= u32::MAX as usize {
            warn!("Store handle table is full");
            return StoreHandle::NULL;
        }
        inner.slots.push(Slot {
            generation: 1,
            store: Some(store),
        });
        let handle = StoreHandle::new(index as u32, 1);
        debug!(handle = handle.raw(), "Registered store");
        handle
    }

    /// Look up the store behind `handle`. Null, unknown and stale handles all
    /// resolve to `None`.
    pub fn resolve(&self, handle: StoreHandle) -> Option<Arc<dyn StoreInstance>> {
        let index = handle.index()?;
        let inner = self.inner.read();
        let slot = inner.slots.get(index)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.store.clone()
    }

    /// Drop the table's reference to the store behind `handle`. Returns
    /// whether the handle was live.
    pub fn release(&self, handle: StoreHandle) -> bool {
        let Some(index) = handle.index() else {
            return false;
        };
        let mut inner = self.inner.write();
        let Some(slot) = inner.slots.get_mut(index) else {
            return false;
        };
        if slot.generation != handle.generation() || slot.store.is_none() {
            return false;
        }

        slot.store = None;
        slot.generation = match slot.generation.wrapping_add(1) {
            0 => 1,
            next => next,
        };
        inner.free.push(index as u32);
        debug!(handle = handle.raw(), "Released store");
        true
    }

    /// Number of live handles
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .slots
            .iter()
            .filter(|slot| slot.store.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holt_store::{KvStore, StoreOptions};

    fn store() -> Arc<dyn StoreInstance> {
        Arc::new(KvStore::open(":memory:", StoreOptions::default()).unwrap())
    }

    #[test]
    fn test_null_handle_never_resolves() {
        let table = HandleTable::new();
        table.register(store());
        assert!(table.resolve(StoreHandle::NULL).is_none());
        assert!(StoreHandle::NULL.is_null());
    }

    #[test]
    fn test_register_is_idempotent_per_instance() {
        let table = HandleTable::new();
        let a = store();
        let first = table.register(a.clone());
        let second = table.register(a);
        assert_eq!(first, second);
        assert!(!first.is_null());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_released_handle_is_stale_after_reuse() {
        let table = HandleTable::new();
        let old = table.register(store());
        assert!(table.release(old));
        assert!(!table.release(old));
        assert!(table.resolve(old).is_none());

        let new = table.register(store());
        assert_ne!(old, new);
        assert_eq!(old.index(), new.index());
        assert!(table.resolve(old).is_none());
        assert!(table.resolve(new).is_some());
    }

    #[test]
    fn test_forged_handles_do_not_resolve() {
        let table = HandleTable::new();
        let handle = table.register(store());
        assert!(table.resolve(StoreHandle::from_raw(handle.raw() + 1)).is_none());
        assert!(table.resolve(StoreHandle::from_raw(u64::MAX)).is_none());
        assert!(table.resolve(StoreHandle::from_raw(1)).is_none());
    }
}
