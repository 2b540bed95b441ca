//! # Channel Registry
//!
//! Maps each channel-set identity to its current enabled-channel mask.
//!
//! Identities are registered lazily: the first read or write of an unknown
//! identity creates its entry, seeded from the [`ToggleStore`] (0 when nothing
//! is persisted). Each mask lives in its own `AtomicU32` so readers never see
//! a partially written value. Writers to one identity are serialized by a
//! per-identity lock held across the in-memory store and the save, so the
//! persisted mask always matches the last write in memory.
//!
//! `toggle` replaces the stored mask. It does not merge with the previous
//! value: `toggle(ENGINE)` followed by `toggle(UI)` leaves only `UI` enabled.

use crate::channel::{ChannelFlag, ChannelSet, ChannelSetDescriptor};
use crate::store::ToggleStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::debug;

/// One identity's mask plus the lock that orders its writes
#[derive(Debug)]
struct Slot {
    mask: AtomicU32,
    write: Mutex<()>,
}

impl Slot {
    fn new(mask: u32) -> Self {
        Self {
            mask: AtomicU32::new(mask),
            write: Mutex::new(()),
        }
    }

    fn load(&self) -> u32 {
        self.mask.load(Ordering::Acquire)
    }
}

pub struct ChannelRegistry {
    store: ToggleStore,
    masks: RwLock<HashMap<String, Arc<Slot>>>,
    descriptors: RwLock<HashMap<String, ChannelSetDescriptor>>,
}

impl ChannelRegistry {
    /// Empty registry that seeds new identities from `store`
    pub fn new(store: ToggleStore) -> Self {
        Self {
            store,
            masks: RwLock::new(HashMap::new()),
            descriptors: RwLock::new(HashMap::new()),
        }
    }

    /// Registry without persistence
    pub fn in_memory() -> Self {
        Self::new(ToggleStore::detached())
    }

    /// Persistence layer behind this registry
    pub fn store(&self) -> &ToggleStore {
        &self.store
    }

    /// Attach names to an identity's bits. Does not touch its mask.
    pub fn register(&self, descriptor: ChannelSetDescriptor) {
        let mut descriptors = self
            .descriptors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        descriptors.insert(descriptor.identity().to_string(), descriptor);
    }

    /// Register the descriptor of a typed set
    pub fn register_set<S: ChannelSet>(&self) {
        self.register(S::descriptor());
    }

    /// Descriptor registered for `identity`, if any
    pub fn descriptor(&self, identity: &str) -> Option<ChannelSetDescriptor> {
        let descriptors = self
            .descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        descriptors.get(identity).cloned()
    }

    /// Display name of `flag` within `identity`, falling back to its hex value
    pub fn flag_name(&self, identity: &str, flag: ChannelFlag) -> String {
        let descriptors = self
            .descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match descriptors.get(identity) {
            Some(descriptor) => descriptor.display_name(flag),
            None => flag.to_string(),
        }
    }

    /// Current mask of `identity`, loading it on first access
    pub fn mask(&self, identity: &str) -> ChannelFlag {
        ChannelFlag::from_bits(self.slot(identity).load())
    }

    /// Replace the mask of `identity` with exactly `flag` and persist it
    pub fn toggle(&self, identity: &str, flag: ChannelFlag) {
        self.write_mask(identity, flag);
        debug!("Toggled {} to {}", identity, flag);
    }

    /// True when every bit of `flag` is enabled for `identity`
    pub fn is_toggled(&self, identity: &str, flag: ChannelFlag) -> bool {
        if flag.is_none() {
            return true;
        }
        self.mask(identity).contains(flag)
    }

    /// Reset one identity to 0
    pub fn clear(&self, identity: &str) {
        self.write_mask(identity, ChannelFlag::NONE);
    }

    /// Reset every registered identity to 0
    pub fn clear_all(&self) {
        for identity in self.identities() {
            self.write_mask(&identity, ChannelFlag::NONE);
        }
        debug!("Cleared all channel masks");
    }

    /// [`toggle`](Self::toggle) keyed by the identity of the typed set `S`
    pub fn toggle_set<S: ChannelSet>(&self, flag: ChannelFlag) {
        self.toggle(S::IDENTITY, flag);
    }

    /// [`is_toggled`](Self::is_toggled) keyed by the identity of the typed set `S`
    pub fn is_set_toggled<S: ChannelSet>(&self, flag: ChannelFlag) -> bool {
        self.is_toggled(S::IDENTITY, flag)
    }

    /// Every identity that has a mask or a descriptor, sorted by name
    pub fn identities(&self) -> Vec<String> {
        let mut identities: Vec<String> = {
            let masks = self.masks.read().unwrap_or_else(PoisonError::into_inner);
            masks.keys().cloned().collect()
        };
        {
            let descriptors = self
                .descriptors
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            identities.extend(descriptors.keys().cloned());
        }
        identities.sort();
        identities.dedup();
        identities
    }

    /// Whether `identity` already has an in-memory mask
    pub fn is_registered(&self, identity: &str) -> bool {
        let masks = self.masks.read().unwrap_or_else(PoisonError::into_inner);
        masks.contains_key(identity)
    }

    fn write_mask(&self, identity: &str, flag: ChannelFlag) {
        let slot = self.slot_or_insert(identity, flag.bits());
        let _guard = slot.write.lock().unwrap_or_else(PoisonError::into_inner);
        slot.mask.store(flag.bits(), Ordering::Release);
        self.store.save(identity, flag.bits());
    }

    fn slot(&self, identity: &str) -> Arc<Slot> {
        {
            let masks = self.masks.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = masks.get(identity) {
                return Arc::clone(slot);
            }
        }

        let mut masks = self.masks.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(masks.entry(identity.to_string()).or_insert_with(|| {
            let loaded = self.store.load(identity);
            debug!("Registered {} with mask {:#x}", identity, loaded);
            Arc::new(Slot::new(loaded))
        }))
    }

    /// Like `slot` but seeds a new entry with `initial` instead of reading the store
    fn slot_or_insert(&self, identity: &str, initial: u32) -> Arc<Slot> {
        {
            let masks = self.masks.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = masks.get(identity) {
                return Arc::clone(slot);
            }
        }

        let mut masks = self.masks.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            masks
                .entry(identity.to_string())
                .or_insert_with(|| Arc::new(Slot::new(initial))),
        )
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("store", &self.store)
            .field("identities", &self.identities())
            .finish()
    }
}
