//! Cache-slot allocation for binding objects.
//!
//! Each binding call site reads its object from a cache slot. Slots are
//! allocated while a unit is emitted; the unit instance owns one cell per
//! slot at run time.

use std::fmt;

use log::debug;
use rustc_hash::FxHashMap;

use ember_core::TypeHash;

/// Index of a cache slot within a unit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotHandle(u16);

impl SlotHandle {
    /// Build a handle from a raw index.
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Raw slot index.
    pub const fn index(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for SlotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotHandle({})", self.0)
    }
}

/// Description of an allocated slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotInfo {
    /// Object type stored in the slot.
    pub object_type: TypeHash,
    /// Readable name for diagnostics.
    pub name: String,
}

/// Per-unit slot allocator.
#[derive(Debug, Default)]
pub struct CacheSlots {
    slots: Vec<SlotInfo>,
    by_type: FxHashMap<TypeHash, SlotHandle>,
}

impl CacheSlots {
    /// Create an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared slot for `object_type`, allocating it on first use.
    ///
    /// Returns `None` once the unit has run out of slot indices.
    pub fn get_or_allocate(&mut self, object_type: TypeHash, name: &str) -> Option<SlotHandle> {
        if let Some(&slot) = self.by_type.get(&object_type) {
            return Some(slot);
        }
        let slot = self.push(object_type, name.to_string())?;
        self.by_type.insert(object_type, slot);
        Some(slot)
    }

    /// Allocate a fresh slot that no other call site shares.
    pub fn allocate_unique(&mut self, object_type: TypeHash, name: &str) -> Option<SlotHandle> {
        let name = format!("{name}#{}", self.slots.len());
        self.push(object_type, name)
    }

    fn push(&mut self, object_type: TypeHash, name: String) -> Option<SlotHandle> {
        let index = u16::try_from(self.slots.len()).ok()?;
        debug!("allocated cache slot {index} for {name}");
        self.slots.push(SlotInfo { object_type, name });
        Some(SlotHandle(index))
    }

    /// Look up a slot's description.
    pub fn info(&self, slot: SlotHandle) -> Option<&SlotInfo> {
        self.slots.get(slot.0 as usize)
    }

    /// Number of allocated slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slots were allocated.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Finish allocation, keeping the slot descriptions.
    pub fn into_slots(self) -> Vec<SlotInfo> {
        self.slots
    }
}
