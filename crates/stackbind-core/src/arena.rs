//! Generational arena of native blocks.
//!
//! Every native object handed to the runtime lives in one slot of a
//! [`BlockArena`]. A slot is tagged with the Rust type it holds and a
//! [`Lifecycle`] state:
//!
//! ```text
//! allocate()      construct()        destroy()
//!     ──► Uninitialized ──► Live ──► Finalized ──► free()
//! ```
//!
//! `destroy` runs the native destructor (drops the value) exactly once; any
//! further call is a no-op reported through its return value. `free` is the
//! collector's entry point and releases the slot itself, bumping the
//! generation so that outstanding handles become stale.

use std::any::{Any, TypeId};
use std::fmt;

use crate::error::BlockError;
use crate::handle::{BlockHandle, TableRef};

/// A type-erased native object stored in a block.
pub type ErasedObject = dyn Any + Send + Sync + 'static;

/// Lifecycle state of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Storage exists but no native object has been moved in yet.
    Uninitialized,
    /// Holds a constructed native object.
    Live,
    /// The native object has been destroyed; storage awaits the collector.
    Finalized,
}

impl Lifecycle {
    pub fn name(self) -> &'static str {
        match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::Live => "live",
            Lifecycle::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct BlockSlot {
    generation: u32,
    occupied: bool,
    state: Lifecycle,
    type_id: Option<TypeId>,
    type_name: &'static str,
    value: Option<Box<ErasedObject>>,
    /// Behavior table (the runtime's metatable for this block)
    behavior: Option<TableRef>,
}

impl BlockSlot {
    fn vacant() -> Self {
        Self {
            generation: 0,
            occupied: false,
            state: Lifecycle::Uninitialized,
            type_id: None,
            type_name: "",
            value: None,
            behavior: None,
        }
    }

    fn reset(&mut self) {
        self.occupied = true;
        self.state = Lifecycle::Uninitialized;
        self.type_id = None;
        self.type_name = "";
        self.value = None;
        self.behavior = None;
    }
}

/// Storage for native blocks with generational handles.
pub struct BlockArena {
    slots: Vec<BlockSlot>,
    free_list: Vec<u32>,
    occupied: usize,
}

impl BlockArena {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            occupied: 0,
        }
    }

    /// Allocate an uninitialized block.
    pub fn allocate(&mut self) -> BlockHandle {
        self.occupied += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.reset();
            BlockHandle::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            let mut slot = BlockSlot::vacant();
            slot.reset();
            self.slots.push(slot);
            BlockHandle::new(index, 0)
        }
    }

    fn slot(&self, handle: BlockHandle) -> Result<&BlockSlot, BlockError> {
        match self.slots.get(handle.index as usize) {
            Some(slot) if slot.occupied && slot.generation == handle.generation => Ok(slot),
            _ => Err(BlockError::Stale {
                index: handle.index,
            }),
        }
    }

    fn slot_mut(&mut self, handle: BlockHandle) -> Result<&mut BlockSlot, BlockError> {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.occupied && slot.generation == handle.generation => Ok(slot),
            _ => Err(BlockError::Stale {
                index: handle.index,
            }),
        }
    }

    /// Move a native object into an uninitialized block, making it live.
    pub fn construct<T: Any + Send + Sync>(
        &mut self,
        handle: BlockHandle,
        value: T,
    ) -> Result<(), BlockError> {
        let slot = self.slot_mut(handle)?;
        if slot.state != Lifecycle::Uninitialized {
            return Err(BlockError::AlreadyConstructed { state: slot.state });
        }
        slot.type_id = Some(TypeId::of::<T>());
        slot.type_name = std::any::type_name::<T>();
        slot.value = Some(Box::new(value));
        slot.state = Lifecycle::Live;
        Ok(())
    }

    /// Destroy the native object of a live block.
    ///
    /// Returns the state the block was in before the call. Only a `Live`
    /// block is changed; every other state is left untouched.
    pub fn destroy(&mut self, handle: BlockHandle) -> Result<Lifecycle, BlockError> {
        let slot = self.slot_mut(handle)?;
        let previous = slot.state;
        if previous == Lifecycle::Live {
            slot.state = Lifecycle::Finalized;
            let value = slot.value.take();
            drop(value);
        }
        Ok(previous)
    }

    /// Release a block's storage. Any object still present is dropped.
    ///
    /// Returns false if the handle was already stale.
    pub fn free(&mut self, handle: BlockHandle) -> bool {
        let Ok(slot) = self.slot_mut(handle) else {
            return false;
        };
        let value = slot.value.take();
        slot.occupied = false;
        slot.state = Lifecycle::Finalized;
        slot.behavior = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        self.occupied -= 1;
        drop(value);
        true
    }

    /// Check whether the handle refers to an allocated block.
    pub fn contains(&self, handle: BlockHandle) -> bool {
        self.slot(handle).is_ok()
    }

    pub fn state(&self, handle: BlockHandle) -> Option<Lifecycle> {
        self.slot(handle).ok().map(|slot| slot.state)
    }

    /// Rust type name of the object a block was constructed with.
    pub fn type_name(&self, handle: BlockHandle) -> Option<&'static str> {
        self.slot(handle)
            .ok()
            .and_then(|slot| slot.type_id.map(|_| slot.type_name))
    }

    pub fn type_id(&self, handle: BlockHandle) -> Option<TypeId> {
        self.slot(handle).ok().and_then(|slot| slot.type_id)
    }

    /// Get the erased object of a live block along with its type identity.
    pub fn object(&self, handle: BlockHandle) -> Result<(&ErasedObject, TypeId), BlockError> {
        let slot = self.slot(handle)?;
        match (&slot.value, slot.type_id) {
            (Some(value), Some(type_id)) if slot.state == Lifecycle::Live => {
                Ok((value.as_ref(), type_id))
            }
            _ => Err(BlockError::NotLive { state: slot.state }),
        }
    }

    /// Mutable variant of [`object`](Self::object).
    pub fn object_mut(
        &mut self,
        handle: BlockHandle,
    ) -> Result<(&mut ErasedObject, TypeId), BlockError> {
        let slot = self.slot_mut(handle)?;
        let state = slot.state;
        match (&mut slot.value, slot.type_id) {
            (Some(value), Some(type_id)) if state == Lifecycle::Live => {
                Ok((value.as_mut(), type_id))
            }
            _ => Err(BlockError::NotLive { state }),
        }
    }

    /// Borrow a live block's object as exactly `T`.
    pub fn get<T: Any>(&self, handle: BlockHandle) -> Result<&T, BlockError> {
        let slot = self.slot(handle)?;
        let (object, _) = self.object(handle)?;
        object
            .downcast_ref::<T>()
            .ok_or(BlockError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                actual: slot.type_name,
            })
    }

    /// Mutably borrow a live block's object as exactly `T`.
    pub fn get_mut<T: Any>(&mut self, handle: BlockHandle) -> Result<&mut T, BlockError> {
        let actual = self.slot(handle)?.type_name;
        let (object, _) = self.object_mut(handle)?;
        object
            .downcast_mut::<T>()
            .ok_or(BlockError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                actual,
            })
    }

    /// Tag a block with its behavior table.
    pub fn set_behavior(&mut self, handle: BlockHandle, table: TableRef) -> Result<(), BlockError> {
        self.slot_mut(handle)?.behavior = Some(table);
        Ok(())
    }

    pub fn behavior(&self, handle: BlockHandle) -> Option<TableRef> {
        self.slot(handle).ok().and_then(|slot| slot.behavior)
    }

    /// Handles of all allocated blocks.
    pub fn handles(&self) -> impl Iterator<Item = BlockHandle> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.occupied)
            .map(|(index, slot)| BlockHandle::new(index as u32, slot.generation))
    }

    /// Number of allocated blocks (any state).
    pub fn len(&self) -> usize {
        self.occupied
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Number of blocks currently holding a live object.
    pub fn live_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.occupied && slot.state == Lifecycle::Live)
            .count()
    }
}

impl Default for BlockArena {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BlockArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockArena")
            .field("slot_count", &self.slots.len())
            .field("occupied", &self.occupied)
            .field("free_count", &self.free_list.len())
            .finish()
    }
}
