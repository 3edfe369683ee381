//! Object instances
//!
//! An instance stores one slot per instance field of its class, inherited
//! fields first. Slot indices are assigned when the class is defined.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::class::ClassInfo;
use crate::types::ClassId;
use crate::value::Value;

/// Global counter for generating unique object IDs
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique object ID
fn generate_object_id() -> u64 {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Object instance (heap-allocated)
pub struct Instance {
    /// Unique object ID
    object_id: u64,
    /// Runtime class
    class_id: ClassId,
    /// Field values, indexed by slot
    slots: RwLock<Vec<Value>>,
}

/// Shared handle to an instance; equality is identity
#[derive(Clone)]
pub struct ObjectRef(Arc<Instance>);

impl Instance {
    /// Low-level allocation: every slot at its default value, no constructor runs
    pub fn allocate(class: &ClassInfo) -> ObjectRef {
        let slots = class.layout().iter().map(|ty| ty.default_value()).collect();
        ObjectRef(Arc::new(Instance {
            object_id: generate_object_id(),
            class_id: class.id,
            slots: RwLock::new(slots),
        }))
    }
}

impl ObjectRef {
    /// Runtime class of the instance
    pub fn class_id(&self) -> ClassId {
        self.0.class_id
    }

    /// Unique object ID
    pub fn object_id(&self) -> u64 {
        self.0.object_id
    }

    /// Get a slot value by index
    pub fn get_slot(&self, index: usize) -> Option<Value> {
        self.0.slots.read().get(index).cloned()
    }

    /// Set a slot value by index
    pub fn set_slot(&self, index: usize, value: Value) -> Result<(), String> {
        let mut slots = self.0.slots.write();
        let count = slots.len();
        match slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(format!(
                "Slot index {} out of bounds (object has {} slots)",
                index, count
            )),
        }
    }

    /// Get number of slots
    pub fn slot_count(&self) -> usize {
        self.0.slots.read().len()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object(class {}, id {})", self.0.class_id, self.0.object_id)
    }
}
