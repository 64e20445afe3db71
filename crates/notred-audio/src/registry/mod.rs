//! Cross-thread registries
//!
//! Every registry owns its own lock; there is no engine-wide lock. Readers
//! (lookups, counts) take shared locks, writers take exclusive ones, and no
//! registry calls into another while holding its lock.
//!
//! - [`EntityIdMap`]: two-level (scene, entity) map, backs [`AudioComponentRegistry`]
//! - [`KeyedLists`]: key → non-empty list, backs [`ObjectEventRegistry`] and [`ObjectSourceRegistry`]
//! - [`EventRegistry`]: EventID → [`EventInfo`] with fresh ID allocation

pub mod entity_map;
pub mod event;
pub mod keyed_lists;

use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use entity_map::{EntityIdMap, ALL_SCENES};
pub use event::{EventInfo, EventRegistry};
pub use keyed_lists::KeyedLists;

use crate::component::AudioComponent;
use crate::types::{EventId, ObjectId, SourceId};

/// Object → events currently executing on it
pub type ObjectEventRegistry = KeyedLists<ObjectId, EventId>;

/// Object → voices currently playing for it
pub type ObjectSourceRegistry = KeyedLists<ObjectId, SourceId>;

/// (scene, entity) → live audio component
pub type AudioComponentRegistry = EntityIdMap<Arc<AudioComponent>>;

/// Shared lock that survives poisoning
///
/// Registry critical sections only do ID bookkeeping, so the data behind a
/// poisoned lock is still consistent.
#[inline]
pub fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Exclusive lock that survives poisoning
#[inline]
pub fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mutex lock that survives poisoning
#[inline]
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
