//! Event registry: one entry per trigger execution

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

use super::{read_lock, write_lock};
use crate::command::CommandId;
use crate::types::{EventId, ObjectId, SourceId};

/// What one execution of a trigger against one object is doing
#[derive(Debug, Clone, PartialEq)]
pub struct EventInfo {
    pub command_id: CommandId,
    pub object_id: ObjectId,
    /// Voices currently realizing this event
    pub sources: Vec<SourceId>,
}

impl EventInfo {
    pub fn new(command_id: CommandId, object_id: ObjectId) -> Self {
        Self {
            command_id,
            object_id,
            sources: Vec::new(),
        }
    }
}

/// EventID → EventInfo
///
/// IDs are allocated from a monotonic counter and never reissue `0`.
#[derive(Debug)]
pub struct EventRegistry {
    events: RwLock<HashMap<EventId, EventInfo>>,
    next_id: AtomicU32,
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
            next_id: AtomicU32::new(1),
        }
    }
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> EventId {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return EventId(id);
            }
        }
    }

    /// Store `info` under a fresh EventID
    pub fn add(&self, info: EventInfo) -> EventId {
        let id = self.allocate_id();
        write_lock(&self.events).insert(id, info);
        id
    }

    /// Remove an event the caller knows exists
    pub fn remove(&self, id: EventId) -> Option<EventInfo> {
        let removed = write_lock(&self.events).remove(&id);
        debug_assert!(removed.is_some(), "EventRegistry::remove: unknown event {id}");
        removed
    }

    /// Attach a voice to an event the caller knows exists
    pub fn add_source(&self, id: EventId, source: SourceId) -> bool {
        let mut events = write_lock(&self.events);
        let Some(info) = events.get_mut(&id) else {
            debug_assert!(false, "EventRegistry::add_source: unknown event {id}");
            return false;
        };
        info.sources.push(source);
        true
    }

    /// Detach a voice; returns whether the event now has no sources
    pub fn remove_source(&self, id: EventId, source: SourceId) -> bool {
        let mut events = write_lock(&self.events);
        let Some(info) = events.get_mut(&id) else {
            debug_assert!(false, "EventRegistry::remove_source: unknown event {id}");
            return false;
        };
        match info.sources.iter().position(|s| *s == source) {
            Some(index) => {
                info.sources.remove(index);
            }
            None => {
                log::error!("Voice {} is not playing for event {}", source, id);
            }
        }
        info.sources.is_empty()
    }

    /// Look up an event the caller knows exists
    pub fn get(&self, id: EventId) -> Option<EventInfo> {
        let info = self.find(id);
        debug_assert!(info.is_some(), "EventRegistry::get: unknown event {id}");
        info
    }

    /// Look up an event that may not exist (gameplay-supplied IDs)
    pub fn find(&self, id: EventId) -> Option<EventInfo> {
        read_lock(&self.events).get(&id).cloned()
    }

    pub fn contains(&self, id: EventId) -> bool {
        read_lock(&self.events).contains_key(&id)
    }

    /// Voice count of an event; 0 for an unknown ID
    pub fn number_of_sources(&self, id: EventId) -> usize {
        read_lock(&self.events).get(&id).map_or(0, |info| info.sources.len())
    }

    /// Number of live events
    pub fn count(&self) -> usize {
        read_lock(&self.events).len()
    }

    pub fn clear(&self) {
        write_lock(&self.events).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> EventInfo {
        EventInfo::new(CommandId::from_name("Footstep"), 42)
    }

    #[test]
    fn test_ids_are_fresh_and_nonzero() {
        let registry = EventRegistry::new();
        let a = registry.add(info());
        let b = registry.add(info());
        assert!(a.is_valid() && b.is_valid());
        assert_ne!(a, b);
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_source_bookkeeping() {
        let registry = EventRegistry::new();
        let id = registry.add(info());
        assert!(registry.add_source(id, 3));
        assert!(registry.add_source(id, 5));
        assert_eq!(registry.number_of_sources(id), 2);

        assert!(!registry.remove_source(id, 3));
        assert!(registry.remove_source(id, 5));
        assert_eq!(registry.number_of_sources(id), 0);

        let removed = registry.remove(id).unwrap();
        assert_eq!(removed.object_id, 42);
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_unknown_event_queries() {
        let registry = EventRegistry::new();
        assert_eq!(registry.number_of_sources(EventId(99)), 0);
        assert!(registry.find(EventId(99)).is_none());
        assert!(!registry.contains(EventId(99)));
    }

    #[test]
    fn test_remove_missing_source_reports_state() {
        let registry = EventRegistry::new();
        let id = registry.add(info());
        registry.add_source(id, 1);
        // Missing voice is logged; the list is untouched
        assert!(!registry.remove_source(id, 8));
        assert_eq!(registry.number_of_sources(id), 1);
    }
}
