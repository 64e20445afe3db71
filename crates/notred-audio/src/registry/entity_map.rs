//! Two-level (scene, entity) keyed map behind a read/write lock

use std::collections::HashMap;
use std::sync::RwLock;

use super::{read_lock, write_lock};
use crate::types::{EntityId, SceneId};

/// Scene ID that addresses every scene in [`EntityIdMap::clear`] and
/// [`EntityIdMap::count`]
pub const ALL_SCENES: SceneId = 0;

/// Thread-safe map from (scene, entity) to `T`
///
/// A scene key exists only while it holds at least one entity.
#[derive(Debug)]
pub struct EntityIdMap<T> {
    scenes: RwLock<HashMap<SceneId, HashMap<EntityId, T>>>,
}

impl<T> Default for EntityIdMap<T> {
    fn default() -> Self {
        Self {
            scenes: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Clone> EntityIdMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value for (scene, entity)
    ///
    /// Returns the previous value, if any.
    pub fn add(&self, scene: SceneId, entity: EntityId, value: T) -> Option<T> {
        write_lock(&self.scenes)
            .entry(scene)
            .or_default()
            .insert(entity, value)
    }

    /// Remove (scene, entity)
    ///
    /// The caller must know the entry exists; debug builds assert it.
    pub fn remove(&self, scene: SceneId, entity: EntityId) -> Option<T> {
        let mut scenes = write_lock(&self.scenes);
        let Some(entities) = scenes.get_mut(&scene) else {
            debug_assert!(false, "EntityIdMap::remove: unknown scene {scene}");
            return None;
        };
        let removed = entities.remove(&entity);
        debug_assert!(removed.is_some(), "EntityIdMap::remove: unknown entity {entity} in scene {scene}");
        if entities.is_empty() {
            scenes.remove(&scene);
        }
        removed
    }

    /// Remove (scene, entity) if present, without asserting
    pub fn take(&self, scene: SceneId, entity: EntityId) -> Option<T> {
        let mut scenes = write_lock(&self.scenes);
        let entities = scenes.get_mut(&scene)?;
        let removed = entities.remove(&entity);
        if entities.is_empty() {
            scenes.remove(&scene);
        }
        removed
    }

    pub fn get(&self, scene: SceneId, entity: EntityId) -> Option<T> {
        read_lock(&self.scenes)
            .get(&scene)
            .and_then(|entities| entities.get(&entity))
            .cloned()
    }

    pub fn contains(&self, scene: SceneId, entity: EntityId) -> bool {
        read_lock(&self.scenes)
            .get(&scene)
            .is_some_and(|entities| entities.contains_key(&entity))
    }

    /// Every (entity, value) pair of a scene
    pub fn get_scene(&self, scene: SceneId) -> Vec<(EntityId, T)> {
        read_lock(&self.scenes)
            .get(&scene)
            .map(|entities| entities.iter().map(|(id, v)| (*id, v.clone())).collect())
            .unwrap_or_default()
    }

    /// Drop a scene's entries, or everything for [`ALL_SCENES`]
    ///
    /// Returns the removed values.
    pub fn clear(&self, scene: SceneId) -> Vec<T> {
        let mut scenes = write_lock(&self.scenes);
        if scene == ALL_SCENES {
            scenes
                .drain()
                .flat_map(|(_, entities)| entities.into_values())
                .collect()
        } else {
            scenes
                .remove(&scene)
                .map(|entities| entities.into_values().collect())
                .unwrap_or_default()
        }
    }

    /// Entity count of a scene, or of every scene for [`ALL_SCENES`]
    pub fn count(&self, scene: SceneId) -> usize {
        let scenes = read_lock(&self.scenes);
        if scene == ALL_SCENES {
            scenes.values().map(HashMap::len).sum()
        } else {
            scenes.get(&scene).map_or(0, HashMap::len)
        }
    }

    /// Number of scenes with at least one entry
    pub fn scene_count(&self) -> usize {
        read_lock(&self.scenes).len()
    }
}
