// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Read access to the scene nodes the scheduler sizes its work against.

use crate::view::LayerId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::RwLock;

/// Identifier of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// The node collections the scheduler queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    /// Scene entities.
    Entity,
    /// Data buffers.
    Buffer,
    /// Textures.
    Texture,
    /// Skeletons.
    Skeleton,
    /// Geometry sources.
    Geometry,
}

/// Read-only view of the scene's node managers.
///
/// Implementations are shared between the scheduler thread and job bodies
/// running on worker threads.
pub trait NodeManagers: Send + Sync {
    /// Identifiers of every node of `kind`, in ascending order.
    fn ids(&self, kind: NodeKind) -> Vec<NodeId>;

    /// Number of nodes of `kind`.
    fn count(&self, kind: NodeKind) -> usize {
        self.ids(kind).len()
    }

    /// Layers attached to `entity`, or `None` if the entity does not exist.
    fn entity_layers(&self, entity: NodeId) -> Option<Vec<LayerId>>;
}

#[derive(Debug, Default)]
struct Nodes {
    by_kind: HashMap<NodeKind, BTreeMap<NodeId, Vec<LayerId>>>,
    next_id: u64,
}

/// An in-memory node store.
///
/// Interior mutability lets the scene keep inserting nodes while the
/// scheduler holds a shared reference.
#[derive(Debug, Default)]
pub struct SceneNodeStore {
    nodes: RwLock<Nodes>,
}

impl SceneNodeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node of `kind` and returns its identifier.
    pub fn insert(&self, kind: NodeKind) -> NodeId {
        self.insert_with_layers(kind, Vec::new())
    }

    /// Inserts an entity carrying `layers`.
    pub fn insert_entity(&self, layers: Vec<LayerId>) -> NodeId {
        self.insert_with_layers(NodeKind::Entity, layers)
    }

    fn insert_with_layers(&self, kind: NodeKind, layers: Vec<LayerId>) -> NodeId {
        let mut nodes = self.write();
        let id = NodeId(nodes.next_id);
        nodes.next_id += 1;
        nodes.by_kind.entry(kind).or_default().insert(id, layers);
        id
    }

    /// Removes a node. Returns `false` if it was not present.
    pub fn remove(&self, id: NodeId) -> bool {
        self.write()
            .by_kind
            .values_mut()
            .any(|nodes| nodes.remove(&id).is_some())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Nodes> {
        self.nodes.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Nodes> {
        self.nodes.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NodeManagers for SceneNodeStore {
    fn ids(&self, kind: NodeKind) -> Vec<NodeId> {
        self.read()
            .by_kind
            .get(&kind)
            .map(|nodes| nodes.keys().copied().collect())
            .unwrap_or_default()
    }

    fn count(&self, kind: NodeKind) -> usize {
        self.read().by_kind.get(&kind).map_or(0, BTreeMap::len)
    }

    fn entity_layers(&self, entity: NodeId) -> Option<Vec<LayerId>> {
        self.read()
            .by_kind
            .get(&NodeKind::Entity)?
            .get(&entity)
            .cloned()
    }
}

impl<T: NodeManagers + ?Sized> NodeManagers for std::sync::Arc<T> {
    fn ids(&self, kind: NodeKind) -> Vec<NodeId> {
        (**self).ids(kind)
    }

    fn count(&self, kind: NodeKind) -> usize {
        (**self).count(kind)
    }

    fn entity_layers(&self, entity: NodeId) -> Option<Vec<LayerId>> {
        (**self).entity_layers(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_inserts_and_removes() {
        let store = SceneNodeStore::new();
        let a = store.insert_entity(vec![LayerId(1)]);
        let _b = store.insert(NodeKind::Entity);
        store.insert(NodeKind::Buffer);
        assert_eq!(store.count(NodeKind::Entity), 2);
        assert_eq!(store.count(NodeKind::Buffer), 1);
        assert_eq!(store.count(NodeKind::Texture), 0);

        assert!(store.remove(a));
        assert!(!store.remove(a));
        assert_eq!(store.count(NodeKind::Entity), 1);
    }

    #[test]
    fn entity_layers_only_for_entities() {
        let store = SceneNodeStore::new();
        let entity = store.insert_entity(vec![LayerId(3)]);
        let buffer = store.insert(NodeKind::Buffer);
        assert_eq!(store.entity_layers(entity), Some(vec![LayerId(3)]));
        assert_eq!(store.entity_layers(buffer), None);
    }

    #[test]
    fn ids_are_sorted_and_unique() {
        let store = SceneNodeStore::new();
        let ids: Vec<NodeId> = (0..4).map(|_| store.insert(NodeKind::Entity)).collect();
        assert_eq!(store.ids(NodeKind::Entity), ids);
    }
}
