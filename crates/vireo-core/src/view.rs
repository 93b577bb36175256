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

//! Frame-graph leaves: the render views a frame is built for.

use crate::managers::NodeId;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Identifier of a render layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u32);

/// Normalized viewport rectangle (0.0..=1.0 on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

/// How a [`LayerFilter`] matches an entity's layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayerFilterMode {
    /// Keep entities having at least one of the filter's layers.
    #[default]
    AcceptAnyMatchingLayers,
    /// Keep entities having every one of the filter's layers.
    AcceptAllMatchingLayers,
    /// Drop entities having at least one of the filter's layers.
    DiscardAnyMatchingLayers,
    /// Drop entities having every one of the filter's layers.
    DiscardAllMatchingLayers,
}

/// Selects the entities a view draws by their layers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerFilter {
    /// Matching mode.
    pub mode: LayerFilterMode,
    /// Layers to match against. An empty list accepts every entity.
    pub layers: Vec<LayerId>,
}

impl LayerFilter {
    /// Returns `true` if an entity carrying `entity_layers` passes the filter.
    pub fn accepts(&self, entity_layers: &[LayerId]) -> bool {
        if self.layers.is_empty() {
            return true;
        }
        let any = self.layers.iter().any(|l| entity_layers.contains(l));
        let all = self.layers.iter().all(|l| entity_layers.contains(l));
        match self.mode {
            LayerFilterMode::AcceptAnyMatchingLayers => any,
            LayerFilterMode::AcceptAllMatchingLayers => all,
            LayerFilterMode::DiscardAnyMatchingLayers => !any,
            LayerFilterMode::DiscardAllMatchingLayers => !all,
        }
    }
}

/// Keeps only entities within `distance_threshold` of a reference entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProximityFilter {
    /// The reference entity.
    pub entity: NodeId,
    /// Maximum distance from the reference entity.
    pub distance_threshold: f32,
}

bitflags! {
    /// Attachments cleared at the start of a view.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ClearBuffers: u8 {
        /// Color attachments.
        const COLOR = 1 << 0;
        /// Depth attachment.
        const DEPTH = 1 << 1;
        /// Stencil attachment.
        const STENCIL = 1 << 2;
    }
}

/// Clear state applied before a view draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearParameters {
    /// Which attachments are cleared.
    pub buffers: ClearBuffers,
    /// Linear RGBA clear color.
    pub color: [f32; 4],
    /// Depth clear value.
    pub depth: f32,
    /// Stencil clear value.
    pub stencil: u32,
    /// Color attachment index cleared when only one draw buffer is targeted.
    pub draw_buffer_index: Option<u32>,
}

impl Default for ClearParameters {
    fn default() -> Self {
        Self {
            buffers: ClearBuffers::COLOR | ClearBuffers::DEPTH,
            color: [0.0, 0.0, 0.0, 1.0],
            depth: 1.0,
            stencil: 0,
            draw_buffer_index: None,
        }
    }
}

/// One leaf of the frame graph: a single rendering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewDescriptor {
    /// Label used in logs.
    pub name: String,
    /// Target rectangle.
    pub viewport: Viewport,
    /// Layer selection.
    pub layer_filter: LayerFilter,
    /// Whether entities are culled against the camera frustum.
    pub frustum_culling: bool,
    /// Optional distance filter.
    pub proximity: Option<ProximityFilter>,
    /// Clear state.
    pub clear: ClearParameters,
}

impl Default for ViewDescriptor {
    fn default() -> Self {
        Self {
            name: String::from("view"),
            viewport: Viewport::default(),
            layer_filter: LayerFilter::default(),
            frustum_culling: true,
            proximity: None,
            clear: ClearParameters::default(),
        }
    }
}

impl ViewDescriptor {
    /// Creates a full-screen view with default filters.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Source of the frame-graph leaves, queried once per frame.
pub trait FrameGraphSource: Send + Sync {
    /// Returns the active leaves in rendering order.
    fn leaves(&self) -> Vec<ViewDescriptor>;
}

/// A frame graph given as a flat, ordered list of leaves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameGraph {
    views: Vec<ViewDescriptor>,
}

impl FrameGraph {
    /// Creates a frame graph from its leaves.
    pub fn new(views: Vec<ViewDescriptor>) -> Self {
        Self { views }
    }

    /// Appends a leaf.
    pub fn push(&mut self, view: ViewDescriptor) {
        self.views.push(view);
    }

    /// The leaves in rendering order.
    pub fn views(&self) -> &[ViewDescriptor] {
        &self.views
    }
}

impl FrameGraphSource for FrameGraph {
    fn leaves(&self) -> Vec<ViewDescriptor> {
        self.views.clone()
    }
}

impl<T: FrameGraphSource + ?Sized> FrameGraphSource for std::sync::Arc<T> {
    fn leaves(&self) -> Vec<ViewDescriptor> {
        (**self).leaves()
    }
}

impl<T: FrameGraphSource + ?Sized> FrameGraphSource for std::sync::RwLock<T> {
    fn leaves(&self) -> Vec<ViewDescriptor> {
        match self.read() {
            Ok(source) => source.leaves(),
            Err(poisoned) => {
                log::warn!("frame graph lock poisoned, reading last written leaves");
                poisoned.into_inner().leaves()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPAQUE: LayerId = LayerId(1);
    const UI: LayerId = LayerId(2);

    fn filter(mode: LayerFilterMode) -> LayerFilter {
        LayerFilter {
            mode,
            layers: vec![OPAQUE, UI],
        }
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let filter = LayerFilter::default();
        assert!(filter.accepts(&[]));
        assert!(filter.accepts(&[UI]));
    }

    #[test]
    fn accept_modes() {
        assert!(filter(LayerFilterMode::AcceptAnyMatchingLayers).accepts(&[UI]));
        assert!(!filter(LayerFilterMode::AcceptAnyMatchingLayers).accepts(&[LayerId(9)]));
        assert!(!filter(LayerFilterMode::AcceptAllMatchingLayers).accepts(&[UI]));
        assert!(filter(LayerFilterMode::AcceptAllMatchingLayers).accepts(&[UI, OPAQUE]));
    }

    #[test]
    fn discard_modes() {
        assert!(!filter(LayerFilterMode::DiscardAnyMatchingLayers).accepts(&[UI]));
        assert!(filter(LayerFilterMode::DiscardAnyMatchingLayers).accepts(&[]));
        assert!(filter(LayerFilterMode::DiscardAllMatchingLayers).accepts(&[UI]));
        assert!(!filter(LayerFilterMode::DiscardAllMatchingLayers).accepts(&[OPAQUE, UI]));
    }

    #[test]
    fn frame_graph_parses_from_ron() {
        let text = r#"[
            (name: "main", layer_filter: (mode: DiscardAnyMatchingLayers, layers: [2])),
            (name: "overlay", frustum_culling: false, clear: (buffers: "DEPTH")),
        ]"#;
        let graph: FrameGraph = ron::from_str(text).unwrap();
        let leaves = graph.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].layer_filter.layers, vec![UI]);
        assert!(leaves[0].frustum_culling);
        assert!(!leaves[1].frustum_culling);
        assert_eq!(leaves[1].clear.buffers, ClearBuffers::DEPTH);
        assert_eq!(leaves[1].viewport, Viewport::default());
    }
}
