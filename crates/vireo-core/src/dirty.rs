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

//! Change categories recorded by the scene between two consumed frames.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// A set of scene change categories.
    ///
    /// Producers OR flags in as the scene mutates; the scheduler reads the
    /// accumulated set once per frame to decide which conditional jobs run.
    ///
    /// [`DirtyFlags::ALL`] is tracked as its own bit. It stands for "every
    /// category" when jobs are selected (see [`DirtyFlags::effective`]) but is
    /// never synthesized from the individual bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct DirtyFlags: u32 {
        /// Entities were enabled or disabled.
        const ENTITY_ENABLED = 1 << 0;
        /// Local transforms changed.
        const TRANSFORM = 1 << 1;
        /// Geometry (attributes, index data) changed.
        const GEOMETRY = 1 << 2;
        /// Buffer contents changed.
        const BUFFERS = 1 << 3;
        /// Textures or texture images changed.
        const TEXTURES = 1 << 4;
        /// Skeleton sources or joint data changed.
        const SKELETON_DATA = 1 << 5;
        /// Materials or their parameters changed.
        const MATERIALS = 1 << 6;
        /// Techniques or their filter keys changed.
        const TECHNIQUES = 1 << 7;
        /// Shader programs changed.
        const SHADERS = 1 << 8;
        /// Layers or layer filters changed.
        const LAYERS = 1 << 9;
        /// Everything must be considered dirty.
        const ALL = 1 << 31;
    }
}

impl DirtyFlags {
    /// Returns the set used for job selection.
    ///
    /// When [`DirtyFlags::ALL`] is present every category is reported as set;
    /// otherwise the flags are returned unchanged.
    #[must_use]
    pub fn effective(self) -> Self {
        if self.contains(Self::ALL) {
            Self::all()
        } else {
            self
        }
    }

    /// Returns `true` if any of `categories` is set, taking `ALL` into account.
    #[must_use]
    pub fn requests(self, categories: Self) -> bool {
        self.effective().intersects(categories)
    }
}
