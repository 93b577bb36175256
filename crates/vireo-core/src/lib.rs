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

//! # Vireo Core
//!
//! Foundational crate containing the job-graph data model and the contracts
//! shared between the scheduler, the executor, and their external
//! collaborators (scene storage, frame-graph description, job bodies).

#![warn(missing_docs)]

pub mod dirty;
pub mod error;
pub mod graph;
pub mod handler;
pub mod job;
pub mod managers;
pub mod report;
pub mod view;

pub use dirty::DirtyFlags;
pub use error::{CycleError, JobError};
pub use graph::JobGraph;
pub use handler::{JobContext, JobHandler};
pub use job::{JobId, JobKind, JobRecord, Shard};
pub use managers::{NodeId, NodeKind, NodeManagers, SceneNodeStore};
pub use report::{FrameReport, JobStatus};
pub use view::{
    ClearBuffers, ClearParameters, FrameGraph, FrameGraphSource, LayerFilter, LayerFilterMode,
    LayerId, ProximityFilter, ViewDescriptor, Viewport,
};
