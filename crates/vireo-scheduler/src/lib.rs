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

//! # Vireo Scheduler
//!
//! Turns "what changed since the last frame" into "what must run this frame,
//! and in what order".
//!
//! Each frame, [`FrameScheduler::render_bin_jobs`] reads the accumulated
//! [`DirtyFlags`](vireo_core::DirtyFlags), enumerates the active frame-graph
//! leaves and assembles a [`JobGraph`](vireo_core::JobGraph) from:
//!
//! - the barrier chain ([`barrier`]),
//! - the jobs scheduled every frame and those selected by dirty state
//!   ([`policy`]),
//! - one sub-graph per leaf ([`view_builder`]),
//!
//! then wires the dependency edges from declarative rule tables
//! ([`wiring`]) and checks the result ([`validate`]).

#![warn(missing_docs)]

pub mod barrier;
pub mod config;
pub mod dirty;
pub mod frame;
pub mod policy;
pub mod scheduler;
pub mod validate;
pub mod view_builder;
pub mod wiring;

pub use barrier::{Barrier, BarrierChain};
pub use config::{ConfigError, SchedulerConfig};
pub use dirty::DirtyStateTracker;
pub use frame::FrameJobs;
pub use scheduler::FrameScheduler;
pub use validate::{validate_frame, OrderingViolation};
pub use view_builder::ViewBuilder;
pub use wiring::DependencyRule;
