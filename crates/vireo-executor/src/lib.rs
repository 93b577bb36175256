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

//! # Vireo Executor
//!
//! Runs a frame's [`JobGraph`](vireo_core::JobGraph) on a pool of worker
//! threads, honoring every dependency edge, and reports per-job outcomes.

#![warn(missing_docs)]

pub mod executor;

pub use executor::{ExecutorError, JobExecutor};
pub use vireo_core::{FrameReport, JobStatus};
