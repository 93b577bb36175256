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

//! The result of one `render_bin_jobs` call.

use crate::barrier::{Barrier, BarrierChain};
use vireo_core::{
    DirtyFlags, JobContext, JobGraph, JobId, JobKind, JobRecord, ViewDescriptor,
};

/// The jobs of one frame, ready for execution.
///
/// Owns the wired [`JobGraph`] together with what the graph was built from:
/// the frame-graph leaves, the dirty snapshot it consumed and the shard count
/// used for fanned-out stages.
#[derive(Debug, Clone)]
pub struct FrameJobs {
    pub(crate) frame_index: u64,
    pub(crate) graph: JobGraph,
    pub(crate) barriers: BarrierChain,
    pub(crate) views: Vec<ViewDescriptor>,
    pub(crate) consumed: DirtyFlags,
    pub(crate) deferred: DirtyFlags,
    pub(crate) parallelism: usize,
}

impl FrameJobs {
    /// Sequence number of the frame.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Number of jobs.
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// Returns `true` if the frame holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// The jobs in insertion order.
    pub fn jobs(&self) -> &[JobRecord] {
        self.graph.jobs()
    }

    /// The wired job graph.
    pub fn graph(&self) -> &JobGraph {
        &self.graph
    }

    /// The job standing for `barrier`.
    pub fn barrier(&self, barrier: Barrier) -> JobId {
        self.barriers.get(barrier)
    }

    /// The first frame-scoped job of `kind`, if scheduled.
    pub fn find(&self, kind: JobKind) -> Option<JobId> {
        self.graph.find(kind)
    }

    /// The frame-graph leaves, indexed by [`JobRecord::view`].
    pub fn views(&self) -> &[ViewDescriptor] {
        &self.views
    }

    /// The dirty flags this frame was built from.
    pub fn consumed_flags(&self) -> DirtyFlags {
        self.consumed
    }

    /// Categories whose jobs were left out because the graphics context was
    /// not ready. They are marked dirty again when the frame completes.
    pub fn deferred_flags(&self) -> DirtyFlags {
        self.deferred
    }

    /// Shard count used by fanned-out stages.
    pub fn optimal_job_count(&self) -> usize {
        self.parallelism
    }

    /// The context handed to job bodies.
    pub fn context(&self) -> JobContext<'_> {
        JobContext::new(self.frame_index, &self.views)
    }

    /// Adds a driver job that starts once `barrier` completed.
    ///
    /// The new job does not hold back the rest of the chain.
    pub fn insert_job_after(&mut self, name: &'static str, barrier: Barrier) -> JobId {
        let id = self.graph.add_job(JobKind::Custom(name));
        self.graph.add_dependency(id, self.barriers.get(barrier));
        log::debug!("frame {}: inserted {name} after {barrier}", self.frame_index);
        id
    }

    /// Adds a driver job that must complete before `barrier` may start.
    ///
    /// The job runs inside the stage ending at `barrier`: it also waits for
    /// the preceding barrier, if there is one.
    pub fn insert_job_before(&mut self, name: &'static str, barrier: Barrier) -> JobId {
        let id = self.graph.add_job(JobKind::Custom(name));
        self.graph.add_dependency(self.barriers.get(barrier), id);
        if let Some(previous) = barrier.previous() {
            self.graph.add_dependency(id, self.barriers.get(previous));
        }
        log::debug!("frame {}: inserted {name} before {barrier}", self.frame_index);
        id
    }
}
