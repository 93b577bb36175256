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

//! Per-leaf sub-graph construction.

use crate::config::MAX_SHARDS;
use crate::policy;
use std::ops::Range;
use vireo_core::{DirtyFlags, JobGraph, JobKind, Shard};

/// Jobs every frame-graph leaf contains, in insertion order.
///
/// [`JobKind::RenderViewCommandBuilder`] is fanned out into
/// `optimal_job_count()` shards.
pub const VIEW_BASE_JOBS: [JobKind; 12] = [
    JobKind::RenderViewInitializer,
    JobKind::SyncRenderViewInitialization,
    JobKind::RenderableEntityFilter,
    JobKind::ComputableEntityFilter,
    JobKind::LightGatherer,
    JobKind::SyncFrustumCulling,
    JobKind::FrustumCulling,
    JobKind::FilterProximity,
    JobKind::SetClearDrawBufferIndex,
    JobKind::SyncRenderCommandBuilding,
    JobKind::RenderViewCommandBuilder,
    JobKind::SyncRenderViewCommandBuilders,
];

/// Builds the jobs of one frame-graph leaf.
#[derive(Debug, Clone, Copy)]
pub struct ViewBuilder {
    view: usize,
    flags: DirtyFlags,
    job_count: usize,
}

impl ViewBuilder {
    /// Creates a builder for leaf `view`, fanning out into `job_count` shards.
    ///
    /// `job_count` is clamped to `1..=MAX_SHARDS`; the scheduler's
    /// `optimal_job_count()` already lies in that range.
    pub fn new(view: usize, flags: DirtyFlags, job_count: usize) -> Self {
        Self {
            view,
            flags,
            job_count: job_count.clamp(1, MAX_SHARDS),
        }
    }

    /// Adds the leaf's jobs to `graph` and returns the range of arena indices
    /// they occupy. Edges are left to the wiring pass.
    pub fn build(&self, graph: &mut JobGraph) -> Range<usize> {
        let start = graph.len();
        let conditional = policy::view_jobs(self.flags);
        for &kind in VIEW_BASE_JOBS.iter().chain(conditional.iter()) {
            self.add(graph, kind);
        }
        let end = graph.len();
        log::trace!(
            "view {}: {} jobs ({} conditional kinds)",
            self.view,
            end - start,
            conditional.len()
        );
        start..end
    }

    fn add(&self, graph: &mut JobGraph, kind: JobKind) {
        if !kind.is_fanned_out() {
            graph.add_view_job(kind, self.view, None);
            return;
        }
        // Clamped to MAX_SHARDS in `new`.
        let count = self.job_count as u16;
        for index in 0..count {
            graph.add_view_job(kind, self.view, Some(Shard::new(index, count)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_view_has_eleven_plus_n_jobs() {
        for n in [1, 2, 8] {
            let mut graph = JobGraph::new();
            let range = ViewBuilder::new(0, DirtyFlags::empty(), n).build(&mut graph);
            assert_eq!(range.len(), 11 + n);
            assert_eq!(graph.count_of(JobKind::RenderViewCommandBuilder), n);
        }
    }

    #[test]
    fn materials_add_n_gatherers_and_one_sync() {
        let mut graph = JobGraph::new();
        let range = ViewBuilder::new(2, DirtyFlags::MATERIALS, 3).build(&mut graph);
        assert_eq!(range.len(), 11 + 3 + 3 + 1);
        assert_eq!(graph.find_scoped(JobKind::MaterialGatherer, Some(2)).len(), 3);
        assert_eq!(graph.find_scoped(JobKind::SyncMaterialGatherer, Some(2)).len(), 1);
    }

    #[test]
    fn shards_are_numbered_in_order() {
        let mut graph = JobGraph::new();
        ViewBuilder::new(0, DirtyFlags::empty(), 4).build(&mut graph);
        let shards: Vec<u16> = graph
            .find_all(JobKind::RenderViewCommandBuilder)
            .into_iter()
            .filter_map(|id| graph.job(id).shard())
            .map(|shard| shard.index)
            .collect();
        assert_eq!(shards, vec![0, 1, 2, 3]);
    }

    #[test]
    fn zero_job_count_is_raised_to_one() {
        let mut graph = JobGraph::new();
        let range = ViewBuilder::new(0, DirtyFlags::empty(), 0).build(&mut graph);
        assert_eq!(range.len(), 12);
    }
}
