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

//! Declarative dependency rules and the pass that turns them into edges.
//!
//! A rule names kinds, not jobs. When wiring, a predecessor kind resolves
//! against the dependent's scope:
//!
//! - view-scoped dependent, view-scoped predecessor: the predecessor's jobs
//!   (every shard) in the same view;
//! - frame-scoped dependent, view-scoped predecessor: the predecessor's jobs
//!   in every view;
//! - frame-scoped predecessor: the frame-scoped job of that kind.
//!
//! Kinds absent from the frame are skipped, so a rule never forces a job into
//! existence.

use crate::barrier::{BARRIER_RULES, SATELLITE_RULES};
use vireo_core::{JobGraph, JobId, JobKind};

/// "`dependent` starts only after every job of each `predecessors` kind."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyRule {
    /// The kind receiving the edges.
    pub dependent: JobKind,
    /// Kinds that must complete first.
    pub predecessors: &'static [JobKind],
}

impl DependencyRule {
    /// Creates a rule.
    pub const fn new(dependent: JobKind, predecessors: &'static [JobKind]) -> Self {
        Self {
            dependent,
            predecessors,
        }
    }
}

/// Ordering of the frame-scoped scene update jobs.
pub const SCENE_RULES: &[DependencyRule] = &[
    DependencyRule::new(JobKind::UpdateWorldTransform, &[JobKind::UpdateTreeEnabled]),
    DependencyRule::new(
        JobKind::UpdateWorldBoundingVolume,
        &[JobKind::UpdateWorldTransform, JobKind::CalculateBoundingVolume],
    ),
    DependencyRule::new(JobKind::UpdateShaderDataTransform, &[JobKind::UpdateWorldTransform]),
    DependencyRule::new(JobKind::CalculateBoundingVolume, &[JobKind::BufferGatherer]),
    DependencyRule::new(JobKind::UpdateMeshTriangleList, &[JobKind::BufferGatherer]),
    DependencyRule::new(
        JobKind::ExpandBoundingVolume,
        &[JobKind::UpdateWorldBoundingVolume, JobKind::CalculateBoundingVolume],
    ),
    DependencyRule::new(
        JobKind::UpdateLevelOfDetail,
        &[JobKind::ExpandBoundingVolume, JobKind::UpdateWorldTransform],
    ),
    DependencyRule::new(
        JobKind::UpdateSkinningPalette,
        &[JobKind::SyncSkeletonLoading, JobKind::UpdateWorldTransform],
    ),
    DependencyRule::new(
        JobKind::FrameCleanup,
        &[
            JobKind::EndDrawing,
            JobKind::SetClearDrawBufferIndex,
            JobKind::SyncRenderViewCommandBuilders,
        ],
    ),
    DependencyRule::new(JobKind::SendRenderCapture, &[JobKind::EndDrawing]),
    DependencyRule::new(JobKind::SendBufferCapture, &[JobKind::EndDrawing]),
];

/// Ordering inside each frame-graph leaf.
pub const VIEW_RULES: &[DependencyRule] = &[
    DependencyRule::new(
        JobKind::SyncRenderViewInitialization,
        &[JobKind::RenderViewInitializer],
    ),
    DependencyRule::new(
        JobKind::SetClearDrawBufferIndex,
        &[JobKind::SyncRenderViewInitialization],
    ),
    DependencyRule::new(JobKind::RenderableEntityFilter, &[JobKind::UpdateTreeEnabled]),
    DependencyRule::new(JobKind::ComputableEntityFilter, &[JobKind::UpdateTreeEnabled]),
    DependencyRule::new(JobKind::LightGatherer, &[JobKind::UpdateWorldTransform]),
    DependencyRule::new(
        JobKind::SyncFrustumCulling,
        &[JobKind::RenderViewInitializer, JobKind::UpdateWorldTransform],
    ),
    DependencyRule::new(
        JobKind::FrustumCulling,
        &[
            JobKind::SyncFrustumCulling,
            JobKind::ExpandBoundingVolume,
            JobKind::UpdateShaderDataTransform,
        ],
    ),
    DependencyRule::new(
        JobKind::FilterProximity,
        &[
            JobKind::SyncRenderViewInitialization,
            JobKind::ExpandBoundingVolume,
        ],
    ),
    DependencyRule::new(
        JobKind::FilterEntityByLayer,
        &[
            JobKind::SyncRenderViewInitialization,
            JobKind::UpdateTreeEnabled,
        ],
    ),
    DependencyRule::new(JobKind::SyncFilterEntityByLayer, &[JobKind::FilterEntityByLayer]),
    DependencyRule::new(
        JobKind::MaterialGatherer,
        &[JobKind::FilterCompatibleTechniques, JobKind::ShaderGatherer],
    ),
    DependencyRule::new(JobKind::SyncMaterialGatherer, &[JobKind::MaterialGatherer]),
    DependencyRule::new(
        JobKind::SyncRenderCommandBuilding,
        &[
            JobKind::SyncRenderViewInitialization,
            JobKind::RenderableEntityFilter,
            JobKind::ComputableEntityFilter,
            JobKind::LightGatherer,
            JobKind::FrustumCulling,
            JobKind::FilterProximity,
            JobKind::SyncFilterEntityByLayer,
            JobKind::SyncMaterialGatherer,
        ],
    ),
    DependencyRule::new(
        JobKind::RenderViewCommandBuilder,
        &[JobKind::SyncRenderCommandBuilding],
    ),
    DependencyRule::new(
        JobKind::SyncRenderViewCommandBuilders,
        &[JobKind::RenderViewCommandBuilder],
    ),
];

/// Every rule table applied to a frame, in application order.
pub const FRAME_RULES: [&[DependencyRule]; 4] =
    [BARRIER_RULES, SATELLITE_RULES, SCENE_RULES, VIEW_RULES];

/// Number of frame-graph leaves that have at least one job in `graph`.
pub fn view_count(graph: &JobGraph) -> usize {
    graph
        .jobs()
        .iter()
        .filter_map(|job| job.view())
        .max()
        .map_or(0, |last| last + 1)
}

/// The jobs of kind `predecessor` a job scoped to `view` must wait for.
pub fn resolve(
    graph: &JobGraph,
    predecessor: JobKind,
    view: Option<usize>,
    views: usize,
) -> Vec<JobId> {
    if !predecessor.is_view_scoped() {
        return graph.find_scoped(predecessor, None).to_vec();
    }
    match view {
        Some(view) => graph.find_scoped(predecessor, Some(view)).to_vec(),
        None => (0..views)
            .flat_map(|v| graph.find_scoped(predecessor, Some(v)).iter().copied())
            .collect(),
    }
}

/// Applies `rules` to `graph` and returns the number of edges added.
pub fn wire(graph: &mut JobGraph, rules: &[DependencyRule], views: usize) -> usize {
    let mut edges = Vec::new();
    for rule in rules {
        for dependent in graph.find_all(rule.dependent) {
            let view = graph.job(dependent).view();
            for &predecessor in rule.predecessors {
                for target in resolve(graph, predecessor, view, views) {
                    edges.push((dependent, target));
                }
            }
        }
    }
    let mut added = 0;
    for (dependent, predecessor) in edges {
        if graph.add_dependency(dependent, predecessor) {
            added += 1;
        }
    }
    added
}

/// Applies every table of [`FRAME_RULES`] and returns the number of edges
/// added.
pub fn wire_frame(graph: &mut JobGraph) -> usize {
    let views = view_count(graph);
    FRAME_RULES
        .iter()
        .map(|rules| wire(graph, rules, views))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vireo_core::Shard;

    #[test]
    fn absent_kinds_are_skipped() {
        let mut graph = JobGraph::new();
        let cleanup = graph.add_job(JobKind::FrameCleanup);
        let added = wire(&mut graph, SCENE_RULES, 0);
        assert_eq!(added, 0);
        assert!(graph.job(cleanup).dependencies().is_empty());
    }

    #[test]
    fn view_predecessors_resolve_within_their_view() {
        let mut graph = JobGraph::new();
        let init0 = graph.add_view_job(JobKind::RenderViewInitializer, 0, None);
        let init1 = graph.add_view_job(JobKind::RenderViewInitializer, 1, None);
        let sync0 = graph.add_view_job(JobKind::SyncRenderViewInitialization, 0, None);
        let sync1 = graph.add_view_job(JobKind::SyncRenderViewInitialization, 1, None);
        wire(&mut graph, VIEW_RULES, 2);
        assert_eq!(graph.job(sync0).dependencies(), &[init0]);
        assert_eq!(graph.job(sync1).dependencies(), &[init1]);
    }

    #[test]
    fn frame_dependents_wait_for_every_view_and_shard() {
        let mut graph = JobGraph::new();
        let cleanup = graph.add_job(JobKind::FrameCleanup);
        let merges: Vec<JobId> = (0..3)
            .map(|v| graph.add_view_job(JobKind::SyncRenderViewCommandBuilders, v, None))
            .collect();
        let sync = graph.add_view_job(JobKind::SyncRenderCommandBuilding, 0, None);
        let builders: Vec<JobId> = (0..4)
            .map(|i| {
                graph.add_view_job(JobKind::RenderViewCommandBuilder, 0, Some(Shard::new(i, 4)))
            })
            .collect();
        wire_frame(&mut graph);

        for merge in &merges {
            assert!(graph.depends_on(cleanup, *merge));
        }
        for builder in &builders {
            assert!(graph.depends_on(*builder, sync));
            assert!(graph.depends_on(merges[0], *builder));
            assert!(!graph.depends_on(merges[1], *builder));
        }
    }

    #[test]
    fn wiring_twice_adds_nothing() {
        let mut graph = JobGraph::new();
        graph.add_job(JobKind::UpdateWorldTransform);
        graph.add_job(JobKind::UpdateShaderDataTransform);
        assert_eq!(wire_frame(&mut graph), 1);
        assert_eq!(wire_frame(&mut graph), 0);
    }

    #[test]
    fn rules_never_reference_a_kind_twice_as_dependent_within_a_table() {
        for table in FRAME_RULES {
            let mut seen = Vec::new();
            for rule in table {
                assert!(!seen.contains(&rule.dependent), "{} repeated", rule.dependent);
                seen.push(rule.dependent);
            }
        }
    }
}
