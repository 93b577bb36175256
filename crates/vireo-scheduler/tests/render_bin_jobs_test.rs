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

//! Integration tests for per-frame job-graph construction.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};
use vireo_core::{
    DirtyFlags, FrameGraph, JobId, JobKind, NodeKind, SceneNodeStore, ViewDescriptor,
};
use vireo_scheduler::{validate_frame, Barrier, FrameJobs, FrameScheduler, SchedulerConfig};

const WORKERS: usize = 4;
const ENTITIES: usize = 100;
/// `min(4 workers, ceil(100 / 32))`
const N: usize = 4;

const BARRIERS: usize = 5;
const PER_FRAME: usize = 6;
const VIEW_BASE: usize = 11;

const CATEGORIES: [DirtyFlags; 10] = [
    DirtyFlags::ENTITY_ENABLED,
    DirtyFlags::TRANSFORM,
    DirtyFlags::GEOMETRY,
    DirtyFlags::BUFFERS,
    DirtyFlags::TEXTURES,
    DirtyFlags::SKELETON_DATA,
    DirtyFlags::MATERIALS,
    DirtyFlags::TECHNIQUES,
    DirtyFlags::SHADERS,
    DirtyFlags::LAYERS,
];

struct Fixture {
    scheduler: FrameScheduler,
    frame_graph: Arc<RwLock<FrameGraph>>,
}

impl Fixture {
    fn with_views(count: usize) -> Self {
        let store = SceneNodeStore::new();
        for _ in 0..ENTITIES {
            store.insert(NodeKind::Entity);
        }
        let views = (0..count)
            .map(|i| ViewDescriptor::named(format!("view-{i}")))
            .collect();
        let frame_graph = Arc::new(RwLock::new(FrameGraph::new(views)));
        let config = SchedulerConfig {
            worker_threads: Some(WORKERS),
            ..SchedulerConfig::default()
        };
        let scheduler = FrameScheduler::new(config, Arc::new(store), frame_graph.clone());
        Self {
            scheduler,
            frame_graph,
        }
    }

    fn build(&self, flags: DirtyFlags) -> FrameJobs {
        self.scheduler.clear_dirty_bits(DirtyFlags::ALL);
        self.scheduler.mark_dirty(flags);
        self.scheduler.render_bin_jobs()
    }
}

/// Job count computed from the policy as documented, independently of the
/// scheduler's tables.
fn expected_job_count(flags: DirtyFlags, views: usize, context_ready: bool) -> usize {
    let all = flags.contains(DirtyFlags::ALL);
    let has = |flag: DirtyFlags| all || flags.contains(flag);

    let mut frame: BTreeSet<&str> = BTreeSet::new();
    if has(DirtyFlags::ENTITY_ENABLED) {
        frame.insert("tree-enabled");
    }
    if has(DirtyFlags::TRANSFORM) {
        frame.extend(["world-transform", "world-bv", "shader-data", "expand-bv"]);
    }
    if has(DirtyFlags::GEOMETRY) {
        frame.extend(["calculate-bv", "triangle-list", "expand-bv"]);
    }
    if has(DirtyFlags::BUFFERS) {
        frame.insert("buffers");
    }
    if has(DirtyFlags::TEXTURES) {
        frame.extend(["load-textures", "texture-gatherer"]);
    }
    if has(DirtyFlags::SKELETON_DATA) {
        frame.insert("skeletons");
    }
    if context_ready && has(DirtyFlags::TECHNIQUES) {
        frame.insert("techniques");
    }
    if context_ready && has(DirtyFlags::SHADERS) {
        frame.insert("shaders");
    }

    let mut per_view = VIEW_BASE + N;
    if has(DirtyFlags::ENTITY_ENABLED) || has(DirtyFlags::LAYERS) {
        per_view += 2;
    }
    if has(DirtyFlags::MATERIALS) {
        per_view += N + 1;
    }

    BARRIERS + PER_FRAME + frame.len() + views * per_view
}

fn position(order: &[JobId], id: JobId) -> usize {
    order
        .iter()
        .position(|&x| x == id)
        .expect("job missing from topological order")
}

#[test]
fn scenario_a_no_views_clean_state() {
    let fixture = Fixture::with_views(0);

    let frame = fixture.build(DirtyFlags::empty());

    assert_eq!(frame.len(), 11, "5 barriers + 6 per-frame jobs");
    for barrier in Barrier::CHAIN {
        assert_eq!(frame.graph().job(frame.barrier(barrier)).kind(), barrier.kind());
    }
    assert!(frame.jobs().iter().all(|job| job.view().is_none()));
}

#[test]
fn scenario_b_entity_enabled_adds_three_jobs() {
    let fixture = Fixture::with_views(1);
    let baseline = fixture.build(DirtyFlags::empty()).len();

    let frame = fixture.build(DirtyFlags::ENTITY_ENABLED);

    assert_eq!(baseline, BARRIERS + PER_FRAME + VIEW_BASE + N);
    assert_eq!(frame.len(), baseline + 3);
    assert!(frame.find(JobKind::UpdateTreeEnabled).is_some());
    assert_eq!(frame.graph().count_of(JobKind::FilterEntityByLayer), 1);
    assert_eq!(frame.graph().count_of(JobKind::SyncFilterEntityByLayer), 1);
}

#[test]
fn scenario_c_all_with_context_adds_full_superset() {
    let fixture = Fixture::with_views(1);
    fixture.scheduler.set_context_ready(true);
    let baseline = fixture.build(DirtyFlags::empty()).len();

    let frame = fixture.build(DirtyFlags::ALL);

    // 13 frame-scoped conditional jobs, layer filter + sync, N gatherers + sync.
    assert_eq!(frame.len(), baseline + 13 + 2 + N + 1);
    let graph = frame.graph();
    assert_eq!(graph.count_of(JobKind::MaterialGatherer), N);
    assert_eq!(graph.count_of(JobKind::SyncMaterialGatherer), 1);
    assert!(frame.find(JobKind::FilterCompatibleTechniques).is_some());
    assert!(frame.find(JobKind::ShaderGatherer).is_some());
    assert_eq!(graph.count_of(JobKind::ExpandBoundingVolume), 1);
}

#[test]
fn scenario_d_geometry_then_transform_shares_expand_bounding_volume() {
    let fixture = Fixture::with_views(1);
    fixture.scheduler.clear_dirty_bits(DirtyFlags::ALL);

    fixture.scheduler.mark_dirty(DirtyFlags::GEOMETRY);
    fixture.scheduler.mark_dirty(DirtyFlags::TRANSFORM);
    let frame = fixture.scheduler.render_bin_jobs();

    assert_eq!(frame.graph().count_of(JobKind::ExpandBoundingVolume), 1);
    assert_eq!(
        frame.len(),
        expected_job_count(DirtyFlags::GEOMETRY | DirtyFlags::TRANSFORM, 1, false)
    );
}

#[test]
fn context_not_ready_omits_technique_and_shader_jobs() {
    let fixture = Fixture::with_views(1);

    let frame = fixture.build(DirtyFlags::ALL);

    assert!(frame.find(JobKind::FilterCompatibleTechniques).is_none());
    assert!(frame.find(JobKind::ShaderGatherer).is_none());
    assert_eq!(frame.len(), expected_job_count(DirtyFlags::ALL, 1, false));
}

#[test]
fn job_count_matches_policy_for_every_flag_combination() {
    for views in [0, 2] {
        let fixture = Fixture::with_views(views);
        for ready in [false, true] {
            fixture.scheduler.set_context_ready(ready);
            for mask in 0u32..(1 << CATEGORIES.len()) {
                let flags = CATEGORIES
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| mask & (1 << bit) != 0)
                    .fold(DirtyFlags::empty(), |acc, (_, flag)| acc | *flag);

                let frame = fixture.build(flags);

                assert_eq!(
                    frame.len(),
                    expected_job_count(flags, views, ready),
                    "flags {flags:?}, views {views}, context ready {ready}"
                );
            }
        }
    }
}

#[test]
fn every_flag_pair_inserts_shared_jobs_once() {
    let fixture = Fixture::with_views(2);
    fixture.scheduler.set_context_ready(true);
    for (i, &a) in CATEGORIES.iter().enumerate() {
        for &b in &CATEGORIES[i + 1..] {
            let frame = fixture.build(a | b);
            let graph = frame.graph();
            for job in frame.jobs() {
                let same_scope = graph.find_scoped(job.kind(), job.view()).len();
                let limit = if job.kind().is_fanned_out() { N } else { 1 };
                assert!(
                    same_scope <= limit,
                    "{} appears {same_scope} times for {:?}",
                    job.kind(),
                    a | b
                );
            }
        }
    }
}

#[test]
fn building_twice_without_changes_is_idempotent() {
    let fixture = Fixture::with_views(2);
    fixture.scheduler.mark_dirty(DirtyFlags::TRANSFORM | DirtyFlags::TEXTURES);

    let first = fixture.scheduler.render_bin_jobs();
    let second = fixture.scheduler.render_bin_jobs();

    assert_eq!(first.graph().composition(), second.graph().composition());
    assert_eq!(first.consumed_flags(), second.consumed_flags());
    assert_eq!(
        fixture.scheduler.dirty_flags(),
        DirtyFlags::TRANSFORM | DirtyFlags::TEXTURES,
        "building must not clear dirty state"
    );
}

#[test]
fn clearing_all_restores_the_baseline() {
    let fixture = Fixture::with_views(1);
    let baseline = fixture.build(DirtyFlags::empty());

    fixture.scheduler.mark_dirty(DirtyFlags::ALL | DirtyFlags::GEOMETRY);
    fixture.scheduler.clear_dirty_bits(DirtyFlags::ALL);
    let after = fixture.scheduler.render_bin_jobs();

    assert_eq!(after.graph().composition(), baseline.graph().composition());
}

#[test]
fn full_frame_respects_ordering_invariants() {
    let fixture = Fixture::with_views(2);
    fixture.scheduler.set_context_ready(true);

    let frame = fixture.build(DirtyFlags::ALL);

    let graph = frame.graph();
    assert_eq!(validate_frame(graph), Ok(()));
    for pair in Barrier::CHAIN.windows(2) {
        assert!(graph.depends_on(frame.barrier(pair[1]), frame.barrier(pair[0])));
    }
    let begin = frame.barrier(Barrier::BeginDrawing);
    let gl = frame.barrier(Barrier::UpdateGlResources);
    let prepare = frame.barrier(Barrier::PrepareCommandSubmission);
    let techniques = frame.find(JobKind::FilterCompatibleTechniques).unwrap();
    let textures = frame.find(JobKind::LoadTextureData).unwrap();
    assert!(graph.depends_on(techniques, begin));
    assert!(graph.depends_on(gl, techniques));
    assert!(graph.depends_on(textures, gl));
    assert!(graph.depends_on(prepare, textures));

    for job in frame.jobs().iter().filter(|j| j.kind().mutates_gpu_state()) {
        assert!(graph.reaches(job.id(), gl), "{job} must follow UpdateGlResources");
    }

    let order = graph.topological_order().expect("frame graph must be acyclic");
    for job in frame.jobs() {
        for &dep in job.dependencies() {
            assert!(position(&order, dep) < position(&order, job.id()));
        }
    }
}

#[test]
fn scene_updates_precede_culling_in_every_view() {
    let fixture = Fixture::with_views(2);

    let frame = fixture.build(DirtyFlags::TRANSFORM | DirtyFlags::GEOMETRY);

    let graph = frame.graph();
    let expand = frame.find(JobKind::ExpandBoundingVolume).unwrap();
    let world = frame.find(JobKind::UpdateWorldTransform).unwrap();
    assert!(graph.reaches(expand, world));
    for view in 0..2 {
        let culling = graph.find_scoped(JobKind::FrustumCulling, Some(view))[0];
        assert!(graph.depends_on(culling, expand));
        let proximity = graph.find_scoped(JobKind::FilterProximity, Some(view))[0];
        assert!(graph.depends_on(proximity, expand));
    }
    let lod = frame.find(JobKind::UpdateLevelOfDetail).unwrap();
    assert!(graph.depends_on(lod, expand));
}

#[test]
fn views_are_wired_independently() {
    let fixture = Fixture::with_views(3);

    let frame = fixture.build(DirtyFlags::MATERIALS);

    let graph = frame.graph();
    let cleanup = frame.find(JobKind::FrameCleanup).unwrap();
    let prepare = frame.barrier(Barrier::PrepareCommandSubmission);
    for view in 0..3 {
        let merge = graph.find_scoped(JobKind::SyncRenderViewCommandBuilders, Some(view));
        assert_eq!(merge.len(), 1);
        assert!(graph.depends_on(cleanup, merge[0]));
        assert!(graph.depends_on(prepare, merge[0]));

        let sync = graph.find_scoped(JobKind::SyncRenderCommandBuilding, Some(view))[0];
        for record in graph.jobs().iter().filter(|j| j.id() != sync) {
            if graph.depends_on(sync, record.id()) && record.kind().is_view_scoped() {
                assert_eq!(record.view(), Some(view), "{record} leaked into view {view}");
            }
        }
        let gatherers = graph.find_scoped(JobKind::MaterialGatherer, Some(view));
        assert_eq!(gatherers.len(), N);
        let material_sync = graph.find_scoped(JobKind::SyncMaterialGatherer, Some(view))[0];
        for &gatherer in gatherers {
            assert!(graph.depends_on(material_sync, gatherer));
        }
        assert!(graph.depends_on(sync, material_sync));
    }
}

#[test]
fn leaves_are_enumerated_every_frame() {
    let fixture = Fixture::with_views(1);
    let one = fixture.build(DirtyFlags::empty()).len();

    fixture
        .frame_graph
        .write()
        .unwrap()
        .push(ViewDescriptor::named("overlay"));
    let two = fixture.build(DirtyFlags::empty());

    assert_eq!(two.len(), one + VIEW_BASE + N);
    assert_eq!(two.views().len(), 2);
    assert_eq!(two.views()[1].name, "overlay");
}

#[test]
fn inserted_jobs_are_anchored_to_barriers() {
    let fixture = Fixture::with_views(1);
    let mut frame = fixture.build(DirtyFlags::empty());
    let before = frame.len();

    let readback = frame.insert_job_after("readback", Barrier::EndDrawing);
    let upload = frame.insert_job_before("upload", Barrier::UpdateGlResources);

    let graph = frame.graph();
    assert_eq!(frame.len(), before + 2);
    assert_eq!(graph.job(readback).kind(), JobKind::Custom("readback"));
    assert!(graph.depends_on(readback, frame.barrier(Barrier::EndDrawing)));
    assert!(graph.depends_on(frame.barrier(Barrier::UpdateGlResources), upload));
    assert!(graph.depends_on(upload, frame.barrier(Barrier::BeginDrawing)));
    assert_eq!(validate_frame(graph), Ok(()));
}

#[test]
fn parallelism_follows_scene_size() {
    let store = Arc::new(SceneNodeStore::new());
    let scheduler = FrameScheduler::new(
        SchedulerConfig {
            worker_threads: Some(16),
            ..SchedulerConfig::default()
        },
        store.clone(),
        Arc::new(FrameGraph::new(vec![ViewDescriptor::named("main")])),
    );
    assert_eq!(scheduler.render_bin_jobs().optimal_job_count(), 1);

    for _ in 0..(32 * 3 + 1) {
        store.insert(NodeKind::Entity);
    }
    let frame = scheduler.render_bin_jobs();

    assert_eq!(frame.optimal_job_count(), 4);
    assert_eq!(frame.graph().count_of(JobKind::RenderViewCommandBuilder), 4);

    for _ in 0..1000 {
        store.insert(NodeKind::Entity);
    }
    assert_eq!(
        scheduler.optimal_job_count(),
        8,
        "capped by max_parallel_jobs"
    );
}
