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

//! Per-frame job-graph construction.

use crate::barrier::BarrierChain;
use crate::config::SchedulerConfig;
use crate::dirty::DirtyStateTracker;
use crate::frame::FrameJobs;
use crate::policy::{self, PER_FRAME_JOBS};
use crate::validate::validate_frame;
use crate::view_builder::{ViewBuilder, VIEW_BASE_JOBS};
use crate::wiring::wire_frame;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use vireo_core::{
    DirtyFlags, FrameGraphSource, FrameReport, JobGraph, NodeKind, NodeManagers,
};

/// Builds one job graph per frame from dirty state and the frame graph.
///
/// The scheduler is shared by reference: dirty producers reach the tracker
/// through [`dirty_tracker`](Self::dirty_tracker), the render thread flips
/// [`set_context_ready`](Self::set_context_ready), and the frame driver calls
/// [`render_bin_jobs`](Self::render_bin_jobs) then
/// [`complete_frame`](Self::complete_frame).
pub struct FrameScheduler {
    config: SchedulerConfig,
    tracker: Arc<DirtyStateTracker>,
    managers: Arc<dyn NodeManagers>,
    frame_graph: Arc<dyn FrameGraphSource>,
    context_ready: AtomicBool,
    next_frame: AtomicU64,
}

impl FrameScheduler {
    /// Creates a scheduler with no dirty state and no graphics context.
    pub fn new(
        config: SchedulerConfig,
        managers: Arc<dyn NodeManagers>,
        frame_graph: Arc<dyn FrameGraphSource>,
    ) -> Self {
        Self {
            config,
            tracker: Arc::new(DirtyStateTracker::new()),
            managers,
            frame_graph,
            context_ready: AtomicBool::new(false),
            next_frame: AtomicU64::new(0),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Shared handle for dirty producers.
    pub fn dirty_tracker(&self) -> Arc<DirtyStateTracker> {
        Arc::clone(&self.tracker)
    }

    /// ORs `flags` into the accumulated dirty state.
    pub fn mark_dirty(&self, flags: DirtyFlags) {
        self.tracker.mark_dirty(flags);
    }

    /// The accumulated dirty state.
    pub fn dirty_flags(&self) -> DirtyFlags {
        self.tracker.dirty_flags()
    }

    /// Clears exactly `mask`; a mask containing `ALL` clears everything.
    pub fn clear_dirty_bits(&self, mask: DirtyFlags) {
        self.tracker.clear_dirty_bits(mask);
    }

    /// Records whether the graphics context is live.
    ///
    /// Jobs needing the context are left out of frames built while it is not.
    pub fn set_context_ready(&self, ready: bool) {
        self.context_ready.store(ready, Ordering::Release);
    }

    /// Whether the graphics context is live.
    pub fn is_context_ready(&self) -> bool {
        self.context_ready.load(Ordering::Acquire)
    }

    /// Shard count for fanned-out stages.
    ///
    /// The smaller of the worker cap and the scene-size cap, never below 1.
    pub fn optimal_job_count(&self) -> usize {
        let entities = self.managers.count(NodeKind::Entity);
        self.config
            .worker_cap()
            .min(self.config.scene_cap(entities))
            .max(1)
    }

    /// Builds the job graph for the next frame.
    ///
    /// Reads the dirty state without clearing it. Building twice with no
    /// state change in between yields graphs of identical composition.
    /// Categories marked after this call survive the frame's completion.
    pub fn render_bin_jobs(&self) -> FrameJobs {
        let frame_index = self.next_frame.fetch_add(1, Ordering::Relaxed);
        let flags = self.tracker.snapshot();
        let views = self.frame_graph.leaves();
        let context_ready = self.is_context_ready();
        let parallelism = self.optimal_job_count();

        let conditional = policy::frame_jobs(flags, context_ready);
        let mut graph = JobGraph::with_capacity(
            5 + PER_FRAME_JOBS.len()
                + conditional.len()
                + views.len() * (VIEW_BASE_JOBS.len() + 2 * parallelism + 3),
        );

        let barriers = BarrierChain::build(&mut graph);
        for kind in PER_FRAME_JOBS.into_iter().chain(conditional) {
            graph.add_job(kind);
        }
        for index in 0..views.len() {
            ViewBuilder::new(index, flags, parallelism).build(&mut graph);
        }
        let edges = wire_frame(&mut graph);

        if self.config.validate_graphs {
            let verdict = validate_frame(&graph);
            if let Err(violation) = &verdict {
                log::error!("frame {frame_index}: invalid job graph: {violation}");
            }
            debug_assert!(verdict.is_ok(), "invalid job graph: {verdict:?}");
        }

        log::debug!(
            "frame {frame_index}: {} jobs, {edges} edges, {} views, flags {:?}, parallelism {parallelism}, context ready: {context_ready}",
            graph.len(),
            views.len(),
            flags,
        );

        FrameJobs {
            frame_index,
            graph,
            barriers,
            views,
            consumed: flags,
            deferred: policy::deferred(flags, context_ready),
            parallelism,
        }
    }

    /// Acknowledges an executed frame.
    ///
    /// When `report` belongs to `frame` and every job succeeded, the dirty
    /// bits the frame consumed are cleared and `true` is returned. Categories
    /// marked again while the frame ran, and categories deferred for lack of
    /// a graphics context, stay set. Otherwise nothing is cleared so the next
    /// frame schedules the work again.
    pub fn complete_frame(&self, frame: &FrameJobs, report: &FrameReport) -> bool {
        if report.frame_index != frame.frame_index() {
            log::warn!(
                "frame {}: ignoring report of frame {}",
                frame.frame_index(),
                report.frame_index,
            );
            return false;
        }
        if report.len() != frame.len() || !report.is_complete() {
            log::warn!(
                "frame {}: {} of {} jobs succeeded, keeping dirty flags {:?}",
                frame.frame_index(),
                report.succeeded(),
                frame.len(),
                frame.consumed_flags(),
            );
            return false;
        }
        self.tracker.clear_consumed(frame.consumed_flags());
        if !frame.deferred_flags().is_empty() {
            self.tracker.mark_dirty(frame.deferred_flags());
        }
        true
    }
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("config", &self.config)
            .field("dirty", &self.tracker.dirty_flags())
            .field("context_ready", &self.is_context_ready())
            .finish_non_exhaustive()
    }
}
