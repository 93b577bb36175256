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

//! The frame loop: mutate the scene, build, execute, complete.

use crate::demo::DemoJobs;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use vireo_core::{DirtyFlags, FrameGraph, LayerId, NodeKind, SceneNodeStore};
use vireo_executor::{ExecutorError, JobExecutor};
use vireo_scheduler::{Barrier, FrameScheduler, SchedulerConfig};

/// What happened in one driven frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSummary {
    /// Frame index.
    pub frame_index: u64,
    /// Dirty flags the frame was built from.
    pub flags: DirtyFlags,
    /// Jobs in the frame, driver jobs included.
    pub jobs: usize,
    /// Jobs that failed.
    pub failed: usize,
    /// Jobs skipped because of a failure.
    pub skipped: usize,
    /// Whether the frame completed and its dirty state was consumed.
    pub completed: bool,
    /// Render commands built across all views.
    pub commands: usize,
}

/// Drives frames against an in-memory demo scene.
pub struct FrameDriver {
    scheduler: FrameScheduler,
    executor: JobExecutor,
    jobs: DemoJobs,
    store: Arc<SceneNodeStore>,
    frames_driven: u64,
}

impl FrameDriver {
    /// Builds a driver over a scene of `entities` entities.
    pub fn new(
        config: SchedulerConfig,
        frame_graph: FrameGraph,
        entities: usize,
        fail_textures_on: Option<u64>,
    ) -> Self {
        let store = Arc::new(SceneNodeStore::new());
        for i in 0..entities {
            store.insert_entity(vec![LayerId((i % 3) as u32)]);
            if i % 4 == 0 {
                store.insert(NodeKind::Geometry);
            }
        }
        let executor = JobExecutor::new(config.worker_count());
        let jobs = DemoJobs::new(store.clone(), fail_textures_on);
        let scheduler = FrameScheduler::new(config, store.clone(), Arc::new(frame_graph));
        // Initial load: everything needs processing.
        scheduler.mark_dirty(DirtyFlags::ALL);
        Self {
            scheduler,
            executor,
            jobs,
            store,
            frames_driven: 0,
        }
    }

    /// The scheduler, for inspection.
    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Simulates scene activity before frame `frame`.
    ///
    /// The graphics context becomes available from the second frame on.
    fn simulate_scene(&self, frame: u64) {
        if frame == 1 {
            self.scheduler.set_context_ready(true);
        }
        if frame == 0 {
            return;
        }
        let tracker = self.scheduler.dirty_tracker();
        tracker.mark_dirty(DirtyFlags::TRANSFORM);
        if frame % 3 == 0 {
            tracker.mark_dirty(DirtyFlags::GEOMETRY | DirtyFlags::BUFFERS);
        }
        if frame % 4 == 0 {
            for _ in 0..16 {
                self.store.insert_entity(vec![LayerId(0)]);
            }
            tracker.mark_dirty(DirtyFlags::ENTITY_ENABLED);
        }
        if frame % 5 == 2 {
            tracker.mark_dirty(DirtyFlags::TEXTURES | DirtyFlags::MATERIALS);
        }
    }

    /// Drives one frame.
    pub fn run_frame(&mut self) -> Result<FrameSummary, ExecutorError> {
        self.simulate_scene(self.frames_driven);
        self.frames_driven += 1;

        let mut frame = self.scheduler.render_bin_jobs();
        frame.insert_job_after("readback", Barrier::EndDrawing);

        self.jobs.stats().reset();
        let report = self
            .executor
            .execute(frame.graph(), &self.jobs, &frame.context())?;
        let completed = self.scheduler.complete_frame(&frame, &report);

        Ok(FrameSummary {
            frame_index: frame.frame_index(),
            flags: frame.consumed_flags(),
            jobs: frame.len(),
            failed: report.failures().count(),
            skipped: report.skipped(),
            completed,
            commands: self.jobs.stats().commands.load(Ordering::Relaxed),
        })
    }

    /// Drives `frames` frames.
    pub fn run(&mut self, frames: u64) -> Result<Vec<FrameSummary>, ExecutorError> {
        (0..frames).map(|_| self.run_frame()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vireo_core::ViewDescriptor;

    fn driver(fail_textures_on: Option<u64>) -> FrameDriver {
        let config = SchedulerConfig {
            worker_threads: Some(3),
            ..SchedulerConfig::default()
        };
        let frame_graph = FrameGraph::new(vec![
            ViewDescriptor::named("main"),
            ViewDescriptor::named("shadow"),
        ]);
        FrameDriver::new(config, frame_graph, 64, fail_textures_on)
    }

    #[test]
    fn first_frame_consumes_everything_but_context_work() {
        let mut driver = driver(None);

        let summary = driver.run_frame().unwrap();

        assert!(summary.completed);
        assert!(summary.flags.contains(DirtyFlags::ALL));
        assert_eq!(summary.commands, 2 * 64, "every entity drawn once per view");
        assert_eq!(
            driver.scheduler().dirty_flags(),
            DirtyFlags::TECHNIQUES | DirtyFlags::SHADERS
        );
    }

    #[test]
    fn failed_frame_is_retried() {
        let mut driver = driver(Some(2));

        let summaries = driver.run(4).unwrap();

        assert!(summaries[1].completed);
        let failed = &summaries[2];
        assert!(!failed.completed);
        assert_eq!(failed.failed, 1);
        assert!(failed.skipped > 0);
        let retry = &summaries[3];
        assert!(retry.flags.contains(DirtyFlags::TEXTURES));
        assert!(retry.completed);
    }

    #[test]
    fn clean_frames_leave_no_dirty_state() {
        let mut driver = driver(None);

        let summaries = driver.run(3).unwrap();

        assert!(summaries.iter().all(|s| s.completed));
        assert!(summaries[0].jobs > summaries[1].jobs, "initial load is the largest frame");
        assert!(driver.scheduler().dirty_flags().is_empty());
    }
}
