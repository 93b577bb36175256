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

//! Job bodies for the demo scene.
//!
//! Only the jobs with observable output do real work; every other kind
//! succeeds immediately.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vireo_core::{
    JobContext, JobError, JobHandler, JobKind, JobRecord, NodeId, NodeKind, NodeManagers,
};

/// Counters accumulated by the demo jobs.
#[derive(Debug, Default)]
pub struct JobStats {
    /// Jobs executed.
    pub executed: AtomicUsize,
    /// Entities accepted by layer filters, summed over views.
    pub layer_accepted: AtomicUsize,
    /// Render commands built, summed over views and shards.
    pub commands: AtomicUsize,
    /// Material parameter sets gathered.
    pub materials: AtomicUsize,
}

impl JobStats {
    /// Resets every counter to zero.
    pub fn reset(&self) {
        for counter in [
            &self.executed,
            &self.layer_accepted,
            &self.commands,
            &self.materials,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// The demo's [`JobHandler`].
pub struct DemoJobs {
    managers: Arc<dyn NodeManagers>,
    stats: JobStats,
    fail_textures_on: Option<u64>,
}

impl DemoJobs {
    /// Creates the handler. `fail_textures_on` makes texture loading fail on
    /// that frame index.
    pub fn new(managers: Arc<dyn NodeManagers>, fail_textures_on: Option<u64>) -> Self {
        Self {
            managers,
            stats: JobStats::default(),
            fail_textures_on,
        }
    }

    /// Counters accumulated since the last reset.
    pub fn stats(&self) -> &JobStats {
        &self.stats
    }

    fn shard_of(&self, job: &JobRecord, kind: NodeKind) -> Result<Vec<NodeId>, JobError> {
        let shard = job.shard().ok_or(JobError::Missing {
            job: job.kind(),
            what: "shard assignment",
        })?;
        let ids = self.managers.ids(kind);
        let range = shard.range(ids.len());
        Ok(ids.get(range).map(<[NodeId]>::to_vec).unwrap_or_default())
    }

    fn filter_layers(&self, job: &JobRecord, ctx: &JobContext<'_>) -> Result<(), JobError> {
        let view = ctx.view(job).ok_or(JobError::Missing {
            job: job.kind(),
            what: "frame-graph leaf",
        })?;
        let accepted = self
            .managers
            .ids(NodeKind::Entity)
            .into_iter()
            .filter_map(|id| self.managers.entity_layers(id))
            .filter(|layers| view.layer_filter.accepts(layers))
            .count();
        log::trace!("{}: {accepted} entities pass the layer filter", view.name);
        self.stats.layer_accepted.fetch_add(accepted, Ordering::Relaxed);
        Ok(())
    }
}

impl JobHandler for DemoJobs {
    fn execute(&self, job: &JobRecord, ctx: &JobContext<'_>) -> Result<(), JobError> {
        self.stats.executed.fetch_add(1, Ordering::Relaxed);
        match job.kind() {
            JobKind::FilterEntityByLayer => self.filter_layers(job, ctx),
            JobKind::RenderViewCommandBuilder => {
                let entities = self.shard_of(job, NodeKind::Entity)?;
                self.stats.commands.fetch_add(entities.len(), Ordering::Relaxed);
                Ok(())
            }
            JobKind::MaterialGatherer => {
                let geometries = self.shard_of(job, NodeKind::Geometry)?;
                self.stats.materials.fetch_add(geometries.len(), Ordering::Relaxed);
                Ok(())
            }
            JobKind::LoadTextureData if self.fail_textures_on == Some(ctx.frame_index) => Err(
                JobError::failed(job.kind(), "simulated texture decode failure"),
            ),
            _ => Ok(()),
        }
    }
}
