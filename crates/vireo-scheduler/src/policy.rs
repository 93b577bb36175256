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

//! Which jobs a frame contains, as pure data.
//!
//! Selection never depends on the order flags were marked in: every table is
//! walked in declaration order and each job is kept at its first occurrence.

use vireo_core::{DirtyFlags, JobKind};

/// Jobs scheduled every frame regardless of dirty state.
pub const PER_FRAME_JOBS: [JobKind; 6] = [
    JobKind::UpdateLevelOfDetail,
    JobKind::FrameCleanup,
    JobKind::SendRenderCapture,
    JobKind::SendBufferCapture,
    JobKind::VaoGatherer,
    JobKind::UpdateSkinningPalette,
];

/// Categories whose jobs need a live graphics context.
///
/// While the context is not ready these categories are deferred: the frame
/// leaves their jobs out and they stay dirty after the frame completes.
pub const CONTEXT_FLAGS: DirtyFlags = DirtyFlags::TECHNIQUES.union(DirtyFlags::SHADERS);

/// One row of a policy table: the jobs added when any of `flags` is dirty.
#[derive(Debug, Clone, Copy)]
pub struct PolicyEntry {
    /// Triggering categories.
    pub flags: DirtyFlags,
    /// Jobs added, in insertion order.
    pub jobs: &'static [JobKind],
}

/// Frame-scoped conditional jobs.
pub const FRAME_POLICY: &[PolicyEntry] = &[
    PolicyEntry {
        flags: DirtyFlags::ENTITY_ENABLED,
        jobs: &[JobKind::UpdateTreeEnabled],
    },
    PolicyEntry {
        flags: DirtyFlags::TRANSFORM,
        jobs: &[
            JobKind::UpdateWorldTransform,
            JobKind::UpdateWorldBoundingVolume,
            JobKind::UpdateShaderDataTransform,
            JobKind::ExpandBoundingVolume,
        ],
    },
    PolicyEntry {
        flags: DirtyFlags::GEOMETRY,
        jobs: &[
            JobKind::CalculateBoundingVolume,
            JobKind::UpdateMeshTriangleList,
            JobKind::ExpandBoundingVolume,
        ],
    },
    PolicyEntry {
        flags: DirtyFlags::BUFFERS,
        jobs: &[JobKind::BufferGatherer],
    },
    PolicyEntry {
        flags: DirtyFlags::TEXTURES,
        jobs: &[JobKind::LoadTextureData, JobKind::TextureGatherer],
    },
    PolicyEntry {
        flags: DirtyFlags::SKELETON_DATA,
        jobs: &[JobKind::SyncSkeletonLoading],
    },
    PolicyEntry {
        flags: DirtyFlags::TECHNIQUES,
        jobs: &[JobKind::FilterCompatibleTechniques],
    },
    PolicyEntry {
        flags: DirtyFlags::SHADERS,
        jobs: &[JobKind::ShaderGatherer],
    },
];

/// Conditional jobs added to every frame-graph leaf.
///
/// Fanned-out kinds ([`JobKind::is_fanned_out`]) stand for
/// `optimal_job_count()` shards.
pub const VIEW_POLICY: &[PolicyEntry] = &[
    PolicyEntry {
        flags: DirtyFlags::ENTITY_ENABLED.union(DirtyFlags::LAYERS),
        jobs: &[JobKind::FilterEntityByLayer, JobKind::SyncFilterEntityByLayer],
    },
    PolicyEntry {
        flags: DirtyFlags::MATERIALS,
        jobs: &[JobKind::MaterialGatherer, JobKind::SyncMaterialGatherer],
    },
];

fn select(table: &[PolicyEntry], flags: DirtyFlags) -> Vec<JobKind> {
    let mut selected = Vec::new();
    for entry in table.iter().filter(|entry| flags.requests(entry.flags)) {
        for &kind in entry.jobs {
            if !selected.contains(&kind) {
                selected.push(kind);
            }
        }
    }
    selected
}

/// Frame-scoped conditional jobs for `flags`, de-duplicated.
///
/// Jobs requiring a graphics context are left out while `context_ready` is
/// `false`, even when their flag is set.
pub fn frame_jobs(flags: DirtyFlags, context_ready: bool) -> Vec<JobKind> {
    let mut jobs = select(FRAME_POLICY, flags);
    if !context_ready {
        jobs.retain(|kind| !kind.requires_graphics_context());
    }
    jobs
}

/// The categories in `flags` deferred until the graphics context is ready.
pub fn deferred(flags: DirtyFlags, context_ready: bool) -> DirtyFlags {
    if context_ready {
        DirtyFlags::empty()
    } else {
        flags.effective() & CONTEXT_FLAGS
    }
}

/// Per-view conditional job kinds for `flags`, de-duplicated.
pub fn view_jobs(flags: DirtyFlags) -> Vec<JobKind> {
    select(VIEW_POLICY, flags)
}
