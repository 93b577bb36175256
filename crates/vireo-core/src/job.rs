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

//! Job identities, kinds, and records.

use std::fmt;
use std::ops::Range;

/// Index of a job inside a [`JobGraph`](crate::JobGraph).
///
/// Identities are only meaningful within the frame whose graph produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub(crate) u32);

impl JobId {
    /// The identity of arena slot `index`, or `None` past the `u32` range.
    #[inline]
    pub(crate) fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Returns the arena index of this job.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The closed set of jobs a frame can contain.
///
/// Each kind corresponds to one job body provided by a
/// [`JobHandler`](crate::JobHandler). [`JobKind::Custom`] is reserved for jobs
/// the frame driver inserts around the barrier chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobKind {
    // --- Barrier chain ---
    /// Reads how many render views the render thread will consume.
    ReadRenderQueueSize,
    /// The render thread has made the graphics context current.
    BeginDrawing,
    /// GPU-side resources are created and updated.
    UpdateGlResources,
    /// Command submission for all views is prepared.
    PrepareCommandSubmission,
    /// Drawing for the frame has finished.
    EndDrawing,

    // --- Scheduled every frame ---
    /// Selects levels of detail from camera distance and bounding volumes.
    UpdateLevelOfDetail,
    /// Releases per-frame resources once the frame is done.
    FrameCleanup,
    /// Sends completed render captures back to requesters.
    SendRenderCapture,
    /// Sends completed buffer captures back to requesters.
    SendBufferCapture,
    /// Collects vertex array objects that need creating or destroying.
    VaoGatherer,
    /// Recomputes skinning palettes for animated skeletons.
    UpdateSkinningPalette,

    // --- Conditional on dirty state ---
    /// Propagates enabled state down the entity tree.
    UpdateTreeEnabled,
    /// Propagates local transforms into world transforms.
    UpdateWorldTransform,
    /// Transforms local bounding volumes into world space.
    UpdateWorldBoundingVolume,
    /// Updates shader data that depends on world transforms.
    UpdateShaderDataTransform,
    /// Computes local bounding volumes from geometry.
    CalculateBoundingVolume,
    /// Rebuilds triangle lists used for picking.
    UpdateMeshTriangleList,
    /// Expands parent bounding volumes to enclose their children.
    ExpandBoundingVolume,
    /// Collects buffers whose contents must be uploaded.
    BufferGatherer,
    /// Loads texture image data.
    LoadTextureData,
    /// Collects textures whose GPU objects must be updated.
    TextureGatherer,
    /// Synchronizes loaded skeleton data into the render backend.
    SyncSkeletonLoading,
    /// Filters techniques compatible with the live graphics context.
    FilterCompatibleTechniques,
    /// Introspects shader programs against the live graphics context.
    ShaderGatherer,

    // --- Per view ---
    /// Initializes the render view from its frame-graph leaf.
    RenderViewInitializer,
    /// Publishes render-view initialization to the other view jobs.
    SyncRenderViewInitialization,
    /// Filters entities that can be drawn.
    RenderableEntityFilter,
    /// Filters entities that dispatch compute work.
    ComputableEntityFilter,
    /// Gathers lights affecting the view.
    LightGatherer,
    /// Hands the view frustum to the culling job.
    SyncFrustumCulling,
    /// Culls entities against the view frustum.
    FrustumCulling,
    /// Keeps entities within a distance of a reference entity.
    FilterProximity,
    /// Resolves the draw buffer index used when clearing.
    SetClearDrawBufferIndex,
    /// Merges all filtering results before command building starts.
    SyncRenderCommandBuilding,
    /// Builds render commands for one slice of the view's entities.
    RenderViewCommandBuilder,
    /// Merges the command builders' output into the render view.
    SyncRenderViewCommandBuilders,
    /// Filters entities by the view's layer filter.
    FilterEntityByLayer,
    /// Publishes the layer filtering result to the view.
    SyncFilterEntityByLayer,
    /// Gathers material parameters for one slice of the materials.
    MaterialGatherer,
    /// Merges the material gatherers' output.
    SyncMaterialGatherer,

    /// A job inserted by the frame driver.
    Custom(&'static str),
}

impl JobKind {
    /// Human-readable name, used for logging and thread labels.
    pub const fn name(self) -> &'static str {
        match self {
            JobKind::ReadRenderQueueSize => "ReadRenderQueueSize",
            JobKind::BeginDrawing => "BeginDrawing",
            JobKind::UpdateGlResources => "UpdateGlResources",
            JobKind::PrepareCommandSubmission => "PrepareCommandSubmission",
            JobKind::EndDrawing => "EndDrawing",
            JobKind::UpdateLevelOfDetail => "UpdateLevelOfDetail",
            JobKind::FrameCleanup => "FrameCleanup",
            JobKind::SendRenderCapture => "SendRenderCapture",
            JobKind::SendBufferCapture => "SendBufferCapture",
            JobKind::VaoGatherer => "VaoGatherer",
            JobKind::UpdateSkinningPalette => "UpdateSkinningPalette",
            JobKind::UpdateTreeEnabled => "UpdateTreeEnabled",
            JobKind::UpdateWorldTransform => "UpdateWorldTransform",
            JobKind::UpdateWorldBoundingVolume => "UpdateWorldBoundingVolume",
            JobKind::UpdateShaderDataTransform => "UpdateShaderDataTransform",
            JobKind::CalculateBoundingVolume => "CalculateBoundingVolume",
            JobKind::UpdateMeshTriangleList => "UpdateMeshTriangleList",
            JobKind::ExpandBoundingVolume => "ExpandBoundingVolume",
            JobKind::BufferGatherer => "BufferGatherer",
            JobKind::LoadTextureData => "LoadTextureData",
            JobKind::TextureGatherer => "TextureGatherer",
            JobKind::SyncSkeletonLoading => "SyncSkeletonLoading",
            JobKind::FilterCompatibleTechniques => "FilterCompatibleTechniques",
            JobKind::ShaderGatherer => "ShaderGatherer",
            JobKind::RenderViewInitializer => "RenderViewInitializer",
            JobKind::SyncRenderViewInitialization => "SyncRenderViewInitialization",
            JobKind::RenderableEntityFilter => "RenderableEntityFilter",
            JobKind::ComputableEntityFilter => "ComputableEntityFilter",
            JobKind::LightGatherer => "LightGatherer",
            JobKind::SyncFrustumCulling => "SyncFrustumCulling",
            JobKind::FrustumCulling => "FrustumCulling",
            JobKind::FilterProximity => "FilterProximity",
            JobKind::SetClearDrawBufferIndex => "SetClearDrawBufferIndex",
            JobKind::SyncRenderCommandBuilding => "SyncRenderCommandBuilding",
            JobKind::RenderViewCommandBuilder => "RenderViewCommandBuilder",
            JobKind::SyncRenderViewCommandBuilders => "SyncRenderViewCommandBuilders",
            JobKind::FilterEntityByLayer => "FilterEntityByLayer",
            JobKind::SyncFilterEntityByLayer => "SyncFilterEntityByLayer",
            JobKind::MaterialGatherer => "MaterialGatherer",
            JobKind::SyncMaterialGatherer => "SyncMaterialGatherer",
            JobKind::Custom(name) => name,
        }
    }

    /// Returns `true` for jobs instantiated once per frame-graph leaf.
    pub const fn is_view_scoped(self) -> bool {
        matches!(
            self,
            JobKind::RenderViewInitializer
                | JobKind::SyncRenderViewInitialization
                | JobKind::RenderableEntityFilter
                | JobKind::ComputableEntityFilter
                | JobKind::LightGatherer
                | JobKind::SyncFrustumCulling
                | JobKind::FrustumCulling
                | JobKind::FilterProximity
                | JobKind::SetClearDrawBufferIndex
                | JobKind::SyncRenderCommandBuilding
                | JobKind::RenderViewCommandBuilder
                | JobKind::SyncRenderViewCommandBuilders
                | JobKind::FilterEntityByLayer
                | JobKind::SyncFilterEntityByLayer
                | JobKind::MaterialGatherer
                | JobKind::SyncMaterialGatherer
        )
    }

    /// Returns `true` for jobs split across `optimal_job_count()` shards.
    pub const fn is_fanned_out(self) -> bool {
        matches!(
            self,
            JobKind::RenderViewCommandBuilder | JobKind::MaterialGatherer
        )
    }

    /// Returns `true` for jobs that need a live graphics context.
    pub const fn requires_graphics_context(self) -> bool {
        matches!(
            self,
            JobKind::FilterCompatibleTechniques | JobKind::ShaderGatherer
        )
    }

    /// Returns `true` for jobs that mutate GPU-side state.
    ///
    /// Such jobs must (transitively) depend on
    /// [`JobKind::UpdateGlResources`].
    pub const fn mutates_gpu_state(self) -> bool {
        matches!(self, JobKind::LoadTextureData | JobKind::VaoGatherer)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The slice of a fanned-out stage handled by one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shard {
    /// Zero-based position of this shard.
    pub index: u16,
    /// Total number of shards in the stage.
    pub count: u16,
}

impl Shard {
    /// Creates a shard. `count` is raised to 1 and `index` clamped into range.
    pub fn new(index: u16, count: u16) -> Self {
        let count = count.max(1);
        Self {
            index: index.min(count - 1),
            count,
        }
    }

    /// Splits `0..len` into `count` contiguous ranges and returns this shard's.
    ///
    /// The ranges do not overlap, cover `0..len`, and differ in length by at
    /// most one item. Trailing shards receive empty ranges when `len < count`.
    pub fn range(self, len: usize) -> Range<usize> {
        let count = usize::from(self.count);
        let index = usize::from(self.index);
        let base = len / count;
        let extra = len % count;
        let start = index * base + index.min(extra);
        let size = base + usize::from(index < extra);
        start..start + size
    }
}

/// One node of the job graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub(crate) id: JobId,
    pub(crate) kind: JobKind,
    pub(crate) view: Option<usize>,
    pub(crate) shard: Option<Shard>,
    pub(crate) dependencies: Vec<JobId>,
}

impl JobRecord {
    /// The job's identity within its frame.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// The job's kind.
    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Index of the frame-graph leaf this job belongs to, if view-scoped.
    pub fn view(&self) -> Option<usize> {
        self.view
    }

    /// The shard this job handles, if its stage is fanned out.
    pub fn shard(&self) -> Option<Shard> {
        self.shard
    }

    /// The jobs that must complete before this one may start.
    pub fn dependencies(&self) -> &[JobId] {
        &self.dependencies
    }
}

impl fmt::Display for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.id)?;
        if let Some(view) = self.view {
            write!(f, "[view {view}")?;
            if let Some(shard) = self.shard {
                write!(f, ", shard {}/{}", shard.index + 1, shard.count)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
