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

//! The five pipeline-stage barriers every frame is built around.

use crate::wiring::DependencyRule;
use std::fmt;
use vireo_core::{JobGraph, JobId, JobKind};

/// A pipeline-stage barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Barrier {
    /// Reads how many render views the render thread will consume.
    ReadRenderQueueSize,
    /// The graphics context is current.
    BeginDrawing,
    /// GPU resources are up to date.
    UpdateGlResources,
    /// Command submission is prepared.
    PrepareCommandSubmission,
    /// Drawing has finished.
    EndDrawing,
}

impl Barrier {
    /// The barriers in chain order.
    pub const CHAIN: [Barrier; 5] = [
        Barrier::ReadRenderQueueSize,
        Barrier::BeginDrawing,
        Barrier::UpdateGlResources,
        Barrier::PrepareCommandSubmission,
        Barrier::EndDrawing,
    ];

    /// The job kind representing this barrier.
    pub const fn kind(self) -> JobKind {
        match self {
            Barrier::ReadRenderQueueSize => JobKind::ReadRenderQueueSize,
            Barrier::BeginDrawing => JobKind::BeginDrawing,
            Barrier::UpdateGlResources => JobKind::UpdateGlResources,
            Barrier::PrepareCommandSubmission => JobKind::PrepareCommandSubmission,
            Barrier::EndDrawing => JobKind::EndDrawing,
        }
    }

    /// The barrier represented by `kind`, if any.
    pub fn from_kind(kind: JobKind) -> Option<Barrier> {
        Self::CHAIN.into_iter().find(|barrier| barrier.kind() == kind)
    }

    /// The barrier that directly follows this one in the chain.
    pub fn next(self) -> Option<Barrier> {
        Self::CHAIN.get(self as usize + 1).copied()
    }

    /// The barrier that directly precedes this one in the chain.
    pub fn previous(self) -> Option<Barrier> {
        (self as usize).checked_sub(1).map(|index| Self::CHAIN[index])
    }
}

impl fmt::Display for Barrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind(), f)
    }
}

/// Strict total order of the barriers.
pub const BARRIER_RULES: &[DependencyRule] = &[
    DependencyRule::new(JobKind::BeginDrawing, &[JobKind::ReadRenderQueueSize]),
    DependencyRule::new(JobKind::UpdateGlResources, &[JobKind::BeginDrawing]),
    DependencyRule::new(JobKind::PrepareCommandSubmission, &[JobKind::UpdateGlResources]),
    DependencyRule::new(JobKind::EndDrawing, &[JobKind::PrepareCommandSubmission]),
];

/// Jobs hanging off the barrier chain.
///
/// Gatherers feed `UpdateGlResources`; jobs touching GPU state run after
/// it; everything that produces commands lands before
/// `PrepareCommandSubmission`.
pub const SATELLITE_RULES: &[DependencyRule] = &[
    DependencyRule::new(JobKind::FilterCompatibleTechniques, &[JobKind::BeginDrawing]),
    DependencyRule::new(JobKind::ShaderGatherer, &[JobKind::BeginDrawing]),
    DependencyRule::new(
        JobKind::UpdateGlResources,
        &[
            JobKind::FilterCompatibleTechniques,
            JobKind::ShaderGatherer,
            JobKind::BufferGatherer,
            JobKind::TextureGatherer,
        ],
    ),
    DependencyRule::new(JobKind::LoadTextureData, &[JobKind::UpdateGlResources]),
    DependencyRule::new(JobKind::VaoGatherer, &[JobKind::UpdateGlResources]),
    DependencyRule::new(
        JobKind::PrepareCommandSubmission,
        &[
            JobKind::LoadTextureData,
            JobKind::VaoGatherer,
            JobKind::SyncRenderViewCommandBuilders,
        ],
    ),
];

/// Identities of the five barrier jobs of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierChain {
    ids: [JobId; 5],
}

impl BarrierChain {
    /// Adds the five barrier jobs to `graph`.
    ///
    /// The chain edges are wired later, together with every other rule, by
    /// [`wire_frame`](crate::wiring::wire_frame).
    pub fn build(graph: &mut JobGraph) -> Self {
        let ids = Barrier::CHAIN.map(|barrier| graph.add_job(barrier.kind()));
        Self { ids }
    }

    /// The job standing for `barrier`.
    pub fn get(&self, barrier: Barrier) -> JobId {
        self.ids[barrier as usize]
    }

    /// All five barrier jobs, in chain order.
    pub fn ids(&self) -> [JobId; 5] {
        self.ids
    }
}
