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

//! Ordering checks run on every built graph.

use crate::barrier::{Barrier, BARRIER_RULES, SATELLITE_RULES};
use crate::wiring::{resolve, view_count, DependencyRule};
use thiserror::Error;
use vireo_core::{CycleError, JobGraph, JobKind};

/// A construction defect in a frame's job graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderingViolation {
    /// A barrier job is absent or duplicated.
    #[error("expected exactly one {barrier} barrier, found {found}")]
    Barrier {
        /// The barrier in question.
        barrier: Barrier,
        /// How many frame-scoped jobs of its kind exist.
        found: usize,
    },
    /// A required edge is missing.
    #[error("{dependent} does not depend on {predecessor}")]
    MissingEdge {
        /// The job lacking the edge.
        dependent: JobKind,
        /// The kind it should wait for.
        predecessor: JobKind,
    },
    /// A job mutating GPU state can start before GPU resources are updated.
    #[error("{job} mutates GPU state but does not follow UpdateGlResources")]
    UnguardedGpuMutation {
        /// The offending job.
        job: JobKind,
    },
    /// The graph is not acyclic.
    #[error(transparent)]
    Cycle(#[from] CycleError),
}

/// Checks the barrier chain, its satellites, GPU-mutation guarding and
/// acyclicity of `graph`.
pub fn validate_frame(graph: &JobGraph) -> Result<(), OrderingViolation> {
    for barrier in Barrier::CHAIN {
        let found = graph.find_scoped(barrier.kind(), None).len();
        if found != 1 {
            return Err(OrderingViolation::Barrier { barrier, found });
        }
    }

    // Checked before the rule tables, which would report the same defect as
    // a missing direct edge.
    let gl_resources = graph.find_scoped(JobKind::UpdateGlResources, None)[0];
    if let Some(job) = graph
        .jobs()
        .iter()
        .find(|job| job.kind().mutates_gpu_state() && !graph.reaches(job.id(), gl_resources))
    {
        return Err(OrderingViolation::UnguardedGpuMutation { job: job.kind() });
    }

    let views = view_count(graph);
    check_rules(graph, BARRIER_RULES, views)?;
    check_rules(graph, SATELLITE_RULES, views)?;

    graph.topological_order()?;
    Ok(())
}

fn check_rules(
    graph: &JobGraph,
    rules: &[DependencyRule],
    views: usize,
) -> Result<(), OrderingViolation> {
    for rule in rules {
        for dependent in graph.find_all(rule.dependent) {
            let view = graph.job(dependent).view();
            for &predecessor in rule.predecessors {
                let missing = resolve(graph, predecessor, view, views)
                    .into_iter()
                    .any(|target| !graph.depends_on(dependent, target));
                if missing {
                    return Err(OrderingViolation::MissingEdge {
                        dependent: rule.dependent,
                        predecessor,
                    });
                }
            }
        }
    }
    Ok(())
}
