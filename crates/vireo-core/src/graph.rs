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

//! Arena-backed job graph with index-based dependency edges.

use crate::error::CycleError;
use crate::job::{JobId, JobKind, JobRecord, Shard};
use std::collections::{HashMap, VecDeque};

/// A directed acyclic graph of jobs for one frame.
///
/// Jobs live in a flat arena in insertion order and refer to their
/// predecessors by [`JobId`]. Insertion order carries no scheduling meaning;
/// only the dependency edges do. A graph holds at most `u32::MAX + 1` jobs.
#[derive(Debug, Clone, Default)]
pub struct JobGraph {
    jobs: Vec<JobRecord>,
    by_kind: HashMap<(JobKind, Option<usize>), Vec<JobId>>,
}

impl JobGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with room for `capacity` jobs.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            jobs: Vec::with_capacity(capacity),
            by_kind: HashMap::new(),
        }
    }

    /// Adds a frame-scoped job.
    pub fn add_job(&mut self, kind: JobKind) -> JobId {
        self.push(kind, None, None)
    }

    /// Adds a job belonging to the frame-graph leaf `view`.
    pub fn add_view_job(&mut self, kind: JobKind, view: usize, shard: Option<Shard>) -> JobId {
        self.push(kind, Some(view), shard)
    }

    fn push(&mut self, kind: JobKind, view: Option<usize>, shard: Option<Shard>) -> JobId {
        let Some(id) = JobId::from_index(self.jobs.len()) else {
            panic!("job graph is full: JobId is limited to u32 indices");
        };
        self.jobs.push(JobRecord {
            id,
            kind,
            view,
            shard,
            dependencies: Vec::new(),
        });
        self.by_kind.entry((kind, view)).or_default().push(id);
        id
    }

    /// Records that `dependent` may only start after `predecessor` completed.
    ///
    /// Returns `false` if the edge already existed or would be a self-loop.
    pub fn add_dependency(&mut self, dependent: JobId, predecessor: JobId) -> bool {
        if dependent == predecessor {
            return false;
        }
        let deps = &mut self.jobs[dependent.index()].dependencies;
        if deps.contains(&predecessor) {
            return false;
        }
        deps.push(predecessor);
        true
    }

    /// Number of jobs in the graph.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns `true` if the graph holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// All jobs in insertion order.
    pub fn jobs(&self) -> &[JobRecord] {
        &self.jobs
    }

    /// Returns the job with the given identity.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this graph.
    pub fn job(&self, id: JobId) -> &JobRecord {
        &self.jobs[id.index()]
    }

    /// Returns the job with the given identity, if it belongs to this graph.
    pub fn get(&self, id: JobId) -> Option<&JobRecord> {
        self.jobs.get(id.index())
    }

    /// Returns `true` if `dependent` directly depends on `predecessor`.
    pub fn depends_on(&self, dependent: JobId, predecessor: JobId) -> bool {
        self.get(dependent)
            .is_some_and(|job| job.dependencies.contains(&predecessor))
    }

    /// Returns `true` if `dependent` transitively depends on `predecessor`.
    pub fn reaches(&self, dependent: JobId, predecessor: JobId) -> bool {
        let mut visited = vec![false; self.jobs.len()];
        let mut stack = vec![dependent];
        while let Some(current) = stack.pop() {
            for &dep in &self.jobs[current.index()].dependencies {
                if dep == predecessor {
                    return true;
                }
                if !visited[dep.index()] {
                    visited[dep.index()] = true;
                    stack.push(dep);
                }
            }
        }
        false
    }

    /// The first frame-scoped job of `kind`, if scheduled.
    pub fn find(&self, kind: JobKind) -> Option<JobId> {
        self.find_scoped(kind, None).first().copied()
    }

    /// Jobs of `kind` scoped to `view` (or to the frame when `view` is `None`).
    pub fn find_scoped(&self, kind: JobKind, view: Option<usize>) -> &[JobId] {
        self.by_kind
            .get(&(kind, view))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every job of `kind`, across the frame and all views, in insertion order.
    pub fn find_all(&self, kind: JobKind) -> Vec<JobId> {
        self.jobs
            .iter()
            .filter(|job| job.kind == kind)
            .map(|job| job.id)
            .collect()
    }

    /// Number of jobs of `kind` across all scopes.
    pub fn count_of(&self, kind: JobKind) -> usize {
        self.jobs.iter().filter(|job| job.kind == kind).count()
    }

    /// For every job, the jobs that depend on it.
    pub fn successors(&self) -> Vec<Vec<JobId>> {
        let mut successors = vec![Vec::new(); self.jobs.len()];
        for job in &self.jobs {
            for dep in &job.dependencies {
                successors[dep.index()].push(job.id);
            }
        }
        successors
    }

    /// Orders the jobs so that every job follows all of its predecessors.
    ///
    /// Uses Kahn's algorithm; ties are broken by insertion order so the result
    /// is deterministic.
    pub fn topological_order(&self) -> Result<Vec<JobId>, CycleError> {
        let successors = self.successors();
        let mut in_degree: Vec<usize> = self.jobs.iter().map(|j| j.dependencies.len()).collect();

        let mut queue: VecDeque<JobId> = self
            .jobs
            .iter()
            .filter(|job| job.dependencies.is_empty())
            .map(|job| job.id)
            .collect();

        let mut sorted = Vec::with_capacity(self.jobs.len());
        while let Some(id) = queue.pop_front() {
            sorted.push(id);
            for &next in &successors[id.index()] {
                let degree = &mut in_degree[next.index()];
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(next);
                }
            }
        }

        if sorted.len() == self.jobs.len() {
            Ok(sorted)
        } else {
            Err(CycleError {
                sorted: sorted.len(),
                total: self.jobs.len(),
            })
        }
    }

    /// A comparable summary of the graph's composition: one entry per job,
    /// `(kind, view, shard index)`, in insertion order.
    pub fn composition(&self) -> Vec<(JobKind, Option<usize>, Option<u16>)> {
        self.jobs
            .iter()
            .map(|job| (job.kind, job.view, job.shard.map(|s| s.index)))
            .collect()
    }
}
