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

//! Error types shared by the scheduler and the executor.

use crate::job::JobKind;
use thiserror::Error;

/// An error reported by a job body.
///
/// Job failures are values: they never unwind across the job-graph boundary.
/// The executor records them and skips every job that depends on the failed
/// one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The job ran and reported a failure (e.g. a texture failed to decode).
    #[error("job {job} failed: {reason}")]
    Failed {
        /// The kind of job that failed.
        job: JobKind,
        /// A human-readable description of the failure.
        reason: String,
    },
    /// The job body panicked; the panic was caught by the executor.
    #[error("job {job} panicked: {message}")]
    Panicked {
        /// The kind of job that panicked.
        job: JobKind,
        /// The panic payload, when it was a string.
        message: String,
    },
    /// The job needed data from a collaborator that was not available.
    #[error("job {job} is missing {what}")]
    Missing {
        /// The kind of job that could not run.
        job: JobKind,
        /// Description of the missing input.
        what: &'static str,
    },
}

impl JobError {
    /// Convenience constructor for [`JobError::Failed`].
    pub fn failed(job: JobKind, reason: impl Into<String>) -> Self {
        JobError::Failed {
            job,
            reason: reason.into(),
        }
    }

    /// The kind of job the error originates from.
    pub fn job(&self) -> JobKind {
        match self {
            JobError::Failed { job, .. }
            | JobError::Panicked { job, .. }
            | JobError::Missing { job, .. } => *job,
        }
    }
}

/// An error indicating that a cycle was detected in a job graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("dependency cycle detected: {sorted} of {total} jobs could be ordered")]
pub struct CycleError {
    /// Number of jobs that could be placed in topological order.
    pub sorted: usize,
    /// Total number of jobs in the graph.
    pub total: usize,
}
