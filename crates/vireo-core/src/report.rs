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

//! Per-job outcomes of one executed frame.

use crate::error::JobError;
use crate::job::JobId;
use std::time::Duration;

/// The outcome of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// The job ran to completion.
    Succeeded {
        /// Wall-clock time spent in the job body.
        elapsed: Duration,
    },
    /// The job body returned an error or panicked.
    Failed(JobError),
    /// The job never ran because a job it depends on did not succeed.
    Skipped {
        /// The failed job at the root of the skip.
        cause: JobId,
    },
}

impl JobStatus {
    /// Returns `true` for [`JobStatus::Succeeded`].
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Succeeded { .. })
    }
}

/// Outcome of executing a frame's job graph, indexed by [`JobId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    /// Index of the executed frame.
    pub frame_index: u64,
    /// One status per job, in graph insertion order.
    pub statuses: Vec<JobStatus>,
    /// Wall-clock time of the whole execution.
    pub elapsed: Duration,
}

impl FrameReport {
    /// Number of jobs covered by the report.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Returns `true` if the report covers no jobs.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Status of a single job.
    pub fn status(&self, id: JobId) -> Option<&JobStatus> {
        self.statuses.get(id.index())
    }

    /// Returns `true` if every job succeeded.
    pub fn is_complete(&self) -> bool {
        self.statuses.iter().all(JobStatus::is_success)
    }

    /// Number of jobs that succeeded.
    pub fn succeeded(&self) -> usize {
        self.statuses.iter().filter(|s| s.is_success()).count()
    }

    /// Number of jobs that were skipped.
    pub fn skipped(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| matches!(s, JobStatus::Skipped { .. }))
            .count()
    }

    /// The jobs that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (JobId, &JobError)> + '_ {
        self.statuses
            .iter()
            .enumerate()
            .filter_map(|(index, status)| match status {
                JobStatus::Failed(err) => JobId::from_index(index).map(|id| (id, err)),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobKind;

    #[test]
    fn report_counts_outcomes() {
        let report = FrameReport {
            frame_index: 3,
            statuses: vec![
                JobStatus::Succeeded {
                    elapsed: Duration::from_micros(5),
                },
                JobStatus::Failed(JobError::failed(JobKind::LoadTextureData, "corrupt")),
                JobStatus::Skipped { cause: JobId(1) },
            ],
            elapsed: Duration::from_millis(1),
        };
        assert!(!report.is_complete());
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.skipped(), 1);
        let failures: Vec<_> = report.failures().map(|(id, _)| id).collect();
        assert_eq!(failures, vec![JobId(1)]);
    }

    #[test]
    fn empty_report_is_complete() {
        let report = FrameReport {
            frame_index: 0,
            statuses: Vec::new(),
            elapsed: Duration::ZERO,
        };
        assert!(report.is_complete());
        assert!(report.is_empty());
    }
}
