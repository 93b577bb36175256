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

//! The contract between the executor and the bodies of jobs.

use crate::error::JobError;
use crate::job::JobRecord;
use crate::view::ViewDescriptor;

/// Frame-wide data handed to every job body.
#[derive(Debug, Clone, Copy)]
pub struct JobContext<'a> {
    /// Index of the frame being executed.
    pub frame_index: u64,
    /// The frame-graph leaves the frame was built for, indexed by
    /// [`JobRecord::view`].
    pub views: &'a [ViewDescriptor],
}

impl<'a> JobContext<'a> {
    /// Creates a context for one frame.
    pub fn new(frame_index: u64, views: &'a [ViewDescriptor]) -> Self {
        Self { frame_index, views }
    }

    /// The leaf a view-scoped job belongs to.
    pub fn view(&self, job: &JobRecord) -> Option<&'a ViewDescriptor> {
        job.view().and_then(|index| self.views.get(index))
    }
}

/// Runs the body of a job.
///
/// A single handler serves every job of a frame and is invoked concurrently
/// from worker threads; it dispatches on [`JobRecord::kind`]. Errors are
/// reported as values and never cross the job boundary as panics.
pub trait JobHandler: Send + Sync {
    /// Executes one job.
    fn execute(&self, job: &JobRecord, ctx: &JobContext<'_>) -> Result<(), JobError>;
}

impl<F> JobHandler for F
where
    F: Fn(&JobRecord, &JobContext<'_>) -> Result<(), JobError> + Send + Sync,
{
    fn execute(&self, job: &JobRecord, ctx: &JobContext<'_>) -> Result<(), JobError> {
        self(job, ctx)
    }
}
