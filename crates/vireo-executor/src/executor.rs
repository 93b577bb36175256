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

//! Worker-pool execution of a frame's job graph.

use crossbeam_channel::{Receiver, Sender};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use vireo_core::{
    CycleError, FrameReport, JobContext, JobError, JobGraph, JobHandler, JobId, JobStatus,
};

/// Errors that prevent a frame from being executed at all.
///
/// Individual job failures are not errors here: they are recorded in the
/// [`FrameReport`].
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The graph contains a cycle and can never complete.
    #[error("refusing to execute cyclic job graph: {0}")]
    Cycle(#[from] CycleError),
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread")]
    Spawn(#[source] std::io::Error),
    /// Every worker stopped before the frame completed.
    #[error("worker pool disconnected with {remaining} jobs outstanding")]
    Disconnected {
        /// Jobs without a final status.
        remaining: usize,
    },
}

type Outcome = (JobId, Result<Duration, JobError>);

/// Executes job graphs on a fixed number of worker threads.
///
/// A job is dispatched once every one of its predecessors succeeded.
/// Independent jobs run concurrently, up to the worker count. When a job
/// fails, everything that transitively depends on it is skipped while
/// unrelated jobs keep running.
#[derive(Debug, Clone)]
pub struct JobExecutor {
    workers: usize,
}

impl JobExecutor {
    /// Creates an executor with `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Number of worker threads used per frame.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every job of `graph` to completion and reports the outcome.
    pub fn execute(
        &self,
        graph: &JobGraph,
        handler: &dyn JobHandler,
        ctx: &JobContext<'_>,
    ) -> Result<FrameReport, ExecutorError> {
        let started = Instant::now();
        graph.topological_order()?;

        if graph.is_empty() {
            return Ok(FrameReport {
                frame_index: ctx.frame_index,
                statuses: Vec::new(),
                elapsed: started.elapsed(),
            });
        }

        let (ready_tx, ready_rx) = crossbeam_channel::unbounded::<JobId>();
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<Outcome>();
        let workers = self.workers.min(graph.len());

        let statuses = thread::scope(|scope| {
            for index in 0..workers {
                let ready_rx = ready_rx.clone();
                let done_tx = done_tx.clone();
                thread::Builder::new()
                    .name(format!("vireo-worker-{index}"))
                    .spawn_scoped(scope, move || {
                        work(graph, handler, ctx, ready_rx, done_tx);
                    })
                    .map_err(ExecutorError::Spawn)?;
            }
            drop(done_tx);
            coordinate(graph, ready_tx, done_rx)
        })?;

        let report = FrameReport {
            frame_index: ctx.frame_index,
            statuses,
            elapsed: started.elapsed(),
        };
        log::debug!(
            "frame {}: {} succeeded, {} failed, {} skipped in {:?} on {workers} workers",
            report.frame_index,
            report.succeeded(),
            report.failures().count(),
            report.skipped(),
            report.elapsed,
        );
        Ok(report)
    }
}

fn work(
    graph: &JobGraph,
    handler: &dyn JobHandler,
    ctx: &JobContext<'_>,
    ready: Receiver<JobId>,
    done: Sender<Outcome>,
) {
    for id in ready.iter() {
        let job = graph.job(id);
        log::trace!("running {job}");
        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| handler.execute(job, ctx)))
            .unwrap_or_else(|payload| {
                Err(JobError::Panicked {
                    job: job.kind(),
                    message: panic_message(payload.as_ref()),
                })
            })
            .map(|()| started.elapsed());
        if done.send((id, result)).is_err() {
            break;
        }
    }
}

/// Dispatches ready jobs and records outcomes until every job has a status.
///
/// Owns the ready sender so workers stop as soon as this returns.
fn coordinate(
    graph: &JobGraph,
    ready: Sender<JobId>,
    done: Receiver<Outcome>,
) -> Result<Vec<JobStatus>, ExecutorError> {
    let successors = graph.successors();
    let mut pending: Vec<usize> = graph.jobs().iter().map(|j| j.dependencies().len()).collect();
    let mut statuses: Vec<Option<JobStatus>> = vec![None; graph.len()];
    let mut remaining = graph.len();

    for job in graph.jobs().iter().filter(|job| job.dependencies().is_empty()) {
        dispatch(&ready, job.id(), remaining)?;
    }

    while remaining > 0 {
        let (id, result) = done
            .recv()
            .map_err(|_| ExecutorError::Disconnected { remaining })?;
        remaining -= 1;

        match result {
            Ok(elapsed) => {
                statuses[id.index()] = Some(JobStatus::Succeeded { elapsed });
                for &next in &successors[id.index()] {
                    pending[next.index()] -= 1;
                    if pending[next.index()] == 0 && statuses[next.index()].is_none() {
                        dispatch(&ready, next, remaining)?;
                    }
                }
            }
            Err(err) => {
                log::warn!("{} failed: {err}", graph.job(id));
                statuses[id.index()] = Some(JobStatus::Failed(err));
                remaining -= skip_dependents(id, &successors, &mut statuses);
            }
        }
    }

    statuses
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or(ExecutorError::Disconnected { remaining: 0 })
}

fn dispatch(ready: &Sender<JobId>, id: JobId, remaining: usize) -> Result<(), ExecutorError> {
    ready
        .send(id)
        .map_err(|_| ExecutorError::Disconnected { remaining })
}

/// Marks every job reachable from `failed` as skipped and returns how many
/// were newly marked.
fn skip_dependents(
    failed: JobId,
    successors: &[Vec<JobId>],
    statuses: &mut [Option<JobStatus>],
) -> usize {
    let mut skipped = 0;
    let mut queue: VecDeque<JobId> = successors[failed.index()].iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        if statuses[id.index()].is_some() {
            continue;
        }
        statuses[id.index()] = Some(JobStatus::Skipped { cause: failed });
        skipped += 1;
        queue.extend(successors[id.index()].iter().copied());
    }
    skipped
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("non-string panic payload")
    }
}
