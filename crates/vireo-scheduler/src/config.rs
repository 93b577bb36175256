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

//! Scheduler configuration.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound on the shards of one fanned-out stage.
pub const MAX_SHARDS: usize = u16::MAX as usize;

/// Environment variable overriding [`SchedulerConfig::worker_threads`].
pub const ENV_WORKER_THREADS: &str = "VIREO_WORKER_THREADS";
/// Environment variable overriding [`SchedulerConfig::max_parallel_jobs`].
pub const ENV_MAX_PARALLEL_JOBS: &str = "VIREO_MAX_PARALLEL_JOBS";

/// Errors raised while loading or validating a [`SchedulerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file '{path}'")]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration text is not valid RON for this type.
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// A value is out of range.
    #[error("invalid value '{value}' for {key}")]
    InvalidValue {
        /// Name of the offending setting.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Tuning knobs for job-graph construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Worker threads available to the executor. `None` uses the machine's
    /// available parallelism.
    pub worker_threads: Option<usize>,
    /// Upper bound on the shards of a fanned-out stage.
    pub max_parallel_jobs: usize,
    /// Minimum number of entities worth a shard of their own. `0` disables
    /// the scene-size cap.
    pub min_entities_per_job: usize,
    /// Check every built graph for ordering defects.
    pub validate_graphs: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            max_parallel_jobs: 8,
            min_entities_per_job: 32,
            validate_graphs: true,
        }
    }
}

impl SchedulerConfig {
    /// Parses a configuration from RON text and validates it.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Applies overrides looked up by variable name (usually
    /// `std::env::var`).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(ENV_WORKER_THREADS) {
            self.worker_threads = Some(parse_count(ENV_WORKER_THREADS, &value)?);
        }
        if let Some(value) = lookup(ENV_MAX_PARALLEL_JOBS) {
            self.max_parallel_jobs = parse_count(ENV_MAX_PARALLEL_JOBS, &value)?;
        }
        self.validate()
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Rejects settings that would leave the scheduler without workers or
    /// fan a stage out beyond [`MAX_SHARDS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "worker_threads",
                value: "0".into(),
            });
        }
        if self.max_parallel_jobs == 0 || self.max_parallel_jobs > MAX_SHARDS {
            return Err(ConfigError::InvalidValue {
                key: "max_parallel_jobs",
                value: self.max_parallel_jobs.to_string(),
            });
        }
        Ok(())
    }

    /// Worker threads the executor should spawn.
    pub fn worker_count(&self) -> usize {
        self.worker_threads
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(1)
            })
            .max(1)
    }

    /// Shards a fanned-out stage may use given the worker pool alone.
    ///
    /// Never exceeds [`MAX_SHARDS`], even for a configuration that skipped
    /// [`validate`](Self::validate).
    pub fn worker_cap(&self) -> usize {
        self.worker_count()
            .min(self.max_parallel_jobs)
            .min(MAX_SHARDS)
            .max(1)
    }

    /// Shards worth creating for `entities` entities, ignoring workers.
    pub fn scene_cap(&self, entities: usize) -> usize {
        if self.min_entities_per_job == 0 {
            return usize::MAX;
        }
        entities.div_ceil(self.min_entities_per_job).max(1)
    }
}

fn parse_count(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_owned(),
        }),
    }
}
