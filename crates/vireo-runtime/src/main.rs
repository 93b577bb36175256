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

//! Vireo runtime: drives a demo scene through the frame scheduler.
//!
//! Usage: `vireo-runtime [FRAMES] [SCHEDULER_RON] [FRAME_GRAPH_RON]`
//!
//! Scheduler settings may also be overridden through `VIREO_WORKER_THREADS`
//! and `VIREO_MAX_PARALLEL_JOBS`; set `VIREO_FAIL_TEXTURES_ON` to a frame
//! index to inject a job failure.

mod demo;
mod driver;

use anyhow::{Context, Result};
use driver::FrameDriver;
use std::path::{Path, PathBuf};
use vireo_core::FrameGraph;
use vireo_scheduler::SchedulerConfig;

const DEFAULT_FRAMES: u64 = 8;
const DEMO_ENTITIES: usize = 500;

fn config_path(arg: Option<String>, file: &str) -> PathBuf {
    arg.map(PathBuf::from).unwrap_or_else(|| {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("config")
            .join(file)
    })
}

fn load_frame_graph(path: &Path) -> Result<FrameGraph> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read frame graph '{}'", path.display()))?;
    ron::from_str(&text).with_context(|| format!("invalid frame graph '{}'", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let frames = match args.next() {
        Some(value) => value
            .parse::<u64>()
            .with_context(|| format!("invalid frame count '{value}'"))?,
        None => DEFAULT_FRAMES,
    };
    let scheduler_path = config_path(args.next(), "scheduler.ron");
    let frame_graph_path = config_path(args.next(), "frame_graph.ron");

    let mut config = SchedulerConfig::load(&scheduler_path)
        .with_context(|| format!("loading '{}'", scheduler_path.display()))?;
    config
        .apply_env()
        .context("applying environment overrides")?;
    let frame_graph = load_frame_graph(&frame_graph_path)?;
    let fail_textures_on = std::env::var("VIREO_FAIL_TEXTURES_ON")
        .ok()
        .map(|value| value.parse::<u64>())
        .transpose()
        .context("invalid VIREO_FAIL_TEXTURES_ON")?;

    log::info!(
        "Driving {frames} frames over {} views with {:?}",
        frame_graph.views().len(),
        config
    );

    let mut driver = FrameDriver::new(config, frame_graph, DEMO_ENTITIES, fail_textures_on);
    for _ in 0..frames {
        let summary = driver.run_frame().context("frame execution failed")?;
        log::info!(
            "frame {:>3}: {:>3} jobs, {:>4} commands, flags {:?}{}",
            summary.frame_index,
            summary.jobs,
            summary.commands,
            summary.flags,
            if summary.completed {
                String::new()
            } else {
                format!(
                    " [{} failed, {} skipped, will retry]",
                    summary.failed, summary.skipped
                )
            }
        );
    }

    log::info!(
        "Done. Pending dirty state: {:?}",
        driver.scheduler().dirty_flags()
    );
    Ok(())
}
