// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gridlight::assets::{self, AssetDirs, AssetKind};
use gridlight::compute::GridCompute;
use gridlight::config::SceneConfig;
use gridlight::prelude::*;
use gridlight::scene::Grid;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// SPIR-V kernel: a file path, or a name looked up under the assets `kernels/` directory
    #[arg(short = 'k', long = "kernel")]
    kernel: String,

    /// Scene TOML: a file path, or a name looked up under the assets `scenes/` directory
    #[arg(short = 's', long = "scene")]
    scene: Option<String>,

    /// Override the scene's grid width
    #[arg(long = "width")]
    width: Option<u32>,

    /// Override the scene's grid height
    #[arg(long = "height")]
    height: Option<u32>,

    /// Enable validation layers (also enabled by a non-empty GRIDLIGHT_VALIDATION)
    #[arg(long = "validation")]
    validation: bool,

    /// Invocations per workgroup, must match the kernel's local size in X
    #[arg(long = "workgroup-size", default_value_t = 64)]
    workgroup_size: u32,

    /// Number of dispatches to run before reading the grid back
    #[arg(long = "passes", default_value_t = 1)]
    passes: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    exit_code(run(&args))
}

/// The error is reported once, through the log.
fn exit_code(result: Result<(), GridlightError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), GridlightError> {
    let dirs = AssetDirs::new();

    let kernel = load_kernel(&dirs, &args.kernel)?;
    let mut scene_config = match &args.scene {
        Some(scene) => load_scene(&dirs, scene)?,
        None => SceneConfig::default(),
    };
    scene_config.resize(args.width, args.height)?;
    let scene = scene_config.to_scene();

    let mut context_config = ContextConfig::from_env();
    context_config.enable_diagnostics |= args.validation;

    let mut compute = GridCompute::new(&context_config, &scene, &kernel)?;

    for pass in 0..args.passes {
        let groups = compute.dispatch_grid(args.workgroup_size)?;
        tracing::debug!(pass, ?groups, "pass complete");
    }

    let grid = compute.read_grid()?;
    report(&scene.grid, &grid);

    compute.destroy();
    Ok(())
}

fn load_kernel(dirs: &AssetDirs, kernel: &str) -> Result<Vec<u32>, GridlightError> {
    let path = Path::new(kernel);
    if path.is_file() {
        Ok(assets::read_kernel(path)?)
    } else {
        Ok(dirs.find_kernel(kernel)?)
    }
}

fn load_scene(dirs: &AssetDirs, scene: &str) -> Result<SceneConfig, GridlightError> {
    let path = PathBuf::from(scene);
    let path = if path.is_file() {
        path
    } else {
        dirs.find(scene, AssetKind::Scene)
            .ok_or_else(|| assets::AssetError::NotFound(scene.to_owned()))?
    };
    SceneConfig::from_path(&path)
}

fn report(before: &Grid, after: &Grid) {
    let values = after.cells().iter().map(|c| c.value);
    let min = values.clone().fold(f32::INFINITY, f32::min);
    let max = values.clone().fold(f32::NEG_INFINITY, f32::max);
    let mean = values.sum::<f32>() / after.len().max(1) as f32;
    let changed = before
        .cells()
        .iter()
        .zip(after.cells())
        .filter(|(b, a)| b.value != a.value)
        .count();

    tracing::info!(
        width = after.width(),
        height = after.height(),
        min,
        max,
        mean,
        changed,
        "grid complete"
    );
}
