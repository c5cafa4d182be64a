//! Command-line arguments for the `ridgeline` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Mode, Params};
use crate::error::GenerateError;
use crate::subdivide::{SeedPolicy, checked_depth};

/// CLI values override settings loaded from `--config`.
#[derive(Parser, Debug)]
#[command(name = "ridgeline", about = "Fractal mountain skylines by midpoint displacement")]
pub struct CliArgs {
    /// JSON file with parameters.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Subdivide a segment (profile) or a triangle (mesh).
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Profile recursion depth.
    #[arg(long, allow_negative_numbers = true)]
    pub depth: Option<i64>,

    /// Triangle refinement depth in mesh mode.
    #[arg(long, allow_negative_numbers = true)]
    pub mesh_depth: Option<i64>,

    /// Displacement bound at the first level, in pixels.
    #[arg(long, allow_negative_numbers = true)]
    pub amplitude: Option<f64>,

    /// Amplitude multiplier per level, in [0, 1].
    #[arg(long, allow_negative_numbers = true)]
    pub decay: Option<f64>,

    /// Mesh displacement relative to edge length.
    #[arg(long, allow_negative_numbers = true)]
    pub roughness: Option<f64>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum)]
    pub seed_policy: Option<SeedPolicy>,

    /// Surface width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Surface height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Endpoint height as a fraction of the surface height.
    #[arg(long)]
    pub baseline: Option<f64>,

    /// Draw the outline only.
    #[arg(long)]
    pub no_fill: bool,

    /// Where to write the PNG snapshot.
    #[arg(long, default_value = "artifacts/ridgeline.png")]
    pub output: PathBuf,

    /// Print the generated points as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Params {
    /// Apply CLI overrides to loaded params. Fails on a negative or oversized depth.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) -> Result<(), GenerateError> {
        if let Some(mode) = args.mode {
            self.mode = mode;
        }
        if let Some(depth) = args.depth {
            self.depth = checked_depth(depth)?;
        }
        if let Some(depth) = args.mesh_depth {
            self.mesh_depth = checked_depth(depth)?;
        }
        if let Some(a) = args.amplitude {
            self.amplitude = a;
        }
        if let Some(d) = args.decay {
            self.decay = d;
        }
        if let Some(r) = args.roughness {
            self.roughness = r;
        }
        if let Some(seed) = args.seed {
            self.seed = seed;
        }
        if let Some(policy) = args.seed_policy {
            self.seed_policy = policy;
        }
        if let Some(w) = args.width {
            self.width = w;
        }
        if let Some(h) = args.height {
            self.height = h;
        }
        if let Some(b) = args.baseline {
            self.baseline = b;
        }
        if args.no_fill {
            self.fill = false;
        }
        Ok(())
    }
}
