use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geom::Point;
use crate::subdivide::SeedPolicy;

/// What gets subdivided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Midpoint displacement of one horizontal segment.
    #[default]
    Profile,
    /// Refinement of a single triangle.
    Mesh,
}

/// All tunable parameters. Loadable from JSON, every field optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub mode: Mode,

    // Surface
    pub width: u32,
    pub height: u32,

    // Subdivision
    pub depth: u32,
    pub seed: u64,
    pub seed_policy: SeedPolicy,

    // Profile
    /// Height of both endpoints as a fraction of the surface height.
    pub baseline: f64,
    /// Displacement bound at the first level, in pixels.
    pub amplitude: f64,
    pub decay: f64,
    /// Fill the ground under the skyline.
    pub fill: bool,

    // Mesh
    /// Refinement depth in mesh mode; `depth` drives profile mode only.
    pub mesh_depth: u32,
    pub roughness: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            mode: Mode::Profile,
            width: 700,
            height: 700,
            depth: 8,
            seed: 42,
            seed_policy: SeedPolicy::Shared,
            baseline: 0.35,
            amplitude: 180.0,
            decay: 0.55,
            fill: true,
            mesh_depth: 6,
            roughness: 0.3,
        }
    }
}

impl Params {
    /// Load from a JSON file; missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        serde_json::from_str(&text).map_err(ConfigError::Parse)
    }

    /// Profile endpoints spanning the full surface width at the baseline.
    pub fn endpoints(&self) -> (Point, Point) {
        let y = self.height as f64 * self.baseline;
        (Point::new(0.0, y), Point::new(self.width as f64, y))
    }

    /// Root triangle scaled from a 700x700 layout: base at 1/7 height,
    /// apex centred at 5/7.
    pub fn triangle(&self) -> (Point, Point, Point) {
        let (w, h) = (self.width as f64, self.height as f64);
        (
            Point::new(w / 7.0, h / 7.0),
            Point::new(w / 2.0, h * 5.0 / 7.0),
            Point::new(w * 6.0 / 7.0, h / 7.0),
        )
    }
}
