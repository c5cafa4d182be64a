pub mod cli;
pub mod config;
pub mod error;
pub mod geom;
pub mod logging;
pub mod mesh;
pub mod render;
pub mod rng;
pub mod subdivide;

use std::time::Instant;

use serde::Serialize;

use config::{Mode, Params};
use error::Error;
use geom::Profile;
use mesh::Mesh;

pub use error::{ConfigError, GenerateError, RenderError};
pub use geom::Point;
pub use subdivide::{SeedPolicy, generate};

/// Generated geometry, before rasterization.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Profile(Profile),
    Mesh(Mesh),
}

pub struct Landscape {
    pub width: u32,
    pub height: u32,
    pub shape: Shape,
    pub rgba: Vec<u8>,
}

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Generate the configured shape and rasterize it.
pub fn build(params: &Params) -> Result<(Landscape, Vec<Timing>), Error> {
    let mut timings = Vec::new();
    let total_start = Instant::now();

    // 1. Subdivide
    let t = Instant::now();
    let shape = match params.mode {
        Mode::Profile => {
            let (left, right) = params.endpoints();
            Shape::Profile(subdivide::generate_with(
                params.seed_policy,
                left,
                right,
                params.depth,
                params.amplitude,
                params.decay,
                params.seed,
            )?)
        }
        Mode::Mesh => {
            let (a, b, c) = params.triangle();
            Shape::Mesh(mesh::subdivide_triangle(
                a,
                b,
                c,
                params.mesh_depth,
                params.roughness,
                params.seed,
            )?)
        }
    };
    timings.push(Timing {
        name: "generate",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 2. Render
    let t = Instant::now();
    let rgba = match &shape {
        Shape::Profile(profile) => {
            render::render_profile(profile, params.width, params.height, params.fill)?
        }
        Shape::Mesh(mesh) => render::render_mesh(mesh, params.width, params.height)?,
    };
    timings.push(Timing {
        name: "render",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    timings.push(Timing {
        name: "TOTAL",
        ms: total_start.elapsed().as_secs_f64() * 1000.0,
    });

    for t in &timings {
        tracing::info!(stage = t.name, ms = t.ms, "stage finished");
    }

    let landscape = Landscape {
        width: params.width,
        height: params.height,
        shape,
        rgba,
    };
    Ok((landscape, timings))
}
