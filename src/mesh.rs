//! Triangle refinement: every level splits each triangle into four, moving
//! each new edge midpoint along the edge normal.
//!
//! Edges shared by two triangles are split once and both triangles reuse the
//! midpoint vertex, so the refined mesh has no cracks.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::GenerateError;
use crate::geom::{Point, Segment};
use crate::rng::{RandomSource, Rng};

/// Deepest triangle refinement accepted (4^10 triangles).
pub const MESH_MAX_DEPTH: u32 = 10;

/// Edge length per unit of displacement budget.
const EDGE_SCALE: f64 = 2.3;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Mesh {
    pub vertices: Vec<Point>,
    pub triangles: Vec<[usize; 3]>,
}

impl Mesh {
    /// Outline of every triangle, three edges each.
    pub fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        self.triangles.iter().flat_map(move |&[a, b, c]| {
            let v = &self.vertices;
            [
                Segment::new(v[a], v[b]),
                Segment::new(v[b], v[c]),
                Segment::new(v[c], v[a]),
            ]
        })
    }
}

/// Midpoint of `a..b` pushed along the edge normal by up to
/// `floor(len / 2.3) * roughness`.
pub fn perpendicular_midpoint<R: RandomSource>(
    a: Point,
    b: Point,
    roughness: f64,
    source: &mut R,
) -> Point {
    let edge = Segment::new(a, b);
    let m = edge.midpoint();
    let len = edge.length();
    let d = source.deviate();
    if len == 0.0 {
        return m;
    }
    let (nx, ny) = (-(b.y - a.y) / len, (b.x - a.x) / len);
    let offset = (len / EDGE_SCALE).floor() * roughness * d;
    Point::new(m.x + nx * offset, m.y + ny * offset)
}

struct Builder {
    vertices: Vec<Point>,
    split: HashMap<(usize, usize), usize>,
    roughness: f64,
    rng: Rng,
}

impl Builder {
    fn midpoint(&mut self, i: usize, j: usize) -> usize {
        let key = if i < j { (i, j) } else { (j, i) };
        if let Some(&k) = self.split.get(&key) {
            return k;
        }
        let p = perpendicular_midpoint(self.vertices[i], self.vertices[j], self.roughness, &mut self.rng);
        let k = self.vertices.len();
        self.vertices.push(p);
        self.split.insert(key, k);
        k
    }
}

fn validate(a: Point, b: Point, c: Point, depth: u32, roughness: f64) -> Result<(), GenerateError> {
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return Err(GenerateError::InvalidInput(
            "triangle vertices must have finite coordinates".into(),
        ));
    }
    let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
    if cross == 0.0 {
        return Err(GenerateError::InvalidInput("triangle is degenerate".into()));
    }
    if !roughness.is_finite() || roughness < 0.0 {
        return Err(GenerateError::InvalidInput(format!(
            "roughness must be a finite non-negative number, got {roughness}"
        )));
    }
    if depth > MESH_MAX_DEPTH {
        return Err(GenerateError::DepthLimitExceeded {
            depth,
            limit: MESH_MAX_DEPTH,
        });
    }
    Ok(())
}

/// Refine triangle `abc` `depth` times. Triangles are processed level by
/// level in queue order, drawing D (ab), E (bc), F (ac) for each one.
pub fn subdivide_triangle(
    a: Point,
    b: Point,
    c: Point,
    depth: u32,
    roughness: f64,
    seed: u64,
) -> Result<Mesh, GenerateError> {
    validate(a, b, c, depth, roughness)?;
    tracing::debug!(depth, roughness, seed, "refining triangle");

    let mut builder = Builder {
        vertices: vec![a, b, c],
        split: HashMap::new(),
        roughness,
        rng: Rng::new(seed),
    };
    let mut triangles = vec![[0usize, 1, 2]];

    for _ in 0..depth {
        // Edges of this level never reappear in the next one.
        builder.split.clear();
        let mut next = Vec::with_capacity(triangles.len() * 4);
        for &[ia, ib, ic] in &triangles {
            let d = builder.midpoint(ia, ib);
            let e = builder.midpoint(ib, ic);
            let f = builder.midpoint(ia, ic);
            next.extend([[d, ib, e], [ia, d, f], [f, e, ic], [d, e, f]]);
        }
        triangles = next;
    }

    Ok(Mesh {
        vertices: builder.vertices,
        triangles,
    })
}
