//! Midpoint displacement of a single segment.
//!
//! The profile for depth `d` has `2^d + 1` points and is built in one
//! preallocated buffer. Each recursion level owns the interior slots between
//! its two endpoints, writes its displaced midpoint into the middle slot and
//! hands the two halves to its children, so sibling subtrees never alias.

use serde::{Deserialize, Serialize};

use crate::error::GenerateError;
use crate::geom::{Point, Profile};
use crate::rng::{RandomSource, Rng, branch_seeds, deviate_for};

/// Deepest subdivision accepted (2^24 + 1 points).
pub const MAX_DEPTH: u32 = 24;

/// Interior slot count above which per-branch subtrees are split across threads.
const PAR_CUTOFF: usize = 1 << 12;

/// How random draws are assigned to the nodes of the subdivision tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SeedPolicy {
    /// One stream, drawn in pre-order: node, left subtree, right subtree.
    #[default]
    Shared,
    /// Every node derives its own seed from its parent's; subtrees are independent.
    PerBranch,
}

/// Convert a signed depth from an outer surface (CLI, HTTP) into a checked one.
pub fn checked_depth(raw: i64) -> Result<u32, GenerateError> {
    if raw < 0 {
        return Err(GenerateError::InvalidInput(format!(
            "depth must be non-negative, got {raw}"
        )));
    }
    let depth = u32::try_from(raw).unwrap_or(u32::MAX);
    if depth > MAX_DEPTH {
        return Err(GenerateError::DepthLimitExceeded {
            depth,
            limit: MAX_DEPTH,
        });
    }
    Ok(depth)
}

fn validate(
    left: Point,
    right: Point,
    depth: u32,
    amplitude: f64,
    decay: f64,
) -> Result<(), GenerateError> {
    if !left.is_finite() || !right.is_finite() {
        return Err(GenerateError::InvalidInput(
            "endpoints must have finite coordinates".into(),
        ));
    }
    if left.x >= right.x {
        return Err(GenerateError::InvalidInput(format!(
            "left.x ({}) must be strictly less than right.x ({})",
            left.x, right.x
        )));
    }
    if !amplitude.is_finite() || amplitude < 0.0 {
        return Err(GenerateError::InvalidInput(format!(
            "amplitude must be a finite non-negative number, got {amplitude}"
        )));
    }
    if !(0.0..=1.0).contains(&decay) {
        return Err(GenerateError::InvalidInput(format!(
            "decay must lie in [0, 1], got {decay}"
        )));
    }
    if depth > MAX_DEPTH {
        return Err(GenerateError::DepthLimitExceeded {
            depth,
            limit: MAX_DEPTH,
        });
    }
    Ok(())
}

#[inline]
fn displaced(left: Point, right: Point, amplitude: f64, deviate: f64) -> Point {
    let mut m = left.midpoint(right);
    m.y += amplitude * deviate;
    m
}

fn fill_shared<R: RandomSource>(
    left: Point,
    right: Point,
    out: &mut [Point],
    amplitude: f64,
    decay: f64,
    source: &mut R,
) {
    if out.is_empty() {
        return;
    }
    let mid = out.len() / 2;
    let m = displaced(left, right, amplitude, source.deviate());
    out[mid] = m;

    let (lo, rest) = out.split_at_mut(mid);
    let hi = &mut rest[1..];
    let next = amplitude * decay;
    fill_shared(left, m, lo, next, decay, source);
    fill_shared(m, right, hi, next, decay, source);
}

fn fill_branch(
    left: Point,
    right: Point,
    out: &mut [Point],
    amplitude: f64,
    decay: f64,
    seed: u64,
    cutoff: usize,
) {
    if out.is_empty() {
        return;
    }
    let mid = out.len() / 2;
    let m = displaced(left, right, amplitude, deviate_for(seed));
    out[mid] = m;

    let (lo, rest) = out.split_at_mut(mid);
    let hi = &mut rest[1..];
    let next = amplitude * decay;
    let (ls, rs) = branch_seeds(seed);
    if lo.len() >= cutoff {
        rayon::join(
            || fill_branch(left, m, lo, next, decay, ls, cutoff),
            || fill_branch(m, right, hi, next, decay, rs, cutoff),
        );
    } else {
        fill_branch(left, m, lo, next, decay, ls, cutoff);
        fill_branch(m, right, hi, next, decay, rs, cutoff);
    }
}

fn finish(points: Vec<Point>, left: Point, right: Point, depth: u32) -> Result<Profile, GenerateError> {
    Profile::from_points(points).map_err(|_| {
        GenerateError::InvalidInput(format!(
            "interval [{}, {}] is too narrow to subdivide {} times",
            left.x, right.x, depth
        ))
    })
}

fn buffer(left: Point, right: Point, depth: u32) -> Vec<Point> {
    let n = (1usize << depth) + 1;
    let mut points = vec![left; n];
    points[n - 1] = right;
    points
}

/// Subdivide `left..right` `depth` times, drawing displacements from `source`
/// in pre-order.
pub fn subdivide<R: RandomSource>(
    left: Point,
    right: Point,
    depth: u32,
    amplitude: f64,
    decay: f64,
    mut source: R,
) -> Result<Profile, GenerateError> {
    validate(left, right, depth, amplitude, decay)?;
    let mut points = buffer(left, right, depth);
    let n = points.len();
    fill_shared(left, right, &mut points[1..n - 1], amplitude, decay, &mut source);
    finish(points, left, right, depth)
}

/// Seeded reference generator: one shared splitmix stream.
pub fn generate(
    left: Point,
    right: Point,
    depth: u32,
    amplitude: f64,
    decay: f64,
    seed: u64,
) -> Result<Profile, GenerateError> {
    subdivide(left, right, depth, amplitude, decay, Rng::new(seed))
}

/// Seeded generator with per-node derived seeds. Large subtrees run on the
/// rayon pool; the result does not depend on how the work was split.
pub fn generate_per_branch(
    left: Point,
    right: Point,
    depth: u32,
    amplitude: f64,
    decay: f64,
    seed: u64,
) -> Result<Profile, GenerateError> {
    per_branch_with_cutoff(left, right, depth, amplitude, decay, seed, PAR_CUTOFF)
}

fn per_branch_with_cutoff(
    left: Point,
    right: Point,
    depth: u32,
    amplitude: f64,
    decay: f64,
    seed: u64,
    cutoff: usize,
) -> Result<Profile, GenerateError> {
    validate(left, right, depth, amplitude, decay)?;
    let mut points = buffer(left, right, depth);
    let n = points.len();
    fill_branch(left, right, &mut points[1..n - 1], amplitude, decay, seed, cutoff);
    finish(points, left, right, depth)
}

/// Dispatch on the seed policy.
pub fn generate_with(
    policy: SeedPolicy,
    left: Point,
    right: Point,
    depth: u32,
    amplitude: f64,
    decay: f64,
    seed: u64,
) -> Result<Profile, GenerateError> {
    tracing::debug!(?policy, depth, amplitude, decay, seed, "subdividing segment");
    match policy {
        SeedPolicy::Shared => generate(left, right, depth, amplitude, decay, seed),
        SeedPolicy::PerBranch => generate_per_branch(left, right, depth, amplitude, decay, seed),
    }
}
