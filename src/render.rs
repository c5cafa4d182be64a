use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ImageEncoder, ImageError};
use rayon::prelude::*;

use crate::error::RenderError;
use crate::geom::{Point, Profile, Segment};
use crate::mesh::Mesh;

const SKY_TOP: [u8; 4] = [70, 110, 170, 255];
const SKY_HORIZON: [u8; 4] = [200, 220, 240, 255];
const ROCK_LOW: [u8; 4] = [70, 75, 80, 255];
const ROCK_HIGH: [u8; 4] = [140, 130, 120, 255];
const SNOW: [u8; 4] = [245, 248, 250, 255];
const INK: [u8; 4] = [0, 0, 0, 255];
const PAPER: [u8; 4] = [255, 255, 255, 255];

/// Largest accepted surface side, in pixels.
pub const MAX_SURFACE_SIDE: u32 = 8192;

/// Fraction of the profile's height range below the snow line.
const SNOW_LINE: f32 = 0.6;

#[inline]
fn lerp_color(a: [u8; 4], b: [u8; 4], t: f32) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t).round() as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t).round() as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t).round() as u8,
        255,
    ]
}

fn surface(width: u32, height: u32) -> Result<(usize, usize), RenderError> {
    if width == 0 || height == 0 || width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
        return Err(RenderError::InvalidSurface { width, height });
    }
    Ok((width as usize, height as usize))
}

fn check_buffer(rgba: &[u8], width: u32, height: u32) -> Result<(), RenderError> {
    let (w, h) = surface(width, height)?;
    let expected = w * h * 4;
    if rgba.len() != expected {
        return Err(RenderError::BufferSize {
            expected,
            actual: rgba.len(),
        });
    }
    Ok(())
}

#[inline]
fn ground_color(t: f32) -> [u8; 4] {
    if t < SNOW_LINE {
        lerp_color(ROCK_LOW, ROCK_HIGH, t / SNOW_LINE)
    } else {
        lerp_color(ROCK_HIGH, SNOW, (t - SNOW_LINE) / (1.0 - SNOW_LINE))
    }
}

/// Surface position of a point in pixel units; y is flipped so that larger
/// y is higher up.
#[inline]
fn to_surface(p: Point, h: usize) -> (f64, f64) {
    (p.x, h as f64 - p.y)
}

/// Liang-Barsky clip of `a..b` to `[0, xmax] x [0, ymax]`.
fn clip(a: (f64, f64), b: (f64, f64), xmax: f64, ymax: f64) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, a.0), (dx, xmax - a.0), (-dy, a.1), (dy, ymax - a.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((
        (a.0 + t0 * dx, a.1 + t0 * dy),
        (a.0 + t1 * dx, a.1 + t1 * dy),
    ))
}

/// Bresenham line over the part of `seg` that lies on the surface.
fn draw_line(rgba: &mut [u8], w: usize, h: usize, seg: Segment, color: [u8; 4]) {
    let (xmax, ymax) = ((w - 1) as f64, (h - 1) as f64);
    let Some((a, b)) = clip(to_surface(seg.left, h), to_surface(seg.right, h), xmax, ymax) else {
        return;
    };
    let pixel = |v: f64, max: f64| v.round().clamp(0.0, max) as i64;
    let (mut x0, mut y0) = (pixel(a.0, xmax), pixel(a.1, ymax));
    let (x1, y1) = (pixel(b.0, xmax), pixel(b.1, ymax));

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        let i = (y0 as usize * w + x0 as usize) * 4;
        rgba[i..i + 4].copy_from_slice(&color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Render a skyline: sky gradient above, altitude-tinted ground below when
/// `fill` is set, black outline on top.
pub fn render_profile(
    profile: &Profile,
    width: u32,
    height: u32,
    fill: bool,
) -> Result<Vec<u8>, RenderError> {
    let (w, h) = surface(width, height)?;
    let (lo, hi) = profile.y_range();
    let range = (hi - lo).max(f64::EPSILON);

    // Skyline height under each pixel column centre.
    let skyline: Vec<Option<f64>> = (0..w)
        .map(|px| profile.height_at(px as f64 + 0.5))
        .collect();

    let mut rgba = vec![0u8; w * h * 4];
    rgba.par_chunks_mut(w * 4).enumerate().for_each(|(row_idx, row)| {
        let y = h as f64 - row_idx as f64 - 0.5;
        let sky = lerp_color(SKY_TOP, SKY_HORIZON, row_idx as f32 / h as f32);
        for (px, top) in skyline.iter().enumerate() {
            let color = match top {
                Some(top) if fill && y <= *top => ground_color(((y - lo) / range) as f32),
                _ => sky,
            };
            row[px * 4..px * 4 + 4].copy_from_slice(&color);
        }
    });

    for seg in profile.segments() {
        draw_line(&mut rgba, w, h, seg, INK);
    }
    Ok(rgba)
}

/// Render triangle outlines in black on white.
pub fn render_mesh(mesh: &Mesh, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
    let (w, h) = surface(width, height)?;
    let mut rgba = PAPER.repeat(w * h);
    for seg in mesh.edges() {
        draw_line(&mut rgba, w, h, seg, INK);
    }
    Ok(rgba)
}

/// Encode an RGBA buffer as PNG bytes.
pub fn encode_png(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
    check_buffer(rgba, width, height)?;
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(rgba, width, height, image::ExtendedColorType::Rgba8)
        .map_err(RenderError::Encode)?;
    Ok(buf)
}

/// Write an RGBA buffer to `path` as PNG.
pub fn save_png(path: &Path, rgba: &[u8], width: u32, height: u32) -> Result<(), RenderError> {
    check_buffer(rgba, width, height)?;
    image::save_buffer(path, rgba, width, height, image::ColorType::Rgba8).map_err(|e| match e {
        ImageError::IoError(source) => RenderError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => RenderError::Encode(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::subdivide_triangle;

    fn pixel(rgba: &[u8], w: usize, x: usize, y: usize) -> [u8; 4] {
        let i = (y * w + x) * 4;
        [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]]
    }

    fn flat(y: f64) -> Profile {
        Profile::from_points(vec![Point::new(0.0, y), Point::new(100.0, y)]).unwrap()
    }

    #[test]
    fn profile_buffer_size() {
        let rgba = render_profile(&flat(50.0), 100, 80, true).unwrap();
        assert_eq!(rgba.len(), 100 * 80 * 4);
    }

    #[test]
    fn sky_above_ground_below_outline_between() {
        let rgba = render_profile(&flat(50.0), 100, 100, true).unwrap();
        let sky = pixel(&rgba, 100, 50, 10);
        assert!(sky[2] > sky[0], "sky should be blue, got {sky:?}");
        assert_eq!(pixel(&rgba, 100, 50, 90), ROCK_LOW);
        assert_eq!(pixel(&rgba, 100, 50, 50), INK);
    }

    #[test]
    fn unfilled_profile_keeps_sky_below() {
        let rgba = render_profile(&flat(50.0), 100, 100, false).unwrap();
        assert_ne!(pixel(&rgba, 100, 50, 90), ROCK_LOW);
        assert_eq!(pixel(&rgba, 100, 50, 50), INK);
    }

    #[test]
    fn ground_color_spans_palette() {
        assert_eq!(ground_color(0.0), ROCK_LOW);
        assert_eq!(ground_color(SNOW_LINE), ROCK_HIGH);
        assert_eq!(ground_color(1.0), SNOW);
    }

    #[test]
    fn mesh_outline_on_paper() {
        let mesh = subdivide_triangle(
            Point::new(10.0, 10.0),
            Point::new(50.0, 90.0),
            Point::new(90.0, 10.0),
            2,
            0.0,
            1,
        )
        .unwrap();
        let rgba = render_mesh(&mesh, 100, 100).unwrap();
        assert_eq!(pixel(&rgba, 100, 0, 0), PAPER);
        // Bottom edge runs along y = 10, i.e. row 90.
        assert_eq!(pixel(&rgba, 100, 50, 90), INK);
    }

    #[test]
    fn empty_surface_rejected() {
        assert!(matches!(
            render_profile(&flat(1.0), 0, 10, true),
            Err(RenderError::InvalidSurface { width: 0, height: 10 })
        ));
    }

    #[test]
    fn oversized_surface_rejected() {
        assert!(matches!(
            render_profile(&flat(1.0), MAX_SURFACE_SIDE + 1, 10, true),
            Err(RenderError::InvalidSurface { .. })
        ));
    }

    #[test]
    fn far_off_surface_peak_renders_quickly() {
        let profile = Profile::from_points(vec![
            Point::new(0.0, 100.0),
            Point::new(350.0, 1.0e12),
            Point::new(699.0, 100.0),
        ])
        .unwrap();
        let start = std::time::Instant::now();
        let rgba = render_profile(&profile, 700, 700, true).unwrap();
        assert!(
            start.elapsed() < std::time::Duration::from_secs(5),
            "took {:?}",
            start.elapsed()
        );
        // Both flanks still cross the bottom rows near the endpoints.
        assert_eq!(pixel(&rgba, 700, 0, 600), INK);
        assert_eq!(pixel(&rgba, 700, 699, 600), INK);
    }

    #[test]
    fn clip_keeps_inside_part_only() {
        let ((x0, y0), (x1, y1)) = clip((-10.0, 5.0), (20.0, 5.0), 9.0, 9.0).unwrap();
        assert!(x0.abs() < 1e-9 && (x1 - 9.0).abs() < 1e-9, "x {x0}..{x1}");
        assert_eq!((y0, y1), (5.0, 5.0));
        assert_eq!(clip((-10.0, -1.0), (20.0, -1.0), 9.0, 9.0), None);
        assert_eq!(clip((-5.0, 20.0), (20.0, -5.0), 9.0, 9.0).map(|_| ()), Some(()));
        assert_eq!(clip((20.0, 0.0), (30.0, 9.0), 9.0, 9.0), None);
    }

    #[test]
    fn png_signature() {
        let rgba = PAPER.repeat(4 * 3);
        let png = encode_png(&rgba, 4, 3).unwrap();
        assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    }

    #[test]
    fn png_rejects_short_buffer() {
        assert!(matches!(
            encode_png(&[0u8; 7], 2, 2),
            Err(RenderError::BufferSize { expected: 16, actual: 7 })
        ));
    }

    #[test]
    fn save_png_round_trips_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.png");
        let rgba = render_profile(&flat(20.0), 40, 30, true).unwrap();
        save_png(&path, &rgba, 40, 30).unwrap();
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (40, 30));
    }
}
