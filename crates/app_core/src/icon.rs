//! Icon bitmaps and procedural icon synthesis
//!
//! Icons are process-owned RGBA buffers. Synthesized glyphs are drawn with
//! 4x4 supersampling on a transparent background and depend only on
//! `(kind, size)`.

use crate::AppError;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Supported icon sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconSize {
    /// 16x16
    #[default]
    Small,
    /// 32x32
    Large,
}

impl IconSize {
    pub fn pixels(self) -> u32 {
        match self {
            IconSize::Small => 16,
            IconSize::Large => 32,
        }
    }
}

/// Glyphs the synthesizer can draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    UpArrow,
    Refresh,
    Folder,
    Document,
}

/// An owned RGBA icon
#[derive(Clone, PartialEq, Eq)]
pub struct Icon {
    image: RgbaImage,
}

impl fmt::Debug for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Icon")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl Icon {
    /// Wrap a straight-alpha RGBA buffer; `None` if the length does not match
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, pixels).map(|image| Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Raw RGBA bytes, row-major
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Number of pixels with any opacity
    pub fn opaque_pixels(&self) -> usize {
        self.image.pixels().filter(|p| p.0[3] > 0).count()
    }

    /// Washed-out copy with a cloud badge in the lower right corner
    pub fn badged_cloud_only(&self) -> Icon {
        let (w, h) = (self.width(), self.height());
        let mut canvas = Canvas::from_image(&self.image);
        canvas.wash(0.55);

        let radius = (w.min(h) as f32 / 4.0).max(2.5);
        let (cx, cy) = (w as f32 - radius, h as f32 - radius);
        canvas.fill([255, 255, 255, 255], |x, y| hypot(x - cx, y - cy) <= radius);
        canvas.fill([40, 120, 215, 255], |x, y| hypot(x - cx, y - cy) <= radius - 1.0);

        canvas
            .into_icon()
            .unwrap_or_else(|| self.clone())
    }

    /// Save as PNG
    pub fn save_png(&self, path: &Path) -> Result<(), AppError> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(AppError::from)
    }
}

/// Draw a procedural glyph. Deterministic and infallible.
pub fn synthesize(kind: IconKind, size: IconSize) -> Icon {
    let s = size.pixels() as f32;
    let mut canvas = Canvas::new(size.pixels());

    match kind {
        IconKind::UpArrow => draw_up_arrow(&mut canvas, s),
        IconKind::Refresh => draw_refresh(&mut canvas, s),
        IconKind::Folder => draw_folder(&mut canvas, s),
        IconKind::Document => draw_document(&mut canvas, s),
    }

    canvas.into_icon().unwrap_or_else(|| {
        tracing::warn!("Icon raster unavailable for {:?}, using flat glyph", kind);
        flat_glyph(kind, size)
    })
}

/// Single-colour, non anti-aliased stand-in
pub fn flat_glyph(kind: IconKind, size: IconSize) -> Icon {
    let s = size.pixels();
    let sf = s as f32;
    let color = match kind {
        IconKind::UpArrow => Rgba([80, 80, 80, 255]),
        IconKind::Refresh => Rgba([45, 110, 190, 255]),
        IconKind::Folder => Rgba([220, 175, 60, 255]),
        IconKind::Document => Rgba([150, 150, 150, 255]),
    };
    let arrow = up_arrow_points(sf);
    let m = sf / 8.0;

    let image = RgbaImage::from_fn(s, s, |x, y| {
        let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
        let inside = match kind {
            IconKind::UpArrow => point_in_polygon(px, py, &arrow),
            IconKind::Refresh => {
                let d = hypot(px - sf / 2.0, py - sf / 2.0);
                d <= sf / 2.0 - m && d >= sf / 2.0 - m - (sf / 8.0).max(1.5)
            }
            _ => px >= m && px <= sf - m && py >= m && py <= sf - m,
        };
        if inside {
            color
        } else {
            Rgba([0, 0, 0, 0])
        }
    });

    Icon { image }
}

fn up_arrow_points(s: f32) -> [(f32, f32); 7] {
    let m = s / 8.0;
    let neck = s * 0.55;
    let (shaft_l, shaft_r) = (s * 0.36, s * 0.64);
    [
        (s / 2.0, m),
        (s - m, neck),
        (shaft_r, neck),
        (shaft_r, s - m),
        (shaft_l, s - m),
        (shaft_l, neck),
        (m, neck),
    ]
}

fn draw_up_arrow(canvas: &mut Canvas, s: f32) {
    let points = up_arrow_points(s);
    let outline = (s / 16.0).max(1.0);
    let (top, bottom) = (s / 8.0, s - s / 8.0);

    canvas.fill_shaded(
        |x, y| point_in_polygon(x, y, &points),
        |_, y| {
            // vertical gradient, lighter at the tip
            let t = ((y - top) / (bottom - top)).clamp(0.0, 1.0);
            let v = 110.0 - 46.0 * t;
            [v, v, v, 255.0]
        },
    );
    canvas.fill([40, 40, 40, 255], |x, y| {
        polygon_edges(&points).any(|(a, b)| dist_to_segment(x, y, a, b) <= outline / 2.0)
    });
}

fn draw_refresh(canvas: &mut Canvas, s: f32) {
    let m = s / 8.0;
    let c = s / 2.0;
    let r = c - m;
    let pen = (s / 10.0).max(1.5);
    let head = (s / 6.0).max(2.5);
    // Clockwise sweep (y down) from -45deg to 225deg, leaving a gap at the top
    let (start, end) = (-45f32.to_radians(), 225f32.to_radians());
    let color = [45, 110, 190, 255];

    let on_point = |a: f32| (c + r * a.cos(), c + r * a.sin());
    let (sx, sy) = on_point(start);
    let (ex, ey) = on_point(end);

    canvas.fill(color, |x, y| {
        let (dx, dy) = (x - c, y - c);
        let radial = (hypot(dx, dy) - r).abs() <= pen / 2.0;
        let angle = normalize_angle(dy.atan2(dx));
        let in_sweep = !(angle > end && angle < start + std::f32::consts::TAU);
        (radial && in_sweep)
            || hypot(x - sx, y - sy) <= pen / 2.0
            || hypot(x - ex, y - ey) <= pen / 2.0
    });

    // Heads point along the arc, away from the body
    let heads = [
        arrow_head((ex, ey), (-end.sin(), end.cos()), (end.cos(), end.sin()), head),
        arrow_head((sx, sy), (start.sin(), -start.cos()), (start.cos(), start.sin()), head),
    ];
    canvas.fill(color, |x, y| heads.iter().any(|tri| point_in_polygon(x, y, tri)));
}

fn arrow_head(at: (f32, f32), dir: (f32, f32), normal: (f32, f32), size: f32) -> [(f32, f32); 3] {
    let tip = (at.0 + dir.0 * size * 0.9, at.1 + dir.1 * size * 0.9);
    let left = (at.0 + normal.0 * size * 0.7, at.1 + normal.1 * size * 0.7);
    let right = (at.0 - normal.0 * size * 0.7, at.1 - normal.1 * size * 0.7);
    [tip, left, right]
}

fn draw_folder(canvas: &mut Canvas, s: f32) {
    let m = s / 16.0;
    let tab = [(m, s * 0.22), (s * 0.42, s * 0.22), (s * 0.5, s * 0.32), (m, s * 0.32)];
    let body = [(m, s * 0.3), (s - m, s * 0.3), (s - m, s * 0.84), (m, s * 0.84)];

    canvas.fill([190, 140, 35, 255], |x, y| point_in_polygon(x, y, &tab));
    canvas.fill([232, 186, 72, 255], |x, y| point_in_polygon(x, y, &body));
    canvas.fill([170, 122, 28, 255], |x, y| {
        polygon_edges(&body).any(|(a, b)| dist_to_segment(x, y, a, b) <= 0.5)
    });
}

fn draw_document(canvas: &mut Canvas, s: f32) {
    let (l, r, t, b) = (s * 0.2, s * 0.8, s / 16.0, s - s / 16.0);
    let fold = s * 0.22;
    let page = [(l, t), (r - fold, t), (r, t + fold), (r, b), (l, b)];

    canvas.fill([252, 252, 252, 255], |x, y| point_in_polygon(x, y, &page));
    canvas.fill([120, 120, 120, 255], |x, y| {
        polygon_edges(&page).any(|(a, p)| dist_to_segment(x, y, a, p) <= 0.5)
            || dist_to_segment(x, y, (r - fold, t), (r - fold, t + fold)) <= 0.5
            || dist_to_segment(x, y, (r - fold, t + fold), (r, t + fold)) <= 0.5
    });

    let rule = (s / 32.0).max(0.5);
    for i in 0..3 {
        let y0 = s * (0.45 + 0.14 * i as f32);
        canvas.fill([170, 170, 170, 255], |x, y| {
            dist_to_segment(x, y, (l + s * 0.1, y0), (r - s * 0.1, y0)) <= rule
        });
    }
}

/// Straight-alpha float canvas with supersampled coverage
struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

const SAMPLES: u32 = 4;

impl Canvas {
    fn new(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            pixels: vec![[0.0; 4]; (size * size) as usize],
        }
    }

    fn from_image(image: &RgbaImage) -> Self {
        let pixels = image
            .pixels()
            .map(|p| [p.0[0] as f32, p.0[1] as f32, p.0[2] as f32, p.0[3] as f32])
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            pixels,
        }
    }

    fn fill(&mut self, color: [u8; 4], inside: impl Fn(f32, f32) -> bool) {
        let color = color.map(|c| c as f32);
        self.fill_shaded(inside, |_, _| color);
    }

    fn fill_shaded(&mut self, inside: impl Fn(f32, f32) -> bool, shade: impl Fn(f32, f32) -> [f32; 4]) {
        let step = 1.0 / SAMPLES as f32;
        for y in 0..self.height {
            for x in 0..self.width {
                let mut hits = 0;
                for j in 0..SAMPLES {
                    for i in 0..SAMPLES {
                        let sx = x as f32 + (i as f32 + 0.5) * step;
                        let sy = y as f32 + (j as f32 + 0.5) * step;
                        if inside(sx, sy) {
                            hits += 1;
                        }
                    }
                }
                if hits == 0 {
                    continue;
                }
                let coverage = hits as f32 / (SAMPLES * SAMPLES) as f32;
                let src = shade(x as f32 + 0.5, y as f32 + 0.5);
                let idx = (y * self.width + x) as usize;
                self.pixels[idx] = composite(src, coverage, self.pixels[idx]);
            }
        }
    }

    /// Blend colour toward white and drop opacity
    fn wash(&mut self, amount: f32) {
        for p in &mut self.pixels {
            for c in &mut p[..3] {
                *c += (255.0 - *c) * amount;
            }
            p[3] *= 1.0 - amount * 0.5;
        }
    }

    fn into_icon(self) -> Option<Icon> {
        let bytes = self
            .pixels
            .iter()
            .flat_map(|p| p.map(|c| c.round().clamp(0.0, 255.0) as u8))
            .collect();
        Icon::from_rgba(self.width, self.height, bytes)
    }
}

/// Source-over in straight alpha
fn composite(src: [f32; 4], coverage: f32, dst: [f32; 4]) -> [f32; 4] {
    let sa = src[3] / 255.0 * coverage;
    let da = dst[3] / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0.0; 4];
    }
    let mut out = [0.0; 4];
    for i in 0..3 {
        out[i] = (src[i] * sa + dst[i] * da * (1.0 - sa)) / out_a;
    }
    out[3] = out_a * 255.0;
    out
}

fn hypot(x: f32, y: f32) -> f32 {
    (x * x + y * y).sqrt()
}

fn normalize_angle(a: f32) -> f32 {
    let a = a.rem_euclid(std::f32::consts::TAU);
    // keep the sweep contiguous: (-45deg, 0) maps just above TAU - 45deg
    if a > 315f32.to_radians() {
        a - std::f32::consts::TAU
    } else {
        a
    }
}

fn point_in_polygon(x: f32, y: f32, points: &[(f32, f32)]) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (xi, yi) = points[i];
        let (xj, yj) = points[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn polygon_edges(points: &[(f32, f32)]) -> impl Iterator<Item = ((f32, f32), (f32, f32))> + '_ {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| (*a, *b))
}

fn dist_to_segment(px: f32, py: f32, a: (f32, f32), b: (f32, f32)) -> f32 {
    let (vx, vy) = (b.0 - a.0, b.1 - a.1);
    let len2 = vx * vx + vy * vy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((px - a.0) * vx + (py - a.1) * vy) / len2).clamp(0.0, 1.0)
    };
    hypot(px - (a.0 + t * vx), py - (a.1 + t * vy))
}
