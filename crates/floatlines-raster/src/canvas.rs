//! CPU canvas with premultiplied RGBA storage.
//!
//! Strokes are rasterised into a coverage mask (distance to each segment,
//! one pixel of anti-aliasing) and then composited. Joins are always round.
//! A visible shadow blurs a copy of the mask with three box passes, which
//! approximates a gaussian with sigma `blur / 2`, and paints it first.

use std::path::Path as FsPath;

use floatlines_platform::{
    Color, CompositeMode, DrawingSurface, LineCap, Path, Result, Shadow, StrokeStyle,
};
use glam::{Vec2, Vec4};
use image::{ImageFormat, RgbaImage};
use tracing::debug;

const BLUR_PASSES: usize = 3;

pub struct Canvas {
    width: u32,
    height: u32,
    /// Premultiplied RGBA8.
    pixels: Vec<[u8; 4]>,
    composite: CompositeMode,
    shadow: Shadow,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 4]; width as usize * height as usize],
            composite: CompositeMode::default(),
            shadow: Shadow::NONE,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn composite(&self) -> CompositeMode {
        self.composite
    }

    /// Raw premultiplied bytes, row-major, ready for a texture upload.
    pub fn as_premultiplied_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Straight-alpha color at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let px = self.pixels[(y * self.width + x) as usize];
        Some(unpremultiply(px))
    }

    /// Straight-alpha copy, optionally flattened over an opaque background.
    pub fn to_image(&self, background: Option<Color>) -> RgbaImage {
        let backdrop = background.map(Color::premultiplied);
        let mut image = RgbaImage::new(self.width, self.height);
        for (dst, src) in image.pixels_mut().zip(&self.pixels) {
            let px = match backdrop {
                Some(back) => pack(blend(CompositeMode::SourceOver, unpack(*src), back)),
                None => *src,
            };
            let color = unpremultiply(px);
            dst.0 = [color.r, color.g, color.b, color.a];
        }
        image
    }

    pub fn save_png(&self, path: &FsPath, background: Option<Color>) -> Result<()> {
        self.to_image(background)
            .save_with_format(path, ImageFormat::Png)?;
        debug!(path = %path.display(), "canvas written");
        Ok(())
    }

    fn stroke_mask(&self, path: &Path, half_width: f32, pad: f32) -> Option<Mask> {
        let (min, max) = path.bounds()?;
        let reach = Vec2::splat(half_width + 1.0 + pad);
        let (min, max) = (min - reach, max + reach);
        let x0 = (min.x.floor().max(0.0)) as i32;
        let y0 = (min.y.floor().max(0.0)) as i32;
        let x1 = (max.x.ceil().min(self.width as f32)) as i32;
        let y1 = (max.y.ceil().min(self.height as f32)) as i32;
        Mask::new(x0, y0, x1, y1)
    }

    fn composite_mask(&mut self, mask: &Mask, color: Color) {
        let src = color.premultiplied();
        let mode = self.composite;
        for row in 0..mask.height {
            let y = mask.y0 as usize + row;
            for col in 0..mask.width {
                let coverage = mask.data[row * mask.width + col].clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let index = y * self.width as usize + mask.x0 as usize + col;
                let dst = unpack(self.pixels[index]);
                self.pixels[index] = pack(blend(mode, src * coverage, dst));
            }
        }
    }
}

impl DrawingSurface for Canvas {
    fn backing_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            debug!("canvas resize {}x{} -> {}x{}", self.width, self.height, width, height);
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![[0; 4]; width as usize * height as usize];
    }

    fn clear(&mut self) {
        self.pixels.fill([0; 4]);
    }

    fn set_composite(&mut self, mode: CompositeMode) {
        self.composite = mode;
    }

    fn set_shadow(&mut self, shadow: Shadow) {
        self.shadow = shadow;
    }

    fn stroke(&mut self, path: &Path, style: &StrokeStyle) {
        if path.is_empty() || !(style.width > 0.0) {
            return;
        }
        let glow_radius = self
            .shadow
            .is_visible()
            .then(|| box_radius_for_blur(self.shadow.blur));
        let pad = glow_radius.map_or(0.0, |radius| (BLUR_PASSES * radius + 1) as f32);
        let half_width = style.width / 2.0;
        let Some(mut mask) = self.stroke_mask(path, half_width, pad) else {
            return;
        };
        rasterize_stroke(&mut mask, path, half_width, style.cap);

        if let Some(radius) = glow_radius {
            let mut glow = mask.clone();
            glow.blur(radius);
            let shadow_color = self.shadow.color;
            self.composite_mask(&glow, shadow_color);
        }
        self.composite_mask(&mask, style.color);
    }
}

/// Combine premultiplied `src` onto premultiplied `dst`.
pub fn blend(mode: CompositeMode, src: Vec4, dst: Vec4) -> Vec4 {
    match mode {
        CompositeMode::SourceOver => src + dst * (1.0 - src.w),
        CompositeMode::Lighter => (src + dst).min(Vec4::ONE),
        CompositeMode::Screen => src + dst - src * dst,
    }
}

/// Box radius whose three-pass repetition matches a gaussian of sigma `blur / 2`.
fn box_radius_for_blur(blur: f32) -> usize {
    let sigma = blur / 2.0;
    let radius = (((4.0 * sigma * sigma + 1.0).sqrt() - 1.0) / 2.0).round();
    radius.max(1.0) as usize
}

fn unpack(px: [u8; 4]) -> Vec4 {
    Vec4::new(px[0] as f32, px[1] as f32, px[2] as f32, px[3] as f32) / 255.0
}

fn pack(v: Vec4) -> [u8; 4] {
    let v = (v.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    [v.x as u8, v.y as u8, v.z as u8, v.w as u8]
}

fn unpremultiply(px: [u8; 4]) -> Color {
    let alpha = px[3];
    if alpha == 0 {
        return Color::TRANSPARENT;
    }
    let scale = |channel: u8| ((channel as f32 * 255.0 / alpha as f32).round().min(255.0)) as u8;
    Color::rgba(scale(px[0]), scale(px[1]), scale(px[2]), alpha)
}

/// Coverage in `[0, 1]` over a clipped rectangle of the canvas.
#[derive(Clone)]
struct Mask {
    x0: i32,
    y0: i32,
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Mask {
    fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Option<Self> {
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        let (width, height) = ((x1 - x0) as usize, (y1 - y0) as usize);
        Some(Self {
            x0,
            y0,
            width,
            height,
            data: vec![0.0; width * height],
        })
    }

    fn blur(&mut self, radius: usize) {
        let mut scratch = vec![0.0; self.data.len()];
        for _ in 0..BLUR_PASSES {
            box_pass(&self.data, &mut scratch, self.width, self.height, radius, Axis::Horizontal);
            box_pass(&scratch, &mut self.data, self.width, self.height, radius, Axis::Vertical);
        }
    }
}

enum Axis {
    Horizontal,
    Vertical,
}

/// Sliding-window mean along one axis; samples outside the mask count as zero.
fn box_pass(src: &[f32], dst: &mut [f32], width: usize, height: usize, radius: usize, axis: Axis) {
    let (lanes, len, lane_step, step) = match axis {
        Axis::Horizontal => (height, width, width, 1),
        Axis::Vertical => (width, height, 1, width),
    };
    let norm = 1.0 / (2 * radius + 1) as f32;
    for lane in 0..lanes {
        let base = lane * lane_step;
        let at = |i: usize| src[base + i * step];
        let mut sum: f32 = (0..=radius.min(len - 1)).map(at).sum();
        for i in 0..len {
            dst[base + i * step] = sum * norm;
            if i + radius + 1 < len {
                sum += at(i + radius + 1);
            }
            if i >= radius {
                sum -= at(i - radius);
            }
        }
    }
}

fn rasterize_stroke(mask: &mut Mask, path: &Path, half_width: f32, cap: LineCap) {
    let points = path.points();
    if points.len() == 1 {
        if cap == LineCap::Round {
            stamp_segment(mask, points[0], points[0], half_width, false, false);
        }
        return;
    }
    let last = points.len() - 2;
    let butt = cap == LineCap::Butt;
    for (index, (a, b)) in path.segments().enumerate() {
        stamp_segment(mask, a, b, half_width, butt && index == 0, butt && index == last);
    }
}

fn stamp_segment(mask: &mut Mask, a: Vec2, b: Vec2, half_width: f32, cut_start: bool, cut_end: bool) {
    let reach = Vec2::splat(half_width + 1.0);
    let lo = a.min(b) - reach;
    let hi = a.max(b) + reach;
    let x_start = (lo.x.floor() as i32).max(mask.x0);
    let x_end = (hi.x.ceil() as i32).min(mask.x0 + mask.width as i32);
    let y_start = (lo.y.floor() as i32).max(mask.y0);
    let y_end = (hi.y.ceil() as i32).min(mask.y0 + mask.height as i32);

    let ab = b - a;
    let length_sq = ab.length_squared();
    for y in y_start..y_end {
        for x in x_start..x_end {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let t = if length_sq > 0.0 {
                (p - a).dot(ab) / length_sq
            } else {
                0.0
            };
            if (cut_start && t < 0.0) || (cut_end && t > 1.0) {
                continue;
            }
            let distance = p.distance(a + ab * t.clamp(0.0, 1.0));
            let coverage = (half_width + 0.5 - distance).clamp(0.0, 1.0);
            if coverage > 0.0 {
                let index = (y - mask.y0) as usize * mask.width + (x - mask.x0) as usize;
                let cell = &mut mask.data[index];
                *cell = cell.max(coverage);
            }
        }
    }
}
