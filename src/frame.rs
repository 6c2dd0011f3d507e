//! Persistent CPU frame surface for Starfall
//! Float RGB buffer with canvas-style source-over compositing, so star
//! trails accumulate across frames instead of being cleared

use egui::{Color32, ColorImage};
use rayon::prelude::*;

/// Radial glow ramp: alpha multiplier stops at fractions of the glow radius.
const GLOW_STOPS: [(f32, f32); 4] = [(0.0, 1.0), (0.25, 0.6), (0.6, 0.12), (1.0, 0.0)];

/// A retained drawing surface. RGB is kept in 0-255 float space between
/// frames; each frame is faded, drawn over, then quantized to RGBA8 for
/// texture upload.
pub struct FrameBuffer {
    width: usize,
    height: usize,
    rgb: Vec<f32>,
    rgba: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let px = width * height;
        Self {
            width,
            height,
            rgb: vec![0.0; px * 3],
            rgba: vec![0; px * 4],
        }
    }

    /// Reallocate for a new surface size, starting from black again.
    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            *self = Self::new(width, height);
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Source-over blend of full-surface black at the given alpha. Run once
    /// per tick, this is what turns last frame's stars into fading trails.
    pub fn fade(&mut self, alpha: f32) {
        let keep = 1.0 - alpha.clamp(0.0, 1.0);
        self.rgb.par_iter_mut().for_each(|v| *v *= keep);
    }

    /// Blend one pixel with straight-alpha OVER. Alpha saturates at 1 here;
    /// callers may pass formula values above 1.
    fn blend_over(&mut self, x: i32, y: i32, r: f32, g: f32, b: f32, alpha: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let a = alpha.clamp(0.0, 1.0);
        let base = (y as usize * self.width + x as usize) * 3;
        self.rgb[base] = r * a + self.rgb[base] * (1.0 - a);
        self.rgb[base + 1] = g * a + self.rgb[base + 1] * (1.0 - a);
        self.rgb[base + 2] = b * a + self.rgb[base + 2] * (1.0 - a);
    }

    /// Fill a radial gradient centered at (cx, cy) over its covering square,
    /// fading from `alpha` at the center to fully transparent at `radius`.
    pub fn glow(&mut self, cx: f32, cy: f32, radius: f32, color: Color32, alpha: f32) {
        if radius <= 0.0 || alpha <= 0.0 {
            return;
        }
        let r = color.r() as f32;
        let g = color.g() as f32;
        let b = color.b() as f32;

        let min_x = (cx - radius).floor() as i32;
        let max_x = (cx + radius).ceil() as i32;
        let min_y = (cy - radius).floor() as i32;
        let max_y = (cy + radius).ceil() as i32;

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let t = (dx * dx + dy * dy).sqrt() / radius;
                let mult = glow_ramp(t);
                if mult > 0.0 {
                    self.blend_over(px, py, r, g, b, alpha * mult);
                }
            }
        }
    }

    /// Fill a circle with a one-pixel antialiased rim.
    pub fn circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color32, alpha: f32) {
        if radius <= 0.0 || alpha <= 0.0 {
            return;
        }
        let r = color.r() as f32;
        let g = color.g() as f32;
        let b = color.b() as f32;

        let min_x = (cx - radius - 1.0).floor() as i32;
        let max_x = (cx + radius + 1.0).ceil() as i32;
        let min_y = (cy - radius - 1.0).floor() as i32;
        let max_y = (cy + radius + 1.0).ceil() as i32;

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_over(px, py, r, g, b, alpha * coverage);
                }
            }
        }
    }

    /// Quantize the float buffer to RGBA8 (opaque) for texture upload.
    pub fn to_color_image(&mut self) -> ColorImage {
        self.rgba
            .par_chunks_mut(4)
            .zip(self.rgb.par_chunks(3))
            .for_each(|(out, rgb)| {
                out[0] = rgb[0].clamp(0.0, 255.0) as u8;
                out[1] = rgb[1].clamp(0.0, 255.0) as u8;
                out[2] = rgb[2].clamp(0.0, 255.0) as u8;
                out[3] = 255;
            });
        ColorImage::from_rgba_unmultiplied([self.width, self.height], &self.rgba)
    }

    /// Peak channel value at a pixel, for inspecting what got drawn.
    #[cfg(test)]
    fn peak_at(&self, x: usize, y: usize) -> f32 {
        let base = (y * self.width + x) * 3;
        self.rgb[base].max(self.rgb[base + 1]).max(self.rgb[base + 2])
    }
}

/// Piecewise-linear interpolation over the glow stops.
fn glow_ramp(t: f32) -> f32 {
    if t >= 1.0 {
        return 0.0;
    }
    let t = t.max(0.0);
    for pair in GLOW_STOPS.windows(2) {
        let (t0, a0) = pair[0];
        let (t1, a1) = pair[1];
        if t <= t1 {
            return a0 + (a1 - a0) * ((t - t0) / (t1 - t0));
        }
    }
    0.0
}
