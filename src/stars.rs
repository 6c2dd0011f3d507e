//! Star field for Starfall
//! Falling-star particles driven by banded audio energy

use egui::Color32;
use rand::Rng;

use crate::bands::BandLevels;
use crate::frame::FrameBuffer;
use crate::palette::Palette;

/// Vertical margin beyond which a star wraps back to the top.
const WRAP_MARGIN: f32 = 10.0;
/// Pixels of travel per tick per unit of speed.
const FALL_SCALE: f32 = 6.0;

/// One star. `size`, `base_speed` and `phase` are fixed at creation;
/// `speed` and `color` are recomputed as the star falls and wraps.
#[derive(Clone, Debug)]
pub struct Star {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub base_speed: f32,
    pub speed: f32,
    pub color: Color32,
    /// Fixed random scalar in [0, 1) decorrelating the twinkle across stars.
    pub phase: f32,
}

impl Star {
    fn spawn(width: f32, height: f32, palette: &Palette, rng: &mut impl Rng) -> Self {
        Self {
            x: rng.gen_range(0.0..width),
            y: rng.gen_range(0.0..height),
            size: 0.6 + rng.gen::<f32>() * 2.4,
            base_speed: 0.2 + rng.gen::<f32>() * 0.6,
            speed: 0.0,
            color: palette.random_color(&mut *rng),
            phase: rng.gen::<f32>(),
        }
    }
}

/// The ordered collection of stars. Recreated wholesale on load, resize and
/// palette upgrade; mutated in place between recreations.
pub struct StarField {
    stars: Vec<Star>,
    width: f32,
    height: f32,
}

impl StarField {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            stars: Vec::new(),
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Throw away every star and spawn `count` fresh ones.
    pub fn regenerate(&mut self, count: usize, palette: &Palette, rng: &mut impl Rng) {
        self.stars = (0..count)
            .map(|_| Star::spawn(self.width, self.height, palette, &mut *rng))
            .collect();
    }

    /// Adopt new surface dimensions and regenerate.
    pub fn resize(
        &mut self,
        width: f32,
        height: f32,
        count: usize,
        palette: &Palette,
        rng: &mut impl Rng,
    ) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
        self.regenerate(count, palette, rng);
    }

    /// One tick of motion. Bass raises fall speed, scaled per star by its
    /// phase; a star past the bottom margin wraps to the top with a new
    /// horizontal position and a new palette color. There is no horizontal
    /// drift outside the wrap.
    pub fn update(&mut self, bands: &BandLevels, palette: &Palette, rng: &mut impl Rng) {
        for star in &mut self.stars {
            star.speed = star.base_speed + bands.bass * (1.6 + star.phase);
            star.y += star.speed * FALL_SCALE;
            if star.y > self.height + WRAP_MARGIN {
                star.y = -WRAP_MARGIN;
                star.x = rng.gen_range(0.0..self.width);
                star.color = palette.random_color(&mut *rng);
            }
        }
    }

    /// Draw every star in stored order: a wide radial glow in the star's own
    /// color, then a small white core. Mids swell the size, highs brighten
    /// the glow; both carry a slow per-star sine shimmer.
    ///
    /// The alpha expression can exceed 1 when highs peak; the frame buffer
    /// saturates it at the draw boundary.
    pub fn render(&self, frame: &mut FrameBuffer, bands: &BandLevels, elapsed_ms: f64) {
        let t = elapsed_ms as f32;
        for star in &self.stars {
            let size = star.size
                * (1.0 + bands.mids * 0.8 + (t * 0.005 + star.phase * 10.0).sin() * 0.06);
            let alpha = 0.4 + bands.highs * 0.6 + (t * 0.01 + star.phase * 4.0).sin() * 0.15;

            frame.glow(star.x, star.y, size * 6.0, star.color, alpha);
            frame.circle(
                star.x,
                star.y,
                (size * 0.4).max(0.6),
                Color32::WHITE,
                0.8 * (0.4 + bands.highs),
            );
        }
    }

    /// Read-only view, mainly for inspection in tests.
    #[allow(dead_code)]
    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    #[allow(dead_code)]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[allow(dead_code)]
    pub fn height(&self) -> f32 {
        self.height
    }
}
