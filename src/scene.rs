//! Scene state for Starfall
//! Owns the palette, the star field and the surface dimensions; reacts to
//! resize and command events and drives one visual tick

use rand::Rng;

use crate::bands::BandLevels;
use crate::frame::FrameBuffer;
use crate::palette::Palette;
use crate::stars::StarField;

/// Full-surface black overlay alpha painted each tick; what makes trails.
const TRAIL_FADE: f32 = 0.22;

/// Discrete events pushed in by the surrounding shell. The scene does not
/// care how they were captured.
#[derive(Clone, Debug)]
pub enum SceneEvent {
    Resized(f32, f32),
    Command(String),
}

pub struct Scene {
    palette: Palette,
    field: StarField,
    star_count: usize,
}

impl Scene {
    pub fn new(width: f32, height: f32, star_count: usize, rng: &mut impl Rng) -> Self {
        let palette = Palette::default();
        let mut field = StarField::new(width, height);
        field.regenerate(star_count, &palette, rng);
        Self {
            palette,
            field,
            star_count,
        }
    }

    pub fn handle_event(&mut self, event: SceneEvent, rng: &mut impl Rng) {
        match event {
            SceneEvent::Resized(width, height) => {
                self.field
                    .resize(width, height, self.star_count, &self.palette, rng);
            }
            SceneEvent::Command(text) => {
                if text.trim().eq_ignore_ascii_case("upgrade") {
                    self.palette.regenerate(&mut *rng);
                    self.field
                        .regenerate(self.star_count, &self.palette, rng);
                }
                // anything else is silently ignored
            }
        }
    }

    /// One tick: fade last frame into a trail, advance the field, draw it.
    pub fn advance(
        &mut self,
        frame: &mut FrameBuffer,
        bands: &BandLevels,
        elapsed_ms: f64,
        rng: &mut impl Rng,
    ) {
        frame.fade(TRAIL_FADE);
        self.field.update(bands, &self.palette, rng);
        self.field.render(frame, bands, elapsed_ms);
    }

    #[allow(dead_code)]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[allow(dead_code)]
    pub fn field(&self) -> &StarField {
        &self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scene(seed: u64) -> (Scene, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let scene = Scene::new(640.0, 480.0, 120, &mut rng);
        (scene, rng)
    }

    #[test]
    fn upgrade_swaps_palette_and_recreates_field() {
        let (mut scene, mut rng) = scene(1);
        let old_colors = scene.palette().colors().to_vec();
        scene.handle_event(SceneEvent::Command("upgrade".into()), &mut rng);

        assert_eq!(scene.palette().colors().len(), 3);
        assert_ne!(scene.palette().colors(), old_colors.as_slice());
        assert_eq!(scene.field().stars().len(), 120);
        for star in scene.field().stars() {
            assert!(scene.palette().colors().contains(&star.color));
        }
    }

    #[test]
    fn upgrade_is_trimmed_and_case_insensitive() {
        let (mut scene, mut rng) = scene(2);
        scene.handle_event(SceneEvent::Command("  UpGrAdE \n".into()), &mut rng);
        assert_eq!(scene.palette().colors().len(), 3);
    }

    #[test]
    fn unknown_commands_are_ignored() {
        let (mut scene, mut rng) = scene(3);
        let colors = scene.palette().colors().to_vec();
        for cmd in ["downgrade", "", "upgrade now", "star"] {
            scene.handle_event(SceneEvent::Command(cmd.into()), &mut rng);
        }
        assert_eq!(scene.palette().colors(), colors.as_slice());
        assert_eq!(scene.palette().colors().len(), 4);
    }

    #[test]
    fn resize_recreates_field_with_same_count() {
        let (mut scene, mut rng) = scene(4);
        scene.handle_event(SceneEvent::Resized(1024.0, 768.0), &mut rng);
        assert_eq!(scene.field().stars().len(), 120);
        assert_eq!(scene.field().width(), 1024.0);
        for star in scene.field().stars() {
            assert!(star.x < 1024.0);
            assert!(star.y < 768.0);
        }
    }

    #[test]
    fn advance_runs_a_full_tick() {
        let (mut scene, mut rng) = scene(5);
        let mut frame = FrameBuffer::new(640, 480);
        let bands = BandLevels { bass: 1.0, mids: 0.5, highs: 0.5 };
        scene.advance(&mut frame, &bands, 33.0, &mut rng);
        for star in scene.field().stars() {
            assert!(star.speed > star.base_speed);
            assert!(star.y >= -10.0 && star.y <= 480.0 + 10.0);
        }
    }
}
