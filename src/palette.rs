//! Star color palette for Starfall
//! Default hex palette plus the `upgrade` regeneration scheme

use egui::Color32;
use rand::Rng;

/// Colors the field starts with before any `upgrade`.
const DEFAULT_COLORS: [Color32; 4] = [
    Color32::from_rgb(0x8a, 0x2b, 0xe2), // blue violet
    Color32::from_rgb(0x00, 0xff, 0xff), // cyan
    Color32::from_rgb(0xff, 0xd7, 0x00), // gold
    Color32::from_rgb(0xff, 0x14, 0x93), // deep pink
];

/// An HSL color, hue in degrees, saturation/lightness in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub fn to_color32(self) -> Color32 {
        let s = self.s / 100.0;
        let l = self.l / 100.0;
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let hp = self.h.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
        let (r1, g1, b1) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        Color32::from_rgb(
            ((r1 + m) * 255.0).round() as u8,
            ((g1 + m) * 255.0).round() as u8,
            ((b1 + m) * 255.0).round() as u8,
        )
    }
}

/// Three contrasting hues off one base: the base itself, a near neighbor,
/// and a complement-ish hue 200 degrees away. Saturation and lightness are
/// fixed per slot.
pub fn contrasting_trio(base: f32) -> [Hsl; 3] {
    [
        Hsl { h: base.rem_euclid(360.0), s: 80.0, l: 60.0 },
        Hsl { h: (base + 40.0).rem_euclid(360.0), s: 80.0, l: 55.0 },
        Hsl { h: (base + 200.0).rem_euclid(360.0), s: 75.0, l: 50.0 },
    ]
}

/// The current star palette. Always holds at least one color.
#[derive(Clone, Debug)]
pub struct Palette {
    colors: Vec<Color32>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.to_vec(),
        }
    }
}

impl Palette {
    /// Pick a uniformly random palette color.
    pub fn random_color(&self, rng: &mut impl Rng) -> Color32 {
        self.colors[rng.gen_range(0..self.colors.len())]
    }

    /// Replace the palette with a fresh contrasting trio at a random base
    /// hue. This is what the `upgrade` command does.
    pub fn regenerate(&mut self, rng: &mut impl Rng) {
        let base = rng.gen_range(0.0..360.0);
        self.colors = contrasting_trio(base)
            .iter()
            .map(|hsl| hsl.to_color32())
            .collect();
    }

    /// Read-only view, mainly for inspection in tests.
    #[allow(dead_code)]
    pub fn colors(&self) -> &[Color32] {
        &self.colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn default_palette_matches_original_colors() {
        let palette = Palette::default();
        assert_eq!(palette.colors().len(), 4);
        assert_eq!(palette.colors()[0], Color32::from_rgb(138, 43, 226));
        assert_eq!(palette.colors()[1], Color32::from_rgb(0, 255, 255));
        assert_eq!(palette.colors()[2], Color32::from_rgb(255, 215, 0));
        assert_eq!(palette.colors()[3], Color32::from_rgb(255, 20, 147));
    }

    #[test]
    fn trio_structure_is_fixed() {
        let trio = contrasting_trio(350.0);
        assert_eq!(trio[0], Hsl { h: 350.0, s: 80.0, l: 60.0 });
        assert_eq!(trio[1], Hsl { h: 30.0, s: 80.0, l: 55.0 });
        assert_eq!(trio[2], Hsl { h: 190.0, s: 75.0, l: 50.0 });
        for hsl in trio {
            assert!((0.0..360.0).contains(&hsl.h));
        }
    }

    #[test]
    fn hsl_primaries_convert_exactly() {
        assert_eq!(
            Hsl { h: 0.0, s: 100.0, l: 50.0 }.to_color32(),
            Color32::from_rgb(255, 0, 0)
        );
        assert_eq!(
            Hsl { h: 120.0, s: 100.0, l: 50.0 }.to_color32(),
            Color32::from_rgb(0, 255, 0)
        );
        assert_eq!(
            Hsl { h: 240.0, s: 100.0, l: 50.0 }.to_color32(),
            Color32::from_rgb(0, 0, 255)
        );
        assert_eq!(
            Hsl { h: 180.0, s: 0.0, l: 100.0 }.to_color32(),
            Color32::from_rgb(255, 255, 255)
        );
    }

    #[test]
    fn regenerate_replaces_with_three_colors() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut palette = Palette::default();
        palette.regenerate(&mut rng);
        assert_eq!(palette.colors().len(), 3);

        // Regenerating again with a different rng state gives a different trio.
        let before = palette.colors().to_vec();
        palette.regenerate(&mut rng);
        assert_eq!(palette.colors().len(), 3);
        assert_ne!(before, palette.colors());
    }

    #[test]
    fn random_color_is_a_member() {
        let mut rng = StdRng::seed_from_u64(11);
        let palette = Palette::default();
        for _ in 0..32 {
            let c = palette.random_color(&mut rng);
            assert!(palette.colors().contains(&c));
        }
    }
}
