//! Frequency band extraction for Starfall
//! Collapses a spectrum snapshot into three shaped energy scalars

/// Fraction of the spectrum covered by the bass band.
const BASS_SPLIT: f32 = 0.12;
/// Fraction of the spectrum where the mids band ends and highs begin.
const MIDS_SPLIT: f32 = 0.55;

/// Per-frame band energy, already normalized and perceptually shaped.
///
/// All three values lie in `[0, 2]`. Zeros mean silence (or no audio
/// source attached); the field then drifts at base speed without pulsing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BandLevels {
    pub bass: f32,
    pub mids: f32,
    pub highs: f32,
}

impl BandLevels {
    /// Extract band levels from a byte frequency snapshot.
    ///
    /// The snapshot is an ordered run of 0-255 magnitudes at increasing
    /// frequency. Bands are index ranges at fixed fractions of the bin
    /// count: bass `[0, 0.12n)`, mids `[0.12n, 0.55n)`, highs `[0.55n, n)`.
    /// Each band is averaged, normalized by 255, then shaped with a
    /// sub-unity power curve and gain so quiet signals still read visually.
    /// An empty snapshot yields all zeros.
    pub fn from_snapshot(snapshot: &[u8]) -> Self {
        let n = snapshot.len();
        let bass_end = (n as f32 * BASS_SPLIT) as usize;
        let mids_end = (n as f32 * MIDS_SPLIT) as usize;

        let bass = band_mean(&snapshot[..bass_end]);
        let mids = band_mean(&snapshot[bass_end..mids_end]);
        let highs = band_mean(&snapshot[mids_end..]);

        Self {
            bass: shape(bass, 0.9, 1.3),
            mids: shape(mids, 0.95, 1.1),
            highs: shape(highs, 0.9, 1.2),
        }
    }
}

/// Mean magnitude of one band, normalized to `[0, 1]`.
fn band_mean(band: &[u8]) -> f32 {
    let sum: u32 = band.iter().map(|&v| v as u32).sum();
    (sum as f32 / band.len().max(1) as f32) / 255.0
}

/// Loudness compression: boost low energy, bound the response at 2.
fn shape(value: f32, exponent: f32, gain: f32) -> f32 {
    (value.powf(exponent) * gain).min(2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_snapshot_is_silent() {
        let levels = BandLevels::from_snapshot(&[]);
        assert_eq!(levels, BandLevels::default());
    }

    #[test]
    fn zero_snapshot_is_silent() {
        let levels = BandLevels::from_snapshot(&[0u8; 256]);
        assert_eq!(levels, BandLevels::default());
    }

    #[test]
    fn full_scale_snapshot_hits_shaped_gains() {
        // 256 bins all at 255: every band mean normalizes to exactly 1.0,
        // so the shaped levels are just the gains.
        let levels = BandLevels::from_snapshot(&[255u8; 256]);
        assert!((levels.bass - 1.3).abs() < 1e-6);
        assert!((levels.mids - 1.1).abs() < 1e-6);
        assert!((levels.highs - 1.2).abs() < 1e-6);
    }

    #[test]
    fn band_boundaries_truncate() {
        // 256 bins: bass ends at floor(30.72) = 30, mids at floor(140.8) = 140.
        let mut snapshot = [0u8; 256];
        for v in snapshot[..30].iter_mut() {
            *v = 255;
        }
        let levels = BandLevels::from_snapshot(&snapshot);
        assert!((levels.bass - 1.3).abs() < 1e-6);
        assert_eq!(levels.mids, 0.0);
        assert_eq!(levels.highs, 0.0);

        let mut snapshot = [0u8; 256];
        for v in snapshot[140..].iter_mut() {
            *v = 255;
        }
        let levels = BandLevels::from_snapshot(&snapshot);
        assert_eq!(levels.bass, 0.0);
        assert_eq!(levels.mids, 0.0);
        assert!((levels.highs - 1.2).abs() < 1e-6);
    }

    #[test]
    fn tiny_snapshots_do_not_divide_by_zero() {
        // n = 1..4 leaves the bass band empty (floor(n * 0.12) = 0).
        for n in 1..5 {
            let snapshot = vec![200u8; n];
            let levels = BandLevels::from_snapshot(&snapshot);
            assert_eq!(levels.bass, 0.0);
            assert!(levels.highs > 0.0);
        }
    }

    proptest! {
        #[test]
        fn shaped_levels_stay_in_range(snapshot in proptest::collection::vec(any::<u8>(), 0..1024)) {
            let levels = BandLevels::from_snapshot(&snapshot);
            prop_assert!((0.0..=2.0).contains(&levels.bass));
            prop_assert!((0.0..=2.0).contains(&levels.mids));
            prop_assert!((0.0..=2.0).contains(&levels.highs));
        }
    }
}
