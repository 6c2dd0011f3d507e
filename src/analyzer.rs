//! Spectrum analyzer for Starfall
//! Windowed FFT of the most recent samples, folded into an analyser-style
//! byte frequency snapshot (0-255 per bin)

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Analysis window length in samples. Must be a power of two.
pub const FFT_SIZE: usize = 512;
/// Snapshot length: one byte per bin below Nyquist.
pub const SPECTRUM_BINS: usize = FFT_SIZE / 2;

/// Exponential magnitude smoothing across successive snapshots.
const SMOOTHING: f32 = 0.8;
/// Decibel range mapped onto the 0-255 byte scale.
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// Turns a window of mono samples into a 256-byte frequency snapshot.
///
/// Magnitudes are Hann-windowed, normalized by the window length,
/// exponentially smoothed over time, then mapped from dB onto bytes.
/// Carries only the smoothing state between calls.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    snapshot: Vec<u8>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(FFT_SIZE),
            window: (0..FFT_SIZE).map(|i| hann_window(i, FFT_SIZE)).collect(),
            buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            smoothed: vec![0.0; SPECTRUM_BINS],
            snapshot: vec![0; SPECTRUM_BINS],
        }
    }

    /// Analyze one window of samples and return the fresh snapshot.
    ///
    /// `samples` shorter than the window are zero-padded at the front, so a
    /// source that has not produced a full window yet still analyzes cleanly.
    pub fn feed(&mut self, samples: &[f32]) -> &[u8] {
        let take = samples.len().min(FFT_SIZE);
        let pad = FFT_SIZE - take;
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad {
                0.0
            } else {
                samples[samples.len() - take + (i - pad)]
            };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        for (i, slot) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.buffer[i].norm() / FFT_SIZE as f32;
            *slot = SMOOTHING * *slot + (1.0 - SMOOTHING) * magnitude;
        }

        for (byte, &mag) in self.snapshot.iter_mut().zip(&self.smoothed) {
            *byte = if mag > 0.0 {
                let db = 20.0 * mag.log10();
                let scaled = 255.0 * (db - MIN_DB) / (MAX_DB - MIN_DB);
                scaled.clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }
        &self.snapshot
    }

    /// Forget the smoothing state, e.g. when the audio source changes.
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|v| *v = 0.0);
        self.snapshot.iter_mut().for_each(|v| *v = 0);
    }

    #[allow(dead_code)]
    pub fn snapshot(&self) -> &[u8] {
        &self.snapshot
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / size as f32).cos())
}
