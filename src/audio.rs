//! Audio sources for Starfall
//! File playback (symphonia-decoded analysis samples, rodio looped output)
//! or live microphone capture; either one feeds the spectrum analyzer

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver};
use rodio::{Decoder, OutputStream, Sink, Source};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use crate::analyzer::{SpectrumAnalyzer, FFT_SIZE};

/// Microphone ring capacity; a few windows of slack between ticks.
const MIC_RING_CAP: usize = FFT_SIZE * 4;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode audio: {0}")]
    Decode(#[from] symphonia::core::errors::Error),
    #[error("audio file has no decodable samples")]
    EmptyTrack,
    #[error("no audio output device: {0}")]
    Output(#[from] rodio::StreamError),
    #[error("playback failed: {0}")]
    Playback(#[from] rodio::PlayError),
    #[error("playback decoder rejected the file: {0}")]
    PlaybackFormat(#[from] rodio::decoder::DecoderError),
    #[error("no microphone available")]
    NoInputDevice,
    #[error("cannot query microphone config: {0}")]
    InputConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("unsupported microphone sample format {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),
    #[error("cannot open microphone stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("cannot start microphone stream: {0}")]
    StartStream(#[from] cpal::PlayStreamError),
}

/// Looping file playback plus the decoded mono samples for analysis.
///
/// rodio gives no sample-accurate position, so the analysis playhead is
/// wall-clock elapsed time modulo the decoded duration; playback and
/// analysis loop together.
struct FilePlayback {
    samples: Vec<f32>,
    sample_rate: u32,
    started: Instant,
    sink: Sink,
    _output: OutputStream,
}

impl FilePlayback {
    fn current_window(&self) -> Vec<f32> {
        let playhead =
            (self.started.elapsed().as_secs_f64() * self.sample_rate as f64) as usize;
        window_at(&self.samples, playhead)
    }
}

/// Live capture: the cpal callback pushes mono-mixed chunks over a bounded
/// channel, drained into a ring on the UI thread each snapshot.
struct MicCapture {
    rx: Receiver<Vec<f32>>,
    ring: VecDeque<f32>,
    _stream: cpal::Stream,
}

impl MicCapture {
    fn drain(&mut self) {
        while let Ok(chunk) = self.rx.try_recv() {
            self.ring.extend(chunk);
        }
        if self.ring.len() > MIC_RING_CAP {
            let excess = self.ring.len() - MIC_RING_CAP;
            self.ring.drain(..excess);
        }
    }

    fn current_window(&self) -> Vec<f32> {
        let skip = self.ring.len().saturating_sub(FFT_SIZE);
        self.ring.iter().skip(skip).copied().collect()
    }
}

enum ActiveSource {
    File(FilePlayback),
    Microphone(MicCapture),
}

/// Owns whichever audio source is live (never more than one) and the
/// analyzer it feeds. All failures stay inside this module's error type;
/// the visual loop never depends on audio being present.
pub struct AudioSystem {
    source: Option<ActiveSource>,
    analyzer: SpectrumAnalyzer,
}

impl AudioSystem {
    pub fn new() -> Self {
        Self {
            source: None,
            analyzer: SpectrumAnalyzer::new(),
        }
    }

    /// Decode a file for analysis and start looping playback. Any existing
    /// source is torn down first.
    pub fn play_file(&mut self, path: &Path) -> Result<(), AudioError> {
        self.stop();

        let (samples, sample_rate) = decode_samples(path)?;

        let (output, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        let file = File::open(path).map_err(|source| AudioError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let decoder = Decoder::new(BufReader::new(file))?;
        sink.append(decoder.repeat_infinite());
        sink.play();

        log::info!(
            "playing {} ({:.1}s at {} Hz)",
            path.display(),
            samples.len() as f32 / sample_rate as f32,
            sample_rate
        );
        self.source = Some(ActiveSource::File(FilePlayback {
            samples,
            sample_rate,
            started: Instant::now(),
            sink,
            _output: output,
        }));
        Ok(())
    }

    /// Capture from the default microphone. Any existing source is torn
    /// down first.
    pub fn start_mic(&mut self) -> Result<(), AudioError> {
        self.stop();

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioError::NoInputDevice)?;
        let config = device.default_input_config()?;
        let sample_format = config.sample_format();
        if sample_format != cpal::SampleFormat::F32 {
            return Err(AudioError::UnsupportedSampleFormat(sample_format));
        }
        let channels = (config.channels() as usize).max(1);

        let (tx, rx) = bounded::<Vec<f32>>(32);
        let stream = device.build_input_stream(
            &config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono: Vec<f32> = data
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                    .collect();
                // dropped on the floor if the UI is behind
                let _ = tx.try_send(mono);
            },
            |err| log::warn!("microphone stream error: {err}"),
            None,
        )?;
        stream.play()?;

        log::info!("microphone capture started ({channels} channel(s))");
        self.source = Some(ActiveSource::Microphone(MicCapture {
            rx,
            ring: VecDeque::with_capacity(MIC_RING_CAP),
            _stream: stream,
        }));
        Ok(())
    }

    /// Tear down whatever is live: stop the sink or drop the input stream,
    /// and forget the analyzer's smoothing state. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(source) = self.source.take() {
            if let ActiveSource::File(playback) = &source {
                playback.sink.stop();
            }
            drop(source);
            log::info!("audio source stopped");
        }
        self.analyzer.reset();
    }

    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    /// Current 256-byte frequency snapshot, or `None` when no source is
    /// attached.
    pub fn spectrum(&mut self) -> Option<&[u8]> {
        let window = match self.source.as_mut()? {
            ActiveSource::File(playback) => playback.current_window(),
            ActiveSource::Microphone(mic) => {
                mic.drain();
                mic.current_window()
            }
        };
        Some(self.analyzer.feed(&window))
    }
}

impl Default for AudioSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// The `FFT_SIZE` samples ending at `playhead`, wrapping around the start
/// (playback loops). Shorter sample runs are returned whole; the analyzer
/// zero-pads them.
fn window_at(samples: &[f32], playhead: usize) -> Vec<f32> {
    let len = samples.len();
    if len == 0 {
        return Vec::new();
    }
    if len < FFT_SIZE {
        return samples.to_vec();
    }
    let start = (playhead % len + (len - FFT_SIZE % len)) % len;
    (0..FFT_SIZE)
        .map(|i| samples[(start + i) % len])
        .collect()
}

/// Decode a whole file to mono f32 with symphonia. Undecodable packets are
/// skipped; a file yielding nothing at all is an error.
fn decode_samples(path: &Path) -> Result<(Vec<f32>, u32), AudioError> {
    let file = File::open(path).map_err(|source| AudioError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(&ext.to_string_lossy());
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        stream,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format.default_track().ok_or(AudioError::EmptyTrack)?;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(2)
        .max(1);
    let track_id = track.id;

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    while let Ok(packet) = format.next_packet() {
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let mut buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                for frame in buf.samples().chunks(channels) {
                    samples.push(frame.iter().sum::<f32>() / channels as f32);
                }
            }
            Err(err) => log::debug!("skipping undecodable packet: {err}"),
        }
    }

    if samples.is_empty() {
        return Err(AudioError::EmptyTrack);
    }
    Ok((samples, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_source_means_no_spectrum() {
        let mut audio = AudioSystem::new();
        assert!(!audio.is_active());
        assert!(audio.spectrum().is_none());
        audio.stop();
        audio.stop();
        assert!(!audio.is_active());
    }

    #[test]
    fn missing_file_reports_open_error() {
        let mut audio = AudioSystem::new();
        let err = audio
            .play_file(Path::new("/definitely/not/here.mp3"))
            .unwrap_err();
        assert!(matches!(err, AudioError::Open { .. }));
        assert!(!audio.is_active());
    }

    #[test]
    fn window_ends_at_playhead() {
        let samples: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        let window = window_at(&samples, 600);
        assert_eq!(window.len(), FFT_SIZE);
        assert_eq!(window[0], (600 - FFT_SIZE) as f32);
        assert_eq!(window[FFT_SIZE - 1], 599.0);
    }

    #[test]
    fn window_wraps_around_the_loop() {
        let samples: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        let window = window_at(&samples, 100);
        assert_eq!(window[0], (1000 + 100 - FFT_SIZE) as f32);
        assert_eq!(window[FFT_SIZE - 1], 99.0);
        // the wrap point sits FFT_SIZE - 100 elements in
        assert_eq!(window[FFT_SIZE - 100], 0.0);
    }

    #[test]
    fn window_of_exactly_one_fft_is_a_rotation() {
        let samples: Vec<f32> = (0..FFT_SIZE).map(|i| i as f32).collect();
        let window = window_at(&samples, 10);
        assert_eq!(window.len(), FFT_SIZE);
        assert_eq!(window[0], 10.0);
        assert_eq!(window[FFT_SIZE - 1], 9.0);
    }

    #[test]
    fn short_runs_are_returned_whole() {
        let samples = vec![0.25; 100];
        assert_eq!(window_at(&samples, 7).len(), 100);
        assert!(window_at(&[], 0).is_empty());
    }
}
