//! Synthetic stereo signals for exercising a sink without a decoder.

use std::time::Duration;

use crate::{Frame, FrameSink};

/// Generates interleaved stereo PCM for tests and demos.
///
/// # Example
///
/// ```
/// use speaker_sink::SignalGenerator;
///
/// let mut signal = SignalGenerator::new(16_000);
///
/// // 100ms of silence, then 100ms of a 440Hz tone on both channels
/// signal.silence(100);
/// signal.sine(440.0, 0.5, 100);
///
/// assert_eq!(signal.frame_count(), 3200);
/// let samples = signal.take_samples();
/// assert_eq!(samples.len(), 6400);
/// ```
pub struct SignalGenerator {
    sample_rate: u32,
    samples: Vec<i16>,
}

impl SignalGenerator {
    /// Creates an empty generator for the given rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Vec::new(),
        }
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Appends silence for the given duration in milliseconds.
    pub fn silence(&mut self, duration_ms: u64) -> &mut Self {
        let frames = self.frames_for_duration(duration_ms);
        self.samples.resize(self.samples.len() + frames * 2, 0);
        self
    }

    /// Appends a sine wave on both channels.
    ///
    /// `amplitude` is a fraction of full scale and is clamped to [0.0, 1.0].
    pub fn sine(&mut self, frequency: f64, amplitude: f64, duration_ms: u64) -> &mut Self {
        let frames = self.frames_for_duration(duration_ms);
        let sample_rate = f64::from(self.sample_rate);
        let peak = amplitude.clamp(0.0, 1.0) * f64::from(i16::MAX);

        for i in 0..frames {
            let t = i as f64 / sample_rate;
            let sample = ((2.0 * std::f64::consts::PI * frequency * t).sin() * peak) as i16;
            self.samples.extend_from_slice(&[sample, sample]);
        }
        self
    }

    /// Appends `frames` copies of one stereo frame.
    pub fn constant(&mut self, left: i16, right: i16, frames: usize) -> &mut Self {
        for _ in 0..frames {
            self.samples.extend_from_slice(&[left, right]);
        }
        self
    }

    /// Returns the accumulated interleaved samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Takes all accumulated samples, clearing the generator.
    pub fn take_samples(&mut self) -> Vec<i16> {
        std::mem::take(&mut self.samples)
    }

    /// Number of stereo frames accumulated.
    pub fn frame_count(&self) -> usize {
        self.samples.len() / 2
    }

    /// Iterates over the accumulated frames.
    pub fn frames(&self) -> impl Iterator<Item = Frame> + '_ {
        Frame::from_interleaved(&self.samples)
    }

    /// Returns the duration of the accumulated signal.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / f64::from(self.sample_rate))
    }

    /// Plays the accumulated signal into `sink` as one stream.
    ///
    /// Calls `set_sample_rate`, `begin`, every frame, then `stop`. The
    /// generator keeps its samples.
    pub fn play_into<S: FrameSink + ?Sized>(&self, sink: &mut S) {
        sink.set_sample_rate(self.sample_rate);
        sink.begin();
        sink.consume_interleaved(&self.samples);
        sink.stop();
    }

    fn frames_for_duration(&self, duration_ms: u64) -> usize {
        (u64::from(self.sample_rate) * duration_ms / 1000) as usize
    }
}
