//! Buffered stereo-to-mono sink with click suppression.

use super::ring::BufferRing;
use super::FrameSink;
use crate::device::{Block, PlaybackDevice};
use crate::format::{downmix, fade_in, fade_out_step};
use crate::{EventCallback, MonoSinkBuilder, OutputChannel, SinkConfig, SinkError, SinkEvent};

/// Counters kept by a [`MonoSink`] since it was built.
///
/// `begin()` does not reset these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Frames accepted by `consume`.
    pub frames_consumed: u64,
    /// Blocks the device accepted.
    pub blocks_submitted: u64,
    /// Blocks given up on after device errors.
    pub blocks_dropped: u64,
    /// Individual failed submission attempts, retries included.
    pub device_errors: u64,
}

/// Downmixes stereo frames into fixed-size mono blocks for a playback device.
///
/// Frames accumulate in the active buffer of a three-buffer ring. When it
/// fills, the buffer is submitted and the next one becomes active, so a
/// device that is still reading the previous block is never written over.
///
/// Clicks are suppressed at both ends of a stream:
/// - the first `fade_len` samples after [`begin()`](FrameSink::begin) ramp
///   up from silence
/// - [`stop()`](FrameSink::stop) appends a ramp from the last sample down to
///   zero plus a short stretch of silence before the final submission
///
/// Dropping the sink calls `stop()`.
///
/// # Example
///
/// ```
/// use speaker_sink::{FrameSink, MemoryDevice, MonoSink, OutputChannel};
///
/// let device = MemoryDevice::new();
/// let mut sink = MonoSink::builder(device.clone())
///     .sample_rate(22_050)
///     .channel(OutputChannel(1))
///     .buffer_capacity(256)
///     .build()?;
///
/// sink.begin();
/// for _ in 0..256 {
///     sink.consume(1200, 800);
/// }
/// assert_eq!(device.block_count(), 1);
///
/// let block = &device.blocks()[0];
/// assert_eq!(block.sample_rate, 22_050);
/// assert_eq!(block.samples[0], 0); // start of the fade-in
/// assert_eq!(block.samples[255], 1000);
/// # Ok::<(), speaker_sink::SinkError>(())
/// ```
pub struct MonoSink<D: PlaybackDevice> {
    device: D,
    channel: OutputChannel,
    sample_rate: u32,
    fade_len: usize,
    submit_retries: u32,
    ring: BufferRing,
    /// Samples produced since the last `begin()`; gates the fade-in.
    position: u64,
    /// Set by `consume`, cleared by `begin` and `stop`.
    tail_pending: bool,
    stats: SinkStats,
    event_callback: Option<EventCallback>,
}

impl<D: PlaybackDevice> MonoSink<D> {
    /// Returns a builder bound to `device`.
    pub fn builder(device: D) -> MonoSinkBuilder<D> {
        MonoSinkBuilder::new(device)
    }

    /// Builds a sink from a complete configuration.
    ///
    /// # Errors
    ///
    /// Same as [`MonoSinkBuilder::build()`].
    pub fn new(device: D, config: SinkConfig) -> Result<Self, SinkError> {
        MonoSinkBuilder::new(device).with_config(config).build()
    }

    pub(crate) fn from_parts(
        device: D,
        config: &SinkConfig,
        event_callback: Option<EventCallback>,
    ) -> Self {
        tracing::debug!(
            "MonoSink on {}: {}Hz, {}, {} x {} samples, fade {}",
            device.name(),
            config.sample_rate,
            config.channel,
            super::RING_SLOTS,
            config.buffer_capacity,
            config.fade_len
        );

        Self {
            device,
            channel: config.channel,
            sample_rate: config.sample_rate,
            fade_len: config.fade_len,
            submit_retries: config.submit_retries,
            ring: BufferRing::new(config.buffer_capacity),
            position: 0,
            tail_pending: false,
            stats: SinkStats::default(),
            event_callback,
        }
    }

    /// The bound device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Output blocks are submitted for.
    pub fn channel(&self) -> OutputChannel {
        self.channel
    }

    /// Rate blocks are submitted at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per block.
    pub fn buffer_capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Length of the start and stop ramps.
    pub fn fade_len(&self) -> usize {
        self.fade_len
    }

    /// Samples waiting in the active buffer.
    pub fn buffered(&self) -> usize {
        self.ring.len()
    }

    /// Index (0..3) of the buffer currently being filled.
    pub fn active_buffer(&self) -> usize {
        self.ring.active()
    }

    /// Samples produced since the last `begin()`.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Counters since the sink was built.
    pub fn stats(&self) -> SinkStats {
        self.stats
    }

    fn emit_event(&self, event: SinkEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }

    /// Hands the filled part of the active buffer to the device.
    ///
    /// Busy devices get `submit_retries` immediate retries; after that, or
    /// on any other error, the block is dropped and reported.
    fn submit_active(&mut self) {
        let block = Block::mono(self.ring.filled(), self.sample_rate, self.channel);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.device.submit(&block) {
                Ok(()) => {
                    self.stats.blocks_submitted += 1;
                    tracing::trace!(
                        "MonoSink: submitted {} samples from buffer {} to {}",
                        block.len(),
                        self.ring.active(),
                        self.device.name()
                    );
                    return;
                }
                Err(e) => {
                    self.stats.device_errors += 1;
                    tracing::warn!(
                        "MonoSink: {} rejected block (attempt {}): {}",
                        self.device.name(),
                        attempt,
                        e
                    );
                    if let Some(ref callback) = self.event_callback {
                        callback(SinkEvent::DeviceError {
                            device: self.device.name().to_string(),
                            attempt,
                            error: e.to_string(),
                        });
                    }

                    if e.is_retryable() && attempt <= self.submit_retries {
                        continue;
                    }

                    self.stats.blocks_dropped += 1;
                    if let Some(ref callback) = self.event_callback {
                        callback(SinkEvent::BlockDropped {
                            device: self.device.name().to_string(),
                            samples: block.len(),
                            reason: e.to_string(),
                        });
                    }
                    return;
                }
            }
        }
    }
}

impl<D: PlaybackDevice> FrameSink for MonoSink<D> {
    fn begin(&mut self) {
        self.ring.reset();
        self.position = 0;
        self.tail_pending = false;
        tracing::debug!("MonoSink on {}: stream begin", self.device.name());
    }

    fn set_sample_rate(&mut self, hz: u32) {
        if hz != self.sample_rate && !self.ring.is_empty() {
            tracing::warn!(
                "MonoSink: sample rate changed {} -> {} with {} samples buffered",
                self.sample_rate,
                hz,
                self.ring.len()
            );
            self.emit_event(SinkEvent::SampleRateChanged {
                previous: self.sample_rate,
                current: hz,
                buffered: self.ring.len(),
            });
        }
        self.sample_rate = hz;
    }

    fn consume(&mut self, left: i16, right: i16) {
        let sample = fade_in(downmix(left, right), self.position, self.fade_len);
        self.position = self.position.saturating_add(1);
        self.stats.frames_consumed = self.stats.frames_consumed.saturating_add(1);
        self.tail_pending = true;

        if self.ring.push(sample) {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.ring.is_empty() {
            return;
        }
        self.submit_active();
        self.ring.rotate();
    }

    fn stop(&mut self) {
        if !self.tail_pending {
            return;
        }
        self.tail_pending = false;

        let last = self.ring.last().unwrap_or(0);
        let tail_len = self.fade_len.saturating_mul(2);
        let mut appended = 0;

        while appended < tail_len && !self.ring.is_full() {
            // fade_out_step is zero past the ramp, which pads the silence floor
            self.ring.push(fade_out_step(last, appended, self.fade_len));
            appended += 1;
        }

        if !self.ring.is_empty() {
            self.submit_active();
            self.ring.rewind();
        }

        tracing::debug!(
            "MonoSink on {}: stream stopped after {} samples",
            self.device.name(),
            self.position
        );
        self.emit_event(SinkEvent::StreamFinished {
            channel: self.channel,
            frames: self.position,
        });
    }
}

impl<D: PlaybackDevice> Drop for MonoSink<D> {
    fn drop(&mut self) {
        self.stop();
    }
}
