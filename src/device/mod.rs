//! Playback device trait and backends.
//!
//! A [`PlaybackDevice`] accepts one finished [`Block`] at a time from a
//! [`MonoSink`](crate::MonoSink). The crate provides:
//!
//! - [`MemoryDevice`]: Records every block (tests, inspection)
//! - [`WavDevice`]: Appends blocks to a WAV file
//! - [`QueuedDevice`]: Hands blocks to an async worker task
//! - `CpalDevice`: Plays blocks on the default output (`cpal` feature)
//!
//! Implement [`PlaybackDevice`] for other hardware, e.g. an I2S driver.

#[cfg(feature = "cpal")]
mod cpal;
mod file;
mod memory;
mod queued;

#[cfg(feature = "cpal")]
pub use self::cpal::CpalDevice;
pub use file::WavDevice;
pub use memory::{MemoryDevice, RecordedBlock};
pub use queued::{AsyncPlaybackDevice, QueueStats, QueuedDevice};

use std::time::Duration;

use crate::{DeviceError, OutputChannel};

/// One buffer region handed to a device, plus how to play it.
///
/// Blocks borrow the sink's buffer; a device that needs the samples after
/// `submit` returns must copy them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    /// Mono PCM samples.
    pub samples: &'a [i16],
    /// Playback rate in Hz.
    pub sample_rate: u32,
    /// Output the block is meant for.
    pub channel: OutputChannel,
    /// Whether `samples` is interleaved stereo. Always `false` from `MonoSink`.
    pub stereo: bool,
    /// Times the block is played back to back. Always 1 from `MonoSink`.
    pub repeat: u32,
    /// Whether the block should cut off whatever the channel is playing
    /// instead of queueing behind it. Always `false` from `MonoSink`.
    pub stop_current: bool,
}

impl<'a> Block<'a> {
    /// Creates a mono block that plays once, queued behind earlier blocks.
    pub fn mono(samples: &'a [i16], sample_rate: u32, channel: OutputChannel) -> Self {
        Self {
            samples,
            sample_rate,
            channel,
            stereo: false,
            repeat: 1,
            stop_current: false,
        }
    }

    /// Number of samples in the block.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if the block holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration of a single repetition.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = if self.stereo {
            self.samples.len() / 2
        } else {
            self.samples.len()
        };
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }
}

/// A destination for finished blocks.
///
/// # Implementation Notes
///
/// - `submit` is called on the producer's thread; it should hand the block
///   to the hardware (or a queue) and return without waiting for playback
/// - Return [`DeviceError::Busy`] when the block may be accepted on an
///   immediate retry; anything else makes the sink drop the block
/// - `is_available` is checked once when a sink is built
///
/// # Example
///
/// ```
/// use speaker_sink::{Block, DeviceError, PlaybackDevice};
///
/// struct CountingDevice {
///     samples: usize,
/// }
///
/// impl PlaybackDevice for CountingDevice {
///     fn name(&self) -> &str {
///         "counter"
///     }
///
///     fn submit(&mut self, block: &Block<'_>) -> Result<(), DeviceError> {
///         self.samples += block.len();
///         Ok(())
///     }
/// }
/// ```
pub trait PlaybackDevice {
    /// Human-readable name for logging and events.
    fn name(&self) -> &str;

    /// Whether the device handle is usable.
    ///
    /// Default implementation returns `true`.
    fn is_available(&self) -> bool {
        true
    }

    /// Accepts one block for playback.
    fn submit(&mut self, block: &Block<'_>) -> Result<(), DeviceError>;
}

impl<D: PlaybackDevice + ?Sized> PlaybackDevice for &mut D {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn submit(&mut self, block: &Block<'_>) -> Result<(), DeviceError> {
        (**self).submit(block)
    }
}

impl<D: PlaybackDevice + ?Sized> PlaybackDevice for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn submit(&mut self, block: &Block<'_>) -> Result<(), DeviceError> {
        (**self).submit(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingDevice {
        blocks: usize,
    }

    impl PlaybackDevice for CountingDevice {
        fn name(&self) -> &str {
            "counting"
        }

        fn submit(&mut self, _block: &Block<'_>) -> Result<(), DeviceError> {
            self.blocks += 1;
            Ok(())
        }
    }

    #[test]
    fn test_block_mono_defaults() {
        let samples = [1i16, 2, 3];
        let block = Block::mono(&samples, 44_100, OutputChannel(1));
        assert!(!block.stereo);
        assert_eq!(block.repeat, 1);
        assert!(!block.stop_current);
        assert_eq!(block.len(), 3);
        assert!(!block.is_empty());
    }

    #[test]
    fn test_block_duration() {
        let samples = vec![0i16; 1600];
        let block = Block::mono(&samples, 16_000, OutputChannel(0));
        assert_eq!(block.duration(), Duration::from_millis(100));

        let block = Block::mono(&samples, 0, OutputChannel(0));
        assert_eq!(block.duration(), Duration::ZERO);
    }

    fn submit_one<D: PlaybackDevice>(mut device: D) -> String {
        let samples = [0i16; 4];
        device
            .submit(&Block::mono(&samples, 8000, OutputChannel(0)))
            .unwrap();
        device.name().to_string()
    }

    #[test]
    fn test_borrowed_device_forwards() {
        let mut device = CountingDevice { blocks: 0 };
        assert_eq!(submit_one(&mut device), "counting");
        assert_eq!(submit_one(&mut device), "counting");
        assert_eq!(device.blocks, 2);
    }

    #[test]
    fn test_boxed_device_forwards() {
        let mut device: Box<dyn PlaybackDevice> = Box::new(CountingDevice { blocks: 0 });
        let samples = [0i16; 4];
        device
            .submit(&Block::mono(&samples, 8000, OutputChannel(0)))
            .unwrap();
        assert_eq!(device.name(), "counting");
    }
}
