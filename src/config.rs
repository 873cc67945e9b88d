//! Configuration types for the buffered sink and its queued backend.

use std::fmt;
use std::time::Duration;

/// Sample rate used when none is configured.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Samples per block.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1536;

/// Length of the start and stop ramps in samples (~1.5ms at 44.1kHz).
pub const DEFAULT_FADE_LEN: usize = 64;

/// Opaque selector for the physical output a block is played on.
///
/// The sink never interprets this value; it is handed to the device with
/// every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OutputChannel(pub u8);

impl OutputChannel {
    /// Returns the raw selector value.
    #[must_use]
    pub fn index(self) -> u8 {
        self.0
    }
}

impl From<u8> for OutputChannel {
    fn from(index: u8) -> Self {
        Self(index)
    }
}

impl fmt::Display for OutputChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Configuration for a [`MonoSink`](crate::MonoSink).
///
/// Use [`SinkConfig::default()`] for the reference sizing, or customize as
/// needed. Everything except `sample_rate` is fixed once the sink is built.
///
/// # Example
///
/// ```
/// use speaker_sink::{OutputChannel, SinkConfig};
///
/// let config = SinkConfig {
///     sample_rate: 22_050,
///     channel: OutputChannel(1),
///     ..Default::default()
/// };
/// assert_eq!(config.buffer_capacity, 1536);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// Sample rate handed to the device with each block.
    ///
    /// Default: 44100
    pub sample_rate: u32,

    /// Output the device should play blocks on.
    ///
    /// Default: `OutputChannel(0)`
    pub channel: OutputChannel,

    /// Samples per block (N).
    ///
    /// Default: 1536
    pub buffer_capacity: usize,

    /// Samples over which the start and stop ramps run (F).
    ///
    /// Zero disables both ramps.
    /// Default: 64
    pub fade_len: usize,

    /// Immediate re-submissions after the device reports
    /// [`DeviceError::Busy`](crate::DeviceError::Busy).
    ///
    /// Retries never sleep; after they are used up the block is dropped.
    /// Default: 1
    pub submit_retries: u32,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channel: OutputChannel::default(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            fade_len: DEFAULT_FADE_LEN,
            submit_retries: 1,
        }
    }
}

/// Configuration for a [`QueuedDevice`](crate::device::QueuedDevice).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Number of block buffers in flight between the sink and the worker.
    ///
    /// Values below 3 are raised to 3.
    /// Default: 3
    pub depth: usize,

    /// Preallocated capacity of each block buffer, in samples.
    ///
    /// Should match the sink's `buffer_capacity` so no copy allocates.
    /// Default: 1536
    pub block_capacity: usize,

    /// Upper bound on a single device call made by the worker.
    ///
    /// Default: 500ms
    pub submit_timeout: Duration,
}

impl QueueConfig {
    /// Smallest queue depth that keeps the producer clear of in-flight blocks.
    pub const MIN_DEPTH: usize = 3;

    /// Returns the depth actually used.
    #[must_use]
    pub fn effective_depth(&self) -> usize {
        self.depth.max(Self::MIN_DEPTH)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            depth: Self::MIN_DEPTH,
            block_capacity: DEFAULT_BUFFER_CAPACITY,
            submit_timeout: Duration::from_millis(500),
        }
    }
}
