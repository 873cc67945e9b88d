//! In-memory playback device for testing without hardware.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Block, PlaybackDevice};
use crate::{DeviceError, OutputChannel};

/// A block as it was handed to a [`MemoryDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBlock {
    /// Copy of the submitted samples.
    pub samples: Vec<i16>,
    /// Sample rate the block was submitted with.
    pub sample_rate: u32,
    /// Output the block was submitted for.
    pub channel: OutputChannel,
    /// Whether the block claimed to be stereo.
    pub stereo: bool,
}

#[derive(Default)]
struct MemoryState {
    blocks: Vec<RecordedBlock>,
    attempts: usize,
    scripted_failures: VecDeque<DeviceError>,
    available: bool,
}

/// A playback device that records every accepted block.
///
/// Clones share the same recording, so one handle can be moved into a sink
/// while another is kept for inspection. Failures can be scripted to
/// exercise the sink's retry and drop handling.
///
/// # Example
///
/// ```
/// use speaker_sink::{DeviceError, MemoryDevice, MonoSink, FrameSink};
///
/// let device = MemoryDevice::new();
/// let mut sink = MonoSink::builder(device.clone()).buffer_capacity(4).build()?;
///
/// device.fail_next(DeviceError::Busy);
/// for _ in 0..4 {
///     sink.consume(1000, 1000);
/// }
///
/// // The first attempt failed, the retry went through
/// assert_eq!(device.attempts(), 2);
/// assert_eq!(device.block_count(), 1);
/// # Ok::<(), speaker_sink::SinkError>(())
/// ```
#[derive(Clone)]
pub struct MemoryDevice {
    name: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDevice {
    /// Creates an empty, available device.
    pub fn new() -> Self {
        Self::with_name("memory")
    }

    /// Creates an empty device with a custom name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MemoryState {
                available: true,
                ..MemoryState::default()
            })),
        }
    }

    /// Creates a device that reports itself unavailable.
    ///
    /// Building a sink on it fails with
    /// [`SinkError::DeviceUnavailable`](crate::SinkError::DeviceUnavailable).
    pub fn unavailable() -> Self {
        let device = Self::new();
        device.set_available(false);
        device
    }

    /// Marks the device usable or unusable.
    pub fn set_available(&self, available: bool) {
        self.state.lock().available = available;
    }

    /// Makes the next submission fail with `error`.
    ///
    /// Calls queue up: each failure is used by exactly one submission.
    pub fn fail_next(&self, error: DeviceError) {
        self.state.lock().scripted_failures.push_back(error);
    }

    /// Returns a copy of all accepted blocks, oldest first.
    pub fn blocks(&self) -> Vec<RecordedBlock> {
        self.state.lock().blocks.clone()
    }

    /// Number of accepted blocks.
    pub fn block_count(&self) -> usize {
        self.state.lock().blocks.len()
    }

    /// Number of `submit` calls, including failed ones.
    pub fn attempts(&self) -> usize {
        self.state.lock().attempts
    }

    /// All accepted samples concatenated in submission order.
    pub fn samples(&self) -> Vec<i16> {
        self.state
            .lock()
            .blocks
            .iter()
            .flat_map(|block| block.samples.iter().copied())
            .collect()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.blocks.clear();
        state.attempts = 0;
    }
}

impl Default for MemoryDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackDevice for MemoryDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.state.lock().available
    }

    fn submit(&mut self, block: &Block<'_>) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        state.attempts += 1;
        if let Some(error) = state.scripted_failures.pop_front() {
            return Err(error);
        }
        state.blocks.push(RecordedBlock {
            samples: block.samples.to_vec(),
            sample_rate: block.sample_rate,
            channel: block.channel,
            stereo: block.stereo,
        });
        Ok(())
    }
}
