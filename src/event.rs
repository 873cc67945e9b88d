//! Runtime events for monitoring playback health.
//!
//! Events are non-fatal notifications. The sink keeps accepting frames after
//! any event is emitted; they exist for logging and metrics, since the
//! per-sample path has no way to return an error to the producer.

use std::sync::Arc;

use crate::OutputChannel;

/// Runtime events emitted by a [`MonoSink`](crate::MonoSink).
///
/// # Example
///
/// ```
/// use speaker_sink::SinkEvent;
///
/// fn handle_event(event: SinkEvent) {
///     match event {
///         SinkEvent::DeviceError { device, attempt, error } => {
///             eprintln!("{device}: attempt {attempt} failed: {error}");
///         }
///         SinkEvent::BlockDropped { device, samples, reason } => {
///             eprintln!("{device}: dropped {samples} samples ({reason})");
///         }
///         SinkEvent::SampleRateChanged { previous, current, buffered } => {
///             eprintln!("rate {previous} -> {current} with {buffered} samples pending");
///         }
///         SinkEvent::StreamFinished { channel, frames } => {
///             eprintln!("{channel}: stream finished after {frames} frames");
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// A single submission attempt was rejected by the device.
    DeviceError {
        /// Name of the device.
        device: String,
        /// 1-based attempt number for this block.
        attempt: u32,
        /// Description of the error.
        error: String,
    },

    /// A block was given up on after the device rejected it.
    ///
    /// The samples are lost; the sink has already moved on to the next
    /// buffer.
    BlockDropped {
        /// Name of the device.
        device: String,
        /// Number of samples in the dropped block.
        samples: usize,
        /// Description of the final error.
        reason: String,
    },

    /// The sample rate changed while samples were waiting in the active buffer.
    ///
    /// Those samples will be played at the new rate. Call
    /// [`begin()`](crate::FrameSink::begin) before a rate change to avoid this.
    SampleRateChanged {
        /// Rate before the change.
        previous: u32,
        /// Rate after the change.
        current: u32,
        /// Samples already in the active buffer.
        buffered: usize,
    },

    /// `stop()` faded out and submitted the final block of a stream.
    StreamFinished {
        /// Output the stream was playing on.
        channel: OutputChannel,
        /// Frames consumed since the last `begin()`.
        frames: u64,
    },
}

/// Callback type for receiving runtime events.
///
/// Register via [`MonoSinkBuilder::on_event()`]. The callback runs on the
/// producer's thread, inside `consume`, so it must be quick.
///
/// [`MonoSinkBuilder::on_event()`]: crate::MonoSinkBuilder::on_event
pub type EventCallback = Arc<dyn Fn(SinkEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// # Example
///
/// ```
/// use speaker_sink::{event_callback, SinkEvent};
///
/// let callback = event_callback(|event| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(SinkEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}
