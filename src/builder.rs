//! Builder pattern for `MonoSink`.

use crate::device::PlaybackDevice;
use crate::{
    event_callback, EventCallback, MonoSink, OutputChannel, SinkConfig, SinkError, SinkEvent,
};

/// Longest accepted fade, in samples (about 27 hours at 44.1kHz).
const MAX_FADE_LEN: usize = u32::MAX as usize;

/// Builder for configuring a [`MonoSink`].
///
/// Use [`MonoSink::builder()`] to create a new builder. Every setting has a
/// default, so `MonoSink::builder(device).build()` is a complete sink: 44.1kHz,
/// output 0, 1536-sample blocks, 64-sample fades.
///
/// # Example
///
/// ```
/// use speaker_sink::{MemoryDevice, MonoSink, OutputChannel, SinkEvent};
///
/// let sink = MonoSink::builder(MemoryDevice::new())
///     .sample_rate(48_000)
///     .channel(OutputChannel(0))
///     .buffer_capacity(1024)
///     .fade_len(32)
///     .on_event(|event| {
///         if let SinkEvent::BlockDropped { samples, .. } = event {
///             eprintln!("lost {samples} samples");
///         }
///     })
///     .build()?;
///
/// assert_eq!(sink.buffer_capacity(), 1024);
/// # Ok::<(), speaker_sink::SinkError>(())
/// ```
///
/// [`MonoSink::builder()`]: crate::MonoSink::builder
#[must_use]
pub struct MonoSinkBuilder<D> {
    /// Device the sink submits to.
    device: D,
    /// Sink configuration.
    config: SinkConfig,
    /// Event callback.
    event_callback: Option<EventCallback>,
}

impl<D: PlaybackDevice> MonoSinkBuilder<D> {
    /// Creates a builder with default settings.
    pub fn new(device: D) -> Self {
        Self {
            device,
            config: SinkConfig::default(),
            event_callback: None,
        }
    }

    /// Set the initial playback rate.
    ///
    /// Default: 44100 Hz. Can be changed later with
    /// [`FrameSink::set_sample_rate()`](crate::FrameSink::set_sample_rate).
    pub fn sample_rate(mut self, hz: u32) -> Self {
        self.config.sample_rate = hz;
        self
    }

    /// Set the output blocks are submitted for.
    ///
    /// Default: output 0
    pub fn channel(mut self, channel: impl Into<OutputChannel>) -> Self {
        self.config.channel = channel.into();
        self
    }

    /// Set the number of samples per block.
    ///
    /// Default: 1536
    pub fn buffer_capacity(mut self, samples: usize) -> Self {
        self.config.buffer_capacity = samples;
        self
    }

    /// Set the length of the start and stop ramps, in samples.
    ///
    /// Default: 64. Zero disables both ramps. Values above `u32::MAX` are
    /// rejected by [`build()`](Self::build).
    pub fn fade_len(mut self, samples: usize) -> Self {
        self.config.fade_len = samples;
        self
    }

    /// Set how many times a busy device is retried before a block is dropped.
    ///
    /// Default: 1
    pub fn submit_retries(mut self, retries: u32) -> Self {
        self.config.submit_retries = retries;
        self
    }

    /// Set a complete configuration, replacing earlier settings.
    pub fn with_config(mut self, config: SinkConfig) -> Self {
        self.config = config;
        self
    }

    /// Set a callback to receive runtime events.
    ///
    /// Events include device errors, dropped blocks, and finished streams.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(SinkEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(event_callback(callback));
        self
    }

    /// Validates the builder configuration.
    fn validate(&self) -> Result<(), SinkError> {
        if !self.device.is_available() {
            return Err(SinkError::DeviceUnavailable {
                name: self.device.name().to_string(),
            });
        }
        if self.config.buffer_capacity == 0 {
            return Err(SinkError::invalid_config("buffer capacity must be non-zero"));
        }
        if self.config.sample_rate == 0 {
            return Err(SinkError::invalid_config("sample rate must be non-zero"));
        }
        if self.config.fade_len > MAX_FADE_LEN {
            return Err(SinkError::invalid_config(format!(
                "fade length {} exceeds {} samples",
                self.config.fade_len, MAX_FADE_LEN
            )));
        }
        Ok(())
    }

    /// Builds the sink, allocating its buffers.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The device reports itself unavailable
    /// - The buffer capacity or sample rate is zero
    /// - The fade length is above `u32::MAX`
    pub fn build(self) -> Result<MonoSink<D>, SinkError> {
        if let Err(e) = self.validate() {
            tracing::error!("MonoSink: configuration rejected: {}", e);
            return Err(e);
        }
        Ok(MonoSink::from_parts(
            self.device,
            &self.config,
            self.event_callback,
        ))
    }
}
