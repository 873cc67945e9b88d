//! # speaker-sink
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Click-free buffered mono output for streaming stereo PCM.
//!
//! A decoder hands `speaker-sink` one stereo frame at a time. The sink
//! averages each frame down to mono, collects samples into fixed-size
//! blocks, and submits every full block to a playback device. Streams start
//! with a short fade-in and end with a fade-out plus a little silence, so
//! starting and stopping never pops.
//!
//! ## Quick Start
//!
//! ```
//! use speaker_sink::{FrameSink, MemoryDevice, MonoSink, OutputChannel};
//!
//! let device = MemoryDevice::new();
//! let mut sink = MonoSink::builder(device.clone())
//!     .sample_rate(44_100)
//!     .channel(OutputChannel(0))
//!     .on_event(|e| tracing::warn!(?e, "sink event"))
//!     .build()?;
//!
//! sink.begin();
//! for _ in 0..4096 {
//!     sink.consume(1000, -1000);
//! }
//! sink.stop();
//!
//! assert_eq!(device.block_count(), 3);
//! # Ok::<(), speaker_sink::SinkError>(())
//! ```
//!
//! ## Architecture
//!
//! - **Producer**: Calls [`FrameSink`] methods; nothing on this path blocks
//!   or returns an error
//! - **Buffer ring**: Three preallocated blocks; one fills while the device
//!   may still hold the previous one
//! - **Device**: Any [`PlaybackDevice`]. Slow devices can be put behind a
//!   [`QueuedDevice`](device::QueuedDevice), which plays blocks from a tokio
//!   task
//!
//! Device failures never reach the producer. The sink retries a busy device,
//! otherwise drops the block, and reports both through [`SinkEvent`]s and
//! [`SinkStats`].

#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod builder;
mod config;
pub mod device;
mod error;
mod event;
pub mod format;
mod frame;
mod signal;
mod sink;

pub use builder::MonoSinkBuilder;
pub use config::{
    OutputChannel, QueueConfig, SinkConfig, DEFAULT_BUFFER_CAPACITY, DEFAULT_FADE_LEN,
    DEFAULT_SAMPLE_RATE,
};
pub use device::{Block, MemoryDevice, PlaybackDevice, RecordedBlock, WavDevice};
pub use error::{DeviceError, SinkError};
pub use event::{event_callback, EventCallback, SinkEvent};
pub use frame::Frame;
pub use signal::SignalGenerator;
pub use sink::{FrameSink, MonoSink, SinkStats, RING_SLOTS};
