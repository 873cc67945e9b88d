//! Producer-facing sink trait and the buffered mono sink.
//!
//! A [`FrameSink`] is what a decoder talks to: it is told when a stream
//! begins, handed one stereo frame at a time, and told when the stream
//! stops. The crate provides [`MonoSink`], which downmixes, fades, and
//! delivers fixed-size blocks to a [`PlaybackDevice`](crate::PlaybackDevice).

mod mono;
mod ring;

pub use mono::{MonoSink, SinkStats};
pub use ring::RING_SLOTS;

use crate::Frame;

/// A destination for a continuous stream of stereo PCM frames.
///
/// # Implementation Notes
///
/// - No method returns an error: a real-time producer has nothing useful to
///   do with one, and backing off would itself be audible
/// - `consume` must never block and must never reject a frame
/// - `stop` must be safe to call repeatedly
///
/// # Example
///
/// ```
/// use speaker_sink::{FrameSink, MemoryDevice, MonoSink};
///
/// fn play_tone(sink: &mut impl FrameSink, frames: usize) {
///     sink.begin();
///     for i in 0..frames {
///         let sample = if i % 50 < 25 { 4000 } else { -4000 };
///         sink.consume(sample, sample);
///     }
///     sink.stop();
/// }
///
/// let device = MemoryDevice::new();
/// let mut sink = MonoSink::builder(device.clone()).build()?;
/// play_tone(&mut sink, 2000);
/// assert_eq!(device.block_count(), 2);
/// # Ok::<(), speaker_sink::SinkError>(())
/// ```
pub trait FrameSink {
    /// Prepares for a new stream, discarding anything still buffered.
    fn begin(&mut self);

    /// Sets the rate blocks are played at from now on.
    fn set_sample_rate(&mut self, hz: u32);

    /// Accepts one stereo frame.
    fn consume(&mut self, left: i16, right: i16);

    /// Accepts one [`Frame`].
    fn consume_frame(&mut self, frame: Frame) {
        self.consume(frame.left, frame.right);
    }

    /// Accepts every (left, right) pair of an interleaved slice.
    ///
    /// A trailing odd sample is ignored.
    fn consume_interleaved(&mut self, samples: &[i16]) {
        for frame in Frame::from_interleaved(samples) {
            self.consume_frame(frame);
        }
    }

    /// Hands any buffered samples to the output now.
    fn flush(&mut self);

    /// Ends the stream, letting the output settle instead of cutting off.
    fn stop(&mut self);
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn begin(&mut self) {
        (**self).begin();
    }

    fn set_sample_rate(&mut self, hz: u32) {
        (**self).set_sample_rate(hz);
    }

    fn consume(&mut self, left: i16, right: i16) {
        (**self).consume(left, right);
    }

    fn flush(&mut self) {
        (**self).flush();
    }

    fn stop(&mut self) {
        (**self).stop();
    }
}
