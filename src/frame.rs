//! Stereo frame as delivered by the producer.

use crate::format::downmix;

/// One stereo sample pair delivered together.
///
/// # Example
///
/// ```
/// use speaker_sink::Frame;
///
/// let frame = Frame::new(100, -50);
/// assert_eq!(frame.mono(), 25);
///
/// let frames: Vec<Frame> = Frame::from_interleaved(&[1, 3, 5, 7]).collect();
/// assert_eq!(frames, vec![Frame::new(1, 3), Frame::new(5, 7)]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    /// Left channel sample.
    pub left: i16,
    /// Right channel sample.
    pub right: i16,
}

impl Frame {
    /// Creates a frame from its two channel samples.
    pub const fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }

    /// Returns the mono downmix of this frame.
    #[must_use]
    pub fn mono(self) -> i16 {
        downmix(self.left, self.right)
    }

    /// Iterates over the (left, right) pairs of an interleaved slice.
    ///
    /// A trailing odd sample is ignored.
    pub fn from_interleaved(samples: &[i16]) -> impl Iterator<Item = Frame> + '_ {
        samples
            .chunks_exact(2)
            .map(|pair| Frame::new(pair[0], pair[1]))
    }
}

impl From<[i16; 2]> for Frame {
    fn from([left, right]: [i16; 2]) -> Self {
        Self::new(left, right)
    }
}

impl From<(i16, i16)> for Frame {
    fn from((left, right): (i16, i16)) -> Self {
        Self::new(left, right)
    }
}
