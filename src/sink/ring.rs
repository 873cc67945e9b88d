//! Fixed ring of equal-size sample buffers.

/// Number of buffers in the ring.
///
/// One buffer fills while the previous one may still be held by the device,
/// with a third as headroom for a slow device call.
pub const RING_SLOTS: usize = 3;

/// Three preallocated buffers plus the rotation pointer and fill cursor.
///
/// Only the active buffer is ever written. Nothing here allocates after
/// construction.
pub(crate) struct BufferRing {
    slots: [Box<[i16]>; RING_SLOTS],
    active: usize,
    cursor: usize,
}

impl BufferRing {
    /// Creates a ring of zeroed buffers holding `capacity` samples each.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: std::array::from_fn(|_| vec![0i16; capacity].into_boxed_slice()),
            active: 0,
            cursor: 0,
        }
    }

    /// Samples per buffer.
    pub fn capacity(&self) -> usize {
        self.slots[0].len()
    }

    /// Index of the buffer currently being filled.
    pub fn active(&self) -> usize {
        self.active
    }

    /// Samples written into the active buffer.
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_full(&self) -> bool {
        self.cursor >= self.capacity()
    }

    /// Last sample written into the active buffer, if any.
    pub fn last(&self) -> Option<i16> {
        self.cursor
            .checked_sub(1)
            .map(|idx| self.slots[self.active][idx])
    }

    /// Appends a sample to the active buffer.
    ///
    /// Returns `true` when the buffer is full afterwards. The caller must
    /// not push into a full buffer.
    pub fn push(&mut self, sample: i16) -> bool {
        debug_assert!(!self.is_full(), "push into a full buffer");
        self.slots[self.active][self.cursor] = sample;
        self.cursor += 1;
        self.is_full()
    }

    /// The filled part of the active buffer.
    pub fn filled(&self) -> &[i16] {
        &self.slots[self.active][..self.cursor]
    }

    /// Makes the next buffer active and empty.
    ///
    /// The previous buffer keeps its contents until it comes round again.
    pub fn rotate(&mut self) {
        self.active = (self.active + 1) % RING_SLOTS;
        self.cursor = 0;
    }

    /// Empties the active buffer without rotating.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Zeroes every buffer and returns to buffer 0.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.fill(0);
        }
        self.active = 0;
        self.cursor = 0;
    }

    #[cfg(test)]
    pub fn slot(&self, index: usize) -> &[i16] {
        &self.slots[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ring_is_empty() {
        let ring = BufferRing::new(4);
        assert_eq!(ring.capacity(), 4);
        assert_eq!(ring.active(), 0);
        assert!(ring.is_empty());
        assert_eq!(ring.last(), None);
        assert!(ring.filled().is_empty());
    }

    #[test]
    fn test_push_reports_full() {
        let mut ring = BufferRing::new(3);
        assert!(!ring.push(1));
        assert!(!ring.push(2));
        assert!(ring.push(3));
        assert_eq!(ring.filled(), &[1, 2, 3]);
        assert_eq!(ring.last(), Some(3));
    }

    #[test]
    fn test_rotate_wraps_after_three() {
        let mut ring = BufferRing::new(2);
        ring.push(7);
        ring.rotate();
        assert_eq!(ring.active(), 1);
        assert!(ring.is_empty());
        ring.rotate();
        ring.rotate();
        assert_eq!(ring.active(), 0);
    }

    #[test]
    fn test_rotate_keeps_previous_contents() {
        let mut ring = BufferRing::new(2);
        ring.push(5);
        ring.push(6);
        ring.rotate();
        ring.push(9);
        assert_eq!(ring.slot(0), &[5, 6]);
        assert_eq!(ring.filled(), &[9]);
    }

    #[test]
    fn test_rewind_does_not_rotate() {
        let mut ring = BufferRing::new(2);
        ring.push(1);
        ring.rewind();
        assert_eq!(ring.active(), 0);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_reset_zeroes_all_slots() {
        let mut ring = BufferRing::new(2);
        for value in 1..=6 {
            if ring.push(value) {
                ring.rotate();
            }
        }
        ring.push(42);
        ring.reset();

        assert_eq!(ring.active(), 0);
        assert!(ring.is_empty());
        for index in 0..RING_SLOTS {
            assert!(ring.slot(index).iter().all(|&s| s == 0));
        }
    }
}
