use std::collections::VecDeque;

use crate::models::Frame;

/// Ring buffer holding the most recent frames.
///
/// `len() <= capacity()` holds after every operation; pushing onto a full
/// buffer evicts the oldest frame.
#[derive(Debug)]
pub struct FrameBuffer {
    frames: VecDeque<Frame>,
    capacity: usize,
}

impl FrameBuffer {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "frame buffer capacity must be > 0");
        Self {
            frames: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a frame, evicting the oldest one if the buffer overflows.
    ///
    /// Returns the frame just pushed, ready for annotation.
    pub fn push(&mut self, frame: Frame) -> &mut Frame {
        self.frames.push_back(frame);
        if self.frames.len() > self.capacity {
            if let Some(evicted) = self.frames.pop_front() {
                log::trace!("Evicted frame {} from buffer", evicted.index);
            }
        }
        debug_assert!(self.frames.len() <= self.capacity);
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Most recently pushed frame
    pub fn back(&self) -> Option<&Frame> {
        self.frames.back()
    }

    /// Most recently pushed frame, for in-place annotation
    pub fn back_mut(&mut self) -> Option<&mut Frame> {
        self.frames.back_mut()
    }

    /// Frame pushed just before the most recent one
    pub fn previous(&self) -> Option<&Frame> {
        let len = self.frames.len();
        if len < 2 {
            None
        } else {
            self.frames.get(len - 2)
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
