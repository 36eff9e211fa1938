//! Typed, double-buffered event mailboxes.
//!
//! An [`EventQueue`] keeps two buffers per event type: `current`
//! receives this frame's sends, `previous` holds the stable snapshot
//! readers see. [`EventQueue::update`] clears the old snapshot and swaps
//! the buffers, so writers this frame become readers next frame and a
//! reader never observes a buffer that is still being appended to.
//!
//! Insertion order is preserved within a frame and across the swap.

/// Double-buffered publish/read mailbox for events of type `T`.
#[derive(Default)]
pub struct EventQueue<T> {
    current: Vec<T>,
    previous: Vec<T>,
}

impl<T> EventQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            current: Vec::new(),
            previous: Vec::new(),
        }
    }

    /// Appends an event to the write buffer.
    #[inline]
    pub fn send(&mut self, event: T) {
        self.current.push(event);
    }

    /// Flips the buffers: this frame's sends become readable, the old
    /// snapshot is discarded.
    pub fn update(&mut self) {
        self.previous.clear();
        std::mem::swap(&mut self.previous, &mut self.current);
    }

    /// The readable snapshot, in send order.
    #[inline]
    pub fn read(&self) -> &[T] {
        &self.previous
    }

    /// Writer-side view of events sent since the last flip.
    #[inline]
    pub fn peek(&self) -> &[T] {
        &self.current
    }

    /// Number of readable events.
    #[inline]
    pub fn count(&self) -> usize {
        self.previous.len()
    }

    /// Copies the readable snapshot into `out`.
    pub fn collect(&self, out: &mut Vec<T>)
    where
        T: Clone,
    {
        out.extend_from_slice(&self.previous);
    }

    /// Moves the readable snapshot out, leaving a fresh buffer behind.
    pub fn drain(&mut self) -> Vec<T> {
        std::mem::take(&mut self.previous)
    }

    /// Discards both buffers.
    pub fn clear(&mut self) {
        self.current.clear();
        self.previous.clear();
    }
}
