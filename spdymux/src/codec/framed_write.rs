use bytes::{Bytes, BytesMut};

use crate::frame::Frame;

const DEFAULT_BUFFER_CAPACITY: usize = 16 * 1_024;

/// Encodes frames into a transmit buffer that the transport drains with
/// [`take_chunk`](FramedWrite::take_chunk).
#[derive(Debug)]
pub struct FramedWrite {
    buf: BytesMut,
    max_buffer_size: usize,
}

impl FramedWrite {
    pub fn new() -> FramedWrite {
        FramedWrite::with_max_buffer_size(DEFAULT_BUFFER_CAPACITY)
    }

    pub fn with_max_buffer_size(max: usize) -> FramedWrite {
        FramedWrite {
            buf: BytesMut::with_capacity(max),
            max_buffer_size: max,
        }
    }

    /// Whether another frame may be buffered. A single frame may overshoot
    /// the limit; the check only happens before each frame.
    pub fn has_capacity(&self) -> bool {
        self.buf.len() < self.max_buffer_size
    }

    pub fn buffer(&mut self, item: Frame) {
        let span = tracing::trace_span!("FramedWrite::buffer", frame = ?item);
        let _e = span.enter();

        tracing::debug!(frame = ?item, "send");
        item.encode(&mut self.buf);
        tracing::trace!(rem = self.buf.len(), "encoded");
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Hands out up to `max` encoded bytes, oldest first.
    pub fn take_chunk(&mut self, max: usize) -> Option<Bytes> {
        if self.buf.is_empty() || max == 0 {
            return None;
        }

        let n = std::cmp::min(max, self.buf.len());
        Some(self.buf.split_to(n).freeze())
    }
}

impl Default for FramedWrite {
    fn default() -> FramedWrite {
        FramedWrite::new()
    }
}
