use bytes::BytesMut;

use crate::frame::{self, Frame, Malformed, HEADER_LEN};

const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1_024 * 1_024 - 1;

/// Accumulates transport bytes and cuts them into frames.
///
/// A frame split across several reads is held until its last byte arrives.
#[derive(Debug)]
pub struct FramedRead {
    buf: BytesMut,
    max_frame_size: usize,
}

impl FramedRead {
    pub fn new() -> FramedRead {
        FramedRead::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Frames whose declared payload exceeds `max` are rejected before any of
    /// their payload is buffered.
    pub fn with_max_frame_size(max: usize) -> FramedRead {
        FramedRead {
            buf: BytesMut::new(),
            max_frame_size: max,
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    pub fn set_max_frame_size(&mut self, val: usize) {
        self.max_frame_size = val
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes held that do not yet form a complete frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Returns the next complete frame, or `None` when more bytes are
    /// needed. An error consumes the offending frame where its extent is
    /// known, so decoding may continue after a recoverable error.
    pub fn decode_frame(&mut self) -> Result<Option<Frame>, frame::Error> {
        if self.buf.len() < HEADER_LEN {
            return Ok(None);
        }

        let length = unpack_length(&self.buf[5..HEADER_LEN]);
        if length > self.max_frame_size {
            return Err(frame::Error::Malformed(Malformed::FrameTooLarge {
                length,
                max: self.max_frame_size,
            }));
        }

        let total = HEADER_LEN + length;
        if self.buf.len() < total {
            self.buf.reserve(total - self.buf.len());
            return Ok(None);
        }

        let src = self.buf.split_to(total).freeze();
        tracing::trace!(len = total, "decoding frame");
        frame::decode(src).map(Some)
    }
}

impl Default for FramedRead {
    fn default() -> FramedRead {
        FramedRead::new()
    }
}

fn unpack_length(buf: &[u8]) -> usize {
    ((buf[0] as usize) << 16) | ((buf[1] as usize) << 8) | (buf[2] as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Ping, Version};

    fn ping_bytes(id: u32) -> BytesMut {
        let mut dst = BytesMut::new();
        Frame::control(Version::V3, Ping::new(id)).encode(&mut dst);
        dst
    }

    #[test]
    fn frames_split_across_reads() {
        let mut read = FramedRead::new();
        let mut wire = ping_bytes(1);
        wire.extend_from_slice(&ping_bytes(3));

        let mut frames = Vec::new();
        for byte in wire.iter() {
            read.extend(&[*byte]);
            while let Some(frame) = read.decode_frame().unwrap() {
                frames.push(frame);
            }
        }

        assert_eq!(
            frames,
            vec![
                Frame::control(Version::V3, Ping::new(1)),
                Frame::control(Version::V3, Ping::new(3)),
            ]
        );
        assert_eq!(read.buffered(), 0);
    }

    #[test]
    fn oversized_frame_is_rejected_from_its_header() {
        let mut read = FramedRead::with_max_frame_size(16);
        // DATA on stream 1 declaring 17 bytes, none of which have arrived
        read.extend(&[0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x11]);

        assert_eq!(
            read.decode_frame(),
            Err(frame::Error::Malformed(Malformed::FrameTooLarge {
                length: 17,
                max: 16,
            }))
        );
    }

    #[test]
    fn unknown_frame_is_consumed() {
        let mut read = FramedRead::new();
        read.extend(&[0x80, 0x03, 0x00, 0x0a, 0x00, 0x00, 0x00, 0x02, 0xaa, 0xbb]);
        read.extend(&ping_bytes(5));

        assert_eq!(read.decode_frame(), Err(frame::Error::UnknownFrameType(10)));
        assert_eq!(
            read.decode_frame().unwrap(),
            Some(Frame::control(Version::V3, Ping::new(5)))
        );
    }
}
