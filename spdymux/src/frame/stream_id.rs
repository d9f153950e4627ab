use std::fmt;

use super::bits::STREAM_ID_MASK;
use super::{Error, IllegalBits};

/// A 31-bit stream identifier. Clients open odd ids, servers even ones and
/// zero is reserved for the session itself.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct StreamId(u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StreamIdOverflow;

impl StreamId {
    pub const ZERO: StreamId = StreamId(0);

    pub const MAX: StreamId = StreamId(STREAM_ID_MASK);

    /// Reads a stream id from four big-endian bytes, rejecting a set
    /// reserved bit.
    pub fn parse(buf: &[u8]) -> Result<StreamId, Error> {
        let raw = unpack_octets_4!(buf, 0, u32);

        if raw & !STREAM_ID_MASK != 0 {
            return Err(Error::IllegalBits(IllegalBits::StreamId(raw)));
        }

        Ok(StreamId(raw))
    }

    pub fn is_client_initiated(&self) -> bool {
        let id = self.0;
        id != 0 && id % 2 == 1
    }

    pub fn is_server_initiated(&self) -> bool {
        let id = self.0;
        id != 0 && id % 2 == 0
    }

    #[inline]
    pub fn zero() -> StreamId {
        StreamId(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The next id of the same parity.
    pub fn next_id(&self) -> Result<StreamId, StreamIdOverflow> {
        let next = self.0 + 2;
        if next > StreamId::MAX.0 {
            Err(StreamIdOverflow)
        } else {
            Ok(StreamId(next))
        }
    }
}

impl From<u32> for StreamId {
    fn from(src: u32) -> Self {
        assert_eq!(src & !STREAM_ID_MASK, 0, "invalid stream ID -- MSB is set");
        StreamId(src)
    }
}

impl From<StreamId> for u32 {
    fn from(src: StreamId) -> Self {
        src.0
    }
}

impl PartialEq<u32> for StreamId {
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, fmt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity() {
        assert!(StreamId::from(1).is_client_initiated());
        assert!(StreamId::from(2).is_server_initiated());
        assert!(!StreamId::ZERO.is_client_initiated());
        assert!(!StreamId::ZERO.is_server_initiated());
    }

    #[test]
    fn reserved_bit_is_rejected() {
        let err = StreamId::parse(&[0x80, 0, 0, 1]).unwrap_err();
        assert_eq!(err, Error::IllegalBits(IllegalBits::StreamId(0x8000_0001)));
        assert_eq!(StreamId::parse(&[0x7f, 0xff, 0xff, 0xff]).unwrap(), StreamId::MAX);
    }

    #[test]
    fn next_id_overflows_at_max() {
        assert_eq!(StreamId::from(1).next_id(), Ok(StreamId::from(3)));
        assert_eq!(StreamId::MAX.next_id(), Err(StreamIdOverflow));
        assert_eq!(StreamId::from(0x7fff_fffe).next_id(), Err(StreamIdOverflow));
    }
}
