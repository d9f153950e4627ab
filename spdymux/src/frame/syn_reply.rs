use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

use super::bits::CONTROL_FLAG_FIN;
use super::syn_stream::set_flag;
use super::{util, Control, Error, HeaderBlock, Malformed, StreamId, Version};

/// Accepts a stream opened by the peer.
#[derive(Clone, Eq, PartialEq)]
pub struct SynReply {
    stream_id: StreamId,
    flags: u8,
    headers: HeaderBlock,
}

impl SynReply {
    pub fn new(stream_id: StreamId, headers: HeaderBlock) -> SynReply {
        assert!(!stream_id.is_zero());

        SynReply {
            stream_id,
            flags: 0,
            headers,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn is_fin(&self) -> bool {
        self.flags & CONTROL_FLAG_FIN == CONTROL_FLAG_FIN
    }

    pub fn set_fin(&mut self, val: bool) {
        set_flag(&mut self.flags, CONTROL_FLAG_FIN, val);
    }

    pub fn headers(&self) -> &HeaderBlock {
        &self.headers
    }

    pub fn into_headers(self) -> HeaderBlock {
        self.headers
    }

    pub(crate) fn flags(&self) -> u8 {
        self.flags
    }

    /// Bytes in front of the header block. HEADERS uses the same layout.
    pub(crate) fn block_offset(version: Version) -> usize {
        match version {
            Version::V2 => 6,
            Version::V3 => 4,
        }
    }

    pub(crate) fn load(version: Version, flags: u8, payload: Bytes) -> Result<Self, Error> {
        let (stream_id, headers) = load_block(version, payload)?;
        Ok(SynReply {
            stream_id,
            flags,
            headers,
        })
    }

    pub(crate) fn encode_payload(&self, version: Version, dst: &mut BytesMut) {
        encode_block(self.stream_id, &self.headers, version, dst);
    }
}

/// SYN_REPLY and HEADERS share a layout: the stream id, two unused bytes in
/// SPDY/2 only, then the header block.
pub(super) fn load_block(version: Version, mut payload: Bytes) -> Result<(StreamId, HeaderBlock), Error> {
    let prefix = SynReply::block_offset(version);
    util::expect_min_len(&payload, prefix)?;

    let stream_id = StreamId::parse(&payload[0..4])?;
    if stream_id.is_zero() {
        return Err(Error::Malformed(Malformed::InvalidStreamId));
    }

    payload.advance(prefix);
    let headers = HeaderBlock::load(version, payload)?;
    Ok((stream_id, headers))
}

pub(super) fn encode_block(
    stream_id: StreamId,
    headers: &HeaderBlock,
    version: Version,
    dst: &mut BytesMut,
) {
    dst.put_u32(stream_id.into());
    if version == Version::V2 {
        dst.put_u16(0);
    }
    headers.encode(version, dst);
}

impl From<SynReply> for Control {
    fn from(src: SynReply) -> Control {
        Control::SynReply(src)
    }
}

impl fmt::Debug for SynReply {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("SynReply")
            .field("stream_id", &self.stream_id)
            .field("fin", &self.is_fin())
            .field("headers", &self.headers)
            .finish()
    }
}
