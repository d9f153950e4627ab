use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

use super::bits::{CONTROL_FLAG_FIN, CONTROL_FLAG_UNIDIRECTIONAL};
use super::{util, Control, Error, HeaderBlock, Malformed, Priority, StreamId, Version};

const MIN_LEN: usize = 10;

/// Opens a stream.
#[derive(Clone, Eq, PartialEq)]
pub struct SynStream {
    stream_id: StreamId,
    associated_id: StreamId,
    priority: Priority,
    slot: u8,
    flags: u8,
    headers: HeaderBlock,
}

impl SynStream {
    pub fn new(stream_id: StreamId, priority: Priority, headers: HeaderBlock) -> SynStream {
        assert!(!stream_id.is_zero());

        SynStream {
            stream_id,
            associated_id: StreamId::zero(),
            priority,
            slot: 0,
            flags: 0,
            headers,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Zero when the stream is not associated with another one.
    pub fn associated_id(&self) -> StreamId {
        self.associated_id
    }

    pub fn set_associated_id(&mut self, id: StreamId) {
        self.associated_id = id;
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Credential slot, always zero in SPDY/2.
    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn is_fin(&self) -> bool {
        self.flags & CONTROL_FLAG_FIN == CONTROL_FLAG_FIN
    }

    pub fn set_fin(&mut self, val: bool) {
        set_flag(&mut self.flags, CONTROL_FLAG_FIN, val);
    }

    pub fn is_unidirectional(&self) -> bool {
        self.flags & CONTROL_FLAG_UNIDIRECTIONAL == CONTROL_FLAG_UNIDIRECTIONAL
    }

    pub fn set_unidirectional(&mut self, val: bool) {
        set_flag(&mut self.flags, CONTROL_FLAG_UNIDIRECTIONAL, val);
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

    /// Bytes in front of the header block.
    pub(crate) const BLOCK_OFFSET: usize = MIN_LEN;

    pub(crate) fn load(version: Version, flags: u8, mut payload: Bytes) -> Result<Self, Error> {
        util::expect_min_len(&payload, MIN_LEN)?;

        let stream_id = StreamId::parse(&payload[0..4])?;
        if stream_id.is_zero() {
            return Err(Error::Malformed(Malformed::InvalidStreamId));
        }
        let associated_id = StreamId::parse(&payload[4..8])?;
        let priority = Priority::load(version, payload[8]);
        let slot = match version {
            Version::V2 => 0,
            Version::V3 => payload[9],
        };

        payload.advance(MIN_LEN);
        let headers = HeaderBlock::load(version, payload)?;

        Ok(SynStream {
            stream_id,
            associated_id,
            priority,
            slot,
            flags,
            headers,
        })
    }

    pub(crate) fn encode_payload(&self, version: Version, dst: &mut BytesMut) {
        dst.put_u32(self.stream_id.into());
        dst.put_u32(self.associated_id.into());
        dst.put_u8(self.priority.to_wire(version));
        dst.put_u8(match version {
            Version::V2 => 0,
            Version::V3 => self.slot,
        });
        self.headers.encode(version, dst);
    }
}

pub(super) fn set_flag(flags: &mut u8, flag: u8, val: bool) {
    if val {
        *flags |= flag;
    } else {
        *flags &= !flag;
    }
}

impl From<SynStream> for Control {
    fn from(src: SynStream) -> Control {
        Control::SynStream(src)
    }
}

impl fmt::Debug for SynStream {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut f = fmt.debug_struct("SynStream");
        f.field("stream_id", &self.stream_id);
        if !self.associated_id.is_zero() {
            f.field("associated_id", &self.associated_id);
        }
        f.field("priority", &self.priority.tier());
        f.field("flags", &SynFlags(self.flags));
        f.field("headers", &self.headers);
        f.finish()
    }
}

struct SynFlags(u8);

impl fmt::Debug for SynFlags {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        util::debug_flags(fmt, self.0)
            .flag_if(self.0 & CONTROL_FLAG_FIN != 0, "FIN")
            .flag_if(self.0 & CONTROL_FLAG_UNIDIRECTIONAL != 0, "UNIDIRECTIONAL")
            .finish()
    }
}
