use bytes::{Bytes, BytesMut};
use std::fmt;

use super::bits::CONTROL_FLAG_FIN;
use super::syn_reply::{encode_block, load_block};
use super::syn_stream::set_flag;
use super::{Control, Error, HeaderBlock, StreamId, Version};

/// Additional header block on an already open stream.
#[derive(Clone, Eq, PartialEq)]
pub struct Headers {
    stream_id: StreamId,
    flags: u8,
    headers: HeaderBlock,
}

impl Headers {
    pub fn new(stream_id: StreamId, headers: HeaderBlock) -> Headers {
        assert!(!stream_id.is_zero());

        Headers {
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

    pub(crate) fn load(version: Version, flags: u8, payload: Bytes) -> Result<Self, Error> {
        let (stream_id, headers) = load_block(version, payload)?;
        Ok(Headers {
            stream_id,
            flags,
            headers,
        })
    }

    pub(crate) fn encode_payload(&self, version: Version, dst: &mut BytesMut) {
        encode_block(self.stream_id, &self.headers, version, dst);
    }
}

impl From<Headers> for Control {
    fn from(src: Headers) -> Control {
        Control::Headers(src)
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Headers")
            .field("stream_id", &self.stream_id)
            .field("fin", &self.is_fin())
            .field("headers", &self.headers)
            .finish()
    }
}
