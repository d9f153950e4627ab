use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use super::{util, Control, Error, StreamId, Version};

/// Announces that the sender will accept no new streams above
/// `last_good_id`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct GoAway {
    last_good_id: StreamId,
    status: GoAwayStatus,
}

/// Session-level status carried by GOAWAY. SPDY/2 has no status field and
/// always reads as `OK`.
#[derive(PartialEq, Eq, Hash, Clone, Copy)]
pub struct GoAwayStatus(u32);

impl GoAwayStatus {
    pub const OK: GoAwayStatus = GoAwayStatus(0);
    pub const PROTOCOL_ERROR: GoAwayStatus = GoAwayStatus(1);
    pub const INTERNAL_ERROR: GoAwayStatus = GoAwayStatus(2);

    pub fn is_ok(&self) -> bool {
        *self == GoAwayStatus::OK
    }
}

impl GoAway {
    pub fn new(last_good_id: StreamId, status: GoAwayStatus) -> Self {
        GoAway {
            last_good_id,
            status,
        }
    }

    pub fn last_good_id(&self) -> StreamId {
        self.last_good_id
    }

    pub fn status(&self) -> GoAwayStatus {
        self.status
    }

    pub(crate) fn load(version: Version, payload: Bytes) -> Result<GoAway, Error> {
        let len = match version {
            Version::V2 => 4,
            Version::V3 => 8,
        };
        util::expect_len(&payload, len)?;

        let last_good_id = StreamId::parse(&payload[0..4])?;
        let status = match version {
            Version::V2 => GoAwayStatus::OK,
            Version::V3 => GoAwayStatus(unpack_octets_4!(payload, 4, u32)),
        };

        Ok(GoAway {
            last_good_id,
            status,
        })
    }

    pub(crate) fn encode_payload(&self, version: Version, dst: &mut BytesMut) {
        tracing::trace!("encoding GO_AWAY; code={:?}", self.status);
        dst.put_u32(self.last_good_id.into());
        if version == Version::V3 {
            dst.put_u32(self.status.0);
        }
    }
}

impl From<GoAway> for Control {
    fn from(src: GoAway) -> Control {
        Control::GoAway(src)
    }
}

impl From<u32> for GoAwayStatus {
    fn from(src: u32) -> GoAwayStatus {
        GoAwayStatus(src)
    }
}

impl From<GoAwayStatus> for u32 {
    fn from(src: GoAwayStatus) -> u32 {
        src.0
    }
}

impl fmt::Debug for GoAwayStatus {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            0 => fmt.write_str("OK"),
            1 => fmt.write_str("PROTOCOL_ERROR"),
            2 => fmt.write_str("INTERNAL_ERROR"),
            other => fmt.debug_tuple("GoAwayStatus").field(&other).finish(),
        }
    }
}

impl fmt::Display for GoAwayStatus {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, fmt)
    }
}
