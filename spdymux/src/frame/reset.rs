use bytes::{BufMut, Bytes, BytesMut};

use super::{util, Control, Error, Malformed, Reason, StreamId};

/// Abruptly terminates a single stream.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub struct Reset {
    stream_id: StreamId,
    status: Reason,
}

impl Reset {
    pub fn new(stream_id: StreamId, status: Reason) -> Reset {
        Reset { stream_id, status }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn reason(&self) -> Reason {
        self.status
    }

    pub(crate) fn load(payload: Bytes) -> Result<Reset, Error> {
        util::expect_len(&payload, 8)?;

        let stream_id = StreamId::parse(&payload[0..4])?;
        if stream_id.is_zero() {
            return Err(Error::Malformed(Malformed::InvalidStreamId));
        }
        let status = unpack_octets_4!(payload, 4, u32);

        Ok(Reset {
            stream_id,
            status: status.into(),
        })
    }

    pub(crate) fn encode_payload(&self, dst: &mut BytesMut) {
        tracing::trace!(
            "encoding RESET; id={:?} code={:?}",
            self.stream_id,
            self.status
        );
        dst.put_u32(self.stream_id.into());
        dst.put_u32(self.status.into());
    }
}

impl From<Reset> for Control {
    fn from(src: Reset) -> Control {
        Control::Reset(src)
    }
}
