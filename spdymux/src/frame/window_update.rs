use bytes::{BufMut, Bytes, BytesMut};

use super::bits::WINDOW_DELTA_MASK;
use super::{util, Control, Error, StreamId};

/// Grants send credit. Stream id zero addresses the session window.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct WindowUpdate {
    stream_id: StreamId,
    delta: u32,
}

impl WindowUpdate {
    pub fn new(stream_id: StreamId, delta: u32) -> WindowUpdate {
        WindowUpdate { stream_id, delta }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn delta(&self) -> u32 {
        self.delta
    }

    pub(crate) fn load(payload: Bytes) -> Result<WindowUpdate, Error> {
        util::expect_len(&payload, 8)?;

        let stream_id = StreamId::parse(&payload[0..4])?;
        // the reserved top bit of the delta is ignored
        let delta = unpack_octets_4!(payload, 4, u32) & WINDOW_DELTA_MASK;

        Ok(WindowUpdate { stream_id, delta })
    }

    pub(crate) fn encode_payload(&self, dst: &mut BytesMut) {
        tracing::trace!("encoding WINDOW_UPDATE; id={:?}", self.stream_id);
        dst.put_u32(self.stream_id.into());
        dst.put_u32(self.delta & WINDOW_DELTA_MASK);
    }
}

impl From<WindowUpdate> for Control {
    fn from(src: WindowUpdate) -> Control {
        Control::WindowUpdate(src)
    }
}
