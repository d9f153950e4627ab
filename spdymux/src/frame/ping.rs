use bytes::{BufMut, Bytes, BytesMut};

use super::{util, Control, Error};

/// Liveness check. The sender's parity is encoded in the id: clients use odd
/// ids and servers even ones, so a receiver can tell a request from an echo.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub struct Ping {
    id: u32,
}

impl Ping {
    pub fn new(id: u32) -> Ping {
        Ping { id }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub(crate) fn load(payload: Bytes) -> Result<Ping, Error> {
        util::expect_len(&payload, 4)?;
        Ok(Ping {
            id: unpack_octets_4!(payload, 0, u32),
        })
    }

    pub(crate) fn encode_payload(&self, dst: &mut BytesMut) {
        tracing::trace!("encoding PING; id={}", self.id);
        dst.put_u32(self.id);
    }
}

impl From<Ping> for Control {
    fn from(src: Ping) -> Control {
        Control::Ping(src)
    }
}
