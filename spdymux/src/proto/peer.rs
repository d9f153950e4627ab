use serde::Deserialize;
use std::fmt;

use crate::frame::StreamId;

/// Which end of the transport this session is. Decides the parity of
/// locally originated stream and ping ids.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Server,
}

impl Role {
    pub fn is_server(&self) -> bool {
        *self == Role::Server
    }

    pub fn is_local_init(&self, id: StreamId) -> bool {
        assert!(!id.is_zero());
        self.is_server() == id.is_server_initiated()
    }

    /// Whether the peer may open `id`.
    pub fn ensure_can_open(&self, id: StreamId) -> bool {
        !id.is_zero() && !self.is_local_init(id)
    }

    pub fn first_stream_id(&self) -> StreamId {
        match *self {
            Role::Client => StreamId::from(1),
            Role::Server => StreamId::from(2),
        }
    }

    pub(crate) fn first_ping_id(&self) -> u32 {
        u32::from(self.first_stream_id())
    }

    pub(crate) fn is_local_ping(&self, id: u32) -> bool {
        let odd = id % 2 == 1;
        odd != self.is_server()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(match *self {
            Role::Client => "client",
            Role::Server => "server",
        })
    }
}
