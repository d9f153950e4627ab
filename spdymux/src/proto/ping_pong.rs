use crate::frame::Ping;
use crate::proto::Role;

/// Tracks PINGs we originated. Ids carry our parity and advance by two.
#[derive(Debug)]
pub(crate) struct PingPong {
    role: Role,
    next_id: u32,
    in_flight: usize,
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum ReceivedPing {
    /// A peer-originated ping; echo it back unchanged.
    MustAck(Ping),
    /// The echo of one of ours.
    Pong(u32),
    /// An echo with our parity while nothing is in flight.
    Unexpected(u32),
}

impl PingPong {
    pub(crate) fn new(role: Role) -> Self {
        PingPong {
            role,
            next_id: role.first_ping_id(),
            in_flight: 0,
        }
    }

    pub(crate) fn send_ping(&mut self) -> Ping {
        let id = self.next_id;
        // Ping ids wrap within their parity class.
        self.next_id = self.next_id.wrapping_add(2);
        self.in_flight += 1;
        tracing::trace!(id, in_flight = self.in_flight, "send PING");
        Ping::new(id)
    }

    pub(crate) fn recv_ping(&mut self, ping: Ping) -> ReceivedPing {
        let id = ping.id();

        if !self.role.is_local_ping(id) {
            return ReceivedPing::MustAck(ping);
        }

        if self.in_flight == 0 {
            tracing::warn!("recv PING echo that we never sent: {:?}", ping);
            return ReceivedPing::Unexpected(id);
        }

        self.in_flight -= 1;
        tracing::trace!(id, in_flight = self.in_flight, "recv PING echo");
        ReceivedPing::Pong(id)
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight
    }
}
