use crate::frame::{self, GoAwayStatus, StreamId};

/// GOAWAY bookkeeping in both directions.
#[derive(Debug, Default)]
pub(crate) struct GoAway {
    sent: Option<GoingAway>,
    received: Option<GoingAway>,
}

#[derive(Debug, Clone, Copy)]
struct GoingAway {
    last_good_id: StreamId,
    status: GoAwayStatus,
}

impl GoAway {
    pub fn new() -> Self {
        GoAway::default()
    }

    /// Records a GOAWAY we are about to send. A later GOAWAY may only lower
    /// the announced id.
    pub fn go_away(&mut self, f: &frame::GoAway) {
        if let Some(ref going_away) = self.sent {
            assert!(
                f.last_good_id() <= going_away.last_good_id,
                "GOAWAY stream IDs shouldn't be higher; \
                 last_good_id = {:?}, f.last_good_id() = {:?}",
                going_away.last_good_id,
                f.last_good_id(),
            );
        }

        self.sent = Some(GoingAway {
            last_good_id: f.last_good_id(),
            status: f.status(),
        });
    }

    pub fn recv_go_away(&mut self, f: &frame::GoAway) {
        self.received = Some(GoingAway {
            last_good_id: f.last_good_id(),
            status: f.status(),
        });
    }

    pub fn is_going_away(&self) -> bool {
        self.sent.is_some() || self.received.is_some()
    }

    /// Whether a peer stream above what we announced must be ignored.
    pub fn is_past_sent(&self, id: StreamId) -> bool {
        self.sent
            .as_ref()
            .map(|g| id > g.last_good_id)
            .unwrap_or(false)
    }

    pub fn received_status(&self) -> Option<GoAwayStatus> {
        self.received.as_ref().map(|g| g.status)
    }
}
