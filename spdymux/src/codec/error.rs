use std::fmt;

use crate::frame::{Reason, StreamId};
use crate::proto;

/// Outcome of dispatching one received frame that was not accepted.
#[derive(Debug)]
pub(crate) enum RecvError {
    /// Tears the whole session down.
    Connection(proto::Error),
    /// Resets one stream; the session carries on.
    Stream { id: StreamId, reason: Reason },
}

/// Misuse of the session API by the local application. The session itself is
/// unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UserError {
    #[error("inactive stream")]
    InactiveStreamId,

    #[error("unexpected frame type")]
    UnexpectedFrameType,

    #[error("stream ID overflowed")]
    OverflowedStreamId,

    #[error("concurrent stream limit reached")]
    ConcurrencyLimit,

    #[error("header block too large for a frame")]
    PayloadTooLarge,

    #[error("session is going away")]
    GoingAway,

    #[error("session closed")]
    SessionClosed,
}

impl From<proto::Error> for RecvError {
    fn from(src: proto::Error) -> RecvError {
        RecvError::Connection(src)
    }
}

impl fmt::Display for RecvError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        use self::RecvError::*;

        match *self {
            Connection(ref err) => fmt::Display::fmt(err, fmt),
            Stream { ref reason, .. } => fmt::Display::fmt(reason, fmt),
        }
    }
}
