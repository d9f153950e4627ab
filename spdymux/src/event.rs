use bytes::Bytes;

use crate::error::Error;
use crate::frame::{GoAwayStatus, HeaderBlock, Priority, Reason, Settings, StreamId};

/// Notifications handed to the application by
/// [`Session::poll_event`](crate::Session::poll_event).
#[derive(Debug)]
pub enum Event {
    /// The peer opened a stream.
    Incoming {
        stream_id: StreamId,
        priority: Priority,
        /// Zero unless the peer associated the stream with another one.
        associated_id: StreamId,
        headers: HeaderBlock,
        fin: bool,
    },

    /// SYN_REPLY or HEADERS arrived on a stream.
    Headers {
        stream_id: StreamId,
        headers: HeaderBlock,
        fin: bool,
    },

    Data {
        stream_id: StreamId,
        data: Bytes,
        fin: bool,
    },

    /// Sent exactly once for every stream the application saw.
    StreamClosed {
        stream_id: StreamId,
        reason: CloseReason,
    },

    GoAway {
        last_good_id: StreamId,
        status: GoAwayStatus,
    },

    /// A stream queued by
    /// [`Session::request_stream`](crate::Session::request_stream) got a
    /// concurrency slot and its SYN_STREAM is scheduled.
    StreamOpened {
        request: OpenRequest,
        stream_id: StreamId,
    },

    /// A queued stream open will never happen: the session is going away
    /// or closed.
    OpenAborted { request: OpenRequest },

    /// Writes queued on the stream while it was blocked have all been
    /// scheduled; more may be sent.
    SendReady { stream_id: StreamId },

    /// Echo of a PING we sent.
    Pong { id: u32 },

    /// SETTINGS received from the peer, after they were applied.
    Settings(Settings),

    /// Last event of a session. `error` is set when it ended abnormally.
    Closed { error: Option<Error> },
}

/// Handle for a stream open waiting on the peer's concurrency limit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct OpenRequest(pub(crate) u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Both sides sent FIN.
    Finished,
    /// The peer reset the stream.
    Reset(Reason),
    /// We reset the stream.
    LocalReset(Reason),
    /// The peer refused the stream.
    Refused,
    /// The session went away before the stream completed.
    Aborted,
}
