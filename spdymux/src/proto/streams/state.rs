use crate::frame::Reason;

use self::Inner::*;
use self::Peer::*;

/// Represents the state of a stream.
///
/// ```not_rust
///                           +--------+
///              send SYN    |        |    recv SYN
///             ,------------|  idle  |------------.
///            /             |        |             \
///           v              +--------+              v
///    +----------+              |              +----------+
///    |          |              | send SYN /   |          |
///    |   half   |              | recv SYN     |   half   |
///    |  closed  |              |   (fin)      |  closed  |
///    | (remote) |              v              |  (local) |
///    |          |          +--------+         |          |
///    +----------+          |        |         +----------+
///         |    <-----------|  open  |----------->   |
///         |     recv FIN   |        |  send FIN     |
///         |                +--------+               |
///         |                    |                    |
///         | send FIN /         | send RST /         | recv FIN /
///         | send RST /         | recv RST           | send RST /
///         | recv RST           v                    | recv RST
///         |                +--------+               |
///         `--------------->|        |<--------------'
///                          | closed |
///                          |        |
///                          +--------+
/// ```
///
/// Within the open and half-closed states each direction also remembers
/// whether its SYN_REPLY is still outstanding: headers and data may only flow
/// in a direction once the stream has been accepted for it.
#[derive(Debug, Clone, Copy)]
pub struct State {
    inner: Inner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inner {
    Idle,
    Open { local: Peer, remote: Peer },
    // the remote side's progress
    HalfClosedLocal(Peer),
    // the local side's progress
    HalfClosedRemote(Peer),
    Closed(Cause),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Peer {
    AwaitingReply,
    Streaming,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cause {
    EndStream,
    LocalReset(Reason),
    RemoteReset(Reason),
}

/// Public view of a stream's lifecycle position.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Open,
    HalfClosedLocal,
    HalfClosedRemote,
    Closed,
}

/// Everything that can move a stream between states.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    SendSyn { fin: bool, unidirectional: bool },
    RecvSyn { fin: bool, unidirectional: bool },
    SendReply { fin: bool },
    RecvReply { fin: bool },
    SendHeaders { fin: bool },
    RecvHeaders { fin: bool },
    SendData { fin: bool },
    RecvData { fin: bool },
    SendReset(Reason),
    RecvReset(Reason),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{event:?} is not valid in state {state:?}")]
pub struct InvalidTransition {
    pub event: StreamEvent,
    pub state: StreamState,
}

impl State {
    pub fn apply(&mut self, event: StreamEvent) -> Result<(), InvalidTransition> {
        let next = match (self.inner, event) {
            (Closed(..), _) => None,

            (Idle, StreamEvent::SendSyn { fin, unidirectional }) => Some(match (fin, unidirectional) {
                (true, true) => Closed(Cause::EndStream),
                (true, false) => HalfClosedLocal(AwaitingReply),
                (false, true) => HalfClosedRemote(Streaming),
                (false, false) => Open {
                    local: Streaming,
                    remote: AwaitingReply,
                },
            }),
            (Idle, StreamEvent::RecvSyn { fin, unidirectional }) => Some(match (fin, unidirectional) {
                (true, true) => Closed(Cause::EndStream),
                (true, false) => HalfClosedRemote(AwaitingReply),
                (false, true) => HalfClosedLocal(Streaming),
                (false, false) => Open {
                    local: AwaitingReply,
                    remote: Streaming,
                },
            }),

            (state, StreamEvent::SendReply { fin }) => self.send(state, AwaitingReply, fin),
            (state, StreamEvent::RecvReply { fin }) => self.recv(state, AwaitingReply, fin),
            (state, StreamEvent::SendHeaders { fin }) | (state, StreamEvent::SendData { fin }) => {
                self.send(state, Streaming, fin)
            }
            (state, StreamEvent::RecvHeaders { fin }) | (state, StreamEvent::RecvData { fin }) => {
                self.recv(state, Streaming, fin)
            }

            (_, StreamEvent::SendReset(reason)) => Some(Closed(Cause::LocalReset(reason))),
            (_, StreamEvent::RecvReset(reason)) => Some(Closed(Cause::RemoteReset(reason))),

            _ => None,
        };

        match next {
            Some(inner) => {
                tracing::trace!("transition; {:?} => {:?} on {:?}", self.inner, inner, event);
                self.inner = inner;
                Ok(())
            }
            None => Err(InvalidTransition {
                event,
                state: self.public(),
            }),
        }
    }

    // local side moves; it must currently be in `expect`
    fn send(&self, state: Inner, expect: Peer, fin: bool) -> Option<Inner> {
        match state {
            Open { local, remote } if local == expect => Some(if fin {
                HalfClosedLocal(remote)
            } else {
                Open {
                    local: Streaming,
                    remote,
                }
            }),
            HalfClosedRemote(local) if local == expect => Some(if fin {
                Closed(Cause::EndStream)
            } else {
                HalfClosedRemote(Streaming)
            }),
            _ => None,
        }
    }

    // remote side moves; it must currently be in `expect`
    fn recv(&self, state: Inner, expect: Peer, fin: bool) -> Option<Inner> {
        match state {
            Open { local, remote } if remote == expect => Some(if fin {
                HalfClosedRemote(local)
            } else {
                Open {
                    local,
                    remote: Streaming,
                }
            }),
            HalfClosedLocal(remote) if remote == expect => Some(if fin {
                Closed(Cause::EndStream)
            } else {
                HalfClosedLocal(Streaming)
            }),
            _ => None,
        }
    }

    pub fn public(&self) -> StreamState {
        match self.inner {
            Idle => StreamState::Idle,
            Open { .. } => StreamState::Open,
            HalfClosedLocal(..) => StreamState::HalfClosedLocal,
            HalfClosedRemote(..) => StreamState::HalfClosedRemote,
            Closed(..) => StreamState::Closed,
        }
    }

    pub fn cause(&self) -> Option<Cause> {
        match self.inner {
            Closed(cause) => Some(cause),
            _ => None,
        }
    }

    /// Whether DATA may be sent right now.
    pub fn is_send_streaming(&self) -> bool {
        matches!(
            self.inner,
            Open {
                local: Streaming,
                ..
            } | HalfClosedRemote(Streaming)
        )
    }

    /// Whether the peer may still send anything on this stream.
    pub fn is_recv_open(&self) -> bool {
        matches!(self.inner, Open { .. } | HalfClosedLocal(..))
    }
}

impl Default for State {
    fn default() -> State {
        State { inner: Inner::Idle }
    }
}
