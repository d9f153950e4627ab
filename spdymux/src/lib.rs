//! SPDY/2 and SPDY/3 framing with a stream-multiplexing session on top.
//!
//! The core of the crate is [`Session`], a sans-IO state machine: feed it
//! transport bytes with [`Session::on_bytes`], pull the bytes it wants written
//! with [`Session::poll_transmit`] and pull application-facing notifications
//! with [`Session::poll_event`]. [`Connection`] drives a session over any
//! `AsyncRead + AsyncWrite` transport and yields the same events as a
//! `Stream`.
//!
//! Header blocks travel uncompressed. Compression, TLS, server push and HTTP
//! semantics are left to the layers above.

macro_rules! proto_err {
    (conn: $($msg:tt)+) => {
        tracing::debug!("connection error PROTOCOL_ERROR -- {};", format_args!($($msg)+))
    };
    (stream: $($msg:tt)+) => {
        tracing::debug!("stream error PROTOCOL_ERROR -- {};", format_args!($($msg)+))
    };
}

macro_rules! ready {
    ($e:expr) => {
        match $e {
            ::std::task::Poll::Ready(r) => r,
            ::std::task::Poll::Pending => return ::std::task::Poll::Pending,
        }
    };
}

mod builder;
pub mod codec;
mod connection;
mod error;
mod event;
pub mod frame;
mod proto;
mod session;

pub use crate::builder::{Builder, Config, ConfigError};
pub use crate::codec::UserError;
pub use crate::connection::Connection;
pub use crate::error::Error;
pub use crate::event::{CloseReason, Event, OpenRequest};
pub use crate::frame::{GoAwayStatus, HeaderBlock, Priority, Reason, StreamId, Version};
pub use crate::proto::{Role, StreamState, WindowSize};
pub use crate::session::{Opening, Session, WriteStatus};
