mod error;
mod go_away;
mod peer;
mod ping_pong;
pub(crate) mod streams;

pub(crate) use self::error::Error;
pub(crate) use self::go_away::GoAway;
pub use self::peer::Role;
pub(crate) use self::ping_pong::{PingPong, ReceivedPing};
pub use self::streams::StreamState;

use crate::frame::HEADER_LEN;

pub type WindowSize = u32;

pub const MAX_WINDOW_SIZE: WindowSize = (1 << 31) - 1;
pub const DEFAULT_INITIAL_WINDOW_SIZE: WindowSize = 64 * 1_024;

/// Largest DATA payload handed to the scheduler at once: two TCP segments of
/// 1430 bytes minus the frame header.
pub const DEFAULT_MAX_SEND_CHUNK: usize = 2 * 1430 - HEADER_LEN;
pub const DEFAULT_MAX_SEND_BUFFER_SIZE: usize = 256 * 1_024;
