mod counts;
mod flow_control;
mod open_queue;
mod prioritize;
mod state;
mod store;
mod stream;
mod table;

pub use self::state::StreamState;
pub(crate) use self::flow_control::{reserve, FlowControl, Reservation};
pub(crate) use self::open_queue::OpenQueue;
pub(crate) use self::prioritize::Prioritize;
pub(crate) use self::state::{Cause, StreamEvent};
pub(crate) use self::table::{StreamTable, TableError};

use crate::proto::{Role, WindowSize};

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub role: Role,
    /// Windows are only enforced when the version has flow control.
    pub flow_control: bool,
    pub init_send_window: WindowSize,
    pub init_recv_window: WindowSize,
    /// Peer streams allowed at once; `None` is unlimited.
    pub max_recv_streams: Option<u32>,
}
