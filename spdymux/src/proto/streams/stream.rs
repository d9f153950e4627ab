use bytes::Bytes;
use std::collections::VecDeque;

use super::flow_control::FlowControl;
use super::state::State;
use crate::frame::{Priority, StreamId};
use crate::proto::WindowSize;

#[derive(Debug)]
pub(crate) struct Stream {
    pub id: StreamId,

    pub state: State,

    pub priority: Priority,

    /// Set when counted towards the concurrency limit of its initiator.
    pub is_counted: bool,

    pub send_flow: FlowControl,

    pub recv_flow: FlowControl,

    /// Application data not yet handed to the scheduler, waiting for credit
    /// or transmit room.
    pub pending_send: VecDeque<Bytes>,

    /// The last queued chunk carries FIN.
    pub pending_fin: bool,
}

impl Stream {
    pub fn new(
        id: StreamId,
        priority: Priority,
        init_send_window: WindowSize,
        init_recv_window: WindowSize,
        flow_control: bool,
    ) -> Stream {
        let (send_flow, recv_flow) = if flow_control {
            (
                FlowControl::new(init_send_window),
                FlowControl::new(init_recv_window),
            )
        } else {
            (FlowControl::disabled(), FlowControl::disabled())
        };

        Stream {
            id,
            state: State::default(),
            priority,
            is_counted: false,
            send_flow,
            recv_flow,
            pending_send: VecDeque::new(),
            pending_fin: false,
        }
    }

    /// Whether the application may still queue DATA.
    pub fn can_queue_data(&self) -> bool {
        !self.pending_fin && self.state.is_send_streaming()
    }
}
