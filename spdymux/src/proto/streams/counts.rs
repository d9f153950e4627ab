use std::usize;

use super::stream::Stream;
use crate::frame::{self, StreamId};
use crate::proto::Role;

#[derive(Debug)]
pub(super) struct Counts {
    role: Role,
    max_send_streams: usize,
    num_send_streams: usize,
    max_recv_streams: usize,
    num_recv_streams: usize,
}

impl Counts {
    pub fn new(role: Role, max_recv_streams: Option<u32>) -> Self {
        Counts {
            role,
            max_send_streams: usize::MAX,
            num_send_streams: 0,
            max_recv_streams: max_recv_streams.map(|max| max as usize).unwrap_or(usize::MAX),
            num_recv_streams: 0,
        }
    }

    pub fn num_active_streams(&self) -> usize {
        self.num_send_streams + self.num_recv_streams
    }

    pub fn can_inc_num_recv_streams(&self) -> bool {
        self.max_recv_streams > self.num_recv_streams
    }

    pub fn inc_num_recv_streams(&mut self, stream: &mut Stream) {
        assert!(self.can_inc_num_recv_streams());
        assert!(!stream.is_counted);

        self.num_recv_streams += 1;
        stream.is_counted = true;
    }

    pub fn can_inc_num_send_streams(&self) -> bool {
        self.max_send_streams > self.num_send_streams
    }

    pub fn inc_num_send_streams(&mut self, stream: &mut Stream) {
        assert!(self.can_inc_num_send_streams());
        assert!(!stream.is_counted);

        self.num_send_streams += 1;
        stream.is_counted = true;
    }

    /// The peer's MAX_CONCURRENT_STREAMS bounds the streams we open. Streams
    /// already open above a lowered limit are left alone.
    pub fn apply_remote_settings(&mut self, settings: &frame::Settings) {
        if let Some(val) = settings.max_concurrent_streams() {
            tracing::trace!("max_send_streams; {} => {}", self.max_send_streams, val);
            self.max_send_streams = val as usize;
        }
    }

    pub fn dec_num_streams(&mut self, stream: &mut Stream) {
        if !stream.is_counted {
            return;
        }

        tracing::trace!("dec_num_streams; stream={:?}", stream.id);
        if self.is_local(stream.id) {
            assert!(self.num_send_streams > 0);
            self.num_send_streams -= 1;
        } else {
            assert!(self.num_recv_streams > 0);
            self.num_recv_streams -= 1;
        }
        stream.is_counted = false;
    }

    fn is_local(&self, id: StreamId) -> bool {
        self.role.is_local_init(id)
    }
}
