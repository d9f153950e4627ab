use super::counts::Counts;
use super::state::{Cause, InvalidTransition, StreamEvent, StreamState};
use super::store::Store;
use super::stream::Stream;
use super::Config;
use crate::frame::{Priority, StreamId, StreamIdOverflow};
use crate::proto::{Role, WindowSize};

/// Owns every live stream of a session and enforces id allocation, parity,
/// monotonicity and the concurrency limits.
#[derive(Debug)]
pub(crate) struct StreamTable {
    role: Role,
    store: Store,
    counts: Counts,
    next_local_id: Result<StreamId, StreamIdOverflow>,
    last_remote_id: StreamId,
    init_send_window: WindowSize,
    init_recv_window: WindowSize,
    flow_control: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum TableError {
    #[error("stream {0} is already open")]
    DuplicateId(StreamId),

    #[error("stream {0} has the wrong parity for its initiator")]
    BadParity(StreamId),

    #[error("stream {0} is not above the last peer stream")]
    NotIncreasing(StreamId),

    #[error("unknown stream {0}")]
    UnknownStream(StreamId),

    #[error("concurrent stream limit reached")]
    Refused,

    #[error(transparent)]
    InvalidTransition(InvalidTransition),

    #[error("stream ids exhausted")]
    IdsExhausted,
}

impl StreamTable {
    pub fn new(config: Config) -> StreamTable {
        StreamTable {
            role: config.role,
            store: Store::new(),
            counts: Counts::new(config.role, config.max_recv_streams),
            next_local_id: Ok(config.role.first_stream_id()),
            last_remote_id: StreamId::ZERO,
            init_send_window: config.init_send_window,
            init_recv_window: config.init_recv_window,
            flow_control: config.flow_control,
        }
    }

    /// Allocates the next local id and stores an idle stream under it.
    pub fn open_local(&mut self, priority: Priority) -> Result<StreamId, TableError> {
        let id = self.next_local_id.map_err(|_| TableError::IdsExhausted)?;

        if !self.counts.can_inc_num_send_streams() {
            return Err(TableError::Refused);
        }

        self.next_local_id = id.next_id();

        let stream = self.new_stream(id, priority);
        let stream = self.store.insert(stream);
        self.counts.inc_num_send_streams(stream);
        Ok(id)
    }

    /// Whether the peer's concurrency limit leaves room for another local
    /// stream.
    pub fn can_open_local(&self) -> bool {
        self.counts.can_inc_num_send_streams()
    }

    /// Stores an idle stream for a peer SYN_STREAM.
    pub fn open(&mut self, id: StreamId, priority: Priority) -> Result<(), TableError> {
        if !self.role.ensure_can_open(id) {
            return Err(TableError::BadParity(id));
        }

        if self.store.contains(&id) {
            return Err(TableError::DuplicateId(id));
        }

        if id <= self.last_remote_id {
            return Err(TableError::NotIncreasing(id));
        }
        self.last_remote_id = id;

        if !self.counts.can_inc_num_recv_streams() {
            return Err(TableError::Refused);
        }

        let stream = self.new_stream(id, priority);
        let stream = self.store.insert(stream);
        self.counts.inc_num_recv_streams(stream);
        Ok(())
    }

    fn new_stream(&self, id: StreamId, priority: Priority) -> Stream {
        tracing::trace!(?id, ?priority, "new stream");
        Stream::new(
            id,
            priority,
            self.init_send_window,
            self.init_recv_window,
            self.flow_control,
        )
    }

    pub fn lookup(&self, id: StreamId) -> Result<&Stream, TableError> {
        self.store.find(&id).ok_or(TableError::UnknownStream(id))
    }

    pub fn lookup_mut(&mut self, id: StreamId) -> Result<&mut Stream, TableError> {
        self.store.find_mut(&id).ok_or(TableError::UnknownStream(id))
    }

    /// Applies `event` to the stream. A stream that ends up closed is removed
    /// and its cause returned alongside the new state.
    pub fn transition(
        &mut self,
        id: StreamId,
        event: StreamEvent,
    ) -> Result<(StreamState, Option<Cause>), TableError> {
        let stream = self.lookup_mut(id)?;
        stream
            .state
            .apply(event)
            .map_err(TableError::InvalidTransition)?;

        let state = stream.state.public();
        let cause = stream.state.cause();

        if cause.is_some() {
            self.close(id);
        }

        Ok((state, cause))
    }

    /// Removes the stream, releasing its concurrency slot.
    pub fn close(&mut self, id: StreamId) -> Option<Stream> {
        let mut stream = self.store.remove(&id)?;
        self.counts.dec_num_streams(&mut stream);
        tracing::trace!(?id, remaining = self.store.len(), "stream removed");
        Some(stream)
    }

    pub fn contains(&self, id: StreamId) -> bool {
        self.store.contains(&id)
    }

    /// Live ids, oldest first.
    pub fn ids(&self) -> Vec<StreamId> {
        self.store.ids()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn num_active_streams(&self) -> usize {
        self.counts.num_active_streams()
    }

    pub fn last_remote_id(&self) -> StreamId {
        self.last_remote_id
    }

    pub fn is_local(&self, id: StreamId) -> bool {
        self.role.is_local_init(id)
    }

    pub fn apply_remote_settings(&mut self, settings: &crate::frame::Settings) {
        self.counts.apply_remote_settings(settings);

        if let Some(new) = settings.initial_window_size() {
            self.apply_initial_window(new);
        }
    }

    /// Moves every stream's send window by the change in the peer's initial
    /// window size; streams opened later start from `new`.
    pub fn apply_initial_window(&mut self, new: WindowSize) {
        let old = self.init_send_window;
        self.init_send_window = new;

        if old == new {
            return;
        }

        for stream in self.store.iter_mut() {
            stream.send_flow.apply_initial_delta(old, new);
        }
    }
}
