use bytes::Bytes;
use std::collections::VecDeque;
use std::{cmp, io};

use crate::builder::Config;
use crate::codec::{FramedRead, FramedWrite, RecvError, UserError};
use crate::error::Error;
use crate::event::{CloseReason, Event, OpenRequest};
use crate::frame::{
    self, Control, Data, Frame, GoAwayStatus, HeaderBlock, Priority, Reason, StreamId, SynReply,
    SynStream, Version,
};
use crate::proto::streams::{
    self, reserve, Cause, FlowControl, OpenQueue, Prioritize, Reservation, StreamEvent,
    StreamTable, TableError,
};
use crate::proto::{
    self, GoAway, PingPong, ReceivedPing, Role, StreamState, WindowSize,
    DEFAULT_INITIAL_WINDOW_SIZE, MAX_WINDOW_SIZE,
};

/// A SPDY session over one transport connection.
///
/// The session performs no I/O. Bytes read from the transport go into
/// [`on_bytes`](Session::on_bytes); bytes to write come out of
/// [`poll_transmit`](Session::poll_transmit); everything the application
/// needs to know comes out of [`poll_event`](Session::poll_event).
#[derive(Debug)]
pub struct Session {
    role: Role,
    version: Version,
    state: State,

    read: FramedRead,
    write: FramedWrite,

    streams: StreamTable,
    prioritize: Prioritize,
    /// Local opens waiting for the peer's concurrency limit.
    opens: OpenQueue,

    /// Session-wide credit for DATA we send.
    send_flow: FlowControl,
    /// Session-wide credit for DATA we receive.
    recv_flow: FlowControl,

    go_away: GoAway,
    ping_pong: PingPong,

    events: VecDeque<Event>,
    /// Streams with writes waiting for credit or buffer room.
    blocked: VecDeque<StreamId>,

    max_send_chunk: usize,
    max_send_buffer_size: usize,

    span: tracing::Span,
}

/// Outcome of [`Session::send_data`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    /// Everything was scheduled for transmission.
    Queued,
    /// Some bytes wait for flow-control credit or transmit room.
    /// [`Event::SendReady`] follows once they are scheduled.
    Pending,
}

/// Outcome of [`Session::request_stream`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Opening {
    Opened(StreamId),
    /// Opens once a slot frees up, announced by [`Event::StreamOpened`].
    Queued(OpenRequest),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    Open,
    Closed,
}

impl Session {
    /// Creates a session. Values [`Config::validate`] would reject are
    /// clamped into range.
    pub fn new(role: Role, config: &Config) -> Session {
        let version = config.version;
        let flow_control = version.has_flow_control();

        if let Err(err) = config.validate() {
            tracing::warn!(%err, "clamping session config");
        }
        let init_recv_window = cmp::min(config.initial_window_size, MAX_WINDOW_SIZE);

        let streams = StreamTable::new(streams::Config {
            role,
            flow_control,
            init_send_window: DEFAULT_INITIAL_WINDOW_SIZE,
            init_recv_window,
            max_recv_streams: config.max_concurrent_streams,
        });

        // the peer starts from the default, so a smaller window can't be
        // announced
        let session_window = cmp::max(
            cmp::min(config.initial_session_window_size, MAX_WINDOW_SIZE),
            DEFAULT_INITIAL_WINDOW_SIZE,
        );
        let (send_flow, recv_flow) = if flow_control {
            (
                FlowControl::new(DEFAULT_INITIAL_WINDOW_SIZE),
                FlowControl::new(session_window),
            )
        } else {
            (FlowControl::disabled(), FlowControl::disabled())
        };

        let mut session = Session {
            role,
            version,
            state: State::Open,
            read: FramedRead::with_max_frame_size(config.max_frame_size),
            write: FramedWrite::new(),
            streams,
            prioritize: Prioritize::new(),
            opens: OpenQueue::new(),
            send_flow,
            recv_flow,
            go_away: GoAway::new(),
            ping_pong: PingPong::new(role),
            events: VecDeque::new(),
            blocked: VecDeque::new(),
            max_send_chunk: cmp::max(config.max_send_chunk, 1),
            max_send_buffer_size: cmp::max(config.max_send_buffer_size, 1),
            span: tracing::debug_span!("Session", %role, %version),
        };

        let mut settings = frame::Settings::new();
        settings.set_max_concurrent_streams(config.max_concurrent_streams);
        if flow_control && init_recv_window != DEFAULT_INITIAL_WINDOW_SIZE {
            settings.set_initial_window_size(Some(init_recv_window));
        }
        if !settings.is_empty() {
            session.queue_urgent(settings);
        }

        if flow_control && session_window > DEFAULT_INITIAL_WINDOW_SIZE {
            let delta = session_window - DEFAULT_INITIAL_WINDOW_SIZE;
            session.queue_urgent(frame::WindowUpdate::new(StreamId::ZERO, delta));
        }

        session
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn version(&self) -> Version {
        self.version
    }

    // ===== transport side =====

    /// Feeds bytes read from the transport. Partial frames are kept until the
    /// rest arrives.
    ///
    /// A session-fatal error queues a GOAWAY, closes the session and is
    /// returned; the same error is also delivered in [`Event::Closed`].
    pub fn on_bytes(&mut self, src: &[u8]) -> Result<(), Error> {
        let span = self.span.clone();
        let _e = span.enter();

        if self.is_closed() {
            tracing::trace!(len = src.len(), "session closed; discarding input");
            return Ok(());
        }

        self.read.extend(src);

        while !self.is_closed() {
            let frame = match self.read.decode_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(err) if !err.is_fatal() => {
                    tracing::warn!(%err, "ignoring frame");
                    continue;
                }
                Err(err) => return Err(self.fatal(err.into())),
            };

            match self.recv_frame(frame) {
                Ok(()) => {}
                Err(RecvError::Stream { id, reason }) => self.reset_local(id, reason),
                Err(RecvError::Connection(err)) => return Err(self.fatal(err)),
            }
        }

        self.resume_blocked();
        Ok(())
    }

    /// The transport reached end of file.
    pub fn on_eof(&mut self) {
        let span = self.span.clone();
        let _e = span.enter();

        if self.is_closed() {
            return;
        }

        let error = if self.streams.is_empty() && self.read.buffered() == 0 {
            None
        } else {
            Some(Error::from_io(io::ErrorKind::UnexpectedEof.into()))
        };
        tracing::debug!(?error, "transport closed");

        self.prioritize.clear_streams();
        self.abort_all();
        self.state = State::Closed;
        self.events.push_back(Event::Closed { error });
    }

    /// Next buffer to write to the transport, in order.
    pub fn poll_transmit(&mut self) -> Option<Bytes> {
        let span = self.span.clone();
        let _e = span.enter();

        self.resume_blocked();

        while self.write.has_capacity() {
            match self.prioritize.next() {
                Some(frame) => self.write.buffer(frame),
                None => break,
            }
        }

        self.write.take_chunk(usize::MAX)
    }

    pub fn has_pending_transmit(&self) -> bool {
        !self.write.is_empty() || !self.prioritize.is_empty()
    }

    pub fn wants_read(&self) -> bool {
        self.state == State::Open
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    // ===== application side =====

    pub fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Opens a stream with a SYN_STREAM. A tier the version can't express is
    /// clamped to the lowest priority. Fails with
    /// [`UserError::ConcurrencyLimit`] when the peer's limit is reached; see
    /// [`request_stream`](Session::request_stream) for waiting instead.
    pub fn open_stream(
        &mut self,
        priority: Priority,
        headers: HeaderBlock,
        fin: bool,
    ) -> Result<StreamId, Error> {
        self.ensure_can_open()?;
        self.ensure_fits(&headers, SynStream::BLOCK_OFFSET)?;

        let priority = cmp::min(priority, self.version.lowest_priority());
        Ok(self.start_stream(priority, headers, fin)?)
    }

    /// Like [`open_stream`](Session::open_stream), but at the peer's
    /// concurrency limit the open waits in a per-priority queue. Waiting
    /// opens are served highest priority first as streams close, and fail
    /// with [`Event::OpenAborted`] when the session goes away.
    pub fn request_stream(
        &mut self,
        priority: Priority,
        headers: HeaderBlock,
        fin: bool,
    ) -> Result<Opening, Error> {
        self.ensure_can_open()?;
        self.ensure_fits(&headers, SynStream::BLOCK_OFFSET)?;

        let priority = cmp::min(priority, self.version.lowest_priority());
        if self.streams.can_open_local() {
            return Ok(Opening::Opened(self.start_stream(priority, headers, fin)?));
        }

        let request = self.opens.push(priority, headers, fin);
        tracing::debug!(?request, ?priority, "stream open queued");
        Ok(Opening::Queued(request))
    }

    /// Withdraws a queued open. Returns false when it already opened or was
    /// aborted.
    pub fn cancel_request(&mut self, request: OpenRequest) -> bool {
        self.opens.cancel(request)
    }

    /// Accepts a peer stream with a SYN_REPLY.
    pub fn send_reply(
        &mut self,
        id: StreamId,
        headers: HeaderBlock,
        fin: bool,
    ) -> Result<(), Error> {
        self.ensure_open()?;
        self.ensure_fits(&headers, SynReply::block_offset(self.version))?;

        let priority = self.user_lookup(id)?;
        let mut frame = SynReply::new(id, headers);
        frame.set_fin(fin);

        let cause = self.user_transition(id, StreamEvent::SendReply { fin })?;
        self.queue_stream(id, priority, frame);
        self.stream_closed(id, cause);
        Ok(())
    }

    pub fn send_headers(
        &mut self,
        id: StreamId,
        headers: HeaderBlock,
        fin: bool,
    ) -> Result<(), Error> {
        self.ensure_open()?;
        self.ensure_fits(&headers, SynReply::block_offset(self.version))?;

        let priority = self.user_lookup(id)?;
        let mut frame = frame::Headers::new(id, headers);
        frame.set_fin(fin);

        let cause = self.user_transition(id, StreamEvent::SendHeaders { fin })?;
        self.queue_stream(id, priority, frame);
        self.stream_closed(id, cause);
        Ok(())
    }

    /// Queues `data` on the stream, split into frames of at most
    /// `max_send_chunk` bytes. What the windows or the transmit buffer can't
    /// take yet stays queued on the stream; nothing is dropped.
    pub fn send_data(&mut self, id: StreamId, data: Bytes, fin: bool) -> Result<WriteStatus, Error> {
        self.ensure_open()?;

        let stream = self
            .streams
            .lookup_mut(id)
            .map_err(|_| UserError::InactiveStreamId)?;

        if !stream.can_queue_data() {
            return Err(UserError::UnexpectedFrameType.into());
        }

        if data.is_empty() && !fin {
            return Ok(WriteStatus::Queued);
        }

        tracing::trace!(?id, len = data.len(), fin, "send_data");
        stream.pending_send.push_back(data);
        stream.pending_fin = fin;

        if self.blocked.contains(&id) {
            return Ok(WriteStatus::Pending);
        }

        if self.flush_stream(id) {
            Ok(WriteStatus::Queued)
        } else {
            self.blocked.push_back(id);
            Ok(WriteStatus::Pending)
        }
    }

    /// Resets a stream with RST_STREAM. Its unsent frames are dropped.
    pub fn reset_stream(&mut self, id: StreamId, reason: Reason) -> Result<(), Error> {
        self.ensure_open()?;

        if !self.streams.contains(id) {
            return Err(UserError::InactiveStreamId.into());
        }

        self.reset_local(id, reason);
        Ok(())
    }

    /// Sends a PING and returns its id; the echo arrives as [`Event::Pong`].
    pub fn ping(&mut self) -> Result<u32, Error> {
        self.ensure_open()?;

        let ping = self.ping_pong.send_ping();
        let id = ping.id();
        self.queue_urgent(ping);
        Ok(id)
    }

    /// Starts a graceful shutdown. Streams already open run to completion;
    /// new peer streams are ignored and new local streams refused. The
    /// session closes once the last stream ends.
    pub fn go_away(&mut self, status: GoAwayStatus) -> Result<(), Error> {
        self.ensure_open()?;

        self.send_go_away(status);
        self.maybe_close_idle();
        Ok(())
    }

    /// Closes the session at once. Every stream ends with `Aborted` and the
    /// GOAWAY is left in the transmit buffer.
    pub fn close(&mut self, status: GoAwayStatus) {
        let span = self.span.clone();
        let _e = span.enter();

        if self.is_closed() {
            return;
        }

        tracing::debug!(%status, "closing session");
        self.prioritize.clear_streams();
        self.send_go_away(status);
        self.abort_all();
        self.state = State::Closed;
        self.events.push_back(Event::Closed { error: None });
    }

    pub fn stream_state(&self, id: StreamId) -> Option<StreamState> {
        self.streams.lookup(id).ok().map(|stream| stream.state.public())
    }

    pub fn num_active_streams(&self) -> usize {
        self.streams.num_active_streams()
    }

    /// Opens queued by [`request_stream`](Session::request_stream).
    pub fn num_pending_opens(&self) -> usize {
        self.opens.len()
    }

    /// PINGs sent and not yet echoed.
    pub fn pings_in_flight(&self) -> usize {
        self.ping_pong.in_flight()
    }

    /// Bytes that may be sent on the stream right now, bounded by both the
    /// stream and the session window.
    pub fn send_capacity(&self, id: StreamId) -> Option<WindowSize> {
        let stream = self.streams.lookup(id).ok()?;
        Some(cmp::min(
            stream.send_flow.available(),
            self.send_flow.available(),
        ))
    }

    /// Whether the peer announced a GOAWAY, or we did.
    pub fn is_going_away(&self) -> bool {
        self.go_away.is_going_away()
    }

    // ===== receive path =====

    fn recv_frame(&mut self, frame: Frame) -> Result<(), RecvError> {
        tracing::trace!(?frame, "recv");

        let (version, body) = match frame {
            Frame::Data(data) => return self.recv_data(data),
            Frame::Control { version, body } => (version, body),
        };

        if version != self.version {
            proto_err!(conn: "control frame version {} on a {} session", version, self.version);
            return Err(proto::Error::from(Reason::UNSUPPORTED_VERSION).into());
        }

        match body {
            Control::SynStream(frame) => self.recv_syn_stream(frame),
            Control::SynReply(frame) => {
                let (id, fin) = (frame.stream_id(), frame.is_fin());
                self.recv_headers(id, frame.into_headers(), StreamEvent::RecvReply { fin })
            }
            Control::Headers(frame) => {
                let (id, fin) = (frame.stream_id(), frame.is_fin());
                self.recv_headers(id, frame.into_headers(), StreamEvent::RecvHeaders { fin })
            }
            Control::Reset(frame) => {
                self.recv_reset(frame);
                Ok(())
            }
            Control::Settings(frame) => self.recv_settings(frame),
            Control::Noop => Ok(()),
            Control::Ping(frame) => self.recv_ping(frame),
            Control::GoAway(frame) => {
                self.recv_go_away(frame);
                Ok(())
            }
            Control::WindowUpdate(frame) => self.recv_window_update(frame),
        }
    }

    fn recv_syn_stream(&mut self, frame: SynStream) -> Result<(), RecvError> {
        let id = frame.stream_id();
        let priority = cmp::min(frame.priority(), self.version.lowest_priority());

        if self.go_away.is_past_sent(id) {
            tracing::debug!(?id, "ignoring SYN_STREAM past our GOAWAY");
            return Ok(());
        }

        match self.streams.open(id, priority) {
            Ok(()) => {}
            Err(TableError::BadParity(id)) => {
                proto_err!(stream: "SYN_STREAM with our parity; stream={:?}", id);
                self.queue_stream(id, priority, frame::Reset::new(id, Reason::PROTOCOL_ERROR));
                return Ok(());
            }
            Err(TableError::Refused) => {
                tracing::debug!(?id, "concurrent stream limit reached; refusing");
                self.queue_stream(id, priority, frame::Reset::new(id, Reason::REFUSED_STREAM));
                return Ok(());
            }
            Err(err) => {
                proto_err!(conn: "{}", err);
                return Err(proto::Error::from(Reason::PROTOCOL_ERROR).into());
            }
        }

        let associated_id = frame.associated_id();
        if !associated_id.is_zero() && !self.streams.contains(associated_id) {
            tracing::warn!(?id, ?associated_id, "SYN_STREAM for an inactive associated stream");
            self.streams.close(id);
            self.queue_stream(id, priority, frame::Reset::new(id, Reason::INVALID_STREAM));
            return Ok(());
        }

        let fin = frame.is_fin();
        let event = StreamEvent::RecvSyn {
            fin,
            unidirectional: frame.is_unidirectional(),
        };
        let cause = self.recv_transition(id, event)?;

        self.events.push_back(Event::Incoming {
            stream_id: id,
            priority,
            associated_id,
            headers: frame.into_headers(),
            fin,
        });
        self.stream_closed(id, cause);
        Ok(())
    }

    fn recv_headers(
        &mut self,
        id: StreamId,
        headers: HeaderBlock,
        event: StreamEvent,
    ) -> Result<(), RecvError> {
        let fin = match event {
            StreamEvent::RecvReply { fin } | StreamEvent::RecvHeaders { fin } => fin,
            _ => false,
        };

        let cause = self.recv_transition(id, event)?;

        self.events.push_back(Event::Headers {
            stream_id: id,
            headers,
            fin,
        });
        self.stream_closed(id, cause);
        Ok(())
    }

    fn recv_data(&mut self, frame: Data) -> Result<(), RecvError> {
        let id = frame.stream_id();
        let fin = frame.is_fin();
        let sz = frame.payload().len() as WindowSize;

        if let Err(reason) = self.recv_flow.recv_data(sz) {
            proto_err!(conn: "DATA exceeds the session window; stream={:?}", id);
            return Err(proto::Error::from(reason).into());
        }

        let stream = match self.streams.lookup_mut(id) {
            Ok(stream) => stream,
            Err(_) => {
                tracing::warn!(?id, "DATA for an unknown stream");
                self.release_session(sz);
                return Err(RecvError::Stream {
                    id,
                    reason: Reason::INVALID_STREAM,
                });
            }
        };

        if let Err(reason) = stream.recv_flow.recv_data(sz) {
            proto_err!(conn: "DATA exceeds the stream window; stream={:?}", id);
            return Err(proto::Error::from(reason).into());
        }

        let cause = match self.recv_transition(id, StreamEvent::RecvData { fin }) {
            Ok(cause) => cause,
            Err(err) => {
                self.release_session(sz);
                return Err(err);
            }
        };

        // data is handed over right away, so the credit comes straight back
        if let Ok(stream) = self.streams.lookup_mut(id) {
            if let Some(inc) = stream.recv_flow.release(sz) {
                let priority = stream.priority;
                if stream.state.is_recv_open() {
                    self.queue_stream(id, priority, frame::WindowUpdate::new(id, inc));
                }
            }
        }
        self.release_session(sz);

        self.events.push_back(Event::Data {
            stream_id: id,
            data: frame.into_payload(),
            fin,
        });
        self.stream_closed(id, cause);
        Ok(())
    }

    fn release_session(&mut self, sz: WindowSize) {
        if let Some(inc) = self.recv_flow.release(sz) {
            self.queue_urgent(frame::WindowUpdate::new(StreamId::ZERO, inc));
        }
    }

    fn recv_reset(&mut self, frame: frame::Reset) {
        let id = frame.stream_id();
        let reason = frame.reason();

        if !self.streams.contains(id) {
            tracing::warn!(?id, ?reason, "RST_STREAM for an unknown stream");
            return;
        }

        self.cancel_queued(id);
        // a reset from any live state closes the stream
        let cause = self
            .streams
            .transition(id, StreamEvent::RecvReset(reason))
            .ok()
            .and_then(|(_, cause)| cause);
        self.stream_closed(id, cause);
    }

    fn recv_settings(&mut self, frame: frame::Settings) -> Result<(), RecvError> {
        if let Some(size) = frame.initial_window_size() {
            if self.version.has_flow_control() && size > MAX_WINDOW_SIZE {
                proto_err!(conn: "INITIAL_WINDOW_SIZE {} too large", size);
                return Err(proto::Error::from(Reason::FLOW_CONTROL_ERROR).into());
            }
        }

        self.streams.apply_remote_settings(&frame);
        self.events.push_back(Event::Settings(frame));
        self.open_queued();
        Ok(())
    }

    fn recv_ping(&mut self, frame: frame::Ping) -> Result<(), RecvError> {
        match self.ping_pong.recv_ping(frame) {
            ReceivedPing::MustAck(ping) => {
                self.queue_urgent(ping);
                Ok(())
            }
            ReceivedPing::Pong(id) => {
                self.events.push_back(Event::Pong { id });
                Ok(())
            }
            ReceivedPing::Unexpected(id) => {
                proto_err!(conn: "PING echo {} with nothing in flight", id);
                Err(proto::Error::from(Reason::PROTOCOL_ERROR).into())
            }
        }
    }

    fn recv_go_away(&mut self, frame: frame::GoAway) {
        let last_good_id = frame.last_good_id();
        tracing::debug!(?last_good_id, status = %frame.status(), "received GOAWAY");

        self.go_away.recv_go_away(&frame);
        self.events.push_back(Event::GoAway {
            last_good_id,
            status: frame.status(),
        });
        self.abort_opens();

        // the peer never processed these; no RST needed
        for id in self.streams.ids() {
            if self.streams.is_local(id) && id > last_good_id {
                self.cancel_queued(id);
                if self.streams.close(id).is_some() {
                    self.events.push_back(Event::StreamClosed {
                        stream_id: id,
                        reason: CloseReason::Aborted,
                    });
                }
            }
        }

        self.maybe_close_idle();
    }

    fn recv_window_update(&mut self, frame: frame::WindowUpdate) -> Result<(), RecvError> {
        let id = frame.stream_id();
        let delta = frame.delta();

        if id.is_zero() {
            return self.send_flow.replenish(delta).map_err(|reason| {
                proto_err!(conn: "session WINDOW_UPDATE of {} rejected", delta);
                proto::Error::from(reason).into()
            });
        }

        match self.streams.lookup_mut(id) {
            Ok(stream) => stream
                .send_flow
                .replenish(delta)
                .map_err(|reason| RecvError::Stream { id, reason }),
            Err(_) => {
                tracing::debug!(?id, "WINDOW_UPDATE for an unknown stream");
                Ok(())
            }
        }
    }

    /// Applies a receive-path event; a transition the state machine forbids
    /// resets just that stream.
    fn recv_transition(
        &mut self,
        id: StreamId,
        event: StreamEvent,
    ) -> Result<Option<Cause>, RecvError> {
        match self.streams.transition(id, event) {
            Ok((_, cause)) => Ok(cause),
            Err(TableError::UnknownStream(id)) => {
                tracing::warn!(?id, ?event, "frame for an unknown stream");
                Err(RecvError::Stream {
                    id,
                    reason: Reason::INVALID_STREAM,
                })
            }
            Err(err) => {
                proto_err!(stream: "{}; stream={:?}", err, id);
                Err(RecvError::Stream {
                    id,
                    reason: Reason::PROTOCOL_ERROR,
                })
            }
        }
    }

    // ===== send path =====

    /// Moves as much of the stream's queued data into the scheduler as the
    /// windows and the send buffer allow. Returns true once nothing is left.
    fn flush_stream(&mut self, id: StreamId) -> bool {
        loop {
            let room = self
                .max_send_buffer_size
                .saturating_sub(self.prioritize.buffered_data());

            let stream = match self.streams.lookup_mut(id) {
                Ok(stream) => stream,
                Err(_) => return true,
            };

            let len = match stream.pending_send.front() {
                Some(chunk) => chunk.len(),
                None => return true,
            };

            let want = cmp::min(cmp::min(len, self.max_send_chunk), room);
            if want == 0 && len > 0 {
                tracing::trace!(?id, "send buffer full");
                return false;
            }

            let granted = match reserve(&self.send_flow, &stream.send_flow, want as WindowSize) {
                Reservation::Granted(granted) => granted as usize,
                Reservation::Blocked => {
                    tracing::trace!(
                        ?id,
                        stream_window = stream.send_flow.window_size().get(),
                        session_window = self.send_flow.window_size().get(),
                        "blocked on flow control"
                    );
                    return false;
                }
            };

            let payload = match stream.pending_send.pop_front() {
                Some(mut chunk) if granted < chunk.len() => {
                    let head = chunk.split_to(granted);
                    stream.pending_send.push_front(chunk);
                    head
                }
                Some(chunk) => chunk,
                None => return true,
            };

            stream.send_flow.consume(granted as WindowSize);
            self.send_flow.consume(granted as WindowSize);

            let fin = stream.pending_send.is_empty() && stream.pending_fin;
            let priority = stream.priority;

            let mut frame = Data::new(id, payload);
            frame.set_fin(fin);
            self.prioritize.enqueue(id, priority, frame.into());

            if fin {
                match self.streams.transition(id, StreamEvent::SendData { fin: true }) {
                    Ok((_, cause)) => self.stream_closed(id, cause),
                    Err(err) => tracing::debug!(%err, ?id, "final DATA on a finished stream"),
                }
                return true;
            }
        }
    }

    fn resume_blocked(&mut self) {
        for _ in 0..self.blocked.len() {
            let id = match self.blocked.pop_front() {
                Some(id) => id,
                None => break,
            };

            if !self.streams.contains(id) {
                continue;
            }

            if self.flush_stream(id) {
                self.events.push_back(Event::SendReady { stream_id: id });
            } else {
                self.blocked.push_back(id);
            }
        }
    }

    fn queue_stream<T: Into<Control>>(&mut self, id: StreamId, priority: Priority, body: T) {
        self.prioritize
            .enqueue(id, priority, Frame::control(self.version, body));
    }

    fn queue_urgent<T: Into<Control>>(&mut self, body: T) {
        self.prioritize
            .enqueue_urgent(Frame::control(self.version, body));
    }

    fn send_go_away(&mut self, status: GoAwayStatus) {
        let frame = frame::GoAway::new(self.streams.last_remote_id(), status);
        self.go_away.go_away(&frame);
        self.queue_urgent(frame);
        self.abort_opens();
    }

    /// Allocates the next local id and schedules its SYN_STREAM.
    fn start_stream(
        &mut self,
        priority: Priority,
        headers: HeaderBlock,
        fin: bool,
    ) -> Result<StreamId, UserError> {
        let id = self.streams.open_local(priority).map_err(|err| match err {
            TableError::IdsExhausted => UserError::OverflowedStreamId,
            _ => UserError::ConcurrencyLimit,
        })?;

        let mut frame = SynStream::new(id, priority, headers);
        frame.set_fin(fin);

        let span = tracing::trace_span!("open_stream", ?id, ?priority, fin);
        let _e = span.enter();
        self.user_transition(
            id,
            StreamEvent::SendSyn {
                fin,
                unidirectional: false,
            },
        )?;
        self.queue_stream(id, priority, frame);

        Ok(id)
    }

    /// Opens queued streams while the peer's limit allows.
    fn open_queued(&mut self) {
        while self.state == State::Open
            && !self.go_away.is_going_away()
            && self.streams.can_open_local()
        {
            let open = match self.opens.pop() {
                Some(open) => open,
                None => return,
            };

            match self.start_stream(open.priority, open.headers, open.fin) {
                Ok(stream_id) => self.events.push_back(Event::StreamOpened {
                    request: open.request,
                    stream_id,
                }),
                Err(err) => {
                    tracing::debug!(%err, request = ?open.request, "queued open failed");
                    self.events.push_back(Event::OpenAborted {
                        request: open.request,
                    });
                }
            }
        }
    }

    fn abort_opens(&mut self) {
        for request in self.opens.drain() {
            tracing::debug!(?request, "queued open aborted");
            self.events.push_back(Event::OpenAborted { request });
        }
    }

    // ===== stream teardown =====

    /// Resets a stream from our side: its queued frames are dropped and an
    /// RST_STREAM is sent unless the peer never heard of the stream.
    fn reset_local(&mut self, id: StreamId, reason: Reason) {
        let priority = match self.streams.lookup(id) {
            Ok(stream) => stream.priority,
            Err(_) => {
                self.queue_stream(id, Priority::HIGHEST, frame::Reset::new(id, reason));
                return;
            }
        };

        let syn_dropped = self.cancel_queued(id);
        let cause = self
            .streams
            .transition(id, StreamEvent::SendReset(reason))
            .ok()
            .and_then(|(_, cause)| cause);

        if !syn_dropped {
            self.queue_stream(id, priority, frame::Reset::new(id, reason));
        }
        self.stream_closed(id, cause);
    }

    /// Drops the stream's frames from the scheduler and gives back the
    /// session credit their DATA took. Returns whether the SYN_STREAM was
    /// among them.
    fn cancel_queued(&mut self, id: StreamId) -> bool {
        let cancelled = self.prioritize.cancel(id);
        self.send_flow.reclaim(cancelled.data_bytes as WindowSize);
        cancelled.syn_dropped
    }

    fn stream_closed(&mut self, id: StreamId, cause: Option<Cause>) {
        let reason = match cause {
            None => return,
            Some(Cause::EndStream) => CloseReason::Finished,
            Some(Cause::LocalReset(reason)) => CloseReason::LocalReset(reason),
            Some(Cause::RemoteReset(Reason::REFUSED_STREAM)) => CloseReason::Refused,
            Some(Cause::RemoteReset(reason)) => CloseReason::Reset(reason),
        };

        tracing::debug!(?id, ?reason, "stream closed");
        self.events.push_back(Event::StreamClosed {
            stream_id: id,
            reason,
        });
        self.open_queued();
        self.maybe_close_idle();
    }

    fn abort_all(&mut self) {
        self.blocked.clear();
        for id in self.streams.ids() {
            self.streams.close(id);
            self.events.push_back(Event::StreamClosed {
                stream_id: id,
                reason: CloseReason::Aborted,
            });
        }
    }

    fn maybe_close_idle(&mut self) {
        if self.is_closed() || !self.go_away.is_going_away() || !self.streams.is_empty() {
            return;
        }

        tracing::debug!("going away and idle; closing");
        let error = self
            .go_away
            .received_status()
            .filter(|status| !status.is_ok())
            .map(Error::from_go_away);

        self.state = State::Closed;
        self.events.push_back(Event::Closed { error });
    }

    /// Tears the session down after a fatal error.
    fn fatal(&mut self, err: proto::Error) -> Error {
        tracing::debug!(%err, "session error");

        self.prioritize.clear_streams();
        self.send_go_away(err.go_away_status());
        self.abort_all();
        self.state = State::Closed;
        self.events.push_back(Event::Closed {
            error: Some(err.shallow_clone().into()),
        });

        err.into()
    }

    // ===== helpers =====

    fn ensure_open(&self) -> Result<(), UserError> {
        match self.state {
            State::Open => Ok(()),
            State::Closed => Err(UserError::SessionClosed),
        }
    }

    fn ensure_can_open(&self) -> Result<(), UserError> {
        self.ensure_open()?;
        if self.go_away.is_going_away() {
            return Err(UserError::GoingAway);
        }
        Ok(())
    }

    fn ensure_fits(&self, headers: &HeaderBlock, offset: usize) -> Result<(), UserError> {
        if headers.fits_frame(self.version, offset) {
            Ok(())
        } else {
            tracing::debug!(fields = headers.len(), "header block too large to encode");
            Err(UserError::PayloadTooLarge)
        }
    }

    fn user_lookup(&self, id: StreamId) -> Result<Priority, UserError> {
        self.streams
            .lookup(id)
            .map(|stream| stream.priority)
            .map_err(|_| UserError::InactiveStreamId)
    }

    fn user_transition(&mut self, id: StreamId, event: StreamEvent) -> Result<Option<Cause>, UserError> {
        self.streams.transition(id, event).map(|(_, cause)| cause).map_err(|err| match err {
            TableError::UnknownStream(_) => UserError::InactiveStreamId,
            err => {
                tracing::debug!(%err, ?id, "rejected local frame");
                UserError::UnexpectedFrameType
            }
        })
    }
}
