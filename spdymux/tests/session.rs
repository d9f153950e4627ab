use bytes::{Bytes, BytesMut};
use spdymux::codec::{FramedRead, UserError};
use spdymux::frame::{
    self, Control, Data, Frame, Malformed, Ping, Settings, SynReply, SynStream, WindowUpdate,
};
use spdymux::{
    Builder, CloseReason, Config, Event, GoAwayStatus, HeaderBlock, Opening, Priority, Reason,
    Role, Session, StreamId, StreamState, Version, WriteStatus,
};

fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderBlock {
    pairs.iter().cloned().collect()
}

fn id(n: u32) -> StreamId {
    StreamId::from(n)
}

fn events(session: &mut Session) -> Vec<Event> {
    std::iter::from_fn(|| session.poll_event()).collect()
}

fn drain(session: &mut Session) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(buf) = session.poll_transmit() {
        out.extend_from_slice(&buf);
    }
    out
}

fn frames(bytes: &[u8]) -> Vec<Frame> {
    let mut read = FramedRead::new();
    read.extend(bytes);
    std::iter::from_fn(|| read.decode_frame().unwrap()).collect()
}

fn wire(frames: Vec<Frame>) -> Vec<u8> {
    let mut dst = BytesMut::new();
    for frame in frames {
        frame.encode(&mut dst);
    }
    dst.to_vec()
}

/// Moves bytes both ways until neither side has anything left to send.
fn pump(a: &mut Session, b: &mut Session) {
    loop {
        let to_b = drain(a);
        if !to_b.is_empty() {
            b.on_bytes(&to_b).unwrap();
        }
        let to_a = drain(b);
        if !to_a.is_empty() {
            a.on_bytes(&to_a).unwrap();
        }
        if to_a.is_empty() && to_b.is_empty() {
            break;
        }
    }
}

fn v3<T: Into<Control>>(body: T) -> Frame {
    Frame::control(Version::V3, body)
}

#[test]
fn request_and_response_end_to_end() {
    let mut client = Builder::new().client();
    let mut server = Builder::new().server();

    let stream = client
        .open_stream(Priority::HIGHEST, headers(&[(":path", "/")]), false)
        .unwrap();
    assert_eq!(stream, id(1));
    assert_eq!(
        client.send_data(stream, Bytes::from_static(b"abc"), true).unwrap(),
        WriteStatus::Queued
    );
    assert_eq!(client.stream_state(stream), Some(StreamState::HalfClosedLocal));

    pump(&mut client, &mut server);

    let got = events(&mut server);
    assert_eq!(got.len(), 2, "{:?}", got);
    match got[0] {
        Event::Incoming {
            stream_id,
            priority,
            ref headers,
            fin,
            ..
        } => {
            assert_eq!(stream_id, id(1));
            assert_eq!(priority, Priority::HIGHEST);
            assert_eq!(headers.get(":path").map(|v| &v[..]), Some(&b"/"[..]));
            assert!(!fin);
        }
        ref other => panic!("unexpected event {:?}", other),
    }
    match got[1] {
        Event::Data {
            stream_id,
            ref data,
            fin,
        } => {
            assert_eq!(stream_id, id(1));
            assert_eq!(&data[..], b"abc");
            assert!(fin);
        }
        ref other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(server.stream_state(id(1)), Some(StreamState::HalfClosedRemote));

    server
        .send_reply(id(1), headers(&[(":status", "200")]), false)
        .unwrap();
    server
        .send_data(id(1), Bytes::from_static(b"abc"), true)
        .unwrap();
    assert!(matches!(
        events(&mut server)[..],
        [Event::StreamClosed {
            reason: CloseReason::Finished,
            ..
        }]
    ));

    pump(&mut client, &mut server);

    let got = events(&mut client);
    assert_eq!(got.len(), 3, "{:?}", got);
    assert!(matches!(got[0], Event::Headers { fin: false, .. }));
    assert!(matches!(got[1], Event::Data { fin: true, ref data, .. } if &data[..] == b"abc"));
    assert!(matches!(
        got[2],
        Event::StreamClosed {
            reason: CloseReason::Finished,
            ..
        }
    ));

    assert_eq!(client.stream_state(stream), None);
    assert_eq!(client.num_active_streams(), 0);
    assert_eq!(server.num_active_streams(), 0);
    assert!(!client.is_closed());
}

#[test]
fn go_away_aborts_streams_past_last_good() {
    let mut client = Builder::new().client();
    let mut server = Builder::new().server();

    for _ in 0..3 {
        client
            .open_stream(Priority::HIGHEST, HeaderBlock::new(), false)
            .unwrap();
    }
    pump(&mut client, &mut server);
    assert_eq!(events(&mut server).len(), 3);

    let go_away = frame::GoAway::new(id(3), GoAwayStatus::OK);
    client.on_bytes(&wire(vec![v3(go_away)])).unwrap();

    let got = events(&mut client);
    assert!(matches!(
        got[..],
        [
            Event::GoAway { last_good_id, status: GoAwayStatus::OK },
            Event::StreamClosed { stream_id, reason: CloseReason::Aborted },
        ] if last_good_id == id(3) && stream_id == id(5)
    ), "{:?}", got);

    let err = client
        .open_stream(Priority::HIGHEST, HeaderBlock::new(), false)
        .unwrap_err();
    assert_eq!(err.user_error(), Some(UserError::GoingAway));

    // stream 3 runs to completion
    client
        .send_data(id(3), Bytes::from_static(b"done"), true)
        .unwrap();
    pump(&mut client, &mut server);
    server.send_reply(id(3), HeaderBlock::new(), true).unwrap();
    pump(&mut client, &mut server);

    let got = events(&mut client);
    assert!(got.iter().any(|e| matches!(
        *e,
        Event::StreamClosed { stream_id, reason: CloseReason::Finished } if stream_id == id(3)
    )), "{:?}", got);
    assert!(!client.is_closed());

    // the last stream ending closes the session
    client.reset_stream(id(1), Reason::CANCEL).unwrap();
    let got = events(&mut client);
    assert!(matches!(
        got[..],
        [
            Event::StreamClosed { reason: CloseReason::LocalReset(Reason::CANCEL), .. },
            Event::Closed { error: None },
        ]
    ), "{:?}", got);
    assert!(client.is_closed());

    // the RST still goes out
    let out = frames(&drain(&mut client));
    assert!(matches!(
        out[..],
        [Frame::Control { body: Control::Reset(ref rst), .. }] if rst.stream_id() == id(1)
    ));
}

#[test]
fn wrong_parity_is_reset_and_session_continues() {
    let mut server = Builder::new().server();

    let bad = SynStream::new(id(2), Priority::HIGHEST, HeaderBlock::new());
    server.on_bytes(&wire(vec![v3(bad)])).unwrap();
    assert!(events(&mut server).is_empty());

    let out = frames(&drain(&mut server));
    match out[..] {
        [Frame::Control {
            body: Control::Reset(ref rst),
            ..
        }] => {
            assert_eq!(rst.stream_id(), id(2));
            assert_eq!(rst.reason(), Reason::PROTOCOL_ERROR);
        }
        ref other => panic!("unexpected frames {:?}", other),
    }

    let good = SynStream::new(id(1), Priority::HIGHEST, HeaderBlock::new());
    server.on_bytes(&wire(vec![v3(good)])).unwrap();
    assert!(matches!(
        events(&mut server)[..],
        [Event::Incoming { stream_id, .. }] if stream_id == id(1)
    ));
    assert!(!server.is_closed());
}

#[test]
fn non_increasing_peer_id_is_fatal() {
    let mut server = Builder::new().server();

    let syn = |n| v3(SynStream::new(id(n), Priority::HIGHEST, HeaderBlock::new()));
    server.on_bytes(&wire(vec![syn(5)])).unwrap();

    let err = server.on_bytes(&wire(vec![syn(3)])).unwrap_err();
    assert_eq!(err.reason(), Some(Reason::PROTOCOL_ERROR));
    assert!(server.is_closed());

    let out = frames(&drain(&mut server));
    assert!(matches!(
        out[..],
        [Frame::Control { body: Control::GoAway(ref g), .. }]
            if g.last_good_id() == id(5) && g.status() == GoAwayStatus::PROTOCOL_ERROR
    ), "{:?}", out);
}

#[test]
fn send_window_holds_back_the_excess() {
    let mut client = Builder::new().client();
    let stream = client
        .open_stream(Priority::HIGHEST, HeaderBlock::new(), false)
        .unwrap();

    let mut settings = Settings::new();
    settings.set_initial_window_size(Some(10));
    client.on_bytes(&wire(vec![v3(settings)])).unwrap();
    assert_eq!(client.send_capacity(stream), Some(10));

    let status = client
        .send_data(stream, Bytes::from(vec![7u8; 11]), false)
        .unwrap();
    assert_eq!(status, WriteStatus::Pending);

    let out = frames(&drain(&mut client));
    let sent: Vec<usize> = out
        .iter()
        .filter_map(|f| match *f {
            Frame::Data(ref d) => Some(d.payload().len()),
            _ => None,
        })
        .collect();
    assert_eq!(sent, vec![10]);
    assert!(drain(&mut client).is_empty());

    client
        .on_bytes(&wire(vec![v3(WindowUpdate::new(stream, 1))]))
        .unwrap();

    let got = events(&mut client);
    assert!(matches!(got[0], Event::Settings(_)));
    assert!(matches!(got[1], Event::SendReady { stream_id } if stream_id == stream));

    let out = frames(&drain(&mut client));
    match out[..] {
        [Frame::Data(ref d)] => {
            assert_eq!(d.payload().len(), 1);
            assert!(!d.is_fin());
        }
        ref other => panic!("unexpected frames {:?}", other),
    }
}

#[test]
fn receive_window_is_released_and_enforced() {
    let mut server = Builder::new().initial_window_size(10).server();
    // initial SETTINGS
    assert_eq!(frames(&drain(&mut server)).len(), 1);

    let syn = SynStream::new(id(1), Priority::HIGHEST, HeaderBlock::new());
    let data = Data::new(id(1), Bytes::from_static(b"0123456789"));
    server.on_bytes(&wire(vec![v3(syn), data.into()])).unwrap();

    let out = frames(&drain(&mut server));
    assert!(matches!(
        out[..],
        [Frame::Control { body: Control::WindowUpdate(ref w), .. }]
            if w.stream_id() == id(1) && w.delta() == 10
    ), "{:?}", out);

    // the window was handed back, but not twice over
    let data = Data::new(id(1), Bytes::from(vec![0u8; 11]));
    let err = server.on_bytes(&wire(vec![data.into()])).unwrap_err();
    assert_eq!(err.reason(), Some(Reason::FLOW_CONTROL_ERROR));
    assert!(server.is_closed());
}

#[test]
fn higher_priority_streams_go_first() {
    let mut client = Builder::new().client();
    let low = client
        .open_stream(Priority::new(5), HeaderBlock::new(), false)
        .unwrap();
    let high = client
        .open_stream(Priority::new(1), HeaderBlock::new(), false)
        .unwrap();
    client.send_data(low, Bytes::from_static(b"low"), true).unwrap();
    client.send_data(high, Bytes::from_static(b"high"), true).unwrap();

    let order: Vec<_> = frames(&drain(&mut client))
        .iter()
        .map(|f| f.stream_id())
        .collect();
    assert_eq!(order, vec![Some(high), Some(high), Some(low), Some(low)]);
}

#[test]
fn spdy2_priority_is_clamped() {
    let mut client = Builder::new().version(Version::V2).client();
    let mut server = Builder::new().version(Version::V2).server();

    client
        .open_stream(Priority::new(7), HeaderBlock::new(), true)
        .unwrap();
    pump(&mut client, &mut server);

    assert!(matches!(
        events(&mut server)[..],
        [Event::Incoming { priority, fin: true, .. }] if priority == Priority::new(3)
    ));
}

#[test]
fn malformed_frame_sends_go_away_and_closes() {
    let mut server = Builder::new().server();
    server
        .open_stream(Priority::HIGHEST, HeaderBlock::new(), false)
        .unwrap();

    // RST_STREAM with a 4 byte payload, delivered in two pieces
    let bad = [0x80, 0x03, 0x00, 0x03, 0x00, 0x00, 0x00, 0x04, 0, 0, 0, 1];
    server.on_bytes(&bad[..5]).unwrap();
    let err = server.on_bytes(&bad[5..]).unwrap_err();
    assert_eq!(
        err.frame_error(),
        Some(&frame::Error::Malformed(Malformed::InvalidPayloadLength))
    );

    let got = events(&mut server);
    assert!(matches!(
        got[..],
        [
            Event::StreamClosed { reason: CloseReason::Aborted, .. },
            Event::Closed { error: Some(_) },
        ]
    ), "{:?}", got);

    // the SYN_STREAM never left; only the GOAWAY does
    let out = frames(&drain(&mut server));
    assert!(matches!(
        out[..],
        [Frame::Control { body: Control::GoAway(ref g), .. }]
            if g.status() == GoAwayStatus::PROTOCOL_ERROR
    ), "{:?}", out);

    // later input is discarded
    assert!(server.on_bytes(&bad).is_ok());
}

#[test]
fn unknown_frame_type_is_skipped() {
    let mut server = Builder::new().server();

    let mut input = vec![0x80, 0x03, 0x00, 0x0c, 0x00, 0x00, 0x00, 0x02, 0xab, 0xcd];
    input.extend(wire(vec![v3(Ping::new(1))]));
    server.on_bytes(&input).unwrap();

    let out = frames(&drain(&mut server));
    assert!(matches!(
        out[..],
        [Frame::Control { body: Control::Ping(ref p), .. }] if p.id() == 1
    ));
    assert!(!server.is_closed());
}

#[test]
fn ping_round_trip() {
    let mut client = Builder::new().client();
    let mut server = Builder::new().server();

    let ping = client.ping().unwrap();
    assert_eq!(ping, 1);
    assert_eq!(client.pings_in_flight(), 1);
    pump(&mut client, &mut server);
    assert_eq!(client.pings_in_flight(), 0);

    assert!(events(&mut server).is_empty());
    assert!(matches!(events(&mut client)[..], [Event::Pong { id: 1 }]));
}

#[test]
fn unexpected_pong_is_fatal() {
    let mut client = Builder::new().client();
    let err = client
        .on_bytes(&wire(vec![v3(Ping::new(3))]))
        .unwrap_err();
    assert_eq!(err.reason(), Some(Reason::PROTOCOL_ERROR));
    assert!(client.is_closed());
}

#[test]
fn streams_over_the_limit_are_refused() {
    let mut client = Builder::new().client();
    let mut server = Builder::new().max_concurrent_streams(1).server();

    let first = client
        .open_stream(Priority::HIGHEST, HeaderBlock::new(), false)
        .unwrap();
    let second = client
        .open_stream(Priority::HIGHEST, HeaderBlock::new(), false)
        .unwrap();
    pump(&mut client, &mut server);

    assert!(matches!(
        events(&mut server)[..],
        [Event::Incoming { stream_id, .. }] if stream_id == first
    ));

    let got = events(&mut client);
    assert!(matches!(got[0], Event::Settings(ref s) if s.max_concurrent_streams() == Some(1)));
    assert!(matches!(
        got[1],
        Event::StreamClosed { stream_id, reason: CloseReason::Refused } if stream_id == second
    ));

    let err = client
        .open_stream(Priority::HIGHEST, HeaderBlock::new(), false)
        .unwrap_err();
    assert_eq!(err.user_error(), Some(UserError::ConcurrencyLimit));
}

#[test]
fn invalid_transition_resets_only_that_stream() {
    let mut server = Builder::new().server();
    let syn = |n| v3(SynStream::new(id(n), Priority::HIGHEST, HeaderBlock::new()));
    server.on_bytes(&wire(vec![syn(1), syn(3)])).unwrap();
    events(&mut server);

    // a SYN_REPLY for a stream the peer opened itself
    let reply = SynReply::new(id(1), HeaderBlock::new());
    server.on_bytes(&wire(vec![v3(reply)])).unwrap();

    assert!(matches!(
        events(&mut server)[..],
        [Event::StreamClosed {
            stream_id,
            reason: CloseReason::LocalReset(Reason::PROTOCOL_ERROR),
        }] if stream_id == id(1)
    ));
    assert_eq!(server.stream_state(id(3)), Some(StreamState::Open));

    let out = frames(&drain(&mut server));
    assert!(matches!(
        out[..],
        [Frame::Control { body: Control::Reset(ref rst), .. }]
            if rst.stream_id() == id(1) && rst.reason() == Reason::PROTOCOL_ERROR
    ));
}

#[test]
fn data_for_unknown_stream_is_reset() {
    let mut server = Builder::new().server();
    let data = Data::new(id(9), Bytes::from_static(b"x"));
    server.on_bytes(&wire(vec![data.into()])).unwrap();

    assert!(events(&mut server).is_empty());
    let out = frames(&drain(&mut server));
    assert!(matches!(
        out[..],
        [Frame::Control { body: Control::Reset(ref rst), .. }]
            if rst.stream_id() == id(9) && rst.reason() == Reason::INVALID_STREAM
    ));
}

#[test]
fn peer_reset_cancels_queued_data() {
    let mut client = Builder::new().client();
    let stream = client
        .open_stream(Priority::HIGHEST, HeaderBlock::new(), false)
        .unwrap();
    drain(&mut client);

    client
        .send_data(stream, Bytes::from_static(b"never sent"), false)
        .unwrap();
    let rst = frame::Reset::new(stream, Reason::CANCEL);
    client.on_bytes(&wire(vec![v3(rst)])).unwrap();

    assert!(matches!(
        events(&mut client)[..],
        [Event::StreamClosed { reason: CloseReason::Reset(Reason::CANCEL), .. }]
    ));
    assert!(drain(&mut client).is_empty());
    assert_eq!(
        client.send_data(stream, Bytes::from_static(b"x"), false).unwrap_err().user_error(),
        Some(UserError::InactiveStreamId)
    );
}

#[test]
fn graceful_go_away_lets_streams_finish() {
    let mut client = Builder::new().client();
    let mut server = Builder::new().server();

    client
        .open_stream(Priority::HIGHEST, HeaderBlock::new(), true)
        .unwrap();
    pump(&mut client, &mut server);
    events(&mut server);

    server.go_away(GoAwayStatus::OK).unwrap();
    pump(&mut client, &mut server);
    assert!(matches!(
        events(&mut client)[..],
        [Event::GoAway { last_good_id, .. }] if last_good_id == id(1)
    ));

    // a stream opened past the announced id is ignored
    let late = SynStream::new(id(3), Priority::HIGHEST, HeaderBlock::new());
    server.on_bytes(&wire(vec![v3(late)])).unwrap();
    assert!(events(&mut server).is_empty());
    assert!(drain(&mut server).is_empty());

    server.send_reply(id(1), HeaderBlock::new(), true).unwrap();
    let got = events(&mut server);
    assert!(matches!(
        got[..],
        [
            Event::StreamClosed { reason: CloseReason::Finished, .. },
            Event::Closed { error: None },
        ]
    ), "{:?}", got);

    pump(&mut client, &mut server);
    let got = events(&mut client);
    assert!(matches!(got.last(), Some(Event::Closed { error: None })), "{:?}", got);
}

#[test]
fn close_aborts_every_stream() {
    let mut client = Builder::new().client();
    client
        .open_stream(Priority::HIGHEST, HeaderBlock::new(), false)
        .unwrap();
    client
        .open_stream(Priority::new(3), HeaderBlock::new(), false)
        .unwrap();

    client.close(GoAwayStatus::OK);

    let got = events(&mut client);
    assert_eq!(got.len(), 3);
    assert!(got[..2].iter().all(|e| matches!(
        *e,
        Event::StreamClosed { reason: CloseReason::Aborted, .. }
    )));
    assert!(matches!(got[2], Event::Closed { error: None }));

    let out = frames(&drain(&mut client));
    assert!(matches!(
        out[..],
        [Frame::Control { body: Control::GoAway(ref g), .. }] if g.status() == GoAwayStatus::OK
    ));

    let err = client
        .open_stream(Priority::HIGHEST, HeaderBlock::new(), false)
        .unwrap_err();
    assert_eq!(err.user_error(), Some(UserError::SessionClosed));
}

#[test]
fn waiting_opens_start_by_priority_as_slots_free() {
    let mut client = Builder::new().client();
    let mut server = Builder::new().max_concurrent_streams(1).server();
    pump(&mut client, &mut server);
    assert!(matches!(events(&mut client)[..], [Event::Settings(_)]));

    let first = match client
        .request_stream(Priority::new(2), HeaderBlock::new(), true)
        .unwrap()
    {
        Opening::Opened(id) => id,
        other => panic!("expected an open stream, got {:?}", other),
    };
    assert_eq!(first, id(1));

    let queue = |client: &mut Session, tier| {
        match client
            .request_stream(Priority::new(tier), HeaderBlock::new(), true)
            .unwrap()
        {
            Opening::Queued(request) => request,
            other => panic!("expected a queued open, got {:?}", other),
        }
    };
    let low = queue(&mut client, 3);
    let high = queue(&mut client, 0);
    let dropped = queue(&mut client, 1);
    assert!(client.cancel_request(dropped));
    assert_eq!(client.num_pending_opens(), 2);

    pump(&mut client, &mut server);
    assert!(matches!(
        events(&mut server)[..],
        [Event::Incoming { stream_id, .. }] if stream_id == first
    ));

    server.send_reply(first, HeaderBlock::new(), true).unwrap();
    pump(&mut client, &mut server);

    let got = events(&mut client);
    assert_eq!(got.len(), 3, "{:?}", got);
    assert!(matches!(got[0], Event::Headers { fin: true, .. }));
    assert!(matches!(
        got[1],
        Event::StreamClosed { stream_id, reason: CloseReason::Finished } if stream_id == first
    ));
    assert!(matches!(
        got[2],
        Event::StreamOpened { request, stream_id } if request == high && stream_id == id(3)
    ));
    assert_eq!(client.num_pending_opens(), 1);

    let got = events(&mut server);
    assert!(matches!(
        got.last(),
        Some(Event::Incoming { stream_id, priority, .. })
            if *stream_id == id(3) && *priority == Priority::HIGHEST
    ));

    client.close(GoAwayStatus::OK);
    let got = events(&mut client);
    assert!(matches!(got[0], Event::OpenAborted { request } if request == low));
    assert!(matches!(got.last(), Some(Event::Closed { error: None })));
    assert_eq!(client.num_pending_opens(), 0);
}

#[test]
fn full_send_buffer_suspends_writes_until_drained() {
    let mut client = Builder::new()
        .max_send_buffer_size(100)
        .max_send_chunk(50)
        .client();
    let stream = client
        .open_stream(Priority::HIGHEST, HeaderBlock::new(), false)
        .unwrap();

    assert_eq!(
        client.send_data(stream, Bytes::from(vec![7u8; 300]), true).unwrap(),
        WriteStatus::Pending
    );
    // the FIN is still queued on the stream
    assert_eq!(client.stream_state(stream), Some(StreamState::Open));
    assert!(events(&mut client).is_empty());

    let out = frames(&drain(&mut client));
    assert!(matches!(
        out[0],
        Frame::Control { body: Control::SynStream(_), .. }
    ));

    let data: Vec<&Data> = out[1..]
        .iter()
        .map(|frame| match *frame {
            Frame::Data(ref data) => data,
            ref other => panic!("unexpected frame {:?}", other),
        })
        .collect();
    assert_eq!(data.len(), 6);
    assert!(data.iter().all(|d| d.payload().len() == 50));
    assert!(data[..5].iter().all(|d| !d.is_fin()));
    assert!(data[5].is_fin());

    assert!(matches!(
        events(&mut client)[..],
        [Event::SendReady { stream_id }] if stream_id == stream
    ));
    assert_eq!(client.stream_state(stream), Some(StreamState::HalfClosedLocal));
}

#[test]
fn oversized_header_block_is_refused_before_sending() {
    let mut long = HeaderBlock::new();
    long.insert(":path", vec![b'a'; 70_000]);

    let mut client = Builder::new().version(Version::V2).client();
    let mut server = Builder::new().version(Version::V2).server();

    let err = client
        .open_stream(Priority::HIGHEST, long.clone(), false)
        .unwrap_err();
    assert_eq!(err.user_error(), Some(UserError::PayloadTooLarge));
    assert_eq!(client.num_active_streams(), 0);
    assert!(frames(&drain(&mut client)).is_empty());

    // the id was not used up
    let stream = client
        .open_stream(Priority::HIGHEST, headers(&[(":path", "/")]), false)
        .unwrap();
    assert_eq!(stream, id(1));
    pump(&mut client, &mut server);
    events(&mut server);

    let err = server.send_reply(stream, long.clone(), false).unwrap_err();
    assert_eq!(err.user_error(), Some(UserError::PayloadTooLarge));
    assert_eq!(server.stream_state(stream), Some(StreamState::Open));

    server.send_reply(stream, HeaderBlock::new(), false).unwrap();
    let err = server.send_headers(stream, long, false).unwrap_err();
    assert_eq!(err.user_error(), Some(UserError::PayloadTooLarge));

    pump(&mut client, &mut server);
    assert!(matches!(
        events(&mut client)[..],
        [Event::Headers { stream_id, .. }] if stream_id == stream
    ));
    assert!(!client.is_closed());
    assert!(!server.is_closed());
}

#[test]
fn out_of_range_config_is_clamped() {
    let config = Config {
        max_send_chunk: 0,
        initial_window_size: 1 << 31,
        ..Config::default()
    };
    assert!(config.validate().is_err());

    let mut client = Session::new(Role::Client, &config);
    let mut server = Session::new(Role::Server, &config);

    let stream = client
        .open_stream(Priority::HIGHEST, HeaderBlock::new(), false)
        .unwrap();
    assert_eq!(
        client.send_data(stream, Bytes::from_static(b"abc"), true).unwrap(),
        WriteStatus::Queued
    );
    assert_eq!(client.stream_state(stream), Some(StreamState::HalfClosedLocal));

    pump(&mut client, &mut server);

    let data: Vec<Bytes> = events(&mut server)
        .into_iter()
        .filter_map(|event| match event {
            Event::Data { data, .. } => Some(data),
            _ => None,
        })
        .collect();
    assert_eq!(data, vec![&b"a"[..], &b"b"[..], &b"c"[..]]);
    assert!(!client.is_closed());
    assert!(!server.is_closed());
}
