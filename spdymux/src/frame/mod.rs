//! Typed SPDY frames and their wire encoding.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

macro_rules! unpack_octets_4 {
    ($buf:expr, $offset:expr, $tip:ty) => {
        (($buf[$offset + 0] as $tip) << 24)
            | (($buf[$offset + 1] as $tip) << 16)
            | (($buf[$offset + 2] as $tip) << 8)
            | (($buf[$offset + 3] as $tip) << 0)
    };
}

pub mod bits;
mod data;
mod go_away;
mod head;
mod header_block;
mod headers;
mod ping;
mod priority;
mod reason;
mod reset;
mod settings;
mod stream_id;
mod syn_reply;
mod syn_stream;
mod util;
mod window_update;

pub use self::bits::HEADER_LEN;
pub use self::data::Data;
pub use self::go_away::{GoAway, GoAwayStatus};
pub use self::head::{Head, Kind, Version};
pub use self::header_block::HeaderBlock;
pub use self::headers::Headers;
pub use self::ping::Ping;
pub use self::priority::Priority;
pub use self::reason::Reason;
pub use self::reset::Reset;
pub use self::settings::{Setting, SettingId, Settings};
pub use self::stream_id::{StreamId, StreamIdOverflow};
pub use self::syn_reply::SynReply;
pub use self::syn_stream::SynStream;
pub use self::window_update::WindowUpdate;

#[derive(Clone, Eq, PartialEq)]
pub enum Frame {
    Control { version: Version, body: Control },
    Data(Data),
}

#[derive(Clone, Eq, PartialEq)]
pub enum Control {
    SynStream(SynStream),
    SynReply(SynReply),
    Reset(Reset),
    Settings(Settings),
    Noop,
    Ping(Ping),
    GoAway(GoAway),
    Headers(Headers),
    WindowUpdate(WindowUpdate),
}

/// Why a buffer did not decode to a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("malformed frame: {0}")]
    Malformed(Malformed),

    #[error("illegal bits: {0}")]
    IllegalBits(IllegalBits),

    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u16),

    #[error("unknown control frame type {0}")]
    UnknownFrameType(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Malformed {
    #[error("truncated frame header ({available} of 8 bytes)")]
    Truncated { available: usize },

    #[error("declared length {length} exceeds the {available} bytes available")]
    LengthExceedsBuffer { length: usize, available: usize },

    #[error("{extra} bytes trail the frame")]
    TrailingBytes { extra: usize },

    #[error("invalid payload length")]
    InvalidPayloadLength,

    #[error("invalid stream id")]
    InvalidStreamId,

    #[error("invalid header block")]
    InvalidHeaderBlock,

    #[error("invalid settings entries")]
    InvalidSettings,

    #[error("frame of {length} bytes exceeds the limit of {max}")]
    FrameTooLarge { length: usize, max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IllegalBits {
    #[error("flags {flags:#04x} outside legal mask {mask:#04x}")]
    Flags { flags: u8, mask: u8 },

    #[error("reserved bit set in stream id {0:#010x}")]
    StreamId(u32),
}

// ===== impl Error =====

impl Error {
    /// Everything but an unknown control frame type tears the session down.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::UnknownFrameType(_))
    }
}

// ===== decode =====

/// Decodes exactly one frame; `src` must hold that frame and nothing else.
pub fn decode(src: Bytes) -> Result<Frame, Error> {
    if src.len() < HEADER_LEN {
        return Err(Error::Malformed(Malformed::Truncated {
            available: src.len(),
        }));
    }

    let head = Head::parse(&src[..HEADER_LEN])?;

    let length = head.length();
    let available = src.len() - HEADER_LEN;
    if length > available {
        return Err(Error::Malformed(Malformed::LengthExceedsBuffer { length, available }));
    }
    if length < available {
        return Err(Error::Malformed(Malformed::TrailingBytes {
            extra: available - length,
        }));
    }

    let payload = src.slice(HEADER_LEN..);

    let frame = match head {
        Head::Data {
            stream_id, flags, ..
        } => Data::load(stream_id, flags, payload)?.into(),
        Head::Control {
            version,
            kind,
            flags,
            ..
        } => {
            let body = match kind {
                Kind::SynStream => SynStream::load(version, flags, payload)?.into(),
                Kind::SynReply => SynReply::load(version, flags, payload)?.into(),
                Kind::Reset => Reset::load(payload)?.into(),
                Kind::Settings => Settings::load(version, flags, payload)?.into(),
                Kind::Noop => {
                    util::expect_len(&payload, 0)?;
                    Control::Noop
                }
                Kind::Ping => Ping::load(payload)?.into(),
                Kind::GoAway => GoAway::load(version, payload)?.into(),
                Kind::Headers => Headers::load(version, flags, payload)?.into(),
                Kind::WindowUpdate => WindowUpdate::load(payload)?.into(),
            };
            Frame::Control { version, body }
        }
    };

    Ok(frame)
}

// ===== impl Frame =====

impl Frame {
    pub fn control<T: Into<Control>>(version: Version, body: T) -> Frame {
        Frame::Control {
            version,
            body: body.into(),
        }
    }

    /// The stream this frame concerns, if any. Session-wide frames and a
    /// WINDOW_UPDATE for stream zero return `None`.
    pub fn stream_id(&self) -> Option<StreamId> {
        let id = match *self {
            Frame::Data(ref frame) => frame.stream_id(),
            Frame::Control { ref body, .. } => match *body {
                Control::SynStream(ref f) => f.stream_id(),
                Control::SynReply(ref f) => f.stream_id(),
                Control::Reset(ref f) => f.stream_id(),
                Control::Headers(ref f) => f.stream_id(),
                Control::WindowUpdate(ref f) => f.stream_id(),
                _ => return None,
            },
        };

        if id.is_zero() {
            None
        } else {
            Some(id)
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Frame::Data(_))
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        match *self {
            Frame::Data(ref frame) => frame.encode(dst),
            Frame::Control { version, ref body } => {
                let start = dst.len();
                Head::encode_control(version, body.kind(), body.flags(), 0, dst);
                body.encode_payload(version, dst);

                let length = dst.len() - start - HEADER_LEN;
                assert!(
                    length as u32 <= bits::LENGTH_MASK,
                    "control frame payload too large: {}",
                    length
                );
                let mut len_bytes = &mut dst[start + 5..start + HEADER_LEN];
                len_bytes.put_uint(length as u64, 3);
            }
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Frame::Data(ref frame) => fmt::Debug::fmt(frame, fmt),
            Frame::Control { ref body, .. } => fmt::Debug::fmt(body, fmt),
        }
    }
}

// ===== impl Control =====

impl Control {
    pub fn kind(&self) -> Kind {
        match *self {
            Control::SynStream(_) => Kind::SynStream,
            Control::SynReply(_) => Kind::SynReply,
            Control::Reset(_) => Kind::Reset,
            Control::Settings(_) => Kind::Settings,
            Control::Noop => Kind::Noop,
            Control::Ping(_) => Kind::Ping,
            Control::GoAway(_) => Kind::GoAway,
            Control::Headers(_) => Kind::Headers,
            Control::WindowUpdate(_) => Kind::WindowUpdate,
        }
    }

    fn flags(&self) -> u8 {
        match *self {
            Control::SynStream(ref f) => f.flags(),
            Control::SynReply(ref f) => f.flags(),
            Control::Headers(ref f) => f.flags(),
            Control::Settings(ref f) => f.flags(),
            _ => 0,
        }
    }

    fn encode_payload(&self, version: Version, dst: &mut BytesMut) {
        match *self {
            Control::SynStream(ref f) => f.encode_payload(version, dst),
            Control::SynReply(ref f) => f.encode_payload(version, dst),
            Control::Reset(ref f) => f.encode_payload(dst),
            Control::Settings(ref f) => f.encode_payload(version, dst),
            Control::Noop => {}
            Control::Ping(ref f) => f.encode_payload(dst),
            Control::GoAway(ref f) => f.encode_payload(version, dst),
            Control::Headers(ref f) => f.encode_payload(version, dst),
            Control::WindowUpdate(ref f) => f.encode_payload(dst),
        }
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        use self::Control::*;

        match *self {
            SynStream(ref frame) => fmt::Debug::fmt(frame, fmt),
            SynReply(ref frame) => fmt::Debug::fmt(frame, fmt),
            Reset(ref frame) => fmt::Debug::fmt(frame, fmt),
            Settings(ref frame) => fmt::Debug::fmt(frame, fmt),
            Noop => fmt.write_str("Noop"),
            Ping(ref frame) => fmt::Debug::fmt(frame, fmt),
            GoAway(ref frame) => fmt::Debug::fmt(frame, fmt),
            Headers(ref frame) => fmt::Debug::fmt(frame, fmt),
            WindowUpdate(ref frame) => fmt::Debug::fmt(frame, fmt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(frame: &Frame) -> Bytes {
        let mut dst = BytesMut::new();
        frame.encode(&mut dst);
        dst.freeze()
    }

    fn foo_bar() -> HeaderBlock {
        vec![("bar", "foo"), ("foo", "bar")].into_iter().collect()
    }

    const SYN_STREAM_V2: &[u8] = &[
        0x80, 0x02, 0x00, 0x01, 0x00, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
        0x00, 0xc0, 0x00, 0x00, 0x02, 0x00, 0x03, b'b', b'a', b'r', 0x00, 0x03, b'f', b'o', b'o',
        0x00, 0x03, b'f', b'o', b'o', 0x00, 0x03, b'b', b'a', b'r',
    ];

    const SYN_STREAM_V3: &[u8] = &[
        0x80, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, 0x2a, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
        0x00, 0xe0, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03, b'b', b'a', b'r', 0x00,
        0x00, 0x00, 0x03, b'f', b'o', b'o', 0x00, 0x00, 0x00, 0x03, b'f', b'o', b'o', 0x00, 0x00,
        0x00, 0x03, b'b', b'a', b'r',
    ];

    #[test]
    fn syn_stream_matches_known_bytes() {
        for &(version, expected) in &[(Version::V2, SYN_STREAM_V2), (Version::V3, SYN_STREAM_V3)] {
            let syn = SynStream::new(StreamId::from(1), version.lowest_priority(), foo_bar());
            let frame = Frame::control(version, syn);

            assert_eq!(&encode(&frame)[..], expected);
            assert_eq!(decode(Bytes::from_static(expected)).unwrap(), frame);
        }
    }

    #[test]
    fn syn_stream_round_trips_every_priority_byte() {
        for &version in &[Version::V2, Version::V3] {
            for tier in 0..version.tiers() {
                let mut syn = SynStream::new(StreamId::from(3), Priority::new(tier), foo_bar());
                syn.set_fin(tier % 2 == 0);
                syn.set_associated_id(StreamId::from(1));
                let wire = encode(&Frame::control(version, syn));

                assert_eq!(wire[16], tier << version.priority_shift());

                let decoded = decode(wire.clone()).unwrap();
                match decoded {
                    Frame::Control {
                        body: Control::SynStream(ref f),
                        ..
                    } => assert_eq!(f.priority().tier(), tier),
                    ref other => panic!("unexpected frame {:?}", other),
                }
                assert_eq!(encode(&decoded), wire);
            }
        }
    }

    #[test]
    fn short_buffers_are_truncated() {
        let full = encode(&Frame::control(Version::V3, Ping::new(1)));
        for len in 0..HEADER_LEN {
            assert_eq!(
                decode(full.slice(..len)),
                Err(Error::Malformed(Malformed::Truncated { available: len }))
            );
        }
    }

    #[test]
    fn length_must_match_buffer() {
        let full = encode(&Frame::control(Version::V3, Ping::new(1)));

        assert_eq!(
            decode(full.slice(..10)),
            Err(Error::Malformed(Malformed::LengthExceedsBuffer {
                length: 4,
                available: 2,
            }))
        );

        let mut padded = BytesMut::from(&full[..]);
        padded.put_u8(0);
        assert_eq!(
            decode(padded.freeze()),
            Err(Error::Malformed(Malformed::TrailingBytes { extra: 1 }))
        );
    }

    #[test]
    fn high_bit_stream_ids_are_illegal() {
        // RST_STREAM for 0x80000001
        let rst = Bytes::from_static(&[
            0x80, 0x03, 0x00, 0x03, 0x00, 0x00, 0x00, 0x08, 0x80, 0x00, 0x00, 0x01, 0x00, 0x00,
            0x00, 0x01,
        ]);
        assert_eq!(
            decode(rst),
            Err(Error::IllegalBits(IllegalBits::StreamId(0x8000_0001)))
        );

        // GOAWAY last-good-id 0xffffffff
        let go_away = Bytes::from_static(&[
            0x80, 0x02, 0x00, 0x07, 0x00, 0x00, 0x00, 0x04, 0xff, 0xff, 0xff, 0xff,
        ]);
        assert_eq!(
            decode(go_away),
            Err(Error::IllegalBits(IllegalBits::StreamId(0xffff_ffff)))
        );
    }

    #[test]
    fn flags_outside_mask_are_illegal() {
        // PING with FIN set
        let ping = Bytes::from_static(&[
            0x80, 0x03, 0x00, 0x06, 0x01, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01,
        ]);
        assert_eq!(
            decode(ping),
            Err(Error::IllegalBits(IllegalBits::Flags {
                flags: 0x01,
                mask: 0x00
            }))
        );

        // DATA with an unknown flag
        let data = Bytes::from_static(&[0x00, 0x00, 0x00, 0x01, 0x04, 0x00, 0x00, 0x00]);
        assert!(matches!(
            decode(data),
            Err(Error::IllegalBits(IllegalBits::Flags { flags: 0x04, .. }))
        ));
    }

    #[test]
    fn unknown_types_and_versions() {
        // CREDENTIAL (10) is not understood
        let credential = Bytes::from_static(&[0x80, 0x03, 0x00, 0x0a, 0x00, 0x00, 0x00, 0x00]);
        let err = decode(credential).unwrap_err();
        assert_eq!(err, Error::UnknownFrameType(10));
        assert!(!err.is_fatal());

        // NOOP only exists in spdy/2
        let noop = Bytes::from_static(&[0x80, 0x03, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(decode(noop), Err(Error::UnknownFrameType(5)));
        let noop = Bytes::from_static(&[0x80, 0x02, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(
            decode(noop).unwrap(),
            Frame::Control {
                version: Version::V2,
                body: Control::Noop
            }
        );

        let v4 = Bytes::from_static(&[0x80, 0x04, 0x00, 0x06, 0x00, 0x00, 0x00, 0x04, 0, 0, 0, 1]);
        let err = decode(v4).unwrap_err();
        assert_eq!(err, Error::UnsupportedVersion(4));
        assert!(err.is_fatal());
    }

    #[test]
    fn data_frame_requires_stream() {
        let data = Bytes::from_static(&[0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]);
        assert_eq!(
            decode(data),
            Err(Error::Malformed(Malformed::InvalidStreamId))
        );

        let data = Bytes::from_static(&[0x00, 0x00, 0x00, 0x01, 0x01, 0x00, 0x00, 0x03, b'a', b'b', b'c']);
        match decode(data).unwrap() {
            Frame::Data(frame) => {
                assert_eq!(frame.stream_id(), 1);
                assert!(frame.is_fin());
                assert_eq!(&frame.payload()[..], b"abc");
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn known_control_frame_bytes() {
        let rst = Frame::control(Version::V2, Reset::new(StreamId::from(1), Reason::PROTOCOL_ERROR));
        assert_eq!(
            &encode(&rst)[..],
            &[0x80, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01][..]
        );

        let go_away_v2 = Frame::control(Version::V2, GoAway::new(StreamId::from(0x7fff_ffff), GoAwayStatus::OK));
        assert_eq!(
            &encode(&go_away_v2)[..],
            &[0x80, 0x02, 0x00, 0x07, 0x00, 0x00, 0x00, 0x04, 0x7f, 0xff, 0xff, 0xff][..]
        );

        let go_away_v3 = Frame::control(
            Version::V3,
            GoAway::new(StreamId::from(0x7fff_ffff), GoAwayStatus::INTERNAL_ERROR),
        );
        assert_eq!(
            &encode(&go_away_v3)[..],
            &[0x80, 0x03, 0x00, 0x07, 0x00, 0x00, 0x00, 0x08, 0x7f, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x02][..]
        );

        let window = Frame::control(Version::V3, WindowUpdate::new(StreamId::from(1), 0x7fff_ffff));
        assert_eq!(
            &encode(&window)[..],
            &[0x80, 0x03, 0x00, 0x09, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x01, 0x7f, 0xff, 0xff, 0xff][..]
        );

        let reply = Frame::control(Version::V2, {
            let mut reply = SynReply::new(StreamId::from(1), HeaderBlock::new());
            reply.set_fin(true);
            reply
        });
        assert_eq!(
            &encode(&reply)[..],
            &[0x80, 0x02, 0x00, 0x02, 0x01, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00][..]
        );
    }

    #[test]
    fn window_update_reserved_bit_is_ignored() {
        let src = Bytes::from_static(&[
            0x80, 0x03, 0x00, 0x09, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00,
            0x00, 0x10,
        ]);
        match decode(src).unwrap() {
            Frame::Control {
                body: Control::WindowUpdate(update),
                ..
            } => {
                assert!(update.stream_id().is_zero());
                assert_eq!(update.delta(), 0x10);
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn fixed_size_frames_check_their_length() {
        let ping = Bytes::from_static(&[0x80, 0x03, 0x00, 0x06, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01]);
        assert_eq!(
            decode(ping),
            Err(Error::Malformed(Malformed::InvalidPayloadLength))
        );

        // spdy/3 GOAWAY needs the status field
        let go_away = Bytes::from_static(&[0x80, 0x03, 0x00, 0x07, 0x00, 0x00, 0x00, 0x04, 0, 0, 0, 1]);
        assert_eq!(
            decode(go_away),
            Err(Error::Malformed(Malformed::InvalidPayloadLength))
        );
    }
}
