use bytes::BufMut;
use serde::Deserialize;
use std::fmt;

use super::bits::*;
use super::{Error, IllegalBits, Priority, StreamId};

/// Negotiated protocol revision. It decides the priority width, the header
/// block integer width and a handful of payload layouts.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize)]
pub enum Version {
    #[serde(rename = "spdy/2", alias = "2")]
    V2,
    #[serde(rename = "spdy/3", alias = "3")]
    V3,
}

#[repr(u16)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Kind {
    SynStream = 1,
    SynReply = 2,
    Reset = 3,
    Settings = 4,
    Noop = 5,
    Ping = 6,
    GoAway = 7,
    Headers = 8,
    WindowUpdate = 9,
}

/// The eight byte prefix of every frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Head {
    Control {
        version: Version,
        kind: Kind,
        flags: u8,
        length: usize,
    },
    Data {
        stream_id: StreamId,
        flags: u8,
        length: usize,
    },
}

// ===== impl Version =====

impl Version {
    pub fn from_wire(version: u16) -> Option<Version> {
        match version {
            2 => Some(Version::V2),
            3 => Some(Version::V3),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Version::V2 => 2,
            Version::V3 => 3,
        }
    }

    pub fn priority_mask(self) -> u8 {
        match self {
            Version::V2 => V2_PRIORITY_MASK,
            Version::V3 => V3_PRIORITY_MASK,
        }
    }

    pub fn priority_shift(self) -> u32 {
        match self {
            Version::V2 => V2_PRIORITY_SHIFT,
            Version::V3 => V3_PRIORITY_SHIFT,
        }
    }

    /// Number of distinct priority tiers: 4 for SPDY/2, 8 for SPDY/3.
    pub fn tiers(self) -> u8 {
        (self.priority_mask() >> self.priority_shift()) + 1
    }

    pub fn lowest_priority(self) -> Priority {
        Priority::new(self.tiers() - 1)
    }

    /// SPDY/2 has no flow control at all.
    pub fn has_flow_control(self) -> bool {
        self == Version::V3
    }

    pub(crate) fn header_block_width(self) -> usize {
        match self {
            Version::V2 => 2,
            Version::V3 => 4,
        }
    }

    pub(crate) fn knows(self, kind: Kind) -> bool {
        match kind {
            Kind::Noop => self == Version::V2,
            Kind::WindowUpdate => self == Version::V3,
            _ => true,
        }
    }
}

impl Default for Version {
    fn default() -> Version {
        Version::V3
    }
}

impl fmt::Display for Version {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "spdy/{}", self.as_u16())
    }
}

// ===== impl Kind =====

impl Kind {
    pub fn new(byte: u16) -> Option<Kind> {
        Some(match byte {
            1 => Kind::SynStream,
            2 => Kind::SynReply,
            3 => Kind::Reset,
            4 => Kind::Settings,
            5 => Kind::Noop,
            6 => Kind::Ping,
            7 => Kind::GoAway,
            8 => Kind::Headers,
            9 => Kind::WindowUpdate,
            _ => return None,
        })
    }

    pub fn legal_flags(self) -> u8 {
        match self {
            Kind::SynStream => CONTROL_FLAG_FIN | CONTROL_FLAG_UNIDIRECTIONAL,
            Kind::SynReply | Kind::Headers => CONTROL_FLAG_FIN,
            Kind::Settings => SETTINGS_FLAG_CLEAR,
            _ => 0,
        }
    }
}

// ===== impl Head =====

impl Head {
    /// Parses the frame prefix. `header` must hold at least `HEADER_LEN`
    /// bytes.
    pub fn parse(header: &[u8]) -> Result<Head, Error> {
        debug_assert!(header.len() >= HEADER_LEN);

        let flags = header[4];
        let length = (unpack_octets_4!(header, 4, u32) & LENGTH_MASK) as usize;

        if header[0] & CONTROL_FLAG == CONTROL_FLAG {
            let raw_version = u16::from_be_bytes([header[0], header[1]]) & VERSION_MASK;
            let version =
                Version::from_wire(raw_version).ok_or(Error::UnsupportedVersion(raw_version))?;

            let raw_kind = u16::from_be_bytes([header[2], header[3]]);
            let kind = match Kind::new(raw_kind) {
                Some(kind) if version.knows(kind) => kind,
                _ => return Err(Error::UnknownFrameType(raw_kind)),
            };

            check_flags(flags, kind.legal_flags())?;

            Ok(Head::Control {
                version,
                kind,
                flags,
                length,
            })
        } else {
            check_flags(flags, DATA_FLAG_MASK)?;

            Ok(Head::Data {
                stream_id: StreamId::from(unpack_octets_4!(header, 0, u32)),
                flags,
                length,
            })
        }
    }

    pub fn length(&self) -> usize {
        match *self {
            Head::Control { length, .. } | Head::Data { length, .. } => length,
        }
    }

    pub fn encode_control<T: BufMut>(
        version: Version,
        kind: Kind,
        flags: u8,
        length: usize,
        dst: &mut T,
    ) {
        debug_assert!(length as u32 <= LENGTH_MASK);
        dst.put_u16(((CONTROL_FLAG as u16) << 8) | version.as_u16());
        dst.put_u16(kind as u16);
        dst.put_u32(((flags as u32) << 24) | (length as u32 & LENGTH_MASK));
    }

    pub fn encode_data<T: BufMut>(stream_id: StreamId, flags: u8, length: usize, dst: &mut T) {
        debug_assert!(length as u32 <= LENGTH_MASK);
        dst.put_u32(u32::from(stream_id));
        dst.put_u32(((flags as u32) << 24) | (length as u32 & LENGTH_MASK));
    }
}

fn check_flags(flags: u8, mask: u8) -> Result<(), Error> {
    if flags & !mask != 0 {
        return Err(Error::IllegalBits(IllegalBits::Flags { flags, mask }));
    }
    Ok(())
}
