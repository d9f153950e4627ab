use std::{error, fmt, io};

use crate::codec::UserError;
use crate::frame::{self, GoAwayStatus, Reason};
use crate::proto;

/// Errors returned by a [`Session`](crate::Session) or carried in its
/// final [`Event::Closed`](crate::Event::Closed).
#[derive(Debug)]
pub struct Error {
    kind: Kind,
}

#[derive(Debug)]
enum Kind {
    /// Undecodable input; the session sent GOAWAY and closed.
    Frame(frame::Error),
    /// A protocol violation by the peer.
    Proto(Reason),
    /// The peer went away with a failure status.
    GoAway(GoAwayStatus),
    User(UserError),
    Io(io::Error),
}

impl Error {
    pub fn reason(&self) -> Option<Reason> {
        match self.kind {
            Kind::Proto(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn go_away_status(&self) -> Option<GoAwayStatus> {
        match self.kind {
            Kind::GoAway(status) => Some(status),
            _ => None,
        }
    }

    pub fn frame_error(&self) -> Option<&frame::Error> {
        match self.kind {
            Kind::Frame(ref err) => Some(err),
            _ => None,
        }
    }

    pub fn user_error(&self) -> Option<UserError> {
        match self.kind {
            Kind::User(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self.kind, Kind::Io(_))
    }

    pub fn get_io(&self) -> Option<&io::Error> {
        match self.kind {
            Kind::Io(ref e) => Some(e),
            _ => None,
        }
    }

    pub fn into_io(self) -> Option<io::Error> {
        match self.kind {
            Kind::Io(e) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn from_io(err: io::Error) -> Self {
        Error {
            kind: Kind::Io(err),
        }
    }

    pub(crate) fn from_go_away(status: GoAwayStatus) -> Self {
        Error {
            kind: Kind::GoAway(status),
        }
    }
}

impl From<proto::Error> for Error {
    fn from(src: proto::Error) -> Error {
        use crate::proto::Error::*;

        Error {
            kind: match src {
                Frame(err) => Kind::Frame(err),
                Proto(reason) => Kind::Proto(reason),
                Io(e) => Kind::Io(e),
            },
        }
    }
}

impl From<Reason> for Error {
    fn from(src: Reason) -> Error {
        Error {
            kind: Kind::Proto(src),
        }
    }
}

impl From<UserError> for Error {
    fn from(src: UserError) -> Error {
        Error {
            kind: Kind::User(src),
        }
    }
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Error {
        Error::from_io(src)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        use self::Kind::*;

        match self.kind {
            Frame(ref err) => write!(fmt, "frame error: {}", err),
            Proto(ref reason) => write!(fmt, "protocol error: {}", reason),
            GoAway(ref status) => write!(fmt, "peer went away: {}", status),
            User(ref e) => write!(fmt, "user error: {}", e),
            Io(ref e) => fmt::Display::fmt(e, fmt),
        }
    }
}

impl error::Error for Error {}
