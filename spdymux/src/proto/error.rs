use std::{fmt, io};

use crate::frame::{self, GoAwayStatus, Reason};

/// Why the session as a whole failed.
#[derive(Debug)]
pub(crate) enum Error {
    Frame(frame::Error),
    Proto(Reason),
    Io(io::Error),
}

impl Error {
    pub(crate) fn shallow_clone(&self) -> Error {
        match *self {
            Error::Frame(ref err) => Error::Frame(err.clone()),
            Error::Proto(reason) => Error::Proto(reason),
            Error::Io(ref io) => Error::Io(io::Error::from(io.kind())),
        }
    }

    /// Status announced in the GOAWAY that precedes teardown.
    pub(crate) fn go_away_status(&self) -> GoAwayStatus {
        match *self {
            Error::Frame(_) | Error::Proto(_) => GoAwayStatus::PROTOCOL_ERROR,
            Error::Io(_) => GoAwayStatus::INTERNAL_ERROR,
        }
    }
}

impl From<frame::Error> for Error {
    fn from(src: frame::Error) -> Self {
        Error::Frame(src)
    }
}

impl From<Reason> for Error {
    fn from(src: Reason) -> Self {
        Error::Proto(src)
    }
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Error::Io(src)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Frame(ref err) => fmt::Display::fmt(err, fmt),
            Error::Proto(ref reason) => fmt::Display::fmt(reason, fmt),
            Error::Io(ref err) => fmt::Display::fmt(err, fmt),
        }
    }
}
