use std::fmt;

use super::{Error, Malformed};

/// Fails with `InvalidPayloadLength` unless the payload is exactly `len`
/// bytes long.
pub(super) fn expect_len(payload: &[u8], len: usize) -> Result<(), Error> {
    if payload.len() != len {
        return Err(Error::Malformed(Malformed::InvalidPayloadLength));
    }
    Ok(())
}

pub(super) fn expect_min_len(payload: &[u8], len: usize) -> Result<(), Error> {
    if payload.len() < len {
        return Err(Error::Malformed(Malformed::InvalidPayloadLength));
    }
    Ok(())
}

pub(super) fn debug_flags<'a, 'f: 'a>(
    fmt: &'a mut fmt::Formatter<'f>,
    bits: u8,
) -> DebugFlags<'a, 'f> {
    let result = write!(fmt, "({:#x}", bits);
    DebugFlags {
        fmt,
        result,
        started: false,
    }
}

pub(super) struct DebugFlags<'a, 'f: 'a> {
    fmt: &'a mut fmt::Formatter<'f>,
    result: fmt::Result,
    started: bool,
}

impl<'a, 'f: 'a> DebugFlags<'a, 'f> {
    pub(super) fn flag_if(&mut self, enabled: bool, name: &str) -> &mut Self {
        if enabled {
            self.result = self.result.and_then(|()| {
                let prefix = if self.started {
                    " | "
                } else {
                    self.started = true;
                    ": "
                };

                write!(self.fmt, "{}{}", prefix, name)
            });
        }
        self
    }

    pub(super) fn finish(&mut self) -> fmt::Result {
        self.result.and_then(|()| write!(self.fmt, ")"))
    }
}
