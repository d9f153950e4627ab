use std::fmt;

/// Status code carried by RST_STREAM.
///
/// Unknown codes are preserved so they can be reported back to the
/// application unchanged.
#[derive(PartialEq, Eq, Hash, Clone, Copy)]
pub struct Reason(u32);

impl Reason {
    pub const PROTOCOL_ERROR: Reason = Reason(1);
    pub const INVALID_STREAM: Reason = Reason(2);
    pub const REFUSED_STREAM: Reason = Reason(3);
    pub const UNSUPPORTED_VERSION: Reason = Reason(4);
    pub const CANCEL: Reason = Reason(5);
    pub const INTERNAL_ERROR: Reason = Reason(6);
    pub const FLOW_CONTROL_ERROR: Reason = Reason(7);
    pub const STREAM_IN_USE: Reason = Reason(8);
    pub const STREAM_ALREADY_CLOSED: Reason = Reason(9);
    pub const INVALID_CREDENTIALS: Reason = Reason(10);
    pub const FRAME_TOO_LARGE: Reason = Reason(11);

    pub fn description(&self) -> &str {
        match self.0 {
            1 => "protocol error detected on the stream",
            2 => "frame received for a stream that is not active",
            3 => "stream refused before any processing",
            4 => "stream used an unsupported protocol version",
            5 => "stream no longer needed",
            6 => "implementation fault",
            7 => "flow-control protocol violated",
            8 => "stream id already in use",
            9 => "data or headers sent on a half-closed stream",
            10 => "credential slot did not match",
            11 => "frame too large to process",
            _ => "unknown reason",
        }
    }
}

impl From<u32> for Reason {
    fn from(src: u32) -> Reason {
        Reason(src)
    }
}

impl From<Reason> for u32 {
    fn from(src: Reason) -> u32 {
        src.0
    }
}

impl fmt::Debug for Reason {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let name = match self.0 {
            1 => "PROTOCOL_ERROR",
            2 => "INVALID_STREAM",
            3 => "REFUSED_STREAM",
            4 => "UNSUPPORTED_VERSION",
            5 => "CANCEL",
            6 => "INTERNAL_ERROR",
            7 => "FLOW_CONTROL_ERROR",
            8 => "STREAM_IN_USE",
            9 => "STREAM_ALREADY_CLOSED",
            10 => "INVALID_CREDENTIALS",
            11 => "FRAME_TOO_LARGE",
            other => return fmt.debug_tuple("Reason").field(&Hex(other)).finish(),
        };
        fmt.write_str(name)
    }
}

struct Hex(u32);

impl fmt::Debug for Hex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.description())
    }
}
