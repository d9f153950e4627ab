use std::fmt;

use crate::frame::Reason;
use crate::proto::{WindowSize, MAX_WINDOW_SIZE};

// A WINDOW_UPDATE goes out once half of the initial window has been consumed
// and handed to the application.
const UNCLAIMED_NUMERATOR: i32 = 1;
const UNCLAIMED_DENOMINATOR: i32 = 2;

/// One direction of credit for a stream or the whole session.
#[derive(Copy, Clone, Debug)]
pub struct FlowControl {
    window_size: Window,
    initial: WindowSize,
    // received and delivered, not yet announced back to the peer
    unclaimed: WindowSize,
    enabled: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Reservation {
    Granted(WindowSize),
    Blocked,
}

impl FlowControl {
    pub fn new(initial: WindowSize) -> FlowControl {
        FlowControl {
            window_size: Window(initial as i32),
            initial,
            unclaimed: 0,
            enabled: true,
        }
    }

    /// Unlimited credit, for versions without flow control.
    pub fn disabled() -> FlowControl {
        FlowControl {
            enabled: false,
            ..FlowControl::new(MAX_WINDOW_SIZE)
        }
    }

    pub fn window_size(&self) -> Window {
        self.window_size
    }

    pub fn available(&self) -> WindowSize {
        if self.enabled {
            self.window_size.as_size()
        } else {
            MAX_WINDOW_SIZE
        }
    }

    pub fn reserve(&self, sz: WindowSize) -> Reservation {
        let available = self.available();
        if sz > 0 && available == 0 {
            Reservation::Blocked
        } else {
            Reservation::Granted(std::cmp::min(sz, available))
        }
    }

    pub fn consume(&mut self, sz: WindowSize) {
        if !self.enabled {
            return;
        }

        tracing::trace!("consume; sz={}; window={}", sz, self.window_size);
        debug_assert!(self.window_size >= sz);
        self.window_size -= sz;
    }

    /// Gives back credit for queued data that will never be sent.
    pub fn reclaim(&mut self, sz: WindowSize) {
        if self.enabled {
            self.window_size += sz;
        }
    }

    /// Applies a WINDOW_UPDATE. Zero deltas and growth past 2^31-1 are
    /// flow-control errors.
    pub fn replenish(&mut self, sz: WindowSize) -> Result<(), Reason> {
        if !self.enabled {
            return Ok(());
        }

        if sz == 0 {
            return Err(Reason::FLOW_CONTROL_ERROR);
        }

        let (val, overflow) = self.window_size.0.overflowing_add(sz as i32);

        if overflow || sz > MAX_WINDOW_SIZE {
            return Err(Reason::FLOW_CONTROL_ERROR);
        }

        if val > MAX_WINDOW_SIZE as i32 {
            return Err(Reason::FLOW_CONTROL_ERROR);
        }

        tracing::trace!(
            "replenish; sz={}; old={}; new={}",
            sz,
            self.window_size,
            val
        );

        self.window_size = Window(val);
        Ok(())
    }

    /// Moves the window by the difference between an old and a new initial
    /// window size. The result may be negative.
    pub fn apply_initial_delta(&mut self, old: WindowSize, new: WindowSize) {
        if !self.enabled {
            return;
        }

        let delta = new as i64 - old as i64;
        let val = (self.window_size.0 as i64 + delta)
            .max(i32::MIN as i64)
            .min(MAX_WINDOW_SIZE as i64);

        tracing::trace!(
            "apply_initial_delta; delta={}; old={}; new={}",
            delta,
            self.window_size,
            val
        );

        self.window_size = Window(val as i32);
        self.initial = new;
    }

    /// Accounts for a received DATA payload. More than the window allows is
    /// a flow-control violation.
    pub fn recv_data(&mut self, sz: WindowSize) -> Result<(), Reason> {
        if !self.enabled {
            return Ok(());
        }

        if self.window_size < sz {
            tracing::debug!(
                "recv_data; sz={}; window={} -- flow control violation",
                sz,
                self.window_size
            );
            return Err(Reason::FLOW_CONTROL_ERROR);
        }

        self.window_size -= sz;
        Ok(())
    }

    /// Marks `sz` received bytes as consumed. Returns the increment to
    /// announce once enough has piled up.
    pub fn release(&mut self, sz: WindowSize) -> Option<WindowSize> {
        if !self.enabled || sz == 0 {
            return None;
        }

        self.unclaimed += sz;

        let threshold = self.initial as i32 / UNCLAIMED_DENOMINATOR * UNCLAIMED_NUMERATOR;
        if (self.unclaimed as i32) < threshold {
            return None;
        }

        let inc = self.unclaimed;
        self.unclaimed = 0;
        self.window_size += inc;
        Some(inc)
    }
}

/// A signed window. It can dip below zero after the peer shrinks the initial
/// window size.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Window(i32);

impl Window {
    pub fn as_size(&self) -> WindowSize {
        if self.0 < 0 {
            0
        } else {
            self.0 as WindowSize
        }
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

impl PartialEq<WindowSize> for Window {
    fn eq(&self, other: &WindowSize) -> bool {
        if self.0 < 0 {
            false
        } else {
            (self.0 as WindowSize).eq(other)
        }
    }
}

impl PartialOrd<WindowSize> for Window {
    fn partial_cmp(&self, other: &WindowSize) -> Option<::std::cmp::Ordering> {
        if self.0 < 0 {
            Some(::std::cmp::Ordering::Less)
        } else {
            (self.0 as WindowSize).partial_cmp(other)
        }
    }
}

impl ::std::ops::SubAssign<WindowSize> for Window {
    fn sub_assign(&mut self, other: WindowSize) {
        self.0 -= other as i32;
    }
}

impl ::std::ops::AddAssign<WindowSize> for Window {
    fn add_assign(&mut self, other: WindowSize) {
        self.0 += other as i32;
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Credit for a DATA frame must come from both the stream and the session.
pub fn reserve(session: &FlowControl, stream: &FlowControl, sz: WindowSize) -> Reservation {
    match (session.reserve(sz), stream.reserve(sz)) {
        (Reservation::Granted(a), Reservation::Granted(b)) => {
            Reservation::Granted(std::cmp::min(a, b))
        }
        _ => Reservation::Blocked,
    }
}
