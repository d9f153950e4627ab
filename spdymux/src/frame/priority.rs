use std::cmp;

use super::Version;

/// Stream priority tier. Zero is the most urgent; SPDY/2 has tiers 0..=3 and
/// SPDY/3 has tiers 0..=7.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(0);

    /// Tier count of the widest supported version.
    pub const MAX_TIERS: usize = 8;

    pub fn new(tier: u8) -> Priority {
        Priority(tier)
    }

    pub fn tier(self) -> u8 {
        self.0
    }

    /// Reads the priority bits out of the SYN_STREAM priority byte; unused
    /// low bits are ignored.
    pub(crate) fn load(version: Version, byte: u8) -> Priority {
        Priority((byte & version.priority_mask()) >> version.priority_shift())
    }

    /// Positions the tier in the high bits of the SYN_STREAM priority byte.
    ///
    /// A tier beyond what `version` can express is a caller bug; release
    /// builds clamp it to the lowest priority.
    pub(crate) fn to_wire(self, version: Version) -> u8 {
        let lowest = version.lowest_priority().0;
        debug_assert!(
            self.0 <= lowest,
            "priority {} out of range for {}",
            self.0,
            version
        );
        cmp::min(self.0, lowest) << version.priority_shift()
    }

    pub(crate) fn queue_index(self) -> usize {
        cmp::min(self.0 as usize, Priority::MAX_TIERS - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_position_per_version() {
        assert_eq!(Priority::new(3).to_wire(Version::V2), 0xc0);
        assert_eq!(Priority::new(7).to_wire(Version::V3), 0xe0);
        assert_eq!(Priority::new(1).to_wire(Version::V3), 0x20);
        assert_eq!(Priority::load(Version::V2, 0x7f), Priority::new(1));
        assert_eq!(Priority::load(Version::V3, 0x5f), Priority::new(2));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range")]
    fn out_of_range_tier_asserts() {
        Priority::new(4).to_wire(Version::V2);
    }
}
