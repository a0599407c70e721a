//! Ternary entry encoding and matching.
//!
//! An entry is stored the way the silicon stores it: two masks derived from
//! the driver-level (value, mask) pair. `w0` has a bit set where the search
//! key is allowed to carry 0, `w1` where it is allowed to carry 1. A
//! don't-care position sets both; the power-on image (both zero) can match
//! nothing. Match words are kept in the low bits of a u64; bits above the
//! generation's match width are forced to don't-care when an entry is
//! written into a bank.

/// One ternary TCAM entry.
///
/// Besides the match masks, an entry carries the stored `action` payload bit
/// (surfaced as the action-bit of a priority-mode hit) and the `boundary`
/// marker consumed by multi-row duplication spreading. Fresh entries match
/// nothing, carry no action, and are boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcamEntry {
    w0: u64,
    w1: u64,
    action: bool,
    boundary: bool,
}

impl TcamEntry {
    /// The power-on entry image: matches no key at all.
    pub const fn never_match() -> Self {
        TcamEntry {
            w0: 0,
            w1: 0,
            action: false,
            boundary: true,
        }
    }

    /// An all-don't-care entry: matches every key (catch-all rules).
    pub const fn always_match() -> Self {
        TcamEntry {
            w0: u64::MAX,
            w1: u64::MAX,
            action: false,
            boundary: true,
        }
    }

    /// Encodes a driver-level (value, mask) pair.
    ///
    /// A set mask bit means the key must equal `value` at that position; a
    /// clear mask bit is don't-care.
    pub const fn from_value_mask(value: u64, mask: u64) -> Self {
        TcamEntry {
            w0: !(value & mask),
            w1: !(!value & mask),
            action: false,
            boundary: true,
        }
    }

    /// Wraps raw register images of the two mask planes.
    pub const fn from_raw(w0: u64, w1: u64) -> Self {
        TcamEntry {
            w0,
            w1,
            action: false,
            boundary: true,
        }
    }

    /// Sets the stored action payload bit.
    pub const fn with_action(mut self, action: bool) -> Self {
        self.action = action;
        self
    }

    /// Sets the boundary marker (false lets MRD spread inherit hits).
    pub const fn with_boundary(mut self, boundary: bool) -> Self {
        self.boundary = boundary;
        self
    }

    /// Returns the stored action payload bit.
    pub const fn action(&self) -> bool {
        self.action
    }

    /// Returns true if this entry is an MRD boundary.
    pub const fn is_boundary(&self) -> bool {
        self.boundary
    }

    /// Returns the raw (w0, w1) register images.
    pub const fn raw(&self) -> (u64, u64) {
        (self.w0, self.w1)
    }

    /// Ternary compare against a search key.
    ///
    /// The key contributes `s0 = !key` and `s1 = key`; the entry hits iff no
    /// key bit falls outside its allowed planes.
    pub const fn matches(&self, key: u64) -> bool {
        ((!self.w0 & !key) | (!self.w1 & key)) == 0
    }

    /// Forces bits above the match width to don't-care.
    ///
    /// Banks apply this when an entry is written; the silicon has no mask
    /// cells above the generation's match width.
    pub(crate) const fn widened(self, key_mask: u64) -> Self {
        TcamEntry {
            w0: self.w0 | !key_mask,
            w1: self.w1 | !key_mask,
            action: self.action,
            boundary: self.boundary,
        }
    }
}

impl Default for TcamEntry {
    fn default() -> Self {
        TcamEntry::never_match()
    }
}
