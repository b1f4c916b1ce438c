//! Types for use as [crate::Read::Cfg].

use core::ops::{Bound, RangeBounds};

/// Configuration for limiting the length of a variable-length value.
///
/// # Examples
///
/// ```
/// use vigil_codec::RangeCfg;
///
/// let cfg = RangeCfg::new(0..=1024);
/// assert!(cfg.contains(&500));
/// assert!(!cfg.contains(&2000));
///
/// let exact: RangeCfg = (32..=32).into();
/// assert!(exact.contains(&32));
/// assert!(!exact.contains(&31));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RangeCfg {
    /// The lower bound of the range.
    start: Bound<usize>,

    /// The upper bound of the range.
    end: Bound<usize>,
}

impl RangeCfg {
    /// Creates a new `RangeCfg` from any type implementing `RangeBounds<usize>`.
    pub fn new<R: RangeBounds<usize>>(r: R) -> Self {
        Self {
            start: r.start_bound().cloned(),
            end: r.end_bound().cloned(),
        }
    }

    /// Returns `true` if `value` lies within the configured range.
    pub fn contains(&self, value: &usize) -> bool {
        (self.start, self.end).contains(value)
    }
}

impl Default for RangeCfg {
    fn default() -> Self {
        Self::new(..)
    }
}

impl From<core::ops::Range<usize>> for RangeCfg {
    fn from(r: core::ops::Range<usize>) -> Self {
        Self::new(r)
    }
}

impl From<core::ops::RangeInclusive<usize>> for RangeCfg {
    fn from(r: core::ops::RangeInclusive<usize>) -> Self {
        Self::new(r)
    }
}

impl From<core::ops::RangeFrom<usize>> for RangeCfg {
    fn from(r: core::ops::RangeFrom<usize>) -> Self {
        Self::new(r)
    }
}

impl From<core::ops::RangeTo<usize>> for RangeCfg {
    fn from(r: core::ops::RangeTo<usize>) -> Self {
        Self::new(r)
    }
}

impl From<core::ops::RangeToInclusive<usize>> for RangeCfg {
    fn from(r: core::ops::RangeToInclusive<usize>) -> Self {
        Self::new(r)
    }
}

impl From<core::ops::RangeFull> for RangeCfg {
    fn from(_: core::ops::RangeFull) -> Self {
        Self::new(..)
    }
}
