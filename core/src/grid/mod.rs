//! Parameter grid enumeration.
//!
//! The grid is the Cartesian product of two closed integer axes, always
//! enumerated with `i` as the outer axis and `j` as the inner axis. That
//! order is the canonical order used for admission and for final reports.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound of each axis in the default grid.
pub const DEFAULT_AXIS_MAX: i64 = 63;

/// One grid coordinate. `Ord` follows canonical enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParameterPair {
    pub i: i64,
    pub j: i64,
}

impl ParameterPair {
    pub fn new(i: i64, j: i64) -> Self {
        Self { i, j }
    }
}

impl fmt::Display for ParameterPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}

/// Closed integer range `min..=max`. Its length always fits in `usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisRange {
    min: i64,
    max: i64,
    #[serde(skip)]
    len: usize,
}

impl AxisRange {
    pub fn new(name: &'static str, min: i64, max: i64) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidAxis { name, min, max });
        }
        let len = max
            .checked_sub(min)
            .and_then(|d| usize::try_from(d).ok())
            .and_then(|d| d.checked_add(1))
            .ok_or(ConfigError::AxisTooWide { name, min, max })?;
        Ok(Self { min, max, len })
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, v: i64) -> bool {
        (self.min..=self.max).contains(&v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridSpec {
    pub i: AxisRange,
    pub j: AxisRange,
    #[serde(skip)]
    len: usize,
}

impl GridSpec {
    /// Fails when the number of pairs does not fit in `usize`.
    pub fn new(i: AxisRange, j: AxisRange) -> Result<Self, ConfigError> {
        let len = i
            .len()
            .checked_mul(j.len())
            .ok_or(ConfigError::GridTooLarge {
                i_len: i.len(),
                j_len: j.len(),
            })?;
        Ok(Self { i, j, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, pair: ParameterPair) -> bool {
        self.i.contains(pair.i) && self.j.contains(pair.j)
    }

    /// Restartable iterator over every pair in canonical order.
    pub fn pairs(&self) -> GridIter {
        GridIter {
            spec: *self,
            next: 0,
        }
    }
}

impl IntoIterator for &GridSpec {
    type Item = ParameterPair;
    type IntoIter = GridIter;

    fn into_iter(self) -> GridIter {
        self.pairs()
    }
}

#[derive(Debug, Clone)]
pub struct GridIter {
    spec: GridSpec,
    next: usize,
}

impl Iterator for GridIter {
    type Item = ParameterPair;

    fn next(&mut self) -> Option<ParameterPair> {
        if self.next >= self.spec.len() {
            return None;
        }
        let width = self.spec.j.len();
        let i = self.spec.i.min + (self.next / width) as i64;
        let j = self.spec.j.min + (self.next % width) as i64;
        self.next += 1;
        Some(ParameterPair { i, j })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.spec.len() - self.next;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for GridIter {}
