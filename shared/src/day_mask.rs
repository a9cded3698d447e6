//! Per-month attendance mask.
//!
//! A month of attendance is held as a bitset indexed by `day - 1`. The
//! stored form is a fixed-length string with one character per day: `'O'`
//! for present and `'X'` for absent. Any character other than `'O'` reads
//! back as absent.

use std::fmt;

use thiserror::Error;

use crate::Error as AppError;

const PRESENT: char = 'O';
const ABSENT: char = 'X';

/// Longest month, in days.
pub const MAX_DAYS: usize = 31;

/// Attendance state of a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Present,
    Absent,
}

impl Mark {
    fn from_char(c: char) -> Self {
        if c == PRESENT {
            Mark::Present
        } else {
            Mark::Absent
        }
    }

    fn as_char(self) -> char {
        match self {
            Mark::Present => PRESENT,
            Mark::Absent => ABSENT,
        }
    }
}

impl From<bool> for Mark {
    fn from(present: bool) -> Self {
        if present {
            Mark::Present
        } else {
            Mark::Absent
        }
    }
}

/// Stored string length disagrees with the month it was read for.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("expected {expected} day marks, found {actual}")]
pub struct LengthMismatch {
    pub expected: usize,
    pub actual: usize,
}

impl LengthMismatch {
    /// Attach the store key the bad value was read from.
    pub fn at(self, key: &str) -> AppError {
        AppError::DataCorruption {
            key: key.to_string(),
            expected: self.expected,
            actual: self.actual,
        }
    }
}

/// Fixed-length sequence of marks, one per day of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayMask {
    bits: u32,
    len: u8,
}

impl DayMask {
    /// All-absent mask of `len` days. `len` is capped at [`MAX_DAYS`].
    pub fn absent(len: usize) -> Self {
        Self {
            bits: 0,
            len: len.min(MAX_DAYS) as u8,
        }
    }

    /// Decode a stored attendance string.
    ///
    /// `None` yields an all-absent mask. A string whose length is not
    /// `days_in_month` is rejected rather than padded or truncated.
    pub fn decode(raw: Option<&str>, days_in_month: usize) -> Result<Self, LengthMismatch> {
        let Some(raw) = raw else {
            return Ok(Self::absent(days_in_month));
        };

        let actual = raw.chars().count();
        if actual != days_in_month || actual > MAX_DAYS {
            return Err(LengthMismatch {
                expected: days_in_month,
                actual,
            });
        }

        let mut mask = Self::absent(days_in_month);
        for (index, c) in raw.chars().enumerate() {
            mask.set(index, Mark::from_char(c));
        }
        Ok(mask)
    }

    /// Render the stored form, always exactly `len()` characters.
    pub fn encode(&self) -> String {
        self.marks().map(Mark::as_char).collect()
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mark at a 0-based day index. Indexes past the end read as absent.
    pub fn get(&self, index: usize) -> Mark {
        if index < self.len() && self.bits & (1 << index) != 0 {
            Mark::Present
        } else {
            Mark::Absent
        }
    }

    /// Set the mark at a 0-based day index. Indexes past the end are ignored.
    pub fn set(&mut self, index: usize, mark: Mark) {
        if index >= self.len() {
            return;
        }
        match mark {
            Mark::Present => self.bits |= 1 << index,
            Mark::Absent => self.bits &= !(1 << index),
        }
    }

    /// Whether calendar day `day` (1-based) is marked present.
    pub fn is_present(&self, day: u32) -> bool {
        day >= 1 && self.get(day as usize - 1) == Mark::Present
    }

    pub fn count_present(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn marks(&self) -> impl Iterator<Item = Mark> + '_ {
        (0..self.len()).map(|index| self.get(index))
    }
}

impl fmt::Display for DayMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_when_missing() {
        let mask = DayMask::decode(None, 30).unwrap();
        assert_eq!(mask.len(), 30);
        assert_eq!(mask.count_present(), 0);
        assert_eq!(mask.encode(), "X".repeat(30));
    }

    #[test]
    fn test_decode_reads_present_days() {
        let raw = format!("XXO{}", "X".repeat(28));
        let mask = DayMask::decode(Some(&raw), 31).unwrap();
        assert_eq!(mask.count_present(), 1);
        assert!(mask.is_present(3));
        assert!(!mask.is_present(1));
        assert_eq!(mask.encode(), raw);
    }

    #[test]
    fn test_unknown_characters_are_absent() {
        let raw = format!("O-?{}", "X".repeat(25));
        let mask = DayMask::decode(Some(&raw), 28).unwrap();
        assert_eq!(mask.count_present(), 1);
        // Canonicalised on the way back out
        assert_eq!(mask.encode(), format!("O{}", "X".repeat(27)));
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let err = DayMask::decode(Some(&"X".repeat(28)), 29).unwrap_err();
        assert_eq!(err, LengthMismatch { expected: 29, actual: 28 });

        let err = DayMask::decode(Some(&"X".repeat(32)), 31).unwrap_err();
        assert_eq!(err.actual, 32);
    }

    #[test]
    fn test_set_is_idempotent() {
        let mut mask = DayMask::absent(31);
        mask.set(4, Mark::Present);
        let once = mask;
        mask.set(4, Mark::Present);
        assert_eq!(mask, once);
        assert_eq!(mask.count_present(), 1);

        mask.set(4, Mark::Absent);
        assert_eq!(mask.count_present(), 0);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut mask = DayMask::absent(28);
        mask.set(28, Mark::Present);
        assert_eq!(mask.count_present(), 0);
        assert_eq!(mask.get(30), Mark::Absent);
        assert!(!mask.is_present(0));
    }

    #[test]
    fn test_round_trip_every_month_length() {
        for len in 28..=31 {
            let mut mask = DayMask::absent(len);
            for index in (0..len).step_by(3) {
                mask.set(index, Mark::Present);
            }
            let decoded = DayMask::decode(Some(&mask.encode()), len).unwrap();
            assert_eq!(decoded, mask);
        }
    }
}
