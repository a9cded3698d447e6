//! Week-aligned calendar layout of a month's attendance.
//!
//! Weeks start on Sunday. `first_weekday` counts from Monday = 0, so the
//! 1st of the month needs `(first_weekday + 1) % 7` filler cells before it.
//! The first column is Sunday and its labels get the accent color, as do
//! holidays.

use serde::Serialize;

use crate::day_mask::{DayMask, Mark};
use crate::holidays::HolidaySet;
use crate::{Error, Result};

pub const WEEK: usize = 7;

/// Colors applied to day labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridStyle {
    /// Sundays and holidays
    pub accent_color: String,
    /// Everything else; `None` leaves the renderer's default
    pub default_color: Option<String>,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            accent_color: "#ff5551".to_string(),
            default_color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cell {
    Filler,
    Check,
    DayLabel {
        day: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
}

/// Rows of exactly seven cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarGrid {
    pub rows: Vec<Vec<Cell>>,
}

impl CalendarGrid {
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn cells(&self) -> impl DoubleEndedIterator<Item = &Cell> {
        self.rows.iter().flatten()
    }
}

/// Number of filler cells placed before the 1st.
pub fn leading_fillers(first_weekday: u8) -> usize {
    (first_weekday as usize + 1) % WEEK
}

pub fn build(
    days: &DayMask,
    first_weekday: u8,
    holidays: &HolidaySet,
    style: &GridStyle,
) -> Result<CalendarGrid> {
    if first_weekday as usize >= WEEK {
        return Err(Error::InvalidArgument(format!(
            "first weekday {} out of range 0..7",
            first_weekday
        )));
    }

    let mut cells = vec![Cell::Filler; leading_fillers(first_weekday)];

    for (index, mark) in days.marks().enumerate() {
        let day = index as u32 + 1;
        let cell = match mark {
            Mark::Present => Cell::Check,
            Mark::Absent => {
                let accent = cells.len() % WEEK == 0 || holidays.contains(&day);
                Cell::DayLabel {
                    day,
                    color: if accent {
                        Some(style.accent_color.clone())
                    } else {
                        style.default_color.clone()
                    },
                }
            }
        };
        cells.push(cell);
    }

    let trailing = (WEEK - cells.len() % WEEK) % WEEK;
    cells.extend(std::iter::repeat(Cell::Filler).take(trailing));

    Ok(CalendarGrid {
        rows: cells.chunks(WEEK).map(<[Cell]>::to_vec).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn label(day: u32, color: Option<&str>) -> Cell {
        Cell::DayLabel {
            day,
            color: color.map(str::to_string),
        }
    }

    #[test]
    fn test_february_starting_wednesday() {
        let grid = build(&DayMask::absent(28), 3, &HolidaySet::new(), &GridStyle::default()).unwrap();

        assert_eq!(grid.rows.len(), 5);
        assert_eq!(grid.cell_count(), 35);
        let leading = grid.cells().take_while(|c| **c == Cell::Filler).count();
        assert_eq!(leading, 4);
        let trailing = grid.cells().rev().take_while(|c| **c == Cell::Filler).count();
        assert_eq!(trailing, 3);
    }

    #[test]
    fn test_sunday_start_has_no_leading_fillers() {
        // Monday-based weekday 6 is Sunday
        let grid = build(&DayMask::absent(30), 6, &HolidaySet::new(), &GridStyle::default()).unwrap();
        assert_eq!(grid.rows[0][0], label(1, Some("#ff5551")));
        assert_eq!(grid.rows.len(), 5);
    }

    #[test]
    fn test_checks_and_colors() {
        let mut days = DayMask::absent(31);
        days.set(0, Mark::Present);
        let holidays = HolidaySet::from([3]);
        let style = GridStyle {
            accent_color: "red".to_string(),
            default_color: Some("black".to_string()),
        };

        // Starts on Friday: five fillers, day 1 in column 5, day 3 on Sunday
        let grid = build(&days, 4, &holidays, &style).unwrap();
        let first_row = &grid.rows[0];
        assert_eq!(first_row[..5], vec![Cell::Filler; 5][..]);
        assert_eq!(first_row[5], Cell::Check);
        assert_eq!(first_row[6], label(2, Some("black")));
        assert_eq!(grid.rows[1][0], label(3, Some("red")));
        assert_eq!(grid.rows[1][1], label(4, Some("black")));
        // Next Sunday
        assert_eq!(grid.rows[2][0], label(10, Some("red")));
    }

    #[test]
    fn test_holiday_off_sunday() {
        let holidays = HolidaySet::from([15]);
        let grid = build(&DayMask::absent(31), 0, &holidays, &GridStyle::default()).unwrap();
        let day15 = grid
            .cells()
            .find(|c| matches!(c, Cell::DayLabel { day: 15, .. }))
            .unwrap();
        assert_eq!(*day15, label(15, Some("#ff5551")));
        let day16 = grid
            .cells()
            .find(|c| matches!(c, Cell::DayLabel { day: 16, .. }))
            .unwrap();
        assert_eq!(*day16, label(16, None));
    }

    #[test]
    fn test_rejects_bad_weekday() {
        let err = build(&DayMask::absent(30), 7, &HolidaySet::new(), &GridStyle::default());
        assert!(matches!(err, Err(Error::InvalidArgument(_))));
    }

    proptest! {
        #[test]
        fn grid_rows_are_full_weeks(
            first_weekday in 0u8..7,
            len in 28usize..=31,
            bits in any::<u32>(),
        ) {
            let mut days = DayMask::absent(len);
            for index in 0..len {
                if bits & (1 << index) != 0 {
                    days.set(index, Mark::Present);
                }
            }

            let grid = build(&days, first_weekday, &HolidaySet::new(), &GridStyle::default()).unwrap();
            let leading = leading_fillers(first_weekday);

            prop_assert_eq!(grid.cell_count() % WEEK, 0);
            prop_assert!(grid.rows.iter().all(|row| row.len() == WEEK));
            prop_assert_eq!(grid.rows.len(), (leading + len).div_ceil(WEEK));
            prop_assert_eq!(leading, (first_weekday as usize + 1) % 7);
            prop_assert!(grid.cells().take(leading).all(|c| *c == Cell::Filler));
            let checks = grid.cells().filter(|c| **c == Cell::Check).count();
            prop_assert_eq!(checks, days.count_present());
        }
    }
}
