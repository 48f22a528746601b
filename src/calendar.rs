//! Month grids for the tour-booking calendar.
//!
//! Weeks start on Sunday. Dates before today (local date) cannot be picked.

use std::{collections::BTreeSet, fmt::Write as _};

use chrono::{Datelike, Month, NaiveDate};
use thiserror::Error;

use crate::traits::Clock;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("No such month: {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayCell {
    /// Padding before the first of the month.
    Blank,
    Day {
        date: NaiveDate,
        selectable: bool,
        /// A tour is already booked on this day.
        marked: bool,
    },
}

impl DayCell {
    pub fn day(&self) -> Option<u32> {
        match self {
            Self::Blank => None,
            Self::Day { date, .. } => Some(date.day()),
        }
    }
}

fn first_of(year: i32, month: u32) -> Result<NaiveDate, CalendarError> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(CalendarError::InvalidMonth { year, month })
}

/// Number of days in `month` (1-based) of `year`.
pub fn days_in_month(year: i32, month: u32) -> Result<u32, CalendarError> {
    first_of(year, month)?;
    let (next_year, next_month) = next_month(year, month);
    first_of(next_year, next_month)
        .ok()
        .and_then(|d| d.pred_opt())
        .map(|last| last.day())
        .ok_or(CalendarError::InvalidMonth { year, month })
}

/// Weekday of the first of the month, Sunday = 0.
pub fn first_weekday(year: i32, month: u32) -> Result<u32, CalendarError> {
    Ok(first_of(year, month)?.weekday().num_days_from_sunday())
}

pub fn is_selectable(date: NaiveDate, today: NaiveDate) -> bool {
    date >= today
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub first_weekday: u32,
    pub cells: Vec<DayCell>,
}

impl MonthGrid {
    /// Build the grid for `month` (1-based) of `year`, relative to `today`.
    pub fn new(year: i32, month: u32, today: NaiveDate) -> Result<Self, CalendarError> {
        let days_in_month = days_in_month(year, month)?;
        let first_weekday = first_weekday(year, month)?;

        let mut cells = Vec::with_capacity((first_weekday + days_in_month) as usize);
        cells.extend(std::iter::repeat_n(DayCell::Blank, first_weekday as usize));
        for day in 1..=days_in_month {
            let date = NaiveDate::from_ymd_opt(year, month, day)
                .ok_or(CalendarError::InvalidMonth { year, month })?;
            cells.push(DayCell::Day {
                date,
                selectable: is_selectable(date, today),
                marked: false,
            });
        }

        Ok(Self {
            year,
            month,
            days_in_month,
            first_weekday,
            cells,
        })
    }

    pub fn for_clock(year: i32, month: u32, clock: &dyn Clock) -> Result<Self, CalendarError> {
        Self::new(year, month, clock.today())
    }

    /// The grid for the month containing today.
    pub fn current(clock: &dyn Clock) -> Result<Self, CalendarError> {
        let today = clock.today();
        Self::new(today.year(), today.month(), today)
    }

    /// Flag days that already carry a booking.
    pub fn with_marked(mut self, dates: &BTreeSet<NaiveDate>) -> Self {
        for cell in &mut self.cells {
            if let DayCell::Day { date, marked, .. } = cell {
                *marked = dates.contains(date);
            }
        }
        self
    }

    pub fn leading_blanks(&self) -> usize {
        self.cells
            .iter()
            .take_while(|c| matches!(c, DayCell::Blank))
            .count()
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell]> {
        self.cells.chunks(7)
    }

    pub fn title(&self) -> String {
        let name = u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("?");
        format!("{name} {}", self.year)
    }

    /// Plain-text rendering. Past days are suffixed with `.`, booked days
    /// with `*`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:^28}", self.title());
        out.push_str(" Su  Mo  Tu  We  Th  Fr  Sa\n");

        for week in self.weeks() {
            for cell in week {
                match cell {
                    DayCell::Blank => out.push_str("    "),
                    DayCell::Day {
                        date,
                        selectable,
                        marked,
                    } => {
                        let flag = match (marked, selectable) {
                            (true, _) => '*',
                            (false, false) => '.',
                            (false, true) => ' ',
                        };
                        let _ = write!(out, " {:>2}{flag}", date.day());
                    }
                }
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::traits::MockClock;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_february_2026_grid() {
        let grid = MonthGrid::new(2026, 2, date(2026, 1, 1)).unwrap();

        assert_eq!(grid.days_in_month, 28);
        // 2026-02-01 is a Sunday.
        assert_eq!(grid.first_weekday, 0);
        assert_eq!(grid.leading_blanks(), grid.first_weekday as usize);
        assert_eq!(grid.cells.len(), grid.first_weekday as usize + 28);

        let numbered: Vec<u32> = grid.cells.iter().filter_map(DayCell::day).collect();
        assert_eq!(numbered, (1..=28).collect::<Vec<_>>());
    }

    #[test]
    fn test_january_2026_has_four_leading_blanks() {
        let grid = MonthGrid::new(2026, 1, date(2025, 12, 1)).unwrap();
        assert_eq!(grid.first_weekday, 4); // Thursday
        assert_eq!(grid.leading_blanks(), 4);
        assert_eq!(grid.cells.len(), 4 + 31);
        assert_eq!(grid.weeks().count(), 5);
    }

    #[test]
    fn test_leap_year_february() {
        assert_eq!(days_in_month(2024, 2).unwrap(), 29);
        assert_eq!(days_in_month(2100, 2).unwrap(), 28);
        assert_eq!(days_in_month(2026, 12).unwrap(), 31);
    }

    #[test]
    fn test_invalid_month() {
        assert_eq!(
            MonthGrid::new(2026, 13, date(2026, 1, 1)),
            Err(CalendarError::InvalidMonth {
                year: 2026,
                month: 13
            })
        );
        assert!(days_in_month(2026, 0).is_err());
    }

    #[test]
    fn test_past_days_unselectable_today_selectable() {
        let today = date(2026, 2, 10);
        let grid = MonthGrid::new(2026, 2, today).unwrap();

        for cell in &grid.cells {
            if let DayCell::Day {
                date, selectable, ..
            } = cell
            {
                assert_eq!(*selectable, *date >= today, "{date}");
            }
        }
    }

    #[test]
    fn test_grid_from_mock_clock() {
        let clock = MockClock::new(Utc.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).unwrap());
        let grid = MonthGrid::current(&clock).unwrap();
        assert_eq!((grid.year, grid.month), (2026, 2));
    }

    #[test]
    fn test_marked_days() {
        let booked: BTreeSet<NaiveDate> = [date(2026, 2, 14)].into_iter().collect();
        let grid = MonthGrid::new(2026, 2, date(2026, 2, 1))
            .unwrap()
            .with_marked(&booked);

        let marked: Vec<u32> = grid
            .cells
            .iter()
            .filter(|c| matches!(c, DayCell::Day { marked: true, .. }))
            .filter_map(DayCell::day)
            .collect();
        assert_eq!(marked, vec![14]);
        assert!(grid.render().contains("14*"));
    }

    #[test]
    fn test_month_navigation_wraps_years() {
        assert_eq!(next_month(2026, 12), (2027, 1));
        assert_eq!(previous_month(2026, 1), (2025, 12));
        assert_eq!(next_month(2026, 2), (2026, 3));
    }

    #[test]
    fn test_title() {
        let grid = MonthGrid::new(2026, 2, date(2026, 1, 1)).unwrap();
        assert_eq!(grid.title(), "February 2026");
    }

    // ==================== Property-Based Tests ====================

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn grid_is_blanks_then_every_day(year in 1970i32..2200, month in 1u32..=12) {
                let grid = MonthGrid::new(year, month, date(1970, 1, 1)).unwrap();
                prop_assert!(grid.first_weekday < 7);
                prop_assert_eq!(grid.leading_blanks(), grid.first_weekday as usize);
                prop_assert_eq!(
                    grid.cells.len(),
                    (grid.first_weekday + grid.days_in_month) as usize
                );
                prop_assert!((28..=31).contains(&grid.days_in_month));
            }

            #[test]
            fn consecutive_months_line_up(year in 1970i32..2200, month in 1u32..=12) {
                let (ny, nm) = next_month(year, month);
                let expected = (first_weekday(year, month).unwrap()
                    + days_in_month(year, month).unwrap()) % 7;
                prop_assert_eq!(first_weekday(ny, nm).unwrap(), expected);
            }
        }
    }
}
