//! Bikram Sambat (BS) calendar conversion. Spreadsheets arrive with dates in
//! either Gregorian (AD) or BS form; the import reconciler uses the year to
//! tell them apart (a "2081" in a date cell cannot be Gregorian) and converts
//! BS values through the month-length table below.
//!
//! The table covers BS 2070-2090 (AD 2013-2034). BS month lengths do not
//! follow an arithmetic rule; like every BS implementation this one carries
//! the published per-year data. Epoch: BS 2070-01-01 = AD 2013-04-14.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{RosterError, RosterResult};

pub const BS_YEAR_MIN: i32 = 2070;
pub const BS_YEAR_MAX: i32 = 2090;

/// Days in each of the 12 BS months, for BS years 2070..=2090.
const BS_MONTH_DAYS: [[u8; 12]; 21] = [
    [31, 31, 31, 32, 31, 31, 29, 30, 30, 29, 30, 30], // 2070
    [31, 31, 32, 31, 31, 31, 29, 30, 30, 29, 29, 31], // 2071
    [31, 32, 31, 32, 31, 30, 29, 30, 29, 30, 29, 31], // 2072
    [31, 32, 31, 32, 31, 30, 29, 30, 29, 30, 30, 31], // 2073
    [31, 31, 31, 32, 31, 31, 29, 30, 30, 29, 30, 30], // 2074
    [31, 31, 32, 31, 31, 31, 29, 30, 30, 29, 30, 30], // 2075
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 30], // 2076
    [31, 32, 31, 32, 31, 31, 30, 29, 30, 29, 30, 30], // 2077
    [31, 31, 31, 32, 31, 31, 30, 29, 30, 29, 30, 30], // 2078
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30], // 2079
    [31, 32, 31, 32, 31, 30, 29, 30, 29, 29, 30, 31], // 2080
    [31, 31, 32, 32, 31, 30, 30, 30, 29, 30, 30, 30], // 2081
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30], // 2082
    [31, 31, 32, 31, 31, 30, 30, 30, 29, 30, 30, 30], // 2083
    [31, 31, 32, 31, 31, 30, 30, 30, 29, 30, 30, 30], // 2084
    [31, 32, 31, 32, 30, 31, 30, 30, 29, 30, 30, 30], // 2085
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30], // 2086
    [31, 31, 32, 31, 31, 31, 30, 30, 29, 30, 30, 30], // 2087
    [30, 31, 32, 32, 30, 31, 30, 30, 29, 30, 30, 30], // 2088
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30], // 2089
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30], // 2090
];

fn bs_epoch_ad() -> NaiveDate {
    NaiveDate::from_ymd_opt(2013, 4, 14).expect("valid epoch date")
}

/// A date in the Bikram Sambat calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BsDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl BsDate {
    pub fn new(year: i32, month: u32, day: u32) -> RosterResult<Self> {
        if !(BS_YEAR_MIN..=BS_YEAR_MAX).contains(&year) {
            return Err(RosterError::Validation(format!(
                "BS year {year} is outside the supported range {BS_YEAR_MIN}-{BS_YEAR_MAX}"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(RosterError::Validation(format!(
                "BS month {month} is invalid"
            )));
        }
        let days_in_month = month_days(year, month);
        if day < 1 || day > days_in_month {
            return Err(RosterError::Validation(format!(
                "BS day {day} is invalid for {year}-{month:02} ({days_in_month} days)"
            )));
        }
        Ok(Self { year, month, day })
    }
}

impl std::fmt::Display for BsDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02} BS", self.year, self.month, self.day)
    }
}

fn month_days(year: i32, month: u32) -> u32 {
    BS_MONTH_DAYS[(year - BS_YEAR_MIN) as usize][(month - 1) as usize] as u32
}

/// True when a year drawn from a date cell can only be a BS year. Gregorian
/// duty dates live in the 20xx range; anything at or beyond the supported BS
/// window start is read as BS.
pub fn is_bs_year(year: i32) -> bool {
    year >= BS_YEAR_MIN
}

/// Convert a BS date to its Gregorian equivalent.
pub fn bs_to_ad(bs: BsDate) -> RosterResult<NaiveDate> {
    // Re-validate so callers can construct BsDate literals in tests.
    let bs = BsDate::new(bs.year, bs.month, bs.day)?;

    let mut days: i64 = 0;
    for year in BS_YEAR_MIN..bs.year {
        for month in 1..=12 {
            days += month_days(year, month) as i64;
        }
    }
    for month in 1..bs.month {
        days += month_days(bs.year, month) as i64;
    }
    days += (bs.day - 1) as i64;

    Ok(bs_epoch_ad() + Duration::days(days))
}

/// Convert a Gregorian date to its BS equivalent.
pub fn ad_to_bs(date: NaiveDate) -> RosterResult<BsDate> {
    let mut remaining = (date - bs_epoch_ad()).num_days();
    if remaining < 0 {
        return Err(RosterError::Validation(format!(
            "date {date} is before the supported BS calendar window"
        )));
    }

    for year in BS_YEAR_MIN..=BS_YEAR_MAX {
        for month in 1..=12 {
            let len = month_days(year, month) as i64;
            if remaining < len {
                return Ok(BsDate { year, month, day: remaining as u32 + 1 });
            }
            remaining -= len;
        }
    }

    Err(RosterError::Validation(format!(
        "date {date} is after the supported BS calendar window"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn ad(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // New-year anchors: BS Baisakh 1 against the known Gregorian dates.
    #[rstest]
    #[case(2070, ad(2013, 4, 14))]
    #[case(2077, ad(2020, 4, 13))]
    #[case(2080, ad(2023, 4, 14))]
    #[case(2081, ad(2024, 4, 13))]
    #[case(2082, ad(2025, 4, 14))]
    #[case(2083, ad(2026, 4, 14))]
    fn new_year_anchors(#[case] bs_year: i32, #[case] expected: NaiveDate) {
        let bs = BsDate { year: bs_year, month: 1, day: 1 };
        assert_eq!(bs_to_ad(bs).unwrap(), expected);
        assert_eq!(ad_to_bs(expected).unwrap(), bs);
    }

    #[test]
    fn mid_year_anchor_poush() {
        // 2025-01-01 fell on Poush 17, 2081.
        let bs = BsDate { year: 2081, month: 9, day: 17 };
        assert_eq!(bs_to_ad(bs).unwrap(), ad(2025, 1, 1));
        assert_eq!(ad_to_bs(ad(2025, 1, 1)).unwrap(), bs);
    }

    #[test]
    fn round_trips_across_a_full_year() {
        let mut date = ad(2024, 4, 13);
        for _ in 0..366 {
            let bs = ad_to_bs(date).unwrap();
            assert_eq!(bs_to_ad(bs).unwrap(), date);
            date += Duration::days(1);
        }
    }

    #[test]
    fn rejects_out_of_range_years() {
        assert!(BsDate::new(2069, 1, 1).is_err());
        assert!(BsDate::new(2091, 1, 1).is_err());
        assert!(ad_to_bs(ad(2012, 1, 1)).is_err());
    }

    #[test]
    fn rejects_invalid_month_and_day() {
        assert!(BsDate::new(2081, 13, 1).is_err());
        assert!(BsDate::new(2081, 0, 1).is_err());
        // Baisakh 2081 has 31 days.
        assert!(BsDate::new(2081, 1, 32).is_err());
        assert!(BsDate::new(2081, 1, 0).is_err());
    }

    #[test]
    fn bs_year_heuristic() {
        assert!(is_bs_year(2081));
        assert!(!is_bs_year(2025));
    }
}
