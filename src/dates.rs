//! The two date encodings used by 2D-Doc.
//!
//! Header dates are four hex digits counting days since 2000-01-01, with
//! `FFFF` meaning the date is not set. Body dates are `DDMMYYYY` optionally
//! followed by `HHMM`; a missing time means noon.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

const UNKNOWN_HEADER_DATE: &str = "FFFF";

fn epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2000, 1, 1)
}

pub fn header_date(hex: &str) -> Option<NaiveDate> {
    if hex.is_empty() || hex.eq_ignore_ascii_case(UNKNOWN_HEADER_DATE) {
        return None;
    }
    let days = u32::from_str_radix(hex, 16).ok()?;
    epoch()?.checked_add_days(Days::new(u64::from(days)))
}

fn digits(s: &str, from: usize, len: usize) -> Option<u32> {
    s.get(from..from + len)?.parse().ok()
}

/// Returns `None` when the digits do not name a real calendar date or time.
pub fn body_date(s: &str) -> Option<NaiveDateTime> {
    let day = digits(s, 0, 2)?;
    let month = digits(s, 2, 2)?;
    let year = digits(s, 4, 4)?;
    let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;

    let time = if s.len() > 8 {
        NaiveTime::from_hms_opt(digits(s, 8, 2)?, digits(s, 10, 2)?, 0)?
    } else {
        NaiveTime::from_hms_opt(12, 0, 0)?
    };
    Some(date.and_time(time))
}
