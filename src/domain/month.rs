use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Truncate a date to the first day of its month.
pub fn normalize_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Parse a `MM-YYYY` string into the first day of that month.
/// Example: "02-2023" -> 2023-02-01
pub fn parse_month_year(input: &str) -> Result<NaiveDate, ParseMonthError> {
    let (month_str, year_str) = input
        .split_once('-')
        .ok_or_else(|| ParseMonthError::InvalidFormat(input.to_string()))?;

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if month_str.len() != 2 || year_str.len() != 4 || !all_digits(month_str) || !all_digits(year_str) {
        return Err(ParseMonthError::InvalidFormat(input.to_string()));
    }

    let month: u32 = month_str
        .parse()
        .map_err(|_| ParseMonthError::InvalidFormat(input.to_string()))?;
    let year: i32 = year_str
        .parse()
        .map_err(|_| ParseMonthError::InvalidFormat(input.to_string()))?;

    NaiveDate::from_ymd_opt(year, month, 1).ok_or(ParseMonthError::MonthOutOfRange(month))
}

/// Render a date as `MM-YYYY`. The day is ignored.
pub fn format_month_year(date: NaiveDate) -> String {
    format!("{:02}-{:04}", date.month(), date.year())
}

/// Number of whole months from `left` to `right`, both ends included.
/// Returns 0 when `right` falls in a month before `left`.
pub fn months_between_inclusive(left: NaiveDate, right: NaiveDate) -> i64 {
    let months = (right.year() as i64 - left.year() as i64) * 12
        + (right.month() as i64 - left.month() as i64)
        + 1;
    months.max(0)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseMonthError {
    #[error("invalid month format '{0}', expected MM-YYYY")]
    InvalidFormat(String),

    #[error("month {0} is out of range, expected 01-12")]
    MonthOutOfRange(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_month_year() {
        assert_eq!(parse_month_year("01-2023"), Ok(ymd(2023, 1, 1)));
        assert_eq!(parse_month_year("12-1999"), Ok(ymd(1999, 12, 1)));
    }

    #[test]
    fn test_parse_month_year_invalid() {
        assert!(matches!(
            parse_month_year("1-2023"),
            Err(ParseMonthError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_month_year("2023-01"),
            Err(ParseMonthError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_month_year("01/2023"),
            Err(ParseMonthError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_month_year("+1-2023"),
            Err(ParseMonthError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_month_year(" 07-2025 "),
            Err(ParseMonthError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_month_year("07-2025\n"),
            Err(ParseMonthError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_month_year(""),
            Err(ParseMonthError::InvalidFormat(_))
        ));
        assert_eq!(
            parse_month_year("13-2023"),
            Err(ParseMonthError::MonthOutOfRange(13))
        );
        assert_eq!(
            parse_month_year("00-2023"),
            Err(ParseMonthError::MonthOutOfRange(0))
        );
    }

    #[test]
    fn test_format_month_year() {
        assert_eq!(format_month_year(ymd(2023, 2, 1)), "02-2023");
        assert_eq!(format_month_year(ymd(2023, 11, 17)), "11-2023");
        assert_eq!(format_month_year(ymd(987, 3, 1)), "03-0987");
    }

    #[test]
    fn test_normalize_month() {
        assert_eq!(normalize_month(ymd(2024, 2, 29)), ymd(2024, 2, 1));
        assert_eq!(normalize_month(ymd(2024, 2, 1)), ymd(2024, 2, 1));
    }

    #[test]
    fn test_months_between_inclusive() {
        assert_eq!(months_between_inclusive(ymd(2023, 1, 1), ymd(2023, 3, 1)), 3);
        assert_eq!(months_between_inclusive(ymd(2023, 2, 1), ymd(2023, 2, 1)), 1);
        assert_eq!(months_between_inclusive(ymd(2022, 11, 1), ymd(2023, 2, 1)), 4);
        assert_eq!(months_between_inclusive(ymd(2023, 3, 1), ymd(2023, 1, 1)), 0);
        assert_eq!(months_between_inclusive(ymd(2024, 1, 1), ymd(2023, 12, 1)), 0);
    }
}
