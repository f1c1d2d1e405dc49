//! Calendar dates for loans, written as `dd-mm-yyyy`.

use std::fmt;
use std::str::FromStr;

use crate::validation::ValidationError;

/// A validated Gregorian calendar date.
///
/// Field order makes the derived ordering chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoanDate {
    year: u16,
    month: u8,
    day: u8,
}

impl LoanDate {
    /// Build a date from its parts, rejecting days that do not exist.
    pub fn new(day: u8, month: u8, year: u16) -> Result<Self, ValidationError> {
        if year == 0 || !(1..=12).contains(&month) || day == 0 || day > days_in_month(month, year) {
            return Err(ValidationError::InvalidCalendarDate(format!(
                "{day:02}-{month:02}-{year:04}"
            )));
        }
        Ok(Self { year, month, day })
    }

    /// Parse exactly `dd-mm-yyyy`: two digits, dash, two digits, dash, four digits.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let malformed = || ValidationError::MalformedDate(text.to_string());

        let bytes = text.as_bytes();
        let shape_ok = bytes.len() == 10
            && bytes.iter().enumerate().all(|(i, b)| match i {
                2 | 5 => *b == b'-',
                _ => b.is_ascii_digit(),
            });
        if !shape_ok {
            return Err(malformed());
        }

        let day = text[0..2].parse().map_err(|_| malformed())?;
        let month = text[3..5].parse().map_err(|_| malformed())?;
        let year = text[6..10].parse().map_err(|_| malformed())?;
        Self::new(day, month, year).map_err(|_| ValidationError::InvalidCalendarDate(text.to_string()))
    }

    #[must_use]
    pub const fn day(&self) -> u8 {
        self.day
    }

    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    #[must_use]
    pub const fn year(&self) -> u16 {
        self.year
    }
}

/// Gregorian leap year: divisible by 4, except centuries not divisible by 400.
const fn is_leap_year(year: u16) -> bool {
    (year.is_multiple_of(4) && !year.is_multiple_of(100)) || year.is_multiple_of(400)
}

const fn days_in_month(month: u8, year: u16) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

impl fmt::Display for LoanDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}-{:04}", self.day, self.month, self.year)
    }
}

impl FromStr for LoanDate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_date() {
        let date = LoanDate::parse("07-03-2024").expect("date should parse");
        assert_eq!(date.day(), 7);
        assert_eq!(date.month(), 3);
        assert_eq!(date.year(), 2024);
        assert_eq!(date.to_string(), "07-03-2024");
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        for text in ["7-3-2024", "07/03/2024", "2024-03-07", "07-03-24", "", "aa-bb-cccc", " 07-03-2024"] {
            assert_eq!(
                LoanDate::parse(text),
                Err(ValidationError::MalformedDate(text.to_string())),
                "{text:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_parse_rejects_impossible_days() {
        for text in ["00-01-2024", "32-01-2024", "31-04-2024", "01-13-2024", "01-00-2024", "01-01-0000"] {
            assert_eq!(
                LoanDate::parse(text),
                Err(ValidationError::InvalidCalendarDate(text.to_string())),
                "{text:?} should not exist"
            );
        }
    }

    #[test]
    fn test_leap_years() {
        assert!(LoanDate::parse("29-02-2024").is_ok());
        assert!(LoanDate::parse("29-02-2000").is_ok());
        assert!(LoanDate::parse("29-02-2023").is_err());
        assert!(LoanDate::parse("29-02-1900").is_err());
    }

    #[test]
    fn test_ordering_is_chronological() {
        let parse = |text: &str| LoanDate::parse(text).expect("date should parse");
        assert!(parse("31-12-2023") < parse("01-01-2024"));
        assert!(parse("30-01-2024") < parse("01-02-2024"));
        assert!(parse("01-02-2024") < parse("02-02-2024"));
        assert_eq!(parse("15-08-2024"), parse("15-08-2024"));
    }

    #[test]
    fn test_from_str() {
        let date: LoanDate = "01-01-2025".parse().expect("date should parse");
        assert_eq!(date, LoanDate::new(1, 1, 2025).expect("date should exist"));
    }
}
