use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{FundError, Result};

/// convert ascii digits to persian digits for display
pub fn to_persian_digits(s: &str) -> String {
    const PERSIAN: [char; 10] = ['۰', '۱', '۲', '۳', '۴', '۵', '۶', '۷', '۸', '۹'];
    s.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => PERSIAN[d as usize],
            None => c,
        })
        .collect()
}

/// convert persian/arabic digits to ascii so dates and amounts can be parsed
pub fn to_ascii_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '۰'..='۹' => char::from(b'0' + (c as u32 - '۰' as u32) as u8),
            '٠'..='٩' => char::from(b'0' + (c as u32 - '٠' as u32) as u8),
            _ => c,
        })
        .collect()
}

/// calendar date in the fund's solar-hijri convention
///
/// stored dates are plain year-month-day strings; months are treated as
/// 30-day cells for due-date arithmetic (see [`FundDate::add_months`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FundDate {
    year: i32,
    month: u32,
    day: u32,
}

impl FundDate {
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        if year < 1 || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(FundError::InvalidDate {
                input: format!("{year}-{month}-{day}"),
            });
        }
        Ok(Self { year, month, day })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// parse a date string as entered by an operator or stored upstream
    ///
    /// accepts persian or ascii digits, `/` or `-` separators (the 4-digit
    /// part is taken as the year wherever it appears), and ISO timestamps,
    /// which are truncated at `T`.
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(FundError::InvalidDate {
                input: input.to_string(),
            });
        }
        let mut s = to_ascii_digits(raw);
        if let Some(t) = s.find('T') {
            s.truncate(t);
        }

        let parts: Vec<&str> = if s.contains('/') {
            s.split('/').map(str::trim).collect()
        } else {
            s.split('-').map(str::trim).collect()
        };
        if parts.len() != 3 {
            return Err(FundError::InvalidDate {
                input: input.to_string(),
            });
        }

        let nums: Vec<i64> = parts
            .iter()
            .map(|p| p.parse::<i64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| FundError::InvalidDate {
                input: input.to_string(),
            })?;

        // the year is whichever end carries four digits; M/D/Y input puts it last
        let (y, m, d) = if parts[2].len() >= 4 {
            (nums[2], nums[0], nums[1])
        } else {
            (nums[0], nums[1], nums[2])
        };

        Self::new(y as i32, m as u32, d as u32)
    }

    /// due-date arithmetic: add whole months, carrying into the year
    ///
    /// the day-of-month is capped at 30. this mirrors the 30-day-month
    /// convention of the source calendar and must not be replaced with a
    /// general calendar algorithm; displayed due dates depend on it.
    pub fn add_months(&self, months: u32) -> FundDate {
        let mut month = self.month + months;
        let mut year = self.year;
        while month > 12 {
            month -= 12;
            year += 1;
        }
        FundDate {
            year,
            month,
            day: self.day.min(30),
        }
    }

    /// display form with persian digits, e.g. ۱۴۰۰/۰۱/۱۵
    pub fn format_short(&self) -> String {
        to_persian_digits(&format!(
            "{:04}/{:02}/{:02}",
            self.year, self.month, self.day
        ))
    }
}

impl fmt::Display for FundDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for FundDate {
    type Err = FundError;

    fn from_str(s: &str) -> Result<Self> {
        FundDate::parse(s)
    }
}

impl Serialize for FundDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FundDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
