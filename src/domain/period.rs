//! Calendar periods.
//!
//! Dataset payloads label their observations inconsistently (`"2024"`,
//! `"2024-03"`, `"Mar 2024"`, `"march 2024"`). Everything is normalized to a
//! `Period` so ordering is calendar ordering, never lexical ordering of labels.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A year (`month == None`) or a calendar month.
///
/// Ordering is `(year, month)` with a bare year sorting before its months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePeriodError(String);

impl fmt::Display for ParsePeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid period {:?}: expected YYYY, YYYY-MM, YYYY/MM or <mon> <YYYY>",
            self.0
        )
    }
}

impl std::error::Error for ParsePeriodError {}

impl Period {
    pub fn year(year: i32) -> Self {
        Self { year, month: None }
    }

    /// Returns `None` unless `month` is in `1..=12`.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self {
            year,
            month: Some(month),
        })
    }

    pub fn year_value(&self) -> i32 {
        self.year
    }

    pub fn month_value(&self) -> Option<u32> {
        self.month
    }

    pub fn is_monthly(&self) -> bool {
        self.month.is_some()
    }

    /// The following period at the same granularity, or `None` past the
    /// representable range.
    pub fn next(&self) -> Option<Self> {
        match self.month {
            None => self.year.checked_add(1).map(Self::year),
            Some(12) => self.year.checked_add(1).map(|year| Self {
                year,
                month: Some(1),
            }),
            Some(m) => Some(Self {
                year: self.year,
                month: Some(m + 1),
            }),
        }
    }

    /// Up to `count` periods following `self`, in order. Stops early at the end
    /// of the representable range.
    pub fn successors(&self, count: usize) -> Vec<Period> {
        std::iter::successors(self.next(), Period::next)
            .take(count)
            .collect()
    }
}

fn is_year_digits(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || ParsePeriodError(s.to_string());

        if is_year_digits(trimmed) {
            return trimmed.parse::<i32>().map(Period::year).map_err(|_| err());
        }

        // Numeric year-month: 2024-03, 2024/3
        if let Some((y, m)) = trimmed.split_once(['-', '/']) {
            let (y, m) = (y.trim(), m.trim());
            if !is_year_digits(y) || m.is_empty() || m.len() > 2 || !m.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            let (Ok(y), Ok(m)) = (y.parse::<i32>(), m.parse::<u32>()) else {
                return Err(err());
            };
            return Period::month(y, m).ok_or_else(err);
        }

        // Named month: "Mar 2024", "march 2024". chrono wants a full date, so
        // pin the day to the first.
        let words: Vec<&str> = trimmed.split_whitespace().collect();
        if words.len() != 2 || !is_year_digits(words[1]) {
            return Err(err());
        }
        let normalized = words.join(" ");
        let with_day = format!("01 {normalized}");
        for fmt in ["%d %b %Y", "%d %B %Y"] {
            if let Ok(d) = NaiveDate::parse_from_str(&with_day, fmt) {
                return Ok(Period {
                    year: d.year(),
                    month: Some(d.month()),
                });
            }
        }

        Err(err())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            None => write!(f, "{:04}", self.year),
            Some(m) => write!(f, "{:04}-{m:02}", self.year),
        }
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
