use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Dataset code as used by the bulk-download service, e.g. `road_eqs_busmot`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(String);

impl DatasetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatasetId {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        let is_valid = !normalized.is_empty()
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        if !is_valid {
            return Err(FetchError::InvalidDatasetId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TimeFormat {
    #[default]
    Date,
    DateLast,
    Num,
    Raw,
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeFormat::Date => write!(f, "date"),
            TimeFormat::DateLast => write!(f, "date-last"),
            TimeFormat::Num => write!(f, "num"),
            TimeFormat::Raw => write!(f, "raw"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[value(alias = "Y")]
    Annual,
    #[value(alias = "S")]
    Semester,
    #[value(alias = "Q")]
    Quarter,
    #[value(alias = "M")]
    Month,
    #[value(alias = "D")]
    Day,
}

impl Frequency {
    pub fn marker(self) -> char {
        match self {
            Frequency::Annual => 'Y',
            Frequency::Semester => 'S',
            Frequency::Quarter => 'Q',
            Frequency::Month => 'M',
            Frequency::Day => 'D',
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marker())
    }
}

/// A parsed period label from a bulk-file time column header.
///
/// Accepts the marker grammar (`2015`, `2015S2`, `2015Q3`, `2015M07`,
/// `2015M07D21`, with optional `-`/`_` separators) and the dash-separated
/// month/day variants (`2015-07`, `2015-07-21`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Year(i32),
    Semester(i32, u32),
    Quarter(i32, u32),
    Month(i32, u32),
    Day(NaiveDate),
}

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4})(?:[-_]?([SQ])(\d)|[-_]?M(\d{1,2})(?:[-_]?D(\d{1,2}))?)?$")
            .unwrap()
    })
}

fn iso_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})-(\d{1,2})(?:-(\d{1,2}))?$").unwrap())
}

impl FromStr for Period {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let label = value.trim();
        let invalid = || FetchError::InvalidPeriod(value.to_string());

        if let Some(caps) = marker_re().captures(label) {
            let year: i32 = caps[1].parse().map_err(|_| invalid())?;
            if let Some(marker) = caps.get(2) {
                let index: u32 = caps[3].parse().map_err(|_| invalid())?;
                return match marker.as_str() {
                    "S" if (1..=2).contains(&index) => Ok(Period::Semester(year, index)),
                    "Q" if (1..=4).contains(&index) => Ok(Period::Quarter(year, index)),
                    _ => Err(invalid()),
                };
            }
            if let Some(month) = caps.get(4) {
                let month: u32 = month.as_str().parse().map_err(|_| invalid())?;
                if let Some(day) = caps.get(5) {
                    let day: u32 = day.as_str().parse().map_err(|_| invalid())?;
                    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
                    return Ok(Period::Day(date));
                }
                if (1..=12).contains(&month) {
                    return Ok(Period::Month(year, month));
                }
                return Err(invalid());
            }
            return Ok(Period::Year(year));
        }

        if let Some(caps) = iso_re().captures(label) {
            let year: i32 = caps[1].parse().map_err(|_| invalid())?;
            let month: u32 = caps[2].parse().map_err(|_| invalid())?;
            if let Some(day) = caps.get(3) {
                let day: u32 = day.as_str().parse().map_err(|_| invalid())?;
                let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
                return Ok(Period::Day(date));
            }
            if (1..=12).contains(&month) {
                return Ok(Period::Month(year, month));
            }
        }

        Err(invalid())
    }
}

impl Period {
    pub fn frequency(self) -> Frequency {
        match self {
            Period::Year(_) => Frequency::Annual,
            Period::Semester(..) => Frequency::Semester,
            Period::Quarter(..) => Frequency::Quarter,
            Period::Month(..) => Frequency::Month,
            Period::Day(_) => Frequency::Day,
        }
    }

    /// First calendar day of the period.
    pub fn start_date(self) -> NaiveDate {
        match self {
            Period::Year(year) => first_of(year, 1),
            Period::Semester(year, s) => first_of(year, (s - 1) * 6 + 1),
            Period::Quarter(year, q) => first_of(year, (q - 1) * 3 + 1),
            Period::Month(year, m) => first_of(year, m),
            Period::Day(date) => date,
        }
    }

    /// Last calendar day of the period.
    pub fn end_date(self) -> NaiveDate {
        match self {
            Period::Year(year) => last_of(year, 12),
            Period::Semester(year, s) => last_of(year, s * 6),
            Period::Quarter(year, q) => last_of(year, q * 3),
            Period::Month(year, m) => last_of(year, m),
            Period::Day(date) => date,
        }
    }

    /// Decimal-year representation: year plus the fractional offset of the
    /// sub-period index (e.g. 2015Q3 -> 2015.5).
    pub fn to_num(self) -> f64 {
        match self {
            Period::Year(year) => year as f64,
            Period::Semester(year, s) => year as f64 + (s - 1) as f64 / 2.0,
            Period::Quarter(year, q) => year as f64 + (q - 1) as f64 / 4.0,
            Period::Month(year, m) => year as f64 + (m - 1) as f64 / 12.0,
            Period::Day(date) => {
                let days = if date.leap_year() { 366.0 } else { 365.0 };
                date.year() as f64 + (date.ordinal() - 1) as f64 / days
            }
        }
    }
}

fn first_of(year: i32, month: u32) -> NaiveDate {
    // month is always 1..=12 by construction
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

fn last_of(year: i32, month: u32) -> NaiveDate {
    let next = if month == 12 {
        first_of(year + 1, 1)
    } else {
        first_of(year, month + 1)
    };
    next.pred_opt().unwrap()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_dataset_id_valid() {
        let id: DatasetId = " Road_EQS_Busmot ".parse().unwrap();
        assert_eq!(id.as_str(), "road_eqs_busmot");
    }

    #[test]
    fn parse_dataset_id_invalid() {
        let err = "nrg cb".parse::<DatasetId>().unwrap_err();
        assert_matches!(err, FetchError::InvalidDatasetId(_));
        assert_matches!("".parse::<DatasetId>(), Err(_));
    }

    #[test]
    fn parse_period_labels() {
        assert_eq!("2015".parse::<Period>().unwrap(), Period::Year(2015));
        assert_eq!("2015S2".parse::<Period>().unwrap(), Period::Semester(2015, 2));
        assert_eq!("2015-Q3".parse::<Period>().unwrap(), Period::Quarter(2015, 3));
        assert_eq!("2015M07".parse::<Period>().unwrap(), Period::Month(2015, 7));
        assert_eq!("2015-07".parse::<Period>().unwrap(), Period::Month(2015, 7));
        assert_eq!(
            "2015M07D21".parse::<Period>().unwrap(),
            Period::Day(NaiveDate::from_ymd_opt(2015, 7, 21).unwrap())
        );
        assert_eq!(
            "2015-07-21".parse::<Period>().unwrap(),
            Period::Day(NaiveDate::from_ymd_opt(2015, 7, 21).unwrap())
        );
    }

    #[test]
    fn parse_period_invalid() {
        assert_matches!("total".parse::<Period>(), Err(FetchError::InvalidPeriod(_)));
        assert_matches!("2015S3".parse::<Period>(), Err(FetchError::InvalidPeriod(_)));
        assert_matches!("2015Q5".parse::<Period>(), Err(FetchError::InvalidPeriod(_)));
        assert_matches!("2015M13".parse::<Period>(), Err(FetchError::InvalidPeriod(_)));
        assert_matches!("2015-02-30".parse::<Period>(), Err(FetchError::InvalidPeriod(_)));
    }

    #[test]
    fn period_date_bounds() {
        let quarter: Period = "2015Q2".parse().unwrap();
        assert_eq!(quarter.start_date(), NaiveDate::from_ymd_opt(2015, 4, 1).unwrap());
        assert_eq!(quarter.end_date(), NaiveDate::from_ymd_opt(2015, 6, 30).unwrap());

        let year: Period = "2016".parse().unwrap();
        assert_eq!(year.start_date(), NaiveDate::from_ymd_opt(2016, 1, 1).unwrap());
        assert_eq!(year.end_date(), NaiveDate::from_ymd_opt(2016, 12, 31).unwrap());

        let semester: Period = "2016S2".parse().unwrap();
        assert_eq!(semester.start_date(), NaiveDate::from_ymd_opt(2016, 7, 1).unwrap());
        assert_eq!(semester.end_date(), NaiveDate::from_ymd_opt(2016, 12, 31).unwrap());

        // leap February
        let feb: Period = "2016M02".parse().unwrap();
        assert_eq!(feb.end_date(), NaiveDate::from_ymd_opt(2016, 2, 29).unwrap());
    }

    #[test]
    fn period_to_num() {
        assert_eq!("2015".parse::<Period>().unwrap().to_num(), 2015.0);
        assert_eq!("2015Q3".parse::<Period>().unwrap().to_num(), 2015.5);
        assert_eq!("2015S2".parse::<Period>().unwrap().to_num(), 2015.5);
        assert_eq!("2015M07".parse::<Period>().unwrap().to_num(), 2015.5);
        assert_eq!("2016M01D01".parse::<Period>().unwrap().to_num(), 2016.0);
    }

    #[test]
    fn frequency_markers() {
        assert_eq!(Frequency::Annual.marker(), 'Y');
        assert_eq!("2015Q1".parse::<Period>().unwrap().frequency(), Frequency::Quarter);
    }
}
