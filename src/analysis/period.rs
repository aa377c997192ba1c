//! Calendar bucket rules for bar aggregation
//!
//! A rule is written `[n]UNIT`, e.g. `W`, `2W`, `W-FRI`, `MS`, `3M`, `Q`.
//! End-anchored units (`W`, `M`, `Q`, `Y`) key each bucket by the last calendar
//! day of the period; start-anchored units (`MS`, `QS`, `YS`) by the first.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

/// Base calendar unit of a bucket rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Day,
    /// Week ending on the given weekday
    Week(Weekday),
    MonthEnd,
    MonthStart,
    QuarterEnd,
    QuarterStart,
    YearEnd,
    YearStart,
}

impl PeriodUnit {
    fn parse(code: &str) -> Option<Self> {
        let unit = match code {
            "D" => Self::Day,
            "W" => Self::Week(Weekday::Sun),
            "M" | "ME" => Self::MonthEnd,
            "MS" => Self::MonthStart,
            "Q" | "QE" => Self::QuarterEnd,
            "QS" => Self::QuarterStart,
            "Y" | "YE" | "A" => Self::YearEnd,
            "YS" | "AS" => Self::YearStart,
            _ => {
                let anchor = code.strip_prefix("W-")?;
                Self::Week(parse_weekday(anchor)?)
            }
        };
        Some(unit)
    }

    fn is_start_anchored(self) -> bool {
        matches!(self, Self::MonthStart | Self::QuarterStart | Self::YearStart)
    }

    /// Sequential index of the base period containing `date`.
    ///
    /// Consecutive periods have consecutive indices.
    fn index_of(self, date: NaiveDate) -> i64 {
        let year = date.year() as i64;
        let month0 = date.month0() as i64;
        match self {
            Self::Day => date.num_days_from_ce() as i64,
            Self::Week(anchor) => {
                let ahead = (anchor.num_days_from_monday() as i64
                    - date.weekday().num_days_from_monday() as i64)
                    .rem_euclid(7);
                (date.num_days_from_ce() as i64 + ahead).div_euclid(7)
            }
            Self::MonthEnd | Self::MonthStart => year * 12 + month0,
            Self::QuarterEnd | Self::QuarterStart => year * 4 + month0 / 3,
            Self::YearEnd | Self::YearStart => year,
        }
    }

    /// First calendar day of the base period with the given index
    fn start_of(self, index: i64) -> Option<NaiveDate> {
        match self {
            Self::Day => from_days(index),
            Self::Week(_) => self.end_of(index)?.checked_sub_days(Days::new(6)),
            Self::MonthEnd | Self::MonthStart => {
                month_start(index.div_euclid(12), index.rem_euclid(12))
            }
            Self::QuarterEnd | Self::QuarterStart => {
                month_start(index.div_euclid(4), index.rem_euclid(4) * 3)
            }
            Self::YearEnd | Self::YearStart => month_start(index, 0),
        }
    }

    /// Last calendar day of the base period with the given index
    fn end_of(self, index: i64) -> Option<NaiveDate> {
        match self {
            Self::Day => from_days(index),
            Self::Week(anchor) => {
                // 0001-01-01 (day 1 from CE) is a Monday
                let offset = (1 + anchor.num_days_from_monday() as i64) % 7;
                from_days(index * 7 + offset)
            }
            _ => self.start_of(index + 1)?.pred_opt(),
        }
    }
}

fn parse_weekday(code: &str) -> Option<Weekday> {
    match code {
        "MON" => Some(Weekday::Mon),
        "TUE" => Some(Weekday::Tue),
        "WED" => Some(Weekday::Wed),
        "THU" => Some(Weekday::Thu),
        "FRI" => Some(Weekday::Fri),
        "SAT" => Some(Weekday::Sat),
        "SUN" => Some(Weekday::Sun),
        _ => None,
    }
}

fn from_days(days: i64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(i32::try_from(days).ok()?)
}

/// First day of `month0` (0-based, may overflow into following years) of `year`
fn month_start(year: i64, month0: i64) -> Option<NaiveDate> {
    let year = year + month0.div_euclid(12);
    let month = month0.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, 1)
}

/// A parsed bucket rule: `multiple` consecutive base periods of `unit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub multiple: u32,
    pub unit: PeriodUnit,
    code: String,
}

impl Period {
    pub fn weekly() -> Self {
        Self {
            multiple: 1,
            unit: PeriodUnit::Week(Weekday::Sun),
            code: "W".to_string(),
        }
    }

    /// The rule as the caller wrote it
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Base period index of `date`
    pub(crate) fn base_index(&self, date: NaiveDate) -> i64 {
        self.unit.index_of(date)
    }

    /// Bucket number of a base period, counted from the first populated one.
    pub(crate) fn group_of(&self, base_index: i64, origin: i64) -> i64 {
        (base_index - origin).div_euclid(self.multiple as i64)
    }

    /// Calendar key of a bucket group.
    pub(crate) fn group_key(&self, group: i64, origin: i64) -> Option<NaiveDate> {
        let first = origin + group * self.multiple as i64;
        if self.unit.is_start_anchored() {
            self.unit.start_of(first)
        } else {
            self.unit.end_of(first + self.multiple as i64 - 1)
        }
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::weekly()
    }
}

impl FromStr for Period {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        let upper = code.to_ascii_uppercase();
        let digits = upper.chars().take_while(|c| c.is_ascii_digit()).count();
        let (count, unit) = upper.split_at(digits);

        let multiple = if count.is_empty() {
            1
        } else {
            count.parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                AnalysisError::Configuration(format!("Invalid period multiple in '{}'", code))
            })?
        };

        let unit = PeriodUnit::parse(unit).ok_or_else(|| {
            AnalysisError::Configuration(format!("Unrecognized period rule '{}'", code))
        })?;

        Ok(Self {
            multiple,
            unit,
            code: code.to_string(),
        })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn key_of(period: &Period, d: NaiveDate) -> NaiveDate {
        let base = period.base_index(d);
        period.group_key(0, base).unwrap()
    }

    #[test]
    fn test_parse_rules() {
        assert_eq!("W".parse::<Period>().unwrap().unit, PeriodUnit::Week(Weekday::Sun));
        assert_eq!("w-fri".parse::<Period>().unwrap().unit, PeriodUnit::Week(Weekday::Fri));
        assert_eq!("MS".parse::<Period>().unwrap().unit, PeriodUnit::MonthStart);
        assert_eq!("ME".parse::<Period>().unwrap().unit, PeriodUnit::MonthEnd);
        assert_eq!("A".parse::<Period>().unwrap().unit, PeriodUnit::YearEnd);

        let p = "2W".parse::<Period>().unwrap();
        assert_eq!(p.multiple, 2);
        assert_eq!(p.code(), "2W");
    }

    #[test]
    fn test_rejects_unknown_rules() {
        for code in ["", "X", "W-XYZ", "0D", "5", "H"] {
            let err = code.parse::<Period>().unwrap_err();
            assert!(matches!(err, AnalysisError::Configuration(_)), "{code}");
        }
    }

    #[test]
    fn test_weekly_key_is_sunday() {
        let p = Period::weekly();
        // 2020-01-01 was a Wednesday
        assert_eq!(key_of(&p, date(2020, 1, 1)), date(2020, 1, 5));
        assert_eq!(key_of(&p, date(2020, 1, 5)), date(2020, 1, 5));
        assert_eq!(key_of(&p, date(2020, 1, 6)), date(2020, 1, 12));
    }

    #[test]
    fn test_anchored_week() {
        let p: Period = "W-FRI".parse().unwrap();
        assert_eq!(key_of(&p, date(2020, 1, 1)), date(2020, 1, 3));
        assert_eq!(key_of(&p, date(2020, 1, 4)), date(2020, 1, 10));
    }

    #[test]
    fn test_month_and_quarter_keys() {
        let me: Period = "M".parse().unwrap();
        assert_eq!(key_of(&me, date(2020, 2, 10)), date(2020, 2, 29));
        assert_eq!(key_of(&me, date(2021, 12, 1)), date(2021, 12, 31));

        let ms: Period = "MS".parse().unwrap();
        assert_eq!(key_of(&ms, date(2020, 2, 10)), date(2020, 2, 1));

        let q: Period = "Q".parse().unwrap();
        assert_eq!(key_of(&q, date(2020, 5, 17)), date(2020, 6, 30));

        let qs: Period = "QS".parse().unwrap();
        assert_eq!(key_of(&qs, date(2020, 12, 17)), date(2020, 10, 1));

        let y: Period = "Y".parse().unwrap();
        assert_eq!(key_of(&y, date(2020, 5, 17)), date(2020, 12, 31));
    }

    #[test]
    fn test_multiple_groups_from_origin() {
        let p: Period = "2W".parse().unwrap();
        let origin = p.base_index(date(2020, 1, 1));
        let third_week = p.base_index(date(2020, 1, 15));
        let group = p.group_of(third_week, origin);
        assert_eq!(group, 1);
        // Group 1 spans the third and fourth weeks and ends on the fourth Sunday
        assert_eq!(p.group_key(group, origin), Some(date(2020, 1, 26)));
    }
}
