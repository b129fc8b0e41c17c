//! Symbolic time-window resolution.
//!
//! The UI filters by named windows ("today", "week", "month", "year", "all").
//! Resolution is pure: for a given wall-clock instant the same window always
//! produces the same range. `week`/`month`/`year` end at *now*, not at the
//! end of the period — they are backward-looking windows, not calendar
//! buckets, so a listing and an aggregate computed moments apart agree on
//! which tasks are in scope.

use std::convert::Infallible;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveTime, SecondsFormat,
    TimeZone, Utc,
};
use serde::{Deserialize, Serialize};

/// A concrete half-open date interval. Invariant: `start <= end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Serialize as the `start_date`/`end_date` query parameters every
    /// backend call uses. Both instants are ISO-8601 with a `Z` suffix.
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("start_date", iso_instant(self.start)),
            ("end_date", iso_instant(self.end)),
        ]
    }
}

pub(crate) fn iso_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Symbolic time-window token.
///
/// Unrecognized tokens degrade to `All` rather than failing; an unfiltered
/// listing is always a safe answer to a window we do not understand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateWindow {
    Today,
    Week,
    Month,
    Year,
    #[default]
    All,
}

impl FromStr for DateWindow {
    type Err = Infallible;

    fn from_str(token: &str) -> Result<Self, Infallible> {
        Ok(match token {
            "today" => DateWindow::Today,
            "week" => DateWindow::Week,
            "month" => DateWindow::Month,
            "year" => DateWindow::Year,
            _ => DateWindow::All,
        })
    }
}

impl DateWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateWindow::Today => "today",
            DateWindow::Week => "week",
            DateWindow::Month => "month",
            DateWindow::Year => "year",
            DateWindow::All => "all",
        }
    }

    /// Resolve against the local wall clock. `None` means unrestricted.
    pub fn resolve(&self) -> Option<DateRange> {
        self.resolve_at(Local::now())
    }

    /// Resolve against an explicit instant in an explicit zone.
    ///
    /// - `Today`: [local midnight, local midnight + 24h)
    /// - `Week`: [most recent Sunday midnight, now)
    /// - `Month`: [midnight of the 1st, now)
    /// - `Year`: [midnight of Jan 1, now)
    /// - `All`: unrestricted
    pub fn resolve_at<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Option<DateRange> {
        let tz = now.timezone();
        let today = now.date_naive();

        match self {
            DateWindow::Today => {
                let start = local_midnight(today, &tz);
                Some(DateRange {
                    start,
                    end: start + Duration::hours(24),
                })
            }
            DateWindow::Week => {
                let days_back = i64::from(now.weekday().num_days_from_sunday());
                Some(DateRange {
                    start: local_midnight(today - Duration::days(days_back), &tz),
                    end: now.with_timezone(&Utc),
                })
            }
            DateWindow::Month => {
                let first = today.with_day(1).unwrap_or(today);
                Some(DateRange {
                    start: local_midnight(first, &tz),
                    end: now.with_timezone(&Utc),
                })
            }
            DateWindow::Year => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                Some(DateRange {
                    start: local_midnight(first, &tz),
                    end: now.with_timezone(&Utc),
                })
            }
            DateWindow::All => None,
        }
    }
}

/// Midnight of `date` in `tz`, as a UTC instant.
fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        // DST fall-back: two midnights, take the earlier one
        LocalResult::Ambiguous(earlier, _) => earlier,
        // DST spring-forward skipped midnight entirely
        LocalResult::None => tz.from_utc_datetime(&naive),
    };
    local.with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use chrono_tz::Tz;

    fn new_york() -> Tz {
        "America/New_York".parse().unwrap()
    }

    #[test]
    fn today_spans_local_midnight_plus_24h() {
        let tz = new_york();
        // 2024-03-15 10:30 in New York is EDT (UTC-4)
        let now = tz.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap();

        let range = DateWindow::Today.resolve_at(now).unwrap();

        let midnight = tz.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap().to_utc();
        assert_eq!(range.start, midnight);
        assert_eq!(range.end, midnight + Duration::hours(24));
        assert!(range.start <= now.to_utc() && now.to_utc() < range.end);
    }

    #[test]
    fn week_starts_on_most_recent_sunday_midnight() {
        let tz = new_york();
        // 2024-03-15 was a Friday
        let now = tz.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();

        let range = DateWindow::Week.resolve_at(now).unwrap();

        let sunday = tz.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap().to_utc();
        assert_eq!(range.start, sunday);
        assert_eq!(range.start.with_timezone(&tz).weekday(), Weekday::Sun);
        assert_eq!(range.end, now.to_utc());
        assert!(range.end - range.start < Duration::days(7));
    }

    #[test]
    fn week_on_a_sunday_starts_that_same_day() {
        let tz = new_york();
        let now = tz.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();

        let range = DateWindow::Week.resolve_at(now).unwrap();

        assert_eq!(
            range.start,
            tz.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap().to_utc()
        );
    }

    #[test]
    fn month_ends_at_now_not_end_of_month() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();

        let range = DateWindow::Month.resolve_at(now).unwrap();

        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, now);
    }

    #[test]
    fn year_starts_january_first() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();

        let range = DateWindow::Year.resolve_at(now).unwrap();

        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, now);
    }

    #[test]
    fn all_is_unrestricted() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        assert_eq!(DateWindow::All.resolve_at(now), None);
    }

    #[test]
    fn unrecognized_tokens_degrade_to_all() {
        assert_eq!("today".parse::<DateWindow>().unwrap(), DateWindow::Today);
        assert_eq!("all".parse::<DateWindow>().unwrap(), DateWindow::All);
        assert_eq!("last-tuesday".parse::<DateWindow>().unwrap(), DateWindow::All);
        assert_eq!("".parse::<DateWindow>().unwrap(), DateWindow::All);
    }

    #[test]
    fn query_params_are_iso_instants() {
        let range = DateRange {
            start: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(),
        };

        let params = range.to_query_params();
        assert_eq!(params[0], ("start_date", "2024-03-01T00:00:00.000Z".to_string()));
        assert_eq!(params[1], ("end_date", "2024-03-15T10:00:00.000Z".to_string()));
    }
}
