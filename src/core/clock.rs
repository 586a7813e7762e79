//! Clock and civil-time helpers.
//!
//! "Now" always comes from a [`Clock`] so tests can pin it. User-supplied dates
//! and times are interpreted in the campus timezone, never the server's, and
//! meal windows are checked against that local time.

use crate::{
    config::WindowConfig,
    entities::EventKind,
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::fmt::Write;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// The current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a given instant. Used by tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Converts between UTC instants and the campus civil timezone.
#[derive(Debug, Clone, Copy)]
pub struct CivilTime {
    tz: Tz,
}

impl CivilTime {
    /// Creates a converter for `tz`.
    #[must_use]
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// The configured timezone.
    #[must_use]
    pub const fn tz(&self) -> Tz {
        self.tz
    }

    /// Expresses `instant` in local civil time.
    #[must_use]
    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    /// Local calendar date of `instant`.
    #[must_use]
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.to_local(instant).date_naive()
    }

    /// Turns an optional date string and a time string into an instant.
    ///
    /// Without a date, the local date of `now` is used. Local times that do not
    /// exist (spring-forward gap) are rejected; ambiguous ones resolve to the
    /// earlier instant.
    pub fn parse_civil_datetime(
        &self,
        now: DateTime<Utc>,
        date: Option<&str>,
        time: &str,
    ) -> Result<DateTime<Utc>> {
        let today = self.local_date(now);
        let date = match date {
            Some(raw) => parse_date(raw, today)?,
            None => today,
        };
        let time = parse_time(time)?;
        let naive = date.and_time(time);

        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| Error::InvalidTime {
                message: format!(
                    "{} does not exist in {} (clocks skip that hour)",
                    naive.format("%Y-%m-%d %H:%M"),
                    self.tz
                ),
            })
    }
}

/// Parses `4pm`, `4:30pm`, `4:30 PM` or 24-hour `16:30`.
pub fn parse_time(input: &str) -> Result<NaiveTime> {
    let invalid = || Error::InvalidTime {
        message: format!("Couldn't understand the time '{input}'. Try something like `5:30pm` or `17:30`."),
    };

    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    let (body, meridiem) = if let Some(body) = cleaned.strip_suffix("am") {
        (body, Some(false))
    } else if let Some(body) = cleaned.strip_suffix("pm") {
        (body, Some(true))
    } else {
        (cleaned.as_str(), None)
    };

    let (hour_str, minute_str) = match body.split_once(':') {
        Some((h, m)) if m.len() == 2 => (h, m),
        Some(_) => return Err(invalid()),
        // A bare hour only makes sense with am/pm
        None if meridiem.is_some() => (body, "00"),
        None => return Err(invalid()),
    };

    let hour: u32 = hour_str.parse().map_err(|_| invalid())?;
    let minute: u32 = minute_str.parse().map_err(|_| invalid())?;

    let hour = match meridiem {
        Some(_) if !(1..=12).contains(&hour) => return Err(invalid()),
        Some(false) if hour == 12 => 0,
        Some(true) if hour == 12 => 12,
        Some(true) => hour + 12,
        Some(false) | None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// Parses `today`, `tomorrow`, `MM/DD`, `MM/DD/YYYY` or `YYYY-MM-DD`.
///
/// `MM/DD` takes the year of `today`.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let invalid = || Error::InvalidTime {
        message: format!("Couldn't understand the date '{input}'. Use `MM/DD` or `YYYY-MM-DD`."),
    };

    let trimmed = input.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" | "today" => return Ok(today),
        "tomorrow" => return today.checked_add_days(Days::new(1)).ok_or_else(invalid),
        _ => {}
    }

    if trimmed.contains('-') {
        return NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| invalid());
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    let number = |s: &str| s.trim().parse::<u32>().map_err(|_| invalid());
    let (month, day, year) = match parts.as_slice() {
        [m, d] => (number(m)?, number(d)?, today.year()),
        [m, d, y] => {
            let y = number(y)?;
            let y = if y < 100 { 2000 + y } else { y };
            (number(m)?, number(d)?, i32::try_from(y).map_err(|_| invalid())?)
        }
        _ => return Err(invalid()),
    };

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

#[derive(Debug, Clone)]
struct Window {
    days: Vec<Weekday>,
    start: NaiveTime,
    end: NaiveTime,
}

/// Per-kind opening windows in local civil time.
#[derive(Debug, Clone, Default)]
pub struct MealWindows {
    windows: HashMap<EventKind, Vec<Window>>,
}

impl MealWindows {
    /// Builds the table from configuration, validating every entry.
    pub fn from_config(entries: &[WindowConfig]) -> Result<Self> {
        let mut windows: HashMap<EventKind, Vec<Window>> = HashMap::new();

        for entry in entries {
            let days = entry
                .days
                .iter()
                .map(|d| {
                    d.parse::<Weekday>().map_err(|_| Error::Config {
                        message: format!("Invalid weekday '{d}' in {} window", entry.kind),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let time = |raw: &str| {
                NaiveTime::parse_from_str(raw, "%H:%M").map_err(|e| Error::Config {
                    message: format!("Invalid time '{raw}' in {} window: {e}", entry.kind),
                })
            };
            let start = time(&entry.start)?;
            let end = time(&entry.end)?;
            if end < start {
                return Err(Error::Config {
                    message: format!(
                        "{} window ends ({}) before it starts ({})",
                        entry.kind, entry.end, entry.start
                    ),
                });
            }

            windows
                .entry(entry.kind)
                .or_default()
                .push(Window { days, start, end });
        }

        Ok(Self { windows })
    }

    /// Whether `local` falls in one of the windows for `kind`.
    ///
    /// Kinds without configured windows are always allowed.
    #[must_use]
    pub fn is_within_window<T: TimeZone>(&self, kind: EventKind, local: &DateTime<T>) -> bool {
        let Some(windows) = self.windows.get(&kind) else {
            return true;
        };
        let weekday = local.weekday();
        let time = local.time();
        windows
            .iter()
            .any(|w| w.days.contains(&weekday) && w.start <= time && time <= w.end)
    }

    /// Human-readable listing of the windows for `kind`, for error messages.
    #[must_use]
    pub fn describe(&self, kind: EventKind) -> String {
        let Some(windows) = self.windows.get(&kind) else {
            return "any time".to_string();
        };
        let mut out = String::new();
        for (i, w) in windows.iter().enumerate() {
            if i > 0 {
                out.push_str("; ");
            }
            let days: Vec<String> = w.days.iter().map(ToString::to_string).collect();
            let _ = write!(
                out,
                "{} {}–{}",
                days.join("/"),
                w.start.format("%-I:%M%P"),
                w.end.format("%-I:%M%P")
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::EventSettings;
    use chrono::Timelike;
    use chrono_tz::America::Los_Angeles;

    fn monday_morning() -> DateTime<Utc> {
        // 2025-03-03 09:00 PST
        Utc.with_ymd_and_hms(2025, 3, 3, 17, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_time_formats() {
        let t = |s| parse_time(s).unwrap();
        assert_eq!(t("4pm"), NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert_eq!(t("4:30pm"), NaiveTime::from_hms_opt(16, 30, 0).unwrap());
        assert_eq!(t(" 4:30 PM "), NaiveTime::from_hms_opt(16, 30, 0).unwrap());
        assert_eq!(t("16:30"), NaiveTime::from_hms_opt(16, 30, 0).unwrap());
        assert_eq!(t("12am"), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(t("12:15pm"), NaiveTime::from_hms_opt(12, 15, 0).unwrap());
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        for bad in ["", "noon", "16", "13pm", "4:3pm", "25:00", "4:75pm"] {
            assert!(
                matches!(parse_time(bad), Err(Error::InvalidTime { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let d = |s| parse_date(s, today).unwrap();
        assert_eq!(d("today"), today);
        assert_eq!(d("Tomorrow"), NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
        assert_eq!(d("3/7"), NaiveDate::from_ymd_opt(2025, 3, 7).unwrap());
        assert_eq!(d("03/07/26"), NaiveDate::from_ymd_opt(2026, 3, 7).unwrap());
        assert_eq!(d("2025-12-01"), NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert!(parse_date("2/30", today).is_err());
        assert!(parse_date("next week", today).is_err());
    }

    #[test]
    fn test_parse_civil_datetime_uses_campus_timezone() {
        let civil = CivilTime::new(Los_Angeles);
        let instant = civil
            .parse_civil_datetime(monday_morning(), None, "4:30pm")
            .unwrap();
        // 16:30 PST is 00:30 UTC the next day
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 3, 4, 0, 30, 0).unwrap());
        assert_eq!(civil.to_local(instant).hour(), 16);
    }

    #[test]
    fn test_parse_civil_datetime_dst_edges() {
        let civil = CivilTime::new(Los_Angeles);
        let now = monday_morning();

        // Spring forward: 02:30 on 2025-03-09 never happens
        assert!(matches!(
            civil.parse_civil_datetime(now, Some("2025-03-09"), "2:30am"),
            Err(Error::InvalidTime { .. })
        ));

        // Fall back: 01:30 on 2025-11-02 happens twice, take the PDT one
        let ambiguous = civil
            .parse_civil_datetime(now, Some("2025-11-02"), "1:30am")
            .unwrap();
        assert_eq!(ambiguous, Utc.with_ymd_and_hms(2025, 11, 2, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_default_windows() {
        let windows = MealWindows::from_config(&EventSettings::default().windows).unwrap();
        let at = |d: u32, h: u32, m: u32| Los_Angeles.with_ymd_and_hms(2025, 3, d, h, m, 0).unwrap();

        // Monday
        assert!(windows.is_within_window(EventKind::Dinner, &at(3, 16, 30)));
        assert!(!windows.is_within_window(EventKind::Dinner, &at(3, 16, 29)));
        assert!(windows.is_within_window(EventKind::Breakfast, &at(3, 7, 0)));
        // Saturday breakfast opens later
        assert!(!windows.is_within_window(EventKind::Breakfast, &at(8, 8, 0)));
        assert!(windows.is_within_window(EventKind::Breakfast, &at(8, 9, 30)));
        // Podrun has no window
        assert!(windows.is_within_window(EventKind::Podrun, &at(8, 3, 0)));
    }

    #[test]
    fn test_window_config_validation() {
        let bad_day = WindowConfig {
            kind: EventKind::Lunch,
            days: vec!["Funday".to_string()],
            start: "11:00".to_string(),
            end: "14:00".to_string(),
        };
        assert!(matches!(
            MealWindows::from_config(&[bad_day]),
            Err(Error::Config { .. })
        ));

        let reversed = WindowConfig {
            kind: EventKind::Lunch,
            days: vec!["Mon".to_string()],
            start: "14:00".to_string(),
            end: "11:00".to_string(),
        };
        assert!(MealWindows::from_config(&[reversed]).is_err());
    }

    #[test]
    fn test_describe_windows() {
        let windows = MealWindows::from_config(&EventSettings::default().windows).unwrap();
        assert_eq!(windows.describe(EventKind::Dinner), "Mon/Tue/Wed/Thu/Fri/Sat/Sun 4:30pm–9:00pm");
        assert_eq!(windows.describe(EventKind::Podrun), "any time");
    }
}
