use std::{fmt, path::PathBuf, str::FromStr};

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// opaque identity of an alarm, assigned once by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlarmId(Uuid);

impl AlarmId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AlarmId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the first group is plenty for logs and prompts
        let id = self.0.simple().to_string();
        f.write_str(&id[..8])
    }
}

/// A time of day with minute resolution.
///
/// Ordering is chronological within a day, so a list of alarms sorts the
/// way the clock face reads. Serialized as `"HH:MM"`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct AlarmTime {
    hour: u8,
    minute: u8,
}

impl AlarmTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(Error::InvalidTime(format!("{hour}:{minute}")));
        }
        Ok(Self { hour, minute })
    }

    /// the minute `now` falls in, seconds are dropped
    #[must_use]
    pub fn of(now: NaiveDateTime) -> Self {
        Self::from(now.time())
    }
}

impl From<NaiveTime> for AlarmTime {
    #[allow(clippy::cast_possible_truncation)]
    fn from(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }
}

impl From<AlarmTime> for NaiveTime {
    fn from(time: AlarmTime) -> Self {
        Self::from_hms_opt(u32::from(time.hour), u32::from(time.minute), 0).unwrap_or_default()
    }
}

impl FromStr for AlarmTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidTime(s.to_string());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        // minutes are always two digits, hours may drop the leading zero
        if minute.len() != 2 || hour.is_empty() || hour.len() > 2 {
            return Err(invalid());
        }
        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for AlarmTime {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AlarmTime> for String {
    fn from(time: AlarmTime) -> Self {
        time.to_string()
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Weekly repeat pattern, Monday first.
///
/// No day selected means the alarm is a one-time alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct RepeatDays([bool; 7]);

impl RepeatDays {
    pub const ONCE: Self = Self([false; 7]);
    pub const DAILY: Self = Self([true; 7]);

    #[must_use]
    pub const fn new(days: [bool; 7]) -> Self {
        Self(days)
    }

    #[must_use]
    pub fn is_one_time(&self) -> bool {
        !self.0.iter().any(|&day| day)
    }

    #[must_use]
    pub fn includes(&self, day: Weekday) -> bool {
        self.0[day.num_days_from_monday() as usize]
    }

    /// whether the alarm recurs on the weekday of `now`
    #[must_use]
    pub fn includes_date(&self, now: NaiveDateTime) -> bool {
        self.includes(now.weekday())
    }

    pub fn set(&mut self, day: Weekday, on: bool) {
        self.0[day.num_days_from_monday() as usize] = on;
    }

    fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        DAY_NAMES
            .iter()
            .zip(self.0)
            .filter_map(|(name, on)| on.then_some(*name))
    }
}

impl From<[bool; 7]> for RepeatDays {
    fn from(days: [bool; 7]) -> Self {
        Self(days)
    }
}

impl FromIterator<Weekday> for RepeatDays {
    fn from_iter<T: IntoIterator<Item = Weekday>>(iter: T) -> Self {
        let mut days = Self::ONCE;
        for day in iter {
            days.set(day, true);
        }
        days
    }
}

impl FromStr for RepeatDays {
    type Err = Error;

    /// accepts `once`, `daily`, `weekdays`, `weekends` or a comma separated list of day names
    fn from_str(s: &str) -> Result<Self> {
        let mut days = Self::ONCE;
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "once" => {}
                "daily" => days = Self::DAILY,
                "weekdays" => {
                    for day in &mut days.0[..5] {
                        *day = true;
                    }
                }
                "weekends" => {
                    days.0[5] = true;
                    days.0[6] = true;
                }
                _ => {
                    let day = part
                        .parse::<Weekday>()
                        .map_err(|_| Error::InvalidDays(part.to_string()))?;
                    days.set(day, true);
                }
            }
        }
        Ok(days)
    }
}

impl TryFrom<Vec<String>> for RepeatDays {
    type Error = Error;

    fn try_from(value: Vec<String>) -> Result<Self> {
        value.join(",").parse()
    }
}

impl From<RepeatDays> for Vec<String> {
    fn from(days: RepeatDays) -> Self {
        days.names().map(str::to_lowercase).collect()
    }
}

impl fmt::Display for RepeatDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_one_time() {
            return f.write_str("once");
        }
        let names: Vec<_> = self.names().collect();
        f.write_str(&names.join(" "))
    }
}

/// represents an alarm
/// contains the time it should go off at, the weekdays it repeats on and the sound it plays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub id: AlarmId,
    pub time: AlarmTime,
    pub repeat_days: RepeatDays,
    /// opaque to the scheduler, only the player looks at it
    pub sound: PathBuf,
    pub enabled: bool,
}

impl Alarm {
    #[must_use]
    pub fn is_one_time(&self) -> bool {
        self.repeat_days.is_one_time()
    }

    /// Whether this alarm goes off in the minute `now` falls in.
    ///
    /// One-time alarms match on any weekday, repeating ones only on their selected days.
    #[must_use]
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.enabled
            && self.time == AlarmTime::of(now)
            && (self.is_one_time() || self.repeat_days.includes_date(now))
    }
}

/// replacement of the user editable fields of an alarm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmUpdate {
    pub time: AlarmTime,
    pub sound: PathBuf,
    pub repeat_days: RepeatDays,
    /// `None` keeps whatever the alarm currently has
    pub enabled: Option<bool>,
}

impl AlarmUpdate {
    #[must_use]
    pub fn new(time: AlarmTime, sound: impl Into<PathBuf>, repeat_days: RepeatDays) -> Self {
        Self {
            time,
            sound: sound.into(),
            repeat_days,
            enabled: None,
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        // 2024-01-01 is a Monday
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn alarm(time: &str, days: RepeatDays) -> Alarm {
        Alarm {
            id: AlarmId::new(),
            time: time.parse().unwrap(),
            repeat_days: days,
            sound: PathBuf::from("alarm.mp3"),
            enabled: true,
        }
    }

    #[test]
    fn parses_and_normalizes_times() {
        assert_eq!("07:05".parse::<AlarmTime>().unwrap().to_string(), "07:05");
        assert_eq!("7:05".parse::<AlarmTime>().unwrap().to_string(), "07:05");
        assert_eq!(" 23:59 ".parse::<AlarmTime>().unwrap(), AlarmTime::new(23, 59).unwrap());
        for bad in ["24:00", "12:60", "12", "12:5", ":30", "ab:cd", "123:00"] {
            assert!(bad.parse::<AlarmTime>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn times_order_chronologically() {
        let mut times: Vec<AlarmTime> = ["22:00", "06:30", "06:05", "13:00"]
            .iter()
            .map(|t| t.parse().unwrap())
            .collect();
        times.sort();
        let sorted: Vec<String> = times.iter().map(ToString::to_string).collect();
        assert_eq!(sorted, ["06:05", "06:30", "13:00", "22:00"]);
    }

    #[test]
    fn truncates_seconds() {
        assert_eq!(AlarmTime::of(at(1, 7, 0, 59)).to_string(), "07:00");
    }

    #[test]
    fn parses_repeat_days() {
        let days: RepeatDays = "mon, Wed,sunday".parse().unwrap();
        assert_eq!(
            days,
            [Weekday::Mon, Weekday::Wed, Weekday::Sun].into_iter().collect()
        );
        assert_eq!(days.to_string(), "Mon Wed Sun");

        let weekdays: RepeatDays = "weekdays".parse().unwrap();
        assert!(weekdays.includes(Weekday::Fri));
        assert!(!weekdays.includes(Weekday::Sat));
        assert!(!weekdays.includes(Weekday::Sun));

        assert!("".parse::<RepeatDays>().unwrap().is_one_time());
        assert_eq!(RepeatDays::ONCE.to_string(), "once");
        assert!("funday".parse::<RepeatDays>().is_err());
    }

    #[test]
    fn one_time_alarm_is_due_on_any_day() {
        let once = alarm("07:00", RepeatDays::ONCE);
        for day in 1..=7 {
            assert!(once.is_due(at(day, 7, 0, 0)));
        }
        assert!(!once.is_due(at(1, 7, 1, 0)));
    }

    #[test]
    fn repeating_alarm_is_due_only_on_selected_days() {
        let monday = alarm("07:00", [Weekday::Mon].into_iter().collect());
        assert!(monday.is_due(at(1, 7, 0, 30)));
        assert!(!monday.is_due(at(2, 7, 0, 0)));
        assert!(monday.is_due(at(8, 7, 0, 0)));
    }

    #[test]
    fn disabled_alarm_is_never_due() {
        let mut once = alarm("07:00", RepeatDays::ONCE);
        once.enabled = false;
        assert!(!once.is_due(at(1, 7, 0, 0)));
    }
}
