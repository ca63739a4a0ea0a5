//! Normalized event types.
//!
//! An [`Event`] is the single explicit shape the engine works with. Loose
//! input from a form or a file goes through [`crate::form::EventRecord`]
//! first and is normalized exactly once.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{CalGridError, CalGridResult};

/// Weekdays in index order, 0 = Sunday.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Reminder choices offered by the event dialog, in minutes before start.
pub const REMINDER_PRESETS: [u32; 6] = [0, 5, 15, 30, 60, 1440];

/// Duration choices offered by the event dialog, in minutes.
pub const DURATION_PRESETS: [u32; 8] = [15, 30, 60, 90, 120, 180, 240, 480];

/// Default duration for new events, in minutes.
pub const DEFAULT_DURATION: u32 = 60;

/// A calendar event (series definition)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Start of the first occurrence, floating local time
    pub date: NaiveDateTime,
    /// Minutes, ignored for all-day events
    pub duration: u32,
    pub is_all_day: bool,
    pub end_date: NaiveDateTime,
    /// Key into a category palette owned by the caller
    pub category: Option<String>,
    pub recurrence: Recurrence,
    pub reminder: Option<Reminder>,
    /// People the event is shared with (email-like, duplicates allowed)
    pub share_with: Vec<String>,
}

/// How often a series repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    #[default]
    Never,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Recurrence rule of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub repeat: Repeat,
    /// Stride between occurrences in the rule's unit
    pub interval: u32,
    /// Weekdays for weekly rules
    pub days: RepeatDays,
    /// First day of the weeks an `interval > 1` weekly rule counts in
    #[serde(default = "default_week_start")]
    pub week_start: Weekday,
    pub end: RepeatEnd,
}

fn default_week_start() -> Weekday {
    Weekday::Sun
}

/// When a series stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatEnd {
    #[default]
    Never,
    /// Last calendar day an occurrence may fall on
    On(NaiveDate),
    /// Total number of occurrences in the series
    After(u32),
}

/// Set of weekdays, serialized as indices with 0 = Sunday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct RepeatDays(u8);

/// A reminder before the event starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub minutes: u32,
}

impl Default for Recurrence {
    fn default() -> Self {
        Recurrence {
            repeat: Repeat::Never,
            interval: 1,
            days: RepeatDays::default(),
            week_start: default_week_start(),
            end: RepeatEnd::Never,
        }
    }
}

impl Recurrence {
    pub fn new(repeat: Repeat) -> Self {
        Recurrence {
            repeat,
            ..Recurrence::default()
        }
    }

    #[must_use]
    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn on_days(mut self, days: RepeatDays) -> Self {
        self.days = days;
        self
    }

    #[must_use]
    pub fn week_starting(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    #[must_use]
    pub fn until(mut self, end: RepeatEnd) -> Self {
        self.end = end;
        self
    }
}

impl RepeatDays {
    pub fn from_indices(indices: &[u8]) -> CalGridResult<Self> {
        let mut days = RepeatDays::default();
        for &index in indices {
            if index > 6 {
                return Err(CalGridError::InvalidRule(format!(
                    "Weekday index {} is out of range (0=Sunday..6=Saturday)",
                    index
                )));
            }
            days.0 |= 1 << index;
        }
        Ok(days)
    }

    pub fn from_weekdays(weekdays: &[Weekday]) -> Self {
        weekdays.iter().fold(RepeatDays::default(), |mut days, wd| {
            days.insert(*wd);
            days
        })
    }

    pub fn insert(&mut self, weekday: Weekday) {
        self.0 |= 1 << weekday_index(weekday);
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0 & (1 << weekday_index(weekday)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Weekdays in the set, Sunday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEKDAYS.into_iter().filter(|wd| self.contains(*wd))
    }

    pub fn indices(&self) -> Vec<u8> {
        self.iter().map(weekday_index).collect()
    }

    /// Shift every weekday forward by `days` (negative shifts backward).
    #[must_use]
    pub fn rotate(&self, days: i64) -> Self {
        let rotated = self.iter().map(|wd| rotate_weekday(wd, days));
        RepeatDays::from_weekdays(&rotated.collect::<Vec<_>>())
    }
}

impl TryFrom<Vec<u8>> for RepeatDays {
    type Error = CalGridError;

    fn try_from(indices: Vec<u8>) -> Result<Self, Self::Error> {
        RepeatDays::from_indices(&indices)
    }
}

impl From<RepeatDays> for Vec<u8> {
    fn from(days: RepeatDays) -> Self {
        days.indices()
    }
}

impl Reminder {
    /// Build a reminder from a raw minute count, where 0 means none.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes > 0).then_some(Reminder { minutes })
    }

    pub fn label(&self) -> String {
        match self.minutes {
            60 => "1 hour before".to_string(),
            1440 => "1 day before".to_string(),
            1 => "1 minute before".to_string(),
            m => format!("{} minutes before", m),
        }
    }
}

/// Human label for a duration in minutes (e.g. "1.5 hours", "1 hour 40 minutes").
pub fn duration_label(minutes: u32) -> String {
    match minutes {
        m if m < 60 => format!("{} minutes", m),
        60 => "1 hour".to_string(),
        m if m % 60 == 0 => format!("{} hours", m / 60),
        m if m % 30 == 0 => format!("{}.5 hours", m / 60),
        m => {
            let hours = m / 60;
            let unit = if hours == 1 { "hour" } else { "hours" };
            format!("{} {} {} minutes", hours, unit, m % 60)
        }
    }
}

/// Index of a weekday with 0 = Sunday.
pub fn weekday_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_sunday() as u8
}

/// `weekday` shifted forward by `days` (negative shifts backward).
pub fn rotate_weekday(weekday: Weekday, days: i64) -> Weekday {
    let shift = days.rem_euclid(7) as usize;
    WEEKDAYS[(usize::from(weekday_index(weekday)) + shift) % 7]
}

/// Last representable instant of a calendar day (23:59:59.999).
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN))
}

impl Event {
    /// A timed, non-repeating event.
    pub fn new(title: impl Into<String>, date: NaiveDateTime, duration: u32) -> Self {
        Event {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            date,
            duration,
            is_all_day: false,
            end_date: date + Duration::minutes(i64::from(duration)),
            category: None,
            recurrence: Recurrence::default(),
            reminder: None,
            share_with: Vec::new(),
        }
    }

    /// An all-day, non-repeating event.
    pub fn all_day(title: impl Into<String>, day: NaiveDate) -> Self {
        let mut event = Event::new(title, day.and_time(NaiveTime::MIN), DEFAULT_DURATION);
        event.is_all_day = true;
        event.end_date = end_of_day(day);
        event
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.repeat != Repeat::Never
    }

    /// Length of one occurrence, end-of-day aware for all-day events.
    pub fn occurrence_end(&self, start: NaiveDateTime) -> NaiveDateTime {
        if self.is_all_day {
            end_of_day(start.date())
        } else {
            start + Duration::minutes(i64::from(self.duration))
        }
    }

    /// Add someone to share the event with. Blank input is ignored.
    /// Returns true if an entry was added.
    pub fn share_with(&mut self, email: &str) -> bool {
        let email = email.trim();
        if email.is_empty() {
            return false;
        }
        self.share_with.push(email.to_string());
        true
    }

    /// Remove every entry equal to `email`. Returns how many were removed.
    pub fn unshare(&mut self, email: &str) -> usize {
        let before = self.share_with.len();
        self.share_with.retain(|e| e != email);
        before - self.share_with.len()
    }

    /// Weekday of the first occurrence.
    pub fn start_weekday(&self) -> Weekday {
        self.date.weekday()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Repeat::Never => "never",
            Repeat::Daily => "daily",
            Repeat::Weekly => "weekly",
            Repeat::Monthly => "monthly",
            Repeat::Yearly => "yearly",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Repeat {
    type Err = CalGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "never" | "none" => Ok(Repeat::Never),
            "daily" => Ok(Repeat::Daily),
            "weekly" => Ok(Repeat::Weekly),
            "monthly" => Ok(Repeat::Monthly),
            "yearly" => Ok(Repeat::Yearly),
            other => Err(CalGridError::Parse(format!(
                "Unknown repeat '{}'. Expected never, daily, weekly, monthly or yearly",
                other
            ))),
        }
    }
}
