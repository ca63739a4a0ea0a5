//! Event records as they come from the event dialog or an event file.
//!
//! Records keep the dialog's loose camelCase shape, where any field may be
//! missing and the repeat-end fields sit side by side. [`EventRecord::into_event`]
//! applies the dialog defaults and produces a normalized [`Event`].

use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{CalGridError, CalGridResult};
use crate::event::{
    DEFAULT_DURATION, Event, Recurrence, Reminder, Repeat, RepeatDays, RepeatEnd, WEEKDAYS,
    end_of_day, weekday_index,
};
use crate::grid::Holiday;
use crate::overrides::Override;

/// Which repeat-end field is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatEndType {
    #[default]
    Never,
    On,
    After,
}

/// Loosely typed event as submitted by the event dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub repeat: Repeat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repeat_days: Vec<u8>,
    /// First day of the week for alternate-week rules, 0 = Sunday
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start: Option<u8>,
    #[serde(default)]
    pub repeat_end_type: RepeatEndType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_count: Option<u32>,
    #[serde(default)]
    pub reminder: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub share_with: Vec<String>,
}

impl EventRecord {
    /// A blank record starting at `date`, as the dialog opens for a new event.
    pub fn new(title: impl Into<String>, date: NaiveDateTime) -> Self {
        EventRecord {
            title: title.into(),
            date,
            ..EventRecord::default()
        }
    }

    /// Normalize into an [`Event`], applying the dialog's defaults.
    pub fn into_event(self) -> CalGridResult<Event> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(CalGridError::InvalidEvent("Title is required".into()));
        }

        let duration = self.duration.unwrap_or(DEFAULT_DURATION);
        let end_date = if self.is_all_day {
            end_of_day(self.date.date())
        } else {
            match self.end_date {
                Some(end) if end >= self.date => end,
                _ => self.date + Duration::minutes(i64::from(duration)),
            }
        };

        let end = match self.repeat_end_type {
            RepeatEndType::Never => RepeatEnd::Never,
            RepeatEndType::On => RepeatEnd::On(self.repeat_end_date.ok_or_else(|| {
                CalGridError::InvalidRule("Repeat end type 'on' needs an end date".into())
            })?),
            RepeatEndType::After => RepeatEnd::After(self.repeat_count.ok_or_else(|| {
                CalGridError::InvalidRule("Repeat end type 'after' needs a count".into())
            })?),
        };

        let week_start = match self.week_start {
            None => Weekday::Sun,
            Some(index) => *WEEKDAYS.get(usize::from(index)).ok_or_else(|| {
                CalGridError::InvalidRule(format!(
                    "Week start {} is out of range (0=Sunday..6=Saturday)",
                    index
                ))
            })?,
        };

        let recurrence = Recurrence {
            repeat: self.repeat,
            interval: self.repeat_interval.unwrap_or(1),
            days: RepeatDays::from_indices(&self.repeat_days)?,
            week_start,
            end,
        };

        let description = self.description.filter(|d| !d.trim().is_empty());
        let category = self.category.filter(|c| !c.is_empty());

        let mut event = Event {
            id: self
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            title,
            description,
            date: self.date,
            duration,
            is_all_day: self.is_all_day,
            end_date,
            category,
            recurrence,
            reminder: Reminder::from_minutes(self.reminder),
            share_with: Vec::new(),
        };
        for email in &self.share_with {
            event.share_with(email);
        }

        Ok(event)
    }
}

impl Event {
    /// The record shape used to populate the edit dialog or write a file.
    pub fn to_record(&self) -> EventRecord {
        let (repeat_end_type, repeat_end_date, repeat_count) = match self.recurrence.end {
            RepeatEnd::Never => (RepeatEndType::Never, None, None),
            RepeatEnd::On(date) => (RepeatEndType::On, Some(date), None),
            RepeatEnd::After(count) => (RepeatEndType::After, None, Some(count)),
        };

        EventRecord {
            id: Some(self.id.clone()),
            title: self.title.clone(),
            description: self.description.clone(),
            date: self.date,
            category: self.category.clone(),
            duration: Some(self.duration),
            is_all_day: self.is_all_day,
            end_date: Some(self.end_date),
            repeat: self.recurrence.repeat,
            repeat_interval: Some(self.recurrence.interval),
            repeat_days: self.recurrence.days.indices(),
            week_start: (self.recurrence.week_start != Weekday::Sun)
                .then(|| weekday_index(self.recurrence.week_start)),
            repeat_end_type,
            repeat_end_date,
            repeat_count,
            reminder: self.reminder.map(|r| r.minutes).unwrap_or(0),
            share_with: self.share_with.clone(),
        }
    }
}

/// Contents of an event file: `[[events]]`, `[[overrides]]` and
/// `[[holidays]]` tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFile {
    #[serde(default)]
    pub events: Vec<EventRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<Override>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holidays: Vec<Holiday>,
}

/// An event file read entry by entry, before any entry is typed.
#[derive(Debug, Default, Deserialize)]
struct RawEventFile {
    #[serde(default)]
    events: Vec<toml::Value>,
    #[serde(default)]
    overrides: Vec<toml::Value>,
    #[serde(default)]
    holidays: Vec<toml::Value>,
}

/// Events from a file, with records that failed to load kept aside.
#[derive(Debug, Default)]
pub struct LoadedEvents {
    pub events: Vec<Event>,
    pub overrides: Vec<Override>,
    pub holidays: Vec<Holiday>,
    /// (record title, error) for each rejected record
    pub rejected: Vec<(String, CalGridError)>,
}

impl LoadedEvents {
    /// Read an event file. Only a TOML syntax error fails the whole file: an
    /// entry with a bad field is rejected on its own.
    pub fn from_toml_str(content: &str) -> CalGridResult<Self> {
        let raw: RawEventFile =
            toml::from_str(content).map_err(|e| CalGridError::Parse(e.to_string()))?;
        let mut loaded = LoadedEvents::default();

        for value in raw.events {
            let title = value
                .get("title")
                .and_then(toml::Value::as_str)
                .unwrap_or_default()
                .to_string();
            match value.try_into::<EventRecord>() {
                Ok(record) => loaded.push_record(record),
                Err(e) => loaded.reject(title, CalGridError::Parse(e.to_string())),
            }
        }

        for value in raw.overrides {
            match value.try_into::<Override>() {
                Ok(ov) => loaded.overrides.push(ov),
                Err(e) => loaded.reject("override".into(), CalGridError::Parse(e.to_string())),
            }
        }

        for value in raw.holidays {
            match value.try_into::<Holiday>() {
                Ok(holiday) => loaded.holidays.push(holiday),
                Err(e) => loaded.reject("holiday".into(), CalGridError::Parse(e.to_string())),
            }
        }

        Ok(loaded)
    }

    pub fn load(path: &Path) -> CalGridResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn push_record(&mut self, record: EventRecord) {
        let title = record.title.clone();
        match record.into_event() {
            Ok(event) => self.events.push(event),
            Err(e) => self.reject(title, e),
        }
    }

    fn reject(&mut self, title: String, error: CalGridError) {
        tracing::warn!(title = %title, error = %error, "Skipping event record");
        self.rejected.push((title, error));
    }
}

impl EventFile {
    pub fn from_toml_str(content: &str) -> CalGridResult<Self> {
        toml::from_str(content).map_err(|e| CalGridError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> CalGridResult<String> {
        toml::to_string_pretty(self).map_err(|e| CalGridError::Parse(e.to_string()))
    }

    /// Normalize every record. A bad record does not stop the others.
    pub fn normalize(self) -> LoadedEvents {
        let mut loaded = LoadedEvents {
            overrides: self.overrides,
            holidays: self.holidays,
            ..LoadedEvents::default()
        };

        for record in self.events {
            loaded.push_record(record);
        }

        loaded
    }
}
