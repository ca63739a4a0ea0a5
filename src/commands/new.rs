use anyhow::Result;
use calgrid_core::recurrence::series_len;
use calgrid_core::{
    DURATION_PRESETS, Event, EventFile, EventRecord, REMINDER_PRESETS, Repeat, RepeatEndType,
    duration_label,
};
use chrono::NaiveDate;
use owo_colors::OwoColorize;

use crate::dates::{self, Start};

/// Arguments of `calgrid new`, as typed.
#[derive(Debug, Default)]
pub struct NewEventArgs {
    pub title: String,
    pub start: String,
    pub duration: Option<String>,
    pub all_day: bool,
    pub repeat: Option<String>,
    pub every: Option<u32>,
    pub on: Option<String>,
    pub until: Option<String>,
    pub count: Option<u32>,
    pub category: Option<String>,
    pub reminder: Option<u32>,
    pub share_with: Vec<String>,
}

/// Fill an event record the way the event dialog would.
pub fn build_record(args: NewEventArgs) -> Result<EventRecord> {
    let start = dates::parse_start(&args.start)?;
    let mut record = EventRecord::new(args.title, start.datetime());

    // A start without a time of day is an all-day event
    record.is_all_day = args.all_day || matches!(start, Start::Day(_));

    if let Some(input) = &args.duration {
        let minutes = dates::parse_duration_minutes(input)?;
        if !DURATION_PRESETS.contains(&minutes) {
            tracing::debug!(minutes, "Duration is not one of the dialog presets");
        }
        record.duration = Some(minutes);
    }

    if let Some(repeat) = &args.repeat {
        record.repeat = repeat.parse::<Repeat>()?;
    }
    record.repeat_interval = args.every;
    if let Some(days) = &args.on {
        record.repeat_days = dates::parse_weekdays(days)?;
    }

    match (&args.until, args.count) {
        (Some(_), Some(_)) => anyhow::bail!("Use either --until or --count, not both"),
        (Some(until), None) => {
            record.repeat_end_type = RepeatEndType::On;
            record.repeat_end_date = Some(parse_until(until)?);
        }
        (None, Some(count)) => {
            record.repeat_end_type = RepeatEndType::After;
            record.repeat_count = Some(count);
        }
        (None, None) => {}
    }

    if let Some(minutes) = args.reminder {
        if !REMINDER_PRESETS.contains(&minutes) {
            anyhow::bail!(
                "Reminder must be one of {:?} minutes",
                REMINDER_PRESETS
            );
        }
        record.reminder = minutes;
    }

    record.category = args.category;
    record.share_with = args.share_with;

    Ok(record)
}

fn parse_until(input: &str) -> Result<NaiveDate> {
    Ok(dates::parse_start(input)?.datetime().date())
}

pub fn run(args: NewEventArgs) -> Result<()> {
    let event = build_record(args)?.into_event()?;

    eprintln!("{}", describe(&event)?.green());
    let file = EventFile {
        events: vec![event.to_record()],
        ..EventFile::default()
    };
    print!("{}", file.to_toml_string()?);

    Ok(())
}

/// One-line summary, e.g. "Gym: 1 hour, repeats weekly, 10 occurrences".
fn describe(event: &Event) -> Result<String> {
    let mut parts = Vec::new();

    if event.is_all_day {
        parts.push("all-day".to_string());
    } else {
        parts.push(duration_label(event.duration));
    }

    if event.is_recurring() {
        parts.push(format!("repeats {}", event.recurrence.repeat));
        if let Some(total) = series_len(event)? {
            parts.push(format!("{} occurrences", total));
        }
    }

    if let Some(reminder) = event.reminder {
        parts.push(reminder.label());
    }

    Ok(format!("{}: {}", event.title, parts.join(", ")))
}
