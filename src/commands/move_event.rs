use std::path::Path;

use anyhow::Result;
use calgrid_core::{Command, EventFile, MoveOutcome, MoveScope};
use chrono::NaiveDateTime;
use owo_colors::OwoColorize;

use crate::commands::load_events;
use crate::dates::Start;

/// Build the command for a move. A target without a time of day drops the
/// occurrence onto that day and keeps its time.
pub fn command_for(
    event_id: String,
    occurrence_date: NaiveDateTime,
    to: Start,
    scope: MoveScope,
) -> Command {
    match to {
        Start::At(new_date) => Command::Move {
            event_id,
            occurrence_date,
            new_date,
            scope,
        },
        Start::Day(day) => Command::Drop {
            event_id,
            occurrence_date,
            day,
            scope,
        },
    }
}

pub fn run(path: &Path, command: Command) -> Result<()> {
    let loaded = load_events(path)?;
    let outcome = command.apply(&loaded.events)?;

    let (summary, file) = match outcome {
        MoveOutcome::Series(event) => (
            format!("Moved series '{}' to {}", event.title, event.date),
            EventFile {
                events: vec![event.to_record()],
                ..EventFile::default()
            },
        ),
        MoveOutcome::Override(ov) => (
            format!(
                "Moved one occurrence of '{}' from {} to {}",
                ov.source_event_id, ov.original_occurrence_date, ov.new_date
            ),
            EventFile {
                overrides: vec![ov],
                ..EventFile::default()
            },
        ),
    };

    eprintln!("{}", summary.green());
    print!("{}", file.to_toml_string()?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn date_only_target_becomes_a_drop() {
        let occurrence = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();

        let command = command_for("gym".into(), occurrence, Start::Day(day), MoveScope::Occurrence);
        assert!(matches!(command, Command::Drop { day: d, .. } if d == day));

        let at = day.and_hms_opt(18, 0, 0).unwrap();
        let command = command_for("gym".into(), occurrence, Start::At(at), MoveScope::Series);
        assert!(matches!(
            command,
            Command::Move { new_date, scope: MoveScope::Series, .. } if new_date == at
        ));
    }
}
