use std::path::Path;

use anyhow::Result;
use calgrid_core::OverrideTable;
use calgrid_core::date_range::DateRange;
use calgrid_core::grid::{View, expand_all};
use chrono::NaiveDate;
use owo_colors::OwoColorize;

use crate::commands::{load_events, report_failures};
use crate::render::{OccurrenceRender, format_date_label, index_events};

pub fn run(path: &Path, range: DateRange, json: bool, today: NaiveDate) -> Result<()> {
    let loaded = load_events(path)?;
    let overrides: OverrideTable = loaded.overrides.into_iter().collect();

    let report = expand_all(&loaded.events, &overrides, &range);
    report_failures(&report.failures);

    if json {
        println!("{}", serde_json::to_string_pretty(&report.occurrences)?);
        return Ok(());
    }

    if report.occurrences.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    let events = index_events(&loaded.events);
    let mut current_date: Option<NaiveDate> = None;

    for occurrence in &report.occurrences {
        let date = occurrence.occurrence_date.date();

        if current_date != Some(date) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", format_date_label(date, today).bold());
            current_date = Some(date);
        }

        let event = events.get(occurrence.source_event_id.as_str()).copied();
        println!("{}", occurrence.render_in(event, View::Day));
    }

    Ok(())
}
