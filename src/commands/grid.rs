use std::path::Path;

use anyhow::{Context, Result};
use calgrid_core::grid::{
    DayCell, View, bucket_days, bucket_hours, expand_all, visible_days, visible_range,
};
use calgrid_core::{Occurrence, OverrideTable};
use chrono::{NaiveDate, Weekday};
use owo_colors::OwoColorize;

use crate::commands::{load_events, report_failures};
use crate::render::{
    EventIndex, OccurrenceRender, Render, format_date_label, index_events, pluralize, render_cell,
};

pub fn run(path: &Path, view: View, date: NaiveDate, week_start: Weekday, today: NaiveDate) -> Result<()> {
    let loaded = load_events(path)?;
    let overrides: OverrideTable = loaded.overrides.into_iter().collect();

    let days = visible_days(view, date, week_start);
    let range = visible_range(&days).context("View has no days")?;
    tracing::debug!(%view, start = %range.start, end = %range.end, "Visible range");

    let report = expand_all(&loaded.events, &overrides, &range);
    report_failures(&report.failures);

    let events = index_events(&loaded.events);
    let cells = bucket_days(&days, &report.occurrences, &loaded.holidays);

    let title = match view {
        View::Month => date.format("%B %Y").to_string(),
        View::Week => format!("Week of {}", range.start.format("%b %-d, %Y")),
        View::Day => date.format("%A %B %-d, %Y").to_string(),
    };
    let count = report.occurrences.len();
    println!(
        "{} {}",
        title.bold(),
        format!("({} {})", count, pluralize("event", count)).dimmed()
    );
    println!();

    if view == View::Day {
        let cell = cells.first().context("Day view has no cell")?;
        print_day(date, cell, &report.occurrences, &events, today);
        return Ok(());
    }

    let mut printed_any = false;
    for cell in &cells {
        let lines = render_cell(cell, &events, view, today);
        if lines.is_empty() {
            continue;
        }
        if printed_any {
            println!();
        }
        println!("{}", lines.join("\n"));
        printed_any = true;
    }

    if !printed_any {
        println!("{}", "No events found".dimmed());
    }

    Ok(())
}

/// Day view: holidays and all-day events on top, then one row per hour.
fn print_day(
    date: NaiveDate,
    cell: &DayCell,
    occurrences: &[Occurrence],
    events: &EventIndex,
    today: NaiveDate,
) {
    let header = format_date_label(date, today);
    println!("{}", header.bold());

    for holiday in &cell.holidays {
        println!("{}", holiday.render());
    }

    let slots = bucket_hours(date, occurrences);
    for (hour, slot) in slots.iter().enumerate() {
        let (all_day, timed): (Vec<_>, Vec<_>) = slot.iter().partition(|o| {
            events
                .get(o.source_event_id.as_str())
                .is_some_and(|e| e.is_all_day)
        });

        for occurrence in all_day {
            let event = events.get(occurrence.source_event_id.as_str()).copied();
            println!("{}", occurrence.render_in(event, View::Day));
        }

        let label = format!("{:>5}", format!("{:02}:00", hour));
        if timed.is_empty() {
            println!("{}", label.dimmed());
            continue;
        }
        println!("{}", label);
        for occurrence in timed {
            let event = events.get(occurrence.source_event_id.as_str()).copied();
            println!("  {}", occurrence.render_in(event, View::Day));
        }
    }
}
