//! Terminal rendering for calgrid types.
//!
//! Adds colored output to calgrid-core types using owo_colors.

use std::collections::HashMap;

use calgrid_core::grid::{DayCell, Holiday, View};
use calgrid_core::{Event, Occurrence};
use chrono::NaiveDate;
use owo_colors::OwoColorize;

/// Extension trait for terminal rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Holiday {
    fn render(&self) -> String {
        format!("  ★ {}", self.label()).yellow().to_string()
    }
}

/// Events by id, for looking up what an occurrence belongs to.
pub type EventIndex<'a> = HashMap<&'a str, &'a Event>;

pub fn index_events(events: &[Event]) -> EventIndex<'_> {
    events.iter().map(|e| (e.id.as_str(), e)).collect()
}

/// Rendering of an occurrence, which needs its event and the view it sits in.
pub trait OccurrenceRender {
    fn render_in(&self, event: Option<&Event>, view: View) -> String;
}

impl OccurrenceRender for Occurrence {
    fn render_in(&self, event: Option<&Event>, view: View) -> String {
        let Some(event) = event else {
            return format!("  {} {}", self.occurrence_date, self.source_event_id.red());
        };

        let mut line = String::from("  ");
        if let Some(time) = format_time(self, event, view) {
            line.push_str(&time);
            line.push(' ');
        }
        line.push_str(&event.title);

        if let Some(category) = &event.category {
            line.push(' ');
            line.push_str(&format!("[{}]", category).dimmed().to_string());
        }
        if let Some(from) = self.moved_from {
            let note = format!("(moved from {})", from.format("%a %b %-d %-I:%M %p"));
            line.push(' ');
            line.push_str(&note.cyan().to_string());
        }

        line
    }
}

/// Time column of an occurrence. Month cells are too narrow for times, so
/// only all-day events get a label there.
fn format_time(occurrence: &Occurrence, event: &Event, view: View) -> Option<String> {
    if event.is_all_day {
        return Some(format!("{:>8}", "all-day"));
    }
    match view {
        View::Month => None,
        View::Week | View::Day => Some(format!(
            "{:>8}",
            occurrence.occurrence_date.format("%-I:%M %p")
        )),
    }
}

/// Human date label ("Today", "Tomorrow", "Wed Feb 25").
pub fn format_date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// Lines for one grid cell: a dated header, then holidays, then occurrences.
/// Empty cells of a month view are skipped.
pub fn render_cell(cell: &DayCell, events: &EventIndex, view: View, today: NaiveDate) -> Vec<String> {
    let mut lines = Vec::new();

    if view == View::Month && cell.holidays.is_empty() && cell.occurrences.is_empty() {
        return lines;
    }

    let label = format_date_label(cell.day.date, today);
    let header = if cell.day.is_outside_month {
        label.dimmed().to_string()
    } else if cell.day.date == today {
        label.bold().green().to_string()
    } else {
        label.bold().to_string()
    };
    lines.push(header);

    lines.extend(cell.holidays.iter().map(Holiday::render));
    lines.extend(
        cell.occurrences
            .iter()
            .map(|o| o.render_in(events.get(o.source_event_id.as_str()).copied(), view)),
    );

    if cell.holidays.is_empty() && cell.occurrences.is_empty() {
        lines.push("  No events".dimmed().to_string());
    }

    lines
}

/// Simple pluralization helper
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
