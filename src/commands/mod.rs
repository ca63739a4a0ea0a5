pub mod expand;
pub mod grid;
pub mod move_event;
pub mod new;

use std::path::Path;

use anyhow::{Context, Result};
use calgrid_core::LoadedEvents;
use owo_colors::OwoColorize;

/// Load and normalize an event file. Records that fail to load are listed
/// on stderr and left out.
pub fn load_events(path: &Path) -> Result<LoadedEvents> {
    let loaded = LoadedEvents::load(path)
        .with_context(|| format!("Could not load events from {}", path.display()))?;

    for (title, error) in &loaded.rejected {
        let title = if title.trim().is_empty() { "(untitled)" } else { title };
        eprintln!("{}", format!("Skipped '{}': {}", title, error).yellow());
    }

    tracing::debug!(
        path = %path.display(),
        events = loaded.events.len(),
        overrides = loaded.overrides.len(),
        "Loaded event file"
    );

    Ok(loaded)
}

/// Report events that could not be expanded.
pub fn report_failures(failures: &[(String, calgrid_core::CalGridError)]) {
    for (event_id, error) in failures {
        eprintln!("{}", format!("Could not expand '{}': {}", event_id, error).red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_valid_records_and_skips_bad_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.toml");
        std::fs::write(
            &path,
            r#"
[[events]]
id = "gym"
title = "Gym"
date = "2024-01-01T07:00:00"
repeat = "daily"

[[events]]
title = "Bad weekday"
date = "2024-01-01T07:00:00"
repeat = "weekly"
repeatDays = [9]

[[events]]
title = "Bad repeat"
date = "2024-01-01T07:00:00"
repeat = "fortnightly"
"#,
        )
        .unwrap();

        let loaded = load_events(&path).unwrap();
        assert_eq!(loaded.events.len(), 1);
        assert_eq!(loaded.rejected.len(), 2);
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_events(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
