//! Parsing of the date, duration and weekday arguments users type.

use anyhow::{Context, Result};
use calgrid_core::weekday_index;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// A parsed start: either a time of day was given or only a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Start {
    At(NaiveDateTime),
    Day(NaiveDate),
}

impl Start {
    pub fn datetime(self) -> NaiveDateTime {
        match self {
            Start::At(dt) => dt,
            Start::Day(d) => d.and_time(NaiveTime::MIN),
        }
    }
}

/// Expand common abbreviations that fuzzydate doesn't handle.
fn expand_abbreviations(input: &str) -> String {
    let abbrevs = [
        ("mon", "monday"),
        ("tue", "tuesday"),
        ("tues", "tuesday"),
        ("wed", "wednesday"),
        ("thu", "thursday"),
        ("thur", "thursday"),
        ("thurs", "thursday"),
        ("fri", "friday"),
        ("sat", "saturday"),
        ("sun", "sunday"),
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("sept", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];

    input
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            abbrevs
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map(|(_, full)| full.to_string())
                .unwrap_or_else(|| word.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether the input names a time of day: "noon", "midnight", "6pm",
/// "6 pm", "15:00" or "at 3".
fn has_time_component(input: &str) -> bool {
    let lower = input.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();

    words.iter().enumerate().any(|(i, word)| {
        let previous_is_number = i > 0 && words[i - 1].chars().all(|c| c.is_ascii_digit());

        match *word {
            "noon" | "midnight" => true,
            "am" | "pm" => previous_is_number,
            "at" => words
                .get(i + 1)
                .is_some_and(|next| next.starts_with(|c: char| c.is_ascii_digit())),
            _ => {
                let meridiem = word
                    .strip_suffix("am")
                    .or_else(|| word.strip_suffix("pm"))
                    .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
                let clock = word
                    .split_once(':')
                    .is_some_and(|(h, m)| {
                        h.ends_with(|c: char| c.is_ascii_digit())
                            && m.starts_with(|c: char| c.is_ascii_digit())
                    });
                meridiem || clock
            }
        }
    })
}

/// Parse a start date, exact formats first, then natural language
/// ("tomorrow 3pm", "fri 9am", "march 20").
pub fn parse_start(input: &str) -> Result<Start> {
    let trimmed = input.trim();

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Start::At(dt));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(Start::Day(d));
    }

    let expanded = expand_abbreviations(trimmed);
    let dt = fuzzydate::parse(&expanded)
        .map_err(|_| anyhow::anyhow!("Could not parse date/time: \"{}\"", input))?;

    if has_time_component(trimmed) {
        Ok(Start::At(dt))
    } else {
        Ok(Start::Day(dt.date()))
    }
}

/// Parse an exact occurrence date. Accepts a bare date as midnight.
pub fn parse_datetime(input: &str) -> Result<NaiveDateTime> {
    let trimmed = input.trim();

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .with_context(|| format!("Invalid date/time '{}'. Expected YYYY-MM-DDTHH:MM", input))
}

/// Parse a duration such as "30m", "1h 30m" or "2hours" into whole minutes.
pub fn parse_duration_minutes(input: &str) -> Result<u32> {
    let duration = humantime::parse_duration(input)
        .with_context(|| format!("Could not parse duration: \"{}\"", input))?;
    let minutes = u32::try_from(duration.as_secs() / 60).context("Duration too large")?;

    if minutes == 0 {
        anyhow::bail!("Duration must be at least one minute");
    }
    Ok(minutes)
}

/// Parse a comma separated weekday list ("mon,wed,fri") into indices,
/// 0 = Sunday.
pub fn parse_weekdays(input: &str) -> Result<Vec<u8>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let expanded = expand_abbreviations(s);
            let weekday: Weekday = expanded
                .parse()
                .map_err(|_| anyhow::anyhow!("Unknown weekday '{}'", s))?;
            Ok(weekday_index(weekday))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn time_component_am_pm() {
        assert!(has_time_component("tomorrow 6pm"));
        assert!(has_time_component("friday 11am"));
        assert!(has_time_component("sat 3 pm"));
        assert!(has_time_component("9AM"));
    }

    #[test]
    fn time_component_colon_and_keywords() {
        assert!(has_time_component("march 20 9:30"));
        assert!(has_time_component("tomorrow noon"));
        assert!(has_time_component("friday at 15"));
        assert!(has_time_component("at 9"));
    }

    #[test]
    fn no_time_component() {
        assert!(!has_time_component("tomorrow"));
        assert!(!has_time_component("next friday"));
        assert!(!has_time_component("december"));
        assert!(!has_time_component("camp"));
        assert!(!has_time_component("look at me"));
    }

    #[test]
    fn expands_day_and_month_abbreviations() {
        assert_eq!(expand_abbreviations("Sat 3pm"), "saturday 3pm");
        assert_eq!(expand_abbreviations("sept 5"), "september 5");
        assert_eq!(expand_abbreviations("next friday"), "next friday");
    }

    #[test]
    fn exact_formats_win_over_natural_language() {
        let start = parse_start("2024-03-20T15:30").unwrap();
        assert_eq!(
            start,
            Start::At(
                NaiveDate::from_ymd_opt(2024, 3, 20)
                    .unwrap()
                    .and_hms_opt(15, 30, 0)
                    .unwrap()
            )
        );
        assert_eq!(
            parse_start("2024-03-20").unwrap(),
            Start::Day(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap())
        );
    }

    #[test]
    fn natural_language_start() {
        assert!(matches!(parse_start("tomorrow 3pm").unwrap(), Start::At(_)));

        let Start::Day(d) = parse_start("march 20").unwrap() else {
            panic!("expected a date without time");
        };
        assert_eq!((d.month(), d.day()), (3, 20));

        assert!(parse_start("not a date at all xyz").is_err());
    }

    #[test]
    fn bare_date_is_midnight() {
        let dt = parse_datetime("2024-01-03").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (0, 0));
        assert!(parse_datetime("tomorrow").is_err());
    }

    #[test]
    fn durations_in_minutes() {
        assert_eq!(parse_duration_minutes("45m").unwrap(), 45);
        assert_eq!(parse_duration_minutes("1h 30m").unwrap(), 90);
        assert_eq!(parse_duration_minutes("2hours").unwrap(), 120);
        assert!(parse_duration_minutes("30s").is_err());
        assert!(parse_duration_minutes("soon").is_err());
    }

    #[test]
    fn weekday_lists() {
        assert_eq!(parse_weekdays("mon, wed,fri").unwrap(), vec![1, 3, 5]);
        assert_eq!(parse_weekdays("Sunday,sat").unwrap(), vec![0, 6]);
        assert!(parse_weekdays("mon,funday").is_err());
    }
}
