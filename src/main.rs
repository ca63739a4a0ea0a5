mod commands;
mod config;
mod dates;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use calgrid_core::MoveScope;
use calgrid_core::date_range::DateRange;
use calgrid_core::grid::View;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::new::NewEventArgs;
use crate::config::CalgridConfig;

#[derive(Parser)]
#[command(name = "calgrid")]
#[command(about = "Expand recurring events and lay them out on a calendar grid")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List occurrences in a date range
    Expand {
        /// First day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        from: Option<String>,

        /// Last day (YYYY-MM-DD), defaults to 30 days after --from
        #[arg(long)]
        to: Option<String>,

        /// Event file, defaults to events_file from the config
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print occurrences as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a month, week or day grid
    Grid {
        /// month, week or day
        view: View,

        /// Any date in the period to show (e.g. "2024-03-20", "next friday")
        #[arg(short, long)]
        date: Option<String>,

        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Move one occurrence, or the whole series with --series
    Move {
        event_id: String,

        /// Start of the occurrence to move (e.g. "2024-01-03T09:00")
        #[arg(long)]
        occurrence: String,

        /// New start. A date without a time keeps the time of day
        #[arg(long)]
        to: String,

        /// Move every occurrence by the same amount
        #[arg(long)]
        series: bool,

        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Normalize a new event and print it as TOML
    New {
        title: String,

        /// Start date/time (e.g. "2025-03-20T15:00", "tomorrow 3pm")
        #[arg(short, long)]
        start: String,

        /// Duration (e.g. "30m", "1h 30m"), defaults to 1 hour
        #[arg(short, long)]
        duration: Option<String>,

        #[arg(long)]
        all_day: bool,

        /// never, daily, weekly, monthly or yearly
        #[arg(short, long)]
        repeat: Option<String>,

        /// Repeat every N days/weeks/months/years
        #[arg(long)]
        every: Option<u32>,

        /// Weekdays for weekly repeats (e.g. "mon,wed,fri")
        #[arg(long)]
        on: Option<String>,

        /// Last day of the series
        #[arg(long, conflicts_with = "count")]
        until: Option<String>,

        /// Number of occurrences
        #[arg(long)]
        count: Option<u32>,

        #[arg(short, long)]
        category: Option<String>,

        /// Minutes before the event (0, 5, 15, 30, 60 or 1440)
        #[arg(long)]
        reminder: Option<u32>,

        /// Share with these email addresses
        #[arg(long = "share")]
        share_with: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CalgridConfig::load()?;

    init_logging(cli.verbose, &config.log_level);
    tracing::debug!(config = ?config, "Configuration loaded");

    let today = chrono::Local::now().date_naive();
    let events_file = |file: Option<PathBuf>| file.unwrap_or_else(|| config.events_path());

    match cli.command {
        Commands::Expand {
            from,
            to,
            file,
            json,
        } => {
            let range = DateRange::from_args(from.as_deref(), to.as_deref(), today)?;
            commands::expand::run(&events_file(file), range, json, today)
        }
        Commands::Grid { view, date, file } => {
            let date = match date {
                Some(input) => dates::parse_start(&input)?.datetime().date(),
                None => today,
            };
            commands::grid::run(
                &events_file(file),
                view,
                date,
                config.week_start.weekday(),
                today,
            )
        }
        Commands::Move {
            event_id,
            occurrence,
            to,
            series,
            file,
        } => {
            let scope = if series {
                MoveScope::Series
            } else {
                MoveScope::Occurrence
            };
            let command = commands::move_event::command_for(
                event_id,
                dates::parse_datetime(&occurrence)?,
                dates::parse_start(&to)?,
                scope,
            );
            commands::move_event::run(&events_file(file), command)
        }
        Commands::New {
            title,
            start,
            duration,
            all_day,
            repeat,
            every,
            on,
            until,
            count,
            category,
            reminder,
            share_with,
        } => commands::new::run(NewEventArgs {
            title,
            start,
            duration,
            all_day,
            repeat,
            every,
            on,
            until,
            count,
            category,
            reminder,
            share_with,
        }),
    }
}

/// `--verbose` wins, then RUST_LOG, then `log_level` from the config.
fn init_logging(verbose: bool, config_level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(config_level))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
