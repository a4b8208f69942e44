use std::path::Path;

use chrono::NaiveDate;

use crate::config::IngestConfig;
use crate::data::{
    counter_series, ensure_up_to_date, full_load, last_n_days, load_store, parse_date,
    source_from_url, DateRange, Dataset, IngestError, UpdateOutcome, UpdateReport,
    DEFAULT_COUNTER_COLUMN, DEFAULT_WINDOW_DAYS,
};
use crate::logging;

const USAGE: &str = "usage: covidproject [update | reload [after] [through] | recent [days] [column] [--table]]";
const RELOAD_USAGE: &str = "usage: covidproject reload [after YYYY-MM-DD] [through YYYY-MM-DD]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Update,
    Reload,
    Recent,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        None | Some("update") => Some(Command::Update),
        Some("reload") => Some(Command::Reload),
        Some("recent") => Some(Command::Recent),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let Some(command) = parse_command(args) else {
        eprintln!("{USAGE}");
        return 2;
    };

    let config = IngestConfig::from_env();
    let _guard = match logging::init(&config.log_path, &config.log_filter) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to initialize logging: {err}");
            return 1;
        }
    };

    match command {
        Command::Update => handle_update(&config),
        Command::Reload => handle_reload(args, &config),
        Command::Recent => handle_recent(args, &config),
    }
}

fn handle_update(config: &IngestConfig) -> i32 {
    let result = source_from_url(&config.source_url, config.timeout).and_then(|source| {
        ensure_up_to_date(
            &source,
            &config.store_path,
            config.history_start,
            config.today,
        )
    });

    match result {
        Ok(report) => print_report(&report, &config.store_path),
        Err(err) => fail("update", &err),
    }
}

fn handle_reload(args: &[String], config: &IngestConfig) -> i32 {
    let after = parse_date_arg(args.get(2), config.history_start);
    let through = parse_date_arg(args.get(3), config.today);
    let range = match (after, through) {
        (Some(after), Some(through)) => DateRange::new(after, through),
        _ => {
            eprintln!("{RELOAD_USAGE}");
            return 2;
        }
    };
    // An empty range would overwrite the store with a bare header.
    if range.is_empty() {
        eprintln!("reload range {range} contains no days");
        eprintln!("{RELOAD_USAGE}");
        return 2;
    }

    tracing::info!(range = %range, "reloading store");
    let result = source_from_url(&config.source_url, config.timeout)
        .and_then(|source| full_load(&source, &config.store_path, &range));

    match result {
        Ok(dataset) => {
            let report = UpdateReport {
                outcome: UpdateOutcome::FullLoad {
                    range,
                    rows: dataset.len(),
                },
                dataset,
            };
            print_report(&report, &config.store_path)
        }
        Err(err) => fail("reload", &err),
    }
}

fn handle_recent(args: &[String], config: &IngestConfig) -> i32 {
    let positional: Vec<&String> = args
        .iter()
        .skip(2)
        .filter(|arg| !arg.starts_with("--"))
        .collect();
    let as_table = args.iter().any(|arg| arg == "--table");
    let days = parse_days_arg(positional.first().copied());
    let column = positional
        .get(1)
        .map(|value| value.as_str())
        .unwrap_or(DEFAULT_COUNTER_COLUMN);

    let stored = match load_store(&config.store_path) {
        Ok(Some(dataset)) => dataset,
        Ok(None) => {
            let err = IngestError::io(
                config.store_path.display().to_string(),
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "store has no data, run update first",
                ),
            );
            return fail("recent", &err);
        }
        Err(err) => return fail("recent", &err),
    };

    let view = match last_n_days(&stored, config.today, days, column) {
        Ok(view) => view,
        Err(err) => return fail("recent", &err),
    };

    if as_table {
        print_table(&view);
        return 0;
    }

    match counter_series(&view, column) {
        Ok(series) => {
            let payload = serde_json::json!({
                "column": column,
                "days": days,
                "through": config.today,
                "points": series,
            });
            match serde_json::to_string_pretty(&payload) {
                Ok(text) => {
                    println!("{text}");
                    0
                }
                Err(err) => {
                    eprintln!("failed to serialize window: {err}");
                    1
                }
            }
        }
        Err(err) => fail("recent", &err),
    }
}

fn print_report(report: &UpdateReport, store_path: &Path) -> i32 {
    let payload = serde_json::json!({
        "store_path": store_path.display().to_string(),
        "result": report.outcome,
        "rows_written": report.rows_written(),
        "total_rows": report.dataset.len(),
        "latest_date": report.dataset.latest_date(),
    });
    match serde_json::to_string_pretty(&payload) {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize update report: {err}");
            1
        }
    }
}

fn print_table(view: &Dataset) {
    println!("{}", view.headers().join("\t"));
    for record in view.records() {
        println!("{}", record.fields.join("\t"));
    }
}

fn fail(command: &str, err: &IngestError) -> i32 {
    tracing::error!(command, error = %err, "run failed");
    eprintln!("{command} failed: {err}");
    1
}

fn parse_date_arg(raw: Option<&String>, default: NaiveDate) -> Option<NaiveDate> {
    match raw {
        Some(value) => parse_date(value),
        None => Some(default),
    }
}

/// Window length for `recent`. Missing or non-numeric input falls back to
/// the default window.
fn parse_days_arg(raw: Option<&String>) -> u32 {
    let Some(value) = raw else {
        return DEFAULT_WINDOW_DAYS;
    };
    match value.parse::<u32>() {
        Ok(days) => days,
        Err(_) => {
            tracing::warn!(value = %value, "ignoring invalid window length");
            eprintln!("window length '{value}' is not a day count, using {DEFAULT_WINDOW_DAYS}");
            DEFAULT_WINDOW_DAYS
        }
    }
}
