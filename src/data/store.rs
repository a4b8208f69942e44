//! Persisted CSV store and the daily update cycle.
//!
//! A store is created by a full load (header + rows) and afterwards only grows
//! by appending rows newer than its latest date. The update decision:
//!
//! * no store, or a store without rows: full load of `(history_start, today]`
//! * latest stored date before today: fetch `(latest, today]` and append
//! * otherwise: nothing to do, the source is not contacted

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::dataset::{DateRange, Dataset};
use crate::data::error::IngestError;
use crate::data::fetch::{fetch, DataSource};

pub const DEFAULT_STORE_PATH: &str = "data/data.csv";

/// Exclusive lower bound of a full load; the first stored day is 2021-01-01.
pub fn default_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 12, 31).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    FullLoad { range: DateRange, rows: usize },
    Appended { range: DateRange, rows: usize },
    UpToDate { latest: NaiveDate },
}

/// Result of one update cycle. `dataset` always holds the freshest rows
/// available, whichever branch was taken.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub outcome: UpdateOutcome,
    pub dataset: Dataset,
}

impl UpdateReport {
    pub fn rows_written(&self) -> usize {
        match self.outcome {
            UpdateOutcome::FullLoad { rows, .. } | UpdateOutcome::Appended { rows, .. } => rows,
            UpdateOutcome::UpToDate { .. } => 0,
        }
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Read the store at `path`. Missing or zero-length files yield `None`.
pub fn load_store(path: &Path) -> Result<Option<Dataset>, IngestError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(IngestError::io(display(path), err)),
    };
    if text.trim().is_empty() {
        return Ok(None);
    }
    Dataset::from_csv_str(&text, &display(path)).map(Some)
}

/// Overwrite `path` with `dataset`, header included.
pub fn write_store(path: &Path, dataset: &Dataset) -> Result<(), IngestError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| IngestError::io(display(parent), e))?;
        }
    }

    let mut buffer = Vec::new();
    dataset
        .write_csv(&mut buffer, true)
        .map_err(|e| IngestError::io(display(path), e.into()))?;
    fs::write(path, buffer).map_err(|e| IngestError::io(display(path), e))
}

/// Append the rows of `dataset` to an existing store without a header.
pub fn append_store(path: &Path, dataset: &Dataset) -> Result<(), IngestError> {
    if dataset.is_empty() {
        return Ok(());
    }

    let mut buffer = Vec::new();
    dataset
        .write_csv(&mut buffer, false)
        .map_err(|e| IngestError::io(display(path), e.into()))?;

    let append = || -> io::Result<()> {
        let mut file = OpenOptions::new().read(true).append(true).open(path)?;
        if file.metadata()?.len() > 0 {
            file.seek(SeekFrom::End(-1))?;
            let mut last = [0_u8; 1];
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                file.write_all(b"\n")?;
            }
        }
        file.write_all(&buffer)?;
        file.flush()
    };
    append().map_err(|e| IngestError::io(display(path), e))
}

/// Fetch `range` and overwrite the store with it.
pub fn full_load<S: DataSource + ?Sized>(
    source: &S,
    store_path: &Path,
    range: &DateRange,
) -> Result<Dataset, IngestError> {
    let dataset = fetch(source, range)?.dedup_by_date();
    write_store(store_path, &dataset)?;
    tracing::info!(
        store = %store_path.display(),
        rows = dataset.len(),
        range = %range,
        "store written"
    );
    Ok(dataset)
}

/// Bring the store at `store_path` up to `today` and return its contents.
#[tracing::instrument(level = "info", skip(source, store_path), fields(store = %store_path.display()))]
pub fn ensure_up_to_date<S: DataSource + ?Sized>(
    source: &S,
    store_path: &Path,
    history_start: NaiveDate,
    today: NaiveDate,
) -> Result<UpdateReport, IngestError> {
    let stored = load_store(store_path)?;
    let latest = stored.as_ref().and_then(Dataset::latest_date);

    let (Some(stored), Some(latest)) = (stored, latest) else {
        tracing::info!("no stored rows, performing full load");
        let range = DateRange::new(history_start, today);
        let dataset = full_load(source, store_path, &range)?;
        return Ok(UpdateReport {
            outcome: UpdateOutcome::FullLoad {
                range,
                rows: dataset.len(),
            },
            dataset,
        });
    };

    // The file is left as written; only the returned rows are keyed by date.
    let mut stored = stored.dedup_by_date();

    if latest >= today {
        tracing::info!(latest = %latest, "no new data to be downloaded");
        return Ok(UpdateReport {
            outcome: UpdateOutcome::UpToDate { latest },
            dataset: stored,
        });
    }

    tracing::info!(latest = %latest, "updating store");
    let range = DateRange::new(latest, today);
    let delta = fetch(source, &range)?.dedup_by_date();

    if delta.is_empty() {
        tracing::info!(range = %range, "source has no rows newer than the store");
    } else if delta.headers() != stored.headers() {
        return Err(IngestError::HeaderMismatch {
            stored: stored.headers().to_vec(),
            fetched: delta.headers().to_vec(),
        });
    }

    append_store(store_path, &delta)?;
    let rows = delta.len();
    stored.upsert(delta.into_records());
    tracing::info!(rows, total = stored.len(), "store updated");

    Ok(UpdateReport {
        outcome: UpdateOutcome::Appended { range, rows },
        dataset: stored,
    })
}
