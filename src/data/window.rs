//! Trailing-window view over one daily counter (default: new cases, 31 days).

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::data::dataset::Dataset;
use crate::data::error::IngestError;

pub const DEFAULT_WINDOW_DAYS: u32 = 31;
pub const DEFAULT_COUNTER_COLUMN: &str = "prirustkovy_pocet_nakazenych";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CounterPoint {
    pub date: NaiveDate,
    /// `None` for empty or non-numeric cells.
    pub value: Option<f64>,
}

/// Rows dated in `[today - n_days, today]`, projected to the date column and `column`.
pub fn last_n_days(
    dataset: &Dataset,
    today: NaiveDate,
    n_days: u32,
    column: &str,
) -> Result<Dataset, IngestError> {
    let start = today
        .checked_sub_days(Days::new(u64::from(n_days)))
        .unwrap_or(NaiveDate::MIN);
    let date_column = dataset.date_column().to_string();
    dataset
        .filter_dates(|date| start <= date && date <= today)
        .select(&[date_column.as_str(), column])
}

/// Numeric series of the counter column of a [`last_n_days`] view.
pub fn counter_series(view: &Dataset, column: &str) -> Result<Vec<CounterPoint>, IngestError> {
    let index = view
        .column_index(column)
        .ok_or_else(|| IngestError::MissingColumn {
            column: column.to_string(),
            context: "window".to_string(),
        })?;
    Ok(view
        .records()
        .iter()
        .map(|record| CounterPoint {
            date: record.date,
            value: record
                .fields
                .get(index)
                .and_then(|cell| cell.trim().parse::<f64>().ok()),
        })
        .collect())
}
