//! Daily statistics table: header row, date column and text cells.
//!
//! Only the `datum` column is interpreted; every other cell is carried through
//! unchanged so a stored row reads back exactly as it was fetched.

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::data::error::IngestError;

pub const DATE_COLUMN: &str = "datum";
/// Format every date cell is normalized to.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Half-open date interval `(after, through]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub after: NaiveDate,
    pub through: NaiveDate,
}

impl DateRange {
    pub fn new(after: NaiveDate, through: NaiveDate) -> Self {
        Self { after, through }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.after < date && date <= self.through
    }

    pub fn is_empty(&self) -> bool {
        self.after >= self.through
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}]", self.after, self.through)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub date: NaiveDate,
    /// All cells of the row in header order, date cell included.
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    headers: Vec<String>,
    date_index: usize,
    records: Vec<Record>,
}

/// Parse a date cell. Accepts plain dates and the midnight timestamps some
/// exports write (`2021-01-01 00:00:00`).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Some(date);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|datetime| datetime.date())
}

impl Dataset {
    /// Empty dataset with the given header. Fails when `date_column` is absent.
    pub fn new(headers: Vec<String>, date_column: &str) -> Result<Self, IngestError> {
        let date_index = headers
            .iter()
            .position(|header| header == date_column)
            .ok_or_else(|| IngestError::MissingColumn {
                column: date_column.to_string(),
                context: "header".to_string(),
            })?;
        Ok(Self {
            headers,
            date_index,
            records: Vec::new(),
        })
    }

    /// Read a headed CSV table. `context` names the input in error messages.
    pub fn from_csv_reader<R: Read>(input: R, context: &str) -> Result<Self, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(input);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| IngestError::parse(context, e))?
            .iter()
            .map(|header| header.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut dataset = Self::new(headers, DATE_COLUMN).map_err(|_| IngestError::MissingColumn {
            column: DATE_COLUMN.to_string(),
            context: context.to_string(),
        })?;
        let date_index = dataset.date_index;

        for result in reader.records() {
            let row = result.map_err(|e| IngestError::parse(context, e))?;
            let raw_date = row.get(date_index).unwrap_or("");
            let Some(date) = parse_date(raw_date) else {
                let line = row.position().map(|p| p.line()).unwrap_or(0);
                return Err(IngestError::parse(
                    format!("{context} line {line}"),
                    format!("invalid date '{raw_date}'"),
                ));
            };
            let mut fields: Vec<String> = row.iter().map(str::to_string).collect();
            fields[date_index] = date.format(DATE_FORMAT).to_string();
            dataset.records.push(Record { date, fields });
        }

        Ok(dataset)
    }

    pub fn from_csv_str(text: &str, context: &str) -> Result<Self, IngestError> {
        Self::from_csv_reader(text.as_bytes(), context)
    }

    /// Write the table as CSV with `\n` line endings.
    pub fn write_csv<W: Write>(&self, output: W, include_headers: bool) -> Result<(), csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(output);
        if include_headers {
            writer.write_record(&self.headers)?;
        }
        for record in &self.records {
            writer.write_record(&record.fields)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn date_column(&self) -> &str {
        &self.headers[self.date_index]
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == column)
    }

    pub fn value<'a>(&self, record: &'a Record, column: &str) -> Option<&'a str> {
        let index = self.column_index(column)?;
        record.fields.get(index).map(String::as_str)
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|record| record.date).max()
    }

    pub fn filter_dates(&self, keep: impl Fn(NaiveDate) -> bool) -> Dataset {
        Dataset {
            headers: self.headers.clone(),
            date_index: self.date_index,
            records: self
                .records
                .iter()
                .filter(|record| keep(record.date))
                .cloned()
                .collect(),
        }
    }

    pub fn filter_range(&self, range: &DateRange) -> Dataset {
        self.filter_dates(|date| range.contains(date))
    }

    /// Project onto `columns`, which must include the date column.
    pub fn select(&self, columns: &[&str]) -> Result<Dataset, IngestError> {
        let indices = columns
            .iter()
            .map(|column| {
                self.column_index(column)
                    .ok_or_else(|| IngestError::MissingColumn {
                        column: column.to_string(),
                        context: "dataset".to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let date_index = indices
            .iter()
            .position(|&index| index == self.date_index)
            .ok_or_else(|| IngestError::MissingColumn {
                column: self.date_column().to_string(),
                context: "selection".to_string(),
            })?;

        Ok(Dataset {
            headers: indices.iter().map(|&i| self.headers[i].clone()).collect(),
            date_index,
            records: self
                .records
                .iter()
                .map(|record| Record {
                    date: record.date,
                    fields: indices.iter().map(|&i| record.fields[i].clone()).collect(),
                })
                .collect(),
        })
    }

    /// Insert or replace rows keyed by date, then keep the table sorted by date.
    /// Later rows win when `incoming` repeats a date.
    pub fn upsert(&mut self, incoming: impl IntoIterator<Item = Record>) {
        let mut positions: HashMap<NaiveDate, usize> = self
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| (record.date, index))
            .collect();

        for record in incoming {
            match positions.get(&record.date) {
                Some(&index) => self.records[index] = record,
                None => {
                    positions.insert(record.date, self.records.len());
                    self.records.push(record);
                }
            }
        }

        self.records.sort_by_key(|record| record.date);
    }

    /// Same table with at most one row per date.
    pub fn dedup_by_date(self) -> Dataset {
        let mut deduped = Dataset {
            headers: self.headers,
            date_index: self.date_index,
            records: Vec::with_capacity(self.records.len()),
        };
        deduped.upsert(self.records);
        deduped
    }
}
