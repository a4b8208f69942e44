//! Retrieval of the published statistics table.
//!
//! The remote endpoint always returns the full history; range filtering
//! happens locally after parsing.

use std::fs;
use std::time::Duration;

use crate::data::dataset::{DateRange, Dataset};
use crate::data::error::IngestError;

pub const DEFAULT_SOURCE_URL: &str =
    "https://onemocneni-aktualne.mzcr.cz/api/v2/covid-19/nakazeni-vyleceni-umrti-testy.csv";

const USER_AGENT: &str = concat!("covidproject/", env!("CARGO_PKG_VERSION"));
const FILE_SCHEME: &str = "file://";

/// Anything that can hand back the raw CSV text of the dataset.
pub trait DataSource {
    /// Human-readable location for logs and errors.
    fn describe(&self) -> String;

    fn fetch_text(&self) -> Result<String, IngestError>;
}

impl<S: DataSource + ?Sized> DataSource for Box<S> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn fetch_text(&self) -> Result<String, IngestError> {
        (**self).fetch_text()
    }
}

/// Blocking HTTP GET with a request timeout.
pub struct HttpSource {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, IngestError> {
        let url = url.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| IngestError::Fetch {
                source: url.clone(),
                reason: format!("failed to build http client: {e}"),
            })?;
        Ok(Self { url, client })
    }
}

impl DataSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch_text(&self) -> Result<String, IngestError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| IngestError::Fetch {
                source: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Status {
                source: self.url.clone(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(|e| IngestError::Fetch {
            source: self.url.clone(),
            reason: format!("failed to read response body: {e}"),
        })
    }
}

/// Local CSV file, addressed with a `file://` URL for offline replay.
pub struct FileSource {
    path: String,
}

impl FileSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for FileSource {
    fn describe(&self) -> String {
        format!("{FILE_SCHEME}{}", self.path)
    }

    fn fetch_text(&self) -> Result<String, IngestError> {
        fs::read_to_string(&self.path).map_err(|e| IngestError::Fetch {
            source: self.describe(),
            reason: e.to_string(),
        })
    }
}

/// In-memory CSV text.
pub struct StaticSource {
    text: String,
}

impl StaticSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl DataSource for StaticSource {
    fn describe(&self) -> String {
        "static dataset".to_string()
    }

    fn fetch_text(&self) -> Result<String, IngestError> {
        Ok(self.text.clone())
    }
}

/// Pick a source implementation for `url`: `file://` paths read from disk,
/// everything else goes over HTTP.
pub fn source_from_url(url: &str, timeout: Duration) -> Result<Box<dyn DataSource>, IngestError> {
    match url.strip_prefix(FILE_SCHEME) {
        Some(path) => Ok(Box::new(FileSource::new(path))),
        None => Ok(Box::new(HttpSource::new(url, timeout)?)),
    }
}

/// Download the whole table from `source` and keep rows dated in `range`.
pub fn fetch<S: DataSource + ?Sized>(source: &S, range: &DateRange) -> Result<Dataset, IngestError> {
    let location = source.describe();
    tracing::debug!(source = %location, range = %range, "fetching dataset");

    let text = source.fetch_text()?;
    let full = Dataset::from_csv_str(&text, &location)?;
    let filtered = full.filter_range(range);

    tracing::info!(
        source = %location,
        fetched = full.len(),
        kept = filtered.len(),
        range = %range,
        "dataset fetched"
    );
    Ok(filtered)
}
