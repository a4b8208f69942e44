pub mod dataset;
pub mod error;
pub mod fetch;
pub mod store;
pub mod window;

pub use dataset::{parse_date, DateRange, Dataset, Record, DATE_COLUMN, DATE_FORMAT};
pub use error::IngestError;
pub use fetch::{
    fetch, source_from_url, DataSource, FileSource, HttpSource, StaticSource, DEFAULT_SOURCE_URL,
};
pub use store::{
    append_store, default_history_start, ensure_up_to_date, full_load, load_store, write_store,
    UpdateOutcome, UpdateReport, DEFAULT_STORE_PATH,
};
pub use window::{counter_series, last_n_days, CounterPoint, DEFAULT_COUNTER_COLUMN, DEFAULT_WINDOW_DAYS};
