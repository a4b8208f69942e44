use std::fmt;
use std::io;

#[derive(Debug)]
pub enum IngestError {
    /// The source could not be reached or its body could not be read.
    Fetch { source: String, reason: String },
    /// The source answered with a non-success HTTP status.
    Status { source: String, status: u16 },
    /// Malformed CSV payload or an unparseable date cell.
    Parse { context: String, reason: String },
    MissingColumn { column: String, context: String },
    /// Fetched rows do not share the header of the persisted store.
    HeaderMismatch {
        stored: Vec<String>,
        fetched: Vec<String>,
    },
    Io { path: String, error: io::Error },
}

impl IngestError {
    pub fn io(path: impl Into<String>, error: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }

    pub fn parse(context: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch { source, reason } => write!(f, "failed to fetch {source}: {reason}"),
            Self::Status { source, status } => {
                write!(f, "unexpected HTTP status {status} from {source}")
            }
            Self::Parse { context, reason } => write!(f, "failed to parse {context}: {reason}"),
            Self::MissingColumn { column, context } => {
                write!(f, "column '{column}' not found in {context}")
            }
            Self::HeaderMismatch { stored, fetched } => write!(
                f,
                "fetched header [{}] does not match stored header [{}]",
                fetched.join(","),
                stored.join(",")
            ),
            Self::Io { path, error } => write!(f, "i/o error on '{path}': {error}"),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IngestError;

    #[test]
    fn display_names_the_failing_column_and_context() {
        let err = IngestError::MissingColumn {
            column: "datum".to_string(),
            context: "remote payload".to_string(),
        };
        assert_eq!(err.to_string(), "column 'datum' not found in remote payload");
    }

    #[test]
    fn io_error_exposes_its_source() {
        use std::error::Error;
        let err = IngestError::io(
            "data/data.csv",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.source().is_some());
        assert!(err.to_string().contains("data/data.csv"));
    }
}
