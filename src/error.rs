use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort an index rebuild
#[derive(Debug, Error)]
pub enum Error {
    /// Listing, fetching or uploading an object failed
    #[error("{operation} {key}: {message}")]
    Storage {
        operation: &'static str,
        key: String,
        message: String,
    },

    /// The object is not a readable gzip-compressed tar archive
    #[error("reading archive {key}: {source}")]
    Archive {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Chart.yaml could not be parsed
    #[error("parsing Chart.yaml from {key}: {source}")]
    Manifest {
        key: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The object carries no `chart-digest` metadata
    #[error("no chart-digest found in the metadata of {key}")]
    DigestNotFound { key: String },

    /// Nothing under the prefix produced an index entry
    #[error("no chart archives found under s3://{bucket}/{prefix}")]
    NoCharts { bucket: String, prefix: String },

    #[error("encoding index.yaml: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("writing {}: {source}", .path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn storage(operation: &'static str, key: impl Into<String>, message: impl ToString) -> Self {
        Self::Storage {
            operation,
            key: key.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
