use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while reading the volcano CSV or the boundary document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("input file not found: {path:?}")]
    NotFound { path: PathBuf },
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV in {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("column '{column}' missing from {path:?}")]
    Schema { path: PathBuf, column: String },
    #[error("invalid boundary document {path:?}: {reason}")]
    Boundary { path: PathBuf, reason: String },
}

impl LoadError {
    pub(crate) fn from_open(path: &std::path::Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}
