use std::{io, path::PathBuf};
use thiserror::Error;

use crate::metadata::MetadataError;

/// Why a single file could not be sorted.
///
/// Every variant except [`SortError::Aborted`] is recoverable: the batch walk
/// logs it and moves on to the next file.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("extension of {0:?} is not a supported media extension")]
    UnsupportedExtension(PathBuf),

    #[error("filename '{0}' could not be split into sufficient parts to be parsed")]
    InsufficientTokens(String),

    #[error("no season or episode marker found in '{0}'")]
    NoMarkerFound(String),

    #[error("metadata lookup for '{query}' failed: {source}")]
    MetadataLookupFailed {
        query: String,
        #[source]
        source: MetadataError,
    },

    #[error("no metadata candidate matched '{0}'")]
    NoCandidateMatch(String),

    #[error("destination {0:?} already exists")]
    DestinationExists(PathBuf),

    #[error("sorting of {0:?} declined")]
    Declined(PathBuf),

    #[error("sorting aborted by user")]
    Aborted,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl SortError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        SortError::Io {
            context: context.into(),
            source,
        }
    }

    /// Skips are expected outcomes (wrong file type, already sorted, declined),
    /// everything else counts as a failure in the batch report.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            SortError::UnsupportedExtension(_)
                | SortError::DestinationExists(_)
                | SortError::Declined(_)
        )
    }
}

pub type SortResult<T> = std::result::Result<T, SortError>;
