// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error taxonomy shared by every catalog operation.

use std::fmt;

/// Result alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Failures raised while loading, exporting or marshalling a catalog.
///
/// Validator findings are not errors; they travel inside the check report.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Opening, reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text or binary grammar violation.
    #[error("format error{}: {message}", LineSuffix(.line))]
    Format {
        line: Option<usize>,
        message: String,
    },

    /// The same composite key appeared twice in one source.
    #[error("duplicate token{}: {key}", LineSuffix(.line))]
    DuplicateKey { key: String, line: Option<usize> },

    /// Checksum mismatch in strict mode, or a binary bounds violation.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Operation not possible in the engine's current state.
    #[error("state error: {0}")]
    State(String),

    /// A result is too large to hand across the buffer boundary.
    #[error("RESULT_TOO_LARGE: {len} bytes")]
    Oversize { len: usize },
}

impl CatalogError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format {
            line: None,
            message: message.into(),
        }
    }

    pub(crate) fn format_at(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line: Some(line),
            message: message.into(),
        }
    }

    pub(crate) fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }
}

struct LineSuffix<'a>(&'a Option<usize>);

impl fmt::Display for LineSuffix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(line) => write!(f, " in line {}", line),
            None => Ok(()),
        }
    }
}
