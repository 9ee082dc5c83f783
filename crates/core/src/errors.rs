//! Error types for the realmgen core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Realm(#[from] RealmError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Identity mapping errors
// ---------------------------------------------------------------------------

/// Errors from mapping a single employee record to an identity user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MapError {
    /// A field the mapper cannot do without is absent.
    #[error("record {} is missing required field '{field}'", record_label(.record))]
    MissingRequiredField {
        /// The record's `id`, when the record has one.
        record: Option<String>,
        /// Dotted path of the missing field, e.g. `name.first`.
        field: String,
    },
}

impl MapError {
    /// Dotted path of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingRequiredField { field, .. } => field,
        }
    }
}

fn record_label(record: &Option<String>) -> String {
    match record {
        Some(id) => format!("'{}'", id),
        None => "<without id>".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Realm assembly errors
// ---------------------------------------------------------------------------

/// Errors from assembling the realm descriptor.
#[derive(Debug, Error)]
pub enum RealmError {
    /// A record could not be mapped and the failure policy is `abort`.
    #[error("employee record #{index} rejected: {source}")]
    InvalidRecord {
        /// 1-based position in the input.
        index: usize,
        #[source]
        source: MapError,
    },

    /// Two users derived the same username (opt-in post-check).
    #[error("duplicate username '{username}' derived for records #{first_index} and #{second_index}")]
    DuplicateUsername {
        username: String,
        first_index: usize,
        second_index: usize,
    },

    /// A user derived an empty username (opt-in post-check).
    #[error("record #{index} derived an empty username")]
    EmptyUsername { index: usize },
}

// ---------------------------------------------------------------------------
// Loader errors
// ---------------------------------------------------------------------------

/// Errors from discovering and parsing employee record sources.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The configured records directory does not exist.
    #[error("employee directory not found: {0}")]
    DirectoryNotFound(String),

    /// A source document could not be parsed into an employee record.
    #[error("malformed employee source '{origin}' (document {document}): {detail}")]
    MalformedSource {
        origin: String,
        document: usize,
        detail: String,
    },

    /// Generic I/O error while reading a source.
    #[error("employee source I/O error at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
