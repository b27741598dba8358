// WAM Input - Space weather driver preparation
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for WAM input preparation
//!
//! Source errors never leave an adapter: they are logged and turned into
//! absent readings. Store errors abort an output cycle. Config errors are
//! fatal before the driver loop starts.

use thiserror::Error;

/// Result type alias for WAM input operations
pub type Result<T> = std::result::Result<T, WamError>;

/// Main error type
#[derive(Error, Debug)]
pub enum WamError {
    /// Invalid control surface or configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Unreadable source record
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Output store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors in the control surface, detected before the loop starts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Timestamp does not match the expected format
    #[error("Invalid timestamp '{value}': expected format {format}")]
    InvalidTimestamp { value: String, format: &'static str },

    /// Start is not before end
    #[error("Start {start} must be before end {end}")]
    StartNotBeforeEnd { start: String, end: String },

    /// Segment duration of zero minutes
    #[error("Segment duration must be at least one minute")]
    EmptySegment,

    /// A value outside its allowed range
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    /// Relaxation rules reference each other in a loop
    #[error("Relaxation dependency cycle involving {0}")]
    DependencyCycle(String),

    /// Config file could not be read or parsed
    #[error("Cannot load config file {path}: {reason}")]
    File { path: String, reason: String },
}

/// Errors while reading a single source file or record
#[derive(Error, Debug)]
pub enum SourceError {
    /// File could not be opened or read
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// XML document is not well formed
    #[error("XML error in {path}: {reason}")]
    Xml { path: String, reason: String },

    /// Required element or column missing
    #[error("Missing {what} in {path}")]
    Missing { what: String, path: String },

    /// Value could not be parsed as a number or timestamp
    #[error("Malformed value '{value}' in {path}")]
    Malformed { value: String, path: String },
}

/// Errors while committing output records
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying IO failure
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Records would leave a hole in the store
    #[error("Non-contiguous write: store holds {len} rows, first new row is at {index}")]
    NonContiguous { len: usize, index: usize },

    /// Records start before the first stored row
    #[error("Records start before the store origin {origin}")]
    BeforeOrigin { origin: String },

    /// Existing store content cannot be interpreted
    #[error("Corrupt store {path}: {reason}")]
    Corrupt { path: String, reason: String },

    /// netCDF library failure
    #[cfg(feature = "netcdf")]
    #[error("netCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl SourceError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
