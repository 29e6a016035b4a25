//! Shared error types for scoring operations.
//!
//! The scoring core raises very few errors. An unmatched vehicle is never an
//! error (the matcher falls back to the default cohort) and a rejected
//! stressor is recorded in the result for audit instead of being thrown.
//! What remains is:
//!
//! - `CatalogUnavailable`: no catalog snapshot has been published. Fatal for
//!   every scoring call and always surfaced to the caller.
//! - `InvalidVehicleContext`: the identifying fields of one vehicle are absent
//!   or malformed. Aborts that vehicle only; batches record it and continue.
//! - catalog load/parse/validation, configuration and I/O failures raised at
//!   the load boundary, before any scoring happens.
//!
//! Each variant maps to an [`ErrorKind`] carrying a stable code, which batch
//! failure records use for programmatic handling.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for stressmap operations
#[derive(Debug, Error)]
pub enum Error {
    /// No catalog snapshot is available to score against
    #[error("Cohort catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// The catalog parsed but violates cohort invariants
    #[error("Cohort catalog failed validation with {} issue(s): {}", .issues.len(), .issues.join("; "))]
    CatalogValidation { issues: Vec<String> },

    /// The catalog document could not be read as a catalog
    #[error("Failed to parse cohort catalog{}: {message}", .path.as_ref().map(|p| format!(" {}", p.display())).unwrap_or_default())]
    CatalogParse {
        message: String,
        path: Option<PathBuf>,
    },

    /// Identifying fields of a vehicle are absent or malformed
    #[error("Invalid vehicle context for '{vehicle_id}': {reason}")]
    InvalidVehicleContext { vehicle_id: String, reason: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic errors with context
    #[error("{context}: {message}")]
    WithContext {
        context: String,
        message: String,
        kind: ErrorKind,
    },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create an invalid vehicle context error
    pub fn invalid_context(vehicle_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVehicleContext {
            vehicle_id: vehicle_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a catalog parse error with an optional source path
    pub fn catalog_parse(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::CatalogParse {
            message: message.into(),
            path,
        }
    }

    /// Add context to an error, keeping its kind
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    /// Classify the error for batch failure records and exit handling
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CatalogUnavailable(_) => ErrorKind::CatalogUnavailable,
            Self::CatalogValidation { .. } => ErrorKind::CatalogValidation,
            Self::CatalogParse { .. } => ErrorKind::CatalogParse,
            Self::InvalidVehicleContext { .. } => ErrorKind::InvalidVehicleContext,
            Self::Configuration(_) | Self::Toml(_) => ErrorKind::Configuration,
            Self::WithContext { kind, .. } => *kind,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) => ErrorKind::Serialization,
        }
    }

    /// Vehicle an `InvalidVehicleContext` error refers to
    pub fn vehicle_id(&self) -> Option<&str> {
        match self {
            Self::InvalidVehicleContext { vehicle_id, .. } => Some(vehicle_id),
            _ => None,
        }
    }

    /// Whether this error must abort a whole batch rather than one vehicle
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::InvalidVehicleContext)
    }
}

/// Error classification with a stable code.
///
/// Codes are grouped by category:
/// - E001-E009: catalog errors
/// - E010-E019: vehicle context errors
/// - E020-E029: configuration errors
/// - E030-E039: I/O and serialization errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CatalogUnavailable,
    CatalogValidation,
    CatalogParse,
    InvalidVehicleContext,
    Configuration,
    Io,
    Serialization,
}

impl ErrorKind {
    /// Get the error code string.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::CatalogUnavailable => "E001",
            Self::CatalogValidation => "E002",
            Self::CatalogParse => "E003",
            Self::InvalidVehicleContext => "E010",
            Self::Configuration => "E020",
            Self::Io => "E030",
            Self::Serialization => "E031",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CatalogUnavailable => "catalog unavailable",
            Self::CatalogValidation => "catalog validation",
            Self::CatalogParse => "catalog parse",
            Self::InvalidVehicleContext => "invalid vehicle context",
            Self::Configuration => "configuration",
            Self::Io => "io",
            Self::Serialization => "serialization",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}
