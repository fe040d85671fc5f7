//! Error types for the flow editing library.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{FlowStatus, StepId};

/// Comprehensive error type for all flow operations.
#[derive(Error, Debug)]
pub enum FlowError {
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Flow not found for the given ID
    #[error("Flow with ID {id} not found")]
    FlowNotFound { id: u64 },
    /// Step not found in the edited flow
    #[error("Step with ID {id} not found")]
    StepNotFound { id: StepId },
    /// Template identifier unknown to the catalog
    #[error("Template '{id}' not found in catalog")]
    TemplateNotFound { id: String },
    /// An editing call was made before any flow was loaded
    #[error("No flow is selected for editing")]
    NoFlowSelected,
    /// A mutating call targeted a flow that is no longer a draft
    #[error("Flow {flow_id} is {status} and cannot be modified")]
    Conflict { flow_id: u64, status: FlowStatus },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Blocking task or background worker failures
    #[error("Task error: {message}")]
    Task { message: String },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Coarse classification used by callers deciding how to react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was structurally invalid and never reached the store.
    Validation,
    /// The target flow is no longer a draft; a new draft must be branched.
    Conflict,
    /// Store or runtime failure; retrying later may succeed.
    Transient,
    /// Misconfiguration of paths or settings.
    Configuration,
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> FlowError {
        FlowError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> FlowError {
        FlowError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl FlowError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Wraps a `spawn_blocking` join failure.
    pub fn join(err: tokio::task::JoinError) -> Self {
        FlowError::Task {
            message: format!("Task join error: {err}"),
        }
    }

    /// Classifies the error for retry and notification decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::FlowNotFound { .. }
            | FlowError::StepNotFound { .. }
            | FlowError::TemplateNotFound { .. }
            | FlowError::NoFlowSelected
            | FlowError::InvalidInput { .. } => ErrorKind::Validation,
            FlowError::Conflict { .. } => ErrorKind::Conflict,
            FlowError::Database { .. }
            | FlowError::FileSystem { .. }
            | FlowError::Serialization { .. }
            | FlowError::Task { .. } => ErrorKind::Transient,
            FlowError::XdgDirectory(_) | FlowError::Configuration { .. } => {
                ErrorKind::Configuration
            }
        }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| FlowError::database(message).with_source(e))
    }
}

/// Result type alias for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
