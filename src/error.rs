//! Unified catalog error model and mapping helpers.
//! Every provider and the eager registry report failures through `CatalogError`;
//! the lazy catalog only ever inspects `TableNotFound` and passes the rest through.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogError {
    #[error("table_not_found: table '{name}' does not exist")]
    TableNotFound { name: String },
    #[error("table_already_exists: table '{name}' already exists")]
    TableAlreadyExists { name: String },
    #[error("invalid_identifier: '{name}' {reason}")]
    InvalidIdentifier { name: String, reason: String },
    #[error("io: {message}")]
    Io { message: String },
    #[error("internal: {message}")]
    Internal { message: String },
}

impl CatalogError {
    pub fn code_str(&self) -> &'static str {
        match self {
            CatalogError::TableNotFound { .. } => "table_not_found",
            CatalogError::TableAlreadyExists { .. } => "table_already_exists",
            CatalogError::InvalidIdentifier { .. } => "invalid_identifier",
            CatalogError::Io { .. } => "io",
            CatalogError::Internal { .. } => "internal",
        }
    }

    /// Human readable detail without the code prefix.
    pub fn message(&self) -> String {
        match self {
            CatalogError::TableNotFound { name } => format!("table '{}' does not exist", name),
            CatalogError::TableAlreadyExists { name } => format!("table '{}' already exists", name),
            CatalogError::InvalidIdentifier { name, reason } => format!("'{}' {}", name, reason),
            CatalogError::Io { message } | CatalogError::Internal { message } => message.clone(),
        }
    }

    pub fn not_found<S: Into<String>>(name: S) -> Self { CatalogError::TableNotFound { name: name.into() } }
    pub fn already_exists<S: Into<String>>(name: S) -> Self { CatalogError::TableAlreadyExists { name: name.into() } }
    pub fn invalid_identifier<S: Into<String>>(name: S, reason: S) -> Self { CatalogError::InvalidIdentifier { name: name.into(), reason: reason.into() } }
    pub fn io<S: Into<String>>(msg: S) -> Self { CatalogError::Io { message: msg.into() } }
    pub fn internal<S: Into<String>>(msg: S) -> Self { CatalogError::Internal { message: msg.into() } }

    pub fn is_not_found(&self) -> bool { matches!(self, CatalogError::TableNotFound { .. }) }

    /// SQLSTATE a migration runner should surface for this error.
    pub fn sqlstate(&self) -> &'static str {
        match self {
            CatalogError::TableNotFound { .. } => "42P01",      // undefined_table
            CatalogError::TableAlreadyExists { .. } => "42P07", // duplicate_table
            CatalogError::InvalidIdentifier { .. } => "42602",  // invalid_name
            CatalogError::Io { .. } => "08006",                 // connection_failure
            CatalogError::Internal { .. } => "XX000",           // internal_error
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io { message: err.to_string() }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Internal { message: format!("invalid metadata payload: {}", err) }
    }
}

impl From<tokio_postgres::Error> for CatalogError {
    fn from(err: tokio_postgres::Error) -> Self {
        // Server-side errors still arrive on a live connection; everything else is transport.
        match err.as_db_error() {
            Some(db) => CatalogError::Internal { message: format!("{}: {}", db.code().code(), db.message()) },
            None => CatalogError::Io { message: err.to_string() },
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
