// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use thiserror::Error;

/// Errors surfaced by the synchronization and query layer.
///
/// "App not found" during provisioning and malformed query results are not
/// errors: the former triggers app creation, the latter maps to an empty result.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Terminal misconfiguration: the remote service refused provisioning,
    /// required settings are missing, or the key column is not in the table.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote service answered but rejected the request.
    #[error("Remote service rejected request (code {code}): {message}")]
    Remote { code: i64, message: String },

    /// Network or timeout failure talking to the remote service. Never retried.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The relational source failed.
    #[error("Source error: {0}")]
    Source(String),

    /// A table or column name that cannot be safely interpolated into SQL.
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        SyncError::Source(e.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::Transport(e.to_string())
    }
}
