use std::fmt;

use thiserror::Error;

use crate::engine::Role;

/// The remote operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Sync,
    Update,
    BulkSync,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Load => "load",
            Operation::Sync => "sync",
            Operation::Update => "update",
            Operation::BulkSync => "bulk sync",
        };
        f.write_str(s)
    }
}

/// All errors that can occur in vaultsync.
#[derive(Debug, Error)]
pub enum VaultSyncError {
    // --- Engine errors ---
    #[error("No {0} vault selected")]
    MissingSelection(Role),

    #[error("Refusing to write an empty value to '{0}'")]
    EmptyValue(String),

    #[error("Invalid secret name: {0}")]
    InvalidName(String),

    #[error("Failed to {operation} secret '{name}': {message}")]
    RemoteFailure {
        operation: Operation,
        name: String,
        message: String,
    },

    #[error("{context}: {message}")]
    TransportFailure { context: String, message: String },

    #[error("A write to '{name}' in vault '{vault}' is already in flight")]
    MutationInFlight { vault: String, name: String },

    #[error("The {0} snapshot is busy (load or write in flight)")]
    LoadInProgress(Role),

    // --- Store errors ---
    #[error("Vault '{0}' not found")]
    VaultNotFound(String),

    #[error("Vault name '{0}' matches more than one subscription — use '<subscription>: <vault>'")]
    AmbiguousVault(String),

    // --- Transfer errors ---
    #[error("Invalid import file: {0}")]
    InvalidImport(String),

    #[error("Import of {count} secrets into '{vault}' is not implemented yet")]
    ImportNotImplemented { count: usize, vault: String },

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Audit error: {0}")]
    AuditError(String),
}

impl VaultSyncError {
    /// Wrap a lower-level failure (I/O, parse, network) with what was being attempted.
    pub fn transport(context: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::TransportFailure {
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// Build a remote failure, falling back to "Unknown error" when the store gave no reason.
    pub fn remote(operation: Operation, name: impl Into<String>, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Unknown error".to_string());
        Self::RemoteFailure {
            operation,
            name: name.into(),
            message,
        }
    }
}

/// Convenience type alias for vaultsync results.
pub type Result<T> = std::result::Result<T, VaultSyncError>;
