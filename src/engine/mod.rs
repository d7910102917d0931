//! Reconciliation and sync engine.
//!
//! This module provides:
//! - `Snapshot`, `SecretRecord` and `SecretMetadata` (`snapshot`)
//! - The four-way name classifier (`classify`)
//! - View filters over a classification (`filter`)
//! - Local transitions committed after remote writes (`transition`)
//! - In-flight write/load bookkeeping (`coordinator`)
//! - `Session`, which ties a store and two snapshots together (`session`)

pub mod classify;
pub mod coordinator;
pub mod filter;
pub mod session;
pub mod snapshot;
pub mod transition;

// Re-export the most commonly used items.
pub use classify::{classify, Classification, ComparisonState};
pub use coordinator::Coordinator;
pub use filter::{filter, ViewFilter};
pub use session::{BulkSyncReport, Session, SyncOutcome};
pub use snapshot::{display_date, Role, SecretMetadata, SecretRecord, Snapshot};
pub use transition::Transition;
