//! One module per subcommand, each exposing an `execute` function.

pub mod audit_cmd;
pub mod compare;
pub mod completions;
pub mod edit;
pub mod export;
pub mod import_cmd;
pub mod subscriptions;
pub mod sync;
pub mod sync_all;
pub mod vaults;
