//! Project configuration (`.vaultsync.toml`).

pub mod settings;

pub use settings::Settings;
