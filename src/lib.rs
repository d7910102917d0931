pub mod audit;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod store;
pub mod transfer;
