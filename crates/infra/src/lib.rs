//! Infrastructure layer: storage, notifications, scan orchestration, config.

pub mod catalog;
pub mod config;
pub mod db;
pub mod directory;
pub mod notify;
pub mod scan;

pub use config::{Config, ConfigError};
