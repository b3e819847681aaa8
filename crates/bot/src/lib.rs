//! `tinkerscout-bot`: process wiring for the scan service and its Telegram front.
//!
//! - `app`: builds stores, clients and the orchestrator from `Config`
//! - `registration`: the `/start` command
//! - `updates`: the `getUpdates` long-poll loop feeding `registration`

pub mod app;
pub mod registration;
pub mod updates;
