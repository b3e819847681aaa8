//! `tinkerscout-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** types (no infrastructure concerns):
//! tinkers, recipients, and the loose record shape reported by the
//! intelligence source together with its normalisation rules.

pub mod error;
pub mod id;
pub mod recipient;
pub mod record;
pub mod tinker;

pub use error::{DomainError, DomainResult};
pub use id::{RecipientId, TinkerId};
pub use recipient::Recipient;
pub use record::{TinkerRecord, UNKNOWN_CONTRACT_ADDRESS, UNKNOWN_TEXT};
pub use tinker::{Level, Tinker};
