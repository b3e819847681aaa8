use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::id::TinkerId;

/// Coarse three-step rating used for both hype and risk.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::High => "High",
            Level::Medium => "Medium",
            Level::Low => "Low",
        }
    }
}

impl core::fmt::Display for Level {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = DomainError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Level::High),
            "medium" => Ok(Level::Medium),
            "low" => Ok(Level::Low),
            other => Err(DomainError::UnknownLevel(other.to_string())),
        }
    }
}

/// A newly launched asset accepted into the catalog.
///
/// Tinkers are created once by the scan cycle and never mutated afterwards.
/// `name` is the natural key: at most one tinker per exact (case-sensitive) name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tinker {
    pub id: TinkerId,
    pub name: String,
    pub reason: String,
    pub source: String,
    pub blockchain: String,
    pub hype_level: Level,
    pub risk_level: Level,
    pub contract_address: String,
    /// When the source first detected the asset.
    pub found_at: DateTime<Utc>,
    /// When the record was created in this system.
    pub created_at: DateTime<Utc>,
}
