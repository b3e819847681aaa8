use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::RecipientId;

/// A registered destination for broadcast notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub identifier: RecipientId,
    pub joined_at: DateTime<Utc>,
}

impl Recipient {
    pub fn new(identifier: RecipientId, joined_at: DateTime<Utc>) -> Self {
        Self {
            identifier,
            joined_at,
        }
    }
}
