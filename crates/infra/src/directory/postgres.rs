use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{instrument, warn};

use tinkerscout_core::{Recipient, RecipientId};

use super::{DirectoryError, RecipientDirectory, Registration};
use crate::db::describe;

/// Postgres-backed recipient directory (`recipients` table).
#[derive(Debug, Clone)]
pub struct PostgresRecipientDirectory {
    pool: Arc<PgPool>,
}

impl PostgresRecipientDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl RecipientDirectory for PostgresRecipientDirectory {
    #[instrument(skip(self), fields(recipient = %identifier), err)]
    async fn register(&self, identifier: &RecipientId) -> Result<Registration, DirectoryError> {
        // ON CONFLICT keeps the original joined_at of an existing row.
        let result = sqlx::query(
            r#"
            INSERT INTO recipients (identifier, joined_at)
            VALUES ($1, $2)
            ON CONFLICT (identifier) DO NOTHING
            "#,
        )
        .bind(identifier.as_str())
        .bind(Utc::now())
        .execute(&*self.pool)
        .await
        .map_err(|e| DirectoryError::Storage(describe("register", &e)))?;

        Ok(Registration {
            already_exists: result.rows_affected() == 0,
        })
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Recipient>, DirectoryError> {
        let rows = sqlx::query(
            r#"
            SELECT identifier, joined_at
            FROM recipients
            ORDER BY joined_at ASC, identifier ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| DirectoryError::Storage(describe("list_recipients", &e)))?;

        let mut recipients = Vec::with_capacity(rows.len());
        for row in rows {
            let identifier: String = row
                .try_get("identifier")
                .map_err(|e| DirectoryError::Storage(format!("failed to read recipient row: {e}")))?;
            let joined_at: DateTime<Utc> = row
                .try_get("joined_at")
                .map_err(|e| DirectoryError::Storage(format!("failed to read recipient row: {e}")))?;

            match RecipientId::new(identifier) {
                Ok(id) => recipients.push(Recipient::new(id, joined_at)),
                Err(e) => warn!(error = %e, "skipping recipient row with unusable identifier"),
            }
        }
        Ok(recipients)
    }
}
