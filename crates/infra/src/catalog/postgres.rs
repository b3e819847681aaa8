//! Postgres-backed catalog.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | CatalogError |
//! |------------|----------------------|--------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Anything else | | `Storage` |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use tinkerscout_core::{Level, Tinker, TinkerId};

use super::{CatalogError, CatalogStore};
use crate::db::{describe, is_unique_violation};

#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip(self), err)]
    async fn find_by_name(&self, name: &str) -> Result<Option<Tinker>, CatalogError> {
        let row = sqlx::query(
            r#"
            SELECT
                id,
                name,
                reason,
                source,
                blockchain,
                hype_level,
                risk_level,
                contract_address,
                found_at,
                created_at
            FROM tinkers
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| CatalogError::Storage(describe("find_by_name", &e)))?;

        row.map(|r| tinker_from_row(&r)).transpose()
    }

    #[instrument(skip(self, tinker), fields(name = %tinker.name), err)]
    async fn insert(&self, tinker: &Tinker) -> Result<(), CatalogError> {
        sqlx::query(
            r#"
            INSERT INTO tinkers (
                id,
                name,
                reason,
                source,
                blockchain,
                hype_level,
                risk_level,
                contract_address,
                found_at,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(tinker.id.as_uuid())
        .bind(&tinker.name)
        .bind(&tinker.reason)
        .bind(&tinker.source)
        .bind(&tinker.blockchain)
        .bind(tinker.hype_level.as_str())
        .bind(tinker.risk_level.as_str())
        .bind(&tinker.contract_address)
        .bind(tinker.found_at)
        .bind(tinker.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CatalogError::Conflict(tinker.name.clone())
            } else {
                CatalogError::Storage(describe("insert", &e))
            }
        })?;

        Ok(())
    }
}

fn tinker_from_row(row: &sqlx::postgres::PgRow) -> Result<Tinker, CatalogError> {
    let get_err = |e: sqlx::Error| CatalogError::Storage(format!("failed to read tinker row: {e}"));

    let hype: String = row.try_get("hype_level").map_err(get_err)?;
    let risk: String = row.try_get("risk_level").map_err(get_err)?;
    let found_at: DateTime<Utc> = row.try_get("found_at").map_err(get_err)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(get_err)?;

    Ok(Tinker {
        id: TinkerId::from_uuid(row.try_get("id").map_err(get_err)?),
        name: row.try_get("name").map_err(get_err)?,
        reason: row.try_get("reason").map_err(get_err)?,
        source: row.try_get("source").map_err(get_err)?,
        blockchain: row.try_get("blockchain").map_err(get_err)?,
        hype_level: parse_level(&hype)?,
        risk_level: parse_level(&risk)?,
        contract_address: row.try_get("contract_address").map_err(get_err)?,
        found_at,
        created_at,
    })
}

fn parse_level(raw: &str) -> Result<Level, CatalogError> {
    raw.parse()
        .map_err(|e| CatalogError::Storage(format!("corrupt level column: {e}")))
}
