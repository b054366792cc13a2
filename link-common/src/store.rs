use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::link::{LinkEntity, LinkError, NewLink, PositionUpdate};

/// Enumeration of errors for operations with PgLinkStore.
/// Errors can originate from sqlx and are wrapped by us to provide additional context.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection failed with: {error}")]
    ConnectionError { error: sqlx::Error },
    #[error("{command} query failed with: {error}")]
    QueryError {
        command: &'static str,
        error: sqlx::Error,
    },
    #[error("link {0} not found")]
    NotFound(Uuid),
    #[error("positions conflict with another link in the set")]
    Conflict,
    #[error("position {0} is negative")]
    InvalidPosition(i32),
    #[error("invalid link: {0}")]
    InvalidLink(#[from] LinkError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Determines if a sqlx::Error is a unique constraint violation.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        // Class 23 (integrity constraint violation), 23505 = unique_violation
        sqlx::Error::Database(db_error) => db_error.code().as_deref() == Some("23505"),
        _ => false,
    }
}

fn query_error(command: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |error| {
        if is_unique_violation(&error) {
            StoreError::Conflict
        } else {
            StoreError::QueryError { command, error }
        }
    }
}

/// User link sets stored in the profile_links table.
#[derive(Clone)]
pub struct PgLinkStore {
    pool: PgPool,
}

impl PgLinkStore {
    pub async fn new(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|error| StoreError::ConnectionError { error })?;

        Ok(Self { pool })
    }

    pub fn new_from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// All links of a user, in display order.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: Uuid) -> StoreResult<Vec<LinkEntity>> {
        sqlx::query_as::<_, LinkEntity>(
            r#"
SELECT id, platform, url, position, created_at
FROM profile_links
WHERE user_id = $1
ORDER BY position ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error("SELECT"))
    }

    /// Append a link at the end of the user's set.
    #[instrument(skip(self, link), fields(platform = %link.platform))]
    pub async fn create(&self, user_id: Uuid, link: &NewLink) -> StoreResult<LinkEntity> {
        let link = link.validate()?;

        sqlx::query_as::<_, LinkEntity>(
            r#"
INSERT INTO profile_links (id, user_id, platform, url, position, created_at)
SELECT $1, $2, $3, $4, COALESCE(MAX(position) + 1, 0), $5
FROM profile_links
WHERE user_id = $2
RETURNING id, platform, url, position, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(&link.platform)
        .bind(&link.url)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(query_error("INSERT"))
    }

    /// Change the platform and url of a link. Its position is left alone.
    #[instrument(skip(self, link), fields(platform = %link.platform))]
    pub async fn update(
        &self,
        user_id: Uuid,
        link_id: Uuid,
        link: &NewLink,
    ) -> StoreResult<LinkEntity> {
        let link = link.validate()?;

        sqlx::query_as::<_, LinkEntity>(
            r#"
UPDATE profile_links
SET platform = $3, url = $4
WHERE id = $1 AND user_id = $2
RETURNING id, platform, url, position, created_at
            "#,
        )
        .bind(link_id)
        .bind(user_id)
        .bind(&link.platform)
        .bind(&link.url)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error("UPDATE"))?
        .ok_or(StoreError::NotFound(link_id))
    }

    /// Remove a link. Positions of the remaining links are left alone.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid, link_id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM profile_links WHERE id = $1 AND user_id = $2")
            .bind(link_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(query_error("DELETE"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(link_id));
        }
        Ok(())
    }

    /// Apply a batch of position updates atomically. If any link does not
    /// belong to the user nothing is changed.
    #[instrument(skip(self, updates), fields(updates = updates.len()))]
    pub async fn apply_positions(
        &self,
        user_id: Uuid,
        updates: &[PositionUpdate],
    ) -> StoreResult<()> {
        if let Some(update) = updates.iter().find(|u| u.position < 0) {
            return Err(StoreError::InvalidPosition(update.position));
        }

        // The last update for an id wins.
        let mut latest: HashMap<Uuid, i32> = HashMap::with_capacity(updates.len());
        for update in updates {
            latest.insert(update.id, update.position);
        }
        if latest.is_empty() {
            return Ok(());
        }
        let (ids, positions): (Vec<Uuid>, Vec<i32>) = latest.into_iter().unzip();

        let start_time = Instant::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|error| StoreError::ConnectionError { error })?;

        let result = sqlx::query(
            r#"
UPDATE profile_links AS links
SET position = batch.position
FROM UNNEST($1::uuid[], $2::int4[]) AS batch(id, position)
WHERE links.id = batch.id AND links.user_id = $3
            "#,
        )
        .bind(&ids)
        .bind(&positions)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(query_error("UPDATE"))?;

        if result.rows_affected() != ids.len() as u64 {
            tx.rollback().await.map_err(query_error("ROLLBACK"))?;

            let known: Vec<Uuid> = sqlx::query_scalar(
                "SELECT id FROM profile_links WHERE user_id = $1 AND id = ANY($2)",
            )
            .bind(user_id)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error("SELECT"))?;

            let missing = ids
                .iter()
                .find(|id| !known.contains(id))
                .copied()
                .unwrap_or_default();
            return Err(StoreError::NotFound(missing));
        }

        // The unique constraint is deferred, so a bad batch fails here.
        tx.commit().await.map_err(query_error("COMMIT"))?;

        metrics::counter!("link_positions_updated_total").increment(ids.len() as u64);
        metrics::histogram!("link_batch_update_duration_seconds")
            .record(start_time.elapsed().as_secs_f64());

        Ok(())
    }
}
