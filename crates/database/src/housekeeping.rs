use async_trait::async_trait;
use chrono::{DateTime, Utc};
use housekeeping::HousekeepingRepository;
use model::ids::Journey;
use utility::id::Id;

use crate::PgDatabase;

#[async_trait]
impl HousekeepingRepository for PgDatabase {
    async fn find_stale_journey_ids(&self, older_than: DateTime<Utc>, limit: usize) -> Result<Vec<Id<Journey>>, String> {
        let rows: Vec<(uuid::Uuid,)> = sqlx::query_as(
            "
            SELECT id FROM journeys
            WHERE update_time < $1
            ORDER BY update_time ASC
            LIMIT $2;
            ",
        )
        .bind(older_than)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| err.to_string())?;

        Ok(rows.into_iter().map(|(id,)| Id::new(id)).collect())
    }

    async fn delete_journeys(&self, ids: &[Id<Journey>]) -> Result<u64, String> {
        if ids.is_empty() {
            return Ok(0);
        }
        let raw_ids: Vec<uuid::Uuid> = ids.iter().map(|id| id.raw()).collect();
        let result = sqlx::query("DELETE FROM journeys WHERE id = ANY($1);")
            .bind(&raw_ids)
            .execute(&self.pool)
            .await
            .map_err(|err| err.to_string())?;
        Ok(result.rows_affected())
    }
}
