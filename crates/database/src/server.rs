use std::collections::HashSet;

use async_trait::async_trait;
use collector::server::ServerRepository;
use model::{ids::Server, server::ServerEntity};
use utility::id::Id;

use crate::{rows::region_column, PgDatabase};

#[async_trait]
impl ServerRepository for PgDatabase {
    async fn upsert_server(&self, server: &ServerEntity) -> Result<(), String> {
        sqlx::query(
            "
            INSERT INTO servers (id, code, region, scenery, utc_offset_hours, spoken_language, tags, deleted, registered_since, update_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                code = EXCLUDED.code,
                region = EXCLUDED.region,
                scenery = EXCLUDED.scenery,
                utc_offset_hours = EXCLUDED.utc_offset_hours,
                spoken_language = EXCLUDED.spoken_language,
                tags = EXCLUDED.tags,
                deleted = EXCLUDED.deleted,
                update_time = EXCLUDED.update_time;
            ",
        )
        .bind(server.id.raw())
        .bind(&server.code)
        .bind(region_column(server.region))
        .bind(&server.scenery)
        .bind(server.utc_offset_hours as i16)
        .bind(&server.spoken_language)
        .bind(serde_json::to_value(&server.tags).unwrap_or(serde_json::Value::Array(vec![])))
        .bind(server.deleted)
        .bind(server.registered_since)
        .bind(server.update_time)
        .execute(&self.pool)
        .await
        .map_err(|err| err.to_string())?;

        Ok(())
    }

    async fn mark_uncontained_deleted(&self, present: &HashSet<Id<Server>>) -> Result<(), String> {
        let present_ids: Vec<uuid::Uuid> = present.iter().map(|id| id.raw()).collect();
        sqlx::query("UPDATE servers SET deleted = TRUE WHERE NOT (id = ANY($1)) AND deleted = FALSE;")
            .bind(&present_ids)
            .execute(&self.pool)
            .await
            .map_err(|err| err.to_string())?;
        Ok(())
    }
}
