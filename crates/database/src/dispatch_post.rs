use std::collections::HashSet;

use async_trait::async_trait;
use collector::dispatch_post::DispatchPostRepository;
use model::{
    dispatch_post::DispatchPostEntity,
    ids::{DispatchPost, Server},
};
use utility::id::Id;

use crate::PgDatabase;

#[async_trait]
impl DispatchPostRepository for PgDatabase {
    async fn upsert_dispatch_post(&self, post: &DispatchPostEntity) -> Result<(), String> {
        sqlx::query(
            "
            INSERT INTO dispatch_posts (id, server_id, point_id, latitude, longitude, difficulty, image_urls, deleted)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                point_id = EXCLUDED.point_id,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                difficulty = EXCLUDED.difficulty,
                image_urls = EXCLUDED.image_urls,
                deleted = EXCLUDED.deleted;
            ",
        )
        .bind(post.id.raw())
        .bind(post.server_id.raw())
        .bind(post.point_id.map(|id| id.raw()))
        .bind(post.latitude)
        .bind(post.longitude)
        .bind(post.difficulty as i16)
        .bind(&post.image_urls)
        .bind(post.deleted)
        .execute(&self.pool)
        .await
        .map_err(|err| err.to_string())?;

        Ok(())
    }

    async fn mark_uncontained_deleted(&self, server: Id<Server>, present: &HashSet<Id<DispatchPost>>) -> Result<(), String> {
        let present_ids: Vec<uuid::Uuid> = present.iter().map(|id| id.raw()).collect();
        sqlx::query("UPDATE dispatch_posts SET deleted = TRUE WHERE server_id = $1 AND NOT (id = ANY($2)) AND deleted = FALSE;")
            .bind(server.raw())
            .bind(&present_ids)
            .execute(&self.pool)
            .await
            .map_err(|err| err.to_string())?;
        Ok(())
    }
}
