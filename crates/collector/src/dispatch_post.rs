use std::{collections::HashSet, sync::Arc, time::Duration};

use async_trait::async_trait;
use cache::{CacheEntry, CacheError, VersionedCache};
use model::{
    dispatch_post::DispatchPostEntity,
    ids::{DispatchPost, Point, Server},
};
use reference_data::point::PointIndex;
use upstream::{client::UpstreamClient, error::ApiError};
use utility::id::Id;

const PERIOD: Duration = Duration::from_secs(10);
const DB_WRITE_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
pub enum DispatchPostCollectorError {
    Upstream(ApiError),
    Repository(String),
}

impl From<ApiError> for DispatchPostCollectorError {
    fn from(error: ApiError) -> Self {
        Self::Upstream(error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPostCacheEntry {
    pub entity: DispatchPostEntity,
    pub version: i64,
}

impl CacheEntry for DispatchPostCacheEntry {
    fn version(&self) -> i64 {
        self.version
    }

    fn primary_key(&self) -> String {
        self.entity.id.to_string()
    }

    fn encode(&self) -> Vec<u8> {
        format!("{}\u{1f}{}", self.entity.id, self.version).into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, CacheError> {
        Err(CacheError::Decode(format!(
            "dispatch post identity is not reconstructable from its cache key alone: {}",
            String::from_utf8_lossy(bytes)
        )))
    }
}

#[async_trait]
pub trait DispatchPostRepository: Send + Sync {
    async fn upsert_dispatch_post(&self, post: &DispatchPostEntity) -> Result<(), String>;
    async fn mark_uncontained_deleted(
        &self,
        server: Id<Server>,
        present: &HashSet<Id<DispatchPost>>,
    ) -> Result<(), String>;
}

/// Tracks the last time a given server's dispatch-post set was written to
/// the database, to throttle writes to once per `DB_WRITE_INTERVAL` unless
/// content actually changed (§4.4).
#[derive(Default)]
struct WriteThrottle {
    last_written_at: std::collections::HashMap<Id<Server>, std::time::Instant>,
}

impl WriteThrottle {
    fn should_write(&mut self, server: Id<Server>, changed: bool) -> bool {
        if changed {
            self.last_written_at.insert(server, std::time::Instant::now());
            return true;
        }
        match self.last_written_at.get(&server) {
            Some(at) if at.elapsed() < DB_WRITE_INTERVAL => false,
            _ => {
                self.last_written_at.insert(server, std::time::Instant::now());
                true
            }
        }
    }
}

pub struct DispatchPostCollector {
    server_id: Id<Server>,
    server_code: String,
    client: Arc<UpstreamClient>,
    cache: Arc<VersionedCache<DispatchPostCacheEntry>>,
    points: Arc<PointIndex>,
    repository: Arc<dyn DispatchPostRepository>,
    throttle: WriteThrottle,
}

impl DispatchPostCollector {
    pub fn new(
        server_id: Id<Server>,
        server_code: String,
        client: Arc<UpstreamClient>,
        cache: Arc<VersionedCache<DispatchPostCacheEntry>>,
        points: Arc<PointIndex>,
        repository: Arc<dyn DispatchPostRepository>,
    ) -> Self {
        Self { server_id, server_code, client, cache, points, repository, throttle: WriteThrottle::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_content_is_throttled_until_interval_elapses() {
        let mut throttle = WriteThrottle::default();
        let server = Id::from_name(uuid::Uuid::nil(), "srv");

        assert!(throttle.should_write(server, false));
        assert!(!throttle.should_write(server, false));
    }

    #[test]
    fn content_change_always_writes() {
        let mut throttle = WriteThrottle::default();
        let server = Id::from_name(uuid::Uuid::nil(), "srv");

        assert!(throttle.should_write(server, false));
        assert!(throttle.should_write(server, true));
    }
}

#[async_trait]
impl crate::scheduler::Collector for DispatchPostCollector {
    type Error = DispatchPostCollectorError;

    fn unique_id(&self) -> &'static str {
        "dispatch_post"
    }

    fn period(&self) -> Duration {
        PERIOD
    }

    async fn tick(&mut self) -> Result<(), Self::Error> {
        let Some(posts) = self.client.dispatch_posts(&self.server_code).await?.fresh() else {
            // 304 Not Modified: reuse last snapshot, nothing to write.
            return Ok(());
        };

        let mut present = HashSet::new();
        let mut any_changed = false;

        for dto in &posts {
            let id = DispatchPostEntity::id_for(&dto.id);
            present.insert(id);

            let point_id: Option<Id<Point>> = self.points.by_name(&dto.point_name).map(|p| p.id);

            let entity = DispatchPostEntity {
                id,
                server_id: self.server_id,
                point_id,
                latitude: dto.latitude,
                longitude: dto.longitude,
                difficulty: dto.difficulty_level,
                image_urls: dto.image_url_list.clone(),
                deleted: false,
            };

            let previous = self.cache.find_primary(&id.to_string());
            let changed = previous.as_ref().map(|p| p.entity != entity).unwrap_or(true);
            any_changed = any_changed || changed;

            let next_version = previous.map(|p| p.version + 1).unwrap_or(1);
            self.cache.set(DispatchPostCacheEntry { entity: entity.clone(), version: next_version });

            if changed {
                self.repository
                    .upsert_dispatch_post(&entity)
                    .await
                    .map_err(DispatchPostCollectorError::Repository)?;
            }
        }

        if self.throttle.should_write(self.server_id, any_changed) {
            self.repository
                .mark_uncontained_deleted(self.server_id, &present)
                .await
                .map_err(DispatchPostCollectorError::Repository)?;
        }

        Ok(())
    }
}
