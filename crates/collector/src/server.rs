use std::{collections::HashSet, sync::Arc, time::Duration};

use async_trait::async_trait;
use cache::{CacheEntry, CacheError, VersionedCache};
use model::{
    ids::Server,
    server::ServerEntity,
    Region,
};
use upstream::{client::UpstreamClient, error::ApiError};
use utility::{id::Id, mongo_id::ForeignId};

use crate::scheduler::Collector;

const PERIOD: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub enum ServerCollectorError {
    Upstream(ApiError),
    Repository(String),
}

impl From<ApiError> for ServerCollectorError {
    fn from(error: ApiError) -> Self {
        Self::Upstream(error)
    }
}

/// Server identity as it lives in C3; cheap enough to encode as a
/// pipe-joined string rather than pulling in a binary codec.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerCacheEntry {
    pub entity: ServerEntity,
    pub version: i64,
}

impl CacheEntry for ServerCacheEntry {
    fn version(&self) -> i64 {
        self.version
    }

    fn primary_key(&self) -> String {
        self.entity.id.to_string()
    }

    fn encode(&self) -> Vec<u8> {
        format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
            self.entity.id,
            self.entity.code,
            self.version,
            self.entity.deleted,
            self.entity.registered_since.timestamp(),
            self.entity.utc_offset_hours,
        )
        .into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, CacheError> {
        let text = String::from_utf8_lossy(bytes);
        let mut parts = text.split('\u{1f}');
        let id = parts.next().ok_or_else(|| CacheError::Decode(text.to_string()))?;
        let code = parts.next().ok_or_else(|| CacheError::Decode(text.to_string()))?;
        let version = parts
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| CacheError::Decode(text.to_string()))?;
        let deleted = parts
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| CacheError::Decode(text.to_string()))?;
        let registered_since = parts
            .next()
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| CacheError::Decode(text.to_string()))?;
        let utc_offset_hours = parts
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| CacheError::Decode(text.to_string()))?;
        Ok(Self {
            entity: ServerEntity {
                id: Id::new(id.parse().map_err(|_| CacheError::Decode(text.to_string()))?),
                code: code.to_string(),
                region: Region::Europe,
                scenery: String::new(),
                utc_offset_hours,
                spoken_language: String::new(),
                tags: Vec::new(),
                deleted,
                registered_since,
                update_time: chrono::Utc::now(),
            },
            version,
        })
    }
}

#[async_trait]
pub trait ServerRepository: Send + Sync {
    async fn upsert_server(&self, server: &ServerEntity) -> Result<(), String>;
    async fn mark_uncontained_deleted(&self, present: &HashSet<Id<Server>>) -> Result<(), String>;
}

pub struct ServerCollector {
    client: Arc<UpstreamClient>,
    cache: Arc<VersionedCache<ServerCacheEntry>>,
    repository: Arc<dyn ServerRepository>,
    region_for: fn(&str) -> Region,
}

impl ServerCollector {
    pub fn new(
        client: Arc<UpstreamClient>,
        cache: Arc<VersionedCache<ServerCacheEntry>>,
        repository: Arc<dyn ServerRepository>,
        region_for: fn(&str) -> Region,
    ) -> Self {
        Self { client, cache, repository, region_for }
    }
}

#[async_trait]
impl Collector for ServerCollector {
    type Error = ServerCollectorError;

    fn unique_id(&self) -> &'static str {
        "server"
    }

    fn period(&self) -> Duration {
        PERIOD
    }

    async fn tick(&mut self) -> Result<(), Self::Error> {
        let Some(servers) = self.client.list_servers().await?.fresh() else {
            return Ok(());
        };

        let mut present = HashSet::new();
        for dto in &servers {
            let id = ServerEntity::id_for(&dto.id);
            present.insert(id);

            let previous = self.cache.find_primary(&id.to_string());

            let registered_since = match ForeignId::parse(&dto.id) {
                Ok(foreign_id) => foreign_id.timestamp(),
                Err(_) => {
                    tracing::warn!(foreign_id = %dto.id, "server id is not a valid foreign id, keeping previous registered_since");
                    previous
                        .as_ref()
                        .map(|p| p.entity.registered_since)
                        .unwrap_or_else(chrono::Utc::now)
                }
            };

            let utc_offset_hours = match self.client.time_offset(&dto.code).await?.fresh() {
                Some(offset) => offset.utc_offset_hours,
                None => previous.as_ref().map(|p| p.entity.utc_offset_hours).unwrap_or(0),
            };

            let entity = ServerEntity {
                id,
                code: dto.code.clone(),
                region: (self.region_for)(&dto.region),
                scenery: dto.scenery.clone(),
                utc_offset_hours,
                spoken_language: dto.spoken_language.clone(),
                tags: dto.tags.clone(),
                deleted: false,
                registered_since,
                update_time: chrono::Utc::now(),
            };

            let next_version = previous.map(|p| p.version + 1).unwrap_or(1);
            self.cache.set(ServerCacheEntry { entity: entity.clone(), version: next_version });

            self.repository
                .upsert_server(&entity)
                .await
                .map_err(ServerCollectorError::Repository)?;
        }

        self.repository
            .mark_uncontained_deleted(&present)
            .await
            .map_err(ServerCollectorError::Repository)?;

        Ok(())
    }
}
