use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use dashmap::DashMap;
use model::{
    ids::{Journey, Point},
    journey::JourneyEntity,
    vehicle_sequence::{RailcarRef, SequenceResolveKey, VehicleSequenceEntity, VehicleSequenceStatus},
    TransportCategory,
};
use reference_data::railcar::RailcarIndex;
use upstream::{client::UpstreamClient, error::ApiError};
use utility::id::Id;

const PERIOD: Duration = Duration::from_secs(15);

#[derive(Debug)]
pub enum VehicleSequenceCollectorError {
    Upstream(ApiError),
    Repository(String),
}

impl From<ApiError> for VehicleSequenceCollectorError {
    fn from(error: ApiError) -> Self {
        Self::Upstream(error)
    }
}

/// The scheduled-slot identity an active run belongs to, so a `PREDICTION`
/// sequence can be carried over from an earlier real sighting of the same
/// slot (§4.4) even after the run id itself has rotated.
#[derive(Clone)]
pub struct ScheduledSlot {
    pub run_id: String,
    pub resolve_key: SequenceResolveKey,
}

/// Shared, cross-collector registry of the slots currently worth polling.
/// The timetable collector (which owns each run's route geometry) writes
/// into it; the vehicle-sequence collector reads a snapshot at the start of
/// every tick. Keyed by run id so a rebuild simply overwrites the previous
/// entry for that run.
#[derive(Default)]
pub struct ActiveSlotRegistry(DashMap<String, ScheduledSlot>);

impl ActiveSlotRegistry {
    pub fn new() -> Self {
        Self(DashMap::new())
    }

    pub fn upsert(&self, slot: ScheduledSlot) {
        self.0.insert(slot.run_id.clone(), slot);
    }

    pub fn snapshot(&self) -> Vec<ScheduledSlot> {
        self.0.iter().map(|entry| entry.value().clone()).collect()
    }
}

#[async_trait]
pub trait VehicleSequenceRepository: Send + Sync {
    async fn upsert(&self, sequence: &VehicleSequenceEntity) -> Result<(), String>;
    async fn find_real_by_resolve_key(&self, resolve_key: &SequenceResolveKey) -> Result<Option<VehicleSequenceEntity>, String>;
}

pub struct VehicleSequenceCollector {
    server_code: String,
    client: Arc<UpstreamClient>,
    railcars: Arc<RailcarIndex>,
    repository: Arc<dyn VehicleSequenceRepository>,
    slots: Arc<ActiveSlotRegistry>,
}

impl VehicleSequenceCollector {
    pub fn new(
        server_code: String,
        client: Arc<UpstreamClient>,
        railcars: Arc<RailcarIndex>,
        repository: Arc<dyn VehicleSequenceRepository>,
        slots: Arc<ActiveSlotRegistry>,
    ) -> Self {
        Self { server_code, client, railcars, repository, slots }
    }
}

#[async_trait]
impl crate::scheduler::Collector for VehicleSequenceCollector {
    type Error = VehicleSequenceCollectorError;

    fn unique_id(&self) -> &'static str {
        "vehicle_sequence"
    }

    fn period(&self) -> Duration {
        PERIOD
    }

    async fn tick(&mut self) -> Result<(), Self::Error> {
        let slots = self.slots.snapshot();

        for slot in &slots {
            let journey_id: Id<Journey> = JourneyEntity::id_for(&slot.run_id);
            let fetched = self.client.vehicle_sequence(&self.server_code, &slot.run_id).await;

            let (status, railcars) = match fetched {
                Ok(outcome) => match outcome.fresh() {
                    Some(dto) => {
                        let railcars = dto
                            .railcars
                            .iter()
                            .filter_map(|r| {
                                let railcar_id = self.railcars.by_api_id(&r.railcar_api_id)?.id;
                                Some(RailcarRef {
                                    railcar_id,
                                    load_percent: r.load_percent,
                                    named_locomotive: r.named_locomotive.clone(),
                                })
                            })
                            .collect();
                        (VehicleSequenceStatus::Real, railcars)
                    }
                    None => continue,
                },
                Err(_) => {
                    // no live sighting this tick; carry forward a previous
                    // real sighting of the same resolve key as a prediction
                    match self.repository.find_real_by_resolve_key(&slot.resolve_key).await {
                        Ok(Some(previous)) => (VehicleSequenceStatus::Prediction, previous.railcars),
                        _ => continue,
                    }
                }
            };

            let entity = VehicleSequenceEntity {
                id: VehicleSequenceEntity::new_id(),
                journey_id,
                status,
                railcars,
                resolve_key: slot.resolve_key.clone(),
            };

            self.repository
                .upsert(&entity)
                .await
                .map_err(VehicleSequenceCollectorError::Repository)?;
        }

        Ok(())
    }
}

/// Builds the resolve key for a run from its category/number/route/schedule
/// (GLOSSARY "sequence resolve key"), used by callers that assemble
/// `ScheduledSlot`s from timetable data.
pub fn resolve_key(
    category: TransportCategory,
    number: String,
    origin: Id<Point>,
    destination: Id<Point>,
    scheduled_departure: chrono::DateTime<chrono::Utc>,
) -> SequenceResolveKey {
    SequenceResolveKey { category, number, origin_point_id: origin, destination_point_id: destination, scheduled_departure }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::ids::Point;

    #[test]
    fn registry_upsert_replaces_by_run_id() {
        let registry = ActiveSlotRegistry::new();
        let origin = Id::<Point>::from_name(uuid::Uuid::nil(), "origin");
        let destination = Id::<Point>::from_name(uuid::Uuid::nil(), "destination");
        let key = resolve_key(TransportCategory::RegionalFast, "123".into(), origin, destination, chrono::Utc::now());

        registry.upsert(ScheduledSlot { run_id: "run-1".into(), resolve_key: key.clone() });
        assert_eq!(registry.snapshot().len(), 1);

        registry.upsert(ScheduledSlot { run_id: "run-1".into(), resolve_key: key });
        assert_eq!(registry.snapshot().len(), 1, "re-upserting the same run id must not duplicate the slot");
    }

    #[tokio::test]
    async fn tick_is_a_noop_with_no_active_slots() {
        struct NoopRepository;
        #[async_trait]
        impl VehicleSequenceRepository for NoopRepository {
            async fn upsert(&self, _sequence: &VehicleSequenceEntity) -> Result<(), String> {
                Ok(())
            }
            async fn find_real_by_resolve_key(&self, _resolve_key: &SequenceResolveKey) -> Result<Option<VehicleSequenceEntity>, String> {
                Ok(None)
            }
        }

        let mut collector = VehicleSequenceCollector::new(
            "srv".into(),
            Arc::new(UpstreamClient::new(upstream::client::UpstreamBaseUrls {
                panel: String::new(),
                aws: String::new(),
                routing: String::new(),
                profile: String::new(),
            })),
            Arc::new(RailcarIndex::build(Vec::new()).unwrap()),
            Arc::new(NoopRepository),
            Arc::new(ActiveSlotRegistry::new()),
        );

        crate::scheduler::Collector::tick(&mut collector).await.unwrap();
    }
}
