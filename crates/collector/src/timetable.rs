use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{
    ids::{Server, Point},
    journey::{JourneyAggregate, JourneyEntity},
    journey_event::{EventType, JourneyEventEntity, PrecisionType, StopType, TransportDescriptor},
    TransportCategory,
};
use reconciler::continuation;
use reference_data::point::PointIndex;
use upstream::{client::UpstreamClient, dto::TimetableEventDto, error::ApiError};
use utility::id::Id;

use crate::vehicle_sequence::{self, ActiveSlotRegistry, ScheduledSlot};

const PERIOD: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
pub enum TimetableCollectorError {
    Upstream(ApiError),
    Repository(String),
}

impl From<ApiError> for TimetableCollectorError {
    fn from(error: ApiError) -> Self {
        Self::Upstream(error)
    }
}

#[async_trait]
pub trait TimetableRepository: Send + Sync {
    async fn save_journey_with_events(&self, aggregate: &JourneyAggregate) -> Result<(), String>;
}

pub struct TimetableCollector {
    server_id: Id<Server>,
    server_code: String,
    client: Arc<UpstreamClient>,
    points: Arc<PointIndex>,
    repository: Arc<dyn TimetableRepository>,
    active_slots: Arc<ActiveSlotRegistry>,
}

impl TimetableCollector {
    pub fn new(
        server_id: Id<Server>,
        server_code: String,
        client: Arc<UpstreamClient>,
        points: Arc<PointIndex>,
        repository: Arc<dyn TimetableRepository>,
        active_slots: Arc<ActiveSlotRegistry>,
    ) -> Self {
        Self { server_id, server_code, client, points, repository, active_slots }
    }

    /// Builds the journey's scheduled events from one upstream timetable row
    /// per stop. A stop with both an arrival and a departure time produces
    /// two events; indices are assigned in visiting order so they stay a
    /// dense zero-based permutation (§8 property 1).
    fn build_events(&self, journey_id: Id<model::ids::Journey>, rows: &[TimetableEventDto]) -> Vec<JourneyEventEntity> {
        let mut events = Vec::with_capacity(rows.len() * 2);
        let mut index = 0u32;

        for row in rows {
            let point_id: Option<Id<Point>> = self.points.by_name(&row.point_name).map(|p| p.id);
            let in_playable_border = point_id.is_some();

            let category = match TransportCategory::from_train_type(&row.train_type) {
                Ok(category) => category,
                Err(err) => {
                    tracing::warn!(error = %err, point = %row.point_name, "skipping timetable row with unknown train type");
                    continue;
                }
            };
            let stop_type = parse_stop_type(&row.stop_type);

            let transport = TransportDescriptor {
                category,
                number: row.train_number.clone(),
                line: row.line.clone(),
                label: row.label.clone(),
                transport_type: row.train_type.clone(),
                max_speed_kmh: row.max_speed_kmh,
            };

            if let Some(scheduled) = row.arrival_time.as_deref().and_then(parse_time) {
                events.push(JourneyEventEntity {
                    id: JourneyEventEntity::id_for(journey_id, index, EventType::Arrival),
                    journey_id,
                    event_index: index,
                    event_type: EventType::Arrival,
                    point_id,
                    in_playable_border,
                    scheduled_local_time: scheduled,
                    realtime_local_time: None,
                    precision_type: PrecisionType::Schedule,
                    transport: transport.clone(),
                    stop_type,
                    scheduled_platform: row.scheduled_platform.clone(),
                    scheduled_track: row.scheduled_track.clone(),
                    realtime_platform: None,
                    realtime_track: None,
                    cancelled: false,
                    additional: false,
                });
                index += 1;
            }

            if let Some(scheduled) = row.departure_time.as_deref().and_then(parse_time) {
                events.push(JourneyEventEntity {
                    id: JourneyEventEntity::id_for(journey_id, index, EventType::Departure),
                    journey_id,
                    event_index: index,
                    event_type: EventType::Departure,
                    point_id,
                    in_playable_border,
                    scheduled_local_time: scheduled,
                    realtime_local_time: None,
                    precision_type: PrecisionType::Schedule,
                    transport: transport.clone(),
                    stop_type,
                    scheduled_platform: row.scheduled_platform.clone(),
                    scheduled_track: row.scheduled_track.clone(),
                    realtime_platform: None,
                    realtime_track: None,
                    cancelled: false,
                    additional: false,
                });
                index += 1;
            }
        }

        events
    }
}

fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.with_timezone(&Utc))
}

fn parse_stop_type(text: &str) -> StopType {
    match text {
        "PASSENGER" => StopType::Passenger,
        "NON_PASSENGER" => StopType::NonPassenger,
        _ => StopType::None,
    }
}

#[async_trait]
impl crate::scheduler::Collector for TimetableCollector {
    type Error = TimetableCollectorError;

    fn unique_id(&self) -> &'static str {
        "timetable"
    }

    fn period(&self) -> Duration {
        PERIOD
    }

    async fn tick(&mut self) -> Result<(), Self::Error> {
        let Some(timetables) = self.client.timetable(&self.server_code).await?.fresh() else {
            return Ok(());
        };

        let mut aggregates: Vec<JourneyAggregate> = timetables
            .iter()
            .map(|dto| {
                let journey_id = JourneyEntity::id_for(&dto.run_id);
                JourneyAggregate {
                    journey: JourneyEntity {
                        id: journey_id,
                        server_id: self.server_id,
                        foreign_run_id: dto.run_id.clone(),
                        first_seen_time: None,
                        last_seen_time: None,
                        cancelled: false,
                        continuation_journey_id: None,
                    },
                    events: self.build_events(journey_id, &dto.events),
                    vehicle_sequence: None,
                }
            })
            .collect();

        for i in 0..aggregates.len() {
            let Some(continues_as) = timetables[i].continues_as.clone() else { continue };
            let others: Vec<JourneyAggregate> = aggregates
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, a)| a.clone())
                .collect();
            if let Some(linked) = continuation::find_continuation(&aggregates[i], &continues_as, &others) {
                aggregates[i].journey.continuation_journey_id = Some(linked);
            }
        }

        for (i, aggregate) in aggregates.iter().enumerate() {
            if let Some(slot) = self.scheduled_slot(&timetables[i].run_id, &aggregate.events) {
                self.active_slots.upsert(slot);
            }
            self.repository
                .save_journey_with_events(aggregate)
                .await
                .map_err(TimetableCollectorError::Repository)?;
        }

        Ok(())
    }
}

impl TimetableCollector {
    /// Derives the resolve key a vehicle-sequence sighting of this run would
    /// carry, from its first and last scheduled events (§4.4's "owns the
    /// route geometry" for the vehicle-sequence collector). `None` when
    /// either endpoint's point could not be resolved against reference data.
    fn scheduled_slot(&self, run_id: &str, events: &[JourneyEventEntity]) -> Option<ScheduledSlot> {
        let first = events.first()?;
        let last = events.last()?;
        let origin = first.point_id?;
        let destination = last.point_id?;
        let resolve_key = vehicle_sequence::resolve_key(first.transport.category, first.transport.number.clone(), origin, destination, first.scheduled_local_time);
        Some(ScheduledSlot { run_id: run_id.to_string(), resolve_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reference_data::point::{PointIndex, PointRecord};

    fn square_point(foreign_id: &str, name: &str) -> PointRecord {
        PointRecord {
            foreign_id: foreign_id.into(),
            name: name.into(),
            latitude: 0.0,
            longitude: 0.0,
            polygon: vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)],
        }
    }

    fn collector() -> TimetableCollector {
        let points = PointIndex::build(vec![square_point("p1", "Point One"), square_point("p2", "Point Two")]).unwrap();
        TimetableCollector {
            server_id: Id::from_name(uuid::Uuid::nil(), "srv"),
            server_code: "srv".into(),
            client: Arc::new(UpstreamClient::new(upstream::client::UpstreamBaseUrls {
                panel: String::new(),
                aws: String::new(),
                routing: String::new(),
                profile: String::new(),
            })),
            points: Arc::new(points),
            repository: Arc::new(NoopRepository),
            active_slots: Arc::new(ActiveSlotRegistry::new()),
        }
    }

    struct NoopRepository;
    #[async_trait]
    impl TimetableRepository for NoopRepository {
        async fn save_journey_with_events(&self, _aggregate: &JourneyAggregate) -> Result<(), String> {
            Ok(())
        }
    }

    fn row(point_name: &str, arrival: Option<&str>, departure: Option<&str>) -> TimetableEventDto {
        TimetableEventDto {
            point_name: point_name.into(),
            arrival_time: arrival.map(String::from),
            departure_time: departure.map(String::from),
            scheduled_platform: None,
            scheduled_track: None,
            stop_type: "PASSENGER".into(),
            train_type: "RA1".into(),
            train_number: "123".into(),
            line: None,
            label: None,
            max_speed_kmh: None,
        }
    }

    #[test]
    fn event_indices_are_dense_across_stops() {
        let collector = collector();
        let journey_id = Id::from_name(uuid::Uuid::nil(), "journey");
        let rows = vec![
            row("Point One", None, Some("2026-07-31T10:00:00Z")),
            row("Point Two", Some("2026-07-31T10:30:00Z"), Some("2026-07-31T10:32:00Z")),
        ];

        let events = collector.build_events(journey_id, &rows);
        assert_eq!(events.len(), 3);
        let mut indices: Vec<u32> = events.iter().map(|e| e.event_index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn unknown_train_type_row_is_skipped() {
        let collector = collector();
        let journey_id = Id::from_name(uuid::Uuid::nil(), "journey");
        let mut bad_row = row("Point One", None, Some("2026-07-31T10:00:00Z"));
        bad_row.train_type = "QQ".into();

        let events = collector.build_events(journey_id, &[bad_row]);
        assert!(events.is_empty());
    }
}
