use chrono::{DateTime, Utc};
use utility::id::Id;

use crate::{
    ids::{Journey, Server},
    journey_event::JourneyEventEntity,
    vehicle_sequence::VehicleSequenceEntity,
};

/// §4.5 journey reconciler state machine. `Unseen` has no persisted
/// representation — a journey row only exists once it has transitioned to
/// `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JourneyState {
    Active,
    Gone,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JourneyEntity {
    pub id: Id<Journey>,
    pub server_id: Id<Server>,
    pub foreign_run_id: String,
    pub first_seen_time: Option<DateTime<Utc>>,
    pub last_seen_time: Option<DateTime<Utc>>,
    pub cancelled: bool,
    pub continuation_journey_id: Option<Id<Journey>>,
}

impl JourneyEntity {
    pub fn id_for(run_id: &str) -> Id<Journey> {
        Id::from_name(crate::JOURNEY_NAMESPACE, run_id)
    }

    /// §3 invariant: `last_seen_time > first_seen_time` whenever both are set.
    pub fn seen_times_are_valid(&self) -> bool {
        match (self.first_seen_time, self.last_seen_time) {
            (Some(first), Some(last)) => last > first,
            _ => true,
        }
    }

    /// §8 property 6: cancelled iff every playable event is cancelled.
    pub fn cancellation_is_consistent(&self, events: &[JourneyEventEntity]) -> bool {
        let playable: Vec<&JourneyEventEntity> =
            events.iter().filter(|e| e.in_playable_border).collect();
        if playable.is_empty() {
            return true;
        }
        let all_cancelled = playable.iter().all(|e| e.cancelled);
        self.cancelled == all_cancelled
    }
}

/// A journey bundled with its ordered events and optional vehicle sequence —
/// the unit the reconciler reads and writes as one logical record (§4.9
/// `save_journey_with_events`).
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyAggregate {
    pub journey: JourneyEntity,
    pub events: Vec<JourneyEventEntity>,
    pub vehicle_sequence: Option<VehicleSequenceEntity>,
}

impl JourneyAggregate {
    /// §8 property 1: dense zero-based permutation of event indices.
    pub fn event_indices_are_dense(&self) -> bool {
        let mut indices: Vec<u32> = self.events.iter().map(|e| e.event_index).collect();
        indices.sort_unstable();
        indices.iter().enumerate().all(|(i, v)| *v == i as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journey_event::{EventType, PrecisionType, StopType, TransportDescriptor};

    fn event(index: u32, playable: bool, cancelled: bool) -> JourneyEventEntity {
        JourneyEventEntity {
            id: Id::from_name(crate::JOURNEY_EVENT_NAMESPACE, &format!("e{index}")),
            journey_id: JourneyEntity::id_for("run-1"),
            event_index: index,
            event_type: EventType::Arrival,
            point_id: None,
            in_playable_border: playable,
            scheduled_local_time: Utc::now(),
            realtime_local_time: None,
            precision_type: PrecisionType::Schedule,
            transport: TransportDescriptor {
                category: crate::TransportCategory::Regional,
                number: "1".into(),
                line: None,
                label: None,
                transport_type: "EMU".into(),
                max_speed_kmh: None,
            },
            stop_type: StopType::Passenger,
            scheduled_platform: None,
            scheduled_track: None,
            realtime_platform: None,
            realtime_track: None,
            cancelled,
            additional: false,
        }
    }

    #[test]
    fn cancellation_requires_all_playable_events_cancelled() {
        let journey = JourneyEntity {
            id: JourneyEntity::id_for("run-1"),
            server_id: Id::from_name(crate::SERVER_NAMESPACE, "srv"),
            foreign_run_id: "run-1".into(),
            first_seen_time: None,
            last_seen_time: None,
            cancelled: true,
            continuation_journey_id: None,
        };
        let events = vec![event(0, true, true), event(1, true, false)];
        assert!(!journey.cancellation_is_consistent(&events));

        let events = vec![event(0, true, true), event(1, true, true)];
        assert!(journey.cancellation_is_consistent(&events));
    }

    #[test]
    fn dense_event_indices() {
        let aggregate = JourneyAggregate {
            journey: JourneyEntity {
                id: JourneyEntity::id_for("run-1"),
                server_id: Id::from_name(crate::SERVER_NAMESPACE, "srv"),
                foreign_run_id: "run-1".into(),
                first_seen_time: None,
                last_seen_time: None,
                cancelled: false,
                continuation_journey_id: None,
            },
            events: vec![event(0, true, false), event(1, true, false), event(2, true, false)],
            vehicle_sequence: None,
        };
        assert!(aggregate.event_indices_are_dense());
    }
}
