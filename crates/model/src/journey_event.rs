use chrono::{DateTime, Utc};
use utility::id::Id;

use crate::{
    ids::{Journey, JourneyEvent, Point},
    TransportCategory,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Arrival,
    Departure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrecisionType {
    Schedule,
    Prediction,
    Real,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopType {
    None,
    NonPassenger,
    Passenger,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportDescriptor {
    pub category: TransportCategory,
    pub number: String,
    pub line: Option<String>,
    pub label: Option<String>,
    pub transport_type: String,
    pub max_speed_kmh: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JourneyEventEntity {
    pub id: Id<JourneyEvent>,
    pub journey_id: Id<Journey>,
    pub event_index: u32,
    pub event_type: EventType,
    pub point_id: Option<Id<Point>>,
    pub in_playable_border: bool,
    pub scheduled_local_time: DateTime<Utc>,
    pub realtime_local_time: Option<DateTime<Utc>>,
    pub precision_type: PrecisionType,
    pub transport: TransportDescriptor,
    pub stop_type: StopType,
    pub scheduled_platform: Option<String>,
    pub scheduled_track: Option<String>,
    pub realtime_platform: Option<String>,
    pub realtime_track: Option<String>,
    pub cancelled: bool,
    pub additional: bool,
}

impl JourneyEventEntity {
    /// Identity: UUIDv5 of (journey_id, event_index, event_type) per §3.
    pub fn id_for(journey_id: Id<Journey>, event_index: u32, event_type: EventType) -> Id<JourneyEvent> {
        let type_tag = match event_type {
            EventType::Arrival => "ARRIVAL",
            EventType::Departure => "DEPARTURE",
        };
        let name = format!("{journey_id}:{event_index}:{type_tag}");
        Id::from_name(crate::JOURNEY_EVENT_NAMESPACE, &name)
    }

    /// §4.5: the reconciler must never retro-mutate an event whose realtime
    /// time type has already reached `REAL`, except to flip `cancelled` via
    /// a later `ForRemoval`.
    pub fn may_overwrite_realtime(&self) -> bool {
        self.precision_type != PrecisionType::Real
    }

    /// §4.5 ordering/tie-break rule: ascending by `event_index`; within the
    /// same scheduled time, arrival precedes departure at the same point.
    pub fn ordering_key(&self) -> (u32, u8) {
        let type_rank = match self.event_type {
            EventType::Arrival => 0,
            EventType::Departure => 1,
        };
        (self.event_index, type_rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_for_distinguishes_arrival_and_departure_at_same_index() {
        let journey_id = Id::from_name(crate::JOURNEY_NAMESPACE, "run-1");
        let arrival = JourneyEventEntity::id_for(journey_id, 3, EventType::Arrival);
        let departure = JourneyEventEntity::id_for(journey_id, 3, EventType::Departure);
        assert_ne!(arrival, departure);
    }

    #[test]
    fn id_for_is_deterministic() {
        let journey_id = Id::from_name(crate::JOURNEY_NAMESPACE, "run-1");
        let a = JourneyEventEntity::id_for(journey_id, 3, EventType::Arrival);
        let b = JourneyEventEntity::id_for(journey_id, 3, EventType::Arrival);
        assert_eq!(a, b);
    }

    #[test]
    fn real_precision_blocks_overwrite() {
        let mut event = sample_event();
        event.precision_type = PrecisionType::Real;
        assert!(!event.may_overwrite_realtime());
        event.precision_type = PrecisionType::Prediction;
        assert!(event.may_overwrite_realtime());
    }

    fn sample_event() -> JourneyEventEntity {
        JourneyEventEntity {
            id: Id::from_name(crate::JOURNEY_EVENT_NAMESPACE, "x"),
            journey_id: Id::from_name(crate::JOURNEY_NAMESPACE, "run-1"),
            event_index: 0,
            event_type: EventType::Arrival,
            point_id: None,
            in_playable_border: true,
            scheduled_local_time: Utc::now(),
            realtime_local_time: None,
            precision_type: PrecisionType::Schedule,
            transport: TransportDescriptor {
                category: TransportCategory::Regional,
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
            cancelled: false,
            additional: false,
        }
    }
}
