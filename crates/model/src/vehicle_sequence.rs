use chrono::{DateTime, Utc};
use utility::id::Id;

use crate::{
    ids::{Journey, Point, Railcar, VehicleSequence},
    TransportCategory,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleSequenceStatus {
    Prediction,
    Real,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RailcarRef {
    pub railcar_id: Id<Railcar>,
    pub load_percent: Option<u8>,
    pub named_locomotive: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSequenceEntity {
    pub id: Id<VehicleSequence>,
    pub journey_id: Id<Journey>,
    pub status: VehicleSequenceStatus,
    pub railcars: Vec<RailcarRef>,
    pub resolve_key: SequenceResolveKey,
}

/// GLOSSARY "sequence resolve key": `category‖number‖origin‖destination‖
/// scheduled-departure`, stable across runs of the same scheduled slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceResolveKey {
    pub category: TransportCategory,
    pub number: String,
    pub origin_point_id: Id<Point>,
    pub destination_point_id: Id<Point>,
    pub scheduled_departure: DateTime<Utc>,
}

impl SequenceResolveKey {
    pub fn as_string(&self) -> String {
        format!(
            "{:?}\u{2016}{}\u{2016}{}\u{2016}{}\u{2016}{}",
            self.category,
            self.number,
            self.origin_point_id,
            self.destination_point_id,
            self.scheduled_departure.to_rfc3339(),
        )
    }
}

impl VehicleSequenceEntity {
    /// UUIDv7 per §3: time-ordered, generated fresh — vehicle sequences are
    /// not identified by upstream content, only carried forward by
    /// `resolve_key`.
    pub fn new_id() -> Id<VehicleSequence> {
        Id::new(uuid::Uuid::now_v7())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_key_is_stable_for_same_slot() {
        let departure = Utc::now();
        let origin = Id::from_name(uuid::Uuid::nil(), "origin");
        let destination = Id::from_name(uuid::Uuid::nil(), "destination");
        let a = SequenceResolveKey {
            category: TransportCategory::Regional,
            number: "123".into(),
            origin_point_id: origin,
            destination_point_id: destination,
            scheduled_departure: departure,
        };
        let b = SequenceResolveKey {
            category: TransportCategory::Regional,
            number: "123".into(),
            origin_point_id: origin,
            destination_point_id: destination,
            scheduled_departure: departure,
        };
        assert_eq!(a.as_string(), b.as_string());
    }
}
