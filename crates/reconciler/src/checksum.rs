use model::journey::JourneyAggregate;
use model::journey_event::{EventType, PrecisionType, StopType};
use sha2::{Digest, Sha256};

/// Canonical checksum of everything that would appear on the wire for a
/// journey, so a reconciliation pass that produced no observable change
/// can be suppressed before it reaches the dispatcher (§8 property 4:
/// feeding the same upstream input twice yields zero frames the second
/// time). Fields are written in a fixed order and separated by `\u{1f}`
/// (unit separator) so no value can forge a boundary by containing the
/// separator.
pub fn journey_checksum(aggregate: &JourneyAggregate) -> String {
    let mut hasher = Sha256::new();
    let journey = &aggregate.journey;

    write_field(&mut hasher, &journey.id.to_string());
    write_field(&mut hasher, &journey.foreign_run_id);
    write_field(&mut hasher, &journey.cancelled.to_string());
    write_field(&mut hasher, &opt_string(journey.last_seen_time.map(|t| t.to_rfc3339())));
    write_field(
        &mut hasher,
        &opt_string(journey.continuation_journey_id.map(|id| id.to_string())),
    );

    let mut events: Vec<_> = aggregate.events.iter().collect();
    events.sort_by_key(|e| e.ordering_key());

    for event in events {
        write_field(&mut hasher, &event.event_index.to_string());
        write_field(&mut hasher, event_type_tag(event.event_type));
        write_field(&mut hasher, &opt_string(event.point_id.map(|id| id.to_string())));
        write_field(&mut hasher, precision_tag(event.precision_type));
        write_field(&mut hasher, &opt_string(event.realtime_local_time.map(|t| t.to_rfc3339())));
        write_field(&mut hasher, &opt_string(event.realtime_platform.clone()));
        write_field(&mut hasher, &opt_string(event.realtime_track.clone()));
        write_field(&mut hasher, stop_type_tag(event.stop_type));
        write_field(&mut hasher, &event.cancelled.to_string());
    }

    format!("{:x}", hasher.finalize())
}

fn write_field(hasher: &mut Sha256, value: &str) {
    hasher.update(value.as_bytes());
    hasher.update([0x1f]);
}

fn opt_string(value: Option<String>) -> String {
    value.unwrap_or_default()
}

fn event_type_tag(event_type: EventType) -> &'static str {
    match event_type {
        EventType::Arrival => "ARRIVAL",
        EventType::Departure => "DEPARTURE",
    }
}

fn precision_tag(precision_type: PrecisionType) -> &'static str {
    match precision_type {
        PrecisionType::Schedule => "SCHEDULE",
        PrecisionType::Prediction => "PREDICTION",
        PrecisionType::Real => "REAL",
    }
}

fn stop_type_tag(stop_type: StopType) -> &'static str {
    match stop_type {
        StopType::None => "NONE",
        StopType::NonPassenger => "NON_PASSENGER",
        StopType::Passenger => "PASSENGER",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        ids::{Journey, Server},
        journey::JourneyEntity,
    };
    use utility::id::Id;
    use uuid::Uuid;

    fn aggregate(cancelled: bool) -> JourneyAggregate {
        JourneyAggregate {
            journey: JourneyEntity {
                id: Id::<Journey>::from_name(Uuid::nil(), "run-1"),
                server_id: Id::<Server>::from_name(Uuid::nil(), "srv"),
                foreign_run_id: "run-1".into(),
                first_seen_time: None,
                last_seen_time: None,
                cancelled,
                continuation_journey_id: None,
            },
            events: Vec::new(),
            vehicle_sequence: None,
        }
    }

    #[test]
    fn identical_aggregates_checksum_equal() {
        assert_eq!(journey_checksum(&aggregate(false)), journey_checksum(&aggregate(false)));
    }

    #[test]
    fn cancellation_flip_changes_checksum() {
        assert_ne!(journey_checksum(&aggregate(false)), journey_checksum(&aggregate(true)));
    }
}
