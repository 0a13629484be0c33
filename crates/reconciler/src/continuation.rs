use model::{ids::Journey, journey::JourneyAggregate};
use utility::id::Id;

/// §4.5 continuation chaining: a journey that ends by handing off to another
/// upstream run is linked rather than treated as two unrelated journeys.
/// A candidate matches when its first event starts where `source` left off
/// and it was not observed before `source` stopped being seen.
pub fn find_continuation(
    source: &JourneyAggregate,
    continues_as_run_id: &str,
    candidates: &[JourneyAggregate],
) -> Option<Id<Journey>> {
    let source_last_point = source
        .events
        .iter()
        .max_by_key(|e| e.ordering_key())
        .and_then(|e| e.point_id)?;

    candidates
        .iter()
        .find(|candidate| {
            candidate.journey.foreign_run_id == continues_as_run_id
                && candidate
                    .events
                    .iter()
                    .min_by_key(|e| e.ordering_key())
                    .and_then(|e| e.point_id)
                    == Some(source_last_point)
                && matches_seen_order(source, candidate)
        })
        .map(|candidate| candidate.journey.id)
}

fn matches_seen_order(source: &JourneyAggregate, candidate: &JourneyAggregate) -> bool {
    match (source.journey.last_seen_time, candidate.journey.first_seen_time) {
        (Some(last), Some(first)) => first >= last,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        ids::{Journey, Point, Server},
        journey::JourneyEntity,
        journey_event::{EventType, JourneyEventEntity, PrecisionType, StopType, TransportDescriptor},
        TransportCategory,
    };
    use chrono::Utc;
    use uuid::Uuid;

    fn point(name: &str) -> Id<Point> {
        Id::from_name(Uuid::nil(), name)
    }

    fn event(index: u32, point_id: Id<Point>) -> JourneyEventEntity {
        JourneyEventEntity {
            id: Id::from_name(Uuid::nil(), &format!("e{index}")),
            journey_id: Id::<Journey>::from_name(Uuid::nil(), "x"),
            event_index: index,
            event_type: EventType::Arrival,
            point_id: Some(point_id),
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

    fn aggregate(run_id: &str, events: Vec<JourneyEventEntity>, last_seen: Option<chrono::DateTime<Utc>>, first_seen: Option<chrono::DateTime<Utc>>) -> JourneyAggregate {
        JourneyAggregate {
            journey: JourneyEntity {
                id: Id::<Journey>::from_name(Uuid::nil(), run_id),
                server_id: Id::<Server>::from_name(Uuid::nil(), "srv"),
                foreign_run_id: run_id.into(),
                first_seen_time: first_seen,
                last_seen_time: last_seen,
                cancelled: false,
                continuation_journey_id: None,
            },
            events,
            vehicle_sequence: None,
        }
    }

    #[test]
    fn links_candidate_starting_where_source_ended() {
        let shared_point = point("junction");
        let source = aggregate("run-1", vec![event(0, point("origin")), event(1, shared_point)], Some(Utc::now()), None);
        let candidate = aggregate("run-2", vec![event(0, shared_point)], None, Some(Utc::now()));

        let result = find_continuation(&source, "run-2", &[candidate.clone()]);
        assert_eq!(result, Some(candidate.journey.id));
    }

    #[test]
    fn rejects_candidate_starting_elsewhere() {
        let source = aggregate("run-1", vec![event(0, point("origin")), event(1, point("junction"))], Some(Utc::now()), None);
        let candidate = aggregate("run-2", vec![event(0, point("elsewhere"))], None, Some(Utc::now()));

        assert_eq!(find_continuation(&source, "run-2", &[candidate]), None);
    }
}
