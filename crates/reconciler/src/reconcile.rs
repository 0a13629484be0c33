use chrono::{DateTime, Utc};
use model::{
    ids::Point,
    journey::JourneyAggregate,
    journey_event::{JourneyEventEntity, PrecisionType, StopType},
};
use utility::id::Id;

use crate::request::{JourneyEventUpdateRequest, NextSignalObservation};

/// Resolves a (platform, track) pair for a point + signal id, backed by
/// `reference-data`'s signal index at call sites. Kept as a trait here so
/// the reconciler does not need to depend on the crate that owns the full
/// static index.
pub trait SignalResolver {
    fn resolve(&self, point_id: Id<Point>, signal_id: &str) -> Option<(String, String)>;
}

/// Outcome of applying one `JourneyEventUpdateRequest` to an aggregate: what
/// changed, for the dirty tracker and the frame builder to act on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationOutcome {
    pub event_updated: bool,
    pub next_signal: Option<NextSignalObservation>,
    pub journey_cancelled_changed: bool,
}

/// The highest `event_index` whose realtime time type has reached `REAL` —
/// this system's stand-in for "where the run currently is along the route",
/// derived from event state rather than stored separately (§3 lists no
/// extra Journey field for it).
pub fn last_reached_index(events: &[JourneyEventEntity]) -> Option<u32> {
    events
        .iter()
        .filter(|e| e.precision_type == PrecisionType::Real)
        .map(|e| e.event_index)
        .max()
}

pub fn apply_request(
    aggregate: &mut JourneyAggregate,
    request: JourneyEventUpdateRequest,
    server_now: DateTime<Utc>,
    resolver: &dyn SignalResolver,
) -> ReconciliationOutcome {
    match request {
        JourneyEventUpdateRequest::ForPointChange { prev, current, next_signal } => {
            apply_point_change(aggregate, prev, current, next_signal, server_now)
        }
        JourneyEventUpdateRequest::ForSignalUpdate { current, next_signal_id } => {
            apply_signal_update(aggregate, current, &next_signal_id, resolver)
        }
        JourneyEventUpdateRequest::ForRemoval => apply_removal(aggregate, server_now),
    }
}

fn apply_point_change(
    aggregate: &mut JourneyAggregate,
    prev: Option<Id<Point>>,
    current: Option<Id<Point>>,
    next_signal: Option<NextSignalObservation>,
    server_now: DateTime<Utc>,
) -> ReconciliationOutcome {
    let start_index = last_reached_index(&aggregate.events);
    let mut event_updated = false;

    if let Some(prev_point) = prev {
        if let Some(event) = aggregate.events.iter_mut().find(|e| {
            e.event_type == model::journey_event::EventType::Departure && e.point_id == Some(prev_point)
        }) {
            if event.may_overwrite_realtime() {
                event.realtime_local_time = Some(server_now);
                event.precision_type = PrecisionType::Real;
                event_updated = true;
            }
        }
    }

    let mut reached_index = None;
    if let Some(current_point) = current {
        let scan_from = start_index.unwrap_or(0);
        if let Some(event) = aggregate
            .events
            .iter_mut()
            .find(|e| e.event_index >= scan_from && e.point_id == Some(current_point))
        {
            if event.may_overwrite_realtime() {
                event.realtime_local_time = Some(server_now);
                event.precision_type = PrecisionType::Real;
                event_updated = true;
            }
            reached_index = Some(event.event_index);
        }
    }

    if let (Some(from), Some(to)) = (start_index, reached_index) {
        if reproject_between(&mut aggregate.events, from, to) {
            event_updated = true;
        }
    }

    let next_signal = next_signal.filter(NextSignalObservation::within_range);

    ReconciliationOutcome {
        event_updated,
        next_signal,
        journey_cancelled_changed: false,
    }
}

/// Re-projects events strictly between `from` and `to` as `PREDICTION`,
/// spreading the elapsed wall-clock time since `from` evenly across the
/// skipped stops (§4.5 "average run-rate"). Never touches an event that has
/// already reached `REAL`.
fn reproject_between(events: &mut [JourneyEventEntity], from: u32, to: u32) -> bool {
    if to <= from + 1 {
        return false;
    }
    let from_event = events.iter().find(|e| e.event_index == from).cloned();
    let to_event = events.iter().find(|e| e.event_index == to).cloned();
    let (Some(from_event), Some(to_event)) = (from_event, to_event) else {
        return false;
    };
    let from_time = from_event.realtime_local_time.unwrap_or(from_event.scheduled_local_time);
    let to_time = to_event.realtime_local_time.unwrap_or(to_event.scheduled_local_time);
    let span = to_time - from_time;
    let steps = (to - from) as i32;

    let mut changed = false;
    for event in events.iter_mut() {
        if event.event_index <= from || event.event_index >= to {
            continue;
        }
        if !event.may_overwrite_realtime() {
            continue;
        }
        let step = (event.event_index - from) as i32;
        let fraction = step as f64 / steps as f64;
        let offset = chrono::Duration::milliseconds((span.num_milliseconds() as f64 * fraction) as i64);
        event.realtime_local_time = Some(from_time + offset);
        event.precision_type = PrecisionType::Prediction;
        changed = true;
    }
    changed
}

fn apply_signal_update(
    aggregate: &mut JourneyAggregate,
    current: Id<Point>,
    next_signal_id: &str,
    resolver: &dyn SignalResolver,
) -> ReconciliationOutcome {
    let Some((platform, track)) = resolver.resolve(current, next_signal_id) else {
        return ReconciliationOutcome::default();
    };
    let event = aggregate
        .events
        .iter_mut()
        .find(|e| e.point_id == Some(current) && e.stop_type == StopType::Passenger);

    let Some(event) = event else {
        return ReconciliationOutcome::default();
    };
    event.realtime_platform = Some(platform);
    event.realtime_track = Some(track);

    ReconciliationOutcome {
        event_updated: true,
        next_signal: None,
        journey_cancelled_changed: false,
    }
}

/// §4.5 ForRemoval: infer cancellation for events that were scheduled but
/// never happened, and decide whether the whole journey should be flagged.
fn apply_removal(aggregate: &mut JourneyAggregate, server_now: DateTime<Utc>) -> ReconciliationOutcome {
    aggregate.journey.last_seen_time = Some(server_now);

    for event in aggregate.events.iter_mut() {
        if event.in_playable_border && event.scheduled_local_time >= server_now {
            event.cancelled = true;
        }
    }

    let first_playable = aggregate
        .events
        .iter()
        .filter(|e| e.in_playable_border)
        .min_by_key(|e| e.event_index);

    let was_cancelled = aggregate.journey.cancelled;
    let new_cancelled = match first_playable {
        Some(first) if first.realtime_local_time.is_none() => true,
        Some(_) => aggregate
            .events
            .iter()
            .filter(|e| e.in_playable_border)
            .all(|e| e.cancelled),
        None => false,
    };
    aggregate.journey.cancelled = new_cancelled;

    ReconciliationOutcome {
        event_updated: false,
        next_signal: None,
        journey_cancelled_changed: was_cancelled != new_cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        ids::{Journey, JourneyEvent},
        journey::JourneyEntity,
        journey_event::{EventType, TransportDescriptor},
        TransportCategory,
    };
    use uuid::Uuid;

    struct NoSignals;
    impl SignalResolver for NoSignals {
        fn resolve(&self, _point_id: Id<Point>, _signal_id: &str) -> Option<(String, String)> {
            None
        }
    }

    fn event(index: u32, playable: bool, cancelled: bool, scheduled_offset_mins: i64) -> JourneyEventEntity {
        let base = chrono::DateTime::parse_from_rfc3339("2026-07-31T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        JourneyEventEntity {
            id: Id::from_name(Uuid::nil(), &format!("e{index}")),
            journey_id: Id::from_name(Uuid::nil(), "run-1"),
            event_index: index,
            event_type: EventType::Arrival,
            point_id: None,
            in_playable_border: playable,
            scheduled_local_time: base + chrono::Duration::minutes(scheduled_offset_mins),
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
            cancelled,
            additional: false,
        }
    }

    fn aggregate(events: Vec<JourneyEventEntity>, cancelled: bool) -> JourneyAggregate {
        JourneyAggregate {
            journey: JourneyEntity {
                id: Id::<Journey>::from_name(Uuid::nil(), "run-1"),
                server_id: Id::from_name(Uuid::nil(), "srv"),
                foreign_run_id: "run-1".into(),
                first_seen_time: Some(Utc::now()),
                last_seen_time: None,
                cancelled,
                continuation_journey_id: None,
            },
            events,
            vehicle_sequence: None,
        }
    }

    #[test]
    fn s6_future_events_cancelled_journey_not() {
        let now = chrono::DateTime::parse_from_rfc3339("2026-07-31T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut events = vec![
            event(0, true, false, -30),
            event(1, true, false, -10),
            event(2, true, false, 40),
            event(3, true, false, 60),
        ];
        events[0].realtime_local_time = Some(events[0].scheduled_local_time);
        events[0].precision_type = PrecisionType::Real;
        events[1].realtime_local_time = Some(events[1].scheduled_local_time);
        events[1].precision_type = PrecisionType::Real;

        let mut agg = aggregate(events, false);
        let outcome = apply_request(&mut agg, JourneyEventUpdateRequest::ForRemoval, now, &NoSignals);

        assert!(agg.events[2].cancelled);
        assert!(agg.events[3].cancelled);
        assert!(!agg.journey.cancelled);
        assert!(!outcome.journey_cancelled_changed);
    }

    #[test]
    fn s6_all_future_events_cancels_whole_journey() {
        let now = chrono::DateTime::parse_from_rfc3339("2026-07-31T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let events = vec![
            event(0, true, false, 10),
            event(1, true, false, 20),
            event(2, true, false, 30),
            event(3, true, false, 40),
        ];
        let mut agg = aggregate(events, false);
        apply_request(&mut agg, JourneyEventUpdateRequest::ForRemoval, now, &NoSignals);

        assert!(agg.journey.cancelled);
    }

    #[test]
    fn signal_update_only_touches_matching_event() {
        struct OneSignal;
        impl SignalResolver for OneSignal {
            fn resolve(&self, _point_id: Id<Point>, signal_id: &str) -> Option<(String, String)> {
                (signal_id == "S1").then(|| ("3".to_string(), "B".to_string()))
            }
        }

        let point = Id::<Point>::from_name(Uuid::nil(), "point-a");
        let mut events = vec![event(0, true, false, 0), event(1, true, false, 10)];
        events[0].point_id = Some(point);

        let mut agg = aggregate(events, false);
        let outcome = apply_request(
            &mut agg,
            JourneyEventUpdateRequest::ForSignalUpdate { current: point, next_signal_id: "S1".into() },
            Utc::now(),
            &OneSignal,
        );

        assert!(outcome.event_updated);
        assert_eq!(agg.events[0].realtime_platform.as_deref(), Some("3"));
        assert_eq!(agg.events[1].realtime_platform, None);
    }
}
