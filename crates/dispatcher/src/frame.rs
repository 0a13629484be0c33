//! Conversions from domain types (dirty-tracked `Patch<T>`, the reconciler's
//! `NextSignalObservation`) into the wire frame types generated from
//! `proto/sit_events.proto`.

use model::ids::{DispatchPost, Journey, Server};
use reconciler::NextSignalObservation;
use utility::id::Id;
use utility::patch::Patch;

pub mod proto {
    tonic::include_proto!("sit.events.v1");
}

pub use proto::UpdateType;

/// Builds a `JourneyUpdateFrame` from per-field patches. A field whose patch
/// is `Patch::Unchanged` is left absent on the wire frame.
#[allow(clippy::too_many_arguments)]
pub fn journey_update_frame(
    journey_id: Id<Journey>,
    server_id: Id<Server>,
    update_type: UpdateType,
    driver_id: Patch<String>,
    next_signal: Patch<NextSignalObservation>,
    speed_kmh: Patch<u32>,
    position: Patch<(f64, f64)>,
    event_updated: bool,
) -> proto::JourneyUpdateFrame {
    proto::JourneyUpdateFrame {
        journey_id: journey_id.to_string(),
        server_id: server_id.to_string(),
        update_type: update_type as i32,
        driver_id: match driver_id {
            Patch::Unchanged => None,
            Patch::Cleared => Some(proto::StringUpdate { cleared: true, value: String::new() }),
            Patch::Value(v) => Some(proto::StringUpdate { cleared: false, value: v }),
        },
        next_signal: match next_signal {
            Patch::Unchanged => None,
            Patch::Cleared => Some(proto::NextSignalUpdate { out_of_range: true, name: String::new(), distance_m: 0.0, speed_limit_kmh: None }),
            Patch::Value(observation) if !observation.within_range() => {
                Some(proto::NextSignalUpdate { out_of_range: true, name: String::new(), distance_m: 0.0, speed_limit_kmh: None })
            }
            Patch::Value(observation) => Some(proto::NextSignalUpdate {
                out_of_range: false,
                name: observation.signal_id,
                distance_m: observation.distance_m,
                speed_limit_kmh: observation.speed_limit_kmh,
            }),
        },
        speed_kmh: match speed_kmh {
            Patch::Unchanged | Patch::Cleared => None,
            Patch::Value(v) => Some(v),
        },
        position: match position {
            Patch::Unchanged | Patch::Cleared => None,
            Patch::Value((latitude, longitude)) => Some(proto::Position { latitude, longitude }),
        },
        event_updated,
    }
}

pub fn server_update_frame(
    server_id: Id<Server>,
    update_type: UpdateType,
    online: Patch<bool>,
    zone_offset: Patch<String>,
    utc_offset_hours: Patch<i8>,
    server_scenery: Patch<String>,
) -> proto::ServerUpdateFrame {
    proto::ServerUpdateFrame {
        server_id: server_id.to_string(),
        update_type: update_type as i32,
        online: match online {
            Patch::Unchanged | Patch::Cleared => None,
            Patch::Value(v) => Some(v),
        },
        zone_offset: match zone_offset {
            Patch::Unchanged | Patch::Cleared => None,
            Patch::Value(v) => Some(v),
        },
        utc_offset_hours: match utc_offset_hours {
            Patch::Unchanged | Patch::Cleared => None,
            Patch::Value(v) => Some(v as i32),
        },
        server_scenery: match server_scenery {
            Patch::Unchanged | Patch::Cleared => None,
            Patch::Value(v) => Some(v),
        },
    }
}

pub fn dispatch_post_update_frame(
    post_id: Id<DispatchPost>,
    server_id: Id<Server>,
    update_type: UpdateType,
    dispatcher_ids: Vec<String>,
) -> proto::DispatchPostUpdateFrame {
    proto::DispatchPostUpdateFrame {
        post_id: post_id.to_string(),
        server_id: server_id.to_string(),
        update_type: update_type as i32,
        dispatcher_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journey() -> Id<Journey> {
        Id::from_name(uuid::Uuid::nil(), "journey")
    }

    fn server() -> Id<Server> {
        Id::from_name(uuid::Uuid::nil(), "server")
    }

    #[test]
    fn unchanged_fields_are_absent_on_the_wire() {
        let frame = journey_update_frame(
            journey(),
            server(),
            UpdateType::Update,
            Patch::Unchanged,
            Patch::Unchanged,
            Patch::Unchanged,
            Patch::Unchanged,
            false,
        );
        assert!(frame.driver_id.is_none());
        assert!(frame.next_signal.is_none());
        assert!(frame.speed_kmh.is_none());
        assert!(frame.position.is_none());
    }

    #[test]
    fn cleared_driver_id_is_a_present_wrapper_with_cleared_flag() {
        let frame = journey_update_frame(
            journey(),
            server(),
            UpdateType::Update,
            Patch::Cleared,
            Patch::Unchanged,
            Patch::Unchanged,
            Patch::Unchanged,
            false,
        );
        let wrapper = frame.driver_id.unwrap();
        assert!(wrapper.cleared);
        assert!(wrapper.value.is_empty());
    }

    #[test]
    fn out_of_range_signal_still_present_as_a_cleared_observation() {
        let far = NextSignalObservation { signal_id: "S1".into(), distance_m: 6_000.0, speed_limit_kmh: None };
        let frame = journey_update_frame(
            journey(),
            server(),
            UpdateType::Update,
            Patch::Unchanged,
            Patch::Value(far),
            Patch::Unchanged,
            Patch::Unchanged,
            false,
        );
        let wrapper = frame.next_signal.unwrap();
        assert!(wrapper.out_of_range);
    }
}
