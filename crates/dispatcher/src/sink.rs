use async_trait::async_trait;
use collector::position_frame::{PositionFrame, PositionFrameSink};
use utility::patch::Patch;

use crate::frame::{self, UpdateType};
use crate::Dispatcher;

/// Bridges the active-train collector's per-tick telemetry into the
/// dispatcher's fan-out. Every present field is treated as a change: the
/// collector only calls `emit` once per tick per journey, so there is no
/// cheaper way to tell "unchanged since last tick" apart from "just learned
/// this" at this layer without re-deriving the dirty tracker's own state.
#[async_trait]
impl PositionFrameSink for Dispatcher {
    async fn emit(&self, frame: PositionFrame) {
        let position = match (frame.latitude, frame.longitude) {
            (Some(lat), Some(lon)) => Patch::Value((lat, lon)),
            _ => Patch::Unchanged,
        };
        let speed_kmh = frame.speed_kmh.map(|v| v.round().max(0.0) as u32);

        let wire = frame::journey_update_frame(
            frame.journey_id,
            frame.server_id,
            UpdateType::Update,
            frame.driver_id.map(Patch::Value).unwrap_or(Patch::Unchanged),
            frame.next_signal.map(Patch::Value).unwrap_or(Patch::Unchanged),
            speed_kmh.map(Patch::Value).unwrap_or(Patch::Unchanged),
            position,
            false,
        );

        self.publish_journey_update(frame.server_id, wire).await;
    }
}
