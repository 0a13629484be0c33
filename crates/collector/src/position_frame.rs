use model::ids::{Journey, Server};
use reconciler::NextSignalObservation;
use utility::id::Id;

/// The sparse, ephemeral position telemetry the active-train collector
/// hands off every tick (§4.4, §6). This is not persisted — only the
/// dispatcher's frame builder consumes it.
#[derive(Debug, Clone)]
pub struct PositionFrame {
    pub server_id: Id<Server>,
    pub journey_id: Id<Journey>,
    pub speed_kmh: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub driver_id: Option<String>,
    pub next_signal: Option<NextSignalObservation>,
}

#[async_trait::async_trait]
pub trait PositionFrameSink: Send + Sync {
    async fn emit(&self, frame: PositionFrame);
}
