use std::sync::Arc;

use model::ids::Point;
use reconciler::SignalResolver;
use reference_data::SignalIndex;
use utility::id::Id;

/// Adapts the static reference-data signal index to the trait the
/// reconciler depends on, so the reconciler crate never needs to know
/// `reference-data` exists.
pub struct ReferenceDataSignalResolver {
    signals: Arc<SignalIndex>,
}

impl ReferenceDataSignalResolver {
    pub fn new(signals: Arc<SignalIndex>) -> Self {
        Self { signals }
    }
}

impl SignalResolver for ReferenceDataSignalResolver {
    fn resolve(&self, point_id: Id<Point>, signal_id: &str) -> Option<(String, String)> {
        let entry = self.signals.resolve(point_id, signal_id)?;
        Some((entry.platform.clone()?, entry.track.clone()?))
    }
}
