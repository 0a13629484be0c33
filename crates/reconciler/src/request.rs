use model::ids::Point;
use utility::id::Id;

/// §4.5: how the journey reconciler learns about a live run each tick.
#[derive(Debug, Clone)]
pub enum JourneyEventUpdateRequest {
    ForPointChange {
        prev: Option<Id<Point>>,
        current: Option<Id<Point>>,
        next_signal: Option<NextSignalObservation>,
    },
    ForSignalUpdate {
        current: Id<Point>,
        next_signal_id: String,
    },
    ForRemoval,
}

/// Raw signal telemetry observed by the active-train collector. `None` from
/// the caller (rather than this struct) means "no signal within 5 km" per
/// §4.5 ("wrapper with null inner = signal out of range").
#[derive(Debug, Clone, PartialEq)]
pub struct NextSignalObservation {
    pub signal_id: String,
    pub distance_m: f64,
    pub speed_limit_kmh: Option<u32>,
}

impl NextSignalObservation {
    pub const RANGE_LIMIT_M: f64 = 5_000.0;

    /// §4.5: "nextSignal, if within 5 km, carries the upcoming signal's
    /// geometric distance". Beyond that, the caller should treat it as out
    /// of range (frame carries a present-but-null wrapper).
    pub fn within_range(&self) -> bool {
        self.distance_m <= Self::RANGE_LIMIT_M
    }
}
