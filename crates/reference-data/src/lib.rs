use std::{error, fmt};

use uuid::Uuid;

pub mod point;
pub mod railcar;
pub mod signal;

pub use point::{PointEntry, PointIndex, PointRecord};
pub use railcar::{RailcarEntry, RailcarIndex, RailcarRecord};
pub use signal::{SignalEntry, SignalIndex, SignalRecord};

/// Internal namespaces for reference-data ids. These are not part of the
/// upstream wire contract (points/signals/railcars are never referenced by
/// a caller outside this process by UUID, only by foreign id), so unlike
/// `model`'s namespaces they are not pinned by the external spec — only
/// required to be stable across a single process's lifetime, which a fixed
/// constant trivially satisfies.
pub const POINT_NAMESPACE: Uuid = Uuid::from_u128(0x1a2b3c4d_5e6f_4a7b_8c9d_0e1f2a3b4c5d);
pub const SIGNAL_NAMESPACE: Uuid = Uuid::from_u128(0x2b3c4d5e_6f7a_4b8c_9d0e_1f2a3b4c5d6e);
pub const RAILCAR_NAMESPACE: Uuid = Uuid::from_u128(0x3c4d5e6f_7a8b_4c9d_0e1f_2a3b4c5d6e7f);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceDataError {
    DuplicateForeignId(String),
    DuplicateName(String),
    DuplicateSignal(String, String),
    DuplicateRailcarApiId(String),
    UnknownPoint(String),
    InvalidPolygon(String),
    Load(String),
}

impl fmt::Display for ReferenceDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceDataError::DuplicateForeignId(id) => {
                write!(f, "duplicate point foreign id: {id}")
            }
            ReferenceDataError::DuplicateName(name) => write!(f, "duplicate point name: {name}"),
            ReferenceDataError::DuplicateSignal(point, signal) => {
                write!(f, "duplicate signal {signal} at point {point}")
            }
            ReferenceDataError::DuplicateRailcarApiId(id) => {
                write!(f, "duplicate railcar api id: {id}")
            }
            ReferenceDataError::UnknownPoint(id) => {
                write!(f, "signal references unknown point foreign id: {id}")
            }
            ReferenceDataError::InvalidPolygon(id) => {
                write!(f, "point {id} has a degenerate playable-border polygon")
            }
            ReferenceDataError::Load(message) => write!(f, "failed to load reference data: {message}"),
        }
    }
}

impl error::Error for ReferenceDataError {}

/// Loaded once at start-up, then shared read-only across every collector
/// and the reconciler (§4.2). Violation of any uniqueness property during
/// `load` is a start-up error, never a runtime one.
pub struct ReferenceDataProvider {
    pub points: PointIndex,
    pub signals: SignalIndex,
    pub railcars: RailcarIndex,
}

impl ReferenceDataProvider {
    pub fn load(
        point_records: Vec<PointRecord>,
        signal_records: Vec<SignalRecord>,
        railcar_records: Vec<RailcarRecord>,
    ) -> Result<Self, ReferenceDataError> {
        let points = PointIndex::build(point_records)?;
        let signals = SignalIndex::build(signal_records, &points)?;
        let railcars = RailcarIndex::build(railcar_records)?;
        Ok(Self {
            points,
            signals,
            railcars,
        })
    }

    pub fn load_from_json(
        points_json: &str,
        signals_json: &str,
        railcars_json: &str,
    ) -> Result<Self, ReferenceDataError> {
        let point_records: Vec<PointRecord> =
            serde_json::from_str(points_json).map_err(|e| ReferenceDataError::Load(e.to_string()))?;
        let signal_records: Vec<SignalRecord> = serde_json::from_str(signals_json)
            .map_err(|e| ReferenceDataError::Load(e.to_string()))?;
        let railcar_records: Vec<RailcarRecord> = serde_json::from_str(railcars_json)
            .map_err(|e| ReferenceDataError::Load(e.to_string()))?;
        Self::load(point_records, signal_records, railcar_records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_point(foreign_id: &str, name: &str) -> PointRecord {
        PointRecord {
            foreign_id: foreign_id.into(),
            name: name.into(),
            latitude: 0.5,
            longitude: 0.5,
            polygon: vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)],
        }
    }

    #[test]
    fn load_wires_signals_to_points() {
        let provider = ReferenceDataProvider::load(
            vec![square_point("p1", "Point One")],
            vec![SignalRecord {
                point_foreign_id: "p1".into(),
                signal_id: "S1".into(),
                platform: Some("1".into()),
                track: None,
            }],
            vec![],
        )
        .unwrap();
        let point = provider.points.by_foreign_id("p1").unwrap();
        let signal = provider.signals.resolve(point.id, "S1").unwrap();
        assert_eq!(signal.platform.as_deref(), Some("1"));
    }

    #[test]
    fn load_rejects_signal_for_unknown_point() {
        let result = ReferenceDataProvider::load(
            vec![],
            vec![SignalRecord {
                point_foreign_id: "missing".into(),
                signal_id: "S1".into(),
                platform: None,
                track: None,
            }],
            vec![],
        );
        assert!(matches!(result, Err(ReferenceDataError::UnknownPoint(_))));
    }
}
