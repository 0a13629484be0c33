use std::collections::HashMap;

use model::ids::{Point, Signal};
use serde::Deserialize;
use utility::id::Id;

use crate::ReferenceDataError;

#[derive(Debug, Clone, Deserialize)]
pub struct SignalRecord {
    pub point_foreign_id: String,
    pub signal_id: String,
    pub platform: Option<String>,
    pub track: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SignalEntry {
    pub id: Id<Signal>,
    pub point_id: Id<Point>,
    pub signal_id: String,
    pub platform: Option<String>,
    pub track: Option<String>,
}

/// §4.2 signal-by-(point-id, signal-id); used by the reconciler's
/// `ForSignalUpdate` handling (§4.5) to resolve a (platform, track) pair.
pub struct SignalIndex {
    by_key: HashMap<(Id<Point>, String), SignalEntry>,
}

impl SignalIndex {
    pub fn build(
        records: Vec<SignalRecord>,
        points: &crate::point::PointIndex,
    ) -> Result<Self, ReferenceDataError> {
        let mut by_key = HashMap::with_capacity(records.len());
        for record in records {
            let point = points
                .by_foreign_id(&record.point_foreign_id)
                .ok_or_else(|| ReferenceDataError::UnknownPoint(record.point_foreign_id.clone()))?;
            let key = (point.id, record.signal_id.clone());
            if by_key.contains_key(&key) {
                return Err(ReferenceDataError::DuplicateSignal(
                    record.point_foreign_id,
                    record.signal_id,
                ));
            }
            let id = Id::from_name(
                crate::SIGNAL_NAMESPACE,
                &format!("{}:{}", record.point_foreign_id, record.signal_id),
            );
            by_key.insert(
                key,
                SignalEntry {
                    id,
                    point_id: point.id,
                    signal_id: record.signal_id,
                    platform: record.platform,
                    track: record.track,
                },
            );
        }
        Ok(Self { by_key })
    }

    pub fn resolve(&self, point_id: Id<Point>, signal_id: &str) -> Option<&SignalEntry> {
        self.by_key.get(&(point_id, signal_id.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
