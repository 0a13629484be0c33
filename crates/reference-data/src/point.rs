use std::collections::HashMap;

use model::ids::Point;
use serde::Deserialize;
use utility::{geo::BoundingPolygon, id::Id};

use crate::ReferenceDataError;

#[derive(Debug, Clone, Deserialize)]
pub struct PointRecord {
    pub foreign_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub polygon: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct PointEntry {
    pub id: Id<Point>,
    pub foreign_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub playable_border: BoundingPolygon,
}

/// §4.2: point-by-internal-UUID, point-by-foreign-id, point-by-name,
/// point-by-containing-polygon.
pub struct PointIndex {
    by_id: HashMap<Id<Point>, PointEntry>,
    by_foreign_id: HashMap<String, Id<Point>>,
    by_name: HashMap<String, Id<Point>>,
}

impl PointIndex {
    pub fn build(records: Vec<PointRecord>) -> Result<Self, ReferenceDataError> {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut by_foreign_id = HashMap::with_capacity(records.len());
        let mut by_name = HashMap::with_capacity(records.len());

        for record in records {
            let id = Id::from_name(crate::POINT_NAMESPACE, &record.foreign_id);
            if by_foreign_id.contains_key(&record.foreign_id) {
                return Err(ReferenceDataError::DuplicateForeignId(record.foreign_id));
            }
            if by_name.contains_key(&record.name) {
                return Err(ReferenceDataError::DuplicateName(record.name));
            }
            if record.polygon.len() < 3 {
                return Err(ReferenceDataError::InvalidPolygon(record.foreign_id));
            }
            let polygon = BoundingPolygon::new(record.polygon.clone());
            let entry = PointEntry {
                id,
                foreign_id: record.foreign_id.clone(),
                name: record.name.clone(),
                latitude: record.latitude,
                longitude: record.longitude,
                playable_border: polygon,
            };
            by_foreign_id.insert(record.foreign_id, id);
            by_name.insert(record.name, id);
            by_id.insert(id, entry);
        }

        Ok(Self {
            by_id,
            by_foreign_id,
            by_name,
        })
    }

    pub fn by_id(&self, id: Id<Point>) -> Option<&PointEntry> {
        self.by_id.get(&id)
    }

    pub fn by_foreign_id(&self, foreign_id: &str) -> Option<&PointEntry> {
        self.by_foreign_id
            .get(foreign_id)
            .and_then(|id| self.by_id.get(id))
    }

    pub fn by_name(&self, name: &str) -> Option<&PointEntry> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    /// §4.2 point-by-containing-polygon: the "playable border" test used by
    /// §3's `in_playable_border` invariant. Linear scan — point counts are
    /// small (hundreds) and this only runs once per event per tick.
    pub fn containing_point(&self, latitude: f64, longitude: f64) -> Option<&PointEntry> {
        self.by_id
            .values()
            .find(|entry| entry.playable_border.contains_point(latitude, longitude))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(foreign_id: &str, name: &str) -> PointRecord {
        PointRecord {
            foreign_id: foreign_id.into(),
            name: name.into(),
            latitude: 0.5,
            longitude: 0.5,
            polygon: vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)],
        }
    }

    #[test]
    fn rejects_duplicate_foreign_id() {
        let records = vec![square("a", "A"), square("a", "B")];
        assert!(matches!(
            PointIndex::build(records),
            Err(ReferenceDataError::DuplicateForeignId(_))
        ));
    }

    #[test]
    fn rejects_duplicate_name() {
        let records = vec![square("a", "A"), square("b", "A")];
        assert!(matches!(
            PointIndex::build(records),
            Err(ReferenceDataError::DuplicateName(_))
        ));
    }

    #[test]
    fn finds_point_containing_coordinate() {
        let index = PointIndex::build(vec![square("a", "A")]).unwrap();
        let found = index.containing_point(0.5, 0.5).unwrap();
        assert_eq!(found.foreign_id, "a");
        assert!(index.containing_point(5.0, 5.0).is_none());
    }
}
