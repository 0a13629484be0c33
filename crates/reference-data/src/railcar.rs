use std::collections::HashMap;

use model::ids::Railcar;
use serde::Deserialize;
use utility::id::Id;

use crate::ReferenceDataError;

#[derive(Debug, Clone, Deserialize)]
pub struct RailcarRecord {
    pub api_id: String,
    pub name: String,
    pub max_speed_kmh: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RailcarEntry {
    pub id: Id<Railcar>,
    pub api_id: String,
    pub name: String,
    pub max_speed_kmh: Option<u32>,
}

/// §4.2 railcar-by-id / by-api-id.
pub struct RailcarIndex {
    by_id: HashMap<Id<Railcar>, RailcarEntry>,
    by_api_id: HashMap<String, Id<Railcar>>,
}

impl RailcarIndex {
    pub fn build(records: Vec<RailcarRecord>) -> Result<Self, ReferenceDataError> {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut by_api_id = HashMap::with_capacity(records.len());
        for record in records {
            if by_api_id.contains_key(&record.api_id) {
                return Err(ReferenceDataError::DuplicateRailcarApiId(record.api_id));
            }
            let id = Id::from_name(crate::RAILCAR_NAMESPACE, &record.api_id);
            by_api_id.insert(record.api_id.clone(), id);
            by_id.insert(
                id,
                RailcarEntry {
                    id,
                    api_id: record.api_id,
                    name: record.name,
                    max_speed_kmh: record.max_speed_kmh,
                },
            );
        }
        Ok(Self { by_id, by_api_id })
    }

    pub fn by_id(&self, id: Id<Railcar>) -> Option<&RailcarEntry> {
        self.by_id.get(&id)
    }

    pub fn by_api_id(&self, api_id: &str) -> Option<&RailcarEntry> {
        self.by_api_id
            .get(api_id)
            .and_then(|id| self.by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
