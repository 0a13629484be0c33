use chrono::{DateTime, Utc};
use utility::id::Id;

use crate::{ids::Server, Region};

/// A simulated dispatch-and-signalling server. Online state is deliberately
/// absent here — it lives only in the versioned cache (§3 "A server's online
/// state is not persisted").
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEntity {
    pub id: Id<Server>,
    pub code: String,
    pub region: Region,
    pub scenery: String,
    pub utc_offset_hours: i8,
    pub spoken_language: String,
    pub tags: Vec<String>,
    pub deleted: bool,
    pub registered_since: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl ServerEntity {
    pub fn id_for(foreign_id: &str) -> Id<Server> {
        Id::from_name(crate::SERVER_NAMESPACE, foreign_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_for_is_deterministic() {
        let a = ServerEntity::id_for("6390db9a9401bed7d6409dbb");
        let b = ServerEntity::id_for("6390db9a9401bed7d6409dbb");
        assert_eq!(a, b);
    }
}
