use utility::id::Id;

use crate::ids::{DispatchPost, Point, Server};

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPostEntity {
    pub id: Id<DispatchPost>,
    pub server_id: Id<Server>,
    pub point_id: Option<Id<Point>>,
    pub latitude: f64,
    pub longitude: f64,
    pub difficulty: u8,
    pub image_urls: Vec<String>,
    pub deleted: bool,
}

impl DispatchPostEntity {
    pub fn id_for(foreign_id: &str) -> Id<DispatchPost> {
        Id::from_name(crate::DISPATCH_POST_NAMESPACE, foreign_id)
    }

    /// §3 "difficulty 1..5". Returns `false` for anything outside that
    /// closed range so callers can reject malformed upstream payloads.
    pub fn difficulty_is_valid(difficulty: u8) -> bool {
        (1..=5).contains(&difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_bounds() {
        assert!(!DispatchPostEntity::difficulty_is_valid(0));
        assert!(DispatchPostEntity::difficulty_is_valid(1));
        assert!(DispatchPostEntity::difficulty_is_valid(5));
        assert!(!DispatchPostEntity::difficulty_is_valid(6));
    }
}
