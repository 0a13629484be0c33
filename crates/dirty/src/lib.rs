use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};

pub mod field;

pub use field::{Field, IntoPatchValue};

/// §4.6: a dirty flag shared by every `Field<T>` allocated from this group.
/// The reconciler allocates one group per updated entity per tick.
pub struct FieldGroup {
    dirty: Arc<AtomicBool>,
}

impl FieldGroup {
    pub fn new() -> Self {
        Self {
            dirty: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn field<T: Clone + PartialEq>(&self, initial: T) -> Field<T> {
        Field::new(self.dirty.clone(), initial)
    }

    /// Atomically reports and resets the dirty flag.
    pub fn consume_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::SeqCst)
    }
}

impl Default for FieldGroup {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utility::patch::Patch;

    #[test]
    fn s7_update_frame_sparseness() {
        let group = FieldGroup::new();
        let mut online = group.field(false);
        let mut scenery = group.field("winter".to_string());

        assert!(!group.consume_dirty());

        online.set(true);

        assert!(group.consume_dirty());
        assert_eq!(online.patch(), Patch::Value(true));
        assert_eq!(scenery.patch(), Patch::Unchanged);

        // scenery untouched, reading it again should stay unchanged
        scenery.set("winter".to_string());
        assert_eq!(scenery.patch(), Patch::Unchanged);
    }

    #[test]
    fn set_if_nullable_ignores_none() {
        let group = FieldGroup::new();
        let mut platform: Field<Option<String>> = group.field(Some("3".to_string()));

        platform.set_if_nullable(None);
        assert_eq!(platform.get(), &Some("3".to_string()));

        platform.set_if_nullable(Some("4".to_string()));
        assert_eq!(platform.get(), &Some("4".to_string()));
    }

    #[test]
    fn set_to_none_clears_via_patch() {
        let group = FieldGroup::new();
        let mut platform: Field<Option<String>> = group.field(Some("3".to_string()));
        platform.set(None);
        assert_eq!(platform.patch(), Patch::Cleared);
    }

    #[test]
    fn write_back_to_baseline_is_not_reported_dirty_by_patch() {
        let group = FieldGroup::new();
        let mut online = group.field(false);
        online.set(true);
        online.set(false);
        assert_eq!(online.patch(), Patch::Unchanged);
    }
}
