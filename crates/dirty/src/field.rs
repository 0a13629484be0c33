use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use utility::patch::Patch;

/// One tracked field inside a `FieldGroup` (§4.6). Holds the value as it
/// stood at the start of the tick (`baseline`) alongside the current value;
/// writes that land back on the baseline within the same tick are not
/// reported as changed.
pub struct Field<T> {
    dirty: Arc<AtomicBool>,
    baseline: T,
    value: T,
}

impl<T: Clone + PartialEq> Field<T> {
    pub(crate) fn new(dirty: Arc<AtomicBool>, initial: T) -> Self {
        Self {
            dirty,
            baseline: initial.clone(),
            value: initial,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Unconditional overwrite. A no-op, by domain equality, if `new`
    /// equals the field's current value.
    pub fn set(&mut self, new: T) {
        if new == self.value {
            return;
        }
        self.value = new;
        self.dirty.store(true, Ordering::Relaxed);
    }

    fn changed(&self) -> bool {
        self.baseline != self.value
    }
}

impl<T: Clone + PartialEq> Field<Option<T>> {
    /// Overwrites only when `new` carries a value. Used for upstream fields
    /// where "we don't know" (`None`) must never clobber a previously known
    /// value, unlike `set`, which can clear a field to `None`.
    pub fn set_if_nullable(&mut self, new: Option<T>) {
        if let Some(new) = new {
            self.set(Some(new));
        }
    }
}

impl<T: Clone + PartialEq> Field<T> {
    /// The sparse-update contribution of this field: `Unchanged` if it
    /// never diverged from its tick-start baseline.
    pub fn patch(&self) -> Patch<T>
    where
        T: IntoPatchValue,
    {
        if !self.changed() {
            Patch::Unchanged
        } else {
            self.value.clone().into_patch_value()
        }
    }
}

/// Bridges a field's raw value type to the tristate `Patch` the dirty
/// tracker emits: a plain `T` always becomes `Patch::Value`, an `Option<T>`
/// becomes `Patch::Cleared` on `None` and `Patch::Value` on `Some` (§9
/// "Tristate field").
pub trait IntoPatchValue: Sized {
    fn into_patch_value(self) -> Patch<Self>;
}

impl IntoPatchValue for bool {
    fn into_patch_value(self) -> Patch<Self> {
        Patch::Value(self)
    }
}

impl IntoPatchValue for String {
    fn into_patch_value(self) -> Patch<Self> {
        Patch::Value(self)
    }
}

impl IntoPatchValue for i64 {
    fn into_patch_value(self) -> Patch<Self> {
        Patch::Value(self)
    }
}

impl IntoPatchValue for i8 {
    fn into_patch_value(self) -> Patch<Self> {
        Patch::Value(self)
    }
}

impl IntoPatchValue for u32 {
    fn into_patch_value(self) -> Patch<Self> {
        Patch::Value(self)
    }
}

impl IntoPatchValue for f64 {
    fn into_patch_value(self) -> Patch<Self> {
        Patch::Value(self)
    }
}

impl<T> IntoPatchValue for Option<T> {
    fn into_patch_value(self) -> Patch<Self> {
        match self {
            Some(_) => Patch::Value(self),
            None => Patch::Cleared,
        }
    }
}
