//! Tristate value used for sparse update-frame serialization (§9 "Tristate
//! field"): a field can be *unset* (no change), *cleared* (changed to null)
//! or carry a *value* (changed to this). Plain `Option<T>` cannot express
//! the distinction between "unchanged" and "changed to null".

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Patch<T> {
    Unchanged,
    Cleared,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Patch::Unchanged)
    }

    pub fn from_change(old: &Option<T>, new: &Option<T>) -> Patch<T>
    where
        T: Clone + PartialEq,
    {
        match (old, new) {
            (None, None) => Patch::Unchanged,
            (Some(a), Some(b)) if a == b => Patch::Unchanged,
            (_, Some(b)) => Patch::Value(b.clone()),
            (Some(_), None) => Patch::Cleared,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Unchanged => Patch::Unchanged,
            Patch::Cleared => Patch::Cleared,
            Patch::Value(v) => Patch::Value(f(v)),
        }
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Unchanged => Patch::Unchanged,
            Patch::Cleared => Patch::Cleared,
            Patch::Value(v) => Patch::Value(v),
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_when_equal() {
        assert_eq!(Patch::from_change(&Some(1), &Some(1)), Patch::Unchanged);
        assert_eq!(Patch::<i32>::from_change(&None, &None), Patch::Unchanged);
    }

    #[test]
    fn value_when_set_to_new_value() {
        assert_eq!(Patch::from_change(&None, &Some(1)), Patch::Value(1));
        assert_eq!(Patch::from_change(&Some(1), &Some(2)), Patch::Value(2));
    }

    #[test]
    fn cleared_when_set_to_none() {
        assert_eq!(Patch::from_change(&Some(1), &None), Patch::Cleared);
    }
}
