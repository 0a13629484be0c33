use std::{fmt, hash, marker::PhantomData};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marker trait binding a domain type to the fact that it is identified by a
/// `Uuid`. Mirrors the donor repo's `HasId`, but every entity in this system
/// is keyed by a UUID (v5 for deterministic entities, v7 for vehicle
/// sequences) so there is no need to generalise over the id's representation.
pub trait HasId {}

pub trait Key {
    fn string_key(&self) -> String;
}

pub struct CompoundKey {
    keys: Vec<String>,
}

impl CompoundKey {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }
}

impl Key for CompoundKey {
    fn string_key(&self) -> String {
        format!("({})", self.keys.join(","))
    }
}

/// A type-tagged identifier. `Id<Journey>` and `Id<Server>` are distinct
/// types even though both wrap a `Uuid`, which keeps ids from different
/// entity classes from being accidentally swapped at call sites.
pub struct Id<T>(Uuid, PhantomData<T>);

impl<T> Id<T> {
    pub const fn new(inner: Uuid) -> Self {
        Self(inner, PhantomData)
    }

    pub const fn raw(&self) -> Uuid {
        self.0
    }

    /// Deterministic id derived via UUIDv5 from `namespace` and `name`.
    pub fn from_name(namespace: Uuid, name: &str) -> Self {
        Self::new(Uuid::new_v5(&namespace, name.as_bytes()))
    }
}

impl<T> Key for Id<T> {
    fn string_key(&self) -> String {
        self.0.to_string()
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Id").field(&self.0).finish()
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> hash::Hash for Id<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl<T> Eq for Id<T> {}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Uuid::deserialize(deserializer).map(Id::new)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Server;

    #[test]
    fn from_name_is_deterministic() {
        let namespace = Uuid::parse_str("d32b76b2-d083-45d3-ab8f-d4d76398318b").unwrap();
        let a = Id::<Server>::from_name(namespace, "hello world");
        let b = Id::<Server>::from_name(namespace, "hello world");
        assert_eq!(a, b);
        assert_eq!(
            a.raw().to_string(),
            "ccc93e04-5a2a-5691-a386-71c99fa4dc48"
        );
    }
}
