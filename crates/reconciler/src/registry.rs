use std::sync::Arc;

use actors::actor_ref::ActorRef;
use dashmap::DashMap;
use model::{ids::Journey, journey::JourneyAggregate};
use utility::id::Id;

use crate::{actor::JourneyActor, reconcile::SignalResolver};

/// Lazily spawns one `JourneyActor` per journey the first time it is
/// touched, then hands back the same `ActorRef` for every subsequent tick.
pub struct JourneyRegistry {
    actors: DashMap<Id<Journey>, ActorRef<JourneyActor>>,
    resolver: Arc<dyn SignalResolver + Send + Sync>,
}

impl JourneyRegistry {
    pub fn new(resolver: Arc<dyn SignalResolver + Send + Sync>) -> Self {
        Self { actors: DashMap::new(), resolver }
    }

    /// Returns the existing actor for `journey_id`, or spawns one seeded
    /// with `initial` if this is the first time the journey is observed.
    pub fn get_or_spawn(&self, journey_id: Id<Journey>, initial: impl FnOnce() -> JourneyAggregate) -> ActorRef<JourneyActor> {
        if let Some(existing) = self.actors.get(&journey_id) {
            return existing.clone();
        }
        let aggregate = initial();
        let resolver = self.resolver.clone();
        let actor_ref = actors::run(move || JourneyActor::new(aggregate.clone(), resolver.clone()));
        self.actors.insert(journey_id, actor_ref.clone());
        actor_ref
    }

    /// Looks up an already-spawned actor without creating one. Callers that
    /// can only build the seed aggregate asynchronously (persistence reads)
    /// use this to avoid holding an `async` closure where `get_or_spawn`
    /// needs a synchronous one.
    pub fn existing(&self, journey_id: Id<Journey>) -> Option<ActorRef<JourneyActor>> {
        self.actors.get(&journey_id).map(|entry| entry.clone())
    }

    pub fn remove(&self, journey_id: Id<Journey>) {
        self.actors.remove(&journey_id);
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        ids::{Point, Server},
        journey::JourneyEntity,
    };
    use uuid::Uuid;

    struct NoSignals;
    impl SignalResolver for NoSignals {
        fn resolve(&self, _point_id: Id<Point>, _signal_id: &str) -> Option<(String, String)> {
            None
        }
    }

    fn aggregate(run_id: &str) -> JourneyAggregate {
        JourneyAggregate {
            journey: JourneyEntity {
                id: JourneyEntity::id_for(run_id),
                server_id: Id::<Server>::from_name(Uuid::nil(), "srv"),
                foreign_run_id: run_id.into(),
                first_seen_time: None,
                last_seen_time: None,
                cancelled: false,
                continuation_journey_id: None,
            },
            events: Vec::new(),
            vehicle_sequence: None,
        }
    }

    #[tokio::test]
    async fn repeated_lookups_reuse_the_same_actor() {
        let registry = JourneyRegistry::new(Arc::new(NoSignals));
        let id = JourneyEntity::id_for("run-1");

        let mut spawn_count = 0;
        let first = registry.get_or_spawn(id, || {
            spawn_count += 1;
            aggregate("run-1")
        });
        let second = registry.get_or_spawn(id, || {
            spawn_count += 1;
            aggregate("run-1")
        });

        drop((first, second));
        assert_eq!(spawn_count, 1);
        assert_eq!(registry.len(), 1);
    }
}
