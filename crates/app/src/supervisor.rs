//! Dynamic per-server collector lifecycle. The server collector is the only
//! one that runs unconditionally; everything else in C4 is scoped to one
//! upstream server and must be spawned when that server first appears and
//! retired when it stops being listed (§4.4 "per-server concurrency").

use std::{collections::HashMap, sync::Arc, time::Duration};

use cache::VersionedCache;
use collector::{
    active_train::ActiveTrainCollector,
    dispatch_post::DispatchPostCollector,
    scheduler::{self, Health},
    server::ServerCacheEntry,
    timetable::TimetableCollector,
    vehicle_sequence::{ActiveSlotRegistry, VehicleSequenceCollector},
};
use dispatcher::Dispatcher;
use model::ids::Server;
use reconciler::JourneyRegistry;
use reference_data::{point::PointIndex, railcar::RailcarIndex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use upstream::client::UpstreamClient;
use utility::id::Id;

/// How often the supervisor re-reads the live server set from C3 and
/// reconciles spawned collector groups against it. Matches the server
/// collector's own period (§4.4) so a newly-discovered server gets its
/// per-server collectors within one server-collector tick.
pub const DISCOVERY_PERIOD: Duration = Duration::from_secs(30);

/// Collaborators every per-server collector group needs, shared across all
/// servers rather than duplicated per group.
pub struct SharedDeps {
    pub client: Arc<UpstreamClient>,
    pub points: Arc<PointIndex>,
    pub railcars: Arc<RailcarIndex>,
    pub dispatch_post_cache: Arc<VersionedCache<collector::dispatch_post::DispatchPostCacheEntry>>,
    pub journey_registry: Arc<JourneyRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub database: Arc<database::PgDatabase>,
    pub gone_threshold: u32,
}

struct ServerGroup {
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<()>>,
    #[allow(dead_code)]
    health: Vec<Health>,
}

impl ServerGroup {
    fn spawn(server_id: Id<Server>, server_code: String, deps: &SharedDeps, parent: &CancellationToken) -> Self {
        let shutdown = parent.child_token();
        let slots = Arc::new(ActiveSlotRegistry::new());

        let dispatch_post = DispatchPostCollector::new(
            server_id,
            server_code.clone(),
            deps.client.clone(),
            deps.dispatch_post_cache.clone(),
            deps.points.clone(),
            deps.database.clone(),
        );
        let active_train = ActiveTrainCollector::new(
            server_id,
            server_code.clone(),
            deps.client.clone(),
            deps.points.clone(),
            deps.journey_registry.clone(),
            deps.database.clone(),
            deps.dispatcher.clone(),
            deps.gone_threshold,
        );
        let timetable = TimetableCollector::new(server_id, server_code.clone(), deps.client.clone(), deps.points.clone(), deps.database.clone(), slots.clone());
        let vehicle_sequence = VehicleSequenceCollector::new(server_code, deps.client.clone(), deps.railcars.clone(), deps.database.clone(), slots);

        let (h1, j1) = scheduler::spawn(dispatch_post, shutdown.child_token());
        let (h2, j2) = scheduler::spawn(active_train, shutdown.child_token());
        let (h3, j3) = scheduler::spawn(timetable, shutdown.child_token());
        let (h4, j4) = scheduler::spawn(vehicle_sequence, shutdown.child_token());

        tracing::info!(server_id = %server_id, "spawned per-server collector group");

        Self { shutdown, handles: vec![j1, j2, j3, j4], health: vec![h1, h2, h3, h4] }
    }

    fn retire(self, server_id: Id<Server>) {
        tracing::info!(server_id = %server_id, "retiring per-server collector group");
        self.shutdown.cancel();
        for handle in self.handles {
            handle.abort();
        }
    }
}

/// Owns the dynamic fleet of per-server collector groups and reconciles
/// them against the live server set published by `ServerCollector` into C3.
pub struct ServerSupervisor {
    deps: SharedDeps,
    server_cache: Arc<VersionedCache<ServerCacheEntry>>,
    groups: HashMap<Id<Server>, ServerGroup>,
}

impl ServerSupervisor {
    pub fn new(deps: SharedDeps, server_cache: Arc<VersionedCache<ServerCacheEntry>>) -> Self {
        Self { deps, server_cache, groups: HashMap::new() }
    }

    /// Runs until `shutdown` is cancelled, periodically diffing the live
    /// server set against currently-running collector groups.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(DISCOVERY_PERIOD);
        loop {
            tokio::select! {
                _ = interval.tick() => self.reconcile(&shutdown),
                _ = shutdown.cancelled() => break,
            }
        }
        for (server_id, group) in self.groups.drain() {
            group.retire(server_id);
        }
    }

    fn reconcile(&mut self, shutdown: &CancellationToken) {
        let live = self.server_cache.live_values();
        let mut present = std::collections::HashSet::new();

        for server in live.iter().filter(|s| !s.entity.deleted) {
            present.insert(server.entity.id);
            if !self.groups.contains_key(&server.entity.id) {
                let group = ServerGroup::spawn(server.entity.id, server.entity.code.clone(), &self.deps, shutdown);
                self.groups.insert(server.entity.id, group);
            }
        }

        let stale: Vec<Id<Server>> = self.groups.keys().filter(|id| !present.contains(id)).copied().collect();
        for server_id in stale {
            if let Some(group) = self.groups.remove(&server_id) {
                group.retire(server_id);
            }
        }
    }
}
