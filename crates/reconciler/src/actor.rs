use std::any::Any;
use std::sync::Arc;

use actors::{
    actor::{Actor, SupervisionStrategy},
    handler::{Handler, Message},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::journey::JourneyAggregate;

use crate::{
    reconcile::{self, ReconciliationOutcome, SignalResolver},
    request::JourneyEventUpdateRequest,
};

/// Owns one journey's mutable state and serializes every update through its
/// mailbox, so two collector ticks for the same run can never race on the
/// same aggregate (§4.5 "updates to a journey are applied one at a time").
#[derive(Clone)]
pub struct JourneyActor {
    aggregate: JourneyAggregate,
    resolver: Arc<dyn SignalResolver + Send + Sync>,
}

impl JourneyActor {
    pub fn new(aggregate: JourneyAggregate, resolver: Arc<dyn SignalResolver + Send + Sync>) -> Self {
        Self { aggregate, resolver }
    }
}

impl Actor for JourneyActor {
    fn on_fail(&mut self, _error: Box<dyn Any + Send>) -> SupervisionStrategy {
        SupervisionStrategy::Resume
    }
}

#[derive(Clone)]
pub struct ApplyUpdate {
    pub request: JourneyEventUpdateRequest,
    pub server_now: DateTime<Utc>,
}

impl Message for ApplyUpdate {
    type Response = ReconciliationOutcome;
}

#[async_trait]
impl Handler<ApplyUpdate> for JourneyActor {
    async fn handle(&mut self, message: ApplyUpdate) -> ReconciliationOutcome {
        reconcile::apply_request(&mut self.aggregate, message.request, message.server_now, self.resolver.as_ref())
    }
}

#[derive(Clone)]
pub struct Snapshot;

impl Message for Snapshot {
    type Response = JourneyAggregate;
}

#[async_trait]
impl Handler<Snapshot> for JourneyActor {
    async fn handle(&mut self, _message: Snapshot) -> JourneyAggregate {
        self.aggregate.clone()
    }
}
