pub mod broker;
pub mod frame;
pub mod registry;
pub mod service;
pub mod sink;

use broker::{BrokerPublisher, PayloadKind};
use frame::proto::{DispatchPostUpdateFrame, JourneyUpdateFrame, ServerUpdateFrame};
use model::ids::{DispatchPost, Journey, Server};
use registry::Topic;
use utility::id::Id;

pub use service::UpdateDispatcherService;

/// C7: owns both dispatcher surfaces (§4.7) and fans every frame out to
/// both at once. The broker is optional so unit tests and local runs can
/// exercise the streaming surface without a NATS server.
pub struct Dispatcher {
    pub journey_updates: Topic<JourneyUpdateFrame>,
    pub server_updates: Topic<ServerUpdateFrame>,
    pub dispatch_post_updates: Topic<DispatchPostUpdateFrame>,
    broker: Option<BrokerPublisher>,
}

impl Dispatcher {
    pub fn new(broker: Option<BrokerPublisher>) -> Self {
        Self {
            journey_updates: Topic::new(),
            server_updates: Topic::new(),
            dispatch_post_updates: Topic::new(),
            broker,
        }
    }

    pub async fn publish_journey_update(&self, server_id: Id<Server>, frame: JourneyUpdateFrame) {
        let kind = match frame.update_type {
            t if t == frame::UpdateType::Remove as i32 => PayloadKind::JourneyRemovals,
            _ => PayloadKind::JourneyUpdates,
        };
        if let Some(broker) = &self.broker {
            broker.publish(kind, &server_id.to_string(), Some(&frame.journey_id), &frame).await;
        }
        self.journey_updates.publish(frame);
    }

    pub async fn publish_server_update(&self, server_id: Id<Server>, frame: ServerUpdateFrame) {
        let kind = match frame.update_type {
            t if t == frame::UpdateType::Remove as i32 => PayloadKind::ServerRemovals,
            _ => PayloadKind::ServerUpdates,
        };
        if let Some(broker) = &self.broker {
            broker.publish(kind, &server_id.to_string(), None, &frame).await;
        }
        self.server_updates.publish(frame);
    }

    pub async fn publish_dispatch_post_update(&self, server_id: Id<Server>, post_id: Id<DispatchPost>, frame: DispatchPostUpdateFrame) {
        let kind = match frame.update_type {
            t if t == frame::UpdateType::Remove as i32 => PayloadKind::DispatchPostRemovals,
            _ => PayloadKind::DispatchPostUpdates,
        };
        if let Some(broker) = &self.broker {
            broker.publish(kind, &server_id.to_string(), Some(&post_id.to_string()), &frame).await;
        }
        self.dispatch_post_updates.publish(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame::UpdateType;

    fn journey() -> Id<Journey> {
        Id::from_name(uuid::Uuid::nil(), "journey")
    }

    fn server() -> Id<Server> {
        Id::from_name(uuid::Uuid::nil(), "server")
    }

    #[tokio::test]
    async fn publish_reaches_streaming_subscribers_without_a_broker() {
        let dispatcher = Dispatcher::new(None);
        let mut rx = dispatcher.journey_updates.subscribe();

        let wire = frame::journey_update_frame(
            journey(),
            server(),
            UpdateType::Update,
            utility::patch::Patch::Unchanged,
            utility::patch::Patch::Unchanged,
            utility::patch::Patch::Unchanged,
            utility::patch::Patch::Unchanged,
            false,
        );
        dispatcher.publish_journey_update(server(), wire).await;

        assert!(rx.recv().await.is_some());
    }
}
