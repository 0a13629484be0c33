use std::sync::Arc;

use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tonic::{Request, Response, Status};

use crate::frame::proto::{
    update_dispatcher_server::UpdateDispatcher, DispatchPostSubscriptionRequest, DispatchPostUpdateFrame,
    JourneySubscriptionRequest, JourneyUpdateFrame, ServerSubscriptionRequest, ServerUpdateFrame,
};
use crate::Dispatcher;

pub type JourneyUpdateStream = std::pin::Pin<
    Box<dyn tokio_stream::Stream<Item = Result<JourneyUpdateFrame, Status>> + Send + 'static>,
>;
pub type ServerUpdateStream = std::pin::Pin<
    Box<dyn tokio_stream::Stream<Item = Result<ServerUpdateFrame, Status>> + Send + 'static>,
>;
pub type DispatchPostUpdateStream = std::pin::Pin<
    Box<dyn tokio_stream::Stream<Item = Result<DispatchPostUpdateFrame, Status>> + Send + 'static>,
>;

pub struct UpdateDispatcherService {
    dispatcher: Arc<Dispatcher>,
}

impl UpdateDispatcherService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

/// §4.7 point 1: three server-streaming subscribe operations, one per
/// object kind, each delivering sparse update frames. Subscription requests
/// do not currently filter by server id (every subscriber sees every
/// server); the field is reserved for the WebSocket multiplexer layer that
/// sits in front of this service.
#[tonic::async_trait]
impl UpdateDispatcher for UpdateDispatcherService {
    type SubscribeJourneyUpdatesStream = JourneyUpdateStream;
    type SubscribeServerUpdatesStream = ServerUpdateStream;
    type SubscribeDispatchPostUpdatesStream = DispatchPostUpdateStream;

    async fn subscribe_journey_updates(
        &self,
        _request: Request<JourneySubscriptionRequest>,
    ) -> Result<Response<Self::SubscribeJourneyUpdatesStream>, Status> {
        Ok(Response::new(Box::pin(
            ReceiverStream::new(self.dispatcher.journey_updates.subscribe()).map(Ok),
        )))
    }

    async fn subscribe_server_updates(
        &self,
        _request: Request<ServerSubscriptionRequest>,
    ) -> Result<Response<Self::SubscribeServerUpdatesStream>, Status> {
        Ok(Response::new(Box::pin(
            ReceiverStream::new(self.dispatcher.server_updates.subscribe()).map(Ok),
        )))
    }

    async fn subscribe_dispatch_post_updates(
        &self,
        _request: Request<DispatchPostSubscriptionRequest>,
    ) -> Result<Response<Self::SubscribeDispatchPostUpdatesStream>, Status> {
        Ok(Response::new(Box::pin(
            ReceiverStream::new(self.dispatcher.dispatch_post_updates.subscribe()).map(Ok),
        )))
    }
}
