//! Subject-addressed broker publisher (§4.7 point 2, §6 "Broker subjects").
//! A single shared NATS connection; if its outbound queue is full the
//! message is discarded rather than back-pressuring the reconciler (§5
//! "Shared resources").

use std::time::Duration;

use async_nats::Client;
use prost::Message;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    JourneyUpdates,
    JourneyRemovals,
    ServerUpdates,
    ServerRemovals,
    DispatchPostUpdates,
    DispatchPostRemovals,
}

impl PayloadKind {
    fn as_str(self) -> &'static str {
        match self {
            PayloadKind::JourneyUpdates => "journey-updates",
            PayloadKind::JourneyRemovals => "journey-removals",
            PayloadKind::ServerUpdates => "server-updates",
            PayloadKind::ServerRemovals => "server-removals",
            PayloadKind::DispatchPostUpdates => "dispatch-post-updates",
            PayloadKind::DispatchPostRemovals => "dispatch-post-removals",
        }
    }
}

/// Builds `sit-events.<kind>.v1.<server-id>[.<object-id>]`.
pub fn subject(kind: PayloadKind, server_id: &str, object_id: Option<&str>) -> String {
    match object_id {
        Some(object_id) => format!("sit-events.{}.v1.{}.{}", kind.as_str(), server_id, object_id),
        None => format!("sit-events.{}.v1.{}", kind.as_str(), server_id),
    }
}

#[derive(Debug)]
pub enum BrokerError {
    Connect(async_nats::ConnectError),
}

impl std::fmt::Display for BrokerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokerError::Connect(err) => write!(f, "nats connect failed: {err}"),
        }
    }
}

impl std::error::Error for BrokerError {}

pub struct BrokerPublisher {
    client: Client,
}

impl BrokerPublisher {
    /// Connects with `async-nats`'s own unbounded automatic reconnect, one
    /// attempt per `RECONNECT_DELAY` (§5 "broker reconnect every 1 s with
    /// unbounded attempts").
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let client = async_nats::ConnectOptions::new()
            .reconnect_delay_callback(|_attempts| RECONNECT_DELAY)
            .connect(url)
            .await
            .map_err(BrokerError::Connect)?;
        Ok(Self { client })
    }

    pub async fn publish<T: Message>(&self, kind: PayloadKind, server_id: &str, object_id: Option<&str>, frame: &T) {
        let subject = subject(kind, server_id, object_id);
        if let Err(err) = self.client.publish(subject.clone(), frame.encode_to_vec().into()).await {
            tracing::warn!(subject, error = %err, "dropping broker publish, connection unavailable");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_includes_object_id_when_given() {
        assert_eq!(subject(PayloadKind::JourneyUpdates, "srv1", Some("j1")), "sit-events.journey-updates.v1.srv1.j1");
    }

    #[test]
    fn subject_omits_object_id_when_absent() {
        assert_eq!(subject(PayloadKind::ServerUpdates, "srv1", None), "sit-events.server-updates.v1.srv1");
    }
}
