//! In-process fan-out to streaming subscribers (§4.7 point 1). Each
//! subscriber gets a small bounded channel; a slow subscriber has frames
//! dropped rather than being allowed to back-pressure a publisher, matching
//! the "at-most-once delivery, no redelivery" rule.

use std::sync::Mutex;

use tokio::sync::mpsc;

const SUBSCRIBER_CAPACITY: usize = 64;

pub struct Topic<T> {
    subscribers: Mutex<Vec<mpsc::Sender<T>>>,
}

impl<T: Clone> Topic<T> {
    pub fn new() -> Self {
        Self { subscribers: Mutex::new(Vec::new()) }
    }

    pub fn subscribe(&self) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    /// Drops closed subscribers and, for the rest, drops the frame instead
    /// of blocking when a subscriber's channel is full.
    pub fn publish(&self, frame: T) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| match tx.try_send(frame.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("dropping frame for slow subscriber");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

impl<T: Clone> Default for Topic<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn published_frames_reach_every_subscriber() {
        let topic: Topic<u32> = Topic::new();
        let mut a = topic.subscribe();
        let mut b = topic.subscribe();

        topic.publish(7);

        assert_eq!(a.recv().await, Some(7));
        assert_eq!(b.recv().await, Some(7));
    }

    #[tokio::test]
    async fn dropped_subscriber_is_pruned_on_next_publish() {
        let topic: Topic<u32> = Topic::new();
        {
            let _rx = topic.subscribe();
        }
        assert_eq!(topic.subscriber_count(), 1);
        topic.publish(1);
        assert_eq!(topic.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn full_subscriber_channel_drops_the_frame_instead_of_blocking() {
        let topic: Topic<u32> = Topic::new();
        let mut rx = topic.subscribe();

        for i in 0..(SUBSCRIBER_CAPACITY as u32 + 10) {
            topic.publish(i);
        }

        // the channel never grew past its bound; earliest frames were dropped
        let mut drained = 0;
        while rx.try_recv().is_ok() {
            drained += 1;
        }
        assert!(drained <= SUBSCRIBER_CAPACITY);
    }
}
