//! Node pubsub over the `pubsub_*` RPC methods.
//!
//! Results are the raw JSON the node returns (success flags, peer id,
//! listener addresses). Topic subscriptions forward every published
//! message over a channel until shutdown or until the receiver is dropped.

use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc};

use crate::chain::service::Service;
use crate::chain::types::{RobonomicsError, RobonomicsResult};

/// An open topic subscription.
#[derive(Debug)]
pub struct TopicSubscription {
    /// Subscription id assigned by the node.
    pub id: Option<String>,
    /// Messages published on the topic, as the node sends them.
    pub messages: mpsc::Receiver<RobonomicsResult<Value>>,
}

#[derive(Clone, Debug)]
pub struct PubSub {
    service: Service,
}

impl PubSub {
    pub fn new(service: Service) -> Self {
        Self { service }
    }

    /// Connect to a peer by multiaddr and add it to the swarm.
    pub async fn connect(&self, address: &str) -> RobonomicsResult<Value> {
        self.service.rpc_request("pubsub_connect", vec![json!(address)]).await
    }

    /// Listen on a multiaddr for incoming connections.
    pub async fn listen(&self, address: &str) -> RobonomicsResult<Value> {
        self.service.rpc_request("pubsub_listen", vec![json!(address)]).await
    }

    /// Addresses the node listens on.
    pub async fn get_listeners(&self) -> RobonomicsResult<Value> {
        self.service.rpc_request("pubsub_listeners", Vec::new()).await
    }

    /// Local peer id.
    pub async fn get_peer(&self) -> RobonomicsResult<Value> {
        self.service.rpc_request("pubsub_peer", Vec::new()).await
    }

    pub async fn publish(&self, topic_name: &str, message: &str) -> RobonomicsResult<Value> {
        tracing::debug!(topic = %topic_name, "Publishing message");
        self.service
            .rpc_request("pubsub_publish", vec![json!(topic_name), json!(message)])
            .await
    }

    /// Subscribe to `topic_name`.
    ///
    /// # Arguments
    /// * `capacity` - messages buffered before the forwarding task waits
    /// * `shutdown` - stops forwarding and unsubscribes
    pub async fn subscribe(
        &self,
        topic_name: &str,
        capacity: usize,
        mut shutdown: broadcast::Receiver<()>,
    ) -> RobonomicsResult<TopicSubscription> {
        let mut stream = self
            .service
            .connection()
            .rpc_subscribe("pubsub_subscribe", vec![json!(topic_name)], "pubsub_unsubscribe")
            .await?;
        let id = stream.subscription_id().map(str::to_string);
        tracing::info!(topic = %topic_name, subscription = ?id, "Subscribed to topic");

        let (tx, rx) = mpsc::channel(capacity.max(1));
        let topic = topic_name.to_string();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        tracing::debug!(topic = %topic, "Topic subscription shut down");
                        return;
                    }
                    message = stream.next() => match message {
                        Some(message) => {
                            if tx.send(message.map_err(RobonomicsError::from)).await.is_err() {
                                return;
                            }
                        }
                        None => {
                            tracing::debug!(topic = %topic, "Topic subscription ended by node");
                            return;
                        }
                    },
                }
            }
        });

        Ok(TopicSubscription { id, messages: rx })
    }

    pub async fn unsubscribe(&self, subscription_id: &str) -> RobonomicsResult<Value> {
        self.service
            .rpc_request("pubsub_unsubscribe", vec![json!(subscription_id)])
            .await
    }
}
