//! Node websocket connection with lazy metadata client.
//!
//! # Responsibilities
//! - Open the websocket to the configured node, bounded by a timeout
//! - Build the metadata-aware `OnlineClient` on first use, over the same socket
//! - Wrap every boundary call in the ensure-connected / reconnect-once guard
//! - Issue raw JSON-RPC requests (pubsub, reqres, account nonce)

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use subxt::backend::rpc::{RpcClient, RpcParams, RpcSubscription};
use subxt::{OnlineClient, PolkadotConfig};
use tokio::sync::OnceCell;
use tokio::time::timeout;

use crate::chain::types::{RobonomicsError, RobonomicsResult};
use crate::config::NodeConfig;
use crate::observability::metrics;
use crate::resilience::reconnect::call_with_reconnect;

/// Client type used for storage, extrinsics and blocks.
pub type ChainClient = OnlineClient<PolkadotConfig>;

/// One open websocket to a node.
pub struct NodeConnection {
    rpc: RpcClient,
    api: OnceCell<ChainClient>,
}

impl NodeConnection {
    /// Open a websocket to `url`.
    pub async fn open(url: &str, timeout_secs: u64) -> RobonomicsResult<Self> {
        tracing::debug!(remote_ws = %url, "Opening node connection");

        let rpc = match timeout(Duration::from_secs(timeout_secs), RpcClient::from_insecure_url(url)).await {
            Ok(result) => result?,
            Err(_) => return Err(RobonomicsError::Timeout(timeout_secs)),
        };

        tracing::info!(remote_ws = %url, "Connected to node");
        Ok(Self {
            rpc,
            api: OnceCell::new(),
        })
    }

    /// Raw JSON-RPC client.
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Metadata-aware client, fetched from the node on first use.
    pub async fn api(&self) -> RobonomicsResult<&ChainClient> {
        self.api
            .get_or_try_init(|| async {
                let client = ChainClient::from_rpc_client(self.rpc.clone()).await?;
                tracing::debug!(
                    spec_version = client.runtime_version().spec_version,
                    "Runtime metadata loaded"
                );
                Ok::<_, RobonomicsError>(client)
            })
            .await
    }
}

/// Shared, reopenable handle to the node.
///
/// Clones share the same socket; when one clone reopens it, the others see
/// the new socket on their next call.
#[derive(Clone)]
pub struct Connection {
    remote_ws: String,
    connect_timeout_secs: u64,
    handle: Arc<ArcSwapOption<NodeConnection>>,
}

impl Connection {
    /// Create a connection handle. Nothing is opened until the first call.
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            remote_ws: config.remote_ws.clone(),
            connect_timeout_secs: config.connect_timeout_secs,
            handle: Arc::new(ArcSwapOption::empty()),
        }
    }

    pub fn remote_ws(&self) -> &str {
        &self.remote_ws
    }

    pub fn is_open(&self) -> bool {
        self.handle.load().is_some()
    }

    /// Run `op` on a live socket, reopening and retrying once if it was closed.
    pub async fn call<T, Op, Fut>(&self, op: Op) -> RobonomicsResult<T>
    where
        Op: Fn(Arc<NodeConnection>) -> Fut,
        Fut: Future<Output = RobonomicsResult<T>>,
    {
        let url = self.remote_ws.as_str();
        let secs = self.connect_timeout_secs;
        call_with_reconnect(&*self.handle, || NodeConnection::open(url, secs), op).await
    }

    /// Perform a raw JSON-RPC request.
    ///
    /// # Arguments
    /// * `method` - RPC method, e.g. `pubsub_peer`
    /// * `params` - positional parameters
    pub async fn rpc_request(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> RobonomicsResult<serde_json::Value> {
        metrics::record_rpc_request(method);
        tracing::debug!(method = method, "Sending RPC request");

        self.call(|node| {
            let params = params.clone();
            async move {
                let mut rpc_params = RpcParams::new();
                for param in params {
                    rpc_params.push(param)?;
                }
                let result: serde_json::Value = node.rpc().request(method, rpc_params).await?;
                Ok(result)
            }
        })
        .await
    }

    /// Open a JSON-RPC subscription; `unsubscribe_method` is sent when the
    /// returned stream is dropped.
    pub async fn rpc_subscribe(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
        unsubscribe_method: &str,
    ) -> RobonomicsResult<RpcSubscription<serde_json::Value>> {
        metrics::record_rpc_request(method);
        tracing::debug!(method = method, "Opening RPC subscription");

        self.call(|node| {
            let params = params.clone();
            async move {
                let mut rpc_params = RpcParams::new();
                for param in params {
                    rpc_params.push(param)?;
                }
                let subscription = node
                    .rpc()
                    .subscribe(method, rpc_params, unsubscribe_method)
                    .await?;
                Ok(subscription)
            }
        })
        .await
    }

    /// Drop the socket; the next call reopens it.
    pub fn close(&self) {
        if self.handle.swap(None).is_some() {
            tracing::debug!(remote_ws = %self.remote_ws, "Node connection closed");
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("remote_ws", &self.remote_ws)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("open", &self.is_open())
            .finish()
    }
}
