//! Request/response to peers over the `p2p_*` RPC methods.

use serde_json::{json, Value};

use crate::chain::service::Service;
use crate::chain::types::RobonomicsResult;

#[derive(Clone, Debug)]
pub struct ReqRes {
    service: Service,
}

impl ReqRes {
    pub fn new(service: Service) -> Self {
        Self { service }
    }

    /// Send `message` to the peer at `address`, e.g.
    /// `/ip4/127.0.0.1/tcp/61240/<peer id>`, and return its reply.
    pub async fn p2p_get(&self, address: &str, message: &str) -> RobonomicsResult<Value> {
        tracing::debug!(address = %address, "Sending p2p get");
        self.service
            .rpc_request("p2p_get", vec![json!(address), json!(message)])
            .await
    }

    pub async fn p2p_ping(&self, address: &str) -> RobonomicsResult<Value> {
        tracing::debug!(address = %address, "Sending p2p ping");
        self.service.rpc_request("p2p_ping", vec![json!(address)]).await
    }
}
