mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{start_mock_node, start_mock_node_with_pushes};
use robonomics_interface::chain::types::BlockRef;
use robonomics_interface::modules::{Common, PubSub, ReqRes};
use robonomics_interface::{Account, ChainUtils, ClientConfig, RobonomicsError, Service, Shutdown};
use serde_json::{json, Value};

const ALICE_SEED: &str = "//Alice";

fn config_for(url: &str) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.node.remote_ws = url.to_string();
    config.node.connect_timeout_secs = 5;
    config
}

fn answer(method: &str, params: &Value) -> Result<Value, (i64, String)> {
    match method {
        "pubsub_peer" => Ok(json!("12D3KooWmockpeer")),
        "pubsub_publish" => Ok(json!(true)),
        "pubsub_subscribe" => Ok(json!("sub-1")),
        "pubsub_unsubscribe" => Ok(json!(true)),
        "p2p_get" => Ok(json!(format!("echo: {}", params[1].as_str().unwrap_or_default()))),
        "system_accountNextIndex" => Ok(json!(5)),
        "chain_getBlockHash" => Ok(json!(format!("0x{}", "ab".repeat(32)))),
        "chain_getHeader" => Ok(json!({"number": "0x1a", "parentHash": format!("0x{}", "00".repeat(32))})),
        _ => Err((-32601, "Method not found".to_string())),
    }
}

#[tokio::test]
async fn test_pubsub_requests_reach_node() {
    let node = start_mock_node(answer, false).await;
    let config = config_for(&node.url);
    let pubsub = PubSub::new(Service::new(Account::read_only(&config), &config));

    assert_eq!(pubsub.get_peer().await.unwrap(), json!("12D3KooWmockpeer"));
    assert_eq!(pubsub.publish("topic", "hello").await.unwrap(), json!(true));

    let requests = node.requests.lock().unwrap().clone();
    assert_eq!(requests[1].0, "pubsub_publish");
    assert_eq!(requests[1].1, json!(["topic", "hello"]));
    assert_eq!(node.connections.load(Ordering::SeqCst), 1);
}

fn topic_notification(method: &str, _: &Value) -> Vec<Value> {
    if method != "pubsub_subscribe" {
        return Vec::new();
    }
    vec![json!({
        "jsonrpc": "2.0",
        "method": "pubsub_subscribe",
        "params": {"subscription": "sub-1", "result": "hello robots"}
    })]
}

#[tokio::test]
async fn test_pubsub_subscription_delivers_messages() {
    let node = start_mock_node_with_pushes(answer, topic_notification, false).await;
    let config = config_for(&node.url);
    let pubsub = PubSub::new(Service::new(Account::read_only(&config), &config));
    let shutdown = Shutdown::new();

    let mut subscription = pubsub.subscribe("robots", 4, shutdown.subscribe()).await.unwrap();
    assert_eq!(subscription.id.as_deref(), Some("sub-1"));

    let message = tokio::time::timeout(Duration::from_secs(5), subscription.messages.recv())
        .await
        .expect("no message published")
        .expect("subscription closed early")
        .unwrap();
    assert_eq!(message, json!("hello robots"));

    let requests = node.requests.lock().unwrap().clone();
    assert_eq!(requests[0], ("pubsub_subscribe".to_string(), json!(["robots"])));

    shutdown.trigger();
    let closed = tokio::time::timeout(Duration::from_secs(5), subscription.messages.recv())
        .await
        .expect("subscription kept running after shutdown");
    assert!(closed.is_none());
}

#[tokio::test]
async fn test_reqres_get() {
    let node = start_mock_node(answer, false).await;
    let config = config_for(&node.url);
    let reqres = ReqRes::new(Service::new(Account::read_only(&config), &config));

    let reply = reqres.p2p_get("/ip4/127.0.0.1/tcp/61240/peer", "ping").await.unwrap();
    assert_eq!(reply, json!("echo: ping"));
}

#[tokio::test]
async fn test_account_nonce_uses_own_address() {
    let node = start_mock_node(answer, false).await;
    let config = config_for(&node.url);
    let account = Account::new(Some(ALICE_SEED), &config).unwrap();
    let address = account.get_address().unwrap().to_string();
    let common = Common::new(Service::new(account, &config));

    assert_eq!(common.get_account_nonce(None).await.unwrap(), 5);
    let requests = node.requests.lock().unwrap().clone();
    assert_eq!(requests[0].1, json!([address]));
}

#[tokio::test]
async fn test_nonce_without_seed_or_address_fails() {
    let node = start_mock_node(answer, false).await;
    let config = config_for(&node.url);
    let common = Common::new(Service::new(Account::read_only(&config), &config));

    let result = common.get_account_nonce(None).await;
    assert!(matches!(result, Err(RobonomicsError::NoPrivateKey(_))));
    assert!(node.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_closed_socket_is_reopened_once() {
    let node = start_mock_node(answer, true).await;
    let config = config_for(&node.url);
    let pubsub = PubSub::new(Service::new(Account::read_only(&config), &config));

    let peer = pubsub.get_peer().await.unwrap();
    assert_eq!(peer, json!("12D3KooWmockpeer"));
    assert_eq!(node.connections.load(Ordering::SeqCst), 2);
    assert_eq!(node.requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_rpc_error_is_not_retried() {
    let node = start_mock_node(answer, false).await;
    let config = config_for(&node.url);
    let service = Service::new(Account::read_only(&config), &config);

    let result = service.rpc_request("robonomics_unknown", Vec::new()).await;
    assert!(matches!(result, Err(RobonomicsError::Rpc(_))));
    assert_eq!(node.connections.load(Ordering::SeqCst), 1);
    assert_eq!(node.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_chain_utils_block_lookups() {
    let node = start_mock_node(answer, false).await;
    let utils = ChainUtils::new(&config_for(&node.url).node);

    let hash = utils.get_block_hash(26).await.unwrap().unwrap();
    assert_eq!(hash, format!("0x{}", "ab".repeat(32)));
    assert_eq!(utils.get_block_number(&hash).await.unwrap(), 26);

    let result = utils.get_extrinsic_in_block(BlockRef::Hash("0x12".to_string()), None).await;
    assert!(matches!(result, Err(RobonomicsError::InvalidExtrinsicHash(_))));
}
