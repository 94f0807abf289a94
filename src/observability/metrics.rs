//! Metrics collection.
//!
//! # Metrics
//! - `robonomics_queries_total` (counter): storage queries by pallet
//! - `robonomics_rpc_requests_total` (counter): raw RPC calls by method
//! - `robonomics_extrinsics_total` (counter): submissions by call and status
//! - `robonomics_reconnects_total` (counter): socket reopen attempts
//! - `robonomics_events_matched_total` (counter): subscriber matches by kind
//!
//! # Design Decisions
//! - Emits through the `metrics` facade; no exporter is bundled
//! - Labels are static pallet/call names, never addresses

pub fn record_query(pallet: &str) {
    metrics::counter!("robonomics_queries_total", "pallet" => pallet.to_string()).increment(1);
}

pub fn record_rpc_request(method: &str) {
    metrics::counter!("robonomics_rpc_requests_total", "method" => method.to_string()).increment(1);
}

/// `status` is one of `submitted`, `included`, `failed`.
pub fn record_extrinsic(call: &str, status: &'static str) {
    metrics::counter!(
        "robonomics_extrinsics_total",
        "call" => call.to_string(),
        "status" => status
    )
    .increment(1);
}

pub fn record_reconnect() {
    metrics::counter!("robonomics_reconnects_total").increment(1);
}

pub fn record_event_matched(kind: &'static str) {
    metrics::counter!("robonomics_events_matched_total", "kind" => kind).increment(1);
}
