//! Per-pallet façades over [`Service`](crate::chain::Service).
//!
//! Each façade only assembles pallet / entry / argument triples and turns
//! decoded chain values into typed results. They hold a clone of the shared
//! service, so building one is cheap.

use std::future::Future;

use crate::chain::types::RobonomicsResult;

pub mod common;
pub mod datalog;
pub mod digital_twin;
pub mod launch;
pub mod liability;
pub mod pubsub;
pub mod reqres;
pub mod rws;

pub use common::Common;
pub use datalog::Datalog;
pub use digital_twin::DigitalTwin;
pub use launch::Launch;
pub use liability::Liability;
pub use pubsub::{PubSub, TopicSubscription};
pub use reqres::ReqRes;
pub use rws::Rws;

/// Walk indices `total-1 ..= 0` and return the first one `matches` accepts.
pub(crate) async fn scan_backward<F, Fut>(total: u32, mut matches: F) -> RobonomicsResult<Option<u32>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = RobonomicsResult<bool>>,
{
    for index in (0..total).rev() {
        if matches(index).await? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}
