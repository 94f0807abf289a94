//! Launch commands sent to devices.

use subxt::dynamic::Value;

use crate::chain::service::{account_arg, call_args, Service};
use crate::chain::types::{ExtrinsicOutcome, RobonomicsResult};
use crate::encoding::hash_or_ipfs_to_bytes;

#[derive(Clone, Debug)]
pub struct Launch {
    service: Service,
}

impl Launch {
    pub fn new(service: Service) -> Self {
        Self { service }
    }

    /// Send a launch command to `target_address`.
    ///
    /// `parameter` is 32 bytes of `0x` hex or an IPFS `Qm...` hash, which is
    /// reduced to its 32-byte digest.
    pub async fn launch(
        &self,
        target_address: &str,
        parameter: &str,
        nonce: Option<u64>,
    ) -> RobonomicsResult<ExtrinsicOutcome> {
        tracing::info!(target = %target_address, "Sending launch command");
        let param = hash_or_ipfs_to_bytes(parameter)?;
        let args = call_args([
            ("robot", account_arg(target_address)?),
            ("param", Value::from_bytes(param)),
        ]);
        self.service.extrinsic("Launch", "launch", args, nonce).await
    }
}
