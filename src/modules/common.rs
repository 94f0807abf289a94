//! Account information, nonce and token transfers.

use subxt::dynamic::Value;

use crate::chain::decode::{self, ChainValue};
use crate::chain::service::{account_arg, call_args, Service};
use crate::chain::types::{ExtrinsicOutcome, RobonomicsResult, H256};

/// Balances part of `System.Account`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountData {
    pub free: u128,
    pub reserved: u128,
    pub frozen: u128,
}

/// `System.Account` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountInfo {
    pub nonce: u64,
    pub consumers: u64,
    pub providers: u64,
    pub sufficients: u64,
    pub data: AccountData,
}

impl AccountInfo {
    fn from_chain(value: &ChainValue) -> RobonomicsResult<Self> {
        let data = decode::field(value, "data")?;
        // Older runtimes split the frozen balance in two.
        let frozen = decode::field_u128(data, "frozen")
            .or_else(|_| decode::field_u128(data, "misc_frozen"))
            .unwrap_or_default();
        Ok(Self {
            nonce: decode::field_u64(value, "nonce")?,
            consumers: decode::field_u64(value, "consumers").unwrap_or_default(),
            providers: decode::field_u64(value, "providers").unwrap_or_default(),
            sufficients: decode::field_u64(value, "sufficients").unwrap_or_default(),
            data: AccountData {
                free: decode::field_u128(data, "free")?,
                reserved: decode::field_u128(data, "reserved").unwrap_or_default(),
                frozen,
            },
        })
    }
}

#[derive(Clone, Debug)]
pub struct Common {
    service: Service,
}

impl Common {
    pub fn new(service: Service) -> Self {
        Self { service }
    }

    /// Account information.
    ///
    /// # Arguments
    /// * `addr` - explored account; the own account when `None`
    /// * `block_hash` - read state as of this block
    pub async fn account_info(
        &self,
        addr: Option<&str>,
        block_hash: Option<H256>,
    ) -> RobonomicsResult<Option<AccountInfo>> {
        let address = self.service.account().address_or_own(addr)?;
        tracing::info!(address = %address, "Getting account data");

        let value = self
            .service
            .chainstate_query("System", "Account", vec![account_arg(&address)?], block_hash)
            .await?;
        value.as_ref().map(AccountInfo::from_chain).transpose()
    }

    /// Next nonce of an account, as reported by `system_accountNextIndex`.
    ///
    /// Pass it to an extrinsic to queue several submissions without waiting.
    pub async fn get_account_nonce(&self, addr: Option<&str>) -> RobonomicsResult<u64> {
        let address = self.service.account().address_or_own(addr)?;
        tracing::info!(address = %address, "Fetching account nonce");

        let result = self
            .service
            .rpc_request("system_accountNextIndex", vec![serde_json::json!(address)])
            .await?;
        Ok(result.as_u64().unwrap_or(0))
    }

    /// Send `tokens` (in the smallest unit, 1 XRT = 10^9) to `target_address`.
    pub async fn transfer_tokens(
        &self,
        target_address: &str,
        tokens: u128,
        nonce: Option<u64>,
    ) -> RobonomicsResult<ExtrinsicOutcome> {
        tracing::info!(target = %target_address, tokens = tokens, "Sending tokens");
        let dest = Value::unnamed_variant("Id", [account_arg(target_address)?]);
        let args = call_args([("dest", dest), ("value", Value::u128(tokens))]);
        self.service
            .extrinsic("Balances", "transfer_allow_death", args, nonce)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::decode::tests::decoded;

    fn account_value(frozen_field: &str) -> ChainValue {
        decoded(Value::named_composite([
            ("nonce", Value::u128(7)),
            ("consumers", Value::u128(1)),
            ("providers", Value::u128(1)),
            ("sufficients", Value::u128(0)),
            (
                "data",
                Value::named_composite([
                    ("free", Value::u128(1_000_000_000)),
                    ("reserved", Value::u128(5)),
                    (frozen_field, Value::u128(3)),
                ]),
            ),
        ]))
    }

    #[test]
    fn test_account_info_decoding() {
        let info = AccountInfo::from_chain(&account_value("frozen")).unwrap();
        assert_eq!(info.nonce, 7);
        assert_eq!(info.data.free, 1_000_000_000);
        assert_eq!(info.data.reserved, 5);
        assert_eq!(info.data.frozen, 3);
    }

    #[test]
    fn test_account_info_legacy_frozen() {
        let info = AccountInfo::from_chain(&account_value("misc_frozen")).unwrap();
        assert_eq!(info.data.frozen, 3);
    }

    #[test]
    fn test_account_info_missing_nonce() {
        let value = decoded(Value::named_composite([(
            "data",
            Value::named_composite([("free", Value::u128(1))]),
        )]));
        assert!(AccountInfo::from_chain(&value).is_err());
    }
}
