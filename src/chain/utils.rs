//! Block and extrinsic lookups that need no account.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use subxt::ext::scale_value::Composite;

use crate::chain::connection::Connection;
use crate::chain::types::{BlockRef, ExtrinsicRef, RobonomicsError, RobonomicsResult, H256};
use crate::config::NodeConfig;
use crate::encoding::parse_h256;

/// An extrinsic as found in a block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockExtrinsic {
    /// Zero-based position in the block.
    pub index: u32,
    /// `0x` blake2-256 of the encoded extrinsic.
    pub hash: String,
    pub pallet: String,
    pub call: String,
    pub fields: Composite<u32>,
}

/// Reject anything that is not `0x` followed by 64 characters.
pub fn check_hash_valid(data_hash: &str) -> RobonomicsResult<()> {
    if !data_hash.starts_with("0x") || data_hash.len() != 66 {
        return Err(RobonomicsError::InvalidExtrinsicHash(data_hash.to_string()));
    }
    Ok(())
}

/// Blake2-256 of an encoded extrinsic, `0x` hex.
pub fn extrinsic_hash(encoded: &[u8]) -> String {
    let digest = Blake2b::<U32>::digest(encoded);
    format!("0x{}", hex::encode(digest))
}

/// Read a JSON-RPC quantity, either a number or a `0x` hex string.
fn json_quantity(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => u64::from_str_radix(s.trim_start_matches("0x"), 16).ok(),
        _ => None,
    }
}

/// Chain lookups by block number, block hash and extrinsic position.
#[derive(Clone, Debug)]
pub struct ChainUtils {
    connection: Connection,
}

impl ChainUtils {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            connection: Connection::new(config),
        }
    }

    /// Share the socket of an existing service.
    pub fn with_connection(connection: Connection) -> Self {
        Self { connection }
    }

    /// Block number for a block hash.
    pub async fn get_block_number(&self, block_hash: &str) -> RobonomicsResult<u64> {
        check_hash_valid(block_hash)?;
        let header = self
            .connection
            .rpc_request("chain_getHeader", vec![serde_json::json!(block_hash)])
            .await?;
        if header.is_null() {
            return Err(RobonomicsError::Rpc(format!("unknown block {}", block_hash)));
        }
        header
            .get("number")
            .and_then(json_quantity)
            .ok_or_else(|| RobonomicsError::Decode("header without a block number".to_string()))
    }

    /// Block hash for a block number, `None` past the chain head.
    pub async fn get_block_hash(&self, block_number: u64) -> RobonomicsResult<Option<String>> {
        let hash = self
            .connection
            .rpc_request("chain_getBlockHash", vec![serde_json::json!(block_number)])
            .await?;
        Ok(hash.as_str().map(str::to_string))
    }

    async fn resolve_block(&self, block: &BlockRef) -> RobonomicsResult<H256> {
        let hash = match block {
            BlockRef::Hash(hash) => {
                check_hash_valid(hash)?;
                hash.clone()
            }
            BlockRef::Number(number) => self
                .get_block_hash(*number)
                .await?
                .ok_or_else(|| RobonomicsError::Rpc(format!("no block with number {}", number)))?,
        };
        Ok(H256(parse_h256(&hash)?))
    }

    /// All extrinsics of a block, or the one matching `extrinsic`.
    ///
    /// # Arguments
    /// * `block` - block number or `0x` block hash
    /// * `extrinsic` - zero-based index or `0x` extrinsic hash; `None` for all.
    ///   The index is the one in `"<block>-<idx>"` ids of [`ExtrinsicOutcome`](crate::chain::types::ExtrinsicOutcome)
    ///   and subscriber events, so an id can be looked up as is.
    ///
    /// # Errors
    /// `InvalidExtrinsicHash` when a hash argument is malformed.
    pub async fn get_extrinsic_in_block(
        &self,
        block: BlockRef,
        extrinsic: Option<ExtrinsicRef>,
    ) -> RobonomicsResult<Vec<BlockExtrinsic>> {
        if let Some(ExtrinsicRef::Hash(hash)) = &extrinsic {
            check_hash_valid(hash)?;
        }
        let block_hash = self.resolve_block(&block).await?;

        match &extrinsic {
            None => tracing::info!(block = ?block, "Getting all extrinsics of a block"),
            Some(ext) => tracing::info!(block = ?block, extrinsic = ?ext, "Getting extrinsic"),
        }

        let all = self
            .connection
            .call(|node| async move {
                let api = node.api().await?;
                let extrinsics = api.blocks().at(block_hash).await?.extrinsics().await?;
                let mut found = Vec::new();
                for ext in extrinsics.iter() {
                    let ext = ext?;
                    found.push(BlockExtrinsic {
                        index: ext.index(),
                        hash: extrinsic_hash(ext.bytes()),
                        pallet: ext.pallet_name()?.to_string(),
                        call: ext.variant_name()?.to_string(),
                        fields: ext.field_values()?,
                    });
                }
                Ok(found)
            })
            .await?;

        Ok(select_extrinsics(all, extrinsic.as_ref()))
    }
}

fn select_extrinsics(all: Vec<BlockExtrinsic>, wanted: Option<&ExtrinsicRef>) -> Vec<BlockExtrinsic> {
    match wanted {
        None => all,
        Some(ExtrinsicRef::Index(index)) => all.into_iter().filter(|e| e.index == *index).collect(),
        Some(ExtrinsicRef::Hash(hash)) => {
            let hash = hash.to_lowercase();
            all.into_iter().filter(|e| e.hash == hash).collect()
        }
    }
}
