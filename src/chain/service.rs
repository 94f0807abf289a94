//! Generic storage queries, extrinsics and RPC calls.
//!
//! # Responsibilities
//! - Compose dynamic storage addresses and decode the result
//! - Compose, sign and submit dynamic extrinsics (optionally via `RWS.call`)
//! - Wait for inclusion and report `"<block>-<idx>"` when asked
//! - Stream storage values as they change block by block
//!
//! Every call goes through [`Connection::call`], so a closed socket is
//! reopened once and the call retried once.

use std::sync::Arc;

use futures_util::StreamExt;
use subxt::config::DefaultExtrinsicParamsBuilder;
use subxt::dynamic::Value;
use subxt::ext::scale_value::Composite;
use subxt::tx::TxStatus;
use subxt::PolkadotConfig;
use tokio::sync::{broadcast, mpsc};

use crate::chain::account::Account;
use crate::chain::connection::{Connection, NodeConnection};
use crate::chain::decode::ChainValue;
use crate::chain::types::{ExtrinsicOutcome, RobonomicsError, RobonomicsResult, H256};
use crate::config::{ClientConfig, ExtrinsicConfig};
use crate::encoding::ss58;
use crate::observability::metrics;

/// Named call arguments, in declaration order.
pub type CallArgs = Vec<(String, Value)>;

/// Build named call arguments from `(&str, Value)` pairs.
pub fn call_args<const N: usize>(fields: [(&str, Value); N]) -> CallArgs {
    fields
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Encode an ss58 address as an `AccountId32` call argument.
pub fn account_arg(address: &str) -> RobonomicsResult<Value> {
    Ok(Value::from_bytes(ss58::account_bytes(address)?))
}

/// Wrap a call into `RWS.call { subscription_id, call }`.
///
/// The inner call is expressed as a `RuntimeCall` value: the pallet variant
/// holding the call variant with its named fields.
pub fn rws_envelope(
    owner: &str,
    pallet: &str,
    call: &str,
    args: CallArgs,
) -> RobonomicsResult<(String, String, CallArgs)> {
    let inner_call = Value::unnamed_variant(
        pallet,
        [Value::named_variant(call, args)],
    );
    let envelope = vec![
        ("subscription_id".to_string(), account_arg(owner)?),
        ("call".to_string(), inner_call),
    ];
    Ok(("RWS".to_string(), "call".to_string(), envelope))
}

/// Service shared by every domain module.
#[derive(Clone)]
pub struct Service {
    account: Account,
    connection: Connection,
    options: Arc<ExtrinsicConfig>,
}

impl Service {
    /// Create a service with its own connection to `config.node.remote_ws`.
    pub fn new(account: Account, config: &ClientConfig) -> Self {
        let connection = Connection::new(&config.node);
        Self::with_connection(account, connection, config.extrinsics.clone())
    }

    /// Create a service sharing an existing connection.
    pub fn with_connection(account: Account, connection: Connection, options: ExtrinsicConfig) -> Self {
        Self {
            account,
            connection,
            options: Arc::new(options),
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn options(&self) -> &ExtrinsicConfig {
        &self.options
    }

    /// Query chain storage.
    ///
    /// # Arguments
    /// * `pallet` - pallet name, e.g. `Datalog`
    /// * `entry` - storage entry, e.g. `DatalogIndex`
    /// * `keys` - map keys, empty for plain values
    /// * `block_hash` - read state as of this block instead of the latest one
    ///
    /// # Returns
    /// The decoded value, `None` when nothing is stored under the key.
    pub async fn chainstate_query(
        &self,
        pallet: &str,
        entry: &str,
        keys: Vec<Value>,
        block_hash: Option<H256>,
    ) -> RobonomicsResult<Option<ChainValue>> {
        metrics::record_query(pallet);
        tracing::info!(pallet = pallet, entry = entry, "Performing query");

        self.connection
            .call(|node| {
                let keys = keys.clone();
                async move { fetch_storage(&node, pallet, entry, keys, block_hash).await }
            })
            .await
    }

    /// Follow a storage entry: the receiver gets the value every time it
    /// differs from the previous best block's value.
    ///
    /// The task stops when the receiver is dropped or `shutdown` fires.
    pub fn watch_chainstate(
        &self,
        pallet: &str,
        entry: &str,
        keys: Vec<Value>,
        capacity: usize,
        mut shutdown: broadcast::Receiver<()>,
    ) -> mpsc::Receiver<RobonomicsResult<Option<ChainValue>>> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let service = self.clone();
        let pallet = pallet.to_string();
        let entry = entry.to_string();

        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::debug!(pallet = %pallet, entry = %entry, "Storage watch shut down");
                }
                _ = service.watch_loop(&pallet, &entry, keys, &tx) => {}
            }
        });

        rx
    }

    async fn watch_loop(
        &self,
        pallet: &str,
        entry: &str,
        keys: Vec<Value>,
        tx: &mpsc::Sender<RobonomicsResult<Option<ChainValue>>>,
    ) {
        let mut last: Option<Option<ChainValue>> = None;

        let blocks = self
            .connection
            .call(|node| async move {
                let api = node.api().await?;
                Ok(api.blocks().subscribe_best().await?)
            })
            .await;

        let mut blocks = match blocks {
            Ok(stream) => stream,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        };

        while let Some(block) = blocks.next().await {
            let hash = match block {
                Ok(block) => block.hash(),
                Err(e) => {
                    let _ = tx.send(Err(e.into())).await;
                    return;
                }
            };

            let value = self.chainstate_query(pallet, entry, keys.clone(), Some(hash)).await;
            let changed = match (&value, &last) {
                (Ok(current), Some(previous)) => current != previous,
                _ => true,
            };
            if let Ok(current) = &value {
                last = Some(current.clone());
            }
            if changed && tx.send(value).await.is_err() {
                return;
            }
        }
    }

    /// Read a runtime constant, e.g. `Datalog.WindowSize`.
    pub async fn constant(&self, pallet: &str, name: &str) -> RobonomicsResult<ChainValue> {
        tracing::debug!(pallet = pallet, constant = name, "Reading runtime constant");
        self.connection
            .call(|node| async move {
                let api = node.api().await?;
                let thunk = api.constants().at(&subxt::dynamic::constant(pallet, name))?;
                Ok(thunk.to_value()?)
            })
            .await
    }

    /// Compose, sign and submit an extrinsic.
    ///
    /// # Arguments
    /// * `pallet` - call module, e.g. `Datalog`
    /// * `call` - call function, e.g. `record`
    /// * `args` - named call arguments
    /// * `nonce` - explicit nonce, taken from the chain when `None`
    ///
    /// # Errors
    /// `NoPrivateKey` without a seed, `ExtrinsicFailed` when the chain rejects it.
    pub async fn extrinsic(
        &self,
        pallet: &str,
        call: &str,
        args: CallArgs,
        nonce: Option<u64>,
    ) -> RobonomicsResult<ExtrinsicOutcome> {
        let keypair = self.account.keypair()?.clone();
        let label = format!("{}.{}", pallet, call);

        let (pallet, call, args) = match &self.options.rws_sub_owner {
            Some(owner) => {
                tracing::info!(call = %label, owner = %owner, "Creating an RWS call");
                rws_envelope(owner, pallet, call, args)?
            }
            None => {
                tracing::info!(call = %label, "Creating a call");
                (pallet.to_string(), call.to_string(), args)
            }
        };

        let wait_for_inclusion = self.options.wait_for_inclusion;
        let return_block_num = self.options.return_block_num;

        let result = self
            .connection
            .call(|node| {
                let payload = subxt::dynamic::tx(
                    pallet.as_str(),
                    call.as_str(),
                    Composite::named(args.clone()),
                );
                let keypair = keypair.clone();
                let label = label.as_str();
                async move {
                    let api = node.api().await?;
                    let mut params = DefaultExtrinsicParamsBuilder::<PolkadotConfig>::new();
                    if let Some(nonce) = nonce {
                        params = params.nonce(nonce);
                    }

                    if !wait_for_inclusion {
                        let hash = api.tx().sign_and_submit(&payload, &keypair, params.build()).await?;
                        tracing::info!(call = %label, hash = ?hash, "Extrinsic submitted");
                        metrics::record_extrinsic(label, "submitted");
                        return Ok(ExtrinsicOutcome::new(hash));
                    }

                    let mut progress = api
                        .tx()
                        .sign_and_submit_then_watch(&payload, &keypair, params.build())
                        .await?;
                    tracing::info!(call = %label, hash = ?progress.extrinsic_hash(), "Extrinsic submitted");
                    metrics::record_extrinsic(label, "submitted");

                    while let Some(status) = progress.next().await {
                        match status? {
                            TxStatus::InBestBlock(in_block) | TxStatus::InFinalizedBlock(in_block) => {
                                let events = in_block.wait_for_success().await?;
                                let mut outcome = ExtrinsicOutcome::new(in_block.extrinsic_hash());
                                let block_number: u64 =
                                    api.blocks().at(in_block.block_hash()).await?.number().into();
                                tracing::info!(
                                    call = %label,
                                    block = block_number,
                                    "Extrinsic included in block"
                                );
                                if return_block_num {
                                    outcome = outcome.with_block(block_number, events.extrinsic_index());
                                }
                                return Ok(outcome);
                            }
                            TxStatus::Error { message }
                            | TxStatus::Invalid { message }
                            | TxStatus::Dropped { message } => {
                                return Err(RobonomicsError::ExtrinsicFailed(message));
                            }
                            _ => continue,
                        }
                    }

                    Err(RobonomicsError::ExtrinsicFailed(
                        "transaction status stream ended before inclusion".to_string(),
                    ))
                }
            })
            .await;

        match &result {
            Ok(_) if wait_for_inclusion => metrics::record_extrinsic(&label, "included"),
            Err(e) => {
                tracing::warn!(call = %label, error = %e, "Extrinsic did not go through");
                metrics::record_extrinsic(&label, "failed");
            }
            _ => {}
        }
        result
    }

    /// Raw JSON-RPC request.
    pub async fn rpc_request(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> RobonomicsResult<serde_json::Value> {
        self.connection.rpc_request(method, params).await
    }
}

async fn fetch_storage(
    node: &NodeConnection,
    pallet: &str,
    entry: &str,
    keys: Vec<Value>,
    block_hash: Option<H256>,
) -> RobonomicsResult<Option<ChainValue>> {
    let api = node.api().await?;
    let address = subxt::dynamic::storage(pallet, entry, keys);
    let storage = match block_hash {
        Some(hash) => api.storage().at(hash),
        None => api.storage().at_latest().await?,
    };

    match storage.fetch(&address).await? {
        Some(thunk) => Ok(Some(thunk.to_value()?)),
        None => Ok(None),
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("account", &self.account)
            .field("connection", &self.connection)
            .field("wait_for_inclusion", &self.options.wait_for_inclusion)
            .field("rws_sub_owner", &self.options.rws_sub_owner)
            .finish()
    }
}
