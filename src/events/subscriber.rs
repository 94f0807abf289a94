//! Chain event subscriber.
//!
//! Follows new best blocks, keeps events of the subscribed kinds (optionally
//! only those aimed at target addresses) and sends them over a channel.
//!
//! # States
//! ```text
//! Idle ──subscribe──► Subscribed ──new block──► Filtering ──► Subscribed
//!   ▲                      │
//!   └──backoff◄──socket closed / stream error
//! ```
//! The task ends on shutdown or when the receiver is dropped.

use futures_util::StreamExt;
use subxt::events::Phase;
use subxt::ext::scale_value::Composite;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::chain::connection::ChainClient;
use crate::chain::decode::{self, ChainValue};
use crate::chain::service::Service;
use crate::chain::types::{RobonomicsError, RobonomicsResult};
use crate::config::SubscriberConfig;
use crate::encoding::ss58;
use crate::events::filter::{subscribed_kind, targets_match};
use crate::events::kinds::{AttributeKind, SubEvent};
use crate::observability::metrics;
use crate::resilience::backoff::resubscribe_delay;

/// A matched chain event.
#[derive(Debug, Clone)]
pub struct ChainEvent {
    pub kind: SubEvent,
    pub block_number: u64,
    /// Extrinsic that emitted the event; `None` for block init/finalization.
    pub extrinsic_index: Option<u32>,
    pub attributes: Composite<u32>,
}

impl ChainEvent {
    /// `"<block>-<extrinsic idx>"`.
    pub fn event_id(&self) -> String {
        match self.extrinsic_index {
            Some(index) => format!("{}-{}", self.block_number, index),
            None => format!("{}-none", self.block_number),
        }
    }

    /// Attributes as text, following the kind's attribute layout: accounts
    /// in ss58 with `ss58_prefix`, hashes as `0x` hex, byte strings as UTF-8
    /// when they are valid, numbers in decimal.
    pub fn render_attributes(&self, ss58_prefix: u16) -> Vec<String> {
        self.attributes
            .values()
            .enumerate()
            .map(|(position, value)| render_attribute(self.kind.attribute_kind(position), value, ss58_prefix))
            .collect()
    }
}

fn render_attribute(kind: AttributeKind, value: &ChainValue, ss58_prefix: u16) -> String {
    let account = |value: &ChainValue| decode::as_array32(value).map(|bytes| ss58::encode(ss58_prefix, &bytes));
    let rendered = match kind {
        AttributeKind::Account => account(value),
        AttributeKind::Accounts => decode::elements(value)
            .into_iter()
            .map(account)
            .collect::<Option<Vec<_>>>()
            .map(|accounts| format!("[{}]", accounts.join(", "))),
        AttributeKind::Hash => decode::as_hex32(value),
        AttributeKind::Bytes => decode::as_bytes(value).map(|bytes| match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => format!("0x{}", hex::encode(e.into_bytes())),
        }),
        AttributeKind::Value => None,
    };
    rendered.unwrap_or_else(|| match decode::as_u128(value) {
        Some(number) => number.to_string(),
        None => value.to_string(),
    })
}

type BestBlock = subxt::blocks::Block<subxt::PolkadotConfig, ChainClient>;

/// Why a subscription pass ended.
enum PassEnd {
    ReceiverDropped,
    Failed(RobonomicsError),
}

pub struct Subscriber {
    service: Service,
    kinds: Vec<SubEvent>,
    targets: Vec<[u8; 32]>,
    config: SubscriberConfig,
}

impl Subscriber {
    /// Create a subscriber for `kinds`.
    ///
    /// # Arguments
    /// * `targets` - ss58 addresses; when empty every event of the kinds is sent
    pub fn new(
        service: Service,
        kinds: Vec<SubEvent>,
        targets: &[String],
        config: SubscriberConfig,
    ) -> RobonomicsResult<Self> {
        let targets = targets
            .iter()
            .map(|address| ss58::account_bytes(address))
            .collect::<RobonomicsResult<Vec<_>>>()?;
        Ok(Self {
            service,
            kinds,
            targets,
            config,
        })
    }

    /// Start the subscription task.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> (mpsc::Receiver<ChainEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let handle = tokio::spawn(self.run(tx, shutdown));
        (rx, handle)
    }

    async fn run(self, tx: mpsc::Sender<ChainEvent>, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            kinds = ?self.kinds,
            targets = self.targets.len(),
            "Subscribing to chain events"
        );
        let mut attempt = 0u32;

        loop {
            let end = tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Event subscriber shut down");
                    return;
                }
                end = self.follow(&tx, &mut attempt) => end,
            };

            match end {
                PassEnd::ReceiverDropped => {
                    tracing::debug!("Event receiver dropped, stopping subscriber");
                    return;
                }
                PassEnd::Failed(e) => {
                    attempt = attempt.saturating_add(1);
                    let delay = resubscribe_delay(attempt, &self.config);
                    tracing::warn!(
                        error = %e,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Block subscription lost, resubscribing"
                    );
                    tokio::select! {
                        _ = shutdown.recv() => return,
                        _ = sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// One subscription pass; runs until the stream fails or the receiver goes away.
    async fn follow(&self, tx: &mpsc::Sender<ChainEvent>, attempt: &mut u32) -> PassEnd {
        let blocks = self
            .service
            .connection()
            .call(|node| async move {
                let api = node.api().await?;
                Ok(api.blocks().subscribe_best().await?)
            })
            .await;
        let mut blocks = match blocks {
            Ok(blocks) => blocks,
            Err(e) => return PassEnd::Failed(e),
        };

        while let Some(block) = blocks.next().await {
            let matched = match block {
                Ok(block) => self.matching_events(&block).await,
                Err(e) => Err(e.into()),
            };
            let matched = match matched {
                Ok(matched) => matched,
                Err(e) => return PassEnd::Failed(e),
            };
            *attempt = 0;

            for event in matched {
                metrics::record_event_matched(event.kind.variant());
                tracing::debug!(kind = %event.kind, event_id = %event.event_id(), "Matched chain event");
                if tx.send(event).await.is_err() {
                    return PassEnd::ReceiverDropped;
                }
            }
        }

        PassEnd::Failed(RobonomicsError::ConnectionClosed(
            "block subscription ended".to_string(),
        ))
    }

    async fn matching_events(&self, block: &BestBlock) -> RobonomicsResult<Vec<ChainEvent>> {
        let block_number: u64 = block.number().into();
        let events = block.events().await?;
        let mut matched = Vec::new();

        for event in events.iter() {
            let event = event?;
            let kind = match subscribed_kind(&self.kinds, event.pallet_name(), event.variant_name()) {
                Some(kind) => kind,
                None => continue,
            };
            let attributes = event.field_values()?;
            if !targets_match(kind, &attributes, &self.targets) {
                continue;
            }
            let extrinsic_index = match event.phase() {
                Phase::ApplyExtrinsic(index) => Some(index),
                _ => None,
            };
            matched.push(ChainEvent {
                kind,
                block_number,
                extrinsic_index,
                attributes,
            });
        }
        Ok(matched)
    }
}
