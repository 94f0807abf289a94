//! Robonomics Web Services subscriptions: auctions, ledger and devices.
//!
//! A subscription owner lists delegate devices; those devices may then send
//! extrinsics wrapped in `RWS.call` on the owner's subscription (see
//! `extrinsics.rws_sub_owner` in the configuration).

use std::time::{SystemTime, UNIX_EPOCH};

use subxt::dynamic::Value;

use crate::chain::decode::{self, ChainValue};
use crate::chain::service::{account_arg, call_args, Service};
use crate::chain::types::{ExtrinsicOutcome, RobonomicsError, RobonomicsResult, H256};

const DAY_MS: u64 = 86_400_000;

/// Subscription kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionKind {
    Daily { days: u32 },
    Lifetime { tps: u32 },
}

impl SubscriptionKind {
    fn from_chain(value: &ChainValue) -> RobonomicsResult<Self> {
        let (name, fields) = decode::as_variant(value)
            .ok_or_else(|| RobonomicsError::Decode("subscription kind is not an enum".to_string()))?;
        let inner = fields
            .values()
            .next()
            .and_then(decode::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| RobonomicsError::Decode(format!("subscription kind {} without value", name)))?;
        match name {
            "Daily" => Ok(SubscriptionKind::Daily { days: inner }),
            "Lifetime" => Ok(SubscriptionKind::Lifetime { tps: inner }),
            other => Err(RobonomicsError::Decode(format!("unknown subscription kind {}", other))),
        }
    }
}

/// `RWS.Ledger` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    pub kind: SubscriptionKind,
    /// Milliseconds since the Unix epoch.
    pub issue_time: u64,
    pub last_update: u64,
    pub free_weight: u64,
}

impl Ledger {
    fn from_chain(value: &ChainValue) -> RobonomicsResult<Self> {
        Ok(Self {
            kind: SubscriptionKind::from_chain(decode::field(value, "kind")?)?,
            issue_time: decode::field_u64(value, "issue_time")?,
            last_update: decode::field_u64(value, "last_update").unwrap_or_default(),
            free_weight: decode::field_u64(value, "free_weight").unwrap_or_default(),
        })
    }
}

/// `RWS.AuctionLedger` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auction {
    pub winner: Option<String>,
    pub best_price: u128,
    pub kind: SubscriptionKind,
}

/// Remaining time of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaysLeft {
    /// No subscription, or it has expired.
    Inactive,
    Lifetime,
    /// Days left, a started day counting as a whole one.
    Days(u64),
}

/// Days left on `ledger` at `now_ms`.
pub fn days_left(ledger: Option<&Ledger>, now_ms: u64) -> DaysLeft {
    let ledger = match ledger {
        Some(ledger) => ledger,
        None => return DaysLeft::Inactive,
    };
    match ledger.kind {
        SubscriptionKind::Lifetime { .. } => DaysLeft::Lifetime,
        SubscriptionKind::Daily { days } => {
            let expires = ledger.issue_time.saturating_add(DAY_MS * u64::from(days));
            if expires < now_ms {
                DaysLeft::Inactive
            } else {
                DaysLeft::Days((expires - now_ms) / DAY_MS + 1)
            }
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Clone, Debug)]
pub struct Rws {
    service: Service,
}

impl Rws {
    pub fn new(service: Service) -> Self {
        Self { service }
    }

    fn addresses(&self, value: &ChainValue) -> RobonomicsResult<Vec<String>> {
        decode::elements(value)
            .into_iter()
            .map(|device| {
                decode::as_array32(device)
                    .map(|account| self.service.account().format_address(&account))
                    .ok_or_else(|| RobonomicsError::Decode("device is not an account".to_string()))
            })
            .collect()
    }

    /// Subscription auction `index`.
    pub async fn get_auction(&self, index: u32, block_hash: Option<H256>) -> RobonomicsResult<Option<Auction>> {
        tracing::info!(index = index, "Fetching auction information");
        let value = self
            .service
            .chainstate_query("RWS", "Auction", vec![Value::u128(index.into())], block_hash)
            .await?;

        let value = match value {
            Some(value) => value,
            None => return Ok(None),
        };
        let winner = decode::as_option(decode::field(&value, "winner")?)
            .and_then(decode::as_array32)
            .map(|account| self.service.account().format_address(&account));
        Ok(Some(Auction {
            winner,
            best_price: decode::field_u128(&value, "best_price")?,
            kind: SubscriptionKind::from_chain(decode::field(&value, "kind")?)?,
        }))
    }

    /// Index of the next auction to be unlocked.
    pub async fn get_auction_next(&self, block_hash: Option<H256>) -> RobonomicsResult<Option<u32>> {
        tracing::info!("Fetching index of the next auction");
        let value = self
            .service
            .chainstate_query("RWS", "AuctionNext", Vec::new(), block_hash)
            .await?;
        Ok(value.as_ref().and_then(decode::as_u64).and_then(|v| u32::try_from(v).ok()))
    }

    /// Auctions waiting for bids.
    pub async fn get_auction_queue(&self, block_hash: Option<H256>) -> RobonomicsResult<Vec<u32>> {
        tracing::info!("Fetching auction queue");
        let value = self
            .service
            .chainstate_query("RWS", "AuctionQueue", Vec::new(), block_hash)
            .await?;
        Ok(value
            .as_ref()
            .map(|queue| {
                decode::elements(queue)
                    .into_iter()
                    .filter_map(decode::as_u64)
                    .filter_map(|v| u32::try_from(v).ok())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Devices of the subscription held by `addr` (own account when `None`).
    pub async fn get_devices(&self, addr: Option<&str>, block_hash: Option<H256>) -> RobonomicsResult<Vec<String>> {
        let address = self.service.account().address_or_own(addr)?;
        tracing::info!(owner = %address, "Fetching RWS devices");
        let value = self
            .service
            .chainstate_query("RWS", "Devices", vec![account_arg(&address)?], block_hash)
            .await?;
        match value {
            Some(devices) => self.addresses(&devices),
            None => Ok(Vec::new()),
        }
    }

    /// Subscription held by `addr` (own account when `None`).
    pub async fn get_ledger(&self, addr: Option<&str>, block_hash: Option<H256>) -> RobonomicsResult<Option<Ledger>> {
        let address = self.service.account().address_or_own(addr)?;
        tracing::info!(owner = %address, "Fetching subscription ledger");
        let value = self
            .service
            .chainstate_query("RWS", "Ledger", vec![account_arg(&address)?], block_hash)
            .await?;
        value.as_ref().map(Ledger::from_chain).transpose()
    }

    /// Remaining time of the subscription held by `addr`.
    pub async fn get_days_left(&self, addr: Option<&str>, block_hash: Option<H256>) -> RobonomicsResult<DaysLeft> {
        let ledger = self.get_ledger(addr, block_hash).await?;
        Ok(days_left(ledger.as_ref(), now_ms()))
    }

    /// Whether `addr` (own account when `None`) is a device of `sub_owner`.
    pub async fn is_in_sub(
        &self,
        sub_owner: &str,
        addr: Option<&str>,
        block_hash: Option<H256>,
    ) -> RobonomicsResult<bool> {
        let address = self.service.account().address_or_own(addr)?;
        let devices = self.get_devices(Some(sub_owner), block_hash).await?;
        Ok(devices.iter().any(|device| device == &address))
    }

    /// Bid `amount` on auction `index`.
    pub async fn bid(&self, index: u32, amount: u128) -> RobonomicsResult<ExtrinsicOutcome> {
        tracing::info!(index = index, amount = amount, "Bidding on auction");
        let args = call_args([("index", Value::u128(index.into())), ("amount", Value::u128(amount))]);
        self.service.extrinsic("RWS", "bid", args, None).await
    }

    /// Replace the devices allowed to use the own subscription.
    pub async fn set_devices(&self, devices: &[String]) -> RobonomicsResult<ExtrinsicOutcome> {
        tracing::info!(devices = ?devices, "Setting RWS devices");
        let accounts = devices
            .iter()
            .map(|device| account_arg(device))
            .collect::<RobonomicsResult<Vec<_>>>()?;
        let args = call_args([("devices", Value::unnamed_composite(accounts))]);
        self.service.extrinsic("RWS", "set_devices", args, None).await
    }
}
