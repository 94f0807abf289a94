//! Liabilities: agreements between a promisee and a promisor.
//!
//! # Lifecycle
//! ```text
//! both parties sign (technics, economics) ──► create ──► agreement #n
//! promisor signs (n, report)              ──► finalize ──► report #n
//! ```
//!
//! Signed messages are SCALE encoded:
//! - agreement: `H256 technics ++ Compact<u128> economics`
//! - report: `u32 index ++ H256 report`

use subxt::dynamic::Value;
use subxt::ext::codec::{Compact, Encode};

use crate::chain::decode::{self, ChainValue};
use crate::chain::service::{account_arg, Service};
use crate::chain::types::{CryptoType, ExtrinsicOutcome, RobonomicsError, RobonomicsResult, H256};
use crate::encoding::{hash_or_ipfs_to_bytes, parse_hex};
use crate::modules::scan_backward;

/// A `MultiSignature`: scheme and `0x` hex bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub kind: String,
    pub hex: String,
}

impl Signature {
    fn from_chain(value: &ChainValue) -> RobonomicsResult<Self> {
        let (kind, fields) = decode::as_variant(value)
            .ok_or_else(|| RobonomicsError::Decode("signature is not a MultiSignature".to_string()))?;
        let bytes = fields
            .values()
            .next()
            .and_then(decode::as_bytes)
            .ok_or_else(|| RobonomicsError::Decode("signature bytes".to_string()))?;
        Ok(Self {
            kind: kind.to_string(),
            hex: format!("0x{}", hex::encode(bytes)),
        })
    }
}

/// `Liability.AgreementOf` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agreement {
    pub technics: String,
    pub economics: u128,
    pub promisee: String,
    pub promisor: String,
    pub promisee_signature: Signature,
    pub promisor_signature: Signature,
}

/// `Liability.ReportOf` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub index: u32,
    pub sender: String,
    pub payload: String,
    pub signature: Signature,
}

/// Everything needed to create a liability.
#[derive(Debug, Clone)]
pub struct LiabilityParams {
    /// 32-byte `0x` hex or IPFS `Qm...` hash describing the job.
    pub technics: String,
    /// Promisor reward in the smallest unit.
    pub economics: u128,
    pub promisee: String,
    pub promisor: String,
    pub promisee_signature: String,
    pub promisor_signature: String,
    pub promisee_crypto: CryptoType,
    pub promisor_crypto: CryptoType,
}

/// Message both parties sign to agree on a liability.
pub fn liability_message(technics: &[u8; 32], economics: u128) -> Vec<u8> {
    let mut message = technics.encode();
    message.extend(Compact(economics).encode());
    message
}

/// Message the promisor signs to report a finished job.
pub fn report_message(index: u32, report: &[u8; 32]) -> Vec<u8> {
    let mut message = index.encode();
    message.extend(report.encode());
    message
}

/// Whether a stored agreement carries the given promisee signature.
pub fn promisee_signed(agreement: &Agreement, crypto: CryptoType, signature: &str) -> bool {
    agreement.promisee_signature.kind == crypto.variant()
        && agreement.promisee_signature.hex.eq_ignore_ascii_case(signature)
}

fn multi_signature(crypto: CryptoType, signature: &str) -> RobonomicsResult<Value> {
    let bytes = parse_hex(signature)?;
    Ok(Value::unnamed_variant(crypto.variant(), [Value::from_bytes(bytes)]))
}

#[derive(Clone, Debug)]
pub struct Liability {
    service: Service,
}

impl Liability {
    pub fn new(service: Service) -> Self {
        Self { service }
    }

    fn address(&self, value: &ChainValue, name: &str) -> RobonomicsResult<String> {
        let account = decode::field_array32(value, name)?;
        Ok(self.service.account().format_address(&account))
    }

    fn decode_agreement(&self, value: &ChainValue) -> RobonomicsResult<Agreement> {
        let technics = decode::field(value, "technics")?;
        let economics = decode::field(value, "economics")?;
        Ok(Agreement {
            technics: format!("0x{}", hex::encode(decode::field_array32(technics, "hash")?)),
            economics: decode::field_u128(economics, "price")?,
            promisee: self.address(value, "promisee")?,
            promisor: self.address(value, "promisor")?,
            promisee_signature: Signature::from_chain(decode::field(value, "promisee_signature")?)?,
            promisor_signature: Signature::from_chain(decode::field(value, "promisor_signature")?)?,
        })
    }

    fn decode_report(&self, value: &ChainValue) -> RobonomicsResult<Report> {
        let index = decode::field_u64(value, "index")?;
        Ok(Report {
            index: u32::try_from(index)
                .map_err(|_| RobonomicsError::Decode("report index overflows u32".to_string()))?,
            sender: self.address(value, "sender")?,
            payload: format!(
                "0x{}",
                hex::encode(decode::field_array32(decode::field(value, "payload")?, "hash")?)
            ),
            signature: Signature::from_chain(decode::field(value, "signature")?)?,
        })
    }

    /// Agreement with `index`, `None` when there is none.
    pub async fn get_agreement(
        &self,
        index: u32,
        block_hash: Option<H256>,
    ) -> RobonomicsResult<Option<Agreement>> {
        tracing::info!(index = index, "Fetching liability agreement");
        let value = self
            .service
            .chainstate_query("Liability", "AgreementOf", vec![Value::u128(index.into())], block_hash)
            .await?;
        value.as_ref().map(|v| self.decode_agreement(v)).transpose()
    }

    /// Number of liabilities ever created (latest index + 1).
    pub async fn get_latest_index(&self, block_hash: Option<H256>) -> RobonomicsResult<Option<u32>> {
        tracing::info!("Fetching total number of liabilities");
        let value = self
            .service
            .chainstate_query("Liability", "LatestIndex", Vec::new(), block_hash)
            .await?;
        Ok(value
            .as_ref()
            .and_then(decode::as_u64)
            .and_then(|total| u32::try_from(total).ok()))
    }

    /// Report of liability `index`, `None` when it is not finalized.
    pub async fn get_report(&self, index: u32, block_hash: Option<H256>) -> RobonomicsResult<Option<Report>> {
        tracing::info!(index = index, "Fetching liability report");
        let value = self
            .service
            .chainstate_query("Liability", "ReportOf", vec![Value::u128(index.into())], block_hash)
            .await?;
        value.as_ref().map(|v| self.decode_report(v)).transpose()
    }

    /// Create a liability. May be submitted by any account holding both signatures.
    ///
    /// # Returns
    /// Index of the agreement carrying the supplied promisee signature, and
    /// the extrinsic outcome.
    pub async fn create(
        &self,
        params: LiabilityParams,
        nonce: Option<u64>,
    ) -> RobonomicsResult<(u32, ExtrinsicOutcome)> {
        tracing::info!(
            promisee = %params.promisee,
            promisor = %params.promisor,
            technics = %params.technics,
            economics = params.economics,
            "Creating liability"
        );
        let technics = hash_or_ipfs_to_bytes(&params.technics)?;

        let agreement = Value::named_composite([
            ("technics", Value::named_composite([("hash", Value::from_bytes(technics))])),
            ("economics", Value::named_composite([("price", Value::u128(params.economics))])),
            ("promisee", account_arg(&params.promisee)?),
            ("promisor", account_arg(&params.promisor)?),
            (
                "promisee_signature",
                multi_signature(params.promisee_crypto, &params.promisee_signature)?,
            ),
            (
                "promisor_signature",
                multi_signature(params.promisor_crypto, &params.promisor_signature)?,
            ),
        ]);
        let outcome = self
            .service
            .extrinsic("Liability", "create", vec![("agreement".to_string(), agreement)], nonce)
            .await?;

        let total = self.get_latest_index(None).await?.unwrap_or(0).max(1);
        let crypto = params.promisee_crypto;
        let signature = params.promisee_signature.as_str();
        let found = scan_backward(total, |index| async move {
            Ok(self
                .get_agreement(index, None)
                .await?
                .map(|agreement| promisee_signed(&agreement, crypto, signature))
                .unwrap_or(false))
        })
        .await?;

        Ok((found.unwrap_or(total - 1), outcome))
    }

    /// Sign `(technics, economics)` with the own key, `0x` hex.
    pub fn sign_liability(&self, technics: &str, economics: u128) -> RobonomicsResult<String> {
        let technics = hash_or_ipfs_to_bytes(technics)?;
        tracing::info!(economics = economics, "Signing liability proof");
        self.service.account().sign(&liability_message(&technics, economics))
    }

    /// Sign `(index, report)` with the own key, `0x` hex.
    pub fn sign_report(&self, index: u32, report: &str) -> RobonomicsResult<String> {
        let report = hash_or_ipfs_to_bytes(report)?;
        tracing::info!(index = index, "Signing liability report");
        self.service.account().sign(&report_message(index, &report))
    }

    /// Report a finished job.
    ///
    /// # Arguments
    /// * `promisor` - promisor address; the own account when `None`
    /// * `promisor_crypto` - scheme of the promisor signature
    /// * `signature` - promisor signature of the report; signed here when `None`
    pub async fn finalize(
        &self,
        index: u32,
        report: &str,
        promisor: Option<&str>,
        promisor_crypto: CryptoType,
        signature: Option<&str>,
        nonce: Option<u64>,
    ) -> RobonomicsResult<ExtrinsicOutcome> {
        let sender = self.service.account().address_or_own(promisor)?;
        tracing::info!(index = index, promisor = %sender, "Finalizing liability");

        let report_hash = hash_or_ipfs_to_bytes(report)?;
        let signature = match signature {
            Some(signature) => signature.to_string(),
            None => self.sign_report(index, report)?,
        };

        let report = Value::named_composite([
            ("index", Value::u128(index.into())),
            ("sender", account_arg(&sender)?),
            ("payload", Value::named_composite([("hash", Value::from_bytes(report_hash))])),
            ("signature", multi_signature(promisor_crypto, &signature)?),
        ]);
        self.service
            .extrinsic("Liability", "finalize", vec![("report".to_string(), report)], nonce)
            .await
    }
}
