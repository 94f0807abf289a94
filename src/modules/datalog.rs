//! Datalog: an append-only per-account log of short records.

use subxt::dynamic::Value;

use crate::chain::decode::{self, ChainValue};
use crate::chain::service::{account_arg, call_args, Service};
use crate::chain::types::{ExtrinsicOutcome, RobonomicsError, RobonomicsResult, H256};

/// Longest record the pallet accepts, in bytes.
pub const MAX_RECORD_BYTES: usize = 512;

/// Ring index of an account's records; `end` is one past the latest,
/// modulo the pallet's window size. `start == end` means the log is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatalogIndex {
    pub start: u64,
    pub end: u64,
}

impl DatalogIndex {
    /// Index of the latest record in a ring of `window_size` slots, `None`
    /// when the log is empty.
    pub fn latest(&self, window_size: u64) -> Option<u64> {
        if self.start == self.end || window_size == 0 {
            return None;
        }
        Some((self.end % window_size + window_size - 1) % window_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatalogRecord {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub data: String,
}

impl DatalogRecord {
    /// Decode a `(Moment, Record)` tuple; a zero timestamp is the empty default.
    fn from_chain(value: &ChainValue) -> RobonomicsResult<Option<Self>> {
        let timestamp = decode::element(value, 0)
            .and_then(decode::as_u64)
            .ok_or_else(|| RobonomicsError::Decode("datalog timestamp".to_string()))?;
        if timestamp == 0 {
            return Ok(None);
        }
        let data = decode::element(value, 1)
            .and_then(decode::as_bytes)
            .ok_or_else(|| RobonomicsError::Decode("datalog payload".to_string()))?;
        Ok(Some(Self {
            timestamp,
            data: String::from_utf8_lossy(&data).into_owned(),
        }))
    }
}

/// Reject records the pallet would refuse.
pub fn check_record(data: &str) -> RobonomicsResult<()> {
    if data.len() > MAX_RECORD_BYTES {
        return Err(RobonomicsError::Payload(format!(
            "datalog record is {} bytes, limit is {}",
            data.len(),
            MAX_RECORD_BYTES
        )));
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct Datalog {
    service: Service,
}

impl Datalog {
    pub fn new(service: Service) -> Self {
        Self { service }
    }

    /// Datalog index of `addr` (own account when `None`).
    pub async fn get_index(
        &self,
        addr: Option<&str>,
        block_hash: Option<H256>,
    ) -> RobonomicsResult<DatalogIndex> {
        let address = self.service.account().address_or_own(addr)?;
        tracing::info!(address = %address, "Fetching datalog index");

        let value = self
            .service
            .chainstate_query("Datalog", "DatalogIndex", vec![account_arg(&address)?], block_hash)
            .await?;

        match value {
            Some(index) => Ok(DatalogIndex {
                start: decode::field_u64(&index, "start")?,
                end: decode::field_u64(&index, "end")?,
            }),
            None => Ok(DatalogIndex::default()),
        }
    }

    /// Number of record slots per account (`Datalog.WindowSize`).
    pub async fn window_size(&self) -> RobonomicsResult<u64> {
        let value = self.service.constant("Datalog", "WindowSize").await?;
        decode::as_u64(&value).ok_or_else(|| RobonomicsError::Decode("datalog window size".to_string()))
    }

    /// Fetch a datalog record.
    ///
    /// # Arguments
    /// * `addr` - log owner; the own account when `None`
    /// * `index` - record index; the latest record when `None`
    /// * `block_hash` - read state as of this block
    ///
    /// # Returns
    /// `None` when there is no such record.
    pub async fn get_item(
        &self,
        addr: Option<&str>,
        index: Option<u64>,
        block_hash: Option<H256>,
    ) -> RobonomicsResult<Option<DatalogRecord>> {
        let address = self.service.account().address_or_own(addr)?;

        let index = match index {
            Some(index) => index,
            None => match self
                .get_index(Some(&address), block_hash)
                .await?
                .latest(self.window_size().await?)
            {
                Some(latest) => latest,
                None => return Ok(None),
            },
        };
        tracing::info!(address = %address, index = index, "Fetching datalog record");

        let key = Value::unnamed_composite([account_arg(&address)?, Value::u128(index as u128)]);
        let value = self
            .service
            .chainstate_query("Datalog", "DatalogItem", vec![key], block_hash)
            .await?;

        match value {
            Some(record) => DatalogRecord::from_chain(&record),
            None => Ok(None),
        }
    }

    /// Write a record of at most [`MAX_RECORD_BYTES`] bytes.
    pub async fn record(&self, data: &str, nonce: Option<u64>) -> RobonomicsResult<ExtrinsicOutcome> {
        check_record(data)?;
        tracing::info!(bytes = data.len(), "Writing datalog");
        let args = call_args([("record", Value::from_bytes(data.as_bytes()))]);
        self.service.extrinsic("Datalog", "record", args, nonce).await
    }

    /// Erase all records of the own account.
    pub async fn erase(&self, nonce: Option<u64>) -> RobonomicsResult<ExtrinsicOutcome> {
        tracing::info!("Erasing all datalog records");
        self.service.extrinsic("Datalog", "erase", Vec::new(), nonce).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::decode::tests::decoded;

    #[test]
    fn test_latest_index() {
        assert_eq!(DatalogIndex { start: 0, end: 0 }.latest(128), None);
        assert_eq!(DatalogIndex { start: 0, end: 5 }.latest(128), Some(4));
        assert_eq!(DatalogIndex { start: 2, end: 5 }.latest(128), Some(4));
        assert_eq!(DatalogIndex { start: 3, end: 3 }.latest(128), None);
    }

    #[test]
    fn test_latest_index_after_wrap() {
        assert_eq!(DatalogIndex { start: 3, end: 0 }.latest(128), Some(127));
        assert_eq!(DatalogIndex { start: 1, end: 0 }.latest(4), Some(3));
        assert_eq!(DatalogIndex { start: 3, end: 2 }.latest(4), Some(1));
        assert_eq!(DatalogIndex { start: 1, end: 0 }.latest(0), None);
    }

    #[test]
    fn test_record_decoding() {
        let value = decoded(Value::unnamed_composite([
            Value::u128(1_650_000_000_000),
            Value::from_bytes(b"temperature: 21"),
        ]));
        let record = DatalogRecord::from_chain(&value).unwrap().unwrap();
        assert_eq!(record.timestamp, 1_650_000_000_000);
        assert_eq!(record.data, "temperature: 21");
    }

    #[test]
    fn test_zero_timestamp_is_absent() {
        let value = decoded(Value::unnamed_composite([Value::u128(0), Value::from_bytes(b"")]));
        assert_eq!(DatalogRecord::from_chain(&value).unwrap(), None);
    }

    #[test]
    fn test_record_length_limit() {
        assert!(check_record(&"x".repeat(MAX_RECORD_BYTES)).is_ok());
        assert!(matches!(
            check_record(&"x".repeat(MAX_RECORD_BYTES + 1)),
            Err(RobonomicsError::Payload(_))
        ));
    }
}
