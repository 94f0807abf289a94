//! Digital twins: owned maps from hashed topics to source accounts.

use subxt::dynamic::Value;

use crate::chain::decode::{self, ChainValue};
use crate::chain::service::{account_arg, call_args, Service};
use crate::chain::types::{ExtrinsicOutcome, RobonomicsError, RobonomicsResult, H256};
use crate::encoding::{dt_encode_topic, parse_h256};
use crate::modules::scan_backward;

/// One topic of a twin: `0x` sha256 of the topic name and its source address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSource {
    pub topic: String,
    pub source: String,
}

/// Find the source of an already hashed topic.
pub fn find_source<'a>(map: &'a [TopicSource], topic_hashed: &str) -> Option<&'a str> {
    map.iter()
        .find(|entry| entry.topic.eq_ignore_ascii_case(topic_hashed))
        .map(|entry| entry.source.as_str())
}

#[derive(Clone, Debug)]
pub struct DigitalTwin {
    service: Service,
}

impl DigitalTwin {
    pub fn new(service: Service) -> Self {
        Self { service }
    }

    fn decode_map(&self, value: &ChainValue) -> RobonomicsResult<Vec<TopicSource>> {
        decode::elements(value)
            .into_iter()
            .map(|pair| {
                let topic = decode::element(pair, 0)
                    .and_then(decode::as_hex32)
                    .ok_or_else(|| RobonomicsError::Decode("digital twin topic".to_string()))?;
                let source = decode::element(pair, 1)
                    .and_then(decode::as_array32)
                    .ok_or_else(|| RobonomicsError::Decode("digital twin source".to_string()))?;
                Ok(TopicSource {
                    topic,
                    source: self.service.account().format_address(&source),
                })
            })
            .collect()
    }

    /// Topic map of twin `dt_id`, `None` when no such twin exists.
    pub async fn get_info(
        &self,
        dt_id: u32,
        block_hash: Option<H256>,
    ) -> RobonomicsResult<Option<Vec<TopicSource>>> {
        tracing::info!(dt_id = dt_id, "Fetching digital twin info");
        let value = self
            .service
            .chainstate_query("DigitalTwin", "DigitalTwin", vec![Value::u128(dt_id.into())], block_hash)
            .await?;
        value.as_ref().map(|v| self.decode_map(v)).transpose()
    }

    /// Owner address of twin `dt_id`.
    pub async fn get_owner(&self, dt_id: u32, block_hash: Option<H256>) -> RobonomicsResult<Option<String>> {
        tracing::info!(dt_id = dt_id, "Fetching digital twin owner");
        let value = self
            .service
            .chainstate_query("DigitalTwin", "Owner", vec![Value::u128(dt_id.into())], block_hash)
            .await?;
        Ok(value
            .as_ref()
            .and_then(decode::as_array32)
            .map(|owner| self.service.account().format_address(&owner)))
    }

    /// Number of twins ever created.
    pub async fn get_total(&self, block_hash: Option<H256>) -> RobonomicsResult<Option<u32>> {
        tracing::info!("Fetching total number of digital twins");
        let value = self
            .service
            .chainstate_query("DigitalTwin", "Total", Vec::new(), block_hash)
            .await?;
        Ok(value
            .as_ref()
            .and_then(decode::as_u64)
            .and_then(|total| u32::try_from(total).ok()))
    }

    /// Source address of `topic` (plain string, hashed here) in twin `dt_id`.
    ///
    /// # Errors
    /// `DigitalTwinMap` when the twin has no map or the topic is not in it.
    pub async fn get_source(
        &self,
        dt_id: u32,
        topic: &str,
        block_hash: Option<H256>,
    ) -> RobonomicsResult<String> {
        let map = match self.get_info(dt_id, block_hash).await? {
            Some(map) if !map.is_empty() => map,
            _ => {
                return Err(RobonomicsError::DigitalTwinMap(format!(
                    "no digital twin with id {} or its map is empty",
                    dt_id
                )))
            }
        };

        let topic_hashed = dt_encode_topic(topic);
        find_source(&map, &topic_hashed)
            .map(str::to_string)
            .ok_or_else(|| {
                RobonomicsError::DigitalTwinMap(format!(
                    "no topic '{}' in digital twin with id {}",
                    topic, dt_id
                ))
            })
    }

    /// Create a twin and find its id: the highest id owned by this account.
    ///
    /// When no owned id is found the current total is returned.
    pub async fn create(&self, nonce: Option<u64>) -> RobonomicsResult<(u32, ExtrinsicOutcome)> {
        let outcome = self.service.extrinsic("DigitalTwin", "create", Vec::new(), nonce).await?;
        let me = self.service.account().get_address()?.to_string();

        let total = self.get_total(None).await?.unwrap_or(0);
        let found = scan_backward(total, |id| {
            let me = me.clone();
            async move { Ok(self.get_owner(id, None).await?.as_deref() == Some(me.as_str())) }
        })
        .await?;

        let dt_id = found.unwrap_or(total);
        tracing::info!(dt_id = dt_id, "Digital twin created");
        Ok((dt_id, outcome))
    }

    /// Point `topic` of twin `dt_id` to `source`.
    ///
    /// # Returns
    /// The hashed topic as stored on chain and the extrinsic outcome.
    pub async fn set_source(
        &self,
        dt_id: u32,
        topic: &str,
        source: &str,
        nonce: Option<u64>,
    ) -> RobonomicsResult<(String, ExtrinsicOutcome)> {
        let topic_hashed = dt_encode_topic(topic);
        tracing::info!(dt_id = dt_id, topic = %topic_hashed, source = %source, "Setting digital twin source");

        let args = call_args([
            ("id", Value::u128(dt_id.into())),
            ("topic", Value::from_bytes(parse_h256(&topic_hashed)?)),
            ("source", account_arg(source)?),
        ]);
        let outcome = self.service.extrinsic("DigitalTwin", "set_source", args, nonce).await?;
        Ok((topic_hashed, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::account::Account;
    use crate::chain::decode::tests::{account_value, decoded};
    use crate::config::ClientConfig;

    fn twin() -> DigitalTwin {
        let config = ClientConfig::default();
        DigitalTwin::new(Service::new(Account::read_only(&config), &config))
    }

    #[test]
    fn test_decode_map() {
        let topic = parse_h256(&dt_encode_topic("temperature")).unwrap();
        let value = decoded(Value::unnamed_composite([Value::unnamed_composite([
            Value::from_bytes(topic),
            account_value([1; 32]),
        ])]));

        let map = twin().decode_map(&value).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[0].topic, dt_encode_topic("temperature"));
        assert!(map[0].source.starts_with('4'));
    }

    #[test]
    fn test_find_source() {
        let map = vec![
            TopicSource {
                topic: dt_encode_topic("a"),
                source: "4A".to_string(),
            },
            TopicSource {
                topic: dt_encode_topic("b"),
                source: "4B".to_string(),
            },
        ];
        assert_eq!(find_source(&map, &dt_encode_topic("b")), Some("4B"));
        assert_eq!(find_source(&map, &dt_encode_topic("c")), None);
    }
}
