//! [`BeaconSource`] over the standard beacon node REST API.

use std::collections::HashMap;
use std::str::FromStr;

use alloy_primitives::B256;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use stader_types::{
    BeaconValidatorState, BeaconValidatorStatus, ExecutionBlockRef, ValidatorPubkey,
};
use tracing::{debug, trace};

use crate::config::ClientConfig;
use crate::error::{ChainError, ChainResult};
use crate::traits::{BeaconSource, SlotTag};

fn quoted_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct HeaderData {
    header: SignedHeader,
}

#[derive(Debug, Deserialize)]
struct SignedHeader {
    message: HeaderMessage,
}

#[derive(Debug, Deserialize)]
struct HeaderMessage {
    #[serde(deserialize_with = "quoted_u64")]
    slot: u64,
}

#[derive(Debug, Deserialize)]
struct SignedBlock {
    message: BlockMessage,
}

#[derive(Debug, Deserialize)]
struct BlockMessage {
    #[serde(deserialize_with = "quoted_u64")]
    slot: u64,
    body: BlockBody,
}

#[derive(Debug, Deserialize)]
struct BlockBody {
    execution_payload: Option<ExecutionPayload>,
}

#[derive(Debug, Deserialize)]
struct ExecutionPayload {
    #[serde(deserialize_with = "quoted_u64")]
    block_number: u64,
    block_hash: B256,
}

#[derive(Debug, Deserialize)]
struct ValidatorEntry {
    #[serde(deserialize_with = "quoted_u64")]
    index: u64,
    #[serde(deserialize_with = "quoted_u64")]
    balance: u64,
    status: String,
    validator: ValidatorData,
}

#[derive(Debug, Deserialize)]
struct ValidatorData {
    pubkey: ValidatorPubkey,
    slashed: bool,
    #[serde(deserialize_with = "quoted_u64")]
    activation_epoch: u64,
    #[serde(deserialize_with = "quoted_u64")]
    exit_epoch: u64,
    #[serde(deserialize_with = "quoted_u64")]
    withdrawable_epoch: u64,
}

impl TryFrom<ValidatorEntry> for BeaconValidatorStatus {
    type Error = ChainError;

    fn try_from(entry: ValidatorEntry) -> Result<Self, Self::Error> {
        let state = BeaconValidatorState::from_str(&entry.status)
            .map_err(ChainError::InvalidResponse)?;
        Ok(Self {
            pubkey: entry.validator.pubkey,
            index: entry.index,
            state,
            slashed: entry.validator.slashed,
            balance_gwei: entry.balance,
            activation_epoch: entry.validator.activation_epoch,
            exit_epoch: entry.validator.exit_epoch,
            withdrawable_epoch: entry.validator.withdrawable_epoch,
        })
    }
}

fn execution_block(block: SignedBlock) -> ChainResult<ExecutionBlockRef> {
    let slot = block.message.slot;
    let payload = block.message.body.execution_payload.ok_or_else(|| {
        ChainError::InvalidResponse(format!("block at slot {slot} has no execution payload"))
    })?;
    Ok(ExecutionBlockRef {
        slot,
        block_number: payload.block_number,
        block_hash: payload.block_hash,
    })
}

/// Beacon node client speaking the standard REST API.
pub struct HttpBeaconSource {
    client: Client,
    base_url: String,
    batch_size: usize,
}

impl HttpBeaconSource {
    /// Create a client for the beacon node at `base_url`.
    pub fn new(base_url: &str, config: &ClientConfig) -> ChainResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            batch_size: config.beacon_batch_size.max(1),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path`, mapping 404 to `None`.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> ChainResult<Option<T>> {
        let url = self.endpoint(path);
        trace!(%url, "beacon GET");
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(Some(envelope.data))
    }
}

#[async_trait]
impl BeaconSource for HttpBeaconSource {
    async fn slot(&self, tag: SlotTag) -> ChainResult<u64> {
        let header: HeaderData = self
            .get(&format!("eth/v1/beacon/headers/{}", tag.as_str()))
            .await?
            .ok_or_else(|| ChainError::NotFound(format!("{} header", tag.as_str())))?;
        Ok(header.header.message.slot)
    }

    async fn execution_block_at_slot(&self, slot: u64) -> ChainResult<Option<ExecutionBlockRef>> {
        let block: Option<SignedBlock> = self.get(&format!("eth/v2/beacon/blocks/{slot}")).await?;
        block.map(execution_block).transpose()
    }

    async fn validator_statuses(
        &self,
        pubkeys: &[ValidatorPubkey],
        slot: u64,
    ) -> ChainResult<HashMap<ValidatorPubkey, BeaconValidatorStatus>> {
        let url = self.endpoint(&format!("eth/v1/beacon/states/{slot}/validators"));
        let mut statuses = HashMap::with_capacity(pubkeys.len());
        for chunk in pubkeys.chunks(self.batch_size) {
            let ids: Vec<String> = chunk.iter().map(ValidatorPubkey::to_hex).collect();
            trace!(%url, keys = ids.len(), "beacon POST");
            let response = self
                .client
                .post(&url)
                .json(&serde_json::json!({ "ids": ids }))
                .send()
                .await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Err(ChainError::NotFound(format!("beacon state at slot {slot}")));
            }
            let envelope: Envelope<Vec<ValidatorEntry>> =
                response.error_for_status()?.json().await?;
            for entry in envelope.data {
                let status = BeaconValidatorStatus::try_from(entry)?;
                statuses.insert(status.pubkey, status);
            }
        }
        debug!(
            slot,
            requested = pubkeys.len(),
            found = statuses.len(),
            "Fetched validator statuses"
        );
        Ok(statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBKEY: &str = "0x93247f2209abcacf57b75a51dafae777f9dd38bc7053d1af526f220a7489a6d3a2753e5f3e8b1cfe39b56f43611df74a";

    #[test]
    fn test_parse_block() {
        let body = serde_json::json!({
            "version": "deneb",
            "data": {
                "message": {
                    "slot": "8000",
                    "body": {
                        "execution_payload": {
                            "block_number": "19000000",
                            "block_hash": format!("0x{}", "ab".repeat(32)),
                        }
                    }
                }
            }
        });
        let envelope: Envelope<SignedBlock> = serde_json::from_value(body).unwrap();
        let block = execution_block(envelope.data).unwrap();
        assert_eq!(block.slot, 8000);
        assert_eq!(block.block_number, 19_000_000);
        assert_eq!(block.block_hash, B256::repeat_byte(0xab));
    }

    #[test]
    fn test_pre_merge_block_rejected() {
        let body = serde_json::json!({
            "data": { "message": { "slot": "1", "body": {} } }
        });
        let envelope: Envelope<SignedBlock> = serde_json::from_value(body).unwrap();
        assert!(matches!(
            execution_block(envelope.data),
            Err(ChainError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_validator_entry() {
        let body = serde_json::json!({
            "data": [{
                "index": "42",
                "balance": "31999000000",
                "status": "active_slashed",
                "validator": {
                    "pubkey": PUBKEY,
                    "slashed": true,
                    "activation_epoch": "10",
                    "exit_epoch": "18446744073709551615",
                    "withdrawable_epoch": "18446744073709551615"
                }
            }]
        });
        let envelope: Envelope<Vec<ValidatorEntry>> = serde_json::from_value(body).unwrap();
        let entry = envelope.data.into_iter().next().unwrap();
        let status = BeaconValidatorStatus::try_from(entry).unwrap();
        assert_eq!(status.index, 42);
        assert_eq!(status.state, BeaconValidatorState::ActiveSlashed);
        assert!(status.slashed);
        assert_eq!(status.exit_epoch, u64::MAX);
        assert_eq!(status.pubkey.to_hex(), PUBKEY);
    }

    #[test]
    fn test_unknown_state_rejected() {
        let entry = ValidatorEntry {
            index: 1,
            balance: 0,
            status: "dormant".to_string(),
            validator: ValidatorData {
                pubkey: ValidatorPubkey::ZERO,
                slashed: false,
                activation_epoch: 0,
                exit_epoch: 0,
                withdrawable_epoch: 0,
            },
        };
        assert!(BeaconValidatorStatus::try_from(entry).is_err());
    }

    #[test]
    fn test_endpoint_join() {
        let source = HttpBeaconSource::new("http://localhost:5052/", &ClientConfig::default())
            .unwrap();
        assert_eq!(
            source.endpoint("/eth/v1/beacon/headers/head"),
            "http://localhost:5052/eth/v1/beacon/headers/head"
        );
    }
}
