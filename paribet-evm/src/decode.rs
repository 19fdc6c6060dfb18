//! ABI decoding for the casino contract's bet events.
//!
//! Event signatures:
//!
//! - `BetPlaced(address indexed player, uint256 requestId, uint256 amount, uint8 choice)`
//! - `BetResolved(address indexed player, uint256 requestId, bool win, uint256 payout)`
//!
//! Only `player` is indexed; the remaining fields are 32-byte words in the
//! data section, in declaration order. Every shape problem maps to
//! [`SourceError::MalformedLog`] with the offending field named.

use alloy_primitives::{Address, B256, U256, hex, keccak256};
use paribet_core::entities::BetChoice;
use paribet_core::entities::chain_log::{BetPlacedLog, BetResolvedLog, LogPosition};
use paribet_core::source::SourceError;
use std::sync::LazyLock;

use crate::rpc::RawLog;

/// topic0 of `BetPlaced`.
pub static BET_PLACED_TOPIC: LazyLock<B256> =
    LazyLock::new(|| keccak256("BetPlaced(address,uint256,uint256,uint8)"));

/// topic0 of `BetResolved`.
pub static BET_RESOLVED_TOPIC: LazyLock<B256> =
    LazyLock::new(|| keccak256("BetResolved(address,uint256,bool,uint256)"));

/// `BetPlaced` fields, before the block timestamp is attached.
///
/// The timestamp needs a separate block lookup, so the source resolves it
/// after decoding and completes the log with [`PlacedLogData::into_log`].
#[derive(Debug, Clone)]
pub struct PlacedLogData {
    pub request_id: U256,
    pub player: Address,
    pub amount_wei: U256,
    pub choice: BetChoice,
    pub position: LogPosition,
}

impl PlacedLogData {
    pub fn into_log(self, block_timestamp: i64) -> BetPlacedLog {
        BetPlacedLog {
            request_id: self.request_id,
            player: self.player,
            amount_wei: self.amount_wei,
            choice: self.choice,
            position: self.position,
            block_timestamp,
        }
    }
}

/// Decode a raw `BetPlaced` log entry.
pub fn decode_placed(log: &RawLog) -> Result<PlacedLogData, SourceError> {
    check_signature(log, *BET_PLACED_TOPIC, "BetPlaced")?;
    let words = data_words(log, 3)?;
    let choice_raw = word_u8(&words[2], "choice")?;
    let choice = BetChoice::from_u8(choice_raw).ok_or_else(|| {
        SourceError::MalformedLog(format!("choice out of range: {choice_raw}"))
    })?;

    Ok(PlacedLogData {
        request_id: word_u256(&words[0]),
        player: indexed_player(log)?,
        amount_wei: word_u256(&words[1]),
        choice,
        position: log_position(log)?,
    })
}

/// Decode a raw `BetResolved` log entry.
pub fn decode_resolved(log: &RawLog) -> Result<BetResolvedLog, SourceError> {
    check_signature(log, *BET_RESOLVED_TOPIC, "BetResolved")?;
    let words = data_words(log, 3)?;

    Ok(BetResolvedLog {
        request_id: word_u256(&words[0]),
        player: indexed_player(log)?,
        win: word_bool(&words[1], "win")?,
        payout_wei: word_u256(&words[2]),
        position: log_position(log)?,
    })
}

/// Parse a `0x`-prefixed hex quantity.
pub(crate) fn parse_quantity(value: Option<&str>, field: &str) -> Result<u64, SourceError> {
    let value =
        value.ok_or_else(|| SourceError::MalformedLog(format!("missing {field}")))?;
    let digits = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(digits, 16)
        .map_err(|e| SourceError::MalformedLog(format!("invalid {field} {value:?}: {e}")))
}

fn check_signature(log: &RawLog, expected: B256, event: &str) -> Result<(), SourceError> {
    let topic0 = log
        .topics
        .first()
        .ok_or_else(|| SourceError::MalformedLog(format!("{event} log has no topics")))?;
    let topic0: B256 = topic0
        .parse()
        .map_err(|e| SourceError::MalformedLog(format!("invalid topic0 {topic0:?}: {e}")))?;
    if topic0 != expected {
        return Err(SourceError::MalformedLog(format!(
            "unexpected event signature for {event}: {topic0}"
        )));
    }
    Ok(())
}

fn indexed_player(log: &RawLog) -> Result<Address, SourceError> {
    let topic = log
        .topics
        .get(1)
        .ok_or_else(|| SourceError::MalformedLog("missing player topic".into()))?;
    let word: B256 = topic
        .parse()
        .map_err(|e| SourceError::MalformedLog(format!("invalid player topic {topic:?}: {e}")))?;
    Ok(Address::from_word(word))
}

fn log_position(log: &RawLog) -> Result<LogPosition, SourceError> {
    Ok(LogPosition::new(
        parse_quantity(log.block_number.as_deref(), "blockNumber")?,
        parse_quantity(log.log_index.as_deref(), "logIndex")?,
    ))
}

fn data_words(log: &RawLog, expected: usize) -> Result<Vec<B256>, SourceError> {
    let data = log
        .data
        .as_deref()
        .ok_or_else(|| SourceError::MalformedLog("missing data".into()))?;
    let bytes = hex::decode(data)
        .map_err(|e| SourceError::MalformedLog(format!("invalid data hex: {e}")))?;
    if bytes.len() != expected * 32 {
        return Err(SourceError::MalformedLog(format!(
            "expected {} data bytes, got {}",
            expected * 32,
            bytes.len()
        )));
    }
    Ok(bytes.chunks_exact(32).map(B256::from_slice).collect())
}

fn word_u256(word: &B256) -> U256 {
    U256::from_be_bytes(word.0)
}

fn word_u8(word: &B256, field: &str) -> Result<u8, SourceError> {
    u8::try_from(word_u256(word))
        .map_err(|_| SourceError::MalformedLog(format!("{field} word exceeds u8 range")))
}

fn word_bool(word: &B256, field: &str) -> Result<bool, SourceError> {
    let value = word_u256(word);
    if value == U256::ZERO {
        Ok(false)
    } else if value == U256::from(1u64) {
        Ok(true)
    } else {
        Err(SourceError::MalformedLog(format!(
            "invalid boolean word in {field}: {value}"
        )))
    }
}
