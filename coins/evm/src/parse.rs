//! Decoding of EIP-1193 response values.
//!
//! Wallets are loose about quantities: chain ids show up as `"0x38"`, `"56"`
//! or `56` depending on the provider and the event.

use alloy::primitives::U256;
use paybridge_error::{ProviderError, ProviderResult};
use serde_json::Value;

/// Parses a chain id given as hex string, decimal string or number.
pub fn parse_chain_id(value: &Value) -> ProviderResult<u64> {
    let invalid = |reason: &str| ProviderError::invalid_response("eth_chainId", reason);
    match value {
        Value::Number(n) => n.as_u64().ok_or_else(|| invalid("not an unsigned integer")),
        Value::String(s) => {
            let s = s.trim();
            let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => s.parse::<u64>(),
            };
            parsed.map_err(|e| invalid(&format!("'{s}': {e}")))
        }
        other => Err(invalid(&format!("unexpected value {other}"))),
    }
}

/// Parses a hex quantity (`eth_getBalance`) into a U256.
pub fn parse_quantity(method: &str, value: &Value) -> ProviderResult<U256> {
    let invalid = |reason: String| ProviderError::invalid_response(method, reason);
    match value {
        Value::String(s) => {
            let parsed = match s.strip_prefix("0x") {
                Some("") => Ok(U256::ZERO),
                Some(hex) => U256::from_str_radix(hex, 16),
                None => U256::from_str_radix(s, 10),
            };
            parsed.map_err(|e| invalid(format!("'{s}': {e}")))
        }
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| invalid(format!("'{n}' is not an unsigned integer"))),
        other => Err(invalid(format!("unexpected value {other}"))),
    }
}

/// Parses an account list; non-string entries are dropped.
pub fn parse_accounts(value: &Value) -> ProviderResult<Vec<String>> {
    match value {
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(ProviderError::invalid_response(
            "eth_requestAccounts",
            format!("expected an array, got {other}"),
        )),
    }
}

/// Parses a transaction hash response.
pub fn parse_tx_hash(method: &str, value: &Value) -> ProviderResult<String> {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::invalid_response(method, format!("expected a hash, got {value}")))
}
