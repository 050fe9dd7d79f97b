//! Tron address encoding.
//!
//! A Tron address is the 21-byte payload `0x41 || keccak(pubkey)[12..]`
//! rendered as Base58Check: payload followed by the first four bytes of a
//! double SHA-256, base58-encoded. Mainnet addresses start with `T`.

use paybridge_error::{ProviderError, ProviderResult};
use sha2::{Digest, Sha256};

/// Version byte of mainnet (and testnet) addresses
pub const TRON_ADDRESS_PREFIX: u8 = 0x41;

/// Length of the decoded payload (prefix + 20-byte account id)
pub const PAYLOAD_LEN: usize = 21;

/// Length of a base58 mainnet address
pub const BASE58_LEN: usize = 34;

fn checksum(payload: &[u8]) -> [u8; 4] {
    let hash1 = Sha256::digest(payload);
    let hash2 = Sha256::digest(hash1);
    [hash2[0], hash2[1], hash2[2], hash2[3]]
}

/// Validates a base58 Tron address, checking prefix, length and checksum.
pub fn validate_address(address: &str) -> ProviderResult<()> {
    if !address.starts_with('T') {
        return Err(ProviderError::invalid_address(address, "must start with 'T'"));
    }

    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| ProviderError::invalid_address(address, e.to_string()))?;

    if decoded.len() != PAYLOAD_LEN + 4 {
        return Err(ProviderError::invalid_address(
            address,
            format!("decoded length {} != {}", decoded.len(), PAYLOAD_LEN + 4),
        ));
    }
    if decoded[0] != TRON_ADDRESS_PREFIX {
        return Err(ProviderError::invalid_address(address, "wrong version byte"));
    }

    let (payload, sum) = decoded.split_at(PAYLOAD_LEN);
    if checksum(payload) != sum {
        return Err(ProviderError::invalid_address(address, "checksum mismatch"));
    }
    Ok(())
}

/// Returns true if `address` is a well-formed base58 Tron address
pub fn is_valid_address(address: &str) -> bool {
    validate_address(address).is_ok()
}

/// Encodes a 21-byte payload as a base58 address.
pub fn encode_base58(payload: &[u8; PAYLOAD_LEN]) -> String {
    let mut bytes = Vec::with_capacity(PAYLOAD_LEN + 4);
    bytes.extend_from_slice(payload);
    bytes.extend_from_slice(&checksum(payload));
    bs58::encode(bytes).into_string()
}

/// Converts the hex form tronWeb sometimes reports (`41...`) to base58.
pub fn hex_to_base58(hex_address: &str) -> ProviderResult<String> {
    let raw = hex_address.trim_start_matches("0x");
    let bytes = hex::decode(raw).map_err(|e| ProviderError::invalid_address(hex_address, e.to_string()))?;
    let payload: [u8; PAYLOAD_LEN] = bytes.as_slice().try_into().map_err(|_| {
        ProviderError::invalid_address(hex_address, format!("expected {PAYLOAD_LEN} bytes"))
    })?;
    if payload[0] != TRON_ADDRESS_PREFIX {
        return Err(ProviderError::invalid_address(hex_address, "wrong version byte"));
    }
    Ok(encode_base58(&payload))
}

/// Returns the base58 form of an address given either as base58 or as hex.
pub fn normalize_address(address: &str) -> ProviderResult<String> {
    if address.starts_with('T') {
        validate_address(address)?;
        Ok(address.to_string())
    } else {
        hex_to_base58(address)
    }
}
