//! ERC-20 `transfer` calldata.

use std::str::FromStr;

use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use paybridge_error::{ProviderError, ProviderResult};

sol! {
    function transfer(address to, uint256 amount) external returns (bool);
}

/// Parses a `0x`-prefixed 20-byte address.
pub fn parse_address(address: &str) -> ProviderResult<Address> {
    Address::from_str(address).map_err(|e| ProviderError::invalid_address(address, e.to_string()))
}

/// ABI-encodes `transfer(to, amount)` as `0x`-prefixed hex.
pub fn transfer_calldata(to: &str, amount: U256) -> ProviderResult<String> {
    let to = parse_address(to)?;
    let data = transferCall { to, amount }.abi_encode();
    Ok(format!("0x{}", hex::encode(data)))
}
