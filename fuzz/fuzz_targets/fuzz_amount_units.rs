#![no_main]

use alloy::primitives::U256;
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use paybridge_traits::units::{format_units, parse_units};

#[derive(Debug, Arbitrary)]
struct AmountInput {
    text: String,
    base_units: [u64; 4],
    decimals: u8,
}

fuzz_target!(|input: AmountInput| {
    let decimals = input.decimals % 40;

    // Arbitrary text must parse or fail, never panic
    if let Ok(parsed) = parse_units(&input.text, decimals) {
        let formatted = format_units(parsed, decimals).expect("parsed amounts format");
        assert_eq!(parse_units(&formatted, decimals).ok(), Some(parsed));
    }

    let value = U256::from_limbs(input.base_units);
    if let Ok(formatted) = format_units(value, decimals) {
        assert_eq!(parse_units(&formatted, decimals).ok(), Some(value), "{formatted}");
    }
});
