//! Exact conversion between human-readable amounts and base units.
//!
//! Wallet balances arrive as integers in the chain's smallest unit (wei, sun,
//! token base units) and payments are requested as decimal strings. Both
//! directions go through [`U256`] so no precision is lost to floating point.

use alloy::primitives::U256;
use paybridge_error::{ProviderError, ProviderResult};

/// Largest exponent whose power of ten fits in a U256.
pub const MAX_DECIMALS: u8 = 77;

/// Returns `10^decimals`.
pub fn pow10(decimals: u8) -> ProviderResult<U256> {
    if decimals > MAX_DECIMALS {
        return Err(ProviderError::AmountOverflow(format!(
            "10^{decimals} does not fit in 256 bits"
        )));
    }
    let ten = U256::from(10u8);
    let mut value = U256::from(1u8);
    for _ in 0..decimals {
        value *= ten;
    }
    Ok(value)
}

/// Scales a decimal string by `10^decimals`.
///
/// Accepts plain decimal notation (`"12"`, `"0.5"`, `".5"`, `"3."`). Rejects
/// signs, exponents, empty input and more fractional digits than `decimals`
/// allows.
pub fn parse_units(amount: &str, decimals: u8) -> ProviderResult<U256> {
    let amount = amount.trim();
    let invalid = |reason: &str| ProviderError::InvalidAmount(format!("'{amount}': {reason}"));

    let (whole, frac) = match amount.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (amount, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid("no digits"));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected a non-negative decimal number"));
    }

    let frac = frac.trim_end_matches('0');
    if frac.len() > decimals as usize {
        return Err(invalid(&format!("more than {decimals} decimal places")));
    }

    let overflow = || ProviderError::AmountOverflow(format!("'{amount}' x 10^{decimals}"));
    let scale = pow10(decimals)?;
    let whole = parse_digits(whole).ok_or_else(overflow)?;
    let mut value = whole.checked_mul(scale).ok_or_else(overflow)?;

    if !frac.is_empty() {
        let frac_scale = pow10(decimals - frac.len() as u8)?;
        let frac = parse_digits(frac).ok_or_else(overflow)?;
        let frac = frac.checked_mul(frac_scale).ok_or_else(overflow)?;
        value = value.checked_add(frac).ok_or_else(overflow)?;
    }
    Ok(value)
}

/// Renders base units as a decimal string with `decimals` fractional digits,
/// trimming trailing zeros (`1500000` at 6 decimals is `"1.5"`, zero is `"0"`).
pub fn format_units(value: U256, decimals: u8) -> ProviderResult<String> {
    let scale = pow10(decimals)?;
    let whole = value / scale;
    let frac = value % scale;
    if frac.is_zero() {
        return Ok(whole.to_string());
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    Ok(format!("{}.{}", whole, frac.trim_end_matches('0')))
}

fn parse_digits(digits: &str) -> Option<U256> {
    if digits.is_empty() {
        return Some(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_whole_and_fraction() {
        assert_eq!(
            parse_units("1", 18).unwrap(),
            U256::from(1_000_000_000_000_000_000u128)
        );
        assert_eq!(parse_units("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(parse_units("0.000001", 6).unwrap(), U256::from(1u64));
        assert_eq!(parse_units(".25", 2).unwrap(), U256::from(25u64));
        assert_eq!(parse_units("3.", 2).unwrap(), U256::from(300u64));
        assert_eq!(parse_units("7", 0).unwrap(), U256::from(7u64));
    }

    #[test]
    fn test_parse_trailing_zeros_do_not_count_as_precision() {
        assert_eq!(parse_units("1.500000000", 6).unwrap(), U256::from(1_500_000u64));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for input in ["", ".", "-1", "+1", "1e18", "abc", "1.2.3", "1,5", "0x10"] {
            assert!(
                matches!(parse_units(input, 18), Err(ProviderError::InvalidAmount(_))),
                "accepted {input:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        let err = parse_units("0.0000001", 6).unwrap_err();
        assert!(err.to_string().contains("6 decimal places"));
    }

    #[test]
    fn test_parse_overflow() {
        let huge = "9".repeat(80);
        assert!(matches!(
            parse_units(&huge, 18),
            Err(ProviderError::AmountOverflow(_))
        ));
        assert!(matches!(pow10(78), Err(ProviderError::AmountOverflow(_))));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::ZERO, 18).unwrap(), "0");
        assert_eq!(format_units(U256::from(2_500_000u64), 6).unwrap(), "2.5");
        assert_eq!(
            format_units(U256::from(1_000_000_000_000_000_000u128), 18).unwrap(),
            "1"
        );
        assert_eq!(format_units(U256::from(1u64), 18).unwrap(), "0.000000000000000001");
        assert_eq!(format_units(U256::from(42u64), 0).unwrap(), "42");
    }

    proptest! {
        #[test]
        fn prop_format_then_parse_is_identity(raw in any::<u128>(), decimals in 0u8..=30) {
            let value = U256::from(raw);
            let text = format_units(value, decimals).unwrap();
            prop_assert_eq!(parse_units(&text, decimals).unwrap(), value);
        }
    }
}
