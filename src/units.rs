//! Currency units
//!
//! Converts between the display unit (XCH) and mojo, the smallest indivisible unit.
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const MOJO_PER_CHIA: u64 = 1_000_000_000_000;

/// Number of decimal places between XCH and mojo
pub const CHIA_DECIMALS: u32 = 12;

/// Literals beyond these bounds can only overflow a `u64` of mojo
const MAX_SIGNIFICANT_DIGITS: usize = 28;
const MAX_INTEGER_DIGITS: i64 = 28;

/// Parse a user-entered XCH amount into mojo.
///
/// Accepts plain decimal literals with an optional sign and exponent (`1.5`,
/// `.5`, `2e-3`). Returns `None` for empty or non-numeric text, negative values,
/// values finer than one mojo and values that do not fit in a `u64`.
pub fn chia_to_mojo(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let chia = Decimal::from_str(&expand_literal(text)?).ok()?;
    if chia < Decimal::ZERO {
        return None;
    }

    let mojo = chia.checked_mul(Decimal::from(MOJO_PER_CHIA))?;
    if !mojo.fract().is_zero() {
        return None;
    }

    mojo.to_u64()
}

/// Rewrite `[+-]digits[.digits][e[+-]digits]` as a positional decimal string
fn expand_literal(text: &str) -> Option<String> {
    let (negative, rest) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let (mantissa, exponent) = match rest.find(['e', 'E']) {
        Some(at) => (&rest[..at], parse_exponent(&rest[at + 1..])?),
        None => (rest, 0),
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if int_part.len() + frac_part.len() == 0 || !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    let all = format!("{}{}", int_part, frac_part);
    let leading = all.trim_start_matches('0');
    let digits = leading.trim_end_matches('0');
    if digits.is_empty() {
        return Some("0".to_string());
    }
    if digits.len() > MAX_SIGNIFICANT_DIGITS {
        return None;
    }

    // Decimal point position relative to the first significant digit
    let zeros = (all.len() - leading.len()) as i64;
    let point = (int_part.len() as i64 - zeros).checked_add(exponent)?;
    let len = digits.len() as i64;
    if point > MAX_INTEGER_DIGITS || len - point > CHIA_DECIMALS as i64 {
        return None;
    }

    let positional = if point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else if point >= len {
        format!("{}{}", digits, "0".repeat((point - len) as usize))
    } else {
        let (whole, frac) = digits.split_at(point as usize);
        format!("{}.{}", whole, frac)
    };

    Some(if negative {
        format!("-{}", positional)
    } else {
        positional
    })
}

fn parse_exponent(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Render a mojo amount as an XCH string without trailing zeros
pub fn mojo_to_chia_string(mojo: u64) -> String {
    Decimal::from_i128_with_scale(mojo as i128, CHIA_DECIMALS)
        .normalize()
        .to_string()
}
