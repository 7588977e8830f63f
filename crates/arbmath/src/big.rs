use alloy_primitives::{Sign, I256, U256};

/// casts a 256-bit integer to a uint, saturating if out of bounds
pub fn big_to_uint_saturating(value: I256) -> u64 {
    if value.is_negative() {
        return 0;
    }
    let abs = value.unsigned_abs();
    if abs > U256::from(u64::MAX) {
        u64::MAX
    } else {
        abs.to::<u64>()
    }
}

/// casts a 256-bit integer to a uint, panicking if out of bounds
pub fn big_to_uint_or_panic(value: I256) -> u64 {
    if value.is_negative() {
        panic!("value is less than 0");
    }
    let abs = value.unsigned_abs();
    if abs > U256::from(u64::MAX) {
        panic!("value exceeds the max Uint64");
    }
    abs.to::<u64>()
}

/// multiply a 256-bit integer by a rational, rounding toward negative infinity
///
/// The intermediate product never truncates: the quotient and remainder of
/// `value / denominator` are scaled separately, which keeps every partial
/// result within 256 bits. Results beyond 256 bits saturate.
pub fn big_mul_by_frac(value: I256, numerator: i64, denominator: i64) -> I256 {
    let negative =
        value.is_negative() ^ numerator.is_negative() ^ denominator.is_negative();
    let numerator = U256::from(numerator.unsigned_abs());
    let denominator = U256::from(denominator.unsigned_abs());

    let abs = value.unsigned_abs();
    let quotient = abs / denominator;
    let scaled_remainder = (abs % denominator) * numerator;
    let magnitude = quotient
        .checked_mul(numerator)
        .and_then(|whole| whole.checked_add(scaled_remainder / denominator));
    let Some(mut magnitude) = magnitude else {
        return if negative { I256::MIN } else { I256::MAX };
    };
    if negative && !(scaled_remainder % denominator).is_zero() {
        magnitude = magnitude.saturating_add(U256::from(1));
    }

    let sign = if negative { Sign::Negative } else { Sign::Positive };
    I256::checked_from_sign_and_abs(sign, magnitude)
        .unwrap_or(if negative { I256::MIN } else { I256::MAX })
}

/// multiply a 256-bit uint by a rational whose components are non-negative
pub fn big_mul_by_ufrac(value: U256, numerator: u64, denominator: u64) -> U256 {
    let numerator = U256::from(numerator);
    let denominator = U256::from(denominator);
    let quotient = value / denominator;
    let scaled_remainder = (value % denominator) * numerator;
    quotient
        .checked_mul(numerator)
        .and_then(|whole| whole.checked_add(scaled_remainder / denominator))
        .unwrap_or(U256::MAX)
}

/// the number of eth-words needed to store n bytes
pub fn words_for_bytes(nbytes: u64) -> u64 {
    nbytes.div_ceil(32)
}
