/// add two int64's without overflow
pub fn saturating_add(augend: i64, addend: i64) -> i64 {
    augend.saturating_add(addend)
}

/// add two uint64's without overflow
pub fn saturating_uadd(augend: u64, addend: u64) -> u64 {
    augend.saturating_add(addend)
}

/// subtract an int64 from another without overflow
///
/// Defined as `saturating_add(minuend, -subtrahend)` with the negation itself
/// clamped, so `saturating_sub(a, i64::MIN)` is `saturating_add(a, i64::MAX)`.
pub fn saturating_sub(minuend: i64, subtrahend: i64) -> i64 {
    let negated = if subtrahend == i64::MIN {
        i64::MAX
    } else {
        -subtrahend
    };
    saturating_add(minuend, negated)
}

/// subtract a uint64 from another without underflow
pub fn saturating_usub(minuend: u64, subtrahend: u64) -> u64 {
    minuend.saturating_sub(subtrahend)
}

/// multiply two int64's without over/underflow
pub fn saturating_mul(multiplicand: i64, multiplier: i64) -> i64 {
    multiplicand.saturating_mul(multiplier)
}

/// multiply two uint64's without overflow
pub fn saturating_umul(multiplicand: u64, multiplier: u64) -> u64 {
    multiplicand.saturating_mul(multiplier)
}

/// cast a uint64 to an int64, clipping to [0, 2^63-1]
pub fn saturating_cast(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// cast an int64 to a uint64, clipping to [0, 2^63-1]
pub fn saturating_ucast(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// the log2 of the int, rounded up; returns 0 for an input of 0
pub fn log2_ceil(value: u64) -> u64 {
    64 - u64::from(value.leading_zeros())
}

/// the smallest power of two greater than the input; wraps to 0 above 2^63
pub fn next_power_of_2(value: u64) -> u64 {
    1u64.checked_shl(log2_ceil(value) as u32).unwrap_or(0)
}
