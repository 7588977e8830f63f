//! Overflow-safe integer arithmetic for rollup fee math.
//!
//! The saturating operations and the fixed-iteration approximations are part
//! of a replayed execution trace, so their results must be identical across
//! implementations, including at the overflow boundaries.

mod approx;
mod big;
mod bips;
mod saturating;

pub use approx::{approx_exp_basis_points, approx_square_root};
pub use big::{
    big_mul_by_frac, big_mul_by_ufrac, big_to_uint_or_panic, big_to_uint_saturating,
    words_for_bytes,
};
pub use bips::{Bips, ONE_IN_BIPS};
pub use saturating::{
    log2_ceil, next_power_of_2, saturating_add, saturating_cast, saturating_mul, saturating_sub,
    saturating_uadd, saturating_ucast, saturating_umul, saturating_usub,
};
