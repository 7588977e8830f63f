/// A signed fixed-point quantity denominated in basis points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Bips(pub i64);

/// the number of basis points in a whole
pub const ONE_IN_BIPS: Bips = Bips(10_000);

impl Bips {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn into_inner(self) -> i64 {
        self.0
    }
}
