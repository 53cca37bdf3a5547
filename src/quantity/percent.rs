quantity!(Percent, via: f64, suffix: "%", precision: 1);

impl Percent {
    pub const EMPTY: Self = Self(0.0);
    pub const FULL: Self = Self(100.0);

    /// Convert the percentage into `0.0..=1.0` (or beyond, the value is not clamped).
    pub const fn to_ratio(self) -> f64 {
        0.01 * self.0
    }
}
