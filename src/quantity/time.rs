quantity!(Minutes, via: f64, suffix: "min", precision: 0);

impl Minutes {
    pub const fn from_seconds(seconds: f64) -> Self {
        Self(seconds / 60.0)
    }

    pub const fn from_hours(hours: f64) -> Self {
        Self(hours * 60.0)
    }
}
