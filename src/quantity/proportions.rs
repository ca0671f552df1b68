quantity!(Percent, via: f64, suffix: "%", precision: 2);

impl Percent {
    pub const FULL: Self = Self(100.0);
}
