quantity!(Hours, via: f64, suffix: "h", precision: 3);

impl Hours {
    /// Duration of a single simulation tick.
    pub const ONE_TICK: Self = Self(1.0 / 3600.0);
}
