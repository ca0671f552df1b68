quantity!(WattHours, via: f64, suffix: "Wh", precision: 4);

impl WattHours {
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }
}
