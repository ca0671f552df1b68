quantity!(Amperes, via: f64, suffix: "A", precision: 3);
