use std::ops::Mul;

use crate::quantity::{current::Amperes, energy::WattHours, time::Hours, voltage::Volts};

quantity!(Watts, via: f64, suffix: "W", precision: 3);

impl Mul<Amperes> for Volts {
    type Output = Watts;

    fn mul(self, rhs: Amperes) -> Self::Output {
        Watts(self.0 * rhs.0)
    }
}

impl Mul<Hours> for Watts {
    type Output = WattHours;

    fn mul(self, rhs: Hours) -> Self::Output {
        WattHours(self.0 * rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn power_from_voltage_and_current() {
        assert_abs_diff_eq!((Volts(3.2) * Amperes(-2.0)).0, -6.4);
    }

    #[test]
    fn energy_over_one_hour_of_ticks() {
        let energy: WattHours = (0..3600).map(|_| Watts(10.0) * Hours::ONE_TICK).sum();
        assert_abs_diff_eq!(energy.0, 10.0, epsilon = 1e-9);
    }
}
