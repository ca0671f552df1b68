//! Per-cell summary over the recorded time series.

use average::{Max, Mean, Min};
use itertools::Itertools;

use crate::{
    core::{
        cell::CellId,
        recorder::{Row, Snapshot},
    },
    quantity::{
        current::Amperes,
        energy::WattHours,
        power::Watts,
        proportions::Percent,
        temperature::Celsius,
        time::Hours,
        voltage::Volts,
    },
};

#[must_use]
#[derive(Clone, Debug)]
pub struct CellStatistics {
    pub id: CellId,

    /// Number of the recorded ticks of this cell.
    pub n_ticks: usize,

    pub mean_voltage: Volts,
    pub min_voltage: Volts,
    pub max_voltage: Volts,
    pub mean_current: Amperes,
    pub max_temperature: Celsius,
    pub final_capacity: Percent,

    /// Mean instant power, positive when charging.
    pub average_power: Watts,

    pub charged: WattHours,
    pub discharged: WattHours,
}

impl CellStatistics {
    /// Summarize the cell snapshots, `None` if there are no snapshots.
    pub fn from_snapshots<'a>(
        id: CellId,
        snapshots: impl IntoIterator<Item = &'a Snapshot>,
    ) -> Option<Self> {
        let snapshots = snapshots.into_iter().collect_vec();
        let last = snapshots.last()?;
        let powers = snapshots.iter().map(|snapshot| snapshot.voltage * snapshot.current).collect_vec();
        let (charged, discharged): (Vec<_>, Vec<_>) =
            powers.iter().map(|power| *power * Hours::ONE_TICK).partition(|energy| *energy >= WattHours::ZERO);

        let mean_voltage: Mean = snapshots.iter().map(|snapshot| snapshot.voltage.0).collect();
        let min_voltage: Min = snapshots.iter().map(|snapshot| snapshot.voltage.0).collect();
        let max_voltage: Max = snapshots.iter().map(|snapshot| snapshot.voltage.0).collect();
        let mean_current: Mean = snapshots.iter().map(|snapshot| snapshot.current.0).collect();
        let max_temperature: Max = snapshots.iter().map(|snapshot| snapshot.temperature.0).collect();
        let average_power: Mean = powers.iter().map(|power| power.0).collect();

        Some(Self {
            n_ticks: snapshots.len(),
            mean_voltage: Volts(mean_voltage.mean()),
            min_voltage: Volts(min_voltage.min()),
            max_voltage: Volts(max_voltage.max()),
            mean_current: Amperes(mean_current.mean()),
            max_temperature: Celsius(max_temperature.max()),
            final_capacity: last.capacity,
            average_power: Watts(average_power.mean()),
            charged: charged.into_iter().sum(),
            discharged: discharged.into_iter().sum::<WattHours>().abs(),
            id,
        })
    }

    /// Discharged to charged energy ratio, `None` if nothing has been charged.
    #[must_use]
    pub fn efficiency(&self) -> Option<f64> {
        (self.charged > WattHours::ZERO).then(|| self.discharged / self.charged)
    }
}

/// Summarize every cell in the order of appearance.
pub fn summarize(rows: &[Row]) -> Vec<CellStatistics> {
    rows.iter()
        .flat_map(|row| row.cells.iter().map(|snapshot| &snapshot.id))
        .unique()
        .filter_map(|id| {
            CellStatistics::from_snapshots(id.clone(), rows.iter().filter_map(|row| row.get(id)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::core::clock::Tick;

    fn snapshot(id: &str, voltage: f64, current: f64, temperature: f64, capacity: f64) -> Snapshot {
        Snapshot {
            id: id.into(),
            voltage: Volts(voltage),
            current: Amperes(current),
            temperature: Celsius(temperature),
            capacity: Percent(capacity),
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { tick: Tick(0), cells: vec![snapshot("a", 3.6, 1.0, 25.0, 50.0)] },
            Row {
                tick: Tick(1),
                cells: vec![snapshot("a", 3.6, 1.0, 26.0, 51.0), snapshot("b", 3.0, 0.0, 30.0, 80.0)],
            },
            Row {
                tick: Tick(2),
                cells: vec![snapshot("a", 3.0, -2.0, 27.0, 49.0), snapshot("b", 3.2, 0.0, 29.0, 80.0)],
            },
        ]
    }

    #[test]
    fn summarizes_in_order_of_appearance() {
        let statistics = summarize(&rows());
        assert_eq!(
            statistics.iter().map(|statistics| statistics.id.as_ref()).collect_vec(),
            ["a", "b"],
        );
        assert_eq!(statistics[0].n_ticks, 3);
        assert_eq!(statistics[1].n_ticks, 2);
    }

    #[test]
    fn voltage_and_temperature() {
        let statistics = &summarize(&rows())[0];
        assert_abs_diff_eq!(statistics.mean_voltage.0, 3.4, epsilon = 1e-9);
        assert_abs_diff_eq!(statistics.min_voltage.0, 3.0);
        assert_abs_diff_eq!(statistics.max_voltage.0, 3.6);
        assert_abs_diff_eq!(statistics.mean_current.0, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(statistics.max_temperature.0, 27.0);
        assert_eq!(statistics.final_capacity, Percent(49.0));
    }

    #[test]
    fn energy_and_efficiency() {
        let statistics = &summarize(&rows())[0];
        assert_abs_diff_eq!(statistics.charged.0, 7.2 / 3600.0, epsilon = 1e-12);
        assert_abs_diff_eq!(statistics.discharged.0, 6.0 / 3600.0, epsilon = 1e-12);
        assert_abs_diff_eq!(statistics.average_power.0, (3.6 + 3.6 - 6.0) / 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(statistics.efficiency().unwrap_or_default(), 6.0 / 7.2, epsilon = 1e-9);
    }

    #[test]
    fn no_efficiency_without_charging() {
        let statistics = &summarize(&rows())[1];
        assert_eq!(statistics.charged, WattHours::ZERO);
        assert_eq!(statistics.efficiency(), None);
    }

    #[test]
    fn empty_rows() {
        assert!(summarize(&[]).is_empty());
    }
}
