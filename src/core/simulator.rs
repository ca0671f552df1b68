use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, trace};

use crate::{
    core::{
        cell::{Cell, Status},
        clock::Tick,
        task::{Operation, Task},
    },
    quantity::{
        current::Amperes,
        proportions::Percent,
        temperature::Celsius,
        voltage::Volts,
    },
};

/// Share of a CC-CV task spent in the constant-current phase, in tenths.
const CONSTANT_CURRENT_TENTHS: u64 = 7;

const AMBIENT_TEMPERATURE: Celsius = Celsius(25.0);

const CHARGE_VOLTAGE_STEP: Volts = Volts(0.008);
const CHARGE_TEMPERATURE_STEP: Celsius = Celsius(0.05);
const CHARGE_MAX_TEMPERATURE: Celsius = Celsius(45.0);
const CHARGE_CAPACITY_STEP: Percent = Percent(0.1);
const TAPER_CURRENT_STEP: Amperes = Amperes(0.03);
const TAPER_COOLING_STEP: Celsius = Celsius(0.02);

const DISCHARGE_VOLTAGE_STEP: Volts = Volts(0.006);
const DISCHARGE_TEMPERATURE_STEP: Celsius = Celsius(0.03);
const DISCHARGE_MAX_TEMPERATURE: Celsius = Celsius(40.0);
const DISCHARGE_CAPACITY_STEP: Percent = Percent(0.08);

/// Rest voltage noise amplitude.
const REST_VOLTAGE_NOISE: f64 = 0.005;

/// Per-tick relaxation factor of the temperature excess over ambient while resting.
const REST_RELAXATION: f64 = 0.98;

/// Per-cell state transition driven by the cell's task queue.
///
/// The generator is only used for the rest voltage noise.
pub struct Simulator<R = StdRng> {
    rng: R,
}

impl Simulator<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulator<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    pub const fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Advance the cell by one tick, returns the task which has just been completed, if any.
    pub fn advance(&mut self, cell: &mut Cell, tick: Tick) -> Option<Task> {
        let task = *cell.promote()?;
        let started_at = cell.start(tick);
        let elapsed = tick.since(started_at);
        trace!(cell = %cell.id, %tick, %task, elapsed, "advancing");

        match *task.operation() {
            Operation::ChargeCcCv { current, .. } => {
                Self::charge(cell, current, elapsed, task.duration());
            }
            Operation::DischargeCc { current } => Self::discharge(cell, current),
            Operation::Rest => self.rest(cell),
        }

        // The task occupies exactly `duration` ticks, the first one being `started_at`:
        if elapsed + 1 >= u64::from(task.duration()) {
            let completed = cell.complete();
            debug!(
                cell = %cell.id,
                %tick,
                %task,
                next = ?cell.current_task().map(ToString::to_string),
                "task completed",
            );
            completed
        } else {
            None
        }
    }

    fn charge(cell: &mut Cell, target_current: Amperes, elapsed: u64, duration: u32) {
        cell.status = Status::Charging;
        if elapsed * 10 < u64::from(duration) * CONSTANT_CURRENT_TENTHS {
            cell.current = target_current;
            cell.voltage = (cell.voltage + CHARGE_VOLTAGE_STEP).min(cell.max_voltage());
            cell.temperature =
                (cell.temperature + CHARGE_TEMPERATURE_STEP).min(CHARGE_MAX_TEMPERATURE);
            cell.capacity = (cell.capacity + CHARGE_CAPACITY_STEP).min(Percent::FULL);
        } else {
            cell.voltage = cell.max_voltage();
            cell.current = (cell.current - TAPER_CURRENT_STEP).max(Amperes::ZERO);
            cell.temperature = (cell.temperature - TAPER_COOLING_STEP).max(AMBIENT_TEMPERATURE);
        }
    }

    fn discharge(cell: &mut Cell, target_current: Amperes) {
        cell.status = Status::Discharging;
        cell.current = -target_current;
        cell.voltage = (cell.voltage - DISCHARGE_VOLTAGE_STEP).max(cell.min_voltage());
        cell.temperature =
            (cell.temperature + DISCHARGE_TEMPERATURE_STEP).min(DISCHARGE_MAX_TEMPERATURE);
        cell.capacity = (cell.capacity - DISCHARGE_CAPACITY_STEP).max(Percent::ZERO);
    }

    /// Voltage noise is not clamped to the chemistry limits.
    fn rest(&mut self, cell: &mut Cell) {
        cell.status = Status::Idle;
        cell.current = Amperes::ZERO;
        cell.voltage += Volts(self.rng.gen_range(-REST_VOLTAGE_NOISE..=REST_VOLTAGE_NOISE));
        cell.temperature =
            AMBIENT_TEMPERATURE + (cell.temperature - AMBIENT_TEMPERATURE) * REST_RELAXATION;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::core::{Result, cell::Phase, chemistry::Chemistry, task::TaskKind};

    fn lfp_cell() -> Cell {
        Cell::with_state("cell_1".into(), Chemistry::Lfp)
            .voltage(Volts(3.2))
            .temperature(Celsius(30.0))
            .capacity(Percent(50.0))
            .call()
    }

    #[test]
    fn idle_without_tasks() {
        let mut simulator = Simulator::seeded(1);
        let mut cell = lfp_cell();
        assert!(simulator.advance(&mut cell, Tick(0)).is_none());
        assert_eq!(cell.voltage, Volts(3.2));
        assert_eq!(cell.temperature, Celsius(30.0));
        assert_eq!(cell.phase(), Phase::Idle);
    }

    #[test]
    fn constant_current_step() -> Result {
        let mut simulator = Simulator::seeded(1);
        let mut cell = lfp_cell();
        cell.enqueue(Task::charge(10, Amperes(1.0), Volts(3.6))?);

        simulator.advance(&mut cell, Tick(0));

        assert_eq!(cell.status, Status::Charging);
        assert_eq!(cell.current, Amperes(1.0));
        assert_abs_diff_eq!(cell.voltage.0, 3.208, epsilon = 1e-9);
        assert_abs_diff_eq!(cell.temperature.0, 30.05, epsilon = 1e-9);
        assert_abs_diff_eq!(cell.capacity.0, 50.1, epsilon = 1e-9);
        assert_eq!(cell.task_started_at(), Some(Tick(0)));
        Ok(())
    }

    #[test]
    fn constant_current_clamps() -> Result {
        let mut simulator = Simulator::seeded(1);
        let mut cell = Cell::with_state("cell_1".into(), Chemistry::Lfp)
            .voltage(Volts(3.597))
            .temperature(Celsius(44.98))
            .capacity(Percent(99.95))
            .call();
        cell.enqueue(Task::charge(100, Amperes(1.0), Volts(3.6))?);

        simulator.advance(&mut cell, Tick(0));

        assert_eq!(cell.voltage, Volts(3.6));
        assert_eq!(cell.temperature, Celsius(45.0));
        assert_eq!(cell.capacity, Percent(100.0));
        Ok(())
    }

    #[test]
    fn constant_voltage_starts_at_seventy_percent() -> Result {
        let mut simulator = Simulator::seeded(1);
        let mut cell = lfp_cell();
        cell.enqueue(Task::charge(20, Amperes(1.0), Volts(3.6))?);

        for tick in 0..14 {
            simulator.advance(&mut cell, Tick(tick));
            assert_eq!(cell.current, Amperes(1.0), "tick {tick}");
            assert!(cell.voltage < cell.max_voltage(), "tick {tick}");
        }

        let mut previous_current = cell.current;
        for tick in 14..19 {
            simulator.advance(&mut cell, Tick(tick));
            assert_eq!(cell.voltage, cell.max_voltage(), "tick {tick}");
            assert!(cell.current < previous_current, "tick {tick}");
            assert_eq!(cell.status, Status::Charging);
            previous_current = cell.current;
        }
        assert_abs_diff_eq!(cell.current.0, 1.0 - 5.0 * 0.03, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn taper_floors_at_zero() -> Result {
        let mut simulator = Simulator::seeded(1);
        let mut cell = lfp_cell();
        cell.enqueue(Task::charge(40, Amperes(0.1), Volts(3.6))?);

        let mut previous_current = Amperes(0.1);
        for tick in 0..39 {
            simulator.advance(&mut cell, Tick(tick));
            if tick >= 28 {
                assert!(
                    cell.current < previous_current || cell.current == Amperes::ZERO,
                    "tick {tick}",
                );
                assert!(cell.current >= Amperes::ZERO);
                assert!(cell.temperature >= Celsius(25.0));
            }
            previous_current = cell.current;
        }
        assert_eq!(cell.current, Amperes::ZERO);
        Ok(())
    }

    #[test]
    fn discharge_is_not_ramped() -> Result {
        let mut simulator = Simulator::seeded(1);
        let mut cell = lfp_cell();
        cell.enqueue(Task::discharge(15, Amperes(2.0))?);

        for tick in 0..14 {
            simulator.advance(&mut cell, Tick(tick));
            assert_eq!(cell.current, Amperes(-2.0));
            assert_eq!(cell.status, Status::Discharging);
        }
        assert_abs_diff_eq!(cell.voltage.0, 3.2 - 14.0 * 0.006, epsilon = 1e-9);
        assert_abs_diff_eq!(cell.temperature.0, 30.0 + 14.0 * 0.03, epsilon = 1e-9);
        assert_abs_diff_eq!(cell.capacity.0, 50.0 - 14.0 * 0.08, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn discharge_clamps() -> Result {
        let mut simulator = Simulator::seeded(1);
        let mut cell = Cell::with_state("cell_1".into(), Chemistry::Lfp)
            .voltage(Volts(2.803))
            .temperature(Celsius(39.99))
            .capacity(Percent(0.05))
            .call();
        cell.enqueue(Task::discharge(10, Amperes(2.0))?);

        simulator.advance(&mut cell, Tick(0));

        assert_eq!(cell.voltage, Volts(2.8));
        assert_eq!(cell.temperature, Celsius(40.0));
        assert_eq!(cell.capacity, Percent::ZERO);
        Ok(())
    }

    /// Rest noise may push the voltage past the chemistry limits in either direction.
    #[test]
    fn rest_noise_is_not_clamped() -> Result {
        let mut simulator = Simulator::new(StepRng::new(u64::MAX, 0));
        let mut cell = Cell::with_state("cell_1".into(), Chemistry::Lfp).voltage(Volts(3.6)).call();
        cell.enqueue(Task::rest(5)?);
        for tick in 0..3 {
            simulator.advance(&mut cell, Tick(tick));
        }
        assert!(cell.voltage > cell.max_voltage(), "{}", cell.voltage);

        let mut simulator = Simulator::new(StepRng::new(0, 0));
        let mut cell = Cell::with_state("cell_1".into(), Chemistry::Lfp).voltage(Volts(2.8)).call();
        cell.enqueue(Task::rest(5)?);
        for tick in 0..3 {
            simulator.advance(&mut cell, Tick(tick));
        }
        assert!(cell.voltage < cell.min_voltage(), "{}", cell.voltage);
        Ok(())
    }

    #[test]
    fn rest_relaxes_temperature() -> Result {
        let mut simulator = Simulator::seeded(7);
        let mut cell = lfp_cell();
        cell.current = Amperes(1.0);
        cell.enqueue(Task::rest(100)?);

        let mut expected_temperature = 30.0;
        for tick in 0..50 {
            let voltage_before = cell.voltage;
            simulator.advance(&mut cell, Tick(tick));
            expected_temperature = 25.0 + (expected_temperature - 25.0) * 0.98;

            assert_eq!(cell.current, Amperes::ZERO);
            assert_eq!(cell.status, Status::Idle);
            assert_eq!(cell.phase(), Phase::Resting);
            assert!((cell.voltage - voltage_before).0.abs() <= 0.005 + 1e-12);
            assert_abs_diff_eq!(cell.temperature.0, expected_temperature, epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn single_tick_task() -> Result {
        let mut simulator = Simulator::seeded(1);
        let mut cell = lfp_cell();
        let task = Task::discharge(1, Amperes(1.0))?;
        cell.enqueue(task);

        assert_eq!(simulator.advance(&mut cell, Tick(5)), Some(task));
        assert!(cell.current_task().is_none());
        assert_eq!(cell.current, Amperes::ZERO);
        assert_eq!(cell.status, Status::Idle);
        Ok(())
    }

    #[test]
    fn queue_progression() -> Result {
        let mut simulator = Simulator::seeded(1);
        let mut cell = Cell::create("cell_1".into(), Chemistry::Lfp, simulator.rng_mut());
        cell.enqueue(Task::rest(10)?);
        cell.enqueue(Task::charge(20, Amperes(1.0), Volts(4.0))?);
        cell.enqueue(Task::discharge(15, Amperes(2.0))?);

        let mut tick = Tick(0);
        let mut run = |cell: &mut Cell, n_ticks: u64| {
            for _ in 0..n_ticks {
                simulator.advance(cell, tick);
                tick = tick.next();
            }
        };

        run(&mut cell, 10);
        assert_eq!(cell.current_task().map(Task::kind), Some(TaskKind::ChargeCcCv));
        assert_eq!(cell.task_started_at(), None);
        run(&mut cell, 1);
        assert_eq!(cell.task_started_at(), Some(Tick(10)));

        run(&mut cell, 19);
        assert_eq!(cell.current_task().map(Task::kind), Some(TaskKind::DischargeCc));
        assert_eq!(cell.queue().len(), 1);

        run(&mut cell, 15);
        assert!(cell.current_task().is_none());
        assert!(cell.queue().is_empty());
        assert_eq!(cell.status, Status::Idle);
        assert_eq!(cell.current, Amperes::ZERO);
        Ok(())
    }

    #[test]
    fn voltage_stays_within_limits_under_load() -> Result {
        let mut simulator = Simulator::seeded(3);
        for chemistry in Chemistry::ALL {
            let mut cell = Cell::create("cell_1".into(), chemistry, simulator.rng_mut());
            for _ in 0..5 {
                cell.enqueue(Task::charge(150, Amperes(2.0), Volts(5.0))?);
                cell.enqueue(Task::discharge(200, Amperes(3.0))?);
            }
            for tick in 0..2000 {
                simulator.advance(&mut cell, Tick(tick));
                assert!(cell.voltage >= cell.min_voltage(), "{chemistry} at {tick}");
                assert!(cell.voltage <= cell.max_voltage(), "{chemistry} at {tick}");
                assert!((Percent::ZERO..=Percent::FULL).contains(&cell.capacity));
                assert!(cell.temperature <= Celsius(45.0));
            }
            assert!(cell.is_settled());
        }
        Ok(())
    }
}
