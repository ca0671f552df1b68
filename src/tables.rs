use comfy_table::{Attribute, Cell as TableCell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::{
        cell::{Cell, Phase},
        clock::Tick,
        task::TaskKind,
    },
    statistics::CellStatistics,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

const fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Idle => Color::Reset,
        Phase::Charging => Color::Green,
        Phase::Discharging => Color::Red,
        Phase::Resting => Color::DarkYellow,
    }
}

#[must_use]
pub fn build_cells_table(cells: &[Cell], now: Tick) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "ID",
        "Chemistry",
        "Phase",
        "Voltage",
        "Current",
        "Temperature",
        "Capacity",
        "Task",
        "Elapsed",
        "Queued",
    ]);
    for cell in cells {
        let phase = cell.phase();
        table.add_row(vec![
            TableCell::new(&cell.id),
            TableCell::new(cell.chemistry).add_attribute(Attribute::Dim),
            TableCell::new(phase).fg(phase_color(phase)),
            TableCell::new(cell.voltage).set_alignment(CellAlignment::Right).fg(
                if cell.voltage <= cell.min_voltage() || cell.voltage >= cell.max_voltage() {
                    Color::DarkYellow
                } else {
                    Color::Reset
                },
            ),
            TableCell::new(cell.current).set_alignment(CellAlignment::Right),
            TableCell::new(cell.temperature).set_alignment(CellAlignment::Right),
            TableCell::new(cell.capacity).set_alignment(CellAlignment::Right),
            TableCell::new(cell.current_task().map_or_else(String::new, ToString::to_string)),
            TableCell::new(
                cell.task_started_at().map_or_else(String::new, |started_at| {
                    format!("{}s", now.since(started_at))
                }),
            )
            .set_alignment(CellAlignment::Right),
            TableCell::new(cell.queue().len()).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Pending tasks of every cell, the first one is the current task if it has been picked up.
#[must_use]
pub fn build_queue_table(cells: &[Cell]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Cell", "#", "Task", "Duration"]);
    for cell in cells {
        for (position, task) in cell.queue().iter().enumerate() {
            table.add_row(vec![
                TableCell::new(&cell.id),
                TableCell::new(position + 1).set_alignment(CellAlignment::Right),
                TableCell::new(task.kind()).fg(match task.kind() {
                    TaskKind::ChargeCcCv => Color::Green,
                    TaskKind::DischargeCc => Color::Red,
                    TaskKind::Rest => Color::DarkYellow,
                }),
                TableCell::new(format!("{}s", task.duration())).set_alignment(CellAlignment::Right),
            ]);
        }
    }
    table
}

#[must_use]
pub fn build_statistics_table(statistics: &[CellStatistics]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Cell",
        "Ticks",
        "Mean V",
        "Min V",
        "Max V",
        "Mean A",
        "Max °C",
        "Final",
        "Power",
        "Charged",
        "Discharged",
        "Efficiency",
    ]);
    for statistics in statistics {
        table.add_row(vec![
            TableCell::new(&statistics.id),
            TableCell::new(statistics.n_ticks).set_alignment(CellAlignment::Right),
            TableCell::new(statistics.mean_voltage).set_alignment(CellAlignment::Right),
            TableCell::new(statistics.min_voltage)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            TableCell::new(statistics.max_voltage)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            TableCell::new(statistics.mean_current).set_alignment(CellAlignment::Right),
            TableCell::new(statistics.max_temperature).set_alignment(CellAlignment::Right),
            TableCell::new(statistics.final_capacity).set_alignment(CellAlignment::Right),
            TableCell::new(statistics.average_power).set_alignment(CellAlignment::Right),
            TableCell::new(statistics.charged).set_alignment(CellAlignment::Right).fg(Color::Green),
            TableCell::new(statistics.discharged).set_alignment(CellAlignment::Right).fg(Color::Red),
            TableCell::new(
                statistics
                    .efficiency()
                    .map_or_else(String::new, |efficiency| format!("{:.1}%", efficiency * 100.0)),
            )
            .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
