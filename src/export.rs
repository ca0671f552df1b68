//! Flattened time series export, columns are named `<cellId>_<field>`.

mod field;

use std::{fs, io::Write, path::Path};

use bon::Builder;
use enumset::EnumSet;
use itertools::Itertools;
use serde_json::{Map, Value, json};

pub use self::field::Field;
use crate::{
    core::{self, cell::CellId, clock::Tick, recorder::Row},
    prelude::*,
    scenario::CellConfig,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Format {
    Csv,
    Json,
}

impl Format {
    /// Guess the format from the file extension.
    #[must_use]
    pub fn of(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
struct Column {
    id: CellId,
    field: Field,
}

impl Column {
    fn name(&self) -> String {
        format!("{}_{}", self.id, self.field)
    }
}

/// Export request: the recorded rows together with the filters.
#[derive(Builder)]
pub struct Export<'a> {
    rows: &'a [Row],

    #[builder(default = EnumSet::all())]
    fields: EnumSet<Field>,

    /// First exported tick, inclusive.
    since: Option<Tick>,

    /// Last exported tick, inclusive.
    until: Option<Tick>,

    /// Exported cells, all when empty.
    #[builder(default)]
    cells: Vec<CellId>,

    /// Cell configuration snapshots to include into the JSON export.
    #[builder(default)]
    configs: Vec<CellConfig>,
}

impl Export<'_> {
    /// Rows within the tick range.
    ///
    /// Every requested cell must have been recorded at least once.
    fn selected_rows(&self) -> core::Result<Vec<&Row>> {
        let rows = self
            .rows
            .iter()
            .filter(|row| self.since.is_none_or(|since| row.tick >= since))
            .filter(|row| self.until.is_none_or(|until| row.tick <= until))
            .collect_vec();
        if rows.is_empty() {
            return Err(core::Error::EmptyExportRequest);
        }
        if let Some(id) =
            self.cells.iter().find(|id| self.rows.iter().all(|row| row.get(id).is_none()))
        {
            return Err(core::Error::MissingCell(id.clone()));
        }
        Ok(rows)
    }

    fn is_cell_selected(&self, id: &CellId) -> bool {
        self.cells.is_empty() || self.cells.contains(id)
    }

    /// Union of the row columns in the order of appearance.
    fn columns(&self, rows: &[&Row]) -> Vec<Column> {
        rows.iter()
            .flat_map(|row| &row.cells)
            .filter(|snapshot| self.is_cell_selected(&snapshot.id))
            .flat_map(|snapshot| {
                self.fields.iter().map(|field| Column { id: snapshot.id.clone(), field })
            })
            .unique()
            .collect()
    }

    pub fn write_csv(&self, writer: impl Write) -> Result {
        self.render_csv(&self.selected_rows()?, writer)
    }

    /// Build `{"cells": [...], "series": {"<tick>": {"<cellId>_<field>": value}}}`.
    pub fn to_json(&self) -> core::Result<Value> {
        Ok(self.render_json(&self.selected_rows()?))
    }

    /// Render the export completely before touching the file, so that a failed request
    /// leaves the previous export intact.
    #[instrument(skip_all, fields(path = %path.display(), ?format))]
    pub fn write_to(&self, path: &Path, format: Format) -> Result {
        let rows = self.selected_rows()?;
        let mut buffer = Vec::new();
        match format {
            Format::Csv => self.render_csv(&rows, &mut buffer)?,
            Format::Json => {
                serde_json::to_writer_pretty(&mut buffer, &self.render_json(&rows))?;
                buffer.push(b'\n');
            }
        }
        fs::write(path, buffer).with_context(|| format!("failed to write `{}`", path.display()))?;
        info!(n_rows = rows.len(), "exported");
        Ok(())
    }

    fn render_csv(&self, rows: &[&Row], writer: impl Write) -> Result {
        let columns = self.columns(rows);
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(
            std::iter::once("tick".to_string()).chain(columns.iter().map(Column::name)),
        )?;
        for row in rows {
            let values = columns.iter().map(|column| {
                row.get(&column.id)
                    .map_or_else(String::new, |snapshot| column.field.value(snapshot).to_string())
            });
            writer.write_record(std::iter::once(row.tick.to_string()).chain(values))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn render_json(&self, rows: &[&Row]) -> Value {
        let series: Map<String, Value> = rows
            .iter()
            .map(|row| {
                let values: Map<String, Value> = row
                    .cells
                    .iter()
                    .filter(|snapshot| self.is_cell_selected(&snapshot.id))
                    .flat_map(|snapshot| {
                        self.fields.iter().map(|field| {
                            let column = Column { id: snapshot.id.clone(), field };
                            (column.name(), json!(field.value(snapshot)))
                        })
                    })
                    .collect();
                (row.tick.to_string(), Value::Object(values))
            })
            .collect();
        let configs = self
            .configs
            .iter()
            .filter(|config| config.id.as_ref().is_none_or(|id| self.is_cell_selected(id)))
            .collect_vec();
        json!({ "cells": configs, "series": series })
    }
}
