//! Loading and validation of the yearly results table
//!
//! The CSV is read once into a Polars DataFrame, checked for the required
//! columns, and coerced to the types the aggregator expects. The resulting
//! `Dataset` is never mutated afterwards.

use crate::error::{PoolError, Result};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

pub const PLAYER: &str = "Player";
pub const YEAR: &str = "Year";
pub const DEATHS: &str = "Deaths";
pub const POINTS: &str = "Points";
pub const WINS: &str = "Wins";
pub const RANK: &str = "Rank";

/// Required columns, in the order missing ones are reported
pub const REQUIRED_COLUMNS: [&str; 6] = [DEATHS, POINTS, WINS, RANK, PLAYER, YEAR];

/// One row of input
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub player: String,
    pub year: i64,
    pub deaths: f64,
    pub points: f64,
    pub wins: i64,
    pub rank: f64,
}

/// Validated, typed results table
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    /// Read and validate a CSV file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PoolError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| PoolError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        debug!(
            "Read {} rows × {} columns from {}",
            frame.height(),
            frame.width(),
            path.display()
        );

        let dataset = Self::from_frame(frame)?;
        info!(
            "Loaded {} records spanning {} year(s) from {}",
            dataset.len(),
            dataset.years()?.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Validate an in-memory frame: required columns present, values coercible, no nulls
    ///
    /// Extra columns are dropped.
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        let present: BTreeSet<String> = frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| !present.contains(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PoolError::MissingColumns { columns: missing });
        }

        let typed = [
            (PLAYER, DataType::String),
            (YEAR, DataType::Int64),
            (DEATHS, DataType::Float64),
            (POINTS, DataType::Float64),
            (WINS, DataType::Int64),
            (RANK, DataType::Float64),
        ]
        .into_iter()
        .map(|(name, dtype)| coerce_column(&frame, name, &dtype))
        .collect::<Result<Vec<Column>>>()?;

        Ok(Self {
            frame: DataFrame::new(typed)?,
        })
    }

    /// Build a dataset directly from records
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let frame = df!(
            PLAYER => records.iter().map(|r| r.player.as_str()).collect::<Vec<_>>(),
            YEAR => records.iter().map(|r| r.year).collect::<Vec<_>>(),
            DEATHS => records.iter().map(|r| r.deaths).collect::<Vec<_>>(),
            POINTS => records.iter().map(|r| r.points).collect::<Vec<_>>(),
            WINS => records.iter().map(|r| r.wins).collect::<Vec<_>>(),
            RANK => records.iter().map(|r| r.rank).collect::<Vec<_>>(),
        )?;
        Self::from_frame(frame)
    }

    /// Typed frame with exactly the required columns
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Sorted distinct years present in the data
    pub fn years(&self) -> Result<Vec<i64>> {
        Ok(i64_values(&self.frame, YEAR)?
            .into_iter()
            .collect::<BTreeSet<i64>>()
            .into_iter()
            .collect())
    }

    /// All rows in file order
    pub fn records(&self) -> Result<Vec<Record>> {
        let players = string_values(&self.frame, PLAYER)?;
        let years = i64_values(&self.frame, YEAR)?;
        let deaths = f64_values(&self.frame, DEATHS)?;
        let points = f64_values(&self.frame, POINTS)?;
        let wins = i64_values(&self.frame, WINS)?;
        let ranks = f64_values(&self.frame, RANK)?;

        Ok((0..self.len())
            .map(|i| Record {
                player: players[i].clone(),
                year: years[i],
                deaths: deaths[i],
                points: points[i],
                wins: wins[i],
                rank: ranks[i],
            })
            .collect())
    }
}

/// Strictly cast one column, rejecting nulls and fractional values bound for integers
fn coerce_column(frame: &DataFrame, name: &str, dtype: &DataType) -> Result<Column> {
    let series = frame.column(name)?.as_materialized_series();

    let nulls = series.null_count();
    if nulls > 0 {
        return Err(PoolError::InvalidColumn {
            column: name.to_string(),
            message: format!("{} missing value(s)", nulls),
        });
    }

    // strict_cast truncates 1.5 to 1 without complaint
    if dtype.is_integer() && series.dtype().is_float() {
        let floats = series.cast(&DataType::Float64)?;
        let fractional = floats
            .f64()?
            .into_iter()
            .flatten()
            .find(|v| !v.is_finite() || v.fract() != 0.0);
        if let Some(value) = fractional {
            return Err(PoolError::InvalidColumn {
                column: name.to_string(),
                message: format!("expected whole numbers, found {}", value),
            });
        }
    }

    let cast = series
        .strict_cast(dtype)
        .map_err(|e| PoolError::InvalidColumn {
            column: name.to_string(),
            message: format!("expected {}: {}", dtype, e),
        })?;

    Ok(Column::from(cast))
}

pub(crate) fn string_values(frame: &DataFrame, name: &str) -> Result<Vec<String>> {
    Ok(frame
        .column(name)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

pub(crate) fn f64_values(frame: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(frame
        .column(name)?
        .as_materialized_series()
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

pub(crate) fn i64_values(frame: &DataFrame, name: &str) -> Result<Vec<i64>> {
    Ok(frame
        .column(name)?
        .as_materialized_series()
        .i64()?
        .into_iter()
        .map(|v| v.unwrap_or_default())
        .collect())
}
