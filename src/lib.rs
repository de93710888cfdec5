use crate::utils::*;
use csv::{ReaderBuilder, Trim};
use std::path::{Path, PathBuf};
use tracing::debug;
pub mod chart_mode;
pub mod dispatch;
pub mod plot_stats;
pub mod render;
pub mod utils;

// constants
pub const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

/// Column-oriented view of a csv file.
/// Cells are kept as trimmed text and parsed on access,
/// so columns that are never plotted are never validated.
#[derive(Debug, Clone)]
pub struct Table {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub columns: Vec<Vec<String>>,
}

impl Table {
    /// Initiate an empty Table read from `path` with the given headers.
    pub fn new(path: PathBuf, headers: Vec<String>) -> Table {
        let columns = vec![Vec::new(); headers.len()];
        Table {
            path,
            headers,
            columns,
        }
    }

    /// Read a Table from a csv file with a header row.
    /// Rows with a different number of fields than the header are an error.
    pub fn from_csv<P>(fin: P) -> Result<Table, PlotError>
    where
        P: AsRef<Path>,
    {
        let fin = fin.as_ref();
        let csv_err = |source| PlotError::Csv {
            path: fin.to_path_buf(),
            source,
        };
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_path(fin)
            .map_err(csv_err)?;
        let headers: Vec<String> = rdr
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.to_owned())
            .collect();
        let mut table = Table::new(fin.to_path_buf(), headers);
        for record in rdr.records() {
            let record = record.map_err(csv_err)?;
            for (column, field) in table.columns.iter_mut().zip(record.iter()) {
                column.push(field.to_owned());
            }
        }
        debug!(
            "read {} rows with columns {:?} from {:?}",
            table.len(),
            table.headers,
            fin
        );
        Ok(table)
    }

    /// Number of data rows, the header excluded.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw cells of the named column, `None` if the header is absent.
    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .position(|h| h == name)
            .map(|i| &self.columns[i][..])
    }

    /// Parse the named column as f64, empty cells become NAN.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, PlotError> {
        let cells = self.column(name).ok_or_else(|| PlotError::MissingColumn {
            path: self.path.clone(),
            column: name.to_owned(),
            available: self.headers.clone(),
        })?;
        cells
            .iter()
            .enumerate()
            .map(|(row, cell)| parse_cell(cell, name, row))
            .collect()
    }
}
