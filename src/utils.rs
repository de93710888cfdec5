use std::path::{Path, PathBuf};
use thiserror::Error;

/// Everything that can go wrong while planning, loading, or rendering a chart.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("Please specify at least one csv file as parameter")]
    Usage,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Cli(#[from] clap::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("could not read csv {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("column {column:?} not found in {path:?}, available: {available:?}")]
    MissingColumn {
        path: PathBuf,
        column: String,
        available: Vec<String>,
    },
    #[error("could not parse {value:?} in column {column:?}, row {row}, as a number")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },
    #[error("{0:?} names neither a models nor a histogram file")]
    UnrecognizedPath(PathBuf),
    #[error("{input:?} would overwrite {output:?}, already produced by another input")]
    OutputCollision { input: PathBuf, output: PathBuf },
    #[error("could not export chart to {path:?}: {reason}")]
    Export { path: PathBuf, reason: String },
    #[error("could not build the worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Substring match ignoring ASCII and unicode case.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// The image path next to the input: same directory and stem, `.png` extension.
/// A path without extension simply gets one appended.
pub fn png_path<P>(fin: P) -> PathBuf
where
    P: AsRef<Path>,
{
    fin.as_ref().with_extension("png")
}

/// Parse one csv cell as f64, reading empty cells as NAN.
pub fn parse_cell(value: &str, column: &str, row: usize) -> Result<f64, PlotError> {
    if value.is_empty() {
        return Ok(f64::NAN);
    }
    value.parse::<f64>().map_err(|_| PlotError::NotNumeric {
        column: column.to_owned(),
        row,
        value: value.to_owned(),
    })
}
