use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid duration token: '{token}'")]
    InvalidDuration { token: String },
    #[error("Invalid numeric value: '{0}'")]
    InvalidValue(String),
    #[error("Malformed stats line {line_no}: '{line}'")]
    MalformedStats { line_no: usize, line: String },
    #[error("Stat '{key}' missing from {path}")]
    MissingStat { key: String, path: PathBuf },
    #[error("Bar count must be a multiple of mask length: {bars} bars, mask of {mask}")]
    MaskMismatch { bars: usize, mask: usize },
    #[error("Unsupported legend placement: '{0}'")]
    UnsupportedLegend(String),
    #[error("Unknown series: '{0}'")]
    UnknownSeries(String),
    #[error("Table error: {0}")]
    Table(String),
    #[error("Command execution error: '{cmd}' exited with status {status}")]
    ExecError { cmd: String, status: ExitStatus },
    #[error("Plot error: {0}")]
    Plot(String),
    #[error("PDF conversion error: {0}")]
    Pdf(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Maps a drawing backend error into [`Error::Plot`].
pub fn plot_err<E: std::fmt::Display>(err: E) -> Error {
    Error::Plot(err.to_string())
}

/// Maps an SVG parsing or PDF conversion error into [`Error::Pdf`].
pub fn pdf_err<E: std::fmt::Display>(err: E) -> Error {
    Error::Pdf(err.to_string())
}
