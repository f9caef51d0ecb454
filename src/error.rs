//! Error types for mesh, material and config loading

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolygonError {
    #[error("vertices count less than 3 (got {0})")]
    TooFewVertices(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("`{0}` record is missing a value")]
    MissingValue(&'static str),
    #[error("index {index} out of range for {count} {what}")]
    IndexOutOfRange { what: &'static str, index: i64, count: usize },
    #[error(transparent)]
    Polygon(#[from] PolygonError),
    #[error("`newmtl` without a material name")]
    MissingMaterialName,
    #[error("file does not contain a model")]
    EmptyModel,
}

/// Malformed mesh or material text. Aborts the whole load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}:{line}: {kind}", path.display())]
pub struct ParseError {
    pub path: PathBuf,
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// A referenced resource that could not be used. The geometry still loads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("{}: file not found", path.display())]
    NotFound { path: PathBuf },
    #[error("{}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("unknown material `{name}`")]
    UnknownMaterial { name: String },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}
