//! Error type for `dossier-ingest`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The file could not be read while computing its fingerprint.
  #[error("failed to hash {path}: {source}")]
  Hash {
    path:   PathBuf,
    source: std::io::Error,
  },

  #[error("failed to read {path}: {source}")]
  Read {
    path:   PathBuf,
    source: std::io::Error,
  },

  /// Every extraction strategy came back empty.
  #[error("no text could be extracted from {0}")]
  NoText(PathBuf),

  /// The temporary directory for rasterised PDF pages could not be used.
  #[error("scratch directory error: {0}")]
  Scratch(#[source] std::io::Error),

  #[error("{0} is not a directory")]
  NotADirectory(PathBuf),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend-specific store error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
