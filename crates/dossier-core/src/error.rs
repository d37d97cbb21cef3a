//! Error types for `dossier-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid content fingerprint: {0:?}")]
  InvalidFingerprint(String),

  #[error("unknown finding kind discriminant: {0:?}")]
  UnknownFindingKind(String),

  #[error("unknown severity: {0:?}")]
  UnknownSeverity(String),

  #[error("unknown analysis status: {0:?}")]
  UnknownAnalysisStatus(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
