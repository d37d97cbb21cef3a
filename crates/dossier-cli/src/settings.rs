//! Layered settings: built-in defaults, then an optional TOML file, then
//! `DOSSIER_*` environment variables.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `DOSSIER_ANALYSIS__BENFORD__MIN_SAMPLE_SIZE=50`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use dossier_core::config::{AnalysisConfig, IngestConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite database file; a leading `~/` is expanded.
  pub store_path: PathBuf,
  pub ingest:     IngestConfig,
  pub analysis:   AnalysisConfig,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("dossier.db"),
      ingest:     IngestConfig::default(),
      analysis:   AnalysisConfig::default(),
    }
  }
}

impl Settings {
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    Self::from_builder(
      config::Config::builder()
        .add_source(config::File::from(file).required(false))
        .add_source(environment()),
    )
  }

  fn from_builder(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
  ) -> anyhow::Result<Self> {
    let mut settings: Self = builder
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }
}

/// `DOSSIER_` prefix with a single underscore, nested keys joined by `__`.
fn environment() -> config::Environment {
  config::Environment::with_prefix("DOSSIER")
    .prefix_separator("_")
    .separator("__")
    .try_parsing(true)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn from_toml(toml: &str) -> Settings {
    Settings::from_builder(
      config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml)),
    )
    .unwrap()
  }

  #[test]
  fn empty_file_gives_defaults() {
    let s = from_toml("");
    assert_eq!(s.store_path, PathBuf::from("dossier.db"));
    assert_eq!(s.analysis.benford.min_sample_size, 30);
    assert_eq!(s.ingest.min_text_len, 100);
  }

  #[test]
  fn file_overrides_only_named_values() {
    let s = from_toml(
      r#"
        store_path = "/tmp/corpus.db"

        [analysis.timeline]
        gap_threshold_days = 30

        [analysis.bridge]
        max_degree = 8
      "#,
    );
    assert_eq!(s.store_path, PathBuf::from("/tmp/corpus.db"));
    assert_eq!(s.analysis.timeline.gap_threshold_days, 30);
    assert_eq!(s.analysis.timeline.min_year, 1900);
    assert_eq!(s.analysis.bridge.max_degree, 8);
    assert!((s.analysis.bridge.min_centrality - 0.1).abs() < 1e-9);
  }

  #[test]
  fn missing_file_is_not_an_error() {
    let s = Settings::load(Path::new("/definitely/not/here/dossier.toml")).unwrap();
    assert_eq!(s.analysis.timeline.gap_threshold_days, 20);
  }

  #[test]
  fn environment_overrides_file_values() {
    let vars = [
      ("DOSSIER_STORE_PATH", "/srv/case.db"),
      ("DOSSIER_ANALYSIS__BENFORD__MIN_SAMPLE_SIZE", "50"),
      ("DOSSIER_INGEST__RECURSIVE", "false"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect::<config::Map<_, _>>();

    let s = Settings::from_builder(
      config::Config::builder()
        .add_source(config::File::from_str(
          "store_path = \"/tmp/file.db\"",
          config::FileFormat::Toml,
        ))
        .add_source(environment().source(Some(vars))),
    )
    .unwrap();
    assert_eq!(s.store_path, PathBuf::from("/srv/case.db"));
    assert_eq!(s.analysis.benford.min_sample_size, 50);
    assert!(!s.ingest.recursive);
    assert_eq!(s.analysis.timeline.gap_threshold_days, 20);
  }

  #[test]
  fn tilde_expands_to_home() {
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/corpus.db")),
        PathBuf::from(home).join("corpus.db")
      );
    }
    assert_eq!(expand_tilde(Path::new("rel.db")), PathBuf::from("rel.db"));
  }
}
