//! Text Extractor Adapter.
//!
//! Extraction backends are external collaborators: a strategy either returns
//! best-effort text or `None`. Only local I/O failures on the file itself are
//! errors; a missing or failing external tool is logged and treated as "no
//! text".

use std::{ffi::OsStr, future::Future, path::Path};

use tokio::process::Command;

use crate::{Error, Result};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A strategy that turns a file into raw text.
pub trait TextExtractor: Send + Sync {
  /// `Ok(None)` means this strategy produced nothing for the file.
  fn extract<'a>(
    &'a self,
    path: &'a Path,
  ) -> impl Future<Output = Result<Option<String>>> + Send + 'a;
}

fn extension(path: &Path) -> Option<String> {
  path
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase)
}

/// Run an external program and capture stdout. A launch failure or non-zero
/// exit yields `None`.
async fn capture_stdout(program: &str, args: &[&OsStr]) -> Option<String> {
  match Command::new(program).args(args).output().await {
    Ok(output) if output.status.success() => {
      Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
    Ok(output) => {
      tracing::warn!(
        program,
        status = %output.status,
        stderr = %String::from_utf8_lossy(&output.stderr).trim(),
        "extraction tool exited unsuccessfully"
      );
      None
    }
    Err(e) => {
      tracing::warn!(program, error = %e, "could not launch extraction tool");
      None
    }
  }
}

// ─── Native ──────────────────────────────────────────────────────────────────

/// Native structured extraction: `.txt` files are read directly (lossy
/// UTF-8), PDFs go through `pdftotext`. Anything else yields `None`.
#[derive(Debug, Clone)]
pub struct NativeExtractor {
  pub pdftotext: String,
}

impl Default for NativeExtractor {
  fn default() -> Self { Self { pdftotext: "pdftotext".into() } }
}

impl TextExtractor for NativeExtractor {
  async fn extract(&self, path: &Path) -> Result<Option<String>> {
    match extension(path).as_deref() {
      Some("txt") => {
        let bytes = tokio::fs::read(path)
          .await
          .map_err(|source| Error::Read { path: path.to_owned(), source })?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
      }
      Some("pdf") => Ok(
        capture_stdout(&self.pdftotext, &[
          OsStr::new("-layout"),
          path.as_os_str(),
          OsStr::new("-"),
        ])
        .await,
      ),
      _ => Ok(None),
    }
  }
}

// ─── OCR ─────────────────────────────────────────────────────────────────────

/// OCR fallback through the `tesseract` command line tool. Image files are
/// read directly; PDFs are first rasterised page by page with `pdftoppm`.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
  pub program:    String,
  pub pdftoppm:   String,
  /// Raster resolution for PDF pages.
  pub dpi:        u32,
  pub extensions: Vec<String>,
}

impl Default for TesseractOcr {
  fn default() -> Self {
    Self {
      program:    "tesseract".into(),
      pdftoppm:   "pdftoppm".into(),
      dpi:        300,
      extensions: ["jpg", "jpeg", "png", "tif", "tiff"]
        .into_iter()
        .map(str::to_owned)
        .collect(),
    }
  }
}

impl TesseractOcr {
  async fn ocr_image(&self, image: &Path) -> Option<String> {
    capture_stdout(&self.program, &[image.as_os_str(), OsStr::new("stdout")]).await
  }

  /// Rasterise every page into a scratch directory, then OCR the pages in
  /// order. Pages with no recognised text are skipped.
  async fn ocr_pdf(&self, path: &Path) -> Result<Option<String>> {
    let scratch = tempfile::tempdir().map_err(Error::Scratch)?;
    let prefix = scratch.path().join("page");
    let dpi = self.dpi.to_string();

    let rendered = capture_stdout(&self.pdftoppm, &[
      OsStr::new("-r"),
      OsStr::new(&dpi),
      OsStr::new("-png"),
      path.as_os_str(),
      prefix.as_os_str(),
    ])
    .await;
    if rendered.is_none() {
      return Ok(None);
    }

    // pdftoppm zero-pads page numbers, so name order is page order.
    let mut pages = Vec::new();
    let mut entries = tokio::fs::read_dir(scratch.path())
      .await
      .map_err(Error::Scratch)?;
    while let Some(entry) = entries.next_entry().await.map_err(Error::Scratch)? {
      pages.push(entry.path());
    }
    pages.sort();
    tracing::debug!(path = %path.display(), pages = pages.len(), "running OCR on PDF pages");

    let mut text = Vec::with_capacity(pages.len());
    for page in &pages {
      if let Some(page_text) = self.ocr_image(page).await
        && !page_text.trim().is_empty()
      {
        text.push(page_text);
      }
    }
    Ok((!text.is_empty()).then(|| text.join("\n\n")))
  }
}

impl TextExtractor for TesseractOcr {
  async fn extract(&self, path: &Path) -> Result<Option<String>> {
    let Some(ext) = extension(path) else {
      return Ok(None);
    };
    if ext == "pdf" {
      return self.ocr_pdf(path).await;
    }
    if !self.extensions.iter().any(|e| *e == ext) {
      return Ok(None);
    }
    tracing::debug!(path = %path.display(), "running OCR");
    Ok(self.ocr_image(path).await)
  }
}

// ─── Ranked fallback ─────────────────────────────────────────────────────────

/// Native extraction first, OCR when the native text is too short.
///
/// If OCR also yields nothing, any non-empty native text is kept. `None`
/// only when every strategy came back empty.
#[derive(Debug, Clone)]
pub struct RankedExtractor<N, O> {
  native:       N,
  ocr:          O,
  min_text_len: usize,
}

impl<N, O> RankedExtractor<N, O> {
  pub fn new(native: N, ocr: O, min_text_len: usize) -> Self {
    Self { native, ocr, min_text_len }
  }
}

impl RankedExtractor<NativeExtractor, TesseractOcr> {
  /// The stock `pdftotext` then `tesseract` chain.
  pub fn with_defaults(min_text_len: usize) -> Self {
    Self::new(NativeExtractor::default(), TesseractOcr::default(), min_text_len)
  }
}

fn usable(text: &Option<String>) -> bool {
  text.as_deref().is_some_and(|t| !t.trim().is_empty())
}

impl<N: TextExtractor, O: TextExtractor> TextExtractor for RankedExtractor<N, O> {
  async fn extract(&self, path: &Path) -> Result<Option<String>> {
    let native = self.native.extract(path).await?;
    let native_len = native.as_deref().map_or(0, |t| t.trim().chars().count());
    if native_len >= self.min_text_len {
      return Ok(native);
    }

    tracing::debug!(
      path = %path.display(),
      native_len,
      "native text below threshold, falling back to OCR"
    );
    let ocr = self.ocr.extract(path).await?;
    if usable(&ocr) {
      return Ok(ocr);
    }
    Ok(native.filter(|t| !t.trim().is_empty()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Returns the same canned answer for every path.
  struct Canned(Option<&'static str>);

  impl TextExtractor for Canned {
    async fn extract(&self, _path: &Path) -> Result<Option<String>> {
      Ok(self.0.map(str::to_owned))
    }
  }

  fn ranked(
    native: Option<&'static str>,
    ocr: Option<&'static str>,
  ) -> RankedExtractor<Canned, Canned> {
    RankedExtractor::new(Canned(native), Canned(ocr), 10)
  }

  #[tokio::test]
  async fn long_native_text_skips_ocr() {
    let text = ranked(Some("plenty of native text"), Some("ocr"))
      .extract(Path::new("x.pdf"))
      .await
      .unwrap();
    assert_eq!(text.as_deref(), Some("plenty of native text"));
  }

  #[tokio::test]
  async fn short_native_text_falls_back_to_ocr() {
    let text = ranked(Some("  tiny  "), Some("recognised words"))
      .extract(Path::new("x.pdf"))
      .await
      .unwrap();
    assert_eq!(text.as_deref(), Some("recognised words"));
  }

  #[tokio::test]
  async fn short_native_text_kept_when_ocr_empty() {
    let text = ranked(Some("tiny"), Some("   "))
      .extract(Path::new("x.pdf"))
      .await
      .unwrap();
    assert_eq!(text.as_deref(), Some("tiny"));
  }

  #[tokio::test]
  async fn all_strategies_empty_is_none() {
    let text = ranked(Some(" "), None)
      .extract(Path::new("x.png"))
      .await
      .unwrap();
    assert!(text.is_none());
  }

  #[tokio::test]
  async fn native_reads_txt_lossily() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("NOTE.TXT");
    std::fs::write(&path, b"caf\xe9 ok").unwrap();

    let text = NativeExtractor::default().extract(&path).await.unwrap();
    assert_eq!(text.as_deref(), Some("caf\u{FFFD} ok"));
  }

  #[tokio::test]
  async fn native_ignores_images() {
    let text = NativeExtractor::default()
      .extract(Path::new("scan.png"))
      .await
      .unwrap();
    assert!(text.is_none());
  }

  #[tokio::test]
  async fn missing_ocr_binary_yields_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.png");
    std::fs::write(&path, b"not really a png").unwrap();

    let ocr = TesseractOcr {
      program: "dossier-test-no-such-ocr-binary".into(),
      ..TesseractOcr::default()
    };
    assert!(ocr.extract(&path).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn missing_rasteriser_yields_none_for_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.pdf");
    std::fs::write(&path, b"%PDF-1.4 not really").unwrap();

    let ocr = TesseractOcr {
      pdftoppm: "dossier-test-no-such-rasteriser".into(),
      ..TesseractOcr::default()
    };
    assert!(ocr.extract(&path).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn ocr_skips_non_images() {
    let text = TesseractOcr::default()
      .extract(Path::new("notes.txt"))
      .await
      .unwrap();
    assert!(text.is_none());
  }
}
