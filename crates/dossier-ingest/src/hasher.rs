//! Content Hasher: streaming SHA-256 fingerprints.

use std::path::Path;

use dossier_core::document::Fingerprint;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{Error, Result};

/// Bytes read per chunk; memory use stays bounded regardless of file size.
pub const CHUNK_SIZE: usize = 4096;

/// Fingerprint the file at `path`.
pub async fn fingerprint_file(path: &Path) -> Result<Fingerprint> {
  let hash_err = |source| Error::Hash { path: path.to_owned(), source };

  let mut file = tokio::fs::File::open(path).await.map_err(hash_err)?;
  fingerprint_reader(&mut file).await.map_err(hash_err)
}

/// Fingerprint everything `reader` yields until EOF.
pub async fn fingerprint_reader<R>(reader: &mut R) -> std::io::Result<Fingerprint>
where
  R: AsyncRead + Unpin,
{
  let mut hasher = Sha256::new();
  let mut buf = [0u8; CHUNK_SIZE];
  loop {
    let n = reader.read(&mut buf).await?;
    if n == 0 {
      break;
    }
    hasher.update(&buf[..n]);
  }
  Ok(Fingerprint::from_digest(hasher.finalize().into()))
}

/// Fingerprint an in-memory buffer.
pub fn fingerprint_bytes(bytes: &[u8]) -> Fingerprint {
  Fingerprint::from_digest(Sha256::digest(bytes).into())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_digest() {
    assert_eq!(
      fingerprint_bytes(b"test").as_str(),
      "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
    );
  }

  #[tokio::test]
  async fn streaming_matches_one_shot_across_chunk_boundaries() {
    let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
    let streamed = fingerprint_reader(&mut data.as_slice()).await.unwrap();
    assert_eq!(streamed, fingerprint_bytes(&data));
  }

  #[tokio::test]
  async fn same_file_hashes_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, b"the same bytes").unwrap();

    let first = fingerprint_file(&path).await.unwrap();
    let second = fingerprint_file(&path).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, fingerprint_bytes(b"the same bytes"));
  }

  #[tokio::test]
  async fn missing_file_is_a_hash_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = fingerprint_file(&dir.path().join("nope.txt"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Hash { .. }));
  }
}
