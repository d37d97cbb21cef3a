//! Content-addressed ingestion for the Dossier corpus.
//!
//! Files are fingerprinted before anything else happens, so a file whose
//! bytes are already in the store is recognised without paying for text
//! extraction. New content is extracted through a [`TextExtractor`],
//! normalised once, and written through the [`CorpusStore`] abstraction.
//!
//! [`CorpusStore`]: dossier_core::store::CorpusStore

pub mod error;
pub mod extract;
pub mod hasher;
pub mod normalize;
pub mod pipeline;

pub use error::{Error, Result};
pub use extract::{NativeExtractor, RankedExtractor, TesseractOcr, TextExtractor};
pub use pipeline::{IngestOutcome, IngestPipeline, IngestReport};
