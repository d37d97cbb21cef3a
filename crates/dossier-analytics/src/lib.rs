//! Forensic detectors over a Dossier corpus.
//!
//! - [`graph`] and [`centrality`] build the entity co-occurrence graph and
//!   score it with Brandes betweenness; [`bridge`] picks out the
//!   high-betweenness, low-degree "hidden handler" entities.
//! - [`benford`] tests each document's leading digits against Benford's law.
//! - [`timeline`] finds silence intervals in corpus-wide dated activity.
//! - [`sink`] turns detector output into persisted findings, and
//!   [`analyzer`] runs one incremental pass over a [`CorpusStore`].
//!
//! [`CorpusStore`]: dossier_core::store::CorpusStore

pub mod analyzer;
pub mod benford;
pub mod bridge;
pub mod centrality;
pub mod error;
pub mod graph;
pub mod recognize;
pub mod sink;
pub mod timeline;

pub use analyzer::{AnalysisReport, Analyzer};
pub use error::{Error, Result};
