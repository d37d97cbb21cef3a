//! Core types and trait definitions for the Dossier forensic corpus engine.
//!
//! No database or filesystem code lives here. The storage backend, the
//! ingestion pipeline and the detectors meet only through
//! [`store::CorpusStore`].

#![allow(async_fn_in_trait)]

pub mod config;
pub mod cooccurrence;
pub mod document;
pub mod entity;
pub mod error;
pub mod finding;
pub mod store;

pub use error::{Error, Result};
