//! Import a reasoned OWL ontology into a labeled property graph.
//!
//! The crate loads an ontology document with its imports, asks a
//! [`ontology::Reasoner`] for the inferred hierarchy, instances and property
//! values, and writes the result through a [`graph::GraphStore`] as idempotent
//! `MERGE` statements inside a single transaction.

pub mod config;
mod error;
pub mod graph;
pub mod import;
pub mod logger;
pub mod mapping;
pub mod ontology;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, ErrorCategory, Result};
