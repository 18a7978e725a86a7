//! Ontology to property graph mapping.

pub mod builder;
pub mod equivalence;
pub mod label;
pub mod normalize;

pub use builder::{GraphBuilder, ImportReport, ROOT_CLASS_ID};
pub use equivalence::equivalent_classes;
pub use label::{Label, LabelResolver};
pub use normalize::{extract_uri, UriNormalizer};
