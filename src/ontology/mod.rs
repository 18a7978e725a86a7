//! Ontology model, document loading and the reasoning capability.
//!
//! Everything here is independent from the graph store: the loader turns RDF
//! documents into [`LoadedOntology`] aggregates and a [`Reasoner`] answers the
//! queries the import walk needs.

pub mod entities;
pub mod loader;
pub mod reasoner;
pub mod structural;
pub mod value_objects;
pub mod vocab;

pub use entities::{
    Annotation, EntityKind, EntityRef, LoadedOntology, Ontology, OntologyError,
};
pub use loader::{load_ontology, parse_document};
pub use reasoner::{Reasoner, ReasonerError};
pub use structural::StructuralReasoner;
pub use value_objects::{ClassExpression, Iri, IriError, LiteralValue};
