use std::collections::BTreeSet;

use thiserror::Error;

use super::value_objects::{ClassExpression, Iri, LiteralValue};

/// Capability interface over a reasoning backend.
///
/// The import walks the ontology exclusively through these queries, so any
/// backend that answers them (the bundled structural reasoner, a bridge to an
/// external DL reasoner, a test stub) can drive it. Result sets are ordered by
/// IRI, which keeps the emitted statement sequence reproducible.
pub trait Reasoner {
    /// Returns `false` when the ontology has no model.
    fn is_consistent(&self) -> Result<bool, ReasonerError>;

    /// Returns the named superclasses of `class`.
    ///
    /// With `direct` only the most specific superclasses are returned. An empty
    /// set means the class hangs directly below the root.
    fn super_classes_of(&self, class: &Iri, direct: bool) -> Result<BTreeSet<Iri>, ReasonerError>;

    /// Returns every class expression equivalent to `class`.
    ///
    /// Implementations may include `class` itself.
    fn equivalence_class_of(
        &self,
        class: &ClassExpression,
    ) -> Result<BTreeSet<ClassExpression>, ReasonerError>;

    /// Returns the individuals that are members of `class`.
    ///
    /// With `direct` individuals whose most specific type is a subclass of
    /// `class` are left out.
    fn instances_of(&self, class: &Iri, direct: bool) -> Result<BTreeSet<Iri>, ReasonerError>;

    /// Returns the individuals `individual` is related to through `property`.
    fn object_property_values(
        &self,
        individual: &Iri,
        property: &Iri,
    ) -> Result<BTreeSet<Iri>, ReasonerError>;

    /// Returns the literal values of `property` on `individual`.
    fn data_property_values(
        &self,
        individual: &Iri,
        property: &Iri,
    ) -> Result<BTreeSet<LiteralValue>, ReasonerError>;
}

/// Errors reported by reasoning backends.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReasonerError {
    /// The queried entity is not part of the reasoner's signature.
    #[error("entity `{0}` is not in the reasoner signature")]
    UnknownEntity(Iri),
}
