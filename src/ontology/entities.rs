use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::value_objects::{ClassExpression, Iri, LiteralValue};
use super::vocab;

/// Kind of ontology entity an [`EntityRef`] points at.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Class,
    Individual,
    ObjectProperty,
    DataProperty,
    Ontology,
}

/// Reference to an ontology entity together with its compact identifier.
///
/// `uri` is the globally unique key; `compact_id` is derived from it and may
/// collide across entities.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    uri: Iri,
    compact_id: String,
    kind: EntityKind,
}

impl EntityRef {
    #[must_use]
    pub fn new(uri: Iri, compact_id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            uri,
            compact_id: compact_id.into(),
            kind,
        }
    }

    #[must_use]
    pub fn uri(&self) -> &Iri {
        &self.uri
    }

    #[must_use]
    pub fn compact_id(&self) -> &str {
        &self.compact_id
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }
}

/// Literal-valued annotation (label, comment, ...) on an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub property: Iri,
    pub value: LiteralValue,
}

/// Axioms and declarations of a single ontology document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ontology {
    id: Iri,
    imports: BTreeSet<Iri>,
    classes: BTreeSet<Iri>,
    object_properties: BTreeSet<Iri>,
    data_properties: BTreeSet<Iri>,
    individuals: BTreeSet<Iri>,
    sub_class_of: BTreeMap<Iri, BTreeSet<ClassExpression>>,
    equivalent_classes: BTreeSet<(ClassExpression, ClassExpression)>,
    disjoint_classes: BTreeSet<(Iri, Iri)>,
    sub_property_of: BTreeMap<Iri, BTreeSet<Iri>>,
    inverse_properties: BTreeSet<(Iri, Iri)>,
    symmetric_properties: BTreeSet<Iri>,
    transitive_properties: BTreeSet<Iri>,
    class_assertions: BTreeMap<Iri, BTreeSet<Iri>>,
    object_assertions: BTreeMap<Iri, BTreeMap<Iri, BTreeSet<Iri>>>,
    data_assertions: BTreeMap<Iri, BTreeMap<Iri, BTreeSet<LiteralValue>>>,
    annotations: BTreeMap<Iri, Vec<Annotation>>,
}

impl Ontology {
    /// Creates an empty ontology identified by its base URI.
    #[must_use]
    pub fn new(id: Iri) -> Self {
        Self {
            id,
            imports: BTreeSet::new(),
            classes: BTreeSet::new(),
            object_properties: BTreeSet::new(),
            data_properties: BTreeSet::new(),
            individuals: BTreeSet::new(),
            sub_class_of: BTreeMap::new(),
            equivalent_classes: BTreeSet::new(),
            disjoint_classes: BTreeSet::new(),
            sub_property_of: BTreeMap::new(),
            inverse_properties: BTreeSet::new(),
            symmetric_properties: BTreeSet::new(),
            transitive_properties: BTreeSet::new(),
            class_assertions: BTreeMap::new(),
            object_assertions: BTreeMap::new(),
            data_assertions: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    /// Returns the ontology identifier (its base URI).
    #[must_use]
    pub fn id(&self) -> &Iri {
        &self.id
    }

    pub fn add_import(&mut self, iri: Iri) -> bool {
        self.imports.insert(iri)
    }

    /// Declares a named class. Built-in vocabulary terms other than
    /// `owl:Thing`/`owl:Nothing` are ignored.
    pub fn declare_class(&mut self, iri: Iri) -> bool {
        if vocab::is_builtin(iri.as_str())
            && iri.as_str() != vocab::OWL_THING
            && iri.as_str() != vocab::OWL_NOTHING
        {
            return false;
        }
        self.classes.insert(iri)
    }

    /// Declares an object property, rejecting IRIs already used as data properties.
    pub fn declare_object_property(&mut self, iri: Iri) -> Result<bool, OntologyError> {
        if self.data_properties.contains(&iri) {
            return Err(self.conflicting_kind(iri));
        }
        Ok(self.object_properties.insert(iri))
    }

    /// Declares a data property, rejecting IRIs already used as object properties.
    pub fn declare_data_property(&mut self, iri: Iri) -> Result<bool, OntologyError> {
        if self.object_properties.contains(&iri) {
            return Err(self.conflicting_kind(iri));
        }
        Ok(self.data_properties.insert(iri))
    }

    pub fn declare_individual(&mut self, iri: Iri) -> bool {
        self.individuals.insert(iri)
    }

    /// Records `sub rdfs:subClassOf sup`.
    pub fn add_sub_class(&mut self, sub: Iri, sup: ClassExpression) {
        self.declare_class(sub.clone());
        if let ClassExpression::Named(named) = &sup {
            self.declare_class(named.clone());
        }
        self.sub_class_of.entry(sub).or_default().insert(sup);
    }

    /// Records `a owl:equivalentClass b`.
    pub fn add_equivalence(&mut self, a: ClassExpression, b: ClassExpression) {
        for expression in [&a, &b] {
            if let ClassExpression::Named(named) = expression {
                self.declare_class(named.clone());
            }
        }
        self.equivalent_classes.insert((a, b));
    }

    pub fn add_disjoint(&mut self, a: Iri, b: Iri) {
        self.declare_class(a.clone());
        self.declare_class(b.clone());
        self.disjoint_classes.insert((a, b));
    }

    pub fn add_sub_property(&mut self, sub: Iri, sup: Iri) {
        self.sub_property_of.entry(sub).or_default().insert(sup);
    }

    pub fn add_inverse(&mut self, a: Iri, b: Iri) {
        self.inverse_properties.insert((a, b));
    }

    pub fn mark_symmetric(&mut self, property: Iri) -> bool {
        self.symmetric_properties.insert(property)
    }

    pub fn mark_transitive(&mut self, property: Iri) -> bool {
        self.transitive_properties.insert(property)
    }

    /// Declares that `individual` is an instance of `class`.
    pub fn assert_type(&mut self, individual: Iri, class: Iri) {
        self.declare_individual(individual.clone());
        self.declare_class(class.clone());
        self.class_assertions
            .entry(individual)
            .or_default()
            .insert(class);
    }

    /// Records an object property assertion between two individuals.
    pub fn assert_object_property(
        &mut self,
        subject: Iri,
        property: Iri,
        object: Iri,
    ) -> Result<(), OntologyError> {
        if self.data_properties.contains(&property) {
            return Err(OntologyError::InvalidPropertyAssertion {
                ontology: self.id.clone(),
                property,
            });
        }
        self.object_properties.insert(property.clone());
        self.declare_individual(subject.clone());
        self.declare_individual(object.clone());
        self.object_assertions
            .entry(subject)
            .or_default()
            .entry(property)
            .or_default()
            .insert(object);
        Ok(())
    }

    /// Records a data property assertion on an individual.
    pub fn assert_data_property(
        &mut self,
        subject: Iri,
        property: Iri,
        value: LiteralValue,
    ) -> Result<(), OntologyError> {
        if self.object_properties.contains(&property) {
            return Err(OntologyError::InvalidPropertyAssertion {
                ontology: self.id.clone(),
                property,
            });
        }
        self.data_properties.insert(property.clone());
        self.declare_individual(subject.clone());
        self.data_assertions
            .entry(subject)
            .or_default()
            .entry(property)
            .or_default()
            .insert(value);
        Ok(())
    }

    /// Attaches a literal annotation to any entity.
    pub fn annotate(&mut self, subject: Iri, property: Iri, value: LiteralValue) {
        self.annotations
            .entry(subject)
            .or_default()
            .push(Annotation { property, value });
    }

    #[must_use]
    pub fn imports(&self) -> &BTreeSet<Iri> {
        &self.imports
    }

    #[must_use]
    pub fn classes(&self) -> &BTreeSet<Iri> {
        &self.classes
    }

    #[must_use]
    pub fn object_properties(&self) -> &BTreeSet<Iri> {
        &self.object_properties
    }

    #[must_use]
    pub fn data_properties(&self) -> &BTreeSet<Iri> {
        &self.data_properties
    }

    #[must_use]
    pub fn individuals(&self) -> &BTreeSet<Iri> {
        &self.individuals
    }

    #[must_use]
    pub fn sub_class_axioms(&self) -> &BTreeMap<Iri, BTreeSet<ClassExpression>> {
        &self.sub_class_of
    }

    #[must_use]
    pub fn equivalence_axioms(&self) -> &BTreeSet<(ClassExpression, ClassExpression)> {
        &self.equivalent_classes
    }

    #[must_use]
    pub fn disjoint_axioms(&self) -> &BTreeSet<(Iri, Iri)> {
        &self.disjoint_classes
    }

    #[must_use]
    pub fn sub_property_axioms(&self) -> &BTreeMap<Iri, BTreeSet<Iri>> {
        &self.sub_property_of
    }

    #[must_use]
    pub fn inverse_axioms(&self) -> &BTreeSet<(Iri, Iri)> {
        &self.inverse_properties
    }

    #[must_use]
    pub fn symmetric_properties(&self) -> &BTreeSet<Iri> {
        &self.symmetric_properties
    }

    #[must_use]
    pub fn transitive_properties(&self) -> &BTreeSet<Iri> {
        &self.transitive_properties
    }

    #[must_use]
    pub fn class_assertions(&self) -> &BTreeMap<Iri, BTreeSet<Iri>> {
        &self.class_assertions
    }

    #[must_use]
    pub fn object_assertions(&self) -> &BTreeMap<Iri, BTreeMap<Iri, BTreeSet<Iri>>> {
        &self.object_assertions
    }

    #[must_use]
    pub fn data_assertions(&self) -> &BTreeMap<Iri, BTreeMap<Iri, BTreeSet<LiteralValue>>> {
        &self.data_assertions
    }

    /// Annotations attached to `subject`, in document order.
    #[must_use]
    pub fn annotations_of(&self, subject: &Iri) -> &[Annotation] {
        self.annotations
            .get(subject)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn conflicting_kind(&self, property: Iri) -> OntologyError {
        OntologyError::ConflictingPropertyKind {
            ontology: self.id.clone(),
            property,
        }
    }
}

/// A primary ontology together with its resolved import closure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedOntology {
    primary: Ontology,
    imports: BTreeMap<Iri, Ontology>,
}

impl LoadedOntology {
    #[must_use]
    pub fn new(primary: Ontology) -> Self {
        Self {
            primary,
            imports: BTreeMap::new(),
        }
    }

    /// Adds an imported ontology; the primary ontology is never replaced.
    pub fn add_import(&mut self, ontology: Ontology) -> bool {
        if ontology.id() == self.primary.id() || self.imports.contains_key(ontology.id()) {
            return false;
        }
        self.imports.insert(ontology.id().clone(), ontology);
        true
    }

    #[must_use]
    pub fn primary(&self) -> &Ontology {
        &self.primary
    }

    /// Imported ontologies ordered by IRI.
    pub fn imports(&self) -> impl Iterator<Item = &Ontology> {
        self.imports.values()
    }

    /// The primary ontology followed by every import.
    pub fn closure(&self) -> impl Iterator<Item = &Ontology> {
        std::iter::once(&self.primary).chain(self.imports.values())
    }

    /// Named classes of the whole closure ordered by URI, without the
    /// `owl:Thing`/`owl:Nothing` built-ins.
    #[must_use]
    pub fn classes_in_signature(&self) -> BTreeSet<Iri> {
        self.closure()
            .flat_map(|ontology| ontology.classes().iter())
            .filter(|iri| iri.as_str() != vocab::OWL_THING && iri.as_str() != vocab::OWL_NOTHING)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn object_properties_in_signature(&self) -> BTreeSet<Iri> {
        self.closure()
            .flat_map(|ontology| ontology.object_properties().iter())
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn data_properties_in_signature(&self) -> BTreeSet<Iri> {
        self.closure()
            .flat_map(|ontology| ontology.data_properties().iter())
            .cloned()
            .collect()
    }
}

/// Errors raised when manipulating an ontology aggregate.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OntologyError {
    /// The same IRI was declared both as object and as data property.
    #[error("property `{property}` is declared as both object and data property in ontology `{ontology}`")]
    ConflictingPropertyKind { ontology: Iri, property: Iri },
    /// Property assertion type did not match the property definition.
    #[error("property assertion does not match property `{property}` in ontology `{ontology}`")]
    InvalidPropertyAssertion { ontology: Iri, property: Iri },
}
