use crate::graph::PropertyValue;
use crate::ontology::{vocab, Iri, LoadedOntology, Ontology};

/// Human readable label of an entity. Both parts are absent when the entity
/// has no label anywhere in the import closure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Label {
    pub text: Option<String>,
    pub lang: Option<String>,
}

impl Label {
    #[must_use]
    pub fn new(text: impl Into<String>, lang: Option<String>) -> Self {
        Self {
            text: Some(text.into()),
            lang,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().map_or(true, |text| text.trim().is_empty())
    }

    /// Node properties carrying the label; empty when there is nothing to write.
    #[must_use]
    pub fn properties(&self) -> Vec<(String, PropertyValue)> {
        let Some(text) = self.text.as_ref().filter(|_| !self.is_empty()) else {
            return Vec::new();
        };
        let mut properties = vec![("rdfs:label".to_string(), PropertyValue::from(text.as_str()))];
        if let Some(lang) = self.lang.as_ref().filter(|lang| !lang.is_empty()) {
            properties.push(("lang".to_string(), PropertyValue::from(lang.as_str())));
        }
        properties
    }
}

/// Finds `rdfs:label` annotations, preferring the primary ontology and then
/// falling back to imports in IRI order.
#[derive(Debug, Clone, Copy)]
pub struct LabelResolver<'a> {
    ontology: &'a LoadedOntology,
}

impl<'a> LabelResolver<'a> {
    #[must_use]
    pub fn new(ontology: &'a LoadedOntology) -> Self {
        Self { ontology }
    }

    #[must_use]
    pub fn resolve(&self, entity: &Iri) -> Label {
        self.ontology
            .closure()
            .find_map(|ontology| label_in(ontology, entity))
            .unwrap_or_default()
    }
}

fn label_in(ontology: &Ontology, entity: &Iri) -> Option<Label> {
    ontology
        .annotations_of(entity)
        .iter()
        .filter(|annotation| annotation.property.as_str() == vocab::RDFS_LABEL)
        .map(|annotation| {
            Label::new(
                annotation.value.lexical(),
                annotation.value.language().map(ToString::to_string),
            )
        })
        .find(|label| !label.is_empty())
}
