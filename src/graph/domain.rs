use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::ontology::{EntityKind, EntityRef};

/// Labels a node can carry in the property graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NodeLabel {
    Class,
    Individual,
    Ontology,
    Relationship,
    Property,
}

impl NodeLabel {
    pub const ALL: [Self; 5] = [
        Self::Class,
        Self::Individual,
        Self::Ontology,
        Self::Relationship,
        Self::Property,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "Class",
            Self::Individual => "Individual",
            Self::Ontology => "Ontology",
            Self::Relationship => "Relationship",
            Self::Property => "Property",
        }
    }
}

impl Display for NodeLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value stored on a node. Repeated data property values become a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Identity of a node: its primary label and URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub label: NodeLabel,
    pub uri: String,
}

impl NodeKey {
    #[must_use]
    pub fn new(label: NodeLabel, uri: impl Into<String>) -> Self {
        Self {
            label,
            uri: uri.into(),
        }
    }

    /// Key of the node representing `entity`.
    #[must_use]
    pub fn of(entity: &EntityRef) -> Self {
        Self::new(entity.kind().into(), entity.uri().as_str())
    }
}

impl From<EntityKind> for NodeLabel {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Class => Self::Class,
            EntityKind::Individual => Self::Individual,
            EntityKind::ObjectProperty => Self::Relationship,
            EntityKind::DataProperty => Self::Property,
            EntityKind::Ontology => Self::Ontology,
        }
    }
}

/// A vertex of the property graph as held by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub label: NodeLabel,
    pub uri: String,
    pub compact_id: String,
    pub extra_labels: BTreeSet<String>,
    pub properties: BTreeMap<String, PropertyValue>,
}

/// A directed, typed relationship between two nodes.
///
/// Identity is `(src_uri, dest_uri, relationship)`; the labels only select
/// which nodes the URIs refer to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GraphEdge {
    pub src_label: NodeLabel,
    pub src_uri: String,
    pub dest_label: NodeLabel,
    pub dest_uri: String,
    pub relationship: String,
}

/// One idempotent graph mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Create the node if absent, then set its compact id and extra labels.
    MergeNode {
        key: NodeKey,
        compact_id: String,
        extra_labels: Vec<String>,
    },
    /// Create the edge if absent. Both endpoints must already exist.
    MergeEdge(GraphEdge),
    /// Assign properties on an existing node.
    SetProperties {
        key: NodeKey,
        properties: Vec<(String, PropertyValue)>,
    },
    /// Uniqueness constraint on `uri` for every node with `label`.
    UniqueUri(NodeLabel),
}

/// Coarse statement classification used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Node,
    Edge,
    Property,
    Constraint,
}

impl Statement {
    /// `MERGE` of the node representing `entity`, named by its compact id.
    #[must_use]
    pub fn merge_entity(entity: &EntityRef, extra_labels: Vec<String>) -> Self {
        Self::MergeNode {
            key: NodeKey::of(entity),
            compact_id: entity.compact_id().to_string(),
            extra_labels,
        }
    }

    #[must_use]
    pub fn kind(&self) -> StatementKind {
        match self {
            Self::MergeNode { .. } => StatementKind::Node,
            Self::MergeEdge(_) => StatementKind::Edge,
            Self::SetProperties { .. } => StatementKind::Property,
            Self::UniqueUri(_) => StatementKind::Constraint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, EntityRef, NodeKey, NodeLabel, PropertyValue, Statement};
    use crate::ontology::Iri;

    #[test]
    fn property_entities_become_meta_nodes() {
        let property = EntityRef::new(
            Iri::new("http://example.org/onto#partOf").expect("iri"),
            "ex:partOf",
            EntityKind::ObjectProperty,
        );
        assert_eq!(
            Statement::merge_entity(&property, Vec::new()),
            Statement::MergeNode {
                key: NodeKey::new(NodeLabel::Relationship, "http://example.org/onto#partOf"),
                compact_id: "ex:partOf".to_string(),
                extra_labels: Vec::new(),
            }
        );
        assert_eq!(NodeLabel::from(EntityKind::DataProperty), NodeLabel::Property);
    }

    #[test]
    fn labels_render_as_written_in_the_graph() {
        let rendered: Vec<_> = NodeLabel::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["Class", "Individual", "Ontology", "Relationship", "Property"]
        );
    }

    #[test]
    fn property_values_serialize_untagged() {
        let single = serde_json::to_string(&PropertyValue::from("42")).expect("json");
        let list = serde_json::to_string(&PropertyValue::List(vec!["a".into(), "b".into()]))
            .expect("json");
        assert_eq!(single, r#""42""#);
        assert_eq!(list, r#"["a","b"]"#);
    }
}
