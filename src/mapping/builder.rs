use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use tracing::{debug, info};

use super::{equivalence::equivalent_classes, label::LabelResolver, normalize::UriNormalizer};
use crate::{
    config::OntologySettings,
    graph::{GraphEdge, GraphStore, NodeKey, NodeLabel, PropertyValue, Statement, StatementKind},
    ontology::{vocab, ClassExpression, EntityKind, EntityRef, Iri, LoadedOntology, Reasoner},
    Error, Result,
};

/// Compact id of the universal root class.
pub const ROOT_CLASS_ID: &str = "owl:Thing";

pub const SUB_CLASS_OF: &str = "rdfs:subClassOf";
pub const EQUIVALENT_CLASS: &str = "owl:equivalentClass";
pub const INSTANCE_OF: &str = "rdf:type";

/// Summary of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub classes: usize,
    pub individuals: usize,
    pub node_statements: usize,
    pub edge_statements: usize,
    pub property_statements: usize,
}

impl ImportReport {
    fn record(&mut self, kind: StatementKind) {
        match kind {
            StatementKind::Node => self.node_statements += 1,
            StatementKind::Edge => self.edge_statements += 1,
            StatementKind::Property => self.property_statements += 1,
            StatementKind::Constraint => {}
        }
    }

    #[must_use]
    pub fn statements(&self) -> usize {
        self.node_statements + self.edge_statements + self.property_statements
    }
}

impl Display for ImportReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} classes, {} individuals, {} statements ({} nodes, {} edges, {} properties)",
            self.classes,
            self.individuals,
            self.statements(),
            self.node_statements,
            self.edge_statements,
            self.property_statements
        )
    }
}

/// Bookkeeping for a single walk.
#[derive(Default)]
struct Progress {
    report: ImportReport,
    meta_nodes: BTreeSet<NodeKey>,
    individual_nodes: BTreeSet<Iri>,
    expanded: BTreeSet<Iri>,
}

/// Walks a reasoned ontology and writes it into a [`GraphStore`] inside one
/// transaction.
pub struct GraphBuilder<'a, R: ?Sized, S> {
    ontology: &'a LoadedOntology,
    reasoner: &'a R,
    store: &'a S,
    settings: &'a OntologySettings,
    normalizer: UriNormalizer,
    labels: LabelResolver<'a>,
    object_properties: BTreeSet<Iri>,
    data_properties: BTreeSet<Iri>,
}

impl<'a, R, S> GraphBuilder<'a, R, S>
where
    R: Reasoner + ?Sized,
    S: GraphStore,
{
    #[must_use]
    pub fn new(
        ontology: &'a LoadedOntology,
        reasoner: &'a R,
        store: &'a S,
        settings: &'a OntologySettings,
    ) -> Self {
        Self {
            ontology,
            reasoner,
            store,
            settings,
            normalizer: UriNormalizer::new(ontology.primary().id().as_str(), &settings.acronym),
            labels: LabelResolver::new(ontology),
            object_properties: ontology.object_properties_in_signature(),
            data_properties: ontology.data_properties_in_signature(),
        }
    }

    /// # Errors
    ///
    /// [`Error::Inconsistent`] when the reasoner finds no model.
    pub fn ensure_consistent(&self) -> Result<()> {
        if self.reasoner.is_consistent()? {
            Ok(())
        } else {
            Err(Error::Inconsistent(self.ontology.primary().id().to_string()))
        }
    }

    /// Checks consistency, then writes the whole graph and commits.
    ///
    /// # Errors
    ///
    /// Any reasoner, transport or commit failure aborts the run. Statements
    /// submitted before the failure are left to the store's transaction
    /// handling.
    pub async fn build(&self) -> Result<ImportReport> {
        self.ensure_consistent()?;
        self.write().await
    }

    /// Writes the whole graph and commits, assuming the caller already ran
    /// [`Self::ensure_consistent`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::build`] minus the consistency check.
    pub async fn write(&self) -> Result<ImportReport> {
        let ontology_iri = self.ontology.primary().id();
        let handle = self.store.begin().await?;
        let report = self.walk(&handle).await?;
        self.store.commit(handle).await?;

        info!(ontology = %ontology_iri, %report, "ontology imported");
        Ok(report)
    }

    async fn walk(&self, handle: &S::Handle) -> Result<ImportReport> {
        let mut progress = Progress::default();
        let ontology_iri = self.ontology.primary().id();

        let ontology_ref = EntityRef::new(
            ontology_iri.clone(),
            self.settings.acronym.as_str(),
            EntityKind::Ontology,
        );
        self.emit(
            handle,
            &mut progress,
            Statement::merge_entity(&ontology_ref, Vec::new()),
        )
        .await?;
        self.set_properties(
            handle,
            &mut progress,
            NodeKey::of(&ontology_ref),
            vec![
                ("rdfs:label".to_string(), PropertyValue::from(self.settings.name.as_str())),
                ("acronym".to_string(), PropertyValue::from(self.settings.acronym.as_str())),
                ("uri".to_string(), PropertyValue::from(ontology_iri.as_str())),
            ],
        )
        .await?;

        let root = Iri::new(vocab::OWL_THING)?;
        self.merge_class(handle, &mut progress, &root, false).await?;

        let classes = self.ontology.classes_in_signature();
        info!(classes = classes.len(), "walking class hierarchy");
        for class in &classes {
            self.import_class(handle, &mut progress, class, &root).await?;
        }

        progress.report.classes = classes.len();
        progress.report.individuals = progress.individual_nodes.len();
        Ok(progress.report)
    }

    async fn import_class(
        &self,
        handle: &S::Handle,
        progress: &mut Progress,
        class: &Iri,
        root: &Iri,
    ) -> Result<()> {
        debug!(%class, "importing class");
        self.merge_class(handle, progress, class, true).await?;
        let label = self.labels.resolve(class);
        self.set_properties(
            handle,
            progress,
            NodeKey::new(NodeLabel::Class, class.as_str()),
            label.properties(),
        )
        .await?;

        let supers = self.reasoner.super_classes_of(class, true)?;
        if supers.is_empty() {
            self.class_edge(handle, progress, class, root, SUB_CLASS_OF)
                .await?;
        }
        for parent in &supers {
            self.merge_class(handle, progress, parent, false).await?;
            self.class_edge(handle, progress, class, parent, SUB_CLASS_OF)
                .await?;
        }

        let equivalents =
            equivalent_classes(self.reasoner, &ClassExpression::Named(class.clone()))?;
        for equivalent in equivalents.iter().filter_map(ClassExpression::as_named) {
            if equivalent == class {
                continue;
            }
            self.merge_class(handle, progress, equivalent, false).await?;
            self.class_edge(handle, progress, equivalent, class, EQUIVALENT_CLASS)
                .await?;
        }

        for individual in self.reasoner.instances_of(class, true)? {
            self.merge_individual(handle, progress, &individual).await?;
            self.emit(
                handle,
                progress,
                Statement::MergeEdge(GraphEdge {
                    src_label: NodeLabel::Individual,
                    src_uri: individual.as_str().to_string(),
                    dest_label: NodeLabel::Class,
                    dest_uri: class.as_str().to_string(),
                    relationship: INSTANCE_OF.to_string(),
                }),
            )
            .await?;
            if progress.expanded.insert(individual.clone()) {
                self.import_assertions(handle, progress, &individual).await?;
            }
        }
        Ok(())
    }

    async fn import_assertions(
        &self,
        handle: &S::Handle,
        progress: &mut Progress,
        individual: &Iri,
    ) -> Result<()> {
        for property in &self.object_properties {
            let targets = self.reasoner.object_property_values(individual, property)?;
            if targets.is_empty() {
                continue;
            }
            let relationship = self.normalizer.ont_id(property.as_str());
            self.merge_meta_node(handle, progress, EntityKind::ObjectProperty, property)
                .await?;
            for target in &targets {
                self.merge_individual(handle, progress, target).await?;
                self.emit(
                    handle,
                    progress,
                    Statement::MergeEdge(GraphEdge {
                        src_label: NodeLabel::Individual,
                        src_uri: individual.as_str().to_string(),
                        dest_label: NodeLabel::Individual,
                        dest_uri: target.as_str().to_string(),
                        relationship: relationship.clone(),
                    }),
                )
                .await?;
            }
        }

        for property in &self.data_properties {
            let values = self.reasoner.data_property_values(individual, property)?;
            let mut values: Vec<String> = values
                .iter()
                .map(|value| value.lexical().to_string())
                .collect();
            let value = match values.len() {
                0 => continue,
                1 => PropertyValue::Text(values.remove(0)),
                _ => PropertyValue::List(values),
            };
            self.merge_meta_node(handle, progress, EntityKind::DataProperty, property)
                .await?;
            self.set_properties(
                handle,
                progress,
                NodeKey::new(NodeLabel::Individual, individual.as_str()),
                vec![(self.normalizer.ont_id(property.as_str()), value)],
            )
            .await?;
        }
        Ok(())
    }

    fn class_id(&self, class: &Iri) -> String {
        if class.as_str() == vocab::OWL_THING {
            ROOT_CLASS_ID.to_string()
        } else {
            self.normalizer.ont_id(class.as_str())
        }
    }

    async fn merge_class(
        &self,
        handle: &S::Handle,
        progress: &mut Progress,
        class: &Iri,
        tag_with_acronym: bool,
    ) -> Result<()> {
        let extra_labels = if tag_with_acronym {
            vec![self.settings.acronym.clone()]
        } else {
            Vec::new()
        };
        let entity = EntityRef::new(class.clone(), self.class_id(class), EntityKind::Class);
        self.emit(
            handle,
            progress,
            Statement::merge_entity(&entity, extra_labels),
        )
        .await
    }

    async fn class_edge(
        &self,
        handle: &S::Handle,
        progress: &mut Progress,
        src: &Iri,
        dest: &Iri,
        relationship: &str,
    ) -> Result<()> {
        self.emit(
            handle,
            progress,
            Statement::MergeEdge(GraphEdge {
                src_label: NodeLabel::Class,
                src_uri: src.as_str().to_string(),
                dest_label: NodeLabel::Class,
                dest_uri: dest.as_str().to_string(),
                relationship: relationship.to_string(),
            }),
        )
        .await
    }

    /// Merges an individual node; its label is written the first time only.
    async fn merge_individual(
        &self,
        handle: &S::Handle,
        progress: &mut Progress,
        individual: &Iri,
    ) -> Result<()> {
        let entity = self.normalizer.entity(individual, EntityKind::Individual);
        let key = NodeKey::of(&entity);
        self.emit(
            handle,
            progress,
            Statement::merge_entity(&entity, Vec::new()),
        )
        .await?;
        if progress.individual_nodes.insert(individual.clone()) {
            let label = self.labels.resolve(individual);
            self.set_properties(handle, progress, key, label.properties())
                .await?;
        }
        Ok(())
    }

    /// Merges the `Relationship`/`Property` node describing `property` once
    /// per run.
    async fn merge_meta_node(
        &self,
        handle: &S::Handle,
        progress: &mut Progress,
        kind: EntityKind,
        property: &Iri,
    ) -> Result<()> {
        let entity = self.normalizer.entity(property, kind);
        let key = NodeKey::of(&entity);
        if !progress.meta_nodes.insert(key.clone()) {
            return Ok(());
        }
        self.emit(
            handle,
            progress,
            Statement::merge_entity(&entity, Vec::new()),
        )
        .await?;
        let label = self.labels.resolve(property);
        self.set_properties(handle, progress, key, label.properties())
            .await
    }

    async fn set_properties(
        &self,
        handle: &S::Handle,
        progress: &mut Progress,
        key: NodeKey,
        properties: Vec<(String, PropertyValue)>,
    ) -> Result<()> {
        if properties.is_empty() {
            return Ok(());
        }
        self.emit(handle, progress, Statement::SetProperties { key, properties })
            .await
    }

    async fn emit(
        &self,
        handle: &S::Handle,
        progress: &mut Progress,
        statement: Statement,
    ) -> Result<()> {
        self.store.submit(handle, &statement).await?;
        progress.report.record(statement.kind());
        Ok(())
    }
}
