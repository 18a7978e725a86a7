use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use owl2graph::{
    config::OntologySettings,
    graph::{GraphState, MemoryGraph, NodeLabel, PropertyValue},
    mapping::{GraphBuilder, ROOT_CLASS_ID},
    ontology::{
        vocab, ClassExpression, Iri, LiteralValue, LoadedOntology, Ontology, Reasoner,
        ReasonerError,
    },
    Error,
};

const BASE: &str = "http://example.org/onto";

fn iri(local: &str) -> Iri {
    Iri::new(format!("{BASE}#{local}")).expect("valid iri")
}

fn uri(local: &str) -> String {
    format!("{BASE}#{local}")
}

fn settings() -> OntologySettings {
    OntologySettings {
        path: PathBuf::from("onto.ttl"),
        name: "Example Ontology".to_string(),
        acronym: "ex".to_string(),
    }
}

#[derive(Default)]
struct ReasonerStub {
    inconsistent: bool,
    consistency_checks: AtomicUsize,
    supers: BTreeMap<Iri, BTreeSet<Iri>>,
    equivalents: BTreeMap<Iri, BTreeSet<ClassExpression>>,
    instances: BTreeMap<Iri, BTreeSet<Iri>>,
    objects: BTreeMap<(Iri, Iri), BTreeSet<Iri>>,
    data: BTreeMap<(Iri, Iri), BTreeSet<LiteralValue>>,
    unknown: Option<Iri>,
}

impl ReasonerStub {
    fn check(&self, class: &Iri) -> Result<(), ReasonerError> {
        match &self.unknown {
            Some(unknown) if unknown == class => Err(ReasonerError::UnknownEntity(class.clone())),
            _ => Ok(()),
        }
    }
}

impl Reasoner for ReasonerStub {
    fn is_consistent(&self) -> Result<bool, ReasonerError> {
        self.consistency_checks.fetch_add(1, Ordering::SeqCst);
        Ok(!self.inconsistent)
    }

    fn super_classes_of(&self, class: &Iri, _direct: bool) -> Result<BTreeSet<Iri>, ReasonerError> {
        self.check(class)?;
        Ok(self.supers.get(class).cloned().unwrap_or_default())
    }

    fn equivalence_class_of(
        &self,
        class: &ClassExpression,
    ) -> Result<BTreeSet<ClassExpression>, ReasonerError> {
        let named = class.as_named().expect("named class");
        Ok(self.equivalents.get(named).cloned().unwrap_or_default())
    }

    fn instances_of(&self, class: &Iri, _direct: bool) -> Result<BTreeSet<Iri>, ReasonerError> {
        Ok(self.instances.get(class).cloned().unwrap_or_default())
    }

    fn object_property_values(
        &self,
        individual: &Iri,
        property: &Iri,
    ) -> Result<BTreeSet<Iri>, ReasonerError> {
        Ok(self
            .objects
            .get(&(individual.clone(), property.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn data_property_values(
        &self,
        individual: &Iri,
        property: &Iri,
    ) -> Result<BTreeSet<LiteralValue>, ReasonerError> {
        Ok(self
            .data
            .get(&(individual.clone(), property.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

fn ontology(classes: &[&str]) -> Ontology {
    let mut ontology = Ontology::new(Iri::new(BASE).expect("base"));
    for class in classes {
        ontology.declare_class(iri(class));
    }
    ontology
}

async fn build(loaded: &LoadedOntology, reasoner: &ReasonerStub) -> GraphState {
    let graph = MemoryGraph::new();
    let settings = settings();
    GraphBuilder::new(loaded, reasoner, &graph, &settings)
        .build()
        .await
        .expect("import");
    graph.snapshot().expect("snapshot")
}

#[tokio::test]
async fn writes_ontology_and_root_nodes() {
    let loaded = LoadedOntology::new(ontology(&[]));
    let graph = build(&loaded, &ReasonerStub::default()).await;

    let ontology = graph.node(NodeLabel::Ontology, BASE).expect("ontology node");
    assert_eq!(ontology.compact_id, "ex");
    assert_eq!(
        ontology.properties.get("rdfs:label"),
        Some(&PropertyValue::from("Example Ontology"))
    );
    assert_eq!(ontology.properties.get("acronym"), Some(&PropertyValue::from("ex")));
    assert_eq!(ontology.properties.get("uri"), Some(&PropertyValue::from(BASE)));

    let root = graph
        .node(NodeLabel::Class, vocab::OWL_THING)
        .expect("root node");
    assert_eq!(root.compact_id, ROOT_CLASS_ID);
}

#[tokio::test]
async fn orphan_classes_hang_below_the_root() {
    let loaded = LoadedOntology::new(ontology(&["Cell", "Neuron"]));
    let mut reasoner = ReasonerStub::default();
    reasoner.supers.insert(iri("Neuron"), BTreeSet::from([iri("Cell")]));

    let graph = build(&loaded, &reasoner).await;

    let cell_parents: Vec<_> = graph
        .edges_from(&uri("Cell"), "rdfs:subClassOf")
        .map(|edge| edge.dest_uri.clone())
        .collect();
    assert_eq!(cell_parents, vec![vocab::OWL_THING.to_string()]);

    let neuron_parents: Vec<_> = graph
        .edges_from(&uri("Neuron"), "rdfs:subClassOf")
        .map(|edge| edge.dest_uri.clone())
        .collect();
    assert_eq!(neuron_parents, vec![uri("Cell")]);

    let cell = graph.node(NodeLabel::Class, &uri("Cell")).expect("class node");
    assert_eq!(cell.compact_id, "ex:Cell");
    assert!(cell.extra_labels.contains("ex"));
}

#[tokio::test]
async fn equivalence_never_produces_self_loops() {
    let loaded = LoadedOntology::new(ontology(&["Neuron", "NerveCell"]));
    let mut reasoner = ReasonerStub::default();
    let set = BTreeSet::from([
        ClassExpression::Named(iri("Neuron")),
        ClassExpression::Named(iri("NerveCell")),
    ]);
    reasoner.equivalents.insert(iri("Neuron"), set.clone());
    reasoner.equivalents.insert(iri("NerveCell"), set);

    let graph = build(&loaded, &reasoner).await;

    let equivalences: BTreeSet<_> = graph
        .edges()
        .filter(|edge| edge.relationship == "owl:equivalentClass")
        .map(|edge| (edge.src_uri.clone(), edge.dest_uri.clone()))
        .collect();
    assert_eq!(
        equivalences,
        BTreeSet::from([
            (uri("NerveCell"), uri("Neuron")),
            (uri("Neuron"), uri("NerveCell")),
        ])
    );
    assert!(graph.edges().all(|edge| edge.src_uri != edge.dest_uri));
}

#[tokio::test]
async fn labels_fall_back_to_imported_ontologies() {
    let mut primary = ontology(&["Local", "Borrowed", "Unlabelled"]);
    primary.annotate(
        iri("Local"),
        Iri::new(vocab::RDFS_LABEL).expect("iri"),
        LiteralValue::simple("local cell").with_language("en"),
    );
    let mut upper = Ontology::new(Iri::new("http://example.org/upper").expect("iri"));
    upper.annotate(
        iri("Borrowed"),
        Iri::new(vocab::RDFS_LABEL).expect("iri"),
        LiteralValue::simple("borrowed cell"),
    );
    let mut loaded = LoadedOntology::new(primary);
    loaded.add_import(upper);

    let graph = build(&loaded, &ReasonerStub::default()).await;

    let local = graph.node(NodeLabel::Class, &uri("Local")).expect("node");
    assert_eq!(
        local.properties.get("rdfs:label"),
        Some(&PropertyValue::from("local cell"))
    );
    assert_eq!(local.properties.get("lang"), Some(&PropertyValue::from("en")));

    let borrowed = graph.node(NodeLabel::Class, &uri("Borrowed")).expect("node");
    assert_eq!(
        borrowed.properties.get("rdfs:label"),
        Some(&PropertyValue::from("borrowed cell"))
    );
    assert!(!borrowed.properties.contains_key("lang"));

    let unlabelled = graph.node(NodeLabel::Class, &uri("Unlabelled")).expect("node");
    assert!(unlabelled.properties.is_empty());
}

#[tokio::test]
async fn individuals_carry_types_relationships_and_values() {
    let mut primary = ontology(&["Person"]);
    primary
        .declare_object_property(iri("knows"))
        .expect("object property");
    primary
        .declare_data_property(iri("age"))
        .expect("data property");
    primary
        .declare_data_property(iri("nick"))
        .expect("data property");
    let loaded = LoadedOntology::new(primary);

    let mut reasoner = ReasonerStub::default();
    reasoner
        .instances
        .insert(iri("Person"), BTreeSet::from([iri("alice")]));
    reasoner.objects.insert(
        (iri("alice"), iri("knows")),
        BTreeSet::from([iri("bob")]),
    );
    reasoner.data.insert(
        (iri("alice"), iri("age")),
        BTreeSet::from([LiteralValue::simple("42")]),
    );
    reasoner.data.insert(
        (iri("alice"), iri("nick")),
        BTreeSet::from([LiteralValue::simple("Al"), LiteralValue::simple("Ali")]),
    );

    let graph = build(&loaded, &reasoner).await;

    let types: Vec<_> = graph
        .edges_from(&uri("alice"), "rdf:type")
        .map(|edge| edge.dest_uri.clone())
        .collect();
    assert_eq!(types, vec![uri("Person")]);

    let knows: Vec<_> = graph
        .edges_from(&uri("alice"), "ex:knows")
        .map(|edge| (edge.dest_label, edge.dest_uri.clone()))
        .collect();
    assert_eq!(knows, vec![(NodeLabel::Individual, uri("bob"))]);

    let relationship = graph
        .node(NodeLabel::Relationship, &uri("knows"))
        .expect("relationship meta node");
    assert_eq!(relationship.compact_id, "ex:knows");
    assert!(graph.node(NodeLabel::Property, &uri("age")).is_some());

    let alice = graph.node(NodeLabel::Individual, &uri("alice")).expect("individual");
    assert_eq!(alice.compact_id, "ex:alice");
    assert_eq!(alice.properties.get("ex:age"), Some(&PropertyValue::from("42")));
    assert_eq!(
        alice.properties.get("ex:nick"),
        Some(&PropertyValue::List(vec!["Al".to_string(), "Ali".to_string()]))
    );
}

#[tokio::test]
async fn importing_twice_does_not_duplicate_anything() {
    let loaded = LoadedOntology::new(ontology(&["Cell", "Neuron"]));
    let mut reasoner = ReasonerStub::default();
    reasoner.supers.insert(iri("Neuron"), BTreeSet::from([iri("Cell")]));
    reasoner
        .instances
        .insert(iri("Neuron"), BTreeSet::from([iri("n1")]));

    let graph = MemoryGraph::new();
    let settings = settings();
    let builder = GraphBuilder::new(&loaded, &reasoner, &graph, &settings);
    let first = builder.build().await.expect("first import");
    let after_first = graph.snapshot().expect("snapshot");
    let second = builder.build().await.expect("second import");
    let after_second = graph.snapshot().expect("snapshot");

    assert_eq!(first, second);
    assert_eq!(after_first, after_second);
    assert_eq!(first.classes, 2);
    assert_eq!(first.individuals, 1);
}

#[tokio::test]
async fn inconsistent_ontology_writes_nothing() {
    let loaded = LoadedOntology::new(ontology(&["Cell"]));
    let reasoner = ReasonerStub {
        inconsistent: true,
        ..ReasonerStub::default()
    };
    let graph = MemoryGraph::new();
    let settings = settings();

    let err = GraphBuilder::new(&loaded, &reasoner, &graph, &settings)
        .build()
        .await
        .expect_err("inconsistent");

    assert!(matches!(err, Error::Inconsistent(ref name) if name == BASE));
    assert_eq!(graph.snapshot().expect("snapshot").node_count(), 0);
}

#[tokio::test]
async fn reasoner_failure_aborts_before_commit() {
    let loaded = LoadedOntology::new(ontology(&["Cell", "Neuron"]));
    let reasoner = ReasonerStub {
        unknown: Some(iri("Neuron")),
        ..ReasonerStub::default()
    };
    let graph = MemoryGraph::new();
    let settings = settings();

    let err = GraphBuilder::new(&loaded, &reasoner, &graph, &settings)
        .build()
        .await
        .expect_err("reasoner failure");

    assert!(matches!(
        err,
        Error::Reasoner(ReasonerError::UnknownEntity(ref class)) if *class == iri("Neuron")
    ));
    assert_eq!(graph.snapshot().expect("snapshot").node_count(), 0);
}

#[tokio::test]
async fn consistency_is_checked_once_per_run() {
    let loaded = LoadedOntology::new(ontology(&["Cell"]));
    let reasoner = ReasonerStub::default();
    let graph = MemoryGraph::new();
    let settings = settings();
    let builder = GraphBuilder::new(&loaded, &reasoner, &graph, &settings);

    builder.ensure_consistent().expect("consistent");
    let report = builder.write().await.expect("import");
    assert_eq!(reasoner.consistency_checks.load(Ordering::SeqCst), 1);
    assert_eq!(report.classes, 1);

    builder.build().await.expect("second import");
    assert_eq!(reasoner.consistency_checks.load(Ordering::SeqCst), 2);
}
