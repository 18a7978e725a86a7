//! End-to-end import run: probe the store, load and reason over the ontology,
//! then write the graph in a single transaction.

use tracing::info;

use crate::{
    config::ImportSettings,
    graph::{GraphState, MemoryGraph, NodeLabel, Statement, TransactionClient},
    mapping::{GraphBuilder, ImportReport},
    ontology::{load_ontology, StructuralReasoner},
    Result,
};

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub report: ImportReport,
    /// The resulting graph, kept only for dry runs.
    pub graph: Option<GraphState>,
}

/// One uniqueness constraint on `uri` per node label.
#[must_use]
pub fn uniqueness_constraints() -> Vec<Statement> {
    NodeLabel::ALL.into_iter().map(Statement::UniqueUri).collect()
}

/// Runs a complete import described by `settings`.
///
/// # Errors
///
/// Every failure is fatal: configuration, connectivity, ontology loading,
/// inconsistency, transport and commit errors are returned as they happen.
pub async fn run(settings: &ImportSettings) -> Result<ImportOutcome> {
    settings.validate()?;

    if settings.dry_run {
        let ontology = load_ontology(&settings.ontology.path)?;
        let reasoner = StructuralReasoner::new(&ontology);
        let graph = MemoryGraph::new();
        let report = GraphBuilder::new(&ontology, &reasoner, &graph, &settings.ontology)
            .build()
            .await?;
        let state = graph.snapshot()?;
        info!(
            nodes = state.node_count(),
            edges = state.edge_count(),
            properties = state.property_count(),
            "dry run finished"
        );
        return Ok(ImportOutcome {
            report,
            graph: Some(state),
        });
    }

    let client = TransactionClient::new(&settings.server)?;
    client.probe().await?;

    let ontology = load_ontology(&settings.ontology.path)?;
    let reasoner = StructuralReasoner::new(&ontology);
    let builder = GraphBuilder::new(&ontology, &reasoner, &client, &settings.ontology);
    builder.ensure_consistent()?;

    if settings.constraints {
        let constraints = uniqueness_constraints();
        client.run_autocommit(&constraints).await?;
        info!(count = constraints.len(), "uniqueness constraints created");
    }

    let report = builder.write().await?;
    Ok(ImportOutcome {
        report,
        graph: None,
    })
}
