use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use super::{
    domain::{GraphEdge, GraphNode, NodeKey, NodeLabel, Statement},
    store::GraphStore,
};
use crate::{Error, Result};

/// Property graph held in memory with the same merge semantics as the
/// remote store. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    state: Mutex<GraphState>,
}

/// Committed contents of a [`MemoryGraph`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GraphState {
    nodes: BTreeMap<NodeKey, GraphNode>,
    edges: BTreeMap<(String, String, String), GraphEdge>,
    constraints: BTreeSet<NodeLabel>,
}

impl GraphState {
    /// Applies one statement. Edges and property assignments whose nodes do
    /// not exist are ignored, mirroring `MATCH` semantics.
    pub fn apply(&mut self, statement: &Statement) {
        match statement {
            Statement::MergeNode {
                key,
                compact_id,
                extra_labels,
            } => {
                let node = self.nodes.entry(key.clone()).or_insert_with(|| GraphNode {
                    label: key.label,
                    uri: key.uri.clone(),
                    compact_id: String::new(),
                    extra_labels: BTreeSet::new(),
                    properties: BTreeMap::new(),
                });
                node.compact_id.clone_from(compact_id);
                node.extra_labels.extend(extra_labels.iter().cloned());
            }
            Statement::MergeEdge(edge) => {
                let src = NodeKey::new(edge.src_label, edge.src_uri.clone());
                let dest = NodeKey::new(edge.dest_label, edge.dest_uri.clone());
                if !self.nodes.contains_key(&src) || !self.nodes.contains_key(&dest) {
                    debug!(?edge, "edge endpoints missing, nothing merged");
                    return;
                }
                self.edges
                    .entry((
                        edge.src_uri.clone(),
                        edge.dest_uri.clone(),
                        edge.relationship.clone(),
                    ))
                    .or_insert_with(|| edge.clone());
            }
            Statement::SetProperties { key, properties } => {
                if let Some(node) = self.nodes.get_mut(key) {
                    for (name, value) in properties {
                        node.properties.insert(name.clone(), value.clone());
                    }
                }
            }
            Statement::UniqueUri(label) => {
                self.constraints.insert(*label);
            }
        }
    }

    #[must_use]
    pub fn node(&self, label: NodeLabel, uri: &str) -> Option<&GraphNode> {
        self.nodes.get(&NodeKey::new(label, uri))
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    /// Edges leaving `uri` with the given relationship type.
    pub fn edges_from<'a>(
        &'a self,
        uri: &'a str,
        relationship: &'a str,
    ) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges
            .values()
            .filter(move |edge| edge.src_uri == uri && edge.relationship == relationship)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn property_count(&self) -> usize {
        self.nodes.values().map(|node| node.properties.len()).sum()
    }

    #[must_use]
    pub fn constraints(&self) -> &BTreeSet<NodeLabel> {
        &self.constraints
    }
}

/// Statements buffered until commit.
#[derive(Debug, Default)]
pub struct MemoryTransaction {
    pending: Mutex<Vec<Statement>>,
}

impl MemoryGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the committed graph.
    ///
    /// # Errors
    ///
    /// Fails only if a previous writer panicked while holding the lock.
    pub fn snapshot(&self) -> Result<GraphState> {
        Ok(lock(&self.state)?.clone())
    }

    /// Applies statements immediately, outside of any transaction.
    ///
    /// # Errors
    ///
    /// Fails only if a previous writer panicked while holding the lock.
    pub fn apply_all(&self, statements: &[Statement]) -> Result<()> {
        let mut state = lock(&self.state)?;
        for statement in statements {
            state.apply(statement);
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::Message("in-memory graph lock poisoned".to_string()))
}

#[async_trait]
impl GraphStore for MemoryGraph {
    type Handle = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction> {
        Ok(MemoryTransaction::default())
    }

    async fn submit(&self, handle: &MemoryTransaction, statement: &Statement) -> Result<()> {
        lock(&handle.pending)?.push(statement.clone());
        Ok(())
    }

    async fn commit(&self, handle: MemoryTransaction) -> Result<()> {
        let pending = handle
            .pending
            .into_inner()
            .map_err(|_| Error::Message("in-memory transaction lock poisoned".to_string()))?;
        let count = pending.len();
        self.apply_all(&pending)?;
        debug!(statements = count, "in-memory transaction committed");
        Ok(())
    }
}
