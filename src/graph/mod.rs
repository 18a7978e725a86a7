//! Property graph statements and the stores that receive them.

pub mod cypher;
pub mod domain;
pub mod memory;
pub mod store;
pub mod transaction;

pub use domain::{
    GraphEdge, GraphNode, NodeKey, NodeLabel, PropertyValue, Statement, StatementKind,
};
pub use memory::{GraphState, MemoryGraph};
pub use store::GraphStore;
pub use transaction::{TransactionClient, TransactionHandle};
