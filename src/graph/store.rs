use async_trait::async_trait;

use super::domain::Statement;
use crate::Result;

/// Transactional sink for graph statements.
///
/// A run opens exactly one transaction, submits statements in emission order
/// and commits once. The handle is owned by the caller and consumed by
/// [`GraphStore::commit`], so a committed transaction cannot be reused.
#[async_trait]
pub trait GraphStore: Send + Sync {
    type Handle: Send + Sync;

    async fn begin(&self) -> Result<Self::Handle>;

    async fn submit(&self, handle: &Self::Handle, statement: &Statement) -> Result<()>;

    async fn commit(&self, handle: Self::Handle) -> Result<()>;
}
