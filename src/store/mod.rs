//! Storage layer for process records
//!
//! [`ProcessStore`] is the seam between the HTTP service and the database.
//! `MongoProcessStore` talks to the `processos` collection; `InMemoryProcessStore`
//! mirrors its filter, sort and update semantics for tests and local runs.

pub mod error;
pub mod memory;
pub mod mongo;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryProcessStore;
pub use mongo::MongoProcessStore;

use async_trait::async_trait;

use crate::models::{CollaboratorAssignment, Process, StatusChange, UpdateOutcome};
use crate::pagination::PageRequest;
use crate::query::ProcessFilter;

#[async_trait]
pub trait ProcessStore: Send + Sync {
    /// Number of records matching the filter
    async fn count(&self, filter: &ProcessFilter) -> StoreResult<u64>;

    /// One page of matching records, newest `dataImportacao` first
    async fn find_page(&self, filter: &ProcessFilter, page: &PageRequest)
        -> StoreResult<Vec<Process>>;

    /// Every matching record, restricted to the dashboard fields
    async fn find_for_dashboard(&self, filter: &ProcessFilter) -> StoreResult<Vec<Process>>;

    /// Set the status of the record with the given `nup` and append the
    /// transition to its history
    async fn update_status(&self, nup: &str, change: &StatusChange) -> StoreResult<UpdateOutcome>;

    /// Record a collaborator assignment on the record with the given `nup`
    async fn assign_collaborator(
        &self,
        nup: &str,
        assignment: &CollaboratorAssignment,
    ) -> StoreResult<UpdateOutcome>;

    /// Check the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Release backend resources at shutdown
    async fn close(&self) {}
}
