//! Repository layer.
//!
//! Every query is scoped by `uid`, directly or through the parent note: a
//! row owned by another principal is indistinguishable from a missing row.
//! Queries are runtime-checked (`sqlx::query_as`) and parameterized.

pub mod cars;
pub mod confidentials;
pub mod notes;
pub mod pages;
pub mod refuelings;
pub mod sections;
pub mod task_lists;
pub mod tasks;

pub use cars::CarsRepository;
pub use confidentials::ConfidentialsRepository;
pub use notes::NotesRepository;
pub use pages::PagesRepository;
pub use refuelings::RefuelingsRepository;
pub use sections::SectionsRepository;
pub use task_lists::TaskListsRepository;
pub use tasks::TasksRepository;

use crate::errors::ApiError;
use crate::observability::metrics;
use std::time::Instant;

/// Record query metrics and convert the error.
pub(crate) fn observe<T>(
    operation: &'static str,
    start: Instant,
    result: Result<T, sqlx::Error>,
) -> Result<T, ApiError> {
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::record_db_query(operation, status, start.elapsed());
    result.map_err(ApiError::from)
}
