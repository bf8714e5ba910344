//! Framework-agnostic business logic.
//!
//! Every operation takes its collaborators (database connection, AI gateway, object
//! storage) as arguments and the requesting user's id, so the same functions serve the
//! HTTP layer and the tests.

pub mod calendar;
pub mod chat;
pub mod image;
pub mod plant;
pub mod scan;
pub mod scheduler;
pub mod search;
pub mod suggestion;
pub mod task_generator;
pub mod upload;

use crate::errors::{Error, Result};

/// Largest page a listing returns in one request.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Checks a requested row limit before it reaches the query builder.
///
/// # Errors
/// [`Error::Validation`] when `limit` exceeds [`MAX_PAGE_SIZE`].
pub fn page_size(limit: u64) -> Result<u64> {
    if limit > MAX_PAGE_SIZE {
        return Err(Error::validation(format!(
            "limit must be at most {MAX_PAGE_SIZE}"
        )));
    }
    Ok(limit)
}
