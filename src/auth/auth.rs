use tracing::warn;

use crate::error::{ColabError, ColabResult};

/// Only the user that created a session may delete it.
pub fn ensure_creator(created_by: &str, requester: &str) -> ColabResult<()> {
    if created_by == requester {
        return Ok(());
    }
    warn!(requester, "delete refused: requester is not the session creator");
    Err(ColabError::Forbidden("Only the session creator can delete it".to_string()))
}
