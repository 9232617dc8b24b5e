pub mod health;
pub mod diagnostics;
pub mod session_create;
pub mod session_list;
pub mod session_delete;
pub mod session_update;
pub mod session_version;
pub mod session_comment;

pub use health::*;
pub use diagnostics::*;
pub use session_create::*;
pub use session_list::*;
pub use session_delete::*;
pub use session_update::*;
pub use session_version::*;
pub use session_comment::*;

use crate::error::{ColabError, ColabResult};

/// Reject blank identifiers before they reach the registry.
pub(crate) fn require_field(name: &str, value: &str) -> ColabResult<()> {
    if value.trim().is_empty() {
        return Err(ColabError::Malformed(format!("'{}' must not be empty", name)));
    }
    Ok(())
}
