pub mod comment;
pub mod diagnostics;
pub mod error;
pub mod health;
pub mod messages;
pub mod ready;
pub mod session;
pub mod session_comment;
pub mod session_create;
pub mod session_delete;
pub mod session_list;
pub mod session_update;
pub mod session_version;
pub mod version;

pub use comment::*;
pub use diagnostics::*;
pub use error::*;
pub use health::*;
pub use messages::*;
pub use ready::*;
pub use session::*;
pub use session_comment::*;
pub use session_create::*;
pub use session_delete::*;
pub use session_list::*;
pub use session_update::*;
pub use session_version::*;
pub use version::*;
