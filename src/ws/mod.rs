pub mod handler;
pub mod hub;
pub mod registry;
pub mod room;
pub mod router;

pub use hub::{JoinPolicy, Joined};
pub use registry::{RegistryStats, SessionRegistry};
pub use router::EventOutcome;
