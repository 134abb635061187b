//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the effect core and the bridge.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod catalog;
pub mod gateway;

pub use catalog::GroupCatalog;
pub use gateway::DeviceGateway;
