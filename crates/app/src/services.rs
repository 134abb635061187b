//! Use-case services that orchestrate domain logic through ports.

pub mod effect_service;
pub mod group_resolver;
pub mod snapshotter;

pub use effect_service::{EffectRequest, EffectService};
pub use group_resolver::{GroupResolver, ResolveHints};
pub use snapshotter::StateSnapshotter;
