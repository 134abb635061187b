//! # randomizer-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DeviceGateway` — read and write light state
//!   - `GroupCatalog` — list and look up rooms and zones
//! - Define **driving/inbound ports** as use-case structs:
//!   - `GroupResolver` — identifier → group
//!   - `StateSnapshotter` — group → pre-effect snapshot
//!   - `EffectService` — resolve, snapshot, run, report
//! - Provide the **effect core**: session lifecycle, per-light workers,
//!   orchestration and tiered restoration
//!
//! ## Dependency rule
//! Depends on `randomizer-domain` only (plus `tokio` for tasks and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod effect;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
