//! Effect core — session state, per-light workers, orchestration and
//! restoration.
//!
//! All timing runs on the runtime's monotonic clock. Workers share one
//! [`CancellationToken`](tokio_util::sync::CancellationToken) and one
//! canonical start instant; every suspension point goes through
//! [`wait::wait_until`] so that cancellation is observed within one timer tick.

pub mod orchestrator;
pub mod restore;
pub mod session;
pub mod settings;
pub mod wait;
pub mod worker;

pub use orchestrator::EffectOrchestrator;
pub use restore::{RestoreCoordinator, RestorePlan};
pub use session::EffectSession;
pub use settings::{EffectTiming, JitterWindow};
pub use worker::{LightWorker, WorkerContext, WorkerReport};
