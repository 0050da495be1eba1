//! # FCAT Sync
//!
//! Periodic fleet polling.
//!
//! ```text
//! RefreshScheduler (coordinator task)
//!   ├─ tick ──> worker task: PollPipeline::run   (timeout = deadline)
//!   │             fleet id → members → names → classify → chat logs
//!   └─ join ──> FleetMonitor::apply              (override, tree diff, alerts)
//!                 └─> broadcast FleetEvent
//! ```

mod error;
mod monitor;
mod pipeline;
mod scheduler;

pub use error::{Result, SyncError};
pub use monitor::{FleetEvent, FleetMonitor, FleetUpdate};
pub use pipeline::{PollData, PollPipeline};
pub use scheduler::{RefreshProgress, RefreshScheduler, SchedulerConfig};
