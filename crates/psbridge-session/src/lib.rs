//! Command dispatch and guarded sequences for the host bridge.
//!
//! Provides:
//! - `Dispatcher` - One envelope per call, no guard
//! - Target resolution helpers (select layer, add to selection, select channel)
//! - `Sequence` / `SequenceRunner` - Ordered steps under the host-target guard
//! - Raw descriptor passthrough
//! - `Bridge` - Facade over all of the above, plus the process-wide bridge

pub mod bridge;
pub mod dispatcher;
pub mod passthrough;
pub mod runner;
pub mod sequence;
pub mod target;

pub use bridge::{Bridge, global};
pub use dispatcher::Dispatcher;
pub use passthrough::passthrough_sequence;
pub use runner::{HostTargetGuard, SequenceRunner};
pub use sequence::{Sequence, SubCommand};
pub use target::{Channel, LayerId, PASSTHROUGH_OPERATION};
