//! Session activity recording
//!
//! Writes are best-effort: a failed write is logged and never fails the
//! request that caused it.

mod recorder;

pub use recorder::{ActivityRecorder, ActivityRecorderConfig};
