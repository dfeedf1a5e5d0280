//! Job registry and progress streaming.
//!
//! The registry owns every job's state machine and a broadcast bus per job.
//! Pipeline code only emits into it through a [`ProgressTracker`]; transport
//! adapters read from it through [`progress_stream`].

pub mod error;
pub mod mirror;
pub mod registry;
pub mod stream;
pub mod tracker;

pub use error::{ProgressError, ProgressResult};
pub use mirror::RedisProgressMirror;
pub use registry::JobRegistry;
pub use stream::{progress_stream, ProgressStream};
pub use tracker::ProgressTracker;
