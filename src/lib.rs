//! Fixed-size thread pool with a shared FIFO queue
//!
//! # Features
//! - A fixed set of OS worker threads, created once and never resized
//! - `post` returns a handle that can be waited on or `.await`ed
//! - Panics and `Err` results are captured into the task's own handle
//! - Graceful shutdown: queued tasks are drained before workers are joined
//! - Metrics and lifecycle state for monitoring

pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod queue;
pub mod result;

pub use errors::{PoolError, TaskError};
pub use handle::{JoinHandle, SharedHandle};
pub use model::{PoolMetrics, PoolState};
pub use pool::{Config, ThreadPool};
pub use result::TaskResult;
