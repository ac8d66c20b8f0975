use std::io;

/// Failure of a single submitted task, delivered through its handle.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum TaskError {
    #[error("task panicked: {0}")]
    Panic(String),
    #[error("task failed: {0}")]
    Failed(String),
    #[error("task was dropped before producing a result")]
    ChannelClosed,
}

impl TaskError {
    /// Reads the message out of a panic payload without taking ownership;
    /// dropping the payload is left to the caller.
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        TaskError::Panic(message)
    }

    /// The bare message, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            TaskError::Panic(msg) | TaskError::Failed(msg) => msg,
            TaskError::ChannelClosed => "result channel closed",
        }
    }
}

/// Failure of the pool itself.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("thread pool needs at least one worker thread")]
    ZeroThreads,
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
    #[error("thread pool is shut down")]
    ShutDown,
}
