use super::{
    errors::TaskError,
    result::TaskResult,
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll}
};
use futures::future::{FutureExt, Shared};
use tokio::sync::oneshot::{self, error::TryRecvError};


/// A queued unit of work. It resolves its own handle and reports the failure,
/// if any, back to the worker for logging.
pub type Task = Box<dyn FnOnce() -> Result<(), TaskError> + Send + 'static>;


/// Handle on a posted task, resolved exactly once by the worker that ran it.
///
/// Block on it with [`JoinHandle::wait`] or `.await` it from async code.
pub struct JoinHandle<T> {
    receiver: oneshot::Receiver<TaskResult<T>>,
}

impl<T> JoinHandle<T> {

    pub(crate) fn new(receiver: oneshot::Receiver<TaskResult<T>>) -> Self {
        Self { receiver }
    }

    /// Blocks the calling thread until the task has finished.
    pub fn wait(self) -> TaskResult<T> {
        futures::executor::block_on(self)
    }

    /// Non-blocking poll. Returns `None` while the task is pending.
    ///
    /// Once this returns `Some`, the result has been moved out; later calls
    /// yield `TaskError::ChannelClosed`.
    pub fn try_result(&mut self) -> Option<TaskResult<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(TaskError::ChannelClosed)),
        }
    }

    /// Converts into a handle that any number of readers can clone and await.
    pub fn shared(self) -> SharedHandle<T>
    where
        T: Clone,
    {
        SharedHandle { inner: FutureExt::shared(self) }
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = TaskResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(res) => Poll::Ready(res.unwrap_or(Err(TaskError::ChannelClosed))),
            Poll::Pending => Poll::Pending,
        }
    }
}


/// Multi-reader view of a task result: write-once, readable any number of times.
#[derive(Clone)]
pub struct SharedHandle<T: Clone> {
    inner: Shared<JoinHandle<T>>,
}

impl<T: Clone> SharedHandle<T> {
    pub fn wait(&self) -> TaskResult<T> {
        futures::executor::block_on(self.inner.clone())
    }
}

impl<T: Clone> Future for SharedHandle<T> {
    type Output = TaskResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().inner).poll(cx)
    }
}
