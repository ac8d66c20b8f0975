use super::errors::PoolError;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

/// Outcome of [`TaskQueue::dequeue_or_wait`].
pub enum Dequeue<T> {
    Task(T),
    /// The queue is closed and fully drained; the worker must exit.
    Shutdown,
}

/// FIFO hand-off between submitters and workers.
///
/// The sending half sits behind a mutex as an `Option`: `None` is the stop
/// flag. Checking for shutdown and pushing therefore happen under one lock,
/// while workers receive without taking it at all.
pub struct TaskQueue<T> {
    sender: Mutex<Option<Sender<T>>>,
    receiver: Receiver<T>,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
        }
    }

    /// Appends `item` to the tail and wakes one waiting worker.
    pub fn enqueue(&self, item: T) -> Result<(), PoolError> {
        let guard = self.sender.lock();
        match guard.as_ref() {
            Some(sender) => sender.send(item).map_err(|_| PoolError::ShutDown),
            None => Err(PoolError::ShutDown),
        }
    }

    /// Blocks until an item is available or the queue is closed and empty.
    ///
    /// Items still queued at close time are handed out before `Shutdown`.
    pub fn dequeue_or_wait(&self) -> Dequeue<T> {
        match self.receiver.recv() {
            Ok(item) => Dequeue::Task(item),
            Err(_) => Dequeue::Shutdown,
        }
    }

    /// Sets the stop flag and wakes every blocked worker.
    ///
    /// Returns `true` only for the call that actually closed the queue.
    pub fn close(&self) -> bool {
        self.sender.lock().take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
