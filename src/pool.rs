use super::{
    errors::{PoolError, TaskError},
    result::TaskResult,
    handle::{
        Task,
        JoinHandle,
    },
    model::{
        PoolMetrics,
        PoolState,
    },
    queue::{Dequeue, TaskQueue},
};
use std::{
    convert::Infallible,
    fmt::Display,
    io,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, ThreadId},
};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn, Dispatch};


/// Thread pool configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: usize,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            thread_name_prefix: "pool-worker".to_string(),
            stack_size: None,
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        Self::default()
    }

    /// Twice as many threads as CPUs, for tasks that mostly block.
    pub fn io_bound() -> Self {
        Self {
            num_threads: num_cpus::get() * 2,
            ..Self::default()
        }
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}


/// State shared between the pool owner and its workers.
struct Shared {
    queue: TaskQueue<Task>,
    live_workers: AtomicUsize,
    active_tasks: AtomicUsize,
    idle_workers: AtomicUsize,
    total_posted: AtomicUsize,
    completed_tasks: AtomicUsize,
    failed_tasks: AtomicUsize,
}

impl Shared {
    fn new() -> Self {
        Self {
            queue: TaskQueue::new(),
            live_workers: AtomicUsize::new(0),
            active_tasks: AtomicUsize::new(0),
            idle_workers: AtomicUsize::new(0),
            total_posted: AtomicUsize::new(0),
            completed_tasks: AtomicUsize::new(0),
            failed_tasks: AtomicUsize::new(0),
        }
    }
}

struct WorkerHandle {
    id: usize,
    thread: thread::JoinHandle<()>,
}


/// Fixed-size pool of OS threads consuming a shared FIFO queue.
///
/// Dropping the pool shuts it down: queued tasks are drained and every
/// worker is joined before `drop` returns.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<WorkerHandle>>,
    worker_ids: Vec<ThreadId>,
    config: Config,
}

impl ThreadPool {
    pub fn new(num_threads: usize) -> Result<Self, PoolError> {
        Self::with_config(Config::default().with_threads(num_threads))
    }

    /// Spawns `config.num_threads` workers.
    ///
    /// Workers log through the `tracing` dispatcher that is current on the
    /// calling thread. If any spawn fails, the workers started so far are
    /// shut down and joined before the error is returned.
    pub fn with_config(config: Config) -> Result<Self, PoolError> {
        if config.num_threads == 0 {
            return Err(PoolError::ZeroThreads);
        }

        let shared = Arc::new(Shared::new());
        let dispatch = tracing::dispatcher::get_default(|d| d.clone());
        let mut workers = Vec::with_capacity(config.num_threads);

        for id in 0..config.num_threads {
            shared.live_workers.fetch_add(1, Ordering::AcqRel);
            match spawn_worker(id, &config, shared.clone(), dispatch.clone()) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    shared.live_workers.fetch_sub(1, Ordering::AcqRel);
                    error!(worker = id, error = %e, "failed to spawn worker thread");
                    shared.queue.close();
                    for worker in workers {
                        let _ = worker.thread.join();
                    }
                    return Err(PoolError::Spawn(e));
                }
            }
        }

        info!(threads = config.num_threads, "thread pool started");

        let worker_ids = workers.iter().map(|w| w.thread.thread().id()).collect();

        Ok(Self {
            shared,
            workers: Mutex::new(workers),
            worker_ids,
            config,
        })
    }

    /// Queues `f` and returns a handle to its result without blocking.
    ///
    /// A panic inside `f` is caught and delivered as `TaskError::Panic`, and
    /// the pool logs one `error` event for it. The process-wide panic hook
    /// still runs first, so with the default hook the panic is also printed to
    /// stderr; install a quieter hook with [`std::panic::set_hook`] if that
    /// line is unwanted.
    pub fn post<T, F>(&self, f: F) -> Result<JoinHandle<T>, PoolError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.post_fallible(move || Ok::<T, Infallible>(f()))
    }

    /// Like [`ThreadPool::post`], for work that reports failure through `Err`.
    pub fn post_fallible<T, E, F>(&self, f: F) -> Result<JoinHandle<T>, PoolError>
    where
        T: Send + 'static,
        E: Display,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel::<TaskResult<T>>();

        let task: Task = Box::new(move || {
            // the error's Display impl is user code too, so it runs under the guard
            let run = AssertUnwindSafe(|| f().map_err(|err| err.to_string()));
            let result = match panic::catch_unwind(run) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(msg)) => Err(TaskError::Failed(msg)),
                Err(payload) => Err(TaskError::from_panic(&*payload)),
            };
            let report = match &result {
                Ok(_) => Ok(()),
                Err(err) => Err(err.clone()),
            };
            // the submitter may have dropped its handle
            let _ = tx.send(result);
            report
        });

        self.shared.total_posted.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.shared.queue.enqueue(task) {
            self.shared.total_posted.fetch_sub(1, Ordering::Relaxed);
            return Err(e);
        }

        Ok(JoinHandle::new(rx))
    }

    /// Stops accepting work, drains the queue and joins every worker.
    ///
    /// Safe to call repeatedly or concurrently: later callers wait for the
    /// first one to finish joining and then return. Called from one of the
    /// pool's own workers, it only sets the stop flag; the workers then exit
    /// on their own once the queue is drained.
    pub fn shutdown(&self) {
        if self.shared.queue.close() {
            info!(queued = self.shared.queue.len(), "thread pool draining");
        }

        if self.worker_ids.contains(&thread::current().id()) {
            warn!("shutdown called from a worker thread, not joining");
            return;
        }

        let mut workers = self.workers.lock();
        if workers.is_empty() {
            return;
        }

        for worker in workers.drain(..) {
            if worker.thread.join().is_err() {
                error!(worker = worker.id, "worker thread panicked");
            }
        }

        info!("thread pool stopped");
    }

    pub fn state(&self) -> PoolState {
        if !self.shared.queue.is_closed() {
            PoolState::Active
        } else if self.shared.live_workers.load(Ordering::Acquire) > 0 {
            PoolState::Draining
        } else {
            PoolState::Stopped
        }
    }

    #[inline]
    pub fn num_threads(&self) -> usize {
        self.config.num_threads
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            num_threads: self.config.num_threads,
            live_workers: self.shared.live_workers.load(Ordering::Relaxed),
            active_tasks: self.shared.active_tasks.load(Ordering::Relaxed),
            idle_workers: self.shared.idle_workers.load(Ordering::Relaxed),
            queued_tasks: self.shared.queue.len(),
            total_posted: self.shared.total_posted.load(Ordering::Relaxed),
            completed_tasks: self.shared.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.shared.failed_tasks.load(Ordering::Relaxed),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}


fn spawn_worker(
    id: usize,
    config: &Config,
    shared: Arc<Shared>,
    dispatch: Dispatch,
) -> io::Result<WorkerHandle> {
    let mut builder = thread::Builder::new()
        .name(format!("{}-{}", config.thread_name_prefix, id));

    if let Some(stack_size) = config.stack_size {
        builder = builder.stack_size(stack_size);
    }

    let thread = builder.spawn(move || {
        tracing::dispatcher::with_default(&dispatch, || worker_loop(id, &shared));
    })?;

    Ok(WorkerHandle { id, thread })
}

fn worker_loop(id: usize, shared: &Shared) {
    debug!(worker = id, "worker started");

    loop {
        shared.idle_workers.fetch_add(1, Ordering::Relaxed);
        let next = shared.queue.dequeue_or_wait();
        shared.idle_workers.fetch_sub(1, Ordering::Relaxed);

        let task = match next {
            Dequeue::Task(task) => task,
            Dequeue::Shutdown => break,
        };

        shared.active_tasks.fetch_add(1, Ordering::Relaxed);
        // a task can still unwind after its handle is settled, e.g. from the
        // Drop of a value nobody is waiting for
        let outcome = panic::catch_unwind(AssertUnwindSafe(task)).unwrap_or_else(|payload| {
            let err = TaskError::from_panic(&*payload);
            // dropping the payload may panic again
            std::mem::forget(payload);
            Err(err)
        });
        match outcome {
            Ok(()) => {
                shared.completed_tasks.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                shared.failed_tasks.fetch_add(1, Ordering::Relaxed);
                error!(worker = id, "ERROR IN WORKER THREAD: {}", err);
            }
        }
        shared.active_tasks.fetch_sub(1, Ordering::Relaxed);
    }

    shared.live_workers.fetch_sub(1, Ordering::AcqRel);
    debug!(worker = id, "worker exited");
}
