use anyhow::{Result, anyhow};
use crossbeam_channel::{Sender, bounded};
use std::num::NonZero;
use std::thread;

pub struct WorkPool<T: Send> {
    tx: Sender<T>,
}

impl<T: Send> WorkPool<T> {
    /// Queue a job, blocking while the queue is full.
    pub fn send(&self, value: T) -> Result<()> {
        self.tx
            .send(value)
            .map_err(|_| anyhow!("all pool workers have exited"))
    }
}

/// The number of workers to use when none is requested: one per core.
pub fn default_threads() -> NonZero<usize> {
    thread::available_parallelism().unwrap_or(NonZero::<usize>::MIN)
}

/// Run `body_fn` with a pool of `thread_count` scoped workers, each calling
/// `work_fn` on jobs as they arrive. Returns once `body_fn` has returned and
/// every queued job is finished.
pub fn run_pool<'scope, T, W, B, R>(
    thread_count: NonZero<usize>,
    chan_size: usize,
    work_fn: W,
    body_fn: B,
) -> R
where
    T: Send + 'scope,
    W: Fn(T) + Send + Clone + 'scope,
    B: FnOnce(WorkPool<T>) -> R,
{
    thread::scope(|s| {
        let (tx, rx) = bounded(chan_size);

        for _ in 0..thread_count.get() {
            let thread_rx = rx.clone();
            let thread_work = work_fn.clone();
            s.spawn(move || {
                while let Ok(val) = thread_rx.recv() {
                    thread_work(val);
                }
            });
        }
        drop(rx);

        body_fn(WorkPool { tx })
    })
}
