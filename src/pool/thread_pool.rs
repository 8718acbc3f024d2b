//! Bounded pool backed by rayon
//!
//! The rayon pool is built on the first scheduled task, so a pass with
//! nothing to do never starts a thread. Tasks are tracked by a pending
//! counter; `wait` blocks until it drops to zero.

use super::{FirstError, Task, WorkerPool};
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct Shared {
    /// Scheduled tasks that have not finished yet
    pending: Mutex<usize>,
    all_done: Condvar,
    first_error: FirstError,
}

impl Shared {
    fn finish(&self, result: Result<()>) {
        if let Err(error) = result {
            self.first_error.set(error);
        }
        let mut pending = self.pending.lock();
        *pending -= 1;
        if *pending == 0 {
            self.all_done.notify_all();
        }
    }
}

/// Fixed-capacity thread pool
pub struct ThreadPool {
    name: String,
    max_threads: usize,
    pool: Mutex<Option<rayon::ThreadPool>>,
    shared: Arc<Shared>,
}

impl ThreadPool {
    /// Create a pool running at most `max_threads` tasks at once
    pub fn new(name: impl Into<String>, max_threads: usize) -> Self {
        Self {
            name: name.into(),
            max_threads: max_threads.max(1),
            pool: Mutex::new(None),
            shared: Arc::new(Shared::default()),
        }
    }

    /// Threads started so far
    pub fn thread_count(&self) -> usize {
        self.pool
            .lock()
            .as_ref()
            .map_or(0, rayon::ThreadPool::current_num_threads)
    }

    fn build(&self) -> Result<rayon::ThreadPool> {
        let name = self.name.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_threads)
            .thread_name(move |i| format!("{}-{}", name, i))
            .build()?;
        debug!(pool = %self.name, threads = self.max_threads, "worker pool started");
        Ok(pool)
    }
}

impl WorkerPool for ThreadPool {
    fn schedule(&self, task: Task) -> Result<()> {
        if self.shared.first_error.is_set() {
            return Err(Error::WorkerPoolFailed);
        }

        let mut guard = self.pool.lock();
        if guard.is_none() {
            *guard = Some(self.build()?);
        }
        let pool = guard
            .as_ref()
            .ok_or_else(|| Error::Internal(format!("worker pool {} is not running", self.name)))?;

        *self.shared.pending.lock() += 1;
        let shared = self.shared.clone();
        pool.spawn(move || {
            let result = match panic::catch_unwind(AssertUnwindSafe(task)) {
                Ok(result) => result,
                Err(payload) => Err(Error::WorkerPanicked(panic_message(payload.as_ref()))),
            };
            shared.finish(result);
        });
        Ok(())
    }

    fn wait(&self) -> Result<()> {
        let mut pending = self.shared.pending.lock();
        while *pending > 0 {
            self.shared.all_done.wait(&mut pending);
        }
        drop(pending);
        self.shared.first_error.into_result()
    }

    fn max_threads(&self) -> usize {
        self.max_threads
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_runs_all_tasks() {
        let pool = ThreadPool::new("test", 4);
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let done = done.clone();
            pool.schedule(Box::new(move || {
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();
        }

        pool.wait().unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 100);
        assert_eq!(pool.thread_count(), 4);
    }

    #[test]
    fn test_no_threads_without_tasks() {
        let pool = ThreadPool::new("idle", 8);
        pool.wait().unwrap();
        assert_eq!(pool.thread_count(), 0);
    }

    #[test]
    fn test_concurrency_is_bounded() {
        let pool = ThreadPool::new("bounded", 2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..16 {
            let running = running.clone();
            let peak = peak.clone();
            pool.schedule(Box::new(move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(2));
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();
        }

        pool.wait().unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_wait_drains_before_reporting_error() {
        let pool = ThreadPool::new("failing", 3);
        let done = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(AtomicBool::new(false));

        for i in 0..10 {
            let done = done.clone();
            let gate = gate.clone();
            pool.schedule(Box::new(move || {
                while !gate.load(Ordering::SeqCst) {
                    thread::yield_now();
                }
                done.fetch_add(1, Ordering::SeqCst);
                if i == 0 {
                    return Err(Error::Internal("first".to_string()));
                }
                Ok(())
            }))
            .unwrap();
        }
        gate.store(true, Ordering::SeqCst);
        assert!(matches!(pool.wait(), Err(Error::Internal(_))));
        assert_eq!(done.load(Ordering::SeqCst), 10);

        // Refusal only lasts until the error has been collected
        pool.schedule(Box::new(|| Ok(()))).unwrap();
        pool.wait().unwrap();
    }

    #[test]
    fn test_refuses_while_error_is_held() {
        let pool = ThreadPool::new("refusing", 1);
        pool.schedule(Box::new(|| Err(Error::Internal("boom".to_string()))))
            .unwrap();
        while !pool.shared.first_error.is_set() {
            thread::sleep(Duration::from_millis(1));
        }

        assert!(matches!(
            pool.schedule(Box::new(|| Ok(()))),
            Err(Error::WorkerPoolFailed)
        ));
        pool.wait().unwrap_err();
    }

    #[test]
    fn test_panic_becomes_error() {
        let pool = ThreadPool::new("panicky", 1);
        pool.schedule(Box::new(|| panic!("kaboom"))).unwrap();

        match pool.wait() {
            Err(Error::WorkerPanicked(message)) => assert_eq!(message, "kaboom"),
            other => panic!("unexpected {:?}", other),
        }

        // The worker survives the panic
        pool.schedule(Box::new(|| Ok(()))).unwrap();
        pool.wait().unwrap();
    }
}
