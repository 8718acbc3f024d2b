//! Worker pools for table attach and startup
//!
//! The loader and the startup coordinator only see the [`WorkerPool`] trait.
//! [`ThreadPool`] runs tasks on a bounded set of OS threads, [`InlinePool`]
//! runs them on the caller's thread in scheduling order.

mod thread_pool;

pub use thread_pool::ThreadPool;

use crate::error::{Error, Result};
use parking_lot::Mutex;
use tracing::debug;

/// A unit of work
pub type Task = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// Bounded task executor
pub trait WorkerPool: Send + Sync {
    /// Queue a task. Refused with [`Error::WorkerPoolFailed`] once a task
    /// has failed and the failure has not been collected by [`wait`].
    ///
    /// [`wait`]: WorkerPool::wait
    fn schedule(&self, task: Task) -> Result<()>;

    /// Block until every scheduled task has finished, then return and clear
    /// the first task error.
    fn wait(&self) -> Result<()>;

    /// Upper bound on concurrently running tasks
    fn max_threads(&self) -> usize;
}

/// Single-assignment error cell: the first error is kept, later ones are
/// logged and dropped.
#[derive(Debug, Default)]
pub struct FirstError {
    slot: Mutex<Option<Error>>,
}

impl FirstError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `error` unless one is already held. Returns whether it was kept.
    pub fn set(&self, error: Error) -> bool {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            debug!(error = %error, "dropping error after the first one");
            return false;
        }
        *slot = Some(error);
        true
    }

    pub fn is_set(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub fn take(&self) -> Option<Error> {
        self.slot.lock().take()
    }

    /// `Err` with the held error, if any, clearing the cell
    pub fn into_result(&self) -> Result<()> {
        match self.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Runs every task on the caller's thread as soon as it is scheduled
#[derive(Debug, Default)]
pub struct InlinePool {
    error: FirstError,
}

impl InlinePool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkerPool for InlinePool {
    fn schedule(&self, task: Task) -> Result<()> {
        if self.error.is_set() {
            return Err(Error::WorkerPoolFailed);
        }
        if let Err(error) = task() {
            self.error.set(error);
        }
        Ok(())
    }

    fn wait(&self) -> Result<()> {
        self.error.into_result()
    }

    fn max_threads(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_first_error_wins() {
        let cell = FirstError::new();
        assert!(cell.set(Error::TableNotFound("a".to_string())));
        assert!(!cell.set(Error::TableNotFound("b".to_string())));

        match cell.take() {
            Some(Error::TableNotFound(name)) => assert_eq!(name, "a"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(!cell.is_set());
    }

    #[test]
    fn test_inline_pool_refuses_after_failure() {
        let pool = InlinePool::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let counter = ran.clone();
        pool.schedule(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .unwrap();
        pool.schedule(Box::new(|| Err(Error::Internal("boom".to_string()))))
            .unwrap();

        let counter = ran.clone();
        let refused = pool.schedule(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        assert!(matches!(refused, Err(Error::WorkerPoolFailed)));
        assert_eq!(ran.load(Ordering::SeqCst), 1);

        assert!(matches!(pool.wait(), Err(Error::Internal(_))));
        // The error was collected, so the pool accepts work again
        assert!(pool.wait().is_ok());
        assert!(pool.schedule(Box::new(|| Ok(()))).is_ok());
    }
}
