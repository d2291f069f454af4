use parking_lot::Mutex;

use crate::config::{ReplayPolicy, DEFAULT_CAPACITY};
use crate::deferred_printf::DeferredPrintf;
use crate::error::ArenaError;
use crate::printf_arg::{Arg, Payload};
use crate::record_arena::{DropRecords, Teardown};
use crate::replay::ReplaySummary;

/// A [`DeferredPrintf`] that several threads can record into.
///
/// Every `record` and every replay pass holds one lock for its whole
/// duration, so records from different threads never interleave inside the
/// arena and a replay never observes a half-written record. Prefer one
/// `DeferredPrintf` per thread when the producers do not need a shared order.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use deferred_printf::SharedDeferredPrintf;
///
/// let shared = Arc::new(SharedDeferredPrintf::<'static, 4096>::new());
/// let workers: Vec<_> = (0..4)
///     .map(|id| {
///         let shared = Arc::clone(&shared);
///         thread::spawn(move || shared.record("worker %d\n", (id,)).unwrap())
///     })
///     .collect();
/// for worker in workers {
///     worker.join().unwrap();
/// }
/// assert_eq!(shared.len(), 4);
/// ```
pub struct SharedDeferredPrintf<'a, const CAP: usize = DEFAULT_CAPACITY, T: Teardown = DropRecords> {
    inner: Mutex<DeferredPrintf<'a, CAP, T>>,
}

impl<'a, const CAP: usize, T: Teardown> SharedDeferredPrintf<'a, CAP, T> {
    pub fn new() -> Self {
        Self::from_inner(DeferredPrintf::new())
    }

    pub fn from_inner(inner: DeferredPrintf<'a, CAP, T>) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    pub fn with_policy(policy: ReplayPolicy) -> Self {
        Self::from_inner(DeferredPrintf::new().with_policy(policy))
    }

    pub fn record<P>(&self, format: &'a str, payload: P) -> Result<(), ArenaError>
    where
        P: Payload + 'a,
    {
        self.inner.lock().record(format, payload)
    }

    pub fn replay_all<F>(&self, vprintf: F) -> ReplaySummary
    where
        F: FnMut(&str, &[Arg<'_>]) -> i32,
    {
        self.inner.lock().replay_all(vprintf)
    }

    pub fn replay_all_to<D, F>(&self, dest: &mut D, vprintf: F) -> ReplaySummary
    where
        D: ?Sized,
        F: FnMut(&mut D, &str, &[Arg<'_>]) -> i32,
    {
        self.inner.lock().replay_all_to(dest, vprintf)
    }

    pub fn flush<F>(&self, vprintf: F) -> ReplaySummary
    where
        F: FnMut(&str, &[Arg<'_>]) -> i32,
    {
        self.inner.lock().flush(vprintf)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn into_inner(self) -> DeferredPrintf<'a, CAP, T> {
        self.inner.into_inner()
    }
}

impl<const CAP: usize, T: Teardown> Default for SharedDeferredPrintf<'_, CAP, T> {
    fn default() -> Self {
        Self::new()
    }
}
