use std::fmt;

use tracing::debug;

use crate::config::{ReplayPolicy, DEFAULT_CAPACITY};
use crate::error::ArenaError;
use crate::printf_arg::{Arg, Payload};
use crate::record_arena::{DropRecords, RecordArena, Teardown};
use crate::replay::{replay_records, ReplaySummary};

/// Deferred printf front end: records calls now, formats them on replay.
///
/// A `DeferredPrintf` owns one [`RecordArena`] and the [`ReplayPolicy`] used
/// when replaying it. Recording never formats anything; replay hands every
/// stored format and argument list to a caller-supplied `vprintf`-shaped
/// callback in insertion order.
///
/// # Thread Safety
///
/// Like the arena, this type is meant for one producer. Use one instance per
/// thread, or [`SharedDeferredPrintf`](crate::SharedDeferredPrintf) when several threads must feed the
/// same arena.
///
/// # Examples
///
/// ```
/// use deferred_printf::{defer_printf, printf, DeferredPrintf};
///
/// let mut logger = DeferredPrintf::<1024>::new();
/// defer_printf!(logger, "Hello %d %d", 1, 2).unwrap();
/// defer_printf!(logger, "Test %s", "string").unwrap();
///
/// let mut lines = Vec::new();
/// logger.replay_all(|format, args| {
///     let line = printf::format(format, args).unwrap_or_default();
///     let len = line.len() as i32;
///     lines.push(line);
///     len
/// });
/// assert_eq!(lines, ["Hello 1 2", "Test string"]);
/// ```
pub struct DeferredPrintf<'a, const CAP: usize = DEFAULT_CAPACITY, T: Teardown = DropRecords> {
    arena: RecordArena<'a, CAP, T>,
    policy: ReplayPolicy,
}

impl<'a, const CAP: usize, T: Teardown> DeferredPrintf<'a, CAP, T> {
    pub fn new() -> Self {
        Self {
            arena: RecordArena::new(),
            policy: ReplayPolicy::default(),
        }
    }

    /// Replaces the replay policy.
    pub fn with_policy(mut self, policy: ReplayPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ReplayPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ReplayPolicy) {
        self.policy = policy;
    }

    /// Records one call. See [`RecordArena::record`].
    #[inline]
    pub fn record<P>(&mut self, format: &'a str, payload: P) -> Result<(), ArenaError>
    where
        P: Payload + 'a,
    {
        self.arena.record(format, payload)
    }

    /// Replays every stored record through `vprintf`.
    ///
    /// Records stay in the arena, so the same calls can be replayed again.
    pub fn replay_all<F>(&self, vprintf: F) -> ReplaySummary
    where
        F: FnMut(&str, &[Arg<'_>]) -> i32,
    {
        replay_records(&self.arena, self.policy, vprintf)
    }

    /// Replays every stored record through a destination-taking callback,
    /// passing `dest` ahead of each format and argument list.
    ///
    /// # Examples
    ///
    /// ```
    /// use deferred_printf::{printf, DeferredPrintf};
    ///
    /// let mut logger = DeferredPrintf::<512>::new();
    /// logger.record("%s:%d\n", ("alpha", 1)).unwrap();
    /// logger.record("%s:%d\n", ("beta", 2)).unwrap();
    ///
    /// let mut out: Vec<u8> = Vec::new();
    /// let summary = logger.replay_all_to(&mut out, printf::vfprintf);
    /// assert_eq!(out, b"alpha:1\nbeta:2\n");
    /// assert_eq!(summary.chars, 15);
    /// ```
    pub fn replay_all_to<D, F>(&self, dest: &mut D, mut vprintf: F) -> ReplaySummary
    where
        D: ?Sized,
        F: FnMut(&mut D, &str, &[Arg<'_>]) -> i32,
    {
        self.replay_all(|format, args| vprintf(dest, format, args))
    }

    /// Replays every record, then destroys them and rewinds the arena.
    pub fn flush<F>(&mut self, vprintf: F) -> ReplaySummary
    where
        F: FnMut(&str, &[Arg<'_>]) -> i32,
    {
        let summary = self.replay_all(vprintf);
        debug!(
            records = summary.records,
            chars = summary.chars,
            failures = summary.failures.len(),
            bytes = self.arena.bytes_used(),
            "deferred printf flushed"
        );
        self.arena.clear();
        summary
    }

    /// Drops every record without replaying it.
    pub fn clear(&mut self) {
        debug!(records = self.arena.len(), "deferred printf cleared");
        self.arena.clear();
    }

    pub fn arena(&self) -> &RecordArena<'a, CAP, T> {
        &self.arena
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

impl<const CAP: usize, T: Teardown> Default for DeferredPrintf<'_, CAP, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize, T: Teardown> fmt::Debug for DeferredPrintf<'_, CAP, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredPrintf")
            .field("arena", &self.arena)
            .field("policy", &self.policy)
            .finish()
    }
}

/// Records a printf-style call into a [`DeferredPrintf`] or [`RecordArena`].
///
/// Expands to `logger.record(format, (args...,))`, so every argument is
/// captured by value and the result is the `Result` of `record`.
///
/// # Examples
///
/// ```
/// use deferred_printf::{defer_printf, RecordArena};
///
/// let mut arena = RecordArena::<256>::new();
/// defer_printf!(arena, "no arguments").unwrap();
/// defer_printf!(arena, "%d apples, %.1f kg", 3, 1.25).unwrap();
/// assert_eq!(arena.len(), 2);
/// ```
#[macro_export]
macro_rules! defer_printf {
    ($logger:expr, $fmt:expr $(,)?) => {
        $logger.record($fmt, ())
    };
    ($logger:expr, $fmt:expr, $($arg:expr),+ $(,)?) => {
        $logger.record($fmt, ($($arg,)+))
    };
}
