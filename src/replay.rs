//! The replay-all driving loop and its result aggregation.

use tracing::{trace, warn};

use crate::config::{OnFailure, ReplayPolicy};
use crate::deferred_record::DeferredRecord;
use crate::error::ReplayError;
use crate::printf_arg::Arg;

/// One record whose replay callback returned a negative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayFailure {
    /// Position of the record in insertion order.
    pub index: usize,
    /// The negative value the callback returned.
    pub code: i32,
}

/// Outcome of a replay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Records whose callback was invoked.
    pub records: usize,
    /// Sum of all non-negative callback results.
    pub chars: usize,
    /// Every failed invocation, in replay order.
    pub failures: Vec<ReplayFailure>,
    /// Set when [`OnFailure::Stop`] cut the pass short.
    pub stopped_early: bool,
}

impl ReplaySummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total characters produced, or an error describing the failures.
    pub fn into_result(self) -> Result<usize, ReplayError> {
        match self.failures.first() {
            None => Ok(self.chars),
            Some(first) => Err(ReplayError::Failed {
                records: self.records,
                failed: self.failures.len(),
                first_index: first.index,
                first_code: first.code,
            }),
        }
    }
}

/// Replays every record in order through `vprintf`.
///
/// Non-negative results are summed; negative ones are recorded with the
/// record's index. Whether a failure ends the pass is up to `policy`.
pub fn replay_records<I, F>(records: I, policy: ReplayPolicy, mut vprintf: F) -> ReplaySummary
where
    I: IntoIterator,
    I::Item: DeferredRecord,
    F: FnMut(&str, &[Arg<'_>]) -> i32,
{
    let mut summary = ReplaySummary::default();
    for (index, record) in records.into_iter().enumerate() {
        let code = record.replay(&mut vprintf);
        summary.records += 1;
        if code >= 0 {
            summary.chars += code as usize;
            trace!(index, chars = code, "deferred record replayed");
            continue;
        }

        warn!(index, code, format = record.format(), "deferred record failed to replay");
        summary.failures.push(ReplayFailure { index, code });
        if policy.on_failure == OnFailure::Stop {
            summary.stopped_early = true;
            break;
        }
    }
    summary
}

/// Binds a destination ahead of the `(format, args)` pair.
///
/// The result is a two-argument callback that forwards every call to
/// `vprintf` with `dest` as its first parameter, which adapts functions
/// shaped like `vfprintf(dest, format, args)`.
///
/// # Examples
///
/// ```
/// use deferred_printf::{bind, printf, RecordArena, replay_records, ReplayPolicy};
///
/// let mut arena = RecordArena::<256>::new();
/// arena.record("%s=%d\n", ("x", 1)).unwrap();
///
/// let mut out = String::new();
/// let summary = replay_records(&arena, ReplayPolicy::default(), bind(&mut out, |dest, f, a| {
///     printf::vsprintf(dest, f, a)
/// }));
/// assert_eq!(out, "x=1\n");
/// assert_eq!(summary.chars, 4);
/// ```
pub fn bind<D, F>(mut dest: D, mut vprintf: F) -> impl FnMut(&str, &[Arg<'_>]) -> i32
where
    F: FnMut(&mut D, &str, &[Arg<'_>]) -> i32,
{
    move |format, args| vprintf(&mut dest, format, args)
}
