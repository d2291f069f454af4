//! Error types shared by the arena, the replay driver and the formatter.

use thiserror::Error;

/// Failure to store a record in a [`RecordArena`](crate::RecordArena).
///
/// The arena is left exactly as it was before the failed call, so records
/// already stored remain replayable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArenaError {
    #[error("record of {requested} bytes does not fit: {available} of {capacity} bytes left")]
    CapacityExceeded {
        requested: usize,
        available: usize,
        capacity: usize,
    },
}

/// Failure reported by the bundled printf formatter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("conversion #{index} has no matching argument")]
    MissingArgument { index: usize },

    #[error("conversion #{index} ('%{conversion}') cannot format {found}")]
    TypeMismatch {
        index: usize,
        conversion: char,
        found: &'static str,
    },

    #[error("unknown conversion '%{0}'")]
    UnknownConversion(char),

    #[error("format string ends inside a conversion specification")]
    Incomplete,

    #[error("output sink rejected formatted text")]
    Sink,
}

impl From<std::fmt::Error> for FormatError {
    fn from(_: std::fmt::Error) -> Self {
        FormatError::Sink
    }
}

/// A replay pass in which at least one callback invocation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("{failed} of {records} replayed records failed (first at #{first_index}, code {first_code})")]
    Failed {
        records: usize,
        failed: usize,
        first_index: usize,
        first_code: i32,
    },
}
