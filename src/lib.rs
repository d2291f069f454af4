//! # Deferred Printf
//!
//! Deferred printf-style logging: a call site captures its format string and
//! argument values into a fixed-capacity arena, and the formatting work runs
//! later, in an explicit replay pass.
//!
//! * **Cheap call sites**: recording copies a few scalars into a
//!   pre-allocated buffer; nothing is formatted and nothing is allocated
//! * **Bounded memory**: the arena never grows, and a full arena is reported,
//!   never silently truncated
//! * **Caller-owned output**: replay hands each record to a `vprintf`-shaped
//!   callback, so text can go anywhere
//!
//! ## Main Components
//!
//! * `RecordArena`: fixed-capacity byte arena of type-erased records, walked
//!   by asking each record its own size
//! * `DeferredRecord`: the uniform `replay`/`byte_size` interface every stored
//!   record exposes, whatever its argument types; `RecordRef` is the
//!   type-erased handle the arena hands out
//! * `DeferredPrintf`: the front end that records calls and replays them with
//!   a configurable failure policy
//! * `SharedDeferredPrintf`: a locked variant for several producer threads
//! * `printf`: a C-style formatter usable as the replay callback
//!
//! ## Quick Start
//!
//! ```
//! use deferred_printf::{defer_printf, printf, DeferredPrintf};
//!
//! let mut logger = DeferredPrintf::<4096>::new();
//!
//! // Hot path: capture only.
//! for i in 0..3 {
//!     defer_printf!(logger, "Log entry %d\n", i).unwrap();
//! }
//!
//! // Later: format everything at once.
//! let mut text = String::new();
//! let summary = logger.flush(|format, args| printf::vsprintf(&mut text, format, args));
//! assert_eq!(text, "Log entry 0\nLog entry 1\nLog entry 2\n");
//! assert_eq!(summary.records, 3);
//! ```

pub mod config;
pub mod deferred_printf;
pub mod deferred_record;
pub mod error;
pub mod printf;
pub mod printf_arg;
pub mod record_arena;
pub mod replay;
pub mod shared;

pub use config::{OnFailure, ReplayPolicy, DEFAULT_CAPACITY};
pub use deferred_printf::DeferredPrintf;
pub use deferred_record::{Deferred, DeferredRecord, RecordRef, RECORD_ALIGN};
pub use error::{ArenaError, FormatError, ReplayError};
pub use printf_arg::{Arg, Payload, PrintfArg, Ptr};
pub use record_arena::{Cursor, DropRecords, RecordArena, Records, Teardown, TrivialRecords};
pub use replay::{bind, replay_records, ReplayFailure, ReplaySummary};
pub use shared::SharedDeferredPrintf;
