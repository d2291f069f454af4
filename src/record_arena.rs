#![allow(clippy::let_unit_value)]

use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use tracing::{trace, warn};

use crate::config::DEFAULT_CAPACITY;
use crate::deferred_record::{Deferred, RecordRef, RECORD_ALIGN};
use crate::error::ArenaError;
use crate::printf_arg::Payload;

/// Fixed-capacity arena of deferred records.
///
/// Records are constructed in place, back to back, in a single heap block of
/// `CAP` bytes that is allocated once and never reallocated. The arena keeps
/// no index: it walks itself by asking each record its size.
///
/// # Thread Safety
///
/// `record` takes `&mut self` and iteration borrows `&self`, so one owner can
/// never append while a replay is in flight. For several producers, use one
/// arena per thread or wrap the arena in a lock (see
/// [`SharedDeferredPrintf`](crate::SharedDeferredPrintf)).
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the captured format strings and borrowed arguments
/// * `CAP` - Capacity of the arena in bytes
/// * `T` - Teardown policy, [`DropRecords`] or [`TrivialRecords`]
///
/// # Examples
///
/// ```
/// use deferred_printf::RecordArena;
///
/// let mut arena = RecordArena::<256>::new();
/// arena.record("Hello %d %d", (1, 2)).unwrap();
/// arena.record("Test %s", ("string",)).unwrap();
///
/// let formats: Vec<&str> = arena.iter().map(|r| r.format()).collect();
/// assert_eq!(formats, ["Hello %d %d", "Test %s"]);
/// ```
pub struct RecordArena<'a, const CAP: usize = DEFAULT_CAPACITY, T: Teardown = DropRecords> {
    buffer: NonNull<u8>,
    write_pos: usize,
    count: usize,
    _records: PhantomData<(&'a str, T)>,
}

// Every stored payload is `Send + Sync` (see `PrintfArg`), records are never
// mutated after construction, and the buffer is owned exclusively.
unsafe impl<const CAP: usize, T: Teardown> Send for RecordArena<'_, CAP, T> {}
unsafe impl<const CAP: usize, T: Teardown> Sync for RecordArena<'_, CAP, T> {}

impl<'a, const CAP: usize, T: Teardown> RecordArena<'a, CAP, T> {
    const LAYOUT: Layout = match Layout::from_size_align(CAP, RECORD_ALIGN) {
        Ok(layout) if CAP > 0 => layout,
        _ => panic!("arena capacity must be non-zero and fit the address space"),
    };

    /// Allocates the arena's storage. Nothing is constructed until `record`.
    pub fn new() -> Self {
        let layout = Self::LAYOUT;
        let buffer = unsafe { alloc::alloc(layout) };
        let Some(buffer) = NonNull::new(buffer) else {
            alloc::handle_alloc_error(layout)
        };
        Self {
            buffer,
            write_pos: 0,
            count: 0,
            _records: PhantomData,
        }
    }

    /// Captures `format` by reference and `payload` by value as a new record
    /// at the tail of the arena.
    ///
    /// # Errors
    ///
    /// [`ArenaError::CapacityExceeded`] when the record does not fit in the
    /// remaining bytes. Nothing is written in that case.
    pub fn record<P>(&mut self, format: &'a str, payload: P) -> Result<(), ArenaError>
    where
        P: Payload + 'a,
    {
        T::admit::<P>();

        let size = Deferred::<'a, P>::slot_size();
        if size > self.remaining() {
            warn!(
                format,
                requested = size,
                available = self.remaining(),
                capacity = CAP,
                "deferred record rejected, arena full"
            );
            return Err(ArenaError::CapacityExceeded {
                requested: size,
                available: self.remaining(),
                capacity: CAP,
            });
        }

        let slot = Deferred::new(format, payload).into_slot();
        unsafe {
            // `write_pos` is a multiple of RECORD_ALIGN and the slot fits, so
            // the write is aligned and in bounds.
            ptr::write(self.buffer.as_ptr().add(self.write_pos).cast(), slot);
        }
        self.write_pos += size;
        self.count += 1;

        trace!(format, size, offset = self.write_pos, "deferred record stored");
        Ok(())
    }

    /// Cursor at the first record.
    pub fn begin(&self) -> Cursor<'_, 'a> {
        Cursor::new(self.buffer, 0, self.write_pos)
    }

    /// Cursor one past the last record.
    pub fn end(&self) -> Cursor<'_, 'a> {
        Cursor::new(self.buffer, self.write_pos, self.write_pos)
    }

    /// Iterates the records in insertion order. Each call starts a fresh pass.
    pub fn iter(&self) -> Records<'_, 'a> {
        Records {
            cursor: self.begin(),
            end: self.end(),
            remaining: self.count,
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn bytes_used(&self) -> usize {
        self.write_pos
    }

    pub const fn capacity(&self) -> usize {
        CAP
    }

    pub fn remaining(&self) -> usize {
        CAP - self.write_pos
    }

    /// Destroys every record and rewinds the arena. Storage is kept.
    ///
    /// The arena is rewound before any record is dropped, so a panicking
    /// destructor leaks the records after it instead of exposing dropped ones.
    pub fn clear(&mut self) {
        self.destroy_records();
    }

    fn destroy_records(&mut self) {
        let end = mem::replace(&mut self.write_pos, 0);
        self.count = 0;
        if !T::DROPS_RECORDS {
            return;
        }
        let mut cursor = Cursor::new(self.buffer, 0, end);
        while let Some(record) = cursor.record() {
            // Read the size before the record is gone.
            let size = record.byte_size();
            unsafe { record.drop_in_place() };
            cursor.offset += size;
        }
    }
}

impl<const CAP: usize, T: Teardown> Default for RecordArena<'_, CAP, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize, T: Teardown> Drop for RecordArena<'_, CAP, T> {
    fn drop(&mut self) {
        let _storage = Storage {
            buffer: self.buffer,
            layout: Self::LAYOUT,
        };
        self.destroy_records();
    }
}

/// Frees the arena block even if a record's destructor unwinds.
struct Storage {
    buffer: NonNull<u8>,
    layout: Layout,
}

impl Drop for Storage {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.buffer.as_ptr(), self.layout) };
    }
}

impl<const CAP: usize, T: Teardown> fmt::Debug for RecordArena<'_, CAP, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordArena")
            .field("capacity", &CAP)
            .field("bytes_used", &self.write_pos)
            .field("records", &self.count)
            .finish()
    }
}

impl<'r, 'a, const CAP: usize, T: Teardown> IntoIterator for &'r RecordArena<'a, CAP, T> {
    type Item = RecordRef<'r, 'a>;
    type IntoIter = Records<'r, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Position within one arena's storage.
///
/// Cursors compare by offset only; comparing cursors of different arenas is
/// meaningless. A cursor at the end yields no record and does not advance.
#[derive(Clone, Copy)]
pub struct Cursor<'r, 'a> {
    base: NonNull<u8>,
    offset: usize,
    end: usize,
    _arena: PhantomData<&'r RecordArena<'a>>,
}

impl<'r, 'a> Cursor<'r, 'a> {
    fn new(base: NonNull<u8>, offset: usize, end: usize) -> Self {
        Self {
            base,
            offset,
            end,
            _arena: PhantomData,
        }
    }

    /// The record at this position, `None` at the end.
    pub fn record(&self) -> Option<RecordRef<'r, 'a>> {
        if self.offset >= self.end {
            return None;
        }
        // Every offset below `end` reached by advancing from zero is the
        // start of an initialized slot.
        unsafe {
            let slot = NonNull::new_unchecked(self.base.as_ptr().add(self.offset));
            Some(RecordRef::from_slot(slot))
        }
    }

    /// Moves past the current record by its own `byte_size()`.
    pub fn advance(&mut self) {
        if let Some(record) = self.record() {
            self.offset += record.byte_size();
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_end(&self) -> bool {
        self.offset >= self.end
    }
}

impl PartialEq for Cursor<'_, '_> {
    fn eq(&self, other: &Self) -> bool {
        debug_assert_eq!(self.base, other.base, "cursors from different arenas");
        self.offset == other.offset
    }
}

impl Eq for Cursor<'_, '_> {}

impl fmt::Debug for Cursor<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("offset", &self.offset)
            .field("end", &self.end)
            .finish()
    }
}

/// Forward iterator over an arena's records, from `begin()` to `end()`.
#[derive(Clone)]
pub struct Records<'r, 'a> {
    cursor: Cursor<'r, 'a>,
    end: Cursor<'r, 'a>,
    remaining: usize,
}

impl<'r, 'a> Iterator for Records<'r, 'a> {
    type Item = RecordRef<'r, 'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == self.end {
            return None;
        }
        let record = self.cursor.record()?;
        self.cursor.advance();
        self.remaining -= 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Records<'_, '_> {}

impl std::iter::FusedIterator for Records<'_, '_> {}

/// What happens to stored records when the arena is cleared or dropped.
pub trait Teardown {
    /// Whether records are dropped one by one.
    const DROPS_RECORDS: bool;

    /// Called with every payload type before it is stored.
    fn admit<P>();
}

/// Drops every record in insertion order. Accepts any payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct DropRecords;

impl Teardown for DropRecords {
    const DROPS_RECORDS: bool = true;

    #[inline(always)]
    fn admit<P>() {}
}

/// Frees the arena as raw bytes without visiting records.
///
/// Only payloads that need no drop glue are accepted; recording anything
/// else (a `String`, say) fails a const assertion. That assertion is
/// evaluated at monomorphization, so it shows up in `cargo build` and
/// `cargo test` but not in `cargo check`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrivialRecords;

struct AssertTrivial<P>(PhantomData<P>);

impl<P> AssertTrivial<P> {
    const OK: () = assert!(
        !mem::needs_drop::<P>(),
        "TrivialRecords arenas only accept payloads without drop glue"
    );
}

impl Teardown for TrivialRecords {
    const DROPS_RECORDS: bool = false;

    #[inline(always)]
    fn admit<P>() {
        let () = AssertTrivial::<P>::OK;
    }
}
