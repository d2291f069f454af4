//! Deferred records: one captured printf-style call each.
//!
//! A record is a format reference plus a payload tuple. Inside the arena,
//! records of every payload shape sit side by side and are reached through a
//! [`RecordRef`], a thin handle that dispatches through the vtable pointer
//! stored at the start of each slot.
//!
//! # Slot layout
//!
//! ```text
//! +------------------------------+ slot start (multiple of RECORD_ALIGN)
//! | vtable: &'static RecordVTable|  replay / format / drop / size / arity
//! +------------------------------+
//! | format: &str                 |
//! | payload: (A, B, ...)         |
//! +------------------------------+ slot start + byte_size()
//! ```
//!
//! Every slot is aligned to [`RECORD_ALIGN`] and its footprint is rounded up
//! to a multiple of it, so the next slot starts exactly `byte_size()` bytes
//! later.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use crate::printf_arg::{Arg, Payload};

/// Alignment of every slot, and of the arena storage itself.
pub const RECORD_ALIGN: usize = 8;

/// The uniform capability set of a deferred record.
pub trait DeferredRecord {
    /// Calls `vprintf` with the stored format and payload, returning whatever
    /// it returns. Non-negative values count produced characters, negative
    /// values report a failure of this one invocation.
    fn replay(&self, vprintf: &mut dyn FnMut(&str, &[Arg<'_>]) -> i32) -> i32;

    /// Exact number of arena bytes the record occupies.
    fn byte_size(&self) -> usize;

    /// The captured format string.
    fn format(&self) -> &str;

    /// Number of captured arguments.
    fn arity(&self) -> usize;
}

/// Concrete record for one payload shape.
#[repr(C)]
pub struct Deferred<'a, P> {
    format: &'a str,
    payload: P,
}

impl<'a, P: Payload + 'a> Deferred<'a, P> {
    // Rounded up so the next slot starts RECORD_ALIGN-aligned even where
    // pointers are narrower than RECORD_ALIGN.
    const SLOT_SIZE: usize = {
        assert!(
            mem::align_of::<Slot<'a, P>>() <= RECORD_ALIGN,
            "payload alignment exceeds the arena record alignment"
        );
        (mem::size_of::<Slot<'a, P>>() + RECORD_ALIGN - 1) & !(RECORD_ALIGN - 1)
    };

    const VTABLE: RecordVTable = RecordVTable {
        replay: replay_slot::<'a, P>,
        format: format_slot::<'a, P>,
        drop: if mem::needs_drop::<P>() {
            Some(drop_slot::<'a, P>)
        } else {
            None
        },
        size: Self::SLOT_SIZE,
        arity: P::ARITY,
    };

    pub fn new(format: &'a str, payload: P) -> Self {
        Deferred { format, payload }
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Arena footprint of this record type.
    pub const fn slot_size() -> usize {
        Self::SLOT_SIZE
    }

    /// Builds the slot that the arena writes in place.
    pub(crate) fn into_slot(self) -> Slot<'a, P> {
        Slot {
            vtable: &Self::VTABLE,
            record: self,
        }
    }
}

impl<'a, P: Payload + 'a> DeferredRecord for Deferred<'a, P> {
    #[inline]
    fn replay(&self, vprintf: &mut dyn FnMut(&str, &[Arg<'_>]) -> i32) -> i32 {
        self.payload.with_args(|args| vprintf(self.format, args))
    }

    #[inline]
    fn byte_size(&self) -> usize {
        Self::SLOT_SIZE
    }

    fn format(&self) -> &str {
        self.format
    }

    fn arity(&self) -> usize {
        P::ARITY
    }
}

/// Hand-rolled vtable shared by every slot of one payload type.
pub(crate) struct RecordVTable {
    replay: unsafe fn(NonNull<u8>, &mut dyn FnMut(&str, &[Arg<'_>]) -> i32) -> i32,
    format: unsafe fn(NonNull<u8>) -> NonNull<str>,
    drop: Option<unsafe fn(NonNull<u8>)>,
    size: usize,
    arity: usize,
}

#[repr(C)]
pub(crate) struct Slot<'a, P> {
    vtable: &'static RecordVTable,
    record: Deferred<'a, P>,
}

unsafe fn replay_slot<'a, P: Payload + 'a>(
    slot: NonNull<u8>,
    vprintf: &mut dyn FnMut(&str, &[Arg<'_>]) -> i32,
) -> i32 {
    let slot = slot.cast::<Slot<'a, P>>();
    slot.as_ref().record.replay(vprintf)
}

unsafe fn format_slot<'a, P: Payload + 'a>(slot: NonNull<u8>) -> NonNull<str> {
    let slot = slot.cast::<Slot<'a, P>>();
    NonNull::from(slot.as_ref().record.format)
}

unsafe fn drop_slot<'a, P: Payload + 'a>(slot: NonNull<u8>) {
    ptr::drop_in_place(slot.cast::<Slot<'a, P>>().as_ptr());
}

/// Type-erased handle to a record stored in an arena.
///
/// Obtained from a [`Cursor`](crate::Cursor) or by iterating a
/// [`RecordArena`](crate::RecordArena); valid for as long as the arena is
/// borrowed.
#[derive(Clone, Copy)]
pub struct RecordRef<'r, 'a> {
    slot: NonNull<u8>,
    _arena: PhantomData<&'r Deferred<'a, ()>>,
}

impl<'r, 'a> RecordRef<'r, 'a> {
    /// # Safety
    ///
    /// `slot` must point at an initialized slot written by
    /// [`Deferred::into_slot`] that stays alive and unmodified for `'r`.
    pub(crate) unsafe fn from_slot(slot: NonNull<u8>) -> Self {
        Self {
            slot,
            _arena: PhantomData,
        }
    }

    #[inline]
    fn vtable(&self) -> &'static RecordVTable {
        unsafe { *self.slot.cast::<&'static RecordVTable>().as_ptr() }
    }

    /// See [`DeferredRecord::replay`].
    #[inline]
    pub fn replay(&self, vprintf: &mut dyn FnMut(&str, &[Arg<'_>]) -> i32) -> i32 {
        unsafe { (self.vtable().replay)(self.slot, vprintf) }
    }

    #[inline]
    pub fn byte_size(&self) -> usize {
        self.vtable().size
    }

    /// The captured format string, borrowed for its original lifetime.
    pub fn format(&self) -> &'a str {
        unsafe { &*(self.vtable().format)(self.slot).as_ptr() }
    }

    pub fn arity(&self) -> usize {
        self.vtable().arity
    }

    /// Whether tearing this record down runs any drop glue.
    pub fn needs_drop(&self) -> bool {
        self.vtable().drop.is_some()
    }

    /// Runs the record's drop glue, if any.
    ///
    /// # Safety
    ///
    /// The record must not be used again, through this or any other handle.
    pub(crate) unsafe fn drop_in_place(self) {
        if let Some(drop) = self.vtable().drop {
            drop(self.slot);
        }
    }
}

impl DeferredRecord for RecordRef<'_, '_> {
    fn replay(&self, vprintf: &mut dyn FnMut(&str, &[Arg<'_>]) -> i32) -> i32 {
        RecordRef::replay(self, vprintf)
    }

    fn byte_size(&self) -> usize {
        RecordRef::byte_size(self)
    }

    fn format(&self) -> &str {
        RecordRef::format(self)
    }

    fn arity(&self) -> usize {
        RecordRef::arity(self)
    }
}

impl fmt::Debug for RecordRef<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordRef")
            .field("format", &self.format())
            .field("arity", &self.arity())
            .field("byte_size", &self.byte_size())
            .finish()
    }
}
