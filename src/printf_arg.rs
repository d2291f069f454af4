use std::borrow::Cow;

/// A single positional argument as seen by a formatter at replay time.
///
/// Integers are widened to 64 bits the way C varargs promote them; the
/// concrete captured type still determines the record layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'r> {
    Int(i64),
    Uint(u64),
    Float(f64),
    Char(char),
    Str(&'r str),
    Ptr(usize),
}

impl Arg<'_> {
    /// Short type name, used in formatter diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Arg::Int(_) => "a signed integer",
            Arg::Uint(_) => "an unsigned integer",
            Arg::Float(_) => "a float",
            Arg::Char(_) => "a char",
            Arg::Str(_) => "a string",
            Arg::Ptr(_) => "a pointer",
        }
    }
}

/// A value that can be captured into a deferred record and handed back to a
/// formatter as an [`Arg`].
///
/// Captured values are moved into the arena, so they must be `Send + Sync`
/// for the arena itself to be shareable behind a lock.
pub trait PrintfArg: Send + Sync {
    fn to_arg(&self) -> Arg<'_>;
}

macro_rules! impl_printf_arg {
    ($variant:ident as $wide:ty: $($t:ty),*) => {
        $(
            impl PrintfArg for $t {
                #[inline]
                fn to_arg(&self) -> Arg<'_> {
                    Arg::$variant(*self as $wide)
                }
            }
        )*
    };
}

impl_printf_arg!(Int as i64: i8, i16, i32, i64, isize);
impl_printf_arg!(Uint as u64: u8, u16, u32, u64, usize);
impl_printf_arg!(Float as f64: f32, f64);

impl PrintfArg for bool {
    #[inline]
    fn to_arg(&self) -> Arg<'_> {
        Arg::Int(*self as i64)
    }
}

impl PrintfArg for char {
    #[inline]
    fn to_arg(&self) -> Arg<'_> {
        Arg::Char(*self)
    }
}

impl PrintfArg for &str {
    #[inline]
    fn to_arg(&self) -> Arg<'_> {
        Arg::Str(self)
    }
}

impl PrintfArg for String {
    #[inline]
    fn to_arg(&self) -> Arg<'_> {
        Arg::Str(self.as_str())
    }
}

impl PrintfArg for Box<str> {
    #[inline]
    fn to_arg(&self) -> Arg<'_> {
        Arg::Str(self)
    }
}

impl PrintfArg for Cow<'_, str> {
    #[inline]
    fn to_arg(&self) -> Arg<'_> {
        Arg::Str(self.as_ref())
    }
}

/// An address captured for `%p`.
///
/// Only the numeric address is kept; the pointee is never read, which is what
/// lets it cross threads with the rest of the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ptr(usize);

impl Ptr {
    pub fn new<T: ?Sized>(ptr: *const T) -> Self {
        Ptr(ptr.cast::<()>() as usize)
    }

    pub fn of<T: ?Sized>(value: &T) -> Self {
        Ptr::new(value as *const T)
    }

    pub const fn null() -> Self {
        Ptr(0)
    }

    pub fn addr(self) -> usize {
        self.0
    }
}

impl PrintfArg for Ptr {
    #[inline]
    fn to_arg(&self) -> Arg<'_> {
        Arg::Ptr(self.0)
    }
}

/// The fixed-arity, fixed-type argument tuple stored in a record.
///
/// Implemented for tuples of up to twelve [`PrintfArg`] values. Every distinct
/// tuple type yields a distinct record type in the arena.
pub trait Payload: Send + Sync {
    /// Number of positional arguments.
    const ARITY: usize;

    /// Lends the stored values to `f` as a positional argument list.
    fn with_args<R>(&self, f: impl FnOnce(&[Arg<'_>]) -> R) -> R;
}

macro_rules! impl_payload {
    (@count) => { 0usize };
    (@count $head:ident $($tail:ident)*) => { 1usize + impl_payload!(@count $($tail)*) };
    ($($name:ident),*) => {
        impl<$($name: PrintfArg),*> Payload for ($($name,)*) {
            const ARITY: usize = impl_payload!(@count $($name)*);

            #[inline]
            #[allow(non_snake_case)]
            fn with_args<R>(&self, f: impl FnOnce(&[Arg<'_>]) -> R) -> R {
                let ($($name,)*) = self;
                f(&[$($name.to_arg()),*])
            }
        }
    };
}

impl_payload!();
impl_payload!(A);
impl_payload!(A, B);
impl_payload!(A, B, C);
impl_payload!(A, B, C, D);
impl_payload!(A, B, C, D, E);
impl_payload!(A, B, C, D, E, F);
impl_payload!(A, B, C, D, E, F, G);
impl_payload!(A, B, C, D, E, F, G, H);
impl_payload!(A, B, C, D, E, F, G, H, I);
impl_payload!(A, B, C, D, E, F, G, H, I, J);
impl_payload!(A, B, C, D, E, F, G, H, I, J, K);
impl_payload!(A, B, C, D, E, F, G, H, I, J, K, L);
