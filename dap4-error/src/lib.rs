#![deny(missing_docs)]
#![feature(error_generic_member_access)]

//! Error handling for the DAP4 data crates.
//!
//! Every fallible operation in the workspace returns a [`Dap4Result`]. Errors are grouped into
//! the categories reported by [`Dap4Error::category`]: transport faults (short reads), protocol
//! faults (the server sent an error document), layout faults (the bytes do not match the
//! metadata), and access faults (a bad index or field name on an already compiled cursor).
//! Nothing in this workspace retries on error.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::{env, fmt, io};

/// A string that can be used as an error message.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

#[allow(clippy::fallible_impl_from)]
impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    #[allow(clippy::panic)]
    fn from(msg: T) -> Self {
        if env::var("DAP4_PANIC_ON_ERR").as_deref().unwrap_or("") == "1" {
            panic!("{}\nBacktrace:\n{}", msg.into(), Backtrace::capture());
        } else {
            Self(msg.into())
        }
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The coarse classification of a [`Dap4Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The byte stream ended early or could not be read.
    Transport,
    /// The server answered with an error document instead of data.
    Protocol,
    /// The bytes are inconsistent with the metadata describing them.
    Layout,
    /// A bad index, slice or name was used on a compiled cursor.
    Access,
    /// Anything else, e.g. an invalid argument or an unsupported conversion.
    Other,
}

/// The top-level error type for DAP4.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum Dap4Error {
    /// An index is out of bounds.
    #[error("index {0} out of bounds from {1} to {2}\nBacktrace:\n{3}")]
    OutOfBounds(usize, usize, usize, Backtrace),
    /// An invalid argument was provided.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, Backtrace),
    /// The underlying byte stream ended early or failed mid-read.
    #[error("transport fault: {0}\nBacktrace:\n{1}")]
    Transport(ErrString, Backtrace),
    /// The server sent an error chunk. The message is the verbatim error document.
    #[error("server returned an error response:\n{0}\nBacktrace:\n{1}")]
    Protocol(ErrString, Backtrace),
    /// The serialized bytes do not agree with the metadata describing them.
    #[error("layout fault: {0}\nBacktrace:\n{1}")]
    Layout(ErrString, Backtrace),
    /// A named field or variable does not exist.
    #[error("{0}\nBacktrace:\n{1}")]
    Lookup(ErrString, Backtrace),
    /// A value cannot be converted between two types.
    #[error("{0}\nBacktrace:\n{1}")]
    Conversion(ErrString, Backtrace),
    /// A stored checksum does not match the data it covers.
    #[error("checksum mismatch: {0}\nBacktrace:\n{1}")]
    Checksum(ErrString, Backtrace),
    /// A wrapper for other errors, carrying additional context.
    #[error("{0}: {1}")]
    Context(ErrString, #[source] Box<Dap4Error>),
    /// A wrapper for IO errors.
    #[error(transparent)]
    IOError(#[from] io::Error),
    /// A wrapper for UTF-8 decoding errors.
    #[error(transparent)]
    Utf8Error(#[from] std::str::Utf8Error),
}

impl Dap4Error {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        Dap4Error::Context(msg.into(), Box::new(self))
    }

    /// Classify the error, looking through any context wrappers.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Dap4Error::Transport(..) | Dap4Error::IOError(_) => ErrorCategory::Transport,
            Dap4Error::Protocol(..) => ErrorCategory::Protocol,
            Dap4Error::Layout(..) | Dap4Error::Checksum(..) => ErrorCategory::Layout,
            Dap4Error::OutOfBounds(..) | Dap4Error::Lookup(..) => ErrorCategory::Access,
            Dap4Error::Context(_, inner) => inner.category(),
            Dap4Error::InvalidArgument(..)
            | Dap4Error::Conversion(..)
            | Dap4Error::Utf8Error(_) => ErrorCategory::Other,
        }
    }

    /// The verbatim error document carried by a protocol fault, if this is one.
    pub fn protocol_document(&self) -> Option<&str> {
        match self {
            Dap4Error::Protocol(doc, _) => Some(doc),
            Dap4Error::Context(_, inner) => inner.protocol_document(),
            _ => None,
        }
    }
}

impl Debug for Dap4Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl From<Dap4Error> for io::Error {
    fn from(value: Dap4Error) -> Self {
        match value {
            Dap4Error::IOError(io) => io,
            Dap4Error::Transport(..) => io::Error::new(io::ErrorKind::UnexpectedEof, value),
            other => io::Error::other(other),
        }
    }
}

/// A type alias for Results that return Dap4Errors as their error type.
pub type Dap4Result<T> = Result<T, Dap4Error>;

/// A trait for expect-ing a Dap4Result or an Option.
pub trait Dap4Expect {
    /// The type of the value being expected.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be called only in contexts where the error condition represents a bug (programmer error).
    fn dap4_expect(self, msg: &str) -> Self::Output;
}

impl<T, E> Dap4Expect for Result<T, E>
where
    E: Into<Dap4Error>,
{
    type Output = T;

    #[inline(always)]
    fn dap4_expect(self, msg: &str) -> Self::Output {
        self.map_err(|err| err.into())
            .unwrap_or_else(|e| dap4_panic!(e.with_context(msg.to_string())))
    }
}

impl<T> Dap4Expect for Option<T> {
    type Output = T;

    #[inline(always)]
    fn dap4_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|| {
            let err = Dap4Error::InvalidArgument(msg.to_string().into(), Backtrace::capture());
            dap4_panic!(err)
        })
    }
}

/// A convenient macro for creating a Dap4Error.
#[macro_export]
macro_rules! dap4_err {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        use std::backtrace::Backtrace;
        $crate::Dap4Error::OutOfBounds($idx, $start, $stop, Backtrace::capture())
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::Dap4Error::$variant(format!($fmt, $($arg),*).into(), Backtrace::capture())
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::dap4_err!(InvalidArgument: $fmt $(, $arg)*)
    };
}

/// A convenient macro for returning a Dap4Error.
#[macro_export]
macro_rules! dap4_bail {
    ($($tt:tt)+) => {
        return Err($crate::dap4_err!($($tt)+))
    };
}

/// A convenient macro for panicking with a Dap4Error in the presence of a programmer error
/// (e.g., an invariant has been violated).
#[macro_export]
macro_rules! dap4_panic {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        $crate::dap4_panic!($crate::dap4_err!(OutOfBounds: $idx, $start, $stop))
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::dap4_panic!($crate::dap4_err!($variant: $fmt $(, $arg)*))
    };
    ($err:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        let err: $crate::Dap4Error = $err;
        panic!("{}", err.with_context(format!($fmt, $($arg),*)))
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::dap4_panic!($crate::dap4_err!($fmt $(, $arg)*))
    };
    ($err:expr) => {{
        let err: $crate::Dap4Error = $err;
        panic!("{}", err)
    }};
}
