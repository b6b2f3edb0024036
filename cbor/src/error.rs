/*!
The error type shared by every encode and decode operation.

Every variant except [`Error::NoMore`] leaves the owning [`Stream`](crate::stream::Stream)
unusable: there is no resynchronization after a malformed header or a failed write.
*/

use thiserror::Error;

/// Errors raised by the buffer, the block stack, the encoder and the decoder.
#[derive(Error, Debug)]
pub enum Error {
    /// The allocator refused to grow a payload buffer.
    #[error("Failed to allocate {0} bytes")]
    NoMemory(usize),

    /// A header byte, or the bytes following it, are malformed.
    #[error("Malformed header {0:#04x}")]
    Parse(u8),

    /// A specific major type was required, but something else was found.
    #[error("Expected {expected}, found {found}")]
    Item {
        expected: &'static str,
        found: &'static str,
    },

    /// The input ended part way through an item.
    #[error("Premature end of input")]
    Eof,

    /// A value or length does not fit the requested width.
    #[error("Value {0} is out of range for the target type")]
    Range(i128),

    /// An indefinite length was used where only a definite length is allowed.
    #[error("Indefinite length not allowed here")]
    Indefinite,

    /// Container begin and end calls do not match, or the stream is in the wrong state.
    #[error("Invalid operation: {0}")]
    Operation(&'static str),

    /// A container was closed with the wrong number of items.
    #[error("Container holds {seen} items, expected {expected}")]
    NItems { seen: u64, expected: u64 },

    /// The underlying source failed.
    #[error("Read failed: {0}")]
    Read(#[source] std::io::Error),

    /// The underlying sink failed, or accepted fewer bytes than offered.
    #[error("Write failed: {0}")]
    Write(#[source] std::io::Error),

    /// The input uses a feature this codec does not implement.
    #[error("Unsupported {0}")]
    Unsupported(&'static str),

    /// The current container, or the input, has no more items.
    #[error("No more items")]
    NoMore,

    /// Containers or tags are nested more deeply than the configured limit.
    #[error("Nesting depth exceeds the limit of {0}")]
    Depth(usize),

    /// A text string payload is not valid UTF-8.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

/// A copyable summary of an [`Error`], kept as the stream's "last error".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoMemory,
    Parse,
    Item,
    Eof,
    Range,
    Indefinite,
    Operation,
    NItems,
    Read,
    Write,
    Unsupported,
    NoMore,
    Depth,
    Utf8,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoMemory(_) => ErrorKind::NoMemory,
            Error::Parse(_) => ErrorKind::Parse,
            Error::Item { .. } => ErrorKind::Item,
            Error::Eof => ErrorKind::Eof,
            Error::Range(_) => ErrorKind::Range,
            Error::Indefinite => ErrorKind::Indefinite,
            Error::Operation(_) => ErrorKind::Operation,
            Error::NItems { .. } => ErrorKind::NItems,
            Error::Read(_) => ErrorKind::Read,
            Error::Write(_) => ErrorKind::Write,
            Error::Unsupported(_) => ErrorKind::Unsupported,
            Error::NoMore => ErrorKind::NoMore,
            Error::Depth(_) => ErrorKind::Depth,
            Error::Utf8(_) => ErrorKind::Utf8,
        }
    }

    /// True for the I/O failures, as opposed to problems with the data itself.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Read(_) | Error::Write(_))
    }
}
