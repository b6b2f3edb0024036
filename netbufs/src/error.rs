use super::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The underlying CBOR stream failed.
    #[error(transparent)]
    Cbor(#[from] cbor::Error),

    /// A group began with a different id than the caller asked for.
    #[error("Expected group {expected}, found {found}")]
    UnexpectedGroup { expected: u64, found: u64 },

    /// The schema already binds this id.
    #[error("Id {0} is declared more than once")]
    DuplicateId(u64),

    /// The schema already binds this path.
    #[error("Path '{0}' is declared more than once")]
    DuplicatePath(String),

    /// A group or attribute name is not a dotted identifier.
    #[error("Invalid name '{0}'")]
    InvalidPath(String),

    /// A required attribute did not appear before its group ended.
    #[error("Group '{group}' ended without required attribute '{path}'")]
    MissingRequired { group: String, path: String },

    /// The schema has no group with this id.
    #[error("Unknown group {0}")]
    UnknownGroup(u64),

    /// A key or group end was sent or received outside of any group.
    #[error("No group is open")]
    NoGroup,
}
