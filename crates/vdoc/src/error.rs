//! Error types for document tree operations, codecs, and field encryption.

use thiserror::Error;

use crate::model::{BinarySubtype, NodeType};

/// Error raised when a node accessor expects a different type than it found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected:?} node, found {found:?}")]
pub struct TypeError {
    /// The node type the operation required.
    pub expected: NodeType,
    /// The node type actually present.
    pub found: NodeType,
    /// Binary subtype of the offending node, when it was a binary node.
    pub subtype: Option<BinarySubtype>,
}

impl TypeError {
    pub(crate) fn new(expected: NodeType, found: NodeType) -> Self {
        Self {
            expected,
            found,
            subtype: None,
        }
    }
}

/// Error raised while resolving a slash-delimited path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    /// Const navigation could not resolve the path.
    #[error("path {path:?} does not exist")]
    NotFound { path: String },

    /// An array was traversed with a segment that is not a decimal index.
    #[error("segment {segment:?} in path {path:?} is not an array index")]
    InvalidIndex { path: String, segment: String },

    /// An array index segment was outside the array's current bounds.
    #[error("index {index} in path {path:?} out of bounds (len: {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    /// The node at the path had the wrong type for the requested mutation.
    #[error("node at {path:?} is {found:?}, expected {expected:?}")]
    WrongType {
        path: String,
        expected: NodeType,
        found: NodeType,
    },

    /// An unparsed document blob along the path could not be decoded.
    #[error("unparsed document at {path:?} is unreadable: {source}")]
    UnreadableChild {
        path: String,
        source: DecodeError,
    },
}

/// Error during text parsing. Coordinates are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Error during binary decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("invalid node type tag: {tag:#04x}")]
    InvalidTypeTag { tag: u8 },

    #[error("node type {node_type:?} is not decodable")]
    UnsupportedType { node_type: NodeType },

    #[error("invalid binary subtype: {subtype:#04x}")]
    InvalidBinarySubtype { subtype: u8 },

    #[error("invalid bool value: {value:#04x} (expected 0x00 or 0x01)")]
    InvalidBool { value: u8 },

    #[error("{context} length {len} is invalid")]
    InvalidLength { context: &'static str, len: i64 },

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("nesting depth exceeds maximum {max}")]
    DepthExceeded { max: usize },

    #[error("document size {declared} does not match encoded content ({actual})")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("missing 0x00 terminator at end of {context}")]
    MissingTerminator { context: &'static str },

    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },
}

/// Error during field-level encryption or decryption. Non-retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("encryption key must be exactly 32 bytes, got {len}")]
    InvalidKeyLength { len: usize },

    #[error("invalid base64 key material")]
    InvalidKeyEncoding,

    #[error("encrypted section {section:?} for {key_name:?} is {context}")]
    MalformedSection {
        section: &'static str,
        key_name: String,
        context: &'static str,
    },

    #[error("decryption failed: wrong key or corrupted ciphertext")]
    DecryptFailed,

    #[error("encryption failed")]
    EncryptFailed,
}

/// Umbrella error for operations that cross concern boundaries, such as
/// document mutation (path + crypto + decode) and file round-trips.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
