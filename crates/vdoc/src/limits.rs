//! Security limits for decoding and parsing untrusted input.
//!
//! All decoder allocations are bounded by these constants so a hostile
//! buffer cannot force unbounded memory use or stack exhaustion.

/// Maximum nesting depth for documents and arrays, shared by the binary
/// decoder and the text parser.
pub const MAX_DEPTH: usize = 128;

/// Maximum declared size of a single document or array, in bytes.
pub const MAX_DOCUMENT_SIZE: usize = 64 * 1024 * 1024;

/// Maximum declared length of a string payload, in bytes (including the
/// trailing NUL).
pub const MAX_STRING_LEN: usize = 16 * 1024 * 1024;

/// Maximum declared length of a binary payload, in bytes.
pub const MAX_BINARY_LEN: usize = 64 * 1024 * 1024;

/// Maximum length of a single key in a document, in bytes.
pub const MAX_KEY_LEN: usize = 64 * 1024;
