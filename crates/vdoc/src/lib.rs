//! vdoc: self-describing binary document trees with versioned envelopes.
//!
//! This crate provides the document engine of a small document store: a
//! tree-shaped value type with a compact binary wire format, slash-path
//! navigation with creation-on-demand, a relaxed JSON text parser producing
//! the same trees, and a versioned document wrapper with revision tracking
//! and field-level encryption.
//!
//! # Overview
//!
//! - **Tree values**: every value is a [`Node`] — typed scalars, binary
//!   blobs, ordered-key documents, positional arrays
//! - **Binary-first**: byte-exact wire format with sizes computable without
//!   serializing
//! - **Interchangeable input**: text and binary input produce identical
//!   trees
//! - **Versioned envelopes**: [`Document`] adds revision ids, vector
//!   clocks, and authenticated field encryption on top of a root node
//!
//! # Quick Start
//!
//! ```rust
//! use vdoc::{Document, Node, parse_json};
//! use vdoc::model::uuid_from_key;
//!
//! let server = uuid_from_key(1);
//!
//! // Build a versioned document and mutate it through paths.
//! let mut doc = Document::new();
//! doc.rekey(&server, 42).unwrap();
//! doc.set(&server, "user/name", Node::new_string("ada")).unwrap();
//! doc.push(&server, "user/roles", Node::new_string("admin")).unwrap();
//! doc.wash();
//!
//! // Text input produces the same trees as binary decoding.
//! let parsed = parse_json("{\"numbers\": [1, 2, 3]}").unwrap();
//! doc.set(&server, "extra", parsed).unwrap();
//!
//! // Serialize the whole envelope and bring it back.
//! let bytes = doc.as_node().to_binary();
//! let restored = vdoc::codec::decode_document(&bytes).unwrap();
//! assert_eq!(restored.nav("./user/name").unwrap().as_string(), "ada");
//! assert_eq!(restored.nav("./extra/numbers/2").unwrap().as_int64(), 3);
//! ```
//!
//! # Modules
//!
//! - [`model`]: the [`Node`] tree, path navigation, identifiers
//! - [`codec`]: binary encoding/decoding and stream framing
//! - [`text`]: the relaxed JSON parser and the renderers
//! - [`document`]: the versioned [`Document`] envelope and encryption
//! - [`error`]: error types
//! - [`limits`]: security limits for decoding
//!
//! # Security
//!
//! The decoder is designed to safely handle untrusted input:
//! - All reads are bounds-checked against the supplied buffer
//! - Declared lengths and nesting depth are bounded by [`limits`]
//! - Invalid data is rejected with descriptive errors
//!
//! Heap-backed scalar payloads are zeroed before their memory is released,
//! and encryption keys never appear in `Debug` output.
//!
//! # Wire Format
//!
//! Containers encode as `[i32 size][per child: tag, key NUL, payload][0x00]`
//! with array children keyed by their decimal index. A document's leading
//! size field doubles as its stream frame: read four bytes, then the
//! remainder. See [`codec`] for the full layout and the type tag table on
//! [`NodeType`].

pub mod codec;
pub mod document;
pub mod error;
pub mod limits;
pub mod model;
pub mod text;

// Re-export commonly used types at crate root
pub use codec::{decode_document, encode_node, framed_len};
pub use document::{Document, EncryptionKey, DOCUMENT_VERSION};
pub use error::{CryptoError, DecodeError, Error, ParseError, PathError, TypeError};
pub use model::{BinarySubtype, Node, NodeType};
pub use text::{as_debug_string, as_pretty_json, as_string, parse_json};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
