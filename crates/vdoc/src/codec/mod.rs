//! Binary encoding/decoding for document trees.

pub mod node;
pub mod primitives;

pub use node::{decode_document, decode_value, encode_node, framed_len, load, save};
pub use primitives::{Reader, Writer};
