//! Core data types: the [`Node`] tree, path navigation, and identifiers.

pub mod id;
pub mod node;
pub mod path;

pub use id::{format_uuid, parse_uuid, uuid_from_key};
pub use node::{BinarySubtype, Node, NodeType, SecureBuffer, SecureString};
pub use path::{escape_path, split_path};
