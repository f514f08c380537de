//! Wire encoding/decoding of [`Node`] trees.
//!
//! Container layout: `[i32 total size][per child: tag byte, zero-terminated
//! key, payload][0x00]`. Array children carry their decimal index as the
//! key. Scalar layouts are fixed-width or length-prefixed; see the type
//! docs on [`Node`].
//!
//! The decoder is designed to safely handle untrusted input: every read is
//! bounds-checked, declared lengths are validated against [`crate::limits`],
//! and recursion depth is capped.

use std::path::Path;

use crate::codec::primitives::{Reader, Writer};
use crate::error::{DecodeError, Error};
use crate::limits::{MAX_BINARY_LEN, MAX_DEPTH, MAX_DOCUMENT_SIZE, MAX_STRING_LEN};
use crate::model::{BinarySubtype, Node, NodeType, SecureBuffer};

// =============================================================================
// ENCODING
// =============================================================================

/// Serializes a node to a buffer of exactly `node.wire_size()` bytes.
pub fn encode_node(node: &Node) -> Vec<u8> {
    let mut writer = Writer::with_capacity(node.wire_size());
    write_node(&mut writer, node);
    writer.into_bytes()
}

fn write_node(w: &mut Writer, node: &Node) {
    match node {
        Node::Double(v) => w.write_f64(*v),
        Node::String(s) => {
            w.write_i32((s.len() + 1) as i32);
            w.write_cstring(s);
        }
        Node::Binary { subtype, data } => {
            w.write_i32(data.len() as i32);
            w.write_byte(*subtype as u8);
            w.write_bytes(data.as_slice());
        }
        // Already encoded, size prefix included.
        Node::BinaryDocument(bytes) => w.write_bytes(bytes.as_slice()),
        Node::Boolean(b) => w.write_byte(u8::from(*b)),
        Node::Datetime(v) | Node::Timestamp(v) | Node::Int64(v) => w.write_i64(*v),
        Node::Null => {}
        Node::Int32(v) => w.write_i32(*v),
        Node::Document(children) => {
            w.write_i32(node.wire_size() as i32);
            for (key, child) in children {
                w.write_byte(wire_tag(child));
                w.write_cstring(key);
                write_node(w, child);
            }
            w.write_byte(0);
        }
        Node::Array(items) => {
            w.write_i32(node.wire_size() as i32);
            for (index, child) in items.iter().enumerate() {
                w.write_byte(wire_tag(child));
                // Positional key, decimal ASCII.
                w.write_cstring(&index.to_string());
                write_node(w, child);
            }
            w.write_byte(0);
        }
    }
}

/// Unparsed documents go on the wire as plain documents.
fn wire_tag(node: &Node) -> u8 {
    match node.node_type() {
        NodeType::BinaryDocument => NodeType::Document as u8,
        t => t as u8,
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a full document from the front of `bytes`. Trailing bytes past
/// the declared size are ignored, so a framed stream slice can be passed
/// directly.
pub fn decode_document(bytes: &[u8]) -> Result<Node, DecodeError> {
    let mut reader = Reader::new(bytes);
    decode_node(NodeType::Document, &mut reader, 0)
}

/// Decodes a single value of the given type from the front of `bytes`, the
/// complement of [`encode_node`] for one node.
pub fn decode_value(t: NodeType, bytes: &[u8]) -> Result<Node, DecodeError> {
    let mut reader = Reader::new(bytes);
    decode_node(t, &mut reader, 0)
}

fn decode_node(t: NodeType, r: &mut Reader<'_>, depth: usize) -> Result<Node, DecodeError> {
    match t {
        NodeType::Double => Ok(Node::Double(r.read_f64("double")?)),
        NodeType::String => decode_string(r),
        NodeType::Document | NodeType::Array => decode_container(t, r, depth),
        NodeType::Binary => decode_binary(r),
        NodeType::BinaryDocument => decode_unparsed(r),
        NodeType::Boolean => match r.read_byte("boolean")? {
            0x00 => Ok(Node::Boolean(false)),
            0x01 => Ok(Node::Boolean(true)),
            value => Err(DecodeError::InvalidBool { value }),
        },
        NodeType::Datetime => Ok(Node::Datetime(r.read_i64("datetime")?)),
        NodeType::Null => Ok(Node::Null),
        NodeType::Int32 => Ok(Node::Int32(r.read_i32("int32")?)),
        NodeType::Timestamp => Ok(Node::Timestamp(r.read_i64("timestamp")?)),
        NodeType::Int64 => Ok(Node::Int64(r.read_i64("int64")?)),
        NodeType::Javascript | NodeType::MinKey | NodeType::MaxKey => {
            Err(DecodeError::UnsupportedType { node_type: t })
        }
    }
}

fn decode_string(r: &mut Reader<'_>) -> Result<Node, DecodeError> {
    let len = r.read_i32("string length")?;
    if len < 1 || len as usize > MAX_STRING_LEN {
        return Err(DecodeError::InvalidLength {
            context: "string",
            len: i64::from(len),
        });
    }
    let len = len as usize;
    let bytes = r.read_bytes(len, "string payload")?;
    if bytes[len - 1] != 0 {
        return Err(DecodeError::MissingTerminator { context: "string" });
    }
    let content = std::str::from_utf8(&bytes[..len - 1])
        .map_err(|_| DecodeError::InvalidUtf8 { field: "string" })?;
    Ok(Node::new_string(content))
}

fn decode_binary(r: &mut Reader<'_>) -> Result<Node, DecodeError> {
    let len = r.read_i32("binary length")?;
    if len < 0 || len as usize > MAX_BINARY_LEN {
        return Err(DecodeError::InvalidLength {
            context: "binary",
            len: i64::from(len),
        });
    }
    let subtype_byte = r.read_byte("binary subtype")?;
    let subtype = BinarySubtype::from_u8(subtype_byte).ok_or(DecodeError::InvalidBinarySubtype {
        subtype: subtype_byte,
    })?;
    let data = r.read_bytes(len as usize, "binary payload")?;
    Ok(Node::new_binary(data.to_vec(), subtype))
}

fn decode_unparsed(r: &mut Reader<'_>) -> Result<Node, DecodeError> {
    let size = r.read_i32("unparsed document size")?;
    if size < 5 || size as usize > MAX_DOCUMENT_SIZE {
        return Err(DecodeError::InvalidLength {
            context: "unparsed document",
            len: i64::from(size),
        });
    }
    let body = r.read_bytes(size as usize - 4, "unparsed document body")?;
    let mut bytes = Vec::with_capacity(size as usize);
    bytes.extend_from_slice(&size.to_le_bytes());
    bytes.extend_from_slice(body);
    Ok(Node::BinaryDocument(SecureBuffer::new(bytes)))
}

fn decode_container(t: NodeType, r: &mut Reader<'_>, depth: usize) -> Result<Node, DecodeError> {
    if depth >= MAX_DEPTH {
        return Err(DecodeError::DepthExceeded { max: MAX_DEPTH });
    }

    let start = r.position();
    let declared = r.read_i32("container size")?;
    if declared < 5 || declared as usize > MAX_DOCUMENT_SIZE {
        return Err(DecodeError::InvalidLength {
            context: "container",
            len: i64::from(declared),
        });
    }
    let declared = declared as usize;
    if start + declared > r.total_len() {
        return Err(DecodeError::UnexpectedEof {
            context: "container body",
        });
    }
    // The terminator byte sits at the last declared position.
    let children_end = start + declared - 1;

    let mut node = match t {
        NodeType::Array => Node::new_array(),
        _ => Node::new_document(),
    };

    while r.position() < children_end {
        let tag = r.read_byte("child type tag")?;
        let child_type = NodeType::from_u8(tag).ok_or(DecodeError::InvalidTypeTag { tag })?;
        let key = r.read_cstring("child key")?;
        let child = decode_node(child_type, r, depth + 1)?;
        if r.position() > children_end {
            return Err(DecodeError::SizeMismatch {
                declared,
                actual: r.position() - start,
            });
        }
        match &mut node {
            Node::Document(children) => {
                children.insert(key, child);
            }
            Node::Array(items) => items.push(child),
            // node was constructed as a container above
            _ => unreachable!(),
        }
    }

    let terminator = r.read_byte("container terminator")?;
    if terminator != 0 {
        return Err(DecodeError::MissingTerminator {
            context: "container",
        });
    }
    Ok(node)
}

// =============================================================================
// FRAMING AND FILES
// =============================================================================

/// Peeks the total framed length of a document at the front of `bytes`.
///
/// A document's own leading size field doubles as its stream frame: read 4
/// bytes, interpret as the total length (those 4 bytes included), then read
/// the rest.
pub fn framed_len(bytes: &[u8]) -> Result<usize, DecodeError> {
    if bytes.len() < 4 {
        return Err(DecodeError::UnexpectedEof {
            context: "frame size",
        });
    }
    // SAFETY: length checked above, try_into always succeeds
    let size = i32::from_le_bytes(bytes[..4].try_into().unwrap());
    if size < 5 || size as usize > MAX_DOCUMENT_SIZE {
        return Err(DecodeError::InvalidLength {
            context: "frame",
            len: i64::from(size),
        });
    }
    Ok(size as usize)
}

/// Writes a node's wire form to a file.
pub fn save(node: &Node, path: impl AsRef<Path>) -> Result<(), Error> {
    std::fs::write(path, encode_node(node))?;
    Ok(())
}

/// Reads a document back from a file written by [`save`].
pub fn load(path: impl AsRef<Path>) -> Result<Node, Error> {
    let bytes = std::fs::read(path)?;
    Ok(decode_document(&bytes)?)
}
