//! The universal tree value type.
//!
//! A [`Node`] is a self-describing value: a typed scalar, a binary blob, an
//! ordered-by-key document, or a positional array. Every document, wire
//! message, and parser result in this crate is a `Node` tree.
//!
//! Ownership is strictly single-parent: children are owned by their
//! container and dropped recursively with it. Heap-backed scalar payloads
//! are zeroed before their memory is released.

use std::collections::BTreeMap;
use std::fmt;

use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{DecodeError, Error, TypeError};
use crate::model::id::parse_uuid;

/// Wire type tags.
///
/// `Javascript`, `MinKey`, and `MaxKey` are recognized tag values but carry
/// no decodable payload in this format; encountering them in input is a
/// decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    /// A document carried as raw, not-yet-parsed bytes.
    BinaryDocument = 0x06,
    Boolean = 0x08,
    Datetime = 0x09,
    Null = 0x0A,
    Javascript = 0x0D,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    MaxKey = 0x7F,
    MinKey = 0xFF,
}

impl NodeType {
    /// Creates a NodeType from its wire tag byte.
    pub fn from_u8(v: u8) -> Option<NodeType> {
        match v {
            0x01 => Some(NodeType::Double),
            0x02 => Some(NodeType::String),
            0x03 => Some(NodeType::Document),
            0x04 => Some(NodeType::Array),
            0x05 => Some(NodeType::Binary),
            0x06 => Some(NodeType::BinaryDocument),
            0x08 => Some(NodeType::Boolean),
            0x09 => Some(NodeType::Datetime),
            0x0A => Some(NodeType::Null),
            0x0D => Some(NodeType::Javascript),
            0x10 => Some(NodeType::Int32),
            0x11 => Some(NodeType::Timestamp),
            0x12 => Some(NodeType::Int64),
            0x7F => Some(NodeType::MaxKey),
            0xFF => Some(NodeType::MinKey),
            _ => None,
        }
    }

    /// Human-readable name, for error messages and the debug renderer.
    pub fn name(&self) -> &'static str {
        match self {
            NodeType::Double => "double",
            NodeType::String => "string",
            NodeType::Document => "document",
            NodeType::Array => "array",
            NodeType::Binary => "binary",
            NodeType::BinaryDocument => "binary-document",
            NodeType::Boolean => "boolean",
            NodeType::Datetime => "datetime",
            NodeType::Null => "null",
            NodeType::Javascript => "javascript",
            NodeType::Int32 => "int32",
            NodeType::Timestamp => "timestamp",
            NodeType::Int64 => "int64",
            NodeType::MaxKey => "maxkey",
            NodeType::MinKey => "minkey",
        }
    }

    /// True for the container types.
    pub fn is_nested(&self) -> bool {
        matches!(self, NodeType::Document | NodeType::Array)
    }

    /// True for types rendered inside quotes in text form.
    pub fn is_quotable(&self) -> bool {
        matches!(self, NodeType::String)
    }
}

/// Subtype tag carried by binary payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BinarySubtype {
    Generic = 0x00,
    Function = 0x01,
    BinaryOld = 0x02,
    Uuid = 0x03,
    Md5 = 0x05,
    UserDefined = 0x80,
}

impl BinarySubtype {
    /// Creates a BinarySubtype from its wire byte.
    pub fn from_u8(v: u8) -> Option<BinarySubtype> {
        match v {
            0x00 => Some(BinarySubtype::Generic),
            0x01 => Some(BinarySubtype::Function),
            0x02 => Some(BinarySubtype::BinaryOld),
            0x03 => Some(BinarySubtype::Uuid),
            0x05 => Some(BinarySubtype::Md5),
            0x80 => Some(BinarySubtype::UserDefined),
            _ => None,
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            BinarySubtype::Generic => "generic",
            BinarySubtype::Function => "function",
            BinarySubtype::BinaryOld => "binary",
            BinarySubtype::Uuid => "uuid",
            BinarySubtype::Md5 => "md5",
            BinarySubtype::UserDefined => "user-defined",
        }
    }
}

/// Owned byte payload that is zeroed before its memory is released.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecureBuffer(Vec<u8>);

impl SecureBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for SecureBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for SecureBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl std::ops::Deref for SecureBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq for SecureBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecureBuffer {}

impl fmt::Debug for SecureBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureBuffer({} bytes)", self.0.len())
    }
}

/// Owned string payload that is zeroed before its memory is released.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::ops::Deref for SecureString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl PartialEq for SecureString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecureString {}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

/// The universal self-describing tree value.
///
/// Documents keep their children in a [`BTreeMap`], so key order is
/// lexicographic and significant for serialization. Arrays are positional.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Double(f64),
    String(SecureString),
    Document(BTreeMap<String, Node>),
    Array(Vec<Node>),
    Binary {
        subtype: BinarySubtype,
        data: SecureBuffer,
    },
    /// An encoded document carried verbatim (including its 4-byte size
    /// prefix), decoded lazily when navigated.
    BinaryDocument(SecureBuffer),
    Boolean(bool),
    Datetime(i64),
    Null,
    Int32(i32),
    Timestamp(i64),
    Int64(i64),
}

impl Default for Node {
    fn default() -> Self {
        Node::new_document()
    }
}

impl Node {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn new_document() -> Node {
        Node::Document(BTreeMap::new())
    }

    pub fn new_array() -> Node {
        Node::Array(Vec::new())
    }

    pub fn new_string(s: impl Into<String>) -> Node {
        Node::String(SecureString::from(s.into()))
    }

    pub fn new_boolean(v: bool) -> Node {
        Node::Boolean(v)
    }

    pub fn new_int32(v: i32) -> Node {
        Node::Int32(v)
    }

    pub fn new_int64(v: i64) -> Node {
        Node::Int64(v)
    }

    /// Stores the value bit-for-bit in an int64 node; read it back with
    /// [`Node::as_uint64`].
    pub fn new_uint64(v: u64) -> Node {
        Node::Int64(v as i64)
    }

    pub fn new_double(v: f64) -> Node {
        Node::Double(v)
    }

    pub fn new_timestamp(v: i64) -> Node {
        Node::Timestamp(v)
    }

    pub fn new_datetime(v: i64) -> Node {
        Node::Datetime(v)
    }

    pub fn new_null() -> Node {
        Node::Null
    }

    pub fn new_binary(data: impl Into<Vec<u8>>, subtype: BinarySubtype) -> Node {
        Node::Binary {
            subtype,
            data: SecureBuffer::new(data.into()),
        }
    }

    pub fn new_uuid(id: &Uuid) -> Node {
        Node::new_binary(id.as_bytes().to_vec(), BinarySubtype::Uuid)
    }

    // =========================================================================
    // Inspectors
    // =========================================================================

    /// The wire type tag of this node.
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Double(_) => NodeType::Double,
            Node::String(_) => NodeType::String,
            Node::Document(_) => NodeType::Document,
            Node::Array(_) => NodeType::Array,
            Node::Binary { .. } => NodeType::Binary,
            Node::BinaryDocument(_) => NodeType::BinaryDocument,
            Node::Boolean(_) => NodeType::Boolean,
            Node::Datetime(_) => NodeType::Datetime,
            Node::Null => NodeType::Null,
            Node::Int32(_) => NodeType::Int32,
            Node::Timestamp(_) => NodeType::Timestamp,
            Node::Int64(_) => NodeType::Int64,
        }
    }

    /// True if this node carries anything worth rendering: containers are
    /// present iff they have children, every other type is always present.
    pub fn has_content(&self) -> bool {
        match self {
            Node::Document(m) => !m.is_empty(),
            Node::Array(v) => !v.is_empty(),
            _ => true,
        }
    }

    /// Total wire-encoded byte length of this node, computed without
    /// serializing.
    pub fn wire_size(&self) -> usize {
        match self {
            Node::Double(_) | Node::Int64(_) | Node::Timestamp(_) | Node::Datetime(_) => 8,
            Node::Int32(_) => 4,
            Node::Boolean(_) => 1,
            Node::Null => 0,
            Node::String(s) => 4 + s.len() + 1,
            Node::Binary { data, .. } => 4 + 1 + data.len(),
            Node::BinaryDocument(bytes) => bytes.len(),
            Node::Document(m) => {
                // 4-byte size, children (tag + key + NUL + payload), terminator.
                5 + m
                    .iter()
                    .map(|(k, v)| 1 + k.len() + 1 + v.wire_size())
                    .sum::<usize>()
            }
            Node::Array(v) => {
                5 + v
                    .iter()
                    .enumerate()
                    .map(|(i, child)| 1 + decimal_len(i) + 1 + child.wire_size())
                    .sum::<usize>()
            }
        }
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    /// Replaces this node with a null node, dropping the old payload.
    pub fn nullify(&mut self) {
        *self = Node::Null;
    }

    /// Adds `amount` to this node's numeric interpretation and stores the
    /// result as an int64, regardless of the previous type.
    pub fn increment(&mut self, amount: i64) {
        let v = self.as_int64().wrapping_add(amount);
        *self = Node::Int64(v);
    }

    /// Recursively overlays `other` onto this node. Where both sides hold
    /// documents the children are merged key by key; everywhere else the
    /// incoming value replaces the existing one. Fields present only on this
    /// side survive untouched.
    pub fn combine(&mut self, other: &Node) {
        match (self, other) {
            (Node::Document(dst), Node::Document(src)) => {
                for (key, value) in src {
                    match dst.get_mut(key) {
                        Some(existing) if existing.node_type().is_nested() => {
                            existing.combine(value)
                        }
                        _ => {
                            dst.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
            (dst, src) => *dst = src.clone(),
        }
    }

    // =========================================================================
    // Typed accessors
    // =========================================================================

    /// Borrows the children of a document node.
    pub fn as_document(&self) -> Result<&BTreeMap<String, Node>, TypeError> {
        match self {
            Node::Document(m) => Ok(m),
            other => Err(other.type_error(NodeType::Document)),
        }
    }

    /// Mutably borrows the children of a document node.
    pub fn as_document_mut(&mut self) -> Result<&mut BTreeMap<String, Node>, TypeError> {
        match self {
            Node::Document(m) => Ok(m),
            other => Err(other.type_error(NodeType::Document)),
        }
    }

    /// Borrows the elements of an array node.
    pub fn as_array(&self) -> Result<&Vec<Node>, TypeError> {
        match self {
            Node::Array(v) => Ok(v),
            other => Err(other.type_error(NodeType::Array)),
        }
    }

    /// Mutably borrows the elements of an array node.
    pub fn as_array_mut(&mut self) -> Result<&mut Vec<Node>, TypeError> {
        match self {
            Node::Array(v) => Ok(v),
            other => Err(other.type_error(NodeType::Array)),
        }
    }

    /// Borrows a binary payload with its subtype.
    pub fn as_binary(&self) -> Result<(BinarySubtype, &[u8]), TypeError> {
        match self {
            Node::Binary { subtype, data } => Ok((*subtype, data.as_slice())),
            other => Err(other.type_error(NodeType::Binary)),
        }
    }

    fn type_error(&self, expected: NodeType) -> TypeError {
        let mut err = TypeError::new(expected, self.node_type());
        if let Node::Binary { subtype, .. } = self {
            err.subtype = Some(*subtype);
        }
        err
    }

    // =========================================================================
    // Total conversions
    // =========================================================================

    /// Converts any node to an int32; non-numeric inputs yield 0.
    pub fn as_int32(&self) -> i32 {
        self.as_int64() as i32
    }

    /// Converts any node to an int64; non-numeric inputs yield 0. Strings
    /// parse their leading numeric prefix.
    pub fn as_int64(&self) -> i64 {
        match self {
            Node::String(s) => parse_integer_prefix(s),
            Node::Int32(v) => i64::from(*v),
            Node::Double(d) => *d as i64,
            Node::Int64(v) | Node::Timestamp(v) | Node::Datetime(v) => *v,
            Node::Boolean(b) => i64::from(*b),
            _ => 0,
        }
    }

    /// Converts any node to a uint64 by reinterpreting the int64 bits.
    pub fn as_uint64(&self) -> u64 {
        self.as_int64() as u64
    }

    /// Converts any node to a double; non-numeric inputs yield 0.0.
    pub fn as_double(&self) -> f64 {
        match self {
            Node::String(s) => parse_double_prefix(s),
            Node::Int32(v) => f64::from(*v),
            Node::Double(d) => *d,
            Node::Int64(v) | Node::Timestamp(v) | Node::Datetime(v) => *v as f64,
            Node::Boolean(b) => f64::from(u8::from(*b)),
            _ => 0.0,
        }
    }

    /// Converts any node to a boolean. Strings are true only for `"1"` and
    /// case-insensitive `"true"`; numbers are true when non-zero; everything
    /// else is false.
    pub fn as_boolean(&self) -> bool {
        match self {
            Node::String(s) => s.as_str() == "1" || s.eq_ignore_ascii_case("true"),
            Node::Int32(v) => *v != 0,
            Node::Double(d) => (*d as i64) != 0,
            Node::Int64(v) | Node::Timestamp(v) | Node::Datetime(v) => *v != 0,
            Node::Boolean(b) => *b,
            _ => false,
        }
    }

    /// Converts any node to a uuid. Binary uuid payloads of 16 bytes and
    /// parseable string forms convert; everything else is the nil uuid.
    pub fn as_uuid(&self) -> Uuid {
        match self {
            Node::Binary {
                subtype: BinarySubtype::Uuid,
                data,
            } if data.len() == 16 => {
                // Slice length checked above.
                let mut bytes = [0u8; 16];
                bytes.copy_from_slice(data.as_slice());
                Uuid::from_bytes(bytes)
            }
            Node::String(s) => parse_uuid(s).unwrap_or(Uuid::nil()),
            _ => Uuid::nil(),
        }
    }

    /// Renders this node as text: raw content for scalars, compact JSON for
    /// containers, base64 for binary (braced uuid form for uuid payloads).
    pub fn as_string(&self) -> String {
        crate::text::render::as_string(self)
    }

    /// Renders this node as indented JSON with lexicographically ordered
    /// keys.
    pub fn as_pretty_json(&self) -> String {
        crate::text::render::as_pretty_json(self)
    }

    // =========================================================================
    // Raw construction
    // =========================================================================

    /// Builds a node of type `t` from raw wire bytes, the decode complement
    /// of [`Node::to_binary`] for a single value.
    ///
    /// `bytes` may be `None` only for the null type and the two container
    /// types (yielding an empty container); a missing payload for any other
    /// type is a type error.
    pub fn from_bytes(t: NodeType, bytes: Option<&[u8]>) -> Result<Node, Error> {
        match bytes {
            Some(b) => Ok(crate::codec::decode_value(t, b)?),
            None => match t {
                NodeType::Null => Ok(Node::Null),
                NodeType::Document => Ok(Node::new_document()),
                NodeType::Array => Ok(Node::new_array()),
                other => Err(TypeError::new(NodeType::Null, other).into()),
            },
        }
    }

    /// Serializes this node to its exact wire form.
    pub fn to_binary(&self) -> Vec<u8> {
        crate::codec::encode_node(self)
    }

    /// Decodes an unparsed document payload in place, turning a
    /// `BinaryDocument` node into a regular document. A no-op for every
    /// other type.
    pub fn reify(&mut self) -> Result<(), DecodeError> {
        if let Node::BinaryDocument(bytes) = self {
            let parsed = crate::codec::decode_document(bytes.as_slice())?;
            *self = parsed;
        }
        Ok(())
    }
}

/// Number of decimal digits in an array index, i.e. the key length the
/// index occupies on the wire.
pub(crate) fn decimal_len(mut i: usize) -> usize {
    let mut len = 1;
    while i >= 10 {
        i /= 10;
        len += 1;
    }
    len
}

/// C `atol` semantics: optional sign and leading digits, ignoring anything
/// after the numeric prefix. Non-numeric input yields 0.
fn parse_integer_prefix(s: &str) -> i64 {
    let trimmed = s.trim_start();
    let mut end = 0;
    for (i, c) in trimmed.char_indices() {
        if (i == 0 && (c == '-' || c == '+')) || c.is_ascii_digit() {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    trimmed[..end].parse::<i64>().unwrap_or(0)
}

/// C `atof` semantics for the leading numeric prefix.
fn parse_double_prefix(s: &str) -> f64 {
    let trimmed = s.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in trimmed.char_indices() {
        if i == 0 && (c == '-' || c == '+') {
            end = i + 1;
        } else if c.is_ascii_digit() {
            end = i + 1;
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            end = i + 1;
        } else {
            break;
        }
    }
    trimmed[..end].parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id::{format_uuid, uuid_from_key};

    #[test]
    fn test_type_tags_roundtrip() {
        for t in [
            NodeType::Double,
            NodeType::String,
            NodeType::Document,
            NodeType::Array,
            NodeType::Binary,
            NodeType::BinaryDocument,
            NodeType::Boolean,
            NodeType::Datetime,
            NodeType::Null,
            NodeType::Javascript,
            NodeType::Int32,
            NodeType::Timestamp,
            NodeType::Int64,
            NodeType::MaxKey,
            NodeType::MinKey,
        ] {
            assert_eq!(NodeType::from_u8(t as u8), Some(t));
        }
        assert_eq!(NodeType::from_u8(0x42), None);
    }

    #[test]
    fn test_string_wire_size() {
        // 4-byte length + 12 characters + NUL.
        assert_eq!(Node::new_string("original foo").wire_size(), 17);
    }

    #[test]
    fn test_empty_container_wire_size() {
        assert_eq!(Node::new_document().wire_size(), 5);
        assert_eq!(Node::new_array().wire_size(), 5);
    }

    #[test]
    fn test_scalar_wire_sizes() {
        assert_eq!(Node::new_int32(1).wire_size(), 4);
        assert_eq!(Node::new_int64(1).wire_size(), 8);
        assert_eq!(Node::new_double(1.0).wire_size(), 8);
        assert_eq!(Node::new_timestamp(1).wire_size(), 8);
        assert_eq!(Node::new_boolean(true).wire_size(), 1);
        assert_eq!(Node::new_null().wire_size(), 0);
        assert_eq!(Node::new_binary(vec![1, 2, 3], BinarySubtype::Generic).wire_size(), 8);
    }

    #[test]
    fn test_array_wire_size_counts_index_keys() {
        let mut arr = Vec::new();
        for i in 0..11 {
            arr.push(Node::new_boolean(i % 2 == 0));
        }
        let node = Node::Array(arr);
        // 5 framing + 10 * (1 tag + 1 digit + 1 NUL + 1 payload)
        //           +  1 * (1 tag + 2 digits + 1 NUL + 1 payload)
        assert_eq!(node.wire_size(), 5 + 10 * 4 + 5);
        assert_eq!(node.to_binary().len(), node.wire_size());
    }

    #[test]
    fn test_string_conversions() {
        let n = Node::new_string("42abc");
        assert_eq!(n.as_int32(), 42);
        assert_eq!(n.as_int64(), 42);
        assert_eq!(n.as_double(), 42.0);

        assert_eq!(Node::new_string("-17").as_int64(), -17);
        assert_eq!(Node::new_string("3.5x").as_double(), 3.5);
        assert_eq!(Node::new_string("junk").as_int64(), 0);
        assert_eq!(Node::new_string("").as_double(), 0.0);
    }

    #[test]
    fn test_boolean_conversions() {
        assert!(Node::new_string("1").as_boolean());
        assert!(Node::new_string("true").as_boolean());
        assert!(Node::new_string("TRUE").as_boolean());
        assert!(Node::new_string("TrUe").as_boolean());
        assert!(!Node::new_string("0").as_boolean());
        assert!(!Node::new_string("").as_boolean());
        assert!(!Node::new_string("yes").as_boolean());
        assert!(Node::new_int32(-3).as_boolean());
        assert!(!Node::new_int64(0).as_boolean());
        assert!(!Node::new_null().as_boolean());
        assert!(!Node::new_document().as_boolean());
    }

    #[test]
    fn test_numeric_conversions_default_to_zero() {
        assert_eq!(Node::new_document().as_int64(), 0);
        assert_eq!(Node::new_array().as_int32(), 0);
        assert_eq!(Node::new_null().as_double(), 0.0);
        assert_eq!(
            Node::new_binary(vec![1], BinarySubtype::Generic).as_int64(),
            0
        );
    }

    #[test]
    fn test_uint64_bit_roundtrip() {
        let v = u64::MAX - 5;
        assert_eq!(Node::new_uint64(v).as_uint64(), v);
    }

    #[test]
    fn test_as_binary_type_error() {
        let err = Node::new_int32(1).as_binary().unwrap_err();
        assert_eq!(err.expected, NodeType::Binary);
        assert_eq!(err.found, NodeType::Int32);

        let err = Node::new_binary(vec![], BinarySubtype::Md5)
            .as_document()
            .unwrap_err();
        assert_eq!(err.subtype, Some(BinarySubtype::Md5));
    }

    #[test]
    fn test_uuid_conversion() {
        let id = uuid_from_key(1234);
        let node = Node::new_uuid(&id);
        assert_eq!(node.as_uuid(), id);

        let text = Node::new_string(format_uuid(&id));
        assert_eq!(text.as_uuid(), id);

        assert_eq!(Node::new_null().as_uuid(), Uuid::nil());
        assert_eq!(Node::new_int64(7).as_uuid(), Uuid::nil());
    }

    #[test]
    fn test_increment() {
        let mut n = Node::new_int32(5);
        n.increment(3);
        assert_eq!(n, Node::Int64(8));

        let mut fresh = Node::new_document();
        fresh.increment(1);
        assert_eq!(fresh, Node::Int64(1));
    }

    #[test]
    fn test_nullify() {
        let mut n = Node::new_string("secret");
        n.nullify();
        assert_eq!(n, Node::Null);
    }

    #[test]
    fn test_combine_overlays_documents() {
        let mut dst = Node::new_document();
        dst.set_child("a", Some(Node::new_int32(1))).unwrap();
        dst.set_child("nested/x", Some(Node::new_string("keep"))).unwrap();

        let mut src = Node::new_document();
        src.set_child("b", Some(Node::new_int32(2))).unwrap();
        src.set_child("nested/y", Some(Node::new_string("add"))).unwrap();

        dst.combine(&src);
        assert_eq!(dst.nav("a").unwrap().as_int32(), 1);
        assert_eq!(dst.nav("b").unwrap().as_int32(), 2);
        assert_eq!(dst.nav("nested/x").unwrap().as_string(), "keep");
        assert_eq!(dst.nav("nested/y").unwrap().as_string(), "add");
    }

    #[test]
    fn test_combine_replaces_scalars() {
        let mut dst = Node::new_int32(1);
        dst.combine(&Node::new_string("two"));
        assert_eq!(dst.as_string(), "two");
    }

    #[test]
    fn test_from_bytes_null_payload() {
        assert_eq!(Node::from_bytes(NodeType::Null, None).unwrap(), Node::Null);
        assert_eq!(
            Node::from_bytes(NodeType::Document, None).unwrap(),
            Node::new_document()
        );
        assert_eq!(
            Node::from_bytes(NodeType::Array, None).unwrap(),
            Node::new_array()
        );
        assert!(Node::from_bytes(NodeType::Int32, None).is_err());
        assert!(Node::from_bytes(NodeType::String, None).is_err());
    }

    #[test]
    fn test_default_is_empty_document() {
        let n = Node::default();
        assert_eq!(n.node_type(), NodeType::Document);
        assert!(!n.has_content());
    }

    #[test]
    fn test_decimal_len() {
        assert_eq!(decimal_len(0), 1);
        assert_eq!(decimal_len(9), 1);
        assert_eq!(decimal_len(10), 2);
        assert_eq!(decimal_len(99), 2);
        assert_eq!(decimal_len(100), 3);
    }
}
