//! Text rendering of [`Node`] trees.
//!
//! Three forms: the compact string form, an indented pretty form, and a
//! byte-annotated debug form for diagnostics. Keys come out in
//! lexicographic order because the underlying map is ordered.

use base64::prelude::*;

use crate::codec::decode_document;
use crate::model::id::format_uuid;
use crate::model::{BinarySubtype, Node};

/// Escapes backslash and double-quote characters for embedding in quotes.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn scalar_text(node: &Node) -> String {
    match node {
        Node::String(s) => s.to_string(),
        Node::Int32(v) => v.to_string(),
        Node::Int64(v) | Node::Timestamp(v) | Node::Datetime(v) => v.to_string(),
        Node::Double(d) => d.to_string(),
        Node::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
        Node::Null => "null".to_string(),
        Node::Binary { subtype, data } => {
            if *subtype == BinarySubtype::Uuid && data.len() == 16 {
                // Checked length above.
                let mut bytes = [0u8; 16];
                bytes.copy_from_slice(data.as_slice());
                format_uuid(&uuid::Uuid::from_bytes(bytes))
            } else {
                BASE64_STANDARD.encode(data.as_slice())
            }
        }
        // Containers are handled by the callers.
        _ => String::new(),
    }
}

/// Renders a node as text: raw content for scalars, compact JSON for
/// containers. String children inside containers are quoted and escaped.
pub fn as_string(node: &Node) -> String {
    match node {
        Node::Document(children) => {
            if children.is_empty() {
                return "{}".to_string();
            }
            let mut out = String::from("{");
            for (i, (key, child)) in children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push('"');
                out.push_str(&escape_string(key));
                out.push_str("\":");
                push_compact(&mut out, child);
            }
            out.push('}');
            out
        }
        Node::Array(items) => {
            if items.is_empty() {
                return "[]".to_string();
            }
            let mut out = String::from("[");
            for (i, child) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_compact(&mut out, child);
            }
            out.push(']');
            out
        }
        Node::BinaryDocument(bytes) => decode_document(bytes.as_slice())
            .map(|doc| as_string(&doc))
            .unwrap_or_default(),
        scalar => scalar_text(scalar),
    }
}

fn push_compact(out: &mut String, child: &Node) {
    if child.node_type().is_quotable() {
        out.push('"');
        out.push_str(&escape_string(&as_string(child)));
        out.push('"');
    } else {
        out.push_str(&as_string(child));
    }
}

/// Renders a node as indented JSON-like text, two spaces per level.
/// Container children without content are skipped. The output of any tree
/// the text parser can produce re-parses to an equivalent tree.
pub fn as_pretty_json(node: &Node) -> String {
    pretty_value(node, 0)
}

fn pretty_value(node: &Node, level: usize) -> String {
    if node.node_type().is_quotable() {
        return format!("\"{}\"", escape_string(&scalar_text(node)));
    }
    match node {
        Node::Document(children) => {
            let present: Vec<_> = children
                .iter()
                .filter(|(_, child)| child.has_content())
                .collect();
            if present.is_empty() {
                return "{}".to_string();
            }
            let indent = "  ".repeat(level);
            let mut out = String::from("{\n");
            for (i, (key, child)) in present.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                out.push_str(&indent);
                out.push_str("  \"");
                out.push_str(&escape_string(key));
                out.push_str("\":");
                out.push_str(&pretty_value(child, level + 1));
            }
            out.push('\n');
            out.push_str(&indent);
            out.push('}');
            out
        }
        Node::Array(items) => {
            let present: Vec<_> = items.iter().filter(|child| child.has_content()).collect();
            if present.is_empty() {
                return "[]".to_string();
            }
            let indent = "  ".repeat(level);
            let mut out = String::from("[\n");
            for (i, child) in present.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                out.push_str(&indent);
                out.push_str("  ");
                out.push_str(&pretty_value(child, level + 1));
            }
            out.push('\n');
            out.push_str(&indent);
            out.push(']');
            out
        }
        Node::BinaryDocument(bytes) => decode_document(bytes.as_slice())
            .map(|doc| pretty_value(&doc, level))
            .unwrap_or_default(),
        scalar => scalar_text(scalar),
    }
}

/// Renders a node in the byte-annotated debug form, with field lengths
/// called out the way they appear on the wire.
pub fn as_debug_string(node: &Node) -> String {
    match node {
        Node::String(s) => format!("(4-{}){}", s.len() + 1, s.as_str()),
        Node::Binary { subtype, data } => format!(
            "(4-{})(1-{}){}",
            data.len(),
            subtype.name(),
            BASE64_STANDARD.encode(data.as_slice())
        ),
        Node::Int32(v) => format!("(4){v}"),
        Node::Double(d) => format!("(8){d}"),
        Node::Int64(v) | Node::Timestamp(v) | Node::Datetime(v) => format!("(8){v}"),
        Node::Boolean(b) => format!("(1){}", u8::from(*b)),
        Node::Null => String::new(),
        Node::Document(_) | Node::Array(_) => {
            let children: Vec<(String, &Node)> = match node {
                Node::Document(m) => m.iter().map(|(k, v)| (k.clone(), v)).collect(),
                Node::Array(v) => v
                    .iter()
                    .enumerate()
                    .map(|(i, child)| (i.to_string(), child))
                    .collect(),
                _ => Vec::new(),
            };
            if children.is_empty() {
                return "{(4-0)(1-0)}".to_string();
            }
            let mut out = format!("{{(4-{})", node.wire_size());
            for (i, (key, child)) in children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&format!(
                    "(1-{})\"({}){}\":",
                    child.node_type().name(),
                    key.len() + 1,
                    escape_string(key)
                ));
                if child.node_type().is_quotable() {
                    out.push('"');
                    out.push_str(&as_debug_string(child));
                    out.push('"');
                } else {
                    out.push_str(&as_debug_string(child));
                }
            }
            out.push_str("(1-0)}");
            out
        }
        Node::BinaryDocument(bytes) => decode_document(bytes.as_slice())
            .map(|doc| as_debug_string(&doc))
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id::uuid_from_key;
    use crate::text::parse_json;
    use proptest::prelude::*;

    #[test]
    fn test_compact_scalars() {
        assert_eq!(as_string(&Node::new_string("hi")), "hi");
        assert_eq!(as_string(&Node::new_int32(-4)), "-4");
        assert_eq!(as_string(&Node::new_int64(12)), "12");
        assert_eq!(as_string(&Node::new_boolean(true)), "1");
        assert_eq!(as_string(&Node::new_boolean(false)), "0");
        assert_eq!(as_string(&Node::new_null()), "null");
        assert_eq!(as_string(&Node::new_double(3.25)), "3.25");
    }

    #[test]
    fn test_compact_containers() {
        assert_eq!(as_string(&Node::new_document()), "{}");
        assert_eq!(as_string(&Node::new_array()), "[]");

        let mut doc = Node::new_document();
        doc.set_child("b", Some(Node::new_string("x"))).unwrap();
        doc.set_child("a", Some(Node::new_int64(1))).unwrap();
        // Keys are ordered lexicographically regardless of insertion order.
        assert_eq!(as_string(&doc), "{\"a\":1,\"b\":\"x\"}");
    }

    #[test]
    fn test_key_and_value_escaping() {
        let mut doc = Node::new_document();
        doc.set_child("k", Some(Node::new_string("say \"hi\"\\")))
            .unwrap();
        assert_eq!(as_string(&doc), "{\"k\":\"say \\\"hi\\\"\\\\\"}");
    }

    #[test]
    fn test_binary_renders_as_base64() {
        let node = Node::new_binary(vec![0xDE, 0xAD, 0xBE, 0xEF], BinarySubtype::Generic);
        assert_eq!(as_string(&node), "3q2+7w==");
    }

    #[test]
    fn test_uuid_binary_renders_as_uuid_text() {
        let id = uuid_from_key(77);
        let node = Node::new_uuid(&id);
        assert_eq!(as_string(&node), format_uuid(&id));
        assert!(as_string(&node).starts_with('{'));
    }

    #[test]
    fn test_pretty_shape() {
        let doc = parse_json("{\"a\": 1, \"nested\": {\"b\": \"two\"}}").unwrap();
        assert_eq!(
            as_pretty_json(&doc),
            "{\n  \"a\":1,\n  \"nested\":{\n    \"b\":\"two\"\n  }\n}"
        );
    }

    #[test]
    fn test_pretty_skips_empty_children() {
        let mut doc = Node::new_document();
        doc.set_child("real", Some(Node::new_int32(1))).unwrap();
        doc.set_child("ghost", Some(Node::new_document())).unwrap();
        assert_eq!(as_pretty_json(&doc), "{\n  \"real\":1\n}");
    }

    #[test]
    fn test_pretty_array() {
        let arr = parse_json("[1, \"x\"]").unwrap();
        assert_eq!(as_pretty_json(&arr), "[\n  1,\n  \"x\"\n]");
    }

    #[test]
    fn test_debug_string() {
        assert_eq!(as_debug_string(&Node::new_string("abc")), "(4-4)abc");
        assert_eq!(as_debug_string(&Node::new_int32(7)), "(4)7");
        assert_eq!(as_debug_string(&Node::new_boolean(true)), "(1)1");
        assert_eq!(as_debug_string(&Node::new_document()), "{(4-0)(1-0)}");

        let mut doc = Node::new_document();
        doc.set_child("k", Some(Node::new_string("v"))).unwrap();
        assert_eq!(
            as_debug_string(&doc),
            format!("{{(4-{})(1-string)\"(2)k\":\"(4-2)v\"(1-0)}}", doc.wire_size())
        );
    }

    #[test]
    fn test_unparsed_document_renders_decoded() {
        let mut inner = Node::new_document();
        inner.set_child("x", Some(Node::new_int32(9))).unwrap();
        let blob = crate::codec::decode_value(
            crate::model::NodeType::BinaryDocument,
            &inner.to_binary(),
        )
        .unwrap();
        assert_eq!(as_string(&blob), "{\"x\":9}");
    }

    // A tree the text parser could have produced: no empty containers below
    // the root, only parser-expressible leaf types.
    fn arb_parseable() -> impl Strategy<Value = Node> {
        let leaf = prop_oneof![
            "[ -~]{0,16}".prop_map(Node::new_string),
            any::<i64>().prop_map(Node::new_int64),
            any::<bool>().prop_map(Node::new_boolean),
            Just(Node::new_null()),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::btree_map("[a-z]{1,6}", inner.clone(), 1..4)
                    .prop_map(Node::Document),
                prop::collection::vec(inner, 1..4).prop_map(Node::Array),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_pretty_reparses_equivalent(node in arb_parseable()) {
            let pretty = as_pretty_json(&node);
            let reparsed = parse_json(&pretty).unwrap();
            prop_assert_eq!(as_string(&reparsed), as_string(&node));
        }
    }
}
