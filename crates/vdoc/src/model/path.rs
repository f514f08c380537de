//! Slash-delimited path navigation over [`Node`] trees.
//!
//! A path is a `/`-separated list of segments. Documents resolve segments
//! by key, arrays by decimal index. Literal `/` and `\` characters inside a
//! segment are escaped as `\/` and `\\`; empty segments are skipped, so
//! `a//b` and `a/b` name the same node.
//!
//! Mutable navigation creates missing intermediate documents on demand
//! (auto-vivification). Const navigation never creates and reports what it
//! could not resolve.

use crate::error::PathError;
use crate::model::node::{Node, NodeType};

/// Splits a path into unescaped segments.
pub fn split_path(path: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '/' => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                // A trailing backslash stands for itself.
                None => current.push('\\'),
            },
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Escapes a literal key so it survives [`split_path`] as one segment.
pub fn escape_path(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        if c == '/' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

impl Node {
    /// Resolves a path without creating anything. Returns `None` if any
    /// segment cannot be resolved.
    pub fn path(&self, path: &str) -> Option<&Node> {
        self.walk(path).ok()
    }

    /// Resolves a path without creating anything, reporting why resolution
    /// failed.
    pub fn nav(&self, path: &str) -> Result<&Node, PathError> {
        self.walk(path)
    }

    /// Resolves a path for mutation, creating missing intermediate
    /// documents. Fails only inside arrays (non-numeric segment or index
    /// out of bounds) or on an unreadable unparsed document.
    pub fn path_mut(&mut self, path: &str) -> Result<&mut Node, PathError> {
        let segments = split_path(path);
        self.walk_mut(&segments, path)
    }

    /// Alias for [`Node::path_mut`], matching the const [`Node::nav`].
    pub fn nav_mut(&mut self, path: &str) -> Result<&mut Node, PathError> {
        self.path_mut(path)
    }

    /// True iff const resolution of the path succeeds.
    pub fn exists(&self, path: &str) -> bool {
        self.walk(path).is_ok()
    }

    fn walk(&self, path: &str) -> Result<&Node, PathError> {
        let mut current = self;
        for segment in split_path(path) {
            current = match current {
                Node::Array(items) => {
                    let index =
                        parse_index(&segment).ok_or_else(|| PathError::InvalidIndex {
                            path: path.to_string(),
                            segment: segment.clone(),
                        })?;
                    items.get(index).ok_or_else(|| PathError::IndexOutOfBounds {
                        path: path.to_string(),
                        index,
                        len: items.len(),
                    })?
                }
                Node::Document(children) => {
                    children.get(&segment).ok_or_else(|| PathError::NotFound {
                        path: path.to_string(),
                    })?
                }
                // Scalars and unparsed documents have no resolvable children.
                _ => {
                    return Err(PathError::NotFound {
                        path: path.to_string(),
                    });
                }
            };
        }
        Ok(current)
    }

    fn walk_mut(&mut self, segments: &[String], path: &str) -> Result<&mut Node, PathError> {
        let mut current = self;
        for segment in segments {
            if current.node_type() == NodeType::BinaryDocument {
                current.reify().map_err(|source| PathError::UnreadableChild {
                    path: path.to_string(),
                    source,
                })?;
            }
            current = match current {
                Node::Array(items) => {
                    let index =
                        parse_index(segment).ok_or_else(|| PathError::InvalidIndex {
                            path: path.to_string(),
                            segment: segment.clone(),
                        })?;
                    let len = items.len();
                    items
                        .get_mut(index)
                        .ok_or(PathError::IndexOutOfBounds {
                            path: path.to_string(),
                            index,
                            len,
                        })?
                }
                node => {
                    if !matches!(node, Node::Document(_)) {
                        // A scalar in the middle of a mutable walk becomes
                        // an empty document so the walk can continue.
                        *node = Node::new_document();
                    }
                    match node {
                        Node::Document(children) => children
                            .entry(segment.clone())
                            .or_insert_with(Node::new_document),
                        _ => unreachable!("node was just replaced with a document"),
                    }
                }
            };
        }
        Ok(current)
    }

    /// Sets or removes the child named by the last path segment, creating
    /// intermediate documents along the way. `None` removes the child. A
    /// path with no segments is a no-op.
    ///
    /// The direct parent must not be an array; use [`Node::push_child`] or
    /// an index segment through [`Node::path_mut`] for array mutation.
    pub fn set_child(&mut self, path: &str, child: Option<Node>) -> Result<(), PathError> {
        let mut segments = split_path(path);
        let Some(name) = segments.pop() else {
            return Ok(());
        };
        let parent = self.walk_mut(&segments, path)?;
        if parent.node_type() == NodeType::BinaryDocument {
            parent.reify().map_err(|source| PathError::UnreadableChild {
                path: path.to_string(),
                source,
            })?;
        }
        match parent {
            Node::Array(_) => Err(PathError::WrongType {
                path: path.to_string(),
                expected: NodeType::Document,
                found: NodeType::Array,
            }),
            node => {
                if !matches!(node, Node::Document(_)) {
                    *node = Node::new_document();
                }
                match node {
                    Node::Document(children) => {
                        match child {
                            Some(c) => {
                                children.insert(name, c);
                            }
                            None => {
                                children.remove(&name);
                            }
                        }
                        Ok(())
                    }
                    _ => unreachable!("node was just replaced with a document"),
                }
            }
        }
    }

    /// Appends a child to the array at the path, creating intermediate
    /// documents along the way. A childless document at the target (such as
    /// a freshly vivified placeholder) is converted to an array; any other
    /// non-array target is a type error.
    pub fn push_child(&mut self, path: &str, child: Node) -> Result<(), PathError> {
        let target = self.path_mut(path)?;
        if target.node_type() == NodeType::BinaryDocument {
            target.reify().map_err(|source| PathError::UnreadableChild {
                path: path.to_string(),
                source,
            })?;
        }
        if matches!(target, Node::Document(children) if children.is_empty()) {
            *target = Node::Array(vec![child]);
            return Ok(());
        }
        match target {
            Node::Array(items) => {
                items.push(child);
                Ok(())
            }
            other => Err(PathError::WrongType {
                path: path.to_string(),
                expected: NodeType::Array,
                found: other.node_type(),
            }),
        }
    }
}
