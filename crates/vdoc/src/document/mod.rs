//! Versioned document envelopes.
//!
//! A [`Document`] wraps a root [`Node`] with a fixed top-level shape:
//!
//! ```text
//! {
//!   "_" : {
//!     "parent" : uuid | null,        // previous revision
//!     "vclock" : { server: counter },
//!     "flag"   : { "suppressed": bool },
//!     "key"    : uint64 | null,
//!     "id"     : uuid | null         // current revision
//!   },
//!   "version" : 100,
//!   "." : { ... }                    // user data
//! }
//! ```
//!
//! The wrapper tracks a dirty flag. The first mutation after a
//! [`Document::wash`] advances the revision: the old id becomes the parent,
//! a fresh key-derived id is minted, and the acting server's vector-clock
//! counter is incremented. Further mutations while dirty are pass-throughs.
//!
//! Field-level encryption lives in the same envelope; see
//! [`Document::encrypt`] and [`Document::decrypt`].

mod crypto;

pub use crypto::{EncryptionKey, KEY_LEN, NONCE_LEN, TAG_LEN};

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use uuid::Uuid;

use crate::error::{Error, PathError};
use crate::model::{escape_path, format_uuid, uuid_from_key, Node};
use crate::text::as_pretty_json;

/// The fixed format version stamped into every document.
pub const DOCUMENT_VERSION: i32 = 100;

/// A versioned, dirty-tracked envelope around a root node.
///
/// Documents cannot be copied; [`Document::branch`] is the only sanctioned
/// duplication and produces a child revision.
#[derive(Debug)]
pub struct Document {
    root: Node,
    dirty: bool,
}

fn seeded_root() -> Node {
    let mut flags = BTreeMap::new();
    flags.insert("suppressed".to_string(), Node::new_boolean(false));

    let mut meta = BTreeMap::new();
    meta.insert("parent".to_string(), Node::new_null());
    meta.insert("vclock".to_string(), Node::new_document());
    meta.insert("flag".to_string(), Node::Document(flags));
    meta.insert("key".to_string(), Node::new_null());
    meta.insert("id".to_string(), Node::new_null());

    let mut root = BTreeMap::new();
    root.insert("_".to_string(), Node::Document(meta));
    root.insert("version".to_string(), Node::new_int32(DOCUMENT_VERSION));
    root.insert(".".to_string(), Node::new_document());
    Node::Document(root)
}

impl Document {
    /// Creates a fresh document with default metadata. The new document is
    /// dirty until first washed.
    pub fn new() -> Document {
        Document {
            root: seeded_root(),
            dirty: true,
        }
    }

    /// Wraps an existing node.
    ///
    /// With `is_document` true, `node` is taken as a complete envelope
    /// (metadata included) and is not re-seeded; the result starts clean.
    /// Otherwise `node` becomes the user-data section of a freshly seeded
    /// envelope.
    pub fn wrap(node: Node, is_document: bool) -> Document {
        if is_document {
            Document {
                root: node,
                dirty: false,
            }
        } else {
            let mut doc = Document::new();
            if let Node::Document(children) = &mut doc.root {
                children.insert(".".to_string(), node);
            }
            doc
        }
    }

    // =========================================================================
    // Metadata accessors
    // =========================================================================

    /// The parent revision id, or the nil uuid for a root revision.
    pub fn parent(&self) -> Uuid {
        self.root
            .path("_/parent")
            .map(Node::as_uuid)
            .unwrap_or_else(Uuid::nil)
    }

    /// The current revision id.
    pub fn id(&self) -> Uuid {
        self.root
            .path("_/id")
            .map(Node::as_uuid)
            .unwrap_or_else(Uuid::nil)
    }

    /// The numeric document key.
    pub fn key(&self) -> u64 {
        self.root.path("_/key").map(Node::as_uint64).unwrap_or(0)
    }

    /// The document format version.
    pub fn version(&self) -> i32 {
        self.root.path("version").map(Node::as_int32).unwrap_or(0)
    }

    /// The soft-delete flag.
    pub fn suppressed(&self) -> bool {
        self.root
            .path("_/flag/suppressed")
            .map(Node::as_boolean)
            .unwrap_or(false)
    }

    /// The per-writer vector clock.
    pub fn vclock(&self) -> Result<&Node, PathError> {
        self.root.nav("_/vclock")
    }

    /// True if the document has been mutated since the last wash.
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// The user-data section.
    pub fn get(&self) -> Result<&Node, PathError> {
        self.root.nav(".")
    }

    /// A node inside the user-data section.
    pub fn get_path(&self, path: &str) -> Result<&Node, PathError> {
        self.root.nav(".")?.nav(path)
    }

    /// The complete envelope, for serialization.
    pub fn as_node(&self) -> &Node {
        &self.root
    }

    /// Consumes the wrapper, yielding the envelope.
    pub fn into_node(self) -> Node {
        self.root
    }

    // =========================================================================
    // Revision tracking
    // =========================================================================

    /// Clears the dirty flag, treating the document as unmodified. The next
    /// mutation will advance the revision again.
    pub fn wash(&mut self) {
        self.dirty = false;
    }

    /// Marks the document dirty. On the clean-to-dirty transition the
    /// revision advances: parent takes the old id, a fresh key-derived id is
    /// minted, and the server's vclock counter is incremented.
    fn taint(&mut self, server: &Uuid) -> Result<(), PathError> {
        if !self.dirty {
            self.dirty = true;
            debug!(
                "advancing revision for document key {} on behalf of {server}",
                self.key()
            );

            let old_id = self
                .root
                .path("_/id")
                .cloned()
                .unwrap_or_else(Node::new_null);
            let new_id = uuid_from_key(self.key());
            self.root.set_child("_/parent", Some(old_id))?;
            self.root.set_child("_/id", Some(Node::new_uuid(&new_id)))?;

            let counter = format!("_/vclock/{}", escape_path(&format_uuid(server)));
            self.root.path_mut(&counter)?.increment(1);
        }
        Ok(())
    }

    /// Rewrites the numeric key and revision id. The vclock resets only if
    /// the key actually changed; rekeying to the same key keeps it.
    pub fn rekey(&mut self, server: &Uuid, new_key: u64) -> Result<(), Error> {
        let old_key = self.key();

        // Parent relationships update in taint.
        self.taint(server)?;
        self.root
            .set_child("_/key", Some(Node::new_uint64(new_key)))?;
        self.root
            .set_child("_/id", Some(Node::new_uuid(&uuid_from_key(new_key))))?;

        if new_key != old_key {
            self.root.set_child("_/vclock", Some(Node::new_document()))?;
        }
        debug!("rekeyed document {old_key} -> {new_key}");
        Ok(())
    }

    /// Deep-copies this document into an independent sibling revision under
    /// a new key, whose parent pointer names this document's current
    /// revision.
    pub fn branch(&self, server: &Uuid, new_key: u64) -> Result<Document, Error> {
        let mut child = Document {
            root: self.root.clone(),
            dirty: false,
        };
        child.rekey(server, new_key)?;
        Ok(child)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Sets a value in the user-data section.
    pub fn set(&mut self, server: &Uuid, path: &str, value: Node) -> Result<(), Error> {
        self.taint(server)?;
        self.root.path_mut(".")?.set_child(path, Some(value))?;
        Ok(())
    }

    /// Removes a value from the user-data section.
    pub fn remove(&mut self, server: &Uuid, path: &str) -> Result<(), Error> {
        self.taint(server)?;
        self.root.path_mut(".")?.set_child(path, None)?;
        Ok(())
    }

    /// Appends a value to an array in the user-data section.
    pub fn push(&mut self, server: &Uuid, path: &str, value: Node) -> Result<(), Error> {
        self.taint(server)?;
        self.root.path_mut(".")?.push_child(path, value)?;
        Ok(())
    }

    /// Adds `amount` to an integer in the user-data section, creating it
    /// from zero if absent.
    pub fn increment(&mut self, server: &Uuid, path: &str, amount: i64) -> Result<(), Error> {
        self.taint(server)?;
        self.root.path_mut(".")?.path_mut(path)?.increment(amount);
        Ok(())
    }

    /// Sets the soft-delete flag.
    pub fn suppress(&mut self, server: &Uuid, flag: bool) -> Result<(), Error> {
        self.taint(server)?;
        self.root
            .set_child("_/flag/suppressed", Some(Node::new_boolean(flag)))?;
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&as_pretty_json(&self.root))
    }
}
