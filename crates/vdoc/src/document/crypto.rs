//! Field-level document encryption.
//!
//! Selected sub-paths (or the whole user-data section) are serialized to
//! their wire form and sealed with AES-256-GCM under a fresh random
//! 96-bit nonce. Ciphertext, nonce, and authentication tag are stored in
//! side sections of the envelope, keyed by a caller-chosen name, and the
//! plaintext fields are removed:
//!
//! - `#/<name>` — ciphertext
//! - `_/encrypted/vector/<name>` — nonce
//! - `_/encrypted/auth/<name>` — authentication tag
//!
//! Decryption authenticates first and merges the recovered fields back
//! with a recursive overlay, so sibling fields written since encryption
//! survive. A failed authentication leaves the document untouched.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::prelude::*;
use log::debug;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::codec::{decode_document, encode_node};
use crate::document::Document;
use crate::error::{CryptoError, Error};
use crate::model::{escape_path, BinarySubtype, Node};

/// Required key size: 256 bits.
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce size.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag size.
pub const TAG_LEN: usize = 16;

const DATA_SECTION: &str = "#";
const NONCE_SECTION: &str = "_/encrypted/vector";
const TAG_SECTION: &str = "_/encrypted/auth";

/// A 256-bit document encryption key.
///
/// Key material is zeroized on drop and never exposed through `Debug`.
pub struct EncryptionKey {
    bytes: KeyBytes,
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct KeyBytes([u8; KEY_LEN]);

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl EncryptionKey {
    /// Creates a key from exactly 32 bytes of material.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            bytes: KeyBytes(bytes),
        }
    }

    /// Creates a key from a byte slice, rejecting anything that is not
    /// exactly 256 bits.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKeyLength { len: bytes.len() });
        }
        let mut material = [0u8; KEY_LEN];
        material.copy_from_slice(bytes);
        Ok(Self::new(material))
    }

    /// Creates a key from base64 text (standard or URL-safe alphabet).
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let mut decoded = BASE64_STANDARD
            .decode(encoded.trim())
            .or_else(|_| BASE64_URL_SAFE.decode(encoded.trim()))
            .map_err(|_| CryptoError::InvalidKeyEncoding)?;
        let key = Self::from_bytes(&decoded);
        decoded.zeroize();
        key
    }

    fn expose_secret(&self) -> &[u8; KEY_LEN] {
        &self.bytes.0
    }
}

fn section_bytes<'a>(
    root: &'a Node,
    path: &str,
    section: &'static str,
    key_name: &str,
) -> Result<&'a [u8], CryptoError> {
    let node = root.path(path).ok_or_else(|| CryptoError::MalformedSection {
        section,
        key_name: key_name.to_string(),
        context: "missing",
    })?;
    let (_, bytes) = node.as_binary().map_err(|_| CryptoError::MalformedSection {
        section,
        key_name: key_name.to_string(),
        context: "not a binary node",
    })?;
    Ok(bytes)
}

impl Document {
    /// Encrypts part of the user-data section under `key_name`.
    ///
    /// With an empty `paths` list the entire user-data section is sealed;
    /// otherwise only the listed sub-paths are. The plaintext fields are
    /// removed after the ciphertext is in place, so a missing path fails
    /// before the document is touched.
    pub fn encrypt(
        &mut self,
        server: &Uuid,
        key: &EncryptionKey,
        key_name: &str,
        paths: &[&str],
    ) -> Result<(), Error> {
        // Copy out the plaintext; the document stays unmodified until the
        // ciphertext is ready.
        let mut extracted = Node::new_document();
        if paths.is_empty() {
            let data = self.get()?.clone();
            extracted.set_child(".", Some(data))?;
        } else {
            for path in paths {
                let node = self.get_path(path)?.clone();
                extracted.path_mut(".")?.set_child(path, Some(node))?;
            }
        }
        let plaintext = Zeroizing::new(encode_node(&extracted));

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose_secret()));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut ciphertext = cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|_| CryptoError::EncryptFailed)?;
        let tag = ciphertext.split_off(ciphertext.len() - TAG_LEN);

        // The encrypted sections go in before any plaintext is removed.
        self.taint(server)?;
        let name = escape_path(key_name);
        self.root.set_child(
            &format!("{DATA_SECTION}/{name}"),
            Some(Node::new_binary(ciphertext, BinarySubtype::UserDefined)),
        )?;
        self.root.set_child(
            &format!("{TAG_SECTION}/{name}"),
            Some(Node::new_binary(tag, BinarySubtype::UserDefined)),
        )?;
        self.root.set_child(
            &format!("{NONCE_SECTION}/{name}"),
            Some(Node::new_binary(nonce.to_vec(), BinarySubtype::UserDefined)),
        )?;

        if paths.is_empty() {
            self.root.set_child(".", Some(Node::new_document()))?;
        } else {
            for path in paths {
                self.root.path_mut(".")?.set_child(path, None)?;
            }
        }
        debug!("encrypted {} path(s) under {key_name:?}", paths.len().max(1));
        Ok(())
    }

    /// Decrypts the fields sealed under `key_name` and merges them back
    /// into the user-data section, then removes the encrypted sections.
    ///
    /// Authentication failure (wrong key, corrupted ciphertext, tampered
    /// nonce or tag) leaves the document exactly as it was. Decryption does
    /// not count as a mutation: the revision does not advance.
    pub fn decrypt(&mut self, key: &EncryptionKey, key_name: &str) -> Result<(), Error> {
        let name = escape_path(key_name);
        let ct_path = format!("{DATA_SECTION}/{name}");
        let nonce_path = format!("{NONCE_SECTION}/{name}");
        let tag_path = format!("{TAG_SECTION}/{name}");

        let ciphertext = section_bytes(&self.root, &ct_path, "#", key_name)?.to_vec();
        let nonce_bytes = section_bytes(&self.root, &nonce_path, "_/encrypted/vector", key_name)?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(CryptoError::MalformedSection {
                section: "_/encrypted/vector",
                key_name: key_name.to_string(),
                context: "the wrong length",
            }
            .into());
        }
        let tag = section_bytes(&self.root, &tag_path, "_/encrypted/auth", key_name)?;
        if tag.len() != TAG_LEN {
            return Err(CryptoError::MalformedSection {
                section: "_/encrypted/auth",
                key_name: key_name.to_string(),
                context: "the wrong length",
            }
            .into());
        }

        let mut sealed = ciphertext;
        sealed.extend_from_slice(tag);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose_secret()));
        let plaintext = Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(nonce_bytes), sealed.as_slice())
                .map_err(|_| CryptoError::DecryptFailed)?,
        );

        // Nothing in the document changes until the payload has fully
        // authenticated and decoded.
        let changes = decode_document(&plaintext)?;
        let Some(recovered) = changes.path(".") else {
            return Err(CryptoError::MalformedSection {
                section: "#",
                key_name: key_name.to_string(),
                context: "missing its data section",
            }
            .into());
        };

        self.root.path_mut(".")?.combine(recovered);

        self.root.set_child(&ct_path, None)?;
        self.root.set_child(&tag_path, None)?;
        self.root.set_child(&nonce_path, None)?;
        debug!("decrypted fields under {key_name:?}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::uuid_from_key;

    const TEST_KEY: [u8; KEY_LEN] = [0x42; KEY_LEN];

    fn server() -> Uuid {
        uuid_from_key(0xFEED)
    }

    fn sample_doc() -> Document {
        let s = server();
        let mut doc = Document::new();
        doc.rekey(&s, 11).unwrap();
        doc.set(&s, "str", Node::new_string("Some string."))
            .unwrap();
        doc.set(&s, "bool/false", Node::new_boolean(false)).unwrap();
        doc.set(&s, "bool/true", Node::new_boolean(true)).unwrap();
        doc.set(&s, "number", Node::new_int64(42)).unwrap();
        doc.wash();
        doc
    }

    #[test]
    fn test_key_from_bytes_enforces_length() {
        assert!(EncryptionKey::from_bytes(&[0u8; 32]).is_ok());
        assert!(matches!(
            EncryptionKey::from_bytes(&[0u8; 16]),
            Err(CryptoError::InvalidKeyLength { len: 16 })
        ));
        assert!(matches!(
            EncryptionKey::from_bytes(&[0u8; 33]),
            Err(CryptoError::InvalidKeyLength { len: 33 })
        ));
    }

    #[test]
    fn test_key_from_base64() {
        let encoded = BASE64_STANDARD.encode(TEST_KEY);
        let key = EncryptionKey::from_base64(&encoded).unwrap();
        assert_eq!(key.expose_secret(), &TEST_KEY);

        assert!(matches!(
            EncryptionKey::from_base64("not base64!!!"),
            Err(CryptoError::InvalidKeyEncoding)
        ));
        // Valid base64, wrong length.
        assert!(matches!(
            EncryptionKey::from_base64("AQID"),
            Err(CryptoError::InvalidKeyLength { .. })
        ));
    }

    #[test]
    fn test_key_debug_redacts_material() {
        let key = EncryptionKey::new(TEST_KEY);
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("42"));
    }

    #[test]
    fn test_encrypt_selected_paths_roundtrip() {
        let s = server();
        let key = EncryptionKey::new(TEST_KEY);
        let mut doc = sample_doc();

        doc.encrypt(&s, &key, "secrets", &["str", "bool/false"])
            .unwrap();

        // Encrypted fields disappear from user-data access.
        assert!(!doc.get().unwrap().exists("str"));
        assert!(!doc.get().unwrap().exists("bool/false"));
        // Siblings survive.
        assert!(doc.get_path("bool/true").unwrap().as_boolean());
        assert_eq!(doc.get_path("number").unwrap().as_int64(), 42);
        // Ciphertext sections are in place.
        assert!(doc.as_node().exists("#/secrets"));
        assert!(doc.as_node().exists("_/encrypted/vector/secrets"));
        assert!(doc.as_node().exists("_/encrypted/auth/secrets"));

        doc.decrypt(&key, "secrets").unwrap();

        assert_eq!(doc.get_path("str").unwrap().as_string(), "Some string.");
        assert!(!doc.get_path("bool/false").unwrap().as_boolean());
        assert!(doc.get_path("bool/true").unwrap().as_boolean());
        // Sections are cleaned up.
        assert!(!doc.as_node().exists("#/secrets"));
        assert!(!doc.as_node().exists("_/encrypted/vector/secrets"));
        assert!(!doc.as_node().exists("_/encrypted/auth/secrets"));
    }

    #[test]
    fn test_encrypt_whole_document_roundtrip() {
        let s = server();
        let key = EncryptionKey::new(TEST_KEY);
        let mut doc = sample_doc();

        doc.encrypt(&s, &key, "all", &[]).unwrap();
        assert!(!doc.get().unwrap().has_content());
        assert!(!doc.get().unwrap().exists("number"));

        doc.decrypt(&key, "all").unwrap();
        assert_eq!(doc.get_path("str").unwrap().as_string(), "Some string.");
        assert_eq!(doc.get_path("number").unwrap().as_int64(), 42);
    }

    #[test]
    fn test_decrypt_merges_over_later_writes() {
        let s = server();
        let key = EncryptionKey::new(TEST_KEY);
        let mut doc = sample_doc();

        doc.encrypt(&s, &key, "secrets", &["str"]).unwrap();
        // A sibling written after encryption must survive the merge.
        doc.set(&s, "later", Node::new_string("still here")).unwrap();

        doc.decrypt(&key, "secrets").unwrap();
        assert_eq!(doc.get_path("str").unwrap().as_string(), "Some string.");
        assert_eq!(doc.get_path("later").unwrap().as_string(), "still here");
    }

    #[test]
    fn test_encrypt_missing_path_leaves_document_unchanged() {
        let s = server();
        let key = EncryptionKey::new(TEST_KEY);
        let mut doc = sample_doc();
        let before = doc.as_node().clone();

        assert!(doc.encrypt(&s, &key, "x", &["does/not/exist"]).is_err());
        assert_eq!(doc.as_node(), &before);
        assert!(!doc.dirty());
    }

    #[test]
    fn test_decrypt_wrong_key_fails_atomically() {
        let s = server();
        let key = EncryptionKey::new(TEST_KEY);
        let wrong = EncryptionKey::new([0x24; KEY_LEN]);
        let mut doc = sample_doc();

        doc.encrypt(&s, &key, "secrets", &["str"]).unwrap();
        let before = doc.as_node().clone();

        let err = doc.decrypt(&wrong, "secrets").unwrap_err();
        assert!(matches!(err, Error::Crypto(CryptoError::DecryptFailed)));
        // Nothing moved: ciphertext still present, plaintext still absent.
        assert_eq!(doc.as_node(), &before);
    }

    #[test]
    fn test_decrypt_corrupted_ciphertext_fails_atomically() {
        let s = server();
        let key = EncryptionKey::new(TEST_KEY);
        let mut doc = sample_doc();
        doc.encrypt(&s, &key, "secrets", &["str"]).unwrap();

        // Flip one ciphertext byte in place.
        let (subtype, bytes) = doc.root.nav("#/secrets").unwrap().as_binary().unwrap();
        let mut corrupted = bytes.to_vec();
        corrupted[0] ^= 0xFF;
        doc.root
            .set_child("#/secrets", Some(Node::new_binary(corrupted, subtype)))
            .unwrap();
        let before = doc.as_node().clone();

        let err = doc.decrypt(&key, "secrets").unwrap_err();
        assert!(matches!(err, Error::Crypto(CryptoError::DecryptFailed)));
        assert_eq!(doc.as_node(), &before);
        assert!(doc.as_node().exists("#/secrets"));
    }

    #[test]
    fn test_decrypt_with_damaged_nonce_is_malformed() {
        let s = server();
        let key = EncryptionKey::new(TEST_KEY);
        let mut doc = sample_doc();
        doc.encrypt(&s, &key, "secrets", &["str"]).unwrap();

        doc.root
            .set_child(
                "_/encrypted/vector/secrets",
                Some(Node::new_binary(vec![0u8; 4], BinarySubtype::UserDefined)),
            )
            .unwrap();

        let err = doc.decrypt(&key, "secrets").unwrap_err();
        assert!(matches!(
            err,
            Error::Crypto(CryptoError::MalformedSection { .. })
        ));
    }

    #[test]
    fn test_decrypt_unknown_key_name() {
        let key = EncryptionKey::new(TEST_KEY);
        let mut doc = sample_doc();
        let err = doc.decrypt(&key, "nothing-here").unwrap_err();
        assert!(matches!(
            err,
            Error::Crypto(CryptoError::MalformedSection { .. })
        ));
    }

    #[test]
    fn test_nonces_are_unique_per_call() {
        let s = server();
        let key = EncryptionKey::new(TEST_KEY);

        let mut a = sample_doc();
        let mut b = sample_doc();
        a.encrypt(&s, &key, "n", &["str"]).unwrap();
        b.encrypt(&s, &key, "n", &["str"]).unwrap();

        let nonce_a = a
            .as_node()
            .nav("_/encrypted/vector/n")
            .unwrap()
            .as_binary()
            .unwrap()
            .1
            .to_vec();
        let nonce_b = b
            .as_node()
            .nav("_/encrypted/vector/n")
            .unwrap()
            .as_binary()
            .unwrap()
            .1
            .to_vec();
        assert_ne!(nonce_a, nonce_b);
    }

    #[test]
    fn test_two_key_names_coexist() {
        let s = server();
        let key = EncryptionKey::new(TEST_KEY);
        let mut doc = sample_doc();

        doc.encrypt(&s, &key, "first", &["str"]).unwrap();
        doc.encrypt(&s, &key, "second", &["number"]).unwrap();
        assert!(!doc.get().unwrap().exists("str"));
        assert!(!doc.get().unwrap().exists("number"));

        doc.decrypt(&key, "second").unwrap();
        assert_eq!(doc.get_path("number").unwrap().as_int64(), 42);
        assert!(!doc.get().unwrap().exists("str"));

        doc.decrypt(&key, "first").unwrap();
        assert_eq!(doc.get_path("str").unwrap().as_string(), "Some string.");
    }

    #[test]
    fn test_encrypted_document_survives_binary_roundtrip() {
        let s = server();
        let key = EncryptionKey::new(TEST_KEY);
        let mut doc = sample_doc();
        doc.encrypt(&s, &key, "secrets", &["str"]).unwrap();

        let bytes = doc.as_node().to_binary();
        let mut restored =
            Document::wrap(crate::codec::decode_document(&bytes).unwrap(), true);

        restored.decrypt(&key, "secrets").unwrap();
        assert_eq!(
            restored.get_path("str").unwrap().as_string(),
            "Some string."
        );
    }
}
