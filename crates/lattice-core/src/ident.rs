// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier and hashing utilities.
use std::fmt;

use blake3::Hasher;

/// Canonical 256-bit hash used for addressing objects, edges, and snapshots.
pub type Hash = [u8; 32];

/// Strongly typed identity of a value in the object graph.
///
/// The evaluator hands us opaque runtime values; `ObjectId` is the stable key
/// we index them by. Ids built with [`make_object_id`] are
/// `blake3("object:" || label)`, but callers may supply any 32-byte identity
/// as long as it is unique per value within one graph.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(pub Hash);

impl ObjectId {
    /// Returns the canonical byte representation of this id.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    /// Returns the first eight bytes as lowercase hex, for diagnostics.
    #[must_use]
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_hex())
    }
}

/// Identifier for a directed edge within the object graph.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(pub Hash);

impl EdgeId {
    /// Returns the canonical byte representation of this id.
    #[must_use]
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

/// Fully qualified type token of an object (e.g. `aws:ec2/instance:Instance`).
///
/// Tokens are produced by the surrounding compiler; this crate treats them as
/// opaque strings and only uses them as the leading segment of a moniker.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TypeToken(String);

impl TypeToken {
    /// Wraps a type token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produces a stable, domain‑separated object identifier (prefix `b"object:"`) using BLAKE3.
pub fn make_object_id(label: &str) -> ObjectId {
    let mut hasher = Hasher::new();
    hasher.update(b"object:");
    hasher.update(label.as_bytes());
    ObjectId(hasher.finalize().into())
}

/// Produces a stable, domain‑separated edge identifier (prefix `b"edge:"`) using BLAKE3.
pub fn make_edge_id(label: &str) -> EdgeId {
    let mut hasher = Hasher::new();
    hasher.update(b"edge:");
    hasher.update(label.as_bytes());
    EdgeId(hasher.finalize().into())
}
