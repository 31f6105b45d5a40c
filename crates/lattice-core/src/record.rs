// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph record types: objects, edges, and roots.

use crate::ident::{EdgeId, ObjectId, TypeToken};

/// Materialised record for a single object stored in the graph.
///
/// Invariants
/// - The object identifier is not embedded here; the store supplies it externally.
/// - `resource` is decided by the evaluator and never changes during a pass.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectRecord {
    /// Type token describing the object.
    pub ty: TypeToken,
    /// Whether the object is a managed resource (as opposed to plain scaffolding).
    pub resource: bool,
}

impl ObjectRecord {
    /// Record for a resource-bearing object.
    pub fn resource(ty: impl Into<String>) -> Self {
        Self {
            ty: TypeToken::new(ty),
            resource: true,
        }
    }

    /// Record for a non-resource object that only connects other objects.
    pub fn plain(ty: impl Into<String>) -> Self {
        Self {
            ty: TypeToken::new(ty),
            resource: false,
        }
    }
}

/// Materialised record for a single "points-to" edge.
///
/// Invariants
/// - `from` and `to` reference existing objects in the same store.
/// - `id` is stable across runs for the same logical edge.
/// - `label` is the property name through which `from` refers to `to`; it
///   becomes a moniker segment, so it should be human-readable.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeRecord {
    /// Stable identifier for the edge.
    pub id: EdgeId,
    /// Source object identifier.
    pub from: ObjectId,
    /// Destination object identifier.
    pub to: ObjectId,
    /// Property label of the edge.
    pub label: String,
}

/// Named entry point into the object graph.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RootRecord {
    /// Root name; the first segment of every moniker discovered from this root.
    pub name: String,
    /// Object the root points at.
    pub object: ObjectId,
}
