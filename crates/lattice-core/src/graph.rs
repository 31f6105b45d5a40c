// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Object graph boundary and the in-memory store used by tests and tooling.
use std::collections::BTreeMap;

use thiserror::Error;

use crate::ident::{make_edge_id, EdgeId, ObjectId};
use crate::record::{EdgeRecord, ObjectRecord, RootRecord};

/// Read-only view of an evaluated object graph.
///
/// This is the seam to the program evaluator. Implementations must be
/// deterministic: `roots` and `edges_from` yield the same sequence for the
/// same graph on every call, since moniker tie-breaking and resource ordering
/// are both derived from traversal order.
pub trait ObjectGraph {
    /// Entry points into the graph, in evaluation order.
    fn roots(&self) -> &[RootRecord];

    /// Returns the record for `id` when it exists.
    fn object(&self, id: &ObjectId) -> Option<&ObjectRecord>;

    /// Outgoing edges of `id` in stable order. Unknown ids have no edges.
    fn edges_from(&self, id: &ObjectId) -> &[EdgeRecord];

    /// Returns `true` if `id` names a resource-bearing object.
    fn is_resource(&self, id: &ObjectId) -> bool {
        self.object(id).is_some_and(|record| record.resource)
    }
}

/// Error returned by [`GraphStore`] mutation helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// An edge or root referenced an object that was never inserted.
    #[error("unknown object: {0}")]
    UnknownObject(ObjectId),
    /// A root with this name already exists.
    #[error("duplicate root name: {0}")]
    DuplicateRoot(String),
    /// The source object already has a different edge with this label.
    ///
    /// Labels name properties, and monikers are built from them, so two
    /// targets under one label would be indistinguishable.
    #[error("object {from} already has an edge labelled {label:?}")]
    DuplicateLabel {
        /// Source object of both edges.
        from: ObjectId,
        /// The repeated label.
        label: String,
    },
}

/// In-memory object graph.
///
/// Objects are kept in a `BTreeMap` so iteration is deterministic; outgoing
/// edges keep insertion order, which is the order the evaluator discovered
/// them in.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    /// Mapping from object identifiers to their records.
    pub(crate) objects: BTreeMap<ObjectId, ObjectRecord>,
    /// Mapping from source object to outbound edge records.
    pub(crate) edges_from: BTreeMap<ObjectId, Vec<EdgeRecord>>,
    /// Reverse index of `EdgeId -> from ObjectId`, keeping edge ids unique.
    pub(crate) edge_index: BTreeMap<EdgeId, ObjectId>,
    /// Named roots in insertion order.
    pub(crate) roots: Vec<RootRecord>,
}

impl GraphStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an object record.
    pub fn insert_object(&mut self, id: ObjectId, record: ObjectRecord) {
        self.objects.insert(id, record);
    }

    /// Iterate over all objects (id, record) in deterministic order.
    pub fn iter_objects(&self) -> impl Iterator<Item = (&ObjectId, &ObjectRecord)> {
        self.objects.iter()
    }

    /// Number of objects in the store.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Registers `object` as a root named `name`.
    pub fn add_root(&mut self, name: impl Into<String>, object: ObjectId) -> Result<(), GraphError> {
        let name = name.into();
        if !self.objects.contains_key(&object) {
            return Err(GraphError::UnknownObject(object));
        }
        if self.roots.iter().any(|root| root.name == name) {
            return Err(GraphError::DuplicateRoot(name));
        }
        self.roots.push(RootRecord { name, object });
        Ok(())
    }

    /// Inserts or replaces a directed edge.
    ///
    /// If an edge with the same `EdgeId` already exists (in any bucket), the
    /// old record is removed first so ids stay unique across the store. A
    /// replaced edge moves to the end of its new bucket. Labels are unique
    /// per source object.
    pub fn insert_edge(&mut self, edge: EdgeRecord) -> Result<(), GraphError> {
        for endpoint in [edge.from, edge.to] {
            if !self.objects.contains_key(&endpoint) {
                return Err(GraphError::UnknownObject(endpoint));
            }
        }
        let label_taken = self
            .edges_from(&edge.from)
            .iter()
            .any(|e| e.label == edge.label && e.id != edge.id);
        if label_taken {
            return Err(GraphError::DuplicateLabel {
                from: edge.from,
                label: edge.label,
            });
        }
        if let Some(prev_from) = self.edge_index.insert(edge.id, edge.from) {
            if let Some(bucket) = self.edges_from.get_mut(&prev_from) {
                bucket.retain(|e| e.id != edge.id);
                if bucket.is_empty() {
                    self.edges_from.remove(&prev_from);
                }
            }
        }
        self.edges_from.entry(edge.from).or_default().push(edge);
        Ok(())
    }

    /// Convenience wrapper over [`GraphStore::insert_edge`] that derives the
    /// edge id from its endpoints and label.
    pub fn connect(
        &mut self,
        from: ObjectId,
        to: ObjectId,
        label: impl Into<String>,
    ) -> Result<EdgeId, GraphError> {
        let label = label.into();
        let id = make_edge_id(&format!(
            "{}:{}:{}",
            hex::encode(from.as_bytes()),
            label,
            hex::encode(to.as_bytes())
        ));
        self.insert_edge(EdgeRecord {
            id,
            from,
            to,
            label,
        })?;
        Ok(id)
    }

    /// Returns `true` if an edge with `edge_id` exists in the store.
    #[must_use]
    pub fn has_edge(&self, edge_id: &EdgeId) -> bool {
        self.edge_index.contains_key(edge_id)
    }
}

impl ObjectGraph for GraphStore {
    fn roots(&self) -> &[RootRecord] {
        &self.roots
    }

    fn object(&self, id: &ObjectId) -> Option<&ObjectRecord> {
        self.objects.get(id)
    }

    fn edges_from(&self, id: &ObjectId) -> &[EdgeRecord] {
        self.edges_from.get(id).map_or(&[], Vec::as_slice)
    }
}
