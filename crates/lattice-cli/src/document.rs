// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON object graph documents and snapshot reports.
use std::collections::BTreeMap;

use anyhow::{bail, Context as _, Result};
use lattice_core::{make_object_id, GraphStore, ObjectId, ObjectRecord, Snapshot};
use serde::{Deserialize, Serialize};

/// An evaluated object graph as written to disk.
///
/// Objects are addressed by label; ids are `make_object_id(label)`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphDocument {
    /// Named entry points, in evaluation order.
    pub roots: Vec<RootEntry>,
    /// Every object in the graph.
    pub objects: Vec<ObjectEntry>,
    /// Points-to edges, in discovery order.
    #[serde(default)]
    pub edges: Vec<EdgeEntry>,
}

/// A named root.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootEntry {
    /// Root name.
    pub name: String,
    /// Label of the object it points at.
    pub object: String,
}

/// An object.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectEntry {
    /// Unique label.
    pub label: String,
    /// Type token.
    #[serde(rename = "type")]
    pub ty: String,
    /// Whether the object is a managed resource.
    #[serde(default)]
    pub resource: bool,
}

/// A points-to edge between two labelled objects.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeEntry {
    /// Source label.
    pub from: String,
    /// Target label.
    pub to: String,
    /// Property name.
    pub label: String,
}

/// A loaded graph plus the reverse id → label index for reporting.
pub struct LoadedGraph {
    /// The store built from the document.
    pub store: GraphStore,
    /// Labels by object id.
    pub labels: BTreeMap<ObjectId, String>,
}

impl LoadedGraph {
    /// Label of `id`, or its short hex when unknown.
    pub fn label(&self, id: &ObjectId) -> String {
        self.labels
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.short_hex())
    }
}

impl GraphDocument {
    /// Parses a document from JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing object graph document")
    }

    /// Builds the in-memory graph.
    pub fn into_graph(self) -> Result<LoadedGraph> {
        let mut store = GraphStore::new();
        let mut ids: BTreeMap<String, ObjectId> = BTreeMap::new();
        let mut labels = BTreeMap::new();

        for object in self.objects {
            let id = make_object_id(&object.label);
            if ids.insert(object.label.clone(), id).is_some() {
                bail!("duplicate object label {:?}", object.label);
            }
            let record = if object.resource {
                ObjectRecord::resource(object.ty)
            } else {
                ObjectRecord::plain(object.ty)
            };
            store.insert_object(id, record);
            labels.insert(id, object.label);
        }

        let lookup = |label: &str| {
            ids.get(label)
                .copied()
                .with_context(|| format!("unknown object label {label:?}"))
        };
        for edge in self.edges {
            store
                .connect(lookup(&edge.from)?, lookup(&edge.to)?, edge.label)
                .context("adding edge")?;
        }
        for root in self.roots {
            store
                .add_root(root.name, lookup(&root.object)?)
                .context("adding root")?;
        }
        Ok(LoadedGraph { store, labels })
    }
}

/// Machine-readable summary of a compiled snapshot.
#[derive(Debug, Serialize)]
pub struct SnapshotReport {
    /// Package name.
    pub package: String,
    /// Hex digest of the snapshot.
    pub digest: String,
    /// Resources in dependency order.
    pub resources: Vec<ResourceReport>,
}

/// One resource in a [`SnapshotReport`].
#[derive(Debug, Serialize)]
pub struct ResourceReport {
    /// Assigned moniker.
    pub moniker: String,
    /// Label of the underlying object.
    pub object: String,
    /// Type token.
    #[serde(rename = "type")]
    pub ty: String,
    /// Monikers of direct resource dependencies.
    pub dependencies: Vec<String>,
}

impl SnapshotReport {
    /// Summarises `snapshot`, naming objects through `graph`'s labels.
    pub fn new(snapshot: &Snapshot, graph: &LoadedGraph) -> Self {
        let resources = snapshot
            .resources()
            .iter()
            .map(|r| ResourceReport {
                moniker: r.moniker().to_string(),
                object: graph.label(&r.object()),
                ty: r.ty().to_string(),
                dependencies: snapshot
                    .order()
                    .dependencies_of(r.moniker())
                    .unwrap_or_default()
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            })
            .collect();
        Self {
            package: snapshot.pkg().to_string(),
            digest: snapshot.digest_hex(),
            resources,
        }
    }
}
