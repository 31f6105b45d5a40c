// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]
#![allow(clippy::expect_used)]

use std::collections::{BTreeMap, BTreeSet};

use lattice_core::{
    make_object_id, AssignConfig, CompileArgs, ContextBuilder, GraphStore, ObjectGraph, ObjectId,
    ObjectRecord, PackageName, Snapshot, SnapshotError,
};

/// Label-addressed graph builder so tests read like the graphs they describe.
#[derive(Default)]
pub struct Fixture {
    pub graph: GraphStore,
    ids: BTreeMap<String, ObjectId>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource object of type `ty`.
    pub fn resource(&mut self, label: &str, ty: &str) -> ObjectId {
        self.insert(label, ObjectRecord::resource(ty))
    }

    /// Adds a non-resource object.
    pub fn plain(&mut self, label: &str) -> ObjectId {
        self.insert(label, ObjectRecord::plain("object"))
    }

    fn insert(&mut self, label: &str, record: ObjectRecord) -> ObjectId {
        let id = make_object_id(label);
        self.graph.insert_object(id, record);
        self.ids.insert(label.to_owned(), id);
        id
    }

    /// Makes `label` a root named `name`.
    pub fn root(&mut self, name: &str, label: &str) {
        let id = self.id(label);
        self.graph.add_root(name, id).expect("add root");
    }

    /// Adds `from -> to` with property label `prop`.
    pub fn edge(&mut self, from: &str, to: &str, prop: &str) {
        let (from, to) = (self.id(from), self.id(to));
        self.graph.connect(from, to, prop).expect("connect");
    }

    pub fn id(&self, label: &str) -> ObjectId {
        *self.ids.get(label).expect("unknown fixture label")
    }

    pub fn compile(&self) -> Result<Snapshot, SnapshotError> {
        compile(&self.graph)
    }

    /// Moniker text assigned to `label` in `snapshot`.
    pub fn moniker_of(&self, snapshot: &Snapshot, label: &str) -> String {
        snapshot
            .resource_by_object(&self.id(label))
            .expect("resource")
            .moniker()
            .to_string()
    }
}

pub fn compile<G: ObjectGraph>(graph: &G) -> Result<Snapshot, SnapshotError> {
    Snapshot::from_graph(
        ContextBuilder::new(),
        PackageName::new("test-pkg"),
        CompileArgs::new(),
        graph,
        &AssignConfig::default(),
    )
}

/// Objects reachable from any root.
pub fn reachable<G: ObjectGraph>(graph: &G) -> BTreeSet<ObjectId> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<ObjectId> = graph.roots().iter().map(|r| r.object).collect();
    while let Some(next) = stack.pop() {
        if seen.insert(next) {
            stack.extend(graph.edges_from(&next).iter().map(|e| e.to));
        }
    }
    seen
}

/// Resources `from` reaches through non-resource objects only.
pub fn direct_resource_deps<G: ObjectGraph>(graph: &G, from: ObjectId) -> BTreeSet<ObjectId> {
    let mut out = BTreeSet::new();
    let mut seen = BTreeSet::new();
    let mut stack: Vec<ObjectId> = graph.edges_from(&from).iter().map(|e| e.to).collect();
    while let Some(next) = stack.pop() {
        if !seen.insert(next) {
            continue;
        }
        if graph.is_resource(&next) {
            out.insert(next);
        } else {
            stack.extend(graph.edges_from(&next).iter().map(|e| e.to));
        }
    }
    out
}

/// Asserts every resource precedes the resources it depends on.
pub fn assert_topological<G: ObjectGraph>(graph: &G, snapshot: &Snapshot) {
    let position: BTreeMap<ObjectId, usize> = snapshot
        .resources()
        .iter()
        .enumerate()
        .map(|(i, r)| (r.object(), i))
        .collect();
    for resource in snapshot.resources() {
        for dep in direct_resource_deps(graph, resource.object()) {
            let (Some(a), Some(b)) = (position.get(&resource.object()), position.get(&dep)) else {
                continue;
            };
            assert!(a < b, "{} must precede its dependency", resource.moniker());
        }
    }
}
