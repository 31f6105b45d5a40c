// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Snapshot type and construction pipeline.
//!
//! A snapshot is the diffable view of every resource a program produced:
//! its package, its compile arguments, and its resources in dependency order.
//!
//! Construction from an object graph runs three stages and stops at the first
//! failure, so no partially built snapshot is ever observable:
//! 1. [`assign_monikers`] names every reachable resource;
//! 2. [`ContextBuilder::materialize`] builds and indexes the resources;
//! 3. [`order_resources`] sorts them (rejecting cycles).
//!
//! Digest contract
//! - [`Snapshot::digest`] is a BLAKE3 hash over a version tag, the package
//!   name, the compile arguments in key order, and the ordered monikers.
//! - Every variable-length field is prefixed with its 8-byte little-endian
//!   length; changing the encoding changes every digest.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use blake3::Hasher;
use tracing::{info, instrument};

use crate::config::AssignConfig;
use crate::context::{Context, ContextBuilder};
use crate::error::SnapshotError;
use crate::graph::ObjectGraph;
use crate::ident::{Hash, ObjectId, TypeToken};
use crate::moniker::{assign_monikers, Moniker};
use crate::resource::Resource;
use crate::topo::{order_resources, ResourceOrder};

/// Name of the package a snapshot was compiled from.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PackageName(String);

impl PackageName {
    /// Wraps a package name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Arguments the package was compiled with. Opaque to this crate.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CompileArgs(BTreeMap<String, String>);

impl CompileArgs {
    /// Creates an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate over arguments in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no arguments were given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for CompileArgs {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Immutable, dependency-ordered view of the resources of one pass.
#[derive(Debug, Clone)]
pub struct Snapshot {
    ctx: Arc<Context>,
    pkg: PackageName,
    args: CompileArgs,
    order: ResourceOrder,
}

impl Snapshot {
    /// Creates a snapshot from resources that are already in dependency order.
    ///
    /// The order is trusted, not checked; a snapshot built from an unsorted
    /// list will produce wrong plans downstream.
    pub fn new(
        ctx: Arc<Context>,
        pkg: PackageName,
        args: CompileArgs,
        resources: Vec<Arc<Resource>>,
    ) -> Self {
        Self {
            ctx,
            pkg,
            args,
            order: ResourceOrder::unresolved(resources),
        }
    }

    /// Compiles `graph` into a snapshot, naming, materialising, and sorting
    /// its resources.
    ///
    /// `ctx` must be a fresh builder for this pass. Fails if the graph has a
    /// cycle, if assignment exceeds its budget, or if an internal invariant
    /// breaks; no snapshot is returned in any of those cases.
    #[instrument(level = "debug", skip_all, fields(pkg = %pkg))]
    pub fn from_graph<G>(
        mut ctx: ContextBuilder,
        pkg: PackageName,
        args: CompileArgs,
        graph: &G,
        config: &AssignConfig,
    ) -> Result<Self, SnapshotError>
    where
        G: ObjectGraph + ?Sized,
    {
        let monikers = Arc::new(assign_monikers(graph, config)?);
        ctx.materialize(graph, &monikers)?;
        let ctx = Arc::new(ctx.freeze());
        let order = order_resources(graph, &ctx)?;
        info!(resources = order.len(), "compiled snapshot");
        Ok(Self {
            ctx,
            pkg,
            args,
            order,
        })
    }

    /// The context shared by every resource in this snapshot.
    #[must_use]
    pub fn ctx(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// The package this snapshot came from.
    #[must_use]
    pub fn pkg(&self) -> &PackageName {
        &self.pkg
    }

    /// The arguments used to compile the package.
    #[must_use]
    pub fn args(&self) -> &CompileArgs {
        &self.args
    }

    /// Resources in dependency order.
    #[must_use]
    pub fn resources(&self) -> &[Arc<Resource>] {
        self.order.resources()
    }

    /// The ordered resources together with their resolved dependencies.
    #[must_use]
    pub fn order(&self) -> &ResourceOrder {
        &self.order
    }

    /// Looks up a resource by moniker. A miss is `None`.
    #[must_use]
    pub fn resource_by_moniker(&self, moniker: &Moniker) -> Option<&Arc<Resource>> {
        self.ctx.resource_by_moniker(moniker)
    }

    /// Looks up a resource by the identity of its underlying object. A miss is `None`.
    #[must_use]
    pub fn resource_by_object(&self, object: &ObjectId) -> Option<&Arc<Resource>> {
        self.ctx.resource_by_object(object)
    }

    /// Looks up a resource by provider id and type.
    ///
    /// Provider ids are not tracked yet, so this always fails with
    /// [`SnapshotError::Unimplemented`].
    pub fn resource_by_id(
        &self,
        id: &str,
        ty: &TypeToken,
    ) -> Result<Option<&Arc<Resource>>, SnapshotError> {
        let _ = (id, ty);
        Err(SnapshotError::Unimplemented("resource lookup by id and type"))
    }

    /// Canonical digest of the package, arguments, and resource order.
    #[must_use]
    pub fn digest(&self) -> Hash {
        let mut h = Hasher::new();
        // Version tag for future evolution.
        h.update(&1u16.to_le_bytes());
        hash_str(&mut h, self.pkg.as_str());
        h.update(&(self.args.len() as u64).to_le_bytes());
        for (key, value) in self.args.iter() {
            hash_str(&mut h, key);
            hash_str(&mut h, value);
        }
        h.update(&(self.resources().len() as u64).to_le_bytes());
        for resource in self.resources() {
            hash_str(&mut h, resource.moniker().as_str());
        }
        h.finalize().into()
    }

    /// Returns [`Snapshot::digest`] as a lowercase hex string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}

fn hash_str(hasher: &mut Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::graph::GraphStore;
    use crate::ident::make_object_id;
    use crate::record::ObjectRecord;

    fn two_resources() -> GraphStore {
        let mut g = GraphStore::new();
        let (r, a, b) = (make_object_id("r"), make_object_id("a"), make_object_id("b"));
        g.insert_object(r, ObjectRecord::plain("module"));
        g.insert_object(a, ObjectRecord::resource("vm"));
        g.insert_object(b, ObjectRecord::resource("disk"));
        g.add_root("main", r).unwrap();
        g.connect(r, a, "vm").unwrap();
        g.connect(a, b, "disk").unwrap();
        g
    }

    #[test]
    fn accessors_pass_inputs_through() {
        let args = CompileArgs::new().with("region", "us-west-2");
        let snap = Snapshot::from_graph(
            ContextBuilder::new(),
            PackageName::new("web"),
            args.clone(),
            &two_resources(),
            &AssignConfig::default(),
        )
        .unwrap();
        assert_eq!(snap.pkg().as_str(), "web");
        assert_eq!(snap.args(), &args);
        assert_eq!(snap.args().get("region"), Some("us-west-2"));
        assert_eq!(snap.ctx().len(), 2);
    }

    #[test]
    fn lookup_by_id_is_unimplemented() {
        let snap = Snapshot::new(
            Arc::new(Context::default()),
            PackageName::new("web"),
            CompileArgs::new(),
            Vec::new(),
        );
        assert!(matches!(
            snap.resource_by_id("i-123", &TypeToken::new("vm")),
            Err(SnapshotError::Unimplemented(_))
        ));
    }

    #[test]
    fn digest_depends_on_package_and_args() {
        let g = two_resources();
        let build = |pkg: &str, args: CompileArgs| {
            Snapshot::from_graph(
                ContextBuilder::new(),
                PackageName::new(pkg),
                args,
                &g,
                &AssignConfig::default(),
            )
            .unwrap()
            .digest()
        };
        let base = build("web", CompileArgs::new());
        assert_eq!(base, build("web", CompileArgs::new()));
        assert_ne!(base, build("api", CompileArgs::new()));
        assert_ne!(base, build("web", CompileArgs::new().with("k", "v")));
    }

    #[test]
    fn direct_construction_has_no_resolved_dependencies() {
        let snap = Snapshot::from_graph(
            ContextBuilder::new(),
            PackageName::new("web"),
            CompileArgs::new(),
            &two_resources(),
            &AssignConfig::default(),
        )
        .unwrap();
        let vm = snap.resources()[0].moniker().clone();
        assert_eq!(snap.order().dependencies_of(&vm).map(<[_]>::len), Some(1));

        let copy = Snapshot::new(
            Arc::clone(snap.ctx()),
            snap.pkg().clone(),
            snap.args().clone(),
            snap.resources().to_vec(),
        );
        assert_eq!(copy.digest(), snap.digest());
        assert!(copy.order().dependencies_of(&vm).is_none());
    }
}
