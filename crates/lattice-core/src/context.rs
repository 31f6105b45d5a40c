// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-pass resource indices.
//!
//! [`ContextBuilder`] is the only mutable phase: the pipeline borrows it
//! exclusively while materialising resources, then [`ContextBuilder::freeze`]
//! turns it into a read-only [`Context`] that snapshots share.
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::InvariantViolation;
use crate::graph::ObjectGraph;
use crate::ident::ObjectId;
use crate::moniker::{Moniker, MonikerMap};
use crate::resource::Resource;

/// Mutable resource registry for one compilation pass.
#[derive(Debug, Default)]
pub struct ContextBuilder {
    by_object: BTreeMap<ObjectId, Arc<Resource>>,
    by_moniker: BTreeMap<Moniker, Arc<Resource>>,
}

impl ContextBuilder {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `resource` under its object id and its moniker.
    ///
    /// Each object and each moniker may be registered once; a second
    /// registration is an internal invariant violation and leaves the
    /// registry unchanged.
    pub fn register(&mut self, resource: Resource) -> Result<Arc<Resource>, InvariantViolation> {
        if self.by_object.contains_key(&resource.object()) {
            return Err(InvariantViolation::DuplicateResource(resource.object()));
        }
        if self.by_moniker.contains_key(resource.moniker()) {
            return Err(InvariantViolation::DuplicateMoniker(resource.moniker().clone()));
        }
        let resource = Arc::new(resource);
        self.by_object
            .insert(resource.object(), Arc::clone(&resource));
        self.by_moniker
            .insert(resource.moniker().clone(), Arc::clone(&resource));
        Ok(resource)
    }

    /// Builds and registers one [`Resource`] per entry of `monikers`.
    ///
    /// Returns the number of resources created.
    pub fn materialize<G>(
        &mut self,
        graph: &G,
        monikers: &Arc<MonikerMap>,
    ) -> Result<usize, InvariantViolation>
    where
        G: ObjectGraph + ?Sized,
    {
        for (object, moniker) in monikers.iter() {
            let record = graph
                .object(object)
                .ok_or(InvariantViolation::UnknownObject(*object))?;
            self.register(Resource::new(
                *object,
                record.ty.clone(),
                moniker.clone(),
                Arc::clone(monikers),
            ))?;
        }
        debug!(resources = monikers.len(), "materialized resources");
        Ok(monikers.len())
    }

    /// Number of registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_object.len()
    }

    /// Returns `true` when nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_object.is_empty()
    }

    /// Looks up a registered resource by object id.
    #[must_use]
    pub fn resource_by_object(&self, object: &ObjectId) -> Option<&Arc<Resource>> {
        self.by_object.get(object)
    }

    /// Ends the mutation phase.
    #[must_use]
    pub fn freeze(self) -> Context {
        Context {
            by_object: self.by_object,
            by_moniker: self.by_moniker,
        }
    }
}

/// Read-only resource indices of a finished pass.
#[derive(Debug, Default)]
pub struct Context {
    by_object: BTreeMap<ObjectId, Arc<Resource>>,
    by_moniker: BTreeMap<Moniker, Arc<Resource>>,
}

impl Context {
    /// Looks up a resource by the identity of its underlying object.
    #[must_use]
    pub fn resource_by_object(&self, object: &ObjectId) -> Option<&Arc<Resource>> {
        self.by_object.get(object)
    }

    /// Looks up a resource by moniker.
    #[must_use]
    pub fn resource_by_moniker(&self, moniker: &Moniker) -> Option<&Arc<Resource>> {
        self.by_moniker.get(moniker)
    }

    /// Number of registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_object.len()
    }

    /// Returns `true` when the pass produced no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_object.is_empty()
    }

    /// Iterate over all resources in moniker order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.by_moniker.values()
    }
}
