// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resource entities materialised from monikered objects.
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::graph::ObjectGraph;
use crate::ident::{ObjectId, TypeToken};
use crate::moniker::{Moniker, MonikerMap};

/// A managed resource: one resource object plus the moniker assigned to it.
///
/// Resources are immutable once built. Each one shares the pass's full
/// moniker map so it can name its own dependencies without going back to the
/// context.
#[derive(Debug, Clone)]
pub struct Resource {
    object: ObjectId,
    ty: TypeToken,
    moniker: Moniker,
    monikers: Arc<MonikerMap>,
}

impl Resource {
    /// Builds a resource for `object`.
    pub fn new(object: ObjectId, ty: TypeToken, moniker: Moniker, monikers: Arc<MonikerMap>) -> Self {
        Self {
            object,
            ty,
            moniker,
            monikers,
        }
    }

    /// Identity of the underlying object.
    #[must_use]
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// Type token of the underlying object.
    #[must_use]
    pub fn ty(&self) -> &TypeToken {
        &self.ty
    }

    /// Moniker assigned to this resource.
    #[must_use]
    pub fn moniker(&self) -> &Moniker {
        &self.moniker
    }

    /// The moniker map of the pass that produced this resource.
    #[must_use]
    pub fn monikers(&self) -> &Arc<MonikerMap> {
        &self.monikers
    }

    /// Monikers of the resources this one points at directly.
    ///
    /// Out-edges are followed through non-resource objects until a monikered
    /// object is reached; the walk stops there. Results are deduplicated and
    /// kept in discovery order. A path leading back to this resource is not a
    /// dependency.
    pub fn dependencies<G>(&self, graph: &G) -> Vec<Moniker>
    where
        G: ObjectGraph + ?Sized,
    {
        let mut deps = Vec::new();
        let mut seen: FxHashSet<ObjectId> = FxHashSet::default();
        seen.insert(self.object);
        let mut stack: Vec<ObjectId> = graph
            .edges_from(&self.object)
            .iter()
            .rev()
            .map(|e| e.to)
            .collect();

        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            if let Some(moniker) = self.monikers.get(&next) {
                deps.push(moniker.clone());
                continue;
            }
            if graph.is_resource(&next) {
                continue;
            }
            stack.extend(graph.edges_from(&next).iter().rev().map(|e| e.to));
        }
        deps
    }
}
