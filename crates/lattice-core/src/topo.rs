// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dependency ordering.
//!
//! The whole reachable graph is sorted (resources and scaffolding together,
//! since dependencies run through non-resource objects) and the result is
//! then projected onto resources. The projection keeps relative order, so
//! transitive dependencies between resources stay ordered.
use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument};

use crate::context::Context;
use crate::error::{CycleError, InvariantViolation, SnapshotError};
use crate::graph::ObjectGraph;
use crate::ident::ObjectId;
use crate::moniker::Moniker;
use crate::record::EdgeRecord;
use crate::resource::Resource;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the DFS stack.
    Open,
    /// Finished; all descendants emitted.
    Done,
}

struct Frame<'g> {
    object: ObjectId,
    edges: std::slice::Iter<'g, EdgeRecord>,
}

/// Topologically sorts every object reachable from the roots.
///
/// Every edge points from an earlier object to a later one. The order is the
/// reverse DFS post-order from the roots in root order, following edges in
/// stored order, so it is stable for an unchanged graph. Edges to objects the
/// graph does not know are ignored.
pub fn topsort<G>(graph: &G) -> Result<Vec<ObjectId>, CycleError>
where
    G: ObjectGraph + ?Sized,
{
    let mut marks: FxHashMap<ObjectId, Mark> = FxHashMap::default();
    let mut postorder: Vec<ObjectId> = Vec::new();
    let mut stack: Vec<Frame<'_>> = Vec::new();

    for root in graph.roots() {
        if marks.contains_key(&root.object) || graph.object(&root.object).is_none() {
            continue;
        }
        marks.insert(root.object, Mark::Open);
        stack.push(Frame {
            object: root.object,
            edges: graph.edges_from(&root.object).iter(),
        });

        while let Some(frame) = stack.last_mut() {
            let Some(edge) = frame.edges.next() else {
                if let Some(done) = stack.pop() {
                    marks.insert(done.object, Mark::Done);
                    postorder.push(done.object);
                }
                continue;
            };
            match marks.get(&edge.to) {
                Some(Mark::Done) => {}
                Some(Mark::Open) => {
                    let start = stack
                        .iter()
                        .position(|f| f.object == edge.to)
                        .unwrap_or(0);
                    let cycle = stack[start..].iter().map(|f| f.object).collect();
                    return Err(CycleError { cycle });
                }
                None => {
                    if graph.object(&edge.to).is_none() {
                        continue;
                    }
                    marks.insert(edge.to, Mark::Open);
                    stack.push(Frame {
                        object: edge.to,
                        edges: graph.edges_from(&edge.to).iter(),
                    });
                }
            }
        }
    }

    postorder.reverse();
    Ok(postorder)
}

/// Dependency-ordered resources of one pass.
///
/// Alongside the flat order this keeps each resource's direct resource
/// dependencies, so consumers that want a graph (rather than a list) do not
/// need to walk the object graph again.
#[derive(Debug, Clone, Default)]
pub struct ResourceOrder {
    resources: Vec<Arc<Resource>>,
    dependencies: BTreeMap<Moniker, Vec<Moniker>>,
}

impl ResourceOrder {
    /// Wraps an already ordered list whose dependencies were never resolved.
    pub fn unresolved(resources: Vec<Arc<Resource>>) -> Self {
        Self {
            resources,
            dependencies: BTreeMap::new(),
        }
    }

    /// The resources in dependency order.
    #[must_use]
    pub fn resources(&self) -> &[Arc<Resource>] {
        &self.resources
    }

    /// Direct resource dependencies of `moniker`, or `None` when they were
    /// not resolved for this order or the moniker is unknown.
    #[must_use]
    pub fn dependencies_of(&self, moniker: &Moniker) -> Option<&[Moniker]> {
        self.dependencies.get(moniker).map(Vec::as_slice)
    }

    /// Number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns `true` when there are no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Sorts `graph` and projects the order onto the resources in `ctx`.
///
/// Fails with [`SnapshotError::Cycle`] if the graph is not a DAG, and with an
/// [`InvariantViolation`] if the projection does not contain every registered
/// resource exactly once.
#[instrument(level = "debug", skip_all, fields(resources = ctx.len()))]
pub fn order_resources<G>(graph: &G, ctx: &Context) -> Result<ResourceOrder, SnapshotError>
where
    G: ObjectGraph + ?Sized,
{
    let sorted = topsort(graph)?;

    let mut resources: Vec<Arc<Resource>> = Vec::with_capacity(ctx.len());
    let mut placed: FxHashSet<ObjectId> = FxHashSet::default();
    for object in &sorted {
        let Some(resource) = ctx.resource_by_object(object) else {
            continue;
        };
        if !placed.insert(*object) {
            return Err(InvariantViolation::RepeatedInOrder(resource.moniker().clone()).into());
        }
        resources.push(Arc::clone(resource));
    }
    if resources.len() != ctx.len() {
        return Err(InvariantViolation::OrderMismatch {
            registered: ctx.len(),
            ordered: resources.len(),
        }
        .into());
    }

    let dependencies = resources
        .iter()
        .map(|r| (r.moniker().clone(), r.dependencies(graph)))
        .collect();
    debug!(
        objects = sorted.len(),
        resources = resources.len(),
        "sorted resources"
    );
    Ok(ResourceOrder {
        resources,
        dependencies,
    })
}
