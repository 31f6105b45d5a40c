// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for snapshot construction.
//!
//! - [`CycleError`] is bad input: the caller decides whether to abort the
//!   deployment. No partial snapshot is ever produced.
//! - [`InvariantViolation`] is a logic defect. It ends the pass and must not be
//!   retried or ignored.
//! - Lookup misses are not errors; lookups return `Option`.
use thiserror::Error;

use crate::ident::ObjectId;
use crate::moniker::Moniker;

/// The object graph is not a DAG.
///
/// `cycle` lists the objects along the offending loop in traversal order; the
/// last object has an edge back to the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dependency cycle detected: {}", render_cycle(.cycle))]
pub struct CycleError {
    /// Objects on the cycle, starting at the object that was re-entered.
    pub cycle: Vec<ObjectId>,
}

impl CycleError {
    /// Returns the edge that closed the cycle as `(from, to)`.
    #[must_use]
    pub fn closing_edge(&self) -> Option<(ObjectId, ObjectId)> {
        Some((*self.cycle.last()?, *self.cycle.first()?))
    }
}

fn render_cycle(cycle: &[ObjectId]) -> String {
    let mut out: Vec<String> = cycle.iter().map(ObjectId::short_hex).collect();
    if let Some(first) = cycle.first() {
        out.push(first.short_hex());
    }
    out.join(" -> ")
}

/// Internal consistency failure between pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// An object was materialized twice.
    #[error("object {0} already has a registered resource")]
    DuplicateResource(ObjectId),
    /// Two objects were assigned the same moniker.
    #[error("moniker {0} is already registered")]
    DuplicateMoniker(Moniker),
    /// The moniker map named an object the graph does not contain.
    #[error("moniker map references unknown object {0}")]
    UnknownObject(ObjectId),
    /// A resource appeared more than once in the sorted order.
    #[error("resource {0} appears more than once in the sorted order")]
    RepeatedInOrder(Moniker),
    /// The sorted order does not cover every registered resource.
    #[error("sorted order covers {ordered} of {registered} registered resources")]
    OrderMismatch {
        /// Resources registered in the context.
        registered: usize,
        /// Resources present in the sorted order.
        ordered: usize,
    },
}

/// Failure of snapshot construction or of a snapshot query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// The graph contains a cycle.
    #[error(transparent)]
    Cycle(#[from] CycleError),
    /// Stages disagreed about the resource set.
    #[error("internal invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    /// Moniker assignment walked more edges than the configured budget.
    #[error("moniker assignment exceeded its traversal budget of {budget} edges")]
    TraversalBudgetExceeded {
        /// The configured budget.
        budget: u64,
    },
    /// The requested operation has no implementation yet.
    #[error("not yet implemented: {0}")]
    Unimplemented(&'static str),
}

impl SnapshotError {
    /// Returns `true` for errors that indicate a defect (or a runaway pass)
    /// rather than a malformed input graph.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Cycle(_))
    }
}
