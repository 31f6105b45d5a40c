// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! lattice-core: compiles evaluated object graphs into resource snapshots.
//!
//! Every resource reachable from the program's roots gets a moniker derived
//! from the shortest path that reaches it, and the resources are ordered so
//! that every dependency edge points forward. The resulting [`Snapshot`] is
//! what the planner diffs against the previous deployment.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod config;
mod context;
mod error;
mod graph;
mod ident;
mod moniker;
mod record;
mod resource;
mod snapshot;
mod topo;

// Re-exports for stable public API
/// Assignment tunables.
pub use config::{AssignConfig, DEFAULT_TRAVERSAL_BUDGET};
/// Per-pass resource registry (mutable builder and frozen indices).
pub use context::{Context, ContextBuilder};
/// Error taxonomy for snapshot construction.
pub use error::{CycleError, InvariantViolation, SnapshotError};
/// Object graph boundary and in-memory store.
pub use graph::{GraphError, GraphStore, ObjectGraph};
/// Core identifier types and constructors.
pub use ident::{make_edge_id, make_object_id, EdgeId, Hash, ObjectId, TypeToken};
/// Moniker type and the assignment pass.
pub use moniker::{assign_monikers, Moniker, MonikerMap, MONIKER_DELIMITER};
/// Graph record types.
pub use record::{EdgeRecord, ObjectRecord, RootRecord};
/// Materialised resources.
pub use resource::Resource;
/// Immutable snapshot and its pass-through inputs.
pub use snapshot::{CompileArgs, PackageName, Snapshot};
/// Dependency ordering.
pub use topo::{order_resources, topsort, ResourceOrder};
