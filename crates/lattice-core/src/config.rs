// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tunables for a compilation pass.

/// Default number of edges moniker assignment may walk before giving up.
pub const DEFAULT_TRAVERSAL_BUDGET: u64 = 1 << 20;

/// Configuration for moniker assignment.
///
/// Path-accumulating traversal visits non-resource objects once per distinct
/// path, so densely shared scaffolding can blow up combinatorially. The
/// budget turns that into [`crate::SnapshotError::TraversalBudgetExceeded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AssignConfig {
    /// Maximum number of edges traversed across all roots.
    pub traversal_budget: u64,
}

impl Default for AssignConfig {
    fn default() -> Self {
        Self {
            traversal_budget: DEFAULT_TRAVERSAL_BUDGET,
        }
    }
}

impl AssignConfig {
    /// Returns a copy with `traversal_budget` replaced.
    pub fn with_traversal_budget(mut self, budget: u64) -> Self {
        self.traversal_budget = budget;
        self
    }
}
