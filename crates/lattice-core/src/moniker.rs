// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Moniker assignment.
//!
//! A moniker names a resource by the shortest path through which the program
//! reaches it: `"{type}::{root}::{label}::{label}..."`. Paths are walked from
//! every root in root order with an explicit stack.
//!
//! Rules for a resource object reached through a path of `n` edges:
//! - already reached through fewer edges: prune, the shorter path owns it;
//! - first visit, or fewer edges than before: install the candidate and keep
//!   walking;
//! - same number of edges: the smaller moniker wins (compared segment by
//!   segment), and the walk continues through the object only when the
//!   candidate strictly won.
//!
//! Non-resource objects are pass-through. A back edge to an object already on
//! the current path is skipped; the sorter reports the cycle.
use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument, trace};

use crate::config::AssignConfig;
use crate::error::SnapshotError;
use crate::graph::ObjectGraph;
use crate::ident::{ObjectId, TypeToken};
use crate::record::{EdgeRecord, RootRecord};

/// Separator between moniker segments.
pub const MONIKER_DELIMITER: &str = "::";

const ESCAPE: char = '\\';

/// Deterministic, path-derived name of a resource.
///
/// A moniker is a sequence of segments: type, root name, then one edge label
/// per hop. Equality and ordering compare segment by segment, so appending
/// the same suffix to two monikers never changes which one is smaller.
///
/// The rendered form joins segments with [`MONIKER_DELIMITER`]. Backslashes
/// are escaped, as is any `:` that could be read as part of a delimiter
/// (leading, trailing, or next to another `:`), so distinct segment sequences
/// never render alike. Single inner colons such as
/// `aws:s3:Bucket` render unchanged.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", from = "String"))]
pub struct Moniker {
    segments: Vec<String>,
    rendered: String,
}

impl Moniker {
    /// Parses a rendered moniker (e.g. one read back from a prior snapshot).
    ///
    /// The stored rendering is normalised, so [`Moniker::as_str`] may differ
    /// from `text` when `text` left an ambiguous colon unescaped.
    pub fn new(text: impl AsRef<str>) -> Self {
        Self::from_segments(parse_segments(text.as_ref()))
    }

    /// Renders the moniker for an object of type `ty` reached from `root`
    /// through edges labelled `labels`.
    pub fn from_path<S: AsRef<str>>(ty: &TypeToken, root: &str, labels: &[S]) -> Self {
        let mut segments = Vec::with_capacity(labels.len() + 2);
        segments.push(ty.as_str().to_owned());
        segments.push(root.to_owned());
        segments.extend(labels.iter().map(|l| l.as_ref().to_owned()));
        Self::from_segments(segments)
    }

    fn from_segments(segments: Vec<String>) -> Self {
        let mut rendered = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                rendered.push_str(MONIKER_DELIMITER);
            }
            escape_into(&mut rendered, segment);
        }
        Self { segments, rendered }
    }

    /// Returns the rendered moniker.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    /// Returns the unescaped segments: type, root, then edge labels.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

fn escape_into(out: &mut String, segment: &str) {
    let chars: Vec<char> = segment.chars().collect();
    let last = chars.len().saturating_sub(1);
    for (i, &c) in chars.iter().enumerate() {
        let ambiguous_colon = c == ':'
            && (i == 0
                || i == last
                || chars[i - 1] == ':'
                || chars.get(i + 1) == Some(&':'));
        if c == ESCAPE || ambiguous_colon {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

fn parse_segments(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ESCAPE => current.push(chars.next().unwrap_or(ESCAPE)),
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}

impl fmt::Display for Moniker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

impl fmt::Debug for Moniker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Moniker").field(&self.rendered).finish()
    }
}

impl From<String> for Moniker {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<Moniker> for String {
    fn from(moniker: Moniker) -> Self {
        moniker.rendered
    }
}

/// Object → moniker assignment produced by one pass.
pub type MonikerMap = BTreeMap<ObjectId, Moniker>;

/// Assigns a moniker to every resource reachable from `graph`'s roots.
#[instrument(level = "debug", skip_all, fields(roots = graph.roots().len()))]
pub fn assign_monikers<G>(graph: &G, config: &AssignConfig) -> Result<MonikerMap, SnapshotError>
where
    G: ObjectGraph + ?Sized,
{
    let mut assignor = Assignor {
        graph,
        budget: config.traversal_budget,
        steps: 0,
        shortest: FxHashMap::default(),
        monikers: MonikerMap::new(),
    };
    for root in graph.roots() {
        assignor.walk(root)?;
    }
    debug!(
        resources = assignor.monikers.len(),
        edges_walked = assignor.steps,
        "assigned monikers"
    );
    Ok(assignor.monikers)
}

struct Frame<'g> {
    object: ObjectId,
    edges: std::slice::Iter<'g, EdgeRecord>,
}

struct Assignor<'g, G: ?Sized> {
    graph: &'g G,
    budget: u64,
    steps: u64,
    /// Shortest path length (in edges) seen so far per resource object.
    shortest: FxHashMap<ObjectId, usize>,
    monikers: MonikerMap,
}

impl<'g, G> Assignor<'g, G>
where
    G: ObjectGraph + ?Sized,
{
    fn walk(&mut self, root: &'g RootRecord) -> Result<(), SnapshotError> {
        let graph = self.graph;
        // Invariant: `path.len() + 1 == stack.len()` between iterations.
        let mut path: Vec<&'g str> = Vec::new();
        let mut on_path: FxHashSet<ObjectId> = FxHashSet::default();

        if !self.visit(root, root.object, &path) {
            return Ok(());
        }
        on_path.insert(root.object);
        let mut stack = vec![Frame {
            object: root.object,
            edges: graph.edges_from(&root.object).iter(),
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(edge) = frame.edges.next() else {
                if let Some(done) = stack.pop() {
                    on_path.remove(&done.object);
                }
                path.pop();
                continue;
            };
            if on_path.contains(&edge.to) {
                trace!(from = %edge.from, to = %edge.to, "skipping back edge");
                continue;
            }
            self.steps += 1;
            if self.steps > self.budget {
                return Err(SnapshotError::TraversalBudgetExceeded {
                    budget: self.budget,
                });
            }
            path.push(edge.label.as_str());
            if self.visit(root, edge.to, &path) {
                on_path.insert(edge.to);
                stack.push(Frame {
                    object: edge.to,
                    edges: graph.edges_from(&edge.to).iter(),
                });
            } else {
                path.pop();
            }
        }
        Ok(())
    }

    /// Records `object` as reached through `path`; returns whether the walk
    /// should continue through its out-edges.
    fn visit(&mut self, root: &RootRecord, object: ObjectId, path: &[&str]) -> bool {
        let graph = self.graph;
        let Some(record) = graph.object(&object) else {
            return false;
        };
        if !record.resource {
            return true;
        }

        let len = path.len();
        let previous = self.shortest.get(&object).copied();
        if previous.is_some_and(|shortest| shortest < len) {
            return false;
        }

        let candidate = Moniker::from_path(&record.ty, &root.name, path);
        if previous == Some(len) {
            if let Some(existing) = self.monikers.get(&object) {
                if candidate >= *existing {
                    return false;
                }
            }
        }
        trace!(object = %object, moniker = %candidate, len, "installing moniker");
        self.shortest.insert(object, len);
        self.monikers.insert(object, candidate);
        true
    }
}
