// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! BK-tree keyed by Levenshtein distance over folded forms.
//!
//! The metric-tree trick: for a query at distance d from a node, the
//! triangle inequality says any match within `max` must sit on an edge e
//! with `|e - d| <= max`. Everything else is pruned unvisited. On a natural
//! language corpus that cuts the visited set to a few percent for max <= 2.
//!
//! The distance computation at each visited node is pruned too: a node is
//! only interesting within `max` of itself (a hit) or within `max` of one
//! of its child edges (a subtree worth entering), so the DP runs through
//! the bounded `levenshtein_within` with cutoff `max_edge + max` and bails
//! mid-row for the majority of visited nodes, which are far out of range.
//!
//! Comparisons run on the accent-folded view so "cafe" reaches "café" at
//! distance 0. The caller converts raw distances to scores.

use crate::corpus::Corpus;
use crate::fuzzy::levenshtein::{levenshtein, levenshtein_within};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Node {
    entry: u32,
    key: String,
    /// `(edge distance to parent key, child node id)`.
    children: Vec<(u32, u32)>,
}

/// A hit with its raw edit distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BkMatch {
    pub index: u32,
    pub distance: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BkTreeIndex {
    /// Arena; nodes[0] is the root when non-empty.
    nodes: Vec<Node>,
}

impl BkTreeIndex {
    /// Build over every entry's folded form, in corpus index order (the
    /// structure depends on insertion order, so keep it deterministic).
    pub fn build(corpus: &Corpus) -> Self {
        let mut tree = BkTreeIndex::default();
        for (i, entry) in corpus.iter() {
            tree.insert(i, &entry.folded);
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn insert(&mut self, entry: u32, key: &str) {
        if self.nodes.is_empty() {
            self.nodes.push(Node {
                entry,
                key: key.to_string(),
                children: Vec::new(),
            });
            return;
        }

        let mut node_id = 0usize;
        loop {
            let d = levenshtein(key, &self.nodes[node_id].key) as u32;
            // Distance 0 is an ordinary edge: distinct entries may share a
            // folded form (accents, cross-language duplicates).
            match self.nodes[node_id]
                .children
                .iter()
                .find(|(edge, _)| *edge == d)
            {
                Some(&(_, child)) => node_id = child as usize,
                None => {
                    let child_id = self.nodes.len() as u32;
                    self.nodes.push(Node {
                        entry,
                        key: key.to_string(),
                        children: Vec::new(),
                    });
                    self.nodes[node_id].children.push((d, child_id));
                    return;
                }
            }
        }
    }

    /// All entries within `max_distance` of the folded query, nearest first,
    /// capped at `k`. Ties break on entry index.
    pub fn search(&self, folded_query: &str, max_distance: u32, k: usize) -> Vec<BkMatch> {
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut matches = Vec::new();
        let mut stack = vec![0u32];

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            // Past max_edge + max the node can neither match nor admit any
            // child (edge e qualifies only when d <= e + max <= cutoff), so
            // the bounded DP may abandon the computation there.
            let max_edge = node.children.iter().map(|&(e, _)| e).max().unwrap_or(0);
            let cutoff = (max_edge + max_distance) as usize;
            let Some(d) = levenshtein_within(folded_query, &node.key, cutoff) else {
                continue;
            };
            let d = d as u32;

            if d <= max_distance {
                matches.push(BkMatch {
                    index: node.entry,
                    distance: d,
                });
            }
            for &(edge, child) in &node.children {
                if edge.abs_diff(d) <= max_distance {
                    stack.push(child);
                }
            }
        }

        matches.sort_by(|a, b| a.distance.cmp(&b.distance).then(a.index.cmp(&b.index)));
        matches.truncate(k);
        matches
    }
}

/// Distance budget for a query: `clamp(ceil(len / 4), 1, 4)`. Bounds the
/// traversal and tracks typical typo density.
pub fn suggested_max_distance(query_len: usize) -> u32 {
    (query_len.div_ceil(4) as u32).clamp(1, 4)
}
