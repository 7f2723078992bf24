// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Path-compressed (radix) trie over normalized entry forms.
//!
//! Phrases are stored verbatim - spaces and hyphens are ordinary bytes - so
//! a prefix query containing a space walks into phrase territory like any
//! other. Labels are byte slices, not chars: a query may legally end in the
//! middle of a multi-byte character and prefix matching still works.
//!
//! Every node caches the maximum entry frequency in its subtree. Prefix
//! enumeration is a best-first walk over that hint, so "top 10 completions
//! of 'hel'" never visits the cold parts of a 500k-entry subtree.
//!
//! Ranking for `prefix`: max subtree frequency desc, then terminal
//! frequency desc, then entry index asc. Fully deterministic.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Node {
    /// Edge label from the parent, possibly mid-codepoint on split nodes.
    label: Vec<u8>,
    children: Vec<u32>,
    /// Entry index when a key terminates here.
    entry: Option<u32>,
    /// Frequency of the terminating entry; 0 when `entry` is None.
    terminal_freq: f32,
    /// Max frequency across this node's whole subtree (self included).
    max_freq: f32,
}

impl Node {
    fn leaf(label: Vec<u8>, entry: u32, freq: f32) -> Self {
        Node {
            label,
            children: Vec::new(),
            entry: Some(entry),
            terminal_freq: freq,
            max_freq: freq,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrieIndex {
    /// Arena; nodes[0] is the root with an empty label.
    nodes: Vec<Node>,
    len: usize,
}

impl Default for TrieIndex {
    fn default() -> Self {
        TrieIndex {
            nodes: vec![Node {
                label: Vec::new(),
                children: Vec::new(),
                entry: None,
                terminal_freq: 0.0,
                max_freq: 0.0,
            }],
            len: 0,
        }
    }
}

/// Max-heap key over f32 subtree hints.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapKey(f32);

impl Eq for HeapKey {}

impl PartialOrd for HeapKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

impl TrieIndex {
    /// Build from `(normalized, index, frequency)` triples. Insertion order
    /// does not matter; the structure is canonical for a given key set.
    pub fn build<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u32, f32)>,
    {
        let mut trie = TrieIndex::default();
        for (key, index, freq) in items {
            trie.insert(key.as_bytes(), index, freq);
        }
        trie
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn insert(&mut self, key: &[u8], index: u32, freq: f32) {
        if key.is_empty() {
            return;
        }

        let mut node_id = 0usize;
        let mut rest = key;

        loop {
            self.nodes[node_id].max_freq = self.nodes[node_id].max_freq.max(freq);

            if rest.is_empty() {
                let node = &mut self.nodes[node_id];
                // First writer wins: duplicate normalized forms across
                // languages resolve to the smallest entry index, matching
                // the corpus' language-less lookup.
                if node.entry.is_none() {
                    node.entry = Some(index);
                    node.terminal_freq = freq;
                    self.len += 1;
                }
                return;
            }

            let child_pos = self.nodes[node_id]
                .children
                .iter()
                .position(|&c| self.nodes[c as usize].label[0] == rest[0]);

            let Some(pos) = child_pos else {
                let leaf = Node::leaf(rest.to_vec(), index, freq);
                let leaf_id = self.push(leaf);
                self.nodes[node_id].children.push(leaf_id);
                self.len += 1;
                return;
            };

            let child_id = self.nodes[node_id].children[pos] as usize;
            let common = common_prefix(&self.nodes[child_id].label, rest);

            if common == self.nodes[child_id].label.len() {
                // Full edge consumed; descend.
                node_id = child_id;
                rest = &rest[common..];
                continue;
            }

            // Partial match: split the child's edge at `common`.
            let child_suffix = self.nodes[child_id].label.split_off(common);
            let mid_label = std::mem::replace(&mut self.nodes[child_id].label, child_suffix);
            let child_max = self.nodes[child_id].max_freq;

            let mid = Node {
                label: mid_label,
                children: vec![child_id as u32],
                entry: None,
                terminal_freq: 0.0,
                max_freq: child_max.max(freq),
            };
            let mid_id = self.push(mid);
            self.nodes[node_id].children[pos] = mid_id;

            if common == rest.len() {
                let mid = &mut self.nodes[mid_id as usize];
                mid.entry = Some(index);
                mid.terminal_freq = freq;
            } else {
                let leaf = Node::leaf(rest[common..].to_vec(), index, freq);
                let leaf_id = self.push(leaf);
                self.nodes[mid_id as usize].children.push(leaf_id);
            }
            self.len += 1;
            return;
        }
    }

    fn push(&mut self, node: Node) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(node);
        id
    }

    /// Exact lookup, O(|query|).
    pub fn exact(&self, query: &str) -> Option<u32> {
        if query.is_empty() {
            return None;
        }
        let mut node_id = 0usize;
        let mut rest = query.as_bytes();

        while !rest.is_empty() {
            let child = self.nodes[node_id]
                .children
                .iter()
                .map(|&c| c as usize)
                .find(|&c| self.nodes[c].label[0] == rest[0])?;

            let label = &self.nodes[child].label;
            if rest.len() < label.len() || &rest[..label.len()] != label.as_slice() {
                return None;
            }
            rest = &rest[label.len()..];
            node_id = child;
        }

        self.nodes[node_id].entry
    }

    /// Top-k completions of `prefix`, ranked by the subtree hints.
    pub fn prefix(&self, prefix: &str, k: usize) -> Vec<u32> {
        if prefix.is_empty() || k == 0 {
            return Vec::new();
        }

        // Locate the node whose subtree holds everything starting with
        // `prefix`. The walk may stop mid-edge; that is still a match as
        // long as the consumed part of the label agrees.
        let mut node_id = 0usize;
        let mut rest = prefix.as_bytes();

        while !rest.is_empty() {
            let Some(child) = self.nodes[node_id]
                .children
                .iter()
                .map(|&c| c as usize)
                .find(|&c| self.nodes[c].label[0] == rest[0])
            else {
                return Vec::new();
            };

            let label = &self.nodes[child].label;
            let common = common_prefix(label, rest);
            if common == rest.len() {
                // Query exhausted inside (or exactly at) this edge.
                node_id = child;
                rest = &[];
            } else if common == label.len() {
                node_id = child;
                rest = &rest[common..];
            } else {
                return Vec::new();
            }
        }

        self.collect_ranked(node_id, k)
    }

    /// Best-first enumeration of terminals under `root`, bounded by k.
    fn collect_ranked(&self, root: usize, k: usize) -> Vec<u32> {
        let mut heap: BinaryHeap<(HeapKey, u32)> = BinaryHeap::new();
        heap.push((HeapKey(self.nodes[root].max_freq), root as u32));

        // (subtree hint at the terminal node, terminal freq, entry index)
        let mut found: Vec<(f32, f32, u32)> = Vec::new();

        while let Some((key, id)) = heap.pop() {
            // Every undiscovered terminal sits under some heap node, so once
            // the best remaining hint cannot beat the weakest kept primary
            // key, the ranking is settled.
            if found.len() >= k {
                let weakest = found
                    .iter()
                    .map(|(hint, _, _)| *hint)
                    .fold(f32::INFINITY, f32::min);
                if key.0 < weakest {
                    break;
                }
            }

            let node = &self.nodes[id as usize];
            if let Some(entry) = node.entry {
                found.push((node.max_freq, node.terminal_freq, entry));
            }
            for &child in &node.children {
                heap.push((HeapKey(self.nodes[child as usize].max_freq), child));
            }
        }

        found.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then(b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal))
                .then(a.2.cmp(&b.2))
        });
        found.truncate(k);
        found.into_iter().map(|(_, _, index)| index).collect()
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}
