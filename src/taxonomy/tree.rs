//! In-memory category tree built from a flat node snapshot.
//!
//! The snapshot is treated as immutable. It is assumed to be a forest, but it is
//! not trusted to be one: duplicate ids are tolerated (first wins) and a cycle is
//! reported as `ResolveError::CycleDetected` instead of looping.

use std::collections::{HashMap, HashSet};

use crate::domain::TaxonomyNode;
use crate::error::ResolveError;

/// Normalize a label for matching: trimmed, case-insensitive.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Case-insensitive, whitespace-trimmed label equality.
pub fn labels_match(a: &str, b: &str) -> bool {
    normalize_label(a) == normalize_label(b)
}

#[derive(Debug, Clone, Default)]
pub struct TaxonomyTree {
    /// Nodes in snapshot order, de-duplicated by id.
    nodes: Vec<TaxonomyNode>,
    index: HashMap<i64, usize>,
    children: HashMap<i64, Vec<usize>>,
    roots: Vec<usize>,
}

impl TaxonomyTree {
    pub fn from_nodes(nodes: impl IntoIterator<Item = TaxonomyNode>) -> Self {
        let mut tree = TaxonomyTree::default();

        for node in nodes {
            if tree.index.contains_key(&node.id) {
                tracing::warn!(id = node.id, name = %node.name, "duplicate taxonomy id; keeping first");
                continue;
            }
            let idx = tree.nodes.len();
            tree.index.insert(node.id, idx);
            match node.parent_id {
                Some(parent) => tree.children.entry(parent).or_default().push(idx),
                None => tree.roots.push(idx),
            }
            tree.nodes.push(node);
        }

        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[TaxonomyNode] {
        &self.nodes
    }

    pub fn get(&self, id: i64) -> Option<&TaxonomyNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    pub fn roots(&self) -> impl Iterator<Item = &TaxonomyNode> {
        self.roots.iter().map(|&i| &self.nodes[i])
    }

    pub fn parent(&self, id: i64) -> Option<&TaxonomyNode> {
        self.get(id)
            .and_then(|n| n.parent_id)
            .and_then(|p| self.get(p))
    }

    /// Direct children of `id`, in snapshot order. Unknown ids have no children.
    pub fn children(&self, id: i64) -> Vec<&TaxonomyNode> {
        self.children
            .get(&id)
            .map(|v| v.iter().map(|&i| &self.nodes[i]).collect())
            .unwrap_or_default()
    }

    /// First node (snapshot order) satisfying `predicate`.
    pub fn find<P>(&self, mut predicate: P) -> Option<&TaxonomyNode>
    where
        P: FnMut(&TaxonomyNode) -> bool,
    {
        self.nodes.iter().find(|n| predicate(n))
    }

    pub fn find_by_name(&self, label: &str) -> Option<&TaxonomyNode> {
        let wanted = normalize_label(label);
        self.find(|n| normalize_label(&n.name) == wanted)
    }

    pub fn find_child_by_name(&self, parent: i64, label: &str) -> Option<&TaxonomyNode> {
        let wanted = normalize_label(label);
        self.children(parent)
            .into_iter()
            .find(|n| normalize_label(&n.name) == wanted)
    }

    /// Walk down from the roots matching one label per level, e.g.
    /// `["Root", "CV", "India"]`.
    ///
    /// If the first label names no root, the walk is attempted from every node
    /// carrying that label, so callers can address a subtree without knowing the
    /// designated root.
    pub fn find_by_name_path<S: AsRef<str>>(&self, labels: &[S]) -> Option<&TaxonomyNode> {
        let (first, rest) = labels.split_first()?;
        let first = first.as_ref();

        let starts: Vec<&TaxonomyNode> = {
            let roots: Vec<_> = self.roots().filter(|n| labels_match(&n.name, first)).collect();
            if roots.is_empty() {
                self.nodes.iter().filter(|n| labels_match(&n.name, first)).collect()
            } else {
                roots
            }
        };

        starts.into_iter().find_map(|start| {
            rest.iter().try_fold(start, |node, label| {
                self.find_child_by_name(node.id, label.as_ref())
            })
        })
    }

    /// Root-first id chain ending at `id`.
    pub fn path_to_root(&self, id: i64) -> Result<Vec<i64>, ResolveError> {
        let mut node = self.get(id).ok_or(ResolveError::NodeNotFound(id))?;
        let mut chain = vec![node.id];
        let mut seen: HashSet<i64> = HashSet::from([node.id]);

        while let Some(parent_id) = node.parent_id {
            if !seen.insert(parent_id) {
                chain.push(parent_id);
                chain.reverse();
                tracing::error!(node = id, chain = ?chain, "taxonomy cycle detected");
                return Err(ResolveError::CycleDetected { node: id, chain });
            }
            node = self.get(parent_id).ok_or(ResolveError::DanglingParent {
                node: node.id,
                parent: parent_id,
            })?;
            chain.push(node.id);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Check every node for cycles. Dangling parents are not reported here.
    pub fn validate(&self) -> Result<(), ResolveError> {
        for node in &self.nodes {
            match self.path_to_root(node.id) {
                Ok(_) | Err(ResolveError::DanglingParent { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
