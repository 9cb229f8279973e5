//! Path keys: the join between the taxonomy and the dataset snapshot.
//!
//! Datasets are stored pre-flattened under a `stream` string holding the
//! root-to-node id chain joined with `,`. This module is the only place that
//! convention is spelled out; everything else works with `PathKey`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::DatasetEntry;
use crate::error::ResolveError;
use crate::taxonomy::tree::TaxonomyTree;

pub const PATH_DELIMITER: char = ',';

/// Root-first id chain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathKey(Vec<i64>);

impl PathKey {
    pub fn new(ids: Vec<i64>) -> Self {
        Self(ids)
    }

    pub fn ids(&self) -> &[i64] {
        &self.0
    }

    pub fn leaf(&self) -> Option<i64> {
        self.0.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{PATH_DELIMITER}")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePathKeyError(String);

impl fmt::Display for ParsePathKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid path key {:?}", self.0)
    }
}

impl std::error::Error for ParsePathKeyError {}

impl FromStr for PathKey {
    type Err = ParsePathKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParsePathKeyError(s.to_string()));
        }
        s.split(PATH_DELIMITER)
            .map(|part| part.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map(PathKey)
            .map_err(|_| ParsePathKeyError(s.to_string()))
    }
}

impl Serialize for PathKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PathKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse an entry's `stream` field.
pub fn stream_key(entry: &DatasetEntry) -> Result<PathKey, ResolveError> {
    entry
        .stream
        .parse()
        .map_err(|_| ResolveError::MalformedStream {
            entry: entry.id,
            stream: entry.stream.clone(),
        })
}

/// Joins taxonomy nodes to dataset entries through their path key.
#[derive(Debug, Clone, Copy)]
pub struct PathKeyResolver<'a> {
    tree: &'a TaxonomyTree,
}

impl<'a> PathKeyResolver<'a> {
    pub fn new(tree: &'a TaxonomyTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'a TaxonomyTree {
        self.tree
    }

    pub fn resolve(&self, node_id: i64) -> Result<PathKey, ResolveError> {
        self.tree.path_to_root(node_id).map(PathKey)
    }

    /// First entry whose stream is exactly the canonical form of `key`. Later
    /// matches are stale duplicates: they are logged, never merged.
    ///
    /// Non-canonical streams (`" 01, 2"`) never match; `verify_reference`
    /// reports them.
    pub fn find_dataset<'d>(
        &self,
        key: &PathKey,
        entries: &'d [DatasetEntry],
    ) -> Option<&'d DatasetEntry> {
        let wanted = key.to_string();
        let mut matches = entries.iter().filter(|e| e.stream == wanted);

        let first = matches.next()?;
        let shadowed: Vec<i64> = matches.map(|e| e.id).collect();
        if !shadowed.is_empty() {
            tracing::warn!(
                path_key = %key,
                chosen = first.id,
                ignored = ?shadowed,
                "ambiguous dataset match; first entry wins"
            );
        }
        Some(first)
    }

    /// Like `find_dataset`, but a miss is a typed error.
    pub fn require_dataset<'d>(
        &self,
        key: &PathKey,
        entries: &'d [DatasetEntry],
    ) -> Result<&'d DatasetEntry, ResolveError> {
        self.find_dataset(key, entries)
            .ok_or_else(|| ResolveError::NoDataset(key.clone()))
    }

    /// Check that an entry's stream is a real root-to-node path in this snapshot.
    ///
    /// Streams go stale when the taxonomy is edited after the data was written.
    pub fn verify_reference(&self, entry: &DatasetEntry) -> Result<PathKey, ResolveError> {
        let key = stream_key(entry)?;
        let unresolved = || ResolveError::UnresolvedReference {
            entry: entry.id,
            stream: key.clone(),
        };

        if entry.stream != key.to_string() {
            tracing::debug!(entry = entry.id, stream = %entry.stream, "non-canonical stream");
            return Err(unresolved());
        }

        let leaf = key.leaf().ok_or_else(unresolved)?;
        match self.resolve(leaf) {
            Ok(actual) if actual == key => Ok(actual),
            Ok(_) | Err(ResolveError::NodeNotFound(_)) | Err(ResolveError::DanglingParent { .. }) => {
                Err(unresolved())
            }
            Err(e) => Err(e),
        }
    }

    /// Every entry whose stream does not resolve, in snapshot order.
    pub fn unresolved_references(&self, entries: &[DatasetEntry]) -> Vec<ResolveError> {
        entries
            .iter()
            .filter_map(|e| self.verify_reference(e).err())
            .collect()
    }
}
