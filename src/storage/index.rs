//! Record Index
//!
//! In-memory map from path to the highest record number observed for it.

use std::collections::HashMap;

use crate::error::{Result, RivuletError};

/// Latest record number per path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordIndex {
    latest: HashMap<String, i32>,
}

impl RecordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the entry for `path` to `record` if it is higher
    pub fn observe(&mut self, path: &str, record: i32) {
        match self.latest.get_mut(path) {
            Some(latest) => {
                if record > *latest {
                    *latest = record;
                }
            }
            None => {
                self.latest.insert(path.to_string(), record);
            }
        }
    }

    /// Highest record number stored for `path`
    pub fn latest(&self, path: &str) -> Option<i32> {
        self.latest.get(path).copied()
    }

    /// Record number the next append of these paths receives.
    ///
    /// One past the highest entry among `paths`, or 0 when none is indexed.
    /// Fails once a path already holds `i32::MAX`.
    pub fn next_record<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> Result<i32> {
        paths
            .into_iter()
            .filter_map(|p| self.latest(p))
            .fold(-1, i32::max)
            .checked_add(1)
            .ok_or_else(|| RivuletError::InvalidArgument("record numbers exhausted".to_string()))
    }

    pub fn clear(&mut self) {
        self.latest.clear();
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    /// Entries sorted by path
    pub fn entries(&self) -> Vec<(&str, i32)> {
        let mut entries: Vec<_> = self.latest.iter().map(|(p, r)| (p.as_str(), *r)).collect();
        entries.sort_unstable();
        entries
    }
}
