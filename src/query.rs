//! Query Module
//!
//! Full-scan retrieval of one record type, with an optional predicate.

use std::collections::{HashMap, HashSet};

use crate::datum::Status;
use crate::engine::Engine;
use crate::error::Result;
use crate::mapping::Record;

/// A full-scan query over `T` objects
///
/// Results come back in order of each record number's first appearance
/// in the file, not sorted by record number.
pub struct Query<'e, T: Record> {
    engine: &'e Engine,
    predicate: Option<Box<dyn Fn(&T) -> bool + 'e>>,
}

impl<'e, T: Record> Query<'e, T> {
    pub(crate) fn new(engine: &'e Engine) -> Self {
        Self {
            engine,
            predicate: None,
        }
    }

    /// Keep only objects matching `predicate`, applied after the scan
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + 'e,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Scan the whole log and build the result set
    ///
    /// Only Normal datums whose path hash belongs to `T` contribute. A
    /// datum whose payload does not fit its field is skipped. A datum that
    /// cannot be decoded ends the scan; objects built so far are still
    /// returned.
    pub fn run(self) -> Result<Vec<T>> {
        let hashes: HashSet<i32> = T::path_hashes();
        let mut results: Vec<T> = Vec::new();
        let mut by_record: HashMap<i32, usize> = HashMap::new();

        let mut reader = self.engine.reader()?;
        loop {
            let datum = match reader.next_datum() {
                Ok(Some(datum)) => datum,
                Ok(None) => break,
                Err(e) if e.is_format_fault() => {
                    tracing::warn!(
                        offset = reader.offset(),
                        error = %e,
                        "query stopped at unreadable datum"
                    );
                    break;
                }
                Err(e) => return Err(e),
            };

            if datum.status != Status::Normal || !hashes.contains(&datum.path_hash()) {
                continue;
            }

            let applied = match by_record.get(&datum.record) {
                Some(&slot) => results[slot].apply_datum(&datum),
                None => {
                    let mut obj = T::default();
                    obj.meta_mut().record = datum.record;
                    let applied = obj.apply_datum(&datum);
                    if let Ok(true) = applied {
                        by_record.insert(datum.record, results.len());
                        results.push(obj);
                    }
                    applied
                }
            };

            // Another record type may map the same path with a different kind
            if let Err(e) = applied {
                tracing::warn!(
                    path = datum.path(),
                    record = datum.record,
                    error = %e,
                    "query skipped datum that does not fit the mapping"
                );
            }
        }

        if let Some(predicate) = &self.predicate {
            results.retain(|obj| predicate(obj));
        }

        tracing::debug!(results = results.len(), "query complete");
        Ok(results)
    }
}
