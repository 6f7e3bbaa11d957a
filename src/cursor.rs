//! Cursor Module
//!
//! Forward-only, single-pass reader that regroups consecutive datums into
//! one object per record number, in file order.
//!
//! Grouping relies on a record's datums being contiguous, which holds for
//! logs written only through `append`. After updates the replacement
//! datums sit at the end of the file out of sequence; use a `Query` there.

use std::collections::HashSet;
use std::marker::PhantomData;

use crate::datum::{Datum, Status};
use crate::error::Result;
use crate::mapping::Record;
use crate::storage::DatumReader;

/// Sequential reader of `T` objects
///
/// Not seekable; open a new cursor to start again from byte 0.
pub struct Cursor<T: Record> {
    reader: DatumReader,
    /// Paths mapped by `T`
    paths: HashSet<&'static str>,
    /// Record number the next object is assembled from
    expected: i32,
    /// First datum of a later record, read while closing the current one
    carried: Option<Datum>,
    finished: bool,
    _record: PhantomData<T>,
}

impl<T: Record> Cursor<T> {
    pub(crate) fn new(reader: DatumReader) -> Self {
        Self {
            reader,
            paths: T::paths().into_iter().collect(),
            expected: 0,
            carried: None,
            finished: false,
            _record: PhantomData,
        }
    }

    /// True while unread bytes remain
    pub fn has_next(&self) -> bool {
        !self.finished && (self.carried.is_some() || self.reader.has_remaining())
    }

    /// Record number the next call to `next` looks for
    pub fn expected_record(&self) -> i32 {
        self.expected
    }

    /// Gather datums of the expected record until every path is seen, a
    /// later record starts, or the stream ends
    fn collect_group(&mut self) -> Result<Vec<Datum>> {
        let mut group = Vec::new();
        let mut seen: HashSet<&'static str> = HashSet::new();

        loop {
            let datum = match self.carried.take() {
                Some(datum) => datum,
                None => match self.reader.next_datum() {
                    Ok(Some(datum)) => datum,
                    Ok(None) => break,
                    Err(e) if e.is_format_fault() => {
                        tracing::warn!(
                            offset = self.reader.offset(),
                            error = %e,
                            "cursor stopped at unreadable datum"
                        );
                        self.finished = true;
                        break;
                    }
                    Err(e) => {
                        self.finished = true;
                        return Err(e);
                    }
                },
            };

            if datum.status == Status::Deleted {
                continue;
            }
            let Some(&path) = self.paths.get(datum.path()) else {
                continue;
            };

            if datum.record == self.expected {
                seen.insert(path);
                group.push(datum);
                if seen.len() == self.paths.len() {
                    break;
                }
            } else if datum.record > self.expected {
                self.carried = Some(datum);
                break;
            }
        }

        Ok(group)
    }
}

impl<T: Record> Iterator for Cursor<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if !self.has_next() {
                return None;
            }

            let group = match self.collect_group() {
                Ok(group) => group,
                Err(e) => return Some(Err(e)),
            };

            if group.is_empty() {
                // Expected record has no live datums; resume at the next one
                match &self.carried {
                    Some(datum) => {
                        self.expected = datum.record;
                        continue;
                    }
                    None => return None,
                }
            }

            let record = self.expected;
            match record.checked_add(1) {
                Some(next) => self.expected = next,
                None => self.finished = true,
            }
            return Some(T::from_datums(record, &group));
        }
    }
}
