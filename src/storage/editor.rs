//! In-place Editor
//!
//! Bounded overwrites of a single datum's status byte or payload bytes.
//! Nothing is ever shifted: a datum keeps its position and its declared
//! sizes for its whole life.

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use crate::config::SyncStrategy;
use crate::datum::{path_hash, DatumHeader, Status, HEADER_SIZE, STATUS_OFFSET};
use crate::error::{Result, RivuletError};

use super::reader::DatumReader;

/// Performs in-place edits on one log file
pub struct DatumEditor<'a> {
    path: &'a Path,
    sync_strategy: SyncStrategy,
    buffer_size: usize,
}

impl<'a> DatumEditor<'a> {
    pub fn new(path: &'a Path, sync_strategy: SyncStrategy, buffer_size: usize) -> Self {
        Self {
            path,
            sync_strategy,
            buffer_size,
        }
    }

    /// Find the first datum whose path hash and record match.
    ///
    /// Matching compares hashes only: two paths with the same hash and
    /// record number are indistinguishable, and the earlier one wins.
    /// Status is not considered, so a Deleted datum can be restored.
    pub fn locate(&self, field_path: &str, record: i32) -> Result<Option<(u64, DatumHeader)>> {
        self.find(field_path, record, u64::MAX, |_| true)
    }

    /// Like `locate`, but passes over Deleted datums and ignores anything
    /// starting at or after byte `end`
    pub fn locate_live(
        &self,
        field_path: &str,
        record: i32,
        end: u64,
    ) -> Result<Option<(u64, DatumHeader)>> {
        self.find(field_path, record, end, |header| header.status != Status::Deleted)
    }

    fn find<F>(
        &self,
        field_path: &str,
        record: i32,
        end: u64,
        accept: F,
    ) -> Result<Option<(u64, DatumHeader)>>
    where
        F: Fn(&DatumHeader) -> bool,
    {
        let hash = path_hash(field_path);
        let mut reader = DatumReader::open(self.path, self.buffer_size)?;

        loop {
            match reader.next_header() {
                Ok(Some((offset, _))) if offset >= end => return Ok(None),
                Ok(Some((offset, header))) => {
                    if header.path_hash == hash && header.record == record && accept(&header) {
                        return Ok(Some((offset, header)));
                    }
                }
                Ok(None) => return Ok(None),
                Err(e) if e.is_format_fault() => {
                    tracing::warn!(
                        offset = reader.offset(),
                        error = %e,
                        "stopping locate scan at unreadable datum"
                    );
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Overwrite the status byte of the matching datum
    pub fn set_status(&self, field_path: &str, record: i32, status: Status) -> Result<bool> {
        let Some((offset, _)) = self.locate(field_path, record)? else {
            return Ok(false);
        };

        self.write_at(offset + STATUS_OFFSET, &[status.as_byte()])?;
        tracing::debug!(path = field_path, record, offset, %status, "datum status changed");
        Ok(true)
    }

    /// Overwrite the leading payload bytes of the matching datum.
    ///
    /// The stored payload size is left as is; a shorter payload only
    /// replaces its own length worth of bytes.
    pub fn set_payload(&self, field_path: &str, record: i32, payload: &[u8]) -> Result<bool> {
        let Some((offset, header)) = self.locate(field_path, record)? else {
            return Ok(false);
        };

        if payload.len() > header.payload_size {
            return Err(RivuletError::PayloadOverflow {
                max_size: header.payload_size,
            });
        }

        let payload_offset = offset + (HEADER_SIZE + header.path_size) as u64;
        self.write_at(payload_offset, payload)?;
        tracing::debug!(
            path = field_path,
            record,
            offset,
            len = payload.len(),
            "datum payload overwritten"
        );
        Ok(true)
    }

    /// Mark the first live datum before byte `end` as Deleted
    pub fn supersede(&self, field_path: &str, record: i32, end: u64) -> Result<bool> {
        let Some((offset, _)) = self.locate_live(field_path, record, end)? else {
            return Ok(false);
        };

        self.write_at(offset + STATUS_OFFSET, &[Status::Deleted.as_byte()])?;
        tracing::debug!(path = field_path, record, offset, "datum superseded");
        Ok(true)
    }

    fn write_at(&self, offset: u64, bytes: &[u8]) -> Result<()> {
        let mut file = OpenOptions::new().write(true).open(self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(bytes)?;
        if self.sync_strategy == SyncStrategy::EveryWrite {
            file.sync_data()?;
        }
        Ok(())
    }
}
