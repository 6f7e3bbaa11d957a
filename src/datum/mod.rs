//! Datum Module
//!
//! A datum is the atomic persisted unit: one field of one record, carrying
//! enough metadata to be read back without any schema.
//!
//! ## Responsibilities
//! - Hold a field's path, record number, lifecycle status and raw payload
//! - Encode/decode the fixed-header wire form (see `codec`)
//! - Reinterpret payloads as typed values (see `value`)
//!
//! ## Wire Format
//! ```text
//! ┌─────────────┬────────────┬──────────────┬────────────┬──────────────┬──────────────┬──────┬─────────┐
//! │ Version (1) │ Status (1) │ PathHash (4) │ Record (4) │ PathSize (4) │ PayloadSz(4) │ Path │ Payload │
//! └─────────────┴────────────┴──────────────┴────────────┴──────────────┴──────────────┴──────┴─────────┘
//! ```
//! All integers are big-endian. Datums follow each other with no padding.

mod codec;
mod value;

pub use codec::{DatumHeader, HEADER_SIZE, MAX_SECTION_SIZE, STATUS_OFFSET};
pub use value::ValueKind;

use crate::error::{Result, RivuletError};
use crate::ENGINE_VERSION;

/// Lifecycle tag stored in every datum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Status {
    /// Live value
    #[default]
    Normal = 0,

    /// Provisional replacement, cleared by the next update or compaction
    Updated = 1,

    /// Superseded or removed; dropped by compaction
    Deleted = 2,
}

impl Status {
    /// Create from the on-disk byte
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Status::Normal),
            1 => Ok(Status::Updated),
            2 => Ok(Status::Deleted),
            other => Err(RivuletError::Corrupt(format!("unknown status byte {}", other))),
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Normal => "normal",
            Status::Updated => "updated",
            Status::Deleted => "deleted",
        };
        f.pad(name)
    }
}

/// Hash of a path as stored in the datum header.
///
/// Polynomial hash (multiplier 31) over the UTF-16 code units of the path,
/// with wrapping 32-bit arithmetic. Distinct paths may collide.
pub fn path_hash(path: &str) -> i32 {
    path.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

/// One serialized field unit: header + path + payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datum {
    /// Format version of the engine that wrote this datum
    pub version: u8,

    /// Lifecycle tag
    pub status: Status,

    /// Groups datums belonging to the same logical row
    pub record: i32,

    /// Field value in its native binary encoding
    pub payload: Vec<u8>,

    path: String,
    path_hash: i32,
}

impl Datum {
    /// Create a Normal datum for `path` with a raw payload.
    ///
    /// The record number stays 0 until the engine assigns one on append.
    pub fn new(path: impl Into<String>, payload: Vec<u8>) -> Self {
        let path = path.into();
        let path_hash = path_hash(&path);
        Self {
            version: ENGINE_VERSION,
            status: Status::Normal,
            record: 0,
            payload,
            path,
            path_hash,
        }
    }

    /// Rebuild a datum exactly as it was read from disk
    pub(crate) fn from_parts(header: &DatumHeader, path: String, payload: Vec<u8>) -> Self {
        Self {
            version: header.version,
            status: header.status,
            record: header.record,
            payload,
            path,
            path_hash: header.path_hash,
        }
    }

    /// Builder-style record number
    pub fn with_record(mut self, record: i32) -> Self {
        self.record = record;
        self
    }

    /// Builder-style status
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Hash of the path, as stored in the header
    pub fn path_hash(&self) -> i32 {
        self.path_hash
    }

    /// Byte length of the UTF-8 path
    pub fn path_size(&self) -> usize {
        self.path.len()
    }

    pub fn payload_size(&self) -> usize {
        self.payload.len()
    }

    /// Identifies one (path, record) slot
    pub fn signature(&self) -> i32 {
        path_hash(&format!("{}:{}", self.path, self.record))
    }
}
