//! Datum codec
//!
//! Encoding and decoding of the fixed-header wire form.
//!
//! ## Header Layout
//! ```text
//! Offset  Field        Size
//! 0       version      1
//! 1       status       1
//! 2       path hash    4
//! 6       record       4
//! 10      path size    4
//! 14      payload size 4
//! 18      path         n
//! 18+n    payload      m
//! ```

use std::io::{self, Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use super::{Datum, Status};
use crate::error::{Result, RivuletError};

/// Fixed header size: 1 + 1 + 4 + 4 + 4 + 4
pub const HEADER_SIZE: usize = 18;

/// Offset of the status byte within a datum
pub const STATUS_OFFSET: u64 = 1;

/// Largest path or payload section the decoder accepts (64 MB)
pub const MAX_SECTION_SIZE: usize = 64 * 1024 * 1024;

// =============================================================================
// Header
// =============================================================================

/// The fixed 18-byte prefix of a datum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatumHeader {
    pub version: u8,
    pub status: Status,
    pub path_hash: i32,
    pub record: i32,
    pub path_size: usize,
    pub payload_size: usize,
}

impl DatumHeader {
    /// Parse a complete header buffer
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Result<Self> {
        let mut buf = &bytes[..];

        let version = buf.get_u8();
        let status = Status::from_byte(buf.get_u8())?;
        let path_hash = buf.get_i32();
        let record = buf.get_i32();
        let path_size = section_size("path", buf.get_i32())?;
        let payload_size = section_size("payload", buf.get_i32())?;

        Ok(Self {
            version,
            status,
            path_hash,
            record,
            path_size,
            payload_size,
        })
    }

    /// Read the next header from a stream.
    ///
    /// Returns `Ok(None)` when fewer than `HEADER_SIZE` bytes remain.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        let mut bytes = [0u8; HEADER_SIZE];
        let filled = read_full(reader, &mut bytes)?;
        if filled < HEADER_SIZE {
            if filled > 0 {
                tracing::debug!(trailing = filled, "partial datum header at end of stream");
            }
            return Ok(None);
        }
        Self::parse(&bytes).map(Some)
    }

    /// Bytes following the header (path + payload)
    pub fn body_len(&self) -> u64 {
        (self.path_size + self.payload_size) as u64
    }

    /// Total on-disk size of the datum this header starts
    pub fn encoded_len(&self) -> u64 {
        HEADER_SIZE as u64 + self.body_len()
    }

    /// Read the path and payload that follow this header
    pub fn read_body<R: Read>(&self, reader: &mut R) -> Result<Datum> {
        let path = self.read_path(reader)?;
        let mut payload = vec![0u8; self.payload_size];
        read_section(reader, &mut payload, "payload")?;
        Ok(Datum::from_parts(self, path, payload))
    }

    /// Read only the path that follows this header
    pub fn read_path<R: Read>(&self, reader: &mut R) -> Result<String> {
        let mut path = vec![0u8; self.path_size];
        read_section(reader, &mut path, "path")?;
        Ok(String::from_utf8(path)?)
    }

    /// Consume the payload after `read_path`
    pub fn skip_payload<R: Read>(&self, reader: &mut R) -> Result<()> {
        skip_section(reader, self.payload_size as u64, "payload")
    }

    /// Consume the path and payload without keeping them
    pub fn skip_body<R: Read>(&self, reader: &mut R) -> Result<()> {
        skip_section(reader, self.body_len(), "body")
    }
}

fn skip_section<R: Read>(reader: &mut R, expected: u64, name: &str) -> Result<()> {
    let skipped = io::copy(&mut reader.take(expected), &mut io::sink())?;
    if skipped < expected {
        return Err(RivuletError::Corrupt(format!(
            "datum {} truncated: expected {} bytes, found {}",
            name, expected, skipped
        )));
    }
    Ok(())
}

fn section_size(name: &str, raw: i32) -> Result<usize> {
    if raw < 0 {
        return Err(RivuletError::Corrupt(format!("negative {} size {}", name, raw)));
    }
    let size = raw as usize;
    if size > MAX_SECTION_SIZE {
        return Err(RivuletError::Corrupt(format!(
            "{} size {} exceeds maximum {}",
            name, size, MAX_SECTION_SIZE
        )));
    }
    Ok(size)
}

fn read_section<R: Read>(reader: &mut R, buf: &mut [u8], name: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            RivuletError::Corrupt(format!("datum {} truncated ({} bytes expected)", name, buf.len()))
        } else {
            RivuletError::Io(e)
        }
    })
}

/// Fill `buf` as far as the stream allows; returns the number of bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// =============================================================================
// Datum Encoding/Decoding
// =============================================================================

impl Datum {
    /// Total on-disk size: header + path + payload
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.path_size() + self.payload_size()
    }

    /// Header describing this datum's current contents
    pub fn header(&self) -> DatumHeader {
        DatumHeader {
            version: self.version,
            status: self.status,
            path_hash: self.path_hash(),
            record: self.record,
            path_size: self.path_size(),
            payload_size: self.payload_size(),
        }
    }

    /// Append the wire form to `buf`
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.reserve(self.encoded_len());
        buf.put_u8(self.version);
        buf.put_u8(self.status.as_byte());
        buf.put_i32(self.path_hash());
        buf.put_i32(self.record);
        buf.put_i32(self.path_size() as i32);
        buf.put_i32(self.payload_size() as i32);
        buf.put_slice(self.path().as_bytes());
        buf.put_slice(&self.payload);
    }

    /// Encode to a standalone byte vector
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.to_vec()
    }

    /// Write the wire form to a stream; returns bytes written
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let bytes = self.encode();
        writer.write_all(&bytes)?;
        Ok(bytes.len())
    }

    /// Decode the next datum from a stream.
    ///
    /// `Ok(None)` at end of stream (fewer than `HEADER_SIZE` bytes left).
    /// A header promising more bytes than the stream holds is `Corrupt`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Option<Datum>> {
        match DatumHeader::read_from(reader)? {
            Some(header) => header.read_body(reader).map(Some),
            None => Ok(None),
        }
    }

    /// Decode one datum from the front of a byte slice.
    ///
    /// Returns the datum and the number of bytes it occupied.
    pub fn decode(bytes: &[u8]) -> Result<Option<(Datum, usize)>> {
        let mut reader = bytes;
        match Datum::read_from(&mut reader)? {
            Some(datum) => {
                let used = bytes.len() - reader.len();
                Ok(Some((datum, used)))
            }
            None => Ok(None),
        }
    }
}
