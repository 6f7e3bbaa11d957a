//! Datum Reader
//!
//! Forward-only sequential decoding of a log file from byte 0.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::datum::{Datum, DatumHeader};
use crate::error::Result;

/// Sequential reader over every datum in a log file
pub struct DatumReader {
    reader: BufReader<File>,
    /// Byte offset of the next datum
    offset: u64,
    /// File length when the reader was opened
    len: u64,
}

impl DatumReader {
    /// Open a log file for reading, positioned at its first datum
    pub fn open(path: &Path, buffer_size: usize) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            reader: BufReader::with_capacity(buffer_size, file),
            offset: 0,
            len,
        })
    }

    /// Offset of the next unread datum
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// True while unread bytes remain
    pub fn has_remaining(&self) -> bool {
        self.offset < self.len
    }

    /// Decode the next datum; `Ok(None)` at end of stream
    pub fn next_datum(&mut self) -> Result<Option<Datum>> {
        let datum = Datum::read_from(&mut self.reader)?;
        match &datum {
            Some(d) => self.offset += d.encoded_len() as u64,
            None => self.offset = self.len,
        }
        Ok(datum)
    }

    /// Decode the next header and skip its body
    pub fn next_header(&mut self) -> Result<Option<(u64, DatumHeader)>> {
        let start = self.offset;
        match DatumHeader::read_from(&mut self.reader)? {
            Some(header) => {
                header.skip_body(&mut self.reader)?;
                self.offset += header.encoded_len();
                Ok(Some((start, header)))
            }
            None => {
                self.offset = self.len;
                Ok(None)
            }
        }
    }

    /// Decode the next header and path, skipping the payload
    pub fn next_path(&mut self) -> Result<Option<(DatumHeader, String)>> {
        match DatumHeader::read_from(&mut self.reader)? {
            Some(header) => {
                let path = header.read_path(&mut self.reader)?;
                header.skip_payload(&mut self.reader)?;
                self.offset += header.encoded_len();
                Ok(Some((header, path)))
            }
            None => {
                self.offset = self.len;
                Ok(None)
            }
        }
    }
}

impl Iterator for DatumReader {
    /// (offset, datum) in file order
    type Item = Result<(u64, Datum)>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.offset;
        match self.next_datum() {
            Ok(Some(datum)) => Some(Ok((start, datum))),
            Ok(None) => None,
            Err(e) => {
                // Nothing past a bad datum is trusted
                self.offset = self.len;
                Some(Err(e))
            }
        }
    }
}
