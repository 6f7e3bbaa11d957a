//! Engine Module
//!
//! The log store: owns the backing file and the latest-record index, and
//! coordinates appends, in-place edits, reads and maintenance.
//!
//! ## Responsibilities
//! - Create or recover the log on open
//! - Assign record numbers and append datums
//! - Keep the index equal to what a full rescan would produce
//! - Hand out cursors and queries
//! - Run compaction and updates on request (never automatically)

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::Path;

use bytes::BytesMut;

use crate::config::{log_dir, Config, SyncStrategy};
use crate::cursor::Cursor;
use crate::datum::{Datum, Status, MAX_SECTION_SIZE};
use crate::error::{Result, RivuletError};
use crate::mapping::Record;
use crate::query::Query;
use crate::storage::{self, CompactionStats, DatumEditor, DatumReader, RecordIndex, UpdateOutcome};

/// Summary of a log file's contents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogStats {
    pub datums: u64,
    pub normal: u64,
    pub updated: u64,
    pub deleted: u64,

    /// File length in bytes
    pub bytes: u64,

    /// Bytes held by Deleted datums, freed by the next compaction
    pub reclaimable_bytes: u64,

    /// Bytes past the last readable datum
    pub unreadable_bytes: u64,

    /// CRC32 of the whole file
    pub crc32: u32,
}

/// The append-only log store
///
/// ## Concurrency Model: Single Writer
///
/// Every mutation takes `&mut self`, so one `Engine` value serializes its
/// own writers. Nothing guards the file against a second engine or process
/// opening the same path; doing so corrupts the log.
///
/// Every operation opens its own file handles and closes them before
/// returning.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Highest record number per path
    index: RecordIndex,
}

impl Engine {
    /// Open or create a log with the given config
    ///
    /// On startup:
    /// 1. Validate the config
    /// 2. Create the parent directory and an empty log if absent
    /// 3. Otherwise rebuild the index by scanning the whole file
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let mut engine = Self {
            config,
            index: RecordIndex::new(),
        };

        if engine.config.path.exists() {
            let scanned = engine.analyze()?;
            tracing::info!(
                path = %engine.config.path.display(),
                datums = scanned,
                paths = engine.index.len(),
                "log opened"
            );
        } else {
            fs::create_dir_all(log_dir(&engine.config.path))?;
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&engine.config.path)?;
            tracing::info!(path = %engine.config.path.display(), "log created");
        }

        Ok(engine)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified log file
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().path(path).build();
        Self::open(config)
    }

    /// Rebuild the index from scratch with a full scan.
    ///
    /// Every datum counts regardless of status. A datum that cannot be
    /// decoded ends the scan; entries gathered before it are kept.
    /// Returns the number of datums scanned.
    pub fn analyze(&mut self) -> Result<u64> {
        self.index.clear();
        let mut reader = self.reader()?;
        let mut scanned = 0u64;

        loop {
            match reader.next_path() {
                Ok(Some((header, path))) => {
                    self.index.observe(&path, header.record);
                    scanned += 1;
                }
                Ok(None) => break,
                Err(e) if e.is_format_fault() => {
                    tracing::warn!(
                        offset = reader.offset(),
                        error = %e,
                        "index rebuild stopped at unreadable datum"
                    );
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(datums = scanned, paths = self.index.len(), "index rebuilt");
        Ok(scanned)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Append datums as one new record.
    ///
    /// Every datum receives the same record number: one past the highest
    /// index entry among the datums' paths (0 for unseen paths). The whole
    /// list is written in order with a single append.
    pub fn append(&mut self, mut datums: Vec<Datum>) -> Result<i32> {
        if datums.is_empty() {
            return Err(RivuletError::InvalidArgument(
                "cannot append an empty record".to_string(),
            ));
        }
        if let Some(d) = datums
            .iter()
            .find(|d| d.path_size() > MAX_SECTION_SIZE || d.payload_size() > MAX_SECTION_SIZE)
        {
            return Err(RivuletError::InvalidArgument(format!(
                "datum {} exceeds the {}-byte section limit",
                d.path(),
                MAX_SECTION_SIZE
            )));
        }

        let record = self.index.next_record(datums.iter().map(Datum::path))?;

        let mut buf = BytesMut::with_capacity(datums.iter().map(Datum::encoded_len).sum());
        for datum in &mut datums {
            datum.record = record;
            datum.encode_into(&mut buf);
        }

        let mut file = OpenOptions::new().append(true).open(&self.config.path)?;
        file.write_all(&buf)?;
        if self.config.sync_strategy == SyncStrategy::EveryWrite {
            file.sync_data()?;
        }

        for datum in &datums {
            self.index.observe(datum.path(), record);
        }

        tracing::debug!(record, datums = datums.len(), bytes = buf.len(), "record appended");
        Ok(record)
    }

    /// Append a typed object as a new record and store its record number
    pub fn insert<T: Record>(&mut self, obj: &mut T) -> Result<i32> {
        let datums = obj
            .to_datums()
            .into_iter()
            .map(|d| d.with_status(Status::Normal))
            .collect();
        let record = self.append(datums)?;
        let meta = obj.meta_mut();
        meta.record = record;
        meta.status = Status::Normal;
        Ok(record)
    }

    /// Overwrite the status byte of the datum at (path, record)
    ///
    /// The first datum with a matching path hash and record is edited,
    /// whatever its current status. Returns `false` when nothing matches.
    pub fn set_status(&mut self, path: &str, record: i32, status: Status) -> Result<bool> {
        self.editor().set_status(path, record, status)
    }

    /// Overwrite the payload of the datum at (path, record) in place
    ///
    /// Fails with `PayloadOverflow` (and writes nothing) when `payload` is
    /// longer than the stored one. Returns `false` when nothing matches.
    pub fn set_payload(&mut self, path: &str, record: i32, payload: &[u8]) -> Result<bool> {
        self.editor().set_payload(path, record, payload)
    }

    fn editor(&self) -> DatumEditor<'_> {
        DatumEditor::new(
            &self.config.path,
            self.config.sync_strategy,
            self.config.read_buffer_size,
        )
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Drop Deleted datums and clear Updated flags by rewriting the log
    pub fn compact(&mut self) -> Result<CompactionStats> {
        let stats = storage::compact(&self.config.path, self.config.read_buffer_size)?;
        self.analyze()?;
        Ok(stats)
    }

    /// Replace fields of stored objects.
    ///
    /// Objects marked Updated have every field re-appended under their
    /// existing record number; objects marked Deleted are only removed.
    /// In both cases the datums currently on disk are marked Deleted.
    /// Objects still marked Normal are left alone: their datums are neither
    /// re-appended nor marked Deleted, so passing a whole result set only
    /// touches the objects that were flagged.
    pub fn update<T: Record>(&mut self, objs: &[T]) -> Result<UpdateOutcome> {
        let datums = objs
            .iter()
            .filter(|obj| obj.status() != Status::Normal)
            .flat_map(T::to_datums)
            .collect();
        self.update_datums(datums)
    }

    /// Datum-level update: Updated datums are re-appended as Normal, and
    /// every datum's on-disk counterpart is marked Deleted
    pub fn update_datums(&mut self, datums: Vec<Datum>) -> Result<UpdateOutcome> {
        let result = storage::update(
            &self.config.path,
            &self.config.side_file_dir(),
            &self.editor(),
            datums,
            self.config.sync_strategy,
        );
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                // Replacements may already be on disk
                self.analyze()?;
                return Err(e);
            }
        };

        for (path, record) in &outcome.appended {
            self.index.observe(path, *record);
        }
        Ok(outcome)
    }

    /// Soft-delete every field of the given objects
    pub fn remove<T: Record>(&mut self, objs: &[T]) -> Result<UpdateOutcome> {
        let datums = objs
            .iter()
            .flat_map(T::to_datums)
            .map(|d| d.with_status(Status::Deleted))
            .collect();
        self.update_datums(datums)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Sequential reader positioned at byte 0
    pub fn reader(&self) -> Result<DatumReader> {
        DatumReader::open(&self.config.path, self.config.read_buffer_size)
    }

    /// Every datum in file order, paired with its byte offset
    pub fn scan(&self) -> Result<DatumReader> {
        self.reader()
    }

    /// Decode the next datum from `stream`; `None` at end of stream
    pub fn read_next(stream: &mut DatumReader) -> Result<Option<Datum>> {
        stream.next_datum()
    }

    /// Forward-only reader of `T` objects in file order
    pub fn cursor<T: Record>(&self) -> Result<Cursor<T>> {
        Ok(Cursor::new(self.reader()?))
    }

    /// Full-scan query for `T` objects
    pub fn query<T: Record>(&self) -> Query<'_, T> {
        Query::new(self)
    }

    /// Every live `T` object in the log
    pub fn query_all<T: Record>(&self) -> Result<Vec<T>> {
        self.query::<T>().run()
    }

    /// Count datums per status and fingerprint the file
    pub fn stats(&self) -> Result<LogStats> {
        let mut stats = LogStats::default();
        let mut reader = self.reader()?;

        loop {
            match reader.next_header() {
                Ok(Some((_, header))) => {
                    stats.datums += 1;
                    match header.status {
                        Status::Normal => stats.normal += 1,
                        Status::Updated => stats.updated += 1,
                        Status::Deleted => {
                            stats.deleted += 1;
                            stats.reclaimable_bytes += header.encoded_len();
                        }
                    }
                }
                Ok(None) => break,
                Err(e) if e.is_format_fault() => break,
                Err(e) => return Err(e),
            }
        }
        let readable = reader.offset();
        drop(reader);

        let mut file = BufReader::with_capacity(
            self.config.read_buffer_size,
            File::open(&self.config.path)?,
        );
        let mut hasher = crc32fast::Hasher::new();
        let mut chunk = vec![0u8; self.config.read_buffer_size];
        loop {
            let n = file.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            hasher.update(&chunk[..n]);
            stats.bytes += n as u64;
        }
        stats.crc32 = hasher.finalize();
        stats.unreadable_bytes = stats.bytes.saturating_sub(readable);

        Ok(stats)
    }

    /// Close the engine, syncing the log to disk
    pub fn close(self) -> Result<()> {
        let file = OpenOptions::new().append(true).open(&self.config.path)?;
        file.sync_all()?;
        tracing::debug!(path = %self.config.path.display(), "log closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the latest-record index
    pub fn index(&self) -> &RecordIndex {
        &self.index
    }

    /// Highest record number stored for `path`
    pub fn latest_record(&self, path: &str) -> Option<i32> {
        self.index.latest(path)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
