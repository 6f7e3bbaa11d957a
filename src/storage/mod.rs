//! Storage Module
//!
//! File-level operations on the append-only datum log.
//!
//! ## Responsibilities
//! - Sequential decoding from byte 0 (`DatumReader`)
//! - Latest-record index per path (`RecordIndex`)
//! - Bounded in-place edits of status and payload bytes (`DatumEditor`)
//! - Rewrite-based space reclamation (`compact`)
//! - Shadow-append field replacement (`update`)
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Datum 1  [header 18][path][payload]    │
//! ├────────────────────────────────────────┤
//! │ Datum 2  [header 18][path][payload]    │
//! ├────────────────────────────────────────┤
//! │ ...                                    │
//! └────────────────────────────────────────┘
//! ```
//! No file header, padding, block structure or checksums. File order is the
//! only ordering.

mod compactor;
mod editor;
mod index;
mod reader;
mod updater;

pub use compactor::{compact, CompactionStats};
pub use editor::DatumEditor;
pub use index::RecordIndex;
pub use reader::DatumReader;
pub use updater::{update, UpdateOutcome};
