//! # Rivulet
//!
//! An embedded, file-backed append-only record store:
//! - Self-describing binary datums addressed by string paths
//! - Latest-record index rebuilt by a full scan on open
//! - Bounded in-place status and payload edits
//! - Update by shadow-append, space reclamation by compaction
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Typed records (Record mapping)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ datums
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                          Engine                              │
//! │          (append / set_status / set_payload / index)         │
//! └──────┬──────────────────────┬───────────────────────┬───────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//!  ┌───────────┐        ┌───────────────┐      ┌────────────────┐
//!  │  Cursor   │        │     Query     │      │ Compact/Update │
//!  │ (ordered) │        │  (full scan)  │      │   (rewrite)    │
//!  └─────┬─────┘        └───────┬───────┘      └───────┬────────┘
//!        └──────────────────────┼──────────────────────┘
//!                               ▼
//!                     ┌───────────────────┐
//!                     │  Log file (datum  │
//!                     │  codec, byte 0..) │
//!                     └───────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod datum;
pub mod mapping;
pub mod storage;
pub mod cursor;
pub mod query;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RivuletError, Result};
pub use config::{Config, SyncStrategy};
pub use datum::{Datum, Status};
pub use mapping::{Field, Record, RecordMeta};
pub use engine::{Engine, LogStats};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Rivulet
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Format version written into every datum
pub const ENGINE_VERSION: u8 = 1;
