//! Engine tests: lifecycle, appends, index and in-place edits

#[path = "../common/mod.rs"]
mod common;
