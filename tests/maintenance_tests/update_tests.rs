//! Tests for updates and removal
//!
//! These tests verify:
//! - Updated objects read back with their new values
//! - Old datums are marked Deleted, never moved
//! - Normal objects are left alone
//! - Datum-level updates and side-file placement
//! - Replacements are appended before anything is marked Deleted

use std::fs;

use rivulet::config::{Config, SyncStrategy};
use rivulet::datum::{Datum, Status};
use rivulet::engine::Engine;
use rivulet::mapping::Record;
use rivulet::storage::{self, DatumEditor};
use rivulet::RivuletError;
use tempfile::TempDir;

use crate::common::{insert_people, setup_temp_engine, setup_temp_log, Person};

#[test]
fn test_update_replaces_values() {
    let (_temp, mut engine) = setup_temp_engine();
    let mut people = insert_people(&mut engine, &[("Ann", 30)]);
    let original_len = fs::metadata(engine.path()).unwrap().len();

    people[0].age = 31;
    people[0].mark_updated();
    let outcome = engine.update(&people).unwrap();

    assert_eq!(outcome.superseded, 2);
    assert_eq!(outcome.missed, 0);
    assert_eq!(
        outcome.appended,
        vec![("name".to_string(), 0), ("age".to_string(), 0)]
    );
    assert_eq!(
        fs::metadata(engine.path()).unwrap().len(),
        original_len + outcome.bytes_appended
    );

    let found = engine.query_all::<Person>().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].age, 31);
    assert_eq!(found[0].record(), 0);
}

#[test]
fn test_update_marks_old_datums_deleted() {
    let (_temp, mut engine) = setup_temp_engine();
    let mut people = insert_people(&mut engine, &[("Ann", 30)]);
    let before = fs::read(engine.path()).unwrap();

    people[0].age = 31;
    people[0].mark_updated();
    engine.update(&people).unwrap();

    let after = fs::read(engine.path()).unwrap();
    let datums: Vec<Datum> = engine.reader().unwrap().map(|i| i.unwrap().1).collect();
    let statuses: Vec<Status> = datums.iter().map(|d| d.status).collect();
    assert_eq!(
        statuses,
        vec![Status::Deleted, Status::Deleted, Status::Normal, Status::Normal]
    );
    assert_eq!(datums[1].as_int().unwrap(), 30);
    assert_eq!(datums[3].as_int().unwrap(), 31);

    // Old bytes differ only in their status bytes
    let age_offset = Datum::string("name", "Ann").encoded_len();
    let changed: Vec<usize> = (0..before.len()).filter(|&i| before[i] != after[i]).collect();
    assert_eq!(changed, vec![1, age_offset + 1]);
}

#[test]
fn test_update_skips_normal_objects() {
    let (_temp, mut engine) = setup_temp_engine();
    let people = insert_people(&mut engine, &[("Ann", 30), ("Bob", 41)]);
    let before = fs::read(engine.path()).unwrap();

    let outcome = engine.update(&people).unwrap();

    assert_eq!(outcome, Default::default());
    assert_eq!(fs::read(engine.path()).unwrap(), before);
}

#[test]
fn test_update_twice() {
    let (_temp, mut engine) = setup_temp_engine();
    let mut people = insert_people(&mut engine, &[("Ann", 30)]);

    people[0].age = 31;
    people[0].mark_updated();
    engine.update(&people).unwrap();
    people[0].age = 32;
    engine.update(&people).unwrap();

    let found = engine.query_all::<Person>().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].age, 32);
    let stats = engine.stats().unwrap();
    assert_eq!(stats.deleted, 4);
    assert_eq!(stats.normal, 2);
}

#[test]
fn test_update_with_deleted_status_removes() {
    let (_temp, mut engine) = setup_temp_engine();
    let mut people = insert_people(&mut engine, &[("Ann", 30), ("Bob", 41)]);
    let before_len = fs::metadata(engine.path()).unwrap().len();

    people[1].mark_deleted();
    let outcome = engine.update(&people).unwrap();

    assert_eq!(outcome.superseded, 2);
    assert!(outcome.appended.is_empty());
    assert_eq!(fs::metadata(engine.path()).unwrap().len(), before_len);
    let names: Vec<String> = engine
        .query_all::<Person>()
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Ann"]);
}

#[test]
fn test_remove_soft_deletes() {
    let (_temp, mut engine) = setup_temp_engine();
    let people = insert_people(&mut engine, &[("Ann", 30), ("Bob", 41)]);

    let outcome = engine.remove(&people).unwrap();

    assert_eq!(outcome.superseded, 4);
    assert!(engine.query_all::<Person>().unwrap().is_empty());
    let stats = engine.stats().unwrap();
    assert_eq!(stats.deleted, 4);
    assert_eq!(stats.reclaimable_bytes, stats.bytes);
    // Record numbers keep counting past removed records
    assert_eq!(engine.latest_record("name"), Some(1));
}

#[test]
fn test_update_datums_reports_misses() {
    let (_temp, mut engine) = setup_temp_engine();
    insert_people(&mut engine, &[("Ann", 30)]);

    let outcome = engine
        .update_datums(vec![
            Datum::int("age", 99).with_record(7).with_status(Status::Updated),
            Datum::string("name", "x").with_record(3).with_status(Status::Deleted),
        ])
        .unwrap();

    assert_eq!(outcome.missed, 2);
    assert_eq!(outcome.superseded, 0);
    assert_eq!(outcome.appended, vec![("age".to_string(), 7)]);
    assert_eq!(engine.latest_record("age"), Some(7));
}

#[test]
fn test_update_datums_appends_as_normal() {
    let (_temp, mut engine) = setup_temp_engine();
    insert_people(&mut engine, &[("Ann", 30)]);

    engine
        .update_datums(vec![Datum::int("age", 44).with_status(Status::Updated).with_record(0)])
        .unwrap();

    let stats = engine.stats().unwrap();
    assert_eq!(stats.updated, 0);
    assert_eq!(stats.normal, 2);
    assert_eq!(stats.deleted, 1);
    assert_eq!(engine.query_all::<Person>().unwrap()[0].age, 44);
}

#[test]
fn test_index_after_update_matches_reopen() {
    let (_temp, path) = setup_temp_log();
    let mut engine = Engine::open_path(&path).unwrap();
    let mut people = insert_people(&mut engine, &[("Ann", 30), ("Bob", 41)]);
    people[0].mark_updated();
    engine.update(&people).unwrap();
    let live = engine.index().clone();
    engine.close().unwrap();

    let reopened = Engine::open_path(&path).unwrap();

    assert_eq!(reopened.index(), &live);
}

#[test]
fn test_side_file_in_configured_temp_dir() {
    let (_temp, path) = setup_temp_log();
    let side = TempDir::new().unwrap();
    let config = Config::builder()
        .path(&path)
        .sync_strategy(SyncStrategy::EveryWrite)
        .temp_dir(side.path())
        .build();
    let mut engine = Engine::open(config).unwrap();
    let mut people = insert_people(&mut engine, &[("Ann", 30)]);

    people[0].age = 31;
    people[0].mark_updated();
    engine.update(&people).unwrap();

    assert_eq!(engine.query_all::<Person>().unwrap()[0].age, 31);
    assert_eq!(fs::read_dir(side.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_side_dir_fails_before_editing() {
    let (_temp, path) = setup_temp_log();
    let side = TempDir::new().unwrap();
    let config = Config::builder()
        .path(&path)
        .temp_dir(side.path().join("missing"))
        .build();
    let mut engine = Engine::open(config).unwrap();
    let mut people = insert_people(&mut engine, &[("Ann", 30)]);
    let before = fs::read(&path).unwrap();

    people[0].mark_updated();
    let result = engine.update(&people);

    assert!(matches!(result, Err(RivuletError::Io(_))));
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_failed_append_leaves_old_values_live() {
    let (temp, mut engine) = setup_temp_engine();
    let mut people = insert_people(&mut engine, &[("Ann", 30)]);
    let before = fs::read(engine.path()).unwrap();
    people[0].age = 31;
    people[0].mark_updated();

    // A directory cannot be opened for appending
    let editor = DatumEditor::new(engine.path(), SyncStrategy::EveryWrite, 4096);
    let result = storage::update(
        temp.path(),
        temp.path(),
        &editor,
        people[0].to_datums(),
        SyncStrategy::EveryWrite,
    );

    assert!(matches!(result, Err(RivuletError::Io(_))));
    assert_eq!(fs::read(engine.path()).unwrap(), before);
    assert_eq!(engine.stats().unwrap().deleted, 0);
    assert_eq!(engine.query_all::<Person>().unwrap()[0].age, 30);
}

#[test]
fn test_replacements_precede_supersede() {
    let (_temp, mut engine) = setup_temp_engine();
    insert_people(&mut engine, &[("Ann", 30)]);

    // No earlier copy: the appended replacement must not mark itself
    let outcome = engine
        .update_datums(vec![Datum::int("age", 5).with_record(3).with_status(Status::Updated)])
        .unwrap();

    assert_eq!(outcome.missed, 1);
    let last = engine.scan().unwrap().last().unwrap().unwrap().1;
    assert_eq!((last.record, last.status), (3, Status::Normal));
}
