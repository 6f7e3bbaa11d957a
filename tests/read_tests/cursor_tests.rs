//! Tests for Cursor
//!
//! These tests verify:
//! - Objects come back one per record, in file order
//! - Deleted and unmapped datums are skipped
//! - Records with no live datums are jumped over
//! - An unreadable tail ends iteration without an error item

use std::fs;

use rivulet::datum::{Datum, Status};
use rivulet::mapping::Record;

use crate::common::{insert_people, setup_temp_engine, Person, Sample};

#[test]
fn test_cursor_on_empty_log() {
    let (_temp, engine) = setup_temp_engine();

    let mut cursor = engine.cursor::<Person>().unwrap();

    assert!(!cursor.has_next());
    assert!(cursor.next().is_none());
}

#[test]
fn test_cursor_yields_objects_in_order() {
    let (_temp, mut engine) = setup_temp_engine();
    let inserted = insert_people(&mut engine, &[("Ann", 30), ("Bob", 41), ("Cy", 22)]);

    let people: Vec<Person> = engine
        .cursor::<Person>()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(people, inserted);
}

#[test]
fn test_cursor_tracks_expected_record() {
    let (_temp, mut engine) = setup_temp_engine();
    insert_people(&mut engine, &[("Ann", 30), ("Bob", 41)]);

    let mut cursor = engine.cursor::<Person>().unwrap();
    assert_eq!(cursor.expected_record(), 0);

    let ann = cursor.next().unwrap().unwrap();
    assert_eq!(ann.record(), 0);
    assert_eq!(cursor.expected_record(), 1);
    assert!(cursor.has_next());

    let bob = cursor.next().unwrap().unwrap();
    assert_eq!(bob.name, "Bob");
    assert!(!cursor.has_next());
    assert!(cursor.next().is_none());
}

#[test]
fn test_cursor_skips_removed_record() {
    let (_temp, mut engine) = setup_temp_engine();
    let people = insert_people(&mut engine, &[("Ann", 30), ("Bob", 41), ("Cy", 22)]);
    engine.remove(&people[1..2]).unwrap();

    let names: Vec<(i32, String)> = engine
        .cursor::<Person>()
        .unwrap()
        .map(|p| {
            let p = p.unwrap();
            (p.record(), p.name)
        })
        .collect();

    assert_eq!(names, vec![(0, "Ann".to_string()), (2, "Cy".to_string())]);
}

#[test]
fn test_cursor_partial_record() {
    let (_temp, mut engine) = setup_temp_engine();
    insert_people(&mut engine, &[("Ann", 30), ("Bob", 41), ("Cy", 22)]);
    engine.set_status("name", 1, Status::Deleted).unwrap();

    let people: Vec<Person> = engine
        .cursor::<Person>()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(people.len(), 3);
    assert_eq!(people[1].record(), 1);
    assert_eq!(people[1].name, "");
    assert_eq!(people[1].age, 41);
    assert_eq!(people[2].name, "Cy");
}

#[test]
fn test_cursor_ignores_unmapped_paths() {
    let (_temp, mut engine) = setup_temp_engine();
    engine.append(vec![Datum::string("title", "x")]).unwrap();
    insert_people(&mut engine, &[("Ann", 30)]);
    engine.append(vec![Datum::string("title", "y")]).unwrap();
    insert_people(&mut engine, &[("Bob", 41)]);

    let names: Vec<String> = engine
        .cursor::<Person>()
        .unwrap()
        .map(|p| p.unwrap().name)
        .collect();

    assert_eq!(names, vec!["Ann", "Bob"]);
}

#[test]
fn test_cursor_every_value_kind() {
    let (_temp, mut engine) = setup_temp_engine();
    let mut sample = Sample {
        count: -7,
        small: 300,
        big: i64::MAX,
        ratio: 0.5,
        precise: 1e-9,
        flag: true,
        label: "héllo".to_string(),
        blob: vec![0, 1, 254, 255],
        ..Default::default()
    };
    engine.insert(&mut sample).unwrap();
    insert_people(&mut engine, &[("Ann", 30)]);

    let samples: Vec<Sample> = engine
        .cursor::<Sample>()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(samples, vec![sample]);
}

#[test]
fn test_cursor_stops_at_truncated_tail() {
    let (_temp, mut engine) = setup_temp_engine();
    insert_people(&mut engine, &[("Ann", 30), ("Bob", 41)]);
    let bytes = fs::read(engine.path()).unwrap();
    fs::write(engine.path(), &bytes[..bytes.len() - 2]).unwrap();

    let people: Vec<Person> = engine
        .cursor::<Person>()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(people.len(), 2);
    assert_eq!(people[0], Person { meta: people[0].meta, ..Person::new("Ann", 30) });
    assert_eq!(people[1].name, "Bob");
    assert_eq!(people[1].age, 0);
}

#[test]
fn test_cursor_ends_after_highest_record_number() {
    let (_temp, mut engine) = setup_temp_engine();
    insert_people(&mut engine, &[("Ann", 30)]);
    let mut last = Person::new("Max", 99);
    last.meta.record = i32::MAX;
    last.meta.status = Status::Updated;
    engine.update_datums(last.to_datums()).unwrap();

    let records: Vec<i32> = engine
        .cursor::<Person>()
        .unwrap()
        .map(|p| p.unwrap().record())
        .collect();

    assert_eq!(records, vec![0, i32::MAX]);
}
