//! Field mapping
//!
//! Connects a typed record to the datums that persist it. Each record type
//! lists its fields once, in a static table of (path, kind, getter, setter)
//! entries:
//!
//! ```rust
//! use rivulet::mapping::{Field, Record, RecordMeta};
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     meta: RecordMeta,
//!     name: String,
//!     age: i32,
//! }
//!
//! impl Record for Person {
//!     const FIELDS: &'static [Field<Self>] = &[
//!         Field::string("name", |p| p.name.as_str(), |p, v| p.name = v),
//!         Field::int("age", |p| p.age, |p, v| p.age = v),
//!     ];
//!
//!     fn meta(&self) -> &RecordMeta {
//!         &self.meta
//!     }
//!
//!     fn meta_mut(&mut self) -> &mut RecordMeta {
//!         &mut self.meta
//!     }
//! }
//!
//! let person = Person { name: "Ann".into(), age: 30, ..Default::default() };
//! assert_eq!(person.to_datums().len(), 2);
//! ```

use std::collections::HashSet;

use crate::datum::{path_hash, Datum, Status, ValueKind};
use crate::error::Result;

/// Record number and lifecycle status every mapped object carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMeta {
    /// Record number assigned on append; -1 until stored
    pub record: i32,

    /// Status stamped on every datum the object emits
    pub status: Status,
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self {
            record: -1,
            status: Status::Normal,
        }
    }
}

enum Accessor<T> {
    Int(fn(&T) -> i32, fn(&mut T, i32)),
    Short(fn(&T) -> i16, fn(&mut T, i16)),
    Long(fn(&T) -> i64, fn(&mut T, i64)),
    Float(fn(&T) -> f32, fn(&mut T, f32)),
    Double(fn(&T) -> f64, fn(&mut T, f64)),
    Bool(fn(&T) -> bool, fn(&mut T, bool)),
    Str(fn(&T) -> &str, fn(&mut T, String)),
    Bytes(fn(&T) -> &[u8], fn(&mut T, Vec<u8>)),
}

/// One entry of a record type's field table
pub struct Field<T> {
    path: &'static str,
    accessor: Accessor<T>,
}

impl<T> Field<T> {
    pub const fn int(path: &'static str, get: fn(&T) -> i32, set: fn(&mut T, i32)) -> Self {
        Self { path, accessor: Accessor::Int(get, set) }
    }

    pub const fn short(path: &'static str, get: fn(&T) -> i16, set: fn(&mut T, i16)) -> Self {
        Self { path, accessor: Accessor::Short(get, set) }
    }

    pub const fn long(path: &'static str, get: fn(&T) -> i64, set: fn(&mut T, i64)) -> Self {
        Self { path, accessor: Accessor::Long(get, set) }
    }

    pub const fn float(path: &'static str, get: fn(&T) -> f32, set: fn(&mut T, f32)) -> Self {
        Self { path, accessor: Accessor::Float(get, set) }
    }

    pub const fn double(path: &'static str, get: fn(&T) -> f64, set: fn(&mut T, f64)) -> Self {
        Self { path, accessor: Accessor::Double(get, set) }
    }

    pub const fn bool(path: &'static str, get: fn(&T) -> bool, set: fn(&mut T, bool)) -> Self {
        Self { path, accessor: Accessor::Bool(get, set) }
    }

    pub const fn string(path: &'static str, get: fn(&T) -> &str, set: fn(&mut T, String)) -> Self {
        Self { path, accessor: Accessor::Str(get, set) }
    }

    pub const fn bytes(path: &'static str, get: fn(&T) -> &[u8], set: fn(&mut T, Vec<u8>)) -> Self {
        Self { path, accessor: Accessor::Bytes(get, set) }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn kind(&self) -> ValueKind {
        match self.accessor {
            Accessor::Int(..) => ValueKind::Int,
            Accessor::Short(..) => ValueKind::Short,
            Accessor::Long(..) => ValueKind::Long,
            Accessor::Float(..) => ValueKind::Float,
            Accessor::Double(..) => ValueKind::Double,
            Accessor::Bool(..) => ValueKind::Bool,
            Accessor::Str(..) => ValueKind::String,
            Accessor::Bytes(..) => ValueKind::Bytes,
        }
    }

    /// Read the field from `obj` into a fresh datum
    pub fn read(&self, obj: &T) -> Datum {
        match self.accessor {
            Accessor::Int(get, _) => Datum::int(self.path, get(obj)),
            Accessor::Short(get, _) => Datum::short(self.path, get(obj)),
            Accessor::Long(get, _) => Datum::long(self.path, get(obj)),
            Accessor::Float(get, _) => Datum::float(self.path, get(obj)),
            Accessor::Double(get, _) => Datum::double(self.path, get(obj)),
            Accessor::Bool(get, _) => Datum::bool(self.path, get(obj)),
            Accessor::Str(get, _) => Datum::string(self.path, get(obj)),
            Accessor::Bytes(get, _) => Datum::bytes(self.path, get(obj)),
        }
    }

    /// Decode `datum`'s payload and store it in `obj`
    pub fn write(&self, obj: &mut T, datum: &Datum) -> Result<()> {
        match self.accessor {
            Accessor::Int(_, set) => set(obj, datum.as_int()?),
            Accessor::Short(_, set) => set(obj, datum.as_short()?),
            Accessor::Long(_, set) => set(obj, datum.as_long()?),
            Accessor::Float(_, set) => set(obj, datum.as_float()?),
            Accessor::Double(_, set) => set(obj, datum.as_double()?),
            Accessor::Bool(_, set) => set(obj, datum.as_bool()?),
            Accessor::Str(_, set) => set(obj, datum.as_str()?.to_string()),
            Accessor::Bytes(_, set) => set(obj, datum.payload.clone()),
        }
        Ok(())
    }
}

/// A typed object persisted as one datum per field
pub trait Record: Default + Sized + 'static {
    /// Field table; paths must be unique within the type
    const FIELDS: &'static [Field<Self>];

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Record number, -1 when never stored
    fn record(&self) -> i32 {
        self.meta().record
    }

    fn status(&self) -> Status {
        self.meta().status
    }

    /// Paths of every mapped field, in table order
    fn paths() -> Vec<&'static str> {
        Self::FIELDS.iter().map(Field::path).collect()
    }

    /// Path hashes used to filter datums during a scan
    fn path_hashes() -> HashSet<i32> {
        Self::FIELDS.iter().map(|f| path_hash(f.path)).collect()
    }

    fn field(path: &str) -> Option<&'static Field<Self>> {
        Self::FIELDS.iter().find(|f| f.path == path)
    }

    /// One datum per field, stamped with this object's record and status
    fn to_datums(&self) -> Vec<Datum> {
        let meta = *self.meta();
        Self::FIELDS
            .iter()
            .map(|f| f.read(self).with_record(meta.record).with_status(meta.status))
            .collect()
    }

    /// The datum for a single field, if the type maps `path`
    fn datum_by(&self, path: &str) -> Option<Datum> {
        let meta = *self.meta();
        Self::field(path).map(|f| f.read(self).with_record(meta.record).with_status(meta.status))
    }

    /// Store `datum` in the matching field.
    ///
    /// Returns `Ok(false)` when the type does not map the datum's path.
    fn apply_datum(&mut self, datum: &Datum) -> Result<bool> {
        match Self::field(datum.path()) {
            Some(field) => {
                field.write(self, datum)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Build an object from datums of one record
    fn from_datums(record: i32, datums: &[Datum]) -> Result<Self> {
        let mut obj = Self::default();
        obj.meta_mut().record = record;
        for datum in datums {
            obj.apply_datum(datum)?;
        }
        Ok(obj)
    }

    /// Flag every field for replacement on the next `Engine::update`
    fn mark_updated(&mut self) {
        self.meta_mut().status = Status::Updated;
    }

    /// Flag every field for removal on the next `Engine::update`
    fn mark_deleted(&mut self) {
        self.meta_mut().status = Status::Deleted;
    }
}
