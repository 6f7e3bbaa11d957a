//! Typed payloads
//!
//! Constructors and accessors reinterpreting a datum payload as a native
//! value. Fixed-width kinds are big-endian; strings are UTF-8; booleans are
//! one byte (1 = true).

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Datum;
use crate::error::{Result, RivuletError};

/// Kind of value a field carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Short,
    Long,
    Float,
    Double,
    Bool,
    String,
    Bytes,
}

// =============================================================================
// Constructors
// =============================================================================

impl Datum {
    pub fn int(path: impl Into<String>, value: i32) -> Self {
        Self::new(path, value.to_be_bytes().to_vec())
    }

    pub fn short(path: impl Into<String>, value: i16) -> Self {
        Self::new(path, value.to_be_bytes().to_vec())
    }

    pub fn long(path: impl Into<String>, value: i64) -> Self {
        Self::new(path, value.to_be_bytes().to_vec())
    }

    pub fn float(path: impl Into<String>, value: f32) -> Self {
        Self::new(path, value.to_be_bytes().to_vec())
    }

    pub fn double(path: impl Into<String>, value: f64) -> Self {
        Self::new(path, value.to_be_bytes().to_vec())
    }

    pub fn bool(path: impl Into<String>, value: bool) -> Self {
        Self::new(path, vec![value as u8])
    }

    pub fn string(path: impl Into<String>, value: &str) -> Self {
        Self::new(path, value.as_bytes().to_vec())
    }

    pub fn bytes(path: impl Into<String>, value: &[u8]) -> Self {
        Self::new(path, value.to_vec())
    }

    /// Store any serde value as a bincode blob
    pub fn serialized<T: Serialize>(path: impl Into<String>, value: &T) -> Result<Self> {
        let payload =
            bincode::serialize(value).map_err(|e| RivuletError::Serialization(e.to_string()))?;
        Ok(Self::new(path, payload))
    }
}

// =============================================================================
// Accessors
// =============================================================================

impl Datum {
    fn fixed<const N: usize>(&self) -> Result<[u8; N]> {
        self.payload
            .as_slice()
            .try_into()
            .map_err(|_| RivuletError::TypeMismatch {
                expected: N,
                actual: self.payload.len(),
            })
    }

    pub fn as_int(&self) -> Result<i32> {
        self.fixed::<4>().map(i32::from_be_bytes)
    }

    pub fn as_short(&self) -> Result<i16> {
        self.fixed::<2>().map(i16::from_be_bytes)
    }

    pub fn as_long(&self) -> Result<i64> {
        self.fixed::<8>().map(i64::from_be_bytes)
    }

    pub fn as_float(&self) -> Result<f32> {
        self.fixed::<4>().map(f32::from_be_bytes)
    }

    pub fn as_double(&self) -> Result<f64> {
        self.fixed::<8>().map(f64::from_be_bytes)
    }

    pub fn as_bool(&self) -> Result<bool> {
        self.fixed::<1>().map(|[b]| b == 1)
    }

    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.payload)
            .map_err(|e| RivuletError::Corrupt(format!("payload of {} is not UTF-8: {}", self.path(), e)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    /// Decode a payload written by [`Datum::serialized`]
    pub fn as_deserialized<T: DeserializeOwned>(&self) -> Result<T> {
        bincode::deserialize(&self.payload).map_err(|e| RivuletError::Serialization(e.to_string()))
    }
}

// =============================================================================
// Base64 Text Form
// =============================================================================

impl Datum {
    /// Whole encoded datum as padded standard Base64
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.encode())
    }

    /// Parse a datum from its Base64 text form
    pub fn from_base64(text: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| RivuletError::Serialization(format!("invalid base64: {}", e)))?;
        match Datum::decode(&bytes)? {
            Some((datum, used)) if used == bytes.len() => Ok(datum),
            Some((_, used)) => Err(RivuletError::Corrupt(format!(
                "{} trailing bytes after datum",
                bytes.len() - used
            ))),
            None => Err(RivuletError::Corrupt("base64 text holds no complete datum".to_string())),
        }
    }
}
