// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data types for SLUICE.
//!
//! This module provides the types shared by the registry, the poller, and the
//! value cache: tag names, raw source readings, and published value records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// TagName
// =============================================================================

/// The logical name of a tag.
///
/// Tag names are unique within a registry, serve as the cache key, and become
/// the JSON field key on the wire.
///
/// # Examples
///
/// ```
/// use sluice_core::types::TagName;
///
/// let name = TagName::new("FlowTransmitter");
/// assert_eq!(name.as_str(), "FlowTransmitter");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagName(String);

impl TagName {
    /// Creates a new tag name.
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name and returns the inner string.
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TagName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TagName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for TagName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// SourceValue
// =============================================================================

/// A raw reading as delivered by the data source.
///
/// Industrial servers expose a zoo of scalar types; the bridge publishes
/// everything as a floating-point number, so this enum only carries the
/// variants that coerce meaningfully to `f64`.
///
/// # Examples
///
/// ```
/// use sluice_core::types::SourceValue;
///
/// assert_eq!(SourceValue::Float64(12.5).as_f64(), Some(12.5));
/// assert_eq!(SourceValue::Bool(true).as_f64(), Some(1.0));
/// assert_eq!(SourceValue::Null.as_f64(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum SourceValue {
    /// Boolean value (coerces to 0.0 / 1.0).
    Bool(bool),

    /// Signed 32-bit integer.
    Int32(i32),

    /// Signed 64-bit integer.
    Int64(i64),

    /// Unsigned 32-bit integer.
    UInt32(u32),

    /// Unsigned 64-bit integer.
    UInt64(u64),

    /// 32-bit floating point.
    Float32(f32),

    /// 64-bit floating point.
    Float64(f64),

    /// Null/undefined reading.
    Null,
}

impl SourceValue {
    /// Returns the type name of this value.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            SourceValue::Bool(_) => "bool",
            SourceValue::Int32(_) => "int32",
            SourceValue::Int64(_) => "int64",
            SourceValue::UInt32(_) => "uint32",
            SourceValue::UInt64(_) => "uint64",
            SourceValue::Float32(_) => "float32",
            SourceValue::Float64(_) => "float64",
            SourceValue::Null => "null",
        }
    }

    /// Returns `true` if this is a null reading.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, SourceValue::Null)
    }

    /// Attempts to coerce this value to an f64.
    ///
    /// Returns `None` for `Null`; every other variant converts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SourceValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            SourceValue::Int32(v) => Some(*v as f64),
            SourceValue::Int64(v) => Some(*v as f64),
            SourceValue::UInt32(v) => Some(*v as f64),
            SourceValue::UInt64(v) => Some(*v as f64),
            SourceValue::Float32(v) => Some(*v as f64),
            SourceValue::Float64(v) => Some(*v),
            SourceValue::Null => None,
        }
    }
}

impl Default for SourceValue {
    fn default() -> Self {
        SourceValue::Null
    }
}

impl fmt::Display for SourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceValue::Bool(v) => write!(f, "{}", v),
            SourceValue::Int32(v) => write!(f, "{}", v),
            SourceValue::Int64(v) => write!(f, "{}", v),
            SourceValue::UInt32(v) => write!(f, "{}", v),
            SourceValue::UInt64(v) => write!(f, "{}", v),
            SourceValue::Float32(v) => write!(f, "{}", v),
            SourceValue::Float64(v) => write!(f, "{}", v),
            SourceValue::Null => write!(f, "null"),
        }
    }
}

macro_rules! impl_from_for_source_value {
    ($variant:ident, $type:ty) => {
        impl From<$type> for SourceValue {
            fn from(v: $type) -> Self {
                SourceValue::$variant(v)
            }
        }
    };
}

impl_from_for_source_value!(Bool, bool);
impl_from_for_source_value!(Int32, i32);
impl_from_for_source_value!(Int64, i64);
impl_from_for_source_value!(UInt32, u32);
impl_from_for_source_value!(UInt64, u64);
impl_from_for_source_value!(Float32, f32);
impl_from_for_source_value!(Float64, f64);

// =============================================================================
// ValueRecord
// =============================================================================

/// The latest published reading for a tag.
///
/// Records are created by the poller on the first successful read of a tag
/// and replaced wholesale on every subsequent one; they are never partially
/// mutated. A tag with no successful read has no record at all.
///
/// Serializes to the wire shape consumers see:
/// `{"value": 12.5, "unit": "L/min", "timestamp": "2025-..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    /// The numeric reading, after scaling/rounding hints were applied.
    pub value: f64,

    /// Display unit, copied from the owning tag spec at publish time.
    pub unit: String,

    /// Capture time of the poll cycle that produced this value.
    pub timestamp: DateTime<Utc>,
}

impl ValueRecord {
    /// Creates a new value record.
    pub fn new(value: f64, unit: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            unit: unit.into(),
            timestamp,
        }
    }

    /// Returns the age of this record.
    #[inline]
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.timestamp
    }
}

impl fmt::Display for ValueRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{} @ {}", self.value, self.timestamp.to_rfc3339())
        } else {
            write!(f, "{} {} @ {}", self.value, self.unit, self.timestamp.to_rfc3339())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_name() {
        let name = TagName::new("Pressure");
        assert_eq!(name.as_str(), "Pressure");
        assert_eq!(format!("{}", name), "Pressure");

        let from_str: TagName = "Flow".into();
        assert_eq!(from_str.into_inner(), "Flow");
    }

    #[test]
    fn test_source_value_coercion() {
        assert_eq!(SourceValue::Bool(false).as_f64(), Some(0.0));
        assert_eq!(SourceValue::Int32(-3).as_f64(), Some(-3.0));
        assert_eq!(SourceValue::UInt64(7).as_f64(), Some(7.0));
        assert_eq!(SourceValue::Float32(1.5).as_f64(), Some(1.5));
        assert_eq!(SourceValue::Null.as_f64(), None);
        assert!(SourceValue::Null.is_null());
    }

    #[test]
    fn test_source_value_from() {
        let v: SourceValue = 42i32.into();
        assert!(matches!(v, SourceValue::Int32(42)));

        let v: SourceValue = 3.25f64.into();
        assert_eq!(v.as_f64(), Some(3.25));
    }

    #[test]
    fn test_source_value_type_names() {
        assert_eq!(SourceValue::Bool(true).type_name(), "bool");
        assert_eq!(SourceValue::Float64(0.0).type_name(), "float64");
        assert_eq!(SourceValue::Null.type_name(), "null");
    }

    #[test]
    fn test_value_record_serializes_to_wire_shape() {
        let record = ValueRecord::new(12.5, "L/min", Utc::now());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["value"].as_f64(), Some(12.5));
        assert_eq!(json["unit"].as_str(), Some("L/min"));
        // chrono serializes DateTime<Utc> as an RFC 3339 string
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_value_record_display() {
        let ts = Utc::now();
        let record = ValueRecord::new(3.1, "bar", ts);
        let rendered = format!("{}", record);
        assert!(rendered.starts_with("3.1 bar @ "));
    }
}
