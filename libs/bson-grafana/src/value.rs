use chrono::{DateTime, Utc};
use serde_json::value::RawValue;

use crate::field_type::FieldType;

// ═══════════════════════════════════════════════════════════════
//  RawJson — pre-serialized JSON text
// ═══════════════════════════════════════════════════════════════

/// Compact JSON text destined for a JSON column.
///
/// Stored as a [`RawValue`] so it is never re-parsed on the way into a frame.
#[derive(Debug, Clone)]
pub struct RawJson(Box<RawValue>);

impl RawJson {
    /// Serialize a JSON tree into compact text.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::value::to_raw_value(value).map(Self)
    }

    /// Validate `text` as JSON and keep it verbatim.
    pub fn from_string(text: String) -> Result<Self, serde_json::Error> {
        RawValue::from_string(text).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.get()
    }
}

impl PartialEq for RawJson {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl std::fmt::Display for RawJson {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RawJson> for String {
    fn from(json: RawJson) -> Self {
        json.as_str().to_owned()
    }
}

// ═══════════════════════════════════════════════════════════════
//  FieldValue — one cell of a Grafana frame
// ═══════════════════════════════════════════════════════════════

/// A value that can be appended to a frame column of the matching
/// [`FieldType`].
///
/// Plain variants belong in plain columns, `Nullable*` variants in nullable
/// columns. [`field_type`](Self::field_type) is total, so a value and its tag
/// cannot disagree.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Bool(bool),
    Time(DateTime<Utc>),
    Json(RawJson),
    NullableInt32(Option<i32>),
    NullableInt64(Option<i64>),
    NullableFloat64(Option<f64>),
    NullableString(Option<String>),
    NullableBool(Option<bool>),
    NullableTime(Option<DateTime<Utc>>),
    NullableJson(Option<RawJson>),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Int32(_) => FieldType::Int32,
            FieldValue::Int64(_) => FieldType::Int64,
            FieldValue::Float64(_) => FieldType::Float64,
            FieldValue::String(_) => FieldType::String,
            FieldValue::Bool(_) => FieldType::Bool,
            FieldValue::Time(_) => FieldType::Time,
            FieldValue::Json(_) => FieldType::Json,
            FieldValue::NullableInt32(_) => FieldType::NullableInt32,
            FieldValue::NullableInt64(_) => FieldType::NullableInt64,
            FieldValue::NullableFloat64(_) => FieldType::NullableFloat64,
            FieldValue::NullableString(_) => FieldType::NullableString,
            FieldValue::NullableBool(_) => FieldType::NullableBool,
            FieldValue::NullableTime(_) => FieldType::NullableTime,
            FieldValue::NullableJson(_) => FieldType::NullableJson,
        }
    }

    /// Box a plain value into the optional form of its own type.
    ///
    /// Already-nullable values are returned unchanged.
    pub fn into_nullable(self) -> FieldValue {
        match self {
            FieldValue::Int32(v) => boxed(v),
            FieldValue::Int64(v) => boxed(v),
            FieldValue::Float64(v) => boxed(v),
            FieldValue::String(v) => boxed(v),
            FieldValue::Bool(v) => boxed(v),
            FieldValue::Time(v) => boxed(v),
            FieldValue::Json(v) => boxed(v),
            nullable => nullable,
        }
    }

    /// Unbox a nullable value. `None` means the box was empty.
    pub fn into_non_nullable(self) -> Option<FieldValue> {
        match self {
            FieldValue::NullableInt32(v) => v.map(FieldValue::Int32),
            FieldValue::NullableInt64(v) => v.map(FieldValue::Int64),
            FieldValue::NullableFloat64(v) => v.map(FieldValue::Float64),
            FieldValue::NullableString(v) => v.map(FieldValue::String),
            FieldValue::NullableBool(v) => v.map(FieldValue::Bool),
            FieldValue::NullableTime(v) => v.map(FieldValue::Time),
            FieldValue::NullableJson(v) => v.map(FieldValue::Json),
            plain => Some(plain),
        }
    }
}

fn boxed<T: ColumnScalar>(value: T) -> FieldValue {
    T::into_nullable(Some(value))
}

// ═══════════════════════════════════════════════════════════════
//  ColumnScalar — compile-time link between Rust types and tags
// ═══════════════════════════════════════════════════════════════

/// A Rust type that backs one Grafana column type.
pub trait ColumnScalar: Sized {
    const FIELD_TYPE: FieldType;

    fn into_value(self) -> FieldValue;

    /// Build the nullable form, e.g. `Option<i64>` → `NullableInt64`.
    fn into_nullable(value: Option<Self>) -> FieldValue;

    /// Extract from either the plain or the nullable form of this type.
    /// A value of any other type is handed back in `Err`.
    fn from_value(value: FieldValue) -> Result<Option<Self>, FieldValue>;
}

macro_rules! column_scalar {
    ($($ty:ty => $plain:ident, $nullable:ident;)*) => {$(
        impl ColumnScalar for $ty {
            const FIELD_TYPE: FieldType = FieldType::$plain;

            fn into_value(self) -> FieldValue {
                FieldValue::$plain(self)
            }

            fn into_nullable(value: Option<Self>) -> FieldValue {
                FieldValue::$nullable(value)
            }

            fn from_value(value: FieldValue) -> Result<Option<Self>, FieldValue> {
                match value {
                    FieldValue::$plain(v) => Ok(Some(v)),
                    FieldValue::$nullable(v) => Ok(v),
                    other => Err(other),
                }
            }
        }

        impl From<$ty> for FieldValue {
            fn from(value: $ty) -> Self {
                value.into_value()
            }
        }
    )*};
}

column_scalar! {
    i32 => Int32, NullableInt32;
    i64 => Int64, NullableInt64;
    f64 => Float64, NullableFloat64;
    String => String, NullableString;
    bool => Bool, NullableBool;
    DateTime<Utc> => Time, NullableTime;
    RawJson => Json, NullableJson;
}

// ═══════════════════════════════════════════════════════════════
//  Converted — successful conversion result
// ═══════════════════════════════════════════════════════════════

/// Outcome of a successful conversion: a value, or an explicit null.
///
/// The destination tag is derived from the value, and a null always reports
/// [`FieldType::Unknown`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Converted(Option<FieldValue>);

impl Converted {
    pub const NULL: Converted = Converted(None);

    pub fn present(value: impl Into<FieldValue>) -> Self {
        Self(Some(value.into()))
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn field_type(&self) -> FieldType {
        self.0.as_ref().map_or(FieldType::Unknown, FieldValue::field_type)
    }

    pub fn as_value(&self) -> Option<&FieldValue> {
        self.0.as_ref()
    }

    pub fn into_value(self) -> Option<FieldValue> {
        self.0
    }
}

impl From<FieldValue> for Converted {
    fn from(value: FieldValue) -> Self {
        Self(Some(value))
    }
}
