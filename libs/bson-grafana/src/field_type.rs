use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════
//  FieldType — destination column type tag
// ═══════════════════════════════════════════════════════════════

/// Column type understood by the Grafana data-frame model.
///
/// Every concrete type has a nullable twin. A column of `Int64` holds bare
/// `i64`s while a column of `NullableInt64` holds `Option<i64>`; the two are
/// not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Unknown,
    Int32,
    Int64,
    Float64,
    String,
    Bool,
    Time,
    Json,
    NullableInt32,
    NullableInt64,
    NullableFloat64,
    NullableString,
    NullableBool,
    NullableTime,
    NullableJson,
}

impl FieldType {
    /// The form of this type that admits absent entries.
    ///
    /// Idempotent. `Unknown` has no nullable form and maps to itself.
    pub fn nullable_type(self) -> Self {
        match self {
            FieldType::Int32 => FieldType::NullableInt32,
            FieldType::Int64 => FieldType::NullableInt64,
            FieldType::Float64 => FieldType::NullableFloat64,
            FieldType::String => FieldType::NullableString,
            FieldType::Bool => FieldType::NullableBool,
            FieldType::Time => FieldType::NullableTime,
            FieldType::Json => FieldType::NullableJson,
            other => other,
        }
    }

    /// Inverse of [`nullable_type`](Self::nullable_type).
    pub fn non_nullable_type(self) -> Self {
        match self {
            FieldType::NullableInt32 => FieldType::Int32,
            FieldType::NullableInt64 => FieldType::Int64,
            FieldType::NullableFloat64 => FieldType::Float64,
            FieldType::NullableString => FieldType::String,
            FieldType::NullableBool => FieldType::Bool,
            FieldType::NullableTime => FieldType::Time,
            FieldType::NullableJson => FieldType::Json,
            other => other,
        }
    }

    pub fn is_nullable(self) -> bool {
        self != self.non_nullable_type()
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::Unknown => "unknown",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Float64 => "float64",
            FieldType::String => "string",
            FieldType::Bool => "bool",
            FieldType::Time => "time",
            FieldType::Json => "json",
            FieldType::NullableInt32 => "nullable_int32",
            FieldType::NullableInt64 => "nullable_int64",
            FieldType::NullableFloat64 => "nullable_float64",
            FieldType::NullableString => "nullable_string",
            FieldType::NullableBool => "nullable_bool",
            FieldType::NullableTime => "nullable_time",
            FieldType::NullableJson => "nullable_json",
        };
        f.write_str(name)
    }
}
