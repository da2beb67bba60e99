use crate::field_type::FieldType;

// ═══════════════════════════════════════════════════════════════
//  Per-value conversion errors
// ═══════════════════════════════════════════════════════════════

/// Failure to convert a single decoded value.
///
/// None of these are process-level failures: the caller decides whether a
/// failed field aborts the row, the query, or nothing at all.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("got value with a type not expected to be generated by BSON: {rendered} ({kind})")]
    UnrecognizedKind { kind: &'static str, rendered: String },

    #[error("extended JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("decimal128 '{text}' is not a float64: {source}")]
    DecimalParse {
        text: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("decimal128 '{text}' is outside the float64 range")]
    DecimalOutOfRange { text: String },

    #[error("time {millis}ms since epoch is outside the representable time range")]
    TimeOutOfRange { millis: i64 },
}

// ═══════════════════════════════════════════════════════════════
//  Frame building errors
// ═══════════════════════════════════════════════════════════════

/// Error type for schema loading and frame assembly.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("field '{field}' row {row}: {source}")]
    Convert {
        field: String,
        row: usize,
        #[source]
        source: ConvertError,
    },

    #[error("field '{field}' row {row}: expected {expected}, got {found}")]
    TypeMismatch {
        field: String,
        row: usize,
        expected: FieldType,
        found: FieldType,
    },

    #[error("field '{field}' row {row}: missing value in non-nullable column")]
    MissingValue { field: String, row: usize },

    #[error("schema: {0}")]
    Schema(String),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
