use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::FrameError;
use crate::field_type::FieldType;

// ═══════════════════════════════════════════════════════════════
//  Column schema — which document paths become which columns
// ═══════════════════════════════════════════════════════════════

/// Per-column extraction configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Dot-notation path into the document, e.g. `"order.items.0.sku"`.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub alias: String,
    /// Destination column type, without nullability.
    #[serde(default)]
    pub r#type: FieldType,
    /// Whether the column admits absent entries.
    #[serde(default)]
    pub nullable: bool,
}

impl FieldSpec {
    pub fn new(path: impl Into<String>, r#type: FieldType) -> Self {
        Self {
            path: path.into(),
            alias: String::new(),
            r#type,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// The type every present value in this column must carry.
    pub fn column_type(&self) -> FieldType {
        if self.nullable {
            self.r#type.nullable_type()
        } else {
            self.r#type
        }
    }

    /// Display name: alias if set, otherwise path.
    pub fn display_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.path
        } else {
            &self.alias
        }
    }
}

/// Shape of one frame: its name and ordered columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSchema {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl FrameSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Parse and validate a schema from JSON.
    pub fn from_json(text: &str) -> Result<Self, FrameError> {
        let schema: Self = serde_json::from_str(text)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        if self.fields.is_empty() {
            return Err(FrameError::Schema("at least one field is required".into()));
        }
        let mut seen = HashSet::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if field.path.trim().is_empty() {
                return Err(FrameError::Schema(format!("field {i}: path is required")));
            }
            if field.r#type == FieldType::Unknown {
                return Err(FrameError::Schema(format!("field {i}: type is required")));
            }
            if field.r#type.is_nullable() {
                return Err(FrameError::Schema(format!(
                    "field {i}: type '{}' is nullable, use \"nullable\": true instead",
                    field.r#type
                )));
            }
            if !seen.insert(field.display_name()) {
                return Err(FrameError::Schema(format!(
                    "field {i}: duplicate column name '{}'",
                    field.display_name()
                )));
            }
        }
        Ok(())
    }
}
