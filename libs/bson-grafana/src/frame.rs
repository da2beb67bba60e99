use std::convert::identity;

use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use grafana_plugin_sdk::data::{Field, Frame};
use grafana_plugin_sdk::prelude::*;

use crate::error::FrameError;
use crate::field_type::FieldType;
use crate::nullable::adapt;
use crate::schema::FrameSchema;
use crate::value::{ColumnScalar, FieldValue, RawJson};

// ═══════════════════════════════════════════════════════════════
//  FrameBuilder — documents in, Grafana frame out
// ═══════════════════════════════════════════════════════════════

/// Accumulates documents row by row into typed columns.
///
/// Column types come from the schema; a present value of any other type is
/// rejected. Rows are all-or-nothing: if any column rejects its value, no
/// column grows.
#[derive(Debug)]
pub struct FrameBuilder {
    name: String,
    columns: Vec<Column>,
    rows: usize,
}

#[derive(Debug)]
struct Column {
    name: String,
    path: String,
    nullable: bool,
    field_type: FieldType,
    values: Vec<Option<FieldValue>>,
}

impl FrameBuilder {
    pub fn new(schema: &FrameSchema) -> Result<Self, FrameError> {
        schema.validate()?;
        let columns = schema
            .fields
            .iter()
            .map(|spec| Column {
                name: spec.display_name().to_string(),
                path: spec.path.clone(),
                nullable: spec.nullable,
                field_type: spec.column_type(),
                values: Vec::new(),
            })
            .collect();
        tracing::debug!(frame = %schema.name, columns = schema.fields.len(), "frame builder created");
        Ok(Self {
            name: schema.name.clone(),
            columns,
            rows: 0,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column names with their declared type, nullability included.
    pub fn column_types(&self) -> Vec<(&str, FieldType)> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.field_type))
            .collect()
    }

    pub fn column_values(&self, name: &str) -> Option<&[Option<FieldValue>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn push_document(&mut self, doc: &Document) -> Result<(), FrameError> {
        let row = self.rows;
        let mut cells = Vec::with_capacity(self.columns.len());
        let null = Bson::Null;

        for column in &self.columns {
            let value = resolve_path(doc, &column.path).unwrap_or(&null);
            let converted = adapt(value, column.nullable).map_err(|source| FrameError::Convert {
                field: column.name.clone(),
                row,
                source,
            })?;

            let found = converted.field_type();
            match converted.into_value() {
                None if !column.nullable => {
                    return Err(FrameError::MissingValue {
                        field: column.name.clone(),
                        row,
                    });
                }
                None => cells.push(None),
                Some(value) => {
                    if column.field_type != found {
                        return Err(FrameError::TypeMismatch {
                            field: column.name.clone(),
                            row,
                            expected: column.field_type,
                            found,
                        });
                    }
                    cells.push(Some(value));
                }
            }
        }

        for (column, cell) in self.columns.iter_mut().zip(cells) {
            column.values.push(cell);
        }
        self.rows += 1;
        tracing::trace!(frame = %self.name, row, "row appended");
        Ok(())
    }

    pub fn push_documents<'a>(
        &mut self,
        docs: impl IntoIterator<Item = &'a Document>,
    ) -> Result<(), FrameError> {
        docs.into_iter().try_for_each(|doc| self.push_document(doc))
    }

    pub fn build(self) -> Result<Frame, FrameError> {
        let Self { name, columns, rows } = self;
        let column_count = columns.len();

        let mut frame = Frame::new(name.clone());
        for column in columns {
            tracing::debug!(
                frame = %name,
                field = %column.name,
                field_type = %column.field_type,
                "materializing column"
            );
            frame = frame.with_field(column.into_field()?);
        }

        tracing::debug!(frame = %name, rows, columns = column_count, "frame built");
        Ok(frame)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Column materialization
// ═══════════════════════════════════════════════════════════════

macro_rules! typed_field {
    ($column:expr, $ty:ty, $to_element:expr) => {{
        let Column { name, nullable, values, .. } = $column;
        let mut cells = Vec::with_capacity(values.len());
        for (row, value) in values.into_iter().enumerate() {
            cells.push(unbox::<$ty>(&name, row, value)?);
        }
        let elements = cells.into_iter().map(|cell| cell.map($to_element));
        if nullable {
            elements.collect::<Vec<_>>().into_opt_field(name)
        } else {
            let mut dense = Vec::with_capacity(elements.len());
            for (row, element) in elements.enumerate() {
                dense.push(element.ok_or_else(|| FrameError::MissingValue {
                    field: name.clone(),
                    row,
                })?);
            }
            dense.into_field(name)
        }
    }};
}

impl Column {
    fn into_field(self) -> Result<Field, FrameError> {
        let field = match self.field_type.non_nullable_type() {
            FieldType::Int32 => typed_field!(self, i32, identity),
            FieldType::Int64 => typed_field!(self, i64, identity),
            FieldType::Float64 => typed_field!(self, f64, identity),
            FieldType::String => typed_field!(self, String, identity),
            FieldType::Bool => typed_field!(self, bool, identity),
            FieldType::Time => typed_field!(self, DateTime<Utc>, identity),
            // JSON columns travel as their raw text.
            FieldType::Json => typed_field!(self, RawJson, String::from),
            other => {
                return Err(FrameError::Schema(format!(
                    "column '{}': no frame field for type '{other}'",
                    self.name
                )));
            }
        };
        Ok(field)
    }
}

fn unbox<T: ColumnScalar>(
    field: &str,
    row: usize,
    value: Option<FieldValue>,
) -> Result<Option<T>, FrameError> {
    match value {
        None => Ok(None),
        Some(value) => T::from_value(value).map_err(|other| FrameError::TypeMismatch {
            field: field.to_string(),
            row,
            expected: T::FIELD_TYPE,
            found: other.field_type(),
        }),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Dot-path lookup
// ═══════════════════════════════════════════════════════════════

/// Resolve a dot-notation path against a document. Numeric segments index
/// into arrays.
fn resolve_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.').map(str::trim).filter(|s| !s.is_empty());
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            Bson::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
