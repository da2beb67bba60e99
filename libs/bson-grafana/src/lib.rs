//! Conversion of decoded BSON values into Grafana data-frame scalars.
//!
//! - [`classify`] maps one [`bson::Bson`] to a typed [`FieldValue`] or an error.
//! - [`adapt`] layers column nullability on top of it.
//! - [`classify_decoded`] does the same for values known only at runtime.
//! - [`FrameBuilder`] collects adapted values into a Grafana [`Frame`](grafana_plugin_sdk::data::Frame).

pub mod classify;
pub mod decoded;
pub mod error;
pub mod field_type;
pub mod frame;
pub mod nullable;
pub mod schema;
pub mod value;

pub use classify::{classify, classify_array, classify_document, parse_decimal};
pub use decoded::{Decoded, classify_decoded};
pub use error::{ConvertError, FrameError};
pub use field_type::FieldType;
pub use frame::FrameBuilder;
pub use nullable::{adapt, adapt_decoded};
pub use schema::{FieldSpec, FrameSchema};
pub use value::{ColumnScalar, Converted, FieldValue, RawJson};
