use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use bson::oid::ObjectId;
use bson::{Binary, Bson, DbPointer, Decimal128, Document, JavaScriptCodeWithScope, Regex, Timestamp};

use crate::classify::classify;
use crate::error::ConvertError;
use crate::value::Converted;

// ═══════════════════════════════════════════════════════════════
//  Decoded — a value whose concrete type is only known at runtime
// ═══════════════════════════════════════════════════════════════

/// Any value a decoder may hand out for a field.
///
/// Blanket-implemented, so `&5_i32`, `&bson::Bson`, `&Document` or a raw
/// pointer all coerce to `&dyn Decoded`. Only the types listed in
/// [`classify_decoded`] are accepted.
pub trait Decoded: Any + fmt::Debug {
    /// Rust type name, used in error messages.
    fn kind_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug> Decoded for T {
    fn kind_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Classify a value by its runtime type.
///
/// Accepted types: [`Bson`], `Option<Bson>`, `Box<dyn Decoded>`, `i32`, `i64`,
/// `f64`, `bool`, `String`, `&'static str`, `Vec<Bson>`,
/// `Vec<Box<dyn Decoded>>`, [`Document`], `HashMap<String, Bson>`,
/// `BTreeMap<String, Bson>`, `HashMap<String, Box<dyn Decoded>>`,
/// [`ObjectId`], [`bson::DateTime`], [`Binary`], [`Regex`],
/// [`JavaScriptCodeWithScope`], [`Timestamp`], [`Decimal128`] and
/// [`DbPointer`]. Anything else is [`ConvertError::UnrecognizedKind`].
pub fn classify_decoded(value: &dyn Decoded) -> Result<Converted, ConvertError> {
    classify(&to_bson(value)?)
}

fn to_bson(value: &dyn Decoded) -> Result<Bson, ConvertError> {
    let any = value.as_any();

    macro_rules! try_as {
        ($($ty:ty => $convert:expr;)*) => {$(
            if let Some(v) = any.downcast_ref::<$ty>() {
                let convert: fn(&$ty) -> Result<Bson, ConvertError> = $convert;
                return convert(v);
            }
        )*};
    }

    try_as! {
        Bson => |v| Ok(v.clone());
        Option<Bson> => |v| Ok(v.clone().unwrap_or(Bson::Null));
        Box<dyn Decoded> => |v| to_bson(v.as_ref());

        i32 => |v| Ok(Bson::Int32(*v));
        i64 => |v| Ok(Bson::Int64(*v));
        f64 => |v| Ok(Bson::Double(*v));
        bool => |v| Ok(Bson::Boolean(*v));
        String => |v| Ok(Bson::String(v.clone()));
        &'static str => |v| Ok(Bson::String((*v).to_owned()));

        Vec<Bson> => |v| Ok(Bson::Array(v.clone()));
        Vec<Box<dyn Decoded>> => |v| {
            v.iter()
                .map(|item| to_bson(item.as_ref()))
                .collect::<Result<Vec<_>, _>>()
                .map(Bson::Array)
        };

        Document => |v| Ok(Bson::Document(v.clone()));
        HashMap<String, Bson> => |v| Ok(Bson::Document(sorted(v.iter().map(|(k, b)| (k, b.clone())))));
        BTreeMap<String, Bson> => |v| {
            Ok(Bson::Document(v.iter().map(|(k, b)| (k.clone(), b.clone())).collect()))
        };
        HashMap<String, Box<dyn Decoded>> => |v| {
            let entries = v
                .iter()
                .map(|(k, item)| Ok((k, to_bson(item.as_ref())?)))
                .collect::<Result<Vec<_>, ConvertError>>()?;
            Ok(Bson::Document(sorted(entries)))
        };

        ObjectId => |v| Ok(Bson::ObjectId(*v));
        bson::DateTime => |v| Ok(Bson::DateTime(*v));
        Binary => |v| Ok(Bson::Binary(v.clone()));
        Regex => |v| Ok(Bson::RegularExpression(v.clone()));
        JavaScriptCodeWithScope => |v| Ok(Bson::JavaScriptCodeWithScope(v.clone()));
        Timestamp => |v| Ok(Bson::Timestamp(*v));
        Decimal128 => |v| Ok(Bson::Decimal128(*v));
        DbPointer => |v| Ok(Bson::DbPointer(v.clone()));
    }

    Err(ConvertError::UnrecognizedKind {
        kind: value.kind_name(),
        rendered: format!("{value:?}"),
    })
}

/// Unordered maps have no inherent key order; sort so output is stable.
fn sorted<'a>(entries: impl IntoIterator<Item = (&'a String, Bson)>) -> Document {
    let mut entries: Vec<_> = entries.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries.into_iter().map(|(k, v)| (k.clone(), v)).collect()
}
