use bson::Bson;

use crate::classify::classify;
use crate::decoded::{Decoded, classify_decoded};
use crate::error::ConvertError;
use crate::value::Converted;

/// Classify `value` for a column that may or may not admit nulls.
///
/// A null result is never boxed. A present value in a nullable column is
/// boxed into the optional form of its type, e.g. `Float64(1.0)` becomes
/// `NullableFloat64(Some(1.0))`, because a frame of `Option<f64>` will not
/// accept a bare `f64`.
pub fn adapt(value: &Bson, nullable: bool) -> Result<Converted, ConvertError> {
    classify(value).map(|converted| apply_nullability(converted, nullable))
}

/// [`adapt`] for values whose type is only known at runtime.
pub fn adapt_decoded(value: &dyn Decoded, nullable: bool) -> Result<Converted, ConvertError> {
    classify_decoded(value).map(|converted| apply_nullability(converted, nullable))
}

fn apply_nullability(converted: Converted, nullable: bool) -> Converted {
    if !nullable {
        return converted;
    }
    match converted.into_value() {
        Some(value) => Converted::from(value.into_nullable()),
        None => Converted::NULL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_type::FieldType;
    use crate::value::FieldValue;
    use bson::doc;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn samples() -> Vec<Bson> {
        vec![
            Bson::Int32(1),
            Bson::Int64(2),
            Bson::Double(0.25),
            Bson::String("s".into()),
            Bson::Boolean(false),
            Bson::Array(vec![Bson::Int32(1)]),
            Bson::Document(doc! { "a": 1 }),
            Bson::DateTime(bson::DateTime::from_millis(0)),
            Bson::Symbol("sym".into()),
            Bson::MinKey,
        ]
    }

    #[test]
    fn null_is_never_boxed() {
        for nullable in [false, true] {
            let converted = adapt(&Bson::Null, nullable).unwrap();
            assert_eq!(converted, Converted::NULL);
            assert_eq!(converted.field_type(), FieldType::Unknown);
            assert_eq!(adapt(&Bson::Undefined, nullable).unwrap(), Converted::NULL);
        }
    }

    #[test]
    fn non_nullable_is_classify() {
        for value in samples() {
            assert_eq!(adapt(&value, false).unwrap(), classify(&value).unwrap());
        }
    }

    #[test]
    fn nullable_boxes_present_values() {
        for value in samples() {
            let plain = classify(&value).unwrap();
            let boxed = adapt(&value, true).unwrap();
            assert_eq!(boxed.field_type(), plain.field_type().nullable_type());
            assert!(boxed.field_type().is_nullable(), "{value:?}");
            let unboxed = boxed.into_value().and_then(FieldValue::into_non_nullable);
            assert_eq!(unboxed, plain.into_value());
        }
    }

    #[test]
    fn float_example() {
        assert_eq!(
            adapt(&Bson::Double(1.0), true).unwrap().into_value(),
            Some(FieldValue::NullableFloat64(Some(1.0)))
        );
    }

    #[test]
    fn errors_propagate() {
        let ptr: *const () = std::ptr::null();
        for nullable in [false, true] {
            assert!(matches!(
                adapt_decoded(&ptr, nullable),
                Err(ConvertError::UnrecognizedKind { .. })
            ));
        }
    }

    #[test]
    fn decoded_values_are_boxed_too() {
        assert_eq!(
            adapt_decoded(&5_i64, true).unwrap().into_value(),
            Some(FieldValue::NullableInt64(Some(5)))
        );
        let none: Option<Bson> = None;
        assert!(adapt_decoded(&none, true).unwrap().is_null());
    }

    fn scalar() -> impl Strategy<Value = Bson> {
        prop_oneof![
            any::<i32>().prop_map(Bson::Int32),
            any::<i64>().prop_map(Bson::Int64),
            any::<f64>().prop_filter("NaN never equals itself", |f| !f.is_nan()).prop_map(Bson::Double),
            ".*".prop_map(Bson::String),
            any::<bool>().prop_map(Bson::Boolean),
            Just(Bson::Null),
        ]
    }

    proptest! {
        #[test]
        fn adapt_matches_classify(value in scalar()) {
            let plain = classify(&value).unwrap();
            prop_assert_eq!(adapt(&value, false).unwrap(), plain.clone());

            let boxed = adapt(&value, true).unwrap();
            if plain.is_null() {
                prop_assert!(boxed.is_null());
            } else {
                prop_assert_eq!(boxed.field_type(), plain.field_type().nullable_type());
                prop_assert_eq!(
                    boxed.into_value().and_then(FieldValue::into_non_nullable),
                    plain.into_value()
                );
            }
        }
    }
}
