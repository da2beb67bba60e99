use bson::{Bson, Document};
use chrono::DateTime;

use crate::error::ConvertError;
use crate::value::{Converted, RawJson};

// ═══════════════════════════════════════════════════════════════
//  BSON → Grafana scalar
// ═══════════════════════════════════════════════════════════════

/// Convert one decoded BSON value into a Grafana scalar.
///
/// Grafana's column types are much coarser than BSON's, so most structured
/// kinds collapse to `String` or `Json`:
///
/// | BSON | Grafana |
/// |------|---------|
/// | Null, Undefined | null |
/// | Int32, Int64, Double, String, Boolean | same value |
/// | Array, Document | relaxed extended JSON |
/// | ObjectId, Binary | lowercase hex (binary subtype dropped) |
/// | DateTime, Timestamp | time (timestamp increment dropped) |
/// | RegularExpression | pattern (options dropped) |
/// | JavaScriptCode, JavaScriptCodeWithScope | code (scope dropped) |
/// | Decimal128 | float64 |
/// | MinKey, MaxKey, DbPointer | relaxed extended JSON text |
/// | Symbol | string |
pub fn classify(value: &Bson) -> Result<Converted, ConvertError> {
    let converted = match value {
        Bson::Null | Bson::Undefined => Converted::NULL,

        Bson::Int32(v) => Converted::present(*v),
        Bson::Int64(v) => Converted::present(*v),
        Bson::Double(v) => Converted::present(*v),
        Bson::String(v) => Converted::present(v.clone()),
        Bson::Boolean(v) => Converted::present(*v),

        Bson::Array(items) => classify_array(items)?,
        Bson::Document(doc) => classify_document(doc)?,

        Bson::ObjectId(oid) => Converted::present(hex::encode(oid.bytes())),
        Bson::DateTime(dt) => {
            let millis = dt.timestamp_millis();
            let time = DateTime::from_timestamp_millis(millis)
                .ok_or(ConvertError::TimeOutOfRange { millis })?;
            Converted::present(time)
        }
        Bson::Binary(bin) => Converted::present(hex::encode(&bin.bytes)),
        Bson::RegularExpression(regex) => Converted::present(regex.pattern.clone()),
        Bson::JavaScriptCode(code) => Converted::present(code.clone()),
        Bson::JavaScriptCodeWithScope(cws) => Converted::present(cws.code.clone()),
        Bson::Timestamp(ts) => {
            let seconds = i64::from(ts.time);
            let time = DateTime::from_timestamp(seconds, 0).ok_or(ConvertError::TimeOutOfRange {
                millis: seconds.saturating_mul(1000),
            })?;
            Converted::present(time)
        }
        Bson::Decimal128(dec) => Converted::present(parse_decimal(&dec.to_string())?),

        Bson::MinKey | Bson::MaxKey | Bson::DbPointer(_) => {
            Converted::present(render_extjson(value.clone())?)
        }
        Bson::Symbol(symbol) => Converted::present(symbol.clone()),
    };
    Ok(converted)
}

/// Relaxed extended JSON of the array itself, e.g. `[1,"a",true]`.
pub fn classify_array(items: &[Bson]) -> Result<Converted, ConvertError> {
    let tree = serde_json::Value::Array(
        items
            .iter()
            .cloned()
            .map(Bson::into_relaxed_extjson)
            .collect(),
    );
    Ok(Converted::present(RawJson::from_value(&tree)?))
}

/// Relaxed extended JSON of the document, keys in document order.
pub fn classify_document(doc: &Document) -> Result<Converted, ConvertError> {
    let tree = Bson::Document(doc.clone()).into_relaxed_extjson();
    Ok(Converted::present(RawJson::from_value(&tree)?))
}

/// Parse the canonical string form of a Decimal128 as a float64.
///
/// `NaN` and `±Infinity` pass through. A finite decimal beyond the float64
/// range is an error rather than an infinity.
pub fn parse_decimal(text: &str) -> Result<f64, ConvertError> {
    let parsed = text.parse::<f64>().map_err(|source| ConvertError::DecimalParse {
        text: text.to_owned(),
        source,
    })?;
    if parsed.is_infinite() && !is_infinity_literal(text) {
        return Err(ConvertError::DecimalOutOfRange {
            text: text.to_owned(),
        });
    }
    Ok(parsed)
}

fn is_infinity_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    unsigned.eq_ignore_ascii_case("infinity") || unsigned.eq_ignore_ascii_case("inf")
}

fn render_extjson(value: Bson) -> Result<String, ConvertError> {
    Ok(serde_json::to_string(&value.into_relaxed_extjson())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_type::FieldType;
    use crate::value::FieldValue;
    use bson::oid::ObjectId;
    use bson::spec::BinarySubtype;
    use bson::{Binary, Decimal128, JavaScriptCodeWithScope, Regex, Timestamp, doc};
    use pretty_assertions::assert_eq;

    fn value_of(bson: Bson) -> FieldValue {
        classify(&bson).unwrap().into_value().expect("non-null")
    }

    fn json_of(bson: Bson) -> String {
        match value_of(bson) {
            FieldValue::Json(raw) => raw.as_str().to_owned(),
            other => panic!("expected json, got {other:?}"),
        }
    }

    #[test]
    fn null_and_undefined_are_absent() {
        for bson in [Bson::Null, Bson::Undefined] {
            let converted = classify(&bson).unwrap();
            assert!(converted.is_null());
            assert_eq!(converted.field_type(), FieldType::Unknown);
        }
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(value_of(Bson::Int32(-4)), FieldValue::Int32(-4));
        assert_eq!(value_of(Bson::Int64(1 << 40)), FieldValue::Int64(1 << 40));
        assert_eq!(value_of(Bson::Double(2.5)), FieldValue::Float64(2.5));
        assert_eq!(value_of(Bson::String("abc".into())), FieldValue::String("abc".into()));
        assert_eq!(value_of(Bson::Boolean(true)), FieldValue::Bool(true));
    }

    #[test]
    fn array_has_no_wrapper() {
        let array = Bson::Array(vec![Bson::Int32(1), Bson::String("a".into()), Bson::Boolean(true)]);
        assert_eq!(json_of(array), r#"[1,"a",true]"#);
    }

    #[test]
    fn empty_containers() {
        assert_eq!(json_of(Bson::Array(vec![])), "[]");
        assert_eq!(json_of(Bson::Document(doc! {})), "{}");
    }

    #[test]
    fn nested_array_of_documents() {
        let array = Bson::Array(vec![
            Bson::Document(doc! { "a": 1, "b": [true, null] }),
            Bson::Document(doc! {}),
        ]);
        assert_eq!(json_of(array), r#"[{"a":1,"b":[true,null]},{}]"#);
    }

    #[test]
    fn document_keeps_key_order() {
        let document = doc! { "z": 1, "a": "x", "m": { "k": 2_i64 } };
        assert_eq!(json_of(Bson::Document(document)), r#"{"z":1,"a":"x","m":{"k":2}}"#);
    }

    #[test]
    fn object_id_is_hex() {
        let oid = ObjectId::from_bytes([0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(
            value_of(Bson::ObjectId(oid)),
            FieldValue::String("000102030405060708090a0b".into())
        );
    }

    #[test]
    fn datetime_keeps_instant() {
        let millis = 1_700_000_000_123;
        let expected = DateTime::from_timestamp_millis(millis).unwrap();
        assert_eq!(
            value_of(Bson::DateTime(bson::DateTime::from_millis(millis))),
            FieldValue::Time(expected)
        );
    }

    #[test]
    fn datetime_outside_chrono_range_is_an_error() {
        for millis in [i64::MAX, i64::MIN] {
            let err = classify(&Bson::DateTime(bson::DateTime::from_millis(millis))).unwrap_err();
            assert!(
                matches!(err, ConvertError::TimeOutOfRange { millis: m } if m == millis),
                "{err}"
            );
        }
    }

    #[test]
    fn datetime_at_chrono_edge_is_exact() {
        let max = DateTime::<chrono::Utc>::MAX_UTC.timestamp_millis();
        let FieldValue::Time(time) = value_of(Bson::DateTime(bson::DateTime::from_millis(max))) else {
            panic!("expected time");
        };
        assert_eq!(time.timestamp_millis(), max);
    }

    #[test]
    fn binary_drops_subtype() {
        let bin = Binary { subtype: BinarySubtype::Generic, bytes: vec![0xDE, 0xAD] };
        let converted = classify(&Bson::Binary(bin)).unwrap();
        assert_eq!(converted.field_type(), FieldType::String);
        assert_eq!(converted.into_value(), Some(FieldValue::String("dead".into())));
    }

    #[test]
    fn regex_keeps_pattern_only() {
        let regex = Regex { pattern: "^a.*z$".into(), options: "i".into() };
        assert_eq!(value_of(Bson::RegularExpression(regex)), FieldValue::String("^a.*z$".into()));
    }

    #[test]
    fn javascript_keeps_code_only() {
        assert_eq!(
            value_of(Bson::JavaScriptCode("return 1".into())),
            FieldValue::String("return 1".into())
        );
        let cws = JavaScriptCodeWithScope { code: "return x".into(), scope: doc! { "x": 1 } };
        assert_eq!(
            value_of(Bson::JavaScriptCodeWithScope(cws)),
            FieldValue::String("return x".into())
        );
    }

    #[test]
    fn timestamp_drops_increment() {
        let ts = Timestamp { time: 1_600_000_000, increment: 42 };
        let expected = DateTime::from_timestamp(1_600_000_000, 0).unwrap();
        assert_eq!(value_of(Bson::Timestamp(ts)), FieldValue::Time(expected));
    }

    #[test]
    fn decimal_parses_as_float() {
        // 125 × 10^-2
        let bytes = [0x7D, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x3C, 0x30];
        let dec = Decimal128::from_bytes(bytes);
        assert_eq!(dec.to_string(), "1.25");
        assert_eq!(value_of(Bson::Decimal128(dec)), FieldValue::Float64(1.25));
    }

    #[test]
    fn bad_decimal_text_is_an_error() {
        let err = parse_decimal("3,14").unwrap_err();
        assert!(matches!(err, ConvertError::DecimalParse { ref text, .. } if text == "3,14"));
    }

    #[test]
    fn decimal_beyond_float_range_is_an_error() {
        let dec: Decimal128 = "1E+400".parse().unwrap();
        let err = classify(&Bson::Decimal128(dec)).unwrap_err();
        assert!(matches!(err, ConvertError::DecimalOutOfRange { .. }), "{err}");
        assert!(matches!(
            parse_decimal("-1E+400"),
            Err(ConvertError::DecimalOutOfRange { ref text }) if text == "-1E+400"
        ));
    }

    #[test]
    fn decimal_specials_pass_through() {
        assert_eq!(parse_decimal("Infinity").unwrap(), f64::INFINITY);
        assert_eq!(parse_decimal("-Infinity").unwrap(), f64::NEG_INFINITY);
        assert!(parse_decimal("NaN").unwrap().is_nan());

        let nan: Decimal128 = "NaN".parse().unwrap();
        let FieldValue::Float64(value) = value_of(Bson::Decimal128(nan)) else {
            panic!("expected float");
        };
        assert!(value.is_nan());
    }

    #[test]
    fn sentinels_render_as_extjson() {
        assert_eq!(value_of(Bson::MinKey), FieldValue::String(r#"{"$minKey":1}"#.into()));
        assert_eq!(value_of(Bson::MaxKey), FieldValue::String(r#"{"$maxKey":1}"#.into()));
    }

    #[test]
    fn db_pointer_renders_as_extjson() {
        let extjson = serde_json::json!({
            "$dbPointer": { "$ref": "db.coll", "$id": { "$oid": "000102030405060708090a0b" } }
        });
        let pointer = Bson::try_from(extjson.clone()).unwrap();
        assert!(matches!(pointer, Bson::DbPointer(_)));

        let FieldValue::String(text) = value_of(pointer) else {
            panic!("expected string");
        };
        let rendered: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(rendered, extjson);
    }

    #[test]
    fn symbol_is_text() {
        assert_eq!(value_of(Bson::Symbol("sym".into())), FieldValue::String("sym".into()));
    }
}
