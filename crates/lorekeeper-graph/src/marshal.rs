//! Conversion between graph property values and portable JSON values.
//!
//! Reads turn integers into JSON integers and calendar date-times into
//! millisecond-precision ISO-8601 strings. Writes accept scalars and
//! homogeneous scalar arrays; nested objects are stored as a JSON string
//! under `<key>__json` and decoded again on read.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use neo4rs::{BoltNull, BoltType};
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

use lorekeeper_core::{CatalogError, PropertyBag};

/// Suffix marking a property that holds a JSON-encoded object.
pub const JSON_SUFFIX: &str = "__json";

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

// ── Temporal ─────────────────────────────────────────────────────

/// Calendar and clock components of a stored date-time.
///
/// Components are taken as stored; no timezone offset is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub nanosecond: u32,
}

impl TemporalParts {
    /// Render as `YYYY-MM-DDTHH:MM:SS.mmmZ`, truncating to milliseconds.
    pub fn to_iso(&self) -> Option<String> {
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day)?;
        let time = NaiveTime::from_hms_milli_opt(
            self.hour,
            self.minute,
            self.second,
            self.nanosecond / 1_000_000,
        )?;
        Some(date.and_time(time).format(ISO_FORMAT).to_string())
    }
}

impl From<NaiveDateTime> for TemporalParts {
    fn from(dt: NaiveDateTime) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
            nanosecond: dt.nanosecond(),
        }
    }
}

impl From<NaiveDate> for TemporalParts {
    fn from(d: NaiveDate) -> Self {
        Self {
            year: d.year(),
            month: d.month(),
            day: d.day(),
            hour: 0,
            minute: 0,
            second: 0,
            nanosecond: 0,
        }
    }
}

// ── Read Path ────────────────────────────────────────────────────

/// A property value as decoded from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(TemporalParts),
    List(Vec<StoreValue>),
    /// Points, durations, bare times and other kinds with no JSON form.
    Unsupported,
}

impl From<&BoltType> for StoreValue {
    fn from(value: &BoltType) -> Self {
        match value {
            BoltType::Null(_) => Self::Null,
            BoltType::Boolean(b) => Self::Bool(b.value),
            BoltType::Integer(i) => Self::Int(i.value),
            BoltType::Float(f) => Self::Float(f.value),
            BoltType::String(s) => Self::String(s.value.clone()),
            BoltType::List(l) => Self::List(l.value.iter().map(Self::from).collect()),
            _ => Self::Unsupported,
        }
    }
}

impl StoreValue {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null | Self::Unsupported => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::String(s) => Value::String(s.clone()),
            Self::DateTime(parts) => parts.to_iso().map_or(Value::Null, Value::String),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

fn is_temporal(value: &BoltType) -> bool {
    matches!(
        value,
        BoltType::Date(_)
            | BoltType::DateTime(_)
            | BoltType::LocalDateTime(_)
            | BoltType::DateTimeZoneId(_)
    )
}

/// Read access to the properties of a node or relationship.
pub trait PropertySource {
    fn property_keys(&self) -> Vec<String>;
    fn property<T: DeserializeOwned>(&self, key: &str) -> Option<T>;
}

impl PropertySource for neo4rs::Node {
    fn property_keys(&self) -> Vec<String> {
        self.keys().into_iter().map(|k| k.to_string()).collect()
    }

    fn property<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get::<T>(key).ok()
    }
}

impl PropertySource for neo4rs::Relation {
    fn property_keys(&self) -> Vec<String> {
        self.keys().into_iter().map(|k| k.to_string()).collect()
    }

    fn property<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get::<T>(key).ok()
    }
}

/// Decode a temporal property through the matching chrono type.
fn decode_temporal<S: PropertySource>(source: &S, key: &str, sample: &BoltType) -> Option<TemporalParts> {
    match sample {
        BoltType::Date(_) => source.property::<NaiveDate>(key).map(TemporalParts::from),
        BoltType::LocalDateTime(_) => source.property::<NaiveDateTime>(key).map(TemporalParts::from),
        _ => source
            .property::<DateTime<FixedOffset>>(key)
            .map(|dt| dt.naive_local().into()),
    }
}

fn decode_temporal_list<S: PropertySource>(source: &S, key: &str, sample: &BoltType) -> Option<StoreValue> {
    let parts: Vec<TemporalParts> = match sample {
        BoltType::Date(_) => source
            .property::<Vec<NaiveDate>>(key)?
            .into_iter()
            .map(TemporalParts::from)
            .collect(),
        BoltType::LocalDateTime(_) => source
            .property::<Vec<NaiveDateTime>>(key)?
            .into_iter()
            .map(TemporalParts::from)
            .collect(),
        _ => source
            .property::<Vec<DateTime<FixedOffset>>>(key)?
            .into_iter()
            .map(|dt| dt.naive_local().into())
            .collect(),
    };
    Some(StoreValue::List(parts.into_iter().map(StoreValue::DateTime).collect()))
}

/// Decode one property of a node or relationship.
pub fn decode_property<S: PropertySource>(source: &S, key: &str) -> StoreValue {
    let Some(raw) = source.property::<BoltType>(key) else {
        tracing::warn!(key, "Property could not be decoded");
        return StoreValue::Unsupported;
    };

    let decoded = match &raw {
        v if is_temporal(v) => decode_temporal(source, key, v).map(StoreValue::DateTime),
        BoltType::List(list) => match list.value.first() {
            Some(first) if is_temporal(first) => decode_temporal_list(source, key, first),
            _ => Some(StoreValue::from(&raw)),
        },
        other => Some(StoreValue::from(other)),
    };

    decoded.unwrap_or_else(|| {
        tracing::warn!(key, "Temporal property could not be decoded");
        StoreValue::Unsupported
    })
}

/// Assemble a property bag from decoded values, unpacking `__json` entries.
///
/// An entry that fails to parse becomes an empty object.
pub fn unpack_properties<I>(values: I) -> PropertyBag
where
    I: IntoIterator<Item = (String, StoreValue)>,
{
    let mut bag = PropertyBag::new();
    for (key, value) in values {
        let base = key
            .strip_suffix(JSON_SUFFIX)
            .filter(|b| !b.is_empty())
            .map(str::to_string);
        match (base, &value) {
            (Some(base), StoreValue::String(raw)) => {
                let parsed = serde_json::from_str::<Value>(raw).unwrap_or_else(|e| {
                    tracing::warn!(key = %key, error = %e, "Malformed JSON property");
                    Value::Object(PropertyBag::new())
                });
                bag.insert(base, parsed);
            }
            _ => {
                bag.insert(key, value.to_json());
            }
        }
    }
    bag
}

/// Read every property of a node or relationship into a bag.
pub fn read_properties<S: PropertySource>(source: &S) -> PropertyBag {
    unpack_properties(source.property_keys().into_iter().map(|key| {
        let value = decode_property(source, &key);
        (key, value)
    }))
}

// ── Write Path ───────────────────────────────────────────────────

fn invalid(key: &str, reason: &str) -> CatalogError {
    CatalogError::InvalidPropertyValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn scalar_to_bolt(key: &str, value: &Value) -> Result<BoltType, CatalogError> {
    match value {
        Value::Null => Ok(BoltType::Null(BoltNull)),
        Value::Bool(b) => Ok(BoltType::from(*b)),
        Value::Number(n) if n.is_u64() && !n.is_i64() => Err(invalid(key, "number out of range")),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(BoltType::from(i)),
            (None, Some(f)) => Ok(BoltType::from(f)),
            (None, None) => Err(invalid(key, "number out of range")),
        },
        Value::String(s) => Ok(BoltType::from(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(invalid(key, "expected a scalar")),
    }
}

#[derive(PartialEq)]
enum ElementKind {
    Bool,
    Number,
    String,
}

fn array_to_bolt(key: &str, items: &[Value]) -> Result<BoltType, CatalogError> {
    let mut kind = None;
    let mut all_integers = true;
    for item in items {
        let k = match item {
            Value::Bool(_) => ElementKind::Bool,
            Value::Number(n) if n.is_u64() && !n.is_i64() => {
                return Err(invalid(key, "number out of range"))
            }
            Value::Number(n) => {
                all_integers &= n.is_i64();
                ElementKind::Number
            }
            Value::String(_) => ElementKind::String,
            Value::Null => return Err(invalid(key, "arrays may not contain null")),
            Value::Array(_) | Value::Object(_) => {
                return Err(invalid(key, "arrays may only contain scalars"))
            }
        };
        match &kind {
            None => kind = Some(k),
            Some(existing) if *existing != k => {
                return Err(invalid(key, "array elements must share one type"))
            }
            Some(_) => {}
        }
    }

    let converted = if kind == Some(ElementKind::Number) && !all_integers {
        items
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(BoltType::from)
                    .ok_or_else(|| invalid(key, "number out of range"))
            })
            .collect::<Result<Vec<_>, _>>()?
    } else {
        items
            .iter()
            .map(|v| scalar_to_bolt(key, v))
            .collect::<Result<Vec<_>, _>>()?
    };
    Ok(BoltType::from(converted))
}

/// Validate a property bag and convert it into Bolt parameters.
///
/// Nested objects are stored under `<key>__json`. Keys that already carry
/// that suffix are rejected.
pub fn pack_properties(bag: &PropertyBag) -> Result<HashMap<String, BoltType>, CatalogError> {
    let mut packed = HashMap::with_capacity(bag.len());
    for (key, value) in bag {
        if key.is_empty() {
            return Err(invalid(key, "property names may not be empty"));
        }
        if key.ends_with(JSON_SUFFIX) {
            return Err(invalid(key, "property names may not end with __json"));
        }
        match value {
            Value::Object(_) => {
                let encoded = serde_json::to_string(value)
                    .map_err(|e| invalid(key, &e.to_string()))?;
                packed.insert(format!("{key}{JSON_SUFFIX}"), BoltType::from(encoded));
            }
            Value::Array(items) => {
                packed.insert(key.clone(), array_to_bolt(key, items)?);
            }
            scalar => {
                packed.insert(key.clone(), scalar_to_bolt(key, scalar)?);
            }
        }
    }
    Ok(packed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> PropertyBag {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_iso_truncates_to_milliseconds() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_nano_opt(10, 20, 30, 123_456_789)
            .unwrap();
        let parts = TemporalParts::from(dt);
        assert_eq!(parts.to_iso().as_deref(), Some("2024-05-01T10:20:30.123Z"));

        let back = NaiveDateTime::parse_from_str("2024-05-01T10:20:30.123Z", ISO_FORMAT).unwrap();
        assert_eq!(back.nanosecond(), 123_000_000);
    }

    #[test]
    fn test_date_renders_as_midnight() {
        let d = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        assert_eq!(
            TemporalParts::from(d).to_iso().as_deref(),
            Some("1999-12-31T00:00:00.000Z")
        );
    }

    #[test]
    fn test_invalid_parts_render_nothing() {
        let parts = TemporalParts {
            year: 2023,
            month: 2,
            day: 30,
            hour: 0,
            minute: 0,
            second: 0,
            nanosecond: 0,
        };
        assert_eq!(parts.to_iso(), None);
        assert_eq!(StoreValue::DateTime(parts).to_json(), Value::Null);
    }

    #[test]
    fn test_bolt_scalars_to_json() {
        assert_eq!(StoreValue::from(&BoltType::from(42_i64)).to_json(), json!(42));
        assert_eq!(StoreValue::from(&BoltType::from(true)).to_json(), json!(true));
        assert_eq!(StoreValue::from(&BoltType::from(1.5_f64)).to_json(), json!(1.5));
        assert_eq!(StoreValue::from(&BoltType::from("ember")).to_json(), json!("ember"));
        assert_eq!(
            StoreValue::from(&BoltType::from(vec![1_i64, 2, 3])).to_json(),
            json!([1, 2, 3])
        );
    }

    #[test]
    fn test_large_integers_stay_integers() {
        let v = StoreValue::Int(i64::MAX).to_json();
        assert_eq!(v.as_i64(), Some(i64::MAX));
        assert_eq!(StoreValue::String("42".into()).to_json(), json!("42"));
    }

    #[test]
    fn test_temporal_lists_render_element_wise() {
        let first = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        let list = StoreValue::List(vec![
            StoreValue::DateTime(first.into()),
            StoreValue::DateTime(first.succ_opt().unwrap().into()),
        ]);
        assert_eq!(
            list.to_json(),
            json!(["2020-01-02T00:00:00.000Z", "2020-01-03T00:00:00.000Z"])
        );
    }

    #[test]
    fn test_unpack_decodes_json_suffix() {
        let unpacked = unpack_properties(vec![
            ("since".to_string(), StoreValue::Int(1200)),
            (
                "terms__json".to_string(),
                StoreValue::String(r#"{"tithe":0.1,"oath":"blood"}"#.to_string()),
            ),
        ]);
        assert_eq!(
            Value::Object(unpacked),
            json!({"since": 1200, "terms": {"tithe": 0.1, "oath": "blood"}})
        );
    }

    #[test]
    fn test_unpack_malformed_json_becomes_empty_object() {
        let unpacked = unpack_properties(vec![(
            "terms__json".to_string(),
            StoreValue::String("{not json".to_string()),
        )]);
        assert_eq!(Value::Object(unpacked), json!({"terms": {}}));
    }

    #[test]
    fn test_unpack_leaves_non_string_suffix_values() {
        let unpacked = unpack_properties(vec![("odd__json".to_string(), StoreValue::Int(3))]);
        assert_eq!(Value::Object(unpacked), json!({"odd__json": 3}));
    }

    #[test]
    fn test_pack_scalars_and_arrays() {
        let packed = pack_properties(&bag(json!({
            "since": 1200,
            "weight": 0.5,
            "sworn": true,
            "title": "Warden",
            "aliases": ["Grey", "Wanderer"],
            "ratios": [1, 2.5],
            "note": null,
        })))
        .unwrap();

        assert!(matches!(&packed["since"], BoltType::Integer(i) if i.value == 1200));
        assert!(matches!(&packed["weight"], BoltType::Float(f) if f.value == 0.5));
        assert!(matches!(&packed["sworn"], BoltType::Boolean(b) if b.value));
        assert!(matches!(&packed["title"], BoltType::String(s) if s.value == "Warden"));
        assert!(matches!(&packed["aliases"], BoltType::List(l) if l.value.len() == 2));
        match &packed["ratios"] {
            BoltType::List(l) => {
                assert!(l.value.iter().all(|v| matches!(v, BoltType::Float(_))));
            }
            other => panic!("expected list, got {other:?}"),
        }
        assert!(matches!(&packed["note"], BoltType::Null(_)));
    }

    #[test]
    fn test_pack_nested_object_as_json_string() {
        let packed = pack_properties(&bag(json!({"terms": {"oath": "blood"}}))).unwrap();
        assert!(!packed.contains_key("terms"));
        match &packed["terms__json"] {
            BoltType::String(s) => {
                let round: Value = serde_json::from_str(&s.value).unwrap();
                assert_eq!(round, json!({"oath": "blood"}));
            }
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn test_pack_rejects_unstorable_values() {
        for (value, key) in [
            (json!({"mixed": [1, "two"]}), "mixed"),
            (json!({"nested": [[1], [2]]}), "nested"),
            (json!({"objects": [{"a": 1}]}), "objects"),
            (json!({"holes": [1, null]}), "holes"),
            (json!({"sneaky__json": "{}"}), "sneaky__json"),
            (json!({"huge": u64::MAX}), "huge"),
            (json!({"huge_list": [1.5, u64::MAX]}), "huge_list"),
        ] {
            match pack_properties(&bag(value)) {
                Err(CatalogError::InvalidPropertyValue { key: k, .. }) => assert_eq!(k, key),
                other => panic!("expected rejection for {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_pack_keeps_integer_bounds() {
        let packed = pack_properties(&bag(json!({"max": i64::MAX, "min": i64::MIN}))).unwrap();
        assert!(matches!(&packed["max"], BoltType::Integer(i) if i.value == i64::MAX));
        assert!(matches!(&packed["min"], BoltType::Integer(i) if i.value == i64::MIN));

        let err = pack_properties(&bag(json!({"over": (i64::MAX as u64) + 1}))).unwrap_err();
        assert_eq!(err.to_string(), CatalogError::InvalidPropertyValue {
            key: "over".into(),
            reason: "number out of range".into(),
        }.to_string());
    }

    #[test]
    fn test_pack_accepts_empty_array() {
        let packed = pack_properties(&bag(json!({"tags": []}))).unwrap();
        assert!(matches!(&packed["tags"], BoltType::List(l) if l.value.is_empty()));
    }
}
