//! # Open Metadata
//!
//! Devices and candidate observations carry an open-shaped metadata bag whose
//! keys evolve with the collectors feeding the core (source tracking, raw
//! SNMP descriptors, syslog facility hints, ...).
//!
//! `MetaValue` is an explicit variant type. Human-readable formats (JSON, TOML)
//! see plain values (`"public"`, `42`, `[..]`, `{..}`); binary formats such as
//! postcard see an externally tagged enum, since they cannot infer the variant.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata map attached to devices, connections and observations.
pub type Metadata = BTreeMap<String, MetaValue>;

/// A single metadata value.
///
/// Integer-only: floating-point numbers arriving over JSON are kept as their
/// textual form so the core stays free of float arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<MetaValue>),
    Map(BTreeMap<String, MetaValue>),
}

impl MetaValue {
    /// Borrow the text payload, if this is a `Text` value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer payload, if this is an `Int` value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrow the list payload, if this is a `List` value.
    #[must_use]
    pub fn as_list(&self) -> Option<&[MetaValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Build a list of text values.
    pub fn text_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::Text(s.into())).collect())
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for MetaValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

// =============================================================================
// SERDE
// =============================================================================

/// Borrowed, externally tagged mirror used for binary serialization.
#[derive(Serialize)]
enum TaggedRef<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Text(&'a str),
    List(&'a [MetaValue]),
    Map(&'a BTreeMap<String, MetaValue>),
}

/// Owned, externally tagged mirror used for binary deserialization.
#[derive(Deserialize)]
enum Tagged {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<MetaValue>),
    Map(BTreeMap<String, MetaValue>),
}

impl Serialize for MetaValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            return match self {
                Self::Null => serializer.serialize_unit(),
                Self::Bool(b) => serializer.serialize_bool(*b),
                Self::Int(n) => serializer.serialize_i64(*n),
                Self::Text(s) => serializer.serialize_str(s),
                Self::List(items) => items.serialize(serializer),
                Self::Map(map) => map.serialize(serializer),
            };
        }

        let tagged = match self {
            Self::Null => TaggedRef::Null,
            Self::Bool(b) => TaggedRef::Bool(*b),
            Self::Int(n) => TaggedRef::Int(*n),
            Self::Text(s) => TaggedRef::Text(s),
            Self::List(items) => TaggedRef::List(items),
            Self::Map(map) => TaggedRef::Map(map),
        };
        tagged.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MetaValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            return deserializer.deserialize_any(PlainVisitor);
        }

        Ok(match Tagged::deserialize(deserializer)? {
            Tagged::Null => Self::Null,
            Tagged::Bool(b) => Self::Bool(b),
            Tagged::Int(n) => Self::Int(n),
            Tagged::Text(s) => Self::Text(s),
            Tagged::List(items) => Self::List(items),
            Tagged::Map(map) => Self::Map(map),
        })
    }
}

struct PlainVisitor;

impl<'de> Visitor<'de> for PlainVisitor {
    type Value = MetaValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a metadata value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<MetaValue, E> {
        Ok(MetaValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<MetaValue, E> {
        Ok(MetaValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<MetaValue, D::Error> {
        MetaValue::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<MetaValue, E> {
        Ok(MetaValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<MetaValue, E> {
        Ok(MetaValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<MetaValue, E> {
        Ok(i64::try_from(v)
            .map(MetaValue::Int)
            .unwrap_or_else(|_| MetaValue::Text(v.to_string())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<MetaValue, E> {
        Ok(MetaValue::Text(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<MetaValue, E> {
        Ok(MetaValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<MetaValue, E> {
        Ok(MetaValue::Text(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<MetaValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(MetaValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<MetaValue, A::Error> {
        let mut map = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<String, MetaValue>()? {
            map.insert(key, value);
        }
        Ok(MetaValue::Map(map))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_list_builds_list_of_text() {
        let value = MetaValue::text_list(["snmp", "arp"]);
        let items = value.as_list().expect("list");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_text(), Some("snmp"));
        assert_eq!(items[1].as_text(), Some("arp"));
    }

    #[test]
    fn accessors_reject_other_variants() {
        assert_eq!(MetaValue::Int(3).as_text(), None);
        assert_eq!(MetaValue::from("x").as_int(), None);
        assert!(MetaValue::Bool(true).as_list().is_none());
    }

    #[test]
    fn binary_encoding_keeps_variants() {
        let mut nested = BTreeMap::new();
        nested.insert("slot".to_string(), MetaValue::Int(4));
        let value = MetaValue::List(vec![
            MetaValue::Null,
            MetaValue::Bool(false),
            MetaValue::from("S7-1500"),
            MetaValue::Map(nested),
        ]);

        let bytes = postcard::to_stdvec(&value).expect("encode");
        let decoded: MetaValue = postcard::from_bytes(&bytes).expect("decode");
        assert_eq!(decoded, value);
    }
}
