//! Ordered multi-value header map.
//!
//! Names are conceptually case-insensitive but the casing of the first
//! occurrence is preserved for emission. Serializes as a map of name to
//! either a single string or a list (single-value headers round-trip as
//! plain strings).

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
struct HeaderEntry {
    name: String,
    values: Vec<String>,
}

/// Ordered multimap of header name to values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMultiMap {
    entries: Vec<HeaderEntry>,
}

impl HeaderMultiMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under a name. Lookup is case-insensitive; the casing
    /// of the first occurrence wins for emission.
    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.name.eq_ignore_ascii_case(name))
        {
            entry.values.push(value.into());
        } else {
            self.entries.push(HeaderEntry {
                name: name.to_string(),
                values: vec![value.into()],
            });
        }
    }

    /// Append several values under a name.
    pub fn add_all<I, V>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        for value in values {
            self.add(name, value);
        }
    }

    /// All values for a name, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .map(|e| e.values.as_slice())
    }

    /// First value for a name, case-insensitive.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, values)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.values.as_slice()))
    }

    /// Plain-map view for predicate evaluation. With `ignore_case` the
    /// names are lowercased; entries that collide after lowering are
    /// merged in insertion order.
    pub fn lookup(&self, ignore_case: bool) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for entry in &self.entries {
            let key = if ignore_case {
                entry.name.to_lowercase()
            } else {
                entry.name.clone()
            };
            map.entry(key).or_default().extend(entry.values.clone());
        }
        map
    }
}

impl<const N: usize> From<[(&str, &str); N]> for HeaderMultiMap {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.add(name, value);
        }
        headers
    }
}

impl Serialize for HeaderMultiMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            if entry.values.len() == 1 {
                map.serialize_entry(&entry.name, &entry.values[0])?;
            } else {
                map.serialize_entry(&entry.name, &entry.values)?;
            }
        }
        map.end()
    }
}

/// A header value in configuration: a single string or a list of strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for HeaderMultiMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor;

        impl<'de> Visitor<'de> for MapVisitor {
            type Value = HeaderMultiMap;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of header name to string or list of strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut headers = HeaderMultiMap::new();
                while let Some((name, value)) = access.next_entry::<String, OneOrMany>()? {
                    match value {
                        OneOrMany::One(v) => headers.add(&name, v),
                        OneOrMany::Many(vs) => headers.add_all(&name, vs),
                    }
                }
                Ok(headers)
            }
        }

        deserializer.deserialize_map(MapVisitor)
    }
}
