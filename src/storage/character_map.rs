//! Insertion-ordered map keyed by character name
//!
//! Artifacts are JSON objects whose key order carries meaning: identifiers are assigned
//! by walking `image_urls.json` in order. `CharacterMap` keeps entries in insertion order
//! and preserves the order found in a file when deserializing.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// Ordered mapping from character name to a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterMap<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

/// Character name → detail-page URL
pub type DetailUrlMap = CharacterMap<String>;

/// Character name → image URLs, in page order
pub type ImageUrlMap = CharacterMap<Vec<String>>;

/// Character name → generated file identifiers
pub type ImageIdMap = CharacterMap<Vec<String>>;

impl<V> Default for CharacterMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> CharacterMap<V> {
    /// Creates an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous one if the name was already present
    ///
    /// A replaced entry keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        let name = name.into();
        match self.index.get(&name) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position].1, value)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.index.get(name).map(|&position| &self.entries[position].1)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

impl<T> CharacterMap<Vec<T>> {
    /// Total number of values across all entries
    pub fn total_len(&self) -> usize {
        self.entries.iter().map(|(_, values)| values.len()).sum()
    }
}

impl<V> FromIterator<(String, V)> for CharacterMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

impl<V> IntoIterator for CharacterMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V: Serialize> Serialize for CharacterMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct CharacterMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for CharacterMapVisitor<V> {
    type Value = CharacterMap<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object keyed by character name")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = CharacterMap::new();
        while let Some((name, value)) = access.next_entry::<String, V>()? {
            map.insert(name, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for CharacterMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CharacterMapVisitor(PhantomData))
    }
}
