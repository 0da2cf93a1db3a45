//! field paths: dot/bracket references into the form value tree
//!
//! `user.address.city`, `items.0.name` and `items[0].name` are all valid;
//! the last two name the same location. paths are stored in canonical
//! dotted form so they can be compared and hashed directly.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

lazy_static! {
    /// a whole path: a key, then any mix of `.key` and `[index]`
    static ref PATH_PATTERN: Regex =
        Regex::new(r"^[^.\[\]]+(?:\.[^.\[\]]+|\[\d+\])*$").expect("valid path pattern");
    /// one segment: either a bare key or a bracketed index
    static ref SEGMENT_PATTERN: Regex =
        Regex::new(r"[^.\[\]]+|\[(\d+)\]").expect("valid segment pattern");
}

/// how many null slots a write may pad an array with
pub const MAX_ARRAY_GAP: usize = 1024;

/// error returned for malformed field paths
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("field path is empty")]
    Empty,
    #[error("invalid field path '{0}': use dot or bracket notation (e.g. items.0.name, items[0].name)")]
    Invalid(String),
    #[error("index {index} in '{path}' is too far past the end of the array ({len} items)")]
    IndexOutOfRange { path: String, index: usize, len: usize },
}

/// a reference to a value location inside the form value tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    canonical: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// parse a dot/bracket path string
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        if !PATH_PATTERN.is_match(s) {
            return Err(PathError::Invalid(s.to_string()));
        }

        let segments: Vec<String> = SEGMENT_PATTERN
            .captures_iter(s)
            .map(|caps| match caps.get(1) {
                Some(index) => index.as_str().to_string(),
                None => caps[0].to_string(),
            })
            .collect();

        Ok(Self::from_segments(segments))
    }

    fn from_segments(segments: Vec<String>) -> Self {
        Self {
            canonical: segments.join("."),
            segments,
        }
    }

    /// canonical dotted form
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// this path nested under `prefix` (`sku` under `items.0` -> `items.0.sku`)
    pub fn prefixed(&self, prefix: &FieldPath) -> FieldPath {
        let segments = prefix
            .segments
            .iter()
            .chain(self.segments.iter())
            .cloned()
            .collect();
        Self::from_segments(segments)
    }

    /// append an array index
    pub fn index(&self, index: usize) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.push(index.to_string());
        Self::from_segments(segments)
    }

    /// check whether `self` is `other` or one of its ancestors
    pub fn contains(&self, other: &FieldPath) -> bool {
        self.segments.len() <= other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| a == b)
    }

    /// two paths overlap when a write to one can change the value read at the other
    pub fn overlaps(&self, other: &FieldPath) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// read the value at this path, `None` when any segment is missing
    pub fn resolve<'a>(&self, root: &'a JsonValue) -> Option<&'a JsonValue> {
        let mut current = root;
        for segment in &self.segments {
            current = match current {
                JsonValue::Object(map) => map.get(segment)?,
                JsonValue::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// write `value` at this path, creating intermediate objects and arrays
    ///
    /// a numeric segment creates an array, anything else an object. values
    /// that are in the way (e.g. a string where an object is needed) are
    /// replaced. an index may pad an array with at most `MAX_ARRAY_GAP`
    /// nulls; a write past that fails and leaves `root` untouched.
    pub fn assign(&self, root: &mut JsonValue, value: JsonValue) -> Result<(), PathError> {
        self.check_growth(root)?;

        let mut current = root;
        for (i, segment) in self.segments.iter().enumerate() {
            let is_last = i + 1 == self.segments.len();
            let index = segment.parse::<usize>().ok();

            let needs_container = match (&*current, index) {
                (JsonValue::Object(_), _) => false,
                (JsonValue::Array(_), Some(_)) => false,
                _ => true,
            };
            if needs_container {
                *current = match index {
                    Some(_) => JsonValue::Array(Vec::new()),
                    None => JsonValue::Object(serde_json::Map::new()),
                };
            }

            let next_is_index = self
                .segments
                .get(i + 1)
                .map(|s| s.parse::<usize>().is_ok())
                .unwrap_or(false);
            let placeholder = if next_is_index {
                JsonValue::Array(Vec::new())
            } else {
                JsonValue::Object(serde_json::Map::new())
            };

            current = match current {
                JsonValue::Object(map) => {
                    if is_last {
                        map.insert(segment.clone(), value);
                        return Ok(());
                    }
                    map.entry(segment.clone()).or_insert(placeholder)
                }
                JsonValue::Array(items) => {
                    let idx = index.unwrap_or_default();
                    if items.len() <= idx {
                        items.resize(idx + 1, JsonValue::Null);
                    }
                    if is_last {
                        items[idx] = value;
                        return Ok(());
                    }
                    if items[idx].is_null() {
                        items[idx] = placeholder;
                    }
                    &mut items[idx]
                }
                _ => return Ok(()),
            };
        }
        Ok(())
    }

    /// walk the tree the way `assign` would and reject any index that needs
    /// more than `MAX_ARRAY_GAP` padding
    fn check_growth(&self, root: &JsonValue) -> Result<(), PathError> {
        let mut current = Some(root);
        for segment in &self.segments {
            let index = segment.parse::<usize>().ok();
            current = match (current, index) {
                (Some(JsonValue::Object(map)), _) => map.get(segment),
                (Some(JsonValue::Array(items)), Some(idx)) => {
                    self.check_index(idx, items.len())?;
                    items.get(idx)
                }
                // anything else here is replaced by a fresh container
                (_, Some(idx)) => {
                    self.check_index(idx, 0)?;
                    None
                }
                (_, None) => None,
            };
        }
        Ok(())
    }

    fn check_index(&self, index: usize, len: usize) -> Result<(), PathError> {
        if index > len.saturating_add(MAX_ARRAY_GAP) {
            return Err(PathError::IndexOutOfRange {
                path: self.canonical.clone(),
                index,
                len,
            });
        }
        Ok(())
    }

    /// remove the value at this path, returning it
    ///
    /// array elements are replaced with null so sibling indices stay stable.
    pub fn remove(&self, root: &mut JsonValue) -> Option<JsonValue> {
        let (last, parents) = self.segments.split_last()?;
        let mut current = root;
        for segment in parents {
            current = match current {
                JsonValue::Object(map) => map.get_mut(segment)?,
                JsonValue::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        match current {
            JsonValue::Object(map) => map.remove(last),
            JsonValue::Array(items) => {
                let slot = items.get_mut(last.parse::<usize>().ok()?)?;
                Some(std::mem::replace(slot, JsonValue::Null))
            }
            _ => None,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical)
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.canonical
    }
}
