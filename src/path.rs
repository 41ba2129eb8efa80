//! Dot-path addressing for JSON documents.
//!
//! Every field in a content document is addressed by a dot-delimited path
//! (`"testimonials.0.quote"`). Paths are parsed once into a [`DotPath`] and
//! then used for reads, writes, and removals against a `serde_json::Value`.
//! Writes create missing intermediate containers; a type mismatch along the
//! way is a [`PathError`], never a silent overwrite.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

/// One hop in a dot-path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => write!(f, "{}", k),
            Segment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// A parsed, validated field path within a document.
///
/// Numeric segments address array elements; everything else addresses object
/// keys. The empty path and empty segments (`"a..b"`) are rejected at parse
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DotPath {
    segments: Vec<Segment>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("empty segment in path '{0}'")]
    EmptySegment(String),
    #[error("index {index} out of bounds (len {len}) at '{path}'")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },
    #[error("segment '{segment}' of '{path}' is not a container")]
    NotAContainer { path: String, segment: String },
}

impl DotPath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        let mut segments = Vec::new();
        for part in raw.split('.') {
            if part.is_empty() {
                return Err(PathError::EmptySegment(raw.to_string()));
            }
            match part.parse::<usize>() {
                Ok(i) => segments.push(Segment::Index(i)),
                Err(_) => segments.push(Segment::Key(part.to_string())),
            }
        }
        Ok(Self { segments })
    }

    pub fn from_segments(segments: Vec<Segment>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Append a segment, yielding a longer path.
    pub fn join(&self, segment: Segment) -> DotPath {
        let mut segments = self.segments.clone();
        segments.push(segment);
        DotPath { segments }
    }

    /// The segments following `prefix`, if this path starts with it.
    pub fn strip_prefix(&self, prefix: &DotPath) -> Option<&[Segment]> {
        if self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
        {
            Some(&self.segments[prefix.segments.len()..])
        } else {
            None
        }
    }
}

impl fmt::Display for DotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

impl FromStr for DotPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DotPath::parse(s)
    }
}

/// Read the value at `path`, if present.
pub fn get_path<'a>(value: &'a Value, path: &DotPath) -> Option<&'a Value> {
    let mut current = value;
    for seg in path.segments() {
        current = match (current, seg) {
            (Value::Object(map), Segment::Key(k)) => map.get(k)?,
            (Value::Array(arr), Segment::Index(i)) => arr.get(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Mutable access to the value at `path`, if present.
pub fn get_path_mut<'a>(value: &'a mut Value, path: &DotPath) -> Option<&'a mut Value> {
    let mut current = value;
    for seg in path.segments() {
        current = match (current, seg) {
            (Value::Object(map), Segment::Key(k)) => map.get_mut(k)?,
            (Value::Array(arr), Segment::Index(i)) => arr.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

/// A fresh container matching the kind of segment that will index into it.
fn fresh_container(seg: &Segment) -> Value {
    match seg {
        Segment::Key(_) => Value::Object(serde_json::Map::new()),
        Segment::Index(_) => Value::Array(Vec::new()),
    }
}

/// Set the value at `path`, creating missing intermediate containers.
///
/// A key segment creates an object; an index segment may address `len`
/// exactly to append, anything past that is [`PathError::IndexOutOfBounds`].
/// An intermediate scalar fails with [`PathError::NotAContainer`] (a `null`
/// is treated as missing and replaced by a fresh container).
pub fn set_path(value: &mut Value, path: &DotPath, new_value: Value) -> Result<(), PathError> {
    let segments = path.segments();
    let mut current = value;

    for (depth, seg) in segments.iter().enumerate() {
        let is_last = depth == segments.len() - 1;

        if current.is_null() {
            *current = fresh_container(seg);
        }

        match (seg, current) {
            (Segment::Key(k), Value::Object(map)) => {
                if is_last {
                    map.insert(k.clone(), new_value);
                    return Ok(());
                }
                let next_seg = &segments[depth + 1];
                current = map
                    .entry(k.clone())
                    .or_insert_with(|| fresh_container(next_seg));
            }
            (Segment::Index(i), Value::Array(arr)) => {
                if *i > arr.len() {
                    return Err(PathError::IndexOutOfBounds {
                        path: path.to_string(),
                        index: *i,
                        len: arr.len(),
                    });
                }
                if is_last {
                    if *i == arr.len() {
                        arr.push(new_value);
                    } else {
                        arr[*i] = new_value;
                    }
                    return Ok(());
                }
                if *i == arr.len() {
                    let next_seg = &segments[depth + 1];
                    arr.push(fresh_container(next_seg));
                }
                current = &mut arr[*i];
            }
            (seg, _) => {
                return Err(PathError::NotAContainer {
                    path: path.to_string(),
                    segment: seg.to_string(),
                });
            }
        }
    }

    unreachable!("DotPath is never empty")
}

/// Remove and return the value at `path`. Returns `None` if the path does
/// not resolve; removal of an absent field is a no-op.
pub fn remove_path(value: &mut Value, path: &DotPath) -> Option<Value> {
    let segments = path.segments();
    let (last, parents) = segments.split_last()?;

    let mut current = value;
    for seg in parents {
        current = match (current, seg) {
            (Value::Object(map), Segment::Key(k)) => map.get_mut(k)?,
            (Value::Array(arr), Segment::Index(i)) => arr.get_mut(*i)?,
            _ => return None,
        };
    }

    match (current, last) {
        (Value::Object(map), Segment::Key(k)) => map.remove(k),
        (Value::Array(arr), Segment::Index(i)) => {
            if *i < arr.len() {
                Some(arr.remove(*i))
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_and_display_round_trip() {
        let path = DotPath::parse("items.2.label").unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("items".into()),
                Segment::Index(2),
                Segment::Key("label".into())
            ]
        );
        assert_eq!(path.to_string(), "items.2.label");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(DotPath::parse(""), Err(PathError::Empty));
        assert!(matches!(
            DotPath::parse("a..b"),
            Err(PathError::EmptySegment(_))
        ));
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut doc = json!({});
        let path = DotPath::parse("a.b.c").unwrap();
        set_path(&mut doc, &path, json!(42)).unwrap();
        assert_eq!(doc, json!({"a": {"b": {"c": 42}}}));
        assert_eq!(get_path(&doc, &path), Some(&json!(42)));
    }

    #[test]
    fn test_set_leaves_siblings_untouched() {
        let mut doc = json!({"a": {"x": 1, "b": {"y": 2}}});
        set_path(&mut doc, &DotPath::parse("a.b.c").unwrap(), json!(3)).unwrap();
        assert_eq!(doc, json!({"a": {"x": 1, "b": {"y": 2, "c": 3}}}));
    }

    #[test]
    fn test_set_array_element_and_append() {
        let mut doc = json!({"items": [{"n": 1}, {"n": 2}]});
        set_path(&mut doc, &DotPath::parse("items.1.n").unwrap(), json!(20)).unwrap();
        assert_eq!(doc["items"][1]["n"], 20);

        // index == len appends
        set_path(&mut doc, &DotPath::parse("items.2").unwrap(), json!({"n": 3})).unwrap();
        assert_eq!(doc["items"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_set_index_past_end_fails() {
        let mut doc = json!({"items": [1]});
        let err = set_path(&mut doc, &DotPath::parse("items.5").unwrap(), json!(0)).unwrap_err();
        assert!(matches!(
            err,
            PathError::IndexOutOfBounds {
                index: 5,
                len: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let mut doc = json!({"title": "hello"});
        let err =
            set_path(&mut doc, &DotPath::parse("title.inner").unwrap(), json!(1)).unwrap_err();
        assert!(matches!(err, PathError::NotAContainer { .. }));
        // original scalar untouched
        assert_eq!(doc["title"], "hello");
    }

    #[test]
    fn test_set_replaces_null_intermediate() {
        let mut doc = json!({"theme": null});
        set_path(&mut doc, &DotPath::parse("theme.color").unwrap(), json!("#fff")).unwrap();
        assert_eq!(doc, json!({"theme": {"color": "#fff"}}));
    }

    #[test]
    fn test_remove_path() {
        let mut doc = json!({"items": [1, 2, 3], "title": "t"});
        let removed = remove_path(&mut doc, &DotPath::parse("items.1").unwrap());
        assert_eq!(removed, Some(json!(2)));
        assert_eq!(doc["items"], json!([1, 3]));

        assert_eq!(
            remove_path(&mut doc, &DotPath::parse("missing.path").unwrap()),
            None
        );
    }

    #[test]
    fn test_strip_prefix() {
        let full = DotPath::parse("testimonials.2.image").unwrap();
        let list = DotPath::parse("testimonials").unwrap();
        assert_eq!(
            full.strip_prefix(&list),
            Some(&[Segment::Index(2), Segment::Key("image".into())][..])
        );
        assert_eq!(full.strip_prefix(&DotPath::parse("footer").unwrap()), None);
    }
}
