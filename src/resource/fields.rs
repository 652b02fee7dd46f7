//! Field path resolution
//!
//! Each resource kind registers a [`FieldTable`]: a flat map from a
//! recognised dotted path (`Placement.AvailabilityZone`,
//! `NetworkInterfaces.Association.PublicIp`, ...) to a typed extraction
//! function. Tables are composed from per-struct child tables, so nesting
//! and list indexing are handled once here instead of by every kind.
//!
//! Path rules:
//! - segments are separated by `.`; purely numeric segments are list indices
//! - an index may only follow a list segment; a list segment without an
//!   index addresses its first element
//! - an unset optional (or an out-of-range index) anywhere along the path
//!   resolves to the empty string
//! - a path the table does not know is an error, even when the part of the
//!   resource it would address is absent

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use thiserror::Error;

/// Why a field path could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("field path is empty")]
    EmptyPath,
    #[error("field path `{path}` contains an empty segment")]
    EmptySegment { path: String },
    #[error("unknown field `{path}`")]
    UnknownField { path: String },
    #[error("field `{path}` is a structure or list, not a value")]
    NotScalar { path: String },
    #[error("index {index} in `{path}` does not follow a list")]
    UnexpectedIndex { path: String, index: usize },
    #[error("resource has not been described")]
    NotDescribed,
}

/// Terminal value produced by an extraction function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attr {
    Value(String),
    Unset,
}

impl Attr {
    /// Text field; passes through unchanged
    pub fn text(value: &Option<String>) -> Self {
        match value {
            Some(v) => Attr::Value(v.clone()),
            None => Attr::Unset,
        }
    }

    /// Number or boolean field, rendered with `Display`
    pub fn display<D: Display>(value: Option<D>) -> Self {
        match value {
            Some(v) => Attr::Value(v.to_string()),
            None => Attr::Unset,
        }
    }

    /// Textual form; unset is the empty string
    pub fn into_string(self) -> String {
        match self {
            Attr::Value(v) => v,
            Attr::Unset => String::new(),
        }
    }
}

/// One parsed path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
}

/// A parsed field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self, ResolveError> {
        if path.trim().is_empty() {
            return Err(ResolveError::EmptyPath);
        }

        let mut segments = Vec::new();
        for part in path.split('.') {
            if part.is_empty() {
                return Err(ResolveError::EmptySegment {
                    path: path.to_string(),
                });
            }

            if part.bytes().all(|b| b.is_ascii_digit()) {
                let index = part.parse().map_err(|_| ResolveError::UnknownField {
                    path: path.to_string(),
                })?;
                segments.push(Segment::Index(index));
            } else {
                segments.push(Segment::Field(part.to_string()));
            }
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Table key: the named segments joined with `.`
    fn key(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Field(name) => Some(name.as_str()),
                Segment::Index(_) => None,
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

type Extract<T> = Box<dyn Fn(&T, &[usize]) -> Attr + Send + Sync>;

struct Accessor<T> {
    /// For each list along the path, the number of named segments up to and
    /// including the list segment
    list_slots: Vec<usize>,
    extract: Extract<T>,
}

impl<T> Accessor<T> {
    /// Map the indices written in `path` onto this accessor's lists,
    /// defaulting unwritten ones to the first element
    fn place_indices(&self, path: &FieldPath) -> Result<Vec<usize>, ResolveError> {
        let mut indices = vec![0; self.list_slots.len()];
        let mut next_slot = 0;
        let mut named = 0;

        for segment in path.segments() {
            match segment {
                Segment::Field(_) => named += 1,
                Segment::Index(index) => {
                    let slot = self.list_slots[next_slot..]
                        .iter()
                        .position(|&s| s == named)
                        .map(|offset| next_slot + offset);

                    match slot {
                        Some(slot) => {
                            indices[slot] = *index;
                            next_slot = slot + 1;
                        }
                        None => {
                            return Err(ResolveError::UnexpectedIndex {
                                path: path.as_str().to_string(),
                                index: *index,
                            })
                        }
                    }
                }
            }
        }

        Ok(indices)
    }
}

/// Accessor table for one description type
pub struct FieldTable<T> {
    entries: HashMap<String, Accessor<T>>,
    containers: HashSet<String>,
}

impl<T: 'static> Default for FieldTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> FieldTable<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            containers: HashSet::new(),
        }
    }

    /// Register a scalar field
    pub fn scalar(mut self, name: &str, get: fn(&T) -> Attr) -> Self {
        self.entries.insert(
            name.to_string(),
            Accessor {
                list_slots: Vec::new(),
                extract: Box::new(move |value: &T, _: &[usize]| get(value)),
            },
        );
        self
    }

    /// Register an optional nested structure described by `child`
    pub fn nested<U: 'static>(
        mut self,
        name: &str,
        get: fn(&T) -> Option<&U>,
        child: FieldTable<U>,
    ) -> Self {
        self.adopt_containers(name, &child);

        for (path, accessor) in child.entries {
            let inner = accessor.extract;
            self.entries.insert(
                format!("{}.{}", name, path),
                Accessor {
                    list_slots: accessor.list_slots.iter().map(|s| s + 1).collect(),
                    extract: Box::new(move |value: &T, indices: &[usize]| match get(value) {
                        Some(nested) => inner(nested, indices),
                        None => Attr::Unset,
                    }),
                },
            );
        }
        self
    }

    /// Register an optional list whose elements are described by `child`
    pub fn list<U: 'static>(
        mut self,
        name: &str,
        get: fn(&T) -> Option<&[U]>,
        child: FieldTable<U>,
    ) -> Self {
        self.adopt_containers(name, &child);

        for (path, accessor) in child.entries {
            let inner = accessor.extract;
            let mut list_slots = vec![1];
            list_slots.extend(accessor.list_slots.iter().map(|s| s + 1));

            self.entries.insert(
                format!("{}.{}", name, path),
                Accessor {
                    list_slots,
                    extract: Box::new(move |value: &T, indices: &[usize]| {
                        let (index, rest) = match indices.split_first() {
                            Some((index, rest)) => (*index, rest),
                            None => (0, indices),
                        };
                        match get(value).and_then(|items| items.get(index)) {
                            Some(item) => inner(item, rest),
                            None => Attr::Unset,
                        }
                    }),
                },
            );
        }
        self
    }

    fn adopt_containers<U>(&mut self, name: &str, child: &FieldTable<U>) {
        self.containers.insert(name.to_string());
        for container in &child.containers {
            self.containers.insert(format!("{}.{}", name, container));
        }
    }

    /// Resolve `path` against `value` to its textual form
    pub fn resolve(&self, value: &T, path: &str) -> Result<String, ResolveError> {
        let parsed = FieldPath::parse(path)?;

        if let Some(Segment::Index(index)) = parsed.segments().first() {
            return Err(ResolveError::UnexpectedIndex {
                path: path.to_string(),
                index: *index,
            });
        }

        let key = parsed.key();
        let Some(accessor) = self.entries.get(&key) else {
            if self.containers.contains(&key) {
                return Err(ResolveError::NotScalar {
                    path: path.to_string(),
                });
            }
            return Err(ResolveError::UnknownField {
                path: path.to_string(),
            });
        };

        let indices = accessor.place_indices(&parsed)?;
        let resolved = (accessor.extract)(value, &indices).into_string();

        tracing::trace!("resolved {} -> {:?}", path, resolved);
        Ok(resolved)
    }

    /// Check whether `path` names a scalar field
    pub fn contains(&self, path: &str) -> bool {
        FieldPath::parse(path)
            .map(|p| self.entries.contains_key(&p.key()))
            .unwrap_or(false)
    }

    /// All recognised scalar paths, sorted
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.entries.keys().map(|k| k.as_str()).collect();
        paths.sort_unstable();
        paths
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
