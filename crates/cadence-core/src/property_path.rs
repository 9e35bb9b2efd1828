//! Dotted property paths into configuration trees.
//!
//! `tasks[0].executable` and `tasks[name=build].timeout_secs` are parsed into
//! a list of [`PathSegment`]s and resolved against any [`ConfigNode`].

use std::fmt;

use crate::domain::{CoreError, Result};

/// Value found at the end of a path.
pub type ConfigValue = serde_json::Value;

/// A configuration object whose fields can be looked up by name.
pub trait ConfigNode {
    fn field(&self, name: &str) -> Option<ConfigValue>;
}

impl ConfigNode for serde_json::Value {
    fn field(&self, name: &str) -> Option<ConfigValue> {
        self.get(name).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Named member of an object.
    Field(String),
    /// Position in a list.
    Index(usize),
    /// First list element whose `key` member equals `value`.
    Keyed { key: String, value: String },
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Index(i) => write!(f, "[{i}]"),
            PathSegment::Keyed { key, value } => write!(f, "[{key}={value}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    pub fn parse(path: &str) -> Result<Self> {
        let invalid = |reason: &str| CoreError::InvalidPropertyPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.trim().is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        for part in path.split('.') {
            let (name, selector) = match part.find('[') {
                Some(open) => {
                    let Some(inner) = part[open + 1..].strip_suffix(']') else {
                        return Err(invalid("unterminated selector"));
                    };
                    (&part[..open], Some(inner))
                }
                None => (part, None),
            };

            if name.is_empty() {
                return Err(invalid("empty segment name"));
            }
            segments.push(PathSegment::Field(name.to_string()));

            if let Some(inner) = selector {
                segments.push(parse_selector(inner).ok_or_else(|| invalid("bad selector"))?);
            }
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Walk `root` along the path.
    pub fn resolve(&self, root: &dyn ConfigNode) -> Result<ConfigValue> {
        let not_found = || CoreError::PropertyNotFound(self.to_string());

        let mut segments = self.segments.iter();
        let mut current = match segments.next() {
            Some(PathSegment::Field(name)) => root.field(name).ok_or_else(not_found)?,
            _ => return Err(not_found()),
        };

        for segment in segments {
            current = match segment {
                PathSegment::Field(name) => current.field(name),
                PathSegment::Index(i) => current.get(*i).cloned(),
                PathSegment::Keyed { key, value } => current.as_array().and_then(|items| {
                    items
                        .iter()
                        .find(|item| item.get(key).is_some_and(|v| scalar_eq(v, value)))
                        .cloned()
                }),
            }
            .ok_or_else(not_found)?;
        }
        Ok(current)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, PathSegment::Field(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

fn parse_selector(inner: &str) -> Option<PathSegment> {
    if let Some((key, value)) = inner.split_once('=') {
        if key.is_empty() {
            return None;
        }
        return Some(PathSegment::Keyed {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    inner.parse().ok().map(PathSegment::Index)
}

fn scalar_eq(found: &ConfigValue, expected: &str) -> bool {
    match found {
        ConfigValue::String(s) => s == expected,
        ConfigValue::Number(n) => n.to_string() == expected,
        ConfigValue::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}
