//! `$[name|default]` placeholders in task settings.
//!
//! Placeholders are replaced with the value of the named build parameter,
//! falling back to the default (or an empty string). A literal pipe inside a
//! name or default is written `\|`.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::domain::ParameterList;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\[[^\]]*\]").expect("placeholder pattern compiles"))
}

/// Split on pipes not preceded by a backslash, unescaping `\|`.
fn split_parts(body: &str) -> Vec<String> {
    let mut parts = vec![String::new()];
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                chars.next();
                if let Some(last) = parts.last_mut() {
                    last.push('|');
                }
            }
            '|' => parts.push(String::new()),
            other => {
                if let Some(last) = parts.last_mut() {
                    last.push(other);
                }
            }
        }
    }
    parts
}

/// A single parsed placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicValue {
    pub name: String,
    pub default: Option<String>,
}

impl DynamicValue {
    fn from_match(text: &str) -> Self {
        let body = &text[2..text.len() - 1];
        let mut parts = split_parts(body).into_iter();
        Self {
            name: parts.next().unwrap_or_default(),
            default: parts.next(),
        }
    }

    pub fn value<'a>(&'a self, parameters: &'a ParameterList) -> &'a str {
        parameters
            .get(&self.name)
            .or(self.default.as_deref())
            .unwrap_or_default()
    }
}

/// Placeholders in `text`, in order of appearance.
pub fn find_dynamic_values(text: &str) -> Vec<DynamicValue> {
    placeholder_regex()
        .find_iter(text)
        .map(|m| DynamicValue::from_match(m.as_str()))
        .collect()
}

pub fn has_dynamic_values(text: &str) -> bool {
    placeholder_regex().is_match(text)
}

/// Replace every placeholder in `text`.
pub fn apply_dynamic_values(text: &str, parameters: &ParameterList) -> String {
    placeholder_regex()
        .replace_all(text, |caps: &Captures<'_>| {
            DynamicValue::from_match(&caps[0])
                .value(parameters)
                .to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ParameterList {
        let mut p = ParameterList::new();
        p.upsert("Profile", "debug");
        p.upsert("$CCNetLabel", "42");
        p.upsert("a|b", "piped");
        p
    }

    #[test]
    fn test_substitutes_known_parameter() {
        assert_eq!(
            apply_dynamic_values("--profile=$[Profile|release]", &params()),
            "--profile=debug"
        );
        assert_eq!(
            apply_dynamic_values("v$[$CCNetLabel]", &params()),
            "v42"
        );
    }

    #[test]
    fn test_falls_back_to_default_then_empty() {
        assert_eq!(
            apply_dynamic_values("$[Target|x86_64]-$[Missing]", &params()),
            "x86_64-"
        );
    }

    #[test]
    fn test_escaped_pipe() {
        let found = find_dynamic_values(r"$[a\|b|c\|d]");
        assert_eq!(
            found,
            vec![DynamicValue {
                name: "a|b".into(),
                default: Some("c|d".into())
            }]
        );
        assert_eq!(apply_dynamic_values(r"$[a\|b]", &params()), "piped");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert!(!has_dynamic_values("cargo build $HOME [x]"));
        assert_eq!(
            apply_dynamic_values("cargo build $HOME [x]", &params()),
            "cargo build $HOME [x]"
        );
    }
}
