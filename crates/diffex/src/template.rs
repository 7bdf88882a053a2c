//! Template extraction.
//!
//! The template is diffed against the rendered input. Deleted spans that
//! hold a placeholder name the value, and the inserted text that replaces
//! them is the value.

use diffex_core::diff::{self, DiffOpType, Diffs};
use diffex_core::{cleanup, Config};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Placeholder delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub open: String,
    pub close: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            open: "{{".to_string(),
            close: "}}".to_string(),
        }
    }
}

/// Engine settings used for extraction. No deadline, so results do not
/// depend on machine speed.
fn engine_config() -> Config {
    Config {
        diff_timeout: 0.0,
        diff_edit_cost: 4,
        ..Config::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Removed(String),
    Added(String),
    Common(String),
}

impl Item {
    fn text(&self) -> &str {
        match self {
            Item::Removed(text) | Item::Added(text) | Item::Common(text) => text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    options: Options,
    pattern: Regex,
}

impl Template {
    pub fn new(source: impl Into<String>, options: Options) -> Result<Self> {
        if options.open.is_empty() {
            return Err(Error::InvalidDelimiter("opening delimiter is empty".into()));
        }
        if options.close.is_empty() {
            return Err(Error::InvalidDelimiter("closing delimiter is empty".into()));
        }
        let pattern = Regex::new(&format!(
            r"{}(\S+){}",
            regex::escape(&options.open),
            regex::escape(&options.close)
        ))?;
        Ok(Self {
            source: source.into(),
            options,
            pattern,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Extract placeholder values from `input`. Placeholders whose value is
    /// blank are left out; a placeholder that appears more than once keeps
    /// its first non-blank value.
    pub fn parse(&self, input: &str) -> IndexMap<String, String> {
        let cfg = engine_config();
        let mut diffs = diff::main(&self.source, input, &cfg);
        cleanup::efficiency(&mut diffs, &cfg);
        let items = fold(diffs, &self.options);
        let values = walk(&items, &self.pattern);
        tracing::debug!(found = values.len(), "template parsed");
        values
    }

    /// Placeholder names in the order they appear, repeats included.
    pub fn placeholders(&self) -> Vec<String> {
        self.pattern
            .captures_iter(&self.source)
            .filter_map(|caps| caps.get(1))
            .map(|name| name.as_str().to_string())
            .collect()
    }
}

/// Parse with the default delimiters. An absent template or input yields an
/// empty map.
pub fn parse_opt(template: Option<&str>, input: Option<&str>) -> IndexMap<String, String> {
    let (Some(template), Some(input)) = (template, input) else {
        return IndexMap::new();
    };
    match Template::new(template, Options::default()) {
        Ok(template) => template.parse(input),
        Err(_) => IndexMap::new(),
    }
}

/// Collapse the script into removed/added/common items. A deletion that opens
/// a placeholder without closing it starts a collection: following common
/// text joins both sides, insertions join the added side, and the deletion
/// that closes the placeholder ends it.
fn fold(diffs: Diffs, options: &Options) -> Vec<Item> {
    let mut items = Vec::with_capacity(diffs.len());
    let mut collecting: Option<(String, String)> = None;
    for (op, text) in diffs {
        match op {
            DiffOpType::Del => {
                let trimmed = text.trim();
                let opens = trimmed.starts_with(&options.open);
                let closes = trimmed.ends_with(&options.close);
                if opens && closes {
                    items.push(Item::Removed(text));
                } else if opens {
                    collecting = Some((text, String::new()));
                } else if closes {
                    let (mut removed, added) = collecting.take().unwrap_or_default();
                    removed.push_str(&text);
                    items.push(Item::Removed(removed));
                    items.push(Item::Added(added));
                } else {
                    items.push(Item::Removed(text));
                }
            }
            DiffOpType::Eql => match collecting.as_mut() {
                Some((removed, added)) => {
                    removed.push_str(&text);
                    added.push_str(&text);
                }
                None => items.push(Item::Common(text)),
            },
            DiffOpType::Ins => match collecting.as_mut() {
                Some((_, added)) => added.push_str(&text),
                None => items.push(Item::Added(text)),
            },
        }
    }
    items
}

fn walk(items: &[Item], pattern: &Regex) -> IndexMap<String, String> {
    let mut values = IndexMap::new();
    let mut key: Option<String> = None;
    let mut val: Option<String> = None;
    let mut running = String::new();
    let mut take_running = false;

    for item in items {
        running.push_str(item.text());
        match item {
            Item::Removed(text) => {
                if let Some(name) = pattern.captures(text).and_then(|caps| caps.get(1)) {
                    key = Some(name.as_str().trim().to_string());
                    running.clear();
                    take_running = true;
                }
            }
            Item::Added(text) => {
                val = Some(if take_running {
                    running.clone()
                } else {
                    text.clone()
                });
                take_running = true;
            }
            Item::Common(_) => {}
        }

        match (key.take(), val.take()) {
            (Some(k), Some(v)) if !k.is_empty() && !v.is_empty() => {
                let v = v.trim();
                if !v.is_empty() && !values.contains_key(&k) {
                    tracing::trace!(placeholder = %k, "value captured");
                    values.insert(k, v.to_string());
                }
            }
            (k, v) => {
                key = k;
                val = v;
            }
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use DiffOpType::{Del, Eql, Ins};

    fn d(op: DiffOpType, s: &str) -> (DiffOpType, String) {
        (op, s.to_string())
    }

    fn default_pattern() -> Regex {
        Template::new("", Options::default()).unwrap().pattern
    }

    #[test]
    fn options_default_to_double_braces() {
        let options = Options::default();
        assert_eq!(options.open, "{{");
        assert_eq!(options.close, "}}");

        let parsed: Options = serde_json::from_str(r#"{"open":"<%"}"#).unwrap();
        assert_eq!(parsed.open, "<%");
        assert_eq!(parsed.close, "}}");
    }

    #[test]
    fn empty_delimiters_are_rejected() {
        let options = Options {
            open: String::new(),
            close: "}}".into(),
        };
        assert!(matches!(
            Template::new("x", options),
            Err(Error::InvalidDelimiter(_))
        ));
        let options = Options {
            open: "{{".into(),
            close: String::new(),
        };
        assert!(matches!(
            Template::new("x", options),
            Err(Error::InvalidDelimiter(_))
        ));
    }

    #[test]
    fn delimiters_are_matched_literally() {
        let options = Options {
            open: "[[".into(),
            close: "]]".into(),
        };
        let template = Template::new("a [[x]] b [[y.z]] c {{w}}", options).unwrap();
        assert_eq!(template.placeholders(), vec!["x", "y.z"]);
    }

    #[test]
    fn fold_keeps_plain_items() {
        let items = fold(
            vec![d(Eql, "Hi "), d(Del, "{{name}}"), d(Ins, "Bob"), d(Del, "!")],
            &Options::default(),
        );
        assert_eq!(
            items,
            vec![
                Item::Common("Hi ".into()),
                Item::Removed("{{name}}".into()),
                Item::Added("Bob".into()),
                Item::Removed("!".into()),
            ]
        );
    }

    #[test]
    fn fold_collects_across_split_placeholder() {
        let items = fold(
            vec![
                d(Eql, "at "),
                d(Del, "{{n"),
                d(Ins, "J"),
                d(Eql, "a"),
                d(Ins, "ne Doe"),
                d(Del, "me}}"),
                d(Eql, " end"),
            ],
            &Options::default(),
        );
        assert_eq!(
            items,
            vec![
                Item::Common("at ".into()),
                Item::Removed("{{name}}".into()),
                Item::Added("Jane Doe".into()),
                Item::Common(" end".into()),
            ]
        );
        let values = walk(&items, &default_pattern());
        assert_eq!(values.get("name").map(String::as_str), Some("Jane Doe"));
    }

    #[test]
    fn walk_keeps_first_non_blank_value() {
        let items = vec![
            Item::Removed("{{a}}".into()),
            Item::Added("  ".into()),
            Item::Common(" and ".into()),
            Item::Removed("{{a}}".into()),
            Item::Added("two".into()),
            Item::Removed("{{a}}".into()),
            Item::Added("three".into()),
        ];
        let values = walk(&items, &default_pattern());
        assert_eq!(values.len(), 1);
        assert_eq!(values["a"], "two");
    }

    #[test]
    fn walk_ignores_additions_without_a_placeholder() {
        let items = vec![
            Item::Common("Hi ".into()),
            Item::Added("there".into()),
            Item::Removed("{{full name}}".into()),
        ];
        assert!(walk(&items, &default_pattern()).is_empty());
    }
}
