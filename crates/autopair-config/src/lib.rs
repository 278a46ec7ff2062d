#![warn(missing_docs)]
//! `autopair-config` - declarative YAML rule definitions for `autopair-core`.
//!
//! Rule files map a trigger key to one or more definitions. A definition is
//! either a bare closing delimiter, a two-element `[opening, closing]`
//! sequence, or a mapping with the full structured surface:
//!
//! ```yaml
//! "(": ")"
//! "[": "]"
//! "'":
//!   - close: "'"
//!     when:
//!       not-before: '\w$'
//!     actions:
//!       enter: false
//! '"':
//!   - close: '"'
//!   - open: 'r#"'
//!     close: '"#'
//!     languages: [rust]
//! "%":
//!   - ["{%", "%}"]
//! ```
//!
//! Declaration order is preserved — it is the tie-break between rules of
//! equal priority. Host-injected closure predicates cannot be expressed in
//! data; load the definitions, splice programmatic [`PairSpec`]s into the
//! list, then compile:
//!
//! ```rust
//! use autopair_config::load_from_str;
//!
//! let pairs = load_from_str(r#"
//! "(": ")"
//! "'":
//!   - close: "'"
//!     actions:
//!       enter: false
//! "#)
//! .unwrap();
//!
//! assert_eq!(pairs.len(), 2);
//! assert!(pairs.trigger_keys().contains(&'('));
//! ```

use std::path::Path;

use autopair_core::{ActionOverrides, PairSet, PairSpec, Predicate};
use serde::Deserialize;
use thiserror::Error;

/// Errors produced while loading rule definitions.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Filesystem I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A mapping key is not a single-character string.
    #[error("trigger key {0:?} must be a single character")]
    BadTriggerKey(String),

    /// A sequence definition does not list opening and closing.
    #[error("definition under key '{key}' must list opening and closing, got {len} entries")]
    BadDelimiterList {
        /// Trigger key the definition was declared under.
        key: char,
        /// Number of entries the sequence actually had.
        len: usize,
    },

    /// The definitions were well-formed data but failed rule compilation.
    #[error(transparent)]
    Compile(#[from] autopair_core::CompileError),
}

/// One definition value under a trigger key.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDef {
    /// Bare closing delimiter.
    Shorthand(String),
    /// `[opening, closing]`.
    Ends(Vec<String>),
    /// Full structured form.
    Full(RawSpec),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawSpec {
    open: Option<String>,
    close: String,
    priority: Option<i32>,
    languages: Option<Vec<String>>,
    #[serde(default = "default_true")]
    command_mode: bool,
    when: Option<RawGuard>,
    actions: Option<RawActions>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawGuard {
    span_in: Option<Vec<String>>,
    span_not_in: Option<Vec<String>>,
    not_before: Option<String>,
    not_after: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawActions {
    open: Option<bool>,
    close: Option<bool>,
    open_or_close: Option<bool>,
    enter: Option<bool>,
    backspace: Option<bool>,
    space: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(RawDef),
    Many(Vec<RawDef>),
}

fn default_true() -> bool {
    true
}

/// Parse a YAML document into raw `(trigger key, definition)` entries, in
/// declaration order.
pub fn definitions_from_str(yaml: &str) -> Result<Vec<(char, PairSpec)>, ConfigError> {
    let mapping: serde_yaml::Mapping = serde_yaml::from_str(yaml)?;
    let mut definitions = Vec::new();

    for (key, value) in mapping {
        let key = trigger_key(&key)?;
        let defs = match serde_yaml::from_value::<OneOrMany>(value)? {
            OneOrMany::One(def) => vec![def],
            OneOrMany::Many(defs) => defs,
        };
        for def in defs {
            definitions.push((key, pair_spec(key, def)?));
        }
    }

    Ok(definitions)
}

/// Load and compile a rule file from a YAML string.
pub fn load_from_str(yaml: &str) -> Result<PairSet, ConfigError> {
    let definitions = definitions_from_str(yaml)?;
    Ok(PairSet::compile(definitions)?)
}

/// Load and compile a rule file from a filesystem path.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<PairSet, ConfigError> {
    let yaml = std::fs::read_to_string(path)?;
    load_from_str(&yaml)
}

fn trigger_key(key: &serde_yaml::Value) -> Result<char, ConfigError> {
    let text = key
        .as_str()
        .ok_or_else(|| ConfigError::BadTriggerKey(format!("{key:?}")))?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(ConfigError::BadTriggerKey(text.to_string())),
    }
}

fn pair_spec(key: char, def: RawDef) -> Result<PairSpec, ConfigError> {
    match def {
        RawDef::Shorthand(closing) => Ok(PairSpec::new(closing)),
        RawDef::Ends(mut ends) => match ends.len() {
            1 => Ok(PairSpec::new(ends.remove(0))),
            2 => {
                let closing = ends.remove(1);
                let opening = ends.remove(0);
                Ok(PairSpec::new(closing).with_opening(opening))
            }
            len => Err(ConfigError::BadDelimiterList { key, len }),
        },
        RawDef::Full(raw) => {
            let mut spec = PairSpec::new(raw.close);
            spec.opening = raw.open;
            spec.priority = raw.priority;
            spec.languages = raw.languages;
            spec.command_mode = raw.command_mode;
            if let Some(guard) = raw.when {
                spec.when = guard_predicate(guard)?;
            }
            if let Some(actions) = raw.actions {
                spec.actions = action_overrides(actions);
            }
            Ok(spec)
        }
    }
}

fn guard_predicate(guard: RawGuard) -> Result<Option<Predicate>, ConfigError> {
    let mut parts = Vec::new();
    if let Some(kinds) = guard.span_in {
        parts.push(Predicate::SpanIn(kinds));
    }
    if let Some(kinds) = guard.span_not_in {
        parts.push(Predicate::SpanNotIn(kinds));
    }
    if let Some(pattern) = guard.not_before {
        parts.push(Predicate::not_before(&pattern)?);
    }
    if let Some(pattern) = guard.not_after {
        parts.push(Predicate::not_after(&pattern)?);
    }

    // An empty guard carries no condition and must not earn the
    // conditional-rule priority bonus.
    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Predicate::all(parts)))
    }
}

fn action_overrides(actions: RawActions) -> ActionOverrides {
    ActionOverrides {
        open: actions.open.map(Into::into),
        close: actions.close.map(Into::into),
        open_or_close: actions.open_or_close.map(Into::into),
        enter: actions.enter.map(Into::into),
        backspace: actions.backspace.map(Into::into),
        space: actions.space.map(Into::into),
    }
}
