//! The closed applicability vocabulary rules are gated on.
//!
//! Everything a rule can be conditioned on — constants, editor mode,
//! language membership, span allow/deny lists, pattern guards, host-injected
//! closures — evaluates through one shape: `Predicate::eval(&Context) ->
//! bool`. Literal booleans in rule definitions compile to
//! [`Predicate::Const`], so the engine never branches on "flag or function"
//! at decision time.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::context::{Context, EditorMode};
use crate::rules::CompileError;

/// Host-injected predicate over the keystroke snapshot.
pub type CustomFn = Arc<dyn Fn(&Context<'_>) -> bool + Send + Sync>;

/// An applicability condition evaluated against a [`Context`].
#[derive(Clone)]
pub enum Predicate {
    /// A constant truth value.
    Const(bool),
    /// Holds outside command-line mode only.
    InsertOnly,
    /// The cursor scope (or document language) is one of the listed
    /// languages.
    Language(Vec<String>),
    /// The enclosing span kind is one of the listed kinds.
    SpanIn(Vec<String>),
    /// The enclosing span kind is none of the listed kinds (no span passes).
    SpanNotIn(Vec<String>),
    /// The line text before the cursor does not match the pattern. Anchor
    /// with `$` to test the characters immediately before the cursor.
    NotBefore(Regex),
    /// The line text after the cursor does not match the pattern. Anchor
    /// with `^` to test the characters immediately after the cursor.
    NotAfter(Regex),
    /// Every inner predicate holds.
    All(Vec<Predicate>),
    /// A host-injected closure.
    Custom(CustomFn),
}

impl Predicate {
    /// Evaluate against one keystroke snapshot.
    pub fn eval(&self, cx: &Context<'_>) -> bool {
        match self {
            Predicate::Const(value) => *value,
            Predicate::InsertOnly => cx.mode() != EditorMode::Command,
            Predicate::Language(languages) => cx
                .scope_or_language()
                .is_some_and(|lang| languages.iter().any(|l| l == lang)),
            Predicate::SpanIn(kinds) => cx
                .span_kind()
                .is_some_and(|kind| kinds.iter().any(|k| k == kind)),
            Predicate::SpanNotIn(kinds) => !cx
                .span_kind()
                .is_some_and(|kind| kinds.iter().any(|k| k == kind)),
            Predicate::NotBefore(pattern) => !pattern.is_match(cx.before_text(None)),
            Predicate::NotAfter(pattern) => !pattern.is_match(cx.after_text(None)),
            Predicate::All(inner) => inner.iter().all(|p| p.eval(cx)),
            Predicate::Custom(f) => f(cx),
        }
    }

    /// Guard that fails when `pattern` matches the text before the cursor.
    pub fn not_before(pattern: &str) -> Result<Self, CompileError> {
        Ok(Predicate::NotBefore(compile_pattern(pattern)?))
    }

    /// Guard that fails when `pattern` matches the text after the cursor.
    pub fn not_after(pattern: &str) -> Result<Self, CompileError> {
        Ok(Predicate::NotAfter(compile_pattern(pattern)?))
    }

    /// Wrap a host closure.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Context<'_>) -> bool + Send + Sync + 'static,
    {
        Predicate::Custom(Arc::new(f))
    }

    /// AND-combine a list of predicates, collapsing the trivial cases.
    pub fn all(mut predicates: Vec<Predicate>) -> Self {
        match predicates.len() {
            0 => Predicate::Const(true),
            1 => predicates.remove(0),
            _ => Predicate::All(predicates),
        }
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, CompileError> {
    Regex::new(pattern).map_err(|err| CompileError::BadPattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Const(value) => f.debug_tuple("Const").field(value).finish(),
            Predicate::InsertOnly => f.write_str("InsertOnly"),
            Predicate::Language(languages) => {
                f.debug_tuple("Language").field(languages).finish()
            }
            Predicate::SpanIn(kinds) => f.debug_tuple("SpanIn").field(kinds).finish(),
            Predicate::SpanNotIn(kinds) => f.debug_tuple("SpanNotIn").field(kinds).finish(),
            Predicate::NotBefore(pattern) => {
                f.debug_tuple("NotBefore").field(&pattern.as_str()).finish()
            }
            Predicate::NotAfter(pattern) => {
                f.debug_tuple("NotAfter").field(&pattern.as_str()).finish()
            }
            Predicate::All(inner) => f.debug_tuple("All").field(inner).finish(),
            Predicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
