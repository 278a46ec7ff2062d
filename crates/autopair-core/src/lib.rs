#![warn(missing_docs)]
//! Autopair Core - Headless Delimiter Auto-Pairing Engine
//!
//! # Overview
//!
//! `autopair-core` decides, one keystroke at a time, how a text editor should
//! react to delimiter input: insert the matching closer when an opener is
//! typed, step over an auto-inserted closer instead of duplicating it, and
//! give deletion, line breaks, and space insertion special behavior between a
//! pair. It is headless and side-effect free — every decision is a pure
//! function that returns a single composed edit for the host to apply, or
//! nothing, in which case the raw key goes through untouched.
//!
//! The engine does not parse or store buffers. The host supplies the current
//! line and cursor per keystroke, and answers bracket-balance / span queries
//! through the [`MatchIndex`] trait when it has an index to answer them with.
//!
//! # Core Features
//!
//! - **Declarative rules**: pairs are data — delimiters, priority, language
//!   restrictions, per-action gates — compiled once into a read-only
//!   [`PairSet`]
//! - **Multi-character and asymmetric pairs**: `r#"`/`"#`, `{%`/`%}`, triple
//!   quotes; partial delimiters are extended, never duplicated
//! - **Priority arbitration**: conditional rules outrank unconditional ones
//!   of equal delimiter length, declaration order breaks ties
//! - **Balance awareness**: a dangling closer suppresses pair insertion and a
//!   dangling opener forces a literal closer, when the host index reports them
//! - **Bounded decisions**: one pass over the candidate rules per keystroke,
//!   with per-snapshot memoization of derived facts
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Decision Engine (on_key / on_printable_…)  │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Rule Set (trigger index, priority order)   │  ← Compiled Configuration
//! ├─────────────────────────────────────────────┤
//! │  Context (per-keystroke snapshot, memoized) │  ← Editor State
//! ├─────────────────────────────────────────────┤
//! │  MatchIndex (host bracket/span queries)     │  ← Collaborator Boundary
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use autopair_core::{engine, Context, InputKey, NullIndex, PairSet, Position};
//!
//! let pairs = PairSet::default();
//! let index = NullIndex;
//!
//! // Typing `(` at the end of `foo` inserts the pair…
//! let cx = Context::new("foo", Position::new(0, 3), &index);
//! let edit = engine::on_key(&pairs, &cx, InputKey::Char('(')).unwrap();
//! let applied = edit.apply("foo", 3);
//! assert_eq!(applied.lines, vec!["foo()".to_string()]);
//! assert_eq!(applied.cursor, Position::new(0, 4));
//!
//! // …and typing `)` right after steps over the inserted closer.
//! let cx = Context::new("foo()", Position::new(0, 4), &index);
//! let edit = engine::on_key(&pairs, &cx, InputKey::Char(')')).unwrap();
//! assert_eq!(edit.apply("foo()", 4).cursor, Position::new(0, 5));
//! ```
//!
//! # Custom Rules
//!
//! ```rust
//! use autopair_core::{engine, Context, NullIndex, PairSet, PairSpec, Position};
//!
//! let pairs = PairSet::compile([
//!     ('"', PairSpec::new("\"")),
//!     ('"', PairSpec::new("\"#").with_opening("r#\"").with_languages(["rust"])),
//! ])
//! .unwrap();
//!
//! let index = NullIndex;
//! let cx = Context::new("r#", Position::new(0, 2), &index).with_language("rust");
//! let edit = engine::on_printable_key(&pairs, &cx, '"').unwrap();
//! assert_eq!(edit.apply("r#", 2).lines, vec!["r#\"\"#".to_string()]);
//! ```
//!
//! # Module Description
//!
//! - [`rules`] - rule definitions, the compiler, and the trigger-indexed set
//! - [`engine`] - the per-keystroke decision procedures
//! - [`context`] - the per-keystroke editor-state snapshot
//! - [`predicate`] - the applicability vocabulary rules are gated on
//! - [`edit`] - key classes and the edit algebra handed back to the host
//! - [`index`] - the bracket-balance / span collaborator interface
//!
//! # Threading
//!
//! A compiled [`PairSet`] is immutable and may be shared across threads; a
//! [`Context`] lives inside one keystroke handler and is never retained
//! beyond it.

pub mod context;
pub mod edit;
pub mod engine;
pub mod index;
pub mod predicate;
pub mod rules;

pub use context::{Context, EditorMode};
pub use edit::{AppliedEdit, InputKey, PairEdit, Position};
pub use engine::{on_backspace, on_enter, on_key, on_printable_key, on_space};
pub use index::{DelimMatch, MatchIndex, NullIndex};
pub use predicate::{CustomFn, Predicate};
pub use rules::{ActionGate, ActionOverrides, CompileError, PairRule, PairSet, PairSpec};
