//! Interface to the host's bracket-balance and span index.
//!
//! The engine never parses the buffer itself. Whatever the host uses to keep
//! delimiters and syntactic spans indexed (a full parse, tree-sitter, a line
//! scanner) is queried through [`MatchIndex`], synchronously and against the
//! buffer state from before the pending keystroke.

/// Location of a delimiter reported by the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimMatch {
    /// Zero-based row of the delimiter's first character.
    pub row: usize,
    /// Zero-based character column of the delimiter's first character.
    pub col: usize,
}

impl DelimMatch {
    /// Create a new match location.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Bracket-balance and span queries the engine consults while deciding a
/// keystroke.
///
/// "Unmatched" means unbalanced in the whole indexed buffer, not merely
/// unclosed on the cursor's side: in `foo(|)` the opener is matched by the
/// closer after the cursor and `unmatched_opening_before` reports nothing.
pub trait MatchIndex {
    /// The most recent opener of the given pair type before `(row, col)`
    /// that has no corresponding closer.
    fn unmatched_opening_before(
        &self,
        opening: &str,
        closing: &str,
        row: usize,
        col: usize,
    ) -> Option<DelimMatch>;

    /// The nearest closer of the given pair type after `(row, col)` that has
    /// no corresponding opener.
    fn unmatched_closing_after(
        &self,
        opening: &str,
        closing: &str,
        row: usize,
        col: usize,
    ) -> Option<DelimMatch>;

    /// Name of the syntactic span (e.g. `"string"`, `"math"`) enclosing the
    /// position, if any.
    fn span_kind_at(&self, row: usize, col: usize) -> Option<String>;

    /// Fine-grained syntax-node identity at the position, used by
    /// language-gated rules. `None` when the host has no syntax information.
    fn syntax_scope_at(&self, row: usize, col: usize) -> Option<String>;
}

/// Index for hosts without delimiter information: reports no matches and no
/// spans, which makes every closer skip-capable and every opener pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullIndex;

impl MatchIndex for NullIndex {
    fn unmatched_opening_before(
        &self,
        _opening: &str,
        _closing: &str,
        _row: usize,
        _col: usize,
    ) -> Option<DelimMatch> {
        None
    }

    fn unmatched_closing_after(
        &self,
        _opening: &str,
        _closing: &str,
        _row: usize,
        _col: usize,
    ) -> Option<DelimMatch> {
        None
    }

    fn span_kind_at(&self, _row: usize, _col: usize) -> Option<String> {
        None
    }

    fn syntax_scope_at(&self, _row: usize, _col: usize) -> Option<String> {
        None
    }
}
