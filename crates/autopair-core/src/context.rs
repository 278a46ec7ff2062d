//! Per-keystroke snapshot of editor state and the cursor-relative queries
//! rules evaluate against it.
//!
//! A [`Context`] is built at the start of one keystroke handler and dropped
//! at its end; it is never shared across keystrokes. Derived facts (escape
//! parity, span kind, the character under the cursor) are computed at most
//! once per instance, because several candidate rules may ask for the same
//! fact while a single decision is being made.

use std::cell::OnceCell;
use std::fmt;

use crate::edit::{Position, byte_of_col};
use crate::index::{DelimMatch, MatchIndex};

/// Editor input mode at the moment of the keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    /// Regular buffer insertion.
    #[default]
    Insert,
    /// Command-line / prompt input.
    Command,
}

/// Immutable snapshot of the editor state for one keystroke.
///
/// Borrows the current line, the document language, and the host's
/// [`MatchIndex`]; owns nothing that outlives the keystroke.
pub struct Context<'a> {
    line: &'a str,
    cursor: Position,
    mode: EditorMode,
    language: Option<&'a str>,
    index: &'a dyn MatchIndex,

    cursor_byte: OnceCell<usize>,
    escaped: OnceCell<bool>,
    under_cursor: OnceCell<Option<char>>,
    last_nonblank: OnceCell<Option<usize>>,
    span_kind: OnceCell<Option<String>>,
    cursor_scope: OnceCell<Option<String>>,
}

impl<'a> Context<'a> {
    /// Create a snapshot for the cursor sitting on `line` at `cursor`.
    ///
    /// `cursor.col` is a character column and is clamped to the line length;
    /// the mode defaults to [`EditorMode::Insert`] and no document language.
    pub fn new(line: &'a str, cursor: Position, index: &'a dyn MatchIndex) -> Self {
        Self {
            line,
            cursor,
            mode: EditorMode::Insert,
            language: None,
            index,
            cursor_byte: OnceCell::new(),
            escaped: OnceCell::new(),
            under_cursor: OnceCell::new(),
            last_nonblank: OnceCell::new(),
            span_kind: OnceCell::new(),
            cursor_scope: OnceCell::new(),
        }
    }

    /// Set the editor mode.
    pub fn with_mode(mut self, mode: EditorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the document language (e.g. `"rust"`).
    pub fn with_language(mut self, language: &'a str) -> Self {
        self.language = Some(language);
        self
    }

    /// The cursor position this snapshot was taken at.
    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// The full text of the current line.
    pub fn line(&self) -> &'a str {
        self.line
    }

    /// The editor mode at the keystroke.
    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// The document language, if the host supplied one.
    pub fn language(&self) -> Option<&'a str> {
        self.language
    }

    fn cursor_byte(&self) -> usize {
        *self
            .cursor_byte
            .get_or_init(|| byte_of_col(self.line, self.cursor.col))
    }

    /// Line text before the cursor, at most `max` characters when bounded.
    pub fn before_text(&self, max: Option<usize>) -> &str {
        let head = &self.line[..self.cursor_byte()];
        match max {
            None => head,
            Some(0) => "",
            Some(n) => {
                let start = head
                    .char_indices()
                    .rev()
                    .nth(n - 1)
                    .map(|(at, _)| at)
                    .unwrap_or(0);
                &head[start..]
            }
        }
    }

    /// Line text after the cursor, at most `max` characters when bounded.
    pub fn after_text(&self, max: Option<usize>) -> &str {
        let tail = &self.line[self.cursor_byte()..];
        match max {
            None => tail,
            Some(n) => {
                let end = tail
                    .char_indices()
                    .nth(n)
                    .map(|(at, _)| at)
                    .unwrap_or(tail.len());
                &tail[..end]
            }
        }
    }

    /// True if the window immediately before the cursor equals `text`.
    pub fn before_eq(&self, text: &str) -> bool {
        self.before_text(None).ends_with(text)
    }

    /// True if the window immediately after the cursor equals `text`.
    pub fn after_eq(&self, text: &str) -> bool {
        self.after_text(None).starts_with(text)
    }

    /// True if `text` plus exactly one trailing space precedes the cursor.
    pub fn padded_before_eq(&self, text: &str) -> bool {
        self.before_text(None)
            .strip_suffix(' ')
            .is_some_and(|rest| rest.ends_with(text))
    }

    /// True if exactly one space followed by `text` comes after the cursor.
    pub fn padded_after_eq(&self, text: &str) -> bool {
        self.after_text(None)
            .strip_prefix(' ')
            .is_some_and(|rest| rest.starts_with(text))
    }

    /// The character directly under (immediately after) the cursor.
    pub fn char_under_cursor(&self) -> Option<char> {
        *self
            .under_cursor
            .get_or_init(|| self.line[self.cursor_byte()..].chars().next())
    }

    /// Column of the nearest non-whitespace character before the cursor.
    pub fn last_nonblank_col(&self) -> Option<usize> {
        *self.last_nonblank.get_or_init(|| {
            self.line[..self.cursor_byte()]
                .chars()
                .enumerate()
                .filter(|(_, c)| !c.is_whitespace())
                .map(|(col, _)| col)
                .last()
        })
    }

    /// True if an odd number of contiguous escape characters (`\`) precedes
    /// the cursor, i.e. the next typed character is itself escaped.
    pub fn escaped(&self) -> bool {
        *self.escaped.get_or_init(|| {
            let backslashes = self
                .before_text(None)
                .chars()
                .rev()
                .take_while(|&c| c == '\\')
                .count();
            backslashes % 2 == 1
        })
    }

    /// Name of the syntactic span enclosing the cursor, if any. Queried from
    /// the host index once per snapshot.
    pub fn span_kind(&self) -> Option<&str> {
        self.span_kind
            .get_or_init(|| self.index.span_kind_at(self.cursor.row, self.cursor.col))
            .as_deref()
    }

    /// Fine-grained syntax scope at the cursor, if any. Queried from the
    /// host index once per snapshot.
    pub fn cursor_scope(&self) -> Option<&str> {
        self.cursor_scope
            .get_or_init(|| self.index.syntax_scope_at(self.cursor.row, self.cursor.col))
            .as_deref()
    }

    /// The language a rule restriction is tested against: the cursor's
    /// syntax scope when the index knows one (embedded languages win),
    /// otherwise the document language.
    pub fn scope_or_language(&self) -> Option<&str> {
        self.cursor_scope().or(self.language)
    }

    /// Unmatched opener of the given pair type before the cursor.
    pub fn unmatched_opening_before(&self, opening: &str, closing: &str) -> Option<DelimMatch> {
        self.index
            .unmatched_opening_before(opening, closing, self.cursor.row, self.cursor.col)
    }

    /// Unmatched closer of the given pair type after the cursor.
    pub fn unmatched_closing_after(&self, opening: &str, closing: &str) -> Option<DelimMatch> {
        self.index
            .unmatched_closing_after(opening, closing, self.cursor.row, self.cursor.col)
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("line", &self.line)
            .field("cursor", &self.cursor)
            .field("mode", &self.mode)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}
