//! End-to-end behavior of the decision engine, driven through a minimal
//! line-buffer harness that applies each decision (or the raw key) the way a
//! host editor would.

use autopair_core::{
    Context, DelimMatch, InputKey, MatchIndex, NullIndex, PairSet, PairSpec, Position, Predicate,
    engine,
};
use pretty_assertions::assert_eq;

/// One-buffer editor: routes keys through the engine and falls back to the
/// raw key when the engine passes.
struct Editor<'a> {
    pairs: &'a PairSet,
    index: &'a dyn MatchIndex,
    language: Option<&'a str>,
    lines: Vec<String>,
    cursor: Position,
}

impl<'a> Editor<'a> {
    fn new(pairs: &'a PairSet, line: &str, col: usize) -> Self {
        Self {
            pairs,
            index: &NullIndex,
            language: None,
            lines: vec![line.to_string()],
            cursor: Position::new(0, col),
        }
    }

    fn with_index(mut self, index: &'a dyn MatchIndex) -> Self {
        self.index = index;
        self
    }

    fn with_language(mut self, language: &'a str) -> Self {
        self.language = Some(language);
        self
    }

    fn press(&mut self, key: InputKey) {
        let line = self.lines[self.cursor.row].clone();
        let mut cx = Context::new(&line, self.cursor, self.index);
        if let Some(language) = self.language {
            cx = cx.with_language(language);
        }

        match engine::on_key(self.pairs, &cx, key) {
            Some(edit) => {
                let applied = edit.apply(&line, self.cursor.col);
                let row = self.cursor.row;
                self.lines.splice(row..=row, applied.lines);
                self.cursor = Position::new(row + applied.cursor.row, applied.cursor.col);
            }
            None => self.press_raw(key),
        }
    }

    fn press_raw(&mut self, key: InputKey) {
        let row = self.cursor.row;
        let line = self.lines[row].clone();
        let at = line
            .char_indices()
            .nth(self.cursor.col)
            .map(|(i, _)| i)
            .unwrap_or(line.len());

        match key {
            InputKey::Char(ch) => {
                let mut line = line;
                line.insert(at, ch);
                self.lines[row] = line;
                self.cursor.col += 1;
            }
            InputKey::Space => {
                let mut line = line;
                line.insert(at, ' ');
                self.lines[row] = line;
                self.cursor.col += 1;
            }
            InputKey::Backspace => {
                if self.cursor.col > 0 {
                    let start = line
                        .char_indices()
                        .nth(self.cursor.col - 1)
                        .map(|(i, _)| i)
                        .unwrap_or(line.len());
                    let mut line = line;
                    line.replace_range(start..at, "");
                    self.lines[row] = line;
                    self.cursor.col -= 1;
                }
            }
            InputKey::Enter => {
                let (head, tail) = line.split_at(at);
                self.lines
                    .splice(row..=row, [head.to_string(), tail.to_string()]);
                self.cursor = Position::new(row + 1, 0);
            }
        }
    }

    fn type_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.press(InputKey::Char(ch));
        }
    }

    fn text(&self) -> String {
        self.lines.join("\n")
    }
}

fn parens() -> PairSet {
    PairSet::compile([('(', PairSpec::new(")"))]).unwrap()
}

fn quotes() -> PairSet {
    PairSet::compile([('\'', PairSpec::new("'"))]).unwrap()
}

#[test]
fn test_paren_round_trip_scenario() {
    let pairs = parens();
    let mut ed = Editor::new(&pairs, "foo", 3);

    ed.press(InputKey::Char('('));
    assert_eq!(ed.text(), "foo()");
    assert_eq!(ed.cursor, Position::new(0, 4));

    ed.press(InputKey::Char(')'));
    assert_eq!(ed.text(), "foo()");
    assert_eq!(ed.cursor, Position::new(0, 5));
}

#[test]
fn test_backspace_collapse_scenario() {
    let pairs = parens();
    let mut ed = Editor::new(&pairs, "foo", 3);

    ed.press(InputKey::Char('('));
    ed.press(InputKey::Backspace);
    assert_eq!(ed.text(), "foo");
    assert_eq!(ed.cursor, Position::new(0, 3));
}

#[test]
fn test_round_trip_matches_literal_text() {
    // Typing the opener then the closer leaves exactly `o` + `c` with the
    // cursor after the closer, for a plain asymmetric rule.
    for (key, closing) in [('(', ")"), ('[', "]"), ('{', "}")] {
        let pairs = PairSet::compile([(key, PairSpec::new(closing))]).unwrap();
        let mut ed = Editor::new(&pairs, "", 0);
        ed.press(InputKey::Char(key));
        ed.type_str(closing);

        let literal = format!("{key}{closing}");
        assert_eq!(ed.text(), literal);
        assert_eq!(ed.cursor.col, literal.chars().count());
    }
}

#[test]
fn test_escape_invariance() {
    let pairs = parens();

    // Odd backslash runs force the literal key.
    let mut ed = Editor::new(&pairs, "\\", 1);
    ed.press(InputKey::Char('('));
    assert_eq!(ed.text(), "\\(");

    let mut ed = Editor::new(&pairs, "x\\\\\\", 5);
    ed.press(InputKey::Char('('));
    assert_eq!(ed.text(), "x\\\\\\(");

    // Even runs (including none) pair as usual.
    let mut ed = Editor::new(&pairs, "\\\\", 2);
    ed.press(InputKey::Char('('));
    assert_eq!(ed.text(), "\\\\()");
}

#[test]
fn test_escape_invariance_symmetric() {
    let pairs = quotes();
    let mut ed = Editor::new(&pairs, "don\\", 4);
    ed.press(InputKey::Char('\''));
    assert_eq!(ed.text(), "don\\'");
    assert_eq!(ed.cursor, Position::new(0, 5));
}

#[test]
fn test_skip_over_is_pure_cursor_move() {
    let pairs = parens();
    let mut ed = Editor::new(&pairs, "foo()", 4);
    let before = ed.text();

    ed.press(InputKey::Char(')'));
    assert_eq!(ed.text(), before);
    assert_eq!(ed.cursor, Position::new(0, 5));
}

#[test]
fn test_symmetric_quote_scenario() {
    // Symmetric rule with enter disabled: insert, then skip over.
    let pairs = PairSet::compile([('\'', PairSpec::new("'").enter(false))]).unwrap();
    let mut ed = Editor::new(&pairs, "foo", 3);

    ed.press(InputKey::Char('\''));
    assert_eq!(ed.text(), "foo''");
    assert_eq!(ed.cursor, Position::new(0, 4));

    ed.press(InputKey::Char('\''));
    assert_eq!(ed.text(), "foo''");
    assert_eq!(ed.cursor, Position::new(0, 5));

    // Enter between the quotes stays a plain line break.
    let mut ed = Editor::new(&pairs, "''", 1);
    ed.press(InputKey::Enter);
    assert_eq!(ed.text(), "'\n'");
    assert_eq!(ed.cursor, Position::new(1, 0));
}

#[test]
fn test_language_gated_rule_falls_through() {
    // The raw-string rule is restricted to one language; elsewhere the
    // generic quote rule must still get its own decision.
    let raw = PairSpec::new("\"#")
        .with_opening("r#\"")
        .with_languages(["rust"]);
    let pairs = PairSet::compile([('"', raw), ('"', PairSpec::new("\""))]).unwrap();

    let mut ed = Editor::new(&pairs, "r#", 2).with_language("rust");
    ed.press(InputKey::Char('"'));
    assert_eq!(ed.text(), "r#\"\"#");
    assert_eq!(ed.cursor, Position::new(0, 3));

    let mut ed = Editor::new(&pairs, "r#", 2).with_language("markdown");
    ed.press(InputKey::Char('"'));
    assert_eq!(ed.text(), "r#\"\"");
    assert_eq!(ed.cursor, Position::new(0, 3));
}

#[test]
fn test_triple_quote_builds_incrementally() {
    let triple = PairSpec::new("'''")
        .with_opening("'''")
        .when(Predicate::custom(|cx| cx.before_eq("''")));
    let pairs = PairSet::compile([('\'', PairSpec::new("'")), ('\'', triple)]).unwrap();

    let mut ed = Editor::new(&pairs, "", 0);
    ed.type_str("'''");
    assert_eq!(ed.text(), "''''''");
    assert_eq!(ed.cursor, Position::new(0, 3));
}

#[test]
fn test_priority_tie_break_is_declaration_order() {
    let pairs = PairSet::compile([
        ('(', PairSpec::new(")").with_priority(7)),
        ('(', PairSpec::new("]").with_priority(7)),
    ])
    .unwrap();
    let mut ed = Editor::new(&pairs, "", 0);
    ed.press(InputKey::Char('('));
    assert_eq!(ed.text(), "()");

    let pairs = PairSet::compile([
        ('(', PairSpec::new("]").with_priority(7)),
        ('(', PairSpec::new(")").with_priority(7)),
    ])
    .unwrap();
    let mut ed = Editor::new(&pairs, "", 0);
    ed.press(InputKey::Char('('));
    assert_eq!(ed.text(), "(]");
}

#[test]
fn test_space_pad_and_unpad() {
    let pairs = parens();
    let mut ed = Editor::new(&pairs, "()", 1);

    ed.press(InputKey::Space);
    assert_eq!(ed.text(), "(  )");
    assert_eq!(ed.cursor, Position::new(0, 2));

    // Backspace inside the padded pair removes only the padding.
    ed.press(InputKey::Backspace);
    assert_eq!(ed.text(), "()");
    assert_eq!(ed.cursor, Position::new(0, 1));
}

#[test]
fn test_closer_skips_padded_pair() {
    let pairs = parens();
    let mut ed = Editor::new(&pairs, "( )", 1);
    ed.press(InputKey::Char(')'));
    assert_eq!(ed.text(), "( )");
    assert_eq!(ed.cursor, Position::new(0, 3));
}

#[test]
fn test_enter_between_pair() {
    let pairs = PairSet::compile([('{', PairSpec::new("}"))]).unwrap();
    let mut ed = Editor::new(&pairs, "fn x() {}", 8);

    ed.press(InputKey::Enter);
    assert_eq!(ed.text(), "fn x() {\n\n}");
    assert_eq!(ed.cursor, Position::new(1, 0));
}

#[test]
fn test_enter_between_padded_pair() {
    let pairs = PairSet::compile([('{', PairSpec::new("}"))]).unwrap();
    let mut ed = Editor::new(&pairs, "{  }", 2);

    ed.press(InputKey::Enter);
    assert_eq!(ed.text(), "{\n\n}");
    assert_eq!(ed.cursor, Position::new(1, 0));
}

/// Scripted index: reports delimiters of the tracked pair type that are
/// globally unbalanced in the given line.
struct ScriptedBalance {
    dangling_opener_at: Option<usize>,
    dangling_closer_at: Option<usize>,
}

impl MatchIndex for ScriptedBalance {
    fn unmatched_opening_before(
        &self,
        _opening: &str,
        _closing: &str,
        _row: usize,
        col: usize,
    ) -> Option<DelimMatch> {
        self.dangling_opener_at
            .filter(|&at| at < col)
            .map(|at| DelimMatch::new(0, at))
    }

    fn unmatched_closing_after(
        &self,
        _opening: &str,
        _closing: &str,
        _row: usize,
        col: usize,
    ) -> Option<DelimMatch> {
        self.dangling_closer_at
            .filter(|&at| at >= col)
            .map(|at| DelimMatch::new(0, at))
    }

    fn span_kind_at(&self, _row: usize, _col: usize) -> Option<String> {
        None
    }

    fn syntax_scope_at(&self, _row: usize, _col: usize) -> Option<String> {
        None
    }
}

#[test]
fn test_dangling_closer_keeps_opener_literal() {
    let pairs = parens();
    let index = ScriptedBalance {
        dangling_opener_at: None,
        dangling_closer_at: Some(4),
    };
    // `foo |)` — typing `(` must not open another pair.
    let mut ed = Editor::new(&pairs, "foo )", 4).with_index(&index);
    ed.press(InputKey::Char('('));
    assert_eq!(ed.text(), "foo ()");
    assert_eq!(ed.cursor, Position::new(0, 5));
}

#[test]
fn test_dangling_opener_gets_literal_closer() {
    let pairs = parens();
    let index = ScriptedBalance {
        dangling_opener_at: Some(0),
        dangling_closer_at: None,
    };
    // `((foo|)` — the outer opener is unbalanced, so `)` is inserted
    // literally instead of skipping over the closer at the cursor.
    let mut ed = Editor::new(&pairs, "((foo)", 5).with_index(&index);
    ed.press(InputKey::Char(')'));
    assert_eq!(ed.text(), "((foo))");
    assert_eq!(ed.cursor, Position::new(0, 6));
}

#[test]
fn test_balanced_buffer_skips_normally() {
    let pairs = parens();
    let index = ScriptedBalance {
        dangling_opener_at: None,
        dangling_closer_at: None,
    };
    let mut ed = Editor::new(&pairs, "foo()", 4).with_index(&index);
    ed.press(InputKey::Char(')'));
    assert_eq!(ed.text(), "foo()");
    assert_eq!(ed.cursor, Position::new(0, 5));
}

#[test]
fn test_default_set_quotes_respect_words() {
    let pairs = PairSet::default();

    // Right after a word character a quote stays single…
    let mut ed = Editor::new(&pairs, "foo", 3);
    ed.press(InputKey::Char('\''));
    assert_eq!(ed.text(), "foo'");

    // …but after whitespace it pairs.
    let mut ed = Editor::new(&pairs, "foo ", 4);
    ed.press(InputKey::Char('\''));
    assert_eq!(ed.text(), "foo ''");
}

#[test]
fn test_default_set_brackets_before_word() {
    let pairs = PairSet::default();

    // Directly before a word the opener stays single.
    let mut ed = Editor::new(&pairs, "foo", 0);
    ed.press(InputKey::Char('('));
    assert_eq!(ed.text(), "(foo");

    // At end of line it pairs.
    let mut ed = Editor::new(&pairs, "foo", 3);
    ed.press(InputKey::Char('('));
    assert_eq!(ed.text(), "foo()");
}
