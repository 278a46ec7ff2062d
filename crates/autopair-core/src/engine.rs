//! Per-keystroke decision procedures.
//!
//! Each handler is a pure function of the compiled [`PairSet`] and the
//! keystroke's [`Context`]: it either produces one [`PairEdit`] or `None`,
//! where `None` tells the host to apply the raw key unchanged. Nothing here
//! mutates state and no handler ever reports an error on the keystroke path —
//! any lookup failure or non-match degrades to a pass-through, so ordinary
//! typing is never blocked.

use log::{debug, error, trace};

use crate::context::Context;
use crate::edit::{InputKey, PairEdit};
use crate::rules::{PairRule, PairSet};

/// Outcome of evaluating a single candidate rule.
enum Decision {
    /// The rule decided the keystroke.
    Edit(PairEdit),
    /// The rule claimed the keystroke but its action is disabled; emit the
    /// raw key.
    Passthrough,
    /// The rule's preconditions do not hold here; try the next candidate.
    NextCandidate,
}

/// Route a classified keystroke to its handler.
pub fn on_key(pairs: &PairSet, cx: &Context<'_>, key: InputKey) -> Option<PairEdit> {
    match key {
        InputKey::Char(' ') | InputKey::Space => on_space(pairs, cx),
        InputKey::Char(ch) => on_printable_key(pairs, cx, ch),
        InputKey::Backspace => on_backspace(pairs, cx),
        InputKey::Enter => on_enter(pairs, cx),
    }
}

/// Decide a typed printable character.
///
/// Candidates for the key are tried in priority order; the first rule whose
/// composite applicability holds decides the keystroke. A disabled action on
/// that rule yields a pass-through, while an unmet multi-character-opener
/// precondition falls through to the next candidate.
pub fn on_printable_key(pairs: &PairSet, cx: &Context<'_>, ch: char) -> Option<PairEdit> {
    trace!("printable {ch:?} at {:?} line {:?}", cx.cursor(), cx.line());

    for rule in pairs.candidates(ch) {
        if !rule.applicable(cx) {
            continue;
        }
        match decide_printable(rule, cx, ch) {
            Decision::Edit(edit) => {
                debug!("{:?}/{:?} -> {edit:?}", rule.opening(), rule.closing());
                return Some(edit);
            }
            Decision::Passthrough => return None,
            Decision::NextCandidate => continue,
        }
    }
    None
}

fn decide_printable(rule: &PairRule, cx: &Context<'_>, ch: char) -> Decision {
    if rule.is_symmetric() {
        return decide_symmetric(rule, cx);
    }
    if single_char(rule.opening()) == Some(ch) {
        return decide_open(rule, cx);
    }
    if single_char(rule.closing()) == Some(ch) {
        return decide_close(rule, cx);
    }
    if rule.opening().contains(ch) {
        return decide_multi_opener(rule, cx, ch);
    }
    if rule.closing().starts_with(ch) {
        return decide_multi_closer(rule, cx);
    }

    // Compilation validates that the trigger occurs in the rule, so a
    // candidate that matches none of the branches is a compiler bug.
    error!(
        "trigger {ch:?} unreachable in rule {:?}/{:?}",
        rule.opening(),
        rule.closing()
    );
    debug_assert!(false, "trigger key not locatable in compiled rule");
    Decision::Passthrough
}

/// Symmetric rules: one delimiter acts as both opener and closer.
fn decide_symmetric(rule: &PairRule, cx: &Context<'_>) -> Decision {
    if !rule.allows_open_or_close(cx) {
        return Decision::Passthrough;
    }
    if cx.escaped() {
        return Decision::Passthrough;
    }

    let delim = rule.closing();

    // The delimiter is already there: step over one column instead of
    // inserting a duplicate.
    if cx.after_eq(delim) {
        return Decision::Edit(PairEdit::SkipOver { chars: 1 });
    }

    if delim.chars().count() > 1 {
        // Extend partial delimiters instead of duplicating them: typing the
        // third quote of `''` emits only what is missing on each side.
        let before = open_remainder(cx.before_text(None), delim);
        let after = close_remainder(cx.after_text(None), delim);
        return Decision::Edit(PairEdit::Surround {
            before: before.to_string(),
            after: after.to_string(),
        });
    }

    Decision::Edit(PairEdit::Surround {
        before: delim.to_string(),
        after: delim.to_string(),
    })
}

/// Asymmetric rules, typed key is the single-character opener.
fn decide_open(rule: &PairRule, cx: &Context<'_>) -> Decision {
    if !rule.allows_open(cx) {
        return Decision::Passthrough;
    }
    if cx.escaped() {
        return Decision::Passthrough;
    }
    // A dangling closer further right wants this opener as its literal
    // counterpart; opening another pair here would duplicate it.
    if cx
        .unmatched_closing_after(rule.opening(), rule.closing())
        .is_some()
    {
        return Decision::Passthrough;
    }

    Decision::Edit(PairEdit::Surround {
        before: rule.opening().to_string(),
        after: rule.closing().to_string(),
    })
}

/// Asymmetric rules, typed key is the single-character closer.
fn decide_close(rule: &PairRule, cx: &Context<'_>) -> Decision {
    if !rule.allows_close(cx) {
        return Decision::Passthrough;
    }
    // A dangling opener further left genuinely needs a new closer.
    if cx
        .unmatched_opening_before(rule.opening(), rule.closing())
        .is_some()
    {
        return Decision::Passthrough;
    }

    let closing = rule.closing();
    if cx.after_eq(closing) {
        return Decision::Edit(PairEdit::SkipOver {
            chars: closing.chars().count(),
        });
    }
    if cx.padded_after_eq(closing) {
        return Decision::Edit(PairEdit::SkipOver {
            chars: closing.chars().count() + 1,
        });
    }

    Decision::Passthrough
}

/// Multi-character openers: the typed key sits somewhere inside the opener.
fn decide_multi_opener(rule: &PairRule, cx: &Context<'_>, ch: char) -> Decision {
    let opening = rule.opening();
    let at = match opening.find(ch) {
        Some(at) => at,
        None => return Decision::NextCandidate,
    };

    // The whole opener is already typed out: the key starts the closer.
    if cx.before_eq(opening) {
        if !rule.allows_close(cx) {
            return Decision::Passthrough;
        }
        // Step over an already-present closer instead of duplicating it.
        if cx.after_eq(rule.closing()) {
            return Decision::Edit(PairEdit::SkipOver {
                chars: rule.closing().chars().count(),
            });
        }
        return Decision::Edit(PairEdit::Surround {
            before: rule.closing().to_string(),
            after: String::new(),
        });
    }

    // The opener's literal prefix is typed out and the key continues it:
    // emit the rest of the opener plus the full closer.
    if cx.before_eq(&opening[..at]) {
        if !rule.allows_open(cx) {
            return Decision::Passthrough;
        }
        if cx.escaped() {
            return Decision::Passthrough;
        }
        return Decision::Edit(PairEdit::Surround {
            before: opening[at..].to_string(),
            after: rule.closing().to_string(),
        });
    }

    Decision::NextCandidate
}

/// Multi-character closers reached through their first character: only
/// skip-over is meaningful, insertion is the opener side's job.
fn decide_multi_closer(rule: &PairRule, cx: &Context<'_>) -> Decision {
    let closing = rule.closing();
    if cx.after_eq(closing) {
        if !rule.allows_close(cx) {
            return Decision::Passthrough;
        }
        return Decision::Edit(PairEdit::SkipOver {
            chars: closing.chars().count(),
        });
    }
    Decision::NextCandidate
}

/// Decide a backspace: collapse a surrounding pair.
///
/// A padded pair (`( | )`) loses its two inner spaces; a tight pair (`(|)`)
/// loses both delimiters. Anything else is a plain backspace.
pub fn on_backspace(pairs: &PairSet, cx: &Context<'_>) -> Option<PairEdit> {
    surrounding_rule(pairs, cx, PairRule::allows_backspace).map(|(rule, padded)| {
        if padded {
            PairEdit::DeleteAround {
                before: 1,
                after: 1,
            }
        } else {
            PairEdit::DeleteAround {
                before: rule.opening().chars().count(),
                after: rule.closing().chars().count(),
            }
        }
    })
}

/// Decide an enter: split a surrounding pair across lines, dropping any
/// padding spaces first. The host re-indents the resulting lines.
pub fn on_enter(pairs: &PairSet, cx: &Context<'_>) -> Option<PairEdit> {
    surrounding_rule(pairs, cx, PairRule::allows_enter).map(|(_, padded)| {
        let trim = if padded { 1 } else { 0 };
        PairEdit::SplitLine {
            trim_before: trim,
            trim_after: trim,
        }
    })
}

/// Decide a space: pad a tight surrounding pair with one space on each side,
/// leaving the cursor between the spaces.
pub fn on_space(pairs: &PairSet, cx: &Context<'_>) -> Option<PairEdit> {
    pairs
        .rules_by_priority()
        .find(|rule| {
            rule.applicable(cx)
                && rule.allows_space(cx)
                && cx.before_eq(rule.opening())
                && cx.after_eq(rule.closing())
        })
        .map(|_| PairEdit::Surround {
            before: " ".to_string(),
            after: " ".to_string(),
        })
}

/// Find the highest-priority enabled rule whose pair surrounds the cursor,
/// tightly or with one space of padding on each side.
fn surrounding_rule<'p>(
    pairs: &'p PairSet,
    cx: &Context<'_>,
    enabled: impl Fn(&PairRule, &Context<'_>) -> bool,
) -> Option<(&'p PairRule, bool)> {
    for rule in pairs.rules_by_priority() {
        if !rule.applicable(cx) || !enabled(rule, cx) {
            continue;
        }
        if cx.padded_before_eq(rule.opening()) && cx.padded_after_eq(rule.closing()) {
            trace!("padded pair {:?}/{:?}", rule.opening(), rule.closing());
            return Some((rule, true));
        }
        if cx.before_eq(rule.opening()) && cx.after_eq(rule.closing()) {
            trace!("tight pair {:?}/{:?}", rule.opening(), rule.closing());
            return Some((rule, false));
        }
    }
    None
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

/// Longest prefix of `delim` already sitting before the cursor, subtracted
/// from `delim`.
fn open_remainder<'d>(before: &str, delim: &'d str) -> &'d str {
    let mut end = delim.len();
    while end > 0 {
        if before.ends_with(&delim[..end]) {
            return &delim[end..];
        }
        end = delim[..end]
            .char_indices()
            .next_back()
            .map(|(at, _)| at)
            .unwrap_or(0);
    }
    delim
}

/// Longest suffix of `delim` already sitting after the cursor, subtracted
/// from `delim`.
fn close_remainder<'d>(after: &str, delim: &'d str) -> &'d str {
    let mut start = 0;
    loop {
        if after.starts_with(&delim[start..]) {
            return &delim[..start];
        }
        match delim[start..].chars().next() {
            Some(ch) => start += ch.len_utf8(),
            None => return delim,
        }
    }
}
