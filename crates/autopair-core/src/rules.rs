//! Rule definitions, the rule compiler, and the trigger-indexed rule set.
//!
//! Raw [`PairSpec`] definitions are compiled once into immutable
//! [`PairRule`]s held by a [`PairSet`]; the set is read-only afterwards and
//! can be shared across every keystroke evaluation without locking.
//! Reconfiguration is a full recompile, not an incremental patch.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use smallvec::SmallVec;

use crate::context::Context;
use crate::predicate::Predicate;

/// Error produced while compiling rule definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A delimiter string in a definition is empty.
    EmptyDelimiter {
        /// Trigger key the definition was declared under.
        key: char,
        /// Name of the offending field (`"opening"` or `"closing"`).
        field: &'static str,
    },
    /// The trigger key occurs neither in the opening delimiter nor as the
    /// first character of the closing delimiter, so the rule could never
    /// fire.
    TriggerNotInRule {
        /// Trigger key the definition was declared under.
        key: char,
        /// The rule's opening delimiter.
        opening: String,
        /// The rule's closing delimiter.
        closing: String,
    },
    /// A guard pattern failed to compile.
    BadPattern {
        /// The rejected pattern.
        pattern: String,
        /// The regex compiler's message.
        message: String,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::EmptyDelimiter { key, field } => {
                write!(f, "rule under key '{key}': {field} must not be empty")
            }
            CompileError::TriggerNotInRule {
                key,
                opening,
                closing,
            } => {
                write!(
                    f,
                    "rule under key '{key}': key not found in opening {opening:?} \
                     and not the first character of closing {closing:?}"
                )
            }
            CompileError::BadPattern { pattern, message } => {
                write!(f, "guard pattern {pattern:?} failed to compile: {message}")
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// Per-action switch in a raw definition: a literal flag or a predicate.
#[derive(Debug, Clone)]
pub enum ActionGate {
    /// Constant on/off.
    Flag(bool),
    /// Decided per keystroke.
    When(Predicate),
}

impl ActionGate {
    fn into_predicate(self) -> Predicate {
        match self {
            ActionGate::Flag(value) => Predicate::Const(value),
            ActionGate::When(predicate) => predicate,
        }
    }
}

impl From<bool> for ActionGate {
    fn from(value: bool) -> Self {
        ActionGate::Flag(value)
    }
}

impl From<Predicate> for ActionGate {
    fn from(predicate: Predicate) -> Self {
        ActionGate::When(predicate)
    }
}

/// Optional per-action overrides in a raw definition. An absent gate means
/// the action is enabled.
#[derive(Debug, Clone, Default)]
pub struct ActionOverrides {
    /// Opening an asymmetric pair.
    pub open: Option<ActionGate>,
    /// Closing / skipping over an asymmetric pair.
    pub close: Option<ActionGate>,
    /// The single action of a symmetric pair.
    pub open_or_close: Option<ActionGate>,
    /// Splitting a surrounding pair across lines.
    pub enter: Option<ActionGate>,
    /// Collapsing a surrounding pair.
    pub backspace: Option<ActionGate>,
    /// Space-padding a surrounding pair.
    pub space: Option<ActionGate>,
}

/// A raw rule definition, declared under a trigger key.
///
/// The shorthand form is just a closing delimiter — the opening delimiter
/// defaults to the trigger key, every action is enabled, and the priority
/// follows the delimiter lengths. The builder methods cover the structured
/// form.
#[derive(Debug, Clone)]
pub struct PairSpec {
    /// Opening delimiter; `None` means the trigger key itself.
    pub opening: Option<String>,
    /// Closing delimiter.
    pub closing: String,
    /// Explicit priority; `None` computes the default.
    pub priority: Option<i32>,
    /// Restrict the rule to these languages.
    pub languages: Option<Vec<String>>,
    /// Definition-level predicate. Its presence raises the default priority
    /// by 4, so conditional rules outrank unconditional ones of equal
    /// delimiter length.
    pub when: Option<Predicate>,
    /// Whether the rule stays active in command-line mode.
    pub command_mode: bool,
    /// Per-action overrides.
    pub actions: ActionOverrides,
}

impl PairSpec {
    /// Shorthand definition: close with `closing`, open with the trigger
    /// key, everything enabled.
    pub fn new(closing: impl Into<String>) -> Self {
        Self {
            opening: None,
            closing: closing.into(),
            priority: None,
            languages: None,
            when: None,
            command_mode: true,
            actions: ActionOverrides::default(),
        }
    }

    /// Use a distinct opening delimiter instead of the trigger key.
    pub fn with_opening(mut self, opening: impl Into<String>) -> Self {
        self.opening = Some(opening.into());
        self
    }

    /// Override the computed priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Restrict the rule to the given languages.
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = Some(languages.into_iter().map(Into::into).collect());
        self
    }

    /// Attach a definition-level predicate.
    pub fn when(mut self, predicate: Predicate) -> Self {
        self.when = Some(predicate);
        self
    }

    /// Disable the rule while the editor is in command-line mode.
    pub fn insert_mode_only(mut self) -> Self {
        self.command_mode = false;
        self
    }

    /// Gate the `open` action.
    pub fn open(mut self, gate: impl Into<ActionGate>) -> Self {
        self.actions.open = Some(gate.into());
        self
    }

    /// Gate the `close` action.
    pub fn close(mut self, gate: impl Into<ActionGate>) -> Self {
        self.actions.close = Some(gate.into());
        self
    }

    /// Gate the `open_or_close` action of a symmetric rule.
    pub fn open_or_close(mut self, gate: impl Into<ActionGate>) -> Self {
        self.actions.open_or_close = Some(gate.into());
        self
    }

    /// Gate the `enter` action.
    pub fn enter(mut self, gate: impl Into<ActionGate>) -> Self {
        self.actions.enter = Some(gate.into());
        self
    }

    /// Gate the `backspace` action.
    pub fn backspace(mut self, gate: impl Into<ActionGate>) -> Self {
        self.actions.backspace = Some(gate.into());
        self
    }

    /// Gate the `space` action.
    pub fn space(mut self, gate: impl Into<ActionGate>) -> Self {
        self.actions.space = Some(gate.into());
        self
    }
}

/// A compiled, immutable pairing rule.
#[derive(Debug, Clone)]
pub struct PairRule {
    opening: String,
    closing: String,
    priority: i32,
    applicability: Predicate,
    open: Predicate,
    close: Predicate,
    open_or_close: Predicate,
    enter: Predicate,
    backspace: Predicate,
    space: Predicate,
}

impl PairRule {
    /// The opening delimiter.
    pub fn opening(&self) -> &str {
        &self.opening
    }

    /// The closing delimiter.
    pub fn closing(&self) -> &str {
        &self.closing
    }

    /// The resolved priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// True if opening and closing delimiters are the same string.
    pub fn is_symmetric(&self) -> bool {
        self.opening == self.closing
    }

    /// Composite applicability: mode restriction, language restriction, and
    /// the definition-level predicate.
    pub fn applicable(&self, cx: &Context<'_>) -> bool {
        self.applicability.eval(cx)
    }

    /// Gate for opening an asymmetric pair.
    pub fn allows_open(&self, cx: &Context<'_>) -> bool {
        self.open.eval(cx)
    }

    /// Gate for closing / skipping over an asymmetric pair.
    pub fn allows_close(&self, cx: &Context<'_>) -> bool {
        self.close.eval(cx)
    }

    /// Gate for the single action of a symmetric pair.
    pub fn allows_open_or_close(&self, cx: &Context<'_>) -> bool {
        self.open_or_close.eval(cx)
    }

    /// Gate for splitting a surrounding pair across lines.
    pub fn allows_enter(&self, cx: &Context<'_>) -> bool {
        self.enter.eval(cx)
    }

    /// Gate for collapsing a surrounding pair.
    pub fn allows_backspace(&self, cx: &Context<'_>) -> bool {
        self.backspace.eval(cx)
    }

    /// Gate for space-padding a surrounding pair.
    pub fn allows_space(&self, cx: &Context<'_>) -> bool {
        self.space.eval(cx)
    }
}

/// The trigger-indexed, priority-ordered collection of compiled rules.
///
/// Rules are indexed under their declaration key and, when different, under
/// the first character of their closing delimiter, so typing either end of a
/// pair routes to the same rule. Each per-key list is sorted by descending
/// priority with declaration order as the stable tie-break.
#[derive(Debug, Clone)]
pub struct PairSet {
    rules: Vec<PairRule>,
    by_trigger: HashMap<char, SmallVec<[usize; 4]>>,
    by_priority: Vec<usize>,
}

impl PairSet {
    /// Compile an ordered list of `(trigger key, definition)` entries.
    pub fn compile<I>(definitions: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = (char, PairSpec)>,
    {
        let mut rules = Vec::new();
        let mut by_trigger: HashMap<char, SmallVec<[usize; 4]>> = HashMap::new();

        for (key, spec) in definitions {
            let rule = compile_rule(key, spec)?;

            let close_first = rule.closing.chars().next();
            let id = rules.len();
            rules.push(rule);

            by_trigger.entry(key).or_default().push(id);
            if let Some(close_key) = close_first
                && close_key != key
            {
                by_trigger.entry(close_key).or_default().push(id);
            }
        }

        // Stable sorts: declaration order breaks priority ties.
        for ids in by_trigger.values_mut() {
            ids.sort_by_key(|&id| std::cmp::Reverse(rules[id].priority));
        }
        let mut by_priority: Vec<usize> = (0..rules.len()).collect();
        by_priority.sort_by_key(|&id| std::cmp::Reverse(rules[id].priority));

        Ok(Self {
            rules,
            by_trigger,
            by_priority,
        })
    }

    /// All compiled rules, in declaration order.
    pub fn rules(&self) -> &[PairRule] {
        &self.rules
    }

    /// Candidate rules for a typed character, highest priority first.
    pub fn candidates(&self, key: char) -> impl Iterator<Item = &PairRule> {
        self.by_trigger
            .get(&key)
            .into_iter()
            .flatten()
            .map(|&id| &self.rules[id])
    }

    /// All rules regardless of trigger, highest priority first. Used by the
    /// surrounding-pair searches (backspace, enter, space).
    pub fn rules_by_priority(&self) -> impl Iterator<Item = &PairRule> {
        self.by_priority.iter().map(|&id| &self.rules[id])
    }

    /// Every character that can trigger a rule — the set of keys the host
    /// should route through the engine.
    pub fn trigger_keys(&self) -> BTreeSet<char> {
        self.by_trigger.keys().copied().collect()
    }

    /// True if no rules are compiled in.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of compiled rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

impl Default for PairSet {
    /// The stock bracket-and-quote set: `()`, `[]`, `{}` with pairing
    /// suppressed directly before a word character, and `'`, `"`, `` ` ``
    /// with pairing additionally suppressed directly after one.
    fn default() -> Self {
        let defs = default_definitions();
        PairSet::compile(defs).expect("stock rule set compiles")
    }
}

fn default_definitions() -> Vec<(char, PairSpec)> {
    let mut defs: Vec<(char, PairSpec)> = [('(', ")"), ('[', "]"), ('{', "}")]
        .into_iter()
        .map(|(key, closing)| {
            let gate = Predicate::custom(|cx| !next_is_word(cx));
            (key, PairSpec::new(closing).open(gate))
        })
        .collect();

    for quote in ['\'', '"', '`'] {
        let gate = Predicate::custom(move |cx| {
            // Let skip-over through; only fresh insertion cares about the
            // surrounding word characters.
            cx.char_under_cursor() == Some(quote) || (!next_is_word(cx) && !prev_is_word(cx))
        });
        defs.push((quote, PairSpec::new(quote).open_or_close(gate)));
    }

    defs
}

fn next_is_word(cx: &Context<'_>) -> bool {
    cx.char_under_cursor().is_some_and(|c| c.is_alphanumeric())
}

fn prev_is_word(cx: &Context<'_>) -> bool {
    cx.before_text(None)
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric())
}

fn compile_rule(key: char, spec: PairSpec) -> Result<PairRule, CompileError> {
    let PairSpec {
        opening,
        closing,
        priority,
        languages,
        when,
        command_mode,
        actions,
    } = spec;

    let opening = opening.unwrap_or_else(|| key.to_string());
    if opening.is_empty() {
        return Err(CompileError::EmptyDelimiter {
            key,
            field: "opening",
        });
    }
    if closing.is_empty() {
        return Err(CompileError::EmptyDelimiter {
            key,
            field: "closing",
        });
    }
    if !opening.contains(key) && !closing.starts_with(key) {
        return Err(CompileError::TriggerNotInRule {
            key,
            opening,
            closing,
        });
    }

    let priority = priority.unwrap_or_else(|| {
        let base = opening.chars().count() + closing.chars().count();
        let conditional = if when.is_some() { 4 } else { 0 };
        (base + conditional) as i32
    });

    let mut applicability = Vec::new();
    if !command_mode {
        applicability.push(Predicate::InsertOnly);
    }
    if let Some(languages) = languages {
        applicability.push(Predicate::Language(languages));
    }
    if let Some(when) = when {
        applicability.push(when);
    }

    let gate = |gate: Option<ActionGate>| {
        gate.map(ActionGate::into_predicate)
            .unwrap_or(Predicate::Const(true))
    };

    Ok(PairRule {
        opening,
        closing,
        priority,
        applicability: Predicate::all(applicability),
        open: gate(actions.open),
        close: gate(actions.close),
        open_or_close: gate(actions.open_or_close),
        enter: gate(actions.enter),
        backspace: gate(actions.backspace),
        space: gate(actions.space),
    })
}
