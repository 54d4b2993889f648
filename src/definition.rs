//! Automaton definitions as the editing layer sees them.
//!
//! A [`Definition`] is plain data: named states with start/accept flags and
//! transition edges whose conditions are strings (one character per tape).
//! It is what gets edited, saved and loaded; [`Definition::build`] turns it
//! into an [`Automaton`] for searching.
//!
//! ## Text format
//!
//! ```text
//! // comments run to end of line
//! start: q0
//! accept: q1, q2
//! states: q3              // declare states that have no edges
//! q0 -> q1 : a#  b#       // two condition vectors on one edge
//! q1 -> q2 : #b
//! words: ab, b            // optional initial tapes; "" is the empty word
//! ```
//!
//! States are declared in order of first appearance.

use crate::automaton::Automaton;
use crate::error::{Error, Result};
use crate::vector::{SymbolVector, Transition};
use crate::SENTINEL;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDef {
    pub name: String,
    #[serde(default)]
    pub start: bool,
    #[serde(default)]
    pub accept: bool,
}

/// One drawn edge. Every entry of `vectors` becomes its own [`Transition`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDef {
    pub source: String,
    pub target: String,
    pub vectors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub states: Vec<StateDef>,
    #[serde(default)]
    pub transitions: Vec<TransitionDef>,
}

/// Output of [`Definition::parse`]: the automaton plus any `words:` line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDefinition {
    pub definition: Definition,
    pub words: Vec<String>,
}

impl Definition {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Builder -------------------------------------------------------------

    /// Declare a state (no flags).
    pub fn state(mut self, name: &str) -> Self {
        self.state_mut(name);
        self
    }

    /// Make `name` the only start state.
    pub fn start(mut self, name: &str) -> Self {
        self.set_start(name);
        self
    }

    pub fn accept(mut self, name: &str) -> Self {
        self.state_mut(name).accept = true;
        self
    }

    pub fn transition<V: Into<String>>(
        mut self,
        source: &str,
        target: &str,
        vectors: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add_transition(source, target, vectors.into_iter().map(Into::into).collect());
        self
    }

    // --- Editing -------------------------------------------------------------

    /// Look up a state, declaring it if absent.
    pub fn state_mut(&mut self, name: &str) -> &mut StateDef {
        let idx = match self.states.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.states.push(StateDef { name: name.to_string(), ..StateDef::default() });
                self.states.len() - 1
            }
        };
        &mut self.states[idx]
    }

    pub fn find_state(&self, name: &str) -> Option<&StateDef> {
        self.states.iter().find(|s| s.name == name)
    }

    pub fn set_start(&mut self, name: &str) {
        self.state_mut(name);
        for state in &mut self.states {
            state.start = state.name == name;
        }
    }

    pub fn add_transition(&mut self, source: &str, target: &str, vectors: Vec<String>) {
        self.state_mut(source);
        self.state_mut(target);
        self.transitions.push(TransitionDef { source: source.to_string(), target: target.to_string(), vectors });
    }

    /// Rename a state and every edge endpoint that names it.
    pub fn rename_state(&mut self, old: &str, new: &str) -> Result<()> {
        if self.find_state(old).is_none() {
            return Err(Error::UnknownState(old.to_string()));
        }
        if old == new {
            return Ok(());
        }
        if self.find_state(new).is_some() {
            return Err(Error::DuplicateState(new.to_string()));
        }
        for state in self.states.iter_mut().filter(|s| s.name == old) {
            state.name = new.to_string();
        }
        for tr in &mut self.transitions {
            if tr.source == old {
                tr.source = new.to_string();
            }
            if tr.target == old {
                tr.target = new.to_string();
            }
        }
        Ok(())
    }

    /// Label of the start state, if one is flagged (the last flag wins).
    pub fn start_state(&self) -> Option<&str> {
        self.states.iter().rev().find(|s| s.start).map(|s| s.name.as_str())
    }

    /// Tape count implied by the first condition vector, if there is one.
    pub fn tape_count(&self) -> Option<usize> {
        self.vectors().next().map(|v| v.chars().count())
    }

    /// Reject any vector that does not have exactly `tape_count` conditions.
    pub fn validate_shape(&self, tape_count: usize) -> Result<()> {
        for tr in &self.transitions {
            for vector in &tr.vectors {
                let found = vector.chars().count();
                if found != tape_count {
                    return Err(Error::ShapeMismatch {
                        subject: format!("vector {} on {} -> {}", SymbolVector::parse(vector), tr.source, tr.target),
                        expected: tape_count,
                        found,
                    });
                }
            }
        }
        Ok(())
    }

    /// Append a wildcard condition to every vector (a tape was added).
    pub fn push_column(&mut self) {
        for vector in self.vectors_mut() {
            vector.push(SENTINEL);
        }
    }

    /// Drop condition `column` from every vector (a tape was removed).
    pub fn remove_column(&mut self, column: usize) {
        for vector in self.vectors_mut() {
            *vector = vector.chars().enumerate().filter(|&(i, _)| i != column).map(|(_, c)| c).collect();
        }
    }

    /// Pad with wildcards or truncate so every vector has `tape_count` entries.
    pub fn resize_vectors(&mut self, tape_count: usize) {
        for vector in self.vectors_mut() {
            let mut chars: Vec<char> = vector.chars().take(tape_count).collect();
            chars.resize(tape_count, SENTINEL);
            *vector = chars.into_iter().collect();
        }
    }

    fn vectors(&self) -> impl Iterator<Item = &String> + '_ {
        self.transitions.iter().flat_map(|t| t.vectors.iter())
    }

    fn vectors_mut(&mut self) -> impl Iterator<Item = &mut String> + '_ {
        self.transitions.iter_mut().flat_map(|t| t.vectors.iter_mut())
    }

    // --- Building ------------------------------------------------------------

    /// Build a fresh automaton. State handles follow declaration order.
    pub fn build(&self) -> Result<Automaton> {
        let mut automaton = Automaton::new();
        for state in &self.states {
            automaton.add_state(state.name.as_str(), state.accept);
            if state.start {
                automaton.set_start(state.name.as_str());
            }
        }
        self.install_transitions(&mut automaton)?;
        Ok(automaton)
    }

    /// Replace `automaton`'s transition table with this definition's edges.
    ///
    /// Endpoints are resolved by label against the existing states. On error
    /// the table may be half rebuilt; callers work on a clone.
    pub(crate) fn install_transitions(&self, automaton: &mut Automaton) -> Result<()> {
        automaton.clear_transitions();
        for tr in &self.transitions {
            let source = automaton.state(&tr.source).ok_or_else(|| Error::UnknownState(tr.source.clone()))?;
            let target = automaton.state(&tr.target).ok_or_else(|| Error::UnknownState(tr.target.clone()))?;
            for vector in &tr.vectors {
                automaton.add_transition(Transition::new(source, SymbolVector::parse(vector), target))?;
            }
        }
        Ok(())
    }

    /// Copy accept flags onto an automaton built from an earlier version of
    /// this definition.
    pub(crate) fn apply_accepting(&self, automaton: &mut Automaton) -> Result<()> {
        for state in &self.states {
            let id = automaton.state(&state.name).ok_or_else(|| Error::UnknownState(state.name.clone()))?;
            automaton.set_accepting(id, state.accept)?;
        }
        Ok(())
    }

    // --- Text format ---------------------------------------------------------

    pub fn parse(text: &str) -> Result<ParsedDefinition> {
        let mut parsed = ParsedDefinition::default();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.split("//").next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let fail = |reason: String| Error::Definition { line: line_no, reason };

            if let Some(caps) = regex!(r"^(\S+?)\s*->\s*(\S+?)\s*:\s*(.*)$").captures(line) {
                let source = state_name(&caps[1]).map_err(&fail)?;
                let target = state_name(&caps[2]).map_err(&fail)?;
                let vectors: Vec<String> = caps[3].split_whitespace().map(str::to_string).collect();
                if vectors.is_empty() {
                    return Err(fail(format!("edge {source} -> {target} has no condition vectors")));
                }
                parsed.definition.add_transition(source, target, vectors);
            } else if let Some(caps) = regex!(r"^(start|accept|states|words)\s*:\s*(.*)$").captures(line) {
                let body = caps.get(2).map_or("", |m| m.as_str());
                match &caps[1] {
                    "words" => parsed.words.extend(parse_words(body).map_err(&fail)?),
                    key => {
                        let names: Vec<&str> =
                            body.split(|c: char| c == ',' || c.is_whitespace()).filter(|s| !s.is_empty()).collect();
                        for name in &names {
                            state_name(name).map_err(&fail)?;
                        }
                        match (key, names.as_slice()) {
                            ("start", [name]) => parsed.definition.set_start(name),
                            ("start", _) => return Err(fail("exactly one start state expected".to_string())),
                            ("accept", _) => names.iter().for_each(|name| parsed.definition.state_mut(name).accept = true),
                            _ => names.iter().for_each(|name| {
                                parsed.definition.state_mut(name);
                            }),
                        }
                    }
                }
            } else {
                return Err(fail(format!("cannot parse '{line}'")));
            }
        }

        Ok(parsed)
    }
}

fn state_name(name: &str) -> std::result::Result<&str, String> {
    if regex!(r"^[^\s,:]+$").is_match(name) && !name.contains("->") {
        Ok(name)
    } else {
        Err(format!("invalid state name '{name}'"))
    }
}

fn parse_words(body: &str) -> std::result::Result<Vec<String>, String> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    body.split(',')
        .map(str::trim)
        .map(|word| match word {
            "" => Err("empty entry in words list (write \"\" for the empty word)".to_string()),
            "\"\"" => Ok(String::new()),
            word => Ok(word.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
        // two tapes, copy check
        start: q0
        accept: q1
        q0 -> q0 : aa bb   // read matching symbols
        q0 -> q1 : ##
        words: ab, ab
    ";

    #[test]
    fn parses_sample() {
        let parsed = Definition::parse(SAMPLE).unwrap();
        let def = &parsed.definition;

        assert_eq!(def.states.len(), 2);
        assert!(def.find_state("q0").unwrap().start);
        assert!(def.find_state("q1").unwrap().accept);
        assert_eq!(def.transitions.len(), 2);
        assert_eq!(def.transitions[0].vectors, vec!["aa", "bb"]);
        assert_eq!(def.tape_count(), Some(2));
        assert_eq!(parsed.words, vec!["ab", "ab"]);
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let err = Definition::parse("start: q0\nq0 -> q1 :\n").unwrap_err();
        assert!(matches!(err, Error::Definition { line: 2, .. }));

        let err = Definition::parse("start: q0 q1").unwrap_err();
        assert!(matches!(err, Error::Definition { line: 1, .. }));

        let err = Definition::parse("\n\nwhat is this").unwrap_err();
        assert!(matches!(err, Error::Definition { line: 3, .. }));

        let err = Definition::parse("words: a,,b").unwrap_err();
        assert!(matches!(err, Error::Definition { line: 1, .. }));
    }

    #[test]
    fn empty_word_literal() {
        let parsed = Definition::parse("words: a, \"\"").unwrap();
        assert_eq!(parsed.words, vec!["a".to_string(), String::new()]);
    }

    #[test]
    fn states_line_declares_in_order() {
        let parsed = Definition::parse("states: z, y\nstart: x").unwrap();
        let names: Vec<&str> = parsed.definition.states.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["z", "y", "x"]);
    }

    #[test]
    fn build_resolves_labels_and_flags() {
        let automaton = Definition::parse(SAMPLE).unwrap().definition.build().unwrap();
        let q0 = automaton.state("q0").unwrap();
        let q1 = automaton.state("q1").unwrap();

        assert_eq!(automaton.start(), Some(q0));
        assert!(automaton.is_accepting(q1));
        assert_eq!(automaton.transitions_from(q0).len(), 3);
        assert_eq!(automaton.alphabet().iter().collect::<String>(), "ab");
    }

    #[test]
    fn build_rejects_unknown_endpoints() {
        let mut def = Definition::new().start("q0");
        def.transitions.push(TransitionDef { source: "q0".into(), target: "ghost".into(), vectors: vec!["a".into()] });
        assert!(matches!(def.build(), Err(Error::UnknownState(name)) if name == "ghost"));
    }

    #[test]
    fn start_builder_keeps_a_single_start() {
        let def = Definition::new().start("a").start("b");
        assert!(!def.find_state("a").unwrap().start);
        assert!(def.find_state("b").unwrap().start);
    }

    #[test]
    fn column_editing() {
        let mut def = Definition::new().transition("q0", "q1", ["ab", "#c"]);
        def.push_column();
        assert_eq!(def.transitions[0].vectors, vec!["ab#", "#c#"]);
        def.remove_column(0);
        assert_eq!(def.transitions[0].vectors, vec!["b#", "c#"]);
        def.resize_vectors(3);
        assert_eq!(def.transitions[0].vectors, vec!["b##", "c##"]);
        def.resize_vectors(1);
        assert_eq!(def.transitions[0].vectors, vec!["b", "c"]);
    }

    #[test]
    fn validate_shape_names_the_edge() {
        let def = Definition::new().transition("q0", "q1", ["ab", "a"]);
        let err = def.validate_shape(2).unwrap_err();
        match err {
            Error::ShapeMismatch { subject, expected, found } => {
                assert_eq!(subject, "vector (a) on q0 -> q1");
                assert_eq!((expected, found), (2, 1));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn json_round_trip_keeps_defaults_optional() {
        let def: Definition = serde_json::from_str(r#"{"states":[{"name":"q0"}]}"#).unwrap();
        assert_eq!(def.states[0], StateDef { name: "q0".into(), start: false, accept: false });
        assert!(def.transitions.is_empty());
    }
}
