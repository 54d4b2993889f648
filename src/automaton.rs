//! The automaton container.
//!
//! States are addressed by [`StateId`] handles issued once by
//! [`Automaton::add_state`]. Everything structural (accept set, start state,
//! transition buckets, transition targets) is keyed by handle; display labels
//! sit in a separate label table. Renaming a state is therefore a single swap
//! in that table and can never leave a transition pointing at a stale name.
//!
//! ```text
//! labels:       ["q0", "q1", "q2"]        index: {"q0"->#0, "q1"->#1, "q2"->#2}
//! accepting:    [false, true, false]
//! transitions:  #0: [(a,#)->#1, (#,b)->#2]
//!               #1: []
//!               #2: [(a,b)->#2]
//! ```

use crate::error::{Error, Result};
use crate::vector::Transition;
use crate::{StateId, Symbol};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct Automaton {
    labels: Vec<String>,
    index: HashMap<String, StateId>,
    accepting: Vec<bool>,
    start: Option<StateId>,
    alphabet: BTreeSet<Symbol>,
    /// Outgoing transitions per source, in insertion order.
    transitions: Vec<Vec<Transition>>,
}

impl Automaton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state, or return the existing handle if `label` is taken.
    ///
    /// `accept = true` marks the state accepting; an existing accept flag is
    /// never cleared here (use [`set_accepting`](Self::set_accepting)).
    pub fn add_state(&mut self, label: impl Into<String>, accept: bool) -> StateId {
        let label = label.into();
        if let Some(&id) = self.index.get(&label) {
            if accept {
                self.accepting[id.index()] = true;
            }
            return id;
        }
        let id = StateId::from_index(self.labels.len());
        self.index.insert(label.clone(), id);
        self.labels.push(label);
        self.accepting.push(accept);
        self.transitions.push(Vec::new());
        id
    }

    /// Make `label` the start state, adding it if absent.
    pub fn set_start(&mut self, label: impl Into<String>) -> StateId {
        let id = self.add_state(label, false);
        self.start = Some(id);
        id
    }

    pub fn clear_start(&mut self) {
        self.start = None;
    }

    pub fn set_accepting(&mut self, id: StateId, accept: bool) -> Result<()> {
        self.check_member(id)?;
        self.accepting[id.index()] = accept;
        Ok(())
    }

    /// Append a transition to its source's bucket.
    ///
    /// Both endpoints must be handles of this automaton. The vector's literal
    /// symbols join the alphabet.
    pub fn add_transition(&mut self, transition: Transition) -> Result<()> {
        self.check_member(transition.source())?;
        self.check_member(transition.target())?;
        self.alphabet.extend(transition.vector().literals());
        self.transitions[transition.source().index()].push(transition);
        Ok(())
    }

    /// Drop every transition. States, flags and alphabet stay.
    pub fn clear_transitions(&mut self) {
        for bucket in &mut self.transitions {
            bucket.clear();
        }
    }

    /// Give a state a new label.
    ///
    /// Handles do not change, so the state set, accept set, start state and
    /// every transition keep referring to the same state.
    pub fn rename_state(&mut self, old: &str, new: &str) -> Result<StateId> {
        let id = self.state(old).ok_or_else(|| Error::UnknownState(old.to_string()))?;
        if old == new {
            return Ok(id);
        }
        if self.index.contains_key(new) {
            return Err(Error::DuplicateState(new.to_string()));
        }
        self.index.remove(old);
        self.index.insert(new.to_string(), id);
        self.labels[id.index()] = new.to_string();
        Ok(id)
    }

    // --- Queries -------------------------------------------------------------

    pub fn state(&self, label: &str) -> Option<StateId> {
        self.index.get(label).copied()
    }

    pub fn label(&self, id: StateId) -> Option<&str> {
        self.labels.get(id.index()).map(String::as_str)
    }

    pub fn contains(&self, id: StateId) -> bool {
        id.index() < self.labels.len()
    }

    pub fn state_count(&self) -> usize {
        self.labels.len()
    }

    pub fn start(&self) -> Option<StateId> {
        self.start
    }

    pub fn is_accepting(&self, id: StateId) -> bool {
        self.accepting.get(id.index()).copied().unwrap_or(false)
    }

    pub fn alphabet(&self) -> &BTreeSet<Symbol> {
        &self.alphabet
    }

    /// Outgoing transitions of `id` in insertion order.
    pub fn transitions_from(&self, id: StateId) -> &[Transition] {
        self.transitions.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions.iter().flatten()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.iter().map(Vec::len).sum()
    }

    // --- Validation ----------------------------------------------------------

    /// Reject a word containing any symbol outside the alphabet.
    pub fn validate_word(&self, word: &str) -> Result<()> {
        match word.chars().enumerate().find(|(_, c)| !self.alphabet.contains(c)) {
            Some((index, symbol)) => Err(Error::Validation { symbol, index }),
            None => Ok(()),
        }
    }

    /// Reject the transition table unless every vector has `tape_count` entries.
    pub fn validate_shape(&self, tape_count: usize) -> Result<()> {
        self.transitions().try_for_each(|t| t.vector().check_shape(tape_count))
    }

    fn check_member(&self, id: StateId) -> Result<()> {
        if self.contains(id) { Ok(()) } else { Err(Error::UnknownState(id.to_string())) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SENTINEL, SymbolVector};

    fn two_state() -> (Automaton, StateId, StateId) {
        let mut automaton = Automaton::new();
        let q0 = automaton.set_start("q0");
        let q1 = automaton.add_state("q1", true);
        automaton.add_transition(Transition::new(q0, vector!['a', '#'], q1)).unwrap();
        automaton.add_transition(Transition::new(q1, vector!['b', 'b'], q0)).unwrap();
        (automaton, q0, q1)
    }

    #[test]
    fn empty_automaton() {
        let automaton = Automaton::new();
        assert_eq!(automaton.state_count(), 0);
        assert!(automaton.alphabet().is_empty());
        assert_eq!(automaton.transition_count(), 0);
        assert_eq!(automaton.start(), None);
    }

    #[test]
    fn add_state_is_idempotent_per_label() {
        let mut automaton = Automaton::new();
        let a = automaton.add_state("q0", false);
        let b = automaton.add_state("q0", true);
        assert_eq!(a, b);
        assert_eq!(automaton.state_count(), 1);
        assert!(automaton.is_accepting(a));
        automaton.add_state("q0", false);
        assert!(automaton.is_accepting(a));
    }

    #[test]
    fn set_start_adds_missing_state() {
        let mut automaton = Automaton::new();
        let q = automaton.set_start("s");
        assert_eq!(automaton.start(), Some(q));
        assert_eq!(automaton.label(q), Some("s"));
    }

    #[test]
    fn transitions_are_bucketed_in_order_and_feed_the_alphabet() {
        let (mut automaton, q0, q1) = two_state();
        automaton.add_transition(Transition::new(q0, vector!['c', 'c'], q0)).unwrap();

        let targets: Vec<StateId> = automaton.transitions_from(q0).iter().map(Transition::target).collect();
        assert_eq!(targets, vec![q1, q0]);
        assert_eq!(automaton.alphabet().iter().collect::<String>(), "abc");
        assert!(!automaton.alphabet().contains(&SENTINEL));
    }

    #[test]
    fn foreign_handles_are_rejected() {
        let (mut automaton, q0, _) = two_state();
        let stranger = StateId::from_index(9);
        let err = automaton.add_transition(Transition::new(q0, vector!['a', 'a'], stranger)).unwrap_err();
        assert!(matches!(err, Error::UnknownState(_)));
        assert_eq!(automaton.transition_count(), 2);
    }

    #[test]
    fn rename_keeps_structure() {
        let (mut automaton, q0, q1) = two_state();
        let id = automaton.rename_state("q1", "done").unwrap();
        assert_eq!(id, q1);
        assert_eq!(automaton.state("done"), Some(q1));
        assert_eq!(automaton.state("q1"), None);
        assert!(automaton.is_accepting(q1));
        assert_eq!(automaton.transitions_from(q0)[0].target(), q1);
        assert_eq!(automaton.transitions_from(q1)[0].source(), q1);

        automaton.rename_state("q0", "init").unwrap();
        assert_eq!(automaton.start().and_then(|s| automaton.label(s)), Some("init"));
    }

    #[test]
    fn rename_conflicts_and_unknowns() {
        let (mut automaton, _, _) = two_state();
        assert!(matches!(automaton.rename_state("q0", "q1"), Err(Error::DuplicateState(_))));
        assert!(matches!(automaton.rename_state("nope", "x"), Err(Error::UnknownState(_))));
        assert_eq!(automaton.label(StateId::from_index(0)), Some("q0"));
        assert!(automaton.rename_state("q0", "q0").is_ok());
    }

    #[test]
    fn handles_cover_the_whole_index_range() {
        let far = StateId::from_index(usize::MAX);
        assert_eq!(far.index(), usize::MAX);
        assert!(!Automaton::new().contains(far));
    }

    #[test]
    fn validate_word_reports_first_foreign_symbol() {
        let (automaton, _, _) = two_state();
        assert!(automaton.validate_word("abba").is_ok());
        assert!(automaton.validate_word("").is_ok());
        let err = automaton.validate_word("abxa").unwrap_err();
        assert!(matches!(err, Error::Validation { symbol: 'x', index: 2 }));
        assert!(automaton.validate_word("#").is_err());
    }

    #[test]
    fn validate_shape_checks_every_vector() {
        let (mut automaton, q0, _) = two_state();
        assert!(automaton.validate_shape(2).is_ok());
        automaton.add_transition(Transition::new(q0, SymbolVector::parse("a"), q0)).unwrap();
        let err = automaton.validate_shape(2).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 2, found: 1, .. }));
    }
}
