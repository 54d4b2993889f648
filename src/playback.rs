//! Step-by-step replay of a search, with live edits.
//!
//! A [`Session`] runs the search once, then hands the witness out one
//! configuration per [`Session::step`]. Tapes and transitions may be edited
//! while replaying. Every edit keeps the configurations already shown and
//! recomputes only what comes after them:
//!
//! ```text
//! history:   r0  r1  r2 | r3  r4  r5        current_step = 3
//!            └─ shown ─┘
//!                    │
//!                    │  edit: adjust the shown rows' columns,
//!                    │        search again with r2 as the root
//!                    v
//! history:   r0' r1' r2'| s3  s4             current_step = 3
//! ```
//!
//! `current_step` is never moved by an edit. Rows before it keep their
//! states; only the column touched by a tape edit changes (inserted as 0,
//! reset to 0, or dropped).
//!
//! Tape edits resynchronize immediately. Transition and accept-flag edits are
//! recorded in [`PendingEdits`] and applied by the next [`Session::step`] (or
//! an explicit [`Session::rebuild`]); a step refuses to advance while that
//! rebuild fails.

use crate::{Options, StateId};
use crate::automaton::Automaton;
use crate::definition::{Definition, TransitionDef};
use crate::engine::{Configuration, SearchEngine, SearchMetrics, SearchOutcome};
use crate::error::{Error, Result};
use crate::tape::{self, Tape};
use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Edits recorded during replay and not yet folded into the search.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PendingEdits: u8 {
        const TRANSITIONS = 1 << 0;
        const ACCEPTING   = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// No search yet. Edits only change the definition and the words.
    #[default]
    Editing,
    /// A history exists and has unshown configurations.
    Running,
    /// Every configuration of the history has been shown.
    Finished,
}

#[derive(Debug, Clone)]
pub struct Session {
    definition: Definition,
    automaton: Automaton,
    /// Cursors follow the last configuration shown.
    tapes: Vec<Tape>,
    history: Vec<Configuration>,
    /// State the latest search was rooted at.
    root: Option<StateId>,
    current_step: usize,
    mode: Mode,
    pending: PendingEdits,
    options: Options,
    outcome: Option<SearchOutcome>,
    metrics: Option<SearchMetrics>,
}

impl Session {
    /// Build the automaton and load one tape per word. No search runs yet.
    ///
    /// Words are not checked against the alphabet here; a foreign symbol
    /// simply never matches.
    pub fn new<I>(definition: Definition, words: I, options: Options) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let automaton = definition.build()?;
        let tapes = words.into_iter().map(|w| Tape::new(w.as_ref())).collect();
        Ok(Session {
            definition,
            automaton,
            tapes,
            history: Vec::new(),
            root: None,
            current_step: 0,
            mode: Mode::Editing,
            pending: PendingEdits::empty(),
            options,
            outcome: None,
            metrics: None,
        })
    }

    /// Reassemble a session from saved parts. Positions must already be
    /// validated against `tapes`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        definition: Definition,
        automaton: Automaton,
        tapes: Vec<Tape>,
        history: Vec<Configuration>,
        root: Option<StateId>,
        current_step: usize,
        mode: Mode,
        options: Options,
    ) -> Result<Self> {
        let current_step = current_step.min(history.len());
        let mode = match mode {
            _ if history.is_empty() => Mode::Editing,
            Mode::Editing => Mode::Running,
            _ if current_step == history.len() => Mode::Finished,
            _ => Mode::Running,
        };
        let mut session = Session {
            definition,
            automaton,
            tapes,
            history,
            root,
            current_step,
            mode,
            pending: PendingEdits::empty(),
            options,
            outcome: None,
            metrics: None,
        };
        let shown = session.shown_positions();
        tape::seek_all(&mut session.tapes, &shown)?;
        Ok(session)
    }

    // --- Accessors -----------------------------------------------------------

    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn tapes(&self) -> &[Tape] {
        &self.tapes
    }

    pub fn words(&self) -> Vec<String> {
        self.tapes.iter().map(Tape::word).collect()
    }

    pub fn history(&self) -> &[Configuration] {
        &self.history
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// State the latest search started from: the restore point of the last
    /// resync, or the start state.
    pub fn root(&self) -> Option<StateId> {
        self.root
    }

    /// The last configuration handed out by [`step`](Self::step).
    pub fn current(&self) -> Option<&Configuration> {
        self.current_step.checked_sub(1).and_then(|i| self.history.get(i))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn pending(&self) -> PendingEdits {
        self.pending
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Outcome of the latest search; `None` before the first one and after a
    /// restore.
    pub fn outcome(&self) -> Option<SearchOutcome> {
        self.outcome
    }

    pub fn metrics(&self) -> Option<&SearchMetrics> {
        self.metrics.as_ref()
    }

    /// The last history entry is accepting and has consumed every tape.
    pub fn is_accepted(&self) -> bool {
        self.history.last().is_some_and(|c| c.is_final(&self.automaton, &self.tapes))
    }

    // --- Replay --------------------------------------------------------------

    /// Search from the root and rewind the replay cursor.
    pub fn start(&mut self) -> Result<()> {
        let automaton = self.automaton_for(&self.definition)?;
        let tapes: Vec<Tape> = self.tapes.iter().map(Tape::rewound).collect();
        self.current_step = 0;
        self.commit(None, automaton, tapes, Vec::new(), "start")
    }

    /// Hand out the next configuration of the history.
    ///
    /// Pending transition or accept edits are applied first; if that fails
    /// the step is refused and the cursor stays put. Returns `None` once the
    /// history is used up, and before [`start`](Self::start).
    pub fn step(&mut self) -> Result<Option<Configuration>> {
        if self.mode == Mode::Editing {
            tracing::warn!("step refused: no search has run");
            return Ok(None);
        }
        if !self.pending.is_empty() {
            if let Err(err) = self.rebuild() {
                tracing::warn!(error = %err, step = self.current_step, "step refused: rebuild failed");
                return Err(err);
            }
        }

        let Some(config) = self.history.get(self.current_step).cloned() else {
            self.mode = Mode::Finished;
            return Ok(None);
        };
        tape::seek_all(&mut self.tapes, config.positions())?;
        self.current_step += 1;
        if self.current_step == self.history.len() {
            self.mode = Mode::Finished;
        }
        Ok(Some(config))
    }

    /// Back to step 0; the history is kept.
    pub fn rewind(&mut self) {
        self.current_step = 0;
        self.tapes = self.tapes.iter().map(Tape::rewound).collect();
        if self.mode == Mode::Finished && !self.history.is_empty() {
            self.mode = Mode::Running;
        }
    }

    /// Drop the history and pending edits and return to editing.
    pub fn restart(&mut self) -> Result<()> {
        let automaton = self.automaton_for(&self.definition)?;
        self.automaton = automaton;
        self.tapes = self.tapes.iter().map(Tape::rewound).collect();
        self.history.clear();
        self.root = None;
        self.current_step = 0;
        self.mode = Mode::Editing;
        self.pending = PendingEdits::empty();
        self.outcome = None;
        self.metrics = None;
        Ok(())
    }

    /// Apply pending transition and accept edits, re-searching the unshown
    /// suffix when a history exists.
    pub fn rebuild(&mut self) -> Result<()> {
        let automaton = self.automaton_for(&self.definition)?;
        if self.mode == Mode::Editing {
            self.automaton = automaton;
            self.pending = PendingEdits::empty();
            return Ok(());
        }
        let prefix = self.shown_prefix(Configuration::clone);
        self.commit(None, automaton, self.tapes.clone(), prefix, "rebuild")
    }

    // --- Tape edits ----------------------------------------------------------

    /// Append a tape. Every transition gets a wildcard condition for it.
    ///
    /// The word is checked against the alphabet first; a foreign symbol
    /// rejects the edit and nothing changes.
    pub fn add_tape(&mut self, word: &str) -> Result<()> {
        let mut definition = self.definition.clone();
        definition.push_column();
        let automaton = self.automaton_for(&definition)?;
        automaton.validate_word(word)?;

        let mut tapes = self.tapes.clone();
        tapes.push(Tape::new(word));
        if self.mode == Mode::Editing {
            return self.commit_editing(definition, automaton, tapes);
        }
        let prefix = self.shown_prefix(Configuration::with_pushed_column);
        self.commit(Some(definition), automaton, tapes, prefix, "add_tape")
    }

    /// Replace the word on tape `index`. Its cursor is reset to 0 in every
    /// shown configuration, since progress on the old word means nothing for
    /// the new one.
    pub fn change_tape(&mut self, index: usize, word: &str) -> Result<()> {
        if index >= self.tapes.len() {
            return Err(Error::TapeIndex { index, count: self.tapes.len() });
        }
        let automaton = self.automaton_for(&self.definition)?;
        automaton.validate_word(word)?;

        let mut tapes = self.tapes.clone();
        tapes[index] = Tape::new(word);
        if self.mode == Mode::Editing {
            return self.commit_editing(self.definition.clone(), automaton, tapes);
        }
        let prefix = self.shown_prefix(|c| c.with_reset_column(index));
        self.commit(None, automaton, tapes, prefix, "change_tape")
    }

    /// Remove tape `index`, or the last tape when `index` is `None` or out of
    /// range. Returns the removed word, or `None` when there are no tapes.
    pub fn remove_tape(&mut self, index: Option<usize>) -> Result<Option<String>> {
        let Some(last) = self.tapes.len().checked_sub(1) else {
            return Ok(None);
        };
        let index = index.filter(|&i| i <= last).unwrap_or(last);

        let mut definition = self.definition.clone();
        definition.remove_column(index);
        let automaton = self.automaton_for(&definition)?;
        let mut tapes = self.tapes.clone();
        let removed = tapes.remove(index).word();

        if self.mode == Mode::Editing {
            self.commit_editing(definition, automaton, tapes)?;
        } else {
            let prefix = self.shown_prefix(|c| c.without_column(index));
            self.commit(Some(definition), automaton, tapes, prefix, "remove_tape")?;
        }
        Ok(Some(removed))
    }

    /// Set the number of tapes. New tapes hold the empty word and every
    /// vector gets a wildcard for them; surplus tapes are dropped from the
    /// end together with their conditions.
    pub fn set_tape_count(&mut self, count: usize) -> Result<()> {
        let mut definition = self.definition.clone();
        definition.resize_vectors(count);
        let automaton = self.automaton_for(&definition)?;
        let mut tapes = self.tapes.clone();
        tapes.resize_with(count, || Tape::new(""));

        if self.mode == Mode::Editing {
            return self.commit_editing(definition, automaton, tapes);
        }
        let prefix = self.shown_prefix(|c| c.resized(count));
        self.commit(Some(definition), automaton, tapes, prefix, "set_tape_count")
    }

    // --- Automaton edits -----------------------------------------------------

    /// Swap in a new transition table.
    ///
    /// Every vector must have one condition per tape and every endpoint must
    /// be a declared state. During replay the change waits for the next step.
    pub fn replace_transitions(&mut self, transitions: Vec<TransitionDef>) -> Result<()> {
        let mut definition = self.definition.clone();
        definition.transitions = transitions;
        definition.validate_shape(self.tapes.len())?;
        for tr in &definition.transitions {
            for endpoint in [&tr.source, &tr.target] {
                if definition.find_state(endpoint).is_none() {
                    return Err(Error::UnknownState(endpoint.clone()));
                }
            }
        }
        self.stage(definition, PendingEdits::TRANSITIONS)
    }

    pub fn set_accepting(&mut self, state: &str, accept: bool) -> Result<()> {
        let mut definition = self.definition.clone();
        definition
            .states
            .iter_mut()
            .find(|s| s.name == state)
            .ok_or_else(|| Error::UnknownState(state.to_string()))?
            .accept = accept;
        self.stage(definition, PendingEdits::ACCEPTING)
    }

    /// Declare a state. It has no edges yet, so the search is unaffected.
    pub fn add_state(&mut self, name: &str) {
        self.definition.state_mut(name);
        self.automaton.add_state(name, false);
    }

    /// Relabel a state. Handles are unchanged, so the history stays valid.
    pub fn rename_state(&mut self, old: &str, new: &str) -> Result<()> {
        let mut definition = self.definition.clone();
        definition.rename_state(old, new)?;
        self.automaton.rename_state(old, new)?;
        self.definition = definition;
        Ok(())
    }

    fn stage(&mut self, definition: Definition, edit: PendingEdits) -> Result<()> {
        if self.mode == Mode::Editing {
            self.automaton = self.automaton_for(&definition)?;
            self.definition = definition;
        } else {
            self.definition = definition;
            self.pending |= edit;
            tracing::debug!(pending = ?self.pending, step = self.current_step, "edit staged");
        }
        Ok(())
    }

    // --- Internals -----------------------------------------------------------

    /// The current automaton brought in line with `definition`.
    ///
    /// Existing handles are kept and new states are appended, so history rows
    /// stay meaningful.
    fn automaton_for(&self, definition: &Definition) -> Result<Automaton> {
        let mut automaton = self.automaton.clone();
        for state in &definition.states {
            automaton.add_state(state.name.as_str(), false);
        }
        match definition.start_state() {
            Some(name) => {
                automaton.set_start(name);
            }
            None => automaton.clear_start(),
        }
        definition.apply_accepting(&mut automaton)?;
        definition.install_transitions(&mut automaton)?;
        Ok(automaton)
    }

    /// Shown rows, each passed through `adjust`.
    fn shown_prefix(&self, adjust: impl Fn(&Configuration) -> Configuration) -> Vec<Configuration> {
        self.history[..self.current_step].iter().map(adjust).collect()
    }

    fn shown_positions(&self) -> Vec<usize> {
        match self.current() {
            Some(config) => config.positions().to_vec(),
            None => vec![0; self.tapes.len()],
        }
    }

    fn commit_editing(&mut self, definition: Definition, automaton: Automaton, tapes: Vec<Tape>) -> Result<()> {
        self.definition = definition;
        self.automaton = automaton;
        self.tapes = tapes;
        Ok(())
    }

    /// Search with `prefix` as the kept rows (its last row is the new root;
    /// empty means the start state), then install everything at once.
    fn commit(
        &mut self,
        definition: Option<Definition>,
        automaton: Automaton,
        mut tapes: Vec<Tape>,
        prefix: Vec<Configuration>,
        reason: &'static str,
    ) -> Result<()> {
        let (root, restore) = match prefix.last() {
            Some(config) => (Some(config.state()), config.positions().to_vec()),
            None => (automaton.start(), vec![0; tapes.len()]),
        };
        let engine = if prefix.is_empty() {
            SearchEngine::new(&automaton, &tapes)?
        } else {
            SearchEngine::from_prefix(&automaton, &tapes, prefix)?
        };
        let result = engine.with_options(&self.options).run();
        tape::seek_all(&mut tapes, &restore)?;

        if let Some(definition) = definition {
            self.definition = definition;
        }
        self.automaton = automaton;
        self.tapes = tapes;
        self.history = result.history;
        self.root = root;
        self.outcome = Some(result.outcome);
        self.metrics = Some(result.metrics);
        self.pending = PendingEdits::empty();
        self.mode = if self.current_step < self.history.len() { Mode::Running } else { Mode::Finished };

        tracing::info!(
            reason,
            step = self.current_step,
            transitions = self.automaton.transition_count(),
            history = self.history.len(),
            outcome = ?self.outcome,
            "history resynchronized"
        );
        Ok(())
    }
}
