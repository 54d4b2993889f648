//! Breadth-first run search for multi-tape ("hyper") automata.
//!
//! An automaton reads several tapes at once: every transition carries a
//! [`SymbolVector`] with one condition per tape. Given an [`Automaton`] and one
//! word per tape, the [`SearchEngine`] looks for a run that consumes every tape
//! and ends in an accepting state, and returns the witness path so a caller can
//! replay it step by step. A [`Session`] hosts that replay and keeps the
//! already-shown prefix stable while tapes or transitions are edited.
//!
//! ```
//! use hypertape::{Definition, run};
//!
//! let definition = Definition::new().start("q0").accept("q1").transition("q0", "q1", ["a"]);
//! let report = run(&definition, &["a"]).unwrap();
//! assert!(report.accepted);
//! assert_eq!(report.history.len(), 2);
//! ```

#[macro_use]
mod macros;
mod api;
mod automaton;
mod definition;
mod engine;
mod error;
mod persist;
mod playback;
mod tape;
mod vector;

pub use api::{LayerSummary, Options, RunDetails, RunReport, RunReportVerbose, run, run_verbose_with, run_with, summarize};
pub use automaton::Automaton;
pub use definition::{Definition, ParsedDefinition, StateDef, TransitionDef};
pub use engine::{Configuration, LayerMetrics, Progress, SearchEngine, SearchMetrics, SearchOutcome, SearchResult};
pub use error::{Error, Result};
pub use persist::{HistoryRow, RunRecord, SavedRun};
pub use playback::{Mode, PendingEdits, Session};
pub use tape::Tape;
pub use vector::{SymbolVector, Transition};

use serde::{Deserialize, Serialize};

// --- Symbols and state handles ----------------------------------------------

/// A tape symbol.
pub type Symbol = char;

/// Reserved symbol. Read from a tape it means "exhausted"; used as a condition
/// it is the wildcard. Never a member of an alphabet.
pub const SENTINEL: Symbol = '#';

/// Handle of a state inside one [`Automaton`].
///
/// Handles are issued in insertion order and never change, so renaming a
/// state only touches its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(usize);

impl StateId {
    pub(crate) fn from_index(index: usize) -> Self {
        StateId(index)
    }

    /// Position of this state in its automaton's state table.
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
