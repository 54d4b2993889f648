use crate::Symbol;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while building, editing, searching or
/// persisting a run.
///
/// A search that explores every configuration without accepting is not an
/// error; it is reported through [`SearchOutcome`](crate::SearchOutcome).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A word contains a symbol outside the automaton's alphabet.
    #[error("symbol '{symbol}' at index {index} is not in the alphabet")]
    Validation {
        /// The foreign symbol.
        symbol: Symbol,
        /// Its index in the word.
        index: usize,
    },

    /// A condition vector or history row does not have one entry per tape.
    #[error("{subject} has {found} entries but there are {expected} tapes")]
    ShapeMismatch {
        /// What was checked, e.g. `vector (a,#)` or `history row 3`.
        subject: String,
        /// Current tape count.
        expected: usize,
        /// Entries found.
        found: usize,
    },

    /// No start state is set, so the search has no root.
    #[error("no start state is set; the search has no root")]
    NoRoot,

    /// A label or handle does not name a state of this automaton.
    #[error("unknown state '{0}'")]
    UnknownState(String),

    /// A rename would give two states the same label.
    #[error("a state named '{0}' already exists")]
    DuplicateState(String),

    /// A cursor value lies outside its tape.
    #[error("position {position} is outside tape {tape} of length {len}")]
    InvalidPosition {
        /// Tape index.
        tape: usize,
        /// Requested cursor value.
        position: usize,
        /// Tape length.
        len: usize,
    },

    /// A single tape was asked to move its cursor past the end.
    #[error("position {position} is past the end of a tape of length {len}")]
    SeekOutOfRange {
        /// Requested cursor value.
        position: usize,
        /// Tape length.
        len: usize,
    },

    /// A saved root state does not occur in the saved history.
    #[error("root state '{0}' does not appear in the saved history")]
    RootMismatch(String),

    /// A tape index is out of range.
    #[error("tape index {index} is out of range ({count} tapes)")]
    TapeIndex {
        /// Requested index.
        index: usize,
        /// Current tape count.
        count: usize,
    },

    /// The text definition could not be parsed.
    #[error("definition line {line}: {reason}")]
    Definition {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A saved run could not be encoded or decoded.
    #[error("saved run: {0}")]
    Persistence(#[from] serde_json::Error),
}
