//! Input tapes.
//!
//! A [`Tape`] is one immutable word plus a read cursor. The word is held in an
//! `Arc<[Symbol]>` so that cloning a tape (or a whole tape set) never copies
//! the text; the search engine only ever stores cursor values per
//! configuration and reads symbols through the shared words.
//!
//! ```text
//! symbols:   a   b   c
//! position:  0   1   2   3
//!                        ^ exhausted: current symbol is SENTINEL
//! ```

use crate::error::{Error, Result};
use crate::{SENTINEL, Symbol};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    symbols: Arc<[Symbol]>,
    position: usize,
}

impl Tape {
    /// Create a tape over `word` with the cursor at 0.
    pub fn new(word: &str) -> Self {
        Self::from_symbols(word.chars().collect::<Vec<_>>())
    }

    pub fn from_symbols(symbols: impl Into<Arc<[Symbol]>>) -> Self {
        Tape { symbols: symbols.into(), position: 0 }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// The word as a `String`.
    pub fn word(&self) -> String {
        self.symbols.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Symbol under the cursor, or [`SENTINEL`] once the word is consumed.
    pub fn current_symbol(&self) -> Symbol {
        self.symbol_at(self.position)
    }

    /// Symbol at an arbitrary cursor value, with the same end-of-tape rule as
    /// [`current_symbol`](Self::current_symbol).
    pub fn symbol_at(&self, position: usize) -> Symbol {
        self.symbols.get(position).copied().unwrap_or(SENTINEL)
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.symbols.len()
    }

    /// Move the cursor one symbol forward. No-op at end of tape.
    pub fn advance(&mut self) {
        if self.position < self.symbols.len() {
            self.position += 1;
        }
    }

    /// Restore the cursor to a recorded value.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.symbols.len() {
            return Err(Error::SeekOutOfRange { position, len: self.symbols.len() });
        }
        self.position = position;
        Ok(())
    }

    /// A copy of this tape with the cursor back at 0. Shares the word.
    pub fn rewound(&self) -> Tape {
        Tape { symbols: Arc::clone(&self.symbols), position: 0 }
    }
}

/// Restore every cursor in `tapes` from a row of positions.
///
/// All positions are checked before any cursor moves.
pub(crate) fn seek_all(tapes: &mut [Tape], positions: &[usize]) -> Result<()> {
    if positions.len() != tapes.len() {
        return Err(Error::ShapeMismatch {
            subject: "position row".to_string(),
            expected: tapes.len(),
            found: positions.len(),
        });
    }
    for (index, (tape, &position)) in tapes.iter().zip(positions).enumerate() {
        if position > tape.len() {
            return Err(Error::InvalidPosition { tape: index, position, len: tape.len() });
        }
    }
    for (tape, &position) in tapes.iter_mut().zip(positions) {
        tape.seek(position)?;
    }
    Ok(())
}
