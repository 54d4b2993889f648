//! Transition conditions.
//!
//! A [`SymbolVector`] holds one condition per tape. A condition is either a
//! literal symbol, which must equal the tape's current symbol and consumes it,
//! or the wildcard [`SENTINEL`], which accepts anything and leaves the tape
//! where it is.
//!
//! ```text
//! vector:  ( a , # , b )
//! tapes:     a   x   b      -> match, cursors move +1, +0, +1
//! tapes:     a   x   c      -> no match, no cursor moves
//! ```

use crate::error::{Error, Result};
use crate::tape::Tape;
use crate::{SENTINEL, StateId, Symbol};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolVector(Box<[Symbol]>);

impl SymbolVector {
    pub fn new(conditions: impl IntoIterator<Item = Symbol>) -> Self {
        SymbolVector(conditions.into_iter().collect())
    }

    /// One condition per character, e.g. `"a#b"`.
    pub fn parse(conditions: &str) -> Self {
        Self::new(conditions.chars())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn conditions(&self) -> &[Symbol] {
        &self.0
    }

    /// Literal (non-wildcard) symbols, in tape order.
    pub fn literals(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.0.iter().copied().filter(|&c| c != SENTINEL)
    }

    /// Reject a vector built for a different number of tapes.
    pub fn check_shape(&self, tape_count: usize) -> Result<()> {
        if self.len() != tape_count {
            return Err(Error::ShapeMismatch {
                subject: format!("vector {self}"),
                expected: tape_count,
                found: self.len(),
            });
        }
        Ok(())
    }

    fn accepts(condition: Symbol, current: Symbol) -> bool {
        condition == SENTINEL || condition == current
    }

    /// Check the vector against the tapes' current symbols without moving.
    pub fn matches(&self, tapes: &[Tape]) -> bool {
        self.len() == tapes.len()
            && self.0.iter().zip(tapes).all(|(&c, tape)| Self::accepts(c, tape.current_symbol()))
    }

    /// Match the vector and, only if every condition holds, advance each tape
    /// that carries a literal condition.
    ///
    /// On mismatch no tape moves.
    pub fn matches_and_consume(&self, tapes: &mut [Tape]) -> bool {
        if !self.matches(tapes) {
            return false;
        }
        for (&c, tape) in self.0.iter().zip(tapes.iter_mut()) {
            if c != SENTINEL {
                tape.advance();
            }
        }
        true
    }

    /// Positions-only form of [`matches_and_consume`](Self::matches_and_consume):
    /// read the shared words at `positions` and return the advanced cursor row,
    /// or `None` on mismatch. The input row is never modified.
    pub(crate) fn advance_positions(&self, tapes: &[Tape], positions: &[usize]) -> Option<Box<[usize]>> {
        if self.len() != tapes.len() || positions.len() != tapes.len() {
            return None;
        }
        let mut next = positions.to_vec();
        for (i, &c) in self.0.iter().enumerate() {
            if c == SENTINEL {
                continue;
            }
            if tapes[i].symbol_at(positions[i]) != c {
                return None;
            }
            next[i] += 1;
        }
        Some(next.into_boxed_slice())
    }
}

impl fmt::Display for SymbolVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{c}")?;
        }
        f.write_str(")")
    }
}

/// A directed edge `source --vector--> target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    source: StateId,
    vector: SymbolVector,
    target: StateId,
}

impl Transition {
    pub fn new(source: StateId, vector: SymbolVector, target: StateId) -> Self {
        Transition { source, vector, target }
    }

    pub fn source(&self) -> StateId {
        self.source
    }

    pub fn target(&self) -> StateId {
        self.target
    }

    pub fn vector(&self) -> &SymbolVector {
        &self.vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advanced(tape: &Tape) -> Tape {
        let mut tape = tape.clone();
        tape.advance();
        tape
    }

    #[test]
    fn matching_vector_consumes_literal_tapes() {
        let tape1 = advanced(&Tape::new("abc"));
        let tape2 = advanced(&Tape::new("bbc"));
        let mut tapes = vec![tape1, tape2];

        assert!(vector!['b', 'b'].matches_and_consume(&mut tapes));
        assert_eq!(tapes[0].position(), 2);
        assert_eq!(tapes[1].position(), 2);
    }

    #[test]
    fn mismatch_leaves_every_tape_in_place() {
        let mut tapes = vec![Tape::new("ab"), Tape::new("cd"), Tape::new("ef")];
        // first two conditions hold, the third does not
        assert!(!vector!['a', 'c', 'x'].matches_and_consume(&mut tapes));
        assert!(tapes.iter().all(|t| t.position() == 0));
    }

    #[test]
    fn wildcard_skips_without_moving() {
        let mut tapes = vec![Tape::new("a"), Tape::new("z")];
        assert!(vector!['a', SENTINEL].matches_and_consume(&mut tapes));
        assert_eq!(tapes[0].position(), 1);
        assert_eq!(tapes[1].position(), 0);
    }

    #[test]
    fn wildcard_matches_exhausted_tape_but_literal_does_not() {
        let mut tapes = vec![Tape::new("")];
        assert!(!vector!['a'].matches_and_consume(&mut tapes));
        assert!(vector![SENTINEL].matches_and_consume(&mut tapes));
        assert_eq!(tapes[0].position(), 0);
    }

    #[test]
    fn wrong_length_never_matches() {
        let mut tapes = vec![Tape::new("a")];
        assert!(!vector!['a', 'a'].matches_and_consume(&mut tapes));
        assert!(vector!['a', 'a'].check_shape(1).is_err());
        assert!(vector!['a'].check_shape(1).is_ok());
    }

    #[test]
    fn advance_positions_reads_shared_words() {
        let tapes = vec![Tape::new("ab"), Tape::new("b")];
        let next = vector!['b', 'b'].advance_positions(&tapes, &[1, 0]).unwrap();
        assert_eq!(&*next, &[2, 1]);
        assert!(vector!['b', 'b'].advance_positions(&tapes, &[0, 0]).is_none());
        assert!(vector!['b', 'b'].advance_positions(&tapes, &[2, 1]).is_none());
    }

    #[test]
    fn display_and_helpers() {
        let v = SymbolVector::parse("a#b");
        assert_eq!(v.to_string(), "(a,#,b)");
        assert_eq!(v.literals().collect::<String>(), "ab");
        assert_eq!(SymbolVector::parse("##").literals().count(), 0);
        assert!(vector![].is_empty());
    }
}
