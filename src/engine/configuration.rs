//! Search graph nodes and their history.
//!
//! A [`Configuration`] is one node of the search graph: a state plus one
//! cursor value per tape. Its identity is exactly `(state, positions)`. The
//! path that reached it is *not* part of identity, which is what lets the
//! visited set collapse different paths that arrive at the same point.
//!
//! ## History storage
//!
//! Paths are not copied into every node. The [`HistoryArena`] is an
//! append-only log where each entry stores its configuration and the index of
//! its parent:
//!
//! ```text
//! idx  config          parent
//! 0    (q0, [0, 0])    -
//! 1    (q1, [1, 0])    0
//! 2    (q0, [0, 1])    0
//! 3    (q2, [1, 1])    1
//!
//! path(3) = [(q0,[0,0]), (q1,[1,0]), (q2,[1,1])]
//! ```
//!
//! Expansion therefore allocates one cursor row per successor and one arena
//! entry, never a copy of the path or of the words.

use crate::automaton::Automaton;
use crate::tape::Tape;
use crate::StateId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Configuration {
    state: StateId,
    positions: Box<[usize]>,
}

impl Configuration {
    pub fn new(state: StateId, positions: impl Into<Box<[usize]>>) -> Self {
        Configuration { state, positions: positions.into() }
    }

    /// All cursors at 0.
    pub fn root(state: StateId, tape_count: usize) -> Self {
        Self::new(state, vec![0; tape_count])
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn tape_count(&self) -> usize {
        self.positions.len()
    }

    /// Every cursor sits at the end of its tape. Vacuously true with no tapes.
    pub fn consumed_all(&self, tapes: &[Tape]) -> bool {
        self.positions.len() == tapes.len() && self.positions.iter().zip(tapes).all(|(&p, t)| p == t.len())
    }

    /// Accepting state and every tape consumed.
    pub fn is_final(&self, automaton: &Automaton, tapes: &[Tape]) -> bool {
        automaton.is_accepting(self.state) && self.consumed_all(tapes)
    }

    // Column edits used when tapes are added, replaced or removed mid-replay.

    pub(crate) fn with_pushed_column(&self) -> Self {
        let mut positions = self.positions.to_vec();
        positions.push(0);
        Self::new(self.state, positions)
    }

    pub(crate) fn without_column(&self, column: usize) -> Self {
        let positions: Vec<usize> =
            self.positions.iter().enumerate().filter(|&(i, _)| i != column).map(|(_, &p)| p).collect();
        Self::new(self.state, positions)
    }

    /// Pad with 0 or truncate to `tape_count` columns.
    pub(crate) fn resized(&self, tape_count: usize) -> Self {
        let mut positions = self.positions.to_vec();
        positions.resize(tape_count, 0);
        Self::new(self.state, positions)
    }

    pub(crate) fn with_reset_column(&self, column: usize) -> Self {
        let mut positions = self.positions.to_vec();
        if let Some(p) = positions.get_mut(column) {
            *p = 0;
        }
        Self::new(self.state, positions)
    }
}

/// Index of an entry in a [`HistoryArena`].
pub(crate) type NodeId = usize;

#[derive(Debug)]
struct Entry {
    config: Configuration,
    parent: Option<NodeId>,
    depth: usize,
}

/// Append-only log of discovered configurations with parent links.
#[derive(Debug, Default)]
pub(crate) struct HistoryArena {
    entries: Vec<Entry>,
}

impl HistoryArena {
    pub(crate) fn push(&mut self, config: Configuration, parent: Option<NodeId>) -> NodeId {
        let depth = parent.map_or(0, |p| self.entries[p].depth + 1);
        self.entries.push(Entry { config, parent, depth });
        self.entries.len() - 1
    }

    pub(crate) fn get(&self, id: NodeId) -> &Configuration {
        &self.entries[id].config
    }

    pub(crate) fn depth(&self, id: NodeId) -> usize {
        self.entries[id].depth
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Configurations from the arena root to `id`, inclusive.
    pub(crate) fn path(&self, id: NodeId) -> Vec<Configuration> {
        let mut path = Vec::with_capacity(self.entries[id].depth + 1);
        let mut cursor = Some(id);
        while let Some(idx) = cursor {
            path.push(self.entries[idx].config.clone());
            cursor = self.entries[idx].parent;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn q(n: usize) -> StateId {
        StateId::from_index(n)
    }

    #[test]
    fn identity_ignores_how_we_got_here() {
        let mut arena = HistoryArena::default();
        let root = arena.push(Configuration::root(q(0), 1), None);
        let a = arena.push(Configuration::new(q(1), vec![1]), Some(root));
        let b = arena.push(Configuration::new(q(2), vec![1]), Some(root));
        let via_a = arena.push(Configuration::new(q(3), vec![1]), Some(a));
        let via_b = arena.push(Configuration::new(q(3), vec![1]), Some(b));

        assert_eq!(arena.get(via_a), arena.get(via_b));
        assert_ne!(arena.path(via_a), arena.path(via_b));

        let visited: HashSet<Configuration> = [arena.get(via_a).clone(), arena.get(via_b).clone()].into();
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn path_walks_parents_in_order() {
        let mut arena = HistoryArena::default();
        let root = arena.push(Configuration::root(q(0), 2), None);
        let mid = arena.push(Configuration::new(q(1), vec![1, 0]), Some(root));
        let leaf = arena.push(Configuration::new(q(2), vec![1, 1]), Some(mid));

        let states: Vec<StateId> = arena.path(leaf).iter().map(Configuration::state).collect();
        assert_eq!(states, vec![q(0), q(1), q(2)]);
        assert_eq!(arena.depth(leaf), 2);
        assert_eq!(arena.path(root).len(), 1);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn consumed_all_compares_against_tape_lengths() {
        let tapes = vec![Tape::new("ab"), Tape::new("")];
        assert!(Configuration::new(q(0), vec![2, 0]).consumed_all(&tapes));
        assert!(!Configuration::new(q(0), vec![1, 0]).consumed_all(&tapes));
        assert!(Configuration::root(q(0), 0).consumed_all(&[]));
    }

    #[test]
    fn column_edits() {
        let c = Configuration::new(q(1), vec![3, 1, 2]);
        assert_eq!(c.with_pushed_column().positions(), &[3, 1, 2, 0]);
        assert_eq!(c.without_column(1).positions(), &[3, 2]);
        assert_eq!(c.with_reset_column(0).positions(), &[0, 1, 2]);
        assert_eq!(c.with_reset_column(7), c);
        assert_eq!(c.without_column(0).state(), q(1));
    }
}
