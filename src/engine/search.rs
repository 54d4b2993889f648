//! Breadth-first configuration search.
//!
//! This module is the operational core of the engine:
//!
//! - Seed a root configuration and mark it visited.
//! - Expand the frontier one BFS layer at a time, matching each outgoing
//!   transition's vector against the configuration's cursor row.
//! - Deduplicate successors by `(state, positions)` so the finite space is
//!   never re-entered (see `configuration.rs`).
//! - Stop at the first dequeued configuration that is accepting with every
//!   tape consumed, or when the frontier empties.
//!
//! FIFO order makes the first accepting configuration found one with a
//! minimum number of transitions. Among transitions from the same source,
//! expansion follows the automaton's insertion order, which only decides
//! *which* shortest witness is returned.
//!
//! ## Layers
//!
//! ```text
//! depth 0   [root]
//!             │ run_layer()
//! depth 1   [c1, c2]          each layer dequeues exactly the nodes that
//!             │ run_layer()   were enqueued by the previous one
//! depth 2   [c3, c4, c5]
//! ```
//!
//! `run()` loops `run_layer()` to completion. Callers that need to stay
//! responsive drive `run_layer()` themselves.

use super::configuration::{Configuration, HistoryArena, NodeId};
use super::metrics::{LayerMetrics, SearchMetrics};
use crate::Options;
use crate::automaton::Automaton;
use crate::error::{Error, Result};
use crate::tape::Tape;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::time::Instant;

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// An accepting configuration with every tape consumed was reached.
    Accepted,
    /// The frontier emptied. Every reachable configuration was explored, so
    /// no accepting run exists.
    Exhausted,
    /// The expansion budget ran out first. Nothing is known about acceptance.
    Truncated,
}

impl SearchOutcome {
    pub fn is_accepted(self) -> bool {
        self == SearchOutcome::Accepted
    }

    /// `Accepted` or `Exhausted`.
    pub fn is_decided(self) -> bool {
        self != SearchOutcome::Truncated
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchOutcome::Accepted => "accepted",
            SearchOutcome::Exhausted => "rejected",
            SearchOutcome::Truncated => "undecided",
        })
    }
}

/// Result of one [`SearchEngine::run_layer`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Pending,
    Finished(SearchOutcome),
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub outcome: SearchOutcome,
    /// Witness from the first history entry to the terminal configuration:
    /// the accepting one, or the last one dequeued.
    pub history: Vec<Configuration>,
    pub metrics: SearchMetrics,
}

impl SearchResult {
    pub fn is_accepted(&self) -> bool {
        self.outcome.is_accepted()
    }
}

/// Breadth-first driver over `(state, positions)` configurations.
///
/// Usage: create with [`SearchEngine::new`] (fresh root) or
/// [`SearchEngine::from_prefix`] (resume from a replayed history), optionally
/// attach [`Options`], then call [`run`](Self::run).
///
/// ```text
/// new() ─> run_layer() ─> run_layer() ─> ... ─> Finished ─> SearchResult
///              └─ dequeue, accept check, expand, dedup
/// ```
#[derive(Debug)]
pub struct SearchEngine<'a> {
    automaton: &'a Automaton,
    tapes: &'a [Tape],
    options: Options,
    /// History entries before the root; prepended to every witness.
    prefix: Vec<Configuration>,
    arena: HistoryArena,
    frontier: VecDeque<NodeId>,
    visited: HashSet<Configuration>,
    last_dequeued: NodeId,
    depth: usize,
    finished: Option<(SearchOutcome, NodeId)>,
    metrics: SearchMetrics,
}

impl<'a> SearchEngine<'a> {
    /// Seed from `(start_state, all positions = 0)`.
    ///
    /// Fails with [`Error::NoRoot`] when no start state is set and with
    /// [`Error::ShapeMismatch`] when a vector does not fit the tape count.
    pub fn new(automaton: &'a Automaton, tapes: &'a [Tape]) -> Result<Self> {
        let start = automaton.start().ok_or(Error::NoRoot)?;
        Self::seeded(automaton, tapes, Vec::new(), Configuration::root(start, tapes.len()))
    }

    /// Seed from a restored history. The last entry of `prefix` is the root;
    /// the earlier entries are kept verbatim in front of the witness.
    pub fn from_prefix(automaton: &'a Automaton, tapes: &'a [Tape], mut prefix: Vec<Configuration>) -> Result<Self> {
        let root = prefix.pop().ok_or(Error::NoRoot)?;
        Self::seeded(automaton, tapes, prefix, root)
    }

    fn seeded(
        automaton: &'a Automaton,
        tapes: &'a [Tape],
        prefix: Vec<Configuration>,
        root: Configuration,
    ) -> Result<Self> {
        automaton.validate_shape(tapes.len())?;
        for (row, config) in prefix.iter().chain(std::iter::once(&root)).enumerate() {
            check_row(automaton, tapes, row, config)?;
        }

        let mut arena = HistoryArena::default();
        let root_id = arena.push(root.clone(), None);
        let mut visited = HashSet::new();
        visited.insert(root);

        Ok(SearchEngine {
            automaton,
            tapes,
            options: Options::default(),
            prefix,
            arena,
            frontier: VecDeque::from([root_id]),
            visited,
            last_dequeued: root_id,
            depth: 0,
            finished: None,
            metrics: SearchMetrics { visited: 1, peak_frontier: 1, ..SearchMetrics::default() },
        })
    }

    #[must_use]
    pub fn with_options(mut self, options: &Options) -> Self {
        self.options = options.clone();
        self
    }

    pub fn metrics(&self) -> &SearchMetrics {
        &self.metrics
    }

    /// Best witness so far: the path to the last dequeued configuration.
    pub fn witness(&self) -> Vec<Configuration> {
        let node = self.finished.map_or(self.last_dequeued, |(_, node)| node);
        let mut history = self.prefix.clone();
        history.extend(self.arena.path(node));
        history
    }

    /// Expand exactly one BFS layer.
    pub fn run_layer(&mut self) -> Progress {
        if let Some((outcome, _)) = self.finished {
            return Progress::Finished(outcome);
        }

        let started = Instant::now();
        let width = self.frontier.len();
        let mut layer = LayerMetrics { depth: self.depth, ..LayerMetrics::default() };

        for _ in 0..width {
            if self.options.max_expansions.is_some_and(|max| self.metrics.expanded >= max) {
                self.finished = Some((SearchOutcome::Truncated, self.last_dequeued));
                break;
            }
            let Some(node) = self.frontier.pop_front() else {
                break;
            };
            self.last_dequeued = node;
            self.metrics.expanded += 1;
            layer.expanded += 1;

            let current = self.arena.get(node).clone();
            if current.is_final(self.automaton, self.tapes) {
                self.finished = Some((SearchOutcome::Accepted, node));
                break;
            }
            layer.discovered += self.expand(node, &current);
        }

        if self.finished.is_none() && self.frontier.is_empty() {
            self.finished = Some((SearchOutcome::Exhausted, self.last_dequeued));
        }

        layer.duration = started.elapsed();
        self.metrics.total += layer.duration;
        tracing::debug!(
            depth = layer.depth,
            expanded = layer.expanded,
            discovered = layer.discovered,
            frontier = self.frontier.len(),
            "search layer done"
        );
        if self.options.collect_layers {
            self.metrics.layers.push(layer);
        }
        self.depth += 1;

        match self.finished {
            Some((outcome, node)) => {
                tracing::info!(
                    %outcome,
                    steps = self.arena.depth(node),
                    expanded = self.metrics.expanded,
                    visited = self.metrics.visited,
                    "search finished"
                );
                Progress::Finished(outcome)
            }
            None => Progress::Pending,
        }
    }

    /// Enqueue every unvisited successor of `current`; returns how many.
    fn expand(&mut self, node: NodeId, current: &Configuration) -> usize {
        let automaton = self.automaton;
        let mut discovered = 0;

        for transition in automaton.transitions_from(current.state()) {
            let Some(positions) = transition.vector().advance_positions(self.tapes, current.positions()) else {
                continue;
            };
            self.metrics.matched += 1;

            let next = Configuration::new(transition.target(), positions);
            if self.visited.contains(&next) {
                self.metrics.duplicates += 1;
                continue;
            }
            self.visited.insert(next.clone());
            let id = self.arena.push(next, Some(node));
            self.frontier.push_back(id);
            discovered += 1;
        }

        self.metrics.visited += discovered;
        self.metrics.peak_frontier = self.metrics.peak_frontier.max(self.frontier.len());
        discovered
    }

    /// Run to completion.
    pub fn run(mut self) -> SearchResult {
        let (outcome, node) = loop {
            self.run_layer();
            if let Some(finished) = self.finished {
                break finished;
            }
        };
        self.build_result(outcome, node)
    }

    /// Result of a search driven with [`run_layer`](Self::run_layer);
    /// `None` while it is still pending.
    pub fn into_result(self) -> Option<SearchResult> {
        let (outcome, node) = self.finished?;
        Some(self.build_result(outcome, node))
    }

    fn build_result(self, outcome: SearchOutcome, node: NodeId) -> SearchResult {
        let mut history = self.prefix;
        history.extend(self.arena.path(node));
        SearchResult { outcome, history, metrics: self.metrics }
    }

    /// Every configuration discovered so far, in discovery order.
    #[cfg(test)]
    pub(crate) fn discovered(&self) -> Vec<Configuration> {
        (0..self.arena.len()).map(|id| self.arena.get(id).clone()).collect()
    }
}

fn check_row(automaton: &Automaton, tapes: &[Tape], row: usize, config: &Configuration) -> Result<()> {
    if !automaton.contains(config.state()) {
        return Err(Error::UnknownState(config.state().to_string()));
    }
    if config.tape_count() != tapes.len() {
        return Err(Error::ShapeMismatch {
            subject: format!("history row {row}"),
            expected: tapes.len(),
            found: config.tape_count(),
        });
    }
    for (tape, (&position, t)) in config.positions().iter().zip(tapes).enumerate() {
        if position > t.len() {
            return Err(Error::InvalidPosition { tape, position, len: t.len() });
        }
    }
    Ok(())
}
