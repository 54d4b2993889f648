use crate::engine::SearchOutcome;
use crate::error::Result;
use crate::persist::HistoryRow;
use crate::{Definition, Session};
use std::time::Duration;

/// Options that affect the search.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Stop after this many configurations have been dequeued and report
    /// [`SearchOutcome::Truncated`]. `None` searches the whole space.
    pub max_expansions: Option<usize>,
    /// Record timing and counts for every BFS layer.
    pub collect_layers: bool,
}

/// Result from [`run`] and [`run_with`].
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One word per tape.
    pub words: Vec<String>,
    /// Witness rows, root first.
    pub history: Vec<HistoryRow>,
    /// `None` when no search has run (see [`summarize`]).
    pub outcome: Option<SearchOutcome>,
    /// Last row is accepting with every tape consumed.
    pub accepted: bool,
    /// Time spent searching.
    pub elapsed: Duration,
}

/// A compact per-layer trace.
#[derive(Debug, Clone)]
pub struct LayerSummary {
    pub depth: usize,
    pub duration: Duration,
    pub expanded: usize,
    pub discovered: usize,
}

/// Additional details returned by [`run_verbose_with`].
#[derive(Debug, Clone)]
pub struct RunDetails {
    pub total: Duration,
    pub layers: Vec<LayerSummary>,
    pub expanded: usize,
    pub matched: usize,
    pub duplicates: usize,
    pub visited: usize,
    pub peak_frontier: usize,
    /// `|states| * prod(len_i + 1)`: no search can visit more configurations.
    pub state_bound: usize,
}

/// Result from [`run_verbose_with`].
#[derive(Debug, Clone)]
pub struct RunReportVerbose {
    pub words: Vec<String>,
    pub history: Vec<HistoryRow>,
    pub outcome: Option<SearchOutcome>,
    pub accepted: bool,
    pub elapsed: Duration,
    pub details: RunDetails,
}

/// Search `definition` over `words` with default [`Options`].
///
/// # Example
/// ```
/// use hypertape::{Definition, SearchOutcome, run};
///
/// let definition = Definition::new().start("q0").accept("q1").transition("q0", "q1", ["a"]);
/// let report = run(&definition, &["b"]).unwrap();
/// assert_eq!(report.outcome, Some(SearchOutcome::Exhausted));
/// assert!(!report.accepted);
/// ```
pub fn run<S: AsRef<str>>(definition: &Definition, words: &[S]) -> Result<RunReport> {
    run_with(definition, words, &Options::default())
}

/// Search `definition` over `words` with the provided `options`.
pub fn run_with<S: AsRef<str>>(definition: &Definition, words: &[S], options: &Options) -> Result<RunReport> {
    let session = started(definition, words, options.clone())?;
    Ok(summarize(&session))
}

/// Search and return per-layer traces and counters as well.
///
/// Layer collection is switched on regardless of `options.collect_layers`.
pub fn run_verbose_with<S: AsRef<str>>(
    definition: &Definition,
    words: &[S],
    options: &Options,
) -> Result<RunReportVerbose> {
    let options = Options { collect_layers: true, ..options.clone() };
    let session = started(definition, words, options)?;
    let report = summarize(&session);

    let metrics = session.metrics().cloned().unwrap_or_default();
    let details = RunDetails {
        total: metrics.total,
        layers: metrics
            .layers
            .iter()
            .map(|l| LayerSummary {
                depth: l.depth,
                duration: l.duration,
                expanded: l.expanded,
                discovered: l.discovered,
            })
            .collect(),
        expanded: metrics.expanded,
        matched: metrics.matched,
        duplicates: metrics.duplicates,
        visited: metrics.visited,
        peak_frontier: metrics.peak_frontier,
        state_bound: state_bound(&session),
    };

    Ok(RunReportVerbose {
        words: report.words,
        history: report.history,
        outcome: report.outcome,
        accepted: report.accepted,
        elapsed: report.elapsed,
        details,
    })
}

/// Report on a session's current history.
pub fn summarize(session: &Session) -> RunReport {
    let automaton = session.automaton();
    RunReport {
        words: session.words(),
        history: session.history().iter().map(|c| HistoryRow::from_configuration(automaton, c)).collect(),
        outcome: session.outcome(),
        accepted: session.is_accepted(),
        elapsed: session.metrics().map_or(Duration::ZERO, |m| m.total),
    }
}

fn started<S: AsRef<str>>(definition: &Definition, words: &[S], options: Options) -> Result<Session> {
    let mut session = Session::new(definition.clone(), words, options)?;
    session.start()?;
    Ok(session)
}

fn state_bound(session: &Session) -> usize {
    session
        .tapes()
        .iter()
        .fold(session.automaton().state_count(), |bound, tape| bound.saturating_mul(tape.len() + 1))
}
