//! Configuration search engine.
//!
//! This module is the entry point for the breadth-first run search. It is
//! split into focused submodules under `src/engine/` while keeping public
//! paths flat (`crate::SearchEngine`, `crate::Configuration`).
//!
//! ## How the parts work together
//!
//! ```text
//! Automaton + tapes ──┐
//!                     │  SearchEngine::new / from_prefix    (search.rs)
//!                     └──────────────┬──────────────
//!                                    │  seed root, mark visited
//!                                    v
//!                       SearchEngine::run_layer (search.rs)
//!                         - dequeue one BFS layer
//!                         - accept check (state + all tapes consumed)
//!                         - expand via SymbolVector on cursor rows
//!                         - dedup via Configuration identity
//!                                    │
//!                                    v
//!                       HistoryArena::path (configuration.rs)
//!                         - witness from root to terminal node
//!                                    │
//!                                    v
//!                              SearchResult
//! ```
//!
//! The configuration space is finite (at most `|states| * prod(len_i + 1)`
//! distinct `(state, positions)` pairs) and every pair is enqueued at most
//! once, so the loop always terminates.
//!
//! ## Responsibilities by module
//!
//! - `configuration.rs`: `Configuration` identity and the append-only history
//!   arena that stores parent links instead of per-node paths.
//! - `search.rs`: frontier, visited set, layer expansion, outcomes.
//! - `metrics.rs`: counters and per-layer timings for a run.
//!
//! ## Debugging
//!
//! The engine emits `tracing` events under `hypertape::engine`: one `debug`
//! event per layer and one `info` event per finished search. Set
//! `HYPERTAPE_LOG=hypertape=debug` to see them from the CLI.

#[path = "engine/configuration.rs"]
mod configuration;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/search.rs"]
mod search;


pub use configuration::Configuration;
pub use metrics::{LayerMetrics, SearchMetrics};
pub use search::{Progress, SearchEngine, SearchOutcome, SearchResult};
