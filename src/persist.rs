//! Saving and restoring runs as JSON.
//!
//! A run is fully described by its words, the root state and the history;
//! everything else (replay cursor, mode, timestamp) is optional and defaults
//! on load. The automaton is rebuilt from the [`Definition`] saved next to
//! it, so the search can always be picked up again.
//!
//! History rows are flat arrays, state label first:
//!
//! ```text
//! ["q0", 0, 0]
//! ["q1", 1, 0]
//! ```

use crate::Options;
use crate::automaton::Automaton;
use crate::definition::Definition;
use crate::engine::Configuration;
use crate::error::{Error, Result};
use crate::playback::{Mode, Session};
use crate::tape::Tape;
use chrono::{DateTime, Utc};
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One history entry by label: `[state, tape1_position, tape2_position, ...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub state: String,
    pub positions: Vec<usize>,
}

impl HistoryRow {
    pub fn new(state: impl Into<String>, positions: Vec<usize>) -> Self {
        HistoryRow { state: state.into(), positions }
    }

    pub fn from_configuration(automaton: &Automaton, config: &Configuration) -> Self {
        let state = automaton.label(config.state()).map_or_else(|| config.state().to_string(), str::to_string);
        HistoryRow { state, positions: config.positions().to_vec() }
    }

    /// Resolve the label and check the row against `tapes`.
    pub fn to_configuration(&self, automaton: &Automaton, tapes: &[Tape], row: usize) -> Result<Configuration> {
        let state = automaton.state(&self.state).ok_or_else(|| Error::UnknownState(self.state.clone()))?;
        if self.positions.len() != tapes.len() {
            return Err(Error::ShapeMismatch {
                subject: format!("history row {row}"),
                expected: tapes.len(),
                found: self.positions.len(),
            });
        }
        for (tape, (&position, t)) in self.positions.iter().zip(tapes).enumerate() {
            if position > t.len() {
                return Err(Error::InvalidPosition { tape, position, len: t.len() });
            }
        }
        Ok(Configuration::new(state, self.positions.clone()))
    }
}

impl Serialize for HistoryRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.positions.len() + 1))?;
        seq.serialize_element(&self.state)?;
        for position in &self.positions {
            seq.serialize_element(position)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for HistoryRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = HistoryRow;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an array of a state label followed by tape positions")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<HistoryRow, A::Error> {
                let state: String = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let mut positions = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(position) = seq.next_element::<usize>()? {
                    positions.push(position);
                }
                Ok(HistoryRow { state, positions })
            }
        }

        deserializer.deserialize_seq(RowVisitor)
    }
}

/// The state of one run, by label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub words: Vec<String>,
    /// Label of the state the latest search started from. After a resync
    /// this is the restore row's state, not necessarily the first row's.
    pub root_state: String,
    pub history: Vec<HistoryRow>,
    #[serde(default)]
    pub current_step: usize,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

/// A definition plus a run over it, as written by `--save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRun {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub definition: Definition,
    pub run: RunRecord,
}

impl SavedRun {
    pub fn from_session(session: &Session, description: impl Into<String>) -> Self {
        SavedRun { description: description.into(), definition: session.definition().clone(), run: session.record() }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn into_session(self, options: Options) -> Result<Session> {
        Session::restore(self.definition, self.run, options)
    }
}

impl Session {
    /// Snapshot the run for saving.
    pub fn record(&self) -> RunRecord {
        let automaton = self.automaton();
        let root_state = self
            .root()
            .and_then(|id| automaton.label(id))
            .or_else(|| self.definition().start_state())
            .unwrap_or_default()
            .to_string();
        RunRecord {
            words: self.words(),
            root_state,
            history: self.history().iter().map(|c| HistoryRow::from_configuration(automaton, c)).collect(),
            current_step: self.current_step(),
            mode: self.mode(),
            saved_at: Some(Utc::now()),
        }
    }

    /// Rebuild a session from `definition` and a saved run.
    ///
    /// Labels must name states of the definition and rows must have one
    /// position per word. A non-empty root must be the state of some history
    /// row. The replay cursor is clamped to the history.
    pub fn restore(definition: Definition, record: RunRecord, options: Options) -> Result<Session> {
        let automaton = definition.build()?;
        let tapes: Vec<Tape> = record.words.iter().map(|w| Tape::new(w)).collect();

        let history = record
            .history
            .iter()
            .enumerate()
            .map(|(row, entry)| entry.to_configuration(&automaton, &tapes, row))
            .collect::<Result<Vec<_>>>()?;
        let root = match record.root_state.as_str() {
            "" => None,
            label => {
                let id = automaton.state(label).ok_or_else(|| Error::UnknownState(label.to_string()))?;
                if !history.is_empty() && !history.iter().any(|c| c.state() == id) {
                    return Err(Error::RootMismatch(label.to_string()));
                }
                Some(id)
            }
        };

        tracing::info!(
            words = tapes.len(),
            history = history.len(),
            step = record.current_step,
            "run restored"
        );
        Session::from_parts(definition, automaton, tapes, history, root, record.current_step, record.mode, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransitionDef;

    fn definition() -> Definition {
        Definition::new().start("q0").accept("q1").transition("q0", "q1", ["a#"])
    }

    #[test]
    fn rows_are_flat_arrays() {
        let row = HistoryRow::new("q0", vec![0, 1]);
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"["q0",0,1]"#);
        assert_eq!(serde_json::from_str::<HistoryRow>(r#"["q1"]"#).unwrap(), HistoryRow::new("q1", vec![]));
        assert!(serde_json::from_str::<HistoryRow>("[]").is_err());
        assert!(serde_json::from_str::<HistoryRow>(r#"["q0",-1]"#).is_err());
    }

    #[test]
    fn saved_run_survives_json() {
        let mut session = Session::new(definition(), ["a", ""], Options::default()).unwrap();
        session.start().unwrap();
        session.step().unwrap();

        let saved = SavedRun::from_session(&session, "copy check");
        let json = saved.to_json().unwrap();
        assert!(json.contains(r#""q1","#));
        let loaded = SavedRun::from_json(&json).unwrap();
        assert_eq!(loaded, saved);

        let restored = loaded.into_session(Options::default()).unwrap();
        assert_eq!(restored.history(), session.history());
        assert_eq!(restored.current_step(), 1);
        assert_eq!(restored.mode(), Mode::Running);
        assert_eq!(restored.words(), vec!["a", ""]);
        assert!(restored.is_accepted());
    }

    #[test]
    fn only_words_root_and_history_are_required() {
        let json = r#"{"words": ["a", ""], "root_state": "q0", "history": [["q0", 0, 0], ["q1", 1, 0]]}"#;
        let record: RunRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.current_step, 0);
        assert_eq!(record.mode, Mode::Editing);
        assert_eq!(record.saved_at, None);

        let session = Session::restore(definition(), record, Options::default()).unwrap();
        assert_eq!(session.mode(), Mode::Running);
        assert!(session.is_accepted());

        let missing = r#"{"words": [], "history": []}"#;
        assert!(matches!(SavedRun::from_json(missing), Err(Error::Persistence(_))));
    }

    #[test]
    fn restore_rejects_foreign_rows() {
        let record = |history: Vec<HistoryRow>| RunRecord {
            words: vec!["a".into(), String::new()],
            root_state: "q0".into(),
            history,
            current_step: 0,
            mode: Mode::Running,
            saved_at: None,
        };

        let ghost = record(vec![HistoryRow::new("ghost", vec![0, 0])]);
        assert!(matches!(Session::restore(definition(), ghost, Options::default()), Err(Error::UnknownState(_))));

        let narrow = record(vec![HistoryRow::new("q0", vec![0])]);
        assert!(matches!(
            Session::restore(definition(), narrow, Options::default()),
            Err(Error::ShapeMismatch { expected: 2, found: 1, .. })
        ));

        let far = record(vec![HistoryRow::new("q0", vec![3, 0])]);
        assert!(matches!(
            Session::restore(definition(), far, Options::default()),
            Err(Error::InvalidPosition { tape: 0, position: 3, len: 1 })
        ));

        let mut bad_root = record(vec![]);
        bad_root.root_state = "nowhere".into();
        assert!(matches!(Session::restore(definition(), bad_root, Options::default()), Err(Error::UnknownState(_))));
    }

    #[test]
    fn record_names_the_latest_search_root() {
        let branching = Definition::new()
            .start("q0")
            .accept("q2")
            .accept("q3")
            .transition("q0", "q1", ["a"])
            .transition("q1", "q2", ["b"])
            .transition("q1", "q3", ["c"]);
        let mut session = Session::new(branching, ["ab"], Options::default()).unwrap();
        assert_eq!(session.record().root_state, "q0");
        session.start().unwrap();
        session.step().unwrap();
        session.step().unwrap();

        // The resync restarts from the second shown row.
        session.change_tape(0, "ac").unwrap();
        let record = session.record();
        assert_eq!(record.root_state, "q1");
        assert_eq!(record.history[0].state, "q0");

        let restored = Session::restore(session.definition().clone(), record, Options::default()).unwrap();
        assert_eq!(restored.root(), session.root());
        assert_eq!(restored.record().root_state, "q1");
    }

    #[test]
    fn restore_rejects_a_root_outside_the_history() {
        let record = RunRecord {
            words: vec!["a".into(), String::new()],
            root_state: "q1".into(),
            history: vec![HistoryRow::new("q0", vec![0, 0])],
            current_step: 0,
            mode: Mode::Running,
            saved_at: None,
        };
        let err = Session::restore(definition(), record, Options::default()).unwrap_err();
        assert!(matches!(err, Error::RootMismatch(ref name) if name == "q1"));
    }

    #[test]
    fn restored_cursor_is_clamped_and_tapes_follow_it() {
        let record = RunRecord {
            words: vec!["a".into(), String::new()],
            root_state: "q0".into(),
            history: vec![HistoryRow::new("q0", vec![0, 0]), HistoryRow::new("q1", vec![1, 0])],
            current_step: 7,
            mode: Mode::Running,
            saved_at: None,
        };
        let session = Session::restore(definition(), record, Options::default()).unwrap();
        assert_eq!(session.current_step(), 2);
        assert_eq!(session.mode(), Mode::Finished);
        assert_eq!(session.tapes()[0].position(), 1);
    }

    #[test]
    fn step_refuses_when_the_rebuild_has_no_root() {
        let no_start = Definition::new().accept("q1").transition("q0", "q1", ["a"]);
        let record = RunRecord {
            words: vec!["a".into()],
            root_state: "q0".into(),
            history: vec![HistoryRow::new("q0", vec![0])],
            current_step: 0,
            mode: Mode::Running,
            saved_at: None,
        };
        let mut session = Session::restore(no_start, record, Options::default()).unwrap();
        let same = vec![TransitionDef { source: "q0".into(), target: "q1".into(), vectors: vec!["a".into()] }];
        session.replace_transitions(same).unwrap();

        assert!(matches!(session.step(), Err(Error::NoRoot)));
        assert_eq!(session.current_step(), 0);
        assert!(!session.pending().is_empty());
    }
}
