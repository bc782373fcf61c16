use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dto::MatchDto;

/// Stable player identifier (Riot `puuid`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Puuid(String);

impl Puuid {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Puuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Puuid {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Puuid {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Globally unique match identifier, e.g. `EUW1_6234567890`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for MatchId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Full match details fetched during a run, keyed by match id.
pub type MatchDetails = BTreeMap<MatchId, MatchDto>;

/// A participant of a candidate match whose own recent list does not contain it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReconciliationGap {
    pub match_id: MatchId,
    pub puuid: Puuid,
}

impl ReconciliationGap {
    pub fn new(match_id: MatchId, puuid: Puuid) -> Self {
        Self { match_id, puuid }
    }
}

/// Matches recovered immediately after a gap's target in the player's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryWindow {
    pub gap: ReconciliationGap,
    /// Whether the target match was located in the player's history.
    pub found: bool,
    /// Older matches following the target, newest first.
    pub matches: Vec<MatchId>,
    pub pages_fetched: usize,
}

/// Where a match sits in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchState {
    Candidate,
    ConfirmedHistorical,
    StaleDemoted,
    Dropped,
    Materialized,
}

impl MatchState {
    /// Legal first state for a match that has not been seen yet.
    pub fn can_enter(self) -> bool {
        matches!(
            self,
            MatchState::Candidate | MatchState::ConfirmedHistorical | MatchState::Materialized
        )
    }

    /// A candidate leaves through `ConfirmedHistorical` or `StaleDemoted`, or
    /// straight to `Materialized` when it keeps its t0 flag.
    pub fn can_advance_to(self, next: MatchState) -> bool {
        use MatchState::*;
        match (self, next) {
            (Candidate, ConfirmedHistorical | StaleDemoted | Dropped | Materialized) => true,
            (ConfirmedHistorical, Dropped | Materialized) => true,
            (StaleDemoted, Dropped | Materialized) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, MatchState::Dropped | MatchState::Materialized)
    }
}

/// Per-match state transitions observed during a run.
#[derive(Debug, Clone, Default)]
pub struct MatchLedger {
    states: BTreeMap<MatchId, Vec<MatchState>>,
}

impl MatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `next` for `match_id`; illegal transitions are ignored and return false.
    pub fn advance(&mut self, match_id: &MatchId, next: MatchState) -> bool {
        match self.states.get_mut(match_id) {
            None => {
                if !next.can_enter() {
                    return false;
                }
                self.states.insert(match_id.clone(), vec![next]);
                true
            }
            Some(path) => {
                let Some(current) = path.last().copied() else {
                    path.push(next);
                    return true;
                };
                if !current.can_advance_to(next) {
                    return false;
                }
                path.push(next);
                true
            }
        }
    }

    pub fn state(&self, match_id: &MatchId) -> Option<MatchState> {
        self.states.get(match_id).and_then(|path| path.last().copied())
    }

    pub fn history(&self, match_id: &MatchId) -> &[MatchState] {
        self.states
            .get(match_id)
            .map(|path| path.as_slice())
            .unwrap_or(&[])
    }

    pub fn was_candidate(&self, match_id: &MatchId) -> bool {
        self.history(match_id).first() == Some(&MatchState::Candidate)
    }

    pub fn count_in(&self, state: MatchState) -> usize {
        self.states
            .values()
            .filter(|path| path.last() == Some(&state))
            .count()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
