//! Snapshot boundary classification.
//!
//! Decides which listed matches may be a player's "current" game (t0
//! candidates) and which are already plain history, and demotes candidates
//! that turn out to be too old once their details are known.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::dto::MatchDto;
use crate::model::{MatchDetails, MatchId, Puuid};
use crate::resolver::RecentMatches;

/// Players known to have played each match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchRoster {
    players: BTreeMap<MatchId, BTreeSet<Puuid>>,
}

impl MatchRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, match_id: MatchId, puuid: Puuid) {
        self.players.entry(match_id).or_default().insert(puuid);
    }

    /// Merges the authoritative participant list from a match detail.
    pub fn absorb_detail(&mut self, detail: &MatchDto) {
        let entry = self.players.entry(detail.match_id().clone()).or_default();
        entry.extend(detail.participant_puuids());
    }

    pub fn players(&self, match_id: &MatchId) -> Option<&BTreeSet<Puuid>> {
        self.players.get(match_id)
    }

    pub fn contains(&self, match_id: &MatchId) -> bool {
        self.players.contains_key(match_id)
    }

    pub fn matches(&self) -> impl Iterator<Item = &MatchId> {
        self.players.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MatchId, &BTreeSet<Puuid>)> {
        self.players.iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Roster inferred from the players' own recent lists.
    pub players_of_a_game: MatchRoster,
    pub potential_t0: BTreeSet<MatchId>,
}

/// Entries of a newest-first list that may be a t0 candidate.
///
/// A list longer than `historical_memory` keeps its oldest
/// `historical_memory` entries as history; a shorter list is eligible as a
/// whole.
pub fn t0_eligible(list: &[MatchId], historical_memory: usize) -> &[MatchId] {
    if list.len() > historical_memory {
        &list[..list.len() - historical_memory]
    } else {
        list
    }
}

pub fn classify(recent: &RecentMatches, historical_memory: usize) -> Classification {
    let mut classification = Classification::default();
    for (puuid, list) in recent.iter() {
        for match_id in list {
            classification
                .players_of_a_game
                .insert(match_id.clone(), puuid.clone());
        }
        classification
            .potential_t0
            .extend(t0_eligible(list, historical_memory).iter().cloned());
    }
    info!(
        matches = classification.players_of_a_game.len(),
        potential_t0 = classification.potential_t0.len(),
        "classified recent matches"
    );
    classification
}

/// True when a match created at `game_creation_ms` is older than `staleness`.
pub fn is_stale(game_creation_ms: i64, now_ms: i64, staleness: chrono::Duration) -> bool {
    now_ms.saturating_sub(game_creation_ms) > staleness.num_milliseconds()
}

/// Candidates removed by [`Classification::demote_stale`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demotion {
    pub stale: BTreeSet<MatchId>,
    pub missing_detail: BTreeSet<MatchId>,
}

impl Classification {
    /// Drops candidates that are too old, or whose details could not be fetched.
    pub fn demote_stale(
        &mut self,
        details: &MatchDetails,
        now_ms: i64,
        staleness: chrono::Duration,
    ) -> Demotion {
        let mut demotion = Demotion::default();
        self.potential_t0.retain(|match_id| match details.get(match_id) {
            Some(detail) => {
                if is_stale(detail.info.game_creation, now_ms, staleness) {
                    debug!(%match_id, created = detail.info.game_creation, "demoting stale candidate");
                    demotion.stale.insert(match_id.clone());
                    false
                } else {
                    true
                }
            }
            None => {
                demotion.missing_detail.insert(match_id.clone());
                false
            }
        });
        info!(
            remaining = self.potential_t0.len(),
            stale = demotion.stale.len(),
            missing_detail = demotion.missing_detail.len(),
            "staleness filter applied"
        );
        demotion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<MatchId> {
        raw.iter().map(|s| MatchId::from(*s)).collect()
    }

    #[test]
    fn long_list_keeps_history_tail_out() {
        let list = ids(&["M7", "M6", "M5", "M4", "M3", "M2", "M1"]);
        assert_eq!(t0_eligible(&list, 5), &ids(&["M7", "M6"])[..]);
    }

    #[test]
    fn short_list_is_fully_eligible() {
        let list = ids(&["M3", "M2", "M1"]);
        assert_eq!(t0_eligible(&list, 5), &list[..]);
        assert_eq!(t0_eligible(&list, 3), &list[..]);
        assert!(t0_eligible(&[], 5).is_empty());
    }

    #[test]
    fn staleness_is_strict() {
        let day = 86_400_000;
        let staleness = chrono::Duration::days(12);
        let now = 100 * day;
        assert!(!is_stale(now - 12 * day, now, staleness));
        assert!(is_stale(now - 12 * day - 1, now, staleness));
        assert!(!is_stale(now + day, now, staleness));
    }
}
