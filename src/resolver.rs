//! Match reference resolution: each player's most recent match ids.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::model::{MatchId, Puuid};
use crate::pool::with_fetch_pool;
use crate::riot_api::RiotApi;

/// Source of a player's match history, newest first.
///
/// An empty page means the history is exhausted (or could not be fetched);
/// it is never an error.
pub trait MatchHistorySource: Sync {
    fn recent_matches(&self, puuid: &Puuid, count: usize, skip: usize) -> Vec<MatchId>;
}

impl MatchHistorySource for RiotApi {
    fn recent_matches(&self, puuid: &Puuid, count: usize, skip: usize) -> Vec<MatchId> {
        match self.match_ids(puuid, count, skip) {
            Some(mut ids) => {
                ids.truncate(count);
                ids
            }
            None => {
                debug!(%puuid, skip, "no match ids returned");
                Vec::new()
            }
        }
    }
}

/// First page of every player's history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentMatches {
    lists: BTreeMap<Puuid, Vec<MatchId>>,
}

impl RecentMatches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, puuid: Puuid, matches: Vec<MatchId>) {
        self.lists.insert(puuid, matches);
    }

    pub fn get(&self, puuid: &Puuid) -> Option<&[MatchId]> {
        self.lists.get(puuid).map(|list| list.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Puuid, &[MatchId])> {
        self.lists.iter().map(|(p, list)| (p, list.as_slice()))
    }

    pub fn players(&self) -> impl Iterator<Item = &Puuid> {
        self.lists.keys()
    }

    pub fn total_entries(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

impl FromIterator<(Puuid, Vec<MatchId>)> for RecentMatches {
    fn from_iter<I: IntoIterator<Item = (Puuid, Vec<MatchId>)>>(iter: I) -> Self {
        let mut out = RecentMatches::new();
        for (puuid, matches) in iter {
            out.insert(puuid, matches);
        }
        out
    }
}

/// Fetches the first `count` match ids for every player.
///
/// Players are fetched independently on the fetch pool; the lists are merged
/// afterwards, so the result does not depend on input order. Duplicated
/// players are fetched once.
pub fn collect_recent_matches<S: MatchHistorySource>(
    source: &S,
    players: &[Puuid],
    count: usize,
    parallelism: usize,
) -> RecentMatches {
    let mut unique = players.to_vec();
    unique.sort();
    unique.dedup();

    let fetched: Vec<(Puuid, Vec<MatchId>)> = with_fetch_pool(parallelism, || {
        unique
            .par_iter()
            .map(|puuid| {
                let mut matches = source.recent_matches(puuid, count, 0);
                matches.truncate(count);
                (puuid.clone(), matches)
            })
            .collect()
    });

    let empty = fetched.iter().filter(|(_, m)| m.is_empty()).count();
    let recent: RecentMatches = fetched.into_iter().collect();
    info!(
        players = recent.len(),
        empty_lists = empty,
        entries = recent.total_entries(),
        "recent match lists collected"
    );
    recent
}
