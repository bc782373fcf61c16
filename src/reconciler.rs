//! Gap detection and history-window recovery.
//!
//! A candidate match whose detail lists a participant that never reported it
//! in their own recent list is a gap. For each gap the participant's history
//! is paged until the match is located, then the matches right after it are
//! recovered.

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::classifier::Classification;
use crate::model::{HistoryWindow, MatchDetails, MatchId, Puuid, ReconciliationGap};
use crate::pool::with_fetch_pool;
use crate::resolver::MatchHistorySource;

/// Every (candidate, participant) pair the participant's own list does not confirm.
pub fn find_gaps(
    classification: &Classification,
    details: &MatchDetails,
) -> BTreeSet<ReconciliationGap> {
    let mut gaps = BTreeSet::new();
    for match_id in &classification.potential_t0 {
        let Some(detail) = details.get(match_id) else {
            continue;
        };
        let known = classification.players_of_a_game.players(match_id);
        for puuid in detail.participant_puuids() {
            if known.is_some_and(|players| players.contains(&puuid)) {
                continue;
            }
            gaps.insert(ReconciliationGap::new(match_id.clone(), puuid));
        }
    }
    info!(gaps = gaps.len(), "reconciliation gaps detected");
    gaps
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSearch {
    pub page_size: usize,
    pub historical_memory: usize,
    /// Hard cap on pages requested per gap.
    pub max_pages: usize,
}

/// Pages the gap player's history to recover the window after the target.
///
/// Stops as soon as the window holds `historical_memory` matches, a page
/// comes back empty, or `max_pages` pages have been requested, whichever
/// happens first.
pub fn recover_window<S: MatchHistorySource>(
    source: &S,
    gap: &ReconciliationGap,
    search: &WindowSearch,
) -> HistoryWindow {
    let mut window: Vec<MatchId> = Vec::with_capacity(search.historical_memory);
    let mut found = false;
    let mut skip = 0usize;
    let mut pages_fetched = 0usize;

    while pages_fetched < search.max_pages && window.len() < search.historical_memory {
        let page = source.recent_matches(&gap.puuid, search.page_size, skip);
        pages_fetched += 1;
        if page.is_empty() {
            break;
        }
        skip += search.page_size;

        let start = if found {
            0
        } else {
            match page.iter().position(|m| *m == gap.match_id) {
                Some(idx) => {
                    found = true;
                    idx + 1
                }
                None => continue,
            }
        };
        let room = search.historical_memory - window.len();
        window.extend(page[start..].iter().take(room).cloned());
    }

    if !found {
        warn!(
            match_id = %gap.match_id,
            puuid = %gap.puuid,
            pages = pages_fetched,
            "target match not located in player history"
        );
    } else if window.len() < search.historical_memory {
        debug!(
            match_id = %gap.match_id,
            puuid = %gap.puuid,
            recovered = window.len(),
            "history exhausted before window filled"
        );
    }

    HistoryWindow {
        gap: gap.clone(),
        found,
        matches: window,
        pages_fetched,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub gaps: BTreeSet<ReconciliationGap>,
    /// One window per gap, in gap order.
    pub windows: Vec<HistoryWindow>,
    pub games_to_retrieve: BTreeSet<MatchId>,
    /// Gap players whose target match was located.
    pub players_to_retrieve: BTreeSet<Puuid>,
}

impl Reconciliation {
    pub fn unlocated(&self) -> impl Iterator<Item = &ReconciliationGap> {
        self.windows.iter().filter(|w| !w.found).map(|w| &w.gap)
    }
}

/// Recovers a window for every gap; gaps are independent and run in parallel.
pub fn reconcile<S: MatchHistorySource>(
    source: &S,
    gaps: BTreeSet<ReconciliationGap>,
    search: &WindowSearch,
    parallelism: usize,
) -> Reconciliation {
    let ordered: Vec<ReconciliationGap> = gaps.iter().cloned().collect();
    let windows: Vec<HistoryWindow> = with_fetch_pool(parallelism, || {
        ordered
            .par_iter()
            .map(|gap| recover_window(source, gap, search))
            .collect()
    });

    let mut games_to_retrieve = BTreeSet::new();
    let mut players_to_retrieve = BTreeSet::new();
    for window in &windows {
        if !window.found {
            continue;
        }
        players_to_retrieve.insert(window.gap.puuid.clone());
        games_to_retrieve.extend(window.matches.iter().cloned());
    }

    let reconciliation = Reconciliation {
        gaps,
        windows,
        games_to_retrieve,
        players_to_retrieve,
    };
    info!(
        gaps = reconciliation.gaps.len(),
        unlocated = reconciliation.unlocated().count(),
        games = reconciliation.games_to_retrieve.len(),
        players = reconciliation.players_to_retrieve.len(),
        "reconciliation finished"
    );
    reconciliation
}
