//! Turns match details and player profiles into flat records.

use std::collections::BTreeSet;

use anyhow::{Result, anyhow};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::dto::MatchDto;
use crate::model::{MatchDetails, MatchId, Puuid};
use crate::pool::with_fetch_pool;
use crate::records::{GameRecord, ParticipantRecord, PlayerRecord};
use crate::riot_api::RiotApi;

pub trait MatchDetailSource: Sync {
    fn detail(&self, match_id: &MatchId) -> Option<MatchDto>;
}

impl MatchDetailSource for RiotApi {
    fn detail(&self, match_id: &MatchId) -> Option<MatchDto> {
        self.match_detail(match_id)
    }
}

pub fn game_record(detail: &MatchDto, potential_t0: bool) -> GameRecord {
    let first = detail.info.participants.first();
    GameRecord {
        match_id: detail.match_id().clone(),
        game_creation: detail.info.game_creation,
        game_duration: detail.info.game_duration,
        game_mode: detail.info.game_mode.clone(),
        queue_id: detail.info.queue_id,
        game_version: detail.info.game_version.clone(),
        game_ended_in_early_surrender: first.is_some_and(|p| p.game_ended_in_early_surrender),
        game_ended_in_surrender: first.is_some_and(|p| p.game_ended_in_surrender),
        team100_win: detail.team_win(100).unwrap_or(false),
        team200_win: detail.team_win(200).unwrap_or(false),
        potential_t0,
    }
}

pub fn participant_records(detail: &MatchDto) -> Vec<ParticipantRecord> {
    detail
        .info
        .participants
        .iter()
        .map(|p| ParticipantRecord {
            match_id: detail.match_id().clone(),
            puuid: p.puuid.clone(),
            team_id: p.team_id,
            champion_id: p.champion_id,
            champion_level: p.champ_level,
            kills: p.kills,
            deaths: p.deaths,
            assists: p.assists,
            individual_position: p.individual_position.clone(),
            team_position: p.team_position.clone(),
            lane: p.lane.clone(),
            role: p.role.clone(),
            killing_sprees: p.killing_sprees,
            longest_time_spent_living: p.longest_time_spent_living,
            objectives_stolen: p.objectives_stolen,
            summoner1_id: p.summoner1_id,
            summoner2_id: p.summoner2_id,
            vision_score: p.vision_score,
            total_time_spent_dead: p.total_time_spent_dead,
            win: p.win,
        })
        .collect()
}

/// Details fetched by [`fetch_details`].
#[derive(Debug, Default)]
pub struct DetailFetch {
    pub details: MatchDetails,
    pub failed: BTreeSet<MatchId>,
}

/// Fetches every id not already present in `known`.
pub fn fetch_details<'a, S: MatchDetailSource>(
    source: &S,
    ids: impl IntoIterator<Item = &'a MatchId>,
    known: &MatchDetails,
    parallelism: usize,
) -> DetailFetch {
    let wanted: BTreeSet<MatchId> = ids
        .into_iter()
        .filter(|id| !known.contains_key(*id))
        .cloned()
        .collect();
    let ordered: Vec<MatchId> = wanted.into_iter().collect();

    let results: Vec<(MatchId, Option<MatchDto>)> = with_fetch_pool(parallelism, || {
        ordered
            .par_iter()
            .map(|id| (id.clone(), source.detail(id)))
            .collect()
    });

    let mut fetch = DetailFetch::default();
    for (id, detail) in results {
        match detail {
            Some(detail) if detail.match_id() == &id => {
                fetch.details.insert(id, detail);
            }
            Some(detail) => {
                warn!(requested = %id, returned = %detail.match_id(), "detail for a different match");
                fetch.failed.insert(id);
            }
            None => {
                fetch.failed.insert(id);
            }
        }
    }
    info!(
        fetched = fetch.details.len(),
        failed = fetch.failed.len(),
        "match details fetched"
    );
    fetch
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializedGames {
    pub games: Vec<GameRecord>,
    pub participants: Vec<ParticipantRecord>,
}

/// Records for every selected match with a detail; ordered by match id.
pub fn materialize_games(
    details: &MatchDetails,
    selection: &BTreeSet<MatchId>,
    potential_t0: &BTreeSet<MatchId>,
) -> MaterializedGames {
    let mut out = MaterializedGames::default();
    for match_id in selection {
        let Some(detail) = details.get(match_id) else {
            continue;
        };
        out.games
            .push(game_record(detail, potential_t0.contains(match_id)));
        out.participants.extend(participant_records(detail));
    }
    out
}

/// Two-step exchange: puuid to encrypted summoner id, then league entries.
pub fn resolve_player(api: &RiotApi, puuid: &Puuid, queue_type: &str) -> Result<PlayerRecord> {
    let summoner = api
        .summoner_by_puuid(puuid)
        .ok_or_else(|| anyhow!("summoner lookup failed for {puuid}"))?;
    let entries = api
        .league_entries_by_summoner(&summoner.id)
        .ok_or_else(|| anyhow!("league lookup failed for {puuid}"))?;
    let entry = entries
        .iter()
        .find(|e| e.queue_type == queue_type)
        .ok_or_else(|| anyhow!("{puuid} has no {queue_type} entry"))?;
    Ok(PlayerRecord::from_entry(entry, puuid.clone()))
}

pub struct PlayerFetch {
    pub players: Vec<PlayerRecord>,
    pub errors: Vec<String>,
}

pub fn resolve_players(
    api: &RiotApi,
    puuids: &BTreeSet<Puuid>,
    queue_type: &str,
    parallelism: usize,
) -> PlayerFetch {
    let ordered: Vec<&Puuid> = puuids.iter().collect();
    let results: Vec<Result<PlayerRecord>> = with_fetch_pool(parallelism, || {
        ordered
            .par_iter()
            .map(|puuid| resolve_player(api, puuid, queue_type))
            .collect()
    });

    let mut players = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(player) => players.push(player),
            Err(err) => {
                warn!(error = %err, "player profile dropped");
                errors.push(err.to_string());
            }
        }
    }
    PlayerFetch { players, errors }
}
