//! Flat rows handed to the store.

use serde::Serialize;

use crate::dto::LeagueEntryDto;
use crate::model::{MatchId, Puuid};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRecord {
    pub match_id: MatchId,
    pub game_creation: i64,
    pub game_duration: i64,
    pub game_mode: String,
    pub queue_id: i32,
    pub game_version: String,
    pub game_ended_in_early_surrender: bool,
    pub game_ended_in_surrender: bool,
    pub team100_win: bool,
    pub team200_win: bool,
    pub potential_t0: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantRecord {
    pub match_id: MatchId,
    pub puuid: Puuid,
    pub team_id: i32,
    pub champion_id: i64,
    pub champion_level: i32,
    pub kills: i32,
    pub deaths: i32,
    pub assists: i32,
    pub individual_position: String,
    pub team_position: String,
    pub lane: String,
    pub role: String,
    pub killing_sprees: i32,
    pub longest_time_spent_living: i32,
    pub objectives_stolen: i32,
    pub summoner1_id: i32,
    pub summoner2_id: i32,
    pub vision_score: i32,
    pub total_time_spent_dead: i32,
    pub win: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRecord {
    pub puuid: Puuid,
    pub summoner_id: String,
    pub summoner_name: String,
    pub league_id: String,
    pub queue_type: String,
    pub tier: String,
    pub rank: String,
    pub league_points: i32,
    pub wins: i32,
    pub losses: i32,
    pub hot_streak: bool,
    pub veteran: bool,
    pub fresh_blood: bool,
    pub inactive: bool,
    /// Mini series as compact JSON.
    pub mini_series: String,
}

impl PlayerRecord {
    pub fn from_entry(entry: &LeagueEntryDto, puuid: Puuid) -> Self {
        Self {
            puuid,
            summoner_id: entry.summoner_id.clone(),
            summoner_name: entry.summoner_name.clone(),
            league_id: entry.league_id.clone(),
            queue_type: entry.queue_type.clone(),
            tier: entry.tier.clone(),
            rank: entry.rank.clone(),
            league_points: entry.league_points,
            wins: entry.wins,
            losses: entry.losses,
            hot_streak: entry.hot_streak,
            veteran: entry.veteran,
            fresh_blood: entry.fresh_blood,
            inactive: entry.inactive,
            mini_series: serde_json::to_string(&entry.mini_series).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChampionMasteryRecord {
    pub puuid: Puuid,
    pub champion_id: i64,
    pub champion_level: i32,
    pub champion_points: i64,
    pub last_play_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChampionRecord {
    pub champion_id: i64,
    pub champion_key: String,
    pub champion_name: String,
    pub title: String,
    pub tags: String,
    pub version: String,
}
