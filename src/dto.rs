//! Typed payloads returned by the Riot and Data Dragon endpoints.
//!
//! Every response goes through [`decode`], so a malformed payload becomes a
//! [`DecodeError`] at the boundary instead of a missing key further down.

use std::collections::{BTreeMap, BTreeSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::model::{MatchId, Puuid};

pub fn decode<T: DeserializeOwned>(what: &'static str, raw: &[u8]) -> Result<T, DecodeError> {
    let trimmed = raw.trim_ascii();
    if trimmed.is_empty() || trimmed == b"null" {
        return Err(DecodeError::Empty { what });
    }
    serde_json::from_slice(trimmed).map_err(|source| DecodeError::Json { what, source })
}

pub fn decode_match(raw: &[u8]) -> Result<MatchDto, DecodeError> {
    let detail: MatchDto = decode("match detail", raw)?;
    detail.validate()?;
    Ok(detail)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniSeriesDto {
    pub losses: i32,
    pub progress: String,
    pub target: i32,
    pub wins: i32,
}

impl Default for MiniSeriesDto {
    fn default() -> Self {
        Self {
            losses: 0,
            progress: "NNNNN".to_string(),
            target: 0,
            wins: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntryDto {
    pub league_id: String,
    pub summoner_id: String,
    #[serde(default)]
    pub summoner_name: String,
    #[serde(default)]
    pub puuid: Option<String>,
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
    #[serde(default)]
    pub mini_series: MiniSeriesDto,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerDto {
    /// Encrypted summoner id.
    pub id: String,
    pub puuid: String,
    #[serde(default)]
    pub summoner_level: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDto {
    pub metadata: MetadataDto,
    pub info: InfoDto,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDto {
    #[serde(default)]
    pub data_version: String,
    pub match_id: MatchId,
    pub participants: Vec<Puuid>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoDto {
    /// Epoch milliseconds.
    pub game_creation: i64,
    pub game_duration: i64,
    pub game_mode: String,
    #[serde(default)]
    pub game_version: String,
    pub queue_id: i32,
    pub participants: Vec<ParticipantDto>,
    pub teams: Vec<TeamDto>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub puuid: Puuid,
    pub team_id: i32,
    pub champion_id: i64,
    #[serde(default)]
    pub champion_name: String,
    pub champ_level: i32,
    pub kills: i32,
    pub deaths: i32,
    pub assists: i32,
    #[serde(default)]
    pub individual_position: String,
    #[serde(default)]
    pub team_position: String,
    #[serde(default)]
    pub lane: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub killing_sprees: i32,
    #[serde(default)]
    pub longest_time_spent_living: i32,
    #[serde(default)]
    pub objectives_stolen: i32,
    pub summoner1_id: i32,
    pub summoner2_id: i32,
    #[serde(default)]
    pub vision_score: i32,
    #[serde(default)]
    pub total_time_spent_dead: i32,
    #[serde(default)]
    pub game_ended_in_early_surrender: bool,
    #[serde(default)]
    pub game_ended_in_surrender: bool,
    pub win: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDto {
    pub team_id: i32,
    pub win: bool,
}

impl MatchDto {
    pub fn match_id(&self) -> &MatchId {
        &self.metadata.match_id
    }

    pub fn participant_puuids(&self) -> BTreeSet<Puuid> {
        self.metadata.participants.iter().cloned().collect()
    }

    pub fn team_win(&self, team_id: i32) -> Option<bool> {
        self.info
            .teams
            .iter()
            .find(|team| team.team_id == team_id)
            .map(|team| team.win)
    }

    fn validate(&self) -> Result<(), DecodeError> {
        let invalid = |reason: String| DecodeError::Invalid {
            what: "match detail",
            reason,
        };
        if self.metadata.match_id.as_str().trim().is_empty() {
            return Err(invalid("empty matchId".to_string()));
        }
        if self.info.participants.is_empty() {
            return Err(invalid(format!(
                "{} has no participants",
                self.metadata.match_id
            )));
        }
        for team_id in [100, 200] {
            if self.team_win(team_id).is_none() {
                return Err(invalid(format!(
                    "{} is missing team {team_id}",
                    self.metadata.match_id
                )));
            }
        }
        let listed = self.participant_puuids();
        if let Some(stray) = self
            .info
            .participants
            .iter()
            .find(|p| !listed.contains(&p.puuid))
        {
            return Err(invalid(format!(
                "{} participant {} missing from metadata",
                self.metadata.match_id, stray.puuid
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionMasteryDto {
    pub champion_id: i64,
    pub champion_level: i32,
    pub champion_points: i64,
    #[serde(default)]
    pub last_play_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChampionDataDto {
    pub version: String,
    pub data: BTreeMap<String, ChampionEntryDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChampionEntryDto {
    pub id: String,
    /// Numeric champion id as a string, e.g. `"266"`.
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn league_entry_without_mini_series_gets_default() {
        let raw = br#"{"leagueId":"l1","summonerId":"s1","summonerName":"x","queueType":"RANKED_SOLO_5x5",
            "tier":"MASTER","rank":"I","leaguePoints":120,"wins":40,"losses":30,
            "hotStreak":true,"veteran":false,"freshBlood":false,"inactive":false}"#;
        let entry: LeagueEntryDto = decode("league entry", raw).expect("valid entry");
        assert!(entry.hot_streak);
        assert_eq!(entry.mini_series, MiniSeriesDto::default());
        assert_eq!(entry.mini_series.progress, "NNNNN");
    }

    #[test]
    fn null_payload_is_empty_error() {
        let err = decode::<SummonerDto>("summoner", b" null ").unwrap_err();
        assert!(matches!(err, DecodeError::Empty { .. }));
    }

    #[test]
    fn missing_required_field_is_json_error() {
        let err = decode::<SummonerDto>("summoner", br#"{"id":"x"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Json { .. }));
    }
}
