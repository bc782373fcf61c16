use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::BaseLinks;
use crate::dto::{
    self, ChampionDataDto, ChampionMasteryDto, LeagueEntryDto, MatchDto, SummonerDto,
};
use crate::error::DecodeError;
use crate::gateway::RequestGateway;
use crate::model::{MatchId, Puuid};

/// Request context shared by every step: gateway, endpoint links and headers.
pub struct RiotApi {
    gateway: RequestGateway,
    links: BaseLinks,
    headers: Vec<(String, String)>,
    match_queue: Option<u32>,
}

impl RiotApi {
    pub fn new(
        gateway: RequestGateway,
        links: BaseLinks,
        headers: Vec<(String, String)>,
        match_queue: Option<u32>,
    ) -> Self {
        Self {
            gateway,
            links,
            headers,
            match_queue,
        }
    }

    pub fn league_page(
        &self,
        queue_type: &str,
        tier: &str,
        division: &str,
        page: u32,
    ) -> Option<Vec<LeagueEntryDto>> {
        let url = format!(
            "{}{queue_type}/{tier}/{division}?page={page}",
            self.links.league_exp_v4
        );
        self.get_json("league entries", &url)
    }

    pub fn summoner_by_id(&self, summoner_id: &str) -> Option<SummonerDto> {
        let url = format!("{}{summoner_id}", self.links.summoner_v4);
        self.get_json("summoner", &url)
    }

    pub fn summoner_by_puuid(&self, puuid: &Puuid) -> Option<SummonerDto> {
        let url = format!("{}{puuid}", self.links.summoner_v4_by_puuid);
        self.get_json("summoner", &url)
    }

    pub fn league_entries_by_summoner(&self, summoner_id: &str) -> Option<Vec<LeagueEntryDto>> {
        let url = format!("{}{summoner_id}", self.links.league_v4_by_summoner);
        self.get_json("league entries", &url)
    }

    /// Newest-first match ids, `count` of them starting `skip` back.
    pub fn match_ids(&self, puuid: &Puuid, count: usize, skip: usize) -> Option<Vec<MatchId>> {
        self.get_json("match ids", &self.match_ids_url(puuid, count, skip))
    }

    pub fn match_ids_url(&self, puuid: &Puuid, count: usize, skip: usize) -> String {
        let mut url = format!(
            "{}{puuid}/ids?start={skip}&count={count}",
            self.links.match_by_puuid
        );
        if let Some(queue) = self.match_queue {
            url.push_str(&format!("&queue={queue}"));
        }
        url
    }

    pub fn match_detail(&self, match_id: &MatchId) -> Option<MatchDto> {
        let url = format!("{}{match_id}", self.links.match_details);
        let body = self.gateway.fetch(&url, &self.headers)?;
        self.keep_decoded(&url, dto::decode_match(&body))
    }

    pub fn champion_mastery(&self, puuid: &Puuid, champion_id: i64) -> Option<ChampionMasteryDto> {
        let url = format!(
            "{}{puuid}/by-champion/{champion_id}",
            self.links.champion_mastery_v4
        );
        self.get_json("champion mastery", &url)
    }

    pub fn ddragon_versions(&self) -> Option<Vec<String>> {
        self.get_json("versions", &self.links.ddragon_versions)
    }

    pub fn ddragon_champions(&self, version: &str) -> Option<ChampionDataDto> {
        let url = self.links.ddragon_champions.replace("{version}", version);
        self.get_json("champion data", &url)
    }

    fn get_json<T: DeserializeOwned>(&self, what: &'static str, url: &str) -> Option<T> {
        let body = self.gateway.fetch(url, &self.headers)?;
        self.keep_decoded(url, dto::decode(what, &body))
    }

    fn keep_decoded<T>(&self, url: &str, decoded: Result<T, DecodeError>) -> Option<T> {
        match decoded {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(url, error = %err, "dropping undecodable payload");
                None
            }
        }
    }
}
