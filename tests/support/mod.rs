#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};

use rift_ingest::config::{BaseLinks, Config};
use rift_ingest::dto::{MatchDto, decode_match};
use rift_ingest::error::TransportError;
use rift_ingest::gateway::{RequestGateway, RetryPolicy, Sleeper, Transport};
use rift_ingest::model::{MatchId, Puuid};
use rift_ingest::pipeline::PipelineContext;
use rift_ingest::resolver::MatchHistorySource;
use rift_ingest::riot_api::RiotApi;

pub const HOST: &str = "https://riot.test";
pub const DAY_MS: i64 = 86_400_000;
/// Fixed job start used by every scenario.
pub const NOW_MS: i64 = 1_700_000_000_000;

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, Vec<u8>),
    Fail,
}

#[derive(Default)]
struct Script {
    queued: HashMap<String, VecDeque<Reply>>,
    fixed: HashMap<String, Reply>,
    log: Vec<String>,
}

/// URL-keyed fake network. Queued replies are consumed first, then the fixed
/// reply for the URL, then 404.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, url: &str, reply: Reply) {
        let mut script = self.script.lock().unwrap();
        script
            .queued
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn always(&self, url: &str, status: u16, body: impl Into<Vec<u8>>) {
        let mut script = self.script.lock().unwrap();
        script
            .fixed
            .insert(url.to_string(), Reply::Status(status, body.into()));
    }

    pub fn always_json(&self, url: &str, body: &Value) {
        self.always(url, 200, body.to_string());
    }

    pub fn requests(&self) -> Vec<String> {
        self.script.lock().unwrap().log.clone()
    }

    pub fn count(&self, url: &str) -> usize {
        self.script
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|u| *u == url)
            .count()
    }
}

impl Transport for ScriptedTransport {
    fn get(
        &self,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<(u16, Vec<u8>), TransportError> {
        let mut script = self.script.lock().unwrap();
        script.log.push(url.to_string());
        let queued = script.queued.get_mut(url).and_then(|q| q.pop_front());
        let reply = match queued {
            Some(reply) => reply,
            None => script
                .fixed
                .get(url)
                .cloned()
                .unwrap_or(Reply::Status(404, b"not found".to_vec())),
        };
        match reply {
            Reply::Status(status, body) => Ok((status, body)),
            Reply::Fail => Err(TransportError::Request {
                url: url.to_string(),
                message: "connection reset".to_string(),
            }),
        }
    }
}

/// Records requested sleeps instead of sleeping.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

pub fn test_links() -> BaseLinks {
    BaseLinks {
        league_exp_v4: format!("{HOST}/league-exp/"),
        summoner_v4: format!("{HOST}/summoners/"),
        summoner_v4_by_puuid: format!("{HOST}/summoners/by-puuid/"),
        league_v4_by_summoner: format!("{HOST}/entries/by-summoner/"),
        match_by_puuid: format!("{HOST}/matches/by-puuid/"),
        match_details: format!("{HOST}/matches/"),
        champion_mastery_v4: format!("{HOST}/masteries/by-puuid/"),
        ddragon_versions: format!("{HOST}/ddragon/versions.json"),
        ddragon_champions: format!("{HOST}/ddragon/{{version}}/champion.json"),
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.base_links = test_links();
    config.pipeline.match_queue = None;
    config.pipeline.fetch_parallelism = 2;
    config.pipeline.games_to_load = 5;
    config.pipeline.historical_memory = 5;
    config.pipeline.reconcile_page_size = 20;
    config.retry.max_attempts = 2;
    config.retry.cooldown_secs = 0;
    config
}

pub fn build_api(config: &Config, transport: &ScriptedTransport) -> RiotApi {
    let gateway = RequestGateway::new(
        Box::new(transport.clone()),
        Box::new(RecordingSleeper::new()),
        RetryPolicy::from(&config.retry),
    );
    RiotApi::new(
        gateway,
        config.base_links.clone(),
        config.header_pairs(),
        config.pipeline.match_queue,
    )
}

pub fn build_context(config: Config, transport: &ScriptedTransport) -> PipelineContext {
    let api = build_api(&config, transport);
    PipelineContext::new(config, api, NOW_MS)
}

pub fn ids_url(puuid: &str, count: usize, skip: usize) -> String {
    format!("{HOST}/matches/by-puuid/{puuid}/ids?start={skip}&count={count}")
}

pub fn detail_url(match_id: &str) -> String {
    format!("{HOST}/matches/{match_id}")
}

pub fn ids_json(ids: &[&str]) -> Value {
    json!(ids)
}

/// Minimal valid match detail. The first half of `puuids` plays on team 100,
/// which wins.
pub fn match_json(match_id: &str, game_creation: i64, puuids: &[&str]) -> Value {
    let half = puuids.len().div_ceil(2);
    let participants: Vec<Value> = puuids
        .iter()
        .enumerate()
        .map(|(idx, puuid)| {
            let team_id = if idx < half { 100 } else { 200 };
            json!({
                "puuid": puuid,
                "teamId": team_id,
                "championId": 100 + idx as i64,
                "championName": format!("Champ{idx}"),
                "champLevel": 16,
                "kills": idx as i64,
                "deaths": 2,
                "assists": 7,
                "individualPosition": "MIDDLE",
                "teamPosition": "MIDDLE",
                "lane": "MIDDLE",
                "role": "SOLO",
                "summoner1Id": 4,
                "summoner2Id": 14,
                "visionScore": 21,
                "gameEndedInEarlySurrender": false,
                "gameEndedInSurrender": false,
                "win": team_id == 100
            })
        })
        .collect();
    json!({
        "metadata": {
            "dataVersion": "2",
            "matchId": match_id,
            "participants": puuids
        },
        "info": {
            "gameCreation": game_creation,
            "gameDuration": 1800,
            "gameMode": "CLASSIC",
            "gameVersion": "13.1.1",
            "queueId": 420,
            "participants": participants,
            "teams": [
                {"teamId": 100, "win": true},
                {"teamId": 200, "win": false}
            ]
        }
    })
}

pub fn league_entry_json(summoner_id: &str, tier: &str, wins: i64) -> Value {
    json!({
        "leagueId": "league-1",
        "summonerId": summoner_id,
        "summonerName": format!("name-{summoner_id}"),
        "queueType": "RANKED_SOLO_5x5",
        "tier": tier,
        "rank": "I",
        "leaguePoints": 250,
        "wins": wins,
        "losses": 40,
        "hotStreak": false,
        "veteran": true,
        "freshBlood": false,
        "inactive": false
    })
}

pub fn summoner_json(id: &str, puuid: &str) -> Value {
    json!({"id": id, "puuid": puuid, "summonerLevel": 300})
}

pub fn mids(raw: &[&str]) -> Vec<MatchId> {
    raw.iter().map(|s| MatchId::from(*s)).collect()
}

pub fn detail(match_id: &str, game_creation: i64, puuids: &[&str]) -> MatchDto {
    decode_match(match_json(match_id, game_creation, puuids).to_string().as_bytes())
        .expect("test match should decode")
}

/// In-memory match history, newest first, with a call log.
#[derive(Default)]
pub struct FakeHistory {
    lists: HashMap<Puuid, Vec<MatchId>>,
    calls: Mutex<Vec<(String, usize, usize)>>,
}

impl FakeHistory {
    pub fn new(lists: &[(&str, &[&str])]) -> Self {
        Self {
            lists: lists
                .iter()
                .map(|(puuid, ids)| (Puuid::from(*puuid), mids(ids)))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, usize, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

impl MatchHistorySource for FakeHistory {
    fn recent_matches(
        &self,
        puuid: &Puuid,
        count: usize,
        skip: usize,
    ) -> Vec<MatchId> {
        self.calls
            .lock()
            .unwrap()
            .push((puuid.to_string(), count, skip));
        self.lists
            .get(puuid)
            .map(|list| list.iter().skip(skip).take(count).cloned().collect())
            .unwrap_or_default()
    }
}
