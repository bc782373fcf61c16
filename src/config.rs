//! Run configuration.
//!
//! Loaded from a YAML file (path from `RIFT_CONFIG`, default `config.yaml`),
//! then overridden by environment variables. A missing file means defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

const API_KEY_HEADER: &str = "X-Riot-Token";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_links: BaseLinks,
    pub league_structure: LeagueStructure,
    /// Static headers sent with every request.
    pub header: BTreeMap<String, String>,
    pub pipeline: PipelineSettings,
    pub retry: RetrySettings,
    pub storage: StorageSettings,
}

/// Endpoint prefixes; ids and query strings are appended by the API client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BaseLinks {
    pub league_exp_v4: String,
    pub summoner_v4: String,
    pub summoner_v4_by_puuid: String,
    pub league_v4_by_summoner: String,
    pub match_by_puuid: String,
    pub match_details: String,
    pub champion_mastery_v4: String,
    pub ddragon_versions: String,
    /// Must contain a `{version}` placeholder.
    pub ddragon_champions: String,
}

impl Default for BaseLinks {
    fn default() -> Self {
        Self {
            league_exp_v4: "https://euw1.api.riotgames.com/lol/league-exp/v4/entries/".to_string(),
            summoner_v4: "https://euw1.api.riotgames.com/lol/summoner/v4/summoners/".to_string(),
            summoner_v4_by_puuid:
                "https://euw1.api.riotgames.com/lol/summoner/v4/summoners/by-puuid/".to_string(),
            league_v4_by_summoner:
                "https://euw1.api.riotgames.com/lol/league/v4/entries/by-summoner/".to_string(),
            match_by_puuid: "https://europe.api.riotgames.com/lol/match/v5/matches/by-puuid/"
                .to_string(),
            match_details: "https://europe.api.riotgames.com/lol/match/v5/matches/".to_string(),
            champion_mastery_v4:
                "https://euw1.api.riotgames.com/lol/champion-mastery/v4/champion-masteries/by-puuid/"
                    .to_string(),
            ddragon_versions: "https://ddragon.leagueoflegends.com/api/versions.json".to_string(),
            ddragon_champions:
                "https://ddragon.leagueoflegends.com/cdn/{version}/data/en_US/champion.json"
                    .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeagueStructure {
    pub queue_type: String,
    /// Tiers with a single division (`I`).
    pub apex_tiers: Vec<String>,
    pub tiers: Vec<String>,
    pub divisions: Vec<String>,
}

impl Default for LeagueStructure {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            queue_type: "RANKED_SOLO_5x5".to_string(),
            apex_tiers: owned(&["CHALLENGER", "GRANDMASTER", "MASTER"]),
            tiers: Vec::new(),
            divisions: owned(&["I", "II", "III", "IV"]),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub summoners_to_load: usize,
    pub players_per_page: usize,
    /// Size of each player's first recent-match page.
    pub games_to_load: usize,
    pub historical_memory: usize,
    pub staleness_days: i64,
    pub reconcile_page_size: usize,
    pub reconcile_max_pages: usize,
    /// Restricts match lists to one queue id (420 = ranked solo).
    pub match_queue: Option<u32>,
    pub fetch_parallelism: usize,
    pub load_champion_mastery: bool,
    pub load_champions: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            summoners_to_load: 100,
            players_per_page: 205,
            games_to_load: 10,
            historical_memory: 5,
            staleness_days: 12,
            reconcile_page_size: 20,
            reconcile_max_pages: 20,
            match_queue: Some(420),
            fetch_parallelism: 6,
            load_champion_mastery: true,
            load_champions: true,
        }
    }
}

impl PipelineSettings {
    /// Saturates at `Duration::MAX`; `Config::validate` rejects such values.
    pub fn staleness(&self) -> chrono::Duration {
        chrono::Duration::try_days(self.staleness_days).unwrap_or(chrono::Duration::MAX)
    }

    /// Ladder pages needed to cover `summoners_to_load`.
    pub fn ladder_pages(&self) -> u32 {
        let per_page = self.players_per_page.max(1);
        u32::try_from(1 + self.summoners_to_load / per_page).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    /// Rate-limit windows reset every two minutes upstream.
    pub cooldown_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            cooldown_secs: 120,
        }
    }
}

impl RetrySettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub db_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/rift_ingest.sqlite"),
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Priority (highest to lowest): environment variables, config file, defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("RIFT_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("API_KEY")
            && !key.trim().is_empty()
        {
            self.header
                .insert(API_KEY_HEADER.to_string(), key.trim().to_string());
        }

        if let Ok(path) = std::env::var("RIFT_DB_PATH")
            && !path.trim().is_empty()
        {
            self.storage.db_path = PathBuf::from(path.trim());
        }

        if let Ok(raw) = std::env::var("FETCH_PARALLELISM")
            && let Ok(threads) = raw.trim().parse::<usize>()
        {
            self.pipeline.fetch_parallelism = threads;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pipeline;
        if p.games_to_load == 0 {
            return Err(ConfigError::Invalid("pipeline.games_to_load must be > 0".into()));
        }
        if p.historical_memory == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.historical_memory must be > 0".into(),
            ));
        }
        if p.reconcile_page_size == 0 || p.reconcile_max_pages == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.reconcile_page_size and reconcile_max_pages must be > 0".into(),
            ));
        }
        if p.staleness_days <= 0 {
            return Err(ConfigError::Invalid("pipeline.staleness_days must be > 0".into()));
        }
        if chrono::Duration::try_days(p.staleness_days).is_none() {
            return Err(ConfigError::Invalid(
                "pipeline.staleness_days is out of range".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be > 0".into()));
        }
        let links = &self.base_links;
        for (name, link) in [
            ("league_exp_v4", &links.league_exp_v4),
            ("summoner_v4", &links.summoner_v4),
            ("summoner_v4_by_puuid", &links.summoner_v4_by_puuid),
            ("league_v4_by_summoner", &links.league_v4_by_summoner),
            ("match_by_puuid", &links.match_by_puuid),
            ("match_details", &links.match_details),
            ("champion_mastery_v4", &links.champion_mastery_v4),
            ("ddragon_versions", &links.ddragon_versions),
            ("ddragon_champions", &links.ddragon_champions),
        ] {
            if link.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("base_links.{name} is empty")));
            }
        }
        if !links.ddragon_champions.contains("{version}") {
            return Err(ConfigError::Invalid(
                "base_links.ddragon_champions needs a {version} placeholder".into(),
            ));
        }
        Ok(())
    }

    /// Header pairs in a stable order.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.header
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn has_api_key(&self) -> bool {
        self.header
            .get(API_KEY_HEADER)
            .is_some_and(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{0}': {1}")]
    FileRead(String, String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
