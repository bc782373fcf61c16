//! The ingestion run, step by step.
//!
//! 1. ladder entries, 2. puuids, 3. recent match lists, 4. t0 classification,
//! 5. details and staleness, 6. gap reconciliation, 7. materialization,
//! 8. champion mastery, 9. static champion data.

use std::collections::{BTreeSet, HashSet};

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::classifier::{Classification, Demotion, MatchRoster, classify};
use crate::config::Config;
use crate::gateway::RequestGateway;
use crate::materializer::{fetch_details, materialize_games, resolve_players};
use crate::model::{MatchDetails, MatchId, MatchLedger, MatchState, Puuid};
use crate::reconciler::{Reconciliation, WindowSearch, find_gaps, reconcile};
use crate::records::{
    ChampionMasteryRecord, ChampionRecord, GameRecord, ParticipantRecord, PlayerRecord,
};
use crate::reference::{fetch_champions, fetch_mastery, mastery_pairs};
use crate::resolver::{RecentMatches, collect_recent_matches};
use crate::riot_api::RiotApi;
use crate::store::{Store, WriteMode};
use crate::summoners::{league_pages, load_ladder, resolve_puuids};

/// Everything a run needs, passed explicitly to each step.
pub struct PipelineContext {
    pub config: Config,
    pub api: RiotApi,
    /// Job start, epoch milliseconds.
    pub now_ms: i64,
}

impl PipelineContext {
    pub fn new(config: Config, api: RiotApi, now_ms: i64) -> Self {
        Self {
            config,
            api,
            now_ms,
        }
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let gateway = RequestGateway::from_settings(&config.retry)?;
        let api = RiotApi::new(
            gateway,
            config.base_links.clone(),
            config.header_pairs(),
            config.pipeline.match_queue,
        );
        Ok(Self::new(config, api, Utc::now().timestamp_millis()))
    }

    fn window_search(&self) -> WindowSearch {
        let p = &self.config.pipeline;
        WindowSearch {
            page_size: p.reconcile_page_size,
            historical_memory: p.historical_memory,
            max_pages: p.reconcile_max_pages,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub players_loaded: usize,
    pub matches_listed: usize,
    pub potential_t0_initial: usize,
    pub stale_demoted: usize,
    pub missing_detail: usize,
    pub potential_t0_final: usize,
    pub gaps: usize,
    pub windows_located: usize,
    pub windows_missing: usize,
    pub games_recovered: usize,
    pub games: usize,
    pub participants: usize,
    pub players: usize,
    pub masteries: usize,
    pub champions: usize,
}

/// Output of steps 3 to 7.
#[derive(Debug, Default)]
pub struct CoreOutput {
    pub recent: RecentMatches,
    pub classification: Classification,
    pub demotion: Demotion,
    pub reconciliation: Reconciliation,
    /// List-derived roster merged with every fetched detail.
    pub roster: MatchRoster,
    pub ledger: MatchLedger,
    pub games: Vec<GameRecord>,
    pub participants: Vec<ParticipantRecord>,
    /// Profiles for reconciled players not already known.
    pub new_players: Vec<PlayerRecord>,
    pub errors: Vec<String>,
}

/// Steps 3 to 7 for a fixed set of players.
pub fn run_core(ctx: &PipelineContext, players: &[Puuid], known: &BTreeSet<Puuid>) -> CoreOutput {
    let settings = &ctx.config.pipeline;
    let parallelism = settings.fetch_parallelism;
    let mut errors = Vec::new();
    let mut ledger = MatchLedger::new();

    let recent = collect_recent_matches(&ctx.api, players, settings.games_to_load, parallelism);
    for (puuid, list) in recent.iter() {
        if list.is_empty() {
            errors.push(format!("no recent matches for {puuid}"));
        }
    }

    let mut classification = classify(&recent, settings.historical_memory);
    for match_id in classification.players_of_a_game.matches() {
        let state = if classification.potential_t0.contains(match_id) {
            MatchState::Candidate
        } else {
            MatchState::ConfirmedHistorical
        };
        ledger.advance(match_id, state);
    }
    let potential_t0_initial = classification.potential_t0.len();

    let listed = fetch_details(
        &ctx.api,
        classification.players_of_a_game.matches(),
        &MatchDetails::new(),
        parallelism,
    );
    let mut details = listed.details;
    for match_id in &listed.failed {
        errors.push(format!("match {match_id}: detail unavailable"));
        ledger.advance(match_id, MatchState::Dropped);
    }

    let demotion = classification.demote_stale(&details, ctx.now_ms, settings.staleness());
    for match_id in &demotion.stale {
        ledger.advance(match_id, MatchState::StaleDemoted);
    }

    let gaps = find_gaps(&classification, &details);
    let reconciliation = reconcile(&ctx.api, gaps, &ctx.window_search(), parallelism);
    for gap in reconciliation.unlocated() {
        errors.push(format!(
            "match {} not located in history of {}",
            gap.match_id, gap.puuid
        ));
    }

    let recovered = fetch_details(
        &ctx.api,
        reconciliation.games_to_retrieve.iter(),
        &details,
        parallelism,
    );
    for match_id in &recovered.failed {
        errors.push(format!("recovered match {match_id}: detail unavailable"));
    }
    details.extend(recovered.details);

    let selection: BTreeSet<MatchId> = classification
        .players_of_a_game
        .matches()
        .chain(reconciliation.games_to_retrieve.iter())
        .filter(|id| details.contains_key(*id))
        .cloned()
        .collect();
    let materialized = materialize_games(&details, &selection, &classification.potential_t0);
    for game in &materialized.games {
        ledger.advance(&game.match_id, MatchState::Materialized);
    }

    let mut roster = classification.players_of_a_game.clone();
    for detail in details.values() {
        roster.absorb_detail(detail);
    }

    let wanted: BTreeSet<Puuid> = reconciliation
        .players_to_retrieve
        .iter()
        .filter(|p| !known.contains(*p))
        .cloned()
        .collect();
    let fetched_players = resolve_players(
        &ctx.api,
        &wanted,
        &ctx.config.league_structure.queue_type,
        parallelism,
    );
    errors.extend(fetched_players.errors);

    info!(
        potential_t0_initial,
        potential_t0 = classification.potential_t0.len(),
        games = materialized.games.len(),
        participants = materialized.participants.len(),
        new_players = fetched_players.players.len(),
        "core steps finished"
    );

    CoreOutput {
        recent,
        classification,
        demotion,
        reconciliation,
        roster,
        ledger,
        games: materialized.games,
        participants: materialized.participants,
        new_players: fetched_players.players,
        errors,
    }
}

#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub players: Vec<PlayerRecord>,
    pub core: CoreOutput,
    pub masteries: Vec<ChampionMasteryRecord>,
    pub champions: Vec<ChampionRecord>,
    pub summary: RunSummary,
    pub errors: Vec<String>,
}

/// Steps 1 to 9.
pub fn run(ctx: &PipelineContext) -> Result<PipelineOutput> {
    let settings = &ctx.config.pipeline;
    let parallelism = settings.fetch_parallelism;
    let mut errors = Vec::new();

    let pages = league_pages(&ctx.config.league_structure, settings.ladder_pages());
    let ladder = load_ladder(&ctx.api, &pages, settings.summoners_to_load);
    errors.extend(ladder.errors);

    let resolved = resolve_puuids(&ctx.api, &ladder.entries, parallelism);
    errors.extend(resolved.errors);
    let mut players = resolved.players;
    if players.is_empty() {
        warn!("no players resolved from the ladder");
    }

    let puuids: Vec<Puuid> = players.iter().map(|p| p.puuid.clone()).collect();
    let known: BTreeSet<Puuid> = puuids.iter().cloned().collect();
    let core = run_core(ctx, &puuids, &known);
    errors.extend(core.errors.iter().cloned());

    let mut seen: HashSet<Puuid> = known.iter().cloned().collect();
    for player in &core.new_players {
        if seen.insert(player.puuid.clone()) {
            players.push(player.clone());
        }
    }

    let masteries = if settings.load_champion_mastery {
        let tracked: HashSet<&Puuid> = players.iter().map(|p| &p.puuid).collect();
        let pairs = mastery_pairs(&core.participants, &tracked);
        let fetched = fetch_mastery(&ctx.api, &pairs, parallelism);
        errors.extend(fetched.errors);
        fetched.records
    } else {
        Vec::new()
    };

    let champions = if settings.load_champions {
        match fetch_champions(&ctx.api) {
            Ok(champions) => champions,
            Err(err) => {
                warn!(error = %err, "champion data skipped");
                errors.push(format!("champions: {err:#}"));
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let summary = summarize(&players, &core, &masteries, &champions);
    info!(?summary, errors = errors.len(), "pipeline finished");
    Ok(PipelineOutput {
        players,
        core,
        masteries,
        champions,
        summary,
        errors,
    })
}

pub fn summarize(
    players: &[PlayerRecord],
    core: &CoreOutput,
    masteries: &[ChampionMasteryRecord],
    champions: &[ChampionRecord],
) -> RunSummary {
    let windows_located = core.reconciliation.windows.iter().filter(|w| w.found).count();
    RunSummary {
        players_loaded: core.recent.len(),
        matches_listed: core.classification.players_of_a_game.len(),
        potential_t0_initial: core.classification.potential_t0.len()
            + core.demotion.stale.len()
            + core.demotion.missing_detail.len(),
        stale_demoted: core.demotion.stale.len(),
        missing_detail: core.demotion.missing_detail.len(),
        potential_t0_final: core.classification.potential_t0.len(),
        gaps: core.reconciliation.gaps.len(),
        windows_located,
        windows_missing: core.reconciliation.windows.len() - windows_located,
        games_recovered: core.reconciliation.games_to_retrieve.len(),
        games: core.games.len(),
        participants: core.participants.len(),
        players: players.len(),
        masteries: masteries.len(),
        champions: champions.len(),
    }
}

/// Writes every table of a finished run. All tables are replaced, except that
/// an empty reference table (masteries, champions) keeps the stored rows.
pub fn persist_output(store: &mut Store, output: &PipelineOutput) -> Result<()> {
    store.persist_table(&output.players, WriteMode::Replace)?;
    store.persist_table(&output.core.games, WriteMode::Replace)?;
    store.persist_table(&output.core.participants, WriteMode::Replace)?;
    if !output.masteries.is_empty() {
        store.persist_table(&output.masteries, WriteMode::Replace)?;
    }
    if !output.champions.is_empty() {
        store.persist_table(&output.champions, WriteMode::Replace)?;
    }
    Ok(())
}
