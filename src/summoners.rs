//! Ranked ladder loading and puuid resolution.

use std::collections::HashSet;

use anyhow::{Result, anyhow};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::LeagueStructure;
use crate::dto::LeagueEntryDto;
use crate::model::Puuid;
use crate::pool::with_fetch_pool;
use crate::records::PlayerRecord;
use crate::riot_api::RiotApi;

const APEX_DIVISION: &str = "I";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaguePage {
    pub queue_type: String,
    pub tier: String,
    pub division: String,
    pub page: u32,
}

/// Every (tier, division, page) to request, best tiers first.
pub fn league_pages(structure: &LeagueStructure, pages: u32) -> Vec<LeaguePage> {
    let mut out = Vec::new();
    let mut push = |tier: &str, division: &str| {
        for page in 1..=pages {
            out.push(LeaguePage {
                queue_type: structure.queue_type.clone(),
                tier: tier.to_string(),
                division: division.to_string(),
                page,
            });
        }
    };
    for tier in &structure.apex_tiers {
        push(tier, APEX_DIVISION);
    }
    for tier in &structure.tiers {
        for division in &structure.divisions {
            push(tier, division);
        }
    }
    out
}

pub struct LadderFetch {
    pub entries: Vec<LeagueEntryDto>,
    pub errors: Vec<String>,
}

/// Loads ladder pages in order until `limit` entries are collected.
pub fn load_ladder(api: &RiotApi, pages: &[LeaguePage], limit: usize) -> LadderFetch {
    let mut entries = Vec::new();
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for page in pages {
        if entries.len() >= limit {
            break;
        }
        match api.league_page(&page.queue_type, &page.tier, &page.division, page.page) {
            Some(batch) => {
                for entry in batch {
                    if entries.len() >= limit {
                        break;
                    }
                    if seen.insert(entry.summoner_id.clone()) {
                        entries.push(entry);
                    }
                }
            }
            None => {
                let msg = format!("{} {} page {}: no data", page.tier, page.division, page.page);
                warn!("{msg}");
                errors.push(msg);
            }
        }
    }

    info!(entries = entries.len(), errors = errors.len(), "ladder loaded");
    LadderFetch { entries, errors }
}

fn resolve_entry(api: &RiotApi, entry: &LeagueEntryDto) -> Result<PlayerRecord> {
    if let Some(puuid) = entry.puuid.as_deref().filter(|p| !p.trim().is_empty()) {
        return Ok(PlayerRecord::from_entry(entry, Puuid::from(puuid)));
    }
    let summoner = api
        .summoner_by_id(&entry.summoner_id)
        .ok_or_else(|| anyhow!("puuid lookup failed for summoner {}", entry.summoner_id))?;
    Ok(PlayerRecord::from_entry(entry, Puuid::new(summoner.puuid)))
}

pub struct PuuidFetch {
    pub players: Vec<PlayerRecord>,
    pub errors: Vec<String>,
}

/// Attaches a puuid to every ladder entry; entries that cannot be resolved are dropped.
pub fn resolve_puuids(api: &RiotApi, entries: &[LeagueEntryDto], parallelism: usize) -> PuuidFetch {
    let results: Vec<Result<PlayerRecord>> = with_fetch_pool(parallelism, || {
        entries
            .par_iter()
            .map(|entry| resolve_entry(api, entry))
            .collect()
    });

    let mut players = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(player) => players.push(player),
            Err(err) => errors.push(err.to_string()),
        }
    }
    info!(players = players.len(), errors = errors.len(), "puuids resolved");
    PuuidFetch { players, errors }
}
