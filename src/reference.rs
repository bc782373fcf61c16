//! Per-champion mastery for active players and static champion data.

use std::collections::{BTreeSet, HashSet};

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::model::Puuid;
use crate::pool::with_fetch_pool;
use crate::records::{ChampionMasteryRecord, ChampionRecord, ParticipantRecord};
use crate::riot_api::RiotApi;

/// Distinct (player, champion) pairs played by `players`.
pub fn mastery_pairs(
    participants: &[ParticipantRecord],
    players: &HashSet<&Puuid>,
) -> BTreeSet<(Puuid, i64)> {
    participants
        .iter()
        .filter(|p| players.contains(&p.puuid))
        .map(|p| (p.puuid.clone(), p.champion_id))
        .collect()
}

pub struct MasteryFetch {
    pub records: Vec<ChampionMasteryRecord>,
    pub errors: Vec<String>,
}

pub fn fetch_mastery(
    api: &RiotApi,
    pairs: &BTreeSet<(Puuid, i64)>,
    parallelism: usize,
) -> MasteryFetch {
    let ordered: Vec<&(Puuid, i64)> = pairs.iter().collect();
    let results: Vec<Result<ChampionMasteryRecord>> = with_fetch_pool(parallelism, || {
        ordered
            .par_iter()
            .map(|(puuid, champion_id)| {
                let dto = api
                    .champion_mastery(puuid, *champion_id)
                    .ok_or_else(|| anyhow!("mastery {puuid}/{champion_id}: no data"))?;
                Ok(ChampionMasteryRecord {
                    puuid: puuid.clone(),
                    champion_id: dto.champion_id,
                    champion_level: dto.champion_level,
                    champion_points: dto.champion_points,
                    last_play_time: dto.last_play_time,
                })
            })
            .collect()
    });

    let mut records = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(error = %err, "mastery dropped");
                errors.push(err.to_string());
            }
        }
    }
    info!(records = records.len(), errors = errors.len(), "champion mastery fetched");
    MasteryFetch { records, errors }
}

/// Latest Data Dragon champion list, sorted by name.
pub fn fetch_champions(api: &RiotApi) -> Result<Vec<ChampionRecord>> {
    let versions = api
        .ddragon_versions()
        .context("data dragon versions unavailable")?;
    let latest = versions
        .first()
        .ok_or_else(|| anyhow!("data dragon returned no versions"))?;
    let data = api
        .ddragon_champions(latest)
        .with_context(|| format!("champion data unavailable for {latest}"))?;

    let mut records = Vec::with_capacity(data.data.len());
    for entry in data.data.values() {
        let champion_id = entry
            .key
            .trim()
            .parse::<i64>()
            .with_context(|| format!("champion {} has non-numeric key {}", entry.id, entry.key))?;
        records.push(ChampionRecord {
            champion_id,
            champion_key: entry.id.clone(),
            champion_name: entry.name.clone(),
            title: entry.title.clone(),
            tags: entry.tags.join(","),
            version: data.version.clone(),
        });
    }
    records.sort_by(|a, b| a.champion_name.cmp(&b.champion_name));
    info!(champions = records.len(), version = %data.version, "champion data fetched");
    Ok(records)
}
