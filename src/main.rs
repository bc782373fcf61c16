use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use rift_ingest::config::Config;
use rift_ingest::logging::init_tracing;
use rift_ingest::pipeline::{self, PipelineContext};
use rift_ingest::store::Store;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing();

    let mut config = match parse_path_arg("--config") {
        Some(path) => Config::load_from(&path),
        None => Config::load(),
    }
    .context("unable to load configuration")?;
    if let Some(db_path) = parse_path_arg("--db") {
        config.storage.db_path = db_path;
    }
    if !config.has_api_key() {
        warn!("no API_KEY configured; riot endpoints will reject requests");
    }

    let mut store = Store::open(&config.storage.db_path)?;
    let run_id = store.begin_run()?;
    info!(run_id, db = %store.path().display(), "ingest run started");

    let ctx = PipelineContext::from_config(config)?;
    let output = pipeline::run(&ctx)?;
    pipeline::persist_output(&mut store, &output)?;

    let summary_json =
        serde_json::to_string(&output.summary).context("serialize run summary")?;
    store.finish_run(run_id, &summary_json, &output.errors)?;

    let s = &output.summary;
    println!("Ingest run {run_id} complete");
    println!("DB: {}", store.path().display());
    println!("Players: {} ({} ladder)", s.players, s.players_loaded);
    println!(
        "Candidates: {} -> {} (stale {}, missing detail {})",
        s.potential_t0_initial, s.potential_t0_final, s.stale_demoted, s.missing_detail
    );
    println!(
        "Gaps: {} (located {}, missing {}), recovered games {}",
        s.gaps, s.windows_located, s.windows_missing, s.games_recovered
    );
    println!(
        "Games: {} participants: {} masteries: {} champions: {}",
        s.games, s.participants, s.masteries, s.champions
    );
    if !output.errors.is_empty() {
        println!("  errors: {}", output.errors.len());
        for err in output.errors.iter().take(6) {
            println!("   - {err}");
        }
    }

    Ok(())
}

fn parse_path_arg(flag: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(prefix.as_str()) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
