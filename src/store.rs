use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use tracing::info;

use crate::records::{
    ChampionMasteryRecord, ChampionRecord, GameRecord, ParticipantRecord, PlayerRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Clear the table, then insert.
    Replace,
    /// Upsert on the table's primary key.
    Append,
}

/// A record that maps onto one row of a fixed table.
pub trait TableRow {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<Value>;
}

pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn persist_table<R: TableRow>(&mut self, rows: &[R], mode: WriteMode) -> Result<usize> {
        let placeholders = (1..=R::COLUMNS.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({placeholders})",
            R::TABLE,
            R::COLUMNS.join(", ")
        );

        let tx = self
            .conn
            .transaction()
            .with_context(|| format!("begin {} transaction", R::TABLE))?;
        if mode == WriteMode::Replace {
            tx.execute(&format!("DELETE FROM {}", R::TABLE), [])
                .with_context(|| format!("clear {}", R::TABLE))?;
        }
        {
            let mut stmt = tx
                .prepare(&sql)
                .with_context(|| format!("prepare insert into {}", R::TABLE))?;
            for row in rows {
                stmt.execute(params_from_iter(row.values()))
                    .with_context(|| format!("insert into {}", R::TABLE))?;
            }
        }
        tx.commit()
            .with_context(|| format!("commit {} transaction", R::TABLE))?;
        info!(table = R::TABLE, rows = rows.len(), ?mode, "table persisted");
        Ok(rows.len())
    }

    pub fn row_count(&self, table: &str) -> Result<i64> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .with_context(|| format!("count {table}"))
    }

    /// `(match_id, potential_t0)` for every stored game, by match id.
    pub fn game_flags(&self) -> Result<Vec<(String, bool)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT match_id, potential_t0 FROM games ORDER BY match_id")
            .context("prepare game flags query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? != 0))
            })
            .context("query game flags")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode game flag row")?);
        }
        Ok(out)
    }

    pub fn begin_run(&self) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO ingest_runs(started_at, finished_at, summary_json, errors_json)
                 VALUES (?1, NULL, '{}', '[]')",
                params![Utc::now().to_rfc3339()],
            )
            .context("insert ingest run")?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn finish_run(&self, run_id: i64, summary_json: &str, errors: &[String]) -> Result<()> {
        let errors_json = serde_json::to_string(errors).unwrap_or_else(|_| "[]".to_string());
        self.conn
            .execute(
                "UPDATE ingest_runs SET finished_at = ?1, summary_json = ?2, errors_json = ?3
                 WHERE run_id = ?4",
                params![Utc::now().to_rfc3339(), summary_json, errors_json, run_id],
            )
            .context("update ingest run")?;
        Ok(())
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS summoners (
            puuid TEXT PRIMARY KEY,
            summoner_id TEXT NOT NULL,
            summoner_name TEXT NOT NULL,
            league_id TEXT NOT NULL,
            queue_type TEXT NOT NULL,
            tier TEXT NOT NULL,
            rank TEXT NOT NULL,
            league_points INTEGER NOT NULL,
            wins INTEGER NOT NULL,
            losses INTEGER NOT NULL,
            hot_streak INTEGER NOT NULL,
            veteran INTEGER NOT NULL,
            fresh_blood INTEGER NOT NULL,
            inactive INTEGER NOT NULL,
            mini_series TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS games (
            match_id TEXT PRIMARY KEY,
            game_creation INTEGER NOT NULL,
            game_duration INTEGER NOT NULL,
            game_mode TEXT NOT NULL,
            queue_id INTEGER NOT NULL,
            game_version TEXT NOT NULL,
            game_ended_in_early_surrender INTEGER NOT NULL,
            game_ended_in_surrender INTEGER NOT NULL,
            team100_win INTEGER NOT NULL,
            team200_win INTEGER NOT NULL,
            potential_t0 INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_games_creation ON games(game_creation);

        CREATE TABLE IF NOT EXISTS games_summoners (
            match_id TEXT NOT NULL,
            puuid TEXT NOT NULL,
            team_id INTEGER NOT NULL,
            champion_id INTEGER NOT NULL,
            champion_level INTEGER NOT NULL,
            kills INTEGER NOT NULL,
            deaths INTEGER NOT NULL,
            assists INTEGER NOT NULL,
            individual_position TEXT NOT NULL,
            team_position TEXT NOT NULL,
            lane TEXT NOT NULL,
            role TEXT NOT NULL,
            killing_sprees INTEGER NOT NULL,
            longest_time_spent_living INTEGER NOT NULL,
            objectives_stolen INTEGER NOT NULL,
            summoner1_id INTEGER NOT NULL,
            summoner2_id INTEGER NOT NULL,
            vision_score INTEGER NOT NULL,
            total_time_spent_dead INTEGER NOT NULL,
            win INTEGER NOT NULL,
            PRIMARY KEY (match_id, puuid)
        );
        CREATE INDEX IF NOT EXISTS idx_games_summoners_puuid ON games_summoners(puuid);

        CREATE TABLE IF NOT EXISTS champions_summoners (
            puuid TEXT NOT NULL,
            champion_id INTEGER NOT NULL,
            champion_level INTEGER NOT NULL,
            champion_points INTEGER NOT NULL,
            last_play_time INTEGER NOT NULL,
            PRIMARY KEY (puuid, champion_id)
        );

        CREATE TABLE IF NOT EXISTS champions (
            champion_id INTEGER PRIMARY KEY,
            champion_key TEXT NOT NULL,
            champion_name TEXT NOT NULL,
            title TEXT NOT NULL,
            tags TEXT NOT NULL,
            version TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            summary_json TEXT NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

impl TableRow for PlayerRecord {
    const TABLE: &'static str = "summoners";
    const COLUMNS: &'static [&'static str] = &[
        "puuid",
        "summoner_id",
        "summoner_name",
        "league_id",
        "queue_type",
        "tier",
        "rank",
        "league_points",
        "wins",
        "losses",
        "hot_streak",
        "veteran",
        "fresh_blood",
        "inactive",
        "mini_series",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            text(self.puuid.as_str()),
            text(&self.summoner_id),
            text(&self.summoner_name),
            text(&self.league_id),
            text(&self.queue_type),
            text(&self.tier),
            text(&self.rank),
            Value::from(self.league_points),
            Value::from(self.wins),
            Value::from(self.losses),
            Value::from(self.hot_streak),
            Value::from(self.veteran),
            Value::from(self.fresh_blood),
            Value::from(self.inactive),
            text(&self.mini_series),
        ]
    }
}

impl TableRow for GameRecord {
    const TABLE: &'static str = "games";
    const COLUMNS: &'static [&'static str] = &[
        "match_id",
        "game_creation",
        "game_duration",
        "game_mode",
        "queue_id",
        "game_version",
        "game_ended_in_early_surrender",
        "game_ended_in_surrender",
        "team100_win",
        "team200_win",
        "potential_t0",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            text(self.match_id.as_str()),
            Value::from(self.game_creation),
            Value::from(self.game_duration),
            text(&self.game_mode),
            Value::from(self.queue_id),
            text(&self.game_version),
            Value::from(self.game_ended_in_early_surrender),
            Value::from(self.game_ended_in_surrender),
            Value::from(self.team100_win),
            Value::from(self.team200_win),
            Value::from(self.potential_t0),
        ]
    }
}

impl TableRow for ParticipantRecord {
    const TABLE: &'static str = "games_summoners";
    const COLUMNS: &'static [&'static str] = &[
        "match_id",
        "puuid",
        "team_id",
        "champion_id",
        "champion_level",
        "kills",
        "deaths",
        "assists",
        "individual_position",
        "team_position",
        "lane",
        "role",
        "killing_sprees",
        "longest_time_spent_living",
        "objectives_stolen",
        "summoner1_id",
        "summoner2_id",
        "vision_score",
        "total_time_spent_dead",
        "win",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            text(self.match_id.as_str()),
            text(self.puuid.as_str()),
            Value::from(self.team_id),
            Value::from(self.champion_id),
            Value::from(self.champion_level),
            Value::from(self.kills),
            Value::from(self.deaths),
            Value::from(self.assists),
            text(&self.individual_position),
            text(&self.team_position),
            text(&self.lane),
            text(&self.role),
            Value::from(self.killing_sprees),
            Value::from(self.longest_time_spent_living),
            Value::from(self.objectives_stolen),
            Value::from(self.summoner1_id),
            Value::from(self.summoner2_id),
            Value::from(self.vision_score),
            Value::from(self.total_time_spent_dead),
            Value::from(self.win),
        ]
    }
}

impl TableRow for ChampionMasteryRecord {
    const TABLE: &'static str = "champions_summoners";
    const COLUMNS: &'static [&'static str] = &[
        "puuid",
        "champion_id",
        "champion_level",
        "champion_points",
        "last_play_time",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            text(self.puuid.as_str()),
            Value::from(self.champion_id),
            Value::from(self.champion_level),
            Value::from(self.champion_points),
            Value::from(self.last_play_time),
        ]
    }
}

impl TableRow for ChampionRecord {
    const TABLE: &'static str = "champions";
    const COLUMNS: &'static [&'static str] = &[
        "champion_id",
        "champion_key",
        "champion_name",
        "title",
        "tags",
        "version",
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            Value::from(self.champion_id),
            text(&self.champion_key),
            text(&self.champion_name),
            text(&self.title),
            text(&self.tags),
            text(&self.version),
        ]
    }
}
