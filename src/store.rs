use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::model::{
    BattingStats, BowlingStats, EnrichedMatchEvent, ExtraKind, InningsSummary, MatchSummary,
    NormalizedMatchMetadata, PlayerReplacement, RawMatchEvent, RawMatchMetadata, TossDecision,
    WicketKind,
};
use crate::util::{ensure_directory, now_utc_string};

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

pub const LAYER_TABLES: [&str; 9] = [
    "raw_match_metadata",
    "raw_match_events",
    "silver_match_metadata",
    "silver_player_replacements",
    "silver_match_events",
    "gold_innings_summary",
    "gold_match_summary",
    "gold_player_batting_stats",
    "gold_player_bowling_stats",
];

pub fn open(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        ensure_directory(parent)?;
    }

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS pipeline_meta (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS raw_match_metadata (
              matchid INTEGER NOT NULL,
              venue TEXT,
              toss TEXT,
              series TEXT,
              season TEXT,
              match_days TEXT,
              umpires TEXT,
              tv_umpire TEXT,
              reserve_umpire TEXT,
              match_referee TEXT,
              player_of_the_match TEXT,
              t20_debut TEXT,
              player_replacements TEXT,
              first_innings TEXT,
              second_innings TEXT,
              hours_of_play_local_time TEXT,
              points TEXT,
              result_note TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_raw_metadata_matchid
              ON raw_match_metadata(matchid);

            CREATE TABLE IF NOT EXISTS raw_match_events (
              matchid INTEGER NOT NULL,
              ball TEXT,
              event TEXT,
              score TEXT,
              commentary TEXT,
              bowler TEXT,
              batsman TEXT,
              innings TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_raw_events_matchid
              ON raw_match_events(matchid);

            CREATE TABLE IF NOT EXISTS silver_match_metadata (
              match_id INTEGER PRIMARY KEY,
              venue TEXT,
              series TEXT,
              season TEXT,
              match_date TEXT,
              toss_winner TEXT,
              toss_decision TEXT,
              umpire_1 TEXT,
              umpire_2 TEXT,
              tv_umpire TEXT,
              reserve_umpire TEXT,
              match_referee TEXT,
              player_of_the_match TEXT,
              first_innings_team TEXT,
              second_innings_team TEXT,
              t20_debuts TEXT,
              hours_of_play_local_time TEXT,
              points TEXT,
              result_note TEXT
            );

            CREATE TABLE IF NOT EXISTS silver_player_replacements (
              match_id INTEGER NOT NULL
                REFERENCES silver_match_metadata(match_id) ON DELETE CASCADE,
              player_out TEXT,
              player_in TEXT,
              team TEXT,
              replacement_type TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_replacements_match
              ON silver_player_replacements(match_id);

            CREATE TABLE IF NOT EXISTS silver_match_events (
              match_id INTEGER NOT NULL
                REFERENCES silver_match_metadata(match_id) ON DELETE CASCADE,
              ball_seq INTEGER NOT NULL,
              over_number INTEGER,
              ball_in_over INTEGER,
              ball_number INTEGER,
              ball_notation TEXT,
              bowler TEXT,
              batsman TEXT,
              non_striker TEXT,
              runs_scored INTEGER NOT NULL,
              extras INTEGER NOT NULL,
              extra_type TEXT,
              is_wicket INTEGER NOT NULL,
              wicket_type TEXT,
              fielder TEXT,
              batting_team TEXT,
              innings_number INTEGER,
              total_runs INTEGER NOT NULL,
              total_wickets INTEGER NOT NULL,
              raw_event TEXT,
              commentary TEXT,
              PRIMARY KEY (match_id, ball_seq)
            );

            CREATE TABLE IF NOT EXISTS gold_innings_summary (
              match_id INTEGER NOT NULL
                REFERENCES silver_match_metadata(match_id) ON DELETE CASCADE,
              innings_number INTEGER NOT NULL,
              team TEXT,
              total_runs INTEGER NOT NULL,
              total_wickets INTEGER NOT NULL,
              total_overs REAL NOT NULL,
              total_balls INTEGER NOT NULL,
              boundaries INTEGER NOT NULL,
              sixes INTEGER NOT NULL,
              dots INTEGER NOT NULL,
              singles INTEGER NOT NULL,
              twos INTEGER NOT NULL,
              wides INTEGER NOT NULL,
              noballs INTEGER NOT NULL,
              byes INTEGER NOT NULL,
              legbyes INTEGER NOT NULL,
              penalties INTEGER NOT NULL,
              total_extras INTEGER NOT NULL,
              run_rate REAL,
              powerplay_runs INTEGER NOT NULL,
              powerplay_wickets INTEGER NOT NULL,
              PRIMARY KEY (match_id, innings_number)
            );

            CREATE TABLE IF NOT EXISTS gold_match_summary (
              match_id INTEGER PRIMARY KEY
                REFERENCES silver_match_metadata(match_id) ON DELETE CASCADE,
              venue TEXT,
              series TEXT,
              season TEXT,
              match_date TEXT,
              first_innings_team TEXT,
              first_innings_runs INTEGER NOT NULL,
              first_innings_wickets INTEGER NOT NULL,
              first_innings_overs REAL NOT NULL,
              second_innings_team TEXT,
              second_innings_runs INTEGER NOT NULL,
              second_innings_wickets INTEGER NOT NULL,
              second_innings_overs REAL NOT NULL,
              winner TEXT,
              margin TEXT,
              result_type TEXT NOT NULL,
              total_runs INTEGER NOT NULL,
              total_wickets INTEGER NOT NULL,
              total_boundaries INTEGER NOT NULL,
              total_sixes INTEGER NOT NULL,
              total_extras INTEGER NOT NULL,
              player_of_the_match TEXT
            );

            CREATE TABLE IF NOT EXISTS gold_player_batting_stats (
              match_id INTEGER NOT NULL
                REFERENCES silver_match_metadata(match_id) ON DELETE CASCADE,
              player_name TEXT NOT NULL,
              team TEXT,
              runs_scored INTEGER NOT NULL,
              balls_faced INTEGER NOT NULL,
              fours INTEGER NOT NULL,
              sixes INTEGER NOT NULL,
              strike_rate REAL,
              is_out INTEGER NOT NULL,
              dismissal_type TEXT,
              is_fifty INTEGER NOT NULL,
              is_century INTEGER NOT NULL,
              PRIMARY KEY (match_id, player_name)
            );

            CREATE TABLE IF NOT EXISTS gold_player_bowling_stats (
              match_id INTEGER NOT NULL
                REFERENCES silver_match_metadata(match_id) ON DELETE CASCADE,
              player_name TEXT NOT NULL,
              team TEXT,
              overs_bowled REAL NOT NULL,
              balls_bowled INTEGER NOT NULL,
              runs_conceded INTEGER NOT NULL,
              wickets_taken INTEGER NOT NULL,
              maidens INTEGER NOT NULL,
              economy_rate REAL,
              wides INTEGER NOT NULL,
              noballs INTEGER NOT NULL,
              is_three_wicket INTEGER NOT NULL,
              is_five_wicket INTEGER NOT NULL,
              PRIMARY KEY (match_id, player_name)
            );
            ",
        )
        .context("failed to initialize layer tables")?;

    connection.execute(
        "INSERT INTO pipeline_meta(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO pipeline_meta(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now_utc_string()],
    )?;

    Ok(())
}

pub fn schema_version(connection: &Connection) -> Result<Option<String>> {
    let version = connection
        .query_row(
            "SELECT value FROM pipeline_meta WHERE key = 'db_schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version)
}

fn scoped_ids(connection: &Connection, sql: &str, scope: Option<i64>) -> Result<Vec<i64>> {
    let mut statement = connection.prepare(sql)?;
    let rows = statement.query_map([], |row| row.get(0))?;

    let mut ids = Vec::new();
    for id in rows {
        let id = id?;
        if scope.is_none() || scope == Some(id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

pub fn raw_metadata_match_ids(connection: &Connection, scope: Option<i64>) -> Result<Vec<i64>> {
    scoped_ids(
        connection,
        "SELECT DISTINCT matchid FROM raw_match_metadata ORDER BY matchid",
        scope,
    )
}

pub fn raw_event_match_ids(connection: &Connection, scope: Option<i64>) -> Result<Vec<i64>> {
    scoped_ids(
        connection,
        "SELECT DISTINCT matchid FROM raw_match_events ORDER BY matchid",
        scope,
    )
}

pub fn normalized_match_ids(connection: &Connection, scope: Option<i64>) -> Result<Vec<i64>> {
    scoped_ids(
        connection,
        "SELECT match_id FROM silver_match_metadata ORDER BY match_id",
        scope,
    )
}

pub fn read_raw_metadata(connection: &Connection, match_id: i64) -> Result<Vec<RawMatchMetadata>> {
    let mut statement = connection.prepare(
        "SELECT matchid, venue, toss, series, season, match_days, umpires, tv_umpire,
                reserve_umpire, match_referee, player_of_the_match, t20_debut,
                player_replacements, first_innings, second_innings,
                hours_of_play_local_time, points, result_note
         FROM raw_match_metadata WHERE matchid = ?1 ORDER BY rowid",
    )?;

    let rows = statement.query_map([match_id], |row| {
        Ok(RawMatchMetadata {
            match_id: row.get(0)?,
            venue: row.get(1)?,
            toss: row.get(2)?,
            series: row.get(3)?,
            season: row.get(4)?,
            match_days: row.get(5)?,
            umpires: row.get(6)?,
            tv_umpire: row.get(7)?,
            reserve_umpire: row.get(8)?,
            match_referee: row.get(9)?,
            player_of_the_match: row.get(10)?,
            t20_debut: row.get(11)?,
            player_replacements: row.get(12)?,
            first_innings: row.get(13)?,
            second_innings: row.get(14)?,
            hours_of_play_local_time: row.get(15)?,
            points: row.get(16)?,
            result_note: row.get(17)?,
        })
    })?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("failed to read raw metadata for match {match_id}"))
}

// Arrival order (rowid) is the only ordering signal the scraper provides.
pub fn read_raw_events(connection: &Connection, match_id: i64) -> Result<Vec<RawMatchEvent>> {
    let mut statement = connection.prepare(
        "SELECT matchid, ball, event, score, commentary, bowler, batsman, innings
         FROM raw_match_events WHERE matchid = ?1 ORDER BY rowid",
    )?;

    let rows = statement.query_map([match_id], |row| {
        Ok(RawMatchEvent {
            match_id: row.get(0)?,
            ball: row.get(1)?,
            event: row.get(2)?,
            score: row.get(3)?,
            commentary: row.get(4)?,
            bowler: row.get(5)?,
            batsman: row.get(6)?,
            innings: row.get(7)?,
        })
    })?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("failed to read raw events for match {match_id}"))
}

pub fn upsert_normalized_metadata(
    connection: &Connection,
    record: &NormalizedMatchMetadata,
) -> Result<()> {
    let t20_debuts = record
        .t20_debuts
        .as_ref()
        .map(|debuts| serde_json::to_string(debuts))
        .transpose()
        .context("failed to serialize t20 debut list")?;

    connection.execute(
        "INSERT INTO silver_match_metadata(
           match_id, venue, series, season, match_date, toss_winner, toss_decision,
           umpire_1, umpire_2, tv_umpire, reserve_umpire, match_referee,
           player_of_the_match, first_innings_team, second_innings_team,
           t20_debuts, hours_of_play_local_time, points, result_note
         )
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
         ON CONFLICT(match_id) DO UPDATE SET
           venue=excluded.venue,
           series=excluded.series,
           season=excluded.season,
           match_date=excluded.match_date,
           toss_winner=excluded.toss_winner,
           toss_decision=excluded.toss_decision,
           umpire_1=excluded.umpire_1,
           umpire_2=excluded.umpire_2,
           tv_umpire=excluded.tv_umpire,
           reserve_umpire=excluded.reserve_umpire,
           match_referee=excluded.match_referee,
           player_of_the_match=excluded.player_of_the_match,
           first_innings_team=excluded.first_innings_team,
           second_innings_team=excluded.second_innings_team,
           t20_debuts=excluded.t20_debuts,
           hours_of_play_local_time=excluded.hours_of_play_local_time,
           points=excluded.points,
           result_note=excluded.result_note",
        params![
            record.match_id,
            record.venue,
            record.series,
            record.season,
            record.match_date,
            record.toss_winner,
            record.toss_decision.map(TossDecision::as_str),
            record.umpire_1,
            record.umpire_2,
            record.tv_umpire,
            record.reserve_umpire,
            record.match_referee,
            record.player_of_the_match,
            record.first_innings_team,
            record.second_innings_team,
            t20_debuts,
            record.hours_of_play_local_time,
            record.points,
            record.result_note,
        ],
    )?;

    Ok(())
}

pub fn read_normalized_metadata(
    connection: &Connection,
    match_id: i64,
) -> Result<Option<NormalizedMatchMetadata>> {
    let record = connection
        .query_row(
            "SELECT match_id, venue, series, season, match_date, toss_winner, toss_decision,
                    umpire_1, umpire_2, tv_umpire, reserve_umpire, match_referee,
                    player_of_the_match, first_innings_team, second_innings_team,
                    t20_debuts, hours_of_play_local_time, points, result_note
             FROM silver_match_metadata WHERE match_id = ?1",
            [match_id],
            map_normalized_metadata,
        )
        .optional()
        .with_context(|| format!("failed to read normalized metadata for match {match_id}"))?;
    Ok(record)
}

fn map_normalized_metadata(row: &Row<'_>) -> rusqlite::Result<NormalizedMatchMetadata> {
    let toss_decision: Option<String> = row.get(6)?;
    let t20_debuts: Option<String> = row.get(15)?;

    Ok(NormalizedMatchMetadata {
        match_id: row.get(0)?,
        venue: row.get(1)?,
        series: row.get(2)?,
        season: row.get(3)?,
        match_date: row.get(4)?,
        toss_winner: row.get(5)?,
        toss_decision: toss_decision.as_deref().and_then(TossDecision::parse),
        umpire_1: row.get(7)?,
        umpire_2: row.get(8)?,
        tv_umpire: row.get(9)?,
        reserve_umpire: row.get(10)?,
        match_referee: row.get(11)?,
        player_of_the_match: row.get(12)?,
        first_innings_team: row.get(13)?,
        second_innings_team: row.get(14)?,
        t20_debuts: t20_debuts.as_deref().and_then(|raw| serde_json::from_str(raw).ok()),
        hours_of_play_local_time: row.get(16)?,
        points: row.get(17)?,
        result_note: row.get(18)?,
    })
}

pub fn replace_replacements(
    connection: &Connection,
    match_id: i64,
    records: &[PlayerReplacement],
) -> Result<()> {
    connection.execute(
        "DELETE FROM silver_player_replacements WHERE match_id = ?1",
        [match_id],
    )?;

    let mut statement = connection.prepare(
        "INSERT INTO silver_player_replacements(match_id, player_out, player_in, team, replacement_type)
         VALUES(?1, ?2, ?3, ?4, ?5)",
    )?;
    for record in records {
        statement.execute(params![
            record.match_id,
            record.player_out,
            record.player_in,
            record.team,
            record.reason.as_str(),
        ])?;
    }

    Ok(())
}

#[allow(dead_code)]
pub fn read_replacements(connection: &Connection, match_id: i64) -> Result<Vec<PlayerReplacement>> {
    let mut statement = connection.prepare(
        "SELECT match_id, player_out, player_in, team, replacement_type
         FROM silver_player_replacements WHERE match_id = ?1 ORDER BY rowid",
    )?;

    let rows = statement.query_map([match_id], |row| {
        let reason: String = row.get(4)?;
        Ok(PlayerReplacement {
            match_id: row.get(0)?,
            player_out: row.get(1)?,
            player_in: row.get(2)?,
            team: row.get(3)?,
            reason: crate::model::ReplacementReason::classify(&reason),
        })
    })?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("failed to read replacements for match {match_id}"))
}

pub fn replace_enriched_events(
    connection: &Connection,
    match_id: i64,
    events: &[EnrichedMatchEvent],
) -> Result<()> {
    connection.execute("DELETE FROM silver_match_events WHERE match_id = ?1", [match_id])?;

    let mut statement = connection.prepare(
        "INSERT INTO silver_match_events(
           match_id, ball_seq, over_number, ball_in_over, ball_number, ball_notation,
           bowler, batsman, non_striker, runs_scored, extras, extra_type,
           is_wicket, wicket_type, fielder, batting_team, innings_number,
           total_runs, total_wickets, raw_event, commentary
         )
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
    )?;

    for event in events {
        statement.execute(params![
            event.match_id,
            event.ball_seq,
            event.over_number,
            event.ball_in_over,
            event.ball_number,
            event.ball_notation,
            event.bowler,
            event.batsman,
            event.non_striker,
            event.runs_scored,
            event.extras,
            event.extra_type.map(ExtraKind::as_str),
            event.is_wicket,
            event.wicket_type.map(WicketKind::as_str),
            event.fielder,
            event.batting_team,
            event.innings_number,
            event.total_runs,
            event.total_wickets,
            event.raw_event,
            event.commentary,
        ])?;
    }

    Ok(())
}

pub fn read_enriched_events(
    connection: &Connection,
    match_id: i64,
) -> Result<Vec<EnrichedMatchEvent>> {
    let mut statement = connection.prepare(
        "SELECT match_id, ball_seq, over_number, ball_in_over, ball_number, ball_notation,
                bowler, batsman, non_striker, runs_scored, extras, extra_type,
                is_wicket, wicket_type, fielder, batting_team, innings_number,
                total_runs, total_wickets, raw_event, commentary
         FROM silver_match_events WHERE match_id = ?1 ORDER BY ball_seq",
    )?;

    let rows = statement.query_map([match_id], |row| {
        let extra_type: Option<String> = row.get(11)?;
        let wicket_type: Option<String> = row.get(13)?;
        Ok(EnrichedMatchEvent {
            match_id: row.get(0)?,
            ball_seq: row.get(1)?,
            over_number: row.get(2)?,
            ball_in_over: row.get(3)?,
            ball_number: row.get(4)?,
            ball_notation: row.get(5)?,
            bowler: row.get(6)?,
            batsman: row.get(7)?,
            non_striker: row.get(8)?,
            runs_scored: row.get(9)?,
            extras: row.get(10)?,
            extra_type: extra_type.as_deref().and_then(ExtraKind::parse),
            is_wicket: row.get(12)?,
            wicket_type: wicket_type.as_deref().and_then(WicketKind::parse),
            fielder: row.get(14)?,
            batting_team: row.get(15)?,
            innings_number: row.get(16)?,
            total_runs: row.get(17)?,
            total_wickets: row.get(18)?,
            raw_event: row.get(19)?,
            commentary: row.get(20)?,
        })
    })?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("failed to read enriched events for match {match_id}"))
}

pub fn replace_innings_summaries(
    connection: &Connection,
    match_id: i64,
    summaries: &[InningsSummary],
) -> Result<()> {
    connection.execute("DELETE FROM gold_innings_summary WHERE match_id = ?1", [match_id])?;

    let mut statement = connection.prepare(
        "INSERT INTO gold_innings_summary(
           match_id, innings_number, team, total_runs, total_wickets, total_overs,
           total_balls, boundaries, sixes, dots, singles, twos, wides, noballs,
           byes, legbyes, penalties, total_extras, run_rate,
           powerplay_runs, powerplay_wickets
         )
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
    )?;

    for summary in summaries {
        statement.execute(params![
            summary.match_id,
            summary.innings_number,
            summary.team,
            summary.total_runs,
            summary.total_wickets,
            summary.total_overs,
            summary.total_balls,
            summary.boundaries,
            summary.sixes,
            summary.dots,
            summary.singles,
            summary.twos,
            summary.wides,
            summary.noballs,
            summary.byes,
            summary.legbyes,
            summary.penalties,
            summary.total_extras,
            summary.run_rate,
            summary.powerplay_runs,
            summary.powerplay_wickets,
        ])?;
    }

    Ok(())
}

pub fn replace_match_summary(
    connection: &Connection,
    match_id: i64,
    summary: Option<&MatchSummary>,
) -> Result<()> {
    connection.execute("DELETE FROM gold_match_summary WHERE match_id = ?1", [match_id])?;

    let Some(summary) = summary else {
        return Ok(());
    };

    connection.execute(
        "INSERT INTO gold_match_summary(
           match_id, venue, series, season, match_date,
           first_innings_team, first_innings_runs, first_innings_wickets, first_innings_overs,
           second_innings_team, second_innings_runs, second_innings_wickets, second_innings_overs,
           winner, margin, result_type, total_runs, total_wickets,
           total_boundaries, total_sixes, total_extras, player_of_the_match
         )
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
        params![
            summary.match_id,
            summary.venue,
            summary.series,
            summary.season,
            summary.match_date,
            summary.first_innings_team,
            summary.first_innings_runs,
            summary.first_innings_wickets,
            summary.first_innings_overs,
            summary.second_innings_team,
            summary.second_innings_runs,
            summary.second_innings_wickets,
            summary.second_innings_overs,
            summary.winner,
            summary.margin,
            summary.result_type.as_str(),
            summary.total_runs,
            summary.total_wickets,
            summary.total_boundaries,
            summary.total_sixes,
            summary.total_extras,
            summary.player_of_the_match,
        ],
    )?;

    Ok(())
}

pub fn replace_batting_stats(
    connection: &Connection,
    match_id: i64,
    stats: &[BattingStats],
) -> Result<()> {
    connection.execute(
        "DELETE FROM gold_player_batting_stats WHERE match_id = ?1",
        [match_id],
    )?;

    let mut statement = connection.prepare(
        "INSERT INTO gold_player_batting_stats(
           match_id, player_name, team, runs_scored, balls_faced, fours, sixes,
           strike_rate, is_out, dismissal_type, is_fifty, is_century
         )
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?;

    for entry in stats {
        statement.execute(params![
            entry.match_id,
            entry.player_name,
            entry.team,
            entry.runs_scored,
            entry.balls_faced,
            entry.fours,
            entry.sixes,
            entry.strike_rate,
            entry.is_out,
            entry.dismissal_type.map(WicketKind::as_str),
            entry.is_fifty,
            entry.is_century,
        ])?;
    }

    Ok(())
}

pub fn replace_bowling_stats(
    connection: &Connection,
    match_id: i64,
    stats: &[BowlingStats],
) -> Result<()> {
    connection.execute(
        "DELETE FROM gold_player_bowling_stats WHERE match_id = ?1",
        [match_id],
    )?;

    let mut statement = connection.prepare(
        "INSERT INTO gold_player_bowling_stats(
           match_id, player_name, team, overs_bowled, balls_bowled, runs_conceded,
           wickets_taken, maidens, economy_rate, wides, noballs,
           is_three_wicket, is_five_wicket
         )
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )?;

    for entry in stats {
        statement.execute(params![
            entry.match_id,
            entry.player_name,
            entry.team,
            entry.overs_bowled,
            entry.balls_bowled,
            entry.runs_conceded,
            entry.wickets_taken,
            entry.maidens,
            entry.economy_rate,
            entry.wides,
            entry.noballs,
            entry.is_three_wicket,
            entry.is_five_wicket,
        ])?;
    }

    Ok(())
}

pub fn table_count(connection: &Connection, table: &str) -> Result<i64> {
    let count = connection.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

#[cfg(test)]
pub fn open_test_store() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory store should open");
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .expect("foreign keys should enable");
    ensure_schema(&connection).expect("schema should initialize");
    connection
}
