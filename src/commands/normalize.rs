use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StageArgs;
use crate::commands::write_run_report;
use crate::model::{NormalizedMatchMetadata, PlayerReplacement, RawMatchMetadata, StageStats};
use crate::parsers::{self, MetadataTextParser};
use crate::store;
use crate::util::{non_empty, now_utc_string};

pub fn run(args: StageArgs) -> Result<()> {
    let started = Utc::now();
    let started_at = now_utc_string();

    let db_path = args.resolve_db_path();
    let mut connection = store::open(&db_path)?;
    info!(db = %db_path.display(), "starting metadata normalization");

    let parser = MetadataTextParser::new()?;
    let stats = normalize_matches(&mut connection, &parser, args.match_id)?;

    write_run_report("normalize", &args, started, started_at, stats)
}

pub fn normalize_matches(
    connection: &mut Connection,
    parser: &MetadataTextParser,
    scope: Option<i64>,
) -> Result<StageStats> {
    let match_ids = store::raw_metadata_match_ids(connection, scope)?;
    let mut stats = StageStats::default();

    for match_id in match_ids {
        match normalize_match(connection, parser, match_id) {
            Ok(warnings) => {
                for warning in &warnings {
                    warn!(match_id, warning = %warning, "parse degradation");
                }
                stats.warnings.extend(warnings);
                stats.succeed(match_id);
                info!(match_id, "normalized match metadata");
            }
            Err(err) => {
                warn!(match_id, error = %err, "metadata normalization failed");
                stats.fail(match_id, "normalize", format!("{err:#}"));
            }
        }
    }

    Ok(stats)
}

pub(crate) fn normalize_match(
    connection: &mut Connection,
    parser: &MetadataTextParser,
    match_id: i64,
) -> Result<Vec<String>> {
    let raw_records = store::read_raw_metadata(connection, match_id)?;
    let mut warnings = Vec::new();

    let tx = connection.transaction()?;
    // Scrape refreshes append rather than update; replaying in arrival order
    // leaves the most recent row in the upsert.
    for raw in &raw_records {
        let (record, replacements, mut record_warnings) = normalize_record(parser, raw);
        store::upsert_normalized_metadata(&tx, &record)?;
        store::replace_replacements(&tx, match_id, &replacements)?;
        warnings.append(&mut record_warnings);
    }
    tx.commit()?;

    Ok(warnings)
}

pub fn normalize_record(
    parser: &MetadataTextParser,
    raw: &RawMatchMetadata,
) -> (NormalizedMatchMetadata, Vec<PlayerReplacement>, Vec<String>) {
    let match_id = raw.match_id;
    let mut warnings = Vec::new();

    let toss_text = non_empty(raw.toss.clone());
    let (toss_winner, toss_decision) = match &toss_text {
        Some(text) => match parser.parse_toss(text) {
            Some(call) => (Some(call.winner), Some(call.decision)),
            None => {
                warnings.push(format!("match {match_id}: unparseable toss text {text:?}"));
                (None, None)
            }
        },
        None => (None, None),
    };

    let (umpire_1, umpire_2) = raw
        .umpires
        .as_deref()
        .map(parsers::parse_umpires)
        .unwrap_or((None, None));

    let date_text = non_empty(raw.match_days.clone());
    let match_date = match &date_text {
        Some(text) => {
            let parsed = parsers::parse_match_date(text);
            if parsed.is_none() {
                warnings.push(format!("match {match_id}: unparseable match date {text:?}"));
            }
            parsed
        }
        None => None,
    };

    let t20_debuts = raw.t20_debut.as_deref().and_then(parsers::parse_debuts);

    let mut replacements = Vec::new();
    if let Some(text) = non_empty(raw.player_replacements.clone()) {
        let drafts = parser.parse_replacements(&text);
        if drafts.is_empty() {
            warnings.push(format!(
                "match {match_id}: unparseable player replacements {text:?}"
            ));
        }
        replacements = drafts
            .into_iter()
            .map(|draft| PlayerReplacement {
                match_id,
                player_out: draft.player_out,
                player_in: draft.player_in,
                team: draft.team,
                reason: draft.reason,
            })
            .collect();
    }

    let record = NormalizedMatchMetadata {
        match_id,
        venue: non_empty(raw.venue.clone()),
        series: non_empty(raw.series.clone()),
        season: non_empty(raw.season.clone()),
        match_date,
        toss_winner,
        toss_decision,
        umpire_1,
        umpire_2,
        tv_umpire: non_empty(raw.tv_umpire.clone()),
        reserve_umpire: non_empty(raw.reserve_umpire.clone()),
        match_referee: non_empty(raw.match_referee.clone()),
        player_of_the_match: non_empty(raw.player_of_the_match.clone()),
        first_innings_team: non_empty(raw.first_innings.clone()),
        second_innings_team: non_empty(raw.second_innings.clone()),
        t20_debuts,
        hours_of_play_local_time: non_empty(raw.hours_of_play_local_time.clone()),
        points: non_empty(raw.points.clone()),
        result_note: non_empty(raw.result_note.clone()),
    };

    (record, replacements, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReplacementReason, TossDecision};

    fn raw_fixture(match_id: i64) -> RawMatchMetadata {
        RawMatchMetadata {
            match_id,
            venue: Some("Wankhede Stadium, Mumbai".to_string()),
            toss: Some("Mumbai Indians, who chose to field".to_string()),
            series: Some("Indian Premier League".to_string()),
            season: Some("2025".to_string()),
            match_days: Some("February 14, 2025".to_string()),
            umpires: Some("Nitin Menon, Chris Gaffaney".to_string()),
            tv_umpire: Some("Anil Chaudhary".to_string()),
            reserve_umpire: None,
            match_referee: Some("Javagal Srinath".to_string()),
            player_of_the_match: Some("Kohli".to_string()),
            t20_debut: Some("Player One (MI), Player Two (CSK)".to_string()),
            player_replacements: Some(
                r#"[{"out": "Jones", "in": "Smith", "team": "Mumbai Indians", "type": "concussion"}]"#
                    .to_string(),
            ),
            first_innings: Some("Chennai Super Kings".to_string()),
            second_innings: Some("Mumbai Indians".to_string()),
            hours_of_play_local_time: Some("19.30 start".to_string()),
            points: None,
            result_note: None,
        }
    }

    #[test]
    fn well_formed_record_normalizes_every_field() {
        let parser = MetadataTextParser::new().unwrap();
        let (record, replacements, warnings) = normalize_record(&parser, &raw_fixture(101));

        assert!(warnings.is_empty());
        assert_eq!(record.toss_winner.as_deref(), Some("Mumbai Indians"));
        assert_eq!(record.toss_decision, Some(TossDecision::Field));
        assert_eq!(record.umpire_1.as_deref(), Some("Nitin Menon"));
        assert_eq!(record.umpire_2.as_deref(), Some("Chris Gaffaney"));
        assert_eq!(
            record.match_date,
            chrono::NaiveDate::from_ymd_opt(2025, 2, 14)
        );
        assert_eq!(record.t20_debuts.as_ref().map(Vec::len), Some(2));
        assert_eq!(replacements.len(), 1);
        assert_eq!(replacements[0].reason, ReplacementReason::Concussion);
        assert_eq!(replacements[0].match_id, 101);
    }

    #[test]
    fn malformed_fields_degrade_to_null_with_warnings() {
        let parser = MetadataTextParser::new().unwrap();
        let mut raw = raw_fixture(101);
        raw.toss = Some("rain delayed the toss".to_string());
        raw.match_days = Some("mid February".to_string());
        raw.player_replacements = Some("{broken".to_string());

        let (record, replacements, warnings) = normalize_record(&parser, &raw);

        assert_eq!(record.toss_winner, None);
        assert_eq!(record.toss_decision, None);
        assert_eq!(record.match_date, None);
        assert!(replacements.is_empty());
        assert_eq!(warnings.len(), 3);
        // Unrelated fields still normalize.
        assert_eq!(record.venue.as_deref(), Some("Wankhede Stadium, Mumbai"));
        assert_eq!(record.umpire_1.as_deref(), Some("Nitin Menon"));
    }

    #[test]
    fn empty_strings_become_null_not_placeholders() {
        let parser = MetadataTextParser::new().unwrap();
        let mut raw = raw_fixture(101);
        raw.venue = Some("   ".to_string());
        raw.toss = Some(String::new());

        let (record, _, warnings) = normalize_record(&parser, &raw);

        assert_eq!(record.venue, None);
        assert_eq!(record.toss_winner, None);
        assert!(warnings.is_empty());
    }

    fn insert_raw(connection: &rusqlite::Connection, raw: &RawMatchMetadata) {
        connection
            .execute(
                "INSERT INTO raw_match_metadata(
                   matchid, venue, toss, series, season, match_days, umpires, tv_umpire,
                   reserve_umpire, match_referee, player_of_the_match, t20_debut,
                   player_replacements, first_innings, second_innings,
                   hours_of_play_local_time, points, result_note
                 )
                 VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                rusqlite::params![
                    raw.match_id,
                    raw.venue,
                    raw.toss,
                    raw.series,
                    raw.season,
                    raw.match_days,
                    raw.umpires,
                    raw.tv_umpire,
                    raw.reserve_umpire,
                    raw.match_referee,
                    raw.player_of_the_match,
                    raw.t20_debut,
                    raw.player_replacements,
                    raw.first_innings,
                    raw.second_innings,
                    raw.hours_of_play_local_time,
                    raw.points,
                    raw.result_note,
                ],
            )
            .unwrap();
    }

    #[test]
    fn renormalizing_overwrites_instead_of_duplicating() {
        let mut connection = store::open_test_store();
        let parser = MetadataTextParser::new().unwrap();

        insert_raw(&connection, &raw_fixture(101));
        let mut refreshed = raw_fixture(101);
        refreshed.venue = Some("Eden Gardens, Kolkata".to_string());
        insert_raw(&connection, &refreshed);

        let stats = normalize_matches(&mut connection, &parser, None).unwrap();
        assert_eq!(stats.counts().matches_succeeded, 1);

        let stats = normalize_matches(&mut connection, &parser, None).unwrap();
        assert_eq!(stats.counts().matches_succeeded, 1);

        assert_eq!(
            store::table_count(&connection, "silver_match_metadata").unwrap(),
            1
        );
        let stored = store::read_normalized_metadata(&connection, 101)
            .unwrap()
            .unwrap();
        // The most recently scraped row wins.
        assert_eq!(stored.venue.as_deref(), Some("Eden Gardens, Kolkata"));
        assert_eq!(
            store::table_count(&connection, "silver_player_replacements").unwrap(),
            1
        );
    }

    #[test]
    fn scope_restricts_to_one_match() {
        let mut connection = store::open_test_store();
        let parser = MetadataTextParser::new().unwrap();

        insert_raw(&connection, &raw_fixture(101));
        insert_raw(&connection, &raw_fixture(202));

        let stats = normalize_matches(&mut connection, &parser, Some(202)).unwrap();
        assert_eq!(stats.counts().matches_total, 1);
        assert!(store::read_normalized_metadata(&connection, 101).unwrap().is_none());
        assert!(store::read_normalized_metadata(&connection, 202).unwrap().is_some());
    }
}
