use std::collections::HashSet;

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StageArgs;
use crate::commands::{aggregate, enrich, normalize, write_run_report};
use crate::model::StageStats;
use crate::parsers::{EventTextParser, MetadataTextParser};
use crate::store;
use crate::util::now_utc_string;

pub fn run(args: StageArgs) -> Result<()> {
    let started = Utc::now();
    let started_at = now_utc_string();

    let db_path = args.resolve_db_path();
    let mut connection = store::open(&db_path)?;
    info!(db = %db_path.display(), "starting full pipeline run");

    let metadata_parser = MetadataTextParser::new()?;
    let event_parser = EventTextParser::new()?;
    let stats = run_pipeline(&mut connection, &metadata_parser, &event_parser, args.match_id)?;

    write_run_report("run", &args, started, started_at, stats)
}

// One match is one unit of work; each stage commits its own transaction, and
// a failure leaves that match at its prior state while the batch continues.
pub fn run_pipeline(
    connection: &mut Connection,
    metadata_parser: &MetadataTextParser,
    event_parser: &EventTextParser,
    scope: Option<i64>,
) -> Result<StageStats> {
    let mut stats = StageStats::default();

    let metadata_ids = store::raw_metadata_match_ids(connection, scope)?;
    for match_id in metadata_ids.iter().copied() {
        process_match(connection, metadata_parser, event_parser, match_id, &mut stats);
    }

    let landed: HashSet<i64> = metadata_ids.into_iter().collect();
    for match_id in store::raw_event_match_ids(connection, scope)? {
        if !landed.contains(&match_id) {
            warn!(match_id, "raw events reference a match with no raw metadata");
            stats.skip(match_id, "enrich", "no raw metadata for match".to_string());
        }
    }

    Ok(stats)
}

fn process_match(
    connection: &mut Connection,
    metadata_parser: &MetadataTextParser,
    event_parser: &EventTextParser,
    match_id: i64,
    stats: &mut StageStats,
) {
    let mut warnings = match normalize::normalize_match(connection, metadata_parser, match_id) {
        Ok(warnings) => warnings,
        Err(err) => {
            warn!(match_id, error = %err, "metadata normalization failed");
            stats.fail(match_id, "normalize", format!("{err:#}"));
            return;
        }
    };

    let outcome = enrich_and_aggregate(connection, event_parser, match_id, &mut warnings);
    stats.warnings.append(&mut warnings);

    match outcome {
        Ok(None) => {
            stats.succeed(match_id);
            info!(match_id, "pipeline completed for match");
        }
        Ok(Some((stage, reason))) => {
            warn!(match_id, stage, reason = %reason, "match left at prior state");
            stats.skip(match_id, stage, reason);
        }
        Err((stage, err)) => {
            warn!(match_id, stage, error = %err, "pipeline stage failed");
            stats.fail(match_id, stage, format!("{err:#}"));
        }
    }
}

type StageFailure = (&'static str, anyhow::Error);

fn enrich_and_aggregate(
    connection: &mut Connection,
    event_parser: &EventTextParser,
    match_id: i64,
    warnings: &mut Vec<String>,
) -> std::result::Result<Option<(&'static str, String)>, StageFailure> {
    let raw_events = store::read_raw_events(connection, match_id)
        .map_err(|err| ("enrich", err))?;
    if raw_events.is_empty() {
        return Ok(Some(("enrich", "no raw events for match".to_string())));
    }

    let metadata = store::read_normalized_metadata(connection, match_id)
        .map_err(|err| ("enrich", err))?
        .ok_or_else(|| {
            (
                "enrich",
                anyhow::anyhow!("normalized metadata missing after normalization"),
            )
        })?;

    let (_, mut enrich_warnings) =
        enrich::enrich_match(connection, event_parser, &metadata, &raw_events)
            .map_err(|err| ("enrich", err))?;
    warnings.append(&mut enrich_warnings);

    let events = store::read_enriched_events(connection, match_id)
        .map_err(|err| ("aggregate", err))?;
    let rollup = aggregate::aggregate_match(&metadata, &events);
    aggregate::write_gold(connection, match_id, &rollup)
        .map_err(|err| ("aggregate", err))?;
    warnings.extend(rollup.warnings);

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EnrichedMatchEvent, MatchSummary};

    fn parsers() -> (MetadataTextParser, EventTextParser) {
        (
            MetadataTextParser::new().unwrap(),
            EventTextParser::new().unwrap(),
        )
    }

    fn insert_metadata(connection: &Connection, match_id: i64, first: &str, second: &str) {
        connection
            .execute(
                "INSERT INTO raw_match_metadata(matchid, venue, toss, first_innings, second_innings)
                 VALUES(?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    match_id,
                    "Wankhede Stadium",
                    format!("{second}, who chose to field"),
                    first,
                    second,
                ],
            )
            .unwrap();
    }

    fn insert_event(connection: &Connection, match_id: i64, ball: &str, event: &str, team: &str) {
        connection
            .execute(
                "INSERT INTO raw_match_events(matchid, ball, event, score, bowler, batsman, innings)
                 VALUES(?1, ?2, ?3, NULL, 'Jones', 'Kohli', ?4)",
                rusqlite::params![match_id, ball, event, team],
            )
            .unwrap();
    }

    fn seed_match(connection: &Connection, match_id: i64) {
        insert_metadata(connection, match_id, "Chennai Super Kings", "Mumbai Indians");
        insert_event(connection, match_id, "0.1", "1 run", "Chennai Super Kings");
        insert_event(connection, match_id, "0.2", "FOUR", "Chennai Super Kings");
        insert_event(connection, match_id, "0.1", "SIX", "Mumbai Indians");
        insert_event(connection, match_id, "0.2", "no run", "Mumbai Indians");
    }

    fn read_match_summary(connection: &Connection, match_id: i64) -> Option<MatchSummary> {
        let events = store::read_enriched_events(connection, match_id).unwrap();
        let metadata = store::read_normalized_metadata(connection, match_id)
            .unwrap()
            .unwrap();
        let rollup = aggregate::aggregate_match(&metadata, &events);
        rollup.summary
    }

    #[test]
    fn pipeline_lands_all_three_layers() {
        let mut connection = store::open_test_store();
        let (metadata_parser, event_parser) = parsers();
        seed_match(&connection, 101);

        let stats =
            run_pipeline(&mut connection, &metadata_parser, &event_parser, None).unwrap();
        let counts = stats.counts();
        assert_eq!(counts.matches_succeeded, 1);
        assert_eq!(counts.matches_failed, 0);

        assert_eq!(store::table_count(&connection, "silver_match_metadata").unwrap(), 1);
        assert_eq!(store::table_count(&connection, "silver_match_events").unwrap(), 4);
        assert_eq!(store::table_count(&connection, "gold_innings_summary").unwrap(), 2);
        assert_eq!(store::table_count(&connection, "gold_match_summary").unwrap(), 1);
        assert_eq!(
            store::table_count(&connection, "gold_player_batting_stats").unwrap(),
            1
        );
        assert_eq!(
            store::table_count(&connection, "gold_player_bowling_stats").unwrap(),
            1
        );

        let summary = read_match_summary(&connection, 101).unwrap();
        // 6 beats 5: the chasing side wins with all ten wickets standing.
        assert_eq!(summary.winner.as_deref(), Some("Mumbai Indians"));
        assert_eq!(summary.margin.as_deref(), Some("by 10 wickets"));
    }

    #[test]
    fn rerunning_the_pipeline_is_idempotent() {
        let mut connection = store::open_test_store();
        let (metadata_parser, event_parser) = parsers();
        seed_match(&connection, 101);

        run_pipeline(&mut connection, &metadata_parser, &event_parser, None).unwrap();
        let first_events = store::read_enriched_events(&connection, 101).unwrap();
        let first_summary = read_match_summary(&connection, 101);

        run_pipeline(&mut connection, &metadata_parser, &event_parser, None).unwrap();
        let second_events = store::read_enriched_events(&connection, 101).unwrap();
        let second_summary = read_match_summary(&connection, 101);

        assert_eq!(first_events, second_events);
        assert_eq!(first_summary, second_summary);
    }

    #[test]
    fn correcting_one_match_leaves_other_matches_untouched() {
        let mut connection = store::open_test_store();
        let (metadata_parser, event_parser) = parsers();
        seed_match(&connection, 101);
        seed_match(&connection, 202);

        run_pipeline(&mut connection, &metadata_parser, &event_parser, None).unwrap();
        let untouched_before = store::read_enriched_events(&connection, 101).unwrap();

        // Correct a malformed event in the other match and reprocess only it.
        connection
            .execute(
                "UPDATE raw_match_events SET event = 'SIX'
                 WHERE matchid = 202 AND ball = '0.2' AND innings = 'Mumbai Indians'",
                [],
            )
            .unwrap();
        let stats =
            run_pipeline(&mut connection, &metadata_parser, &event_parser, Some(202)).unwrap();
        assert_eq!(stats.counts().matches_total, 1);

        let untouched_after = store::read_enriched_events(&connection, 101).unwrap();
        assert_eq!(untouched_before, untouched_after);

        let corrected: Vec<EnrichedMatchEvent> =
            store::read_enriched_events(&connection, 202).unwrap();
        assert_eq!(corrected[3].runs_scored, 6);
    }

    #[test]
    fn events_without_metadata_are_reported_as_skipped() {
        let mut connection = store::open_test_store();
        let (metadata_parser, event_parser) = parsers();
        insert_event(&connection, 303, "0.1", "1 run", "Chennai Super Kings");

        let stats =
            run_pipeline(&mut connection, &metadata_parser, &event_parser, None).unwrap();
        let counts = stats.counts();
        assert_eq!(counts.matches_skipped, 1);
        assert_eq!(store::table_count(&connection, "silver_match_events").unwrap(), 0);
    }

    #[test]
    fn metadata_without_events_normalizes_then_skips_enrichment() {
        let mut connection = store::open_test_store();
        let (metadata_parser, event_parser) = parsers();
        insert_metadata(&connection, 404, "Chennai Super Kings", "Mumbai Indians");

        let stats =
            run_pipeline(&mut connection, &metadata_parser, &event_parser, None).unwrap();
        let counts = stats.counts();
        assert_eq!(counts.matches_skipped, 1);
        // The silver metadata still landed.
        assert_eq!(store::table_count(&connection, "silver_match_metadata").unwrap(), 1);
    }
}
