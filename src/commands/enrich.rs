use std::collections::{HashMap, HashSet};

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StageArgs;
use crate::commands::write_run_report;
use crate::model::{EnrichedMatchEvent, NormalizedMatchMetadata, RawMatchEvent, StageStats};
use crate::parsers::{self, EventTextParser};
use crate::store;
use crate::util::{non_empty, now_utc_string};

pub fn run(args: StageArgs) -> Result<()> {
    let started = Utc::now();
    let started_at = now_utc_string();

    let db_path = args.resolve_db_path();
    let mut connection = store::open(&db_path)?;
    info!(db = %db_path.display(), "starting event enrichment");

    let parser = EventTextParser::new()?;
    let stats = enrich_matches(&mut connection, &parser, args.match_id)?;

    write_run_report("enrich", &args, started, started_at, stats)
}

pub fn enrich_matches(
    connection: &mut Connection,
    parser: &EventTextParser,
    scope: Option<i64>,
) -> Result<StageStats> {
    let match_ids = store::raw_event_match_ids(connection, scope)?;
    let mut stats = StageStats::default();

    for match_id in match_ids {
        let Some(metadata) = store::read_normalized_metadata(connection, match_id)? else {
            warn!(match_id, "no normalized metadata; skipping enrichment");
            stats.skip(match_id, "enrich", "no normalized metadata for match".to_string());
            continue;
        };

        let raw_events = store::read_raw_events(connection, match_id)?;
        match enrich_match(connection, parser, &metadata, &raw_events) {
            Ok((count, warnings)) => {
                for warning in &warnings {
                    warn!(match_id, warning = %warning, "enrichment discrepancy");
                }
                stats.warnings.extend(warnings);
                stats.succeed(match_id);
                info!(match_id, events = count, "enriched match events");
            }
            Err(err) => {
                warn!(match_id, error = %err, "event enrichment failed");
                stats.fail(match_id, "enrich", format!("{err:#}"));
            }
        }
    }

    Ok(stats)
}

pub(crate) fn enrich_match(
    connection: &mut Connection,
    parser: &EventTextParser,
    metadata: &NormalizedMatchMetadata,
    raw_events: &[RawMatchEvent],
) -> Result<(usize, Vec<String>)> {
    let (events, warnings) = enrich_events(parser, metadata, raw_events);

    let tx = connection.transaction()?;
    store::replace_enriched_events(&tx, metadata.match_id, &events)?;
    tx.commit()?;

    Ok((events.len(), warnings))
}

#[derive(Debug, Default)]
struct InningsTally {
    runs: i64,
    wickets: i64,
}

// Ordered fold over the raw events. One tally per batting-team label keeps
// the cumulative score per innings; the engine's own tally is authoritative
// and the scraped score string is only a cross-check.
pub fn enrich_events(
    parser: &EventTextParser,
    metadata: &NormalizedMatchMetadata,
    raw_events: &[RawMatchEvent],
) -> (Vec<EnrichedMatchEvent>, Vec<String>) {
    let mut events = Vec::with_capacity(raw_events.len());
    let mut warnings = Vec::new();
    let mut tallies: HashMap<String, InningsTally> = HashMap::new();
    let mut unmapped_labels: HashSet<String> = HashSet::new();

    for (index, raw) in raw_events.iter().enumerate() {
        let match_id = raw.match_id;
        let ball_seq = index as i64 + 1;

        let ball_notation = non_empty(raw.ball.clone());
        let position = ball_notation.as_deref().and_then(parsers::parse_ball_notation);
        if position.is_none() {
            if let Some(text) = &ball_notation {
                warnings.push(format!(
                    "match {match_id} ball {ball_seq}: unparseable ball notation {text:?}"
                ));
            }
        }

        let facts = raw
            .event
            .as_deref()
            .map(|text| parser.parse_runs_and_extras(text))
            .unwrap_or_default();
        let dismissal = raw.event.as_deref().and_then(|text| parser.parse_wicket(text));

        let batting_team = non_empty(raw.innings.clone());
        let innings_number = resolve_innings(metadata, batting_team.as_deref());
        if innings_number.is_none() {
            if let Some(label) = &batting_team {
                if unmapped_labels.insert(label.clone()) {
                    warnings.push(format!(
                        "match {match_id}: innings label {label:?} matches neither innings team; \
                         kept as unmapped partition"
                    ));
                }
            }
        }

        let tally_key = batting_team
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let tally = tallies.entry(tally_key).or_default();
        tally.runs += facts.runs_scored + facts.extras;
        if dismissal.is_some() {
            tally.wickets += 1;
        }

        if let Some(score_text) = raw.score.as_deref() {
            if let Some((scraped_runs, scraped_wickets)) = parser.parse_score(score_text) {
                if scraped_runs != tally.runs || scraped_wickets != tally.wickets {
                    warnings.push(format!(
                        "match {match_id} ball {ball_seq}: scraped score {scraped_runs}/{scraped_wickets} \
                         disagrees with computed {}/{}",
                        tally.runs, tally.wickets
                    ));
                }
            }
        }

        let (wicket_type, fielder) = match &dismissal {
            Some(dismissal) => (dismissal.kind, dismissal.fielder.clone()),
            None => (None, None),
        };

        events.push(EnrichedMatchEvent {
            match_id,
            ball_seq,
            over_number: position.map(|p| p.over_number),
            ball_in_over: position.map(|p| p.ball_in_over),
            ball_number: position.map(|p| p.ball_number),
            ball_notation,
            bowler: non_empty(raw.bowler.clone()),
            batsman: non_empty(raw.batsman.clone()),
            non_striker: None,
            runs_scored: facts.runs_scored,
            extras: facts.extras,
            extra_type: facts.extra_kind,
            is_wicket: dismissal.is_some(),
            wicket_type,
            fielder,
            batting_team,
            innings_number,
            total_runs: tally.runs,
            total_wickets: tally.wickets,
            raw_event: non_empty(raw.event.clone()),
            commentary: non_empty(raw.commentary.clone()),
        });
    }

    (events, warnings)
}

fn resolve_innings(metadata: &NormalizedMatchMetadata, label: Option<&str>) -> Option<i64> {
    let label = label?.trim();
    if metadata
        .first_innings_team
        .as_deref()
        .is_some_and(|team| team.trim().eq_ignore_ascii_case(label))
    {
        return Some(1);
    }
    if metadata
        .second_innings_team
        .as_deref()
        .is_some_and(|team| team.trim().eq_ignore_ascii_case(label))
    {
        return Some(2);
    }
    None
}
