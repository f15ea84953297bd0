use std::collections::BTreeMap;

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StageArgs;
use crate::commands::write_run_report;
use crate::model::{
    BattingStats, BowlingStats, EnrichedMatchEvent, ExtraKind, InningsSummary, MatchSummary,
    NormalizedMatchMetadata, ResultType, StageStats, WicketKind,
};
use crate::store;
use crate::util::now_utc_string;

pub fn run(args: StageArgs) -> Result<()> {
    let started = Utc::now();
    let started_at = now_utc_string();

    let db_path = args.resolve_db_path();
    let mut connection = store::open(&db_path)?;
    info!(db = %db_path.display(), "starting gold aggregation");

    let stats = aggregate_matches(&mut connection, args.match_id)?;

    write_run_report("aggregate", &args, started, started_at, stats)
}

pub fn aggregate_matches(connection: &mut Connection, scope: Option<i64>) -> Result<StageStats> {
    let match_ids = store::normalized_match_ids(connection, scope)?;
    let mut stats = StageStats::default();

    for match_id in match_ids {
        let Some(metadata) = store::read_normalized_metadata(connection, match_id)? else {
            continue;
        };

        let events = store::read_enriched_events(connection, match_id)?;
        if events.is_empty() {
            warn!(match_id, "no enriched events; skipping aggregation");
            stats.skip(match_id, "aggregate", "no enriched events for match".to_string());
            continue;
        }

        let rollup = aggregate_match(&metadata, &events);
        match write_gold(connection, match_id, &rollup) {
            Ok(()) => {
                for warning in &rollup.warnings {
                    warn!(match_id, warning = %warning, "aggregation gap");
                }
                stats.warnings.extend(rollup.warnings.iter().cloned());
                stats.succeed(match_id);
                info!(
                    match_id,
                    innings = rollup.innings.len(),
                    batting_rows = rollup.batting.len(),
                    bowling_rows = rollup.bowling.len(),
                    "aggregated match"
                );
            }
            Err(err) => {
                warn!(match_id, error = %err, "gold write failed");
                stats.fail(match_id, "aggregate", format!("{err:#}"));
            }
        }
    }

    Ok(stats)
}

pub(crate) fn write_gold(
    connection: &mut Connection,
    match_id: i64,
    rollup: &GoldRollup,
) -> Result<()> {
    let tx = connection.transaction()?;
    store::replace_innings_summaries(&tx, match_id, &rollup.innings)?;
    store::replace_match_summary(&tx, match_id, rollup.summary.as_ref())?;
    store::replace_batting_stats(&tx, match_id, &rollup.batting)?;
    store::replace_bowling_stats(&tx, match_id, &rollup.bowling)?;
    tx.commit()?;
    Ok(())
}

#[derive(Debug)]
pub struct GoldRollup {
    pub innings: Vec<InningsSummary>,
    pub summary: Option<MatchSummary>,
    pub batting: Vec<BattingStats>,
    pub bowling: Vec<BowlingStats>,
    pub warnings: Vec<String>,
}

pub fn aggregate_match(
    metadata: &NormalizedMatchMetadata,
    events: &[EnrichedMatchEvent],
) -> GoldRollup {
    let mut warnings = Vec::new();

    let mut innings = Vec::new();
    for innings_number in [1, 2] {
        let partition: Vec<&EnrichedMatchEvent> = events
            .iter()
            .filter(|event| event.innings_number == Some(innings_number))
            .collect();
        if !partition.is_empty() {
            innings.push(innings_summary(metadata, innings_number, &partition));
        }
    }

    let unmapped = events
        .iter()
        .filter(|event| event.innings_number.is_none())
        .count();
    if unmapped > 0 {
        warnings.push(format!(
            "match {}: {unmapped} balls in unmapped innings partitions excluded from summaries",
            metadata.match_id
        ));
    }

    let first = innings.iter().find(|i| i.innings_number == 1);
    let second = innings.iter().find(|i| i.innings_number == 2);
    let summary = match (first, second) {
        (Some(first), Some(second)) => Some(match_summary(metadata, first, second)),
        _ => {
            warnings.push(format!(
                "match {}: both innings not present; match summary not computed",
                metadata.match_id
            ));
            None
        }
    };

    GoldRollup {
        batting: batting_stats(metadata, events),
        bowling: bowling_stats(metadata, events),
        innings,
        summary,
        warnings,
    }
}

fn innings_team(metadata: &NormalizedMatchMetadata, innings_number: i64) -> Option<String> {
    if innings_number == 1 {
        metadata.first_innings_team.clone()
    } else {
        metadata.second_innings_team.clone()
    }
}

fn innings_summary(
    metadata: &NormalizedMatchMetadata,
    innings_number: i64,
    events: &[&EnrichedMatchEvent],
) -> InningsSummary {
    let mut summary = InningsSummary {
        match_id: metadata.match_id,
        innings_number,
        team: innings_team(metadata, innings_number),
        total_runs: 0,
        total_wickets: 0,
        total_overs: 0.0,
        total_balls: 0,
        boundaries: 0,
        sixes: 0,
        dots: 0,
        singles: 0,
        twos: 0,
        wides: 0,
        noballs: 0,
        byes: 0,
        legbyes: 0,
        penalties: 0,
        total_extras: 0,
        run_rate: None,
        powerplay_runs: 0,
        powerplay_wickets: 0,
    };

    let mut legal_balls = 0;
    for event in events {
        summary.total_runs += event.runs_scored + event.extras;
        summary.total_extras += event.extras;
        if event.is_wicket {
            summary.total_wickets += 1;
        }
        if event.is_legal_delivery() {
            legal_balls += 1;
        }

        match event.extra_type {
            Some(ExtraKind::Wide) => summary.wides += event.extras,
            Some(ExtraKind::NoBall) => summary.noballs += event.extras,
            Some(ExtraKind::Bye) => summary.byes += event.extras,
            Some(ExtraKind::LegBye) => summary.legbyes += event.extras,
            Some(ExtraKind::Penalty) => summary.penalties += event.extras,
            None => {}
        }

        match event.runs_scored {
            1 => summary.singles += 1,
            2 => summary.twos += 1,
            4 => summary.boundaries += 1,
            6 => summary.sixes += 1,
            _ => {}
        }
        if event.runs_scored == 0 && event.extras == 0 && !event.is_wicket {
            summary.dots += 1;
        }

        if event.over_number.is_some_and(|over| over < 6) {
            summary.powerplay_runs += event.runs_scored + event.extras;
            if event.is_wicket {
                summary.powerplay_wickets += 1;
            }
        }
    }

    summary.total_balls = legal_balls;
    summary.total_overs = overs_decimal(legal_balls);
    summary.run_rate = rate(summary.total_runs, legal_balls, 6.0);

    summary
}

#[derive(Debug, Default)]
struct BattingAccumulator {
    team: Option<String>,
    runs: i64,
    balls_faced: i64,
    fours: i64,
    sixes: i64,
    is_out: bool,
    dismissal: Option<WicketKind>,
}

fn batting_stats(
    metadata: &NormalizedMatchMetadata,
    events: &[EnrichedMatchEvent],
) -> Vec<BattingStats> {
    let mut grouped: BTreeMap<String, BattingAccumulator> = BTreeMap::new();

    for event in events {
        let Some(batsman) = event.batsman.as_deref() else {
            continue;
        };
        let entry = grouped.entry(batsman.to_string()).or_default();

        if entry.team.is_none() {
            entry.team = batting_side(metadata, event);
        }
        entry.runs += event.runs_scored;
        if event.counts_as_ball_faced() {
            entry.balls_faced += 1;
        }
        match event.runs_scored {
            4 => entry.fours += 1,
            6 => entry.sixes += 1,
            _ => {}
        }
        if event.is_wicket && !entry.is_out {
            entry.is_out = true;
            entry.dismissal = event.wicket_type;
        }
    }

    grouped
        .into_iter()
        .map(|(player_name, acc)| BattingStats {
            match_id: metadata.match_id,
            player_name,
            team: acc.team,
            runs_scored: acc.runs,
            balls_faced: acc.balls_faced,
            fours: acc.fours,
            sixes: acc.sixes,
            strike_rate: rate(acc.runs, acc.balls_faced, 100.0),
            is_out: acc.is_out,
            dismissal_type: acc.dismissal,
            // A century is not also reported as a fifty.
            is_fifty: (50..=99).contains(&acc.runs),
            is_century: acc.runs >= 100,
        })
        .collect()
}

#[derive(Debug, Default)]
struct BowlingAccumulator {
    team: Option<String>,
    legal_balls: i64,
    conceded: i64,
    wickets: i64,
    wides: i64,
    noballs: i64,
    overs: BTreeMap<i64, (i64, i64)>,
}

fn bowling_stats(
    metadata: &NormalizedMatchMetadata,
    events: &[EnrichedMatchEvent],
) -> Vec<BowlingStats> {
    let mut grouped: BTreeMap<String, BowlingAccumulator> = BTreeMap::new();

    for event in events {
        let Some(bowler) = event.bowler.as_deref() else {
            continue;
        };
        let entry = grouped.entry(bowler.to_string()).or_default();

        if entry.team.is_none() {
            entry.team = bowling_side(metadata, event);
        }

        let legal = event.is_legal_delivery();
        if legal {
            entry.legal_balls += 1;
        }

        // Byes, leg-byes and penalties are not charged to the bowler.
        let charged = event.runs_scored
            + if event.extra_type.is_some_and(ExtraKind::charged_to_bowler) {
                event.extras
            } else {
                0
            };
        entry.conceded += charged;

        match event.extra_type {
            Some(ExtraKind::Wide) => entry.wides += event.extras,
            Some(ExtraKind::NoBall) => entry.noballs += event.extras,
            _ => {}
        }

        if event.is_wicket && event.wicket_type.map_or(true, |kind| kind.credits_bowler()) {
            entry.wickets += 1;
        }

        if let Some(over) = event.over_number {
            let slot = entry.overs.entry(over).or_default();
            if legal {
                slot.0 += 1;
            }
            slot.1 += charged;
        }
    }

    grouped
        .into_iter()
        .map(|(player_name, acc)| {
            let maidens = acc
                .overs
                .values()
                .filter(|(legal, conceded)| *legal == 6 && *conceded == 0)
                .count() as i64;

            BowlingStats {
                match_id: metadata.match_id,
                player_name,
                team: acc.team,
                overs_bowled: overs_decimal(acc.legal_balls),
                balls_bowled: acc.legal_balls,
                runs_conceded: acc.conceded,
                wickets_taken: acc.wickets,
                maidens,
                economy_rate: rate(acc.conceded, acc.legal_balls, 6.0),
                wides: acc.wides,
                noballs: acc.noballs,
                is_three_wicket: acc.wickets >= 3,
                is_five_wicket: acc.wickets >= 5,
            }
        })
        .collect()
}

fn batting_side(
    metadata: &NormalizedMatchMetadata,
    event: &EnrichedMatchEvent,
) -> Option<String> {
    match event.innings_number {
        Some(innings_number) => innings_team(metadata, innings_number),
        None => event.batting_team.clone(),
    }
}

fn bowling_side(
    metadata: &NormalizedMatchMetadata,
    event: &EnrichedMatchEvent,
) -> Option<String> {
    match event.innings_number {
        Some(1) => metadata.second_innings_team.clone(),
        Some(2) => metadata.first_innings_team.clone(),
        _ => None,
    }
}

fn match_summary(
    metadata: &NormalizedMatchMetadata,
    first: &InningsSummary,
    second: &InningsSummary,
) -> MatchSummary {
    let note = metadata.result_note.as_deref().map(str::to_lowercase);
    let super_over = note.as_deref().is_some_and(|note| note.contains("super over"));
    let no_result = note
        .as_deref()
        .is_some_and(|note| note.contains("no result") || note.contains("abandoned"));

    let (mut winner, mut margin, mut result_type) = if first.total_runs > second.total_runs {
        (
            first.team.clone(),
            Some(format!("by {} runs", first.total_runs - second.total_runs)),
            ResultType::Normal,
        )
    } else if second.total_runs > first.total_runs {
        (
            second.team.clone(),
            Some(format!("by {} wickets", 10 - second.total_wickets)),
            ResultType::Normal,
        )
    } else {
        (None, None, ResultType::Tie)
    };

    // Super-over and no-result come from the metadata signal, never from the
    // ball log.
    if super_over {
        result_type = ResultType::SuperOver;
    }
    if no_result {
        result_type = ResultType::NoResult;
        winner = None;
        margin = None;
    }

    MatchSummary {
        match_id: metadata.match_id,
        venue: metadata.venue.clone(),
        series: metadata.series.clone(),
        season: metadata.season.clone(),
        match_date: metadata.match_date,
        first_innings_team: first.team.clone(),
        first_innings_runs: first.total_runs,
        first_innings_wickets: first.total_wickets,
        first_innings_overs: first.total_overs,
        second_innings_team: second.team.clone(),
        second_innings_runs: second.total_runs,
        second_innings_wickets: second.total_wickets,
        second_innings_overs: second.total_overs,
        winner,
        margin,
        result_type,
        total_runs: first.total_runs + second.total_runs,
        total_wickets: first.total_wickets + second.total_wickets,
        total_boundaries: first.boundaries + second.boundaries,
        total_sixes: first.sixes + second.sixes,
        total_extras: first.total_extras + second.total_extras,
        player_of_the_match: metadata.player_of_the_match.clone(),
    }
}

// Cricket over notation: 17 legal balls are 2 overs and 5 balls, "2.5".
fn overs_decimal(legal_balls: i64) -> f64 {
    let whole = (legal_balls / 6) as f64;
    let remainder = (legal_balls % 6) as f64;
    ((whole + remainder / 10.0) * 10.0).round() / 10.0
}

fn rate(numerator: i64, balls: i64, scale: f64) -> Option<f64> {
    if balls == 0 {
        return None;
    }
    let value = numerator as f64 * scale / balls as f64;
    Some((value * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata_fixture() -> NormalizedMatchMetadata {
        NormalizedMatchMetadata {
            match_id: 101,
            venue: Some("Wankhede Stadium".to_string()),
            series: None,
            season: None,
            match_date: None,
            toss_winner: None,
            toss_decision: None,
            umpire_1: None,
            umpire_2: None,
            tv_umpire: None,
            reserve_umpire: None,
            match_referee: None,
            player_of_the_match: None,
            first_innings_team: Some("Chennai Super Kings".to_string()),
            second_innings_team: Some("Mumbai Indians".to_string()),
            t20_debuts: None,
            hours_of_play_local_time: None,
            points: None,
            result_note: None,
        }
    }

    fn ball(seq: i64, over: i64, ball_in_over: i64, innings: i64, runs: i64) -> EnrichedMatchEvent {
        EnrichedMatchEvent {
            match_id: 101,
            ball_seq: seq,
            over_number: Some(over),
            ball_in_over: Some(ball_in_over),
            ball_number: Some(over * 6 + ball_in_over),
            ball_notation: Some(format!("{over}.{ball_in_over}")),
            bowler: Some("Jones".to_string()),
            batsman: Some("Kohli".to_string()),
            non_striker: None,
            runs_scored: runs,
            extras: 0,
            extra_type: None,
            is_wicket: false,
            wicket_type: None,
            fielder: None,
            batting_team: Some(if innings == 1 {
                "Chennai Super Kings".to_string()
            } else {
                "Mumbai Indians".to_string()
            }),
            innings_number: Some(innings),
            total_runs: 0,
            total_wickets: 0,
            raw_event: None,
            commentary: None,
        }
    }

    fn extra_ball(seq: i64, over: i64, kind: ExtraKind, extras: i64) -> EnrichedMatchEvent {
        let mut event = ball(seq, over, 1, 1, 0);
        event.extra_type = Some(kind);
        event.extras = extras;
        event
    }

    fn innings_fixture(innings_number: i64, runs: i64, wickets: i64) -> InningsSummary {
        InningsSummary {
            match_id: 101,
            innings_number,
            team: Some(if innings_number == 1 {
                "Chennai Super Kings".to_string()
            } else {
                "Mumbai Indians".to_string()
            }),
            total_runs: runs,
            total_wickets: wickets,
            total_overs: 20.0,
            total_balls: 120,
            boundaries: 0,
            sixes: 0,
            dots: 0,
            singles: 0,
            twos: 0,
            wides: 0,
            noballs: 0,
            byes: 0,
            legbyes: 0,
            penalties: 0,
            total_extras: 0,
            run_rate: None,
            powerplay_runs: 0,
            powerplay_wickets: 0,
        }
    }

    #[test]
    fn seventeen_legal_balls_render_as_two_point_five_overs() {
        assert_eq!(overs_decimal(17), 2.5);
        assert_eq!(overs_decimal(120), 20.0);
        assert_eq!(overs_decimal(0), 0.0);
    }

    #[test]
    fn innings_totals_conserve_per_ball_runs_and_wickets() {
        let mut events = vec![
            ball(1, 0, 1, 1, 1),
            ball(2, 0, 2, 1, 4),
            extra_ball(3, 0, ExtraKind::Wide, 2),
            ball(4, 0, 3, 1, 0),
        ];
        events[3].is_wicket = true;
        events[3].wicket_type = Some(WicketKind::Bowled);

        let rollup = aggregate_match(&metadata_fixture(), &events);
        let innings = &rollup.innings[0];

        let per_ball: i64 = events.iter().map(|e| e.runs_scored + e.extras).sum();
        assert_eq!(innings.total_runs, per_ball);
        assert_eq!(innings.total_runs, 7);
        assert_eq!(innings.total_wickets, 1);
        // The wide is not a legal delivery.
        assert_eq!(innings.total_balls, 3);
        assert_eq!(innings.wides, 2);
        assert_eq!(innings.boundaries, 1);
        assert_eq!(innings.singles, 1);
        assert_eq!(innings.total_extras, 2);
    }

    #[test]
    fn dot_balls_require_no_runs_no_extras_no_wicket() {
        let mut events = vec![ball(1, 0, 1, 1, 0), ball(2, 0, 2, 1, 0)];
        events[1].is_wicket = true;

        let rollup = aggregate_match(&metadata_fixture(), &events);
        assert_eq!(rollup.innings[0].dots, 1);
    }

    #[test]
    fn powerplay_is_restricted_to_the_first_six_overs() {
        let events = vec![
            ball(1, 0, 1, 1, 4),
            ball(2, 5, 6, 1, 2),
            ball(3, 6, 1, 1, 6),
        ];

        let rollup = aggregate_match(&metadata_fixture(), &events);
        assert_eq!(rollup.innings[0].powerplay_runs, 6);
        assert_eq!(rollup.innings[0].total_runs, 12);
    }

    #[test]
    fn run_rate_uses_legal_balls_and_nulls_on_zero() {
        let mut events: Vec<EnrichedMatchEvent> = (1..=17)
            .map(|seq| ball(seq, (seq - 1) / 6, (seq - 1) % 6 + 1, 1, 2))
            .collect();
        events.push(extra_ball(18, 3, ExtraKind::Wide, 1));

        let rollup = aggregate_match(&metadata_fixture(), &events);
        let innings = &rollup.innings[0];
        assert_eq!(innings.total_balls, 17);
        assert_eq!(innings.total_overs, 2.5);
        // 35 runs from 17 legal balls.
        assert_eq!(innings.run_rate, Some(12.35));

        let wides_only = vec![extra_ball(1, 0, ExtraKind::Wide, 1)];
        let rollup = aggregate_match(&metadata_fixture(), &wides_only);
        assert_eq!(rollup.innings[0].run_rate, None);
    }

    #[test]
    fn batting_rollup_counts_balls_faced_without_wides() {
        let mut events = vec![
            ball(1, 0, 1, 1, 4),
            extra_ball(2, 0, ExtraKind::Wide, 1),
            ball(3, 0, 2, 1, 6),
        ];
        // A no-ball is still a ball faced, and the batsman keeps runs off it.
        let mut noball = ball(4, 0, 3, 1, 1);
        noball.extra_type = Some(ExtraKind::NoBall);
        noball.extras = 1;
        events.push(noball);

        let rollup = aggregate_match(&metadata_fixture(), &events);
        let batting = &rollup.batting[0];
        assert_eq!(batting.player_name, "Kohli");
        assert_eq!(batting.runs_scored, 11);
        assert_eq!(batting.balls_faced, 3);
        assert_eq!(batting.fours, 1);
        assert_eq!(batting.sixes, 1);
        assert_eq!(batting.strike_rate, Some(366.67));
        assert!(!batting.is_out);
        assert_eq!(batting.team.as_deref(), Some("Chennai Super Kings"));
    }

    #[test]
    fn strike_rate_is_null_when_only_wides_faced() {
        let events = vec![extra_ball(1, 0, ExtraKind::Wide, 1)];
        let rollup = aggregate_match(&metadata_fixture(), &events);
        let batting = &rollup.batting[0];
        assert_eq!(batting.balls_faced, 0);
        assert_eq!(batting.strike_rate, None);
    }

    #[test]
    fn milestones_are_mutually_exclusive() {
        let events: Vec<EnrichedMatchEvent> = (1..=13)
            .map(|seq| ball(seq, (seq - 1) / 6, (seq - 1) % 6 + 1, 1, 4))
            .collect();
        let rollup = aggregate_match(&metadata_fixture(), &events);
        let batting = &rollup.batting[0];
        assert_eq!(batting.runs_scored, 52);
        assert!(batting.is_fifty);
        assert!(!batting.is_century);

        let events: Vec<EnrichedMatchEvent> = (1..=25)
            .map(|seq| ball(seq, (seq - 1) / 6, (seq - 1) % 6 + 1, 1, 4))
            .collect();
        let rollup = aggregate_match(&metadata_fixture(), &events);
        let batting = &rollup.batting[0];
        assert_eq!(batting.runs_scored, 100);
        assert!(batting.is_century);
        assert!(!batting.is_fifty);
    }

    #[test]
    fn dismissal_comes_from_the_wicket_row() {
        let mut events = vec![ball(1, 0, 1, 1, 0)];
        events[0].is_wicket = true;
        events[0].wicket_type = Some(WicketKind::Caught);
        events[0].fielder = Some("Smith".to_string());

        let rollup = aggregate_match(&metadata_fixture(), &events);
        let batting = &rollup.batting[0];
        assert!(batting.is_out);
        assert_eq!(batting.dismissal_type, Some(WicketKind::Caught));
    }

    #[test]
    fn bowler_concedes_wides_and_noballs_but_not_byes() {
        let mut events = vec![
            ball(1, 0, 1, 1, 2),
            extra_ball(2, 0, ExtraKind::Wide, 1),
            extra_ball(3, 0, ExtraKind::Bye, 4),
            extra_ball(4, 0, ExtraKind::LegBye, 1),
        ];
        let mut noball = ball(5, 0, 2, 1, 0);
        noball.extra_type = Some(ExtraKind::NoBall);
        noball.extras = 1;
        events.push(noball);

        let rollup = aggregate_match(&metadata_fixture(), &events);
        let bowling = &rollup.bowling[0];
        assert_eq!(bowling.player_name, "Jones");
        // 2 off the bat + 1 wide + 1 no-ball; byes and leg-byes excluded.
        assert_eq!(bowling.runs_conceded, 4);
        // Wide and no-ball are not legal deliveries.
        assert_eq!(bowling.balls_bowled, 3);
        assert_eq!(bowling.wides, 1);
        assert_eq!(bowling.noballs, 1);
        assert_eq!(bowling.team.as_deref(), Some("Mumbai Indians"));
    }

    #[test]
    fn run_outs_are_not_credited_to_the_bowler() {
        let mut events = vec![ball(1, 0, 1, 1, 0), ball(2, 0, 2, 1, 0)];
        events[0].is_wicket = true;
        events[0].wicket_type = Some(WicketKind::RunOut);
        events[1].is_wicket = true;
        events[1].wicket_type = Some(WicketKind::Caught);

        let rollup = aggregate_match(&metadata_fixture(), &events);
        assert_eq!(rollup.bowling[0].wickets_taken, 1);
        assert_eq!(rollup.innings[0].total_wickets, 2);
    }

    #[test]
    fn three_wicket_haul_flags() {
        let mut events: Vec<EnrichedMatchEvent> = (1..=6)
            .map(|seq| ball(seq, 0, seq, 1, 0))
            .collect();
        for event in events.iter_mut().take(3) {
            event.is_wicket = true;
            event.wicket_type = Some(WicketKind::Bowled);
        }

        let rollup = aggregate_match(&metadata_fixture(), &events);
        let bowling = &rollup.bowling[0];
        assert_eq!(bowling.wickets_taken, 3);
        assert!(bowling.is_three_wicket);
        assert!(!bowling.is_five_wicket);
    }

    #[test]
    fn maiden_requires_six_scoreless_legal_balls() {
        // Over 0: six legal balls, no runs conceded (a maiden, despite byes).
        let mut events: Vec<EnrichedMatchEvent> = (1..=5)
            .map(|seq| ball(seq, 0, seq, 1, 0))
            .collect();
        events.push(extra_ball(6, 0, ExtraKind::Bye, 4));
        // Over 1: six legal balls but one scoring shot.
        for seq in 1..=6 {
            let mut event = ball(7 + seq, 1, seq, 1, 0);
            if seq == 4 {
                event.runs_scored = 1;
            }
            events.push(event);
        }
        // Over 2: scoreless but only five legal balls.
        for seq in 1..=5 {
            events.push(ball(13 + seq, 2, seq, 1, 0));
        }

        let rollup = aggregate_match(&metadata_fixture(), &events);
        assert_eq!(rollup.bowling[0].maidens, 1);
    }

    #[test]
    fn economy_rate_nulls_without_legal_balls() {
        let events = vec![extra_ball(1, 0, ExtraKind::Wide, 1)];
        let rollup = aggregate_match(&metadata_fixture(), &events);
        let bowling = &rollup.bowling[0];
        assert_eq!(bowling.balls_bowled, 0);
        assert_eq!(bowling.economy_rate, None);
        assert_eq!(bowling.runs_conceded, 1);
    }

    #[test]
    fn chasing_side_wins_by_wickets_in_hand() {
        let summary = match_summary(
            &metadata_fixture(),
            &innings_fixture(1, 185, 6),
            &innings_fixture(2, 186, 4),
        );
        assert_eq!(summary.winner.as_deref(), Some("Mumbai Indians"));
        assert_eq!(summary.margin.as_deref(), Some("by 6 wickets"));
        assert_eq!(summary.result_type, ResultType::Normal);
        assert_eq!(summary.total_runs, 371);
    }

    #[test]
    fn defending_side_wins_by_runs() {
        let summary = match_summary(
            &metadata_fixture(),
            &innings_fixture(1, 200, 3),
            &innings_fixture(2, 182, 10),
        );
        assert_eq!(summary.winner.as_deref(), Some("Chennai Super Kings"));
        assert_eq!(summary.margin.as_deref(), Some("by 18 runs"));
    }

    #[test]
    fn equal_totals_tie_without_a_winner() {
        let summary = match_summary(
            &metadata_fixture(),
            &innings_fixture(1, 170, 5),
            &innings_fixture(2, 170, 8),
        );
        assert_eq!(summary.winner, None);
        assert_eq!(summary.margin, None);
        assert_eq!(summary.result_type, ResultType::Tie);
    }

    #[test]
    fn super_over_and_no_result_come_from_the_metadata_note() {
        let mut metadata = metadata_fixture();
        metadata.result_note = Some("Match tied (Mumbai Indians won the Super Over)".to_string());
        let summary = match_summary(
            &metadata,
            &innings_fixture(1, 170, 5),
            &innings_fixture(2, 170, 8),
        );
        assert_eq!(summary.result_type, ResultType::SuperOver);

        metadata.result_note = Some("No result - rain".to_string());
        let summary = match_summary(
            &metadata,
            &innings_fixture(1, 90, 2),
            &innings_fixture(2, 20, 0),
        );
        assert_eq!(summary.result_type, ResultType::NoResult);
        assert_eq!(summary.winner, None);
        assert_eq!(summary.margin, None);
    }

    #[test]
    fn match_summary_requires_both_innings() {
        let events = vec![ball(1, 0, 1, 1, 1)];
        let rollup = aggregate_match(&metadata_fixture(), &events);
        assert_eq!(rollup.innings.len(), 1);
        assert!(rollup.summary.is_none());
        assert!(rollup
            .warnings
            .iter()
            .any(|w| w.contains("both innings not present")));
    }

    #[test]
    fn unmapped_partitions_are_excluded_and_reported() {
        let mut stray = ball(3, 0, 1, 1, 4);
        stray.innings_number = None;
        stray.batting_team = Some("Somerset".to_string());
        let events = vec![ball(1, 0, 1, 1, 1), ball(2, 0, 1, 2, 1), stray];

        let rollup = aggregate_match(&metadata_fixture(), &events);
        assert_eq!(rollup.innings.len(), 2);
        assert_eq!(rollup.innings[0].total_runs, 1);
        assert!(rollup.warnings.iter().any(|w| w.contains("unmapped")));
    }

    #[test]
    fn reaggregation_is_a_full_overwrite() {
        let mut connection = store::open_test_store();
        let metadata = metadata_fixture();
        store::upsert_normalized_metadata(&connection, &metadata).unwrap();

        let events = vec![ball(1, 0, 1, 1, 1), ball(2, 0, 1, 2, 4)];
        store::replace_enriched_events(&connection, 101, &events).unwrap();

        let stats = aggregate_matches(&mut connection, None).unwrap();
        assert_eq!(stats.counts().matches_succeeded, 1);
        assert_eq!(store::table_count(&connection, "gold_innings_summary").unwrap(), 2);
        assert_eq!(store::table_count(&connection, "gold_match_summary").unwrap(), 1);

        // A shrunken upstream replaces the whole gold partition.
        let events = vec![ball(1, 0, 1, 1, 1)];
        store::replace_enriched_events(&connection, 101, &events).unwrap();
        let stats = aggregate_matches(&mut connection, None).unwrap();
        assert_eq!(stats.counts().matches_succeeded, 1);
        assert_eq!(store::table_count(&connection, "gold_innings_summary").unwrap(), 1);
        assert_eq!(store::table_count(&connection, "gold_match_summary").unwrap(), 0);
    }

    #[test]
    fn matches_without_events_are_skipped_and_keep_prior_state() {
        let mut connection = store::open_test_store();
        store::upsert_normalized_metadata(&connection, &metadata_fixture()).unwrap();

        let stats = aggregate_matches(&mut connection, None).unwrap();
        let counts = stats.counts();
        assert_eq!(counts.matches_skipped, 1);
        assert_eq!(counts.matches_succeeded, 0);
    }
}
