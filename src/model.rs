use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct RawMatchMetadata {
    pub match_id: i64,
    pub venue: Option<String>,
    pub toss: Option<String>,
    pub series: Option<String>,
    pub season: Option<String>,
    pub match_days: Option<String>,
    pub umpires: Option<String>,
    pub tv_umpire: Option<String>,
    pub reserve_umpire: Option<String>,
    pub match_referee: Option<String>,
    pub player_of_the_match: Option<String>,
    pub t20_debut: Option<String>,
    pub player_replacements: Option<String>,
    pub first_innings: Option<String>,
    pub second_innings: Option<String>,
    pub hours_of_play_local_time: Option<String>,
    pub points: Option<String>,
    pub result_note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawMatchEvent {
    pub match_id: i64,
    pub ball: Option<String>,
    pub event: Option<String>,
    pub score: Option<String>,
    pub commentary: Option<String>,
    pub bowler: Option<String>,
    pub batsman: Option<String>,
    pub innings: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TossDecision {
    Bat,
    Field,
}

impl TossDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bat => "bat",
            Self::Field => "field",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bat" => Some(Self::Bat),
            "field" => Some(Self::Field),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraKind {
    Wide,
    NoBall,
    Bye,
    LegBye,
    Penalty,
}

impl ExtraKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wide => "wide",
            Self::NoBall => "noball",
            Self::Bye => "bye",
            Self::LegBye => "legbye",
            Self::Penalty => "penalty",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "wide" => Some(Self::Wide),
            "noball" => Some(Self::NoBall),
            "bye" => Some(Self::Bye),
            "legbye" => Some(Self::LegBye),
            "penalty" => Some(Self::Penalty),
            _ => None,
        }
    }

    // Wides and no-balls are bowled again; everything else counts toward the over.
    pub fn voids_delivery(self) -> bool {
        matches!(self, Self::Wide | Self::NoBall)
    }

    pub fn charged_to_bowler(self) -> bool {
        matches!(self, Self::Wide | Self::NoBall)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WicketKind {
    Bowled,
    Caught,
    Lbw,
    Stumped,
    RunOut,
    HitWicket,
}

impl WicketKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bowled => "bowled",
            Self::Caught => "caught",
            Self::Lbw => "lbw",
            Self::Stumped => "stumped",
            Self::RunOut => "run out",
            Self::HitWicket => "hit wicket",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bowled" => Some(Self::Bowled),
            "caught" => Some(Self::Caught),
            "lbw" => Some(Self::Lbw),
            "stumped" => Some(Self::Stumped),
            "run out" => Some(Self::RunOut),
            "hit wicket" => Some(Self::HitWicket),
            _ => None,
        }
    }

    pub fn credits_bowler(self) -> bool {
        !matches!(self, Self::RunOut)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementReason {
    Concussion,
    Injury,
    Other,
}

impl ReplacementReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concussion => "concussion",
            Self::Injury => "injury",
            Self::Other => "other",
        }
    }

    pub fn classify(value: &str) -> Self {
        let lower = value.to_ascii_lowercase();
        if lower.contains("concussion") {
            Self::Concussion
        } else if lower.contains("injur") {
            Self::Injury
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Normal,
    Tie,
    NoResult,
    SuperOver,
}

impl ResultType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Tie => "tie",
            Self::NoResult => "no_result",
            Self::SuperOver => "super_over",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMatchMetadata {
    pub match_id: i64,
    pub venue: Option<String>,
    pub series: Option<String>,
    pub season: Option<String>,
    pub match_date: Option<NaiveDate>,
    pub toss_winner: Option<String>,
    pub toss_decision: Option<TossDecision>,
    pub umpire_1: Option<String>,
    pub umpire_2: Option<String>,
    pub tv_umpire: Option<String>,
    pub reserve_umpire: Option<String>,
    pub match_referee: Option<String>,
    pub player_of_the_match: Option<String>,
    pub first_innings_team: Option<String>,
    pub second_innings_team: Option<String>,
    pub t20_debuts: Option<Vec<String>>,
    pub hours_of_play_local_time: Option<String>,
    pub points: Option<String>,
    pub result_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerReplacement {
    pub match_id: i64,
    pub player_out: Option<String>,
    pub player_in: Option<String>,
    pub team: Option<String>,
    pub reason: ReplacementReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedMatchEvent {
    pub match_id: i64,
    pub ball_seq: i64,
    pub over_number: Option<i64>,
    pub ball_in_over: Option<i64>,
    pub ball_number: Option<i64>,
    pub ball_notation: Option<String>,
    pub bowler: Option<String>,
    pub batsman: Option<String>,
    pub non_striker: Option<String>,
    pub runs_scored: i64,
    pub extras: i64,
    pub extra_type: Option<ExtraKind>,
    pub is_wicket: bool,
    pub wicket_type: Option<WicketKind>,
    pub fielder: Option<String>,
    pub batting_team: Option<String>,
    pub innings_number: Option<i64>,
    pub total_runs: i64,
    pub total_wickets: i64,
    pub raw_event: Option<String>,
    pub commentary: Option<String>,
}

impl EnrichedMatchEvent {
    pub fn is_legal_delivery(&self) -> bool {
        !self.extra_type.is_some_and(ExtraKind::voids_delivery)
    }

    // A wide is never a ball faced; a no-ball is.
    pub fn counts_as_ball_faced(&self) -> bool {
        self.extra_type != Some(ExtraKind::Wide)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InningsSummary {
    pub match_id: i64,
    pub innings_number: i64,
    pub team: Option<String>,
    pub total_runs: i64,
    pub total_wickets: i64,
    pub total_overs: f64,
    pub total_balls: i64,
    pub boundaries: i64,
    pub sixes: i64,
    pub dots: i64,
    pub singles: i64,
    pub twos: i64,
    pub wides: i64,
    pub noballs: i64,
    pub byes: i64,
    pub legbyes: i64,
    pub penalties: i64,
    pub total_extras: i64,
    pub run_rate: Option<f64>,
    pub powerplay_runs: i64,
    pub powerplay_wickets: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchSummary {
    pub match_id: i64,
    pub venue: Option<String>,
    pub series: Option<String>,
    pub season: Option<String>,
    pub match_date: Option<NaiveDate>,
    pub first_innings_team: Option<String>,
    pub first_innings_runs: i64,
    pub first_innings_wickets: i64,
    pub first_innings_overs: f64,
    pub second_innings_team: Option<String>,
    pub second_innings_runs: i64,
    pub second_innings_wickets: i64,
    pub second_innings_overs: f64,
    pub winner: Option<String>,
    pub margin: Option<String>,
    pub result_type: ResultType,
    pub total_runs: i64,
    pub total_wickets: i64,
    pub total_boundaries: i64,
    pub total_sixes: i64,
    pub total_extras: i64,
    pub player_of_the_match: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BattingStats {
    pub match_id: i64,
    pub player_name: String,
    pub team: Option<String>,
    pub runs_scored: i64,
    pub balls_faced: i64,
    pub fours: i64,
    pub sixes: i64,
    pub strike_rate: Option<f64>,
    pub is_out: bool,
    pub dismissal_type: Option<WicketKind>,
    pub is_fifty: bool,
    pub is_century: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BowlingStats {
    pub match_id: i64,
    pub player_name: String,
    pub team: Option<String>,
    pub overs_bowled: f64,
    pub balls_bowled: i64,
    pub runs_conceded: i64,
    pub wickets_taken: i64,
    pub maidens: i64,
    pub economy_rate: Option<f64>,
    pub wides: i64,
    pub noballs: i64,
    pub is_three_wicket: bool,
    pub is_five_wicket: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    pub match_id: i64,
    pub status: &'static str,
    pub stage: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RunCounts {
    pub matches_total: usize,
    pub matches_succeeded: usize,
    pub matches_skipped: usize,
    pub matches_failed: usize,
}

#[derive(Debug, Default)]
pub struct StageStats {
    pub outcomes: Vec<MatchOutcome>,
    pub warnings: Vec<String>,
}

impl StageStats {
    pub fn succeed(&mut self, match_id: i64) {
        self.outcomes.push(MatchOutcome {
            match_id,
            status: "succeeded",
            stage: None,
            reason: None,
        });
    }

    pub fn skip(&mut self, match_id: i64, stage: &str, reason: String) {
        self.outcomes.push(MatchOutcome {
            match_id,
            status: "skipped",
            stage: Some(stage.to_string()),
            reason: Some(reason),
        });
    }

    pub fn fail(&mut self, match_id: i64, stage: &str, reason: String) {
        self.outcomes.push(MatchOutcome {
            match_id,
            status: "failed",
            stage: Some(stage.to_string()),
            reason: Some(reason),
        });
    }

    pub fn counts(&self) -> RunCounts {
        let mut counts = RunCounts {
            matches_total: self.outcomes.len(),
            matches_succeeded: 0,
            matches_skipped: 0,
            matches_failed: 0,
        };
        for outcome in &self.outcomes {
            match outcome.status {
                "succeeded" => counts.matches_succeeded += 1,
                "skipped" => counts.matches_skipped += 1,
                _ => counts.matches_failed += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub command: String,
    pub started_at: String,
    pub finished_at: String,
    pub counts: RunCounts,
    pub matches: Vec<MatchOutcome>,
    pub warnings: Vec<String>,
}
