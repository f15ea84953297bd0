use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;

use crate::model::{ExtraKind, ReplacementReason, TossDecision, WicketKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallPosition {
    pub over_number: i64,
    pub ball_in_over: i64,
    pub ball_number: i64,
}

// "12.4" -> over 12, ball 4, absolute ball 76. A trailing letter suffix on the
// ball part ("12.4a" for a re-bowled delivery) still resolves.
pub fn parse_ball_notation(raw: &str) -> Option<BallPosition> {
    let trimmed = raw.trim();
    let (over_part, ball_part) = trimmed.split_once('.')?;

    let over_number: i64 = over_part.trim().parse().ok()?;
    let digits: String = ball_part
        .trim()
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    let ball_in_over: i64 = digits.parse().ok()?;

    Some(BallPosition {
        over_number,
        ball_in_over,
        ball_number: over_number * 6 + ball_in_over,
    })
}

pub fn parse_umpires(raw: &str) -> (Option<String>, Option<String>) {
    let mut names = raw
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    (names.next(), names.next())
}

pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 4] = ["%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%Y-%m-%d"];

    let trimmed = raw.trim();
    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

pub fn parse_debuts(raw: &str) -> Option<Vec<String>> {
    let debuts: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    if debuts.is_empty() { None } else { Some(debuts) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventFacts {
    pub runs_scored: i64,
    pub extras: i64,
    pub extra_kind: Option<ExtraKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DismissalFacts {
    pub kind: Option<WicketKind>,
    pub fielder: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TossCall {
    pub winner: String,
    pub decision: TossDecision,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementDraft {
    pub player_out: Option<String>,
    pub player_in: Option<String>,
    pub team: Option<String>,
    pub reason: ReplacementReason,
}

#[derive(Debug)]
pub struct EventTextParser {
    wide: Regex,
    noball: Regex,
    legbye: Regex,
    bye: Regex,
    penalty: Regex,
    runs: Regex,
    four: Regex,
    six: Regex,
    score: Regex,
    caught_fielder: Regex,
    stumped_fielder: Regex,
    runout_fielder: Regex,
    caught_token: Regex,
    stumped_token: Regex,
    bowled_token: Regex,
}

impl EventTextParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            wide: Regex::new(r"(?i)(\d+)?\s*\bwides?\b")
                .context("failed to compile wide regex")?,
            noball: Regex::new(r"(?i)\bno[\s-]?balls?\b")
                .context("failed to compile no-ball regex")?,
            legbye: Regex::new(r"(?i)(\d+)?\s*\bleg[\s-]?byes?\b")
                .context("failed to compile leg-bye regex")?,
            bye: Regex::new(r"(?i)(\d+)?\s*\bbyes?\b")
                .context("failed to compile bye regex")?,
            penalty: Regex::new(r"(?i)(\d+)?\s*\bpenalty(?:\s+runs?)?\b")
                .context("failed to compile penalty regex")?,
            runs: Regex::new(r"(?i)\b(\d+)\s*runs?\b")
                .context("failed to compile runs regex")?,
            four: Regex::new(r"(?i)\bfour\b").context("failed to compile four regex")?,
            six: Regex::new(r"(?i)\bsix\b").context("failed to compile six regex")?,
            score: Regex::new(r"(\d+)\s*/\s*(\d+)")
                .context("failed to compile score regex")?,
            caught_fielder: Regex::new(
                r"\b[Cc](?:aught)?\s+(?:by\s+)?([A-Z][\w.'-]*(?:\s+[A-Z][\w.'-]*)*)",
            )
            .context("failed to compile caught-fielder regex")?,
            stumped_fielder: Regex::new(
                r"\b[Ss]t(?:umped)?\s+(?:by\s+)?([A-Z][\w.'-]*(?:\s+[A-Z][\w.'-]*)*)",
            )
            .context("failed to compile stumped-fielder regex")?,
            runout_fielder: Regex::new(r"(?i)run\s+out\s*\(([^)]+)\)")
                .context("failed to compile run-out-fielder regex")?,
            caught_token: Regex::new(r"\b[Cc]\s+[A-Z]")
                .context("failed to compile caught-token regex")?,
            stumped_token: Regex::new(r"\b[Ss]t\s+[A-Z]")
                .context("failed to compile stumped-token regex")?,
            bowled_token: Regex::new(r"\b[Bb]\s+[A-Z]")
                .context("failed to compile bowled-token regex")?,
        })
    }

    // Runs off the bat and extras decompose independently: on a no-ball the
    // batsman can still score, while on wides/byes/leg-byes/penalties any
    // digits in the text belong to the extra.
    pub fn parse_runs_and_extras(&self, raw: &str) -> EventFacts {
        let text = raw.trim();
        if text.is_empty() {
            return EventFacts::default();
        }

        let mut extras = 0;
        let mut extra_kind = None;

        if let Some(captures) = self.wide.captures(text) {
            extras = capture_count(&captures);
            extra_kind = Some(ExtraKind::Wide);
        }
        if self.noball.is_match(text) {
            extras = 1;
            extra_kind = Some(ExtraKind::NoBall);
        }
        if let Some(captures) = self.legbye.captures(text) {
            extras = capture_count(&captures);
            extra_kind = Some(ExtraKind::LegBye);
        } else if let Some(captures) = self.bye.captures(text) {
            extras = capture_count(&captures);
            extra_kind = Some(ExtraKind::Bye);
        }
        if let Some(captures) = self.penalty.captures(text) {
            extras = capture_count(&captures);
            extra_kind = Some(ExtraKind::Penalty);
        }

        let batsman_can_score = !matches!(
            extra_kind,
            Some(ExtraKind::Wide)
                | Some(ExtraKind::Bye)
                | Some(ExtraKind::LegBye)
                | Some(ExtraKind::Penalty)
        );

        let runs_scored = if !batsman_can_score {
            0
        } else if self.four.is_match(text) || text == "4" {
            4
        } else if self.six.is_match(text) || text == "6" {
            6
        } else if let Some(captures) = self.runs.captures(text) {
            captures
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        } else {
            0
        };

        EventFacts {
            runs_scored,
            extras,
            extra_kind,
        }
    }

    pub fn parse_wicket(&self, raw: &str) -> Option<DismissalFacts> {
        let text = raw.trim();
        let lower = text.to_lowercase();
        if !lower.contains("out") && !lower.contains("wicket") {
            return None;
        }

        // Run out and stumped before caught, and caught before bowled, so the
        // scorecard form "c Smith b Jones" classifies by the fielding credit.
        let (kind, fielder) = if lower.contains("run out") {
            (Some(WicketKind::RunOut), self.first_capture(&self.runout_fielder, text))
        } else if lower.contains("stumped") || self.stumped_token.is_match(text) {
            (Some(WicketKind::Stumped), self.first_capture(&self.stumped_fielder, text))
        } else if lower.contains("lbw") || lower.contains("leg before") {
            (Some(WicketKind::Lbw), None)
        } else if lower.contains("caught") || self.caught_token.is_match(text) {
            (Some(WicketKind::Caught), self.first_capture(&self.caught_fielder, text))
        } else if lower.contains("hit wicket") {
            (Some(WicketKind::HitWicket), None)
        } else if lower.contains("bowled") || self.bowled_token.is_match(text) {
            (Some(WicketKind::Bowled), None)
        } else {
            (None, None)
        };

        Some(DismissalFacts { kind, fielder })
    }

    pub fn parse_score(&self, raw: &str) -> Option<(i64, i64)> {
        let captures = self.score.captures(raw)?;
        let runs = captures.get(1)?.as_str().parse().ok()?;
        let wickets = captures.get(2)?.as_str().parse().ok()?;
        Some((runs, wickets))
    }

    fn first_capture(&self, pattern: &Regex, text: &str) -> Option<String> {
        pattern
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().trim().to_string())
    }
}

fn capture_count(captures: &regex::Captures<'_>) -> i64 {
    captures
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1)
}

#[derive(Debug)]
pub struct MetadataTextParser {
    toss: Regex,
    replacement_text: Regex,
}

#[derive(Debug, Deserialize)]
struct ReplacementPayload {
    #[serde(rename = "out")]
    player_out: Option<String>,
    #[serde(rename = "in")]
    player_in: Option<String>,
    team: Option<String>,
    #[serde(rename = "type")]
    reason: Option<String>,
}

impl MetadataTextParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            toss: Regex::new(r"(?i)^(.*?),\s*who\s+(?:chose|opted|elected)\s+to\s+(bat|field|bowl)")
                .context("failed to compile toss regex")?,
            replacement_text: Regex::new(
                r"(?i)^(.+?)\s+replaced\s+by\s+(.+?)(?:\s*\(([^)]*)\))?\s*$",
            )
            .context("failed to compile replacement regex")?,
        })
    }

    // "Mumbai Indians, who chose to field" -> winner + decision. Sides that
    // "elected to bowl" are toss decisions to field.
    pub fn parse_toss(&self, raw: &str) -> Option<TossCall> {
        let captures = self.toss.captures(raw.trim())?;
        let winner = captures.get(1)?.as_str().trim().to_string();
        if winner.is_empty() {
            return None;
        }
        let decision = match captures.get(2)?.as_str().to_lowercase().as_str() {
            "bat" => TossDecision::Bat,
            _ => TossDecision::Field,
        };
        Some(TossCall { winner, decision })
    }

    pub fn parse_replacements(&self, raw: &str) -> Vec<ReplacementDraft> {
        let text = raw.trim();
        if text.is_empty() {
            return Vec::new();
        }

        if text.starts_with('[') || text.starts_with('{') {
            if let Some(drafts) = self.parse_replacement_json(text) {
                return drafts;
            }
        }

        text.split(';')
            .filter_map(|segment| self.parse_replacement_segment(segment))
            .collect()
    }

    fn parse_replacement_json(&self, text: &str) -> Option<Vec<ReplacementDraft>> {
        let payloads: Vec<ReplacementPayload> = if text.starts_with('[') {
            serde_json::from_str(text).ok()?
        } else {
            vec![serde_json::from_str(text).ok()?]
        };

        Some(
            payloads
                .into_iter()
                .map(|payload| ReplacementDraft {
                    reason: payload
                        .reason
                        .as_deref()
                        .map(ReplacementReason::classify)
                        .unwrap_or(ReplacementReason::Other),
                    player_out: crate::util::non_empty(payload.player_out),
                    player_in: crate::util::non_empty(payload.player_in),
                    team: crate::util::non_empty(payload.team),
                })
                .collect(),
        )
    }

    // "Jones replaced by Smith (Mumbai Indians, concussion)"
    fn parse_replacement_segment(&self, segment: &str) -> Option<ReplacementDraft> {
        let captures = self.replacement_text.captures(segment.trim())?;
        let player_out = captures.get(1).map(|m| m.as_str().trim().to_string())?;
        let player_in = captures.get(2).map(|m| m.as_str().trim().to_string())?;

        let mut team = None;
        let mut reason = ReplacementReason::Other;
        if let Some(parenthetical) = captures.get(3) {
            reason = ReplacementReason::classify(parenthetical.as_str());
            team = parenthetical
                .as_str()
                .split(',')
                .map(str::trim)
                .find(|part| {
                    !part.is_empty() && ReplacementReason::classify(part) == ReplacementReason::Other
                })
                .map(str::to_string);
        }

        Some(ReplacementDraft {
            player_out: Some(player_out),
            player_in: Some(player_in),
            team,
            reason,
        })
    }
}
