use crate::types::{ScoreResult, FALLBACK_SCORE, NO_RATIONALE};
use tracing::debug;

/// Separator between the score and the reason in `SCORE|REASON` answers.
pub const DELIMITER: char = '|';

/// Turn raw model text into a score. Never fails: anything unreadable becomes
/// the neutral fallback so one bad answer cannot trigger a suppress.
pub fn parse_response(raw: &str) -> ScoreResult {
    let (score_part, reason_part) = match raw.split_once(DELIMITER) {
        Some((score, reason)) => (score, Some(reason)),
        None => (raw, None),
    };

    let rationale = reason_part
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(NO_RATIONALE);

    let score = extract_score(score_part).unwrap_or_else(|| {
        debug!("No usable digit in model answer {:?}, using fallback", raw);
        FALLBACK_SCORE
    });

    ScoreResult::new(score, rationale)
}

/// First run of ASCII digits. "10" is read whole; any other run contributes its
/// leading digit only. Zero counts as no score.
fn extract_score(segment: &str) -> Option<u8> {
    let start = segment.find(|c: char| c.is_ascii_digit())?;
    let run: &str = {
        let rest = &segment[start..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };

    if run == "10" {
        return Some(10);
    }

    match run.as_bytes().first() {
        Some(b'0') | None => None,
        Some(digit) => Some(digit - b'0'),
    }
}

/// Split a phrase-list answer into at most `limit` phrases.
/// List markers and wrapping quotes are stripped; blank lines are ignored.
pub fn parse_phrases(raw: &str, limit: usize) -> Vec<String> {
    raw.lines()
        .map(clean_phrase)
        .filter(|line| !line.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}

fn clean_phrase(line: &str) -> &str {
    let line = line.trim();
    let line = line.trim_start_matches(|c: char| c == '-' || c == '*' || c == '•');
    let line = strip_list_number(line);
    line.trim().trim_matches(|c: char| c == '"' || c == '\'').trim()
}

/// Drop a leading "1. " or "2) " marker. The marker must be followed by whitespace,
/// so "3.5 hour course" keeps its number.
fn strip_list_number(line: &str) -> &str {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return line;
    }
    let rest = &line[digits..];
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some('.' | ')'), Some(c)) if c.is_whitespace() => &rest[1..],
        _ => line,
    }
}
