//! Scene heading parser for free-text scripts.

use std::sync::LazyLock;

use location_types::{LocationMention, LocationType};
use regex::Regex;

use crate::normalize::{collapse_whitespace, trim_dashes};

// ── Heading grammar ──────────────────────────────────────────────────
//
// Real sluglines:
//   INT. KITCHEN - DAY
//   EXT. BACKYARD - NIGHT
//   INT/EXT. GREENLIT HQ - LOFT - CONTINUOUS
//   int. greenlit hq
//   I/E. PARKED CAR - MOMENTS LATER
//   EXT. PIER - NIGHT (FLASHBACK)
//   INT. KITCHEN - DAY 2
//
// A heading is `<prefix> <location text> [- <time>]`. The prefix is
// case-insensitive and must open the line.

/// Every accepted heading prefix. Combined forms must precede the bare
/// ones so `INT./EXT.` is not read as `INT.` plus junk.
pub const HEADING_PREFIXES: &[&str] = &[
    "INT./EXT.", "EXT./INT.", "INT/EXT.", "EXT/INT.", "INT-EXT.", "INT.-EXT.", "I/E.", "INT.",
    "EXT.",
];

/// Words that may make up a trailing time-of-day segment.
pub const TIME_WORDS: &[&str] = &[
    "DAY", "NIGHT", "MORNING", "AFTERNOON", "EVENING", "DAWN", "DUSK", "SUNRISE", "SUNSET",
    "NOON", "MIDNIGHT", "CONTINUOUS", "CONT'D", "LATER", "MOMENTS", "MOMENT", "SAME", "TIME",
    "LATE", "EARLY", "MAGIC", "HOUR", "PRE-DAWN",
];

/// Default time of day when a heading carries none.
pub const DEFAULT_TIME_OF_DAY: &str = "DAY";

/// Regex fragment matching any heading prefix, longest first.
pub fn build_prefix_regex() -> String {
    let mut all: Vec<&str> = HEADING_PREFIXES.to_vec();
    all.sort_by_key(|p| std::cmp::Reverse(p.len()));
    let alts: Vec<String> = all.iter().map(|p| regex::escape(p)).collect();
    format!("(?:{})", alts.join("|"))
}

static RE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?im)^[ \t]*(?P<prefix>{})[ \t]*(?P<rest>[^\r\n]+)",
        build_prefix_regex()
    ))
    .unwrap()
});

/// Leading prefix only, for structured records whose location string may
/// or may not carry one.
static RE_LEADING_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^\s*(?P<prefix>{})\s*", build_prefix_regex())).unwrap()
});

/// Classify a heading prefix.
pub fn prefix_type(prefix: &str) -> LocationType {
    let upper = prefix.to_uppercase();
    let has_int = upper.contains("INT") || upper.starts_with("I/");
    let has_ext = upper.contains("EXT") || upper.contains("/E");
    match (has_int, has_ext) {
        (true, true) => LocationType::Both,
        (false, true) => LocationType::Exterior,
        _ => LocationType::Interior,
    }
}

/// Split a leading `INT.`/`EXT.`/`INT/EXT.` prefix, if present, from the
/// rest of the location string.
pub fn split_heading_prefix(raw: &str) -> (Option<&str>, &str) {
    match RE_LEADING_PREFIX.captures(raw) {
        Some(caps) => {
            let prefix = caps.name("prefix").map(|m| m.as_str());
            let end = caps.get(0).map_or(0, |m| m.end());
            (prefix, raw[end..].trim())
        }
        None => (None, raw.trim()),
    }
}

pub fn strip_heading_prefix(raw: &str) -> &str {
    split_heading_prefix(raw).1
}

// Trailing "(FLASHBACK)", "(CONT'D)" and the like after a time segment.
static RE_TRAILING_PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s*\([^()]*\))+\s*$").unwrap());

/// A segment reads as a time of day when its first word, minus any digit
/// suffix, is a time word: "NIGHT (FLASHBACK)", "DAY 2", "LATER THAT NIGHT".
fn is_time_phrase(segment: &str) -> bool {
    let head = RE_TRAILING_PARENS.replace(segment, "");
    let Some(first) = head.split_whitespace().next() else {
        return false;
    };
    let word = first
        .trim_end_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | ',' | ':' | ';'))
        .to_uppercase();
    TIME_WORDS.contains(&word.as_str())
}

/// Split "GREENLIT HQ - LOFT - NIGHT" into ("GREENLIT HQ - LOFT", Some("NIGHT")).
///
/// Only a trailing segment opening with a time word counts as the time, so
/// a sub-location after a dash is not mistaken for one.
pub fn split_time(rest: &str) -> (&str, Option<&str>) {
    let rest = rest.trim();
    if let Some(idx) = rest.rfind(" - ").or_else(|| rest.rfind('-')) {
        let (location, tail) = rest.split_at(idx);
        let time = trim_dashes(tail);
        if is_time_phrase(time) && !trim_dashes(location).is_empty() {
            return (trim_dashes(location), Some(time));
        }
    }
    (trim_dashes(rest), None)
}

/// Extract one mention per scene heading, in reading order.
///
/// Scene numbers count headings from 1 within the episode. Empty text
/// yields nothing.
pub fn parse_scene_headings(script: &str, episode_number: u32) -> Vec<LocationMention> {
    let mut mentions = Vec::new();
    let mut scene_number = 0;

    for caps in RE_HEADING.captures_iter(script) {
        scene_number += 1;

        let Some(prefix) = caps.name("prefix") else {
            continue;
        };
        let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or("");
        let (location, time) = split_time(rest);
        let name = collapse_whitespace(location);
        if name.is_empty() {
            continue;
        }

        mentions.push(LocationMention {
            full_name: name.clone(),
            name,
            location_type: prefix_type(prefix.as_str()),
            episode_number,
            scene_number,
            scene_title: None,
            time_of_day: Some(
                time.map(collapse_whitespace)
                    .unwrap_or_else(|| DEFAULT_TIME_OF_DAY.to_string()),
            ),
        });
    }

    mentions
}
