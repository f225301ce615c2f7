use std::collections::BTreeSet;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Id (and display name) of the sub-location that stands for the parent
/// location itself.
pub const MAIN_SUB_LOCATION_ID: &str = "main";

// ── Lenient field decoding ───────────────────────────────────────────────

/// Decode an optional field, mapping a value of the wrong shape to `None`
/// instead of rejecting the whole record.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient<T> {
        Value(T),
        Other(IgnoredAny),
    }

    Ok(match Option::<Lenient<T>>::deserialize(deserializer)? {
        Some(Lenient::Value(v)) => Some(v),
        Some(Lenient::Other(_)) | None => None,
    })
}

// ── Interior / exterior ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    #[default]
    Interior,
    Exterior,
    /// INT/EXT headings: the scene plays on both sides of the door.
    Both,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interior => "interior",
            Self::Exterior => "exterior",
            Self::Both => "both",
        }
    }

    /// Short slugline form, used by the CLI report.
    pub fn slug_prefix(&self) -> &'static str {
        match self {
            Self::Interior => "INT.",
            Self::Exterior => "EXT.",
            Self::Both => "INT/EXT.",
        }
    }
}

// ── Input: per-episode script data ───────────────────────────────────────

/// One structured scene record from a production breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownScene {
    /// Absent or malformed numbers fall back to the record's 1-based position.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub scene_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub scene_title: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
}

/// Everything known about one episode before extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeScriptData {
    pub episode_number: u32,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub episode_title: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub script_text: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub breakdown_scenes: Option<Vec<BreakdownScene>>,
}

impl EpisodeScriptData {
    /// Display title, falling back to "Episode N".
    pub fn title(&self) -> String {
        match &self.episode_title {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => format!("Episode {}", self.episode_number),
        }
    }

    /// True when a non-empty breakdown exists; it then replaces script parsing.
    pub fn has_breakdown(&self) -> bool {
        self.breakdown_scenes.as_ref().is_some_and(|s| !s.is_empty())
    }
}

// ── Canonical reference list ─────────────────────────────────────────────

/// An authoritative location name, either a bare string or a record
/// carrying `name` or `title`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceEntry {
    Name(String),
    Record {
        #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
}

impl ReferenceEntry {
    /// The usable label, if any. `name` wins over `title`.
    pub fn label(&self) -> Option<&str> {
        let raw = match self {
            Self::Name(n) => Some(n.as_str()),
            Self::Record { name, title } => name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .or(title.as_deref()),
        };
        raw.map(str::trim).filter(|s| !s.is_empty())
    }
}

impl From<&str> for ReferenceEntry {
    fn from(s: &str) -> Self {
        Self::Name(s.to_string())
    }
}

// ── Mentions ─────────────────────────────────────────────────────────────

/// One raw, per-scene occurrence of a location, before grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMention {
    pub name: String,
    pub full_name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub episode_number: u32,
    pub scene_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
}

impl LocationMention {
    pub fn scene_ref(&self) -> SceneRef {
        SceneRef {
            episode_number: self.episode_number,
            scene_number: self.scene_number,
        }
    }
}

// ── Catalog output ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRef {
    pub episode_number: u32,
    pub scene_number: u32,
}

/// A named area nested within a parent location ("Loft" in "Greenlit HQ").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubLocation {
    pub id: String,
    pub name: String,
    pub full_name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub scene_references: Vec<SceneRef>,
    /// Always `scene_references.len()`.
    pub total_scenes: usize,
}

impl SubLocation {
    pub fn is_main(&self) -> bool {
        self.id == MAIN_SUB_LOCATION_ID
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeUsageRecord {
    pub episode_number: u32,
    pub episode_title: String,
    pub scene_numbers: BTreeSet<u32>,
    /// Always `scene_numbers.len()`.
    pub scene_count: usize,
    pub sub_location_ids: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub time_of_day: BTreeSet<String>,
}

/// One canonical location across every episode that uses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationGroup {
    pub id: String,
    pub parent_location_name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub sub_locations: Vec<SubLocation>,
    pub episode_usage: Vec<EpisodeUsageRecord>,
    pub total_scenes: usize,
    pub total_episodes: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_reference_name: Option<String>,
    pub confidence: f64,
    pub episodes_used: Vec<u32>,
    pub scenes_used: BTreeSet<u32>,
    #[serde(default)]
    pub time_of_day: BTreeSet<String>,
    pub first_used_episode: u32,
    pub last_used_episode: u32,
}

impl LocationGroup {
    pub fn is_bound(&self) -> bool {
        self.canonical_reference_name.is_some()
    }

    pub fn sub_location(&self, id: &str) -> Option<&SubLocation> {
        self.sub_locations.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_script_text_decodes_as_absent() {
        let ep: EpisodeScriptData =
            serde_json::from_str(r#"{"episodeNumber": 4, "scriptText": 17}"#).unwrap();
        assert_eq!(ep.episode_number, 4);
        assert!(ep.script_text.is_none());
        assert_eq!(ep.title(), "Episode 4");
    }

    #[test]
    fn test_breakdown_scene_missing_fields() {
        let ep: EpisodeScriptData = serde_json::from_str(
            r#"{"episodeNumber": 1, "episodeTitle": "Pilot",
                "breakdownScenes": [{"sceneNumber": "x", "location": "INT. Loft"}, {}]}"#,
        )
        .unwrap();
        let scenes = ep.breakdown_scenes.as_ref().unwrap();
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].scene_number, None);
        assert_eq!(scenes[0].location.as_deref(), Some("INT. Loft"));
        assert!(scenes[1].location.is_none());
        assert!(ep.has_breakdown());
    }

    #[test]
    fn test_reference_entry_shapes() {
        let refs: Vec<ReferenceEntry> = serde_json::from_str(
            r#"["Greenlit HQ", {"name": "Harbor"}, {"title": "Old Mill"}, {"id": 3}, "  "]"#,
        )
        .unwrap();
        let labels: Vec<Option<&str>> = refs.iter().map(|r| r.label()).collect();
        assert_eq!(
            labels,
            vec![Some("Greenlit HQ"), Some("Harbor"), Some("Old Mill"), None, None]
        );
    }

    #[test]
    fn test_location_type_serializes_lowercase() {
        let json = serde_json::to_string(&LocationType::Both).unwrap();
        assert_eq!(json, "\"both\"");
    }
}
