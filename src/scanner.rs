use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use location_types::{EpisodeScriptData, LocationGroup, ReferenceEntry};
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::CatalogError;

/// Extensions read as raw script text.
const SCRIPT_EXTENSIONS: &[&str] = &["txt", "fountain"];

/// Load every episode of a corpus.
///
/// `root` is either a JSON file holding an array of episodes, or a
/// directory laid out as:
///   {root}/{NN_Title}.json      structured episode (breakdown, title, …)
///   {root}/{NN_Title}.txt       script text for episode NN
///   {root}/{NN_Title}.fountain  same, Fountain format
///
/// A `.json` and a script file for the same NN merge into one episode.
/// Unreadable or malformed files are skipped with a warning. Episodes come
/// back sorted by number.
pub fn scan_corpus(root: &Path) -> Result<Vec<EpisodeScriptData>, CatalogError> {
    if !root.exists() {
        return Err(CatalogError::CorpusNotFound(root.to_path_buf()));
    }
    if root.is_file() {
        return read_json(root);
    }

    let mut episodes: BTreeMap<u32, EpisodeScriptData> = BTreeMap::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let numbered = split_episode_stem(stem);

        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };

        if ext == "json" {
            let Some(ep) = parse_episode_json(&content, numbered.as_ref().map(|(n, _)| *n)) else {
                warn!(path = %path.display(), "skipping malformed episode file");
                continue;
            };
            let fallback_title = numbered.map(|(_, t)| t).filter(|t| !t.is_empty());
            let slot = episodes
                .entry(ep.episode_number)
                .or_insert_with(|| EpisodeScriptData {
                    episode_number: ep.episode_number,
                    ..Default::default()
                });
            slot.episode_title = ep.episode_title.or(fallback_title).or(slot.episode_title.take());
            if ep.script_text.is_some() {
                slot.script_text = ep.script_text;
            }
            if ep.breakdown_scenes.is_some() {
                slot.breakdown_scenes = ep.breakdown_scenes;
            }
        } else if SCRIPT_EXTENSIONS.contains(&ext.as_str()) {
            let Some((number, title)) = numbered else {
                debug!(path = %path.display(), "script file has no episode number");
                continue;
            };
            let slot = episodes.entry(number).or_insert_with(|| EpisodeScriptData {
                episode_number: number,
                ..Default::default()
            });
            if slot.script_text.is_none() {
                slot.script_text = Some(content);
            }
            if slot.episode_title.is_none() && !title.is_empty() {
                slot.episode_title = Some(title);
            }
        }
    }

    debug!(root = %root.display(), episodes = episodes.len(), "scanned corpus");
    Ok(episodes.into_values().collect())
}

/// "03_The_Loft" → (3, "The Loft"); "12" → (12, "").
pub fn split_episode_stem(stem: &str) -> Option<(u32, String)> {
    let (digits, rest) = match stem.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => stem.split_at(idx),
        None => (stem, ""),
    };
    let number = digits.parse().ok()?;
    let title = rest
        .trim_start_matches(['_', '-', ' ', '.'])
        .replace('_', " ")
        .trim()
        .to_string();
    Some((number, title))
}

/// Decode one episode file. A numbered file may omit `episodeNumber`.
fn parse_episode_json(content: &str, number_from_name: Option<u32>) -> Option<EpisodeScriptData> {
    let mut value: serde_json::Value = serde_json::from_str(content).ok()?;
    let obj = value.as_object_mut()?;
    if !obj.get("episodeNumber").is_some_and(|v| v.is_u64()) {
        obj.insert("episodeNumber".into(), number_from_name?.into());
    }
    serde_json::from_value(value).ok()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let json = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
    serde_json::from_str(&json).map_err(|e| CatalogError::json(path, e))
}

/// A reference list is either a bare array or `{"locations": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReferenceFile {
    List(Vec<ReferenceEntry>),
    Wrapped { locations: Vec<ReferenceEntry> },
}

pub fn load_references(path: &Path) -> Result<Vec<ReferenceEntry>, CatalogError> {
    Ok(match read_json(path)? {
        ReferenceFile::List(refs) | ReferenceFile::Wrapped { locations: refs } => refs,
    })
}

pub fn load_catalog(path: &Path) -> Result<Vec<LocationGroup>, CatalogError> {
    read_json(path)
}

pub fn write_catalog(path: &Path, groups: &[LocationGroup]) -> Result<usize, CatalogError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))?;
    }
    let json = serde_json::to_string_pretty(groups).map_err(|e| CatalogError::json(path, e))?;
    fs::write(path, &json).map_err(|e| CatalogError::io(path, e))?;
    Ok(json.len())
}
