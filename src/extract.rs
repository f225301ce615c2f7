use std::collections::{BTreeMap, BTreeSet};

use location_types::{EpisodeScriptData, LocationMention};
use tracing::debug;

use crate::breakdown::import_breakdown;
use crate::parser::parse_scene_headings;

/// Episode number → display title, passed to every stage that writes
/// usage records.
pub type EpisodeTitles = BTreeMap<u32, String>;

pub fn episode_titles(episodes: &[EpisodeScriptData]) -> EpisodeTitles {
    let mut titles = EpisodeTitles::new();
    for ep in episodes {
        titles.entry(ep.episode_number).or_insert_with(|| ep.title());
    }
    titles
}

/// Title for an episode, falling back to "Episode N".
pub fn title_for(titles: &EpisodeTitles, episode_number: u32) -> String {
    titles
        .get(&episode_number)
        .cloned()
        .unwrap_or_else(|| format!("Episode {episode_number}"))
}

/// Mentions for one episode. A non-empty breakdown wins outright; the
/// script text is only parsed when there is none.
pub fn extract_episode_mentions(episode: &EpisodeScriptData) -> Vec<LocationMention> {
    if episode.has_breakdown() {
        let scenes = episode.breakdown_scenes.as_deref().unwrap_or_default();
        let mentions = import_breakdown(scenes, episode.episode_number);
        debug!(
            episode = episode.episode_number,
            scenes = scenes.len(),
            mentions = mentions.len(),
            "imported breakdown"
        );
        return mentions;
    }

    let script = episode.script_text.as_deref().unwrap_or_default();
    let mentions = parse_scene_headings(script, episode.episode_number);
    debug!(
        episode = episode.episode_number,
        mentions = mentions.len(),
        "parsed scene headings"
    );
    mentions
}

/// Mentions for every episode, concatenated in input order.
///
/// Breakdown preference holds per episode number: once any record for an
/// episode carries a breakdown, script-only records for that episode add
/// nothing.
pub fn extract_mentions(episodes: &[EpisodeScriptData]) -> Vec<LocationMention> {
    let with_breakdown: BTreeSet<u32> = episodes
        .iter()
        .filter(|ep| ep.has_breakdown())
        .map(|ep| ep.episode_number)
        .collect();

    episodes
        .iter()
        .flat_map(|ep| {
            if !ep.has_breakdown() && with_breakdown.contains(&ep.episode_number) {
                debug!(episode = ep.episode_number, "script superseded by breakdown");
                return Vec::new();
            }
            extract_episode_mentions(ep)
        })
        .collect()
}
