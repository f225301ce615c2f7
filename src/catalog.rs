//! End-to-end catalog runs.
//!
//! Full run: episodes → mentions (breakdown preferred per episode) →
//! groups → usage aggregates → reference binding → usage-ordered catalog.
//! Incremental run: existing groups + fresh episodes → attachment →
//! recomputed aggregates → usage-ordered catalog.

use location_types::{EpisodeScriptData, LocationGroup, ReferenceEntry};
use serde::Serialize;
use tracing::info;

use crate::attach::{AttachReport, attach_mentions};
use crate::canonical::{bind_references, seed_groups};
use crate::config::MatchConfig;
use crate::extract::{episode_titles, extract_mentions};
use crate::grouping::group_mentions;
use crate::usage::sort_by_usage;

/// Summary numbers for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub episodes: usize,
    pub mentions: usize,
    pub groups: usize,
    pub bound_groups: usize,
    pub sub_locations: usize,
    /// Mentions an incremental run could not attach.
    pub dropped_mentions: usize,
}

impl CatalogStats {
    pub fn for_groups(groups: &[LocationGroup]) -> Self {
        Self {
            groups: groups.len(),
            bound_groups: groups.iter().filter(|g| g.is_bound()).count(),
            sub_locations: groups.iter().map(|g| g.sub_locations.len()).sum(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub groups: Vec<LocationGroup>,
    pub stats: CatalogStats,
}

/// Build a catalog from scratch.
pub fn build_catalog(
    episodes: &[EpisodeScriptData],
    references: &[ReferenceEntry],
    config: &MatchConfig,
) -> Catalog {
    let titles = episode_titles(episodes);
    let mentions = extract_mentions(episodes);

    let mut groups = group_mentions(&mentions, &titles, config);
    bind_references(&mut groups, references, config);
    sort_by_usage(&mut groups);

    let stats = CatalogStats {
        episodes: episodes.len(),
        mentions: mentions.len(),
        ..CatalogStats::for_groups(&groups)
    };
    info!(
        episodes = stats.episodes,
        mentions = stats.mentions,
        groups = stats.groups,
        bound = stats.bound_groups,
        "built location catalog"
    );
    Catalog { groups, stats }
}

/// Catalog of trusted groups straight from a reference list, with no
/// episode evidence yet.
pub fn seed_from_references(references: &[ReferenceEntry]) -> Catalog {
    let groups = seed_groups(references);
    Catalog {
        stats: CatalogStats::for_groups(&groups),
        groups,
    }
}

/// Fold new episodes into existing groups. Never adds, renames or removes
/// a group.
pub fn extend_catalog(
    mut groups: Vec<LocationGroup>,
    episodes: &[EpisodeScriptData],
    config: &MatchConfig,
) -> (Catalog, AttachReport) {
    let titles = episode_titles(episodes);
    let mentions = extract_mentions(episodes);

    let report = attach_mentions(&mut groups, &mentions, &titles, config);
    sort_by_usage(&mut groups);

    let stats = CatalogStats {
        episodes: episodes.len(),
        mentions: mentions.len(),
        dropped_mentions: report.dropped,
        ..CatalogStats::for_groups(&groups)
    };
    info!(
        episodes = stats.episodes,
        attached = report.attached,
        dropped = report.dropped,
        touched = report.touched.len(),
        "extended location catalog"
    );
    (Catalog { groups, stats }, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use location_types::BreakdownScene;

    fn breakdown_episode(n: u32, locations: &[&str]) -> EpisodeScriptData {
        EpisodeScriptData {
            episode_number: n,
            episode_title: Some(format!("Ep {n}")),
            script_text: None,
            breakdown_scenes: Some(
                locations
                    .iter()
                    .enumerate()
                    .map(|(i, l)| BreakdownScene {
                        scene_number: Some(i as u32 + 1),
                        location: Some(l.to_string()),
                        ..Default::default()
                    })
                    .collect(),
            ),
        }
    }

    #[test]
    fn test_build_sorts_by_episode_count() {
        let episodes = vec![
            breakdown_episode(1, &["EXT. Pier"]),
            breakdown_episode(2, &["INT. Loft", "EXT. Pier"]),
            breakdown_episode(3, &["INT. Loft"]),
            breakdown_episode(4, &["INT. Loft"]),
        ];
        let catalog = build_catalog(&episodes, &[], &MatchConfig::default());
        let names: Vec<&str> = catalog
            .groups
            .iter()
            .map(|g| g.parent_location_name.as_str())
            .collect();
        assert_eq!(names, vec!["Loft", "Pier"]);
        assert_eq!(catalog.stats.mentions, 5);
        assert_eq!(catalog.stats.groups, 2);
        assert_eq!(catalog.stats.bound_groups, 0);
        assert_eq!(catalog.groups[1].episode_usage[0].episode_title, "Ep 1");
    }

    #[test]
    fn test_build_binds_references() {
        let episodes = vec![breakdown_episode(1, &["EXT. Harbour"])];
        let refs = vec![ReferenceEntry::from("Harbor")];
        let catalog = build_catalog(&episodes, &refs, &MatchConfig::default());
        assert_eq!(catalog.stats.bound_groups, 1);
        assert_eq!(
            catalog.groups[0].canonical_reference_name.as_deref(),
            Some("Harbor")
        );
    }

    #[test]
    fn test_extend_keeps_group_set() {
        let seeded = seed_from_references(&[ReferenceEntry::from("Loft"), "Pier".into()]);
        let episodes = vec![breakdown_episode(7, &["INT. Loft", "INT. Attic Room"])];
        let (catalog, report) = extend_catalog(seeded.groups, &episodes, &MatchConfig::default());
        assert_eq!(catalog.groups.len(), 2);
        assert_eq!(report.attached, 1);
        assert_eq!(catalog.stats.dropped_mentions, 1);
        assert_eq!(catalog.groups[0].parent_location_name, "Loft");
        assert_eq!(catalog.groups[0].episodes_used, vec![7]);
    }
}
