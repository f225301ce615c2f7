//! Binding groups to an authoritative reference list.

use std::collections::HashSet;

use location_types::{LocationGroup, LocationType, ReferenceEntry};
use tracing::debug;

use crate::config::MatchConfig;
use crate::grouping::{IdAllocator, group_id_base, main_sub_location};
use crate::normalize::normalize;
use crate::similarity::best_match;
use crate::usage;

/// Usable labels of a reference list, in order. Entries with neither a
/// name nor a title are skipped.
pub fn reference_names(references: &[ReferenceEntry]) -> Vec<&str> {
    references.iter().filter_map(ReferenceEntry::label).collect()
}

/// Best reference for `name`, if it clears `threshold`.
pub fn match_reference<'r>(
    name: &str,
    references: &[&'r str],
    threshold: f64,
) -> Option<(&'r str, f64)> {
    let (i, score) = best_match(name, references.iter().copied())?;
    (score >= threshold).then(|| (references[i], score))
}

/// Bind or clear the group's reference. A miss is a normal outcome: the
/// name is unset and confidence drops to 0.
pub fn bind_reference(group: &mut LocationGroup, references: &[&str], threshold: f64) -> bool {
    match match_reference(&group.parent_location_name, references, threshold) {
        Some((name, score)) => {
            debug!(
                group = %group.parent_location_name,
                reference = name,
                confidence = score,
                "bound reference"
            );
            group.canonical_reference_name = Some(name.to_string());
            group.confidence = score;
            true
        }
        None => {
            group.canonical_reference_name = None;
            group.confidence = 0.0;
            false
        }
    }
}

/// Bind every group; returns how many bound.
pub fn bind_references(
    groups: &mut [LocationGroup],
    references: &[ReferenceEntry],
    config: &MatchConfig,
) -> usize {
    let names = reference_names(references);
    groups
        .iter_mut()
        .map(|g| bind_reference(g, &names, config.canonical_threshold))
        .filter(|&bound| bound)
        .count()
}

/// One trusted group per distinct reference name, before any episode
/// evidence: confidence 1, no usage, and only the "main" sub-location.
pub fn seed_groups(references: &[ReferenceEntry]) -> Vec<LocationGroup> {
    let mut seen = HashSet::new();
    let mut ids = IdAllocator::default();
    let mut groups = Vec::new();

    for name in reference_names(references) {
        if !seen.insert(normalize(name)) {
            continue;
        }
        let mut group = LocationGroup {
            id: ids.allocate(&group_id_base(name)),
            parent_location_name: name.to_string(),
            location_type: LocationType::Interior,
            sub_locations: vec![main_sub_location(name, LocationType::Interior)],
            episode_usage: Vec::new(),
            total_scenes: 0,
            total_episodes: 0,
            canonical_reference_name: Some(name.to_string()),
            confidence: 1.0,
            episodes_used: Vec::new(),
            scenes_used: Default::default(),
            time_of_day: Default::default(),
            first_used_episode: 0,
            last_used_episode: 0,
        };
        usage::recompute(&mut group);
        groups.push(group);
    }
    groups
}
