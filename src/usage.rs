//! Episode usage aggregation.
//!
//! Every derived number on a group is recomputed from its usage records and
//! sub-locations in one pass. Nothing patches totals incrementally, so the
//! result does not depend on the order evidence arrived in.

use std::collections::BTreeSet;

use location_types::LocationGroup;

/// Re-derive all aggregates of `group` from `episode_usage` and
/// `sub_locations`.
///
/// - each record's `scene_count` is the size of its scene set;
/// - each sub-location's `total_scenes` is its reference count;
/// - `episodes_used` is the ascending list of episodes with any scene;
/// - `scenes_used` is the union of scene numbers across episodes;
/// - `total_scenes` counts distinct (episode, scene) pairs, i.e. the sum of
///   per-episode scene counts, since scene numbers restart every episode;
/// - first/last used episode are the extremes of `episodes_used`, or 0.
pub fn recompute(group: &mut LocationGroup) {
    group.episode_usage.retain(|u| !u.scene_numbers.is_empty());
    group.episode_usage.sort_by_key(|u| u.episode_number);
    group.episode_usage.dedup_by(|later, earlier| {
        if later.episode_number != earlier.episode_number {
            return false;
        }
        earlier.scene_numbers.append(&mut later.scene_numbers);
        earlier.sub_location_ids.append(&mut later.sub_location_ids);
        earlier.time_of_day.append(&mut later.time_of_day);
        true
    });

    for record in &mut group.episode_usage {
        record.scene_count = record.scene_numbers.len();
    }
    for sub in &mut group.sub_locations {
        sub.total_scenes = sub.scene_references.len();
    }

    let mut episodes: Vec<u32> = group
        .episode_usage
        .iter()
        .map(|u| u.episode_number)
        .collect();
    episodes.dedup();

    group.scenes_used = group
        .episode_usage
        .iter()
        .flat_map(|u| u.scene_numbers.iter().copied())
        .collect();
    group.time_of_day = group
        .episode_usage
        .iter()
        .flat_map(|u| u.time_of_day.iter().cloned())
        .collect::<BTreeSet<_>>();
    group.total_scenes = group.episode_usage.iter().map(|u| u.scene_count).sum();
    group.total_episodes = episodes.len();
    group.first_used_episode = episodes.first().copied().unwrap_or(0);
    group.last_used_episode = episodes.last().copied().unwrap_or(0);
    group.episodes_used = episodes;
}

/// Order groups by episode count, most-used first. Stable: equal counts keep
/// their discovery order.
pub fn sort_by_usage(groups: &mut [LocationGroup]) {
    groups.sort_by(|a, b| b.total_episodes.cmp(&a.total_episodes));
}
