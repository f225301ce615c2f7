//! Grouping engine: raw mentions → canonical location groups.
//!
//! Mentions are bucketed by normalized name. Every pair of buckets is run
//! through the parent/child detector, and each hit unions the two buckets
//! in a disjoint set. Only once the set has settled are groups built, so
//! "HQ - Loft" and "HQ Annex", which only relate through "HQ", land in one
//! group whatever order the edges were found in.

use std::collections::{BTreeMap, HashMap, HashSet};

use location_types::{
    EpisodeUsageRecord, LocationGroup, LocationMention, LocationType, MAIN_SUB_LOCATION_ID,
    SubLocation,
};
use tracing::debug;

use crate::config::MatchConfig;
use crate::extract::{EpisodeTitles, title_for};
use crate::hierarchy::{NameParts, detect_between, parent_part, split_dash};
use crate::normalize::{normalize, slugify, strip_name};
use crate::usage;

// ── Disjoint set over bucket indices ─────────────────────────────────

/// Union-find over arena indices. The root of every set is its smallest
/// index, i.e. the earliest-seen bucket.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Merge the sets of `a` and `b`. Returns false if already merged.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        let (keep, absorb) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[absorb] = keep;
        true
    }

    /// Members of every set, sets ordered by root, members ascending.
    pub fn sets(&mut self) -> Vec<Vec<usize>> {
        let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..self.parent.len() {
            let root = self.find(i);
            by_root.entry(root).or_default().push(i);
        }
        by_root.into_values().collect()
    }
}

// ── Id allocation ────────────────────────────────────────────────────

/// Hands out slug ids, suffixing `-2`, `-3`, … on collision.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    used: HashSet<String>,
}

impl IdAllocator {
    pub(crate) fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    pub(crate) fn allocate(&mut self, base: &str) -> String {
        let mut id = base.to_string();
        let mut n = 1;
        while self.used.contains(&id) {
            n += 1;
            id = format!("{base}-{n}");
        }
        self.used.insert(id.clone());
        id
    }
}

pub(crate) fn group_id_base(parent_name: &str) -> String {
    format!("loc-{}", slugify(parent_name))
}

// ── Votes ────────────────────────────────────────────────────────────

/// Most frequent name by normalized key. Counting is insertion-ordered and
/// ties go to the earliest-seen candidate; the first spelling seen is the
/// one returned.
pub fn most_frequent<'a, I>(names: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(String, &'a str, usize)> = Vec::new();
    for name in names {
        let key = normalize(name);
        if key.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(k, _, _)| *k == key) {
            Some(entry) => entry.2 += 1,
            None => counts.push((key, name.trim(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (_, display, count) in &counts {
        if best.is_none_or(|(_, c)| *count > c) {
            best = Some((*display, *count));
        }
    }
    best.map(|(d, _)| d.to_string())
}

/// Majority location type. A tie for first place resolves to interior.
pub fn majority_type<I>(types: I) -> LocationType
where
    I: IntoIterator<Item = LocationType>,
{
    let mut counts = [0usize; 3];
    for t in types {
        counts[match t {
            LocationType::Interior => 0,
            LocationType::Exterior => 1,
            LocationType::Both => 2,
        }] += 1;
    }
    let max = counts.iter().copied().max().unwrap_or(0);
    if max == 0 || counts.iter().filter(|&&c| c == max).count() > 1 {
        return LocationType::Interior;
    }
    match counts.iter().position(|&c| c == max) {
        Some(1) => LocationType::Exterior,
        Some(2) => LocationType::Both,
        _ => LocationType::Interior,
    }
}

/// Which sub-location of `parent` a mention named `name` belongs to.
/// `None` means the parent location itself.
pub fn sub_location_name(name: &str, parent: &str) -> Option<String> {
    if let Some((p, c)) = split_dash(name) {
        if normalize(p) == normalize(parent) {
            return Some(c.to_string());
        }
    }
    if normalize(name) == normalize(parent) {
        return None;
    }
    strip_name(name, parent).filter(|s| !s.is_empty())
}

// ── Grouping ─────────────────────────────────────────────────────────

/// All mentions sharing one normalized name.
#[derive(Debug)]
struct Bucket<'a> {
    key: String,
    /// First-seen spelling, fed to the detector.
    representative: &'a str,
    /// Indices into the mention slice, ascending.
    mentions: Vec<usize>,
}

fn bucket_mentions(mentions: &[LocationMention]) -> Vec<Bucket<'_>> {
    let mut buckets: Vec<Bucket<'_>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, m) in mentions.iter().enumerate() {
        let key = normalize(&m.name);
        if key.is_empty() {
            continue;
        }
        match index.get(&key) {
            Some(&b) => buckets[b].mentions.push(i),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push(Bucket {
                    key,
                    representative: m.name.as_str(),
                    mentions: vec![i],
                });
            }
        }
    }
    buckets
}

fn set_mentions(set: &[usize], buckets: &[Bucket<'_>]) -> Vec<usize> {
    let mut idx: Vec<usize> = set
        .iter()
        .flat_map(|&b| buckets[b].mentions.iter().copied())
        .collect();
    idx.sort_unstable();
    idx
}

fn canonical_name(idx: &[usize], mentions: &[LocationMention]) -> String {
    most_frequent(idx.iter().map(|&i| parent_part(&mentions[i].name)))
        .unwrap_or_else(|| mentions[idx[0]].name.trim().to_string())
}

/// Merge mentions into canonical groups with nested sub-locations and
/// per-episode usage. Groups come back in discovery order with aggregates
/// computed and no reference binding.
pub fn group_mentions(
    mentions: &[LocationMention],
    titles: &EpisodeTitles,
    config: &MatchConfig,
) -> Vec<LocationGroup> {
    let buckets = bucket_mentions(mentions);
    let mut sets = DisjointSet::new(buckets.len());

    let parts: Vec<NameParts<'_>> = buckets
        .iter()
        .map(|b| NameParts::new(b.representative))
        .collect();

    for i in 0..buckets.len() {
        for j in (i + 1)..buckets.len() {
            if let Some(edge) = detect_between(&parts[i], &parts[j], config.containment_fallback) {
                debug!(
                    a = %buckets[i].key,
                    b = %buckets[j].key,
                    parent = %edge.parent,
                    child = %edge.child,
                    "merge edge"
                );
                sets.union(i, j);
            }
        }
    }

    // Two sets can still elect the same canonical name; fold them together
    // and re-elect until every name is unique.
    let members = loop {
        let members = sets.sets();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut merged = false;
        for set in &members {
            let name = canonical_name(&set_mentions(set, &buckets), mentions);
            match seen.get(&normalize(&name)) {
                Some(&other) => merged |= sets.union(other, set[0]),
                None => {
                    seen.insert(normalize(&name), set[0]);
                }
            }
        }
        if !merged {
            break members;
        }
    };

    let mut ids = IdAllocator::default();
    let groups: Vec<LocationGroup> = members
        .iter()
        .map(|set| build_group(&set_mentions(set, &buckets), mentions, titles, &mut ids))
        .collect();

    debug!(
        mentions = mentions.len(),
        buckets = buckets.len(),
        groups = groups.len(),
        "grouped mentions"
    );
    groups
}

fn build_group(
    idx: &[usize],
    mentions: &[LocationMention],
    titles: &EpisodeTitles,
    ids: &mut IdAllocator,
) -> LocationGroup {
    let parent = canonical_name(idx, mentions);

    let mut sub_ids = IdAllocator::default();
    sub_ids.reserve(MAIN_SUB_LOCATION_ID);
    let mut subs: Vec<SubLocation> = Vec::new();
    let mut sub_types: Vec<Vec<LocationType>> = Vec::new();
    let mut sub_index: HashMap<Option<String>, usize> = HashMap::new();
    let mut by_episode: BTreeMap<u32, EpisodeUsageRecord> = BTreeMap::new();

    for m in idx.iter().map(|&i| &mentions[i]) {
        let sub_name = sub_location_name(&m.name, &parent);
        let key = sub_name.as_deref().map(normalize);
        let slot = *sub_index.entry(key).or_insert_with(|| {
            let sub = match &sub_name {
                Some(name) => SubLocation {
                    id: sub_ids.allocate(&slugify(name)),
                    name: name.clone(),
                    full_name: m.full_name.clone(),
                    location_type: m.location_type,
                    scene_references: Vec::new(),
                    total_scenes: 0,
                },
                None => main_sub_location(&parent, m.location_type),
            };
            subs.push(sub);
            sub_types.push(Vec::new());
            subs.len() - 1
        });

        let sub = &mut subs[slot];
        sub_types[slot].push(m.location_type);
        let scene = m.scene_ref();
        if !sub.scene_references.contains(&scene) {
            sub.scene_references.push(scene);
        }

        let record = by_episode
            .entry(m.episode_number)
            .or_insert_with(|| empty_usage(m.episode_number, titles));
        record.scene_numbers.insert(m.scene_number);
        record.sub_location_ids.insert(sub.id.clone());
        if let Some(t) = &m.time_of_day {
            record.time_of_day.insert(t.clone());
        }
    }

    for (sub, types) in subs.iter_mut().zip(sub_types) {
        sub.location_type = majority_type(types);
    }

    let mut group = LocationGroup {
        id: ids.allocate(&group_id_base(&parent)),
        location_type: majority_type(idx.iter().map(|&i| mentions[i].location_type)),
        parent_location_name: parent,
        sub_locations: subs,
        episode_usage: by_episode.into_values().collect(),
        total_scenes: 0,
        total_episodes: 0,
        canonical_reference_name: None,
        confidence: 0.0,
        episodes_used: Vec::new(),
        scenes_used: Default::default(),
        time_of_day: Default::default(),
        first_used_episode: 0,
        last_used_episode: 0,
    };
    usage::recompute(&mut group);
    group
}

/// The sentinel sub-location standing for the parent location itself.
pub fn main_sub_location(parent: &str, location_type: LocationType) -> SubLocation {
    SubLocation {
        id: MAIN_SUB_LOCATION_ID.to_string(),
        name: MAIN_SUB_LOCATION_ID.to_string(),
        full_name: parent.to_string(),
        location_type,
        scene_references: Vec::new(),
        total_scenes: 0,
    }
}

pub(crate) fn empty_usage(episode_number: u32, titles: &EpisodeTitles) -> EpisodeUsageRecord {
    EpisodeUsageRecord {
        episode_number,
        episode_title: title_for(titles, episode_number),
        scene_numbers: Default::default(),
        scene_count: 0,
        sub_location_ids: Default::default(),
        time_of_day: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mention(name: &str, ep: u32, scene: u32, t: LocationType) -> LocationMention {
        LocationMention {
            name: name.to_string(),
            full_name: name.to_string(),
            location_type: t,
            episode_number: ep,
            scene_number: scene,
            scene_title: None,
            time_of_day: Some("DAY".into()),
        }
    }

    fn group(mentions: &[LocationMention]) -> Vec<LocationGroup> {
        group_mentions(mentions, &EpisodeTitles::new(), &MatchConfig::default())
    }

    #[test]
    fn test_disjoint_set_chains() {
        let mut ds = DisjointSet::new(5);
        ds.union(3, 4);
        ds.union(1, 3);
        ds.union(0, 2);
        assert_eq!(ds.find(4), 1);
        assert_eq!(ds.sets(), vec![vec![0, 2], vec![1, 3, 4]]);
        assert!(!ds.union(4, 1));
    }

    #[test]
    fn test_parent_and_sub_location_merge() {
        let ms = vec![
            mention("Greenlit HQ - Loft", 1, 1, LocationType::Interior),
            mention("Greenlit HQ", 2, 1, LocationType::Interior),
        ];
        let groups = group(&ms);
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.parent_location_name, "Greenlit HQ");
        assert_eq!(g.id, "loc-greenlit-hq");
        let subs: Vec<&str> = g.sub_locations.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(subs, vec!["Loft", "main"]);
        assert_eq!(g.sub_locations[0].id, "loft");
        assert_eq!(g.total_episodes, 2);
        assert_eq!(g.total_scenes, 2);
        assert_eq!(g.episode_usage[0].episode_title, "Episode 1");
    }

    #[test]
    fn test_chain_converges_regardless_of_order() {
        let forward = vec![
            // "HQ - Loft" and "HQ Annex" only relate through "HQ".
            mention("HQ - Loft", 1, 1, LocationType::Interior),
            mention("HQ Annex", 1, 2, LocationType::Interior),
            mention("HQ", 1, 3, LocationType::Interior),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        for ms in [forward, backward] {
            let groups = group(&ms);
            assert_eq!(groups.len(), 1, "{groups:?}");
            assert_eq!(groups[0].parent_location_name, "HQ");
            assert_eq!(groups[0].total_scenes, 3);
        }
    }

    #[test]
    fn test_siblings_share_dash_parent() {
        let ms = vec![
            mention("HQ - Loft", 1, 1, LocationType::Interior),
            mention("HQ - Kitchen", 2, 4, LocationType::Interior),
        ];
        let groups = group(&ms);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].parent_location_name, "HQ");
        assert_eq!(groups[0].sub_locations.len(), 2);
        assert!(groups[0].sub_location(MAIN_SUB_LOCATION_ID).is_none());
    }

    #[test]
    fn test_canonical_name_tie_goes_to_first_seen() {
        let ms = vec![
            mention("Big Kitchen", 1, 1, LocationType::Interior),
            mention("kitchen", 1, 2, LocationType::Interior),
        ];
        let groups = group(&ms);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].parent_location_name, "Big Kitchen");
    }

    #[test]
    fn test_containment_flag_off_keeps_groups_apart() {
        let ms = vec![
            mention("Bar", 1, 1, LocationType::Interior),
            mention("Barn", 1, 2, LocationType::Exterior),
        ];
        assert_eq!(group(&ms).len(), 1);

        let strict = MatchConfig {
            containment_fallback: false,
            ..MatchConfig::default()
        };
        assert_eq!(group_mentions(&ms, &EpisodeTitles::new(), &strict).len(), 2);
    }

    #[test]
    fn test_type_majority_and_tie() {
        assert_eq!(
            majority_type([LocationType::Exterior, LocationType::Exterior, LocationType::Both]),
            LocationType::Exterior
        );
        assert_eq!(
            majority_type([LocationType::Exterior, LocationType::Both]),
            LocationType::Interior
        );
        assert_eq!(majority_type(Vec::new()), LocationType::Interior);
    }

    #[test]
    fn test_most_frequent_counts_normalized() {
        let names = ["Pier", "Harbor", "HARBOR ", "pier", "harbor"];
        assert_eq!(most_frequent(names).as_deref(), Some("Harbor"));
        assert_eq!(most_frequent(["", "  "]), None);
    }

    #[test]
    fn test_usage_records_dedupe_scenes() {
        let ms = vec![
            mention("Pier", 3, 2, LocationType::Exterior),
            mention("PIER", 3, 2, LocationType::Exterior),
            mention("Pier", 1, 7, LocationType::Exterior),
        ];
        let groups = group(&ms);
        let g = &groups[0];
        assert_eq!(g.location_type, LocationType::Exterior);
        assert_eq!(g.episodes_used, vec![1, 3]);
        assert_eq!(g.episode_usage[1].scene_count, 1);
        assert_eq!(g.sub_locations[0].total_scenes, 2);
        assert_eq!(g.total_scenes, 2);
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let ms = vec![
            mention("HQ - Loft", 1, 1, LocationType::Interior),
            mention("Pier", 1, 2, LocationType::Exterior),
            mention("HQ", 2, 1, LocationType::Interior),
        ];
        assert_eq!(group(&ms), group(&ms));
    }

    #[test]
    fn test_sub_location_named_main_gets_distinct_id() {
        let ms = vec![
            mention("HQ - Main", 1, 1, LocationType::Interior),
            mention("HQ", 1, 2, LocationType::Interior),
        ];
        let g = &group(&ms)[0];
        let ids: Vec<&str> = g.sub_locations.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["main-2", "main"]);
    }
}
