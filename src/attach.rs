//! Incremental attacher: fold fresh mentions into an existing catalog.
//!
//! Attachment only ever enriches groups. A mention that resembles no group
//! closely enough is dropped; it never mints a new group.

use std::collections::BTreeSet;

use location_types::{LocationGroup, LocationMention, SubLocation};
use tracing::debug;

use crate::config::MatchConfig;
use crate::extract::EpisodeTitles;
use crate::grouping::{empty_usage, main_sub_location};
use crate::similarity::best_match;
use crate::usage;

/// What happened to a batch of mentions.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct AttachReport {
    pub attached: usize,
    pub dropped: usize,
    /// Ids of the groups that received evidence.
    pub touched: BTreeSet<String>,
}

/// The sub-location that stands for the group as a whole: the "main"
/// sentinel if present, else the first one. A group with none gets a
/// fresh "main".
fn anchor_sub_location(group: &mut LocationGroup) -> &mut SubLocation {
    let slot = match group.sub_locations.iter().position(SubLocation::is_main) {
        Some(i) => i,
        None if !group.sub_locations.is_empty() => 0,
        None => {
            let main = main_sub_location(&group.parent_location_name, group.location_type);
            group.sub_locations.push(main);
            0
        }
    };
    &mut group.sub_locations[slot]
}

fn attach_one(group: &mut LocationGroup, mention: &LocationMention, titles: &EpisodeTitles) {
    let sub = anchor_sub_location(group);
    let scene = mention.scene_ref();
    if !sub.scene_references.contains(&scene) {
        sub.scene_references.push(scene);
    }
    let sub_id = sub.id.clone();

    let record = match group
        .episode_usage
        .iter()
        .position(|u| u.episode_number == mention.episode_number)
    {
        Some(i) => &mut group.episode_usage[i],
        None => {
            group
                .episode_usage
                .push(empty_usage(mention.episode_number, titles));
            let last = group.episode_usage.len() - 1;
            &mut group.episode_usage[last]
        }
    };
    record.scene_numbers.insert(mention.scene_number);
    record.sub_location_ids.insert(sub_id);
    if let Some(t) = &mention.time_of_day {
        record.time_of_day.insert(t.clone());
    }
}

/// Attach each mention to its most similar group when the score clears
/// `config.attach_threshold`, then recompute every touched group from
/// scratch.
pub fn attach_mentions(
    groups: &mut [LocationGroup],
    mentions: &[LocationMention],
    titles: &EpisodeTitles,
    config: &MatchConfig,
) -> AttachReport {
    let mut report = AttachReport::default();
    let mut touched = vec![false; groups.len()];

    for mention in mentions {
        let best = best_match(
            &mention.name,
            groups.iter().map(|g| g.parent_location_name.as_str()),
        );
        match best {
            Some((i, score)) if score >= config.attach_threshold => {
                attach_one(&mut groups[i], mention, titles);
                touched[i] = true;
                report.attached += 1;
            }
            _ => {
                debug!(
                    mention = %mention.name,
                    episode = mention.episode_number,
                    score = best.map(|(_, s)| s).unwrap_or(0.0),
                    "dropped mention below attach threshold"
                );
                report.dropped += 1;
            }
        }
    }

    for (group, _) in groups.iter_mut().zip(&touched).filter(|(_, t)| **t) {
        usage::recompute(group);
        report.touched.insert(group.id.clone());
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::seed_groups;
    use location_types::{LocationType, MAIN_SUB_LOCATION_ID, ReferenceEntry};
    use pretty_assertions::assert_eq;

    fn mention(name: &str, ep: u32, scene: u32) -> LocationMention {
        LocationMention {
            name: name.into(),
            full_name: name.into(),
            location_type: LocationType::Interior,
            episode_number: ep,
            scene_number: scene,
            scene_title: None,
            time_of_day: Some("NIGHT".into()),
        }
    }

    fn seeded() -> Vec<LocationGroup> {
        seed_groups(&[ReferenceEntry::from("Greenlit HQ"), ReferenceEntry::from("Harbor")])
    }

    #[test]
    fn test_attach_to_main_sub_location() {
        let mut groups = seeded();
        let mut titles = EpisodeTitles::new();
        titles.insert(2, "The Loft".into());
        let report = attach_mentions(
            &mut groups,
            &[mention("GREENLIT HQ", 2, 5), mention("Greenlit HQ", 3, 1)],
            &titles,
            &MatchConfig::default(),
        );

        assert_eq!(report.attached, 2);
        assert_eq!(report.dropped, 0);
        let g = &groups[0];
        assert_eq!(g.episodes_used, vec![2, 3]);
        assert_eq!(g.total_episodes, 2);
        assert_eq!(g.total_scenes, 2);
        assert_eq!(g.episode_usage[0].episode_title, "The Loft");
        assert_eq!(g.episode_usage[1].episode_title, "Episode 3");
        assert_eq!(g.sub_locations[0].id, MAIN_SUB_LOCATION_ID);
        assert_eq!(g.sub_locations[0].total_scenes, 2);
        assert!(g.time_of_day.contains("NIGHT"));
        assert_eq!(g.confidence, 1.0);
        assert_eq!(groups[1].total_episodes, 0);
    }

    #[test]
    fn test_below_threshold_never_creates_group() {
        let mut groups = seeded();
        let before = groups.clone();
        let report = attach_mentions(
            &mut groups,
            &[mention("Abandoned Warehouse", 1, 1)],
            &EpisodeTitles::new(),
            &MatchConfig::default(),
        );
        assert_eq!(report.attached, 0);
        assert_eq!(report.dropped, 1);
        assert!(report.touched.is_empty());
        assert_eq!(groups, before);
    }

    #[test]
    fn test_lower_bar_than_binding() {
        // "harbour dock" vs "harbor": 5 of 12 positions agree (0.42).
        // "harbors" vs "harbor": 6 of 7 (0.86).
        let mut groups = seeded();
        let report = attach_mentions(
            &mut groups,
            &[mention("Harbour Dock", 1, 1), mention("Harbors", 1, 2)],
            &EpisodeTitles::new(),
            &MatchConfig::default(),
        );
        assert_eq!(report.attached, 1);
        assert_eq!(groups[1].scenes_used.iter().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_attaches_between_the_two_thresholds() {
        // 10 of 21 positions agree: clears 0.45 but not 0.5.
        let score = crate::similarity::similarity("Greenlit Headquarters", "Greenlit HQ");
        let config = MatchConfig::default();
        assert!(score >= config.attach_threshold && score < config.canonical_threshold);

        let mut groups = seeded();
        let report = attach_mentions(
            &mut groups,
            &[mention("Greenlit Headquarters", 1, 3)],
            &EpisodeTitles::new(),
            &config,
        );
        assert_eq!(report.attached, 1);
        assert_eq!(groups[0].episodes_used, vec![1]);

        let mut groups = seeded();
        let strict = MatchConfig {
            attach_threshold: config.canonical_threshold,
            ..config
        };
        let report = attach_mentions(
            &mut groups,
            &[mention("Greenlit Headquarters", 1, 3)],
            &EpisodeTitles::new(),
            &strict,
        );
        assert_eq!(report.dropped, 1);
    }

    #[test]
    fn test_repeat_attachment_is_stable() {
        let mut groups = seeded();
        let ms = [mention("Harbor", 4, 2)];
        attach_mentions(&mut groups, &ms, &EpisodeTitles::new(), &MatchConfig::default());
        let once = groups.clone();
        attach_mentions(&mut groups, &ms, &EpisodeTitles::new(), &MatchConfig::default());
        assert_eq!(groups, once);
    }

    #[test]
    fn test_empty_catalog_drops_everything() {
        let mut groups: Vec<LocationGroup> = Vec::new();
        let report = attach_mentions(
            &mut groups,
            &[mention("Harbor", 1, 1)],
            &EpisodeTitles::new(),
            &MatchConfig::default(),
        );
        assert_eq!(report.dropped, 1);
        assert!(groups.is_empty());
    }
}
