//! Breakdown importer: location mentions from structured scene records.

use location_types::{BreakdownScene, LocationMention, LocationType};

use crate::normalize::collapse_whitespace;
use crate::parser::{prefix_type, split_heading_prefix, strip_heading_prefix};

/// Infer the location type of a breakdown location.
///
/// An explicit heading prefix decides on its own. Without one, interior and
/// exterior tokens are looked for anywhere in the string; neither means
/// interior.
pub fn infer_type(raw_location: &str) -> LocationType {
    if let (Some(prefix), _) = split_heading_prefix(raw_location) {
        return prefix_type(prefix);
    }
    let upper = raw_location.to_uppercase();
    let has_int = upper.contains("INT");
    let has_ext = upper.contains("EXT");
    match (has_int, has_ext) {
        (true, true) => LocationType::Both,
        (false, true) => LocationType::Exterior,
        _ => LocationType::Interior,
    }
}

/// One mention per breakdown record that names a location.
///
/// Records without a usable location are skipped. A record without a scene
/// number takes its 1-based position in the list.
pub fn import_breakdown(scenes: &[BreakdownScene], episode_number: u32) -> Vec<LocationMention> {
    scenes
        .iter()
        .enumerate()
        .filter_map(|(i, scene)| {
            let raw = scene.location.as_deref()?.trim();
            let name = collapse_whitespace(strip_heading_prefix(raw));
            if name.is_empty() {
                return None;
            }
            Some(LocationMention {
                full_name: name.clone(),
                name,
                location_type: infer_type(raw),
                episode_number,
                scene_number: scene.scene_number.unwrap_or(i as u32 + 1),
                scene_title: scene
                    .scene_title
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
                time_of_day: scene
                    .time_of_day
                    .as_deref()
                    .map(collapse_whitespace)
                    .filter(|t| !t.is_empty()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(n: u32, location: Option<&str>) -> BreakdownScene {
        BreakdownScene {
            scene_number: Some(n),
            scene_title: None,
            location: location.map(str::to_string),
            time_of_day: None,
        }
    }

    #[test]
    fn test_prefix_stripped_from_name() {
        let m = import_breakdown(&[scene(4, Some("INT. Greenlit HQ - Loft"))], 1);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].name, "Greenlit HQ - Loft");
        assert_eq!(m[0].location_type, LocationType::Interior);
        assert_eq!(m[0].scene_number, 4);
        assert_eq!(m[0].time_of_day, None);
    }

    #[test]
    fn test_records_without_location_skipped() {
        let scenes = vec![scene(1, None), scene(2, Some("   ")), scene(3, Some("EXT. Pier"))];
        let m = import_breakdown(&scenes, 7);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].name, "Pier");
        assert_eq!(m[0].location_type, LocationType::Exterior);
        assert_eq!(m[0].episode_number, 7);
    }

    #[test]
    fn test_type_inference() {
        assert_eq!(infer_type("INT-EXT. Car"), LocationType::Both);
        assert_eq!(infer_type("ext. pier"), LocationType::Exterior);
        assert_eq!(infer_type("Greenlit HQ"), LocationType::Interior);
    }

    #[test]
    fn test_prefix_decides_over_name_tokens() {
        assert_eq!(infer_type("INT. Next Door Cafe"), LocationType::Interior);
        assert_eq!(infer_type("EXT. Mint Street"), LocationType::Exterior);
        assert_eq!(infer_type("I/E. Van"), LocationType::Both);
        // No prefix: the name itself is searched.
        assert_eq!(infer_type("Next Door"), LocationType::Exterior);

        let m = import_breakdown(&[scene(1, Some("INT. Next Door Cafe"))], 1);
        assert_eq!(m[0].name, "Next Door Cafe");
        assert_eq!(m[0].location_type, LocationType::Interior);
    }

    #[test]
    fn test_positional_scene_number_and_metadata() {
        let scenes = vec![BreakdownScene {
            scene_number: None,
            scene_title: Some(" Cold open ".into()),
            location: Some("INT. Loft".into()),
            time_of_day: Some("night".into()),
        }];
        let m = import_breakdown(&scenes, 2);
        assert_eq!(m[0].scene_number, 1);
        assert_eq!(m[0].scene_title.as_deref(), Some("Cold open"));
        assert_eq!(m[0].time_of_day.as_deref(), Some("night"));
    }
}
