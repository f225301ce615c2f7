//! Parent/sub-location relationship detection.

use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::{normalize, strip_name};

// "Greenlit HQ - Loft" → ("Greenlit HQ", "Loft"). Splits on the first dash.
static RE_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<parent>.+?)\s*-\s*(?P<child>.+)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentChild {
    pub parent: String,
    pub child: String,
}

impl ParentChild {
    fn new(parent: &str, child: &str) -> Self {
        Self {
            parent: parent.trim().to_string(),
            child: child.trim().to_string(),
        }
    }
}

/// Split a name on its first dash into (parent, child).
pub fn split_dash(name: &str) -> Option<(&str, &str)> {
    let caps = RE_DASH.captures(name.trim())?;
    let parent = caps.name("parent")?.as_str().trim();
    let child = caps.name("child")?.as_str().trim();
    if parent.is_empty() || child.is_empty() {
        return None;
    }
    Some((parent, child))
}

/// The part of a name that identifies its parent location: the text before
/// the first dash, or the whole name.
pub fn parent_part(name: &str) -> &str {
    split_dash(name).map(|(p, _)| p).unwrap_or_else(|| name.trim())
}

/// A location name with its dash split and normalized forms worked out
/// once, for callers comparing the same names many times over.
#[derive(Debug, Clone)]
pub struct NameParts<'a> {
    pub name: &'a str,
    pub key: String,
    /// (parent, child, normalized parent) when the name has a dash.
    pub split: Option<(&'a str, &'a str, String)>,
}

impl<'a> NameParts<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            key: normalize(name),
            split: split_dash(name).map(|(p, c)| (p, c, normalize(p))),
        }
    }
}

/// Decide whether one of two location names is a sub-location of the other.
///
/// In order: `a` is "B - child"; both share a dash parent; `b` is
/// "A - child"; and, when `containment` is on, one normalized name contains
/// the other. The containment step will happily call "Bar" the parent of
/// "Barn Loft"; callers wanting stricter matching turn it off.
pub fn detect_parent_child(a: &str, b: &str, containment: bool) -> Option<ParentChild> {
    detect_between(&NameParts::new(a), &NameParts::new(b), containment)
}

/// [`detect_parent_child`] over precomputed parts.
pub fn detect_between(
    a: &NameParts<'_>,
    b: &NameParts<'_>,
    containment: bool,
) -> Option<ParentChild> {
    if let Some((p, c, np)) = &a.split {
        if b.key == *np {
            return Some(ParentChild::new(p, c));
        }
    }

    if let (Some((pa, ca, npa)), Some((_, _, npb))) = (&a.split, &b.split) {
        if npa == npb {
            return Some(ParentChild::new(pa, ca));
        }
    }

    if let Some((p, c, np)) = &b.split {
        if a.key == *np {
            return Some(ParentChild::new(p, c));
        }
    }

    if containment {
        return detect_by_containment(a, b);
    }

    None
}

fn detect_by_containment(a: &NameParts<'_>, b: &NameParts<'_>) -> Option<ParentChild> {
    let (na, nb) = (&a.key, &b.key);
    if na.is_empty() || nb.is_empty() {
        return None;
    }

    let (la, lb) = (na.chars().count(), nb.chars().count());
    let (parent, longer) = if nb.contains(na.as_str()) && lb > la {
        (a.name, b.name)
    } else if na.contains(nb.as_str()) && la > lb {
        (b.name, a.name)
    } else {
        return None;
    };

    let child = strip_name(longer, parent)?;
    Some(ParentChild::new(parent, &child))
}
