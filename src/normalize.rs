//! Name canonicalization used as the grouping and lookup key.

/// Trim, collapse internal whitespace runs to one space, lowercase.
///
/// Only ever used as a key; never shown to users.
pub fn normalize(s: &str) -> String {
    collapse_whitespace(s).to_lowercase()
}

/// Trim and collapse whitespace runs, keeping the original case.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove the first case-insensitive occurrence of `needle` from `haystack`
/// and clean the leftover of surrounding dashes and whitespace.
///
/// "Greenlit HQ - Loft" minus "greenlit hq" → "Loft".
/// Returns `None` when `needle` does not occur.
pub fn strip_name(haystack: &str, needle: &str) -> Option<String> {
    let hay: Vec<char> = collapse_whitespace(haystack).chars().collect();
    let needle: Vec<char> = normalize(needle).chars().collect();
    if needle.is_empty() || needle.len() > hay.len() {
        return None;
    }

    let start = (0..=hay.len() - needle.len()).find(|&i| {
        hay[i..i + needle.len()]
            .iter()
            .zip(&needle)
            .all(|(h, n)| h.to_lowercase().eq(n.to_lowercase()))
    })?;

    let rest: String = hay[..start]
        .iter()
        .chain(&hay[start + needle.len()..])
        .collect();
    Some(trim_dashes(&rest).to_string())
}

/// Strip leading/trailing dashes and whitespace.
pub fn trim_dashes(s: &str) -> &str {
    s.trim_matches(|c: char| c == '-' || c == '\u{2013}' || c == '\u{2014}' || c.is_whitespace())
}

/// Lowercase ASCII-alphanumeric slug with single dashes, for ids.
pub fn slugify(s: &str) -> String {
    let mut slug = String::new();
    for c in s.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("location");
    }
    slug
}
