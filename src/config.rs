//! Matching thresholds and heuristics switches.

/// Knobs for the matching stages. Passed explicitly to every stage that
/// needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Minimum similarity to bind a group to a canonical reference name.
    pub canonical_threshold: f64,
    /// Minimum similarity to attach a fresh mention to an existing group.
    /// Lower than `canonical_threshold`: evidence is attached to an
    /// already-trusted entity, not used to mint one.
    pub attach_threshold: f64,
    /// Enable the substring-containment fallback of the parent/child
    /// detector. Over-merges short names found inside unrelated longer ones
    /// ("Bar" inside "Barn"); kept on for compatibility.
    pub containment_fallback: bool,
}

pub const DEFAULT_CANONICAL_THRESHOLD: f64 = 0.5;
pub const DEFAULT_ATTACH_THRESHOLD: f64 = 0.45;

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            canonical_threshold: DEFAULT_CANONICAL_THRESHOLD,
            attach_threshold: DEFAULT_ATTACH_THRESHOLD,
            containment_fallback: true,
        }
    }
}
