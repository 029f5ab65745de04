use serde::{Deserialize, Serialize};

/// How query residues are compared against indexed residues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MatchingPolicy {
    /// Residues must be identical.
    #[default]
    Exact,
    /// Ambiguity codes (B, J, Z, X) also match each of their member residues.
    AminoAcid,
    /// As `AminoAcid`, and I/L are interchangeable.
    Indistinguishable,
}

/// Per-query matching options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingOptions {
    pub policy: MatchingPolicy,
    /// Largest tolerated fraction of `X` in a peptide under the non-exact policies.
    pub limit_x: f64,
}

impl Default for MatchingOptions {
    fn default() -> Self {
        Self { policy: MatchingPolicy::Exact, limit_x: 0.25 }
    }
}

impl MatchingOptions {
    pub fn with_policy(policy: MatchingPolicy) -> Self {
        Self { policy, ..Self::default() }
    }

    /// True when the peptide holds more `X` than `limit_x` allows; exact matching never rejects.
    pub fn rejects(&self, residues: &[u8]) -> bool {
        if self.policy == MatchingPolicy::Exact || residues.is_empty() {
            return false;
        }
        let x = residues.iter().filter(|&&r| r == b'X').count();
        x as f64 / residues.len() as f64 > self.limit_x
    }
}

/// Largest accepted `sampling_shift`; positions are 32-bit, so a wider stride samples nothing more.
pub const MAX_SAMPLING_SHIFT: u32 = 31;

/// Index construction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Every `1 << sampling_shift`-th suffix array row is kept.
    pub sampling_shift: u32,
    /// Build the reversed-text index needed by tag mapping.
    pub build_reverse: bool,
    /// Number of reverse sub-searches kept by the tag cache.
    pub cache_capacity: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { sampling_shift: 3, build_reverse: true, cache_capacity: 50 }
    }
}
