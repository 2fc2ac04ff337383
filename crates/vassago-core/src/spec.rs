//! Pattern specifications: sparsity family plus parameters

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Lower clamp for the target sparsity ratio.
pub const MIN_SPARSITY: f64 = 0.10;

/// Upper clamp for the target sparsity ratio.
pub const MAX_SPARSITY: f64 = 0.99;

/// Parameters for the strided family.
///
/// A position attends to itself and to every position whose distance is
/// congruent to one of the configured offsets modulo `stride_size`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StridedParams {
    /// Stride between attended positions.
    pub stride_size: usize,
    /// Offsets within each stride period (taken modulo `stride_size`).
    pub offsets: Vec<usize>,
}

impl Default for StridedParams {
    fn default() -> Self {
        Self {
            stride_size: 128,
            offsets: vec![0],
        }
    }
}

/// Parameters for the fixed family: a symmetric band around the diagonal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedParams {
    /// Half-width of the band (`|i - j| <= half_width`).
    pub half_width: usize,
}

impl Default for FixedParams {
    fn default() -> Self {
        Self { half_width: 2 }
    }
}

/// Parameters for the random family.
///
/// The diagonal is always set; additional pairs are drawn uniformly until
/// the nonzero count reaches the target implied by the spec's sparsity
/// ratio. Reproducible under a fixed seed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomParams {
    /// Seed for the pair-sampling RNG.
    pub random_seed: u64,
}

impl Default for RandomParams {
    fn default() -> Self {
        Self { random_seed: 42 }
    }
}

/// Parameters for the local window family with independent context sizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalGlobalParams {
    /// Positions attended to the left of each query.
    pub left_context: usize,
    /// Positions attended to the right of each query.
    pub right_context: usize,
    /// Causal masking: collapses the right context to zero.
    pub causal: bool,
}

impl Default for LocalGlobalParams {
    fn default() -> Self {
        Self {
            left_context: 64,
            right_context: 64,
            causal: false,
        }
    }
}

/// Parameters for the BigBird family: local window + random blocks +
/// global tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigBirdParams {
    /// Local window width (radius is `window_size / 2`).
    pub window_size: usize,
    /// Contiguous block size for the random-block component.
    pub block_size: usize,
    /// Randomly selected target blocks per query block.
    pub num_random_blocks: usize,
    /// Fraction of positions promoted to global tokens.
    pub global_token_ratio: f64,
    /// Seed for random block selection.
    pub random_seed: u64,
}

impl Default for BigBirdParams {
    fn default() -> Self {
        Self {
            window_size: 192,
            block_size: 64,
            num_random_blocks: 3,
            global_token_ratio: 0.1,
            random_seed: 42,
        }
    }
}

// global_token_ratio is validated finite, so reflexivity holds.
impl Eq for BigBirdParams {}

impl Hash for BigBirdParams {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.window_size.hash(state);
        self.block_size.hash(state);
        self.num_random_blocks.hash(state);
        self.global_token_ratio.to_bits().hash(state);
        self.random_seed.hash(state);
    }
}

/// Parameters for the Longformer family: sliding window + global indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LongformerParams {
    /// Window width (radius is `window_size / 2`).
    pub window_size: usize,
    /// Positions whose full row and column are set (global tokens).
    pub global_indices: Vec<usize>,
}

impl Default for LongformerParams {
    fn default() -> Self {
        Self {
            window_size: 512,
            global_indices: vec![0, 1, 2, 3],
        }
    }
}

/// Parameters for the Linformer family.
///
/// Not a genuine sparsity pattern: models the effective attention support
/// after a low-rank projection. Every query attends to the first
/// `min(projection_dim, n)` key positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinformerParams {
    /// Rank of the key/value projection.
    pub projection_dim: usize,
}

impl Default for LinformerParams {
    fn default() -> Self {
        Self {
            projection_dim: 256,
        }
    }
}

/// Sparsity pattern family, each variant carrying only its own parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum PatternFamily {
    /// Strided attention at configurable offsets.
    Strided(StridedParams),
    /// Fixed symmetric band.
    Fixed(FixedParams),
    /// Seeded uniform random pairs up to the sparsity target.
    Random(RandomParams),
    /// Local window with independent left/right context.
    LocalGlobal(LocalGlobalParams),
    /// Window + random blocks + global tokens.
    #[serde(rename = "bigbird")]
    BigBird(BigBirdParams),
    /// Window + fixed global indices.
    Longformer(LongformerParams),
    /// Low-rank projection support proxy.
    Linformer(LinformerParams),
}

impl PatternFamily {
    /// Canonical family name.
    pub fn name(&self) -> &'static str {
        match self {
            PatternFamily::Strided(_) => "strided",
            PatternFamily::Fixed(_) => "fixed",
            PatternFamily::Random(_) => "random",
            PatternFamily::LocalGlobal(_) => "local_global",
            PatternFamily::BigBird(_) => "bigbird",
            PatternFamily::Longformer(_) => "longformer",
            PatternFamily::Linformer(_) => "linformer",
        }
    }

    /// Build a family with default parameters from its canonical name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "strided" => Ok(PatternFamily::Strided(StridedParams::default())),
            "fixed" => Ok(PatternFamily::Fixed(FixedParams::default())),
            "random" => Ok(PatternFamily::Random(RandomParams::default())),
            "local_global" => Ok(PatternFamily::LocalGlobal(LocalGlobalParams::default())),
            "bigbird" => Ok(PatternFamily::BigBird(BigBirdParams::default())),
            "longformer" => Ok(PatternFamily::Longformer(LongformerParams::default())),
            "linformer" => Ok(PatternFamily::Linformer(LinformerParams::default())),
            other => Err(Error::UnsupportedFamily { name: other.into() }),
        }
    }

    /// Validate family-specific parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            PatternFamily::Strided(p) => {
                if p.stride_size == 0 {
                    return Err(Error::invalid_parameter("stride_size", "must be positive"));
                }
            }
            PatternFamily::Fixed(_) | PatternFamily::Random(_) | PatternFamily::LocalGlobal(_) => {
            }
            PatternFamily::BigBird(p) => {
                if p.window_size == 0 {
                    return Err(Error::invalid_parameter("window_size", "must be positive"));
                }
                if p.block_size == 0 {
                    return Err(Error::invalid_parameter("block_size", "must be positive"));
                }
                if !p.global_token_ratio.is_finite()
                    || !(0.0..=1.0).contains(&p.global_token_ratio)
                {
                    return Err(Error::invalid_parameter(
                        "global_token_ratio",
                        format!("must be in [0, 1], got {}", p.global_token_ratio),
                    ));
                }
            }
            PatternFamily::Longformer(p) => {
                if p.window_size == 0 {
                    return Err(Error::invalid_parameter("window_size", "must be positive"));
                }
            }
            PatternFamily::Linformer(p) => {
                if p.projection_dim == 0 {
                    return Err(Error::invalid_parameter(
                        "projection_dim",
                        "must be positive",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Window width for window-bearing families, if any.
    pub fn window_size(&self) -> Option<usize> {
        match self {
            PatternFamily::Longformer(p) => Some(p.window_size),
            PatternFamily::BigBird(p) => Some(p.window_size),
            PatternFamily::LocalGlobal(p) => Some(p.left_context + p.right_context),
            _ => None,
        }
    }
}

/// Immutable description of a pattern to build.
///
/// `sparsity_ratio` is a target, not a guarantee: the realized sparsity of
/// the generated mask is always reported alongside via [`MaskStatistics`].
///
/// [`MaskStatistics`]: crate::MaskStatistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Pattern family and its parameters.
    pub family: PatternFamily,
    /// Default sequence length for generation.
    pub sequence_length: usize,
    /// Number of attention heads (no effect on mask shape).
    pub num_heads: usize,
    /// Head dimension (retained for downstream metric scaling).
    pub head_dim: usize,
    /// Target fraction of zero entries, clamped to `[0.10, 0.99]`.
    pub sparsity_ratio: f64,
}

// sparsity_ratio is validated finite, so reflexivity holds.
impl Eq for PatternSpec {}

impl Hash for PatternSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family.hash(state);
        self.sequence_length.hash(state);
        self.num_heads.hash(state);
        self.head_dim.hash(state);
        self.sparsity_ratio.to_bits().hash(state);
    }
}

impl PatternSpec {
    /// Create a spec with default shape parameters.
    pub fn new(family: PatternFamily) -> Self {
        Self {
            family,
            sequence_length: 1024,
            num_heads: 8,
            head_dim: 64,
            sparsity_ratio: 0.9,
        }
    }

    /// Set the default sequence length.
    pub fn with_sequence_length(mut self, sequence_length: usize) -> Self {
        self.sequence_length = sequence_length;
        self
    }

    /// Set head count and dimension.
    pub fn with_heads(mut self, num_heads: usize, head_dim: usize) -> Self {
        self.num_heads = num_heads;
        self.head_dim = head_dim;
        self
    }

    /// Set the target sparsity ratio.
    pub fn with_sparsity(mut self, sparsity_ratio: f64) -> Self {
        self.sparsity_ratio = sparsity_ratio;
        self
    }

    /// Target sparsity clamped to the supported range.
    pub fn effective_sparsity(&self) -> f64 {
        self.sparsity_ratio.clamp(MIN_SPARSITY, MAX_SPARSITY)
    }

    /// Canonical name of the spec's family.
    pub fn family_name(&self) -> &'static str {
        self.family.name()
    }

    /// Validate shared and family-specific parameters.
    pub fn validate(&self) -> Result<()> {
        if self.sequence_length == 0 {
            return Err(Error::invalid_parameter(
                "sequence_length",
                "must be positive",
            ));
        }
        if self.num_heads == 0 {
            return Err(Error::invalid_parameter("num_heads", "must be positive"));
        }
        if self.head_dim == 0 {
            return Err(Error::invalid_parameter("head_dim", "must be positive"));
        }
        if !self.sparsity_ratio.is_finite() {
            return Err(Error::invalid_parameter(
                "sparsity_ratio",
                "must be finite",
            ));
        }
        self.family.validate()
    }

    /// Stable fingerprint of `(spec, sequence_length)`, used as a cache key.
    pub fn fingerprint(&self, sequence_length: usize) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        sequence_length.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_names_round_trip() {
        for name in [
            "strided",
            "fixed",
            "random",
            "local_global",
            "bigbird",
            "longformer",
            "linformer",
        ] {
            let family = PatternFamily::from_name(name).unwrap();
            assert_eq!(family.name(), name);
        }
    }

    #[test]
    fn unknown_family_rejected() {
        let err = PatternFamily::from_name("reformer").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFamily { .. }));
    }

    #[test]
    fn sparsity_clamps_to_range() {
        let spec = PatternSpec::new(PatternFamily::Fixed(FixedParams::default()))
            .with_sparsity(1.5);
        assert_eq!(spec.effective_sparsity(), MAX_SPARSITY);

        let spec = spec.with_sparsity(0.0);
        assert_eq!(spec.effective_sparsity(), MIN_SPARSITY);
    }

    #[test]
    fn zero_stride_rejected() {
        let spec = PatternSpec::new(PatternFamily::Strided(StridedParams {
            stride_size: 0,
            offsets: vec![0],
        }));
        assert!(matches!(
            spec.validate(),
            Err(Error::InvalidParameter { field: "stride_size", .. })
        ));
    }

    #[test]
    fn fingerprint_distinguishes_lengths() {
        let spec = PatternSpec::new(PatternFamily::Fixed(FixedParams::default()));
        assert_ne!(spec.fingerprint(128), spec.fingerprint(256));
        assert_eq!(spec.fingerprint(128), spec.fingerprint(128));
    }

    #[test]
    fn serde_tagging_uses_family_names() {
        let spec = PatternSpec::new(PatternFamily::BigBird(BigBirdParams::default()));
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"family\":\"bigbird\""));

        let back: PatternSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
