//! Adaptive spec tuning from observed input characteristics

use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vassago_core::{PatternFamily, PatternSpec, MAX_SPARSITY, MIN_SPARSITY};

/// Locality ratio above which the window is shrunk.
const HIGH_LOCALITY_THRESHOLD: f64 = 0.8;

/// Smallest window the tuner will derive.
const MIN_TUNED_WINDOW: usize = 16;

/// Observed characteristics of the workload's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputCharacteristics {
    /// Typical sequence length seen in practice.
    pub average_sequence_length: usize,
    /// Largest sequence length that must be supported.
    pub max_sequence_length: usize,
    /// Observed fraction of attention mass that is local.
    pub locality_ratio: f64,
}

/// Tuning strategy: where to sit on the quality/memory trade-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningStrategy {
    /// Favor quality: lower sparsity band.
    Conservative,
    /// Favor memory: higher sparsity band.
    Aggressive,
    /// Middle ground.
    Balanced,
}

impl TuningStrategy {
    /// Sparsity band the strategy maps sequence lengths into.
    fn sparsity_band(self) -> (f64, f64) {
        match self {
            TuningStrategy::Conservative => (0.50, 0.90),
            TuningStrategy::Balanced => (0.60, 0.95),
            TuningStrategy::Aggressive => (0.70, 0.99),
        }
    }
}

/// Derive an adjusted spec from a base spec and observed inputs.
///
/// Pure and deterministic: the sparsity target is a monotonic log-scale
/// function of `max_sequence_length` within the strategy's band, and a
/// high locality ratio shrinks the window of window-bearing families
/// proportionally to the average sequence length.
pub fn tune(
    base: &PatternSpec,
    characteristics: &InputCharacteristics,
    strategy: TuningStrategy,
) -> Result<PatternSpec> {
    base.validate()?;

    let mut tuned = base.clone();
    tuned.sparsity_ratio = sparsity_for_length(characteristics.max_sequence_length, strategy);

    if characteristics.locality_ratio > HIGH_LOCALITY_THRESHOLD {
        let window = tuned_window(characteristics.average_sequence_length);
        shrink_window(&mut tuned.family, window);
    }

    debug!(
        family = tuned.family_name(),
        strategy = ?strategy,
        max_sequence_length = characteristics.max_sequence_length,
        sparsity = tuned.sparsity_ratio,
        "tuned pattern spec"
    );
    Ok(tuned)
}

/// Monotonic map from maximum sequence length into the strategy band.
///
/// Lengths are placed on a log2 scale between 256 and 65536; anything
/// shorter gets the band floor, anything longer the band ceiling.
fn sparsity_for_length(max_sequence_length: usize, strategy: TuningStrategy) -> f64 {
    let (lo, hi) = strategy.sparsity_band();
    let length = max_sequence_length.max(1) as f64;
    let position = ((length.log2() - 8.0) / 8.0).clamp(0.0, 1.0);
    (lo + (hi - lo) * position).clamp(MIN_SPARSITY, MAX_SPARSITY)
}

/// Window derived for highly local workloads: an eighth of the average
/// sequence length, floored at the minimum tuned window.
fn tuned_window(average_sequence_length: usize) -> usize {
    (average_sequence_length / 8).max(MIN_TUNED_WINDOW)
}

fn shrink_window(family: &mut PatternFamily, window: usize) {
    match family {
        PatternFamily::Longformer(p) => p.window_size = p.window_size.min(window),
        PatternFamily::BigBird(p) => p.window_size = p.window_size.min(window),
        PatternFamily::LocalGlobal(p) => {
            let half = (window / 2).max(1);
            p.left_context = p.left_context.min(half);
            if !p.causal {
                p.right_context = p.right_context.min(half);
            }
        }
        PatternFamily::Fixed(p) => p.half_width = p.half_width.min((window / 2).max(1)),
        PatternFamily::Strided(_) | PatternFamily::Random(_) | PatternFamily::Linformer(_) => {}
    }
}
