//! Cross-spec comparison over a grid of sequence lengths

use crate::error::{EngineError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use vassago_core::{AttentionMask, PatternSpec};
use vassago_graph::{analyze, AnalysisKind, FlowBudget};
use vassago_patterns::PatternCache;

/// Metric computed per `(spec, sequence_length)` cell.
///
/// Every metric is a deterministic function of the generated mask; there
/// is no simulated execution behind any of these figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Realized sparsity of the mask.
    Sparsity,
    /// Memory reduction ratio.
    MemoryReduction,
    /// Compute reduction estimate.
    ComputeReduction,
    /// Degree-based connectivity score.
    Connectivity,
    /// Windowed locality index.
    Locality,
    /// Composite efficiency score.
    Efficiency,
}

impl MetricKind {
    /// Canonical metric name.
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::Sparsity => "sparsity",
            MetricKind::MemoryReduction => "memory_reduction",
            MetricKind::ComputeReduction => "compute_reduction",
            MetricKind::Connectivity => "connectivity",
            MetricKind::Locality => "locality",
            MetricKind::Efficiency => "efficiency",
        }
    }
}

/// One metric value within a comparison cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    /// Metric kind.
    pub metric: MetricKind,
    /// Value in `[0, 1]`.
    pub value: f64,
}

/// Metrics for one `(spec, sequence_length)` cell of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    /// Spec label (`family[index]`).
    pub label: String,
    /// Index of the spec in the compared set.
    pub spec_index: usize,
    /// Sequence length of this cell.
    pub sequence_length: usize,
    /// Requested metric values.
    pub values: Vec<MetricValue>,
}

/// Per-spec score used in summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecScore {
    /// Spec label.
    pub label: String,
    /// Metric value averaged over the compared sequence lengths.
    pub value: f64,
}

/// Best/worst/average/range for one metric across specs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Metric kind.
    pub metric: MetricKind,
    /// Dominating spec.
    pub best: SpecScore,
    /// Weakest spec.
    pub worst: SpecScore,
    /// Mean over all specs.
    pub average: f64,
    /// `best - worst`.
    pub range: f64,
}

/// Output of [`ComparisonEngine::compare`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// One entry per `(spec, sequence_length)` cell.
    pub entries: Vec<ComparisonEntry>,
    /// One summary per requested metric.
    pub summaries: Vec<MetricSummary>,
    /// Narrative recommendations keyed off metric dominance.
    pub recommendations: Vec<String>,
}

/// Composes generation, statistics, and graph analysis across specs.
///
/// No hidden state beyond the shared mask cache; safe to call
/// concurrently.
pub struct ComparisonEngine {
    cache: Arc<PatternCache>,
}

impl ComparisonEngine {
    /// Create an engine over a shared mask cache.
    pub fn new(cache: Arc<PatternCache>) -> Self {
        Self { cache }
    }

    /// Compare specs across a grid of sequence lengths.
    ///
    /// The grid is evaluated in parallel; results are deterministic and
    /// ordered by `(spec_index, sequence_length)`.
    pub fn compare(
        &self,
        specs: &[PatternSpec],
        sequence_lengths: &[usize],
        metrics: &[MetricKind],
    ) -> Result<ComparisonReport> {
        if specs.is_empty() {
            return Err(EngineError::EmptyInput("specs"));
        }
        if sequence_lengths.is_empty() {
            return Err(EngineError::EmptyInput("sequence_lengths"));
        }
        if metrics.is_empty() {
            return Err(EngineError::EmptyInput("metrics"));
        }

        let grid: Vec<(usize, usize)> = (0..specs.len())
            .flat_map(|s| sequence_lengths.iter().map(move |&n| (s, n)))
            .collect();

        let entries: Vec<ComparisonEntry> = grid
            .par_iter()
            .map(|&(spec_index, sequence_length)| {
                let spec = &specs[spec_index];
                let mask = self.cache.get_or_generate(spec, sequence_length)?;
                let values = metrics
                    .iter()
                    .map(|&metric| {
                        Ok(MetricValue {
                            metric,
                            value: evaluate_metric(&mask, metric)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(ComparisonEntry {
                    label: spec_label(spec, spec_index),
                    spec_index,
                    sequence_length,
                    values,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let summaries = summarize(specs, sequence_lengths, metrics, &entries);
        let recommendations = recommend(&summaries);
        info!(
            specs = specs.len(),
            lengths = sequence_lengths.len(),
            metrics = metrics.len(),
            "pattern comparison complete"
        );

        Ok(ComparisonReport {
            entries,
            summaries,
            recommendations,
        })
    }
}

fn spec_label(spec: &PatternSpec, index: usize) -> String {
    format!("{}[{}]", spec.family_name(), index)
}

fn evaluate_metric(mask: &AttentionMask, metric: MetricKind) -> Result<f64> {
    let stats = mask.statistics();
    let value = match metric {
        MetricKind::Sparsity => stats.sparsity(),
        MetricKind::MemoryReduction => stats.memory_reduction_ratio,
        MetricKind::ComputeReduction => stats.compute_reduction_ratio,
        MetricKind::Connectivity => {
            let analysis = analyze(mask, AnalysisKind::Connectivity, &FlowBudget::default())?;
            analysis
                .connectivity
                .map(|c| c.connectivity_score)
                .unwrap_or(0.0)
        }
        MetricKind::Locality => {
            let analysis = analyze(mask, AnalysisKind::Locality, &FlowBudget::default())?;
            analysis.locality.map(|l| l.locality_index).unwrap_or(0.0)
        }
        MetricKind::Efficiency => {
            let analysis = analyze(mask, AnalysisKind::Efficiency, &FlowBudget::default())?;
            analysis
                .efficiency
                .map(|e| e.efficiency_score)
                .unwrap_or(0.0)
        }
    };
    Ok(value)
}

fn summarize(
    specs: &[PatternSpec],
    sequence_lengths: &[usize],
    metrics: &[MetricKind],
    entries: &[ComparisonEntry],
) -> Vec<MetricSummary> {
    metrics
        .iter()
        .map(|&metric| {
            let scores: Vec<SpecScore> = (0..specs.len())
                .map(|spec_index| {
                    let sum: f64 = entries
                        .iter()
                        .filter(|e| e.spec_index == spec_index)
                        .flat_map(|e| e.values.iter())
                        .filter(|v| v.metric == metric)
                        .map(|v| v.value)
                        .sum();
                    SpecScore {
                        label: spec_label(&specs[spec_index], spec_index),
                        value: sum / sequence_lengths.len() as f64,
                    }
                })
                .collect();

            let mut best = scores[0].clone();
            let mut worst = scores[0].clone();
            for score in &scores[1..] {
                if score.value.total_cmp(&best.value).is_gt() {
                    best = score.clone();
                }
                if score.value.total_cmp(&worst.value).is_lt() {
                    worst = score.clone();
                }
            }
            let average = scores.iter().map(|s| s.value).sum::<f64>() / scores.len() as f64;
            let range = best.value - worst.value;
            MetricSummary {
                metric,
                best,
                worst,
                average,
                range,
            }
        })
        .collect()
}

fn recommend(summaries: &[MetricSummary]) -> Vec<String> {
    let mut recommendations: Vec<String> = summaries
        .iter()
        .map(|s| {
            format!(
                "{} leads on {} ({:.3} vs {:.3} average)",
                s.best.label,
                s.metric.name(),
                s.best.value,
                s.average
            )
        })
        .collect();

    // Overall call: the spec that dominates the most metrics.
    let mut wins: Vec<(&str, usize)> = Vec::new();
    for summary in summaries {
        match wins.iter_mut().find(|(label, _)| *label == summary.best.label) {
            Some((_, count)) => *count += 1,
            None => wins.push((summary.best.label.as_str(), 1)),
        }
    }
    if let Some((label, count)) = wins.iter().max_by_key(|(_, count)| *count) {
        recommendations.push(format!(
            "overall: {} dominates {} of {} metrics",
            label,
            count,
            summaries.len()
        ));
    }
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use vassago_core::{FixedParams, PatternFamily, RandomParams};

    fn engine() -> ComparisonEngine {
        ComparisonEngine::new(Arc::new(PatternCache::default()))
    }

    #[test]
    fn band_beats_random_on_locality() {
        let specs = vec![
            PatternSpec::new(PatternFamily::Fixed(FixedParams { half_width: 2 })),
            PatternSpec::new(PatternFamily::Random(RandomParams::default()))
                .with_sparsity(0.5),
        ];
        let report = engine()
            .compare(&specs, &[100], &[MetricKind::Locality, MetricKind::Sparsity])
            .unwrap();

        let locality = report
            .summaries
            .iter()
            .find(|s| s.metric == MetricKind::Locality)
            .unwrap();
        assert_eq!(locality.best.label, "fixed[0]");
        assert_eq!(locality.best.value, 1.0);
        assert!(locality.range > 0.0);
    }

    #[test]
    fn report_covers_the_full_grid() {
        let specs = vec![
            PatternSpec::new(PatternFamily::Fixed(FixedParams::default())),
            PatternSpec::new(PatternFamily::Random(RandomParams::default())),
        ];
        let report = engine()
            .compare(&specs, &[32, 64, 128], &[MetricKind::Sparsity])
            .unwrap();

        assert_eq!(report.entries.len(), 6);
        assert_eq!(report.summaries.len(), 1);
        assert!(!report.recommendations.is_empty());
    }

    #[test]
    fn empty_inputs_rejected() {
        let spec = PatternSpec::new(PatternFamily::Fixed(FixedParams::default()));
        assert!(engine().compare(&[], &[64], &[MetricKind::Sparsity]).is_err());
        assert!(engine()
            .compare(&[spec.clone()], &[], &[MetricKind::Sparsity])
            .is_err());
        assert!(engine().compare(&[spec], &[64], &[]).is_err());
    }

    #[test]
    fn comparison_is_deterministic() {
        let specs = vec![
            PatternSpec::new(PatternFamily::Fixed(FixedParams::default())),
            PatternSpec::new(PatternFamily::Random(RandomParams::default())),
        ];
        let metrics = [MetricKind::Sparsity, MetricKind::Efficiency];
        let a = engine().compare(&specs, &[64, 96], &metrics).unwrap();
        let b = engine().compare(&specs, &[64, 96], &metrics).unwrap();
        assert_eq!(a, b);
    }
}
