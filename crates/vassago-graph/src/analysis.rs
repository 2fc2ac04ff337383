//! Structural analysis of a mask-as-digraph

use crate::flow::{self, FlowBudget, FlowReport};
use crate::MAX_LOCALITY_WINDOW;
use serde::{Deserialize, Serialize};
use vassago_core::{AttentionMask, Result};

/// Which structural property to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Degree statistics.
    Connectivity,
    /// Fraction of relations confined to the positional window.
    Locality,
    /// Composite of the mask's reduction ratios.
    Efficiency,
    /// Reachability and path lengths.
    InformationFlow,
    /// All four, merged.
    Comprehensive,
}

/// Degree statistics for one mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityReport {
    /// `avg_in_degree / n`, bounded to `[0, 1]`.
    pub connectivity_score: f64,
    /// Mean in-degree over all positions.
    pub average_in_degree: f64,
    /// Mean out-degree over all positions.
    pub average_out_degree: f64,
    /// Variance of the in-degree distribution.
    pub degree_variance: f64,
}

/// Windowed locality figures for one mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalityReport {
    /// Fraction of true relations with `|i - j| <= window`.
    pub locality_index: f64,
    /// Window actually used: `min(50, n / 10)`.
    pub window: usize,
    /// Relations inside the window.
    pub local_relations: u64,
    /// All true relations.
    pub total_relations: u64,
}

/// Composite efficiency figure for one mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyReport {
    /// Arithmetic mean of the three ratios below.
    pub efficiency_score: f64,
    /// Realized sparsity of the mask.
    pub sparsity: f64,
    /// Memory reduction ratio.
    pub memory_reduction: f64,
    /// Compute reduction ratio.
    pub compute_reduction: f64,
}

/// Output of [`analyze`] for one mask.
///
/// Sections are present for the requested kind; `comprehensive` fills
/// all four. Bottleneck findings are recomputed from the numeric fields
/// on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    /// Sequence length of the analyzed mask.
    pub sequence_length: usize,
    /// Degree statistics, if requested.
    pub connectivity: Option<ConnectivityReport>,
    /// Locality figures, if requested.
    pub locality: Option<LocalityReport>,
    /// Composite efficiency, if requested.
    pub efficiency: Option<EfficiencyReport>,
    /// Reachability and path lengths, if requested.
    pub information_flow: Option<FlowReport>,
}

impl PatternAnalysis {
    /// Human-readable findings derived from threshold checks on the
    /// numeric fields.
    pub fn bottlenecks(&self) -> Vec<String> {
        let mut findings = Vec::new();

        if let Some(c) = &self.connectivity {
            if c.degree_variance > c.average_in_degree / 2.0 {
                findings.push(format!(
                    "potential bottleneck: in-degree variance {:.1} exceeds half the mean in-degree {:.1}",
                    c.degree_variance, c.average_in_degree
                ));
            }
        }
        if let Some(l) = &self.locality {
            if l.locality_index < 0.3 {
                findings.push(format!(
                    "low locality ({:.2}): most attention crosses the {}-position window",
                    l.locality_index, l.window
                ));
            } else if l.locality_index > 0.9 {
                findings.push(format!(
                    "over-high locality ({:.2}): long-range paths may be missing",
                    l.locality_index
                ));
            }
        }
        if let Some(f) = &self.information_flow {
            if f.reachability_ratio < 0.5 {
                findings.push(format!(
                    "weak information flow: only {:.0}% of ordered pairs are reachable",
                    f.reachability_ratio * 100.0
                ));
            }
            if f.average_path_length > 6.0 {
                findings.push(format!(
                    "long information paths: {:.1} hops on average",
                    f.average_path_length
                ));
            }
        }
        findings
    }
}

/// Analyze a mask as a directed graph.
///
/// Fails fast with `InvalidMask` on an internally inconsistent mask and
/// with `ResourceExceeded` only when the budget forbids sampling.
pub fn analyze(
    mask: &AttentionMask,
    kind: AnalysisKind,
    budget: &FlowBudget,
) -> Result<PatternAnalysis> {
    mask.validate()?;

    let mut analysis = PatternAnalysis {
        sequence_length: mask.size(),
        connectivity: None,
        locality: None,
        efficiency: None,
        information_flow: None,
    };

    match kind {
        AnalysisKind::Connectivity => analysis.connectivity = Some(connectivity(mask)),
        AnalysisKind::Locality => analysis.locality = Some(locality(mask)),
        AnalysisKind::Efficiency => analysis.efficiency = Some(efficiency(mask)),
        AnalysisKind::InformationFlow => {
            analysis.information_flow = Some(flow::information_flow(mask, budget)?);
        }
        AnalysisKind::Comprehensive => {
            analysis.connectivity = Some(connectivity(mask));
            analysis.locality = Some(locality(mask));
            analysis.efficiency = Some(efficiency(mask));
            analysis.information_flow = Some(flow::information_flow(mask, budget)?);
        }
    }
    Ok(analysis)
}

/// Locality window for a sequence length: `min(50, n / 10)`.
pub(crate) fn locality_window(n: usize) -> usize {
    MAX_LOCALITY_WINDOW.min(n / 10)
}

fn connectivity(mask: &AttentionMask) -> ConnectivityReport {
    let n = mask.size();
    let mut in_degree = vec![0u64; n];
    let mut out_degree = vec![0u64; n];
    for i in 0..n {
        for j in mask.row_targets(i) {
            out_degree[i] += 1;
            in_degree[j] += 1;
        }
    }

    let average_in_degree = in_degree.iter().sum::<u64>() as f64 / n as f64;
    let average_out_degree = out_degree.iter().sum::<u64>() as f64 / n as f64;
    let degree_variance = in_degree
        .iter()
        .map(|&d| (d as f64 - average_in_degree).powi(2))
        .sum::<f64>()
        / n as f64;

    ConnectivityReport {
        connectivity_score: (average_in_degree / n as f64).clamp(0.0, 1.0),
        average_in_degree,
        average_out_degree,
        degree_variance,
    }
}

fn locality(mask: &AttentionMask) -> LocalityReport {
    let n = mask.size();
    let window = locality_window(n);
    let mut local_relations = 0u64;
    let mut total_relations = 0u64;
    for i in 0..n {
        for j in mask.row_targets(i) {
            total_relations += 1;
            if i.abs_diff(j) <= window {
                local_relations += 1;
            }
        }
    }

    let locality_index = if total_relations == 0 {
        0.0
    } else {
        local_relations as f64 / total_relations as f64
    };
    LocalityReport {
        locality_index,
        window,
        local_relations,
        total_relations,
    }
}

fn efficiency(mask: &AttentionMask) -> EfficiencyReport {
    let stats = mask.statistics();
    let sparsity = stats.sparsity();
    let memory_reduction = stats.memory_reduction_ratio;
    let compute_reduction = stats.compute_reduction_ratio;
    EfficiencyReport {
        efficiency_score: (sparsity + memory_reduction + compute_reduction) / 3.0,
        sparsity,
        memory_reduction,
        compute_reduction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vassago_core::MaskBuilder;

    fn band(n: usize, half_width: usize) -> AttentionMask {
        let mut builder = MaskBuilder::new(n);
        for i in 0..n {
            for j in i.saturating_sub(half_width)..=(i + half_width).min(n - 1) {
                builder.set(i, j);
            }
        }
        builder.build()
    }

    #[test]
    fn band_locality_is_exactly_one() {
        let analysis = analyze(&band(100, 2), AnalysisKind::Locality, &FlowBudget::default())
            .unwrap();
        let locality = analysis.locality.unwrap();
        assert_eq!(locality.window, 10);
        assert_eq!(locality.locality_index, 1.0);
    }

    #[test]
    fn connectivity_of_full_mask_is_one() {
        let mut builder = MaskBuilder::new(12);
        for i in 0..12 {
            for j in 0..12 {
                builder.set(i, j);
            }
        }
        let analysis = analyze(
            &builder.build(),
            AnalysisKind::Connectivity,
            &FlowBudget::default(),
        )
        .unwrap();
        let connectivity = analysis.connectivity.unwrap();
        assert_eq!(connectivity.connectivity_score, 1.0);
        assert_eq!(connectivity.degree_variance, 0.0);
        assert_eq!(connectivity.average_in_degree, 12.0);
    }

    #[test]
    fn hub_mask_flags_degree_bottleneck() {
        // One global column: in-degree n at position 0, 1 elsewhere.
        let mut builder = MaskBuilder::new(20);
        builder.set_diagonal();
        for i in 0..20 {
            builder.set(i, 0);
        }
        let analysis = analyze(
            &builder.build(),
            AnalysisKind::Connectivity,
            &FlowBudget::default(),
        )
        .unwrap();
        let findings = analysis.bottlenecks();
        assert!(findings.iter().any(|f| f.contains("potential bottleneck")));
    }

    #[test]
    fn over_local_band_is_flagged() {
        let analysis = analyze(
            &band(100, 2),
            AnalysisKind::Comprehensive,
            &FlowBudget::default(),
        )
        .unwrap();
        let findings = analysis.bottlenecks();
        assert!(findings.iter().any(|f| f.contains("over-high locality")));
    }

    #[test]
    fn efficiency_is_mean_of_ratios() {
        let analysis = analyze(&band(10, 1), AnalysisKind::Efficiency, &FlowBudget::default())
            .unwrap();
        let e = analysis.efficiency.unwrap();
        let expected = (e.sparsity + e.memory_reduction + e.compute_reduction) / 3.0;
        assert_eq!(e.efficiency_score, expected);
        assert!(e.efficiency_score > 0.0 && e.efficiency_score < 1.0);
    }

    #[test]
    fn comprehensive_fills_every_section() {
        let analysis = analyze(
            &band(30, 2),
            AnalysisKind::Comprehensive,
            &FlowBudget::default(),
        )
        .unwrap();
        assert!(analysis.connectivity.is_some());
        assert!(analysis.locality.is_some());
        assert!(analysis.efficiency.is_some());
        assert!(analysis.information_flow.is_some());
    }
}
