//! Information-flow analysis: reachability and path lengths
//!
//! Treats the mask as a directed graph and computes which ordered pairs
//! are connected by one or more permitted-attention hops, and how many
//! hops they need. Exact computation is O(n^3) and therefore budgeted:
//! above the exact limit the analysis samples source nodes, and a
//! deadline expiry mid-analysis yields a partial result rather than a
//! failure, since callers often only need a coarse flow signal.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use vassago_core::{AttentionMask, Error, Result};

/// Budget for the O(n^3) information-flow analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowBudget {
    /// Largest sequence length analyzed exactly.
    pub exact_limit: usize,
    /// Source nodes visited in sampled mode.
    pub sample_sources: usize,
    /// Seed for source sampling.
    pub sample_seed: u64,
    /// Wall-clock limit; expiry yields a truncated result.
    pub timeout: Option<Duration>,
    /// Fail with `ResourceExceeded` instead of sampling above the limit.
    pub force_exact: bool,
}

impl Default for FlowBudget {
    fn default() -> Self {
        Self {
            exact_limit: 2048,
            sample_sources: 64,
            sample_seed: 42,
            timeout: None,
            force_exact: false,
        }
    }
}

/// How the flow figures were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FlowMode {
    /// Full transitive closure and BFS from every node.
    Exact,
    /// BFS from a seeded random subset of source nodes.
    Sampled {
        /// Number of sampled sources.
        sources: usize,
    },
    /// Deadline expired; figures cover the completed sources only.
    Truncated {
        /// Sources completed before expiry.
        completed_sources: usize,
    },
}

/// Information-flow figures for one mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowReport {
    /// Fraction of ordered pairs reachable via one or more hops.
    pub reachability_ratio: f64,
    /// Mean hop count over reachable pairs.
    pub average_path_length: f64,
    /// Largest hop count over reachable pairs.
    pub max_path_length: usize,
    /// Computation mode actually used.
    pub mode: FlowMode,
}

/// Compute the flow report for a mask under a budget.
pub(crate) fn information_flow(mask: &AttentionMask, budget: &FlowBudget) -> Result<FlowReport> {
    let n = mask.size();
    let deadline = budget.timeout.map(|t| Instant::now() + t);

    if n <= budget.exact_limit {
        exact_flow(mask, deadline)
    } else if budget.force_exact {
        Err(Error::ResourceExceeded {
            sequence_length: n,
            limit: budget.exact_limit,
        })
    } else {
        debug!(
            sequence_length = n,
            exact_limit = budget.exact_limit,
            sources = budget.sample_sources,
            "sequence too long for exact flow analysis, sampling sources"
        );
        sampled_flow(mask, deadline, budget)
    }
}

/// Exact mode: boolean transitive closure (bitset Floyd–Warshall) for
/// reachability, BFS from every node for path lengths.
fn exact_flow(mask: &AttentionMask, deadline: Option<Instant>) -> Result<FlowReport> {
    let n = mask.size();
    let rows = bitset_rows(mask);

    let Some(closure) = transitive_closure(&rows, deadline) else {
        // Closure ran out of time; degrade to whatever BFS completes.
        warn!("flow deadline expired during transitive closure, truncating");
        let sources: Vec<usize> = (0..n).collect();
        return sampled_over(&rows, n, &sources, deadline, true);
    };

    let reachable_pairs: u64 = closure
        .iter()
        .map(|row| row.iter().map(|w| u64::from(w.count_ones())).sum::<u64>())
        .sum();
    let reachability_ratio = reachable_pairs as f64 / (n * n) as f64;

    let mut paths = PathAccumulator::default();
    for source in 0..n {
        if expired(deadline) {
            warn!(
                completed = source,
                "flow deadline expired during path search, truncating"
            );
            return Ok(FlowReport {
                reachability_ratio,
                average_path_length: paths.average(),
                max_path_length: paths.max,
                mode: FlowMode::Truncated {
                    completed_sources: source,
                },
            });
        }
        bfs(&rows, n, source, &mut paths);
    }

    Ok(FlowReport {
        reachability_ratio,
        average_path_length: paths.average(),
        max_path_length: paths.max,
        mode: FlowMode::Exact,
    })
}

/// Sampled mode: BFS from a seeded random subset of sources; reachability
/// is estimated as the mean reached fraction.
fn sampled_flow(
    mask: &AttentionMask,
    deadline: Option<Instant>,
    budget: &FlowBudget,
) -> Result<FlowReport> {
    let n = mask.size();
    let mut sources: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(budget.sample_seed);
    sources.shuffle(&mut rng);
    sources.truncate(budget.sample_sources.max(1).min(n));

    let rows = bitset_rows(mask);
    sampled_over(&rows, n, &sources, deadline, false)
}

fn sampled_over(
    rows: &[Vec<u64>],
    n: usize,
    sources: &[usize],
    deadline: Option<Instant>,
    from_exact: bool,
) -> Result<FlowReport> {
    let mut paths = PathAccumulator::default();
    let mut reached_pairs: u64 = 0;
    let mut completed = 0usize;
    let mut truncated = false;

    for &source in sources {
        if expired(deadline) {
            truncated = true;
            break;
        }
        reached_pairs += bfs(rows, n, source, &mut paths);
        completed += 1;
    }

    let reachability_ratio = if completed == 0 {
        0.0
    } else {
        reached_pairs as f64 / (completed * n) as f64
    };
    let mode = if truncated || from_exact {
        FlowMode::Truncated {
            completed_sources: completed,
        }
    } else {
        FlowMode::Sampled {
            sources: completed,
        }
    };

    Ok(FlowReport {
        reachability_ratio,
        average_path_length: paths.average(),
        max_path_length: paths.max,
        mode,
    })
}

/// Adjacency as one bitset row per node.
fn bitset_rows(mask: &AttentionMask) -> Vec<Vec<u64>> {
    (0..mask.size()).map(|i| mask.row_words(i)).collect()
}

/// Boolean transitive closure over bitset rows:
/// `reach[i] |= reach[k]` whenever `reach[i][k]` is set.
///
/// Returns `None` if the deadline expires mid-computation.
fn transitive_closure(rows: &[Vec<u64>], deadline: Option<Instant>) -> Option<Vec<Vec<u64>>> {
    let n = rows.len();
    let mut reach: Vec<Vec<u64>> = rows.to_vec();

    for k in 0..n {
        if expired(deadline) {
            return None;
        }
        let row_k = reach[k].clone();
        for i in 0..n {
            if reach[i][k / 64] >> (k % 64) & 1 == 1 {
                for (dst, src) in reach[i].iter_mut().zip(row_k.iter()) {
                    *dst |= src;
                }
            }
        }
    }
    Some(reach)
}

#[derive(Debug, Default)]
struct PathAccumulator {
    total_hops: u64,
    finite_paths: u64,
    max: usize,
}

impl PathAccumulator {
    fn record(&mut self, hops: usize) {
        self.total_hops += hops as u64;
        self.finite_paths += 1;
        self.max = self.max.max(hops);
    }

    fn average(&self) -> f64 {
        if self.finite_paths == 0 {
            0.0
        } else {
            self.total_hops as f64 / self.finite_paths as f64
        }
    }
}

/// BFS from `source` over bitset adjacency rows, recording every finite
/// positive-hop distance.
///
/// Returns the number of nodes reachable from `source` via one or more
/// hops. The source itself counts only if some edge leads back to it.
fn bfs(rows: &[Vec<u64>], n: usize, source: usize, paths: &mut PathAccumulator) -> u64 {
    let mut dist: Vec<Option<usize>> = vec![None; n];
    dist[source] = Some(0);
    let mut self_hops: Option<usize> = None;
    let mut queue = VecDeque::from([source]);
    let mut reached: u64 = 0;

    while let Some(u) = queue.pop_front() {
        let next = dist[u].unwrap_or(0) + 1;
        for (index, &word) in rows[u].iter().enumerate() {
            let mut bits = word;
            while bits != 0 {
                let v = index * 64 + bits.trailing_zeros() as usize;
                bits &= bits - 1;
                if v == source && self_hops.is_none() {
                    self_hops = Some(next);
                }
                if dist[v].is_none() {
                    dist[v] = Some(next);
                    reached += 1;
                    paths.record(next);
                    queue.push_back(v);
                }
            }
        }
    }

    if let Some(hops) = self_hops {
        reached += 1;
        paths.record(hops);
    }
    reached
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vassago_core::MaskBuilder;

    fn chain(n: usize) -> AttentionMask {
        let mut builder = MaskBuilder::new(n);
        builder.set_diagonal();
        for i in 0..n - 1 {
            builder.set(i, i + 1);
        }
        builder.build()
    }

    #[test]
    fn chain_reachability_is_upper_triangle() {
        let report = information_flow(&chain(4), &FlowBudget::default()).unwrap();
        // Diagonal self-loops plus every (i, j) with i < j: 4 + 6 = 10.
        assert!((report.reachability_ratio - 10.0 / 16.0).abs() < 1e-12);
        assert_eq!(report.max_path_length, 3);
        assert_eq!(report.mode, FlowMode::Exact);
    }

    #[test]
    fn isolated_diagonal_reaches_only_itself() {
        let mut builder = MaskBuilder::new(5);
        builder.set_diagonal();
        let report = information_flow(&builder.build(), &FlowBudget::default()).unwrap();

        assert!((report.reachability_ratio - 0.2).abs() < 1e-12);
        assert_eq!(report.average_path_length, 1.0);
        assert_eq!(report.max_path_length, 1);
    }

    #[test]
    fn adding_an_edge_never_decreases_reachability() {
        let mut base = MaskBuilder::new(6);
        base.set_diagonal();
        base.set(0, 3);
        let base_report = information_flow(&base.clone().build(), &FlowBudget::default()).unwrap();

        let mut extended = base;
        extended.set(3, 5);
        let extended_report =
            information_flow(&extended.build(), &FlowBudget::default()).unwrap();

        assert!(extended_report.reachability_ratio >= base_report.reachability_ratio);
    }

    #[test]
    fn sampled_mode_above_exact_limit() {
        let budget = FlowBudget {
            exact_limit: 16,
            sample_sources: 8,
            ..FlowBudget::default()
        };
        let report = information_flow(&chain(32), &budget).unwrap();
        assert_eq!(report.mode, FlowMode::Sampled { sources: 8 });
        assert!(report.reachability_ratio > 0.0);
    }

    #[test]
    fn force_exact_above_limit_is_resource_exceeded() {
        let budget = FlowBudget {
            exact_limit: 16,
            force_exact: true,
            ..FlowBudget::default()
        };
        let err = information_flow(&chain(32), &budget).unwrap_err();
        assert!(matches!(err, Error::ResourceExceeded { limit: 16, .. }));
    }

    #[test]
    fn expired_deadline_yields_truncated_result() {
        let budget = FlowBudget {
            timeout: Some(Duration::ZERO),
            ..FlowBudget::default()
        };
        let report = information_flow(&chain(8), &budget).unwrap();
        assert!(matches!(report.mode, FlowMode::Truncated { .. }));
    }

    #[test]
    fn sampling_is_seed_deterministic() {
        let budget = FlowBudget {
            exact_limit: 8,
            sample_sources: 4,
            ..FlowBudget::default()
        };
        let a = information_flow(&chain(64), &budget).unwrap();
        let b = information_flow(&chain(64), &budget).unwrap();
        assert_eq!(a, b);
    }
}
