//! Graph Analysis of Attention Masks
//!
//! This crate treats an attention mask as the adjacency matrix of a
//! directed graph on sequence positions and computes its structural
//! properties: degree statistics, locality, composite efficiency, and
//! information flow (reachability and path lengths).
//!
//! # Key Insight
//!
//! Whether a sparsity pattern is usable is a graph question, not a
//! numeric one. A pattern with excellent memory reduction is still
//! broken if information cannot flow between distant positions, and a
//! pattern with perfect locality may be missing the long-range paths
//! that global tokens exist to provide.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      vassago-graph                       │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  AttentionMask ──> analyze(kind, budget)                 │
//! │        │                                                 │
//! │        ├── connectivity   degree stats, O(nnz)           │
//! │        ├── locality       windowed fraction, O(nnz)      │
//! │        ├── efficiency     composite of mask statistics   │
//! │        └── information    closure + BFS, O(n^3) capped:  │
//! │            flow           exact | sampled | truncated    │
//! │                                                          │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod analysis;
mod flow;

pub use analysis::{
    analyze, AnalysisKind, ConnectivityReport, EfficiencyReport, LocalityReport, PatternAnalysis,
};
pub use flow::{FlowBudget, FlowMode, FlowReport};
pub use vassago_core::{Error, Result};

/// Cap on the locality window: `min(50, n / 10)`.
pub const MAX_LOCALITY_WINDOW: usize = 50;

/// Prelude for common imports
pub mod prelude {
    pub use super::{analyze, AnalysisKind, FlowBudget, PatternAnalysis, Result};
}
