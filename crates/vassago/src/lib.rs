//! Vassago: Sparse Attention Pattern Engine
//!
//! Vassago deterministically generates structured sparsity masks that
//! approximate full pairwise attention, and analyzes their structural
//! properties — connectivity, locality, efficiency, information flow —
//! with graph algorithms over the mask-as-digraph.
//!
//! # Quick Start
//!
//! ```
//! use vassago::prelude::*;
//!
//! let engine = PatternEngine::default();
//! let spec_id = engine.create_spec_by_family("longformer")?;
//! let (pattern_id, stats) = engine.generate_pattern(spec_id, Some(512))?;
//! assert!(stats.memory_reduction_ratio > 0.0);
//!
//! let analysis = engine.analyze_pattern(pattern_id, AnalysisKind::Comprehensive, None)?;
//! for finding in analysis.bottlenecks() {
//!     println!("{finding}");
//! }
//! # Ok::<(), vassago::EngineError>(())
//! ```
//!
//! # Components
//!
//! | Component | Crate | Role |
//! |-----------|-------|------|
//! | `PatternSpec` | `vassago-core` | family + parameters, pure data |
//! | `AttentionMask` | `vassago-core` | square boolean relation, dense or bit-packed |
//! | `generate` | `vassago-patterns` | deterministic per-family mask construction |
//! | `PatternCache` | `vassago-patterns` | single-flight memoization, bounded eviction |
//! | `analyze` | `vassago-graph` | degree/locality/efficiency/flow analyses |
//! | `ComparisonEngine` | `vassago` | ranked cross-spec comparison |
//! | `tune` | `vassago` | strategy-driven spec adjustment |
//!
//! Every reported figure is a deterministic function of the mask. The
//! engine never fabricates speedup or quality numbers: compute reduction
//! is a documented closed-form estimate, and anything needing a real
//! benchmark belongs to the caller.

mod compare;
mod engine;
mod error;
mod tune;

pub use compare::{
    ComparisonEngine, ComparisonEntry, ComparisonReport, MetricKind, MetricSummary, MetricValue,
    SpecScore,
};
pub use engine::{PatternEngine, PatternId, SpecId};
pub use error::{EngineError, Result};
pub use tune::{tune, InputCharacteristics, TuningStrategy};

pub use vassago_core::{
    AttentionMask, BigBirdParams, Error, FixedParams, LinformerParams, LocalGlobalParams,
    LongformerParams, MaskBuilder, MaskStatistics, MaskStorage, PatternFamily, PatternSpec,
    RandomParams, StridedParams,
};
pub use vassago_graph::{
    analyze, AnalysisKind, ConnectivityReport, EfficiencyReport, FlowBudget, FlowMode, FlowReport,
    LocalityReport, PatternAnalysis,
};
pub use vassago_patterns::{generate, CacheConfig, CacheStats, PatternCache};

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        generate, AnalysisKind, AttentionMask, FlowBudget, InputCharacteristics, MetricKind,
        PatternEngine, PatternFamily, PatternSpec, TuningStrategy,
    };
}
