//! Core Types for Sparse Attention Patterns
//!
//! This crate defines the data model shared by the Vassago engine:
//! pattern specifications, attention masks, and mask statistics.
//!
//! # Key Insight
//!
//! A sparse attention pattern is fully described by a boolean relation
//! over sequence positions: `true` at `(i, j)` means query position `i`
//! may attend to key position `j`. Everything the engine reports —
//! sparsity, memory reduction, connectivity, reachability — is a
//! deterministic function of that relation, never a measured or
//! simulated number.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      vassago-core                        │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  PatternSpec ──────> family + parameters (pure data)     │
//! │       │                                                  │
//! │       ▼                                                  │
//! │  AttentionMask ────> square boolean relation             │
//! │       │              Dense(Vec<bool>) | Packed(Vec<u64>) │
//! │       ▼                                                  │
//! │  MaskStatistics ───> nonzeros, memory/compute reduction  │
//! │                                                          │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod error;
mod mask;
mod spec;
mod stats;

pub use error::{Error, Result};
pub use mask::{AttentionMask, MaskBuilder, MaskStorage, PACKED_STORAGE_THRESHOLD};
pub use spec::{
    BigBirdParams, FixedParams, LinformerParams, LocalGlobalParams, LongformerParams,
    PatternFamily, PatternSpec, RandomParams, StridedParams, MAX_SPARSITY, MIN_SPARSITY,
};
pub use stats::MaskStatistics;

/// Factor applied to the memory reduction ratio to estimate compute reduction.
pub const COMPUTE_REDUCTION_FACTOR: f64 = 1.2;

/// Upper bound on any reported reduction ratio.
pub const MAX_REDUCTION_RATIO: f64 = 0.99;

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        AttentionMask, Error, MaskBuilder, MaskStatistics, PatternFamily, PatternSpec, Result,
    };
}
