//! Sparse Attention Pattern Generation
//!
//! This crate builds structured sparsity masks that approximate full
//! pairwise attention, one deterministic algorithm per pattern family.
//!
//! # Key Insight
//!
//! Full attention touches `n^2` position pairs, but most of the useful
//! information flow is local or routed through a handful of hub
//! positions. Each family here encodes one such structure — sliding
//! windows, strides, random blocks, global tokens — as a pure function
//! `(spec, sequence_length) -> mask`. Seeded families are bit-identical
//! across runs under a fixed seed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    vassago-patterns                      │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  PatternSpec ──> generate() ──> AttentionMask            │
//! │                      │                                   │
//! │                      ▼                                   │
//! │                PatternCache                              │
//! │     single-flight per (spec, n) key, LRU + age eviction  │
//! │                                                          │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod cache;
mod families;
mod generator;

pub use cache::{CacheConfig, CacheStats, PatternCache};
pub use generator::generate;
pub use vassago_core::{Error, Result};

/// Prelude for common imports
pub mod prelude {
    pub use super::{generate, CacheConfig, PatternCache, Result};
}
