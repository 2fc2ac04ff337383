//! Engine facade: keyed spec/pattern repositories over the core operations

use crate::compare::{ComparisonEngine, ComparisonReport, MetricKind};
use crate::error::{EngineError, Result};
use crate::tune::{self, InputCharacteristics, TuningStrategy};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;
use vassago_core::{AttentionMask, MaskStatistics, PatternFamily, PatternSpec};
use vassago_graph::{analyze, AnalysisKind, FlowBudget, PatternAnalysis};
use vassago_patterns::{CacheConfig, CacheStats, PatternCache};

/// Identifier of a registered spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecId(u64);

impl fmt::Display for SpecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spec-{}", self.0)
    }
}

/// Identifier of a generated pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternId(u64);

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pattern-{}", self.0)
    }
}

struct StoredPattern {
    spec_id: SpecId,
    sequence_length: usize,
    mask: Arc<AttentionMask>,
}

/// The engine's external surface: create specs, generate and analyze
/// patterns, compare specs, tune specs.
///
/// Repositories are simple keyed stores; the heavy lifting stays in the
/// generation, cache, and analysis crates. All operations are safe to
/// call concurrently.
pub struct PatternEngine {
    cache: Arc<PatternCache>,
    comparison: ComparisonEngine,
    specs: DashMap<u64, PatternSpec>,
    patterns: DashMap<u64, StoredPattern>,
    next_spec: AtomicU64,
    next_pattern: AtomicU64,
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl PatternEngine {
    /// Create an engine with the given cache configuration.
    pub fn new(cache_config: CacheConfig) -> Self {
        let cache = Arc::new(PatternCache::new(cache_config));
        let comparison = ComparisonEngine::new(Arc::clone(&cache));
        Self {
            cache,
            comparison,
            specs: DashMap::new(),
            patterns: DashMap::new(),
            next_spec: AtomicU64::new(1),
            next_pattern: AtomicU64::new(1),
        }
    }

    /// Register a spec after validation.
    pub fn create_spec(&self, spec: PatternSpec) -> Result<SpecId> {
        spec.validate()?;
        let id = SpecId(self.next_spec.fetch_add(1, Ordering::Relaxed));
        info!(%id, family = spec.family_name(), "registered pattern spec");
        self.specs.insert(id.0, spec);
        Ok(id)
    }

    /// Register a spec with default parameters from a family name.
    ///
    /// The string entry point: unknown names fail with
    /// `UnsupportedFamily`.
    pub fn create_spec_by_family(&self, name: &str) -> Result<SpecId> {
        let family = PatternFamily::from_name(name)?;
        self.create_spec(PatternSpec::new(family))
    }

    /// Fetch a registered spec.
    pub fn get_spec(&self, id: SpecId) -> Result<PatternSpec> {
        self.specs
            .get(&id.0)
            .map(|entry| entry.value().clone())
            .ok_or(EngineError::SpecNotFound(id))
    }

    /// List all registered specs.
    pub fn list_specs(&self) -> Vec<(SpecId, PatternSpec)> {
        let mut specs: Vec<(SpecId, PatternSpec)> = self
            .specs
            .iter()
            .map(|entry| (SpecId(*entry.key()), entry.value().clone()))
            .collect();
        specs.sort_by_key(|(id, _)| id.0);
        specs
    }

    /// Generate (or fetch from cache) the mask for a spec, register it,
    /// and return its statistics.
    ///
    /// `sequence_length` defaults to the spec's own.
    pub fn generate_pattern(
        &self,
        spec_id: SpecId,
        sequence_length: Option<usize>,
    ) -> Result<(PatternId, MaskStatistics)> {
        let spec = self.get_spec(spec_id)?;
        let n = sequence_length.unwrap_or(spec.sequence_length);
        let mask = self.cache.get_or_generate(&spec, n)?;
        let stats = *mask.statistics();

        let id = PatternId(self.next_pattern.fetch_add(1, Ordering::Relaxed));
        self.patterns.insert(
            id.0,
            StoredPattern {
                spec_id,
                sequence_length: n,
                mask,
            },
        );
        Ok((id, stats))
    }

    /// Analyze a generated pattern.
    pub fn analyze_pattern(
        &self,
        pattern_id: PatternId,
        kind: AnalysisKind,
        budget: Option<FlowBudget>,
    ) -> Result<PatternAnalysis> {
        let mask = self.pattern_mask(pattern_id)?;
        let analysis = analyze(&mask, kind, &budget.unwrap_or_default())?;
        Ok(analysis)
    }

    /// Compare registered specs across sequence lengths.
    pub fn compare_patterns(
        &self,
        spec_ids: &[SpecId],
        metrics: &[MetricKind],
        sequence_lengths: &[usize],
    ) -> Result<ComparisonReport> {
        let specs: Vec<PatternSpec> = spec_ids
            .iter()
            .map(|&id| self.get_spec(id))
            .collect::<Result<_>>()?;
        self.comparison.compare(&specs, sequence_lengths, metrics)
    }

    /// Derive a tuned spec from a registered one and register the result.
    pub fn tune_pattern(
        &self,
        spec_id: SpecId,
        characteristics: &InputCharacteristics,
        strategy: TuningStrategy,
    ) -> Result<SpecId> {
        let base = self.get_spec(spec_id)?;
        let tuned = tune::tune(&base, characteristics, strategy)?;
        self.create_spec(tuned)
    }

    /// The mask behind a generated pattern.
    pub fn pattern_mask(&self, id: PatternId) -> Result<Arc<AttentionMask>> {
        self.patterns
            .get(&id.0)
            .map(|entry| Arc::clone(&entry.value().mask))
            .ok_or(EngineError::PatternNotFound(id))
    }

    /// The spec and sequence length behind a generated pattern.
    pub fn pattern_origin(&self, id: PatternId) -> Result<(SpecId, usize)> {
        self.patterns
            .get(&id.0)
            .map(|entry| (entry.value().spec_id, entry.value().sequence_length))
            .ok_or(EngineError::PatternNotFound(id))
    }

    /// Snapshot of the shared cache's statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
