//! Per-family mask construction
//!
//! Every builder sets the full diagonal: each position always attends to
//! itself, regardless of family or parameters.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vassago_core::{
    AttentionMask, BigBirdParams, FixedParams, LinformerParams, LocalGlobalParams,
    LongformerParams, MaskBuilder, RandomParams, StridedParams,
};

/// Sliding window of radius `window_size / 2` plus fixed global indices
/// whose full row and column are set.
pub(crate) fn longformer(params: &LongformerParams, n: usize) -> AttentionMask {
    let mut builder = MaskBuilder::new(n);
    set_window(&mut builder, n, params.window_size / 2, params.window_size / 2);
    for &index in &params.global_indices {
        if index < n {
            builder.set_global(index);
        }
    }
    builder.set_diagonal();
    builder.build()
}

/// Local window + seeded random block pairs + leading global tokens.
pub(crate) fn bigbird(params: &BigBirdParams, n: usize) -> AttentionMask {
    let mut builder = MaskBuilder::new(n);
    set_window(&mut builder, n, params.window_size / 2, params.window_size / 2);

    let num_blocks = n.div_ceil(params.block_size);
    let mut rng = StdRng::seed_from_u64(params.random_seed);
    for block in 0..num_blocks {
        for _ in 0..params.num_random_blocks.min(num_blocks) {
            let target = rng.gen_range(0..num_blocks);
            set_block_pair(&mut builder, n, params.block_size, block, target);
        }
    }

    let global_count = (n as f64 * params.global_token_ratio).floor() as usize;
    for index in 0..global_count.min(n) {
        builder.set_global(index);
    }
    builder.set_diagonal();
    builder.build()
}

/// Positions whose distance is congruent to a configured offset modulo
/// the stride, plus the diagonal.
pub(crate) fn strided(params: &StridedParams, n: usize) -> AttentionMask {
    let stride = params.stride_size;
    let mut offset_hit = vec![false; stride];
    for &offset in &params.offsets {
        offset_hit[offset % stride] = true;
    }

    let mut builder = MaskBuilder::new(n);
    for i in 0..n {
        builder.set(i, i);
        for j in 0..n {
            if i != j && offset_hit[i.abs_diff(j) % stride] {
                builder.set(i, j);
            }
        }
    }
    builder.build()
}

/// Window with independent left/right context; causal masking collapses
/// the right context to zero.
pub(crate) fn local_global(params: &LocalGlobalParams, n: usize) -> AttentionMask {
    let right = if params.causal { 0 } else { params.right_context };
    let mut builder = MaskBuilder::new(n);
    set_window(&mut builder, n, params.left_context, right);
    builder.set_diagonal();
    builder.build()
}

/// Symmetric band of fixed half-width around the diagonal.
pub(crate) fn fixed(params: &FixedParams, n: usize) -> AttentionMask {
    let mut builder = MaskBuilder::new(n);
    set_window(&mut builder, n, params.half_width, params.half_width);
    builder.set_diagonal();
    builder.build()
}

/// Diagonal plus seeded uniform pairs until the nonzero count reaches the
/// target implied by the sparsity ratio.
pub(crate) fn random(params: &RandomParams, sparsity: f64, n: usize) -> AttentionMask {
    let total = (n * n) as u64;
    let target = ((n * n) as f64 * (1.0 - sparsity)).ceil() as u64;
    let target = target.min(total);

    let mut builder = MaskBuilder::new(n);
    builder.set_diagonal();
    let mut nonzero = n as u64;

    let mut rng = StdRng::seed_from_u64(params.random_seed);
    while nonzero < target {
        let i = rng.gen_range(0..n);
        let j = rng.gen_range(0..n);
        if !builder.get(i, j) {
            builder.set(i, j);
            nonzero += 1;
        }
    }
    builder.build()
}

/// Every query attends the first `min(projection_dim, n)` keys, modeling
/// the support left by a low-rank projection, plus the diagonal.
pub(crate) fn linformer(params: &LinformerParams, n: usize) -> AttentionMask {
    let support = params.projection_dim.min(n);
    let mut builder = MaskBuilder::new(n);
    for i in 0..n {
        for j in 0..support {
            builder.set(i, j);
        }
        builder.set(i, i);
    }
    builder.build()
}

fn set_window(builder: &mut MaskBuilder, n: usize, left: usize, right: usize) {
    for i in 0..n {
        let lo = i.saturating_sub(left);
        let hi = (i + right).min(n - 1);
        for j in lo..=hi {
            builder.set(i, j);
        }
    }
}

fn set_block_pair(builder: &mut MaskBuilder, n: usize, block_size: usize, a: usize, b: usize) {
    let a_range = block_range(n, block_size, a);
    let b_range = block_range(n, block_size, b);
    for i in a_range.clone() {
        for j in b_range.clone() {
            builder.set(i, j);
            builder.set(j, i);
        }
    }
}

fn block_range(n: usize, block_size: usize, block: usize) -> std::ops::Range<usize> {
    let start = (block * block_size).min(n);
    let end = (start + block_size).min(n);
    start..end
}
