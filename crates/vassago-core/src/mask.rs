//! Attention masks: square boolean relations over sequence positions

use crate::error::{Error, Result};
use crate::stats::MaskStatistics;
use serde::{Deserialize, Serialize};

/// Sequence length above which [`MaskBuilder::new`] switches from dense
/// boolean storage to bit-packed words.
pub const PACKED_STORAGE_THRESHOLD: usize = 4096;

/// Backing storage for a mask. Explicit and swappable: dense bytes for
/// small sequences, packed 64-bit words beyond the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskStorage {
    /// One `bool` per cell, row-major.
    Dense(Vec<bool>),
    /// Row-major bit-packed words; each row occupies `ceil(n / 64)` words.
    Packed(Vec<u64>),
}

/// A square boolean relation over `size x size` positions.
///
/// `true` at `(i, j)` means query position `i` may attend to key position
/// `j`. Not required to be symmetric. Immutable after [`MaskBuilder::build`];
/// statistics are computed once at build time and carried with the mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionMask {
    size: usize,
    storage: MaskStorage,
    stats: MaskStatistics,
}

impl AttentionMask {
    /// Sequence length (one side of the square relation).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether `(i, j)` is a permitted attention relation.
    ///
    /// Out-of-range indices read as `false`.
    pub fn get(&self, i: usize, j: usize) -> bool {
        if i >= self.size || j >= self.size {
            return false;
        }
        match &self.storage {
            MaskStorage::Dense(cells) => cells[i * self.size + j],
            MaskStorage::Packed(words) => {
                let wpr = Self::words_per_row(self.size);
                let word = words[i * wpr + j / 64];
                word >> (j % 64) & 1 == 1
            }
        }
    }

    /// Statistics computed at build time.
    pub fn statistics(&self) -> &MaskStatistics {
        &self.stats
    }

    /// Whether the mask uses bit-packed storage.
    pub fn is_packed(&self) -> bool {
        matches!(self.storage, MaskStorage::Packed(_))
    }

    /// Iterate the key positions attended by query `i`, in ascending order.
    pub fn row_targets(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        let size = self.size;
        (0..size).filter(move |&j| self.get(i, j))
    }

    /// Row `i` as packed words (allocates for dense storage).
    ///
    /// Used by reachability analysis, which works on bitset rows.
    pub fn row_words(&self, i: usize) -> Vec<u64> {
        let wpr = Self::words_per_row(self.size);
        match &self.storage {
            MaskStorage::Packed(words) => words[i * wpr..(i + 1) * wpr].to_vec(),
            MaskStorage::Dense(cells) => {
                let mut row = vec![0u64; wpr];
                for j in 0..self.size {
                    if cells[i * self.size + j] {
                        row[j / 64] |= 1 << (j % 64);
                    }
                }
                row
            }
        }
    }

    /// Brute-force nonzero count, scanning every cell.
    ///
    /// Exists so statistics can be cross-checked against an independent
    /// scan; [`MaskStatistics`] must always agree with this.
    pub fn count_nonzero(&self) -> u64 {
        match &self.storage {
            MaskStorage::Dense(cells) => cells.iter().filter(|&&c| c).count() as u64,
            MaskStorage::Packed(_) => {
                let mut count = 0u64;
                for i in 0..self.size {
                    for j in 0..self.size {
                        if self.get(i, j) {
                            count += 1;
                        }
                    }
                }
                count
            }
        }
    }

    /// Check internal consistency between the declared size and storage.
    ///
    /// A mismatch is a programming error surfaced as [`Error::InvalidMask`].
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidMask {
                message: "empty mask".into(),
            });
        }
        let expected = match &self.storage {
            MaskStorage::Dense(cells) => cells.len() == self.size * self.size,
            MaskStorage::Packed(words) => {
                words.len() == self.size * Self::words_per_row(self.size)
            }
        };
        if !expected {
            return Err(Error::InvalidMask {
                message: format!("storage does not match declared size {}", self.size),
            });
        }
        Ok(())
    }

    fn words_per_row(size: usize) -> usize {
        size.div_ceil(64)
    }
}

/// Incremental mask construction.
///
/// Cells start `false`; generators set permitted relations and then call
/// [`MaskBuilder::build`], which freezes the mask and computes statistics.
#[derive(Debug, Clone)]
pub struct MaskBuilder {
    size: usize,
    storage: MaskStorage,
}

impl MaskBuilder {
    /// Create a builder, choosing storage by the packing threshold.
    pub fn new(size: usize) -> Self {
        if size > PACKED_STORAGE_THRESHOLD {
            Self::packed(size)
        } else {
            Self::dense(size)
        }
    }

    /// Create a builder with dense boolean storage.
    pub fn dense(size: usize) -> Self {
        Self {
            size,
            storage: MaskStorage::Dense(vec![false; size * size]),
        }
    }

    /// Create a builder with bit-packed storage.
    pub fn packed(size: usize) -> Self {
        let wpr = AttentionMask::words_per_row(size);
        Self {
            size,
            storage: MaskStorage::Packed(vec![0u64; size * wpr]),
        }
    }

    /// Sequence length under construction.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Permit attention from query `i` to key `j`. Out-of-range is a no-op.
    pub fn set(&mut self, i: usize, j: usize) {
        if i >= self.size || j >= self.size {
            return;
        }
        match &mut self.storage {
            MaskStorage::Dense(cells) => cells[i * self.size + j] = true,
            MaskStorage::Packed(words) => {
                let wpr = AttentionMask::words_per_row(self.size);
                words[i * wpr + j / 64] |= 1 << (j % 64);
            }
        }
    }

    /// Read back a cell during construction.
    pub fn get(&self, i: usize, j: usize) -> bool {
        if i >= self.size || j >= self.size {
            return false;
        }
        match &self.storage {
            MaskStorage::Dense(cells) => cells[i * self.size + j],
            MaskStorage::Packed(words) => {
                let wpr = AttentionMask::words_per_row(self.size);
                words[i * wpr + j / 64] >> (j % 64) & 1 == 1
            }
        }
    }

    /// Permit attention from every query to key `j` and from query `j` to
    /// every key (global token).
    pub fn set_global(&mut self, index: usize) {
        for k in 0..self.size {
            self.set(index, k);
            self.set(k, index);
        }
    }

    /// Set the full diagonal (every position attends to itself).
    pub fn set_diagonal(&mut self) {
        for i in 0..self.size {
            self.set(i, i);
        }
    }

    /// Current nonzero count.
    pub fn count_nonzero(&self) -> u64 {
        match &self.storage {
            MaskStorage::Dense(cells) => cells.iter().filter(|&&c| c).count() as u64,
            MaskStorage::Packed(words) => words.iter().map(|w| u64::from(w.count_ones())).sum(),
        }
    }

    /// Freeze the mask and compute its statistics.
    pub fn build(self) -> AttentionMask {
        let nonzero = self.count_nonzero();
        let stats = MaskStatistics::from_counts(self.size, nonzero);
        AttentionMask {
            size: self.size,
            storage: self.storage,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_set_get_round_trip() {
        let mut builder = MaskBuilder::dense(8);
        builder.set(0, 3);
        builder.set(7, 7);
        let mask = builder.build();

        assert!(mask.get(0, 3));
        assert!(mask.get(7, 7));
        assert!(!mask.get(3, 0));
        assert!(!mask.get(8, 0));
    }

    #[test]
    fn packed_matches_dense() {
        let mut dense = MaskBuilder::dense(70);
        let mut packed = MaskBuilder::packed(70);
        for i in 0..70 {
            for j in (i % 7..70).step_by(7) {
                dense.set(i, j);
                packed.set(i, j);
            }
        }
        let dense = dense.build();
        let packed = packed.build();

        for i in 0..70 {
            for j in 0..70 {
                assert_eq!(dense.get(i, j), packed.get(i, j), "cell ({i}, {j})");
            }
        }
        assert_eq!(dense.count_nonzero(), packed.count_nonzero());
    }

    #[test]
    fn builder_picks_packed_above_threshold() {
        assert!(!MaskBuilder::new(64).build().is_packed());
        assert!(MaskBuilder::new(PACKED_STORAGE_THRESHOLD + 1).build().is_packed());
    }

    #[test]
    fn statistics_agree_with_scan() {
        let mut builder = MaskBuilder::new(16);
        builder.set_diagonal();
        builder.set(0, 15);
        let mask = builder.build();

        assert_eq!(mask.statistics().nonzero_elements, mask.count_nonzero());
        assert_eq!(mask.statistics().nonzero_elements, 17);
    }

    #[test]
    fn global_token_sets_row_and_column() {
        let mut builder = MaskBuilder::new(10);
        builder.set_global(4);
        let mask = builder.build();

        for k in 0..10 {
            assert!(mask.get(4, k));
            assert!(mask.get(k, 4));
        }
    }

    #[test]
    fn row_words_match_cells() {
        let mut builder = MaskBuilder::dense(100);
        builder.set(3, 0);
        builder.set(3, 64);
        builder.set(3, 99);
        let mask = builder.build();

        let words = mask.row_words(3);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], 1);
        assert_eq!(words[1], 1 | 1 << 35);
    }
}
