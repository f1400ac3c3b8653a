//! Pairwise-sum frequency tree over the mask alphabet.
//!
//! Level 0 holds one count per possible mask value; each higher level
//! holds pairwise sums of the level below, odd levels padded with a zero
//! ghost node, terminating when two nodes remain. Cumulative sums and
//! bucket search both run in O(log mask_max).

/// Adaptive frequency table with logarithmic cumulative queries.
#[derive(Debug, Clone)]
pub struct FreqTree {
    mask_max: u64,
    levels: Vec<Vec<u64>>,
}

impl FreqTree {
    /// Builds the tree for masks on `[0, mask_max]` with every frequency
    /// at one. `mask_max` must be nonzero (the caller validates).
    pub fn new(mask_max: u64) -> Self {
        let leaf_count = mask_max as usize + 1;
        let mut levels = Vec::new();
        let mut len = leaf_count + (leaf_count & 1);
        levels.push(vec![0u64; len]);
        while len > 2 {
            len /= 2;
            len += len & 1;
            levels.push(vec![0u64; len]);
        }
        let mut tree = Self { mask_max, levels };
        tree.reset();
        tree
    }

    /// Restores uniform add-one frequencies by zeroing and re-summing.
    pub fn reset(&mut self) {
        for level in &mut self.levels {
            level.iter_mut().for_each(|n| *n = 0);
        }
        for leaf in 0..=self.mask_max as usize {
            self.levels[0][leaf] = 1;
        }
        for k in 1..self.levels.len() {
            for i in 0..self.levels[k].len() {
                let below = &self.levels[k - 1];
                let left = below.get(2 * i).copied().unwrap_or(0);
                let right = below.get(2 * i + 1).copied().unwrap_or(0);
                self.levels[k][i] = left + right;
            }
        }
    }

    /// Current frequency of one mask value.
    pub fn freq(&self, mask: u64) -> u64 {
        self.levels[0][mask as usize]
    }

    /// Sum of all frequencies.
    pub fn total(&self) -> u64 {
        let top = &self.levels[self.levels.len() - 1];
        top[0] + top[1]
    }

    /// Adds one to `mask`'s frequency at every level it participates in.
    pub fn increment(&mut self, mask: u64) {
        for (k, level) in self.levels.iter_mut().enumerate() {
            level[(mask >> k) as usize] += 1;
        }
    }

    /// Sum of frequencies of all mask values strictly below `mask`: for
    /// each set bit of `mask`, the left sibling on that level sits
    /// entirely below it.
    pub fn cumfreq(&self, mask: u64) -> u64 {
        let mut cum = 0;
        for (k, level) in self.levels.iter().enumerate() {
            let node = mask >> k;
            if node & 1 == 1 {
                cum += level[(node ^ 1) as usize];
            }
        }
        cum
    }

    /// Finds the unique mask whose cumulative interval
    /// `[cumfreq(mask), cumfreq(mask) + freq(mask))` contains `floor`,
    /// descending from the top level. A `floor` at or beyond the total
    /// (garbage input) clamps to the largest mask. Returns
    /// `(mask, cumfreq, freq)`.
    pub fn find_bucket(&self, floor: u64) -> (u64, u64, u64) {
        let top = &self.levels[self.levels.len() - 1];
        let mut acc = 0u64;
        let mut idx = 0usize;
        if floor >= top[0] {
            acc = top[0];
            idx = 1;
        }
        for k in (0..self.levels.len() - 1).rev() {
            // Ghost nodes past a level's end weigh zero, so a garbage
            // floor walks off the right edge and gets clamped below.
            let left = self.levels[k].get(2 * idx).copied().unwrap_or(0);
            if floor < acc + left {
                idx *= 2;
            } else {
                acc += left;
                idx = 2 * idx + 1;
            }
        }
        let mut mask = idx as u64;
        if mask > self.mask_max {
            mask = self.mask_max;
            acc = self.cumfreq(mask);
        }
        (mask, acc, self.freq(mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_gives_uniform_frequencies() {
        for mask_max in [1u64, 2, 3, 6, 7, 255, 1000] {
            let tree = FreqTree::new(mask_max);
            assert_eq!(tree.total(), mask_max + 1, "mask_max = {mask_max}");
            for m in 0..=mask_max {
                assert_eq!(tree.freq(m), 1);
                assert_eq!(tree.cumfreq(m), m);
            }
        }
    }

    #[test]
    fn test_increment_updates_every_level() {
        let mut tree = FreqTree::new(9);
        tree.increment(4);
        tree.increment(4);
        tree.increment(7);
        assert_eq!(tree.freq(4), 3);
        assert_eq!(tree.freq(7), 2);
        assert_eq!(tree.total(), 13);
        // cumfreq(5) covers masks 0..=4, of which 4 gained two counts.
        assert_eq!(tree.cumfreq(5), 7);
        // cumfreq(8) covers masks 0..=7: eight base counts plus the two
        // extra on 4 and one extra on 7.
        assert_eq!(tree.cumfreq(8), 11);
    }

    #[test]
    fn test_cumfreq_matches_naive_sum() {
        let mut tree = FreqTree::new(12);
        for m in [0u64, 3, 3, 5, 11, 12, 12, 12, 2] {
            tree.increment(m);
        }
        let naive: Vec<u64> = (0..=12).map(|m| tree.freq(m)).collect();
        for mask in 0..=12u64 {
            let expected: u64 = naive[..mask as usize].iter().sum();
            assert_eq!(tree.cumfreq(mask), expected, "mask = {mask}");
        }
    }

    #[test]
    fn test_find_bucket_partitions_the_total() {
        let mut tree = FreqTree::new(6);
        for m in [1u64, 1, 1, 4, 6] {
            tree.increment(m);
        }
        for floor in 0..tree.total() {
            let (mask, cum, freq) = tree.find_bucket(floor);
            assert!(cum <= floor && floor < cum + freq, "floor = {floor}");
            assert_eq!(cum, tree.cumfreq(mask));
            assert_eq!(freq, tree.freq(mask));
        }
    }

    #[test]
    fn test_find_bucket_clamps_garbage_floor() {
        let tree = FreqTree::new(4);
        let (mask, cum, freq) = tree.find_bucket(tree.total() + 100);
        assert_eq!(mask, 4);
        assert_eq!(cum, tree.cumfreq(4));
        assert_eq!(freq, 1);
    }

    #[test]
    fn test_minimal_alphabet() {
        let mut tree = FreqTree::new(1);
        assert_eq!(tree.total(), 2);
        tree.increment(0);
        assert_eq!(tree.find_bucket(0), (0, 0, 2));
        assert_eq!(tree.find_bucket(1), (0, 0, 2));
        assert_eq!(tree.find_bucket(2), (1, 2, 1));
    }
}
