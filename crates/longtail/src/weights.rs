/// Fenwick tree over species counts.
///
/// Slot `i` holds the count of the `i`-th species in creation order. Weighted
/// selection uses the discounted weights `count - d`, which never need to be
/// stored: the discounted prefix sum over the first `m` slots is
/// `prefix(m) - d * m`, so counts stay exact integers and the discount is
/// applied during the descent.
///
/// `tree[0]` is unused; node `j` covers slots `(j - lowbit(j), j]` (1-based).
#[derive(Debug, Clone)]
pub struct WeightIndex {
    tree: Vec<u64>,
    total: u64,
}

#[inline]
fn lowbit(j: usize) -> usize {
    j & j.wrapping_neg()
}

impl WeightIndex {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut tree = Vec::with_capacity(capacity + 1);
        tree.push(0);
        Self { tree, total: 0 }
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of all slot counts.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Sum of the first `n` slots.
    pub fn prefix(&self, n: usize) -> u64 {
        let mut j = n.min(self.len());
        let mut sum = 0;
        while j > 0 {
            sum += self.tree[j];
            j -= lowbit(j);
        }
        sum
    }

    /// Count stored in slot `index`.
    pub fn get(&self, index: usize) -> u64 {
        self.prefix(index + 1) - self.prefix(index)
    }

    /// Append a slot holding `count`. Returns its index.
    pub fn push(&mut self, count: u64) -> usize {
        let j = self.tree.len();
        // The new node also covers the slots (j - lowbit(j), j - 1].
        let covered = self.prefix(j - 1) - self.prefix(j - lowbit(j));
        self.tree.push(count + covered);
        self.total += count;
        j - 1
    }

    /// Add `delta` to slot `index`.
    pub fn add(&mut self, index: usize, delta: u64) {
        let mut j = index + 1;
        while j < self.tree.len() {
            self.tree[j] += delta;
            j += lowbit(j);
        }
        self.total += delta;
    }

    /// Sum of discounted weights `count - discount` over all slots.
    pub fn discounted_total(&self, discount: f64) -> f64 {
        self.total as f64 - discount * self.len() as f64
    }

    /// Index of the slot whose discounted weight interval contains `target`.
    ///
    /// Returns the smallest `i` with `prefix(i + 1) - discount * (i + 1) > target`.
    /// `target` is expected in `[0, discounted_total)`; values at or past the
    /// end select the last slot. Panics on an empty index.
    pub fn find(&self, target: f64, discount: f64) -> usize {
        let n = self.len();
        assert!(n > 0, "find on empty weight index");

        let mut step = 1usize << (usize::BITS - 1 - n.leading_zeros());
        let mut pos = 0usize;
        let mut acc = 0u64;
        while step > 0 {
            let next = pos + step;
            if next <= n {
                let weight = (acc + self.tree[next]) as f64 - discount * next as f64;
                if weight <= target {
                    pos = next;
                    acc += self.tree[next];
                }
            }
            step >>= 1;
        }
        pos.min(n - 1)
    }
}

impl Default for WeightIndex {
    fn default() -> Self {
        Self::new()
    }
}
