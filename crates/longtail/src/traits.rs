/// Source of species identities that the sampler has never seen.
///
/// Implementations: [`SequentialFactory`](crate::factory::SequentialFactory),
/// [`ListFactory`](crate::factory::ListFactory),
/// [`WordGenerator`](crate::words::WordGenerator), and any
/// `FnMut() -> Option<T>` closure.
///
/// Every returned identity must differ from all identities the factory has
/// returned before and from the sampler's seed list. Returning `None` means the
/// factory is exhausted; the sampler decides what to do about it.
pub trait SpeciesFactory<T> {
    /// Produce the next novel identity, or `None` once exhausted.
    fn create(&mut self) -> Option<T>;

    /// How many identities are left, if the factory is finite.
    fn remaining(&self) -> Option<usize> {
        None
    }
}

impl<T, F> SpeciesFactory<T> for F
where
    F: FnMut() -> Option<T>,
{
    fn create(&mut self) -> Option<T> {
        self()
    }
}

/// Snapshot of sampler counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SamplerStats {
    /// N: sum of all species counts, seed pseudo-counts included.
    pub total: u64,
    /// K: number of distinct species.
    pub distinct: usize,
    /// Completed `sample()` calls.
    pub draws: u64,
    /// Species minted by the factory.
    pub minted: u64,
    /// Species present from the seed list.
    pub seeded: usize,
    /// Draws that wanted a new species but fell back to an existing one.
    pub fallbacks: u64,
}

impl SamplerStats {
    /// Fold another snapshot into this one.
    pub fn merge(&mut self, other: &SamplerStats) {
        self.total += other.total;
        self.distinct += other.distinct;
        self.draws += other.draws;
        self.minted += other.minted;
        self.seeded += other.seeded;
        self.fallbacks += other.fallbacks;
    }
}
