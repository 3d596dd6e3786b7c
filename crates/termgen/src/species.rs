use longtail::factory::SequentialFactory;
use longtail::{LongTailSampler, Result, Seed};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;
use std::collections::HashMap;

/// Integer species sampled in batches ("days") of Gaussian length.
///
/// Tracks how the vocabulary accumulates across batches: how many species
/// show up in each batch and how many of those were never seen before.
pub struct BatchRunner {
    sampler: LongTailSampler<u64, SequentialFactory>,
    lengths: Normal<f64>,
    rng: Xoshiro256PlusPlus,
    batch: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub batch: usize,
    pub length: u64,
    /// Species appearing in this batch.
    pub distinct: usize,
    /// Species first seen in this batch.
    pub new_species: usize,
    /// Species seen in this or any earlier batch.
    pub vocabulary: usize,
    /// Largest per-species count within the batch.
    pub top_count: u64,
}

impl BatchRunner {
    pub fn new(
        discount: f64,
        strength: f64,
        mean_len: f64,
        sd_len: f64,
        seed: Seed,
    ) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let lengths = Normal::new(mean_len, sd_len)?;
        let mut rng = seed.rng();
        let sampler_seed = Seed::from(rng.gen::<u64>());
        let sampler =
            LongTailSampler::with_seed(discount, strength, SequentialFactory::new(), sampler_seed)?;
        Ok(Self {
            sampler,
            lengths,
            rng,
            batch: 0,
        })
    }

    pub fn next_batch(&mut self) -> Result<BatchSummary> {
        let length = self.lengths.sample(&mut self.rng).round().max(0.0) as u64;
        let before = self.sampler.distinct();

        let mut counts: HashMap<u64, u64> = HashMap::new();
        for _ in 0..length {
            *counts.entry(self.sampler.sample()?).or_default() += 1;
        }

        let vocabulary = self.sampler.distinct();
        let summary = BatchSummary {
            batch: self.batch,
            length,
            distinct: counts.len(),
            new_species: vocabulary - before,
            vocabulary,
            top_count: counts.values().copied().max().unwrap_or(0),
        };
        self.batch += 1;
        Ok(summary)
    }

    pub fn sampler(&self) -> &LongTailSampler<u64, SequentialFactory> {
        &self.sampler
    }
}
