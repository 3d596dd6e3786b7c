use crate::error::{Result, SamplerError};
use crate::sampler::{ExhaustionPolicy, LongTailSampler};
use crate::seed::Seed;
use crate::traits::SamplerStats;
use crate::words::WordGenerator;
use crate::Term;
use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Deserialize;

/// Construction options for a [`TermGenerator`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TermOptions {
    #[serde(default = "default_lanes")]
    pub lanes: usize,
    #[serde(default = "default_discount")]
    pub discount: f64,
    #[serde(default = "default_strength")]
    pub strength: f64,
    /// Unset means an entropy seed.
    #[serde(default)]
    pub seed: Option<Seed>,
    /// Applied to every lane once the shared reservoir runs dry.
    #[serde(default)]
    pub policy: ExhaustionPolicy,
}

impl Default for TermOptions {
    fn default() -> Self {
        Self {
            lanes: default_lanes(),
            discount: default_discount(),
            strength: default_strength(),
            seed: None,
            policy: ExhaustionPolicy::default(),
        }
    }
}

fn default_lanes() -> usize {
    1
}
fn default_discount() -> f64 {
    0.8
}
fn default_strength() -> f64 {
    1.0
}

/// Long-tail term stream over a shared frequency prior and novelty reservoir.
///
/// Runs `lanes` independent [`LongTailSampler`]s. Every lane is pre-seeded
/// from the same frequency table (the seed list is materialized once) and mints
/// novel terms from the same [`WordGenerator`] reservoir, so a novel term
/// appears in at most one lane. Each `sample()` picks a lane uniformly at
/// random and delegates to it. With one lane this is a plain sampler.
///
/// Lanes let one stream mix several independently evolving populations (topics,
/// registers) that agree on common words and disagree on rare ones.
pub struct TermGenerator {
    lanes: Vec<LongTailSampler<Term, WordGenerator>>,
    rng: Xoshiro256PlusPlus,
}

impl TermGenerator {
    /// `lanes` samplers with discount `discount`, strength 1 and an entropy seed.
    pub fn new(words: &WordGenerator, lanes: usize, discount: f64) -> Result<Self> {
        Self::with_options(
            words,
            &TermOptions {
                lanes,
                discount,
                ..TermOptions::default()
            },
        )
    }

    /// # Errors
    /// `InvalidParameter` for zero lanes or a bad discount/strength pair.
    pub fn with_options(words: &WordGenerator, options: &TermOptions) -> Result<Self> {
        if options.lanes == 0 {
            return Err(SamplerError::InvalidParameter(
                "lane count must be at least 1".to_string(),
            ));
        }

        let mut rng = options.seed.clone().unwrap_or_default().rng();
        let seeds = words.table().seed_list();

        let mut lanes = Vec::with_capacity(options.lanes);
        for _ in 0..options.lanes {
            let lane_seed = Seed::from(rng.gen::<u64>());
            let lane = LongTailSampler::from_seed_list(
                options.discount,
                options.strength,
                words.clone(),
                seeds.iter().cloned(),
                lane_seed,
            )?;
            lanes.push(lane.exhaustion_policy(options.policy));
        }

        tracing::debug!(
            lanes = options.lanes,
            discount = options.discount,
            strength = options.strength,
            policy = ?options.policy,
            seeded = seeds.len(),
            "term generator ready"
        );

        Ok(Self { lanes, rng })
    }

    /// Next term.
    ///
    /// # Errors
    /// Whatever the chosen lane's [`LongTailSampler::sample`] reports, such as
    /// `NoveltyExhausted` under [`ExhaustionPolicy::Fail`].
    pub fn sample(&mut self) -> Result<Term> {
        let lane = if self.lanes.len() == 1 {
            0
        } else {
            self.rng.gen_range(0..self.lanes.len())
        };
        self.lanes[lane].sample()
    }

    /// Number of lanes.
    pub fn lanes(&self) -> usize {
        self.lanes.len()
    }

    pub fn lane(&self, index: usize) -> Option<&LongTailSampler<Term, WordGenerator>> {
        self.lanes.get(index)
    }

    /// Counters summed over all lanes.
    pub fn stats(&self) -> SamplerStats {
        let mut total = SamplerStats::default();
        for lane in &self.lanes {
            total.merge(&lane.stats());
        }
        total
    }
}

impl Iterator for TermGenerator {
    type Item = Result<Term>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.sample())
    }
}
