use crate::error::{Result, SamplerError};
use crate::seed::Seed;
use crate::traits::{SamplerStats, SpeciesFactory};
use crate::weights::WeightIndex;
use ahash::AHashMap;
use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Deserialize;
use std::fmt::Debug;
use std::hash::Hash;

/// What a draw does when it wants a new species but the factory is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionPolicy {
    /// Select among existing species instead.
    #[default]
    Fallback,
    /// Return [`SamplerError::NoveltyExhausted`] and leave the state untouched.
    Fail,
}

/// A species and the number of times it has been emitted (or its seed
/// pseudo-count plus emissions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Species<T> {
    pub id: T,
    pub count: u64,
}

/// Two-parameter long-tail species sampler (discount `d`, strength `θ`).
///
/// Each draw mints a new species with probability `(θ + d·K) / (N + θ)`, where
/// `K` is the number of distinct species and `N` the sum of their counts.
/// Otherwise species `i` is repeated with probability proportional to
/// `count_i - d`. Larger `d` gives a heavier tail and vocabulary growth close
/// to `N^d`; larger `θ` makes novelty more likely early on.
///
/// State grows with `K` only. Weighted selection and the count update are both
/// O(log K) through a [`WeightIndex`].
///
/// Not safe for concurrent writers: every mutating call takes `&mut self`.
pub struct LongTailSampler<T, F> {
    discount: f64,
    strength: f64,
    species: Vec<Species<T>>,
    lookup: AHashMap<T, usize>,
    weights: WeightIndex,
    draws: u64,
    minted: u64,
    seeded: usize,
    fallbacks: u64,
    policy: ExhaustionPolicy,
    factory: F,
    rng: Xoshiro256PlusPlus,
}

impl<T, F> LongTailSampler<T, F>
where
    T: Clone + Eq + Hash + Debug,
    F: SpeciesFactory<T>,
{
    /// Unseeded sampler with an entropy-seeded random stream.
    pub fn new(discount: f64, strength: f64, factory: F) -> Result<Self> {
        Self::from_seed_list(discount, strength, factory, Vec::new(), Seed::Entropy)
    }

    /// Unseeded sampler with an explicit random-stream seed.
    pub fn with_seed(
        discount: f64,
        strength: f64,
        factory: F,
        seed: impl Into<Seed>,
    ) -> Result<Self> {
        Self::from_seed_list(discount, strength, factory, Vec::new(), seed)
    }

    /// Sampler pre-populated with `(identity, pseudo-count)` pairs.
    ///
    /// # Errors
    /// - `InvalidParameter` if `discount` is outside `[0, 1)`, if
    ///   `strength <= -discount`, if any pseudo-count is zero, or if the
    ///   pseudo-counts sum past `u64::MAX`.
    /// - `DuplicateSpecies` if an identity appears twice.
    pub fn from_seed_list<I>(
        discount: f64,
        strength: f64,
        factory: F,
        initial: I,
        seed: impl Into<Seed>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (T, u64)>,
    {
        validate_parameters(discount, strength)?;

        let initial = initial.into_iter();
        let (hint, _) = initial.size_hint();
        let mut species = Vec::with_capacity(hint);
        let mut lookup = AHashMap::with_capacity(hint);
        let mut weights = WeightIndex::with_capacity(hint);
        let mut total = 0u64;

        for (id, count) in initial {
            if count == 0 {
                return Err(SamplerError::InvalidParameter(format!(
                    "seed species {id:?} has a zero pseudo-count"
                )));
            }
            if lookup.contains_key(&id) {
                return Err(SamplerError::DuplicateSpecies(format!("{id:?}")));
            }
            // Every tree node is bounded by the running total.
            total = total.checked_add(count).ok_or_else(|| {
                SamplerError::InvalidParameter(format!(
                    "seed pseudo-counts overflow u64 at species {id:?}"
                ))
            })?;
            let slot = weights.push(count);
            lookup.insert(id.clone(), slot);
            species.push(Species { id, count });
        }

        let seeded = species.len();
        tracing::debug!(
            discount,
            strength,
            seeded,
            total = weights.total(),
            "long-tail sampler created"
        );

        Ok(Self {
            discount,
            strength,
            species,
            lookup,
            weights,
            draws: 0,
            minted: 0,
            seeded,
            fallbacks: 0,
            policy: ExhaustionPolicy::default(),
            factory,
            rng: seed.into().rng(),
        })
    }

    /// Set what happens when the factory runs dry.
    pub fn exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Restart the random stream. Counts and species are kept.
    pub fn set_seed(&mut self, seed: impl Into<Seed>) {
        self.rng = seed.into().rng();
    }

    /// Draw the next species.
    ///
    /// # Errors
    /// - `NoveltyExhausted` if a new species was called for, the factory is
    ///   empty and the policy is [`ExhaustionPolicy::Fail`].
    /// - `EmptyPopulation` if the factory is empty and there is nothing to
    ///   fall back on.
    /// - `DuplicateSpecies` if the factory returned an identity already present.
    pub fn sample(&mut self) -> Result<T> {
        if self.wants_new_species() {
            match self.factory.create() {
                Some(id) => return self.admit(id),
                None => {
                    if self.policy == ExhaustionPolicy::Fail {
                        return Err(SamplerError::NoveltyExhausted);
                    }
                    if self.fallbacks == 0 {
                        tracing::warn!(
                            distinct = self.species.len(),
                            draws = self.draws,
                            "species factory exhausted, falling back to existing species"
                        );
                    }
                    self.fallbacks += 1;
                }
            }
        }
        self.select_existing()
    }

    /// Probability that the next draw mints a new species.
    pub fn novelty_probability(&self) -> f64 {
        let k = self.species.len();
        if k == 0 {
            return 1.0;
        }
        let n = self.weights.total() as f64;
        (self.strength + self.discount * k as f64) / (n + self.strength)
    }

    fn wants_new_species(&mut self) -> bool {
        if self.species.is_empty() {
            return true;
        }
        let p = self.novelty_probability();
        self.rng.gen::<f64>() < p
    }

    fn admit(&mut self, id: T) -> Result<T> {
        if self.lookup.contains_key(&id) {
            return Err(SamplerError::DuplicateSpecies(format!(
                "factory returned existing species {id:?}"
            )));
        }
        let slot = self.weights.push(1);
        self.lookup.insert(id.clone(), slot);
        self.species.push(Species {
            id: id.clone(),
            count: 1,
        });
        self.minted += 1;
        self.draws += 1;
        tracing::trace!(species = ?id, distinct = self.species.len(), "minted species");
        Ok(id)
    }

    fn select_existing(&mut self) -> Result<T> {
        if self.species.is_empty() {
            return Err(SamplerError::EmptyPopulation);
        }
        let target = self.rng.gen::<f64>() * self.weights.discounted_total(self.discount);
        let slot = self.weights.find(target, self.discount);
        self.weights.add(slot, 1);
        self.draws += 1;

        let chosen = &mut self.species[slot];
        chosen.count += 1;
        Ok(chosen.id.clone())
    }

    /// Current count of `id`, or `None` if it has never appeared.
    pub fn count(&self, id: &T) -> Option<u64> {
        self.lookup.get(id).map(|&slot| self.species[slot].count)
    }

    pub fn contains(&self, id: &T) -> bool {
        self.lookup.contains_key(id)
    }
}

impl<T, F> LongTailSampler<T, F> {
    pub fn discount(&self) -> f64 {
        self.discount
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    /// N: sum of all counts, seed pseudo-counts included.
    pub fn total(&self) -> u64 {
        self.weights.total()
    }

    /// K: number of distinct species.
    pub fn distinct(&self) -> usize {
        self.species.len()
    }

    /// Number of completed draws.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Species in creation order (seeded first, then minted).
    pub fn species(&self) -> &[Species<T>] {
        &self.species
    }

    /// Species by descending count; ties keep creation order.
    pub fn ranked(&self) -> Vec<&Species<T>> {
        let mut ranked: Vec<&Species<T>> = self.species.iter().collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }

    pub fn policy(&self) -> ExhaustionPolicy {
        self.policy
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    pub fn stats(&self) -> SamplerStats {
        SamplerStats {
            total: self.weights.total(),
            distinct: self.species.len(),
            draws: self.draws,
            minted: self.minted,
            seeded: self.seeded,
            fallbacks: self.fallbacks,
        }
    }
}

fn validate_parameters(discount: f64, strength: f64) -> Result<()> {
    if !(0.0..1.0).contains(&discount) {
        return Err(SamplerError::InvalidParameter(format!(
            "discount must be in [0, 1), got {discount}"
        )));
    }
    if !strength.is_finite() || strength <= -discount {
        return Err(SamplerError::InvalidParameter(format!(
            "strength must be finite and greater than -discount ({}), got {strength}",
            -discount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{ListFactory, SequentialFactory};
    use std::collections::HashMap;

    fn integers(
        discount: f64,
        strength: f64,
        seed: u64,
    ) -> LongTailSampler<u64, SequentialFactory> {
        LongTailSampler::with_seed(discount, strength, SequentialFactory::new(), seed).unwrap()
    }

    fn run(sampler: &mut LongTailSampler<u64, SequentialFactory>, n: usize) -> Vec<u64> {
        (0..n).map(|_| sampler.sample().unwrap()).collect()
    }

    #[test]
    fn rejects_discount_outside_unit_interval() {
        for d in [-0.1, 1.0, 1.5, f64::NAN] {
            let err = LongTailSampler::<u64, _>::new(d, 1.0, SequentialFactory::new()).err();
            assert!(
                matches!(err, Some(SamplerError::InvalidParameter(_))),
                "discount {d} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_strength_at_or_below_negative_discount() {
        let pairs = [
            (0.5, -0.5),
            (0.5, -0.9),
            (0.0, 0.0),
            (0.2, f64::NAN),
            (0.2, f64::INFINITY),
        ];
        for (d, theta) in pairs {
            let err = LongTailSampler::<u64, _>::new(d, theta, SequentialFactory::new()).err();
            assert!(
                matches!(err, Some(SamplerError::InvalidParameter(_))),
                "d={d} theta={theta} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_negative_strength_above_bound() {
        let mut sampler = integers(0.5, -0.3, 1);
        assert_eq!(sampler.strength(), -0.3);
        // First draw always mints, even though N + θ is negative.
        assert_eq!(sampler.sample().unwrap(), 1);
        run(&mut sampler, 200);
        assert_eq!(sampler.total(), 201);
    }

    #[test]
    fn zero_strength_with_positive_discount_starts_cleanly() {
        let mut sampler = integers(0.5, 0.0, 3);
        assert_eq!(sampler.novelty_probability(), 1.0);
        run(&mut sampler, 100);
        assert_eq!(sampler.draws(), 100);
    }

    #[test]
    fn rejects_duplicate_seed_species() {
        let result = LongTailSampler::from_seed_list(
            0.5,
            1.0,
            ListFactory::new(Vec::<&str>::new()),
            vec![("a", 3), ("b", 2), ("a", 1)],
            1,
        );
        assert!(matches!(result, Err(SamplerError::DuplicateSpecies(_))));
    }

    #[test]
    fn rejects_zero_seed_count() {
        let result = LongTailSampler::from_seed_list(
            0.5,
            1.0,
            ListFactory::new(Vec::<&str>::new()),
            vec![("a", 3), ("b", 0)],
            1,
        );
        assert!(matches!(result, Err(SamplerError::InvalidParameter(_))));
    }

    #[test]
    fn rejects_seed_counts_overflowing_total() {
        let result = LongTailSampler::from_seed_list(
            0.5,
            1.0,
            ListFactory::new(Vec::<&str>::new()),
            vec![("b", u64::MAX), ("c", u64::MAX), ("a", 1)],
            1,
        );
        assert!(matches!(result, Err(SamplerError::InvalidParameter(_))));

        let result = LongTailSampler::from_seed_list(
            0.5,
            1.0,
            ListFactory::new(Vec::<&str>::new()),
            vec![("b", u64::MAX - 1), ("a", 1)],
            1,
        );
        assert_eq!(result.unwrap().total(), u64::MAX);
    }

    #[test]
    fn counts_sum_to_draws() {
        let mut sampler = integers(0.5, 1.0, 11);
        let drawn = run(&mut sampler, 5000);

        let sum: u64 = sampler.species().iter().map(|s| s.count).sum();
        assert_eq!(sum, 5000);
        assert_eq!(sampler.total(), 5000);
        assert_eq!(sampler.draws(), 5000);

        let mut tally: HashMap<u64, u64> = HashMap::new();
        for id in drawn {
            *tally.entry(id).or_default() += 1;
        }
        for s in sampler.species() {
            assert_eq!(tally[&s.id], s.count, "species {}", s.id);
        }
    }

    #[test]
    fn seeded_counts_sum_to_total() {
        let mut sampler = LongTailSampler::from_seed_list(
            0.3,
            1.0,
            SequentialFactory::starting_after(100),
            vec![(1, 50), (2, 20), (3, 5)],
            5,
        )
        .unwrap();
        assert_eq!(sampler.total(), 75);
        assert_eq!(sampler.distinct(), 3);
        run(&mut sampler, 1000);

        let sum: u64 = sampler.species().iter().map(|s| s.count).sum();
        assert_eq!(sum, sampler.total());
        assert_eq!(sampler.total(), 1075);
        assert_eq!(sampler.stats().seeded, 3);
    }

    #[test]
    fn distinct_is_monotone_and_bounded() {
        let mut sampler = integers(0.7, 2.0, 23);
        let mut previous = 0;
        for n in 1..=3000u64 {
            sampler.sample().unwrap();
            let k = sampler.distinct();
            assert!(k >= previous, "K shrank at draw {n}");
            assert!(k as u64 <= n, "K={k} exceeds N={n}");
            previous = k;
        }
        assert!(sampler.species().iter().all(|s| s.count >= 1));
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = integers(0.6, 0.5, 99);
        let mut b = integers(0.6, 0.5, 99);
        assert_eq!(run(&mut a, 2000), run(&mut b, 2000));
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn text_seed_matches_itself() {
        let mut a =
            LongTailSampler::with_seed(0.5, 0.3, SequentialFactory::new(), "day-one").unwrap();
        let mut b =
            LongTailSampler::with_seed(0.5, 0.3, SequentialFactory::new(), "day-one").unwrap();
        assert_eq!(run(&mut a, 500), run(&mut b, 500));
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = integers(0.6, 0.5, 1);
        let mut b = integers(0.6, 0.5, 2);
        assert_ne!(run(&mut a, 500), run(&mut b, 500));
    }

    #[test]
    fn reseeding_keeps_accumulated_state() {
        let mut a = integers(0.5, 1.0, 4);
        run(&mut a, 300);
        let before = a.stats();
        let species_before = a.species().to_vec();

        a.set_seed(8);
        assert_eq!(a.stats(), before);
        assert_eq!(a.species(), &species_before[..]);

        // Two samplers in the same state and seed continue identically.
        let mut b = integers(0.5, 1.0, 4);
        run(&mut b, 300);
        b.set_seed(8);
        assert_eq!(run(&mut a, 300), run(&mut b, 300));
    }

    #[test]
    fn high_discount_gives_long_tail() {
        let mut sampler = integers(0.8, 1.0, 2024);
        run(&mut sampler, 10_000);

        let counts: Vec<u64> = sampler.species().iter().map(|s| s.count).collect();
        let max = *counts.iter().max().unwrap();
        let min = *counts.iter().min().unwrap();
        let mean = 10_000.0 / counts.len() as f64;
        let singletons = counts.iter().filter(|&&c| c == 1).count();

        assert_eq!(min, 1);
        assert!(max as f64 > 20.0 * mean, "max {max} vs mean {mean}");
        assert!(
            singletons * 2 > counts.len(),
            "expected most species to be singletons, got {singletons} of {}",
            counts.len()
        );
    }

    #[test]
    fn discovery_grows_with_discount() {
        let mut light = integers(0.2, 1.0, 7);
        let mut heavy = integers(0.8, 1.0, 7);
        run(&mut light, 20_000);
        run(&mut heavy, 20_000);
        // K grows roughly like N^d: ~N^0.2 vs ~N^0.8.
        assert!(
            heavy.distinct() > 10 * light.distinct(),
            "heavy {} light {}",
            heavy.distinct(),
            light.distinct()
        );
    }

    #[test]
    fn novelty_probability_follows_formula() {
        let sampler = LongTailSampler::from_seed_list(
            0.5,
            2.0,
            SequentialFactory::starting_after(10),
            vec![(1, 4), (2, 3), (3, 1)],
            1,
        )
        .unwrap();
        // (θ + d·K) / (N + θ) = (2 + 1.5) / (8 + 2)
        assert!((sampler.novelty_probability() - 0.35).abs() < 1e-12);
    }

    #[test]
    fn exhaustion_falls_back_to_existing() {
        let mut sampler =
            LongTailSampler::with_seed(0.9, 50.0, ListFactory::new(["x", "y", "z"]), 3).unwrap();
        for _ in 0..500 {
            sampler.sample().unwrap();
        }
        assert_eq!(sampler.distinct(), 3);
        assert_eq!(sampler.total(), 500);
        let stats = sampler.stats();
        assert_eq!(stats.minted, 3);
        assert!(stats.fallbacks > 0);
    }

    #[test]
    fn exhaustion_fails_under_fail_policy() {
        let mut sampler = LongTailSampler::with_seed(0.5, 1.0, ListFactory::new(["only"]), 3)
            .unwrap()
            .exhaustion_policy(ExhaustionPolicy::Fail);
        assert_eq!(sampler.sample().unwrap(), "only");

        let mut saw_exhaustion = false;
        for _ in 0..200 {
            let before = sampler.total();
            match sampler.sample() {
                Ok(id) => assert_eq!(id, "only"),
                Err(SamplerError::NoveltyExhausted) => {
                    assert_eq!(sampler.total(), before, "failed draw must not count");
                    saw_exhaustion = true;
                }
                Err(e) => panic!("unexpected error {e}"),
            }
        }
        assert!(saw_exhaustion);
        assert_eq!(sampler.stats().fallbacks, 0);
    }

    #[test]
    fn empty_factory_and_no_species_is_fatal() {
        let mut sampler =
            LongTailSampler::with_seed(0.5, 1.0, ListFactory::new(Vec::<u8>::new()), 1).unwrap();
        assert!(matches!(sampler.sample(), Err(SamplerError::EmptyPopulation)));
        assert_eq!(sampler.total(), 0);
    }

    #[test]
    fn factory_duplicates_are_reported() {
        let mut sampler = LongTailSampler::with_seed(0.5, 1e9, || Some(7u32), 1).unwrap();
        assert_eq!(sampler.sample().unwrap(), 7);
        assert!(matches!(sampler.sample(), Err(SamplerError::DuplicateSpecies(_))));
        assert_eq!(sampler.distinct(), 1);
        assert_eq!(sampler.total(), 1);
    }

    #[test]
    fn ranked_orders_by_count_then_creation() {
        let sampler = LongTailSampler::from_seed_list(
            0.1,
            1.0,
            SequentialFactory::starting_after(10),
            vec![(1, 2), (2, 5), (3, 2), (4, 5)],
            1,
        )
        .unwrap();
        let order: Vec<u64> = sampler.ranked().iter().map(|s| s.id).collect();
        assert_eq!(order, vec![2, 4, 1, 3]);
    }

    #[test]
    fn count_lookup() {
        let mut sampler = integers(0.5, 1.0, 5);
        assert_eq!(sampler.count(&1), None);
        let first = sampler.sample().unwrap();
        assert_eq!(first, 1);
        assert_eq!(sampler.count(&1), Some(1));
        assert!(sampler.contains(&1));
        assert!(!sampler.contains(&2_000_000));
    }

    #[test]
    fn discount_zero_repeats_by_raw_count() {
        // With d = 0 and a dominant seed species, repeats overwhelmingly pick it.
        let mut sampler = LongTailSampler::from_seed_list(
            0.0,
            0.01,
            SequentialFactory::starting_after(2),
            vec![(1, 990), (2, 10)],
            13,
        )
        .unwrap();
        for _ in 0..1000 {
            sampler.sample().unwrap();
        }
        let gained = sampler.count(&1).unwrap() - 990;
        assert!(gained > 900, "dominant species gained only {gained}");
    }
}
