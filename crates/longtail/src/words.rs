use crate::error::{Result, SamplerError};
use crate::resource;
use crate::seed::Seed;
use crate::table::WordFrequencyTable;
use crate::traits::SpeciesFactory;
use crate::Term;
use ahash::AHashSet;
use parking_lot::Mutex;
use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::sync::Arc;

/// Mints novel terms from an auxiliary word reservoir.
///
/// Holds the frequency table used to seed samplers and a reservoir of words
/// that are not in that table. Each request takes the next element of a
/// pseudo-random permutation of the reservoir, so a word is handed out at most
/// once.
///
/// `WordGenerator` is a handle: clones share the same reservoir and consume it
/// jointly, which is how the lanes of a
/// [`TermGenerator`](crate::terms::TermGenerator) stay disjoint in their novel
/// terms. A separately constructed generator owns a separate reservoir and
/// random stream.
#[derive(Debug, Clone)]
pub struct WordGenerator {
    table: Arc<WordFrequencyTable>,
    reservoir: Arc<Mutex<Reservoir>>,
}

/// Incremental Fisher-Yates shuffle: `words[..next]` have been handed out.
#[derive(Debug)]
struct Reservoir {
    words: Vec<Term>,
    next: usize,
    rng: Xoshiro256PlusPlus,
}

impl Reservoir {
    fn draw(&mut self) -> Option<Term> {
        if self.next >= self.words.len() {
            return None;
        }
        let pick = self.rng.gen_range(self.next..self.words.len());
        self.words.swap(self.next, pick);
        self.next += 1;
        Some(self.words[self.next - 1].clone())
    }

    fn remaining(&self) -> usize {
        self.words.len() - self.next
    }
}

impl WordGenerator {
    /// Load the seed table and the reservoir by resource name, with an
    /// entropy-seeded permutation.
    pub fn new(seed_table: &str, reservoir: &str) -> Result<Self> {
        Self::with_seed(seed_table, reservoir, Seed::Entropy)
    }

    /// Like [`new`](Self::new) with a fixed permutation seed.
    pub fn with_seed(seed_table: &str, reservoir: &str, seed: impl Into<Seed>) -> Result<Self> {
        let table = WordFrequencyTable::load(seed_table)?;
        let text = resource::load(reservoir)?;
        let words = parse_word_list(reservoir, &text)?;
        Ok(Self::from_parts(table, words, seed))
    }

    /// Build from an in-memory table and word list.
    ///
    /// Duplicate words and words present in `table` are dropped from the
    /// reservoir.
    pub fn from_parts<I, S>(table: WordFrequencyTable, words: I, seed: impl Into<Seed>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = AHashSet::new();
        let mut dropped = 0usize;
        let mut reservoir = Vec::new();
        for word in words {
            let word = word.as_ref();
            if table.contains(word) || !seen.insert(word.to_string()) {
                dropped += 1;
                continue;
            }
            reservoir.push(Term::from(word));
        }

        tracing::debug!(
            table = table.name(),
            seeded = table.len(),
            reservoir = reservoir.len(),
            dropped,
            "word generator ready"
        );

        Self {
            table: Arc::new(table),
            reservoir: Arc::new(Mutex::new(Reservoir {
                words: reservoir,
                next: 0,
                rng: seed.into().rng(),
            })),
        }
    }

    /// The frequency table that seeds samplers.
    pub fn table(&self) -> &WordFrequencyTable {
        &self.table
    }

    /// Words not yet handed out.
    pub fn remaining(&self) -> usize {
        self.reservoir.lock().remaining()
    }

    /// Total reservoir size after filtering.
    pub fn reservoir_len(&self) -> usize {
        self.reservoir.lock().words.len()
    }

    /// Whether `other` is a clone sharing this reservoir.
    pub fn shares_reservoir(&self, other: &WordGenerator) -> bool {
        Arc::ptr_eq(&self.reservoir, &other.reservoir)
    }
}

impl SpeciesFactory<Term> for WordGenerator {
    fn create(&mut self) -> Option<Term> {
        self.reservoir.lock().draw()
    }

    fn remaining(&self) -> Option<usize> {
        Some(WordGenerator::remaining(self))
    }
}

/// Parse a flat word list: one word per line, blank and `#` lines skipped.
pub fn parse_word_list(name: &str, text: &str) -> Result<Vec<String>> {
    resource::content_lines(text)
        .map(|(line_no, word)| {
            if word.contains(char::is_whitespace) {
                Err(SamplerError::malformed(
                    name,
                    line_no,
                    format!("`{word}` is not a single word"),
                ))
            } else {
                Ok(word.to_string())
            }
        })
        .collect()
}
