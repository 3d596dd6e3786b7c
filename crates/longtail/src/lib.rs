//! Long-tail species sampling.
//!
//! A [`LongTailSampler`](sampler::LongTailSampler) runs a two-parameter
//! species-discovery process: every draw either repeats an existing species,
//! weighted by its accumulated count, or mints a new one through a
//! [`SpeciesFactory`](traits::SpeciesFactory). The word layer seeds that
//! process from a frequency table and mints novel terms from a reservoir, and
//! [`TermGenerator`](terms::TermGenerator) wraps it all behind `sample()`.

pub mod error;
pub mod factory;
pub mod resource;
pub mod sampler;
pub mod seed;
pub mod table;
pub mod terms;
pub mod traits;
pub mod weights;
pub mod words;

pub use error::{Result, SamplerError};
pub use sampler::{ExhaustionPolicy, LongTailSampler, Species};
pub use seed::Seed;
pub use table::WordFrequencyTable;
pub use terms::{TermGenerator, TermOptions};
pub use traits::{SamplerStats, SpeciesFactory};
pub use words::WordGenerator;

/// Identity type of word-backed species.
pub type Term = std::sync::Arc<str>;
