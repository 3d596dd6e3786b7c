use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Deserialize;

/// Seed for a random stream.
///
/// Integers go straight through `seed_from_u64`. Strings are folded eight
/// bytes at a time through the same expansion, so a given string yields the
/// same stream on every platform.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    /// Seed from operating-system entropy.
    #[default]
    Entropy,
    Number(u64),
    Text(String),
}

impl Seed {
    pub fn rng(&self) -> Xoshiro256PlusPlus {
        match self {
            Seed::Entropy => Xoshiro256PlusPlus::from_entropy(),
            Seed::Number(n) => Xoshiro256PlusPlus::seed_from_u64(*n),
            Seed::Text(s) => Xoshiro256PlusPlus::seed_from_u64(fold_text(s)),
        }
    }

    pub fn is_entropy(&self) -> bool {
        matches!(self, Seed::Entropy)
    }
}

fn fold_text(text: &str) -> u64 {
    let mut state = text.len() as u64;
    for chunk in text.as_bytes().chunks(8) {
        let mut word = [0u8; 8];
        word[..chunk.len()].copy_from_slice(chunk);
        state = Xoshiro256PlusPlus::seed_from_u64(state ^ u64::from_le_bytes(word)).next_u64();
    }
    state
}

impl From<u64> for Seed {
    fn from(n: u64) -> Self {
        Seed::Number(n)
    }
}

impl From<&str> for Seed {
    fn from(s: &str) -> Self {
        Seed::Text(s.to_string())
    }
}

impl From<String> for Seed {
    fn from(s: String) -> Self {
        Seed::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn first_draws(seed: &Seed) -> Vec<u64> {
        let mut rng = seed.rng();
        (0..8).map(|_| rng.gen()).collect()
    }

    #[test]
    fn numeric_seed_is_reproducible() {
        assert_eq!(first_draws(&Seed::from(7)), first_draws(&Seed::from(7)));
        assert_ne!(first_draws(&Seed::from(7)), first_draws(&Seed::from(8)));
    }

    #[test]
    fn text_seed_is_reproducible() {
        let a = Seed::from("synthetic-terms");
        let b = Seed::from(String::from("synthetic-terms"));
        assert_eq!(first_draws(&a), first_draws(&b));
        assert_ne!(first_draws(&a), first_draws(&Seed::from("synthetic-term")));
    }

    #[test]
    fn text_seed_depends_on_length() {
        // Zero padding of the last chunk must not collide with an explicit NUL.
        assert_ne!(fold_text("ab"), fold_text("ab\0"));
    }

    #[test]
    fn entropy_is_default() {
        assert!(Seed::default().is_entropy());
        assert!(!Seed::from(1).is_entropy());
    }
}
