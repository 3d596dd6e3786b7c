use crate::error::{Result, SamplerError};
use crate::resource;
use crate::Term;
use ahash::AHashMap;

/// Immutable ranked table of `(term, relative weight)` pairs.
///
/// Entries are kept in descending weight order; equal weights keep their
/// order from the resource. The table is never mutated after loading, so one
/// instance can seed any number of samplers.
#[derive(Debug, Clone)]
pub struct WordFrequencyTable {
    name: String,
    entries: Vec<(Term, f64)>,
    lookup: AHashMap<Term, usize>,
}

impl WordFrequencyTable {
    /// Load and parse the named resource (built-in name or file path).
    pub fn load(resource_name: &str) -> Result<Self> {
        let text = resource::load(resource_name)?;
        let table = Self::parse(resource_name, &text)?;
        tracing::debug!(
            resource = resource_name,
            entries = table.len(),
            "word frequency table loaded"
        );
        Ok(table)
    }

    /// Parse table text.
    ///
    /// One entry per line: `term,weight`, `term<TAB>weight` or
    /// `term weight`. Blank lines and `#` comments are skipped, as is a leading
    /// `term,weight` header. Any malformed line fails the whole table.
    pub fn parse(name: &str, text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (index, (line_no, line)) in resource::content_lines(text).enumerate() {
            let (term, weight) = split_entry(line)
                .ok_or_else(|| SamplerError::malformed(name, line_no, "expected `term,weight`"))?;
            let weight = match weight.parse::<f64>() {
                Ok(w) => w,
                Err(_) if index == 0 && is_header(term, weight) => continue,
                Err(_) => {
                    return Err(SamplerError::malformed(
                        name,
                        line_no,
                        format!("weight `{weight}` is not a number"),
                    ))
                }
            };
            entries.push((line_no, term.to_string(), weight));
        }
        Self::build(name, entries)
    }

    /// Build a table from in-memory entries.
    pub fn from_entries<I, S>(name: &str, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let entries = entries
            .into_iter()
            .enumerate()
            .map(|(i, (term, weight))| (i + 1, term.into(), weight))
            .collect();
        Self::build(name, entries)
    }

    fn build(name: &str, raw: Vec<(usize, String, f64)>) -> Result<Self> {
        let mut entries: Vec<(Term, f64)> = Vec::with_capacity(raw.len());
        let mut lookup = AHashMap::with_capacity(raw.len());

        for (line_no, term, weight) in raw {
            if term.is_empty() {
                return Err(SamplerError::malformed(name, line_no, "empty term"));
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(SamplerError::malformed(
                    name,
                    line_no,
                    format!("weight {weight} must be finite and non-negative"),
                ));
            }
            let term: Term = Term::from(term);
            if lookup.contains_key(&term) {
                return Err(SamplerError::malformed(
                    name,
                    line_no,
                    format!("term `{term}` listed twice"),
                ));
            }
            lookup.insert(term.clone(), 0);
            entries.push((term, weight));
        }

        // Stable: ties keep resource order.
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (rank, (term, _)) in entries.iter().enumerate() {
            lookup.insert(term.clone(), rank);
        }

        Ok(Self {
            name: name.to_string(),
            entries,
            lookup,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in descending weight order.
    pub fn iter(&self) -> impl Iterator<Item = (&Term, f64)> + '_ {
        self.entries.iter().map(|(term, weight)| (term, *weight))
    }

    pub fn weight(&self, term: &str) -> Option<f64> {
        self.lookup.get(term).map(|&rank| self.entries[rank].1)
    }

    /// 0-based rank of `term` in descending weight order.
    pub fn rank(&self, term: &str) -> Option<usize> {
        self.lookup.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.lookup.contains_key(term)
    }

    /// Seed list of `(term, pseudo-count)` for a sampler.
    ///
    /// The smallest non-zero weight maps to 1 and the rest scale
    /// proportionally, rounded to the nearest integer and never below 1.
    /// Zero-weight entries are left out.
    pub fn seed_list(&self) -> Vec<(Term, u64)> {
        let smallest = self
            .entries
            .iter()
            .map(|(_, w)| *w)
            .filter(|w| *w > 0.0)
            .fold(f64::INFINITY, f64::min);

        self.entries
            .iter()
            .filter(|(_, w)| *w > 0.0)
            .map(|(term, w)| {
                let count = (w / smallest).round().max(1.0) as u64;
                (term.clone(), count)
            })
            .collect()
    }
}

fn split_entry(line: &str) -> Option<(&str, &str)> {
    let (term, weight) = line
        .split_once(',')
        .or_else(|| line.split_once('\t'))
        .or_else(|| line.rsplit_once(char::is_whitespace))?;
    Some((term.trim(), weight.trim()))
}

fn is_header(term: &str, weight: &str) -> bool {
    matches!(term.to_ascii_lowercase().as_str(), "term" | "word")
        && weight.eq_ignore_ascii_case("weight")
}
