use thiserror::Error;

/// Errors raised while building or driving a sampler.
#[derive(Debug, Error)]
pub enum SamplerError {
    /// Bad discount, strength, seed count or lane count at construction.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An identity appeared twice, either in a seed list or from a factory.
    #[error("duplicate species: {0}")]
    DuplicateSpecies(String),

    #[error("malformed resource `{resource}` at line {line}: {reason}")]
    MalformedResource {
        resource: String,
        line: usize,
        reason: String,
    },

    #[error("cannot read resource `{resource}`: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },

    /// The factory has no novel identities left.
    #[error("species factory is exhausted")]
    NoveltyExhausted,

    /// Fell back to existing species, but there are none.
    #[error("no existing species to select from")]
    EmptyPopulation,
}

pub type Result<T> = std::result::Result<T, SamplerError>;

impl SamplerError {
    pub(crate) fn malformed(resource: &str, line: usize, reason: impl Into<String>) -> Self {
        SamplerError::MalformedResource {
            resource: resource.to_string(),
            line,
            reason: reason.into(),
        }
    }
}
