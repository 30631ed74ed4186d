//! error kinds (§7). parse/config/graph errors surface to the caller;
//! numeric conditions are clamped at the point of computation and never
//! reach here. `Exhausted` is a normal end-of-iteration condition, not a
//! failure, and callers are expected to match on it rather than log it.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid hypergraph: {0}")]
    InvalidGraph(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    #[error("k-best exhausted")]
    Exhausted,
}

pub type Result<T> = std::result::Result<T, Error>;
