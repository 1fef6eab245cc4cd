/// Refused accounting input.  Returned before any store is mutated.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MeteringError {
    #[error("spend amount must be a finite non-negative number, got {0}")]
    InvalidAmount(f64),

    #[error("unknown spend bucket: {0}")]
    UnknownBucket(String),
}
