use serde::Serialize;
use std::ops::Range;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OptimizerError>;

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),
    #[error("Invalid codon '{0}'")]
    InvalidCodon(String),
    #[error("Codon index {index} out of bounds ({codons} codons)")]
    OutOfBounds { index: usize, codons: usize },
    #[error("Range {start}..{end} out of bounds (length {len})")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },
    #[error("Unknown genetic code '{0}'")]
    UnknownGeneticCode(String),
    #[error("Invalid genetic code table: {0}")]
    InvalidGeneticCode(String),
    #[error("Invalid codon usage table: {0}")]
    InvalidCodonUsage(String),
    #[error("Invalid enzyme table: {0}")]
    InvalidEnzymeTable(String),
    #[error("Invalid pattern '{0}'")]
    InvalidPattern(String),
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Cannot {action} a problem in state {state}")]
    InvalidState { action: String, state: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Why a single violation could not be cleared by the resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Error)]
pub enum UnresolvableCause {
    #[error("no synonymous codon available")]
    NoSynonymousCodonAvailable,
    #[error("substitution attempts exhausted")]
    AttemptsExhausted,
    #[error("translation differs from the original protein")]
    TranslationMismatch,
    #[error("resolution cancelled")]
    Cancelled,
}

/// A violation left over after resolution. Collected, never raised.
#[derive(Clone, Debug, PartialEq, Serialize, Error)]
#[error("{label} at {}-{}: {cause}", .span.start, .span.end)]
pub struct UnresolvableConstraint {
    pub constraint: usize,
    pub label: String,
    pub span: Range<usize>,
    pub cause: UnresolvableCause,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolvable_display() {
        let unresolved = UnresolvableConstraint {
            constraint: 2,
            label: "AvoidPattern[BsaI](GGTCTC)".to_string(),
            span: 3..9,
            cause: UnresolvableCause::NoSynonymousCodonAvailable,
        };
        assert_eq!(
            unresolved.to_string(),
            "AvoidPattern[BsaI](GGTCTC) at 3-9: no synonymous codon available"
        );
    }

    #[test]
    fn test_error_from_io() {
        let err: OptimizerError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, OptimizerError::Io(_)));
    }
}
