pub use cancellation::CancellationToken;
pub use dna_sequence::DNAsequence;
pub use engine::{Engine, EngineParameters, OptimizationEngine, OptimizationResult, ReferenceTables};
pub use error::{OptimizerError, Result};

pub mod cancellation;
pub mod codon_usage;
pub mod constraints;
pub mod dna_sequence;
pub mod engine;
pub mod enzymes;
pub mod error;
pub mod gc_contents;
pub mod genetic_code;
pub mod iupac_code;
pub mod logging;
pub mod mutation_space;
pub mod objectives;
pub mod optimizer;
pub mod problem;
pub mod reports;
pub mod resolver;
pub mod restriction_enzyme;
pub mod sequence_pattern;
