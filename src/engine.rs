use crate::{
    cancellation::CancellationToken,
    codon_usage::CodonUsageTable,
    constraints::{AvoidPattern, Constraint, EnforceGcContent, EnforceTranslation},
    dna_sequence::DNAsequence,
    enzymes::Enzymes,
    error::{OptimizerError, Result, UnresolvableConstraint},
    genetic_code::{GeneticCode, GeneticCodes},
    mutation_space::MutationSpace,
    objectives::{CodonOptimize, Objective},
    optimizer::OptimizerSettings,
    problem::{DnaOptimizationProblem, ProblemState},
    reports::ProblemReport,
    resolver::ResolverSettings,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_AVOID_PATTERNS: [&str; 4] = ["BbsI", "BsmBI", "BsaI", "NotI"];
pub const DEFAULT_GENETIC_CODE: &str = "Bacterial";

/// Immutable lookup tables shared by every optimization run.
#[derive(Clone, Debug)]
pub struct ReferenceTables {
    pub genetic_codes: GeneticCodes,
    pub enzymes: Enzymes,
    pub codon_usage: CodonUsageTable,
}

impl ReferenceTables {
    /// Built-in genetic codes and enzymes with the E. coli codon usage table.
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            genetic_codes: GeneticCodes::builtin()?,
            enzymes: Enzymes::builtin()?,
            codon_usage: CodonUsageTable::builtin_e_coli()?,
        })
    }

    pub fn with_codon_usage(self, codon_usage: CodonUsageTable) -> Self {
        Self {
            codon_usage,
            ..self
        }
    }

    pub fn with_enzymes(self, enzymes: Enzymes) -> Self {
        Self { enzymes, ..self }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcContentSettings {
    pub enabled: bool,
    pub min_fraction: f64,
    pub max_fraction: f64,
    pub window: usize,
}

impl Default for GcContentSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_fraction: 0.3,
            max_fraction: 0.7,
            window: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParameters {
    /// Enzyme names (`BsaI`, `BsaI_site`) or literal IUPAC patterns.
    pub avoid_patterns: Vec<String>,
    pub genetic_code: String,
    pub enforce_translation: bool,
    pub gc_content: GcContentSettings,
    pub resolver: ResolverSettings,
    pub optimizer: OptimizerSettings,
}

impl Default for EngineParameters {
    fn default() -> Self {
        Self {
            avoid_patterns: DEFAULT_AVOID_PATTERNS.iter().map(|s| s.to_string()).collect(),
            genetic_code: DEFAULT_GENETIC_CODE.to_string(),
            enforce_translation: true,
            gc_content: GcContentSettings::default(),
            resolver: ResolverSettings::default(),
            optimizer: OptimizerSettings::default(),
        }
    }
}

impl EngineParameters {
    pub fn load_from_path(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let ret: Self = serde_json::from_str(&text)?;
        ret.validate()?;
        Ok(ret)
    }

    pub fn save_to_path(&self, path: &str) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.gc_content.enabled {
            EnforceGcContent::new(
                self.gc_content.min_fraction,
                self.gc_content.max_fraction,
                self.gc_content.window,
            )?;
        }
        if self.avoid_patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(OptimizerError::InvalidParameters(
                "Empty pattern in avoid_patterns".to_string(),
            ));
        }
        if self.resolver.max_attempts_per_violation == 0 {
            return Err(OptimizerError::InvalidParameters(
                "resolver.max_attempts_per_violation must be at least 1".to_string(),
            ));
        }
        if self.optimizer.max_stagnant_iterations == 0 {
            return Err(OptimizerError::InvalidParameters(
                "optimizer.max_stagnant_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub name: Option<String>,
    pub optimized_sequence: String,
    pub constraints_summary: String,
    pub objectives_summary: String,
    pub state: ProblemState,
    pub unresolved: Vec<UnresolvableConstraint>,
    pub cancelled: bool,
    pub budget_exhausted: bool,
    pub report: ProblemReport,
}

impl OptimizationResult {
    fn from_problem(problem: &DnaOptimizationProblem) -> Self {
        let report = problem.report();
        Self {
            name: problem.sequence().name().map(|s| s.to_string()),
            optimized_sequence: problem.sequence().to_string(),
            constraints_summary: report.constraints_text_summary(),
            objectives_summary: report.objectives_text_summary(),
            state: problem.state(),
            unresolved: report.unresolved.clone(),
            cancelled: report.cancelled,
            budget_exhausted: report.budget_exhausted,
            report,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state == ProblemState::Done
    }
}

pub trait Engine {
    fn optimize(&self, sequence: &str) -> Result<OptimizationResult>;
    fn optimize_batch(
        &self,
        sequences: &[DNAsequence],
        cancellation: &CancellationToken,
    ) -> Vec<Result<OptimizationResult>>;
    fn parameters(&self) -> &EngineParameters;
}

/// Builds one problem per request from shared tables and fixed parameters.
#[derive(Debug, Clone)]
pub struct OptimizationEngine {
    tables: Arc<ReferenceTables>,
    parameters: EngineParameters,
    genetic_code: GeneticCode,
    /// Pattern and GC constraints; they do not depend on the sequence.
    constraints: Vec<Constraint>,
}

impl OptimizationEngine {
    pub fn new(tables: Arc<ReferenceTables>, parameters: EngineParameters) -> Result<Self> {
        parameters.validate()?;
        let genetic_code = tables.genetic_codes.find(&parameters.genetic_code)?.clone();
        let mut constraints = vec![];
        for name in &parameters.avoid_patterns {
            let constraint = match tables.enzymes.find(name) {
                Some(enzyme) => AvoidPattern::from_enzyme(enzyme)?,
                None => AvoidPattern::from_literal(name.trim())?,
            };
            constraints.push(Constraint::AvoidPattern(constraint));
        }
        if parameters.gc_content.enabled {
            constraints.push(Constraint::EnforceGcContent(EnforceGcContent::new(
                parameters.gc_content.min_fraction,
                parameters.gc_content.max_fraction,
                parameters.gc_content.window,
            )?));
        }
        Ok(Self {
            tables,
            parameters,
            genetic_code,
            constraints,
        })
    }

    pub fn tables(&self) -> &Arc<ReferenceTables> {
        &self.tables
    }

    pub fn genetic_code(&self) -> &GeneticCode {
        &self.genetic_code
    }

    pub fn build_problem(&self, sequence: DNAsequence) -> Result<DnaOptimizationProblem> {
        let mut constraints = Vec::with_capacity(self.constraints.len() + 1);
        if self.parameters.enforce_translation {
            constraints.push(Constraint::EnforceTranslation(EnforceTranslation::new(
                &self.genetic_code,
                &sequence,
            )?));
        }
        constraints.extend(self.constraints.iter().cloned());
        let space = MutationSpace::new(&sequence, &self.genetic_code, &self.tables.codon_usage);
        let objectives = vec![Objective::CodonOptimize(CodonOptimize::new(
            &self.tables.codon_usage,
            &self.genetic_code,
        ))];
        Ok(DnaOptimizationProblem::new(
            sequence,
            constraints,
            objectives,
            space,
        ))
    }

    /// Resolves, then optimizes if resolution succeeded. A failed resolution is
    /// reported in the result, not returned as an error.
    pub fn optimize_sequence(
        &self,
        sequence: DNAsequence,
        cancellation: &CancellationToken,
    ) -> Result<OptimizationResult> {
        info!(
            "Optimizing {} ({} nt)",
            sequence.name().unwrap_or("sequence"),
            sequence.len()
        );
        let mut problem = self.build_problem(sequence)?;
        problem.resolve_constraints(&self.parameters.resolver, cancellation)?;
        if problem.state() == ProblemState::Resolved {
            problem.optimize(&self.parameters.optimizer, cancellation)?;
        }
        Ok(OptimizationResult::from_problem(&problem))
    }

    pub fn optimize_with_cancellation(
        &self,
        sequence: &str,
        cancellation: &CancellationToken,
    ) -> Result<OptimizationResult> {
        self.optimize_sequence(DNAsequence::from_sequence(sequence)?, cancellation)
    }
}

impl Engine for OptimizationEngine {
    fn optimize(&self, sequence: &str) -> Result<OptimizationResult> {
        self.optimize_with_cancellation(sequence, &CancellationToken::new())
    }

    /// Runs the sequences in parallel; results keep the input order.
    fn optimize_batch(
        &self,
        sequences: &[DNAsequence],
        cancellation: &CancellationToken,
    ) -> Vec<Result<OptimizationResult>> {
        sequences
            .par_iter()
            .map(|sequence| self.optimize_sequence(sequence.clone(), cancellation))
            .collect()
    }

    fn parameters(&self) -> &EngineParameters {
        &self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnresolvableCause;

    fn engine(parameters: EngineParameters) -> OptimizationEngine {
        let tables = Arc::new(ReferenceTables::builtin().unwrap());
        OptimizationEngine::new(tables, parameters).unwrap()
    }

    #[test]
    fn test_default_parameters() {
        let parameters = EngineParameters::default();
        assert_eq!(parameters.avoid_patterns, ["BbsI", "BsmBI", "BsaI", "NotI"]);
        assert_eq!(parameters.genetic_code, "Bacterial");
        assert_eq!(parameters.optimizer.seed, 123);
        let engine = engine(parameters);
        let labels: Vec<_> = engine.constraints.iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            vec![
                "AvoidPattern[BbsI](GAAGAC)",
                "AvoidPattern[BsmBI](CGTCTC)",
                "AvoidPattern[BsaI](GGTCTC)",
                "AvoidPattern[NotI](GCGGCCGC)",
                "EnforceGCContent[0.30-0.70, window 50]",
            ]
        );
    }

    #[test]
    fn test_partial_parameters_file() {
        let parameters: EngineParameters =
            serde_json::from_str(r#"{"avoid_patterns": ["EcoRI"], "optimizer": {"seed": 5}}"#)
                .unwrap();
        assert_eq!(parameters.avoid_patterns, ["EcoRI"]);
        assert_eq!(parameters.optimizer.seed, 5);
        assert_eq!(parameters.optimizer.max_iterations, 20_000);
        assert!(parameters.gc_content.enabled);
    }

    #[test]
    fn test_save_and_load_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parameters.json");
        let path = path.to_str().unwrap();
        let mut parameters = EngineParameters::default();
        parameters.genetic_code = "Standard".to_string();
        parameters.save_to_path(path).unwrap();
        assert_eq!(EngineParameters::load_from_path(path).unwrap(), parameters);
    }

    #[test]
    fn test_invalid_parameters() {
        let tables = Arc::new(ReferenceTables::builtin().unwrap());
        let mut parameters = EngineParameters::default();
        parameters.gc_content.min_fraction = 0.8;
        assert!(OptimizationEngine::new(tables.clone(), parameters).is_err());

        let parameters = EngineParameters {
            genetic_code: "Martian".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            OptimizationEngine::new(tables.clone(), parameters),
            Err(OptimizerError::UnknownGeneticCode(_))
        ));

        let parameters = EngineParameters {
            avoid_patterns: vec!["GG?CC".to_string()],
            ..Default::default()
        };
        assert!(OptimizationEngine::new(tables, parameters).is_err());
    }

    #[test]
    fn test_literal_pattern() {
        let parameters = EngineParameters {
            avoid_patterns: vec!["gaattc".to_string(), "NotI_site".to_string()],
            ..Default::default()
        };
        let with_names = engine(parameters);
        assert_eq!(with_names.constraints[0].label(), "AvoidPattern(GAATTC)");
        assert_eq!(with_names.constraints[1].label(), "AvoidPattern[NotI](GCGGCCGC)");

        let parameters = EngineParameters {
            avoid_patterns: vec!["ACGNNT".to_string()],
            ..Default::default()
        };
        assert_eq!(engine(parameters).constraints[0].label(), "AvoidPattern(ACGNNT)");
    }

    #[test]
    fn test_optimize_removes_site() {
        let engine = engine(EngineParameters {
            gc_content: GcContentSettings {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        });
        let result = engine.optimize("ATGGGTCTCAAAGAAGACTAA").unwrap();
        assert!(result.succeeded());
        assert!(!result.optimized_sequence.contains("GGTCTC"));
        assert!(!result.optimized_sequence.contains("GAAGAC"));
        assert!(
            result
                .constraints_summary
                .starts_with("===> SUCCESS - all constraints evaluations pass")
        );
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn test_optimize_rejects_bad_input() {
        let engine = engine(EngineParameters::default());
        assert!(matches!(
            engine.optimize("ATGXAA"),
            Err(OptimizerError::InvalidSequence(_))
        ));
        assert!(matches!(
            engine.optimize("ATGAA"),
            Err(OptimizerError::InvalidSequence(_))
        ));
        assert!(engine.optimize("").is_err());
    }

    #[test]
    fn test_unresolvable_is_reported() {
        let engine = engine(EngineParameters {
            avoid_patterns: vec!["ATGTGG".to_string()],
            gc_content: GcContentSettings {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        });
        let result = engine.optimize("ATGTGGTAA").unwrap();
        assert_eq!(result.state, ProblemState::Failed);
        assert_eq!(
            result.unresolved[0].cause,
            UnresolvableCause::NoSynonymousCodonAvailable
        );
        assert_eq!(result.optimized_sequence, "ATGTGGTAA");
        assert!(result.constraints_summary.starts_with("===> FAILURE: 1"));
    }

    #[test]
    fn test_batch_keeps_order() {
        let engine = engine(EngineParameters::default());
        let sequences: Vec<_> = ["ATGGCCTAA", "ATGAAATAA", "ATGCTATAA"]
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut dna = DNAsequence::from_sequence(s).unwrap();
                dna.set_name(Some(format!("seq{i}")));
                dna
            })
            .collect();
        let results = engine.optimize_batch(&sequences, &CancellationToken::new());
        let names: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().unwrap().name.clone().unwrap())
            .collect();
        assert_eq!(names, ["seq0", "seq1", "seq2"]);
        for (result, sequence) in results.iter().zip(&sequences) {
            let single = engine.optimize(&sequence.to_string()).unwrap();
            assert_eq!(result.as_ref().unwrap().optimized_sequence, single.optimized_sequence);
        }
    }

    #[test]
    fn test_cancelled_run_returns_input() {
        let engine = engine(EngineParameters::default());
        let token = CancellationToken::new();
        token.cancel();
        let result = engine
            .optimize_with_cancellation("ATGCTACTATAA", &token)
            .unwrap();
        assert!(result.cancelled);
        assert_eq!(result.optimized_sequence, "ATGCTACTATAA");
    }
}
