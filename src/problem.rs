use crate::{
    cancellation::CancellationToken,
    constraints::Constraint,
    dna_sequence::DNAsequence,
    error::{OptimizerError, Result, UnresolvableConstraint},
    mutation_space::MutationSpace,
    objectives::Objective,
    optimizer::{OptimizationOutcome, Optimizer, OptimizerSettings},
    reports::{ConstraintReport, ObjectiveReport, ProblemReport},
    resolver::{ResolutionOutcome, Resolver, ResolverSettings},
};
use serde::Serialize;
use std::fmt;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemState {
    Created,
    Resolving,
    Resolved,
    Failed,
    Optimizing,
    Done,
}

impl fmt::Display for ProblemState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ProblemState::Created => "CREATED",
            ProblemState::Resolving => "RESOLVING",
            ProblemState::Resolved => "RESOLVED",
            ProblemState::Failed => "FAILED",
            ProblemState::Optimizing => "OPTIMIZING",
            ProblemState::Done => "DONE",
        };
        write!(f, "{name}")
    }
}

/// One sequence together with the constraints it must meet and the objectives it is scored by.
///
/// The problem owns its sequence and walks it through
/// `CREATED -> RESOLVING -> RESOLVED | FAILED` and then
/// `RESOLVED -> OPTIMIZING -> DONE`.
#[derive(Clone, Debug)]
pub struct DnaOptimizationProblem {
    input: DNAsequence,
    sequence: DNAsequence,
    constraints: Vec<Constraint>,
    objectives: Vec<Objective>,
    space: MutationSpace,
    state: ProblemState,
    resolution: Option<ResolutionOutcome>,
    /// Objective scores at the RESOLVED -> OPTIMIZING transition.
    resolved_scores: Option<Vec<f64>>,
    optimization: Option<OptimizationOutcome>,
}

impl DnaOptimizationProblem {
    pub fn new(
        sequence: DNAsequence,
        constraints: Vec<Constraint>,
        objectives: Vec<Objective>,
        space: MutationSpace,
    ) -> Self {
        Self {
            input: sequence.clone(),
            sequence,
            constraints,
            objectives,
            space,
            state: ProblemState::Created,
            resolution: None,
            resolved_scores: None,
            optimization: None,
        }
    }

    pub fn state(&self) -> ProblemState {
        self.state
    }

    pub fn sequence(&self) -> &DNAsequence {
        &self.sequence
    }

    pub fn input_sequence(&self) -> &DNAsequence {
        &self.input
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn mutation_space(&self) -> &MutationSpace {
        &self.space
    }

    pub fn resolution(&self) -> Option<&ResolutionOutcome> {
        self.resolution.as_ref()
    }

    pub fn optimization(&self) -> Option<&OptimizationOutcome> {
        self.optimization.as_ref()
    }

    pub fn unresolved(&self) -> &[UnresolvableConstraint] {
        self.resolution
            .as_ref()
            .map(|r| r.unresolved.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_cancelled(&self) -> bool {
        self.resolution.as_ref().is_some_and(|r| r.cancelled)
            || self.optimization.as_ref().is_some_and(|o| o.cancelled)
    }

    /// Objective scores recorded when optimization started.
    pub fn resolved_scores(&self) -> Option<&[f64]> {
        self.resolved_scores.as_deref()
    }

    pub fn objectives_score(&self) -> f64 {
        self.objectives
            .iter()
            .map(|o| o.score(&self.sequence))
            .sum()
    }

    fn set_state(&mut self, state: ProblemState) {
        info!("Problem {} -> {}", self.state, state);
        self.state = state;
    }

    fn expect_state(&self, expected: ProblemState, action: &str) -> Result<()> {
        if self.state != expected {
            return Err(OptimizerError::InvalidState {
                action: action.to_string(),
                state: self.state.to_string(),
            });
        }
        Ok(())
    }

    pub fn resolve_constraints(
        &mut self,
        settings: &ResolverSettings,
        cancellation: &CancellationToken,
    ) -> Result<&ResolutionOutcome> {
        self.expect_state(ProblemState::Created, "resolve")?;
        self.set_state(ProblemState::Resolving);
        let outcome = Resolver::new(settings, &self.constraints, &self.space, cancellation)
            .resolve(&mut self.sequence)?;
        self.set_state(if outcome.resolved {
            ProblemState::Resolved
        } else {
            ProblemState::Failed
        });
        Ok(self.resolution.insert(outcome))
    }

    pub fn optimize(
        &mut self,
        settings: &OptimizerSettings,
        cancellation: &CancellationToken,
    ) -> Result<&OptimizationOutcome> {
        self.expect_state(ProblemState::Resolved, "optimize")?;
        self.resolved_scores = Some(
            self.objectives
                .iter()
                .map(|o| o.score(&self.sequence))
                .collect(),
        );
        self.set_state(ProblemState::Optimizing);
        let mut outcome = OptimizationOutcome::default();
        for objective in &self.objectives {
            let step = Optimizer::new(
                settings,
                &self.constraints,
                &self.space,
                objective,
                cancellation,
            )
            .optimize(&mut self.sequence)?;
            outcome.iterations += step.iterations;
            outcome.accepted_moves += step.accepted_moves;
            outcome.budget_exhausted |= step.budget_exhausted;
            outcome.cancelled |= step.cancelled;
        }
        self.set_state(ProblemState::Done);
        Ok(self.optimization.insert(outcome))
    }

    pub fn report(&self) -> ProblemReport {
        let codons = self.sequence.codon_count().max(1) as f64;
        ProblemReport {
            state: self.state,
            constraints: self
                .constraints
                .iter()
                .map(|c| ConstraintReport::new(c.label(), &c.evaluate(&self.sequence)))
                .collect(),
            objectives: self
                .objectives
                .iter()
                .enumerate()
                .map(|(index, o)| {
                    let before = o.score(&self.input);
                    let after = o.score(&self.sequence);
                    ObjectiveReport {
                        label: o.label(),
                        score_before: before,
                        score_resolved: self
                            .resolved_scores
                            .as_ref()
                            .and_then(|scores| scores.get(index).copied()),
                        score_after: after,
                        mean_codon_score_before: before / codons,
                        mean_codon_score_after: after / codons,
                    }
                })
                .collect(),
            unresolved: self.unresolved().to_vec(),
            budget_exhausted: self
                .optimization
                .as_ref()
                .is_some_and(|o| o.budget_exhausted),
            cancelled: self.is_cancelled(),
        }
    }

    pub fn constraints_text_summary(&self) -> String {
        self.report().constraints_text_summary()
    }

    pub fn objectives_text_summary(&self) -> String {
        self.report().objectives_text_summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codon_usage::CodonUsageTable,
        constraints::{AvoidPattern, EnforceTranslation},
        genetic_code::GeneticCodes,
        objectives::CodonOptimize,
    };

    fn problem(sequence: &str, patterns: &[&str]) -> DnaOptimizationProblem {
        let codes = GeneticCodes::builtin().unwrap();
        let code = codes.find("Bacterial").unwrap();
        let usage = CodonUsageTable::builtin_e_coli().unwrap();
        let sequence = DNAsequence::from_sequence(sequence).unwrap();
        let mut constraints = vec![Constraint::EnforceTranslation(
            EnforceTranslation::new(code, &sequence).unwrap(),
        )];
        for pattern in patterns {
            constraints.push(Constraint::AvoidPattern(
                AvoidPattern::from_literal(pattern).unwrap(),
            ));
        }
        let space = MutationSpace::new(&sequence, code, &usage);
        let objectives = vec![Objective::CodonOptimize(CodonOptimize::new(&usage, code))];
        DnaOptimizationProblem::new(sequence, constraints, objectives, space)
    }

    #[test]
    fn test_lifecycle() {
        let mut problem = problem("ATGGGTCTCAAATAA", &["GGTCTC"]);
        let token = CancellationToken::new();
        assert_eq!(problem.state(), ProblemState::Created);
        assert!(problem.optimize(&OptimizerSettings::default(), &token).is_err());

        let resolution = problem
            .resolve_constraints(&ResolverSettings::default(), &token)
            .unwrap();
        assert!(resolution.resolved);
        assert_eq!(problem.state(), ProblemState::Resolved);
        let resolved_score = problem.objectives_score();

        problem
            .optimize(&OptimizerSettings::default(), &token)
            .unwrap();
        assert_eq!(problem.state(), ProblemState::Done);
        assert!(problem.objectives_score() >= resolved_score);
        assert!(
            problem
                .resolve_constraints(&ResolverSettings::default(), &token)
                .is_err()
        );

        let summary = problem.constraints_text_summary();
        assert!(summary.starts_with("===> SUCCESS"));
        assert!(problem.objectives_text_summary().starts_with("===> TOTAL OBJECTIVES SCORE:"));
    }

    #[test]
    fn test_failed_problem_cannot_be_optimized() {
        let mut problem = problem("ATGTGGTAA", &["ATGTGG"]);
        let token = CancellationToken::new();
        problem
            .resolve_constraints(&ResolverSettings::default(), &token)
            .unwrap();
        assert_eq!(problem.state(), ProblemState::Failed);
        assert_eq!(problem.unresolved().len(), 1);
        let err = problem
            .optimize(&OptimizerSettings::default(), &token)
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot optimize a problem in state FAILED");

        let summary = problem.constraints_text_summary();
        assert!(summary.starts_with("===> FAILURE: 1 constraints evaluations failed"));
        assert!(summary.contains("UNRESOLVED AvoidPattern(ATGTGG) at 0-6"));
    }

    #[test]
    fn test_report_scores() {
        let mut problem = problem("ATGCTACTATAA", &[]);
        let token = CancellationToken::new();
        problem
            .resolve_constraints(&ResolverSettings::default(), &token)
            .unwrap();
        problem
            .optimize(&OptimizerSettings::default(), &token)
            .unwrap();
        let report = problem.report();
        assert_eq!(report.objectives.len(), 1);
        assert!(report.objectives[0].score_after > report.objectives[0].score_before);
        assert_eq!(problem.input_sequence().to_string(), "ATGCTACTATAA");
        // CTA is rare in E. coli, CTG is the favourite leucine codon
        assert_eq!(problem.sequence().to_string(), "ATGCTGCTGTAA");
    }

    #[test]
    fn test_report_keeps_score_after_resolution() {
        // Removing GGTCTC forces a rarer codon before the optimizer runs
        let mut problem = problem("ATGGGTCTCAAATAA", &["GGTCTC"]);
        let token = CancellationToken::new();
        problem
            .resolve_constraints(&ResolverSettings::default(), &token)
            .unwrap();
        assert!(problem.report().objectives[0].score_resolved.is_none());
        let resolved_score = problem.objectives_score();
        problem
            .optimize(&OptimizerSettings::default(), &token)
            .unwrap();

        assert_eq!(problem.resolved_scores(), Some(&[resolved_score][..]));
        let report = problem.report();
        let objective = &report.objectives[0];
        assert_eq!(objective.score_resolved, Some(resolved_score));
        assert!(objective.score_after >= resolved_score);
        assert!(
            problem
                .objectives_text_summary()
                .contains(&format!("after resolution {resolved_score:.2}"))
        );
    }
}
