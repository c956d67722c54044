//! Seeded hill climbing on the codon usage objective.
//!
//! Only strictly improving moves are taken, so an already optimal sequence
//! comes back unchanged. A move must also leave the constraint state of the
//! bases it touches no worse: every violation overlapping the changed codon
//! afterwards must already have been there before.

use crate::{
    cancellation::CancellationToken,
    constraints::Constraint,
    dna_sequence::DNAsequence,
    error::Result,
    genetic_code::Codon,
    mutation_space::MutationSpace,
    objectives::Objective,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Random draws allowed in total.
    pub max_iterations: usize,
    /// Consecutive non-improving draws before a full sweep decides whether to stop.
    pub max_stagnant_iterations: usize,
    pub seed: u64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            max_iterations: 20_000,
            max_stagnant_iterations: 1_000,
            seed: 123,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OptimizationOutcome {
    pub iterations: usize,
    pub accepted_moves: usize,
    /// The iteration cap was reached while improving moves were still available.
    pub budget_exhausted: bool,
    pub cancelled: bool,
}

pub struct Optimizer<'a> {
    settings: &'a OptimizerSettings,
    constraints: &'a [Constraint],
    space: &'a MutationSpace,
    objective: &'a Objective,
    cancellation: &'a CancellationToken,
}

impl<'a> Optimizer<'a> {
    pub fn new(
        settings: &'a OptimizerSettings,
        constraints: &'a [Constraint],
        space: &'a MutationSpace,
        objective: &'a Objective,
        cancellation: &'a CancellationToken,
    ) -> Self {
        Self {
            settings,
            constraints,
            space,
            objective,
            cancellation,
        }
    }

    pub fn optimize(&self, sequence: &mut DNAsequence) -> Result<OptimizationOutcome> {
        let mut outcome = OptimizationOutcome::default();
        if self.space.is_empty() {
            return Ok(outcome);
        }
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.settings.seed);

        let mut converged = self.sweep(sequence, &mut outcome)? == 0;
        let mut stagnant = 0;
        while !converged
            && !outcome.cancelled
            && outcome.iterations < self.settings.max_iterations
        {
            if self.cancellation.is_cancelled() {
                warn!("Optimization cancelled");
                outcome.cancelled = true;
                break;
            }
            outcome.iterations += 1;
            let index = rng.random_range(0..self.space.len());
            if self.improve(sequence, index)? {
                outcome.accepted_moves += 1;
                stagnant = 0;
            } else {
                stagnant += 1;
            }
            if stagnant >= self.settings.max_stagnant_iterations {
                if self.sweep(sequence, &mut outcome)? == 0 {
                    converged = true;
                    break;
                }
                stagnant = 0;
            }
        }

        if !converged && !outcome.cancelled {
            outcome.budget_exhausted = self.can_improve(sequence)?;
        }
        info!(
            "Optimization finished after {} iteration(s) with {} accepted move(s){}",
            outcome.iterations,
            outcome.accepted_moves,
            if outcome.budget_exhausted {
                ", budget exhausted"
            } else {
                ""
            }
        );
        Ok(outcome)
    }

    /// One pass over every position in order; returns the number of accepted moves.
    fn sweep(
        &self,
        sequence: &mut DNAsequence,
        outcome: &mut OptimizationOutcome,
    ) -> Result<usize> {
        let mut accepted = 0;
        for index in 0..self.space.len() {
            if self.cancellation.is_cancelled() {
                warn!("Optimization cancelled");
                outcome.cancelled = true;
                break;
            }
            if self.improve(sequence, index)? {
                accepted += 1;
            }
        }
        outcome.accepted_moves += accepted;
        Ok(accepted)
    }

    fn can_improve(&self, sequence: &mut DNAsequence) -> Result<bool> {
        for index in 0..self.space.len() {
            if self.find_improvement(sequence, index)?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn improve(&self, sequence: &mut DNAsequence, index: usize) -> Result<bool> {
        let Some(codon) = self.find_improvement(sequence, index)? else {
            return Ok(false);
        };
        let previous = sequence.mutate_codon(index, &codon)?;
        debug!(
            "Codon {index}: {} -> {}",
            String::from_utf8_lossy(&previous),
            String::from_utf8_lossy(&codon)
        );
        Ok(true)
    }

    /// The best-scoring legal codon at `index` that beats the current one
    /// without disturbing the constraints. Leaves `sequence` as it found it.
    fn find_improvement(
        &self,
        sequence: &mut DNAsequence,
        index: usize,
    ) -> Result<Option<Codon>> {
        let Some(current) = sequence.codon(index) else {
            return Ok(None);
        };
        let region = DNAsequence::codon_range(index);
        let mut before = None;
        for candidate in self.space.choices(index) {
            if *candidate == current
                || !self.space.is_legal(index, candidate)
                || self.objective.codon_delta(&current, candidate) <= 0.0
            {
                continue;
            }
            let before = before.get_or_insert_with(|| self.violation_spans(sequence, &region));
            sequence.mutate_codon(index, candidate)?;
            let after = self.violation_spans(sequence, &region);
            sequence.mutate_codon(index, &current)?;
            if after.iter().all(|span| before.contains(span)) {
                return Ok(Some(*candidate));
            }
        }
        Ok(None)
    }

    fn violation_spans(
        &self,
        sequence: &DNAsequence,
        region: &Range<usize>,
    ) -> Vec<(usize, Range<usize>)> {
        self.constraints
            .iter()
            .enumerate()
            .flat_map(|(index, constraint)| {
                constraint
                    .evaluate_window(sequence, region.clone())
                    .into_iter()
                    .map(move |violation| (index, violation.span))
            })
            .collect()
    }
}
