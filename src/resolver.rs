//! Clears constraint violations with synonymous codon substitutions.
//!
//! Every pass evaluates all constraints and walks the violations in
//! [`ConstraintKind`] order. A violation is worked on one accepted codon at a
//! time until it disappears or its attempt budget runs out. A candidate codon
//! is accepted only if, in the bases its change can influence, it adds no new
//! violation, shrinks the targeted one and lowers the total severity.

use crate::{
    cancellation::CancellationToken,
    constraints::{Constraint, ConstraintKind, Violation},
    dna_sequence::DNAsequence,
    error::{Result, UnresolvableCause, UnresolvableConstraint},
    gc_contents::GcContents,
    genetic_code::Codon,
    mutation_space::MutationSpace,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, ops::Range};
use tracing::{debug, info, warn};

const SEVERITY_EPSILON: f64 = 1e-12;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Whole passes over all violations.
    pub max_iterations: usize,
    /// Candidate evaluations allowed per violation and pass.
    pub max_attempts_per_violation: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            max_attempts_per_violation: 1000,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResolutionOutcome {
    pub resolved: bool,
    pub passes: usize,
    pub mutations: usize,
    pub cancelled: bool,
    pub unresolved: Vec<UnresolvableConstraint>,
}

enum ViolationOutcome {
    Cleared { mutations: usize },
    Stuck { mutations: usize, cause: UnresolvableCause },
}

pub struct Resolver<'a> {
    settings: &'a ResolverSettings,
    constraints: &'a [Constraint],
    space: &'a MutationSpace,
    cancellation: &'a CancellationToken,
}

impl<'a> Resolver<'a> {
    pub fn new(
        settings: &'a ResolverSettings,
        constraints: &'a [Constraint],
        space: &'a MutationSpace,
        cancellation: &'a CancellationToken,
    ) -> Self {
        Self {
            settings,
            constraints,
            space,
            cancellation,
        }
    }

    pub fn resolve(&self, sequence: &mut DNAsequence) -> Result<ResolutionOutcome> {
        let mut outcome = ResolutionOutcome::default();
        let mut causes: HashMap<(usize, Range<usize>), UnresolvableCause> = HashMap::new();

        while outcome.passes < self.settings.max_iterations {
            let violations = self.all_violations(sequence);
            if violations.is_empty() {
                break;
            }
            if self.cancellation.is_cancelled() {
                warn!("Constraint resolution cancelled");
                outcome.cancelled = true;
                break;
            }
            outcome.passes += 1;

            let mismatches: Vec<_> = violations
                .iter()
                .filter(|(index, _)| {
                    self.constraints[*index].kind() == ConstraintKind::EnforceTranslation
                })
                .collect();
            if !mismatches.is_empty() {
                for (index, violation) in mismatches {
                    causes.insert(
                        (*index, violation.span.clone()),
                        UnresolvableCause::TranslationMismatch,
                    );
                }
                break;
            }

            let mut progress = false;
            for (index, violation) in violations {
                // Earlier fixes in this pass may have cleared or shrunk it
                let Some(current) = self.find_violation(sequence, index, &violation.span) else {
                    continue;
                };
                match self.resolve_violation(sequence, index, current)? {
                    ViolationOutcome::Cleared { mutations } => {
                        outcome.mutations += mutations;
                        progress = true;
                    }
                    ViolationOutcome::Stuck { mutations, cause } => {
                        outcome.mutations += mutations;
                        progress |= mutations > 0;
                        causes.insert((index, violation.span), cause);
                        if cause == UnresolvableCause::Cancelled {
                            outcome.cancelled = true;
                            break;
                        }
                    }
                }
            }
            if outcome.cancelled || !progress {
                break;
            }
        }

        let remaining = self.all_violations(sequence);
        outcome.resolved = remaining.is_empty();
        outcome.unresolved = remaining
            .into_iter()
            .map(|(index, violation)| {
                let cause = causes
                    .get(&(index, violation.span.clone()))
                    .copied()
                    .unwrap_or(if outcome.cancelled {
                        UnresolvableCause::Cancelled
                    } else {
                        UnresolvableCause::AttemptsExhausted
                    });
                UnresolvableConstraint {
                    constraint: index,
                    label: self.constraints[index].label(),
                    span: violation.span,
                    cause,
                }
            })
            .collect();
        for unresolved in &outcome.unresolved {
            warn!("Unresolvable constraint: {unresolved}");
        }
        info!(
            "Resolution finished after {} pass(es) and {} mutation(s), {} violation(s) left",
            outcome.passes,
            outcome.mutations,
            outcome.unresolved.len()
        );
        Ok(outcome)
    }

    /// Every violation, ordered by constraint kind then position.
    fn all_violations(&self, sequence: &DNAsequence) -> Vec<(usize, Violation)> {
        let mut ret: Vec<(usize, Violation)> = self
            .constraints
            .iter()
            .enumerate()
            .flat_map(|(index, constraint)| {
                constraint
                    .evaluate(sequence)
                    .into_iter()
                    .map(move |violation| (index, violation))
            })
            .collect();
        ret.sort_by(|(ia, va), (ib, vb)| {
            self.constraints[*ia]
                .kind()
                .cmp(&self.constraints[*ib].kind())
                .then(va.span.start.cmp(&vb.span.start))
                .then(ia.cmp(ib))
        });
        ret
    }

    fn local_violations(
        &self,
        sequence: &DNAsequence,
        region: &Range<usize>,
    ) -> Vec<(usize, Violation)> {
        self.constraints
            .iter()
            .enumerate()
            .flat_map(|(index, constraint)| {
                constraint
                    .evaluate_window(sequence, region.clone())
                    .into_iter()
                    .map(move |violation| (index, violation))
            })
            .collect()
    }

    fn find_violation(
        &self,
        sequence: &DNAsequence,
        constraint: usize,
        span: &Range<usize>,
    ) -> Option<Violation> {
        self.constraints[constraint]
            .evaluate_window(sequence, span.clone())
            .into_iter()
            .find(|violation| violation.span == *span)
    }

    fn resolve_violation(
        &self,
        sequence: &mut DNAsequence,
        constraint: usize,
        violation: Violation,
    ) -> Result<ViolationOutcome> {
        let span = violation.span.clone();
        let mut severity = violation.severity;
        let mut attempts = 0;
        let mut mutations = 0;
        loop {
            if self.cancellation.is_cancelled() {
                return Ok(ViolationOutcome::Stuck {
                    mutations,
                    cause: UnresolvableCause::Cancelled,
                });
            }
            let candidates = self.candidates(sequence, constraint, &span)?;
            if candidates.is_empty() {
                let cause = if mutations == 0 && !self.has_alternatives(sequence, &span) {
                    UnresolvableCause::NoSynonymousCodonAvailable
                } else {
                    UnresolvableCause::AttemptsExhausted
                };
                return Ok(ViolationOutcome::Stuck { mutations, cause });
            }

            let mut accepted = false;
            for (index, codon) in candidates {
                if attempts >= self.settings.max_attempts_per_violation {
                    return Ok(ViolationOutcome::Stuck {
                        mutations,
                        cause: UnresolvableCause::AttemptsExhausted,
                    });
                }
                attempts += 1;
                if self.try_candidate(sequence, constraint, &span, severity, index, &codon)? {
                    debug!(
                        "{}: codon {index} -> {}",
                        self.constraints[constraint].label(),
                        String::from_utf8_lossy(&codon)
                    );
                    mutations += 1;
                    accepted = true;
                    break;
                }
            }
            if !accepted {
                return Ok(ViolationOutcome::Stuck {
                    mutations,
                    cause: UnresolvableCause::AttemptsExhausted,
                });
            }
            match self.find_violation(sequence, constraint, &span) {
                Some(remaining) => severity = remaining.severity,
                None => return Ok(ViolationOutcome::Cleared { mutations }),
            }
        }
    }

    fn has_alternatives(&self, sequence: &DNAsequence, span: &Range<usize>) -> bool {
        self.space.codons_overlapping(span).any(|index| {
            sequence
                .codon(index)
                .is_some_and(|current| self.space.alternatives(index, &current).next().is_some())
        })
    }

    /// Codon substitutions to try against one violation, best first.
    fn candidates(
        &self,
        sequence: &DNAsequence,
        constraint: usize,
        span: &Range<usize>,
    ) -> Result<Vec<(usize, Codon)>> {
        let mut ret = vec![];
        for index in self.space.codons_overlapping(span) {
            let Some(current) = sequence.codon(index) else {
                continue;
            };
            ret.extend(
                self.space
                    .alternatives(index, &current)
                    .map(|codon| (index, *codon)),
            );
        }

        if let Constraint::EnforceGcContent(gc) = &self.constraints[constraint] {
            let fraction = GcContents::calculate_gc(sequence.read(span.clone())?);
            let direction: i64 = if fraction < gc.min_fraction() { 1 } else { -1 };
            let mut ranked: Vec<(i64, usize, Codon)> = ret
                .into_iter()
                .filter_map(|(index, codon)| {
                    let current = sequence.codon(index)?;
                    let gain = direction * Self::gc_change(span, index, &current, &codon);
                    (gain > 0).then_some((gain, index, codon))
                })
                .collect();
            // Stable, so ties keep position then usage order
            ranked.sort_by(|a, b| b.0.cmp(&a.0));
            ret = ranked
                .into_iter()
                .map(|(_, index, codon)| (index, codon))
                .collect();
        }
        Ok(ret)
    }

    /// Change in G+C count inside `span` from replacing codon `index`.
    fn gc_change(span: &Range<usize>, index: usize, old: &Codon, new: &Codon) -> i64 {
        let is_gc = |base: u8| matches!(base, b'G' | b'C') as i64;
        DNAsequence::codon_range(index)
            .zip(old.iter().zip(new.iter()))
            .filter(|(position, _)| span.contains(position))
            .map(|(_, (&o, &n))| is_gc(n) - is_gc(o))
            .sum()
    }

    /// Applies the substitution and keeps it if it is an improvement; reverts it otherwise.
    fn try_candidate(
        &self,
        sequence: &mut DNAsequence,
        constraint: usize,
        target: &Range<usize>,
        severity: f64,
        index: usize,
        codon: &Codon,
    ) -> Result<bool> {
        let region = DNAsequence::codon_range(index);
        let before = self.local_violations(sequence, &region);
        let previous = sequence.mutate_codon(index, codon)?;
        let after = self.local_violations(sequence, &region);

        let introduces_new = after.iter().any(|(ia, va)| {
            !before
                .iter()
                .any(|(ib, vb)| ia == ib && va.span == vb.span)
        });
        let target_after = after
            .iter()
            .find(|(i, v)| *i == constraint && v.span == *target)
            .map(|(_, v)| v.severity)
            .unwrap_or(0.0);
        let total_before: f64 = before.iter().map(|(_, v)| v.severity).sum();
        let total_after: f64 = after.iter().map(|(_, v)| v.severity).sum();

        let accept = !introduces_new
            && target_after < severity - SEVERITY_EPSILON
            && total_after < total_before - SEVERITY_EPSILON;
        if !accept {
            sequence.mutate_codon(index, &previous)?;
        }
        Ok(accept)
    }
}
