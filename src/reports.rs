//! Read-only summaries of a problem's constraints and objectives.

use crate::{
    constraints::Violation,
    error::UnresolvableConstraint,
    problem::ProblemState,
};
use itertools::Itertools;
use serde::Serialize;
use std::{fmt::Write, ops::Range};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConstraintReport {
    pub label: String,
    pub violations: usize,
    /// Violation spans with overlapping and adjacent ones merged.
    pub spans: Vec<Range<usize>>,
}

impl ConstraintReport {
    pub fn new(label: String, violations: &[Violation]) -> Self {
        Self {
            label,
            violations: violations.len(),
            spans: merge_spans(violations.iter().map(|v| v.span.clone())),
        }
    }

    pub fn passed(&self) -> bool {
        self.violations == 0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObjectiveReport {
    pub label: String,
    pub score_before: f64,
    /// Score once constraints were resolved, before the optimizer ran.
    pub score_resolved: Option<f64>,
    pub score_after: f64,
    pub mean_codon_score_before: f64,
    pub mean_codon_score_after: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProblemReport {
    pub state: ProblemState,
    pub constraints: Vec<ConstraintReport>,
    pub objectives: Vec<ObjectiveReport>,
    pub unresolved: Vec<UnresolvableConstraint>,
    pub budget_exhausted: bool,
    pub cancelled: bool,
}

impl ProblemReport {
    pub fn failed_constraints(&self) -> usize {
        self.constraints.iter().filter(|c| !c.passed()).count()
    }

    pub fn constraints_text_summary(&self) -> String {
        let mut ret = String::new();
        let failed = self.failed_constraints();
        if failed == 0 {
            ret.push_str("===> SUCCESS - all constraints evaluations pass\n");
        } else {
            let _ = writeln!(ret, "===> FAILURE: {failed} constraints evaluations failed");
        }
        for constraint in &self.constraints {
            if constraint.passed() {
                let _ = writeln!(ret, "PASS {}: satisfied", constraint.label);
            } else {
                let spans = constraint
                    .spans
                    .iter()
                    .map(|span| format!("{}-{}", span.start, span.end))
                    .join(", ");
                let _ = writeln!(
                    ret,
                    "FAIL {}: {} violation(s) at {spans}",
                    constraint.label, constraint.violations
                );
            }
        }
        if self.state == ProblemState::Failed {
            for unresolved in &self.unresolved {
                let _ = writeln!(ret, "UNRESOLVED {unresolved}");
            }
        }
        ret
    }

    pub fn objectives_text_summary(&self) -> String {
        let mut ret = String::new();
        let before: f64 = self.objectives.iter().map(|o| o.score_before).sum();
        let after: f64 = self.objectives.iter().map(|o| o.score_after).sum();
        let _ = writeln!(
            ret,
            "===> TOTAL OBJECTIVES SCORE: {after:.2} (before: {before:.2})"
        );
        for objective in &self.objectives {
            let _ = write!(
                ret,
                "{}: {:.2} (before: {:.2})",
                objective.label, objective.score_after, objective.score_before
            );
            if let Some(resolved) = objective.score_resolved {
                let _ = write!(ret, ", after resolution {resolved:.2}");
            }
            let _ = writeln!(
                ret,
                ", mean per codon {:.3} (before: {:.3})",
                objective.mean_codon_score_after, objective.mean_codon_score_before
            );
        }
        if self.budget_exhausted {
            ret.push_str("Optimization budget exhausted\n");
        }
        if self.cancelled {
            ret.push_str("Cancelled before completion\n");
        }
        ret
    }
}

/// Sorts spans and merges the ones that overlap or touch.
pub fn merge_spans(spans: impl IntoIterator<Item = Range<usize>>) -> Vec<Range<usize>> {
    spans
        .into_iter()
        .sorted_by_key(|span| (span.start, span.end))
        .coalesce(|a, b| {
            if b.start <= a.end {
                Ok(a.start..a.end.max(b.end))
            } else {
                Err((a, b))
            }
        })
        .collect()
}
