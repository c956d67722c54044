//! Hard constraints on the sequence under optimization.
//!
//! Each constraint reports violations as spans in forward-strand coordinates.
//! [`Constraint::evaluate_window`] gives the same answer as
//! [`Constraint::evaluate`] restricted to the spans overlapping a region, but
//! only scans the bases that can contribute to such spans. The resolver and
//! the optimizer rely on that to re-check a mutation locally.

use crate::{
    dna_sequence::DNAsequence,
    error::{OptimizerError, Result},
    gc_contents::GcContents,
    genetic_code::GeneticCode,
    restriction_enzyme::RestrictionEnzyme,
    sequence_pattern::SequencePattern,
};
use serde::Serialize;
use std::ops::Range;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Violation {
    pub span: Range<usize>,
    /// How far the span is from passing; 1.0 for a pattern occurrence.
    pub severity: f64,
}

impl Violation {
    pub fn overlaps(&self, region: &Range<usize>) -> bool {
        self.span.start < region.end && region.start < self.span.end
    }
}

/// Resolution order: translation problems first (they abort), then patterns, then GC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ConstraintKind {
    EnforceTranslation,
    AvoidPattern,
    EnforceGcContent,
}

#[derive(Clone, Debug)]
pub struct AvoidPattern {
    enzyme: Option<String>,
    pattern: SequencePattern,
}

impl AvoidPattern {
    pub fn from_literal(literal: &str) -> Result<Self> {
        Ok(Self {
            enzyme: None,
            pattern: SequencePattern::new(literal)?,
        })
    }

    pub fn from_enzyme(enzyme: &RestrictionEnzyme) -> Result<Self> {
        Ok(Self {
            enzyme: Some(enzyme.name.to_owned()),
            pattern: enzyme.pattern()?,
        })
    }

    pub fn pattern(&self) -> &SequencePattern {
        &self.pattern
    }

    fn violations(&self, sequence: &[u8], region: Range<usize>) -> Vec<Violation> {
        self.pattern
            .find_overlapping(sequence, region)
            .into_iter()
            .map(|span| Violation {
                span,
                severity: 1.0,
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct EnforceTranslation {
    genetic_code: GeneticCode,
    protein: Vec<u8>,
}

impl EnforceTranslation {
    /// Pins the translation of `sequence` as the protein that must be preserved.
    pub fn new(genetic_code: &GeneticCode, sequence: &DNAsequence) -> Result<Self> {
        sequence.check_reading_frame()?;
        Ok(Self {
            genetic_code: genetic_code.to_owned(),
            protein: sequence.translate(genetic_code).into_bytes(),
        })
    }

    pub fn genetic_code(&self) -> &GeneticCode {
        &self.genetic_code
    }

    pub fn protein(&self) -> &[u8] {
        &self.protein
    }

    /// The amino acid codon `index` must keep encoding.
    pub fn amino_acid(&self, index: usize) -> Option<char> {
        self.protein.get(index).map(|&aa| aa as char)
    }

    fn violations(&self, sequence: &DNAsequence, region: Range<usize>) -> Vec<Violation> {
        if region.start >= region.end {
            return vec![];
        }
        let mut ret = vec![];
        if sequence.len() != self.protein.len() * 3 {
            ret.push(Violation {
                span: 0..sequence.len(),
                severity: 1.0,
            });
            return ret;
        }
        let first = region.start / 3;
        let last = ((region.end - 1) / 3).min(self.protein.len().saturating_sub(1));
        for index in first..=last {
            let translated = sequence
                .codon(index)
                .and_then(|codon| self.genetic_code.translate_codon(&codon));
            if translated != self.amino_acid(index) {
                ret.push(Violation {
                    span: DNAsequence::codon_range(index),
                    severity: 1.0,
                });
            }
        }
        ret
    }
}

#[derive(Clone, Debug)]
pub struct EnforceGcContent {
    min_fraction: f64,
    max_fraction: f64,
    window: usize,
}

impl EnforceGcContent {
    pub fn new(min_fraction: f64, max_fraction: f64, window: usize) -> Result<Self> {
        if !(0.0..=1.0).contains(&min_fraction)
            || !(0.0..=1.0).contains(&max_fraction)
            || min_fraction > max_fraction
        {
            return Err(OptimizerError::InvalidParameters(format!(
                "GC content bounds {min_fraction}-{max_fraction} must satisfy 0 <= min <= max <= 1"
            )));
        }
        if window == 0 {
            return Err(OptimizerError::InvalidParameters(
                "GC content window must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            min_fraction,
            max_fraction,
            window,
        })
    }

    pub fn min_fraction(&self) -> f64 {
        self.min_fraction
    }

    pub fn max_fraction(&self) -> f64 {
        self.max_fraction
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Distance of `gc` outside [min, max]; zero when inside.
    pub fn deviation(&self, gc: f64) -> f64 {
        if gc < self.min_fraction {
            self.min_fraction - gc
        } else if gc > self.max_fraction {
            gc - self.max_fraction
        } else {
            0.0
        }
    }

    fn violations(&self, sequence: &[u8], region: Range<usize>) -> Vec<Violation> {
        GcContents::new_overlapping(sequence, self.window, region)
            .regions()
            .iter()
            .filter_map(|window| {
                let deviation = self.deviation(window.gc());
                (deviation > 0.0).then(|| Violation {
                    span: window.span(),
                    severity: deviation,
                })
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
pub enum Constraint {
    AvoidPattern(AvoidPattern),
    EnforceTranslation(EnforceTranslation),
    EnforceGcContent(EnforceGcContent),
}

impl Constraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::AvoidPattern(_) => ConstraintKind::AvoidPattern,
            Constraint::EnforceTranslation(_) => ConstraintKind::EnforceTranslation,
            Constraint::EnforceGcContent(_) => ConstraintKind::EnforceGcContent,
        }
    }

    pub fn evaluate(&self, sequence: &DNAsequence) -> Vec<Violation> {
        self.evaluate_window(sequence, 0..sequence.len())
    }

    /// Violations whose span overlaps `region`.
    pub fn evaluate_window(&self, sequence: &DNAsequence, region: Range<usize>) -> Vec<Violation> {
        match self {
            Constraint::AvoidPattern(c) => c.violations(sequence.forward(), region),
            Constraint::EnforceTranslation(c) => c.violations(sequence, region),
            Constraint::EnforceGcContent(c) => c.violations(sequence.forward(), region),
        }
    }

    /// How far beyond a changed base this constraint can see.
    pub fn reach(&self) -> usize {
        match self {
            Constraint::AvoidPattern(c) => c.pattern.len(),
            Constraint::EnforceTranslation(_) => 3,
            Constraint::EnforceGcContent(c) => c.window,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Constraint::AvoidPattern(c) => match &c.enzyme {
                Some(enzyme) => format!("AvoidPattern[{enzyme}]({})", c.pattern.literal()),
                None => format!("AvoidPattern({})", c.pattern.literal()),
            },
            Constraint::EnforceTranslation(c) => {
                format!("EnforceTranslation[{}]", c.genetic_code.name)
            }
            Constraint::EnforceGcContent(c) => format!(
                "EnforceGCContent[{:.2}-{:.2}, window {}]",
                c.min_fraction, c.max_fraction, c.window
            ),
        }
    }

    pub fn as_translation(&self) -> Option<&EnforceTranslation> {
        match self {
            Constraint::EnforceTranslation(c) => Some(c),
            _ => None,
        }
    }
}
