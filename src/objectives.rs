use crate::{
    codon_usage::CodonUsageTable,
    dna_sequence::DNAsequence,
    genetic_code::{Codon, GeneticCode},
};

/// Probability assumed for a codon missing from the usage table or weighted zero.
pub const MIN_CODON_FREQUENCY: f64 = 1e-3;

/// Log-likelihood of the codons under a target organism's usage table.
///
/// Each codon scores `ln(f / sum of f over its synonyms)`, so the best codon
/// of every amino acid gets the highest score and the total is never positive.
/// Amino acids the table does not cover score zero everywhere.
#[derive(Clone, Debug)]
pub struct CodonOptimize {
    table_name: String,
    scores: [f64; 64],
}

impl CodonOptimize {
    pub fn new(codon_usage: &CodonUsageTable, genetic_code: &GeneticCode) -> Self {
        let mut scores = [0.0; 64];
        for (index, score) in scores.iter_mut().enumerate() {
            let codon = GeneticCode::codon_from_index(index);
            let Some(aa) = genetic_code.translate_codon(&codon) else {
                continue;
            };
            if !codon_usage.has_amino_acid(aa) {
                continue;
            }
            let total: f64 = genetic_code
                .synonyms(aa)
                .iter()
                .filter_map(|synonym| codon_usage.weight(aa, synonym))
                .sum();
            let frequency = match codon_usage.weight(aa, &codon) {
                Some(weight) if weight > 0.0 && total > 0.0 => weight / total,
                _ => MIN_CODON_FREQUENCY,
            };
            *score = frequency.ln();
        }
        Self {
            table_name: codon_usage.name().to_string(),
            scores,
        }
    }

    #[inline(always)]
    pub fn codon_score(&self, codon: &Codon) -> f64 {
        GeneticCode::codon_index(codon)
            .map(|index| self.scores[index])
            .unwrap_or(0.0)
    }

    pub fn score(&self, sequence: &DNAsequence) -> f64 {
        (0..sequence.codon_count())
            .filter_map(|index| sequence.codon(index))
            .map(|codon| self.codon_score(&codon))
            .sum()
    }
}

#[derive(Clone, Debug)]
pub enum Objective {
    CodonOptimize(CodonOptimize),
}

impl Objective {
    pub fn score(&self, sequence: &DNAsequence) -> f64 {
        match self {
            Objective::CodonOptimize(o) => o.score(sequence),
        }
    }

    pub fn codon_score(&self, codon: &Codon) -> f64 {
        match self {
            Objective::CodonOptimize(o) => o.codon_score(codon),
        }
    }

    /// Score change from replacing `old` with `new` at a single position.
    pub fn codon_delta(&self, old: &Codon, new: &Codon) -> f64 {
        self.codon_score(new) - self.codon_score(old)
    }

    pub fn label(&self) -> String {
        match self {
            Objective::CodonOptimize(o) => format!("CodonOptimize[{}]", o.table_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetic_code::GeneticCodes;

    fn alanine_objective() -> Objective {
        let codes = GeneticCodes::builtin().unwrap();
        let mut usage = CodonUsageTable::new("alanine");
        usage.insert('A', b"GCT", 0.9).unwrap();
        usage.insert('A', b"GCC", 0.1).unwrap();
        Objective::CodonOptimize(CodonOptimize::new(&usage, codes.find("Standard").unwrap()))
    }

    #[test]
    fn test_codon_scores() {
        let objective = alanine_objective();
        assert!((objective.codon_score(b"GCT") - 0.9f64.ln()).abs() < 1e-12);
        assert!((objective.codon_score(b"GCC") - 0.1f64.ln()).abs() < 1e-12);
        // Synonym missing from the table
        assert!((objective.codon_score(b"GCA") - MIN_CODON_FREQUENCY.ln()).abs() < 1e-12);
        // Amino acid missing from the table
        assert_eq!(objective.codon_score(b"ATG"), 0.0);
        assert!(objective.codon_delta(b"GCC", b"GCT") > 0.0);
        assert_eq!(objective.label(), "CodonOptimize[alanine]");
    }

    #[test]
    fn test_sequence_score() {
        let objective = alanine_objective();
        let before = DNAsequence::from_sequence("GCCGCCGCC").unwrap();
        let after = DNAsequence::from_sequence("GCTGCTGCT").unwrap();
        assert!((objective.score(&before) - 3.0 * 0.1f64.ln()).abs() < 1e-9);
        assert!(objective.score(&after) > objective.score(&before));
        // Trailing partial codon is not scored
        let partial = DNAsequence::from_sequence("GCTGC").unwrap();
        assert!((objective.score(&partial) - 0.9f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_builtin_table_prefers_common_codons() {
        let codes = GeneticCodes::builtin().unwrap();
        let usage = CodonUsageTable::builtin_e_coli().unwrap();
        let objective = CodonOptimize::new(&usage, codes.find("Bacterial").unwrap());
        // CTG is the dominant leucine codon in E. coli
        assert!(objective.codon_score(b"CTG") > objective.codon_score(b"CTA"));
        assert!(objective.codon_score(b"CTG") <= 0.0);
    }
}
