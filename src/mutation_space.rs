use crate::{
    codon_usage::CodonUsageTable,
    dna_sequence::DNAsequence,
    genetic_code::{Codon, GeneticCode},
};
use std::ops::Range;

/// The legal codon choices at every codon position.
///
/// A position may only take codons that encode the amino acid the original
/// sequence encodes there, so any mutation drawn from here preserves the
/// translation. Choices are ordered by descending codon usage weight, ties
/// broken alphabetically.
#[derive(Clone, Debug, Default)]
pub struct MutationSpace {
    choices: Vec<Vec<Codon>>,
    amino_acids: Vec<char>,
}

impl MutationSpace {
    pub fn new(
        sequence: &DNAsequence,
        genetic_code: &GeneticCode,
        codon_usage: &CodonUsageTable,
    ) -> Self {
        let mut ret = Self::default();
        for index in 0..sequence.codon_count() {
            let Some(codon) = sequence.codon(index) else {
                break;
            };
            let aa = genetic_code.translate_codon(&codon).unwrap_or('X');
            let mut choices = genetic_code.synonyms(aa).to_vec();
            if choices.is_empty() {
                choices.push(codon);
            }
            choices.sort_by(|a, b| {
                let wa = codon_usage.weight(aa, a).unwrap_or(0.0);
                let wb = codon_usage.weight(aa, b).unwrap_or(0.0);
                wb.total_cmp(&wa).then_with(|| a.cmp(b))
            });
            ret.choices.push(choices);
            ret.amino_acids.push(aa);
        }
        ret
    }

    /// Number of mutable codon positions.
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn amino_acid(&self, index: usize) -> Option<char> {
        self.amino_acids.get(index).copied()
    }

    pub fn choices(&self, index: usize) -> &[Codon] {
        self.choices.get(index).map(|c| c.as_slice()).unwrap_or(&[])
    }

    /// Every legal codon at `index` other than `current`.
    pub fn alternatives<'a>(
        &'a self,
        index: usize,
        current: &'a Codon,
    ) -> impl Iterator<Item = &'a Codon> + 'a {
        self.choices(index).iter().filter(move |c| *c != current)
    }

    /// The proposer's check: would `codon` keep the amino acid at `index`?
    pub fn is_legal(&self, index: usize, codon: &Codon) -> bool {
        self.choices(index).contains(codon)
    }

    /// Codon positions touched by a span of bases.
    pub fn codons_overlapping(&self, span: &Range<usize>) -> Range<usize> {
        if span.start >= span.end || self.is_empty() {
            return 0..0;
        }
        let first = span.start / 3;
        let last = ((span.end - 1) / 3).min(self.len() - 1);
        if first > last {
            return 0..0;
        }
        first..last + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetic_code::GeneticCodes;

    fn space(sequence: &str, usage: &CodonUsageTable) -> MutationSpace {
        let codes = GeneticCodes::builtin().unwrap();
        let dna = DNAsequence::from_sequence(sequence).unwrap();
        MutationSpace::new(&dna, codes.find("Bacterial").unwrap(), usage)
    }

    #[test]
    fn test_choices_sorted_by_usage() {
        let mut usage = CodonUsageTable::new("test");
        usage.insert('A', b"GCT", 0.9).unwrap();
        usage.insert('A', b"GCC", 0.1).unwrap();
        let space = space("GCCATG", &usage);
        assert_eq!(space.len(), 2);
        // Codons missing from the table come last, alphabetically
        assert_eq!(space.choices(0), &[*b"GCT", *b"GCC", *b"GCA", *b"GCG"]);
        assert_eq!(space.choices(1), &[*b"ATG"]);
        assert_eq!(space.amino_acid(1), Some('M'));
    }

    #[test]
    fn test_alternatives_and_legality() {
        let usage = CodonUsageTable::builtin_e_coli().unwrap();
        let space = space("TGGAAA", &usage);
        assert_eq!(space.alternatives(0, b"TGG").count(), 0);
        let lysine: Vec<_> = space.alternatives(1, b"AAA").collect();
        assert_eq!(lysine, vec![b"AAG"]);
        assert!(space.is_legal(1, b"AAG"));
        assert!(!space.is_legal(1, b"AAC"));
        assert!(!space.is_legal(7, b"AAA"));
    }

    #[test]
    fn test_trailing_partial_codon_is_frozen() {
        let usage = CodonUsageTable::builtin_e_coli().unwrap();
        let space = space("GCCGCCGC", &usage);
        assert_eq!(space.len(), 2);
        assert_eq!(space.codons_overlapping(&(4..8)), 1..2);
    }

    #[test]
    fn test_codons_overlapping() {
        let usage = CodonUsageTable::builtin_e_coli().unwrap();
        let space = space("GCCGCCGCCGCC", &usage);
        assert_eq!(space.codons_overlapping(&(2..7)), 0..3);
        assert_eq!(space.codons_overlapping(&(3..6)), 1..2);
        assert_eq!(space.codons_overlapping(&(5..5)), 0..0);
        assert_eq!(space.codons_overlapping(&(20..30)), 0..0);
    }
}
