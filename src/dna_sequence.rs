use crate::{
    error::{OptimizerError, Result},
    genetic_code::{Codon, GeneticCode},
    iupac_code::IupacCode,
};
use bio::io::fasta;
use std::{fmt, fs::File, ops::Range, str::FromStr};

type DNAstring = Vec<u8>;

/// A codon-aligned nucleotide sequence over {A,C,G,T}.
///
/// The sequence performs no constraint checking of its own; the only way to
/// change it after construction is [`DNAsequence::mutate_codon`], which swaps
/// one whole codon at a time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DNAsequence {
    name: Option<String>,
    seq: DNAstring,
}

impl DNAsequence {
    pub fn from_sequence(sequence: &str) -> Result<DNAsequence> {
        Self::from_u8(sequence.as_bytes())
    }

    /// Like [`DNAsequence::from_sequence`], but also requires whole codons.
    pub fn from_coding_sequence(sequence: &str) -> Result<DNAsequence> {
        let ret = Self::from_sequence(sequence)?;
        ret.check_reading_frame()?;
        Ok(ret)
    }

    pub fn from_fasta_file(filename: &str) -> Result<Vec<DNAsequence>> {
        let file = File::open(filename)?;
        fasta::Reader::new(file)
            .records()
            .map(|record| {
                let record = record.map_err(|e| {
                    OptimizerError::InvalidSequence(format!("Bad FASTA record in '{filename}': {e}"))
                })?;
                DNAsequence::from_fasta_record(&record)
            })
            .collect()
    }

    pub fn from_fasta_record(record: &fasta::Record) -> Result<Self> {
        let mut ret = Self::from_u8(record.seq())?;
        ret.name = Some(record.id().to_string());
        Ok(ret)
    }

    fn from_u8(s: &[u8]) -> Result<Self> {
        let seq = Self::validate_dna_sequence(s)?;
        if seq.is_empty() {
            return Err(OptimizerError::InvalidSequence(
                "Empty sequence not allowed".to_string(),
            ));
        }
        Ok(Self { name: None, seq })
    }

    /// Strips whitespace, upper-cases, reads U as T and rejects anything that is not A, C, G or T.
    pub fn validate_dna_sequence(v: &[u8]) -> Result<DNAstring> {
        v.iter()
            .filter(|c| !c.is_ascii_whitespace())
            .enumerate()
            .map(|(pos, &c)| {
                if IupacCode::is_unambiguous_base(c) {
                    Ok(match c.to_ascii_uppercase() {
                        b'U' => b'T',
                        upper => upper,
                    })
                } else {
                    Err(OptimizerError::InvalidSequence(format!(
                        "Invalid character '{}' at position {pos}",
                        c as char
                    )))
                }
            })
            .collect()
    }

    pub fn check_reading_frame(&self) -> Result<()> {
        if self.len() % 3 != 0 {
            return Err(OptimizerError::InvalidSequence(format!(
                "Length {} is not a multiple of 3",
                self.len()
            )));
        }
        Ok(())
    }

    #[inline(always)]
    pub fn forward(&self) -> &[u8] {
        &self.seq
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn read(&self, range: Range<usize>) -> Result<&[u8]> {
        let Range { start, end } = range;
        self.seq
            .get(start..end)
            .ok_or(OptimizerError::RangeOutOfBounds {
                start,
                end,
                len: self.len(),
            })
    }

    /// Number of complete codons; a trailing partial codon is not counted.
    #[inline(always)]
    pub fn codon_count(&self) -> usize {
        self.seq.len() / 3
    }

    #[inline(always)]
    pub fn codon_range(index: usize) -> Range<usize> {
        index * 3..index * 3 + 3
    }

    pub fn codon(&self, index: usize) -> Option<Codon> {
        let range = Self::codon_range(index);
        let bases = self.seq.get(range)?;
        Some([bases[0], bases[1], bases[2]])
    }

    /// Replaces codon `index` with `new_codon` and returns the codon it replaced.
    pub fn mutate_codon(&mut self, index: usize, new_codon: &[u8]) -> Result<Codon> {
        let codon = Self::parse_codon(new_codon)?;
        let previous = self.codon(index).ok_or(OptimizerError::OutOfBounds {
            index,
            codons: self.codon_count(),
        })?;
        self.seq[Self::codon_range(index)].copy_from_slice(&codon);
        Ok(previous)
    }

    pub fn parse_codon(codon: &[u8]) -> Result<Codon> {
        let invalid = || OptimizerError::InvalidCodon(String::from_utf8_lossy(codon).to_string());
        if codon.len() != 3 {
            return Err(invalid());
        }
        let mut ret = [0u8; 3];
        for (target, &base) in ret.iter_mut().zip(codon) {
            *target = match base.to_ascii_uppercase() {
                b @ (b'A' | b'C' | b'G' | b'T') => b,
                _ => return Err(invalid()),
            };
        }
        Ok(ret)
    }

    /// Translation of all complete codons.
    pub fn translate(&self, genetic_code: &GeneticCode) -> String {
        self.seq
            .chunks_exact(3)
            .map(|codon| genetic_code.translate_codon(codon).unwrap_or('X'))
            .collect()
    }

    pub fn reverse_complement(&self) -> DNAstring {
        self.seq
            .iter()
            .rev()
            .map(|&c| IupacCode::letter_complement(c))
            .collect()
    }

    pub fn gc_fraction(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let gc = self
            .seq
            .iter()
            .filter(|&&c| c == b'G' || c == b'C')
            .count();
        gc as f64 / self.len() as f64
    }
}

impl fmt::Display for DNAsequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.seq))
    }
}

impl FromStr for DNAsequence {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_sequence(s)
    }
}
