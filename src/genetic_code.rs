//! NCBI genetic code tables: codon to amino acid, and back to synonymous codons.

use crate::error::{OptimizerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const BUILTIN_GENETIC_CODES_JSON: &str = include_str!("../assets/genetic_codes.json");

/// NCBI tables list codons with bases ordered T, C, A, G.
const NCBI_BASE_ORDER: [u8; 4] = *b"TCAG";

pub type Codon = [u8; 3];

pub const STOP: char = '*';

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneticCode {
    pub id: usize,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// 64 one-letter amino acids, in NCBI TCAG codon order
    pub amino_acids: String,
    #[serde(skip)]
    synonyms: BTreeMap<char, Vec<Codon>>,
}

impl GeneticCode {
    fn prepare(&mut self) -> Result<()> {
        if self.amino_acids.len() != 64 || !self.amino_acids.is_ascii() {
            return Err(OptimizerError::InvalidGeneticCode(format!(
                "table {} needs 64 amino acid letters, got '{}'",
                self.id, self.amino_acids
            )));
        }
        self.synonyms = BTreeMap::new();
        for index in 0..64 {
            let codon = Self::codon_from_index(index);
            let aa = self.amino_acids.as_bytes()[index] as char;
            self.synonyms.entry(aa).or_default().push(codon);
        }
        Ok(())
    }

    fn base_index(base: u8) -> Option<usize> {
        NCBI_BASE_ORDER
            .iter()
            .position(|&b| b == base.to_ascii_uppercase())
    }

    /// Position of `codon` in the 64-letter table, `None` for anything but ACGT.
    pub fn codon_index(codon: &[u8]) -> Option<usize> {
        if codon.len() != 3 {
            return None;
        }
        let b1 = Self::base_index(codon[0])?;
        let b2 = Self::base_index(codon[1])?;
        let b3 = Self::base_index(codon[2])?;
        Some(b1 * 16 + b2 * 4 + b3)
    }

    pub fn codon_from_index(index: usize) -> Codon {
        [
            NCBI_BASE_ORDER[(index / 16) % 4],
            NCBI_BASE_ORDER[(index / 4) % 4],
            NCBI_BASE_ORDER[index % 4],
        ]
    }

    pub fn translate_codon(&self, codon: &[u8]) -> Option<char> {
        let index = Self::codon_index(codon)?;
        self.amino_acids.as_bytes().get(index).map(|&aa| aa as char)
    }

    /// All codons for `aa`, in NCBI table order.
    pub fn synonyms(&self, aa: char) -> &[Codon] {
        self.synonyms.get(&aa).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.trim();
        self.id.to_string() == name
            || self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

#[derive(Clone, Debug)]
pub struct GeneticCodes {
    codes: Vec<GeneticCode>,
}

impl GeneticCodes {
    fn new(json_text: &str) -> Result<Self> {
        let mut codes: Vec<GeneticCode> = serde_json::from_str(json_text)?;
        for code in codes.iter_mut() {
            code.prepare()?;
        }
        Ok(Self { codes })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(BUILTIN_GENETIC_CODES_JSON)
    }

    pub fn codes(&self) -> &[GeneticCode] {
        &self.codes
    }

    /// Looks a table up by NCBI id, name or alias, eg "11", "Bacterial" or "Standard".
    pub fn find(&self, name: &str) -> Result<&GeneticCode> {
        self.codes
            .iter()
            .find(|code| code.matches_name(name))
            .ok_or_else(|| OptimizerError::UnknownGeneticCode(name.to_string()))
    }
}
