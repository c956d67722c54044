//! Codon usage tables: per amino acid, the relative weight of each codon in a target organism.

use crate::{
    dna_sequence::DNAsequence,
    error::{OptimizerError, Result},
    genetic_code::{Codon, STOP},
};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{collections::BTreeMap, fs::File, io::Read, path::Path};

const BUILTIN_E_COLI_CSV: &str = include_str!("../assets/codon_usage_e_coli.csv");

const ONE_LETTER_CODES: &str = "ACDEFGHIKLMNPQRSTVWYUO";

const THREE_LETTER_CODES: [(&str, char); 22] = [
    ("ALA", 'A'),
    ("ARG", 'R'),
    ("ASN", 'N'),
    ("ASP", 'D'),
    ("CYS", 'C'),
    ("GLN", 'Q'),
    ("GLU", 'E'),
    ("GLY", 'G'),
    ("HIS", 'H'),
    ("ILE", 'I'),
    ("LEU", 'L'),
    ("LYS", 'K'),
    ("MET", 'M'),
    ("PHE", 'F'),
    ("PRO", 'P'),
    ("SER", 'S'),
    ("THR", 'T'),
    ("TRP", 'W'),
    ("TYR", 'Y'),
    ("VAL", 'V'),
    ("SEC", 'U'),
    ("PYL", 'O'),
];

/// Weights are relative within one amino acid and need not sum to 1.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodonUsageTable {
    name: String,
    table: BTreeMap<char, BTreeMap<Codon, f64>>,
}

impl CodonUsageTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            table: BTreeMap::new(),
        }
    }

    pub fn builtin_e_coli() -> Result<Self> {
        Self::from_csv_reader("e_coli", BUILTIN_E_COLI_CSV.as_bytes())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert(&mut self, amino_acid: char, codon: &[u8], weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(OptimizerError::InvalidCodonUsage(format!(
                "weight {weight} for codon {} is not a non-negative number",
                String::from_utf8_lossy(codon)
            )));
        }
        let codon = Self::normalize_codon(codon)?;
        self.table
            .entry(amino_acid)
            .or_default()
            .insert(codon, weight);
        Ok(())
    }

    fn normalize_codon(codon: &[u8]) -> Result<Codon> {
        let dna: Vec<u8> = codon
            .iter()
            .map(|c| match c.to_ascii_uppercase() {
                b'U' => b'T',
                other => other,
            })
            .collect();
        DNAsequence::parse_codon(&dna).map_err(|_| {
            OptimizerError::InvalidCodonUsage(format!(
                "bad codon '{}'",
                String::from_utf8_lossy(codon)
            ))
        })
    }

    /// Accepts one-letter codes, three-letter codes and the usual stop spellings.
    pub fn parse_amino_acid(text: &str) -> Option<char> {
        let text = text.trim();
        let upper = text.to_ascii_uppercase();
        match upper.as_str() {
            "*" | "STOP" | "END" | "TER" => return Some(STOP),
            _ => {}
        }
        if upper.len() == 1 {
            let c = upper.chars().next()?;
            return ONE_LETTER_CODES.contains(c).then_some(c);
        }
        THREE_LETTER_CODES
            .iter()
            .find(|(tla, _)| *tla == upper)
            .map(|(_, aa)| *aa)
    }

    pub fn from_csv_path(path: &str) -> Result<Self> {
        let name = Path::new(path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "custom".to_string());
        let file = File::open(path)?;
        Self::from_csv_reader(&name, file)
    }

    /// Reads `amino_acid,codon,relative_frequency` columns (in any order; extra columns are ignored).
    pub fn from_csv_reader<R: Read>(name: &str, reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        let aa_col = Self::column(&headers, &["amino_acid", "aa", "amino acid"])?;
        let codon_col = Self::column(&headers, &["codon", "triplet"])?;
        let freq_col = Self::column(
            &headers,
            &["relative_frequency", "frequency", "fraction", "weight"],
        )?;

        let mut ret = Self::new(name);
        for (line, record) in rdr.records().enumerate() {
            let record = record?;
            let field = |col: usize| record.get(col).unwrap_or_default();
            let aa = Self::parse_amino_acid(field(aa_col)).ok_or_else(|| {
                OptimizerError::InvalidCodonUsage(format!(
                    "row {}: unknown amino acid '{}'",
                    line + 1,
                    field(aa_col)
                ))
            })?;
            let weight: f64 = field(freq_col).parse().map_err(|_| {
                OptimizerError::InvalidCodonUsage(format!(
                    "row {}: bad frequency '{}'",
                    line + 1,
                    field(freq_col)
                ))
            })?;
            ret.insert(aa, field(codon_col).as_bytes(), weight)?;
        }
        if ret.table.is_empty() {
            return Err(OptimizerError::InvalidCodonUsage(format!(
                "table '{name}' has no rows"
            )));
        }
        Ok(ret)
    }

    fn column(headers: &StringRecord, names: &[&str]) -> Result<usize> {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
            .ok_or_else(|| {
                OptimizerError::InvalidCodonUsage(format!("missing column '{}'", names[0]))
            })
    }

    /// JSON form: `{"A": {"GCT": 0.9, "GCC": 0.1}, ...}`.
    pub fn from_json_text(name: &str, json_text: &str) -> Result<Self> {
        let raw: BTreeMap<String, BTreeMap<String, f64>> = serde_json::from_str(json_text)?;
        let mut ret = Self::new(name);
        for (aa_text, codons) in raw {
            let aa = Self::parse_amino_acid(&aa_text).ok_or_else(|| {
                OptimizerError::InvalidCodonUsage(format!("unknown amino acid '{aa_text}'"))
            })?;
            for (codon, weight) in codons {
                ret.insert(aa, codon.as_bytes(), weight)?;
            }
        }
        Ok(ret)
    }

    pub fn load_from_path(path: &str) -> Result<Self> {
        if path.to_ascii_lowercase().ends_with(".json") {
            let name = Path::new(path)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "custom".to_string());
            let text = std::fs::read_to_string(path)?;
            Self::from_json_text(&name, &text)
        } else {
            Self::from_csv_path(path)
        }
    }

    pub fn has_amino_acid(&self, amino_acid: char) -> bool {
        self.table.contains_key(&amino_acid)
    }

    pub fn weight(&self, amino_acid: char, codon: &Codon) -> Option<f64> {
        self.table.get(&amino_acid)?.get(codon).copied()
    }
}
