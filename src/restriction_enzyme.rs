use crate::{dna_sequence::DNAsequence, error::Result, sequence_pattern::SequencePattern};
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RestrictionEnzyme {
    pub name: String,
    pub sequence: String,
    pub note: Option<String>,
    #[serde(skip_serializing, default)]
    is_palindromic: bool,
}

impl RestrictionEnzyme {
    pub fn new(name: &str, sequence: &str) -> Result<Self> {
        let mut ret = Self {
            name: name.to_string(),
            sequence: sequence.to_ascii_uppercase(),
            note: None,
            is_palindromic: false,
        };
        ret.check_palindromic()?;
        Ok(ret)
    }

    pub fn check_palindromic(&mut self) -> Result<()> {
        self.is_palindromic = self.pattern()?.is_palindromic();
        Ok(())
    }

    pub fn is_palindromic(&self) -> bool {
        self.is_palindromic
    }

    pub fn pattern(&self) -> Result<SequencePattern> {
        SequencePattern::new(&self.sequence)
    }

    /// Case-insensitive; `BsaI_site` and `BsaI` name the same enzyme.
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.trim();
        let name = name
            .strip_suffix("_site")
            .or_else(|| name.strip_suffix("_SITE"))
            .unwrap_or(name);
        self.name.eq_ignore_ascii_case(name)
    }

    /// Recognition sites on either strand, by forward-strand span.
    pub fn find_sites(&self, seq: &DNAsequence) -> Result<Vec<Range<usize>>> {
        Ok(self.pattern()?.find_all(seq.forward()))
    }
}
