use crate::{
    error::{OptimizerError, Result},
    iupac_code::IupacCode,
};
use std::ops::Range;

/// A recognition pattern in IUPAC letters, matched on both strands.
#[derive(Clone, Debug, PartialEq)]
pub struct SequencePattern {
    literal: String,
    forward: Vec<IupacCode>,
    reverse: Vec<IupacCode>,
}

impl SequencePattern {
    pub fn new(literal: &str) -> Result<Self> {
        let literal = literal.trim().to_ascii_uppercase();
        if literal.is_empty() || !literal.bytes().all(IupacCode::is_valid_letter) {
            return Err(OptimizerError::InvalidPattern(literal));
        }
        let forward: Vec<IupacCode> = literal.bytes().map(IupacCode::from_letter).collect();
        let reverse = forward.iter().rev().map(|code| code.complement()).collect();
        Ok(Self {
            literal,
            forward,
            reverse,
        })
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn is_palindromic(&self) -> bool {
        self.forward == self.reverse
    }

    pub fn reverse_complement(&self) -> String {
        self.reverse
            .iter()
            .map(|code| code.to_letter() as char)
            .collect()
    }

    #[inline(always)]
    fn matches_at(codes: &[IupacCode], window: &[u8]) -> bool {
        codes
            .iter()
            .zip(window)
            .all(|(code, &base)| code.matches(base))
    }

    /// Forward-strand spans of every match on either strand. Overlapping
    /// matches all count; a site matching on both strands is reported once.
    pub fn find_all(&self, sequence: &[u8]) -> Vec<Range<usize>> {
        self.find_overlapping(sequence, 0..sequence.len())
    }

    /// Matches whose span overlaps `region`; only the bases that can take part in such a match are scanned.
    pub fn find_overlapping(&self, sequence: &[u8], region: Range<usize>) -> Vec<Range<usize>> {
        let len = self.len();
        if len == 0 || sequence.len() < len || region.start >= region.end {
            return vec![];
        }
        let first = (region.start + 1).saturating_sub(len);
        let last = (region.end - 1).min(sequence.len() - len);
        if first > last {
            return vec![];
        }
        (first..=last)
            .filter(|&start| {
                let window = &sequence[start..start + len];
                Self::matches_at(&self.forward, window) || Self::matches_at(&self.reverse, window)
            })
            .map(|start| start..start + len)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_and_reverse_matches() {
        let bsai = SequencePattern::new("GGTCTC").unwrap();
        assert!(!bsai.is_palindromic());
        assert_eq!(bsai.reverse_complement(), "GAGACC");
        let seq = b"AAGGTCTCAAAAGAGACCAA";
        assert_eq!(bsai.find_all(seq), vec![2..8, 12..18]);
    }

    #[test]
    fn test_palindrome_reported_once() {
        let ecori = SequencePattern::new("gaattc").unwrap();
        assert!(ecori.is_palindromic());
        assert_eq!(ecori.find_all(b"GAATTCGAATTC"), vec![0..6, 6..12]);
    }

    #[test]
    fn test_overlapping_matches() {
        let pattern = SequencePattern::new("AA").unwrap();
        assert_eq!(pattern.find_all(b"AAAA"), vec![0..2, 1..3, 2..4]);
    }

    #[test]
    fn test_iupac_pattern() {
        let bgli = SequencePattern::new("GCCNNNNNGGC").unwrap();
        assert!(bgli.is_palindromic());
        assert_eq!(bgli.find_all(b"TTGCCATATAGGCTT"), vec![2..13]);
    }

    #[test]
    fn test_find_overlapping_region() {
        let bsai = SequencePattern::new("GGTCTC").unwrap();
        let seq = b"AAGGTCTCAAAAGAGACCAA";
        assert_eq!(bsai.find_overlapping(seq, 7..8), vec![2..8]);
        assert_eq!(bsai.find_overlapping(seq, 8..12), Vec::<Range<usize>>::new());
        assert_eq!(bsai.find_overlapping(seq, 11..13), vec![12..18]);
        assert_eq!(bsai.find_overlapping(seq, 0..0), Vec::<Range<usize>>::new());
        assert_eq!(bsai.find_overlapping(b"GGT", 0..3), Vec::<Range<usize>>::new());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(SequencePattern::new("GG-TC").is_err());
        assert!(SequencePattern::new("").is_err());
    }
}
