const DNA_BITMASK_A: u8 = 1;
const DNA_BITMASK_C: u8 = 2;
const DNA_BITMASK_G: u8 = 4;
const DNA_BITMASK_T: u8 = 8;
const DNA_BITMASK_N: u8 = DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T;

/// A bitmasked IUPAC code for DNA bases, eg DNA_BITMASK_A|DNA_BITMASK_C
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct IupacCode(u8);

impl IupacCode {
    #[inline(always)]
    pub fn from_letter(letter: u8) -> Self {
        match letter.to_ascii_uppercase() {
            b'A' => Self(DNA_BITMASK_A),
            b'C' => Self(DNA_BITMASK_C),
            b'G' => Self(DNA_BITMASK_G),
            b'T' | b'U' => Self(DNA_BITMASK_T),
            b'W' => Self(DNA_BITMASK_A | DNA_BITMASK_T),
            b'S' => Self(DNA_BITMASK_C | DNA_BITMASK_G),
            b'M' => Self(DNA_BITMASK_A | DNA_BITMASK_C),
            b'K' => Self(DNA_BITMASK_G | DNA_BITMASK_T),
            b'R' => Self(DNA_BITMASK_A | DNA_BITMASK_G),
            b'Y' => Self(DNA_BITMASK_C | DNA_BITMASK_T),
            b'B' => Self(DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T),
            b'D' => Self(DNA_BITMASK_A | DNA_BITMASK_G | DNA_BITMASK_T),
            b'H' => Self(DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_T),
            b'V' => Self(DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G),
            b'N' => Self(DNA_BITMASK_N),
            _ => Self(0),
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub fn subset(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// True if the concrete base `letter` is one of the bases this code stands for.
    #[inline(always)]
    pub fn matches(self, letter: u8) -> bool {
        !self.subset(Self::from_letter(letter)).is_empty()
    }

    /// Swaps A<->T and C<->G within the bitmask.
    #[inline(always)]
    pub fn complement(self) -> Self {
        let mut ret = 0;
        if self.0 & DNA_BITMASK_A != 0 {
            ret |= DNA_BITMASK_T;
        }
        if self.0 & DNA_BITMASK_C != 0 {
            ret |= DNA_BITMASK_G;
        }
        if self.0 & DNA_BITMASK_G != 0 {
            ret |= DNA_BITMASK_C;
        }
        if self.0 & DNA_BITMASK_T != 0 {
            ret |= DNA_BITMASK_A;
        }
        Self(ret)
    }

    /// Back to the canonical upper-case IUPAC letter; `b'-'` for the empty code.
    pub fn to_letter(self) -> u8 {
        match self.0 {
            DNA_BITMASK_A => b'A',
            DNA_BITMASK_C => b'C',
            DNA_BITMASK_G => b'G',
            DNA_BITMASK_T => b'T',
            x if x == DNA_BITMASK_A | DNA_BITMASK_T => b'W',
            x if x == DNA_BITMASK_C | DNA_BITMASK_G => b'S',
            x if x == DNA_BITMASK_A | DNA_BITMASK_C => b'M',
            x if x == DNA_BITMASK_G | DNA_BITMASK_T => b'K',
            x if x == DNA_BITMASK_A | DNA_BITMASK_G => b'R',
            x if x == DNA_BITMASK_C | DNA_BITMASK_T => b'Y',
            x if x == DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T => b'B',
            x if x == DNA_BITMASK_A | DNA_BITMASK_G | DNA_BITMASK_T => b'D',
            x if x == DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_T => b'H',
            x if x == DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G => b'V',
            DNA_BITMASK_N => b'N',
            _ => b'-',
        }
    }

    #[inline(always)]
    pub fn is_valid_letter(letter: u8) -> bool {
        !Self::from_letter(letter).is_empty()
    }

    /// Only the four unambiguous DNA bases (and U, read as T).
    #[inline(always)]
    pub fn is_unambiguous_base(letter: u8) -> bool {
        matches!(
            letter.to_ascii_uppercase(),
            b'A' | b'C' | b'G' | b'T' | b'U'
        )
    }

    #[inline(always)]
    pub fn letter_complement(letter: u8) -> u8 {
        match letter.to_ascii_uppercase() {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            b'T' => b'A',
            b'U' => b'A',
            _ => b'N',
        }
    }
}
