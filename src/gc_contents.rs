use std::ops::Range;

#[derive(Clone, Debug, PartialEq)]
pub struct GcRegion {
    from: usize,
    to: usize,
    gc: f64,
}

impl GcRegion {
    #[inline(always)]
    pub fn from(&self) -> usize {
        self.from
    }

    #[inline(always)]
    pub fn to(&self) -> usize {
        self.to
    }

    #[inline(always)]
    pub fn gc(&self) -> f64 {
        self.gc
    }

    #[inline(always)]
    pub fn span(&self) -> Range<usize> {
        self.from..self.to
    }
}

/// GC fractions of fixed-width windows sliding with stride 1.
#[derive(Clone, Debug, Default)]
pub struct GcContents {
    regions: Vec<GcRegion>,
}

impl GcContents {
    /// All windows of `window` bases. A sequence shorter than `window` is one window.
    pub fn new_sliding(sequence: &[u8], window: usize) -> Self {
        Self::new_overlapping(sequence, window, 0..sequence.len())
    }

    /// Only the windows that overlap `region`.
    pub fn new_overlapping(sequence: &[u8], window: usize, region: Range<usize>) -> Self {
        let mut ret = Self::default();
        if sequence.is_empty() || window == 0 || region.start >= region.end {
            return ret;
        }
        if sequence.len() <= window {
            if region.start < sequence.len() {
                ret.regions.push(GcRegion {
                    from: 0,
                    to: sequence.len(),
                    gc: Self::calculate_gc(sequence),
                });
            }
            return ret;
        }
        let first = (region.start + 1).saturating_sub(window);
        let last = (region.end - 1).min(sequence.len() - window);
        if first > last {
            return ret;
        }

        let mut gc_count = Self::count_gc(&sequence[first..first + window]);
        for from in first..=last {
            if from > first {
                gc_count -= Self::is_gc(sequence[from - 1]) as usize;
                gc_count += Self::is_gc(sequence[from + window - 1]) as usize;
            }
            ret.regions.push(GcRegion {
                from,
                to: from + window,
                gc: gc_count as f64 / window as f64,
            });
        }
        ret
    }

    #[inline(always)]
    pub fn regions(&self) -> &[GcRegion] {
        &self.regions
    }

    #[inline(always)]
    fn is_gc(base: u8) -> bool {
        matches!(base.to_ascii_uppercase(), b'G' | b'C')
    }

    #[inline(always)]
    fn count_gc(sequence: &[u8]) -> usize {
        sequence.iter().filter(|&&c| Self::is_gc(c)).count()
    }

    #[inline(always)]
    pub fn calculate_gc(sequence: &[u8]) -> f64 {
        if sequence.is_empty() {
            return 0.0;
        }
        Self::count_gc(sequence) as f64 / sequence.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gc_contents() {
        let sequence = b"AAAGGGTTTCCC";
        let gc_contents = GcContents::new_sliding(sequence, 12);
        assert_eq!(gc_contents.regions.len(), 1);
        assert_eq!(
            gc_contents.regions[0],
            GcRegion {
                from: 0,
                to: 12,
                gc: 0.5
            }
        );
    }

    #[test]
    fn test_sliding_windows() {
        let gc_contents = GcContents::new_sliding(b"AAGGCC", 4);
        let gcs: Vec<f64> = gc_contents.regions().iter().map(|r| r.gc()).collect();
        assert_eq!(gcs, vec![0.5, 0.75, 1.0]);
        assert_eq!(gc_contents.regions()[2].span(), 2..6);
    }

    #[test]
    fn test_short_sequence_is_one_window() {
        let gc_contents = GcContents::new_sliding(b"GCA", 50);
        assert_eq!(gc_contents.regions().len(), 1);
        assert_eq!(gc_contents.regions()[0].span(), 0..3);
        assert!((gc_contents.regions()[0].gc() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_overlapping_windows_only() {
        let sequence = b"AAAAAAAAAAGGGGGGGGGG";
        let gc_contents = GcContents::new_overlapping(sequence, 5, 9..10);
        let spans: Vec<_> = gc_contents.regions().iter().map(|r| r.span()).collect();
        assert_eq!(spans, vec![5..10, 6..11, 7..12, 8..13, 9..14]);
        // Rolling count agrees with a fresh count
        for region in gc_contents.regions() {
            assert_eq!(region.gc(), GcContents::calculate_gc(&sequence[region.span()]));
        }
    }
}
