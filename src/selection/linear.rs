use crate::bitset::BitSet;

/// Scans ascending indices — MSB to LSB within each byte, in byte order —
/// and returns the first set bit. Padding indices (`>= bit_len`) never read
/// as set, so they're skipped for free.
pub fn first_set(candidate: &BitSet) -> Option<usize> {
    (0..candidate.bit_len()).find(|&i| candidate.is_set(i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_none() {
        assert_eq!(first_set(&BitSet::new(10)), None);
    }

    #[test]
    fn finds_first_ascending() {
        let mut bs = BitSet::new(10);
        bs.set(5);
        bs.set(2);
        assert_eq!(first_set(&bs), Some(2));
    }

    #[test]
    fn ignores_padding() {
        let bs = BitSet::new(3);
        assert_eq!(first_set(&bs), None);
    }
}
