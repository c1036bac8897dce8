use crate::bitset::BitSet;

/// A remote peer's advertised availability, in the on-wire MSB-first byte
/// layout: a buffer of exactly `block_count.div_ceil(8)` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerBitfield(BitSet);

impl PeerBitfield {
    /// Builds a peer bitfield for a download of `block_count` blocks.
    /// Returns `None` if `data`'s length doesn't match `⌈block_count / 8⌉`
    /// exactly — the wire-format length mismatch is rejected here rather
    /// than truncated or zero-extended.
    pub fn from_bytes(data: &[u8], block_count: usize) -> Option<Self> {
        let mut set = BitSet::new(block_count);
        set.load_from_slice(data).then_some(Self(set))
    }

    pub fn has(&self, index: usize) -> bool {
        self.0.is_set(index)
    }

    pub fn bit_len(&self) -> usize {
        self.0.bit_len()
    }

    pub(crate) fn as_bitset(&self) -> &BitSet {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        assert!(PeerBitfield::from_bytes(&[0u8], 10).is_none());
        assert!(PeerBitfield::from_bytes(&[0u8, 0u8], 10).is_some());
    }

    #[test]
    fn reads_msb_first() {
        let peer = PeerBitfield::from_bytes(&[0b1011_0000], 8).unwrap();
        assert!(peer.has(0));
        assert!(!peer.has(1));
        assert!(peer.has(2));
        assert!(peer.has(3));
        assert!(!peer.has(4));
    }
}
