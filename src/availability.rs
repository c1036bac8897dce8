use anyhow::{ensure, Result};
use tracing::{debug, trace, warn};

use crate::bitset::BitSet;
use crate::peer_bitfield::PeerBitfield;
use crate::selection::{linear, random, sparse};

/// Immutable geometry of a download: how many bytes, split into how many
/// fixed-size blocks, with the last one possibly shorter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    block_length: u64,
    total_length: u64,
    block_count: usize,
    last_block_length: u64,
}

impl BlockLayout {
    pub fn new(block_length: u64, total_length: u64) -> Result<Self> {
        ensure!(block_length > 0, "block_length must be greater than 0");
        ensure!(total_length > 0, "total_length must be greater than 0");
        let block_count = total_length.div_ceil(block_length) as usize;
        let last_block_length = total_length - (block_count as u64 - 1) * block_length;
        Ok(Self {
            block_length,
            total_length,
            block_count,
            last_block_length,
        })
    }

    pub fn block_length(&self) -> u64 {
        self.block_length
    }

    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }

    pub fn last_block_length(&self) -> u64 {
        self.last_block_length
    }
}

/// Whether `sparse_missing_unused_index` restricts itself to the active
/// filter. Upstream ignores the filter unconditionally; `Respect` is an
/// explicit opt-in for callers who want the arguably-more-correct behavior
/// instead of a silent divergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SparseFilterMode {
    #[default]
    Ignore,
    Respect,
}

/// Tracks, for a single download, which blocks are locally present (`have`),
/// which are reserved by outstanding requests (`in_use`), and an optional
/// filter restricting interest to a subset of blocks. Answers "which block
/// should I request next" given a remote peer's advertised availability.
#[derive(Debug, Clone)]
pub struct AvailabilityMap {
    layout: BlockLayout,
    have: BitSet,
    in_use: BitSet,
    filter: Option<BitSet>,
    filter_enabled: bool,
    sparse_filter_mode: SparseFilterMode,
}

impl AvailabilityMap {
    pub fn new(block_length: u64, total_length: u64) -> Result<Self> {
        let layout = BlockLayout::new(block_length, total_length)?;
        Ok(Self {
            have: BitSet::new(layout.block_count()),
            in_use: BitSet::new(layout.block_count()),
            filter: None,
            filter_enabled: false,
            layout,
            sparse_filter_mode: SparseFilterMode::default(),
        })
    }

    pub fn with_sparse_filter_mode(mut self, mode: SparseFilterMode) -> Self {
        self.sparse_filter_mode = mode;
        self
    }

    // --- geometry accessors ---

    pub fn block_length(&self) -> u64 {
        self.layout.block_length()
    }

    pub fn total_length(&self) -> u64 {
        self.layout.total_length()
    }

    pub fn block_count(&self) -> usize {
        self.layout.block_count()
    }

    pub fn last_block_length(&self) -> u64 {
        self.layout.last_block_length()
    }

    // --- have / in_use mutators and queries ---

    pub fn is_have(&self, i: usize) -> bool {
        self.have.is_set(i)
    }

    pub fn set_have(&mut self, i: usize) -> bool {
        self.have.set(i)
    }

    pub fn unset_have(&mut self, i: usize) -> bool {
        self.have.unset(i)
    }

    pub fn is_in_use(&self, i: usize) -> bool {
        self.in_use.is_set(i)
    }

    pub fn set_in_use(&mut self, i: usize) -> bool {
        self.in_use.set(i)
    }

    pub fn unset_in_use(&mut self, i: usize) -> bool {
        self.in_use.unset(i)
    }

    pub fn set_all_have(&mut self) {
        self.have.set_all();
    }

    pub fn clear_all_have(&mut self) {
        self.have.clear_all();
    }

    pub fn clear_all_in_use(&mut self) {
        self.in_use.clear_all();
    }

    /// Replaces `have` with `buffer` when the length matches exactly, and
    /// clears `in_use`. A length mismatch is a no-op, returning `false`.
    pub fn load_have(&mut self, buffer: &[u8]) -> bool {
        if !self.have.load_from_slice(buffer) {
            warn!(
                expected = self.have.byte_len(),
                got = buffer.len(),
                "load_have: buffer length mismatch, ignoring"
            );
            return false;
        }
        self.in_use.clear_all();
        true
    }

    // --- filter ---

    /// Marks every block overlapping the byte range `[offset, offset+length)`
    /// as of-interest, allocating the filter vector on first use.
    pub fn add_filter(&mut self, offset: u64, length: u64) {
        if length == 0 {
            return;
        }
        let block_length = self.layout.block_length();
        let block_count = self.layout.block_count();
        let filter = self
            .filter
            .get_or_insert_with(|| BitSet::new(block_count));
        let start_block = (offset / block_length) as usize;
        let end_block = (((offset + length - 1) / block_length) as usize).min(block_count - 1);
        for block in start_block..=end_block {
            filter.set(block);
        }
        debug!(start_block, end_block, "add_filter");
    }

    pub fn enable_filter(&mut self) {
        self.filter_enabled = true;
    }

    pub fn disable_filter(&mut self) {
        self.filter_enabled = false;
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    pub fn filter_enabled(&self) -> bool {
        self.filter_enabled
    }

    // --- counting / length accounting ---

    pub fn count_blocks(&self) -> usize {
        if self.filter_enabled {
            self.filter.as_ref().map_or(0, |f| f.popcount())
        } else {
            self.layout.block_count()
        }
    }

    pub fn count_missing_blocks(&self) -> usize {
        if self.filter_enabled {
            match &self.filter {
                Some(filter) => filter.popcount() - filter.and(&self.have).popcount(),
                None => 0,
            }
        } else {
            self.layout.block_count() - self.have.popcount()
        }
    }

    pub fn filtered_total_length(&self) -> u64 {
        match &self.filter {
            Some(filter) => self.length_of_set(filter),
            None => 0,
        }
    }

    pub fn completed_length(&self) -> u64 {
        if self.filter_enabled {
            match &self.filter {
                Some(filter) => self.length_of_set(&self.have.and(filter)),
                None => 0,
            }
        } else {
            self.length_of_set(&self.have)
        }
    }

    fn length_of_set(&self, set: &BitSet) -> u64 {
        let k = set.popcount() as u64;
        if k == 0 {
            return 0;
        }
        let last_index = self.layout.block_count() - 1;
        if set.is_set(last_index) {
            (k - 1) * self.layout.block_length() + self.layout.last_block_length()
        } else {
            k * self.layout.block_length()
        }
    }

    pub fn is_all_set(&self) -> bool {
        if self.filter_enabled {
            match &self.filter {
                Some(filter) => &self.have.and(filter) == filter,
                None => true,
            }
        } else {
            self.have.popcount() == self.layout.block_count()
        }
    }

    // --- set-algebra / selection ---

    /// Builds the candidate set for a selection query: `¬have`, optionally
    /// intersected with `peer`, optionally with `¬in_use`, and finally with
    /// the active filter. Returns `None` on a peer length mismatch, without
    /// touching any state.
    fn candidate_set(&self, peer: Option<&PeerBitfield>, exclude_in_use: bool) -> Option<BitSet> {
        let mut candidate = self.have.complement();
        if let Some(peer) = peer {
            if peer.bit_len() != self.layout.block_count() {
                trace!("candidate_set: peer length mismatch");
                return None;
            }
            candidate = candidate.and(peer.as_bitset());
        }
        if exclude_in_use {
            candidate = candidate.and(&self.in_use.complement());
        }
        if self.filter_enabled {
            candidate = match &self.filter {
                Some(filter) => candidate.and(filter),
                None => BitSet::new(self.layout.block_count()),
            };
        }
        Some(candidate)
    }

    pub fn has_missing(&self, peer: &PeerBitfield) -> bool {
        self.candidate_set(Some(peer), false)
            .map(|c| c.popcount() > 0)
            .unwrap_or(false)
    }

    pub fn missing_index(
        &self,
        peer: Option<&PeerBitfield>,
        rng: &mut impl rand::Rng,
    ) -> Option<usize> {
        let candidate = self.candidate_set(peer, false)?;
        random::pick(&candidate, rng)
    }

    pub fn missing_unused_index(
        &self,
        peer: Option<&PeerBitfield>,
        rng: &mut impl rand::Rng,
    ) -> Option<usize> {
        let candidate = self.candidate_set(peer, true)?;
        random::pick(&candidate, rng)
    }

    pub fn first_missing_unused_index(&self, peer: Option<&PeerBitfield>) -> Option<usize> {
        let candidate = self.candidate_set(peer, true)?;
        linear::first_set(&candidate)
    }

    pub fn sparse_missing_unused_index(&self) -> Option<usize> {
        let block_count = self.layout.block_count();
        let respect_filter = self.sparse_filter_mode == SparseFilterMode::Respect;
        let filter = self.filter.as_ref();
        let filter_enabled = self.filter_enabled;
        sparse::widest_run_midpoint(block_count, |i| {
            !self.have.is_set(i)
                && !self.in_use.is_set(i)
                && (!respect_filter
                    || !filter_enabled
                    || filter.is_some_and(|f| f.is_set(i)))
        })
    }

    pub fn all_missing_indexes(&self, peer: Option<&PeerBitfield>) -> Vec<usize> {
        match self.candidate_set(peer, false) {
            Some(candidate) => candidate.iter_set().collect(),
            None => Vec::new(),
        }
    }
}
