mod availability;
mod bitset;
mod peer_bitfield;
mod selection;

pub mod rng;

pub use availability::{AvailabilityMap, BlockLayout, SparseFilterMode};
pub use peer_bitfield::PeerBitfield;
