//! Injectable randomness for the uniform-random selector (§4.3.1).
//!
//! Production code seeds from OS entropy; tests seed a fixed value so
//! selection scenarios are reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;

pub fn from_os_rng() -> StdRng {
    StdRng::from_os_rng()
}

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
