use availability_map::{rng, AvailabilityMap, PeerBitfield};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // A 10 KiB payload cut into 1 KiB blocks, ten full blocks plus a short tail.
    let mut map = AvailabilityMap::new(1024, 1024 * 10 + 100)?;
    tracing::info!(blocks = map.block_count(), "opened download");

    // Restrict interest to the first 3 blocks, as a metalink-style file filter would.
    map.add_filter(0, 1024 * 3);
    map.enable_filter();
    tracing::info!(
        interested = map.count_blocks(),
        length = map.filtered_total_length(),
        "filter active"
    );

    // A peer advertises it has the first four blocks.
    let mut peer_bytes = vec![0u8; map.block_count().div_ceil(8)];
    for block in 0..4 {
        peer_bytes[block / 8] |= 1 << (7 - block % 8);
    }
    let peer = PeerBitfield::from_bytes(&peer_bytes, map.block_count())
        .expect("buffer length matches block_count");

    let mut rng = rng::from_os_rng();
    while let Some(block) = map.missing_unused_index(Some(&peer), &mut rng) {
        tracing::info!(block, "requesting");
        map.set_in_use(block);
        // Pretend the block arrives and verifies immediately.
        map.set_have(block);
        map.unset_in_use(block);
    }

    tracing::info!(
        completed = map.completed_length(),
        total = map.filtered_total_length(),
        done = map.is_all_set(),
        "filtered region finished"
    );
    Ok(())
}
