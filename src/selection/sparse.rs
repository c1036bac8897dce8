/// Finds the widest maximal run of indices in `[0, block_count)` for which
/// `is_clear` holds, and returns its midpoint — or `0` if the widest run
/// starts at the very beginning (beginning-of-file bias). `None` if no
/// index satisfies `is_clear`.
pub fn widest_run_midpoint(block_count: usize, is_clear: impl Fn(usize) -> bool) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    let mut cursor = 0;
    while cursor < block_count {
        if !is_clear(cursor) {
            cursor += 1;
            continue;
        }
        let start = cursor;
        let mut end = start;
        while end < block_count && is_clear(end) {
            end += 1;
        }
        if best.is_none_or(|(s, e)| end - start > e - s) {
            best = Some((start, end));
        }
        cursor = end;
    }
    let (start, end) = best?;
    if start == 0 {
        Some(0)
    } else {
        Some(start + (end - start) / 2)
    }
}
