//! Bit-level helpers for the FAST segment test

/// True when `mask` (one bit per circle pixel, 16 pixels) contains a run of
/// at least `min_count` set bits, wrapping around the circle.
pub fn has_contiguous_arc(mask: u16, min_count: usize) -> bool {
    if min_count == 0 || min_count > 16 {
        return false;
    }
    if mask == u16::MAX {
        return true;
    }

    // AND the mask with itself rotated 1..min_count times; a surviving bit
    // marks the start of a long enough run.
    let mut runs = mask;
    for i in 1..min_count as u32 {
        runs &= mask.rotate_right(i);
        if runs == 0 {
            return false;
        }
    }
    runs != 0
}

/// Builds the circle mask from per-pixel flags
#[cfg(test)]
fn mask_from_flags(flags: &[bool; 16]) -> u16 {
    flags
        .iter()
        .enumerate()
        .fold(0u16, |mask, (i, &set)| if set { mask | (1 << i) } else { mask })
}

/// Longest circular run, used as the reference in tests
#[cfg(test)]
fn longest_run(flags: &[bool; 16]) -> usize {
    let mut best = 0;
    let mut current = 0;
    for i in 0..32 {
        if flags[i % 16] {
            current += 1;
            best = best.max(current.min(16));
        } else {
            current = 0;
        }
    }
    best
}
