use align_core::{hamming_distance, Descriptor, Match};
use rayon::prelude::*;

/// Nearest destination descriptor for every reference descriptor.
///
/// One match per reference descriptor, in reference order. Ties go to the
/// lowest destination index. An empty destination set yields no matches.
pub fn match_descriptors(reference: &[Descriptor], destination: &[Descriptor]) -> Vec<Match> {
    if destination.is_empty() {
        return Vec::new();
    }

    reference
        .par_iter()
        .enumerate()
        .map(|(reference_idx, query)| {
            let mut best_idx = 0;
            let mut best_distance = u32::MAX;
            for (idx, train) in destination.iter().enumerate() {
                let distance = hamming_distance(query, train);
                if distance < best_distance {
                    best_distance = distance;
                    best_idx = idx;
                    if distance == 0 {
                        break;
                    }
                }
            }
            Match {
                reference_idx,
                destination_idx: best_idx,
                distance: best_distance,
            }
        })
        .collect()
}
