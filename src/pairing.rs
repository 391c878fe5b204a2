//! Aligns photo candidates with the names found on the same page.
//!
//! The roster template often paints every headshot twice: a mask layer
//! followed by the visible photo. When a page carries at least twice as many
//! candidates as names the doubling is assumed to hold for the whole page and
//! every second candidate, starting at index 1, is used. Otherwise candidates
//! are taken in order. The decision is made per page.

/// How candidates on one page were matched to names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingStrategy {
    /// Mask/photo pairs: keep indices 1, 3, 5, ...
    Doubled,
    /// One candidate per name: keep indices 0, 1, 2, ...
    Sequential,
}

pub fn choose_strategy(candidates: usize, names: usize) -> PairingStrategy {
    if candidates >= 2 * names {
        PairingStrategy::Doubled
    } else {
        PairingStrategy::Sequential
    }
}

/// Candidate indices paired with names `0..`, in order.
///
/// The result is shorter than `names` when the page has too few candidates.
pub fn selected_indices(candidates: usize, names: usize) -> Vec<usize> {
    match choose_strategy(candidates, names) {
        PairingStrategy::Doubled => (1..candidates).step_by(2).take(names).collect(),
        PairingStrategy::Sequential => (0..candidates.min(names)).collect(),
    }
}

/// Keep only the candidates that pair with a name, index-aligned with the names.
pub fn select_photos<T>(candidates: Vec<T>, names: usize) -> Vec<T> {
    let total = candidates.len();
    let wanted = selected_indices(total, names);
    if wanted.len() < names {
        log::warn!(
            "only {} photos for {} names; the remaining names get no record",
            wanted.len(),
            names
        );
    }
    log::debug!(
        "pairing {} candidates with {} names using {:?}",
        total,
        names,
        choose_strategy(total, names)
    );
    let mut wanted = wanted.into_iter().peekable();
    candidates
        .into_iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            if wanted.peek() == Some(&index) {
                wanted.next();
                Some(candidate)
            } else {
                None
            }
        })
        .collect()
}
