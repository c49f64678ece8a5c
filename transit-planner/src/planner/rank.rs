//! Ranking and deduplication of itinerary options.

use std::collections::HashSet;

use crate::domain::{ItineraryOption, Rankable, TransferOption};

/// Sort options fastest-first and keep at most `max_results`.
///
/// The sort is stable, so options with equal estimates keep the order in
/// which the search produced them.
pub fn rank_options<T: Rankable>(mut options: Vec<T>, max_results: usize) -> Vec<T> {
    options.sort_by(|a, b| a.estimated_minutes().total_cmp(&b.estimated_minutes()));
    options.truncate(max_results);
    options
}

/// Drop transfer options that describe the same itinerary as an earlier one.
///
/// Two options are the same itinerary when they share first line, second
/// line, transfer-from stop and transfer-to stop. The first occurrence is
/// kept.
pub fn deduplicate_transfers(options: Vec<TransferOption>) -> Vec<TransferOption> {
    let mut seen = HashSet::with_capacity(options.len());
    options
        .into_iter()
        .filter(|option| {
            let (first, second, from, to) = option.dedup_key();
            seen.insert((first.clone(), second.clone(), from.clone(), to.clone()))
        })
        .collect()
}

/// Wrap ranked options in the common option type.
pub fn into_itineraries<T: Into<ItineraryOption>>(options: Vec<T>) -> Vec<ItineraryOption> {
    options.into_iter().map(Into::into).collect()
}
