use crate::models::{GlobalResult, PartialResult};
use crossbeam::channel::Receiver;
use std::collections::hash_map::Entry;
use tracing::debug;

/// Folds per-worker results into a single [`GlobalResult`].
///
/// The merge rule is associative and commutative, so the order in which
/// partials are absorbed never changes the outcome.
pub struct MergeReducer {
    global: GlobalResult,
    merged: usize,
}

impl MergeReducer {
    pub fn new() -> Self {
        Self {
            global: GlobalResult::new(),
            merged: 0,
        }
    }

    pub fn absorb(&mut self, partial: PartialResult) {
        debug!(
            worker = partial.worker,
            stations = partial.stations.len(),
            "merging partial result"
        );

        // Start from the first partial's map instead of re-inserting its keys.
        if self.global.stations.is_empty() {
            self.global.stations = partial.stations;
        } else {
            for (station, incoming) in partial.stations {
                match self.global.stations.entry(station) {
                    Entry::Occupied(mut entry) => entry.get_mut().merge(&incoming),
                    Entry::Vacant(entry) => {
                        entry.insert(incoming);
                    }
                }
            }
        }

        self.global.records += partial.records;
        self.global.skipped += partial.skipped;
        self.merged += 1;
    }

    pub fn finish(self) -> GlobalResult {
        self.global
    }

    /// Barrier strategy: merge partials that have all been collected.
    pub fn merge_all<I>(partials: I) -> GlobalResult
    where
        I: IntoIterator<Item = PartialResult>,
    {
        let mut reducer = Self::new();
        for partial in partials {
            reducer.absorb(partial);
        }
        reducer.finish()
    }

    /// Streaming strategy: merge each partial as it arrives until every
    /// sender has disconnected. Only the calling thread touches the global map.
    pub fn merge_stream(partials: Receiver<PartialResult>) -> GlobalResult {
        let mut reducer = Self::new();
        for partial in partials.iter() {
            reducer.absorb(partial);
        }
        debug!(merged = reducer.merged, "stream merge complete");
        reducer.finish()
    }
}

impl Default for MergeReducer {
    fn default() -> Self {
        Self::new()
    }
}
