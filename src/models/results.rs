use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Aggregate;

/// Station name bytes to running statistics.
pub type StationMap = HashMap<Vec<u8>, Aggregate, ahash::RandomState>;

pub fn new_station_map() -> StationMap {
    StationMap::with_capacity_and_hasher(1024, ahash::RandomState::new())
}

/// One worker's private view of the input it consumed.
#[derive(Debug, Clone)]
pub struct PartialResult {
    pub worker: usize,
    pub stations: StationMap,
    pub chunks: u64,
    pub records: u64,
    pub skipped: u64,
}

impl PartialResult {
    pub fn new(worker: usize) -> Self {
        Self {
            worker,
            stations: new_station_map(),
            chunks: 0,
            records: 0,
            skipped: 0,
        }
    }
}

/// Fully merged statistics for every station in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalResult {
    pub stations: StationMap,
    pub records: u64,
    pub skipped: u64,
}

impl GlobalResult {
    pub fn new() -> Self {
        Self {
            stations: new_station_map(),
            records: 0,
            skipped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, station: &str) -> Option<&Aggregate> {
        self.stations.get(station.as_bytes())
    }

    /// Entries sorted by station name, byte-lexicographically.
    pub fn sorted(&self) -> Vec<(&[u8], &Aggregate)> {
        let mut entries: Vec<(&[u8], &Aggregate)> = self
            .stations
            .iter()
            .map(|(name, agg)| (name.as_slice(), agg))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn summaries(&self) -> Vec<StationSummary> {
        self.sorted()
            .into_iter()
            .map(|(name, agg)| StationSummary::new(name, agg))
            .collect()
    }
}

impl Default for GlobalResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Rendered view of one station, values rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSummary {
    pub station: String,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    pub count: u64,
}

impl StationSummary {
    pub fn new(name: &[u8], agg: &Aggregate) -> Self {
        Self {
            station: String::from_utf8_lossy(name).into_owned(),
            min: agg.min_value(),
            mean: agg.mean_tenths() as f64 / 10.0,
            max: agg.max_value(),
            count: agg.count,
        }
    }
}
