use serde::{Deserialize, Serialize};

/// Running statistics for one station, stored in tenths of a unit.
///
/// Integer storage keeps folding exact, so the merge rule is associative and
/// commutative regardless of how records were partitioned across workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub min: i32,
    pub max: i32,
    pub sum: i64,
    pub count: u64,
}

impl Aggregate {
    /// Aggregate for the first sighting of a station.
    pub fn new(tenths: i32) -> Self {
        Self {
            min: tenths,
            max: tenths,
            sum: tenths as i64,
            count: 1,
        }
    }

    #[inline]
    pub fn update(&mut self, tenths: i32) {
        self.min = self.min.min(tenths);
        self.max = self.max.max(tenths);
        self.sum += tenths as i64;
        self.count += 1;
    }

    /// Fold another aggregate for the same station into this one.
    pub fn merge(&mut self, other: &Aggregate) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    /// Mean in tenths, rounded half up (towards positive infinity).
    ///
    /// Only defined for `count >= 1`, which every aggregate built through
    /// [`Aggregate::new`] satisfies.
    pub fn mean_tenths(&self) -> i64 {
        debug_assert!(self.count > 0, "mean of an empty aggregate");
        let count = self.count as i64;
        (2 * self.sum + count).div_euclid(2 * count)
    }

    pub fn mean(&self) -> f64 {
        self.sum as f64 / self.count as f64 / 10.0
    }

    pub fn min_value(&self) -> f64 {
        self.min as f64 / 10.0
    }

    pub fn max_value(&self) -> f64 {
        self.max as f64 / 10.0
    }
}
