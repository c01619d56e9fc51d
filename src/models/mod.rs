pub mod aggregate;
pub mod chunk;
pub mod results;

pub use aggregate::Aggregate;
pub use chunk::Chunk;
pub use results::{new_station_map, GlobalResult, PartialResult, StationMap, StationSummary};
