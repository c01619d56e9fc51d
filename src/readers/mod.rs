pub mod chunk_reader;
pub mod fixed_point;
pub mod record_parser;

pub use chunk_reader::ChunkReader;
pub use fixed_point::{decode_tenths, decode_value, try_decode_tenths};
pub use record_parser::{lines, parse_record, parse_record_checked, Record};
