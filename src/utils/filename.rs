use chrono::Local;
use std::path::PathBuf;

/// Generate default result filename with format: result-{YYYYmmddHHMMSS}.txt
pub fn generate_default_result_filename() -> PathBuf {
    let stamp = Local::now().format("%Y%m%d%H%M%S");
    PathBuf::from(format!("result-{}.txt", stamp))
}
