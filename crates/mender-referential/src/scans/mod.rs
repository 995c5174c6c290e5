//! Pure scans over loaded record snapshots.

pub mod cycles;
pub mod missing;
pub mod orphans;

use std::collections::HashSet;

use mender_core::record::{get_path, key_string, referenced_keys, Record};

pub use cycles::{find_cycles, scan_cycles};
pub use missing::scan_missing;
pub use orphans::scan_orphans;

/// Primary key of a record, or an empty string when it has none.
pub(crate) fn record_key(record: &Record, key_path: &str) -> String {
    get_path(record, key_path)
        .and_then(key_string)
        .unwrap_or_default()
}

/// Every key found in `field` across `records`. Array fields contribute each element.
pub fn key_set(records: &[Record], field: &str) -> HashSet<String> {
    records
        .iter()
        .filter_map(|r| get_path(r, field))
        .flat_map(referenced_keys)
        .collect()
}
