//! Content hashes for observation tables.
//!
//! Two tables with identical dates, target, and columns (in the same order)
//! hash identically. Used to tag selection results with the exact data they
//! were computed from.

use crate::domain::ObservationTable;

/// BLAKE3 hash over one or more tables, in order.
pub fn tables_hash(tables: &[&ObservationTable]) -> String {
    let mut hasher = blake3::Hasher::new();
    for table in tables {
        update_table(&mut hasher, table);
    }
    hasher.finalize().to_hex().to_string()
}

/// BLAKE3 hash of a single table.
pub fn table_hash(table: &ObservationTable) -> String {
    tables_hash(&[table])
}

fn update_table(hasher: &mut blake3::Hasher, table: &ObservationTable) {
    hasher.update(&(table.len() as u64).to_le_bytes());
    for date in table.dates() {
        hasher.update(date.to_string().as_bytes());
    }
    hasher.update(table.target_name().as_bytes());
    for value in table.target() {
        hasher.update(&value.to_le_bytes());
    }
    for column in table.columns() {
        hasher.update(column.name.as_bytes());
        for value in &column.values {
            hasher.update(&value.to_le_bytes());
        }
    }
}
