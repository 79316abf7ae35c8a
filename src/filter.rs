use crate::types::{TypeFilter, VolcanoRecord, ALL_TYPES};
use std::collections::BTreeSet;

/// Selector options: "All" followed by the sorted unique Type values.
pub fn distinct_types(records: &[VolcanoRecord]) -> Vec<String> {
    let unique: BTreeSet<&str> = records.iter().map(|r| r.volcano_type.as_str()).collect();

    std::iter::once(ALL_TYPES.to_string())
        .chain(unique.into_iter().map(str::to_string))
        .collect()
}

/// Rows matching `filter`, in their original order.
pub fn filter_by_type<'a>(records: &'a [VolcanoRecord], filter: &TypeFilter) -> Vec<&'a VolcanoRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}
