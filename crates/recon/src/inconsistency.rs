use crate::model::{ComponentDemandTable, InconsistencyReport, InconsistencyRow};

/// Component rows whose vendor or buyer disagrees with the authoritative
/// item-master value, flagged and sorted by (component, plant).
///
/// Always returns a report; an empty one means the check ran and found
/// nothing.
pub fn detect_inconsistencies(table: &ComponentDemandTable) -> InconsistencyReport {
    let mut rows: Vec<InconsistencyRow> = table
        .rows
        .iter()
        .filter_map(|row| {
            let vendor_mismatch = row.key.vendor_mismatch();
            let buyer_mismatch = row.key.buyer_mismatch();
            (vendor_mismatch || buyer_mismatch).then(|| InconsistencyRow {
                row: row.clone(),
                vendor_mismatch,
                buyer_mismatch,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        (&a.row.key.component, &a.row.key.plant).cmp(&(&b.row.key.component, &b.row.key.plant))
    });

    InconsistencyReport {
        dates: table.dates.clone(),
        rows,
    }
}
