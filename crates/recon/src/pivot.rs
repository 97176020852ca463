use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;

use crate::model::{JoinedRow, PivotKey, PivotRow, PivotTable};

#[derive(Debug, Default)]
pub struct PivotOutput {
    pub table: PivotTable,
    /// Matched rows skipped because their date was unreadable.
    pub undated_rows: usize,
    /// Item numbers of those rows, deduplicated, in first-seen order.
    pub undated_items: Vec<String>,
}

/// Sum `discrete_qty` per (pivot key, date) and derive component demand.
///
/// Unmatched rows carry no key and are skipped. Rows are emitted in key
/// order; only keys with at least one dated row appear, and each row is
/// zero-filled across every date in the table.
pub fn build_pivot(joined: &[JoinedRow<'_>]) -> PivotOutput {
    let mut cells: BTreeMap<PivotKey, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut out = PivotOutput::default();
    let mut seen_undated: HashSet<&str> = HashSet::new();

    for row in joined {
        let Some(bom) = row.bom else {
            continue;
        };
        let Some(date) = row.demand.date else {
            out.undated_rows += 1;
            if seen_undated.insert(row.demand.item_number.as_str()) {
                out.undated_items.push(row.demand.item_number.clone());
            }
            continue;
        };

        dates.insert(date);
        *cells
            .entry(PivotKey::from_bom(bom))
            .or_default()
            .entry(date)
            .or_insert(0.0) += row.demand.discrete_qty;
    }

    out.table.rows = cells
        .into_iter()
        .map(|(key, mut quantities)| {
            for d in &dates {
                quantities.entry(*d).or_insert(0.0);
            }
            let demand = derive_demand(&quantities, key.qty_per.into_inner());
            PivotRow {
                key,
                quantities,
                demand,
            }
        })
        .collect();
    out.table.dates = dates.into_iter().collect();

    log::debug!(
        "pivot: {} key(s) x {} date(s)",
        out.table.rows.len(),
        out.table.dates.len()
    );

    out
}

/// Per-date component demand: quantity × `qty_per`.
pub fn derive_demand(quantities: &BTreeMap<NaiveDate, f64>, qty_per: f64) -> BTreeMap<NaiveDate, f64> {
    quantities.iter().map(|(d, q)| (*d, q * qty_per)).collect()
}
